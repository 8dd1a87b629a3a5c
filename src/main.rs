#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = coursesync::run().await {
        eprintln!("coursesync fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
