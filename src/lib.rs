mod api;
mod client;
mod core;
mod model;
mod schemas;
mod store;
mod sync;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::api::{ApiUrls, AuthApi, CourseApi};
use crate::client::{HttpTransport, RemoteClient};
use crate::core::config::Settings;
use crate::store::{StateStore, UserState};
use crate::sync::SyncOrchestrator;

const LOGIN_ATTEMPTS: u32 = 3;
const LOGIN_RETRY_DELAY: Duration = Duration::from_secs(1);

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::load().context("failed to load configuration")?;
    crate::core::telemetry::init_tracing(&settings)?;

    let store = StateStore::new(settings.state().path.clone());
    let mut state = store.load()?;
    if state.username != settings.account().username {
        if !state.username.is_empty() {
            tracing::info!("stored state belongs to another account, starting fresh");
        }
        state = UserState {
            username: settings.account().username.clone(),
            ..UserState::default()
        };
    }

    let urls = ApiUrls::for_site(settings.account().site);
    tracing::info!(site = settings.account().site.as_str(), "starting sync");

    let timeout = Duration::from_secs(settings.http().timeout_seconds);
    let client = Arc::new(RemoteClient::new(Box::new(HttpTransport::new()?), timeout));
    if let Some(token) = &state.token {
        client.set_token(token.clone()).await;
    }
    if !state.cookies.is_empty() {
        client.set_cookies(state.cookies.clone()).await;
    }

    let auth = AuthApi::new(client.clone(), urls.clone());
    ensure_login(&auth, &client, &settings, &mut state).await?;
    store.save(&state)?;

    let course_api = CourseApi::new(client, urls);

    // An explicit course or textbook selection always rebuilds the tree;
    // otherwise the stored tree (whatever is still incomplete from the last
    // run) is picked up as-is.
    let rebuild = state.courses.is_empty()
        || !settings.sync().course_ids.is_empty()
        || !settings.sync().textbook_ids.is_empty();
    if rebuild {
        state.courses = sync::reconciler::configure(&course_api, settings.sync())
            .await
            .context("failed to build the course tree")?;
        store.save(&state)?;
    }

    for page_id in &settings.sync().skip_page_ids {
        for course in state.courses.values_mut() {
            if course.remove_page(*page_id) {
                tracing::info!(page_id, "page excluded from sync");
            }
        }
    }
    state.courses.retain(|_, course| !course.textbooks.is_empty());

    if state.courses.is_empty() {
        tracing::info!("nothing left to study");
        return Ok(());
    }

    let orchestrator = SyncOrchestrator::new(course_api, &settings);
    orchestrator.run(&mut state.courses).await.context("sync run failed")?;
    store.save(&state)?;

    tracing::info!("sync run finished");
    Ok(())
}

/// Reuses the stored token when the server still accepts it; otherwise logs
/// in with a fresh transport and persists the new session in `state`.
async fn ensure_login(
    auth: &AuthApi,
    client: &Arc<RemoteClient>,
    settings: &Settings,
    state: &mut UserState,
) -> anyhow::Result<()> {
    if let Some(token) = state.token.clone() {
        match auth.check_token(&token).await {
            Ok(true) => {
                tracing::info!("stored session is still valid");
                return Ok(());
            }
            Ok(false) => tracing::info!("stored session expired"),
            Err(err) => tracing::warn!(error = %err, "token check failed"),
        }
    }

    for attempt in 1..=LOGIN_ATTEMPTS {
        match auth.login(&settings.account().username, &settings.account().password).await {
            Ok(info) => {
                tracing::info!(user_id = info.user_id, name = %info.name, "logged in");
                let cookies = client.cookies().await;
                client
                    .rotate_session(
                        Box::new(HttpTransport::new()?),
                        Some(info.authorization.clone()),
                        cookies.clone(),
                    )
                    .await;
                state.token = Some(info.authorization);
                state.cookies = cookies;
                return Ok(());
            }
            Err(err) => {
                tracing::warn!(attempt, error = %err, "login failed");
                if attempt < LOGIN_ATTEMPTS {
                    tokio::time::sleep(LOGIN_RETRY_DELAY).await;
                }
            }
        }
    }

    anyhow::bail!("could not establish a session after {LOGIN_ATTEMPTS} login attempts")
}
