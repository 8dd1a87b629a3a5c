pub(crate) mod config;
pub(crate) mod errors;
pub(crate) mod telemetry;
pub(crate) mod time;
