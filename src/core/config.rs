mod parsing;
mod settings;
mod types;

pub(crate) use types::{ConfigError, MinMaxSeconds, Settings, Site, StudyTimeSettings, SyncSettings};
