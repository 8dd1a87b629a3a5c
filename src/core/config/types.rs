use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(super) account: AccountSettings,
    pub(super) http: HttpSettings,
    pub(super) study_time: StudyTimeSettings,
    pub(super) sync: SyncSettings,
    pub(super) state: StateSettings,
    pub(super) telemetry: TelemetrySettings,
}

#[derive(Debug, Clone)]
pub(crate) struct AccountSettings {
    pub(crate) site: Site,
    pub(crate) username: String,
    pub(crate) password: String,
}

#[derive(Debug, Clone)]
pub(crate) struct HttpSettings {
    pub(crate) timeout_seconds: u64,
}

/// Bounds for a randomized study duration, in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub(crate) struct MinMaxSeconds {
    pub(crate) min: u64,
    pub(crate) max: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StudyTimeSettings {
    pub(crate) document: MinMaxSeconds,
    pub(crate) content: MinMaxSeconds,
    pub(crate) question: MinMaxSeconds,
}

#[derive(Debug, Clone)]
pub(crate) struct SyncSettings {
    pub(crate) cooldown_seconds: f64,
    pub(crate) course_ids: Vec<i64>,
    pub(crate) textbook_ids: Vec<i64>,
    /// Pages to drop from the tree before syncing, by stable page id.
    pub(crate) skip_page_ids: Vec<i64>,
}

#[derive(Debug, Clone)]
pub(crate) struct StateSettings {
    pub(crate) path: PathBuf,
}

#[derive(Debug, Clone)]
pub(crate) struct TelemetrySettings {
    pub(crate) log_level: String,
    pub(crate) json: bool,
}

/// Which deployment of the remote service to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Site {
    /// The main ulearning.cn deployment.
    Ulearning,
    /// The lms.dgut.edu.cn university mirror.
    Dgut,
}

impl Site {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Ulearning => "ulearning",
            Self::Dgut => "dgut",
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("unknown site: {0}")]
    UnknownSite(String),
    #[error("missing required setting {0}")]
    Missing(&'static str),
}
