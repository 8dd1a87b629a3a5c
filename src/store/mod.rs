//! JSON file persistence for session and course state between runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::model::Course;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct UserState {
    pub(crate) username: String,
    #[serde(default)]
    pub(crate) token: Option<String>,
    #[serde(default)]
    pub(crate) cookies: BTreeMap<String, String>,
    #[serde(default)]
    pub(crate) courses: BTreeMap<i64, Course>,
}

pub(crate) struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// A missing state file is a fresh start, not an error.
    pub(crate) fn load(&self) -> anyhow::Result<UserState> {
        if !self.path.exists() {
            return Ok(UserState::default());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read state file {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse state file {}", self.path.display()))
    }

    /// Write to a sibling temp file and rename, so a crash mid-write never
    /// leaves a truncated state file behind.
    pub(crate) fn save(&self, state: &UserState) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(state).context("failed to serialize state")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)
            .with_context(|| format!("failed to write state file {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace state file {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_default_state() {
        let store = StateStore::new(std::env::temp_dir().join("coursesync-no-such-state.json"));
        let state = store.load().expect("load");
        assert!(state.username.is_empty());
        assert!(state.courses.is_empty());
    }

    #[test]
    fn save_then_load_roundtrips() {
        let path = std::env::temp_dir().join("coursesync-state-roundtrip.json");
        let store = StateStore::new(path.clone());

        let mut state = UserState {
            username: "learner@example.com".to_string(),
            token: Some("tok".to_string()),
            ..UserState::default()
        };
        state.cookies.insert("SESSION".to_string(), "abc".to_string());

        store.save(&state).expect("save");
        let loaded = store.load().expect("load");
        fs::remove_file(&path).ok();

        assert_eq!(loaded.username, state.username);
        assert_eq!(loaded.token.as_deref(), Some("tok"));
        assert_eq!(loaded.cookies.get("SESSION").map(String::as_str), Some("abc"));
    }
}
