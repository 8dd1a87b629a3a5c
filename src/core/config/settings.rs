use std::path::PathBuf;

use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_f64, parse_id_list, parse_site, parse_u64,
};
use super::types::{
    AccountSettings, ConfigError, HttpSettings, MinMaxSeconds, Settings, StateSettings,
    StudyTimeSettings, SyncSettings, TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let site = parse_site(env_optional("COURSESYNC_SITE"))?;
        let username =
            env_optional("COURSESYNC_USERNAME").ok_or(ConfigError::Missing("COURSESYNC_USERNAME"))?;
        let password =
            env_optional("COURSESYNC_PASSWORD").ok_or(ConfigError::Missing("COURSESYNC_PASSWORD"))?;

        let timeout_seconds = parse_u64(
            "COURSESYNC_HTTP_TIMEOUT_SECONDS",
            env_or_default("COURSESYNC_HTTP_TIMEOUT_SECONDS", "8"),
        )?;

        let study_time = StudyTimeSettings {
            document: load_min_max("STUDY_TIME_DOCUMENT_MIN", "STUDY_TIME_DOCUMENT_MAX")?,
            content: load_min_max("STUDY_TIME_CONTENT_MIN", "STUDY_TIME_CONTENT_MAX")?,
            question: load_min_max("STUDY_TIME_QUESTION_MIN", "STUDY_TIME_QUESTION_MAX")?,
        };

        let cooldown_seconds = parse_f64(
            "COURSESYNC_COOLDOWN_SECONDS",
            env_or_default("COURSESYNC_COOLDOWN_SECONDS", "1.0"),
        )?;

        let course_ids = parse_id_list("COURSE_IDS", env_optional("COURSE_IDS"))?;
        let textbook_ids = parse_id_list("TEXTBOOK_IDS", env_optional("TEXTBOOK_IDS"))?;
        let skip_page_ids = parse_id_list("SKIP_PAGE_IDS", env_optional("SKIP_PAGE_IDS"))?;

        let state_path =
            PathBuf::from(env_or_default("COURSESYNC_STATE_FILE", "coursesync-state.json"));

        let log_level = env_or_default("COURSESYNC_LOG_LEVEL", "info");
        let json = env_optional("COURSESYNC_LOG_JSON")
            .map(|value| parse_bool(&value))
            .unwrap_or(false);

        let settings = Self {
            account: AccountSettings { site, username, password },
            http: HttpSettings { timeout_seconds },
            study_time,
            sync: SyncSettings { cooldown_seconds, course_ids, textbook_ids, skip_page_ids },
            state: StateSettings { path: state_path },
            telemetry: TelemetrySettings { log_level, json },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn account(&self) -> &AccountSettings {
        &self.account
    }

    pub(crate) fn http(&self) -> &HttpSettings {
        &self.http
    }

    pub(crate) fn study_time(&self) -> &StudyTimeSettings {
        &self.study_time
    }

    pub(crate) fn sync(&self) -> &SyncSettings {
        &self.sync
    }

    pub(crate) fn state(&self) -> &StateSettings {
        &self.state
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, range) in [
            ("STUDY_TIME_DOCUMENT_MIN/MAX", self.study_time.document),
            ("STUDY_TIME_CONTENT_MIN/MAX", self.study_time.content),
            ("STUDY_TIME_QUESTION_MIN/MAX", self.study_time.question),
        ] {
            if range.min > range.max || range.max > 3600 {
                return Err(ConfigError::InvalidValue {
                    field,
                    value: format!("{}~{}", range.min, range.max),
                });
            }
        }

        if !(0.0..=10.0).contains(&self.sync.cooldown_seconds) {
            return Err(ConfigError::InvalidValue {
                field: "COURSESYNC_COOLDOWN_SECONDS",
                value: self.sync.cooldown_seconds.to_string(),
            });
        }

        if self.http.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "COURSESYNC_HTTP_TIMEOUT_SECONDS",
                value: "0".to_string(),
            });
        }

        Ok(())
    }
}

fn load_min_max(min_key: &'static str, max_key: &'static str) -> Result<MinMaxSeconds, ConfigError> {
    Ok(MinMaxSeconds {
        min: parse_u64(min_key, env_or_default(min_key, "180"))?,
        max: parse_u64(max_key, env_or_default(max_key, "360"))?,
    })
}
