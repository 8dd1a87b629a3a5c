use std::env;

use super::types::{ConfigError, Site};

pub(super) fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

pub(super) fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

pub(super) fn parse_u64(field: &'static str, value: String) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidValue { field, value })
}

pub(super) fn parse_f64(field: &'static str, value: String) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidValue { field, value })
}

pub(super) fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON")
}

pub(super) fn parse_site(value: Option<String>) -> Result<Site, ConfigError> {
    match value.as_deref().map(|item| item.to_lowercase()) {
        None => Ok(Site::Ulearning),
        Some(ref val) if val == "ulearning" || val == "main" => Ok(Site::Ulearning),
        Some(ref val) if val == "dgut" => Ok(Site::Dgut),
        Some(val) => Err(ConfigError::UnknownSite(val)),
    }
}

pub(super) fn parse_id_list(field: &'static str, value: Option<String>) -> Result<Vec<i64>, ConfigError> {
    let Some(raw) = value else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<i64>()
                .map_err(|_| ConfigError::InvalidValue { field, value: item.to_string() })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_list_csv() {
        let parsed = parse_id_list("COURSE_IDS", Some("1, 23,456".to_string())).expect("ids");
        assert_eq!(parsed, vec![1, 23, 456]);
    }

    #[test]
    fn parse_id_list_empty_is_no_selection() {
        assert!(parse_id_list("COURSE_IDS", None).expect("ids").is_empty());
    }

    #[test]
    fn parse_id_list_rejects_garbage() {
        assert!(parse_id_list("COURSE_IDS", Some("1,abc".to_string())).is_err());
    }

    #[test]
    fn parse_site_variants() {
        assert_eq!(parse_site(None).expect("default"), Site::Ulearning);
        assert_eq!(parse_site(Some("ULearning".to_string())).expect("main"), Site::Ulearning);
        assert_eq!(parse_site(Some("dgut".to_string())).expect("mirror"), Site::Dgut);
        assert!(parse_site(Some("elsewhere".to_string())).is_err());
    }

    #[test]
    fn parse_bool_variants() {
        assert!(parse_bool("1"));
        assert!(parse_bool("true"));
        assert!(parse_bool("YES"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
    }
}
