use std::env;

use super::types::{ConfigError, Environment, StorageBackend};

pub(super) fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

pub(super) fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

pub(super) fn parse_u16(field: &'static str, value: String) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidValue { field, value })
}

pub(super) fn parse_u32(field: &'static str, value: String) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidValue { field, value })
}

pub(super) fn parse_positive_u64(field: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidValue { field, value }),
    }
}

pub(super) fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON")
}

pub(super) fn parse_environment(value: Option<String>) -> Environment {
    match value.as_deref().map(|item| item.to_lowercase()) {
        Some(ref val) if val == "production" || val == "prod" => Environment::Production,
        Some(ref val) if val == "staging" => Environment::Staging,
        Some(ref val) if val == "test" || val == "testing" => Environment::Test,
        _ => Environment::Development,
    }
}

pub(super) fn parse_storage_backend(value: Option<String>) -> Result<StorageBackend, ConfigError> {
    match value.as_deref().map(|item| item.to_lowercase()) {
        None => Ok(StorageBackend::Memory),
        Some(ref val) if val == "memory" || val == "in-memory" => Ok(StorageBackend::Memory),
        Some(ref val) if val == "postgres" || val == "postgresql" => Ok(StorageBackend::Postgres),
        Some(val) => Err(ConfigError::InvalidValue { field: "STORAGE_BACKEND", value: val }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_variants() {
        assert!(parse_bool("1"));
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("yes"));
        assert!(parse_bool("on"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
    }

    #[test]
    fn parse_environment_variants() {
        assert_eq!(parse_environment(Some("prod".to_string())), Environment::Production);
        assert_eq!(parse_environment(Some("production".to_string())), Environment::Production);
        assert_eq!(parse_environment(Some("staging".to_string())), Environment::Staging);
        assert_eq!(parse_environment(Some("testing".to_string())), Environment::Test);
        assert_eq!(parse_environment(None), Environment::Development);
    }

    #[test]
    fn parse_storage_backend_variants() {
        assert_eq!(parse_storage_backend(None).unwrap(), StorageBackend::Memory);
        assert_eq!(
            parse_storage_backend(Some("PostgreSQL".to_string())).unwrap(),
            StorageBackend::Postgres
        );
        assert!(matches!(
            parse_storage_backend(Some("sqlite".to_string())),
            Err(ConfigError::InvalidValue { field: "STORAGE_BACKEND", .. })
        ));
    }

    #[test]
    fn parse_positive_u64_rejects_zero() {
        assert_eq!(parse_positive_u64("TIMER_SYNC_INTERVAL_MS", "1000".to_string()).unwrap(), 1000);
        assert!(parse_positive_u64("TIMER_SYNC_INTERVAL_MS", "0".to_string()).is_err());
        assert!(parse_positive_u64("TIMER_SYNC_INTERVAL_MS", "soon".to_string()).is_err());
    }
}
