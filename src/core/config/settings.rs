use std::time::Duration;

use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_environment, parse_positive_u64,
    parse_storage_backend, parse_u16, parse_u32,
};
use super::types::{
    AdminSettings, ApiSettings, ConfigError, DatabaseSettings, RuntimeSettings, ServerHost,
    ServerPort, ServerSettings, Settings, StorageBackend, StorageSettings, TelemetrySettings,
    TimerSettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("QUIZGLASS_HOST", "0.0.0.0");
        let port = env_or_default("QUIZGLASS_PORT", "8080");

        let environment = parse_environment(
            env_optional("QUIZGLASS_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("QUIZGLASS_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Quizglass API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let backend = parse_storage_backend(env_optional("STORAGE_BACKEND"))?;
        let fixtures_path = env_optional("QUIZ_FIXTURES_PATH");

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "quizglass");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "quizglass");
        let database_url = env_optional("DATABASE_URL");
        let max_connections = parse_u32(
            "DATABASE_MAX_CONNECTIONS",
            env_or_default("DATABASE_MAX_CONNECTIONS", "20"),
        )?;

        let sync_interval_ms = parse_positive_u64(
            "TIMER_SYNC_INTERVAL_MS",
            env_or_default("TIMER_SYNC_INTERVAL_MS", "1000"),
        )?;
        let catchup_interval_seconds = parse_positive_u64(
            "EXPIRY_CATCHUP_INTERVAL_SECONDS",
            env_or_default("EXPIRY_CATCHUP_INTERVAL_SECONDS", "60"),
        )?;

        let admin_token = env_optional("ADMIN_TOKEN");

        let log_level = env_or_default("QUIZGLASS_LOG_LEVEL", "info");
        let json = env_optional("QUIZGLASS_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
            storage: StorageSettings { backend, fixtures_path },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
                max_connections,
            },
            timer: TimerSettings { sync_interval_ms, catchup_interval_seconds },
            admin: AdminSettings { token: admin_token },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;

        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn timer(&self) -> &TimerSettings {
        &self.timer
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.storage.backend == StorageBackend::Memory {
            return Err(ConfigError::InvalidValue {
                field: "STORAGE_BACKEND",
                value: StorageBackend::Memory.as_str().to_string(),
            });
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }

        if self.admin.token.is_none() {
            return Err(ConfigError::MissingSecret("ADMIN_TOKEN"));
        }

        Ok(())
    }
}

impl TimerSettings {
    pub(crate) fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }

    pub(crate) fn catchup_interval(&self) -> Duration {
        Duration::from_secs(self.catchup_interval_seconds)
    }
}
