use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

const CONFIG_DIR: &str = "config";

/// Runtime settings, deserialized from layered config files plus `APP__*`
/// environment overrides. Unknown keys are rejected so typos surface at boot.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Connection URL for the backing database.
    pub database_url: String,

    /// Interface the HTTP server binds to.
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment profile name ("development", "staging", "production").
    pub environment: String,

    /// Base log filter, overridable per process with RUST_LOG.
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Emit log lines as JSON instead of human-readable text.
    #[serde(default)]
    pub log_json: bool,

    /// Apply pending migrations during startup.
    #[serde(default)]
    pub auto_migrate: bool,

    /// Comma-separated origin allowlist for CORS.
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Explicit opt-in to wildcard CORS outside development.
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    #[serde(default)]
    pub cors_allow_credentials: bool,

    /// Connection pool sizing.
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// Pool timeouts, in seconds.
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Deadline applied to every HTTP request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Buffer size of the in-process event channel.
    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Page size used when a list request does not pass `limit`.
    #[serde(default = "default_api_page_size")]
    pub api_default_page_size: u32,

    /// Upper bound any `limit` query parameter is clamped to.
    #[serde(default = "default_api_max_page_size")]
    pub api_max_page_size: u32,
}

impl AppConfig {
    /// Builds a config from the four required settings with every optional
    /// knob at its default. Test harnesses start here and tweak fields.
    pub fn new(database_url: String, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            api_default_page_size: default_api_page_size(),
            api_max_page_size: default_api_max_page_size(),
        }
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// True when the allowlist holds at least one non-blank origin.
    pub fn has_cors_allowed_origins(&self) -> bool {
        matches!(
            &self.cors_allowed_origins,
            Some(raw) if raw.split(',').any(|origin| !origin.trim().is_empty())
        )
    }

    /// Permissive CORS is the development default and an explicit opt-in
    /// everywhere else.
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    /// Cross-field rules the derive macro cannot express.
    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        if self.should_allow_permissive_cors() || self.has_cors_allowed_origins() {
            return Ok(());
        }
        let mut err = ValidationError::new("cors_allowed_origins_required");
        err.message = Some(
            "set APP__CORS_ALLOWED_ORIGINS outside development, or opt in with APP__CORS_ALLOW_ANY_ORIGIN=true"
                .into(),
        );
        let mut errors = ValidationErrors::new();
        errors.add("cors_allowed_origins", err);
        Err(errors)
    }
}

/// Boot-time configuration failures.
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_db_max_connections() -> u32 {
    16
}

fn default_db_min_connections() -> u32 {
    2
}

fn default_db_connect_timeout_secs() -> u64 {
    30
}

fn default_db_idle_timeout_secs() -> u64 {
    600
}

fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn default_api_page_size() -> u32 {
    20
}

fn default_api_max_page_size() -> u32 {
    100
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => {
            let mut err = ValidationError::new("log_level");
            err.message = Some("expected one of trace, debug, info, warn, error".into());
            Err(err)
        }
    }
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 {
        let mut err = ValidationError::new("event_channel_capacity");
        err.message = Some("event_channel_capacity must be greater than zero".into());
        return Err(err);
    }
    Ok(())
}

/// Installs the global tracing subscriber. A non-empty `RUST_LOG` wins over
/// the configured level.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let filter = match env::var("RUST_LOG") {
        Ok(spec) if !spec.trim().is_empty() => spec,
        _ => format!("salonstock_api={level},tower_http=debug"),
    };

    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads configuration by layering, lowest to highest precedence:
/// `config/default.toml`, `config/{profile}.toml`, `config/docker.toml`
/// (only when `DOCKER` is set), then `APP__*` environment variables.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // RUN_ENV is the historical name; APP_ENV works too.
    let profile = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string());
    info!(%profile, "Loading configuration");

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "No '{}' directory; using built-in defaults and environment variables only",
            CONFIG_DIR
        );
    }

    let layer = |name: &str| File::with_name(&format!("{CONFIG_DIR}/{name}")).required(false);

    let mut builder = Config::builder()
        .set_default("database_url", "sqlite://salonstock.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8080_u16)?
        .set_default("environment", "development")?
        .set_default("log_level", "info")?
        .set_default("log_json", false)?
        .add_source(layer("default"))
        .add_source(layer(&profile));

    if env::var("DOCKER").is_ok() {
        info!("Docker overrides enabled");
        builder = builder.add_source(layer("docker"));
    }

    let raw = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let cfg: AppConfig = raw.try_deserialize()?;

    cfg.validate().map_err(|e| {
        error!("Invalid configuration: {e:?}");
        AppConfigError::Validation(e)
    })?;
    cfg.validate_additional_constraints().map_err(|e| {
        error!("Configuration failed cross-field checks: {e:?}");
        AppConfigError::Validation(e)
    })?;

    info!(environment = %cfg.environment, "Configuration loaded");
    Ok(cfg)
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    fn production_config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            8080,
            "production".into(),
        )
    }

    #[test]
    fn production_without_origins_is_rejected() {
        let cfg = production_config();
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn wildcard_opt_in_overrides_the_origin_requirement() {
        let mut cfg = production_config();
        cfg.cors_allow_any_origin = true;
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn configured_origins_satisfy_production() {
        let mut cfg = production_config();
        cfg.cors_allowed_origins = Some("https://app.salon.example".into());
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn blank_origin_list_does_not_count() {
        let mut cfg = production_config();
        cfg.cors_allowed_origins = Some(" , ".into());
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn development_defaults_to_permissive() {
        let mut cfg = production_config();
        cfg.environment = "development".into();
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut cfg = production_config();
        cfg.log_level = "verbose".into();
        assert!(cfg.validate().is_err());
    }
}
