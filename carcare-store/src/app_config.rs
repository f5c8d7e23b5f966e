use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use serde::Deserialize;
use std::env;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RedisConfig {
    /// Without a URL, revoked sessions are tracked in process memory.
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
    #[serde(default)]
    pub booking_gate: BookingGate,
}

/// Which booking routes sit behind the session gate.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingGate {
    /// Only the booking listing is gated; a listing without `email` is unfiltered.
    #[default]
    ListOnly,
    /// Every booking route is gated; a listing without `email` is scoped to the caller.
    All,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

/// Variables the deployment already exports, mapped onto config keys.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("DB_USER", "database.user"),
    ("DB_PASSWORD", "database.password"),
    ("ACCESS_TOKEN_SECRET", "auth.jwt_secret"),
    ("REDIS_URL", "redis.url"),
];

/// Longest session lifetime the token service will sign.
pub const MAX_JWT_EXPIRATION_SECONDS: u64 = 365 * 24 * 60 * 60;

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        Self::load_from(Path::new("config"), &run_mode)
    }

    /// Files under `dir`, then `CARCARE__*` variables, then the legacy variables.
    pub fn load_from(dir: &Path, run_mode: &str) -> Result<Self, ConfigError> {
        let mut builder = Self::with_files(dir, run_mode)?
            // Eg. `CARCARE__SERVER__PORT=8080`
            .add_source(
                config::Environment::with_prefix("CARCARE")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            );

        for (var, key) in LEGACY_ENV {
            builder = builder.set_override_option(*key, env::var(var).ok())?;
        }

        Self::finish(builder)
    }

    fn with_files(dir: &Path, run_mode: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let file = |name: &str| {
            config::File::with_name(&dir.join(name).to_string_lossy()).required(false)
        };

        Ok(Self::builder_with_defaults()?
            .add_source(file("default"))
            // Optional per-environment file, development by default
            .add_source(file(run_mode))
            // Local overrides, not checked in
            .add_source(file("local")))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Message("auth.jwt_secret must not be empty".into()));
        }
        let expiration = self.auth.jwt_expiration_seconds;
        if !(1..=MAX_JWT_EXPIRATION_SECONDS).contains(&expiration) {
            return Err(ConfigError::Message(format!(
                "auth.jwt_expiration_seconds must be between 1 and {}, got {}",
                MAX_JWT_EXPIRATION_SECONDS, expiration
            )));
        }
        Ok(())
    }

    /// Everything except the signing secret has a usable local default.
    pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("server.port", 4000)?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.name", "carcare")?
            .set_default("database.user", "carcare")?
            .set_default("database.password", "")?
            .set_default("database.max_connections", 5)?
            .set_default("database.acquire_timeout_seconds", 3)?
            .set_default("auth.jwt_expiration_seconds", 3600)?
            .set_default("auth.booking_gate", "list_only")?
            .set_default("cors.allowed_origins", Vec::<String>::new())
    }
}
