/// Configuration management for the API server
///
/// Layered with the `config` crate, later sources winning:
///
/// 1. built-in defaults
/// 2. `teamhub.toml` in the working directory (optional)
/// 3. `TEAMHUB__SECTION__KEY` environment variables
///    (`TEAMHUB__API__CORS_ORIGINS` takes a comma-separated list)
/// 4. the conventional `DATABASE_URL`, `JWT_SECRET`, `API_HOST`, `API_PORT`
///
/// A `.env` file is loaded first when present.
///
/// # Example
///
/// ```no_run
/// use teamhub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use teamhub_worker::config::{LogConfig, SchedulerConfig};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub session: SessionConfig,
    pub scheduler: SchedulerConfig,
    pub log: LogConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Enables HSTS and the `Secure` cookie attribute
    pub production: bool,

    /// Run the nightly status refresh inside the API process
    pub run_scheduler: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Minimum number of idle connections
    pub min_connections: u32,

    pub acquire_timeout_seconds: u64,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HMAC secret, at least 32 characters
    pub secret: String,

    /// Lifetime of an issued token
    pub expiration_hours: i64,
}

/// Admin panel session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_hours: i64,
}

impl Config {
    fn defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
        Ok(config::Config::builder()
            .set_default("api.host", "0.0.0.0")?
            .set_default("api.port", 8080_i64)?
            .set_default("api.cors_origins", vec!["*"])?
            .set_default("api.production", false)?
            .set_default("api.run_scheduler", true)?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 20_i64)?
            .set_default("database.min_connections", 2_i64)?
            .set_default("database.acquire_timeout_seconds", 30_i64)?
            .set_default("jwt.secret", "")?
            .set_default("jwt.expiration_hours", 24_i64)?
            .set_default("session.cookie_name", "TEAMHUB_ADMIN_SESSION")?
            .set_default("session.ttl_hours", 8_i64)?
            .set_default("scheduler.run_on_startup", true)?
            .set_default("scheduler.utc_offset_minutes", 0_i64)?
            .set_default("log.filter", "teamhub_api=info,teamhub_shared=info,tower_http=info")?
            .set_default("log.json", false)?)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        let config: Config = builder.build()?.try_deserialize()?;

        if config.database.url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL environment variable is required");
        }

        if config.jwt.secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        if config.jwt.expiration_hours <= 0 {
            anyhow::bail!("jwt.expiration_hours must be positive");
        }

        if config.session.ttl_hours <= 0 {
            anyhow::bail!("session.ttl_hours must be positive");
        }

        config.scheduler.offset()?;

        Ok(config)
    }

    /// Loads `.env`, the optional file, then the environment
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let builder = Self::defaults()?
            .add_source(File::with_name("teamhub").required(false))
            .add_source(
                Environment::with_prefix("TEAMHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("api.cors_origins")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("jwt.secret", env::var("JWT_SECRET").ok())?
            .set_override_option("api.host", env::var("API_HOST").ok())?
            .set_override_option("api.port", env::var("API_PORT").ok())?;

        Self::build(builder)
    }

    /// Returns the bind address for the server
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether CORS should accept any origin
    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|o| o.trim() == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> anyhow::Result<Config> {
        Config::build(Config::defaults()?.add_source(File::from_str(toml, FileFormat::Toml)))
    }

    const SECRET: &str = "an-adequately-long-secret-for-signing-tokens";

    #[test]
    fn test_defaults_with_required_values() {
        let config = from_toml(&format!(
            "[database]\nurl = \"postgresql://localhost/teamhub\"\n[jwt]\nsecret = \"{}\"\n",
            SECRET
        ))
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.jwt.expiration_hours, 24);
        assert_eq!(config.session.cookie_name, "TEAMHUB_ADMIN_SESSION");
        assert!(config.allows_any_origin());
        assert!(config.api.run_scheduler);
        assert!(!config.api.production);
    }

    #[test]
    fn test_missing_database_url_rejected() {
        let err = from_toml(&format!("[jwt]\nsecret = \"{}\"\n", SECRET)).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let err = from_toml("[database]\nurl = \"postgresql://localhost/teamhub\"\n[jwt]\nsecret = \"short\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_explicit_origins() {
        let config = from_toml(&format!(
            "[api]\ncors_origins = [\"https://admin.example.com\"]\nport = 9000\n\
             [database]\nurl = \"postgresql://localhost/teamhub\"\n[jwt]\nsecret = \"{}\"\n",
            SECRET
        ))
        .unwrap();

        assert!(!config.allows_any_origin());
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }
}
