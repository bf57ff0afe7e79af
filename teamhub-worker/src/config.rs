/// Worker configuration
///
/// Layered with the `config` crate, later sources winning:
///
/// 1. built-in defaults
/// 2. `teamhub-worker.toml` in the working directory (optional)
/// 3. `TEAMHUB__SECTION__KEY` environment variables
/// 4. `DATABASE_URL`
///
/// A `.env` file is loaded first when present.
///
/// # Example
///
/// ```no_run
/// use teamhub_worker::config::WorkerConfig;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = WorkerConfig::from_env()?;
/// println!("Refresh runs at midnight UTC{:+}min", config.scheduler.utc_offset_minutes);
/// # Ok(())
/// # }
/// ```

use chrono::FixedOffset;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub database: DatabaseConfig,
    pub scheduler: SchedulerConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// When and how the status refresh runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Run one refresh as soon as the scheduler starts
    pub run_on_startup: bool,

    /// Offset of the zone whose midnight triggers the daily run
    pub utc_offset_minutes: i32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            run_on_startup: true,
            utc_offset_minutes: 0,
        }
    }
}

impl SchedulerConfig {
    pub fn offset(&self) -> anyhow::Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            anyhow::anyhow!(
                "scheduler.utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            )
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,

    /// JSON lines instead of human-readable output
    pub json: bool,
}

impl WorkerConfig {
    fn defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
        Ok(config::Config::builder()
            .set_default("database.url", "")?
            .set_default("database.max_connections", 5_i64)?
            .set_default("scheduler.run_on_startup", true)?
            .set_default("scheduler.utc_offset_minutes", 0_i64)?
            .set_default("log.filter", "teamhub_worker=info,teamhub_shared=info")?
            .set_default("log.json", false)?)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        let config: WorkerConfig = builder.build()?.try_deserialize()?;

        if config.database.url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL environment variable is required");
        }
        config.scheduler.offset()?;

        Ok(config)
    }

    /// Loads `.env`, the optional file, then the environment
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let builder = Self::defaults()?
            .add_source(File::with_name("teamhub-worker").required(false))
            .add_source(
                Environment::with_prefix("TEAMHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?;

        Self::build(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> anyhow::Result<WorkerConfig> {
        WorkerConfig::build(WorkerConfig::defaults()?.add_source(File::from_str(toml, FileFormat::Toml)))
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = from_toml(
            r#"
            [database]
            url = "postgresql://localhost/teamhub"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.max_connections, 5);
        assert!(config.scheduler.run_on_startup);
        assert_eq!(config.scheduler.utc_offset_minutes, 0);
        assert!(!config.log.json);
    }

    #[test]
    fn test_missing_database_url_rejected() {
        assert!(from_toml("").is_err());
    }

    #[test]
    fn test_offset_bounds() {
        let east = SchedulerConfig {
            run_on_startup: false,
            utc_offset_minutes: 120,
        };
        assert_eq!(east.offset().unwrap().local_minus_utc(), 7200);

        let bad = SchedulerConfig {
            run_on_startup: false,
            utc_offset_minutes: 24 * 60,
        };
        assert!(bad.offset().is_err());
    }
}
