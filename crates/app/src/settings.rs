//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` and from `LEDGER_`-prefixed environment variables
//! (`LEDGER_APP__LEVEL=debug`, `LEDGER_SWEEP__INTERVAL_SECS=60`, ...).
use config::{Config, ConfigError, Environment, File, Source};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("ledger.db".to_string())
    }
}

/// Periodic job that marks every pending transaction due before today as
/// paid.
#[derive(Debug, Deserialize)]
pub struct Sweep {
    pub enabled: bool,
    pub interval_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    #[serde(default)]
    pub database: Database,
    pub sweep: Sweep,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(File::with_name("settings").required(false))
    }

    /// Defaults, then `file`, then the environment.
    fn load<S>(file: S) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("sweep.enabled", false)?
            .set_default("sweep.interval_secs", 3600)?
            .add_source(file)
            .add_source(
                Environment::with_prefix("LEDGER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(raw: &str) -> Result<Settings, ConfigError> {
        Settings::load(File::from_str(raw, config::FileFormat::Toml))
    }

    #[test]
    fn memory_database_and_defaults() {
        let settings = from_toml("database = \"memory\"").unwrap();
        assert!(matches!(settings.database, Database::Memory));
        assert_eq!(settings.app.level, "info");
        assert!(!settings.sweep.enabled);
        assert_eq!(settings.sweep.interval_secs, 3600);
    }

    #[test]
    fn database_defaults_to_local_file() {
        let settings = from_toml("").unwrap();
        assert!(matches!(settings.database, Database::Sqlite(ref path) if path == "ledger.db"));
    }

    #[test]
    fn sqlite_database_with_sweep() {
        let settings = from_toml(
            r#"
            [app]
            level = "debug"

            [database]
            sqlite = "/tmp/ledger.db"

            [sweep]
            enabled = true
            interval_secs = 60
            "#,
        )
        .unwrap();
        assert!(matches!(settings.database, Database::Sqlite(ref path) if path == "/tmp/ledger.db"));
        assert_eq!(settings.app.level, "debug");
        assert!(settings.sweep.enabled);
        assert_eq!(settings.sweep.interval_secs, 60);
    }
}
