//! Application settings.
//!
//! [`ShelfConfig`] is read from the `[shelfwise]` section of
//! `config/config.toml` and from `SHELFWISE__*` environment variables, e.g.
//! `SHELFWISE__SHELFWISE__DATABASE_PATH=/tmp/db.json`.

use crate::schema::SchemaFormat;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "config/config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShelfConfig {
    /// JSON snapshot the store is loaded from and saved to
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Where `dump` writes the schema
    #[serde(default = "default_schema_dump_path")]
    pub schema_dump_path: PathBuf,
    /// `sql` or `json`
    #[serde(default = "default_schema_format")]
    pub schema_format: String,
    #[serde(default = "default_migrations_table")]
    pub migrations_table: String,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("db/shelfwise.json")
}

fn default_schema_dump_path() -> PathBuf {
    PathBuf::from("db/schema.sql")
}

fn default_schema_format() -> String {
    "sql".to_string()
}

fn default_migrations_table() -> String {
    crate::migration::DEFAULT_STATE_TABLE.to_string()
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            schema_dump_path: default_schema_dump_path(),
            schema_format: default_schema_format(),
            migrations_table: default_migrations_table(),
        }
    }
}

impl ShelfConfig {
    /// Load from `config/config.toml`, falling back to env vars.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if neither source can be read or the section is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from the given TOML file (optional), then env vars.
    ///
    /// A file that exists but cannot be parsed is skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if neither source can be read or the section is malformed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let builder = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("SHELFWISE").separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if path.exists() {
                    log::warn!(
                        "failed to load {}, falling back to env: {err}",
                        path.display()
                    );
                }
                Config::builder()
                    .add_source(Environment::with_prefix("SHELFWISE").separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                        ))
                    })?
            }
        };

        match settings.get::<ShelfConfig>("shelfwise") {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Shelfwise configuration could not be loaded from file or environment: {e}"
            ))),
        }
    }

    /// Parsed [`schema_format`](Self::schema_format)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` for anything but `sql` or `json`.
    pub fn schema_format(&self) -> Result<SchemaFormat, ConfigError> {
        self.schema_format.parse().map_err(ConfigError::Message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ShelfConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.migrations_table, "schema_migrations");
        assert_eq!(config.schema_format().unwrap(), SchemaFormat::Sql);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[shelfwise]\ndatabase_path = \"/tmp/books.json\"\nschema_format = \"json\"").unwrap();

        let config = ShelfConfig::load_from(file.path()).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/books.json"));
        assert_eq!(config.schema_dump_path, PathBuf::from("db/schema.sql"));
        assert_eq!(config.schema_format().unwrap(), SchemaFormat::Json);
    }

    #[test]
    fn test_broken_file_falls_back() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[shelfwise\nnot toml").unwrap();
        let config = ShelfConfig::load_from(file.path()).unwrap();
        assert_eq!(config, ShelfConfig::default());
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let config = ShelfConfig {
            schema_format: "yaml".to_string(),
            ..ShelfConfig::default()
        };
        assert!(config.schema_format().is_err());
    }
}
