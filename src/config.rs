use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_USER_AGENT: &str = concat!("polyapi/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PolyapiConfig {
    pub database: Option<String>,
    pub user_agent: Option<String>,
    /// Per-request timeout; 0 disables it
    pub timeout_secs: Option<u64>,
}

/// Effective settings after merging CLI flags over the config file
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database: PathBuf,
    pub user_agent: String,
    pub timeout: Option<Duration>,
}

impl Settings {
    pub fn resolve(database: Option<PathBuf>, config: Option<PolyapiConfig>) -> Self {
        let config = config.unwrap_or_default();
        let database = database
            .or_else(|| config.database.map(PathBuf::from))
            .unwrap_or_else(default_database_path);
        let timeout = match config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self {
            database,
            user_agent: config.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            timeout,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("polyapi.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("db").join("polyapi.db")
}

pub fn load_config(path: Option<&Path>) -> Result<Option<PolyapiConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: PolyapiConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

/// Read a credential from the environment at the point of use
pub fn credential(var: &'static str) -> Result<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(Error::MissingCredential(var)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("polyapi.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polyapi.toml");
        std::fs::write(&path, "database = \"cache/test.db\"\ntimeout_secs = 0\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        let settings = Settings::resolve(None, config);
        assert_eq!(settings.database, PathBuf::from("cache/test.db"));
        assert_eq!(settings.timeout, None);
        assert_eq!(settings.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_cli_database_wins() {
        let config = PolyapiConfig {
            database: Some("from-file.db".into()),
            ..Default::default()
        };
        let settings = Settings::resolve(Some(PathBuf::from("flag.db")), Some(config));
        assert_eq!(settings.database, PathBuf::from("flag.db"));
        assert_eq!(settings.timeout, Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)));
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(None, None);
        assert_eq!(settings.database, default_database_path());
    }

    #[test]
    fn test_bad_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polyapi.toml");
        std::fs::write(&path, "timeout_secs = \"soon\"\n").unwrap();
        assert!(matches!(load_config(Some(&path)), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_credential() {
        assert!(matches!(
            credential("POLYAPI_TEST_UNSET_CREDENTIAL"),
            Err(Error::MissingCredential("POLYAPI_TEST_UNSET_CREDENTIAL"))
        ));
    }
}
