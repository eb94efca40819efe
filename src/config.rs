//! Configuration file handling for fintrack.
//!
//! The configuration file is stored at `$FINTRACK_HOME/config.json` and contains the URL of the
//! finance API, the size of the dashboard history window and, optionally, where the session file
//! lives.

use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "fintrack";
const CONFIG_VERSION: u8 = 1;
const HISTORY_MONTHS: u32 = 4;
const SECRETS: &str = ".secrets";
const SESSION_JSON: &str = "session.json";
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$FINTRACK_HOME` and from there it loads `$FINTRACK_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the data directory, its `.secrets` subdirectory and an initial `config.json` that
    /// points at `api_url`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of data directory, e.g. `$HOME/fintrack`
    /// - `api_url` - The base URL of the finance API, e.g. `http://localhost:3333/api`
    ///
    /// # Errors
    /// - Returns an error if `api_url` is not a usable base URL or if any file operation fails.
    pub async fn create(dir: impl Into<PathBuf>, api_url: &str) -> Result<Self> {
        validate_api_url(api_url)?;

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the fintrack home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            api_url: api_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that the home directory and the config file exist
    /// - load and validate the config file
    /// - validate that the secrets directory exists
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The fintrack home directory is missing, run 'fintrack init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let config = Self {
            secrets: root.join(SECRETS),
            root,
            config_path,
            config_file,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn api_url(&self) -> &str {
        &self.config_file.api_url
    }

    /// How many months the dashboard history covers, ending at the selected month.
    pub fn history_months(&self) -> u32 {
        self.config_file.history_months
    }

    /// Returns the stored `session_path` if it is absolute, otherwise resolves it against the home
    /// directory.
    pub fn session_path(&self) -> PathBuf {
        let p = self.config_file.session_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "fintrack",
///   "config_version": 1,
///   "api_url": "http://localhost:3333/api",
///   "history_months": 4,
///   "session_path": ".secrets/session.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "fintrack"
    app_name: String,

    config_version: u8,

    /// Base URL of the finance API
    api_url: String,

    #[serde(default = "default_history_months")]
    history_months: u32,

    /// Path to the session file (optional, relative to the home directory or absolute)
    /// Defaults to $FINTRACK_HOME/.secrets/session.json if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_path: Option<PathBuf>,
}

fn default_history_months() -> u32 {
    HISTORY_MONTHS
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_url: String::new(),
            history_months: HISTORY_MONTHS,
            session_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from `path` and validates it.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, if `app_name` is not "fintrack", if
    /// `history_months` is zero or if `api_url` is not a usable base URL.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.history_months > 0,
            "Invalid history_months in config file: it must be at least 1"
        );
        validate_api_url(&config.api_url)
            .with_context(|| format!("Invalid api_url in config file {}", path.display()))?;

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the session path. If None, defaults to `.secrets/session.json`.
    fn session_path(&self) -> PathBuf {
        self.session_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(SESSION_JSON))
    }
}

/// Paths get appended to the API URL, so it has to be an absolute URL that can be a base.
fn validate_api_url(api_url: &str) -> Result<()> {
    let url = Url::parse(api_url).with_context(|| format!("'{api_url}' is not a valid URL"))?;
    ensure!(
        !url.cannot_be_a_base(),
        "'{api_url}' cannot be used as the base of the API paths"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const API_URL: &str = "http://localhost:3333/api";

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("fintrack_home");

        let config = Config::create(&home_dir, API_URL).await.unwrap();

        assert_eq!(API_URL, config.api_url());
        assert_eq!(4, config.history_months());
        assert!(config.secrets().is_dir());
        assert!(config.config_path().is_file());
        assert_eq!(
            config.session_path(),
            config.root().join(".secrets").join("session.json")
        );

        let loaded = Config::load(&home_dir).await.unwrap();
        assert_eq!(loaded.api_url(), API_URL);
        assert_eq!(loaded.root(), config.root());
    }

    #[tokio::test]
    async fn test_config_create_rejects_bad_url() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("fintrack_home");
        assert!(Config::create(&home_dir, "localhost api").await.is_err());
        // Nothing gets created for a bad URL.
        assert!(!home_dir.exists());
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert!(format!("{err:#}").contains("fintrack init"));
    }

    #[tokio::test]
    async fn test_config_load_missing_secrets() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), API_URL).await.unwrap();
        std::fs::remove_dir(config.secrets()).unwrap();
        let err = Config::load(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("secrets directory is missing"));
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let json = r#"{
            "app_name": "fintrack",
            "config_version": 1,
            "api_url": "https://finance.example.com/api"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.api_url, "https://finance.example.com/api");
        assert_eq!(config.history_months, 4);
        assert_eq!(
            config.session_path(),
            PathBuf::from(SECRETS).join(SESSION_JSON)
        );
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let json = r#"{
            "app_name": "wrong_app",
            "config_version": 1,
            "api_url": "https://finance.example.com/api"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_load_zero_history_months() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let json = r#"{
            "app_name": "fintrack",
            "config_version": 1,
            "api_url": "https://finance.example.com/api",
            "history_months": 0
        }"#;
        utils::write(&config_path, json).await.unwrap();

        assert!(ConfigFile::load(&config_path).await.is_err());
    }

    #[tokio::test]
    async fn test_session_path_absolute_and_relative() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::create(dir.path(), API_URL).await.unwrap();

        config.config_file.session_path = Some(PathBuf::from("elsewhere/session.json"));
        assert_eq!(
            config.session_path(),
            config.root().join("elsewhere/session.json")
        );

        let absolute = dir.path().join("abs.json");
        config.config_file.session_path = Some(absolute.clone());
        assert_eq!(config.session_path(), absolute);
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let config = ConfigFile {
            api_url: API_URL.to_string(),
            ..ConfigFile::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("session_path"));
        assert!(json.contains("\"history_months\":4"));
    }
}
