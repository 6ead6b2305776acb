//! Config file location and environment overrides

use crate::persistence::ConfigFile;
use crate::{Config, ConfigError, ConfigResult, ValidationError};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Overrides `breaker.namespace`
pub const ENV_NAMESPACE: &str = "TRIPWIRE_NAMESPACE";
/// Overrides `breaker.error_threshold`
pub const ENV_ERROR_THRESHOLD: &str = "TRIPWIRE_ERROR_THRESHOLD";
/// Overrides `breaker.error_timeout_secs`
pub const ENV_ERROR_TIMEOUT_SECS: &str = "TRIPWIRE_ERROR_TIMEOUT_SECS";
/// Overrides `store.path`
pub const ENV_DATABASE: &str = "TRIPWIRE_DATABASE";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Finds, loads and writes the tripwire config file
pub struct ConfigManager {
    file: ConfigFile,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Uses the per-user config directory
    ///
    /// - Linux: `~/.config/tripwire/`
    /// - macOS: `~/Library/Application Support/tripwire/`
    /// - Windows: `%APPDATA%\tripwire\`
    pub fn new() -> ConfigResult<Self> {
        let dirs = ProjectDirs::from("", "", "tripwire").ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::with_directory(dirs.config_dir().to_path_buf()))
    }

    pub fn with_directory(config_dir: PathBuf) -> Self {
        Self {
            file: ConfigFile::new(config_dir.join(CONFIG_FILE_NAME)),
            config_dir,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> &Path {
        self.file.path()
    }

    /// Where the previous file is kept after a save
    pub fn backup_path(&self) -> PathBuf {
        self.file.backup_path()
    }

    /// Loads the file, or the defaults when there is none
    pub fn load(&self) -> ConfigResult<Config> {
        self.file.load()
    }

    /// Validates and atomically writes `config`
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.file.save(config)
    }

    /// Writes a default file unless one exists
    ///
    /// Returns `true` when a file was created.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!("Config already exists at {}", self.config_path().display());
            return Ok(false);
        }

        self.save(&Config::default())?;
        Ok(true)
    }

    /// Overwrites the file with the defaults; the old one goes to the backup
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Returns every out-of-range setting in the file
    pub fn validate(&self) -> ConfigResult<Vec<ValidationError>> {
        Ok(self.load()?.validate().err().unwrap_or_default())
    }

    /// Loads the file, then applies the `TRIPWIRE_*` overrides
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config);

        if let Err(errors) = config.validate() {
            for error in &errors {
                log::warn!("After env overrides: {}", error);
            }
        }

        Ok(config)
    }
}

/// Applies `TRIPWIRE_*` environment overrides on top of `config`
pub fn apply_env_overrides(config: &mut Config) {
    if let Ok(namespace) = std::env::var(ENV_NAMESPACE) {
        config.breaker.namespace = namespace;
    }

    if let Some(threshold) = parse_env(ENV_ERROR_THRESHOLD) {
        config.breaker.error_threshold = threshold;
    }

    if let Some(timeout) = parse_env(ENV_ERROR_TIMEOUT_SECS) {
        config.breaker.error_timeout_secs = timeout;
    }

    if let Ok(path) = std::env::var(ENV_DATABASE) {
        config.store.path = PathBuf::from(path);
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a valid value", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn setup_test_manager() -> (TempDir, ConfigManager) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf());
        (temp_dir, manager)
    }

    fn clear_env() {
        for name in [ENV_NAMESPACE, ENV_ERROR_THRESHOLD, ENV_ERROR_TIMEOUT_SECS, ENV_DATABASE] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_load_with_missing_file() {
        let (_temp_dir, manager) = setup_test_manager();
        assert_eq!(manager.load().unwrap(), Config::default());
    }

    #[test]
    fn test_load_with_corrupt_file() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(manager.config_path(), "not = [valid").expect("Should write");

        let err = manager.load().unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_save_and_load() {
        let (_temp_dir, manager) = setup_test_manager();

        let mut config = Config::default();
        config.breaker.namespace = "billing".to_string();

        manager.save(&config).expect("Should save config");
        let loaded = manager.load().expect("Should load config");

        assert_eq!(loaded.breaker.namespace, "billing");
    }

    #[test]
    fn test_initialize_creates_file() {
        let (_temp_dir, manager) = setup_test_manager();

        let created = manager.initialize().expect("Should initialize");
        assert!(created);
        assert!(manager.config_path().exists());
    }

    #[test]
    fn test_initialize_with_existing_file() {
        let (_temp_dir, manager) = setup_test_manager();

        manager.save(&Config::default()).expect("Should save");

        let created = manager.initialize().expect("Should initialize");
        assert!(!created);
    }

    #[test]
    fn test_reset() {
        let (_temp_dir, manager) = setup_test_manager();

        let mut config = Config::default();
        config.breaker.error_threshold = 2;
        manager.save(&config).expect("Should save");

        manager.reset().expect("Should reset");

        let loaded = manager.load().expect("Should load");
        assert_eq!(loaded, Config::default());

        let backup = std::fs::read_to_string(manager.backup_path()).expect("Should keep backup");
        assert!(backup.contains("error_threshold = 2"));
    }

    #[test]
    fn test_validate_valid_config() {
        let (_temp_dir, manager) = setup_test_manager();
        manager.save(&Config::default()).expect("Should save");

        let errors = manager.validate().expect("Should validate");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_validate_invalid_config() {
        let (_temp_dir, manager) = setup_test_manager();

        std::fs::write(manager.config_path(), "[store]\nmax_connections = 0\n")
            .expect("Should write");

        let errors = manager.validate().expect("Should validate");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "store.max_connections");
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        let (_temp_dir, manager) = setup_test_manager();
        manager.save(&Config::default()).expect("Should save");

        std::env::set_var(ENV_NAMESPACE, "inventory");
        std::env::set_var(ENV_ERROR_THRESHOLD, "4");
        std::env::set_var(ENV_ERROR_TIMEOUT_SECS, "15");
        std::env::set_var(ENV_DATABASE, "/tmp/shared-circuits.db");

        let config = manager
            .load_with_env_overrides()
            .expect("Should load with overrides");
        clear_env();

        assert_eq!(config.breaker.namespace, "inventory");
        assert_eq!(config.breaker.error_threshold, 4);
        assert_eq!(config.breaker.error_timeout_secs, 15);
        assert_eq!(config.store.path, PathBuf::from("/tmp/shared-circuits.db"));
    }

    #[test]
    #[serial]
    fn test_unparseable_env_override_ignored() {
        let (_temp_dir, manager) = setup_test_manager();

        std::env::set_var(ENV_ERROR_THRESHOLD, "lots");
        let config = manager
            .load_with_env_overrides()
            .expect("Should load with overrides");
        clear_env();

        assert_eq!(config.breaker.error_threshold, 10);
    }

    #[test]
    fn test_config_file_path() {
        let (_temp_dir, manager) = setup_test_manager();
        assert!(manager.config_path().ends_with("config.toml"));
    }
}
