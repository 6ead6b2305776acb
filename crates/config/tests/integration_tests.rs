//! Integration tests for the configuration system

use std::path::PathBuf;
use tempfile::TempDir;
use tripwire_config::{
    BreakerSettings, Config, ConfigManager, ConfigSection, StoreSettings, CONFIG_VERSION,
};

fn setup_test_manager() -> Result<(TempDir, ConfigManager), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf());
    Ok((temp_dir, manager))
}

#[test]
fn test_full_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    let created = manager.initialize()?;
    assert!(created);

    let config = manager.load()?;
    assert_eq!(config.version, CONFIG_VERSION);

    let mut modified = config.clone();
    modified.breaker.namespace = "search-backend".to_string();
    modified.store.path = PathBuf::from("/var/lib/tripwire/circuits.db");
    manager.save(&modified)?;

    let reloaded = manager.load()?;
    assert_eq!(reloaded.breaker.namespace, "search-backend");
    assert_eq!(reloaded.store.path, PathBuf::from("/var/lib/tripwire/circuits.db"));

    manager.reset()?;
    let after_reset = manager.load()?;
    assert_eq!(after_reset, Config::default());

    Ok(())
}

#[test]
fn test_hand_written_file() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    std::fs::write(
        manager.config_path(),
        r#"
version = 1

[breaker]
namespace = "payments"
watched_kinds = ["timeout", "connection"]
error_threshold = 5
error_timeout_secs = 30

[store]
path = "shared.db"
max_connections = 4
enable_wal = false
"#,
    )?;

    let config = manager.load()?;
    assert_eq!(
        config.breaker,
        BreakerSettings {
            namespace: "payments".to_string(),
            watched_kinds: vec!["timeout".to_string(), "connection".to_string()],
            error_threshold: 5,
            error_timeout_secs: 30,
        }
    );
    assert_eq!(
        config.store,
        StoreSettings {
            path: PathBuf::from("shared.db"),
            max_connections: 4,
            enable_wal: false,
        }
    );
    assert!(manager.validate()?.is_empty());

    Ok(())
}

#[test]
fn test_config_validation_integration() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    manager.save(&Config::default())?;
    assert!(manager.validate()?.is_empty());

    let mut invalid = Config::default();
    invalid.breaker.error_timeout_secs = 0;
    assert!(manager.save(&invalid).is_err());

    // The rejected save left the previous file intact
    assert_eq!(manager.load()?, Config::default());

    Ok(())
}

#[test]
fn test_validation_reported_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    std::fs::write(
        manager.config_path(),
        "[breaker]\nnamespace = \"\"\nerror_threshold = 0\n",
    )?;

    let errors = manager.validate()?;
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.field == "breaker.namespace"));
    assert!(errors.iter().any(|e| e.field == "breaker.error_threshold"));

    Ok(())
}

#[test]
fn test_sections_merge_independently() {
    let mut breaker = BreakerSettings::default();
    breaker.merge(BreakerSettings {
        error_threshold: 3,
        ..Default::default()
    });
    assert_eq!(breaker.error_threshold, 3);
    assert_eq!(breaker.section_name(), "breaker");

    let store = StoreSettings::default();
    assert_eq!(store.section_name(), "store");
}
