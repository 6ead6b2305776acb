// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command};
use std::path::PathBuf;
use tripwire_config::{apply_env_overrides, Config, ConfigManager, ConfigResult};
use tripwire_store::{database_exists, DatabaseConfig, SqliteStore};

mod commands;

fn build_cli() -> Command {
    Command::new("tripwire")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect and manage shared circuit breaker state")
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .value_name("PATH")
                .help("Path to the circuit database (overrides TRIPWIRE_DATABASE and the config file)")
                .global(true),
        )
        .arg(
            Arg::new("config-dir")
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml (defaults to the per-user config directory)")
                .global(true),
        )
        .subcommand(Command::new("init").about("Create the circuit database and apply migrations"))
        .subcommand(
            Command::new("status")
                .about("Show the state of one circuit")
                .arg(Arg::new("namespace").required(true).value_name("NAMESPACE").help("Circuit namespace")),
        )
        .subcommand(Command::new("list").about("List every circuit in the database"))
        .subcommand(
            Command::new("reset")
                .about("Reset a circuit's failure counter to zero")
                .arg(Arg::new("namespace").required(true).value_name("NAMESPACE").help("Circuit namespace"))
                .arg(
                    Arg::new("purge")
                        .long("purge")
                        .help("Delete the record entirely, clearing the close time")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Print the effective configuration, or manage the config file")
                .arg(
                    Arg::new("init")
                        .long("init")
                        .help("Write a default config file if none exists")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("reset")
                        .long("reset")
                        .help("Overwrite the config file with defaults, keeping a .backup")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("check")
                        .long("check")
                        .help("Validate the config file and exit non-zero if it is invalid")
                        .action(ArgAction::SetTrue),
                )
                .group(ArgGroup::new("action").args(["init", "reset", "check"])),
        )
}

fn config_manager(matches: &ArgMatches) -> ConfigResult<ConfigManager> {
    match matches.get_one::<String>("config-dir") {
        Some(dir) => Ok(ConfigManager::with_directory(PathBuf::from(dir))),
        None => ConfigManager::new(),
    }
}

/// Loads the config file with env overrides, falling back to defaults
fn load_config(manager: Option<&ConfigManager>) -> Config {
    if let Some(manager) = manager {
        match manager.load_with_env_overrides() {
            Ok(config) => return config,
            Err(e) => log::warn!("Failed to load config: {}, using defaults", e),
        }
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config);
    config
}

/// Flag first, then `TRIPWIRE_DATABASE`, then the config file
fn resolve_database(matches: &ArgMatches, config: &Config) -> String {
    matches
        .get_one::<String>("database")
        .cloned()
        .unwrap_or_else(|| config.store.path.to_string_lossy().to_string())
}

async fn open_store(db_path: &str, config: &Config) -> Result<SqliteStore> {
    let db_config = DatabaseConfig::new(db_path)
        .with_max_connections(config.store.max_connections)
        .with_wal(config.store.enable_wal);

    SqliteStore::open(db_config)
        .await
        .with_context(|| format!("Failed to open circuit database at {}", db_path))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = build_cli().get_matches();

    let manager = config_manager(&matches);
    if let Err(e) = &manager {
        log::warn!("{}", e);
    }

    let mut config = load_config(manager.as_ref().ok());
    let db_path = resolve_database(&matches, &config);
    config.store.path = db_path.clone().into();

    match matches.subcommand() {
        Some(("config", sub_matches)) => {
            let manager = manager.context("Cannot locate the config file")?;
            commands::manage_config(&manager, &config, sub_matches)
        }
        Some((name, sub_matches)) => {
            let existed = database_exists(&db_path);
            let store = open_store(&db_path, &config).await?;

            let result = match name {
                "init" => commands::init_database(&store, &db_path, existed).await,
                "status" => commands::show_status(&store, sub_matches).await,
                "list" => commands::list_circuits(&store).await,
                "reset" => commands::reset_circuit(&store, sub_matches).await,
                other => Err(anyhow::anyhow!("Unknown command: {}", other)),
            };

            store.close().await;
            result
        }
        None => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_database_flag_wins_over_config() {
        let config = Config::default();

        let matches = build_cli().get_matches_from(["tripwire", "--database", "/tmp/a.db", "list"]);
        assert_eq!(resolve_database(&matches, &config), "/tmp/a.db");

        let matches = build_cli().get_matches_from(["tripwire", "list"]);
        assert_eq!(resolve_database(&matches, &config), "tripwire.db");
    }

    #[test]
    fn test_global_flag_after_subcommand() {
        let matches =
            build_cli().get_matches_from(["tripwire", "status", "payments", "-d", "shared.db"]);
        assert_eq!(resolve_database(&matches, &Config::default()), "shared.db");

        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "status");
        assert_eq!(sub.get_one::<String>("namespace").unwrap(), "payments");
    }

    #[test]
    fn test_config_actions_are_exclusive() {
        let matches =
            build_cli().get_matches_from(["tripwire", "config", "--init", "--config-dir", "/tmp/tw"]);
        let (_, sub) = matches.subcommand().unwrap();
        assert!(sub.get_flag("init"));
        assert_eq!(matches.get_one::<String>("config-dir").unwrap(), "/tmp/tw");

        let result = build_cli().try_get_matches_from(["tripwire", "config", "--init", "--reset"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_dir_flag_selects_manager() {
        let matches = build_cli().get_matches_from(["tripwire", "--config-dir", "/tmp/tw", "list"]);
        let manager = config_manager(&matches).unwrap();
        assert_eq!(manager.config_path(), std::path::Path::new("/tmp/tw/config.toml"));
    }

    #[test]
    fn test_unreadable_config_falls_back_to_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf());
        std::fs::write(manager.config_path(), "[breaker\n").unwrap();

        let config = load_config(Some(&manager));
        assert_eq!(config.breaker.namespace, Config::default().breaker.namespace);
    }
}
