// FILE: crates/cli/src/commands.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::ArgMatches;
use console::style;
use std::time::Duration;
use tripwire_config::{Config, ConfigManager};
use tripwire_core::{CircuitRecord, CircuitState, Namespace, Timestamp};
use tripwire_store::{
    current_version, optimize, queries::counters, verify_integrity, SqliteStore, StateStore,
};

/// Check a freshly opened (and so migrated) database and refresh planner statistics
pub async fn init_database(store: &SqliteStore, db_path: &str, existed: bool) -> Result<()> {
    verify_integrity(store.pool())
        .await
        .context("Database integrity check failed")?;
    optimize(store.pool())
        .await
        .context("Failed to optimize database")?;

    let verb = if existed { "checked" } else { "created" };
    println!("{} Circuit database {}", style("✓").green().bold(), verb);
    println!("  Path: {}", db_path);
    println!("  Schema version: {}", current_version());
    Ok(())
}

/// Show the state of one circuit
pub async fn show_status(store: &SqliteStore, matches: &ArgMatches) -> Result<()> {
    let namespace = namespace_arg(matches)?;

    let record = store
        .read_record(&namespace)
        .await
        .context("Failed to read circuit")?;

    let Some(record) = record else {
        println!("No record for '{}'; the circuit is closed.", namespace);
        return Ok(());
    };

    let now = Timestamp::now();
    println!("\n{}", style(format!("Circuit '{}'", namespace)).bold().cyan());
    println!("{}", "=".repeat(60));
    println!("State: {}", styled_state(record.state_at(now)));
    println!("Consecutive failures: {}", record.counter);
    println!("Close time: {}", format_close_time(record.close_time));
    if record.is_open_at(now) {
        if let Some(close_time) = record.close_time {
            println!("Closes in: {}", format_remaining(close_time.remaining_from(now)));
        }
    }

    Ok(())
}

/// List every circuit in the database
pub async fn list_circuits(store: &SqliteStore) -> Result<()> {
    let records = store
        .list_records()
        .await
        .context("Failed to list circuits")?;

    if records.is_empty() {
        println!("No circuits recorded yet.");
        return Ok(());
    }

    let now = Timestamp::now();
    println!("\n{} Circuits", style(records.len()).bold().cyan());
    println!("{}", "=".repeat(80));

    for record in &records {
        print_record_summary(record, now);
    }

    Ok(())
}

/// Reset a circuit's counter, or delete its record with `--purge`
pub async fn reset_circuit(store: &SqliteStore, matches: &ArgMatches) -> Result<()> {
    let namespace = namespace_arg(matches)?;

    if matches.get_flag("purge") {
        let deleted = counters::delete_counter(store.pool(), &namespace)
            .await
            .context("Failed to delete circuit")?;

        if deleted {
            println!("{} Circuit '{}' removed", style("✓").green().bold(), namespace);
        } else {
            println!("No record for '{}'", namespace);
        }
        return Ok(());
    }

    store
        .upsert_counter(&namespace, 0)
        .await
        .context("Failed to reset circuit")?;

    println!(
        "{} Failure counter for '{}' reset to 0",
        style("✓").green().bold(),
        namespace
    );
    Ok(())
}

/// Print the effective configuration, or run `--init`, `--reset` or `--check`
pub fn manage_config(manager: &ConfigManager, config: &Config, matches: &ArgMatches) -> Result<()> {
    let path = manager.config_path().display();

    if matches.get_flag("init") {
        if manager.initialize().context("Failed to write config")? {
            println!("{} Wrote default config to {}", style("✓").green().bold(), path);
        } else {
            println!("Config already exists at {}", path);
        }
        return Ok(());
    }

    if matches.get_flag("reset") {
        let had_file = manager.config_path().exists();
        manager.reset().context("Failed to reset config")?;
        println!("{} Reset {} to defaults", style("✓").green().bold(), path);
        if had_file {
            println!("  Previous file: {}", manager.backup_path().display());
        }
        return Ok(());
    }

    if matches.get_flag("check") {
        let errors = manager.validate().context("Failed to read config")?;
        if errors.is_empty() {
            println!("{} {} is valid", style("✓").green().bold(), path);
            return Ok(());
        }
        for error in &errors {
            println!("  {} {}", style("✗").red().bold(), error);
        }
        anyhow::bail!("{} has {} invalid setting(s)", path, errors.len());
    }

    show_config(config)
}

/// Print the effective configuration as TOML
fn show_config(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{}", rendered);
    Ok(())
}

fn namespace_arg(matches: &ArgMatches) -> Result<Namespace> {
    let raw = matches
        .get_one::<String>("namespace")
        .ok_or_else(|| anyhow::anyhow!("Namespace is required"))?;

    Namespace::new(raw.as_str()).context("Invalid namespace")
}

fn print_record_summary(record: &CircuitRecord, now: Timestamp) {
    println!(
        "  {:<32} {:<8} failures: {:<6} closes: {}",
        record.namespace.as_str(),
        styled_state(record.state_at(now)),
        record.counter,
        format_close_time(record.close_time)
    );
}

fn styled_state(state: CircuitState) -> String {
    match state {
        CircuitState::Open => style(state).red().bold().to_string(),
        CircuitState::Closed => style(state).green().to_string(),
    }
}

fn format_close_time(close_time: Option<Timestamp>) -> String {
    match close_time {
        None => "never tripped".to_string(),
        Some(ts) => DateTime::<Utc>::from_timestamp_millis(ts.as_millis())
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
            .unwrap_or_else(|| format!("{} ms", ts)),
    }
}

fn format_remaining(remaining: Duration) -> String {
    let seconds = remaining.as_secs();
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}.{:03}s", secs, remaining.subsec_millis())
    }
}
