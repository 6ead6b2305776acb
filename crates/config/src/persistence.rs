//! Reading and writing `config.toml`
//!
//! Writes go to a temp file in the same directory and are renamed over the
//! old file, which is first copied to `config.toml.backup`.

use crate::{
    Config, ConfigError, ConfigResult, CONFIG_VERSION, ENV_DATABASE, ENV_ERROR_THRESHOLD,
    ENV_ERROR_TIMEOUT_SECS, ENV_NAMESPACE,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A config file on disk
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("toml.backup")
    }

    /// Reads the file; a missing file yields the defaults
    ///
    /// Out-of-range values are logged, not rejected, so a bad edit does not
    /// stop guarded services from starting.
    pub fn load(&self) -> ConfigResult<Config> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", self.path.display());
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: self.path.clone(),
            });
        }

        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;

        if config.version > CONFIG_VERSION {
            log::warn!(
                "{} has version {}, this build understands {}; unknown keys are ignored",
                self.path.display(),
                config.version,
                CONFIG_VERSION
            );
        }

        if let Err(errors) = config.validate() {
            for error in &errors {
                log::warn!("{}: {}", self.path.display(), error);
            }
        }

        Ok(config)
    }

    /// Validates and writes `config`, keeping the previous file as a backup
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        config.validate().map_err(ConfigError::Invalid)?;

        let rendered = render(config)?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));

        fs::create_dir_all(dir).map_err(|source| self.write_error(source))?;

        if self.path.exists() {
            fs::copy(&self.path, self.backup_path()).map_err(|source| self.write_error(source))?;
        }

        let mut staged = NamedTempFile::new_in(dir).map_err(|source| self.write_error(source))?;
        staged
            .write_all(rendered.as_bytes())
            .and_then(|()| staged.flush())
            .map_err(|source| self.write_error(source))?;
        staged
            .persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        log::info!("Wrote config to {}", self.path.display());
        Ok(())
    }

    fn write_error(&self, source: io::Error) -> ConfigError {
        ConfigError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

/// Renders `config` with a header naming the environment overrides
fn render(config: &Config) -> ConfigResult<String> {
    let body = toml::to_string_pretty(config)?;
    Ok(format!(
        "# Tripwire circuit breaker configuration\n\
         #\n\
         # Environment variables take precedence over this file:\n\
         #   {ENV_NAMESPACE}, {ENV_ERROR_THRESHOLD},\n\
         #   {ENV_ERROR_TIMEOUT_SECS}, {ENV_DATABASE}\n\
         # Set TRIPWIRE=off to bypass every breaker in a process.\n\n\
         {body}"
    ))
}
