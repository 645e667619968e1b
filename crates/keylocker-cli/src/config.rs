use std::{
    env,
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use dirs::config_dir;
use keylocker_core::LockerConfig;
use serde::{Deserialize, Serialize};

/// User-level configuration, read from [`config_path`].
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Override for the directory holding the file-backed key store.
    pub data_dir: Option<PathBuf>,
    /// Where key records are persisted.
    #[serde(default)]
    pub backend: StoreBackend,
    /// Store names, key and cipher parameters, degrade policy.
    #[serde(default)]
    pub locker: LockerConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    File,
    Keyring,
}

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "KEYLOCKER_CONFIG";

impl Config {
    /// Read `path`; a missing or blank file yields the defaults.
    pub fn read(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err).wrap_err_with(|| format!("reading {}", path.display())),
        };
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        let cfg: Self =
            toml::from_str(&contents).wrap_err_with(|| format!("parsing {}", path.display()))?;
        cfg.locker
            .validate()
            .wrap_err_with(|| format!("invalid locker settings in {}", path.display()))?;
        Ok(cfg)
    }

    /// Write to `path` unless a file is already there. Returns whether it wrote.
    pub fn create_at(&self, path: &Path) -> Result<bool> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(err) => return Err(err.into()),
        };
        file.write_all(toml::to_string_pretty(self)?.as_bytes())?;
        Ok(true)
    }
}

/// `$KEYLOCKER_CONFIG`, else `<config_dir>/keylocker/config.toml`.
pub fn config_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    let base = config_dir().ok_or_else(|| eyre!("no config dir available"))?;
    Ok(base.join("keylocker").join("config.toml"))
}
