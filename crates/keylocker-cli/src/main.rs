mod cli;
mod config;
mod locker;

use std::path::Path;

use crate::cli::ConfigCommand;
use clap::Parser;
use color_eyre::Result;
use keylocker::{CryptoProvider, KeyLocker, KeyStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const HEALTH_KEY: &str = "keylocker.health";

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config_path = config::config_path()?;
    let config = config::Config::read(&config_path)?;
    match cli.command {
        cli::Command::Encrypt { key_name, value } => {
            let locker = locker::locker_from_config(&config)?;
            let sealed = locker.encrypt(&value, &key_name).await.map_err(eyre)?;
            println!("{sealed}");
        }
        cli::Command::Decrypt { key_name, envelope } => {
            let locker = locker::locker_from_config(&config)?;
            let plain = locker.decrypt(&envelope, &key_name).await.map_err(eyre)?;
            println!("{plain}");
        }
        cli::Command::Health => {
            let locker = locker::locker_from_config(&config)?;
            for line in run_health_check(&locker).await? {
                println!("{line}");
            }
        }
        cli::Command::Version => print_version(),
        cli::Command::Config(ConfigCommand::Init) => init_config(&config, &config_path)?,
    }

    Ok(())
}

fn init_tracing() {
    // stdout carries envelopes and plaintext; logs go to stderr.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn eyre(err: keylocker::LockerError) -> color_eyre::Report {
    color_eyre::eyre::eyre!(err.to_string())
}

fn print_version() {
    println!("keylocker {}", env!("CARGO_PKG_VERSION"));
}

/// Encrypts and decrypts a probe value, returning the report lines.
async fn run_health_check<S, C>(locker: &KeyLocker<S, C>) -> Result<Vec<String>>
where
    S: KeyStore + ?Sized,
    C: CryptoProvider + ?Sized,
{
    if !locker.is_operational() {
        return Ok(vec![
            "Locker: degraded (values pass through unencrypted)".to_string(),
        ]);
    }

    let payload = "ok";
    let sealed = locker.encrypt(payload, HEALTH_KEY).await.map_err(eyre)?;
    if sealed == payload {
        color_eyre::eyre::bail!("encryption returned the plaintext");
    }
    let round_trip = locker.decrypt(&sealed, HEALTH_KEY).await.map_err(eyre)?;
    if round_trip != payload {
        color_eyre::eyre::bail!("locker round-trip failed");
    }
    Ok(vec![
        format!("Key algorithm: {}", locker.config().key.algorithm()),
        "Locker: ok".to_string(),
    ])
}

fn init_config(config: &config::Config, path: &Path) -> Result<()> {
    if config.create_at(path)? {
        println!("Config initialized at {}", path.display());
    } else {
        println!("Config already present at {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, sync::Arc};

    use keylocker::{Capability, KeyParams, LockerConfig, StoreConfig};
    use keylocker_core::InMemoryKeyStore;
    use keylocker_crypto::NativeCryptoProvider;

    use super::*;

    fn memory_locker() -> KeyLocker<InMemoryKeyStore, NativeCryptoProvider> {
        KeyLocker::new(
            LockerConfig::new(StoreConfig::default(), KeyParams::X25519),
            Capability::Available(Arc::new(InMemoryKeyStore::default())),
            Capability::Available(Arc::new(NativeCryptoProvider::new())),
        )
        .expect("locker")
    }

    #[tokio::test]
    async fn health_check_round_trips() {
        let report = run_health_check(&memory_locker()).await.expect("health");
        assert_eq!(report.last().map(String::as_str), Some("Locker: ok"));
        assert!(report.iter().any(|line| line.contains("X25519")));
    }

    #[tokio::test]
    async fn health_check_reports_degraded_locker() {
        let locker: KeyLocker<InMemoryKeyStore, NativeCryptoProvider> = KeyLocker::new(
            LockerConfig::default(),
            Capability::unavailable("no store"),
            Capability::Available(Arc::new(NativeCryptoProvider::new())),
        )
        .expect("locker");

        let report = run_health_check(&locker).await.expect("health");
        assert!(report[0].contains("degraded"));
    }

    #[tokio::test]
    async fn health_check_against_file_backend() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config::Config {
            data_dir: Some(PathBuf::from(dir.path())),
            locker: LockerConfig::new(StoreConfig::default(), KeyParams::X25519),
            ..config::Config::default()
        };
        let locker = locker::locker_from_config(&config).expect("locker");

        let report = run_health_check(&locker).await.expect("health");
        assert_eq!(report.last().map(String::as_str), Some("Locker: ok"));
        let written = std::fs::read_dir(dir.path()).expect("read dir").count();
        assert!(written > 0, "file store left nothing on disk");
    }
}
