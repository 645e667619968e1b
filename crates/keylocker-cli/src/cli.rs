use clap::{Parser, Subcommand};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "keylocker",
    about = "Encrypt short strings under named, locally stored key pairs",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Encrypt a value and print the envelope.
    Encrypt {
        /// Logical key name; created on first use.
        key_name: String,
        value: String,
    },
    /// Decrypt an envelope and print the plaintext.
    Decrypt {
        key_name: String,
        envelope: String,
    },
    /// Report capability status and run an encrypt/decrypt round trip.
    Health,
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}
