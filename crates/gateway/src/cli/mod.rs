pub mod chat;
pub mod config;
pub mod run;

use clap::{Parser, Subcommand};

/// sodai: bulky-waste pickup intake assistant.
#[derive(Debug, Parser)]
#[command(name = "sodai", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// Interactive intake conversation in the terminal.
    Chat {
        /// Resume an existing thread instead of starting a new one.
        #[arg(long)]
        thread: Option<String>,
    },
    /// Send a single message and print the reply.
    Run {
        /// The resident's message.
        message: String,
        /// Thread to continue (a new one is created when omitted).
        #[arg(long)]
        thread: Option<String>,
        /// Print the full turn outcome as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `SODAI_CONFIG` (or `config.toml`
/// by default). A missing file yields the defaults.
pub fn load_config() -> anyhow::Result<(sg_domain::config::Config, String)> {
    let config_path = std::env::var("SODAI_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        sg_domain::config::Config::default()
    };

    Ok((config, config_path))
}
