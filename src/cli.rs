//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged on top
//! of the configuration file and the environment, so a flag always wins.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Forwards error-level log events to SMS recipients.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to an optional TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address the HTTP server listens on.
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Minimum severity that triggers an SMS alert.
    #[arg(long, value_name = "LEVEL")]
    pub threshold: Option<String>,

    /// Emit one sample event per level right after startup.
    #[arg(long)]
    pub self_test: bool,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(listen) = self.listen {
            dict.insert("listen_addr".into(), Value::from(listen.to_string()));
        }

        if let Some(threshold) = &self.threshold {
            dict.insert("threshold".into(), Value::from(threshold.clone()));
        }

        // Only an explicit flag overrides; absence leaves the lower layers alone.
        if self.self_test {
            dict.insert("startup_self_test".into(), Value::from(true));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
