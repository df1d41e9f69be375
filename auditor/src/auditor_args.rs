use core::time::Duration;

use clap::{Args, Parser};
use log::LevelFilter;
use reqwest::Url;
use validator_statistics::DEFAULT_MAX_WALK_STEPS;

use crate::{
    commands::AuditorCommand,
    consts::{DEFAULT_BEACON_NODE_URL, DEFAULT_TIMEOUT_MILLIS},
};

/// Attestation, proposal and sync committee performance as seen by a beacon node
#[derive(Parser)]
#[clap(verbatim_doc_comment)]
pub struct AuditorArgs {
    #[clap(flatten)]
    pub connection: ConnectionOptions,

    #[clap(flatten)]
    pub output: OutputOptions,

    #[clap(subcommand)]
    pub command: AuditorCommand,
}

#[derive(Args)]
pub struct ConnectionOptions {
    /// Beacon node to query
    #[clap(long = "connection", global = true, default_value = DEFAULT_BEACON_NODE_URL)]
    pub beacon_node_url: Url,

    /// Time allowed for the whole command in milliseconds
    #[clap(long, global = true, default_value_t = DEFAULT_TIMEOUT_MILLIS)]
    pub timeout: u64,

    /// Most slots to walk back through when looking for a block
    #[clap(long, global = true, default_value_t = DEFAULT_MAX_WALK_STEPS)]
    pub max_walk_steps: u64,
}

impl ConnectionOptions {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}

// False positive. The `bool`s are independent.
#[expect(clippy::struct_excessive_bools)]
#[derive(Clone, Copy, Args)]
pub struct OutputOptions {
    /// Print reports as JSON
    #[clap(long, global = true)]
    pub json: bool,

    /// Print more detail and debug logs
    #[clap(long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Print nothing on success
    #[clap(long, global = true)]
    pub quiet: bool,

    /// Color log messages even when stderr is not a terminal
    #[clap(long, global = true)]
    pub always_write_style: bool,
}

impl OutputOptions {
    #[must_use]
    pub const fn log_level(self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        }
    }
}
