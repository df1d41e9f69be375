use std::io::Write as _;

use anyhow::Result;
use chrono::{Local, SecondsFormat};
use env_logger::{Builder, Env, WriteStyle};
use log::LevelFilter;

/// Environment variable with extra filter directives in `env_logger` syntax.
pub const LOG_FILTER_VARIABLE: &str = "AUDITOR_LOG";

/// Sends log messages from the workspace crates and `module_path` to stderr.
///
/// Standard output is left to reports.
pub fn initialize_logger(
    module_path: &str,
    level: LevelFilter,
    always_write_style: bool,
) -> Result<()> {
    let mut builder = Builder::new();

    builder
        .filter_level(LevelFilter::Off)
        .filter_module("beacon_api", level)
        .filter_module("binary_utils", level)
        .filter_module("chain_time", level)
        .filter_module("validator_statistics", level)
        .filter_module(module_path, level)
        .parse_env(Env::new().filter(LOG_FILTER_VARIABLE))
        .format(|formatter, record| {
            writeln!(
                formatter,
                "[{}] {:<5} {}: {}",
                Local::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                record.level(),
                record.target(),
                record.args(),
            )
        });

    if always_write_style {
        builder.write_style(WriteStyle::Always);
    }

    builder.try_init()?;

    Ok(())
}
