use std::{io::Write as _, process::ExitCode};

use anyhow::Result;
use beacon_api::{Deadline, HttpBeaconNode};
use clap::{Error as ClapError, Parser as _};
use log::{error, info};
use reqwest::blocking::Client;
use validator_statistics::AnalysisOptions;

use crate::auditor_args::AuditorArgs;

mod auditor_args;
mod commands;
mod consts;
mod epoch_selector;
mod output;

fn main() -> ExitCode {
    if let Err(error) = try_main() {
        error.downcast_ref().map(ClapError::exit);
        error!("{error:?}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main() -> Result<()> {
    let AuditorArgs {
        connection,
        output,
        command,
    } = AuditorArgs::try_parse()?;

    binary_utils::initialize_logger(
        module_path!(),
        output.log_level(),
        output.always_write_style,
    )?;

    info!("querying beacon node at {}", connection.beacon_node_url);

    // One deadline covers every request of the command.
    let deadline = Deadline::after(connection.timeout());

    let options = AnalysisOptions {
        deadline,
        max_walk_steps: connection.max_walk_steps,
    };

    let client = Client::builder().build()?;
    let node = HttpBeaconNode::new(client, connection.beacon_node_url, deadline);
    let mut stdout = std::io::stdout().lock();

    command.run(&node, options, output, &mut stdout)?;

    stdout.flush()?;

    Ok(())
}
