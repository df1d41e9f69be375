use std::io::{Result as IoResult, Write};

use anyhow::{Context as _, Result};
use beacon_api::{BeaconNode, BlockId};
use clap::Subcommand;
use log::info;
use serde::Serialize;
use types::nonstandard::ValidatorId;
use validator_statistics::{
    AnalysisOptions, BlockAnalyzer, ChainContext, EpochSummaryAnalysis, ValidatorSummaryAnalysis,
};

use crate::{auditor_args::OutputOptions, epoch_selector::EpochSelector, output};

#[derive(Clone, Subcommand)]
#[cfg_attr(test, derive(PartialEq, Eq, Debug))]
pub enum AuditorCommand {
    /// Summarize proposals, attestations and sync committee participation in an epoch
    /// (example: auditor epoch-summary --epoch last)
    EpochSummary {
        /// `current`, `last`, an epoch number or `-N` for N epochs ago
        #[clap(long, allow_hyphen_values = true, default_value = "current")]
        epoch: EpochSelector,

        /// Restrict the summary to these validators (indices or public keys)
        #[clap(long, value_delimiter = ',')]
        validators: Vec<ValidatorId>,
    },

    /// Score the attestations and sync aggregate in a block
    /// (example: auditor block-analyze --block-id 12345)
    BlockAnalyze {
        /// `head`, `genesis`, `finalized`, a slot or a block root
        #[clap(long, default_value = "head")]
        block_id: BlockId,
    },

    /// Report on the duties of specific validators in an epoch
    /// (example: auditor validator-summary --validators 1,2,3)
    ValidatorSummary {
        /// `current`, `last`, an epoch number or `-N` for N epochs ago
        #[clap(long, allow_hyphen_values = true, default_value = "current")]
        epoch: EpochSelector,

        /// Validators to report on (indices or public keys)
        #[clap(long, value_delimiter = ',', required = true)]
        validators: Vec<ValidatorId>,
    },
}

impl AuditorCommand {
    pub fn run<N: BeaconNode + ?Sized, W: Write>(
        self,
        node: &N,
        options: AnalysisOptions,
        output: OutputOptions,
        out: &mut W,
    ) -> Result<()> {
        let context = ChainContext::load(node).context("failed to load chain parameters")?;
        let current_slot = context.chain_time.current_slot();
        let current_epoch = context.chain_time.current_epoch();

        match self {
            Self::EpochSummary { epoch, validators } => {
                let epoch = epoch.resolve(current_epoch);

                info!("summarizing epoch {epoch}");

                let summary = EpochSummaryAnalysis::new(node, &context, options)?.run(
                    epoch,
                    &validators,
                    current_slot,
                )?;

                report(out, output, &summary, output::write_epoch_summary)
            }
            Self::BlockAnalyze { block_id } => {
                info!("analyzing block {block_id}");

                let analysis = BlockAnalyzer::new(node, &context, options)?.run(block_id)?;

                report(out, output, &analysis, output::write_block_analysis)
            }
            Self::ValidatorSummary { epoch, validators } => {
                let epoch = epoch.resolve(current_epoch);

                info!(
                    "summarizing {} validators in epoch {epoch}",
                    validators.len(),
                );

                let summary = ValidatorSummaryAnalysis::new(node, &context, options)?.run(
                    epoch,
                    &validators,
                    current_slot,
                )?;

                report(out, output, &summary, output::write_validator_summary)
            }
        }
    }
}

fn report<W: Write, R: Serialize>(
    out: &mut W,
    output: OutputOptions,
    report: &R,
    write_text: impl FnOnce(&mut W, &R, bool) -> IoResult<()>,
) -> Result<()> {
    if output.quiet {
        return Ok(());
    }

    if output.json {
        return output::write_json(out, report);
    }

    write_text(out, report, output.verbose)?;

    Ok(())
}
