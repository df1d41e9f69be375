//! Human-readable and JSON renderings of reports.

use std::io::{Result as IoResult, Write};

use anyhow::Result;
use serde::Serialize;
use validator_statistics::{BlockAnalysis, EpochSummary, ValidatorFault, ValidatorSummary};

pub fn write_json(out: &mut impl Write, report: &impl Serialize) -> Result<()> {
    serde_json::to_writer(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_epoch_summary(
    out: &mut impl Write,
    summary: &EpochSummary,
    verbose: bool,
) -> IoResult<()> {
    writeln!(out, "Epoch {}:", summary.epoch)?;

    if verbose {
        let slots = summary.last_slot.saturating_sub(summary.first_slot) + 1;

        for proposal in &summary.proposals {
            writeln!(
                out,
                "  Slot {} ({}/{slots}):",
                proposal.slot,
                proposal.slot.saturating_sub(summary.first_slot),
            )?;
            writeln!(out, "    Proposer: {}", proposal.validator_index)?;
            writeln!(out, "    Proposed: {}", mark(proposal.block))?;
        }
    } else if summary.proposals.iter().any(|proposal| !proposal.block) {
        writeln!(out, "  Missed proposals:")?;

        for proposal in summary.proposals.iter().filter(|proposal| !proposal.block) {
            writeln!(
                out,
                "    Slot {} (validator {})",
                proposal.slot, proposal.validator_index,
            )?;
        }
    }

    let active = summary.active_validators;

    writeln!(out, "  Attestations:")?;

    for (label, count) in [
        ("Participating", summary.participating_validators),
        ("Correct head", summary.head_correct_validators),
        ("Timely head", summary.head_timely_validators),
        ("Timely source", summary.source_timely_validators),
        ("Correct target", summary.target_correct_validators),
        ("Timely target", summary.target_timely_validators),
    ] {
        writeln!(
            out,
            "    {label}: {count}/{active} ({:.2}%)",
            percentage(count, active),
        )?;
    }

    // Every block in the epoch was a chance to sign, whoever proposed it.
    let chances = summary.blocks;

    if verbose {
        for misses in &summary.sync_committee {
            let included = chances.saturating_sub(misses.missed);

            writeln!(out, "  Sync committee validator {}:", misses.validator_index)?;
            writeln!(out, "    Chances: {chances}")?;
            writeln!(out, "    Included: {included}")?;
            writeln!(out, "    Inclusion %: {:.2}", percentage(included, chances))?;
        }
    } else if !summary.sync_committee.is_empty() {
        writeln!(out, "  Missed sync committees (excluding missed blocks):")?;

        for misses in &summary.sync_committee {
            writeln!(
                out,
                "    {} ({:.2}%) by validator {}",
                misses.missed,
                percentage(misses.missed, chances),
                misses.validator_index,
            )?;
        }
    }

    Ok(())
}

pub fn write_block_analysis(
    out: &mut impl Write,
    analysis: &BlockAnalysis,
    verbose: bool,
) -> IoResult<()> {
    if verbose {
        for (index, attestation) in analysis.attestations.iter().enumerate() {
            write!(out, "Attestation {index}: distance {}, ", attestation.distance)?;

            if let Some(duplicate) = attestation.duplicate {
                writeln!(
                    out,
                    "duplicate of attestation {} in block {}",
                    duplicate.index, duplicate.block,
                )?;
                continue;
            }

            write!(
                out,
                "{}/{}/{} new/total/possible votes",
                attestation.new_votes, attestation.votes, attestation.possible_votes,
            )?;

            if attestation.new_votes == 0 {
                writeln!(out)?;
                continue;
            }

            let flags = attestation.flags;

            if !flags.head_correct {
                write!(out, ", head vote incorrect")?;
            } else if !flags.head_timely {
                write!(out, ", head vote correct but late")?;
            }

            if !flags.source_timely {
                write!(out, ", source vote late")?;
            }

            if !flags.target_correct {
                write!(out, ", target vote incorrect")?;
            } else if !flags.target_timely {
                write!(out, ", target vote correct but late")?;
            }

            writeln!(
                out,
                ", score {:.3}, value {:.3}",
                attestation.score, attestation.value,
            )?;
        }

        let sync_committee = analysis.sync_committee;

        if sync_committee.contributions > 0 {
            writeln!(
                out,
                "Sync committee contributions: {} contributions, score {:.3}, value {:.3}",
                sync_committee.contributions, sync_committee.score, sync_committee.value,
            )?;
        }
    }

    writeln!(out, "Value for block {}: {:.3}", analysis.slot, analysis.value)
}

pub fn write_validator_summary(
    out: &mut impl Write,
    summary: &ValidatorSummary,
    verbose: bool,
) -> IoResult<()> {
    writeln!(out, "Epoch {}:", summary.epoch)?;

    for slot in &summary.slots {
        writeln!(
            out,
            "  Slot {}: {}/{} included, {} correct head, {} timely head, {} timely source, \
             {} correct target, {} timely target",
            slot.slot,
            slot.attestations_included,
            slot.attestations_expected,
            slot.correct_head,
            slot.timely_head,
            slot.timely_source,
            slot.correct_target,
            slot.timely_target,
        )?;
    }

    if verbose {
        for proposal in &summary.proposals {
            writeln!(
                out,
                "  Proposal at slot {} by validator {}: {}",
                proposal.slot,
                proposal.validator_index,
                mark(proposal.block),
            )?;
        }
    }

    if !summary.non_participating_validators.is_empty() {
        writeln!(out, "  Non-participating validators:")?;

        for missed in &summary.non_participating_validators {
            writeln!(
                out,
                "    {} (slot {}, committee {})",
                missed.validator_index, missed.slot, missed.committee_index,
            )?;
        }
    }

    write_faults(out, "Incorrect head", &summary.incorrect_head_validators, false)?;
    write_faults(out, "Untimely head", &summary.untimely_head_validators, true)?;
    write_faults(out, "Untimely source", &summary.untimely_source_validators, true)?;
    write_faults(out, "Incorrect target", &summary.incorrect_target_validators, false)?;
    write_faults(out, "Untimely target", &summary.untimely_target_validators, true)?;

    Ok(())
}

fn write_faults(
    out: &mut impl Write,
    label: &str,
    faults: &[ValidatorFault],
    with_distance: bool,
) -> IoResult<()> {
    if faults.is_empty() {
        return Ok(());
    }

    writeln!(out, "  {label} validators:")?;

    for fault in faults {
        write!(
            out,
            "    {} (slot {}, committee {}",
            fault.validator_index, fault.slot, fault.committee_index,
        )?;

        if with_distance {
            write!(out, ", inclusion distance {}", fault.inclusion_delay)?;
        }

        writeln!(out, ")")?;
    }

    Ok(())
}

const fn mark(present: bool) -> &'static str {
    if present {
        "✓"
    } else {
        "✕"
    }
}

#[expect(clippy::cast_precision_loss)]
#[expect(clippy::float_arithmetic)]
fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }

    100.0 * part as f64 / whole as f64
}
