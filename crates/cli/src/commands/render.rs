//! Terminal rendering shared by the commands.

use medassist_core::{AppError, AppResult};
use medassist_rag::{source_list_markdown, AdviceOutcome, Advisor, PharmacyEntry};
use serde::Serialize;
use std::io::Write;

pub const NO_DATA_WARNING: &str = "No medical data found for that condition.";
pub const NO_PHARMACIES_WARNING: &str =
    "No pharmacies found for that location or rate limit reached. Try again later.";

const ADVICE_HEADING: &str = "## Medical Advice";
const SOURCES_HEADING: &str = "## Sources Used for Medical Accuracy";
const PHARMACIES_HEADING: &str = "## Nearby Pharmacies";

pub fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

/// Run one advice turn, printing the answer as it arrives when `stream` is set.
pub async fn advice_turn(
    advisor: &mut Advisor,
    session_id: &str,
    condition: &str,
    stream: bool,
) -> AppResult<()> {
    if !stream {
        let outcome = advisor.advise(session_id, condition).await?;
        return print_outcome(&outcome, true);
    }

    let mut started = false;
    let outcome = advisor
        .advise_streaming(session_id, condition, |chunk| {
            if !started {
                println!("{}\n", ADVICE_HEADING);
                started = true;
            }
            print!("{}", chunk);
            std::io::stdout().flush().ok();
        })
        .await?;

    if started {
        println!();
    }
    print_outcome(&outcome, !started)
}

/// Print an advice outcome; `with_answer` is false when the answer was already streamed.
pub fn print_outcome(outcome: &AdviceOutcome, with_answer: bool) -> AppResult<()> {
    write_outcome(
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
        outcome,
        with_answer,
    )?;
    Ok(())
}

pub fn print_pharmacies(entries: &[PharmacyEntry]) -> AppResult<()> {
    write_pharmacies(&mut std::io::stdout().lock(), entries)?;
    Ok(())
}

/// Render an outcome; failures go to `err`, everything else to `out`.
fn write_outcome(
    out: &mut impl Write,
    err: &mut impl Write,
    outcome: &AdviceOutcome,
    with_answer: bool,
) -> std::io::Result<()> {
    match outcome {
        AdviceOutcome::Answered { answer, sources } => {
            if with_answer {
                writeln!(out, "{}\n", ADVICE_HEADING)?;
                writeln!(out, "{}", answer)?;
            }
            if !sources.is_empty() {
                writeln!(out, "\n{}\n", SOURCES_HEADING)?;
                writeln!(out, "{}", source_list_markdown(sources))?;
            }
        }
        AdviceOutcome::NoData => writeln!(out, "{}", NO_DATA_WARNING)?,
        AdviceOutcome::Failed { message } => {
            writeln!(err, "Error generating medical advice: {}", message)?
        }
    }
    Ok(())
}

fn write_pharmacies(out: &mut impl Write, entries: &[PharmacyEntry]) -> std::io::Result<()> {
    if entries.is_empty() {
        return writeln!(out, "{}", NO_PHARMACIES_WARNING);
    }

    writeln!(out, "\n{}\n", PHARMACIES_HEADING)?;
    for entry in entries {
        writeln!(out, "- [{}]({})", entry.name, entry.link)?;
    }
    Ok(())
}
