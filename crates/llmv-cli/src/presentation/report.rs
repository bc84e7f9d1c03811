//! Row formatting for run summaries, score tables and probe history.
//!
//! Functions here return strings; handlers decide where they are printed.

use chrono::SecondsFormat;
use llmv_core::{ProbeResult, RunReport, ScoreOutcome, ScoreRecord};

use super::tables::{format_optional, truncate_string};

pub const SCORE_TABLE_WIDTH: usize = 100;
pub const HISTORY_TABLE_WIDTH: usize = 110;

pub fn score_header() -> String {
    format!(
        "{:<4} {:<40} {:>6} {:>9}  {:<5} {:<5} {:<5} {:<5} {:<5}",
        "#", "Target", "Score", "", "Spd", "Eff", "Cost", "Cap", "Rec"
    )
}

/// One score table row. `position` is 1-based.
pub fn score_row(position: usize, record: &ScoreRecord) -> String {
    let target = truncate_string(&record.target.to_string(), 40);
    match &record.outcome {
        ScoreOutcome::Scored {
            components,
            composite,
        } => format!(
            "{:<4} {:<40} {:>6.1} {:>9}  {:<5.1} {:<5.1} {:<5.1} {:<5.1} {:<5.1}",
            position,
            target,
            composite,
            format_optional(record.score_suffix(), ""),
            components.speed,
            components.efficiency,
            components.cost,
            components.capability,
            components.recency,
        ),
        ScoreOutcome::Unscored { reason } => format!(
            "{:<4} {:<40} {:>6} {:>9}  unscored: {}",
            position,
            target,
            "-",
            "",
            truncate_string(reason, 40)
        ),
    }
}

pub fn history_header() -> String {
    format!(
        "{:<24} {:<15} {:<17} {:>8} {:>8} {:>4}  {}",
        "Recorded", "Kind", "Outcome", "Latency", "TTFC", "Try", "Reason"
    )
}

/// One probe history row. Cached results carry a `*` after the outcome.
pub fn history_row(result: &ProbeResult) -> String {
    let outcome = if result.from_cache {
        format!("{}*", result.outcome)
    } else {
        result.outcome.to_string()
    };
    format!(
        "{:<24} {:<15} {:<17} {:>8} {:>8} {:>4}  {}",
        result.recorded_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        result.kind.as_str(),
        outcome,
        format!("{}ms", result.latency_ms),
        format_optional(result.time_to_first_chunk_ms.map(|ms| format!("{ms}ms")), "-"),
        result.attempts,
        truncate_string(result.reason.as_deref().unwrap_or(""), 40),
    )
}

/// Human-readable run summary, one line per entry.
pub fn run_summary_lines(report: &RunReport) -> Vec<String> {
    let elapsed_ms = (report.finished_at - report.started_at).num_milliseconds().max(0);
    let mut lines = vec![format!(
        "Run {} finished in {}.{}s: {} result(s), {} from cache, {} network probe(s)",
        report.run_id,
        elapsed_ms / 1000,
        (elapsed_ms % 1000) / 100,
        report.results.len(),
        report.cache_hits,
        report.network_probes,
    )];

    if let Some(reason) = partial_reason(report) {
        lines.push(format!(
            "Run was PARTIAL ({reason}); {} probe(s) not dispatched",
            report.undispatched
        ));
    }

    let outcomes: Vec<String> = report
        .summary()
        .into_iter()
        .map(|(outcome, count)| format!("{outcome}={count}"))
        .collect();
    if !outcomes.is_empty() {
        lines.push(format!("Outcomes: {}", outcomes.join(", ")));
    }

    if report.short_circuited > 0 {
        lines.push(format!(
            "Skipped {} probe(s) after terminal existence checks",
            report.short_circuited
        ));
    }
    for skipped in &report.skipped {
        lines.push(format!("Not probed: {} ({})", skipped.target, skipped.reason));
    }

    let failed = report.failed().count();
    if failed > 0 {
        lines.push(format!("{failed} probe(s) failed after exhausting retries"));
    }
    if report.sink_failures > 0 {
        lines.push(format!(
            "WARNING: {} result(s) could not be persisted",
            report.sink_failures
        ));
    }
    lines
}

fn partial_reason(report: &RunReport) -> Option<String> {
    match report.status {
        llmv_core::RunStatus::Complete => None,
        llmv_core::RunStatus::Partial { reason } => Some(reason.to_string()),
    }
}
