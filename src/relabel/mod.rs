//! Scrape relabeling pipeline
//!
//! Parses a scrape body, rewrites interface labels using the current
//! mapping table and serializes the result, followed by a
//! `relabel_success` marker line telling the scraper whether the mapping
//! was actually applied.

mod engine;

pub use self::engine::{
    EMULATED_INTERFACE_SUFFIX, NODE_NAME_PREFIX, RelabelReport, TARGET_METRICS, relabel,
};

use crate::error::AppResult;
use crate::exposition::{TimestampFormat, parse, serialize};
use crate::mapping::MappingTable;

/// Name of the marker line appended to every scrape response
pub const SUCCESS_METRIC: &str = "relabel_success";

/// How a scrape request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeOutcome {
    /// Mapping applied to a non-empty scrape
    Relabeled,
    /// Metrics served without a usable mapping table, or nothing to serve
    Passthrough,
    /// The metrics source could not be fetched
    FetchError,
    /// The metrics source returned malformed exposition text
    ParseError,
}

impl ScrapeOutcome {
    /// Convert outcome to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeOutcome::Relabeled => "relabeled",
            ScrapeOutcome::Passthrough => "passthrough",
            ScrapeOutcome::FetchError => "fetch_error",
            ScrapeOutcome::ParseError => "parse_error",
        }
    }
}

/// Result of running one scrape through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeOutput {
    /// Serialized families, without the marker line
    pub body: String,
    pub outcome: ScrapeOutcome,
    pub report: RelabelReport,
}

impl ScrapeOutput {
    /// Output for a scrape whose source could not be fetched
    pub fn fetch_failed() -> Self {
        Self {
            body: String::new(),
            outcome: ScrapeOutcome::FetchError,
            report: RelabelReport::default(),
        }
    }

    pub fn success(&self) -> bool {
        self.outcome == ScrapeOutcome::Relabeled
    }

    /// Body plus the trailing `relabel_success 0|1` line
    pub fn into_response_body(self) -> String {
        let flag = if self.success() { 1 } else { 0 };
        format!("{}\n{} {}", self.body, SUCCESS_METRIC, flag)
    }
}

/// Parse, relabel and re-serialize one scrape body
///
/// Malformed input yields an empty body rather than a partial one. The
/// scrape counts as relabeled only when a non-empty mapping table was
/// available and there was something to serve.
pub fn render_scrape(
    raw: &str,
    table: Option<&MappingTable>,
    timestamps: TimestampFormat,
) -> ScrapeOutput {
    match relabel_text(raw, table, timestamps) {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(error = %e, "Metrics source returned unusable exposition text");
            ScrapeOutput {
                body: String::new(),
                outcome: ScrapeOutcome::ParseError,
                report: RelabelReport::default(),
            }
        }
    }
}

/// Like [`render_scrape`], but malformed input is an error
///
/// # Errors
///
/// `Parse` if `raw` is not valid exposition text.
pub fn relabel_text(
    raw: &str,
    table: Option<&MappingTable>,
    timestamps: TimestampFormat,
) -> AppResult<ScrapeOutput> {
    let mut families = parse(raw)?;

    let report = relabel(&mut families, table);
    let body = serialize(&families, timestamps);

    let mapping_usable = table.is_some_and(|t| !t.is_empty());
    let outcome = if mapping_usable && !body.is_empty() {
        ScrapeOutcome::Relabeled
    } else {
        ScrapeOutcome::Passthrough
    };

    tracing::debug!(
        families = families.len(),
        rewritten = report.rewritten,
        passed_through = report.passed_through,
        outcome = outcome.as_str(),
        "Scrape relabeled"
    );

    Ok(ScrapeOutput {
        body,
        outcome,
        report,
    })
}
