//! Prometheus text format serializer

use super::model::{MetricFamily, Sample};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// How sample timestamps are written back out
///
/// `Legacy` reproduces the wire output consumers of this proxy have always
/// received: the millisecond timestamp is expressed in seconds, written in
/// its shortest decimal form with at least one fractional digit, and the
/// decimal point is then dropped (`1700000000123` stays `1700000000123`, but
/// `1700000000000` becomes `17000000000`). `Millis` writes the integer
/// millisecond value unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampFormat {
    #[default]
    Legacy,
    Millis,
}

impl TimestampFormat {
    pub fn render(&self, timestamp_ms: i64) -> String {
        match self {
            TimestampFormat::Millis => timestamp_ms.to_string(),
            TimestampFormat::Legacy => {
                let mut seconds = (timestamp_ms as f64 / 1000.0).to_string();
                if !seconds.contains('.') {
                    seconds.push_str(".0");
                }
                seconds.replace('.', "")
            }
        }
    }
}

impl std::str::FromStr for TimestampFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(TimestampFormat::Legacy),
            "millis" => Ok(TimestampFormat::Millis),
            other => Err(format!(
                "unknown timestamp format '{}', expected 'legacy' or 'millis'",
                other
            )),
        }
    }
}

/// Serialize families to exposition text
///
/// Every family gets its HELP and TYPE lines, even when it has no samples.
/// Lines are separated by `\n` with no trailing newline.
pub fn serialize(families: &[MetricFamily], timestamps: TimestampFormat) -> String {
    let mut lines = Vec::with_capacity(families.iter().map(|f| f.samples.len() + 2).sum());

    for family in families {
        if family.documentation.is_empty() {
            lines.push(format!("# HELP {}", family.name));
        } else {
            lines.push(format!(
                "# HELP {} {}",
                family.name,
                escape_help(&family.documentation)
            ));
        }
        lines.push(format!("# TYPE {} {}", family.name, family.metric_type));

        for sample in &family.samples {
            lines.push(sample_line(sample, timestamps));
        }
    }

    lines.join("\n")
}

fn sample_line(sample: &Sample, timestamps: TimestampFormat) -> String {
    let mut line = sample.name.clone();

    if !sample.labels.is_empty() {
        line.push('{');
        for (i, (key, value)) in sample.labels.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            // Writing to a String cannot fail.
            let _ = write!(line, "{}=\"{}\"", key, escape_label_value(value));
        }
        line.push('}');
    }

    line.push(' ');
    line.push_str(&format_value(sample.value));

    if let Some(ts) = sample.timestamp {
        line.push(' ');
        line.push_str(&timestamps.render(ts));
    }

    line
}

pub(crate) fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else {
        value.to_string()
    }
}

fn escape_help(doc: &str) -> String {
    doc.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    if !value.contains(['\\', '"', '\n']) {
        return value.to_string();
    }
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
