//! Prometheus text format parser
//!
//! Turns a scrape body into an ordered list of metric families. Samples are
//! grouped under the family declared by the preceding `# HELP` / `# TYPE`
//! lines as long as their name is one the declared type allows (e.g.
//! `_bucket`, `_sum`, `_count` for histograms). A sample that does not fit
//! the current family is kept as an untyped family of its own instead of
//! failing the whole scrape. Two neighbouring families may not share a name,
//! since their serialized form would read back as one family.

use super::model::{Labels, MetricFamily, MetricType, Sample};
use thiserror::Error;

/// Error returned for text that violates the exposition format
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line number of the offending line
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("metadata line is missing the {0}")]
    IncompleteMetadata(&'static str),

    #[error("unknown metric type '{0}'")]
    UnknownType(String),

    #[error("duplicate {directive} line for metric '{name}'")]
    DuplicateMetadata {
        directive: &'static str,
        name: String,
    },

    #[error("TYPE line for metric '{0}' appears after its samples")]
    TypeAfterSamples(String),

    #[error("malformed sample: {0}")]
    MalformedSample(String),

    #[error("metric family '{0}' directly follows a family of the same name")]
    RepeatedFamily(String),
}

enum Metadata<'a> {
    Help { name: &'a str, doc: String },
    Type { name: &'a str, metric_type: MetricType },
}

/// Family under construction
struct FamilyBuilder {
    /// Name exactly as it appeared on the metadata line (or the stray sample)
    declared: String,
    documentation: String,
    metric_type: MetricType,
    samples: Vec<Sample>,
    help_seen: bool,
    type_seen: bool,
    /// Built from a sample that matched no declared family
    stray: bool,
    /// Line that opened the family
    start_line: usize,
}

impl FamilyBuilder {
    fn declared(name: &str, start_line: usize) -> Self {
        Self {
            declared: name.to_string(),
            documentation: String::new(),
            metric_type: MetricType::Untyped,
            samples: Vec::new(),
            help_seen: false,
            type_seen: false,
            stray: false,
            start_line,
        }
    }

    fn stray(sample: Sample, start_line: usize) -> Self {
        Self {
            declared: sample.name.clone(),
            documentation: String::new(),
            metric_type: MetricType::Untyped,
            samples: vec![sample],
            help_seen: false,
            type_seen: false,
            stray: true,
            start_line,
        }
    }

    fn accepts(&self, sample_name: &str) -> bool {
        if self.stray {
            return sample_name == self.declared;
        }
        match sample_name.strip_prefix(self.declared.as_str()) {
            Some(suffix) => self.metric_type.sample_suffixes().contains(&suffix),
            None => false,
        }
    }

    fn finish(self) -> MetricFamily {
        // Counters are named without their `_total` suffix; the samples keep it.
        // Only a counter whose samples all carry the declared name is renamed,
        // so the result reads back under the same name.
        let canonical = self.metric_type == MetricType::Counter
            && !self.samples.is_empty()
            && self.samples.iter().all(|s| s.name == self.declared);
        let name = match self.declared.strip_suffix("_total") {
            Some(base) if canonical && !base.is_empty() => base.to_string(),
            _ => self.declared,
        };

        MetricFamily {
            name,
            documentation: self.documentation,
            metric_type: self.metric_type,
            samples: self.samples,
        }
    }
}

/// Parse exposition text into metric families, preserving input order
pub fn parse(text: &str) -> Result<Vec<MetricFamily>, ParseError> {
    let mut families = Vec::new();
    let mut current: Option<FamilyBuilder> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let at_line = |kind| ParseError {
            line: line_no,
            kind,
        };

        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            match parse_metadata(comment).map_err(at_line)? {
                None => {}
                Some(Metadata::Help { name, doc }) => {
                    let family = family_for(&mut current, &mut families, name, line_no)?;
                    if family.help_seen {
                        return Err(at_line(ParseErrorKind::DuplicateMetadata {
                            directive: "HELP",
                            name: name.to_string(),
                        }));
                    }
                    family.help_seen = true;
                    family.documentation = doc;
                }
                Some(Metadata::Type { name, metric_type }) => {
                    let family = family_for(&mut current, &mut families, name, line_no)?;
                    if family.type_seen {
                        return Err(at_line(ParseErrorKind::DuplicateMetadata {
                            directive: "TYPE",
                            name: name.to_string(),
                        }));
                    }
                    if !family.samples.is_empty() {
                        return Err(at_line(ParseErrorKind::TypeAfterSamples(
                            name.to_string(),
                        )));
                    }
                    family.type_seen = true;
                    family.metric_type = metric_type;
                }
            }
            continue;
        }

        let sample = parse_sample(line).map_err(at_line)?;
        match current.as_mut() {
            Some(family) if family.accepts(&sample.name) => family.samples.push(sample),
            _ => {
                if let Some(done) = current.take() {
                    close(&mut families, done)?;
                }
                tracing::trace!(
                    sample = %sample.name,
                    line = line_no,
                    "Sample matches no declared family, keeping it as untyped"
                );
                current = Some(FamilyBuilder::stray(sample, line_no));
            }
        }
    }

    if let Some(done) = current {
        close(&mut families, done)?;
    }

    Ok(families)
}

/// Return the builder for `name`, closing the current family if it is a different one
fn family_for<'a>(
    current: &'a mut Option<FamilyBuilder>,
    families: &mut Vec<MetricFamily>,
    name: &str,
    line: usize,
) -> Result<&'a mut FamilyBuilder, ParseError> {
    let same = matches!(current, Some(family) if !family.stray && family.declared == name);
    if !same {
        if let Some(done) = current.take() {
            close(families, done)?;
        }
    }
    Ok(current.get_or_insert_with(|| FamilyBuilder::declared(name, line)))
}

/// Finish a family and append it
///
/// Two neighbouring families with one name would merge when the output is
/// read back, so the second one is rejected.
fn close(families: &mut Vec<MetricFamily>, done: FamilyBuilder) -> Result<(), ParseError> {
    let line = done.start_line;
    let family = done.finish();
    if families.last().is_some_and(|prev| prev.name == family.name) {
        return Err(ParseError {
            line,
            kind: ParseErrorKind::RepeatedFamily(family.name),
        });
    }
    families.push(family);
    Ok(())
}

/// Split off the first whitespace-delimited token
fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

/// Parse the part of a comment line after `#`
///
/// Returns `None` for ordinary comments.
fn parse_metadata(comment: &str) -> Result<Option<Metadata<'_>>, ParseErrorKind> {
    if !comment.starts_with(char::is_whitespace) {
        return Ok(None);
    }

    let (keyword, rest) = split_token(comment);
    match keyword {
        "HELP" => {
            let (name, doc) = split_token(rest);
            if name.is_empty() {
                return Err(ParseErrorKind::IncompleteMetadata("metric name"));
            }
            Ok(Some(Metadata::Help {
                name,
                doc: unescape_help(doc),
            }))
        }
        "TYPE" => {
            let (name, rest) = split_token(rest);
            if name.is_empty() {
                return Err(ParseErrorKind::IncompleteMetadata("metric name"));
            }
            let (type_token, _) = split_token(rest);
            if type_token.is_empty() {
                return Err(ParseErrorKind::IncompleteMetadata("metric type"));
            }
            let metric_type = type_token
                .parse()
                .map_err(|_| ParseErrorKind::UnknownType(type_token.to_string()))?;
            Ok(Some(Metadata::Type { name, metric_type }))
        }
        _ => Ok(None),
    }
}

fn unescape_help(doc: &str) -> String {
    let mut out = String::with_capacity(doc.len());
    let mut chars = doc.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn malformed(msg: impl Into<String>) -> ParseErrorKind {
    ParseErrorKind::MalformedSample(msg.into())
}

fn parse_sample(line: &str) -> Result<Sample, ParseErrorKind> {
    let name_end = line
        .find(|c: char| c == '{' || c.is_whitespace())
        .unwrap_or(line.len());
    let name = &line[..name_end];
    if !is_valid_metric_name(name) {
        return Err(malformed(format!("invalid metric name '{}'", name)));
    }

    let mut rest = &line[name_end..];
    let labels = match rest.trim_start().strip_prefix('{') {
        Some(inner) => {
            let (labels, after) = parse_labels(inner)?;
            rest = after;
            labels
        }
        None => Labels::new(),
    };

    if !rest.starts_with(char::is_whitespace) {
        return Err(malformed(format!("expected whitespace before value of '{}'", name)));
    }

    let mut tokens = rest.split_whitespace();
    let value_token = tokens
        .next()
        .ok_or_else(|| malformed(format!("missing value for '{}'", name)))?;
    let value = parse_value(value_token)?;
    let timestamp = tokens.next().map(parse_timestamp).transpose()?;
    if let Some(extra) = tokens.next() {
        return Err(malformed(format!("unexpected trailing token '{}'", extra)));
    }

    Ok(Sample {
        name: name.to_string(),
        labels,
        value,
        timestamp,
    })
}

/// Parse a label set; `s` starts right after the opening brace
fn parse_labels(s: &str) -> Result<(Labels, &str), ParseErrorKind> {
    let mut labels = Labels::new();
    let mut rest = s;

    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix('}') {
            return Ok((labels, after));
        }

        let key_end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .ok_or_else(|| malformed("unterminated label set"))?;
        let key = &rest[..key_end];
        if !is_valid_label_name(key) {
            return Err(malformed(format!("invalid label name near '{}'", rest)));
        }

        rest = rest[key_end..]
            .trim_start()
            .strip_prefix('=')
            .ok_or_else(|| malformed(format!("expected '=' after label '{}'", key)))?
            .trim_start();
        rest = rest
            .strip_prefix('"')
            .ok_or_else(|| malformed(format!("value of label '{}' must be quoted", key)))?;

        let (value, after) = parse_quoted(rest)?;
        if !labels.push(key, value) {
            return Err(malformed(format!("duplicate label '{}'", key)));
        }

        rest = after.trim_start();
        if let Some(after) = rest.strip_prefix(',') {
            rest = after;
        } else if !rest.starts_with('}') {
            return Err(malformed("expected ',' or '}' in label set"));
        }
    }
}

/// Read a quoted label value; `s` starts right after the opening quote
fn parse_quoted(s: &str) -> Result<(String, &str), ParseErrorKind> {
    let mut value = String::new();
    let mut chars = s.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((value, &s[i + 1..])),
            '\\' => match chars.next() {
                Some((_, '\\')) => value.push('\\'),
                Some((_, '"')) => value.push('"'),
                Some((_, 'n')) => value.push('\n'),
                Some((_, other)) => {
                    return Err(malformed(format!("invalid escape '\\{}' in label value", other)));
                }
                None => break,
            },
            _ => value.push(c),
        }
    }

    Err(malformed("unterminated label value"))
}

fn parse_value(token: &str) -> Result<f64, ParseErrorKind> {
    match token {
        "NaN" => Ok(f64::NAN),
        "+Inf" | "Inf" => Ok(f64::INFINITY),
        "-Inf" => Ok(f64::NEG_INFINITY),
        _ => token
            .parse::<f64>()
            .map_err(|_| malformed(format!("invalid value '{}'", token))),
    }
}

fn parse_timestamp(token: &str) -> Result<i64, ParseErrorKind> {
    if let Ok(ms) = token.parse::<i64>() {
        return Ok(ms);
    }
    match token.parse::<f64>() {
        Ok(ms) if ms.is_finite() => Ok(ms.trunc() as i64),
        _ => Err(malformed(format!("invalid timestamp '{}'", token))),
    }
}
