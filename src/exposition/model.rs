//! Metric family and sample types for the Prometheus text format

use std::fmt;
use std::str::FromStr;

/// Declared type of a metric family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
    Summary,
    #[default]
    Untyped,
}

impl MetricType {
    /// Keyword used on `# TYPE` lines
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Histogram => "histogram",
            MetricType::Summary => "summary",
            MetricType::Untyped => "untyped",
        }
    }

    /// Sample name suffixes that belong to a family of this type
    pub(crate) fn sample_suffixes(&self) -> &'static [&'static str] {
        match self {
            MetricType::Counter => &["", "_total"],
            MetricType::Gauge | MetricType::Untyped => &[""],
            MetricType::Summary => &["", "_sum", "_count"],
            MetricType::Histogram => &["_bucket", "_sum", "_count"],
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(MetricType::Counter),
            "gauge" => Ok(MetricType::Gauge),
            "histogram" => Ok(MetricType::Histogram),
            "summary" => Ok(MetricType::Summary),
            "untyped" => Ok(MetricType::Untyped),
            other => Err(format!("unknown metric type '{}'", other)),
        }
    }
}

/// Label set of a sample
///
/// Keys are unique and kept in first-seen order, which is the order they
/// are written back out in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Labels(Vec<(String, String)>);

impl Labels {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Get the value of a label
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Append a label, rejecting a key that is already present
    ///
    /// Returns `false` (and leaves the set untouched) on a duplicate key.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.0.push((key, value.into()));
        true
    }

    /// Replace the value of an existing label in place
    ///
    /// Returns the previous value, or `None` if the key is absent (in which
    /// case nothing is added).
    pub fn replace(&mut self, key: &str, value: impl Into<String>) -> Option<String> {
        self.0
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| std::mem::replace(v, value.into()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    /// Later duplicates of a key are dropped.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut labels = Labels::new();
        for (k, v) in iter {
            labels.push(k, v);
        }
        labels
    }
}

/// One observed value of a metric
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Sample name; the family name or a suffixed variant (`_bucket`, `_sum`, ...)
    pub name: String,
    pub labels: Labels,
    pub value: f64,
    /// Milliseconds since the epoch, only present when the source sent one
    pub timestamp: Option<i64>,
}

impl Sample {
    pub fn new(name: impl Into<String>, labels: Labels, value: f64) -> Self {
        Self {
            name: name.into(),
            labels,
            value,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp = Some(timestamp_ms);
        self
    }
}

/// Named group of samples sharing documentation and type
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub documentation: String,
    pub metric_type: MetricType,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    pub fn new(name: impl Into<String>, metric_type: MetricType) -> Self {
        Self {
            name: name.into(),
            documentation: String::new(),
            metric_type,
            samples: Vec::new(),
        }
    }
}
