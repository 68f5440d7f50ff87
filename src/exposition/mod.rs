//! Prometheus text exposition format
//!
//! Parsing into [`MetricFamily`] records and serializing them back. The
//! parser keeps family, sample and label order so that a scrape passed
//! through unchanged serializes to an equivalent document.

mod model;
mod parser;
mod serializer;

pub use self::model::{Labels, MetricFamily, MetricType, Sample};
pub use self::parser::{ParseError, ParseErrorKind, parse};
pub use self::serializer::{TimestampFormat, serialize};
