//! Ordered reporting of terminal records.
//!
//! Pipelines finish out of order; the `OrderedReporter` buffers their
//! records and releases them strictly in ascending identifier order to a
//! [`ReportSink`].

mod config;
mod ordered;
mod sink;

pub use config::ReportConfig;
pub use ordered::{OrderedReporter, ReportError};
pub use sink::{render_progress, render_record, ReportSink, TracingSink};
