//! Metric definitions, samples and Prometheus text exposition
//!
//! Collectors describe each metric once with a static [`MetricDef`] (fully
//! qualified name, help text and label names) and report values by sending
//! [`Sample`]s through a cloneable [`MetricSink`]. The coordinator drains the
//! matching [`SampleStream`] once all collectors are done and [`render`]s the
//! samples in the Prometheus text format.
//!
//! All metrics are gauges: every scrape recomputes them from the current state
//! of the GitHub API.

mod exposition;
mod metric_def;
mod sample;
mod sink;

pub use exposition::render;
pub use metric_def::MetricDef;
pub use sample::Sample;
pub use sink::{MetricSink, SampleStream, channel};
