//! Metric collectors and the scrape coordinator
//!
//! A [`SubCollector`] gathers one family of metrics from the GitHub API and
//! reports them through a [`MetricSink`](crate::metrics::MetricSink). Collectors
//! are created by name from a static registry and driven by a [`Scraper`],
//! which runs them concurrently on every scrape and adds per-collector success
//! and duration gauges.
//!
//! # Failure model
//!
//! A collector that hits errors still reports whatever it managed to gather and
//! returns the first error it encountered; later errors are logged and dropped.
//! The coordinator turns a failed, panicked or timed-out collector into a
//! success gauge of `0` and never fails the scrape as a whole.

mod actions;
mod first_error;
mod rate_limit;
mod registry;
mod scraper;

pub use actions::ActionsCollector;
pub use first_error::FirstError;
pub use rate_limit::RateLimitCollector;
pub use registry::{CollectorContext, CollectorFactory, FACTORIES, create_collector, is_known_collector};
pub use scraper::Scraper;

use crate::Result;
use crate::metrics::MetricSink;
use core::fmt::Debug;
use futures::future::BoxFuture;
use std::sync::Arc;

/// One family of metrics.
pub trait SubCollector: Send + Sync + Debug {
    /// Gathers the current values and sends them to `sink`.
    ///
    /// The returned future is spawned on its own task, so it must own everything
    /// it touches.
    fn update(self: Arc<Self>, sink: MetricSink) -> BoxFuture<'static, Result<()>>;
}
