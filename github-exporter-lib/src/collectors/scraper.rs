use super::{CollectorContext, SubCollector, create_collector};
use crate::Result;
use crate::metrics::{MetricDef, MetricSink, Sample, channel};
use core::time::Duration;
use futures::future::join_all;
use std::sync::Arc;
use tokio::time::Instant;

const LOG_TARGET: &str = "   scraper";

static COLLECTOR_SUCCESS: MetricDef = MetricDef::new(
    "github_scrape_collector_success",
    "github_exporter: Whether a collector succeeded.",
    &["collector"],
);

static COLLECTOR_DURATION: MetricDef = MetricDef::new(
    "github_scrape_collector_duration_seconds",
    "github_exporter: Duration of a collector scrape.",
    &["collector"],
);

/// Runs a fixed set of collectors concurrently.
///
/// Each collector's update runs on its own task so a panic is contained and
/// reported as a failure. The coordinator waits for every collector (or for the
/// optional per-collector timeout) before returning.
#[derive(Debug)]
pub struct Scraper {
    collectors: Vec<(String, Arc<dyn SubCollector>)>,
    timeout: Option<Duration>,
}

impl Scraper {
    #[must_use]
    pub const fn new(collectors: Vec<(String, Arc<dyn SubCollector>)>) -> Self {
        Self { collectors, timeout: None }
    }

    /// Creates the named collectors from the registry.
    pub fn from_names<S: AsRef<str>>(names: &[S], context: &CollectorContext) -> Result<Self> {
        let collectors = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                log::info!(target: LOG_TARGET, "Enabling collector '{name}'");
                create_collector(name, context).map(|collector| (name.to_string(), collector))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(collectors))
    }

    /// Stop waiting for a collector after `timeout`; the collector counts as failed.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn collector_names(&self) -> impl Iterator<Item = &str> {
        self.collectors.iter().map(|(name, _)| name.as_str())
    }

    /// Runs every collector once, sending their samples and the bookkeeping gauges to `sink`.
    pub async fn collect(&self, sink: &MetricSink) {
        let runs = self
            .collectors
            .iter()
            .map(|(name, collector)| run_collector(name, Arc::clone(collector), sink.clone(), self.timeout));

        let _ = join_all(runs).await;
    }

    /// Runs every collector once and returns all samples produced.
    pub async fn scrape(&self) -> Vec<Sample> {
        let (sink, mut stream) = channel();
        self.collect(&sink).await;
        let samples = stream.drain();
        log::info!(target: LOG_TARGET, "Scrape produced {} samples", samples.len());
        samples
    }
}

async fn run_collector(name: &str, collector: Arc<dyn SubCollector>, sink: MetricSink, timeout: Option<Duration>) {
    let start = Instant::now();
    let task = tokio::spawn(collector.update(sink.clone()));

    let joined = match timeout {
        Some(limit) => tokio::time::timeout(limit, task).await.ok(),
        None => Some(task.await),
    };
    let elapsed = start.elapsed();

    let success = match joined {
        Some(Ok(Ok(()))) => {
            log::debug!(target: LOG_TARGET, "Collector '{name}' succeeded in {elapsed:?}");
            true
        }
        Some(Ok(Err(e))) => {
            log::error!(target: LOG_TARGET, "Collector '{name}' failed after {elapsed:?}: {e}");
            false
        }
        Some(Err(e)) => {
            log::error!(target: LOG_TARGET, "Collector '{name}' did not complete: {e}");
            false
        }
        None => {
            log::error!(target: LOG_TARGET, "Collector '{name}' timed out after {elapsed:?}");
            false
        }
    };

    sink.gauge(&COLLECTOR_DURATION, elapsed.as_secs_f64(), &[name]);
    sink.gauge(&COLLECTOR_SUCCESS, if success { 1.0 } else { 0.0 }, &[name]);
}
