use super::{CollectorContext, SubCollector};
use crate::Result;
use crate::github::{GitHubClient, Rate};
use crate::metrics::{MetricDef, MetricSink};
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;

static LIMIT_REMAINING: MetricDef = MetricDef::new(
    "github_ratelimit_limit_remaining",
    "GitHub API: Requests remaining in the current rate limit window.",
    &["resource"],
);

static LIMIT_TOTAL: MetricDef = MetricDef::new(
    "github_ratelimit_limit_total",
    "GitHub API: Requests allowed per rate limit window.",
    &["resource"],
);

/// Reports the API quota of the `core` and `search` resources.
#[derive(Debug)]
pub struct RateLimitCollector {
    client: GitHubClient,
}

impl RateLimitCollector {
    pub const NAME: &'static str = "ratelimit";

    #[must_use]
    pub const fn new(client: GitHubClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn create(context: &CollectorContext) -> Arc<dyn SubCollector> {
        Arc::new(Self::new(context.client.clone()))
    }

    async fn run(self: Arc<Self>, sink: MetricSink) -> Result<()> {
        let limits = self.client.rate_limits().await?;
        emit(&sink, "core", limits.resources.core);
        emit(&sink, "search", limits.resources.search);
        Ok(())
    }
}

#[expect(clippy::cast_precision_loss, reason = "quota counts are far below 2^52")]
fn emit(sink: &MetricSink, resource: &str, rate: Rate) {
    sink.gauge(&LIMIT_REMAINING, rate.remaining as f64, &[resource]);
    sink.gauge(&LIMIT_TOTAL, rate.limit as f64, &[resource]);
}

impl SubCollector for RateLimitCollector {
    fn update(self: Arc<Self>, sink: MetricSink) -> BoxFuture<'static, Result<()>> {
        self.run(sink).boxed()
    }
}
