/// Static description of a gauge.
#[derive(Debug, PartialEq, Eq)]
pub struct MetricDef {
    /// Fully qualified metric name, e.g. `github_ratelimit_limit_total`
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

impl MetricDef {
    #[must_use]
    pub const fn new(name: &'static str, help: &'static str, labels: &'static [&'static str]) -> Self {
        Self { name, help, labels }
    }
}
