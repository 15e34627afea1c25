use super::{ActionsCollector, RateLimitCollector, SubCollector};
use crate::Result;
use crate::github::{GitHubClient, RepoRef};
use ohno::app_err;
use std::sync::Arc;

/// Everything a collector may need at construction time.
#[derive(Debug, Clone)]
pub struct CollectorContext {
    pub client: GitHubClient,
    pub organizations: Vec<String>,
    pub repositories: Vec<RepoRef>,
}

/// A named constructor for a collector.
#[derive(Debug)]
pub struct CollectorFactory {
    pub name: &'static str,
    pub create: fn(&CollectorContext) -> Arc<dyn SubCollector>,
}

/// All collectors this build knows about.
pub static FACTORIES: [CollectorFactory; 2] = [
    CollectorFactory {
        name: ActionsCollector::NAME,
        create: ActionsCollector::create,
    },
    CollectorFactory {
        name: RateLimitCollector::NAME,
        create: RateLimitCollector::create,
    },
];

#[must_use]
pub fn is_known_collector(name: &str) -> bool {
    FACTORIES.iter().any(|factory| factory.name == name)
}

/// Instantiates the collector registered under `name`.
pub fn create_collector(name: &str, context: &CollectorContext) -> Result<Arc<dyn SubCollector>> {
    FACTORIES
        .iter()
        .find(|factory| factory.name == name)
        .map(|factory| (factory.create)(context))
        .ok_or_else(|| {
            let known: Vec<_> = FACTORIES.iter().map(|factory| factory.name).collect();
            app_err!("unknown collector '{name}', known collectors are: {}", known.join(", "))
        })
}
