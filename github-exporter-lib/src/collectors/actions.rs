use super::{CollectorContext, FirstError, SubCollector};
use crate::Result;
use crate::github::{GitHubClient, RepoRef, RunStatus, Runner};
use crate::metrics::{MetricDef, MetricSink};
use futures::future::{BoxFuture, FutureExt, join_all};
use ohno::app_err;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tokio::task::JoinHandle;

const LOG_TARGET: &str = "   actions";

static RUNNERS_STATUS: MetricDef = MetricDef::new(
    "github_actions_runners_status",
    "GitHub Actions: Status of a self-hosted runner (1 online, 0 offline).",
    &["name", "status", "busy", "os", "org", "repo"],
);

static RUNNERS_BUSY_COUNT: MetricDef = MetricDef::new(
    "github_actions_runners_busy_count",
    "GitHub Actions: Number of busy self-hosted runners.",
    &["org", "repo"],
);

static RUNNERS_IDLE_COUNT: MetricDef = MetricDef::new(
    "github_actions_runners_idle_count",
    "GitHub Actions: Number of idle self-hosted runners.",
    &["org", "repo"],
);

static WORKFLOWS_STATUS: MetricDef = MetricDef::new(
    "github_actions_workflows_status",
    "GitHub Actions: Whether a workflow is active (1) or not (0).",
    &["org", "repo", "state", "name", "url"],
);

static WORKFLOW_RUNS_STATUS: MetricDef = MetricDef::new(
    "github_actions_workflows_runs_status",
    "GitHub Actions: Number of workflow runs per status.",
    &["org", "repo", "status"],
);

/// Where a set of runners is registered.
#[derive(Debug, Clone)]
enum RunnerScope {
    Organization(String),
    Repository(RepoRef),
}

/// Reports self-hosted runners, workflows and workflow run counts.
///
/// Every configured organization has its repositories listed first; then its
/// runners and each of its repositories are scraped on separate tasks.
/// Explicitly configured repositories additionally have their own runners scraped.
#[derive(Debug)]
pub struct ActionsCollector {
    client: GitHubClient,
    organizations: Vec<String>,
    repositories: Vec<RepoRef>,
}

impl ActionsCollector {
    pub const NAME: &'static str = "actions";

    #[must_use]
    pub const fn new(client: GitHubClient, organizations: Vec<String>, repositories: Vec<RepoRef>) -> Self {
        Self {
            client,
            organizations,
            repositories,
        }
    }

    #[must_use]
    pub fn create(context: &CollectorContext) -> Arc<dyn SubCollector> {
        log::info!(
            target: LOG_TARGET,
            "Scraping {} organization(s) and {} repository(ies)",
            context.organizations.len(),
            context.repositories.len()
        );
        Arc::new(Self::new(
            context.client.clone(),
            context.organizations.clone(),
            context.repositories.clone(),
        ))
    }

    async fn run(self: Arc<Self>, sink: MetricSink) -> Result<()> {
        let errors = Arc::new(FirstError::new());
        let mut tasks: Vec<JoinHandle<()>> = Vec::new();

        for org in &self.organizations {
            let repos = match self.client.list_org_repos(org).await {
                Ok(repos) => repos,
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "{e}");
                    let _ = errors.record(e);
                    Vec::new()
                }
            };

            tasks.push(tokio::spawn(Arc::clone(&self).scrape_runners(
                RunnerScope::Organization(org.clone()),
                sink.clone(),
                Arc::clone(&errors),
            )));

            for repo in repos {
                tasks.push(tokio::spawn(Arc::clone(&self).scrape_repository(
                    RepoRef::new(org.clone(), repo.name),
                    sink.clone(),
                    Arc::clone(&errors),
                )));
            }
        }

        for repo in &self.repositories {
            tasks.push(tokio::spawn(Arc::clone(&self).scrape_runners(
                RunnerScope::Repository(repo.clone()),
                sink.clone(),
                Arc::clone(&errors),
            )));
            tasks.push(tokio::spawn(Arc::clone(&self).scrape_repository(
                repo.clone(),
                sink.clone(),
                Arc::clone(&errors),
            )));
        }

        for joined in join_all(tasks).await {
            if let Err(e) = joined {
                let _ = errors.record(app_err!("actions scrape task failed: {e}"));
            }
        }

        errors.take().map_or(Ok(()), Err)
    }

    async fn scrape_runners(self: Arc<Self>, scope: RunnerScope, sink: MetricSink, errors: Arc<FirstError>) {
        let (org, repo, result) = match &scope {
            RunnerScope::Organization(org) => (org.as_str(), "", self.client.list_org_runners(org).await),
            RunnerScope::Repository(repo) => (
                repo.owner.as_str(),
                repo.name.as_str(),
                self.client.list_repo_runners(&repo.owner, &repo.name).await,
            ),
        };

        match result {
            Ok(runners) => emit_runners(&sink, org, repo, &runners),
            Err(e) => {
                log::warn!(target: LOG_TARGET, "{e}");
                let _ = errors.record(e);
            }
        }
    }

    /// Workflows first, then the run count of each status, one after the other.
    #[expect(clippy::cast_precision_loss, reason = "run counts are far below 2^52")]
    async fn scrape_repository(self: Arc<Self>, repo: RepoRef, sink: MetricSink, errors: Arc<FirstError>) {
        match self.client.list_workflows(&repo.owner, &repo.name).await {
            Ok(workflows) => {
                for workflow in workflows {
                    sink.gauge(
                        &WORKFLOWS_STATUS,
                        if workflow.is_active() { 1.0 } else { 0.0 },
                        &[&repo.owner, &repo.name, &workflow.state, &workflow.name, &workflow.url],
                    );
                }
            }
            Err(e) => {
                log::warn!(target: LOG_TARGET, "{e}");
                let _ = errors.record(e);
            }
        }

        for status in RunStatus::iter() {
            let status_label: &'static str = status.into();
            match self.client.count_workflow_runs(&repo.owner, &repo.name, status).await {
                Ok(count) => sink.gauge(&WORKFLOW_RUNS_STATUS, count as f64, &[&repo.owner, &repo.name, status_label]),
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "{e}");
                    let _ = errors.record(e);
                }
            }
        }
    }
}

#[expect(clippy::cast_precision_loss, reason = "runner counts are far below 2^52")]
fn emit_runners(sink: &MetricSink, org: &str, repo: &str, runners: &[Runner]) {
    let mut busy = 0_u64;
    let mut idle = 0_u64;

    for runner in runners {
        let busy_label = if runner.busy { "true" } else { "false" };
        sink.gauge(
            &RUNNERS_STATUS,
            if runner.is_online() { 1.0 } else { 0.0 },
            &[&runner.name, &runner.status, busy_label, &runner.os, org, repo],
        );

        if runner.busy {
            busy += 1;
        } else {
            idle += 1;
        }
    }

    sink.gauge(&RUNNERS_BUSY_COUNT, busy as f64, &[org, repo]);
    sink.gauge(&RUNNERS_IDLE_COUNT, idle as f64, &[org, repo]);
}

impl SubCollector for ActionsCollector {
    fn update(self: Arc<Self>, sink: MetricSink) -> BoxFuture<'static, Result<()>> {
        self.run(sink).boxed()
    }
}
