use super::{ApiError, RateLimits, Repository, RunStatus, Runner, RunnerList, Workflow, WorkflowList, WorkflowRunList};
use crate::Result;
use crate::transport::{Request, Service, SharedTransport};
use ohno::{EnrichableExt, IntoAppError};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, PercentEncode, utf8_percent_encode};
use reqwest::Url;
use reqwest::header::{HeaderMap, LINK};
use serde::de::DeserializeOwned;

const LOG_TARGET: &str = "    github";

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const PER_PAGE: u32 = 100;

/// Safety net against a server that keeps handing out `next` links.
const MAX_PAGES: usize = 100;

/// Characters left alone in a path segment (RFC 3986 unreserved).
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// GitHub REST API client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    transport: SharedTransport,
    base_url: String,
}

impl GitHubClient {
    /// Create a client issuing requests against `base_url` through `transport`.
    pub fn new(transport: SharedTransport, base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url).into_app_err_with(|| format!("invalid GitHub API URL '{base_url}'"))?;
        if parsed.cannot_be_a_base() {
            ohno::bail!("invalid GitHub API URL '{base_url}'");
        }

        Ok(Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// All repositories of an organization.
    pub async fn list_org_repos(&self, org: &str) -> Result<Vec<Repository>> {
        let url = self.url(&format!("/orgs/{}/repos?per_page={PER_PAGE}", segment(org)))?;
        self.get_all(url, |page: Vec<Repository>| page)
            .await
            .map_err(|e| e.enrich_with(|| format!("could not list repositories of organization '{org}'")))
    }

    /// Self-hosted runners registered at the organization level.
    pub async fn list_org_runners(&self, org: &str) -> Result<Vec<Runner>> {
        let url = self.url(&format!("/orgs/{}/actions/runners?per_page={PER_PAGE}", segment(org)))?;
        self.get_all(url, |page: RunnerList| page.runners)
            .await
            .map_err(|e| e.enrich_with(|| format!("could not list runners of organization '{org}'")))
    }

    /// Self-hosted runners registered to a single repository.
    pub async fn list_repo_runners(&self, owner: &str, repo: &str) -> Result<Vec<Runner>> {
        let url = self.url(&format!(
            "/repos/{}/{}/actions/runners?per_page={PER_PAGE}",
            segment(owner),
            segment(repo)
        ))?;
        self.get_all(url, |page: RunnerList| page.runners)
            .await
            .map_err(|e| e.enrich_with(|| format!("could not list runners of repository '{owner}/{repo}'")))
    }

    pub async fn list_workflows(&self, owner: &str, repo: &str) -> Result<Vec<Workflow>> {
        let url = self.url(&format!(
            "/repos/{}/{}/actions/workflows?per_page={PER_PAGE}",
            segment(owner),
            segment(repo)
        ))?;
        self.get_all(url, |page: WorkflowList| page.workflows)
            .await
            .map_err(|e| e.enrich_with(|| format!("could not list workflows of repository '{owner}/{repo}'")))
    }

    /// Number of workflow runs of a repository currently in `status`.
    pub async fn count_workflow_runs(&self, owner: &str, repo: &str, status: RunStatus) -> Result<u64> {
        let url = self.url(&format!(
            "/repos/{}/{}/actions/runs?status={status}&per_page=1",
            segment(owner),
            segment(repo)
        ))?;
        let (runs, _) = self
            .get_json::<WorkflowRunList>(url)
            .await
            .map_err(|e| e.enrich_with(|| format!("could not count {status} workflow runs of repository '{owner}/{repo}'")))?;
        Ok(runs.total_count)
    }

    pub async fn rate_limits(&self) -> Result<RateLimits> {
        let url = self.url("/rate_limit")?;
        let (limits, _) = self
            .get_json::<RateLimits>(url)
            .await
            .map_err(|e| e.enrich_with(|| format!("could not fetch rate limits from '{}'", self.base_url)))?;
        Ok(limits)
    }

    fn url(&self, path_and_query: &str) -> Result<Url> {
        let url = format!("{}{path_and_query}", self.base_url);
        Url::parse(&url).into_app_err_with(|| format!("invalid request URL '{url}'"))
    }

    /// Follows `Link: rel="next"` headers, collecting the items of every page.
    async fn get_all<P, I>(&self, first: Url, items: fn(P) -> Vec<I>) -> Result<Vec<I>>
    where
        P: DeserializeOwned,
    {
        let mut all = Vec::new();
        let mut next = Some(first);
        let mut pages = 0;

        while let Some(url) = next {
            if pages == MAX_PAGES {
                log::warn!(target: LOG_TARGET, "Stopping pagination after {MAX_PAGES} pages at '{url}'");
                break;
            }

            let (page, following) = self.get_json::<P>(url).await?;
            all.extend(items(page));
            next = following;
            pages += 1;
        }

        Ok(all)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<(T, Option<Url>)> {
        log::debug!(target: LOG_TARGET, "Querying '{url}'");

        let response = self.transport.execute(Request::get(url.clone())).await?;
        let status = response.status();
        let next = next_page(response.headers());
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(ohno::AppError::new(ApiError::from_response(url.as_str(), status, &body)));
        }

        let value = serde_json::from_slice(&body).into_app_err_with(|| format!("decoding response from '{url}'"))?;
        Ok((value, next))
    }
}

fn segment(s: &str) -> PercentEncode<'_> {
    utf8_percent_encode(s, PATH_SEGMENT)
}

/// Extracts the `rel="next"` target from a `Link` header.
fn next_page(headers: &HeaderMap) -> Option<Url> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        if !params.split(';').any(|param| param.trim() == r#"rel="next""#) {
            return None;
        }
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Url::parse(target).ok()
    })
}
