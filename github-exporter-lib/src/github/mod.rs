//! GitHub REST API client
//!
//! Typed access to the handful of endpoints the collectors need. All requests go
//! through a [`SharedTransport`](crate::transport::SharedTransport), so caching,
//! throttling and rate limit handling are applied transparently.

mod api_error;
mod client;
mod repo_ref;
mod types;

pub use api_error::ApiError;
pub use client::{DEFAULT_API_URL, GitHubClient};
pub use repo_ref::RepoRef;
pub use types::{Rate, RateLimitResources, RateLimits, Repository, RunStatus, Runner, RunnerList, Workflow, WorkflowList, WorkflowRunList};
