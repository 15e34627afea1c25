use serde::Deserialize;
use strum::{Display, EnumIter, IntoStaticStr};

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub archived: bool,
}

/// A self-hosted Actions runner.
#[derive(Debug, Clone, Deserialize)]
pub struct Runner {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub os: String,
    /// `online` or `offline`
    pub status: String,
    #[serde(default)]
    pub busy: bool,
}

impl Runner {
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.status == "online"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerList {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub runners: Vec<Runner>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    pub id: u64,
    pub name: String,
    /// `active`, `disabled_manually`, `disabled_inactivity`, ...
    pub state: String,
    #[serde(default)]
    pub url: String,
}

impl Workflow {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == "active"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowList {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub workflows: Vec<Workflow>,
}

/// Only the count is read; the runs themselves are not needed.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WorkflowRunList {
    pub total_count: u64,
}

/// Workflow run statuses the collectors count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Rate {
    pub limit: u64,
    pub remaining: u64,
    #[serde(default)]
    pub reset: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateLimitResources {
    pub core: Rate,
    pub search: Rate,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateLimits {
    pub resources: RateLimitResources,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn run_status_names_match_the_api() {
        let names: Vec<&'static str> = RunStatus::iter().map(Into::into).collect();
        assert_eq!(names, ["queued", "in_progress", "completed"]);
        assert_eq!(RunStatus::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn runner_decodes_from_api_shape() {
        let json = r#"{"id":7,"name":"builder-1","os":"linux","status":"online","busy":true,"labels":[]}"#;
        let runner: Runner = serde_json::from_str(json).unwrap();
        assert!(runner.is_online());
        assert!(runner.busy);
        assert_eq!(runner.os, "linux");
    }

    #[test]
    fn rate_limits_decode_ignoring_extra_resources() {
        let json = r#"{
            "resources": {
                "core": {"limit": 5000, "used": 1, "remaining": 4999, "reset": 1700000000},
                "search": {"limit": 30, "used": 0, "remaining": 30, "reset": 1700000060},
                "graphql": {"limit": 5000, "used": 0, "remaining": 5000, "reset": 1700000000}
            },
            "rate": {"limit": 5000, "remaining": 4999, "reset": 1700000000}
        }"#;
        let limits: RateLimits = serde_json::from_str(json).unwrap();
        assert_eq!(limits.resources.core.remaining, 4999);
        assert_eq!(limits.resources.search.limit, 30);
    }
}
