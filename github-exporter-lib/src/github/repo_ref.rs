use core::fmt::{Display, Formatter};
use core::str::FromStr;
use ohno::bail;
use serde::{Deserialize, Serialize};

/// A repository named as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl FromStr for RepoRef {
    type Err = ohno::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((owner, name)) = s.trim().split_once('/') else {
            bail!("invalid repository '{s}', expected 'owner/repo'");
        };

        if owner.is_empty() || name.is_empty() || name.contains('/') {
            bail!("invalid repository '{s}', expected 'owner/repo'");
        }

        Ok(Self::new(owner, name))
    }
}

impl TryFrom<String> for RepoRef {
    type Error = ohno::AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RepoRef> for String {
    fn from(value: RepoRef) -> Self {
        value.to_string()
    }
}

impl Display for RepoRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_name() {
        let repo: RepoRef = "acme/app".parse().unwrap();
        assert_eq!(repo, RepoRef::new("acme", "app"));
        assert_eq!(repo.to_string(), "acme/app");
    }

    #[test]
    fn rejects_malformed_names() {
        for bad in ["acme", "/app", "acme/", "a/b/c", ""] {
            assert!(bad.parse::<RepoRef>().is_err(), "{bad} should be rejected");
        }
    }
}
