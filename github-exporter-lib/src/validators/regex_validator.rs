use super::Validator;
use crate::Result;
use core::time::Duration;
use ohno::IntoAppError;
use regex::Regex;
use url::Url;

/// A path pattern and the maximum age a response for a matching path may reach.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    max_age: Duration,
}

impl Rule {
    #[must_use]
    pub const fn new(pattern: Regex, max_age: Duration) -> Self {
        Self { pattern, max_age }
    }

    /// Compiles `pattern` into a rule.
    pub fn parse(pattern: &str, max_age: Duration) -> Result<Self> {
        let pattern = Regex::new(pattern).into_app_err_with(|| format!("compiling path pattern '{pattern}'"))?;
        Ok(Self { pattern, max_age })
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    #[must_use]
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }
}

/// A validator driven by an ordered list of path rules.
///
/// The first rule whose pattern matches the URL path decides: the response is fresh
/// when its age does not exceed the rule's maximum age. Paths no rule matches are
/// never fresh, so they always go back to the origin.
#[derive(Debug, Clone, Default)]
pub struct RegexValidator {
    rules: Vec<Rule>,
}

impl RegexValidator {
    #[must_use]
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

impl Validator for RegexValidator {
    fn valid(&self, url: &Url, age: Duration) -> bool {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(url.path()))
            .is_some_and(|rule| age <= rule.max_age)
    }
}
