use crate::Result;
use crate::cache::MemoryCache;
use crate::collectors::is_known_collector;
use crate::github::{DEFAULT_API_URL, RepoRef};
use crate::transport::PipelineOptions;
use crate::validators::{RegexValidator, Rule};
use camino::{Utf8Path, Utf8PathBuf};
use core::num::NonZeroU32;
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::sync::Arc;
use url::Url;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "exporter.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
#[expect(clippy::struct_excessive_bools, reason = "one switch per transport layer")]
pub struct Config {
    /// Base URL of the GitHub REST API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Collectors to run on every scrape
    #[serde(default = "default_collectors")]
    pub collectors: Vec<String>,

    /// Organizations scraped by the `actions` collector
    #[serde(default)]
    pub organizations: Vec<String>,

    /// Additional `owner/repo` repositories scraped by the `actions` collector
    #[serde(default)]
    pub repositories: Vec<RepoRef>,

    /// Maximum number of requests per second sent to the GitHub API
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// How long to wait for a collector before reporting it as failed
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub collector_timeout: Option<Duration>,

    #[serde(default = "enabled")]
    pub cache: bool,

    #[serde(default = "enabled")]
    pub revalidate: bool,

    #[serde(default = "enabled")]
    pub throttle: bool,

    #[serde(default = "enabled")]
    pub rate_limit: bool,

    /// Ordered freshness rules for cached responses
    #[serde(default)]
    pub revalidation: Vec<RevalidationRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RevalidationRule {
    /// Regular expression matched against the request path
    pub path: String,

    /// Maximum age of a cached response served without asking GitHub
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_collectors() -> Vec<String> {
    vec!["actions".to_string(), "ratelimit".to_string()]
}

const fn default_requests_per_second() -> u32 {
    100
}

const fn enabled() -> bool {
    true
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `exporter.toml` in `base_dir` is used if it exists.
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    let config = Self::default();
                    config.validate()?;
                    return Ok(config);
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let _ = self.throttle_rate()?;
        let _ = self.validator()?;

        let api_url = Url::parse(&self.api_url).into_app_err_with(|| format!("invalid api_url '{}'", self.api_url))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(app_err!("api_url must be an http or https URL, got '{}'", self.api_url));
        }

        for (i, name) in self.collectors.iter().enumerate() {
            if !is_known_collector(name) {
                return Err(app_err!("unknown collector '{name}' in collectors"));
            }
            if self.collectors.iter().take(i).any(|earlier| earlier == name) {
                return Err(app_err!("collector '{name}' is listed more than once"));
            }
        }

        if let Some(org) = self.organizations.iter().find(|org| org.trim().is_empty() || org.contains('/')) {
            return Err(app_err!("invalid organization name '{org}'"));
        }

        if self.collector_timeout == Some(Duration::ZERO) {
            return Err(app_err!("collector_timeout must be greater than zero"));
        }

        Ok(())
    }

    /// The throttle rate as a non-zero value.
    pub fn throttle_rate(&self) -> Result<NonZeroU32> {
        NonZeroU32::new(self.requests_per_second).ok_or_else(|| app_err!("requests_per_second must be greater than zero"))
    }

    /// Compiles the revalidation rules.
    pub fn validator(&self) -> Result<RegexValidator> {
        let rules = self
            .revalidation
            .iter()
            .map(|rule| Rule::parse(&rule.path, rule.max_age))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| app_err!("invalid revalidation rule: {e}"))?;
        Ok(RegexValidator::new(rules))
    }

    /// Transport layer settings derived from this configuration, with a fresh in-memory cache.
    pub fn pipeline_options(&self) -> Result<PipelineOptions> {
        Ok(PipelineOptions {
            cache_enabled: self.cache,
            revalidation_enabled: self.revalidate,
            throttle_enabled: self.throttle,
            rate_limit_enabled: self.rate_limit,
            requests_per_second: self.throttle_rate()?,
            cache: Arc::new(MemoryCache::new()),
            validator: Arc::new(self.validator()?),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        let rule = |path: &str, secs: u64| RevalidationRule {
            path: path.to_string(),
            max_age: Duration::from_secs(secs),
        };

        Self {
            api_url: default_api_url(),
            collectors: default_collectors(),
            organizations: Vec::new(),
            repositories: Vec::new(),
            requests_per_second: default_requests_per_second(),
            collector_timeout: None,
            cache: true,
            revalidate: true,
            throttle: true,
            rate_limit: true,
            revalidation: vec![
                rule("^/repos/[^/]+/[^/]+/actions/runs$", 30),
                rule("^/(orgs/[^/]+|repos/[^/]+/[^/]+)/actions/runners$", 60),
                rule("^/repos/[^/]+/[^/]+/actions/workflows$", 300),
                rule("^/orgs/[^/]+/repos$", 900),
            ],
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::validators::Validator;

    fn parse(text: &str) -> Result<Config> {
        let config: Config = toml::from_str(text).into_app_err("parsing test configuration")?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_default_config_matches_embedded() {
        let parsed: Config = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(toml::to_string(&Config::default()).unwrap(), toml::to_string(&parsed).unwrap());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.collectors, ["actions", "ratelimit"]);
        assert_eq!(config.requests_per_second, 100);
        assert!(config.cache && config.revalidate && config.throttle && config.rate_limit);
        assert!(config.revalidation.is_empty());
        assert!(config.collector_timeout.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
api_url = "https://ghe.example.com/api/v3"
collectors = ["ratelimit"]
organizations = ["acme"]
repositories = ["someone/tool"]
requests_per_second = 5
collector_timeout = "45s"
throttle = false

[[revalidation]]
path = "^/rate_limit$"
max_age = "10s"
"#,
        )
        .unwrap();

        assert_eq!(config.repositories, [RepoRef::new("someone", "tool")]);
        assert_eq!(config.collector_timeout, Some(Duration::from_secs(45)));
        assert!(!config.throttle);

        let options = config.pipeline_options().unwrap();
        assert!(!options.throttle_enabled);
        assert_eq!(options.requests_per_second.get(), 5);
        let url = Url::parse("https://ghe.example.com/rate_limit").unwrap();
        assert!(options.validator.valid(&url, Duration::from_secs(10)));
        assert!(!options.validator.valid(&url, Duration::from_secs(11)));
    }

    #[test]
    fn test_validate_zero_rate() {
        assert!(parse("requests_per_second = 0").is_err());
    }

    #[test]
    fn test_validate_unknown_collector() {
        let err = parse(r#"collectors = ["actions", "billing"]"#).unwrap_err();
        assert!(err.to_string().contains("billing"));
    }

    #[test]
    fn test_validate_duplicate_collector() {
        assert!(parse(r#"collectors = ["ratelimit", "ratelimit"]"#).is_err());
    }

    #[test]
    fn test_validate_bad_regex() {
        let err = parse("[[revalidation]]\npath = \"([\"\nmax_age = \"1m\"\n").unwrap_err();
        assert!(err.to_string().contains("revalidation"), "{err}");
    }

    #[test]
    fn test_validate_bad_repository() {
        assert!(parse(r#"repositories = ["no-slash"]"#).is_err());
    }

    #[test]
    fn test_validate_bad_organization() {
        assert!(parse(r#"organizations = ["acme/app"]"#).is_err());
    }

    #[test]
    fn test_validate_bad_api_url() {
        assert!(parse(r#"api_url = "ftp://example.com""#).is_err());
        assert!(parse(r#"api_url = "nope""#).is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        assert!(parse(r#"collector_timeout = "0s""#).is_err());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(parse("unknown_field = 1").is_err());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_save_default_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let output_path = Utf8PathBuf::try_from(tmp.path().join("exporter.toml")).unwrap();
        Config::save_default(&output_path).unwrap();

        let base_dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let explicit = Config::load(&base_dir, Some(&output_path)).unwrap();
        let implicit = Config::load(&base_dir, None).unwrap();
        assert_eq!(explicit.revalidation, implicit.revalidation);
        assert_eq!(explicit.revalidation.len(), 4);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_missing_config_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let base_dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let config = Config::load(&base_dir, None).unwrap();
        assert_eq!(config.collectors, ["actions", "ratelimit"]);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_missing_explicit_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let base_dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let missing = base_dir.join("missing.toml");
        assert!(Config::load(&base_dir, Some(&missing)).is_err());
    }
}
