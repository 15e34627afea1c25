use super::Host;
use super::common::{LogLevel, init_logging, parse_duration};
use super::config::Config;
use crate::Result;
use crate::collectors::{CollectorContext, Scraper};
use crate::github::GitHubClient;
use crate::metrics::render;
use crate::transport::{ReqwestTransport, build_pipeline};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use core::time::Duration;
use ohno::IntoAppError;
use std::fs;
use std::io::Write;

const LOG_TARGET: &str = "    scrape";

#[derive(Parser, Debug)]
pub struct ScrapeArgs {
    /// Path to configuration file (default is `exporter.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// GitHub token used to authenticate API requests
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub github_token: Option<String>,

    /// Diagnostic output level
    #[arg(long, value_enum, default_value = "warn", value_name = "LEVEL")]
    pub log_level: LogLevel,

    /// Number of scrape cycles to run against the same pipeline
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..), value_name = "N")]
    pub cycles: u32,

    /// Pause between scrape cycles (e.g. `30s`, `5m`)
    #[arg(long, value_parser = parse_duration, value_name = "DURATION")]
    pub interval: Option<Duration>,

    /// Write the metrics to this file instead of stdout (rewritten every cycle)
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<Utf8PathBuf>,
}

pub async fn process_scrape<H: Host>(host: &mut H, args: &ScrapeArgs) -> Result<()> {
    init_logging(args.log_level);

    let config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
    let scraper = build_scraper(&config, args.github_token.as_deref())?;

    for cycle in 1..=args.cycles {
        if cycle > 1
            && let Some(interval) = args.interval
        {
            log::debug!(target: LOG_TARGET, "Waiting {interval:?} before scrape cycle {cycle}");
            tokio::time::sleep(interval).await;
        }

        let samples = scraper.scrape().await;
        let exposition = render(&samples);
        write_exposition(host, args.output.as_deref(), &exposition)?;
        log::info!(target: LOG_TARGET, "Scrape cycle {cycle}/{} complete", args.cycles);
    }

    Ok(())
}

/// Wires the network transport, pipeline, client and collectors described by `config`.
pub fn build_scraper(config: &Config, github_token: Option<&str>) -> Result<Scraper> {
    if github_token.is_none() {
        log::warn!(target: LOG_TARGET, "No GitHub token provided, requests will be unauthenticated");
    }

    let network = ReqwestTransport::new(github_token)?;
    let pipeline = build_pipeline(network, config.pipeline_options()?);
    let client = GitHubClient::new(pipeline, &config.api_url)?;

    let context = CollectorContext {
        client,
        organizations: config.organizations.clone(),
        repositories: config.repositories.clone(),
    };

    Ok(Scraper::from_names(&config.collectors, &context)?.with_timeout(config.collector_timeout))
}

fn write_exposition<H: Host>(host: &mut H, output: Option<&Utf8Path>, exposition: &str) -> Result<()> {
    match output {
        Some(path) => fs::write(path, exposition).into_app_err_with(|| format!("writing metrics to '{path}'")),
        None => host
            .output()
            .write_all(exposition.as_bytes())
            .into_app_err("writing metrics to output"),
    }
}
