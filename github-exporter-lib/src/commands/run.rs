//! Command dispatch logic for github-exporter

use super::{InitArgs, ScrapeArgs, ValidateArgs, init_config, process_scrape, validate_config};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "github-exporter", version, author, long_about = None)]
#[command(about = "Export GitHub Actions and rate limit metrics in Prometheus format")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: ExporterSubcommand,
}

#[derive(Subcommand, Debug)]
enum ExporterSubcommand {
    /// Scrape the GitHub API and print Prometheus metrics
    Scrape(Box<ScrapeArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        ExporterSubcommand::Scrape(scrape_args) => process_scrape(host, scrape_args).await,
        ExporterSubcommand::Init(init_args) => init_config(host, init_args),
        ExporterSubcommand::Validate(validate_args) => validate_config(host, validate_args),
    }
}
