//! Command-line interface and orchestration for github-exporter
//!
//! This module implements the CLI commands and wires the rest of the library
//! together: configuration, the transport pipeline, the GitHub client and the
//! collectors.
//!
//! ## Commands
//!
//! - **scrape**: Load the configuration, build the pipeline and collectors, run one
//!   or more scrape cycles and write the Prometheus text exposition
//! - **init**: Generate a default configuration file
//! - **validate**: Check configuration file syntax and values
//!
//! The `run` function parses command-line arguments using clap and routes
//! to the appropriate command handler. All output goes through a [`Host`] so the
//! commands can be exercised in tests without touching the real process.

mod common;
mod config;
mod host;
mod init;
mod run;
mod scrape;
mod validate;

pub use config::{Config, DEFAULT_CONFIG_TOML, RevalidationRule};

pub use common::LogLevel;
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use run::run;
pub use scrape::{ScrapeArgs, build_scraper, process_scrape};
pub use validate::{ValidateArgs, validate_config};
