use super::Host;
use super::config::Config;
use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use std::io::Write;

const LOG_TARGET: &str = "  validate";

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file (default is `exporter.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,
}

fn validate_config_inner(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Config> {
    let config = Config::load(base_dir, config_path)?;

    let validator = config.validator()?;
    for rule in validator.rules() {
        if !rule.pattern().starts_with('^') {
            log::warn!(target: LOG_TARGET, "Revalidation rule '{}' is not anchored and may match more paths than intended", rule.pattern());
        }
    }

    Ok(config)
}

pub fn validate_config<H: Host>(host: &mut H, args: &ValidateArgs) -> Result<()> {
    let base_dir = Utf8PathBuf::from(".");
    let config_path = args.config.as_ref();

    match validate_config_inner(&base_dir, config_path) {
        Ok(config) => {
            let _ = writeln!(host.output(), "Configuration file is valid");
            if let Some(path) = config_path {
                let _ = writeln!(host.output(), "Config file: {path}");
            } else {
                let _ = writeln!(host.output(), "Using default configuration (no config file found)");
            }
            let _ = writeln!(host.output(), "Collectors: {}", config.collectors.join(", "));
            Ok(())
        }
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Configuration validation failed: {e}");
            host.exit(1);
            Err(e)
        }
    }
}
