//! geoscanr CLI
//!
//! Crawls every page listed in a sitemap and prints one JSON object per page.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use geoscanr::{
    error::{AppError, Result},
    models::Config,
    pipeline,
    utils::http,
};

/// Long flags also accepted with a single dash (`-sitemap URL`).
const SINGLE_DASH_FLAGS: [&str; 2] = ["sitemap", "cachedir"];

/// geoscanr - GEOSCAN record metadata crawler
#[derive(Parser, Debug)]
#[command(
    name = "geoscanr",
    version,
    about = "Crawl sitemap pages and emit their metadata tables as JSON lines"
)]
struct Cli {
    /// File or link to sitemap [default: https://geoscan.nrcan.gc.ca/googlesitemapGCxml.xml]
    #[arg(long, value_name = "URL|FILE")]
    sitemap: Option<String>,

    /// Cache for page downloads [default: ./.geoscanr]
    #[arg(long, value_name = "DIR")]
    cachedir: Option<PathBuf>,

    /// TOML file with HTTP client settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Suppress logging output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Layer command-line flags over the (optional) config file.
    ///
    /// A config file named on the command line must load.
    fn to_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path).map_err(|e| {
                AppError::config(format!("cannot load {}: {}", path.display(), e))
            })?,
            None => Config::default(),
        };
        if let Some(sitemap) = &self.sitemap {
            config.sitemap = sitemap.clone();
        }
        if let Some(dir) = &self.cachedir {
            config.cache_dir = dir.clone();
        }
        Ok(config)
    }
}

/// Rewrite `-sitemap` / `-cachedir` (and their `=VALUE` forms) to the
/// double-dash spelling.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| {
            if arg.to_str().is_some_and(is_single_dash_long) {
                let mut long = OsString::from("-");
                long.push(&arg);
                long
            } else {
                arg
            }
        })
        .collect()
}

fn is_single_dash_long(arg: &str) -> bool {
    arg.strip_prefix('-')
        .filter(|rest| !rest.starts_with('-'))
        .and_then(|rest| rest.split('=').next())
        .is_some_and(|name| SINGLE_DASH_FLAGS.contains(&name))
}

/// Initialize logging on stderr; stdout carries only JSON.
fn init_logging(quiet: bool, verbose: bool) {
    if quiet {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
        return;
    }

    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    init_logging(cli.quiet, cli.verbose);

    let config = match cli.to_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return Err(e);
        }
    };
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    log::debug!("Sitemap: {}", config.sitemap);
    log::debug!("Cache directory: {}", config.cache_dir.display());

    let client = http::create_client(&config.crawler)?;
    let stdout = io::stdout().lock();

    if let Err(e) = pipeline::run_crawler(&config, &client, stdout).await {
        log::error!("{}", e);
        return Err(e);
    }

    Ok(())
}
