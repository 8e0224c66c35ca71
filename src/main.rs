//! Site-Validator main entry point
//!
//! This is the command-line interface for the Site-Validator crawl-and-validate engine.

use anyhow::Context;
use clap::{Parser, Subcommand};
use site_validator::compare::SiteVersion;
use site_validator::config::{load_config_with_hash, Config};
use site_validator::output::{render_comparison, render_findings, OutputFormat};
use site_validator::{compare_versions, validate, ValidateOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Site-Validator: checks a statically built website before it is deployed
///
/// Site-Validator crawls the build directory the way browsers and feed readers
/// would, and reports broken links, missing hash targets, redirect chains,
/// incoherent canonical links and malformed documents. It can also compare two
/// builds to catch backward-incompatible changes.
#[derive(Parser, Debug)]
#[command(name = "site-validator")]
#[command(version = "1.0.0")]
#[command(about = "A crawl-and-validate engine for static websites", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a site and report every problem found
    Validate {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Validate the config and show what would be crawled without crawling
        #[arg(long)]
        dry_run: bool,
    },
    /// Compare a new build against an old one
    Compare {
        /// Configuration of the new build
        #[arg(value_name = "NEW_CONFIG")]
        new: PathBuf,

        /// Configuration of the old build
        #[arg(value_name = "OLD_CONFIG")]
        old: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let clean = match cli.command {
        Command::Validate { config, dry_run } => {
            let config = load(&config)?;
            if dry_run {
                handle_dry_run(&config);
                true
            } else {
                handle_validate(&config, cli.format).await?
            }
        }
        Command::Compare { new, old } => {
            let new = load(&new)?;
            let old = load(&old)?;
            handle_compare(&new, &old, cli.format).await?
        }
    };

    Ok(if clean { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_validator=info,warn"),
            1 => EnvFilter::new("site_validator=debug,info"),
            _ => EnvFilter::new("site_validator=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path) -> anyhow::Result<Config> {
    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

fn options(config: &Config) -> ValidateOptions {
    let mut options = ValidateOptions::default().with_concurrency(config.crawler.concurrency);
    if let Some(pool_size) = config.crawler.pool_size {
        options = options.with_pool_size(pool_size);
    }
    options.checker = config.checker();
    options
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Site-Validator Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Directory: {}", config.site.dir.display());
    println!("  Index name: {}", config.site.index_name);
    println!("  Concurrency: {}", config.crawler.concurrency);

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {} ({})", seed.url, seed.role.kind());
    }

    println!(
        "\nExtras: {} txt sitemaps, {} xml sitemaps, {} URLs",
        config.extras.txt_sitemaps.len(),
        config.extras.xml_sitemaps.len(),
        config.extras.urls.len()
    );

    println!("\nResponse rules ({}):", config.responses.len());
    for rule in &config.responses {
        println!("  - {} -> {}", rule.pattern, rule.status);
    }

    println!("\nValidators ({}):", config.validators.len());
    for entry in &config.validators {
        println!("  - {}", entry.url_pattern);
    }

    println!(
        "\nCheckers: vnu {}, epubcheck {}",
        if config.checkers.vnu_jar.is_some() { "on" } else { "off" },
        if config.checkers.epubcheck_jar.is_some() { "on" } else { "off" }
    );
}

/// Runs a validation and prints its findings; returns whether the site is clean
async fn handle_validate(config: &Config, format: OutputFormat) -> anyhow::Result<bool> {
    let findings = validate(
        &options(config),
        &config.site.base_url,
        config.target()?,
        &config.seeds,
        &config.extras()?,
        &config.additional_validators()?,
    )
    .await
    .context("Validation aborted")?;

    print!("{}", render_findings(&findings, format)?);
    Ok(findings.is_empty())
}

/// Runs a version comparison and prints the differences; returns whether there are none
async fn handle_compare(new: &Config, old: &Config, format: OutputFormat) -> anyhow::Result<bool> {
    let new_extras = new.extras()?;
    let old_extras = old.extras()?;

    let comparison = compare_versions(
        &options(new),
        SiteVersion {
            base_url: &new.site.base_url,
            target: new.target()?,
            seeds: &new.seeds,
            extras: &new_extras,
        },
        SiteVersion {
            base_url: &old.site.base_url,
            target: old.target()?,
            seeds: &old.seeds,
            extras: &old_extras,
        },
    )
    .await
    .context("Comparison aborted")?;

    print!("{}", render_comparison(&comparison, format)?);
    Ok(comparison.is_empty())
}
