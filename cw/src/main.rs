//! create-wrangler - render wrangler.toml from a template
//!
//! CLI entry point.

use clap::{CommandFactory, Parser};
use colored::*;
use eyre::{Context, Result};
use tracing::debug;

use create_wrangler::cli::Cli;
use create_wrangler::config::Config;
use create_wrangler::{GenerateOptions, TemplateLoader, create_config};

fn setup_logging(verbose: bool, silent: bool) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else if silent {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };

    // stdout is reserved for the result line
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("{}", e))?;

    debug!("Logging initialized (verbose: {}, silent: {})", verbose, silent);
    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let work_dir = std::env::current_dir().context("Failed to read current directory")?;
    debug!(
        "create-wrangler loaded config: runtime={}, compiler={}",
        config.runtime.program, config.compiler.program
    );

    let loader = TemplateLoader::from_config(&config, &work_dir);
    let mut options = GenerateOptions::new(work_dir);
    options.input = cli.input.clone();
    options.output = cli.output.clone();

    let report = create_config(&options, &loader).await?;
    if !cli.silent {
        println!("{} {}", "✓".green(), report);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.silent).context("Failed to setup logging")?;

    if let Err(e) = run(&cli).await {
        eprintln!("{} {:?}", "Error:".red().bold(), e);
        println!();
        Cli::command().print_help().context("Failed to print help")?;
        std::process::exit(1);
    }
    Ok(())
}
