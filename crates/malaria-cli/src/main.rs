//! `malaria`: command-line client for the malaria cell classifier.
//!
//! Uploads blood-cell images to the inference service, shows the
//! diagnosis, and keeps a local history of past analyses.
//!
//! # Configuration
//!
//! Settings live in `malaria-detection/config.toml` under the platform
//! config directory (override with `MALARIA_CONFIG`). Flags win over
//! environment variables (`MALARIA_SERVICE_URL`, `MALARIA_DB`,
//! `MALARIA_LANG`, `NO_COLOR`), which win over the file.

mod cli;
mod commands;
mod config;
mod format;
mod style;
mod util;

use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::{
    AnalyzeArgs, cmd_analyze, cmd_config, cmd_export, cmd_health, cmd_history, cmd_info,
};
use config::{
    Config, resolve_database, resolve_format, resolve_language, resolve_service_url,
    resolve_timeout,
};
use format::FormatOptions;

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "malaria", &mut io::stdout());
        return Ok(());
    }

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Logs go to stderr so JSON and CSV on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = Config::load();

    let no_color = cli.no_color || config.no_color;
    let language = resolve_language(cli.lang, &config);
    let opts = FormatOptions::new(no_color, language).with_compact(cli.compact);
    let database = resolve_database(cli.database.as_deref(), &config);
    let output = cli.output.as_ref();

    match cli.command {
        Commands::Analyze {
            image,
            no_save,
            timeout,
            output: output_args,
        } => {
            let service_url = resolve_service_url(cli.service_url.as_deref(), &config);
            let opts = opts.with_no_header(output_args.no_header);
            cmd_analyze(AnalyzeArgs {
                image: &image,
                service_url: &service_url,
                timeout: resolve_timeout(timeout, &config),
                history: (!no_save).then_some(database.as_deref()),
                persist_failures: config.persist_failures,
                format: resolve_format(output_args.format, &config),
                output,
                quiet: cli.quiet,
                opts: &opts,
            })
            .await
        }
        Commands::History {
            filter,
            output: output_args,
        } => {
            let opts = opts.with_no_header(output_args.no_header);
            cmd_history(
                &filter,
                database.as_deref(),
                resolve_format(output_args.format, &config),
                output,
                &opts,
            )
        }
        Commands::Export { format, filter } => {
            cmd_export(format, &filter, database.as_deref(), output, cli.quiet)
        }
        Commands::Health { timeout, format } => {
            let service_url = resolve_service_url(cli.service_url.as_deref(), &config);
            cmd_health(
                &service_url,
                resolve_timeout(timeout, &config),
                resolve_format(format, &config),
                output,
                cli.quiet,
                &opts,
            )
            .await
        }
        Commands::Info { format } => cmd_info(
            database.as_deref(),
            resolve_format(format, &config),
            output,
            &opts,
        ),
        Commands::Config { action } => cmd_config(action, &config),
        Commands::Completions { .. } => Ok(()),
    }
}
