use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use signal_hook::consts::{SIGINT, SIGTERM};
use std::io;
use std::path::Path;
use std::process;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};
use tripwire::cli::{Cli, Commands, ReportFormat};
use tripwire::config::Config;
use tripwire::diff::RunKind;
use tripwire::output::{self, Verbosity};
use tripwire::run::{CancelToken, Orchestrator, RunOptions, RunOutcome, RunReport};
use tripwire::{TripwireContext, report};

const EXIT_NO_CHANGES: i32 = 0;
const EXIT_CHANGES: i32 = 1;
const EXIT_FAILED: i32 = 2;
const EXIT_CANCELLED: i32 = 130;

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            process::exit(EXIT_FAILED);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    output::set_verbosity(if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    });

    let tracing_filter = init_tracing(cli.verbose);

    if let Commands::Completion { shell } = cli.command {
        print_completions(shell, &mut Cli::command());
        return Ok(EXIT_NO_CHANGES);
    }

    let config_path = match cli.config {
        Some(path) => path,
        None => tripwire::default_config_path()?,
    };

    if let Commands::Config { init: true } = cli.command {
        init_config(&config_path)?;
    }

    let ctx = TripwireContext::new_explicit(config_path);
    if ctx.config.core.debug
        && !cli.verbose
        && let Some(handle) = &tracing_filter
    {
        let _ = handle.reload(default_filter(true));
    }

    match cli.command {
        Commands::Run {
            format,
            dry_run,
            quiet_unchanged,
        } => Ok(run_command(&ctx, format, dry_run, quiet_unchanged)),
        Commands::Catalog => {
            list_catalog(&ctx.config)?;
            Ok(EXIT_NO_CHANGES)
        }
        Commands::Config { .. } => {
            for advisory in &ctx.advisories {
                output::advisory(advisory);
            }
            output::info(&format!("# {}", ctx.config_path.display()));
            print!("{}", toml::to_string_pretty(&ctx.config)?);
            Ok(EXIT_NO_CHANGES)
        }
        Commands::Completion { .. } => Ok(EXIT_NO_CHANGES),
    }
}

fn default_filter(debug: bool) -> EnvFilter {
    EnvFilter::new(if debug { "tripwire=debug" } else { "warn" })
}

/// `RUST_LOG` wins; otherwise debug when asked for, warnings only by default.
///
/// Runs before the configuration is loaded so its warnings are not lost. The
/// returned handle lets `core.debug` raise the level afterwards; it is `None`
/// when `RUST_LOG` decides the filter.
fn init_tracing(debug: bool) -> Option<reload::Handle<EnvFilter, Registry>> {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (default_filter(debug), false),
    };
    let (filter, handle) = reload::Layer::new(filter);
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .try_init()
        .is_ok();
    (installed && !from_env).then_some(handle)
}

fn install_signal_handlers(cancel: &CancelToken) {
    for signal in [SIGINT, SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, cancel.flag()) {
            output::warning(&format!("failed to register signal {signal}: {e}"));
        }
    }
}

fn run_command(ctx: &TripwireContext, format: ReportFormat, dry_run: bool, quiet_unchanged: bool) -> i32 {
    let cancel = CancelToken::new();
    install_signal_handlers(&cancel);

    let report = Orchestrator::new(ctx.config.clone())
        .with_config_advisories(ctx.advisories.clone())
        .with_options(RunOptions {
            dry_run,
            ..RunOptions::default()
        })
        .run(&cancel);

    let suppressed = quiet_unchanged && !report::should_send(&report, &ctx.config.report);
    if !suppressed {
        match format {
            ReportFormat::Json => match report::render_json(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => output::error(&format!("failed to render report: {e}")),
            },
            ReportFormat::Text => {
                let rendered = report::render_text(&report, &ctx.config.report);
                println!("{}", rendered.subject.bold());
                println!();
                for line in rendered.body.lines() {
                    println!("{}", output::colorize_change(line));
                }
            }
        }
    }

    match &report.outcome {
        RunOutcome::Failed { error, .. } => output::error(&format!("run failed: {error}")),
        RunOutcome::Cancelled => output::warning("run cancelled, catalog not updated"),
        RunOutcome::Completed { persisted: true } => output::verbose("catalog updated"),
        RunOutcome::Completed { persisted: false } if dry_run => {
            output::info("dry run, catalog not written");
        }
        RunOutcome::Completed { .. } => {}
    }

    exit_code(&report)
}

fn exit_code(report: &RunReport) -> i32 {
    match report.outcome {
        RunOutcome::Failed { .. } => EXIT_FAILED,
        RunOutcome::Cancelled => EXIT_CANCELLED,
        RunOutcome::Completed { .. } if report.kind == RunKind::NoChanges => EXIT_NO_CHANGES,
        RunOutcome::Completed { .. } => EXIT_CHANGES,
    }
}

fn list_catalog(config: &Config) -> Result<()> {
    let store = config.storage.catalog_store();
    let Some(catalog) = store
        .load()
        .with_context(|| format!("Failed to read catalog: {}", store.path().display()))?
    else {
        output::info(&format!("No catalog at {}", store.path().display()));
        return Ok(());
    };

    for (path, digest) in catalog.sorted() {
        println!("{digest}  {}", path.display());
    }
    output::info(&format!("{} entries", catalog.len()));
    Ok(())
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        output::info(&format!("Configuration already exists: {}", path.display()));
        return Ok(());
    }
    Config::default()
        .save(path)
        .with_context(|| format!("Failed to write configuration: {}", path.display()))?;
    output::success(&format!("Wrote default configuration to {}", path.display()));
    Ok(())
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
