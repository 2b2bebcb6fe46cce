//! Batch Coder - command-line entry point
//!
//! Handles:
//! - Configuration loading
//! - Application-level logging initialization
//! - Opening the persisted job list
//! - Dispatching one command and printing its result

use std::process::ExitCode;
use std::sync::mpsc::Receiver;

use clap::Parser;
use thiserror::Error;

use coder_core::config::{ConfigLoad, ConfigManager, Settings};
use coder_core::controller::{AppError, AppEvent, CommandResponse, JobCommand, JobController};
use coder_core::jobs::{JobStore, JsonFileGateway, PersistenceError};
use coder_core::logging::{init_tracing, init_tracing_with_file, Logger};
use coder_core::models::Job;
use coder_core::orchestrator::{
    CommandUnitFactory, JobOrchestrator, OrchestratorEvent, RunOutcome, UnitStatus,
};

mod cli;

use cli::{Cli, Command};

#[derive(Error, Debug)]
enum CliError {
    #[error("{0}\nRun with --reset-invalid to start with an empty job list")]
    Load(#[source] PersistenceError),

    #[error("Error ({kind}): {0}", kind = .0.kind())]
    App(#[from] AppError),

    #[error("Failed to print jobs: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Processing stopped reporting progress")]
    EventsClosed,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration first (needed for logs directory path)
    let mut config_manager = ConfigManager::new(&cli.config);
    let config_load = match config_manager.load_or_create() {
        Ok(load) => Some(load),
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            None
        }
    };

    let settings = config_manager.settings().clone();
    let _log_guard = if settings.logging.log_to_file {
        match init_tracing_with_file(settings.logging.level, &config_manager.logs_folder()) {
            Ok(guard) => Some(guard),
            Err(e) => {
                init_tracing(settings.logging.level);
                tracing::warn!("Log file unavailable, logging to stderr only: {}", e);
                None
            }
        }
    } else {
        init_tracing(settings.logging.level);
        None
    };

    tracing::debug!("Batch Coder {} starting", coder_core::version());
    match config_load {
        Some(ConfigLoad::Created) => {
            tracing::info!("Wrote default settings to {}", cli.config.display())
        }
        Some(ConfigLoad::Repaired) => tracing::info!("Completed settings in {}", cli.config.display()),
        _ => tracing::debug!("Config: {}", cli.config.display()),
    }

    if let Err(e) = config_manager.ensure_dirs_exist() {
        tracing::error!("Failed to create directories: {}", e);
    }

    match run(cli, &config_manager, settings) {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config: &ConfigManager, settings: Settings) -> Result<ExitCode, CliError> {
    let logger = Logger::new("batch-coder")
        .with_level(settings.logging.level)
        .with_tail_capacity(settings.logging.tail_lines);

    let gateway = JsonFileGateway::new(config.jobs_file());
    let (store, load_error) = if cli.reset_invalid {
        JobStore::open_or_empty(gateway, logger.child("store"))
    } else {
        let store = JobStore::open(gateway, logger.child("store")).map_err(CliError::Load)?;
        (store, None)
    };

    let orchestrator = JobOrchestrator::new(
        CommandUnitFactory::new(logger.child("factory")),
        logger.child("orchestrator"),
    );
    let (mut controller, events) =
        JobController::new(store, orchestrator, settings, logger.child("controller"));

    if let Some(e) = load_error {
        controller.report_load_error(e);
    }
    print_pending(&events);

    match cli.command {
        Command::Add(args) => {
            let response = controller.dispatch(JobCommand::Add(args.into_job()))?;
            if let CommandResponse::Added(name) = response {
                println!("Added job '{}'", name);
            }
        }
        Command::Edit(args) => {
            let response = controller.dispatch(JobCommand::Edit(args.into_job()))?;
            if let CommandResponse::Updated(name) = response {
                println!("Updated job '{}'", name);
            }
        }
        Command::Remove { names } => {
            if let CommandResponse::Removed(report) = controller.dispatch(JobCommand::Remove(names))? {
                for name in &report.removed {
                    println!("Removed job '{}'", name);
                }
                for name in &report.unknown {
                    println!("No job named '{}' (ignored)", name);
                }
            }
        }
        Command::List { json } => {
            if let CommandResponse::Jobs(jobs) = controller.dispatch(JobCommand::List)? {
                if json {
                    println!("{}", serde_json::to_string_pretty(&jobs)?);
                } else {
                    print_jobs(&jobs);
                }
            }
        }
        Command::Run => {
            if let CommandResponse::ProcessingStarted {
                encode_jobs,
                decode_jobs,
            } = controller.dispatch(JobCommand::ProcessAll)?
            {
                println!(
                    "Processing {} encode and {} decode job(s)...",
                    encode_jobs, decode_jobs
                );
            }
            let outcome = wait_for_run(&events)?;
            return Ok(if outcome.all_succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            });
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Print events until the run finishes.
fn wait_for_run(events: &Receiver<AppEvent>) -> Result<RunOutcome, CliError> {
    for event in events.iter() {
        match event {
            AppEvent::Orchestrator(event) => print_progress(&event),
            AppEvent::ProcessingFinished(outcome) => {
                print_summary(&outcome);
                return Ok(outcome);
            }
            AppEvent::Error(e) => return Err(CliError::App(e)),
            _ => {}
        }
    }
    Err(CliError::EventsClosed)
}

fn print_progress(event: &OrchestratorEvent) {
    match event {
        OrchestratorEvent::UnitStarted { group, name } => println!("[{}] {} ...", group, name),
        OrchestratorEvent::UnitFinished { group, outcome } => match &outcome.status {
            UnitStatus::Succeeded => println!(
                "[{}] {} done ({:.2}s)",
                group,
                outcome.name,
                outcome.elapsed.as_secs_f64()
            ),
            status => println!("[{}] {} {}", group, outcome.name, status),
        },
        OrchestratorEvent::GroupFinished(report) if report.processed() > 0 => println!(
            "[{}] group finished: {}/{} succeeded",
            report.group,
            report.succeeded(),
            report.processed()
        ),
        _ => {}
    }
}

fn print_summary(outcome: &RunOutcome) {
    println!(
        "Finished {} job(s) in {:.2}s ({} encode, {} decode, {} unsuccessful)",
        outcome.units_processed(),
        outcome.elapsed.as_secs_f64(),
        outcome.encode.processed(),
        outcome.decode.processed(),
        outcome.encode.unsuccessful() + outcome.decode.unsuccessful()
    );
}

fn print_jobs(jobs: &[Job]) {
    if jobs.is_empty() {
        println!("No jobs.");
        return;
    }
    for job in jobs {
        let output = job
            .output_folder()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<24} {:<7} {:>3} file(s) -> {}",
            job.name(),
            job.job_type().as_str(),
            job.input_files().len(),
            output
        );
    }
}

/// Report events published before any command ran (load problems).
fn print_pending(events: &Receiver<AppEvent>) {
    while let Ok(event) = events.try_recv() {
        if let AppEvent::Error(e) = event {
            eprintln!("Warning ({}): {}", e.kind(), e);
        }
    }
}
