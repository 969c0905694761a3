pub mod agent_engine;
pub mod calibration;
pub mod cli;
pub mod config;
pub mod errors;
pub mod executor;
pub mod grammar;
pub mod llm;
pub mod narration;
pub mod perception;
pub mod planner;

use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::agent_engine::loop_control::LoopController;
use crate::agent_engine::{ControlLoop, LoopStatus, DEBUG_SCREENSHOT_FILE};
use crate::calibration::{
    require_live_input, CalibrationOutcome, CalibrationProcedure, CalibrationStore, ConsoleOperator,
};
use crate::cli::{Cli, Mode, USAGE};
use crate::config::AppConfig;
use crate::executor::InputExecutor;
use crate::narration::CommandNarrator;
use crate::perception::XcapCapture;
use crate::planner::Planner;

pub async fn run(cli: Cli) -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    let Some(mode) = cli.mode() else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    let config = match config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load config; using defaults");
            AppConfig::default()
        }
    };

    let store = CalibrationStore::new(&config.calibration.file);
    let offset = store.load();
    let mut executor = InputExecutor::from_config(&config.input, offset);

    match mode {
        Mode::Calibrate => calibrate(&mut executor, &store).await,
        Mode::Task(task) => run_task(&config, executor, &task).await,
    }
}

async fn calibrate(executor: &mut InputExecutor, store: &CalibrationStore) -> ExitCode {
    if let Err(e) = require_live_input(executor) {
        tracing::error!(error = %e, "cannot calibrate");
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }
    let mut operator = ConsoleOperator::new();
    let outcome = CalibrationProcedure::new(executor, store).run(&mut operator).await;
    match outcome {
        CalibrationOutcome::Aborted | CalibrationOutcome::SaveFailed(..) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

async fn run_task(config: &AppConfig, executor: InputExecutor, task: &str) -> ExitCode {
    let api_key = match config::resolve_api_key(&config.llm) {
        Ok(key) => key,
        Err(e) => {
            tracing::error!(error = %e, "cannot start without credentials");
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let reasoner = llm::build_reasoner(&config.llm, api_key);
    let mut control = ControlLoop::new(
        Arc::new(XcapCapture::new(true)),
        Planner::new(reasoner),
        executor,
        LoopController::new(config.agent.max_steps),
    );
    if config.agent.narration {
        control = control.with_narrator(Arc::new(CommandNarrator::new(
            config.agent.narration_command.clone(),
        )));
    }
    if config.agent.debug_screenshot {
        control = control.with_debug_screenshot(DEBUG_SCREENSHOT_FILE);
    }

    let stop = control.stop_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; stopping after the current step");
            stop.store(true, Ordering::SeqCst);
        }
    });

    let outcome = control.run(task).await;
    match outcome.status {
        LoopStatus::Done => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
