//! Banana Grid - live visualizer for letter-grid arrangement searches
//!
//! Main entry point for the GUI application.
//!
//! # Overview
//!
//! This binary crate provides the Slint GUI frontend. It initializes:
//! - Configuration loading ([`ConfigManager`])
//! - Logging infrastructure (file rotation + console output)
//! - Tokio async runtime (supervises solver subprocesses)
//! - GUI controller ([`GuiController`] - owns the session and the frame loop)
//!
//! The application uses a hybrid threading model:
//! - **Main thread**: Runs the Slint event loop, the session and the renderer
//! - **Tokio workers**: One supervisor task per solver subprocess
//!
//! # Execution Flow
//!
//! 1. Load `Banana Grid Data/Banana Grid.yaml` (plus `BANANA_GRID_*` overrides)
//! 2. Initialize logging → <logging.directory>/banana-grid.<date>
//! 3. Create tokio runtime with 2 worker threads
//! 4. Create GuiController with a process launcher for the configured solver
//! 5. Run Slint event loop (blocks until window closed)
//! 6. Shutdown tokio runtime with 5s timeout

use anyhow::{Context, Result};
use banana_grid::config::DEFAULT_CONFIG_DIR;
use banana_grid::services::ProcessLauncher;
use banana_grid::ui::GuiController;
use banana_grid::{APP_NAME, ConfigManager, Metrics, VERSION};
use std::sync::Arc;

const WORKER_THREADS: usize = 2;

fn main() -> Result<()> {
    let config_manager = ConfigManager::new(DEFAULT_CONFIG_DIR)?;
    let config = config_manager.load_config()?;

    // Keep the guard alive until exit so buffered log lines are flushed
    let _log_guard = banana_grid::logging::setup_from_settings(&config.logging, APP_NAME)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    tracing::info!(
        "Solver command: {} {:?}",
        config.solver.command,
        config.solver.args
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(WORKER_THREADS)
        .thread_name("banana-unit")
        .build()
        .context("Failed to create tokio runtime")?;

    tracing::info!(
        "Tokio runtime initialized with {} worker threads",
        WORKER_THREADS
    );

    let metrics = Arc::new(Metrics::new());
    let launcher = ProcessLauncher::new(
        config.solver.command.clone(),
        config.solver.args.clone(),
        runtime.handle().clone(),
        Arc::clone(&metrics),
    );

    let gui_controller = GuiController::new(launcher, &config.display, Arc::clone(&metrics))?;

    tracing::info!("GUI controller initialized, launching window");

    // Run the GUI (blocks until window is closed)
    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");

    // Supervisors finish killing any unit that was still alive
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    metrics.log_summary();
    tracing::info!("Application shutdown complete");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}
