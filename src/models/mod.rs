//! Data models for Banana Grid.
//!
//! - [`GridModel`]: immutable snapshot of a solution grid
//! - [`JobRequest`]: cleaned letters and mapped temperature sent to the solver
//! - [`JobStats`]: timing and completion state of one job, with its [`JobStatus`] projection
//! - [`AppConfig`]: solver command, display and logging settings loaded from YAML

pub mod config;
pub mod grid;
pub mod job;
pub mod stats;

pub use config::{AppConfig, DisplaySettings, LoggingSettings, SolverSettings};
pub use grid::{EMPTY_CELL, GridModel};
pub use job::{JobRequest, clean_letters, map_temperature};
pub use stats::{BEST_SCORE_SENTINEL, JobStats, JobStatus, format_elapsed_millis};
