// Banana Grid - live visualizer for letter-grid arrangement searches
//
// This is the library crate containing the job orchestration, protocol and rendering logic.
// The binary crate (main.rs) provides the GUI entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod protocol;
pub mod render;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::Metrics;
pub use models::{AppConfig, GridModel, JobRequest, JobStats, JobStatus};
pub use protocol::{ProgressEvent, ProtocolError};
pub use state::{FrameRate, Session, SessionChange, SessionView};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
