//! Services module - computation unit plumbing.
//!
//! Everything here is framework-agnostic: no Slint, no rendering.
//!
//! - [`UnitHandle`] / [`UnitLauncher`]: the main-context view of a computation unit and the
//!   seam for starting one. [`ProcessLauncher`] runs the solver as a child process on tokio.
//! - [`JobController`]: keeps at most one unit alive, holds the request back until the unit
//!   is ready, and yields its raw payloads in arrival order.
//! - [`worker`]: the other side of the protocol, for solvers written in Rust.

pub mod controller;
pub mod unit;
pub mod worker;

pub use controller::JobController;
pub use unit::{
    ProcessLauncher, UnitEndpoint, UnitError, UnitHandle, UnitId, UnitLauncher, UnitMessage,
    UnitPoll,
};
pub use worker::{Solver, serve};
