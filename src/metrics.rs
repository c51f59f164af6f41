// Runtime metrics
//
// Lightweight counters for jobs, solver traffic and frame pacing, logged on shutdown

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Session-wide counters.
///
/// Uses atomics so the main context and the unit supervisor tasks can record without locks.
#[derive(Debug)]
pub struct Metrics {
    /// Jobs whose request was handed to a unit
    pub jobs_started: AtomicU64,

    /// Jobs that placed every letter
    pub jobs_solved: AtomicU64,

    /// Jobs that ended with letters remaining
    pub jobs_failed: AtomicU64,

    /// Progress payloads dispatched to the session
    pub progress_messages: AtomicU64,

    /// Payloads or lines that could not be decoded
    pub decode_errors: AtomicU64,

    /// Units killed by the controller (superseded, finished or window closed)
    pub units_terminated: AtomicU64,

    /// Frames produced by the renderer
    pub frames_rendered: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            jobs_started: AtomicU64::new(0),
            jobs_solved: AtomicU64::new(0),
            jobs_failed: AtomicU64::new(0),
            progress_messages: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            units_terminated: AtomicU64::new(0),
            frames_rendered: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_job_started(&self) {
        self.jobs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_job_solved(&self) {
        self.jobs_solved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_job_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_progress_message(&self) {
        self.progress_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unit_terminated(&self) {
        self.units_terminated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame(&self) {
        self.frames_rendered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average frames per second over the whole uptime
    pub fn avg_fps(&self) -> f64 {
        let secs = self.uptime().as_secs_f64();
        if secs > 0.0 {
            self.frames_rendered.load(Ordering::Relaxed) as f64 / secs
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Session Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Jobs: {} started, {} solved, {} failed",
            self.jobs_started.load(Ordering::Relaxed),
            self.jobs_solved.load(Ordering::Relaxed),
            self.jobs_failed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Solver traffic: {} progress messages, {} decode errors, {} units terminated",
            self.progress_messages.load(Ordering::Relaxed),
            self.decode_errors.load(Ordering::Relaxed),
            self.units_terminated.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Frames: {} rendered (avg {:.1} fps)",
            self.frames_rendered.load(Ordering::Relaxed),
            self.avg_fps()
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
