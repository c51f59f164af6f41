// Session state module
//
// The Session is the single owner of everything that belongs to the active job: the
// JobController (and through it the computation unit), the JobStats and the current grid.
// It lives on the GUI thread; the renderer only ever sees a read-only SessionView.

use crate::metrics::Metrics;
use crate::models::{GridModel, JobRequest, JobStats};
use crate::protocol::{self, ProgressEvent};
use crate::services::{JobController, UnitError, UnitId, UnitLauncher};
use std::sync::Arc;
use std::time::Instant;

/// Change events produced by session mutations
///
/// Returned from [`Session::start_job`], [`Session::pump`] and [`Session::on_progress`] so
/// callers can log or react without diffing state.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionChange {
    /// A unit was launched for a new job; the request waits for its ready signal
    JobRequested { job: u64, unit: UnitId },

    /// The unit accepted the request and the clock started
    JobStarted { letters: String, temperature: f64 },

    /// A better arrangement arrived
    NewBest { score: u32 },

    /// Every letter has been placed
    Solved,

    /// The unit reported done and was terminated
    Finished { solved: bool, best_score: u32 },
}

/// Frame pacing policy derived from the session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameRate {
    /// A job is in flight; show live progress
    Running,

    /// Nothing is changing; refresh slowly
    Idle,
}

/// Read-only view of the session handed to the renderer once per frame
#[derive(Clone, Copy, Debug)]
pub struct SessionView<'a> {
    /// Increments every time a job is started; the renderer resets per-job layout on change
    pub generation: u64,
    pub stats: &'a JobStats,
    pub grid: &'a GridModel,
}

/// Owner of the active job's controller, stats and grid
pub struct Session<L: UnitLauncher> {
    controller: JobController<L>,
    stats: JobStats,
    grid: GridModel,
    generation: u64,
    metrics: Arc<Metrics>,
}

impl<L: UnitLauncher> Session<L> {
    pub fn new(launcher: L, metrics: Arc<Metrics>) -> Self {
        Self {
            controller: JobController::new(launcher),
            stats: JobStats::default(),
            grid: GridModel::default(),
            generation: 0,
            metrics,
        }
    }

    /// Start a job from raw user input.
    ///
    /// Input with no usable letters is a silent no-op. Otherwise the previous unit is
    /// terminated, the previous job's state is discarded and a new unit is launched; the
    /// request is sent once that unit reports ready.
    pub fn start_job(
        &mut self,
        raw_letters: &str,
        raw_temperature: f64,
    ) -> Result<Vec<SessionChange>, UnitError> {
        let Some(request) = JobRequest::from_raw(raw_letters, raw_temperature) else {
            tracing::debug!("No usable letters in {:?}; not starting a job", raw_letters);
            return Ok(Vec::new());
        };

        let launched = self.controller.start(request);

        // The previous unit is gone either way, so is its state
        self.generation += 1;
        self.stats = JobStats::default();
        self.grid = GridModel::default();

        let unit = launched.inspect_err(|e| {
            tracing::error!("Failed to launch computation unit: {}", e);
        })?;

        Ok(vec![SessionChange::JobRequested {
            job: self.generation,
            unit,
        }])
    }

    /// Dispatch every payload the live unit has queued, in arrival order.
    ///
    /// Each event is applied at the instant its payload arrived, not when it is drained.
    pub fn pump(&mut self) -> Vec<SessionChange> {
        let mut changes = Vec::new();

        while let Some(message) = self.controller.next_message() {
            self.metrics.record_progress_message();
            match protocol::decode(&message.payload) {
                Ok(event) => changes.extend(self.on_progress(event, message.received_at)),
                Err(e) => {
                    self.metrics.record_decode_error();
                    tracing::warn!(
                        "Dropping undecodable solver message {:?}: {}",
                        message.payload,
                        e
                    );
                }
            }
        }

        changes
    }

    /// Apply one decoded event from the live unit.
    pub fn on_progress(&mut self, event: ProgressEvent, now: Instant) -> Vec<SessionChange> {
        match event {
            ProgressEvent::Ready => match self.controller.dispatch_pending() {
                Ok(Some(request)) => {
                    self.stats.begin(now);
                    self.metrics.record_job_started();
                    vec![SessionChange::JobStarted {
                        letters: request.letters().to_string(),
                        temperature: request.temperature(),
                    }]
                }
                Ok(None) => Vec::new(),
                Err(e) => {
                    tracing::warn!("Could not hand the job request to the unit: {}", e);
                    Vec::new()
                }
            },

            ProgressEvent::NewBest { score, grid } => {
                if self.stats.end_time.is_some() {
                    tracing::debug!("Ignoring new best ({} remaining) after completion", score);
                    return Vec::new();
                }

                tracing::debug!("New best: {} remaining, {} rows", score, grid.row_count());
                self.grid = grid;

                let mut changes = vec![SessionChange::NewBest { score }];
                if self.stats.record_best(score, now) {
                    tracing::info!("Solved in {}s", self.stats.elapsed_formatted(now));
                    self.metrics.record_job_solved();
                    changes.push(SessionChange::Solved);
                }
                changes
            }

            ProgressEvent::Done => {
                let already_solved = self.stats.end_time.is_some() && self.stats.best_score == 0;
                self.stats.finish(now);
                self.controller.terminate();

                let solved = self.stats.is_solved();
                if !solved {
                    self.metrics.record_job_failed();
                    tracing::info!(
                        "Solver finished with {} letter(s) remaining after {}s",
                        self.stats.best_score,
                        self.stats.elapsed_formatted(now)
                    );
                } else if !already_solved {
                    self.metrics.record_job_solved();
                }

                vec![SessionChange::Finished {
                    solved,
                    best_score: self.stats.best_score,
                }]
            }
        }
    }

    /// Terminate the live unit, e.g. when the window closes.
    pub fn shutdown(&mut self) {
        if self.controller.has_unit() {
            tracing::info!("Shutting down live computation unit");
            self.controller.terminate();
        }
    }

    pub fn frame_rate(&self) -> FrameRate {
        if self.controller.is_awaiting_ready() || self.stats.is_running {
            FrameRate::Running
        } else {
            FrameRate::Idle
        }
    }

    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            generation: self.generation,
            stats: &self.stats,
            grid: &self.grid,
        }
    }

    pub fn stats(&self) -> &JobStats {
        &self.stats
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn controller(&self) -> &JobController<L> {
        &self.controller
    }
}
