use std::fmt;
use std::time::{Duration, Instant};

/// Initial best score before any improvement has been reported.
pub const BEST_SCORE_SENTINEL: u32 = 1_000_000;

/// Timing and completion state for one job.
///
/// Created in the idle state. [`begin`](Self::begin) marks the start once the unit accepts
/// the request; [`record_best`](Self::record_best) and [`finish`](Self::finish) are the two
/// completion signals, and whichever arrives first fixes `end_time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStats {
    pub best_score: u32,
    pub start_time: Option<Instant>,
    pub end_time: Option<Instant>,
    pub is_running: bool,
}

impl Default for JobStats {
    fn default() -> Self {
        Self {
            best_score: BEST_SCORE_SENTINEL,
            start_time: None,
            end_time: None,
            is_running: false,
        }
    }
}

impl JobStats {
    /// The unit accepted the request: start the clock.
    pub fn begin(&mut self, now: Instant) {
        *self = Self {
            start_time: Some(now),
            is_running: true,
            ..Self::default()
        };
    }

    /// Record a new best score. A score of zero means the letters were fully placed.
    ///
    /// Returns `true` when this call completed the job. Ignored once the job has completed.
    pub fn record_best(&mut self, score: u32, now: Instant) -> bool {
        if self.end_time.is_some() {
            return false;
        }

        self.best_score = score;
        if score == 0 {
            self.end_time = Some(now);
            self.is_running = false;
            return true;
        }
        false
    }

    /// The unit reported it has terminated. Keeps an earlier end time if one was set.
    pub fn finish(&mut self, now: Instant) {
        if self.end_time.is_none() {
            self.end_time = Some(now);
        }
        self.is_running = false;
    }

    pub fn has_started(&self) -> bool {
        self.start_time.is_some()
    }

    pub fn is_solved(&self) -> bool {
        !self.is_running && self.best_score == 0
    }

    /// Elapsed time of the job, or `None` if it never started.
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        let start = self.start_time?;
        let end = if self.is_running {
            now
        } else {
            self.end_time.unwrap_or(now)
        };
        Some(end.saturating_duration_since(start))
    }

    /// Elapsed time as `seconds.milliseconds`, or `N/A` if no job has started.
    pub fn elapsed_formatted(&self, now: Instant) -> String {
        match self.elapsed(now) {
            Some(elapsed) => format_elapsed_millis(elapsed.as_millis()),
            None => "N/A".to_string(),
        }
    }

    /// Project the stats onto the display state.
    pub fn status(&self, now: Instant) -> JobStatus {
        if !self.has_started() {
            return JobStatus::Idle;
        }

        let elapsed = self.elapsed_formatted(now);
        if self.is_running {
            JobStatus::Running {
                remaining: self.best_score,
                elapsed,
            }
        } else if self.best_score == 0 {
            JobStatus::Solved { elapsed }
        } else {
            JobStatus::Failed {
                remaining: self.best_score,
                elapsed,
            }
        }
    }
}

/// Format whole milliseconds as `seconds.mmm` using integer arithmetic only.
pub fn format_elapsed_millis(millis: u128) -> String {
    format!("{}.{:03}", millis / 1000, millis % 1000)
}

/// Display state derived from [`JobStats`] every frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Idle,
    Running { remaining: u32, elapsed: String },
    Solved { elapsed: String },
    Failed { remaining: u32, elapsed: String },
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Idle => write!(f, "Enter letters and click 'Solve' to begin"),
            JobStatus::Running { remaining, elapsed } => write!(
                f,
                "{} character(s) remaining. Time taken: {}s",
                remaining, elapsed
            ),
            JobStatus::Solved { elapsed } => write!(f, "Solved in {}s.", elapsed),
            JobStatus::Failed { remaining, elapsed } => write!(
                f,
                "Failed to solve, {} character(s) remaining. Time taken: {}s.",
                remaining, elapsed
            ),
        }
    }
}
