//! Integration tests for Session driven by in-memory computation units
//!
//! These tests verify that the Session correctly:
//! - Holds the request back until the unit is ready
//! - Applies progress in arrival order, with the first completion signal winning
//! - Ignores everything a superseded unit sends
//! - Treats empty input as a no-op

use banana_grid::models::BEST_SCORE_SENTINEL;
use banana_grid::protocol::{self, ProgressEvent};
use banana_grid::services::{
    Solver, UnitEndpoint, UnitError, UnitHandle, UnitId, UnitLauncher, UnitMessage, serve,
};
use banana_grid::{FrameRate, GridModel, JobRequest, JobStatus, Metrics, Session, SessionChange};
use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

/// Launcher that keeps the unit side of every launched unit for the test to drive.
#[derive(Clone, Default)]
struct FakeLauncher {
    endpoints: Rc<RefCell<Vec<UnitEndpoint>>>,
}

impl FakeLauncher {
    fn launched(&self) -> usize {
        self.endpoints.borrow().len()
    }

    /// Queue a payload from unit `index` (0-based launch order) as if it arrived at `at`.
    /// Returns false if the controller no longer listens to it.
    fn send(&self, index: usize, payload: &str, at: Instant) -> bool {
        self.endpoints.borrow()[index]
            .messages
            .send(UnitMessage::at(payload, at))
            .is_ok()
    }

    fn take_request(&self, index: usize) -> Option<JobRequest> {
        self.endpoints.borrow_mut()[index].requests.try_recv().ok()
    }

    fn disconnect(&self, index: usize) {
        let (_, replacement) = UnitHandle::channel(0);
        let old = std::mem::replace(&mut self.endpoints.borrow_mut()[index], replacement);
        drop(old);
    }
}

impl UnitLauncher for FakeLauncher {
    fn launch(&self, id: UnitId) -> Result<UnitHandle, UnitError> {
        let (handle, endpoint) = UnitHandle::channel(id);
        self.endpoints.borrow_mut().push(endpoint);
        Ok(handle)
    }
}

fn new_session() -> (Session<FakeLauncher>, FakeLauncher, Arc<Metrics>) {
    let launcher = FakeLauncher::default();
    let metrics = Arc::new(Metrics::new());
    let session = Session::new(launcher.clone(), Arc::clone(&metrics));
    (session, launcher, metrics)
}

#[test]
fn test_request_sent_only_after_ready() {
    let (mut session, launcher, _metrics) = new_session();
    let t0 = Instant::now();

    let changes = session.start_job("  Banana Split! ", 0.4).unwrap();
    assert_eq!(changes, vec![SessionChange::JobRequested { job: 1, unit: 1 }]);
    assert_eq!(launcher.launched(), 1);

    session.pump();
    assert!(launcher.take_request(0).is_none());
    assert!(!session.stats().has_started());

    launcher.send(0, "isready", t0);
    let changes = session.pump();

    assert_eq!(
        changes,
        vec![SessionChange::JobStarted {
            letters: "bananasplit".to_string(),
            temperature: 0.2,
        }]
    );
    assert_eq!(
        launcher.take_request(0),
        JobRequest::from_raw("bananasplit", 0.4)
    );
    assert_eq!(session.stats().start_time, Some(t0));
    assert!(session.stats().is_running);
}

#[test]
fn test_solved_sequence_fixes_end_time_at_zero_score() {
    let (mut session, launcher, metrics) = new_session();
    let t0 = Instant::now();
    let solved_at = t0 + Duration::from_millis(1500);

    session.start_job("abc", 0.0).unwrap();
    launcher.send(0, "isready", t0);
    session.pump();

    launcher.send(0, "newbest,5,ab\n..", t0 + Duration::from_millis(500));
    session.pump();

    launcher.send(0, "newbest,0,abc", solved_at);
    let changes = session.pump();
    assert_eq!(
        changes,
        vec![SessionChange::NewBest { score: 0 }, SessionChange::Solved]
    );

    launcher.send(0, "done", t0 + Duration::from_secs(3));
    let changes = session.pump();
    assert_eq!(
        changes,
        vec![SessionChange::Finished {
            solved: true,
            best_score: 0
        }]
    );

    let stats = session.stats();
    assert_eq!(stats.best_score, 0);
    assert_eq!(stats.end_time, Some(solved_at));
    assert_eq!(
        stats.status(t0 + Duration::from_secs(60)),
        JobStatus::Solved {
            elapsed: "1.500".to_string()
        }
    );
    assert_eq!(session.grid(), &GridModel::from_lines(["ABC"]));
    assert_eq!(session.frame_rate(), FrameRate::Idle);
    assert!(!session.controller().has_unit());
    assert_eq!(metrics.jobs_solved.load(Ordering::Relaxed), 1);
}

#[test]
fn test_done_with_letters_remaining_is_failed() {
    let (mut session, launcher, metrics) = new_session();
    let t0 = Instant::now();

    session.start_job("abcdef", 0.0).unwrap();
    launcher.send(0, "isready", t0);
    launcher.send(0, "newbest,3,abc", t0);
    launcher.send(0, "done", t0);
    session.pump();

    let stats = session.stats();
    assert_eq!(stats.best_score, 3);
    assert!(!stats.is_running);
    assert!(matches!(
        stats.status(t0),
        JobStatus::Failed { remaining: 3, .. }
    ));
    assert_eq!(
        stats.status(t0).to_string(),
        "Failed to solve, 3 character(s) remaining. Time taken: 0.000s."
    );
    assert_eq!(metrics.jobs_failed.load(Ordering::Relaxed), 1);
}

#[test]
fn test_superseded_unit_cannot_touch_new_job() {
    let (mut session, launcher, _metrics) = new_session();
    let t0 = Instant::now();

    session.start_job("first", 0.0).unwrap();
    launcher.send(0, "isready", t0);
    session.pump();

    session.start_job("second", 0.0).unwrap();
    assert_eq!(session.generation(), 2);

    // The first unit's channel is closed the moment it is superseded
    assert!(!launcher.send(0, "newbest,0,first", t0));
    assert!(!launcher.send(0, "done", t0));

    launcher.send(1, "isready", t0 + Duration::from_millis(10));
    launcher.send(1, "newbest,4,se", t0 + Duration::from_millis(10));
    session.pump();

    let stats = session.stats();
    assert_eq!(stats.best_score, 4);
    assert!(stats.is_running);
    assert!(stats.end_time.is_none());
    assert_eq!(session.grid(), &GridModel::from_lines(["SE"]));
}

#[test]
fn test_messages_queued_before_restart_are_discarded() {
    let (mut session, launcher, _metrics) = new_session();
    let t0 = Instant::now();

    session.start_job("first", 0.0).unwrap();
    launcher.send(0, "isready", t0);
    session.pump();

    // Queued but not yet pumped when the user starts over
    launcher.send(0, "newbest,0,first", t0);
    session.start_job("second", 0.0).unwrap();
    session.pump();

    assert_eq!(session.stats().best_score, BEST_SCORE_SENTINEL);
    assert!(session.grid().is_empty());
    assert!(!session.stats().has_started());
}

#[test]
fn test_empty_letters_leave_running_job_alone() {
    let (mut session, launcher, _metrics) = new_session();
    let t0 = Instant::now();

    session.start_job("abc", 0.0).unwrap();
    launcher.send(0, "isready", t0);
    session.pump();

    let changes = session.start_job(" 42 ?! ", 0.7).unwrap();

    assert!(changes.is_empty());
    assert_eq!(launcher.launched(), 1);
    assert_eq!(session.generation(), 1);
    assert!(session.stats().is_running);
    assert!(launcher.send(0, "newbest,1,ab.", t0));
}

#[test]
fn test_second_ready_is_ignored() {
    let (mut session, launcher, _metrics) = new_session();
    let t0 = Instant::now();

    session.start_job("abc", 0.0).unwrap();
    launcher.send(0, "isready", t0);
    session.pump();
    launcher.send(0, "isready", t0 + Duration::from_secs(1));
    let changes = session.pump();

    assert!(changes.is_empty());
    assert_eq!(session.stats().start_time, Some(t0));
    assert!(launcher.take_request(0).is_some());
    assert!(launcher.take_request(0).is_none());
}

#[test]
fn test_undecodable_messages_are_skipped() {
    let (mut session, launcher, metrics) = new_session();
    let t0 = Instant::now();

    session.start_job("abc", 0.0).unwrap();
    launcher.send(0, "isready", t0);
    launcher.send(0, "newbest,lots,ABC", t0);
    launcher.send(0, "progress", t0);
    launcher.send(0, "newbest,2,a..", t0);
    session.pump();

    assert_eq!(session.stats().best_score, 2);
    assert_eq!(metrics.decode_errors.load(Ordering::Relaxed), 2);
    assert_eq!(metrics.progress_messages.load(Ordering::Relaxed), 4);
}

#[test]
fn test_crashed_unit_leaves_job_running() {
    let (mut session, launcher, _metrics) = new_session();
    let t0 = Instant::now();

    session.start_job("abc", 0.0).unwrap();
    launcher.send(0, "isready", t0);
    launcher.send(0, "newbest,2,a..", t0);
    session.pump();

    launcher.disconnect(0);
    session.pump();
    session.pump();

    assert!(session.stats().is_running);
    assert_eq!(session.frame_rate(), FrameRate::Running);
    assert!(matches!(
        session.stats().status(t0 + Duration::from_secs(2)),
        JobStatus::Running { remaining: 2, .. }
    ));

    // Starting again recovers
    session.start_job("abc", 0.0).unwrap();
    assert_eq!(launcher.launched(), 2);
}

#[test]
fn test_events_pumped_together_keep_arrival_times() {
    let (mut session, launcher, _metrics) = new_session();
    let t0 = Instant::now();

    session.start_job("abc", 0.0).unwrap();
    launcher.send(0, "isready", t0);
    launcher.send(0, "newbest,0,abc", t0 + Duration::from_millis(40));
    session.pump();

    let stats = session.stats();
    assert_eq!(stats.start_time, Some(t0));
    assert_eq!(stats.end_time, Some(t0 + Duration::from_millis(40)));
    assert_eq!(
        stats.status(t0 + Duration::from_secs(1)).to_string(),
        "Solved in 0.040s."
    );
}

#[test]
fn test_best_after_zero_score_is_ignored() {
    let (mut session, launcher, _metrics) = new_session();
    let t0 = Instant::now();

    session.start_job("abc", 0.0).unwrap();
    launcher.send(0, "isready", t0);
    launcher.send(0, "newbest,0,abc", t0 + Duration::from_millis(20));
    launcher.send(0, "newbest,3,a..", t0 + Duration::from_millis(30));
    let changes = session.pump();

    assert_eq!(
        changes,
        vec![
            SessionChange::JobStarted {
                letters: "abc".to_string(),
                temperature: 0.0,
            },
            SessionChange::NewBest { score: 0 },
            SessionChange::Solved,
        ]
    );
    assert_eq!(session.stats().best_score, 0);
    assert_eq!(session.grid(), &GridModel::from_lines(["ABC"]));
    assert_eq!(
        session.stats().status(t0 + Duration::from_secs(1)).to_string(),
        "Solved in 0.020s."
    );
}

#[test]
fn test_on_progress_directly() {
    let (mut session, _launcher, _metrics) = new_session();
    let t0 = Instant::now();

    session.start_job("ab", 0.0).unwrap();
    session.on_progress(ProgressEvent::Ready, t0);
    let changes = session.on_progress(
        ProgressEvent::NewBest {
            score: 0,
            grid: GridModel::from_lines(["AB"]),
        },
        t0 + Duration::from_millis(7),
    );

    assert_eq!(
        changes,
        vec![SessionChange::NewBest { score: 0 }, SessionChange::Solved]
    );
    assert_eq!(
        session.stats().elapsed_formatted(t0 + Duration::from_secs(9)),
        "0.007"
    );
}

/// Fills the grid one letter per report, on a single row.
struct LeftToRight;

impl Solver for LeftToRight {
    fn solve(&mut self, request: &JobRequest, report: &mut dyn FnMut(u32, &[String])) {
        let letters = request.letters();
        for placed in 1..=letters.len() {
            let row = format!("{}{}", &letters[..placed], ".".repeat(letters.len() - placed));
            report((letters.len() - placed) as u32, &[row]);
        }
    }
}

#[test]
fn test_worker_output_drives_session() {
    let (mut session, launcher, _metrics) = new_session();
    let t0 = Instant::now();
    session.start_job("pear", 0.0).unwrap();

    let mut output = Vec::new();
    serve(&mut LeftToRight, Cursor::new("[\"pear\",0.0]\n"), &mut output).unwrap();

    for line in String::from_utf8(output).unwrap().lines() {
        let payload = protocol::unframe_payload(line).unwrap();
        assert!(launcher.send(0, &payload, t0));
    }
    session.pump();

    assert!(session.stats().is_solved());
    assert_eq!(session.grid(), &GridModel::from_lines(["PEAR"]));
}
