use crate::models::JobRequest;
use crate::protocol::{self, DONE_TAG, READY_TAG};
use crate::services::unit::UnitError;
use std::io::{BufRead, Write};

/// A search that can run inside a computation unit.
pub trait Solver {
    /// Run the search for `request`, calling `report` with every improvement.
    ///
    /// `report` receives the number of unplaced letters and the grid rows, using `.` for
    /// empty cells. Returning ends the job.
    fn solve(&mut self, request: &JobRequest, report: &mut dyn FnMut(u32, &[String]));
}

/// Serve one job over a line transport, as a computation unit.
///
/// Announces readiness, waits for exactly one request, streams every improvement reported
/// by the solver and finishes with `done`. Blank and malformed request lines are skipped.
/// If the input closes before a request arrives, returns without sending `done`.
pub fn serve<S, R, W>(solver: &mut S, input: R, mut output: W) -> Result<(), UnitError>
where
    S: Solver + ?Sized,
    R: BufRead,
    W: Write,
{
    write_payload(&mut output, READY_TAG)?;

    let Some(request) = read_request(input)? else {
        tracing::info!("Input closed before a job request arrived");
        return Ok(());
    };

    tracing::info!(
        "Solving {} letters at temperature {:.3}",
        request.letters().len(),
        request.temperature()
    );

    let mut write_error = None;
    solver.solve(&request, &mut |score, rows| {
        if write_error.is_some() {
            return;
        }
        let payload = protocol::new_best_payload(score, rows);
        if let Err(e) = write_payload(&mut output, &payload) {
            write_error = Some(e);
        }
    });
    if let Some(e) = write_error {
        return Err(e);
    }

    write_payload(&mut output, DONE_TAG)
}

fn read_request<R: BufRead>(input: R) -> Result<Option<JobRequest>, UnitError> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match protocol::decode_request(&line) {
            Ok(request) => return Ok(Some(request)),
            Err(e) => tracing::warn!("Ignoring malformed job request {:?}: {}", line, e),
        }
    }
    Ok(None)
}

fn write_payload<W: Write>(output: &mut W, payload: &str) -> Result<(), UnitError> {
    let line = protocol::frame_payload(payload)?;
    writeln!(output, "{}", line)?;
    output.flush()?;
    Ok(())
}
