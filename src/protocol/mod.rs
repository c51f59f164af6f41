//! Message protocol between the controller and a computation unit.
//!
//! Payloads:
//!
//! | Direction         | Payload                          |
//! |-------------------|----------------------------------|
//! | unit → controller | `isready`                        |
//! | controller → unit | `[letters, temperature]`         |
//! | unit → controller | `newbest,<score>,<grid-block>`   |
//! | unit → controller | `done`                           |
//!
//! On the process transport every payload is one line of JSON: unit payloads are JSON
//! strings (so the newlines inside a grid block stay escaped) and the request is a
//! two-element JSON array. [`decode`] turns an unframed payload into a [`ProgressEvent`];
//! nothing past this module looks at raw strings.

use crate::models::{GridModel, JobRequest};
use std::num::ParseIntError;
use thiserror::Error;

pub const READY_TAG: &str = "isready";
pub const NEW_BEST_TAG: &str = "newbest";
pub const DONE_TAG: &str = "done";

/// A decoded notification from a computation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The unit finished initializing and accepts exactly one request.
    Ready,

    /// A better arrangement was found; `score` is the number of letters still unplaced.
    NewBest { score: u32, grid: GridModel },

    /// The unit has stopped; nothing else follows.
    Done,
}

/// Errors raised while decoding or framing protocol messages
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Unknown message: {0:?}")]
    UnknownMessage(String),

    #[error("Message is missing the {0} field")]
    MissingField(&'static str),

    #[error("Invalid score {value:?}: {source}")]
    InvalidScore {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Invalid job request: {0}")]
    InvalidRequest(String),

    #[error("Malformed frame: {0}")]
    Framing(#[from] serde_json::Error),
}

/// Decode one payload from a unit.
pub fn decode(raw: &str) -> Result<ProgressEvent, ProtocolError> {
    match raw {
        READY_TAG => return Ok(ProgressEvent::Ready),
        DONE_TAG => return Ok(ProgressEvent::Done),
        _ => {}
    }

    let mut fields = raw.splitn(3, ',');
    let tag = fields.next().unwrap_or_default();
    if tag != NEW_BEST_TAG {
        return Err(ProtocolError::UnknownMessage(raw.to_string()));
    }

    let score_field = fields.next().ok_or(ProtocolError::MissingField("score"))?;
    let score = score_field
        .trim()
        .parse::<u32>()
        .map_err(|source| ProtocolError::InvalidScore {
            value: score_field.to_string(),
            source,
        })?;

    let block = fields.next().ok_or(ProtocolError::MissingField("grid"))?;

    Ok(ProgressEvent::NewBest {
        score,
        grid: decode_grid_block(block),
    })
}

/// Split a newline-joined grid block into upper-cased rows.
///
/// A `\r` before each newline is tolerated, and a block ending in a newline does not produce
/// a trailing empty row.
pub fn decode_grid_block(block: &str) -> GridModel {
    let upper = block.to_uppercase();
    let body = upper.strip_suffix('\n').unwrap_or(&upper);

    GridModel::from_lines(body.split('\n').map(|row| row.strip_suffix('\r').unwrap_or(row)))
}

/// Build a `newbest` payload from a score and grid rows.
pub fn new_best_payload<S: AsRef<str>>(score: u32, rows: &[S]) -> String {
    let block = rows
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");
    format!("{},{},{}", NEW_BEST_TAG, score, block)
}

/// Wrap a unit payload as a single JSON line (without the trailing newline).
pub fn frame_payload(payload: &str) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(payload)?)
}

/// Extract the payload from one line written by a unit.
pub fn unframe_payload(line: &str) -> Result<String, ProtocolError> {
    Ok(serde_json::from_str::<String>(line.trim())?)
}

/// Encode a job request as the JSON array `[letters, temperature]`.
pub fn encode_request(request: &JobRequest) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(&(request.letters(), request.temperature()))?)
}

/// Decode a job request line on the unit side.
pub fn decode_request(line: &str) -> Result<JobRequest, ProtocolError> {
    let (letters, temperature): (String, f64) = serde_json::from_str(line.trim())?;
    JobRequest::new(&letters, temperature)
        .ok_or_else(|| ProtocolError::InvalidRequest(format!("no usable letters in {:?}", letters)))
}
