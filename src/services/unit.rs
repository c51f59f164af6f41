use crate::metrics::Metrics;
use crate::models::JobRequest;
use crate::protocol;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};

/// Identifier assigned to each launched computation unit
pub type UnitId = u64;

/// Errors raised while launching or talking to a computation unit
#[derive(Error, Debug)]
pub enum UnitError {
    #[error("Failed to spawn solver {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Solver process has no {0} pipe")]
    MissingPipe(&'static str),

    #[error("Computation unit {0} is no longer running")]
    Disconnected(UnitId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

/// One payload from a unit, stamped when it reached the main-context side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitMessage {
    pub payload: String,
    pub received_at: Instant,
}

impl UnitMessage {
    pub fn new(payload: impl Into<String>) -> Self {
        Self::at(payload, Instant::now())
    }

    pub fn at(payload: impl Into<String>, received_at: Instant) -> Self {
        Self {
            payload: payload.into(),
            received_at,
        }
    }
}

/// Outcome of polling a unit for its next payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitPoll {
    Message(UnitMessage),
    Empty,
    Disconnected,
}

/// Main-context side of a computation unit.
///
/// Holds the outbound request queue, the inbound payload queue and a kill switch. Dropping
/// or [`terminate`](Self::terminate)-ing the handle drops the inbound receiver on the spot,
/// so nothing the unit sends afterwards can be observed.
#[derive(Debug)]
pub struct UnitHandle {
    id: UnitId,
    requests: mpsc::UnboundedSender<JobRequest>,
    messages: Option<mpsc::UnboundedReceiver<UnitMessage>>,
    kill: Option<oneshot::Sender<()>>,
}

/// Unit-side counterpart of a [`UnitHandle`], driven by a launcher (or by a test).
#[derive(Debug)]
pub struct UnitEndpoint {
    pub requests: mpsc::UnboundedReceiver<JobRequest>,
    pub messages: mpsc::UnboundedSender<UnitMessage>,
    pub kill: oneshot::Receiver<()>,
}

impl UnitEndpoint {
    /// Deliver a payload stamped with the current time. Returns `false` once the handle
    /// has been terminated or dropped.
    pub fn post(&self, payload: impl Into<String>) -> bool {
        self.messages.send(UnitMessage::new(payload)).is_ok()
    }
}

impl UnitHandle {
    /// Create a connected handle/endpoint pair.
    pub fn channel(id: UnitId) -> (Self, UnitEndpoint) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let (kill_tx, kill_rx) = oneshot::channel();

        (
            Self {
                id,
                requests: request_tx,
                messages: Some(message_rx),
                kill: Some(kill_tx),
            },
            UnitEndpoint {
                requests: request_rx,
                messages: message_tx,
                kill: kill_rx,
            },
        )
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn is_terminated(&self) -> bool {
        self.messages.is_none()
    }

    /// Queue the job request for the unit.
    pub fn send(&self, request: JobRequest) -> Result<(), UnitError> {
        if self.is_terminated() {
            return Err(UnitError::Disconnected(self.id));
        }
        self.requests
            .send(request)
            .map_err(|_| UnitError::Disconnected(self.id))
    }

    /// Take the next queued payload without blocking.
    pub fn try_next(&mut self) -> UnitPoll {
        let Some(messages) = self.messages.as_mut() else {
            return UnitPoll::Disconnected;
        };

        match messages.try_recv() {
            Ok(message) => UnitPoll::Message(message),
            Err(mpsc::error::TryRecvError::Empty) => UnitPoll::Empty,
            Err(mpsc::error::TryRecvError::Disconnected) => UnitPoll::Disconnected,
        }
    }

    /// Stop the unit and discard anything it has queued. Idempotent.
    pub fn terminate(&mut self) {
        if let Some(mut messages) = self.messages.take() {
            messages.close();
            tracing::debug!("Terminating computation unit {}", self.id);
        }
        if let Some(kill) = self.kill.take() {
            // The receiver is gone if the unit already exited
            let _ = kill.send(());
        }
    }
}

impl Drop for UnitHandle {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Starts computation units.
///
/// The seam between the job controller and the actual transport: production uses
/// [`ProcessLauncher`], tests use in-memory endpoints.
#[cfg_attr(test, mockall::automock)]
pub trait UnitLauncher {
    fn launch(&self, id: UnitId) -> Result<UnitHandle, UnitError>;
}

/// Launches the solver as a child process speaking the framed line protocol on stdio.
///
/// Each unit gets one supervisor task on the tokio runtime that owns the child, forwards
/// requests to its stdin, forwards stdout payloads to the handle and kills the child when the
/// handle is terminated or dropped.
pub struct ProcessLauncher {
    command: String,
    args: Vec<String>,
    runtime: tokio::runtime::Handle,
    metrics: Arc<Metrics>,
}

impl ProcessLauncher {
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        runtime: tokio::runtime::Handle,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            command: command.into(),
            args,
            runtime,
            metrics,
        }
    }
}

impl UnitLauncher for ProcessLauncher {
    fn launch(&self, id: UnitId) -> Result<UnitHandle, UnitError> {
        // Child reaping needs the runtime's reactor
        let _guard = self.runtime.enter();

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| UnitError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(UnitError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(UnitError::MissingPipe("stdout"))?;

        tracing::info!(
            "Launched computation unit {} (pid {:?}): {} {:?}",
            id,
            child.id(),
            self.command,
            self.args
        );

        let (handle, endpoint) = UnitHandle::channel(id);
        self.runtime.spawn(supervise_process(
            id,
            child,
            stdin,
            stdout,
            endpoint,
            Arc::clone(&self.metrics),
        ));

        Ok(handle)
    }
}

/// Pump one child process until it exits or is killed.
async fn supervise_process(
    id: UnitId,
    mut child: Child,
    mut stdin: ChildStdin,
    stdout: ChildStdout,
    endpoint: UnitEndpoint,
    metrics: Arc<Metrics>,
) {
    let UnitEndpoint {
        mut requests,
        messages,
        mut kill,
    } = endpoint;
    let mut lines = BufReader::new(stdout).lines();
    let mut killed = false;

    loop {
        tokio::select! {
            // Fires on an explicit kill and when the handle is dropped
            _ = &mut kill => {
                killed = true;
                break;
            }
            Some(request) = requests.recv() => {
                if let Err(e) = write_request(&mut stdin, &request).await {
                    tracing::warn!("Failed to send job request to unit {}: {}", id, e);
                }
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match protocol::unframe_payload(&line) {
                        Ok(payload) => {
                            if messages.send(UnitMessage::new(payload)).is_err() {
                                killed = true;
                                break;
                            }
                        }
                        Err(e) => {
                            metrics.record_decode_error();
                            tracing::warn!("Unit {} wrote an unframed line {:?}: {}", id, line, e);
                        }
                    }
                }
                Ok(None) => {
                    tracing::debug!("Unit {} closed its output", id);
                    break;
                }
                Err(e) => {
                    tracing::warn!("Failed to read from unit {}: {}", id, e);
                    break;
                }
            },
        }
    }

    if killed {
        if let Err(e) = child.kill().await {
            tracing::debug!("Unit {} was already gone when killed: {}", id, e);
        }
        metrics.record_unit_terminated();
    } else {
        match child.wait().await {
            Ok(status) => tracing::info!("Computation unit {} exited with {}", id, status),
            Err(e) => tracing::warn!("Failed to wait for unit {}: {}", id, e),
        }
    }
}

async fn write_request(stdin: &mut ChildStdin, request: &JobRequest) -> Result<(), UnitError> {
    let mut line = protocol::encode_request(request)?;
    line.push('\n');
    stdin.write_all(line.as_bytes()).await?;
    stdin.flush().await?;
    Ok(())
}
