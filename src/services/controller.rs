use crate::models::JobRequest;
use crate::services::unit::{UnitError, UnitHandle, UnitId, UnitLauncher, UnitMessage, UnitPoll};

/// Owns the lifecycle of the computation unit for the active job.
///
/// At most one unit is alive at a time. Starting a job terminates the previous unit before a
/// new one is launched, and the request is held back until the new unit reports it is ready.
pub struct JobController<L: UnitLauncher> {
    launcher: L,
    unit: Option<UnitHandle>,
    pending: Option<JobRequest>,
    request_sent: bool,
    disconnect_reported: bool,
    next_unit_id: UnitId,
}

impl<L: UnitLauncher> JobController<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            unit: None,
            pending: None,
            request_sent: false,
            disconnect_reported: false,
            next_unit_id: 1,
        }
    }

    /// Terminate any live unit and launch a fresh one for `request`.
    pub fn start(&mut self, request: JobRequest) -> Result<UnitId, UnitError> {
        self.terminate();

        let id = self.next_unit_id;
        self.next_unit_id += 1;

        let handle = self.launcher.launch(id)?;
        tracing::info!(
            "Unit {} launched for {} letters at temperature {:.3}",
            id,
            request.letters().len(),
            request.temperature()
        );

        self.unit = Some(handle);
        self.pending = Some(request);
        self.request_sent = false;
        self.disconnect_reported = false;
        Ok(id)
    }

    /// Send the held request to the unit that just reported ready.
    ///
    /// Returns the request that was sent. Returns `None` when there is nothing to send, in
    /// which case the unit is terminated, or when the unit already received its request.
    pub fn dispatch_pending(&mut self) -> Result<Option<JobRequest>, UnitError> {
        if self.request_sent {
            tracing::debug!("Ignoring repeated ready signal from unit {:?}", self.unit_id());
            return Ok(None);
        }

        let Some(request) = self.pending.take() else {
            tracing::debug!("Unit {:?} is ready but no request is pending", self.unit_id());
            self.terminate();
            return Ok(None);
        };

        let Some(unit) = self.unit.as_ref() else {
            return Ok(None);
        };

        unit.send(request.clone())?;
        self.request_sent = true;
        tracing::info!("Sent job request to unit {}", unit.id());
        Ok(Some(request))
    }

    /// Next payload from the live unit, if one is queued.
    pub fn next_message(&mut self) -> Option<UnitMessage> {
        let unit = self.unit.as_mut()?;
        match unit.try_next() {
            UnitPoll::Message(message) => Some(message),
            UnitPoll::Empty => None,
            UnitPoll::Disconnected => {
                if !self.disconnect_reported {
                    self.disconnect_reported = true;
                    tracing::warn!(
                        "Unit {} disconnected without reporting done; the job will stay running until a new one starts",
                        unit.id()
                    );
                }
                None
            }
        }
    }

    /// Stop the live unit, if any. Its queued messages are discarded.
    pub fn terminate(&mut self) {
        if let Some(mut unit) = self.unit.take() {
            unit.terminate();
        }
        self.pending = None;
        self.request_sent = false;
    }

    pub fn has_unit(&self) -> bool {
        self.unit.is_some()
    }

    pub fn unit_id(&self) -> Option<UnitId> {
        self.unit.as_ref().map(UnitHandle::id)
    }

    /// A unit is alive but has not been handed its request yet.
    pub fn is_awaiting_ready(&self) -> bool {
        self.unit.is_some() && !self.request_sent
    }
}

impl<L: UnitLauncher> Drop for JobController<L> {
    fn drop(&mut self) {
        self.terminate();
    }
}
