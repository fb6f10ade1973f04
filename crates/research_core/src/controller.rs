//! Analysis stream controller.
//!
//! Owns the single "current run" slot. Each handler corresponds to one
//! transition of the run's connection state machine and reports the channel
//! commands and terminal outcome it produced as [`ControllerOutput`]s, so the
//! caller decides how to carry them out.

use chrono::{DateTime, Utc};
use engine_logging::{engine_debug, engine_info, engine_warn};
use serde_json::{json, Value};

use crate::frame::Frame;
use crate::request::{AnalysisRequest, StreamParams};
use crate::timeline::{EventKind, Timeline};

pub type RunId = u64;

pub const AUTH_REQUIRED_REASON: &str = "authentication required";
pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required. Please login again.";
pub const COMPLETED_MESSAGE: &str = "Research completed successfully!";
pub const RESTORED_MESSAGE: &str = "Connection restored";
pub const RETRYING_MESSAGE: &str = "Connection lost. Retrying...";
pub const GAVE_UP_MESSAGE: &str = "Connection lost. Giving up.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunHandle {
    pub run_id: RunId,
    pub connection_state: ConnectionState,
    /// Set once an outcome has been produced.
    pub terminal: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed(Value),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerOutput {
    OpenChannel { run_id: RunId, params: StreamParams },
    CloseChannel { run_id: RunId },
    Outcome { run_id: RunId, outcome: Outcome },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    handle: RunHandle,
    request: AnalysisRequest,
    timeline: Timeline,
    connected: bool,
    outcome: Option<Outcome>,
}

impl Run {
    fn new(run_id: RunId, request: AnalysisRequest) -> Self {
        Self {
            handle: RunHandle {
                run_id,
                connection_state: ConnectionState::Connecting,
                terminal: false,
            },
            request,
            timeline: Timeline::new(),
            connected: false,
            outcome: None,
        }
    }

    pub fn handle(&self) -> RunHandle {
        self.handle
    }

    pub fn request(&self) -> &AnalysisRequest {
        &self.request
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.handle.connection_state == ConnectionState::Closed
    }

    fn close(&mut self) {
        self.handle.connection_state = ConnectionState::Closed;
        self.connected = false;
    }

    /// Closes the run with its single outcome.
    fn finish(&mut self, outcome: Outcome) -> Vec<ControllerOutput> {
        let run_id = self.handle.run_id;
        let channel_open = self.handle.connection_state != ConnectionState::Closed;
        self.close();
        self.handle.terminal = true;
        self.outcome = Some(outcome.clone());

        let mut outputs = vec![ControllerOutput::Outcome { run_id, outcome }];
        if channel_open {
            outputs.push(ControllerOutput::CloseChannel { run_id });
        }
        outputs
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamController {
    last_run_id: RunId,
    current: Option<Run>,
}

impl StreamController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Run> {
        self.current.as_ref()
    }

    pub fn handle(&self) -> Option<RunHandle> {
        self.current.as_ref().map(Run::handle)
    }

    /// True while a run is waiting for its terminal frame.
    pub fn is_active(&self) -> bool {
        self.current.as_ref().is_some_and(|run| !run.is_closed())
    }

    /// Supersedes any current run and starts a new one.
    pub fn start_run(
        &mut self,
        request: AnalysisRequest,
        credential: &str,
        at: DateTime<Utc>,
    ) -> (RunHandle, Vec<ControllerOutput>) {
        let mut outputs = self.cancel();

        self.last_run_id += 1;
        let run_id = self.last_run_id;
        let mut run = Run::new(run_id, request);

        if credential.trim().is_empty() {
            engine_warn!("run {} rejected: no credential", run_id);
            run.timeline
                .append(EventKind::Error, AUTH_REQUIRED_MESSAGE, None, at);
            // No channel was ever opened for this run.
            run.close();
            outputs.extend(run.finish(Outcome::Failed(AUTH_REQUIRED_REASON.to_string())));
        } else {
            engine_info!("run {} starting for {:?}", run_id, run.request.company());
            outputs.push(ControllerOutput::OpenChannel {
                run_id,
                params: run.request.stream_params(credential),
            });
        }

        let handle = run.handle;
        self.current = Some(run);
        (handle, outputs)
    }

    pub fn on_open(&mut self, run_id: RunId, at: DateTime<Utc>) -> Vec<ControllerOutput> {
        let Some(run) = self.live_run(run_id) else {
            return Vec::new();
        };
        run.connected = true;
        if run.handle.connection_state == ConnectionState::Connecting {
            run.handle.connection_state = ConnectionState::Open;
            let message = format!("Started analyzing {}", run.request.company());
            run.timeline.append(EventKind::Success, message, None, at);
        } else {
            run.timeline
                .append(EventKind::Info, RESTORED_MESSAGE, None, at);
        }
        Vec::new()
    }

    pub fn on_frame(
        &mut self,
        run_id: RunId,
        data: &str,
        at: DateTime<Utc>,
    ) -> Vec<ControllerOutput> {
        let Some(run) = self.live_run(run_id) else {
            return Vec::new();
        };

        match Frame::classify(data) {
            Frame::Update { message, raw } => {
                run.timeline.append(EventKind::Info, message, Some(raw), at);
                Vec::new()
            }
            Frame::Warning { message, raw } => {
                run.timeline
                    .append(EventKind::Warning, message, Some(raw), at);
                Vec::new()
            }
            Frame::Success { message, raw } => {
                run.timeline
                    .append(EventKind::Success, message, Some(raw), at);
                Vec::new()
            }
            Frame::Complete { result, raw } => {
                run.timeline
                    .append(EventKind::Success, COMPLETED_MESSAGE, Some(raw), at);
                engine_info!("run {} completed", run_id);
                run.finish(Outcome::Completed(result))
            }
            Frame::Error { message, raw } => {
                run.timeline
                    .append(EventKind::Error, message.clone(), Some(raw), at);
                engine_warn!("run {} failed: {}", run_id, message);
                run.finish(Outcome::Failed(message))
            }
            Frame::Malformed { text } => {
                let raw = Frame::malformed_payload(&text);
                run.timeline.append(EventKind::Info, text, Some(raw), at);
                Vec::new()
            }
            Frame::Unrecognized { discriminator } => {
                engine_debug!(
                    "run {} dropped frame with type {:?}",
                    run_id,
                    discriminator
                );
                Vec::new()
            }
        }
    }

    /// Records a transport disruption. Never terminal.
    pub fn on_transport_error(
        &mut self,
        run_id: RunId,
        reason: &str,
        will_retry: bool,
        at: DateTime<Utc>,
    ) -> Vec<ControllerOutput> {
        let Some(run) = self.live_run(run_id) else {
            return Vec::new();
        };
        run.connected = false;
        let message = if will_retry {
            RETRYING_MESSAGE
        } else {
            GAVE_UP_MESSAGE
        };
        run.timeline.append(
            EventKind::Warning,
            message,
            Some(json!({ "reason": reason })),
            at,
        );
        Vec::new()
    }

    /// Closes the current run's channel without producing an outcome.
    pub fn cancel(&mut self) -> Vec<ControllerOutput> {
        match self.current.as_mut() {
            Some(run) if !run.is_closed() => {
                let run_id = run.handle.run_id;
                engine_info!("run {} cancelled", run_id);
                run.close();
                vec![ControllerOutput::CloseChannel { run_id }]
            }
            _ => Vec::new(),
        }
    }

    fn live_run(&mut self, run_id: RunId) -> Option<&mut Run> {
        match self.current.as_mut() {
            Some(run) if run.handle.run_id == run_id && !run.is_closed() => Some(run),
            _ => {
                engine_debug!("ignoring event for inactive run {}", run_id);
                None
            }
        }
    }
}
