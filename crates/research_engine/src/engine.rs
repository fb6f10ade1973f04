use std::collections::HashMap;
use std::future::Future;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::stream::{ChannelEventSink, ReqwestStreamClient, StreamClient, StreamSettings};
use crate::{EngineEvent, RunId, StreamError, StreamQuery};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to build stream client: {0}")]
    Client(#[from] StreamError),
}

enum EngineCommand {
    Open { run_id: RunId, query: StreamQuery },
    Close { run_id: RunId },
}

/// Owns the async runtime and the live stream subscriptions.
///
/// Commands are processed in order on a dedicated thread; stream events come
/// back through [`EngineHandle::try_recv`] / [`EngineHandle::recv_timeout`].
pub struct EngineHandle {
    runtime: Arc<Runtime>,
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: StreamSettings) -> Result<Self, EngineError> {
        let client: Arc<dyn StreamClient> = Arc::new(ReqwestStreamClient::new(settings)?);
        Self::with_client(client)
    }

    pub fn with_client(client: Arc<dyn StreamClient>) -> Result<Self, EngineError> {
        let runtime = Arc::new(
            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?,
        );
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let worker_runtime = runtime.clone();
        thread::spawn(move || {
            let mut live: HashMap<RunId, (CancellationToken, JoinHandle<()>)> = HashMap::new();
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Open { run_id, query } => {
                        let cancel = CancellationToken::new();
                        let client = client.clone();
                        let sink = ChannelEventSink::new(event_tx.clone());
                        let token = cancel.clone();
                        engine_info!("opening stream for run {}", run_id);
                        let task = worker_runtime.spawn(async move {
                            client.run(run_id, &query, &sink, token).await;
                        });
                        if let Some((previous, _)) = live.insert(run_id, (cancel, task)) {
                            previous.cancel();
                        }
                    }
                    EngineCommand::Close { run_id } => {
                        if let Some((cancel, _)) = live.remove(&run_id) {
                            engine_debug!("closing stream for run {}", run_id);
                            cancel.cancel();
                        }
                    }
                }
            }
            // Handle dropped: stop every stream and let the tasks wind down
            // before the runtime goes away.
            let tasks: Vec<JoinHandle<()>> = live
                .into_values()
                .map(|(cancel, task)| {
                    cancel.cancel();
                    task
                })
                .collect();
            worker_runtime.block_on(async {
                for task in tasks {
                    let _ = task.await;
                }
            });
        });

        Ok(Self {
            runtime,
            cmd_tx,
            event_rx,
        })
    }

    pub fn open_stream(&self, run_id: RunId, query: StreamQuery) {
        let _ = self.cmd_tx.send(EngineCommand::Open { run_id, query });
    }

    pub fn close_stream(&self, run_id: RunId) {
        let _ = self.cmd_tx.send(EngineCommand::Close { run_id });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Runs a one-shot request (auth, single analysis) on the engine runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
