// relay.rs - Worker lifecycle manager
//
// The relay owns the compute module handle and the lifecycle state. It takes
// one message at a time, runs it to completion, and replies in the same order
// the messages arrived. Nothing is shared with the host: messages move across
// channels and the state is only published through a read-only watch.

use std::fmt;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::codec::{self, StepRequest, StepResponse};
use crate::compute::{BuiltinLoader, ComputeModule, ModuleLoader};
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::host::RelayHandle;
use crate::protocol::{self, HostMessage, Inbound, MessageKind, RelayMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayState {
    Uninitialized,
    Initializing,
    Ready,
    Computing,
    /// Last `init` failed. Another `init` may be sent.
    Failed,
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelayState::Uninitialized => "uninitialized",
            RelayState::Initializing => "initializing",
            RelayState::Ready => "ready",
            RelayState::Computing => "computing",
            RelayState::Failed => "failed",
        };
        f.write_str(name)
    }
}

pub struct Relay {
    loader: Arc<dyn ModuleLoader>,
    config: RelayConfig,
    module: Option<Arc<dyn ComputeModule>>,
    state: watch::Sender<RelayState>,
}

impl Relay {
    pub fn new(loader: Arc<dyn ModuleLoader>, config: RelayConfig) -> Self {
        let (state, _) = watch::channel(RelayState::Uninitialized);
        Self { loader, config, module: None, state }
    }

    /// Relay that resolves locators with [`BuiltinLoader`].
    pub fn builtin(config: RelayConfig) -> Self {
        Self::new(Arc::new(BuiltinLoader::new()), config)
    }

    pub fn state(&self) -> RelayState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RelayState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: RelayState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!(from = %prev, to = %next, "relay state");
        }
    }

    /// Processes one message. `None` means the message is not answered.
    pub async fn handle(&mut self, message: HostMessage) -> Option<RelayMessage> {
        debug!(kind = message.kind(), state = %self.state(), "relay received");
        match message {
            HostMessage::Init { module_path } => Some(self.initialize(&module_path).await),
            HostMessage::Calculate { alive_cells, grid_size } => {
                Some(self.calculate(StepRequest { alive_cells, grid_size }).await)
            }
            HostMessage::Unknown => {
                debug!("ignoring unrecognized message");
                None
            }
        }
    }

    /// Processes one decoded line of the text transport.
    pub async fn handle_inbound(&mut self, inbound: Inbound) -> Option<RelayMessage> {
        match inbound {
            Inbound::Message(message) => self.handle(message).await,
            Inbound::Ignored => {
                debug!("ignoring unrecognized message");
                None
            }
            Inbound::Malformed { kind, detail } => {
                warn!(?kind, %detail, "malformed message");
                let err = match kind {
                    MessageKind::Init => {
                        RelayError::Initialization(format!("invalid message: {detail}"))
                    }
                    MessageKind::Calculate if self.module.is_none() => RelayError::NotInitialized,
                    MessageKind::Calculate => {
                        RelayError::Computation(format!("invalid message: {detail}"))
                    }
                };
                Some(err.into())
            }
        }
    }

    async fn initialize(&mut self, locator: &str) -> RelayMessage {
        self.set_state(RelayState::Initializing);
        self.module = None;

        match self.loader.load(locator).await {
            Ok(module) => {
                self.module = Some(module);
                self.set_state(RelayState::Ready);
                info!(locator, "compute module ready");
                RelayMessage::Ready
            }
            Err(e) => {
                self.set_state(RelayState::Failed);
                warn!(locator, error = %e, "compute module failed to initialize");
                RelayError::from(e).into()
            }
        }
    }

    async fn calculate(&mut self, request: StepRequest) -> RelayMessage {
        let Some(module) = self.module.clone() else {
            debug!(state = %self.state(), "calculate before init");
            return RelayError::NotInitialized.into();
        };

        self.set_state(RelayState::Computing);
        let cells_in = request.alive_cells.len();
        let outcome = self.run_module(module, request).await;
        self.set_state(RelayState::Ready);

        match outcome {
            Ok(response) => {
                debug!(cells_in, cells_out = response.alive_cells.len(), "generation computed");
                RelayMessage::Result { alive_cells: response.alive_cells }
            }
            Err(e) => {
                warn!(error = %e, "calculation failed");
                e.into()
            }
        }
    }

    async fn run_module(
        &self,
        module: Arc<dyn ComputeModule>,
        request: StepRequest,
    ) -> Result<StepResponse, RelayError> {
        let encoded = codec::encode_request(&request)?;
        let call = tokio::task::spawn_blocking(move || module.compute_step(&encoded));

        let joined = match self.config.compute_timeout() {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                RelayError::Computation(format!("timed out after {}ms", limit.as_millis()))
            })?,
            None => call.await,
        };
        let text = joined.map_err(|e| {
            if e.is_panic() {
                RelayError::Computation("compute module panicked".to_string())
            } else {
                RelayError::Computation("compute task cancelled".to_string())
            }
        })??;

        Ok(codec::decode_response(&text)?)
    }

    /// Serves messages until the host side of `inbox` is dropped.
    pub async fn run(
        mut self,
        mut inbox: mpsc::UnboundedReceiver<HostMessage>,
        outbox: mpsc::UnboundedSender<RelayMessage>,
    ) {
        info!("relay started");
        while let Some(message) = inbox.recv().await {
            let Some(reply) = self.handle(message).await else {
                continue;
            };
            if outbox.send(reply).is_err() {
                debug!("host stopped listening");
                break;
            }
        }
        info!("relay stopped");
    }

    fn connect(
        &self,
    ) -> (RelayHandle, mpsc::UnboundedReceiver<HostMessage>, mpsc::UnboundedSender<RelayMessage>) {
        let (host_tx, inbox) = mpsc::unbounded_channel();
        let (outbox, host_rx) = mpsc::unbounded_channel();
        (RelayHandle::new(host_tx, host_rx, self.subscribe()), inbox, outbox)
    }

    /// Runs the relay as a task on the current tokio runtime.
    pub fn spawn(self) -> RelayHandle {
        let (handle, inbox, outbox) = self.connect();
        tokio::spawn(self.run(inbox, outbox));
        handle
    }

    /// Runs the relay on its own thread with a private runtime, so the
    /// caller needs no runtime at all. The thread exits once the returned
    /// handle is dropped.
    pub fn spawn_thread(self) -> io::Result<RelayHandle> {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let (handle, inbox, outbox) = self.connect();
        std::thread::Builder::new()
            .name("life-relay".to_string())
            .spawn(move || {
                runtime.block_on(self.run(inbox, outbox));
                // Don't wait on a module call that outlived its timeout
                runtime.shutdown_background();
            })?;
        Ok(handle)
    }

    /// Newline-delimited JSON envelopes: one per line in, one per line out.
    /// Lines that are not UTF-8 are dropped like any other non-envelope.
    pub async fn serve_lines<R, W>(mut self, mut reader: R, mut writer: W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let inbound = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => protocol::decode_inbound(line),
                Err(e) => {
                    debug!(error = %e, "line is not UTF-8");
                    Inbound::Ignored
                }
            };
            let Some(reply) = self.handle_inbound(inbound).await else {
                continue;
            };
            let mut text = protocol::encode_outbound(&reply).map_err(io::Error::other)?;
            text.push('\n');
            writer.write_all(text.as_bytes()).await?;
            writer.flush().await?;
        }
        Ok(())
    }
}

impl fmt::Debug for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relay")
            .field("state", &self.state())
            .field("config", &self.config)
            .field("loaded", &self.module.is_some())
            .finish()
    }
}
