// host.rs - Host side of the relay connection
//
// `RelayHandle` is the raw message pipe. `RelayClient` wraps it with the
// request/reply discipline the protocol relies on: one request in flight,
// and every reply consumed before the next request goes out.

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::error::{HostError, RelayError};
use crate::grid::{AliveSet, GridSize};
use crate::protocol::{HostMessage, RelayMessage};
use crate::relay::RelayState;

#[derive(Debug)]
pub struct RelayHandle {
    tx: mpsc::UnboundedSender<HostMessage>,
    rx: mpsc::UnboundedReceiver<RelayMessage>,
    state: watch::Receiver<RelayState>,
}

impl RelayHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<HostMessage>,
        rx: mpsc::UnboundedReceiver<RelayMessage>,
        state: watch::Receiver<RelayState>,
    ) -> Self {
        Self { tx, rx, state }
    }

    pub fn send(&self, message: HostMessage) -> Result<(), HostError> {
        self.tx.send(message).map_err(|_| HostError::Disconnected)
    }

    /// Next reply, or `None` once the relay has stopped.
    pub async fn recv(&mut self) -> Option<RelayMessage> {
        self.rx.recv().await
    }

    /// Non-blocking poll for a reply.
    pub fn try_recv(&mut self) -> Result<Option<RelayMessage>, HostError> {
        match self.rx.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(HostError::Disconnected),
        }
    }

    /// Last state published by the relay.
    pub fn state(&self) -> RelayState {
        *self.state.borrow()
    }

    pub fn into_client(self) -> RelayClient {
        RelayClient::new(self)
    }
}

/// Strict request/reply client.
///
/// Methods take `&mut self`, so a second request cannot start while the first
/// awaits its reply. If a request future is dropped before its reply arrives,
/// that reply is drained before the next request is sent.
#[derive(Debug)]
pub struct RelayClient {
    handle: RelayHandle,
    owed: usize,
}

impl RelayClient {
    pub fn new(handle: RelayHandle) -> Self {
        Self { handle, owed: 0 }
    }

    pub fn state(&self) -> RelayState {
        self.handle.state()
    }

    pub async fn init(&mut self, module_path: &str) -> Result<(), HostError> {
        match self.request(HostMessage::init(module_path)).await? {
            RelayMessage::Ready => Ok(()),
            RelayMessage::Error { error } => Err(RelayError::from_reason(&error).into()),
            other => Err(HostError::UnexpectedReply(other.kind())),
        }
    }

    pub async fn calculate(
        &mut self,
        alive_cells: AliveSet,
        grid_size: GridSize,
    ) -> Result<AliveSet, HostError> {
        match self.request(HostMessage::calculate(alive_cells, grid_size)).await? {
            RelayMessage::Result { alive_cells } => Ok(alive_cells),
            RelayMessage::Error { error } => Err(RelayError::from_reason(&error).into()),
            other => Err(HostError::UnexpectedReply(other.kind())),
        }
    }

    async fn request(&mut self, message: HostMessage) -> Result<RelayMessage, HostError> {
        while self.owed > 0 {
            let stale = self.handle.recv().await.ok_or(HostError::Disconnected)?;
            self.owed -= 1;
            debug!(kind = stale.kind(), "discarded reply to abandoned request");
        }

        self.handle.send(message)?;
        self.owed += 1;
        let reply = self.handle.recv().await.ok_or(HostError::Disconnected)?;
        self.owed -= 1;
        Ok(reply)
    }

    pub fn into_handle(self) -> RelayHandle {
        self.handle
    }
}
