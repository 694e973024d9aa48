// protocol.rs - Envelopes exchanged between the host and the relay
//
// Every envelope is tagged by `type`. There is no correlation id: the host
// must wait for the reply to one `calculate` before sending the next.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RelayError;
use crate::grid::{AliveSet, GridSize};

/// Host -> relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    /// Load and activate the compute module named by `module_path`.
    Init {
        #[serde(rename = "modulePath")]
        module_path: String,
    },
    /// Compute one generation.
    Calculate {
        #[serde(rename = "aliveCells")]
        alive_cells: AliveSet,
        #[serde(rename = "gridSize")]
        grid_size: GridSize,
    },
    /// Any other tag. Ignored by the relay.
    #[serde(other)]
    Unknown,
}

impl HostMessage {
    pub fn init(module_path: impl Into<String>) -> Self {
        HostMessage::Init { module_path: module_path.into() }
    }

    pub fn calculate(alive_cells: AliveSet, grid_size: GridSize) -> Self {
        HostMessage::Calculate { alive_cells, grid_size }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            HostMessage::Init { .. } => "init",
            HostMessage::Calculate { .. } => "calculate",
            HostMessage::Unknown => "unknown",
        }
    }
}

/// Relay -> host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RelayMessage {
    Ready,
    Result {
        #[serde(rename = "aliveCells")]
        alive_cells: AliveSet,
    },
    Error {
        error: String,
    },
}

impl RelayMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            RelayMessage::Ready => "ready",
            RelayMessage::Result { .. } => "result",
            RelayMessage::Error { .. } => "error",
        }
    }
}

impl From<RelayError> for RelayMessage {
    fn from(err: RelayError) -> Self {
        RelayMessage::Error { error: err.to_string() }
    }
}

/// Inbound envelope kinds that carry a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Init,
    Calculate,
}

/// Result of decoding one line of the text transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Message(HostMessage),
    /// Not a host envelope; dropped without a reply.
    Ignored,
    /// Recognised tag with an unusable payload.
    Malformed { kind: MessageKind, detail: String },
}

pub fn decode_inbound(text: &str) -> Inbound {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return Inbound::Ignored;
    };
    let kind = match value.get("type").and_then(Value::as_str) {
        Some("init") => Some(MessageKind::Init),
        Some("calculate") => Some(MessageKind::Calculate),
        _ => None,
    };

    match (serde_json::from_value::<HostMessage>(value), kind) {
        (Ok(HostMessage::Unknown), _) => Inbound::Ignored,
        (Ok(message), _) => Inbound::Message(message),
        (Err(e), Some(kind)) => Inbound::Malformed { kind, detail: e.to_string() },
        (Err(_), None) => Inbound::Ignored,
    }
}

pub fn encode_outbound(message: &RelayMessage) -> serde_json::Result<String> {
    serde_json::to_string(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_host_envelopes() {
        assert_eq!(
            decode_inbound(r#"{"type":"init","modulePath":"life"}"#),
            Inbound::Message(HostMessage::init("life"))
        );
        assert_eq!(
            decode_inbound(r#"{"type":"calculate","aliveCells":[[1,2],[2,2]],"gridSize":[5,5]}"#),
            Inbound::Message(HostMessage::calculate(
                [(1, 2), (2, 2)].into_iter().collect(),
                GridSize::new(5, 5).unwrap()
            ))
        );
    }

    #[test]
    fn unknown_and_foreign_types_are_ignored() {
        for line in [
            r#"{"type":"shutdown"}"#,
            r#"{"type":"ready"}"#,
            r#"{"type":"result","aliveCells":[]}"#,
            r#"{"modulePath":"life"}"#,
            "not json",
            "",
        ] {
            assert_eq!(decode_inbound(line), Inbound::Ignored, "{line}");
        }
    }

    #[test]
    fn malformed_payloads_keep_their_kind() {
        assert!(matches!(
            decode_inbound(r#"{"type":"calculate","aliveCells":[[1]],"gridSize":[5,5]}"#),
            Inbound::Malformed { kind: MessageKind::Calculate, .. }
        ));
        assert!(matches!(
            decode_inbound(r#"{"type":"init"}"#),
            Inbound::Malformed { kind: MessageKind::Init, .. }
        ));
    }

    #[test]
    fn encodes_relay_envelopes() {
        assert_eq!(encode_outbound(&RelayMessage::Ready).unwrap(), r#"{"type":"ready"}"#);
        assert_eq!(
            encode_outbound(&RelayMessage::Result {
                alive_cells: [(2, 1)].into_iter().collect()
            })
            .unwrap(),
            r#"{"type":"result","aliveCells":[[2,1]]}"#
        );
        assert_eq!(
            encode_outbound(&RelayError::NotInitialized.into()).unwrap(),
            r#"{"type":"error","error":"not initialized"}"#
        );
    }
}
