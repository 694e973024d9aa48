// error.rs - Error types for the relay and its collaborators

use thiserror::Error;

/// Reasons carried by the relay's `error` envelope.
///
/// The `Display` form is the exact reason text sent to the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The compute module could not be loaded or activated.
    #[error("Failed to initialize: {0}")]
    Initialization(String),

    /// A `calculate` arrived before a successful `init`.
    #[error("not initialized")]
    NotInitialized,

    /// The compute module call or the decode of its output failed.
    #[error("Calculation failed: {0}")]
    Computation(String),
}

const INIT_PREFIX: &str = "Failed to initialize: ";
const CALC_PREFIX: &str = "Calculation failed: ";

impl RelayError {
    /// Recovers the variant from a reason string received over the wire.
    pub fn from_reason(reason: &str) -> Self {
        if reason == "not initialized" {
            RelayError::NotInitialized
        } else if let Some(detail) = reason.strip_prefix(INIT_PREFIX) {
            RelayError::Initialization(detail.to_string())
        } else if let Some(detail) = reason.strip_prefix(CALC_PREFIX) {
            RelayError::Computation(detail.to_string())
        } else {
            RelayError::Computation(reason.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid size must be positive, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("grid size {width}x{height} exceeds 2147483647 cells per side")]
    TooLarge { width: u32, height: u32 },
}

/// Failure raised by a compute module's step call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputeError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("{0}")]
    Other(String),
}

/// Failure to resolve or activate a compute module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("unknown compute module `{0}`")]
    UnknownModule(String),

    #[error("invalid rule `{rule}`: {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("activation failed: {0}")]
    Activation(String),
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode step request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("malformed step response: {0}")]
    Decode(#[source] serde_json::Error),
}

impl From<LoadError> for RelayError {
    fn from(err: LoadError) -> Self {
        RelayError::Initialization(err.to_string())
    }
}

impl From<ComputeError> for RelayError {
    fn from(err: ComputeError) -> Self {
        RelayError::Computation(err.to_string())
    }
}

impl From<CodecError> for RelayError {
    fn from(err: CodecError) -> Self {
        RelayError::Computation(err.to_string())
    }
}

/// Host-side failures when driving a relay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("relay disconnected")]
    Disconnected,

    #[error("unexpected reply `{0}`")]
    UnexpectedReply(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_match_wire_text() {
        assert_eq!(RelayError::NotInitialized.to_string(), "not initialized");
        assert_eq!(
            RelayError::Initialization("boom".into()).to_string(),
            "Failed to initialize: boom"
        );
        assert_eq!(
            RelayError::Computation("bad".into()).to_string(),
            "Calculation failed: bad"
        );
    }

    #[test]
    fn from_reason_recovers_variants() {
        for err in [
            RelayError::NotInitialized,
            RelayError::Initialization("unknown compute module `x`".into()),
            RelayError::Computation("timed out after 5ms".into()),
        ] {
            assert_eq!(RelayError::from_reason(&err.to_string()), err);
        }
    }

    #[test]
    fn load_error_becomes_initialization() {
        let err: RelayError = LoadError::UnknownModule("nope".into()).into();
        assert_eq!(err.to_string(), "Failed to initialize: unknown compute module `nope`");
    }
}
