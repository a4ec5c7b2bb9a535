//! Error taxonomy for the tuner session.
//!
//! None of these are fatal: the session reports them (log + return value) and
//! keeps processing subsequent frames on the same socket. Retries, if any,
//! belong to the transport below.

use crate::param::{ParamId, WireParam};

/// Errors reported while handling frames or local interactions.
#[derive(Debug, Clone, PartialEq)]
pub enum TunerError {
    /// A frame was neither a control record nor decodable data.
    FrameClassificationFailure {
        /// Raw frame payload.
        payload: Vec<u8>,
        /// Decoder error text.
        reason: String,
    },
    /// A definition's shape matched no parameter variant.
    UnresolvableParameterKind {
        /// What did not match.
        reason: String,
        /// The offending definition.
        definition: Box<WireParam>,
    },
    /// An id has no editor (or no definition) to apply an update to.
    UnknownParameterId(ParamId),
    /// A data message arrived in a state or shape that does not expect it.
    ProtocolShapeError {
        /// The full decoded message.
        message: String,
        /// Snapshot of the session state at the time.
        state: String,
    },
    /// Selection of a node the server did not advertise.
    UnknownNode(String),
    /// A local edit that does not fit the parameter.
    InvalidInteraction {
        /// Target parameter.
        id: ParamId,
        /// Why the edit was refused.
        reason: String,
    },
    /// The socket is not connected.
    NotConnected,
}

impl std::fmt::Display for TunerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FrameClassificationFailure { payload, reason } => write!(
                f,
                "Frame classification failed ({reason}): {} bytes {:02x?}",
                payload.len(),
                &payload[..payload.len().min(32)]
            ),
            Self::UnresolvableParameterKind { reason, definition } => write!(
                f,
                "Unresolvable parameter kind for {} '{}' ({reason}): {}",
                definition.id,
                definition.name,
                serde_json::to_string(definition).unwrap_or_default()
            ),
            Self::UnknownParameterId(id) => write!(f, "Unknown parameter id {id}"),
            Self::ProtocolShapeError { message, state } => {
                write!(f, "Unexpected message {message} while in state {state}")
            }
            Self::UnknownNode(node) => write!(f, "Unknown node: {node}"),
            Self::InvalidInteraction { id, reason } => {
                write!(f, "Invalid interaction with {id}: {reason}")
            }
            Self::NotConnected => write!(f, "Not connected"),
        }
    }
}

impl std::error::Error for TunerError {}
