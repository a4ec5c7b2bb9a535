//! Transport multiplexing for the tuner socket.
//!
//! One WebSocket carries two logical channels with no framing between them:
//!
//! ```text
//! control  JSON text record     {"availableNodes": [...]} / {"chosenNode": "..."}
//! data     MessagePack binary   [param, ...] / [id, value]
//! ```
//!
//! # Classification
//!
//! A frame is tried as control first and falls back to data. A frame is
//! control iff its bytes parse as a JSON *object*. This relies on the two
//! encodings staying disjoint: a MessagePack payload this protocol sends is
//! always an array, whose first byte (`0x90..=0x9f`, `0xdc`, `0xdd`) can never
//! start a JSON document. Any change to either encoding must keep that true;
//! there is no discriminant byte to fall back on.
//!
//! The WebSocket frame type (text vs binary) is deliberately ignored so that
//! nodes that send JSON in binary frames, or MessagePack in text frames, are
//! handled the same way.

pub mod control;
pub mod data;

use anyhow::Result;

pub use control::{ChosenNode, ControlMessage};
pub use data::{encode_definitions, DataMessage, DefinitionList, ValueUpdate};

use crate::error::TunerError;

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Control channel record.
    Control(ControlMessage),
    /// Data channel payload.
    Data(DataMessage),
}

/// Classify and decode one inbound frame.
///
/// # Errors
///
/// Returns [`TunerError::FrameClassificationFailure`] if the payload is
/// neither a JSON object nor decodable MessagePack.
pub fn classify(payload: &[u8]) -> Result<Inbound, TunerError> {
    if let Ok(serde_json::Value::Object(object)) = serde_json::from_slice(payload) {
        log::trace!("[Protocol] Control record, {} bytes", payload.len());
        return Ok(Inbound::Control(ControlMessage::from_json(
            serde_json::Value::Object(object),
        )));
    }

    match rmp_serde::from_slice::<serde_json::Value>(payload) {
        Ok(value) => {
            log::trace!("[Protocol] Data payload, {} bytes", payload.len());
            Ok(Inbound::Data(DataMessage::from_value(value)))
        }
        Err(e) => Err(TunerError::FrameClassificationFailure {
            payload: payload.to_vec(),
            reason: e.to_string(),
        }),
    }
}

/// An outbound message queued for the socket writer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Control record, sent as a text frame.
    Control(ChosenNode),
    /// Value update, sent as a binary frame.
    Update(ValueUpdate),
}

/// Wire form of an [`Outbound`] message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// Send as a WebSocket text frame.
    Text(String),
    /// Send as a WebSocket binary frame.
    Binary(Vec<u8>),
}

impl Outbound {
    /// Encode for the socket.
    pub fn encode(&self) -> Result<OutboundFrame> {
        match self {
            Self::Control(chosen) => Ok(OutboundFrame::Text(serde_json::to_string(chosen)?)),
            Self::Update(update) => Ok(OutboundFrame::Binary(update.encode()?)),
        }
    }
}
