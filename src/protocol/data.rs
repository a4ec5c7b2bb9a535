//! Data channel payloads (MessagePack binary).
//!
//! Inbound payloads carry no envelope; their meaning comes from shape:
//!
//! - sequence of maps - parameter definitions (initial load or redefinition)
//! - `[id, value]` - a scalar value push for one parameter
//! - anything else - not a valid data message
//!
//! Outbound is always the `[id, value]` tuple.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::param::{ParamId, ParamValue, WireParam};

/// A decoded inbound data message.
#[derive(Debug, Clone, PartialEq)]
pub enum DataMessage {
    /// An ordered list of parameter definitions.
    Definitions(DefinitionList),
    /// A new value for a single parameter.
    ValuePush(ValueUpdate),
    /// A payload of no known shape, kept whole for diagnostics.
    Other(Value),
}

/// Definitions decoded from one data message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefinitionList {
    /// Entries that decoded as definitions, in wire order.
    pub params: Vec<WireParam>,
    /// Entries that did not, with the decoder's reason.
    pub rejected: Vec<(Value, String)>,
}

/// `(parameter id, new value)` update tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueUpdate {
    /// Target parameter.
    pub id: ParamId,
    /// New value, matching the parameter's value type.
    pub val: ParamValue,
}

impl ValueUpdate {
    /// Encode as a MessagePack 2-element array.
    pub fn encode(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec(&(self.id, &self.val)).context("failed to encode value update")
    }

    /// Decode a MessagePack `[id, value]` tuple.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (id, val): (ParamId, ParamValue) =
            rmp_serde::from_slice(bytes).context("failed to decode value update")?;
        Ok(Self { id, val })
    }
}

impl DataMessage {
    /// Interpret an already decoded data payload by its shape.
    pub fn from_value(value: Value) -> Self {
        let Value::Array(items) = value else {
            return Self::Other(value);
        };

        if let Some(update) = as_value_push(&items) {
            return Self::ValuePush(update);
        }

        let mut list = DefinitionList::default();
        for item in items {
            match serde_json::from_value::<WireParam>(item.clone()) {
                Ok(param) => list.params.push(param),
                Err(e) => list.rejected.push((item, e.to_string())),
            }
        }
        Self::Definitions(list)
    }
}

fn as_value_push(items: &[Value]) -> Option<ValueUpdate> {
    let [id, val] = items else {
        return None;
    };
    let id = id.as_i64()?;
    if val.is_object() {
        return None;
    }
    Some(ValueUpdate {
        id: ParamId(id),
        val: ParamValue::from_json(val)?,
    })
}

/// Encode a definition list the way a node sends it.
pub fn encode_definitions(params: &[WireParam]) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(params).context("failed to encode definitions")
}
