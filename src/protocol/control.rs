//! Control channel records (JSON text).
//!
//! - Inbound: `{"availableNodes": ["a", "b"]}`
//! - Outbound: `{"chosenNode": "a"}`, or the reserved [`NO_NODE`] name to
//!   deselect.

use serde::{Deserialize, Serialize};

use crate::constants::NO_NODE;

/// A decoded inbound control record.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    /// The server's current list of reachable nodes.
    AvailableNodes(Vec<String>),
    /// A JSON object that is not a known control record.
    Unrecognized(serde_json::Value),
}

#[derive(Deserialize)]
struct AvailableNodesRecord {
    #[serde(rename = "availableNodes")]
    available_nodes: Vec<String>,
}

impl ControlMessage {
    /// Interpret a JSON object received on the control channel.
    pub fn from_json(value: serde_json::Value) -> Self {
        match serde_json::from_value::<AvailableNodesRecord>(value.clone()) {
            Ok(record) => Self::AvailableNodes(record.available_nodes),
            Err(_) => Self::Unrecognized(value),
        }
    }
}

/// Outbound node selection request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChosenNode {
    /// Node name, or [`NO_NODE`].
    #[serde(rename = "chosenNode")]
    pub chosen_node: String,
}

impl ChosenNode {
    /// Select `node`.
    pub fn new(node: &str) -> Self {
        Self {
            chosen_node: node.to_string(),
        }
    }

    /// Deselect whatever node is currently chosen.
    pub fn none() -> Self {
        Self::new(NO_NODE)
    }

    /// Returns `true` if this record deselects.
    pub fn is_none(&self) -> bool {
        self.chosen_node == NO_NODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_available_nodes_decode() {
        let msg = ControlMessage::from_json(json!({"availableNodes": ["sim", "robot"]}));
        assert_eq!(
            msg,
            ControlMessage::AvailableNodes(vec!["sim".to_string(), "robot".to_string()])
        );
    }

    #[test]
    fn test_unknown_object_is_unrecognized() {
        let msg = ControlMessage::from_json(json!({"hello": 1}));
        assert!(matches!(msg, ControlMessage::Unrecognized(_)));
    }

    #[test]
    fn test_chosen_node_encode() {
        let text = serde_json::to_string(&ChosenNode::new("sim")).expect("serializes");
        assert_eq!(text, r#"{"chosenNode":"sim"}"#);
    }

    #[test]
    fn test_chosen_node_none_uses_sentinel() {
        let none = ChosenNode::none();
        assert!(none.is_none());
        assert_eq!(none.chosen_node, NO_NODE);
    }
}
