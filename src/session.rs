//! Node selection state machine and frame routing.
//!
//! A [`Session`] owns the parameter registry and the editor tree for the
//! currently selected node. Frames from the socket go through
//! [`Session::handle_frame`]; user edits through [`Session::interact`].
//! Anything that has to go back over the socket is queued on the outbox and
//! written by the client loop.
//!
//! # States
//!
//! ```text
//! Disconnected ──connect──► NoNodeSelected ──select──► AwaitingDefinitions
//!                                  ▲                          │ first data
//!                                  │ deselect / node gone     ▼
//!                                  └──────────────────────  Ready
//! ```
//!
//! Selecting a different node from `Ready` goes straight back to
//! `AwaitingDefinitions`. Registry and editors are dropped on every node
//! change; nothing is diffed across nodes.
//!
//! Nothing here is fatal. Each handler returns what it reported and carries
//! on with the next frame.

// Rust guideline compliant 2026-02

use tokio::sync::mpsc;

use crate::constants::NO_NODE;
use crate::editor::{EditorTree, Interaction};
use crate::error::TunerError;
use crate::param::resolver::{resolve, unresolved};
use crate::param::{Param, ParamId, ParamRegistry, ParamValue};
use crate::protocol::{
    classify, ChosenNode, ControlMessage, DataMessage, DefinitionList, Inbound, Outbound,
    ValueUpdate,
};

/// Where the session is in the node selection lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    /// No socket.
    Disconnected,
    /// Connected, nothing selected.
    NoNodeSelected,
    /// Selection sent, waiting for the node's full definition list.
    AwaitingDefinitions {
        /// Selected node.
        node: String,
    },
    /// Definitions loaded; further data messages are redefinitions.
    Ready {
        /// Selected node.
        node: String,
    },
}

impl NodeState {
    /// Selected node, if any.
    pub fn node(&self) -> Option<&str> {
        match self {
            Self::AwaitingDefinitions { node } | Self::Ready { node } => Some(node),
            Self::Disconnected | Self::NoNodeSelected => None,
        }
    }
}

/// Client-side mirror of one node's parameter tree.
#[derive(Debug)]
pub struct Session {
    state: NodeState,
    available_nodes: Vec<String>,
    advertised: bool,
    preferred_node: Option<String>,
    pinned: bool,
    registry: ParamRegistry,
    editors: EditorTree,
    outbox: mpsc::UnboundedSender<Outbound>,
}

impl Session {
    /// Create a disconnected session writing outbound messages to `outbox`.
    ///
    /// `preferred_node` wins the automatic pick whenever it is advertised.
    pub fn new(preferred_node: Option<String>, outbox: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            state: NodeState::Disconnected,
            available_nodes: Vec::new(),
            advertised: false,
            preferred_node,
            pinned: false,
            registry: ParamRegistry::new(),
            editors: EditorTree::new(),
            outbox,
        }
    }

    /// Like [`Session::new`], but only ever selects `node`.
    ///
    /// If the server does not advertise it, nothing is selected and
    /// [`Session::missing_pinned_node`] reports it.
    pub fn pinned(node: String, outbox: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            pinned: true,
            ..Self::new(Some(node), outbox)
        }
    }

    /// [`TunerError::UnknownNode`] once the server has advertised its nodes
    /// without the node this session is pinned to.
    pub fn missing_pinned_node(&self) -> Option<TunerError> {
        let node = self
            .preferred_node
            .as_ref()
            .filter(|_| self.pinned && self.advertised)?;
        (!self.available_nodes.contains(node)).then(|| TunerError::UnknownNode(node.clone()))
    }

    /// Current state.
    pub fn state(&self) -> &NodeState {
        &self.state
    }

    /// Nodes advertised by the server, sentinel excluded.
    pub fn available_nodes(&self) -> &[String] {
        &self.available_nodes
    }

    /// Selected node, if any.
    pub fn selected_node(&self) -> Option<&str> {
        self.state.node()
    }

    /// Definitions of the selected node by id.
    pub fn registry(&self) -> &ParamRegistry {
        &self.registry
    }

    /// Editors of the selected node.
    pub fn editors(&self) -> &EditorTree {
        &self.editors
    }

    /// True once the selected node's definitions are loaded.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, NodeState::Ready { .. })
    }

    /// The socket opened.
    pub fn on_connected(&mut self) {
        log::info!("[Session] Connected");
        self.reset();
        self.available_nodes.clear();
        self.advertised = false;
        self.state = NodeState::NoNodeSelected;
    }

    /// The socket closed. Selection and all state are forgotten.
    pub fn on_disconnected(&mut self) {
        log::info!("[Session] Disconnected");
        self.reset();
        self.available_nodes.clear();
        self.advertised = false;
        self.state = NodeState::Disconnected;
    }

    /// Classify one inbound frame and apply it.
    ///
    /// Returns every error reported while handling it; each is also logged.
    pub fn handle_frame(&mut self, payload: &[u8]) -> Vec<TunerError> {
        let mut reports = Vec::new();

        if self.state == NodeState::Disconnected {
            reports.push(TunerError::NotConnected);
        } else {
            match classify(payload) {
                Ok(Inbound::Control(message)) => self.handle_control(message, &mut reports),
                Ok(Inbound::Data(message)) => self.handle_data(message, &mut reports),
                Err(e) => reports.push(e),
            }
        }

        for report in &reports {
            log::warn!("[Session] {}", report);
        }
        reports
    }

    /// Select `node`, or deselect with the [`NO_NODE`] name.
    ///
    /// Returns `false` when nothing changed (already selected, or nothing to
    /// deselect); no message is sent in that case.
    pub fn select_node(&mut self, node: &str) -> Result<bool, TunerError> {
        if self.state == NodeState::Disconnected {
            return Err(TunerError::NotConnected);
        }
        if node == NO_NODE {
            return Ok(self.deselect());
        }
        if self.selected_node() == Some(node) {
            return Ok(false);
        }
        if !self.available_nodes.iter().any(|n| n == node) {
            return Err(TunerError::UnknownNode(node.to_string()));
        }

        log::info!("[Session] Selecting node {}", node);
        self.reset();
        self.state = NodeState::AwaitingDefinitions {
            node: node.to_string(),
        };
        self.send(Outbound::Control(ChosenNode::new(node)));
        Ok(true)
    }

    /// Apply a local edit and queue the resulting value for the node.
    ///
    /// The change shows locally right away; the node is not asked to confirm.
    pub fn interact(
        &mut self,
        id: ParamId,
        interaction: Interaction,
    ) -> Result<Option<ParamValue>, TunerError> {
        if self.state == NodeState::Disconnected {
            return Err(TunerError::NotConnected);
        }
        let sent = self.editors.interact(id, interaction)?;
        if let Some(val) = &sent {
            self.registry.set_value(id, val);
            self.send(Outbound::Update(ValueUpdate {
                id,
                val: val.clone(),
            }));
        }
        Ok(sent)
    }

    fn handle_control(&mut self, message: ControlMessage, reports: &mut Vec<TunerError>) {
        match message {
            ControlMessage::AvailableNodes(nodes) => self.update_nodes(nodes, reports),
            ControlMessage::Unrecognized(value) => {
                log::debug!("[Session] Ignoring control record {}", value);
            }
        }
    }

    fn update_nodes(&mut self, nodes: Vec<String>, reports: &mut Vec<TunerError>) {
        let (reserved, nodes): (Vec<String>, Vec<String>) =
            nodes.into_iter().partition(|n| n == NO_NODE);
        if !reserved.is_empty() {
            log::warn!(
                "[Session] Dropping advertised node named {:?}; the name is reserved",
                NO_NODE
            );
        }
        log::debug!("[Session] Available nodes: {:?}", nodes);
        self.available_nodes = nodes;
        self.advertised = true;

        let selected = self.selected_node().map(ToString::to_string);
        if let Some(node) = &selected {
            if self.available_nodes.contains(node) {
                return;
            }
            log::info!("[Session] Node {} is no longer available", node);
            self.reset();
            self.state = NodeState::NoNodeSelected;
        }

        match self.pick_node() {
            Some(node) => {
                if let Err(e) = self.select_node(&node) {
                    reports.push(e);
                }
            }
            None => {
                if selected.is_some() {
                    self.send(Outbound::Control(ChosenNode::none()));
                }
                if let Some(e) = self.missing_pinned_node() {
                    reports.push(e);
                }
            }
        }
    }

    fn pick_node(&self) -> Option<String> {
        let preferred = self
            .preferred_node
            .as_ref()
            .filter(|preferred| self.available_nodes.contains(preferred));
        if self.pinned {
            return preferred.cloned();
        }
        preferred.or_else(|| self.available_nodes.first()).cloned()
    }

    fn deselect(&mut self) -> bool {
        if self.selected_node().is_none() {
            return false;
        }
        log::info!("[Session] Deselecting node");
        self.reset();
        self.state = NodeState::NoNodeSelected;
        self.send(Outbound::Control(ChosenNode::none()));
        true
    }

    fn handle_data(&mut self, message: DataMessage, reports: &mut Vec<TunerError>) {
        let awaiting = matches!(self.state, NodeState::AwaitingDefinitions { .. });
        let ready = self.is_ready();

        match message {
            DataMessage::Definitions(list) if awaiting && self.registry.is_empty() => {
                self.load(list, reports);
            }
            DataMessage::Definitions(list) if ready => self.redefine(list, reports),
            DataMessage::ValuePush(update) if ready => self.push_value(update, reports),
            other => reports.push(self.shape_error(describe(&other))),
        }
    }

    fn load(&mut self, list: DefinitionList, reports: &mut Vec<TunerError>) {
        let params = self.resolve_all(list, reports);
        self.registry.flatten(&params);
        self.editors.load(&params);
        log::info!(
            "[Session] Loaded {} parameter(s), {} id(s)",
            params.len(),
            self.registry.len()
        );

        if let NodeState::AwaitingDefinitions { node } = &self.state {
            self.state = NodeState::Ready { node: node.clone() };
        }
    }

    fn redefine(&mut self, list: DefinitionList, reports: &mut Vec<TunerError>) {
        let params = self.resolve_all(list, reports);
        self.registry.flatten(&params);
        log::debug!("[Session] Reconciling {} definition(s)", params.len());
        for param in params {
            if let Err(e) = self.editors.reconcile(param) {
                reports.push(e);
            }
        }
    }

    fn push_value(&mut self, update: ValueUpdate, reports: &mut Vec<TunerError>) {
        let ValueUpdate { id, val } = update;
        log::trace!("[Session] Value push {} = {}", id, val);

        if self.editors.contains(id) {
            match self.editors.bind_value(id, &val) {
                Ok(()) => {
                    self.registry.set_value(id, &val);
                }
                Err(e) => reports.push(e),
            }
        } else if self.registry.get(id).is_none() {
            reports.push(TunerError::UnknownParameterId(id));
        } else if !self.registry.set_value(id, &val) {
            reports.push(self.shape_error(format!("[{}, {}]", id.0, val)));
        }
    }

    /// Resolve every decoded definition. Failures become placeholders so the
    /// id stays known; undecodable entries are skipped.
    fn resolve_all(&self, list: DefinitionList, reports: &mut Vec<TunerError>) -> Vec<Param> {
        for (entry, reason) in &list.rejected {
            reports.push(self.shape_error(format!("{entry} ({reason})")));
        }
        list.params
            .iter()
            .map(|wire| match resolve(wire) {
                Ok(param) => param,
                Err(e) => {
                    let placeholder = unresolved(wire, &e);
                    reports.push(e);
                    placeholder
                }
            })
            .collect()
    }

    fn shape_error(&self, message: String) -> TunerError {
        TunerError::ProtocolShapeError {
            message,
            state: format!("{:?}", self.state),
        }
    }

    fn reset(&mut self) {
        self.registry.clear();
        self.editors.clear();
    }

    fn send(&self, message: Outbound) {
        log::debug!("[Session] Queueing {:?}", message);
        if self.outbox.send(message).is_err() {
            log::warn!("[Session] Outbound queue closed, message dropped");
        }
    }
}

fn describe(message: &DataMessage) -> String {
    match message {
        DataMessage::Definitions(list) => format!(
            "{} definition(s) {}",
            list.params.len(),
            serde_json::to_string(&list.params).unwrap_or_default()
        ),
        DataMessage::ValuePush(update) => format!("[{}, {}]", update.id.0, update.val),
        DataMessage::Other(value) => value.to_string(),
    }
}
