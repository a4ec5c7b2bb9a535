//! Application-wide constants for the tuner.
//!
//! # Categories
//!
//! - **Protocol**: reserved wire values
//! - **Defaults**: configuration fallbacks

// ============================================================================
// Protocol
// ============================================================================

/// Wire name meaning "no node selected".
///
/// Nodes advertising this exact name are dropped from the available set so
/// the sentinel never collides with a real node.
pub const NO_NODE: &str = "None";

// ============================================================================
// Defaults
// ============================================================================

/// Default tuner endpoint. The node's web server exposes the socket at `/ws`.
pub const DEFAULT_URL: &str = "ws://127.0.0.1:8080/ws";

/// Capacity of the user command queue feeding the client loop.
pub const COMMAND_QUEUE_CAPACITY: usize = 64;
