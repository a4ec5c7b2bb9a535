//! Tuner - live parameter tuning client.
//!
//! Mirrors the parameter tree of a remote process ("node") over a single
//! WebSocket and keeps one identity-stable editor per parameter in sync with
//! it. Local edits are applied immediately and sent back as `(id, value)`
//! updates.
//!
//! # Architecture
//!
//! - **Transport** - [`ws`] halves and the [`protocol`] multiplexer (JSON
//!   control records and MessagePack data on one socket)
//! - **Model** - [`param`]: wire definitions, the type resolver and the
//!   id-keyed registry
//! - **Editors** - [`editor`]: one editor per parameter in an arena, rebound
//!   in place on redefinition
//! - **Session** - [`session`]: node selection and frame routing
//! - **Client** - [`client`]: the event loop tying the socket to a session
//!
//! # Modules
//!
//! - [`config`] - Configuration loading/saving
//! - [`render`] - Plain-text painter for the editor tree

pub mod client;
pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod param;
pub mod protocol;
pub mod render;
pub mod session;
pub mod ws;

// Re-export commonly used types
pub use client::{Client, ClientExit, Command};
pub use config::Config;
pub use error::TunerError;
pub use param::{Param, ParamId, ParamKind, ParamValue, WireParam};
pub use session::{NodeState, Session};
