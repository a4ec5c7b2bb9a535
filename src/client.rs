//! Client event loop.
//!
//! One socket, one cooperative loop. Every inbound frame, user command and
//! outbound write goes through the same `tokio::select!`, so frames are
//! handled strictly in arrival order and nothing else ever touches the
//! writer.
//!
//! ```text
//! TunerSocket ──frame──┐
//! commands ─────cmd────┼──► Session ──Outbound──► outbox ──► SocketWriter
//! outbox ──────────────┘
//! ```

// Rust guideline compliant 2026-02

use std::ops::ControlFlow;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;

use crate::editor::Interaction;
use crate::param::{ParamId, ParamValue};
use crate::protocol::Outbound;
use crate::session::Session;
use crate::ws::{self, SocketEvent, SocketWriter};

/// A request from the user to the running client.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Select a node by name, or deselect with `"None"`.
    Select(String),
    /// Apply a local edit.
    Interact {
        /// Target parameter.
        id: ParamId,
        /// What to do to it.
        interaction: Interaction,
    },
    /// Flush pending writes and disconnect.
    Shutdown,
}

impl Command {
    /// Parse one line of the interactive command language.
    ///
    /// ```text
    /// node <name>
    /// set <id> <json value>
    /// toggle <id>
    /// pick <id> <option index>
    /// component <id> <index> <value>
    /// quit
    /// ```
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            bail!("empty command");
        };

        let command = match verb {
            "node" => Self::Select(words.next().context("node needs a name")?.to_string()),
            "quit" | "exit" => Self::Shutdown,
            "set" => {
                let id = parse_id(words.next())?;
                let raw = words.collect::<Vec<_>>().join(" ");
                let json: serde_json::Value =
                    serde_json::from_str(&raw).with_context(|| format!("invalid value {raw:?}"))?;
                let val = ParamValue::from_json(&json)
                    .with_context(|| format!("{raw} is not a parameter value"))?;
                Self::Interact {
                    id,
                    interaction: Interaction::SetValue(val),
                }
            }
            "toggle" => Self::Interact {
                id: parse_id(words.next())?,
                interaction: Interaction::Toggle,
            },
            "pick" => Self::Interact {
                id: parse_id(words.next())?,
                interaction: Interaction::SelectOption(
                    words.next().context("pick needs an option index")?.parse()?,
                ),
            },
            "component" => Self::Interact {
                id: parse_id(words.next())?,
                interaction: Interaction::SetComponent {
                    index: words.next().context("component needs an index")?.parse()?,
                    value: words.next().context("component needs a value")?.parse()?,
                },
            },
            other => bail!("unknown command {other:?}"),
        };
        Ok(command)
    }
}

fn parse_id(word: Option<&str>) -> Result<ParamId> {
    let word = word.context("missing parameter id")?;
    let id = word
        .trim_start_matches('#')
        .parse::<i64>()
        .with_context(|| format!("invalid parameter id {word:?}"))?;
    Ok(ParamId(id))
}

/// Why [`Client::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientExit {
    /// The server closed the socket or the connection failed.
    Disconnected,
    /// A shutdown was requested locally.
    Shutdown,
}

/// A session bound to a socket.
#[derive(Debug)]
pub struct Client {
    session: Session,
    outbox: mpsc::UnboundedReceiver<Outbound>,
}

impl Client {
    /// Create a client; `preferred_node` is picked when advertised.
    pub fn new(preferred_node: Option<String>) -> Self {
        let (tx, outbox) = mpsc::unbounded_channel();
        Self {
            session: Session::new(preferred_node, tx),
            outbox,
        }
    }

    /// Create a client that only ever selects `node`.
    pub fn pinned(node: String) -> Self {
        let (tx, outbox) = mpsc::unbounded_channel();
        Self {
            session: Session::pinned(node, tx),
            outbox,
        }
    }

    /// The session driven by this client.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Connect to `url` and run until the socket closes or a shutdown is
    /// requested.
    ///
    /// `observer` runs once after connecting and again after every handled
    /// frame or command. Returning [`ControlFlow::Break`] shuts down after
    /// pending writes are flushed.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn run<F>(
        &mut self,
        url: &str,
        commands: &mut mpsc::Receiver<Command>,
        mut observer: F,
    ) -> Result<ClientExit>
    where
        F: FnMut(&mut Session) -> ControlFlow<()>,
    {
        let (mut writer, mut reader) = ws::connect(url).await?;
        log::info!("[Client] Connected to {}", url);
        self.session.on_connected();

        let mut exit = if observer(&mut self.session).is_break() {
            Some(ClientExit::Shutdown)
        } else {
            None
        };

        while exit.is_none() {
            tokio::select! {
                event = reader.recv() => {
                    match event {
                        Some(Ok(SocketEvent::Frame(payload))) => {
                            self.session.handle_frame(&payload);
                        }
                        Some(Ok(SocketEvent::Ping(data))) => {
                            let _ = writer.pong(data).await;
                            continue;
                        }
                        Some(Ok(SocketEvent::Closed { code, reason })) => {
                            log::info!("[Client] Connection closed by server ({code}): {reason}");
                            exit = Some(ClientExit::Disconnected);
                            continue;
                        }
                        Some(Err(e)) => {
                            log::warn!("[Client] {:#}", e);
                            exit = Some(ClientExit::Disconnected);
                            continue;
                        }
                        None => {
                            log::info!("[Client] WebSocket stream ended");
                            exit = Some(ClientExit::Disconnected);
                            continue;
                        }
                    }
                }

                Some(message) = self.outbox.recv() => {
                    if let Err(e) = write(&mut writer, &message).await {
                        log::warn!("[Client] {:#}", e);
                        exit = Some(ClientExit::Disconnected);
                    }
                    continue;
                }

                Some(command) = commands.recv() => {
                    if command == Command::Shutdown {
                        exit = Some(ClientExit::Shutdown);
                        continue;
                    }
                    self.apply(command);
                }
            }

            if observer(&mut self.session).is_break() {
                exit = Some(ClientExit::Shutdown);
            }
        }

        let exit = exit.unwrap_or(ClientExit::Disconnected);
        if exit == ClientExit::Shutdown {
            self.flush(&mut writer).await;
            if let Err(e) = writer.close().await {
                log::debug!("[Client] {:#}", e);
            }
        }
        self.session.on_disconnected();
        Ok(exit)
    }

    /// Connect, wait for the selected node's tree, set `id` to `val` and
    /// disconnect once the update is written.
    ///
    /// Returns the value as sent. On a [`Client::pinned`] client nothing is
    /// written unless the pinned node is advertised.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails, the pinned node is not
    /// advertised, the edit is refused, or the socket closes first.
    pub async fn set_value(&mut self, url: &str, id: ParamId, val: ParamValue) -> Result<ParamValue> {
        let (_tx, mut commands) = mpsc::channel(1);
        let mut outcome = None;
        let exit = self
            .run(url, &mut commands, |session| {
                if let Some(e) = session.missing_pinned_node() {
                    outcome = Some(Err(e));
                    return ControlFlow::Break(());
                }
                if !session.is_ready() {
                    return ControlFlow::Continue(());
                }
                outcome = Some(session.interact(id, Interaction::SetValue(val.clone())));
                ControlFlow::Break(())
            })
            .await?;

        match outcome {
            Some(Ok(Some(sent))) => Ok(sent),
            Some(Ok(None)) => bail!("{id} does not take a value"),
            Some(Err(e)) => Err(e.into()),
            None => bail!("Disconnected ({exit:?}) before the parameter tree arrived"),
        }
    }

    fn apply(&mut self, command: Command) {
        let result = match command {
            Command::Select(node) => self.session.select_node(&node).map(|_| ()),
            Command::Interact { id, interaction } => {
                self.session.interact(id, interaction).map(|_| ())
            }
            Command::Shutdown => Ok(()),
        };
        if let Err(e) = result {
            log::warn!("[Client] {}", e);
        }
    }

    async fn flush(&mut self, writer: &mut SocketWriter) {
        while let Ok(message) = self.outbox.try_recv() {
            if let Err(e) = write(writer, &message).await {
                log::warn!("[Client] Dropping unsent messages: {:#}", e);
                return;
            }
        }
    }
}

async fn write(writer: &mut SocketWriter, message: &Outbound) -> Result<()> {
    log::debug!("[Client] Sending {:?}", message);
    writer.send(message.encode()?).await
}
