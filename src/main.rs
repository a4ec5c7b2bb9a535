//! Tuner CLI - inspect and live-tune a node's parameters from the terminal.
//!
//! This is the main binary entry point. See the `tuner` library for the
//! protocol, session and editor logic.

use std::ops::ControlFlow;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tuner::constants::COMMAND_QUEUE_CAPACITY;
use tuner::{render, Client, ClientExit, Command, Config, ParamId, ParamValue, Session};

/// Global allocator configured per M-MIMALLOC-APPS guideline.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI
#[derive(Parser)]
#[command(name = "tuner")]
#[command(version = VERSION)]
#[command(about = "Inspect and live-tune the parameters of a running node")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the parameter tree whenever it changes; read commands from stdin
    Watch {
        /// Tuner endpoint (ws://, wss://, http:// or https://)
        #[arg(long)]
        url: Option<String>,
        /// Node to select when advertised
        #[arg(long)]
        node: Option<String>,
    },
    /// Print the parameter tree once and exit
    Dump {
        /// Tuner endpoint
        #[arg(long)]
        url: Option<String>,
        /// Node to select when advertised
        #[arg(long)]
        node: Option<String>,
    },
    /// Set one parameter and exit
    Set {
        /// Tuner endpoint
        #[arg(long)]
        url: Option<String>,
        /// Node owning the parameter
        #[arg(long)]
        node: String,
        /// Parameter id
        id: i64,
        /// New value, parsed as JSON
        value: String,
    },
    /// Print the effective configuration
    Config {
        /// Also write it to the configuration file
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<()> {
    init_logging()?;

    let cli = Cli::parse();
    let mut config = Config::load()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let result = match cli.command {
        Commands::Watch { url, node } => {
            apply_flags(&mut config, url, node);
            runtime.block_on(watch(&config))
        }
        Commands::Dump { url, node } => {
            apply_flags(&mut config, url, node);
            runtime.block_on(dump(&config))
        }
        Commands::Set {
            url,
            node,
            id,
            value,
        } => {
            apply_flags(&mut config, url, None);
            let json: serde_json::Value =
                serde_json::from_str(&value).with_context(|| format!("Invalid JSON {value:?}"))?;
            let val = ParamValue::from_json(&json)
                .with_context(|| format!("{value} is not a parameter value"))?;
            runtime.block_on(set(&config, node, ParamId(id), val))
        }
        Commands::Config { save } => show_config(&config, save),
    };

    // The stdin reader of `watch` may still be parked in a blocking read.
    runtime.shutdown_background();
    result
}

fn show_config(config: &Config, save: bool) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    if save {
        config.save()?;
        println!("Saved to {}", Config::config_dir()?.display());
    }
    Ok(())
}

/// Log to stderr, or to `TUNER_LOG_FILE` when set.
fn init_logging() -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_timestamp_secs();
    if let Ok(path) = std::env::var("TUNER_LOG_FILE") {
        let log_file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create log file at {path}"))?;
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }
    builder.init();
    Ok(())
}

fn apply_flags(config: &mut Config, url: Option<String>, node: Option<String>) {
    if let Some(url) = url {
        config.url = url;
    }
    if node.is_some() {
        config.preferred_node = node;
    }
}

async fn watch(config: &Config) -> Result<()> {
    let (tx, mut commands) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    tokio::spawn(read_commands(tx));

    let mut client = Client::new(config.preferred_node.clone());
    let mut last = String::new();
    let print = config.print_on_change;
    let exit = client
        .run(&config.ws_url(), &mut commands, |session| {
            let painted = paint(session);
            if print && painted != last {
                println!("{painted}");
                last = painted;
            }
            ControlFlow::Continue(())
        })
        .await?;

    if exit == ClientExit::Disconnected {
        log::info!("Server closed the connection");
    }
    Ok(())
}

async fn dump(config: &Config) -> Result<()> {
    let (_tx, mut commands) = mpsc::channel(1);
    let mut client = Client::new(config.preferred_node.clone());
    let exit = client
        .run(&config.ws_url(), &mut commands, |session| {
            if session.is_ready() {
                print!("{}", render::render_tree(session.editors()));
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        })
        .await?;

    anyhow::ensure!(
        exit == ClientExit::Shutdown,
        "Disconnected before the parameter tree arrived"
    );
    Ok(())
}

/// Set one value on exactly `node`; never falls back to another node.
async fn set(config: &Config, node: String, id: ParamId, val: ParamValue) -> Result<()> {
    let mut client = Client::pinned(node);
    let sent = client.set_value(&config.ws_url(), id, val).await?;
    println!("{id} = {sent}");
    Ok(())
}

fn paint(session: &Session) -> String {
    let node = session.selected_node().unwrap_or("-");
    format!(
        "[{node}] {:?}\n{}",
        session.state(),
        render::render_tree(session.editors())
    )
}

async fn read_commands(tx: mpsc::Sender<Command>) {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::warn!("Failed to read stdin: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match Command::parse(&line) {
            Ok(command) => {
                let shutdown = command == Command::Shutdown;
                if tx.send(command).await.is_err() || shutdown {
                    break;
                }
            }
            Err(e) => eprintln!("{e:#}"),
        }
    }
}
