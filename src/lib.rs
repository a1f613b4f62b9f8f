//! # Meshbot - Channel Bot for MeshCore Networks
//!
//! Meshbot is a long-running chat bot for MeshCore packet-radio mesh
//! networks. It keeps a persistent link to a radio attached over a serial
//! port, reacts to queued messages and presence adverts, and answers a
//! small set of commands (`ping`/`пинг`, `.date`) on a restricted set of
//! broadcast channels. Link loss is survived indefinitely: a repeating
//! retry timer reconnects without manual intervention.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meshbot::bot::BotServer;
//! use meshbot::config::BotConfig;
//! use meshbot::link::serial::SerialLink;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BotConfig::default();
//!     let (link, events) = SerialLink::new(&config.port, 115200);
//!     let mut server = BotServer::new(config, link, events);
//!     server.run().await
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`bot`] - Connection lifecycle, event routing, command interpretation
//! - [`link`] - Opaque device-link seam and the serial transport adapter
//! - [`config`] - Runtime settings (CLI-driven; nothing is read from disk)
//! - [`logutil`] - Log sanitization helpers
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   BotServer     │ ← state machine, retry timer, event loop
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   DeviceLink    │ ← opaque async command surface + event stream
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   SerialLink    │ ← companion-protocol serial adapter (feature `serial`)
//! └─────────────────┘
//! ```
//!
//! The bot holds no state across restarts and writes nothing to disk;
//! failures are visible only in logs, never as error replies on the mesh.

pub mod bot;
pub mod config;
pub mod link;
pub mod logutil;
