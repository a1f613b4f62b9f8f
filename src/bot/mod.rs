//! # Bot Core Module
//!
//! The pieces with actual control flow: connection lifecycle, event
//! routing, and command handling.
//!
//! ## Components
//!
//! - [`server`] - Connection state machine, reconnect timer, and the event
//!   loop that routes inbound messages
//! - [`channels`] - Allowed-channel registry, rebuilt on every connection
//! - [`commands`] - Stateless interpreter mapping a message to at most one
//!   reply
//! - [`phrases`] - Hop-count phrase vocabulary for ping replies
//!
//! ## Flow
//!
//! ```text
//! connect ──► init steps ──► ChannelRegistry rebuild
//!    ▲                              │
//!    │ retry timer          gates   ▼
//! disconnect        messages ──► interpret ──► reply
//! ```

pub mod channels;
pub mod commands;
pub mod phrases;
pub mod server;

pub use channels::ChannelRegistry;
pub use commands::{Command, OutboundMessage};
pub use server::{BotServer, ConnectionState};
