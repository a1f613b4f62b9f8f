//! Command interpretation for inbound messages.
//!
//! [`interpret`] is a pure function: it decides eligibility and which
//! command (if any) a message triggers, without touching the clock or the
//! RNG. Reply text construction lives on [`Command`] so the randomness and
//! time reads happen exactly once, at send time.

use chrono::{SecondsFormat, Utc};

use super::channels::ChannelRegistry;
use super::phrases;
use crate::link::PendingMessage;

/// Command a message resolved to. At most one per message; ping wins over
/// date when both substrings occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping {
        channel_idx: u8,
        nick: String,
        hops: u8,
    },
    Date {
        channel_idx: u8,
    },
}

/// Reply ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub channel_idx: u8,
    pub text: String,
}

/// Map an inbound message to at most one command.
///
/// Eligibility, all required: the message is a channel message with index
/// greater than zero, the index is in the registry, and the message has
/// text. Everything else silently resolves to `None`.
pub fn interpret(msg: &PendingMessage, registry: &ChannelRegistry) -> Option<Command> {
    let PendingMessage::Channel(msg) = msg else {
        return None;
    };
    if msg.channel_idx == 0 {
        return None;
    }
    if !registry.allows(msg.channel_idx) {
        return None;
    }
    let text = msg.text.as_deref()?;

    if is_ping(text) {
        return Some(Command::Ping {
            channel_idx: msg.channel_idx,
            nick: resolve_nick(text),
            hops: msg.path_len,
        });
    }
    if text.contains(".date") {
        return Some(Command::Date {
            channel_idx: msg.channel_idx,
        });
    }
    None
}

impl Command {
    /// Build the outbound reply. Picks the random phrase (ping) or reads
    /// the clock (date) at call time.
    pub fn reply(&self) -> OutboundMessage {
        match self {
            Command::Ping {
                channel_idx,
                nick,
                hops,
            } => OutboundMessage {
                channel_idx: *channel_idx,
                text: format!("🏓 {}, {} {}!", nick, hops, phrases::pick()),
            },
            Command::Date { channel_idx } => OutboundMessage {
                channel_idx: *channel_idx,
                text: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        }
    }

    /// Whether this reply gets the deliberate pacing delay before sending.
    pub fn is_paced(&self) -> bool {
        matches!(self, Command::Ping { .. })
    }
}

/// Detect "ping" / "пинг" as a whole whitespace-delimited word,
/// case-insensitive.
fn is_ping(text: &str) -> bool {
    let lowered = text.to_lowercase();
    lowered
        .split_whitespace()
        .any(|word| word == "ping" || word == "пинг")
}

/// Extract the sender nickname from a leading `"name:"` prefix; `"unknown"`
/// when there is no usable prefix.
fn resolve_nick(text: &str) -> String {
    match text.split_once(':') {
        Some((name, _)) if !name.trim().is_empty() => name.trim().to_string(),
        _ => "unknown".to_string(),
    }
}
