//! # MeshCore Device Link
//!
//! Communication seam between the bot and a MeshCore companion radio. The
//! bot core never touches transport details; it sees the device as an
//! opaque [`DeviceLink`] (a handful of async command operations) plus a
//! stream of [`LinkEvent`]s delivered over an mpsc channel by whatever
//! drives the transport.
//!
//! The serial-port implementation lives in [`serial`] (feature `serial`).
//! Tests substitute their own in-memory link.

pub mod framer;
#[cfg(feature = "serial")]
pub mod serial;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a device link.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("device link is not open")]
    Closed,
    #[error("malformed device frame: {0}")]
    Protocol(String),
    #[error("device rejected command (status {0})")]
    Rejected(u8),
}

/// Asynchronous notifications pushed by the device.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// The transport dropped; the link must be reconnected.
    Disconnected,
    /// The device holds queued messages ready to be fetched.
    MessagesWaiting,
    /// A node announced its presence/identity.
    Advert(Advert),
}

/// Presence advert broadcast by a mesh node.
#[derive(Debug, Clone)]
pub struct Advert {
    pub public_key: Vec<u8>,
}

/// Identity reported by the device on query.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub manufacturer_model: String,
    pub firmware_build_date: String,
}

/// Kind of peer a contact record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactType {
    None,
    Contact,
    Repeater,
    Room,
}

impl ContactType {
    pub fn from_wire(value: u8) -> Self {
        match value {
            1 => ContactType::Contact,
            2 => ContactType::Repeater,
            3 => ContactType::Room,
            _ => ContactType::None,
        }
    }
}

impl std::fmt::Display for ContactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ContactType::None => "None",
            ContactType::Contact => "Contact",
            ContactType::Repeater => "Repeater",
            ContactType::Room => "Room",
        };
        f.write_str(name)
    }
}

/// Known peer, addressed by public key.
#[derive(Debug, Clone)]
pub struct Contact {
    pub adv_name: String,
    pub contact_type: ContactType,
    pub public_key: Vec<u8>,
}

/// Broadcast channel as reported by channel discovery.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub channel_idx: u8,
    pub name: String,
}

/// Direct message from a known contact.
#[derive(Debug, Clone)]
pub struct ContactMessage {
    /// Leading bytes of the sender's public key.
    pub pub_key_prefix: Vec<u8>,
    pub text: Option<String>,
    /// Seconds since the Unix epoch, as stamped by the sender.
    pub sender_timestamp: u64,
    /// Hop count; 0 when the device did not report one.
    pub path_len: u8,
}

/// Message received on a broadcast channel.
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub channel_idx: u8,
    pub text: Option<String>,
    /// Seconds since the Unix epoch, as stamped by the sender.
    pub sender_timestamp: u64,
    /// Hop count; 0 when the device did not report one.
    pub path_len: u8,
}

/// Queued inbound message fetched from the device mailbox.
#[derive(Debug, Clone)]
pub enum PendingMessage {
    Contact(ContactMessage),
    Channel(ChannelMessage),
}

/// Async command surface of a MeshCore device connection.
///
/// Implementations deliver [`LinkEvent`]s through the channel handed out at
/// construction time; commands are issued one at a time by the single
/// owning task.
#[async_trait]
pub trait DeviceLink: Send {
    /// Establish (or re-establish) the transport session.
    async fn connect(&mut self) -> Result<(), LinkError>;

    /// Query device identity (model, firmware build date).
    async fn device_query(&mut self) -> Result<DeviceInfo, LinkError>;

    /// Push the host clock down to the device.
    async fn sync_clock(&mut self) -> Result<(), LinkError>;

    /// Fetch the device's contact list.
    async fn contacts(&mut self) -> Result<Vec<Contact>, LinkError>;

    /// Fetch the device's channel table.
    async fn channels(&mut self) -> Result<Vec<ChannelInfo>, LinkError>;

    /// Fetch the next batch of queued inbound messages. An empty batch
    /// means the mailbox is drained.
    async fn waiting_messages(&mut self) -> Result<Vec<PendingMessage>, LinkError>;

    /// Send a text message on a broadcast channel. No buffering, no retry.
    async fn send_channel_message(&mut self, channel_idx: u8, text: &str) -> Result<(), LinkError>;
}

/// Render bytes as lowercase hex for logs.
pub fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_renders_lowercase() {
        assert_eq!(hex(&[0x00, 0xab, 0x3c]), "00ab3c");
    }

    #[test]
    fn contact_type_wire_mapping() {
        assert_eq!(ContactType::from_wire(2), ContactType::Repeater);
        assert_eq!(ContactType::from_wire(9), ContactType::None);
        assert_eq!(ContactType::from_wire(3).to_string(), "Room");
    }
}
