//! Serial transport adapter for MeshCore companion radios.
//!
//! Implements [`DeviceLink`] over a USB/UART serial port. A blocking reader
//! thread feeds raw bytes through the frame accumulator; push frames
//! (code >= 0x80) become [`LinkEvent`]s, response frames answer the single
//! in-flight command. The companion protocol is strictly
//! request/response, so one response channel per connection is enough.

use std::io::{Read, Write};

use async_trait::async_trait;
use log::{debug, trace, warn};
use serialport::SerialPort;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use super::framer::{encode_frame, FrameAccumulator};
use super::{
    Advert, ChannelInfo, ChannelMessage, Contact, ContactMessage, ContactType, DeviceInfo,
    DeviceLink, LinkError, LinkEvent, PendingMessage,
};

/// Companion protocol constants. All wire knowledge lives here.
mod wire {
    pub const CMD_APP_START: u8 = 1;
    pub const CMD_SEND_CHANNEL_TXT_MSG: u8 = 3;
    pub const CMD_GET_CONTACTS: u8 = 4;
    pub const CMD_SET_DEVICE_TIME: u8 = 6;
    pub const CMD_SYNC_NEXT_MESSAGE: u8 = 10;
    pub const CMD_DEVICE_QUERY: u8 = 22;
    pub const CMD_GET_CHANNEL: u8 = 31;

    pub const RESP_OK: u8 = 0;
    pub const RESP_ERR: u8 = 1;
    pub const RESP_CONTACTS_START: u8 = 2;
    pub const RESP_CONTACT: u8 = 3;
    pub const RESP_END_OF_CONTACTS: u8 = 4;
    pub const RESP_SELF_INFO: u8 = 5;
    pub const RESP_SENT: u8 = 6;
    pub const RESP_CONTACT_MSG_RECV: u8 = 7;
    pub const RESP_CHANNEL_MSG_RECV: u8 = 8;
    pub const RESP_NO_MORE_MESSAGES: u8 = 10;
    pub const RESP_CHANNEL_INFO: u8 = 12;
    pub const RESP_DEVICE_INFO: u8 = 13;

    pub const PUSH_ADVERT: u8 = 0x80;
    pub const PUSH_PATH_UPDATED: u8 = 0x81;
    pub const PUSH_SEND_CONFIRMED: u8 = 0x82;
    pub const PUSH_MSG_WAITING: u8 = 0x83;

    /// Companion app API version sent with APP_START / DEVICE_QUERY.
    pub const APP_TARGET_VER: u8 = 1;
}

/// Highest channel slot probed during discovery.
const MAX_CHANNELS: u8 = 8;

/// Serial-port backed MeshCore link.
pub struct SerialLink {
    port_name: String,
    baud_rate: u32,
    port: Option<Box<dyn SerialPort>>,
    event_tx: mpsc::UnboundedSender<LinkEvent>,
    resp_rx: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl SerialLink {
    /// Create an unconnected link for `port_name`. Returns the link and the
    /// event stream it will feed once connected.
    pub fn new(port_name: &str, baud_rate: u32) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (
            Self {
                port_name: port_name.to_string(),
                baud_rate,
                port: None,
                event_tx,
                resp_rx: None,
            },
            event_rx,
        )
    }

    async fn open_port(&mut self) -> Result<(), LinkError> {
        // Dropping the previous response receiver tells any old reader
        // thread to exit on its next loop iteration.
        self.resp_rx = None;
        self.port = None;

        let mut builder = serialport::new(&self.port_name, self.baud_rate)
            .timeout(std::time::Duration::from_millis(500));
        // Some USB serial adapters need explicit settings
        #[cfg(unix)]
        {
            builder = builder
                .data_bits(serialport::DataBits::Eight)
                .stop_bits(serialport::StopBits::One)
                .parity(serialport::Parity::None);
        }
        let mut port = builder.open().map_err(|e| {
            LinkError::Protocol(format!("failed to open {}: {}", self.port_name, e))
        })?;
        // Toggle DTR/RTS to wake the device (common for ESP32 based boards)
        let _ = port.write_data_terminal_ready(true);
        let _ = port.write_request_to_send(true);
        sleep(Duration::from_millis(150)).await;
        // Discard any buffered startup text
        let mut purge_buf = [0u8; 512];
        if let Ok(available) = port.bytes_to_read() {
            if available > 0 {
                let _ = port.read(&mut purge_buf);
            }
        }

        let reader_port = port
            .try_clone()
            .map_err(|e| LinkError::Protocol(format!("failed to clone port handle: {e}")))?;
        let (resp_tx, resp_rx) = mpsc::unbounded_channel();
        let event_tx = self.event_tx.clone();
        std::thread::spawn(move || reader_loop(reader_port, resp_tx, event_tx));

        self.port = Some(port);
        self.resp_rx = Some(resp_rx);
        debug!("Serial port {} open", self.port_name);
        Ok(())
    }

    /// Issue one command frame and await its response frame.
    async fn request(&mut self, payload: &[u8]) -> Result<Vec<u8>, LinkError> {
        let rx = self.resp_rx.as_mut().ok_or(LinkError::Closed)?;
        // Drop stale unsolicited responses before issuing a new command
        while rx.try_recv().is_ok() {}
        let port = self.port.as_mut().ok_or(LinkError::Closed)?;
        port.write_all(&encode_frame(payload))?;
        port.flush()?;
        let rx = self.resp_rx.as_mut().ok_or(LinkError::Closed)?;
        let frame = rx.recv().await.ok_or(LinkError::Closed)?;
        if frame.is_empty() {
            return Err(LinkError::Protocol("empty response frame".into()));
        }
        Ok(frame)
    }
}

#[async_trait]
impl DeviceLink for SerialLink {
    async fn connect(&mut self) -> Result<(), LinkError> {
        self.open_port().await?;
        let mut payload = vec![wire::CMD_APP_START, wire::APP_TARGET_VER];
        payload.extend_from_slice(b"meshbot");
        let resp = self.request(&payload).await?;
        match resp[0] {
            wire::RESP_SELF_INFO | wire::RESP_OK => Ok(()),
            wire::RESP_ERR => Err(LinkError::Rejected(wire::RESP_ERR)),
            other => Err(LinkError::Protocol(format!(
                "unexpected app-start response code {other:#04x}"
            ))),
        }
    }

    async fn device_query(&mut self) -> Result<DeviceInfo, LinkError> {
        let resp = self
            .request(&[wire::CMD_DEVICE_QUERY, wire::APP_TARGET_VER])
            .await?;
        if resp[0] != wire::RESP_DEVICE_INFO {
            return Err(LinkError::Rejected(resp[0]));
        }
        parse_device_info(&resp)
    }

    async fn sync_clock(&mut self) -> Result<(), LinkError> {
        let now = chrono::Utc::now().timestamp() as u32;
        let mut payload = vec![wire::CMD_SET_DEVICE_TIME];
        payload.extend_from_slice(&now.to_le_bytes());
        let resp = self.request(&payload).await?;
        if resp[0] == wire::RESP_OK {
            Ok(())
        } else {
            Err(LinkError::Rejected(resp[0]))
        }
    }

    async fn contacts(&mut self) -> Result<Vec<Contact>, LinkError> {
        let mut payload = vec![wire::CMD_GET_CONTACTS];
        payload.extend_from_slice(&0u32.to_le_bytes()); // "since" filter: everything
        let rx = self.resp_rx.as_mut().ok_or(LinkError::Closed)?;
        while rx.try_recv().is_ok() {}
        let port = self.port.as_mut().ok_or(LinkError::Closed)?;
        port.write_all(&encode_frame(&payload))?;
        port.flush()?;

        let rx = self.resp_rx.as_mut().ok_or(LinkError::Closed)?;
        let mut contacts = Vec::new();
        loop {
            let frame = rx.recv().await.ok_or(LinkError::Closed)?;
            match frame.first().copied() {
                Some(wire::RESP_CONTACTS_START) => continue,
                Some(wire::RESP_CONTACT) => contacts.push(parse_contact(&frame)?),
                Some(wire::RESP_END_OF_CONTACTS) => return Ok(contacts),
                Some(wire::RESP_ERR) => return Err(LinkError::Rejected(wire::RESP_ERR)),
                Some(other) => {
                    return Err(LinkError::Protocol(format!(
                        "unexpected contact-list frame code {other:#04x}"
                    )))
                }
                None => return Err(LinkError::Protocol("empty response frame".into())),
            }
        }
    }

    async fn channels(&mut self) -> Result<Vec<ChannelInfo>, LinkError> {
        let mut channels = Vec::new();
        for idx in 0..MAX_CHANNELS {
            let resp = self.request(&[wire::CMD_GET_CHANNEL, idx]).await?;
            match resp[0] {
                wire::RESP_CHANNEL_INFO => channels.push(parse_channel_info(&resp)?),
                // Past the last configured slot the device reports an error
                wire::RESP_ERR => break,
                other => {
                    return Err(LinkError::Protocol(format!(
                        "unexpected channel frame code {other:#04x}"
                    )))
                }
            }
        }
        Ok(channels)
    }

    async fn waiting_messages(&mut self) -> Result<Vec<PendingMessage>, LinkError> {
        let resp = self.request(&[wire::CMD_SYNC_NEXT_MESSAGE]).await?;
        match resp[0] {
            wire::RESP_CONTACT_MSG_RECV => {
                Ok(vec![PendingMessage::Contact(parse_contact_message(&resp)?)])
            }
            wire::RESP_CHANNEL_MSG_RECV => {
                Ok(vec![PendingMessage::Channel(parse_channel_message(&resp)?)])
            }
            wire::RESP_NO_MORE_MESSAGES | wire::RESP_OK => Ok(Vec::new()),
            wire::RESP_ERR => Err(LinkError::Rejected(wire::RESP_ERR)),
            other => Err(LinkError::Protocol(format!(
                "unexpected message-sync frame code {other:#04x}"
            ))),
        }
    }

    async fn send_channel_message(&mut self, channel_idx: u8, text: &str) -> Result<(), LinkError> {
        let mut payload = vec![wire::CMD_SEND_CHANNEL_TXT_MSG, 0, channel_idx];
        payload.extend_from_slice(&(chrono::Utc::now().timestamp() as u32).to_le_bytes());
        payload.extend_from_slice(text.as_bytes());
        let resp = self.request(&payload).await?;
        match resp[0] {
            wire::RESP_OK | wire::RESP_SENT => Ok(()),
            other => Err(LinkError::Rejected(other)),
        }
    }
}

/// Blocking read loop: accumulate bytes, split pushes from responses.
/// Exits when the port errors out (emitting `Disconnected`) or when the
/// owning link drops its response receiver.
fn reader_loop(
    mut port: Box<dyn SerialPort>,
    resp_tx: mpsc::UnboundedSender<Vec<u8>>,
    event_tx: mpsc::UnboundedSender<LinkEvent>,
) {
    let mut acc = FrameAccumulator::new();
    let mut buf = [0u8; 1024];
    loop {
        if resp_tx.is_closed() {
            debug!("reader exiting: link re-opened or dropped");
            return;
        }
        match port.read(&mut buf) {
            Ok(0) => continue,
            Ok(n) => {
                acc.push(&buf[..n]);
                while let Some(frame) = acc.next_frame() {
                    dispatch_frame(frame, &resp_tx, &event_tx);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(e) => {
                warn!("Serial read failed: {e}");
                let _ = event_tx.send(LinkEvent::Disconnected);
                return;
            }
        }
    }
}

fn dispatch_frame(
    frame: Vec<u8>,
    resp_tx: &mpsc::UnboundedSender<Vec<u8>>,
    event_tx: &mpsc::UnboundedSender<LinkEvent>,
) {
    let Some(&code) = frame.first() else { return };
    if code < 0x80 {
        let _ = resp_tx.send(frame);
        return;
    }
    match code {
        wire::PUSH_ADVERT => {
            let public_key = frame.get(1..33).unwrap_or(&frame[1..]).to_vec();
            let _ = event_tx.send(LinkEvent::Advert(Advert { public_key }));
        }
        wire::PUSH_MSG_WAITING => {
            let _ = event_tx.send(LinkEvent::MessagesWaiting);
        }
        wire::PUSH_PATH_UPDATED | wire::PUSH_SEND_CONFIRMED => {
            trace!("ignored push frame {code:#04x}");
        }
        other => {
            trace!("unknown push frame {other:#04x}");
        }
    }
}

/// NUL-trimmed, lossy UTF-8 decode of a fixed-width name field.
fn fixed_str(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn parse_device_info(frame: &[u8]) -> Result<DeviceInfo, LinkError> {
    // [code, fw_ver, build_date[12], model...]
    if frame.len() < 14 {
        return Err(LinkError::Protocol("device-info frame too short".into()));
    }
    Ok(DeviceInfo {
        firmware_build_date: fixed_str(&frame[2..14]),
        manufacturer_model: fixed_str(&frame[14..]),
    })
}

fn parse_contact(frame: &[u8]) -> Result<Contact, LinkError> {
    // [code, public_key[32], type, flags, out_path_len, out_path[64], adv_name[32], ...]
    if frame.len() < 132 {
        return Err(LinkError::Protocol("contact frame too short".into()));
    }
    Ok(Contact {
        public_key: frame[1..33].to_vec(),
        contact_type: ContactType::from_wire(frame[33]),
        adv_name: fixed_str(&frame[100..132]),
    })
}

fn parse_channel_info(frame: &[u8]) -> Result<ChannelInfo, LinkError> {
    // [code, channel_idx, name[32], secret...]
    if frame.len() < 34 {
        return Err(LinkError::Protocol("channel frame too short".into()));
    }
    Ok(ChannelInfo {
        channel_idx: frame[1],
        name: fixed_str(&frame[2..34]),
    })
}

fn parse_contact_message(frame: &[u8]) -> Result<ContactMessage, LinkError> {
    // [code, pub_key_prefix[6], path_len, txt_type, sender_timestamp u32le, text...]
    if frame.len() < 13 {
        return Err(LinkError::Protocol("contact message frame too short".into()));
    }
    let text = frame[13..].to_vec();
    Ok(ContactMessage {
        pub_key_prefix: frame[1..7].to_vec(),
        path_len: frame[7],
        sender_timestamp: u32::from_le_bytes([frame[9], frame[10], frame[11], frame[12]]) as u64,
        text: (!text.is_empty()).then(|| String::from_utf8_lossy(&text).into_owned()),
    })
}

fn parse_channel_message(frame: &[u8]) -> Result<ChannelMessage, LinkError> {
    // [code, channel_idx, path_len, txt_type, sender_timestamp u32le, text...]
    if frame.len() < 8 {
        return Err(LinkError::Protocol("channel message frame too short".into()));
    }
    let text = frame[8..].to_vec();
    Ok(ChannelMessage {
        channel_idx: frame[1],
        path_len: frame[2],
        sender_timestamp: u32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]) as u64,
        text: (!text.is_empty()).then(|| String::from_utf8_lossy(&text).into_owned()),
    })
}
