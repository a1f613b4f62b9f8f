//! Shared test helpers: an in-memory device link and server builders.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use meshbot::bot::BotServer;
use meshbot::config::BotConfig;
use meshbot::link::{
    ChannelInfo, ChannelMessage, Contact, DeviceInfo, DeviceLink, LinkError, LinkEvent,
    PendingMessage,
};

/// State shared between a test and its [`MockLink`].
#[derive(Default)]
pub struct LinkState {
    pub connect_attempts: usize,
    /// Each connect attempt consumes one failure before succeeding.
    pub connect_failures_remaining: usize,
    /// Channel table reported by discovery.
    pub channels: Vec<ChannelInfo>,
    /// Message batches returned by successive mailbox fetches.
    pub batches: VecDeque<Vec<PendingMessage>>,
    /// Messages the bot sent, as (channel_idx, text).
    pub sent: Vec<(u8, String)>,
    pub fail_sends: bool,
}

pub type SharedState = Arc<Mutex<LinkState>>;

/// In-memory [`DeviceLink`] driven entirely by [`LinkState`].
pub struct MockLink {
    pub state: SharedState,
}

#[async_trait]
impl DeviceLink for MockLink {
    async fn connect(&mut self) -> Result<(), LinkError> {
        let mut st = self.state.lock().unwrap();
        st.connect_attempts += 1;
        if st.connect_failures_remaining > 0 {
            st.connect_failures_remaining -= 1;
            return Err(LinkError::Closed);
        }
        Ok(())
    }

    async fn device_query(&mut self) -> Result<DeviceInfo, LinkError> {
        Ok(DeviceInfo {
            manufacturer_model: "Heltec V3".to_string(),
            firmware_build_date: "1 Apr 2025".to_string(),
        })
    }

    async fn sync_clock(&mut self) -> Result<(), LinkError> {
        Ok(())
    }

    async fn contacts(&mut self) -> Result<Vec<Contact>, LinkError> {
        Ok(Vec::new())
    }

    async fn channels(&mut self) -> Result<Vec<ChannelInfo>, LinkError> {
        Ok(self.state.lock().unwrap().channels.clone())
    }

    async fn waiting_messages(&mut self) -> Result<Vec<PendingMessage>, LinkError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .batches
            .pop_front()
            .unwrap_or_default())
    }

    async fn send_channel_message(&mut self, channel_idx: u8, text: &str) -> Result<(), LinkError> {
        let mut st = self.state.lock().unwrap();
        if st.fail_sends {
            return Err(LinkError::Closed);
        }
        st.sent.push((channel_idx, text.to_string()));
        Ok(())
    }
}

pub fn ch(idx: u8, name: &str) -> ChannelInfo {
    ChannelInfo {
        channel_idx: idx,
        name: name.to_string(),
    }
}

/// Typical channel table: public at 0, both allowed names present.
pub fn robot_channels() -> Vec<ChannelInfo> {
    vec![
        ch(0, "Public"),
        ch(1, "#robot"),
        ch(2, "#connections"),
        ch(3, "#random"),
    ]
}

pub fn channel_msg(idx: u8, text: &str, path_len: u8) -> PendingMessage {
    PendingMessage::Channel(ChannelMessage {
        channel_idx: idx,
        text: Some(text.to_string()),
        sender_timestamp: 1714564800,
        path_len,
    })
}

/// Server around a mock link primed with `channels`, plus the shared state
/// and the event injection handle.
pub fn server_with_channels(
    channels: Vec<ChannelInfo>,
) -> (
    BotServer<MockLink>,
    SharedState,
    mpsc::UnboundedSender<LinkEvent>,
) {
    let state: SharedState = Arc::new(Mutex::new(LinkState {
        channels,
        ..LinkState::default()
    }));
    let (tx, rx) = mpsc::unbounded_channel();
    let server = BotServer::new(
        BotConfig::default(),
        MockLink {
            state: state.clone(),
        },
        rx,
    );
    (server, state, tx)
}

pub fn sent(state: &SharedState) -> Vec<(u8, String)> {
    state.lock().unwrap().sent.clone()
}

pub fn push_batch(state: &SharedState, batch: Vec<PendingMessage>) {
    state.lock().unwrap().batches.push_back(batch);
}
