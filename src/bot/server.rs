//! # Bot Server - Connection Lifecycle and Event Routing
//!
//! [`BotServer`] owns the device link, the connection state machine, the
//! reconnect-retry timer, and the allowed-channel registry. It runs a
//! single `tokio::select!` loop over the link's event stream, the
//! (optional) reconnect timer, and ctrl-c.
//!
//! Everything is driven from one task: link events are handled to
//! completion one at a time, so message drains can never overlap and the
//! registry/timer are only ever touched from here. Link loss at any point
//! degrades to the reconnect timer; the process never exits on its own.

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use log::{error, info, warn};
use tokio::sync::mpsc;
use tokio::time::{self, sleep, Instant, Interval, MissedTickBehavior};

use super::channels::ChannelRegistry;
use super::commands;
use crate::config::BotConfig;
use crate::link::{self, DeviceLink, LinkEvent, PendingMessage};
use crate::logutil::escape_log;

/// Lifecycle of the device link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Main bot controller. Generic over the link so tests can substitute an
/// in-memory device.
pub struct BotServer<L: DeviceLink> {
    config: BotConfig,
    link: L,
    events: mpsc::UnboundedReceiver<LinkEvent>,
    state: ConnectionState,
    registry: ChannelRegistry,
    /// Repeating retry timer; `Some` only while reconnecting. Replacing
    /// the slot drops the previous timer, so two can never coexist.
    reconnect: Option<Interval>,
}

impl<L: DeviceLink> BotServer<L> {
    pub fn new(config: BotConfig, link: L, events: mpsc::UnboundedReceiver<LinkEvent>) -> Self {
        Self {
            config,
            link,
            events,
            state: ConnectionState::Disconnected,
            registry: ChannelRegistry::new(),
            reconnect: None,
        }
    }

    /// Run until ctrl-c or until the link's event stream closes.
    pub async fn run(&mut self) -> Result<()> {
        self.connect().await;
        loop {
            tokio::select! {
                ev = self.events.recv() => {
                    match ev {
                        Some(ev) => self.handle_event(ev).await,
                        None => {
                            warn!("Link event stream closed, shutting down");
                            break;
                        }
                    }
                }
                _ = reconnect_tick(&mut self.reconnect) => {
                    self.connect().await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Attempt to connect now. On failure the retry timer takes over; a
    /// failed attempt from the timer itself just logs and lets the timer
    /// keep running.
    pub async fn connect(&mut self) {
        self.state = ConnectionState::Connecting;
        match self.link.connect().await {
            Ok(()) => self.on_connected().await,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                if self.reconnect.is_some() {
                    error!("Reconnect failed: {e}");
                } else {
                    error!("Connect failed: {e}");
                    self.schedule_reconnect();
                }
            }
        }
    }

    /// Dispatch one link event.
    pub async fn handle_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Disconnected => self.on_disconnected(),
            LinkEvent::MessagesWaiting => {
                if let Err(e) = self.drain_messages().await {
                    error!("Message error: {e:#}");
                }
            }
            LinkEvent::Advert(advert) => {
                info!("Advert: {}", link::hex(&advert.public_key));
            }
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Is a retry timer currently armed?
    pub fn reconnect_scheduled(&self) -> bool {
        self.reconnect.is_some()
    }

    /// Post-connect initialization. Four independent best-effort steps: a
    /// failure is logged and the remaining steps still run.
    async fn on_connected(&mut self) {
        self.state = ConnectionState::Connected;
        self.reconnect = None;
        info!("Connected");

        match self.link.device_query().await {
            Ok(device) => {
                info!("Model: {}", device.manufacturer_model);
                info!("Firmware build date: {}", device.firmware_build_date);
            }
            Err(e) => error!("Error getting device info: {e}"),
        }

        info!("Sync clock...");
        if let Err(e) = self.link.sync_clock().await {
            error!("Error syncing device time: {e}");
        }

        info!("Get contacts...");
        match self.link.contacts().await {
            Ok(contacts) => {
                for c in &contacts {
                    info!(
                        "{}: {}; key: {}",
                        c.contact_type,
                        c.adv_name,
                        link::hex(&c.public_key)
                    );
                }
            }
            Err(e) => error!("Error retrieving contacts: {e}"),
        }

        info!("Get channels...");
        match self.link.channels().await {
            Ok(channels) => self.registry.rebuild(&channels, &self.config.allowed_channels),
            Err(e) => error!("Error retrieving channels: {e}"),
        }
    }

    fn on_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
        info!("Disconnected, reconnecting...");
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        let period = self.config.reconnect_interval;
        let mut timer = time::interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.reconnect = Some(timer);
    }

    /// Fetch message batches until the device mailbox is empty, handling
    /// each message in order. A fetch failure aborts the drain; the next
    /// messages-waiting signal starts a fresh one.
    async fn drain_messages(&mut self) -> Result<()> {
        loop {
            let batch = self
                .link
                .waiting_messages()
                .await
                .context("fetching waiting messages")?;
            if batch.is_empty() {
                return Ok(());
            }
            for msg in &batch {
                match msg {
                    PendingMessage::Contact(m) => info!(
                        "Contact message from {} at {}: {}",
                        link::hex(&m.pub_key_prefix),
                        sender_timestamp_iso(m.sender_timestamp),
                        escape_log(m.text.as_deref().unwrap_or("")),
                    ),
                    PendingMessage::Channel(m) => info!(
                        "Channel message on {} at {}: {}",
                        m.channel_idx,
                        sender_timestamp_iso(m.sender_timestamp),
                        escape_log(m.text.as_deref().unwrap_or("")),
                    ),
                }
                self.respond(msg).await?;
            }
        }
    }

    /// Interpret one message and send the reply, if any. Send failures
    /// propagate to the drain's caller.
    async fn respond(&mut self, msg: &PendingMessage) -> Result<()> {
        let Some(cmd) = commands::interpret(msg, &self.registry) else {
            return Ok(());
        };
        let reply = cmd.reply();
        if cmd.is_paced() {
            sleep(self.config.reply_delay).await;
        }
        self.link
            .send_channel_message(reply.channel_idx, &reply.text)
            .await
            .context("sending reply")?;
        Ok(())
    }
}

/// Await the next retry tick, or forever when no timer is armed.
async fn reconnect_tick(slot: &mut Option<Interval>) {
    match slot {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Sender timestamp (seconds since epoch) in ISO-8601 display form.
fn sender_timestamp_iso(secs: u64) -> String {
    chrono::DateTime::from_timestamp(secs as i64, 0)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| format!("@{secs}"))
}
