//! Runtime configuration for the bot.
//!
//! There is deliberately no configuration file: the bot reads nothing from
//! disk and consumes no environment variables. Everything it needs comes
//! from the command line plus the fixed defaults below.

use tokio::time::Duration;

/// Default serial port, platform-specific example path.
#[cfg(target_os = "macos")]
pub const DEFAULT_PORT: &str = "/dev/cu.usbmodem1101";
#[cfg(not(target_os = "macos"))]
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";

/// Channel names (normalized: trimmed, lowercase) the bot is allowed to
/// answer on.
pub const ACCEPTED_CHANNEL_NAMES: [&str; 2] = ["#connections", "#robot"];

/// Bot runtime settings.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Serial port the MeshCore device is attached to.
    pub port: String,
    /// Serial baud rate.
    pub baud_rate: u32,
    /// Period of the repeating reconnect-retry timer.
    pub reconnect_interval: Duration,
    /// Pacing delay applied before a ping reply is sent.
    pub reply_delay: Duration,
    /// Normalized channel names eligible for bot responses.
    pub allowed_channels: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: 115200,
            reconnect_interval: Duration::from_millis(3000),
            reply_delay: Duration::from_millis(5000),
            allowed_channels: ACCEPTED_CHANNEL_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let cfg = BotConfig::default();
        assert_eq!(cfg.reconnect_interval, Duration::from_millis(3000));
        assert_eq!(cfg.reply_delay, Duration::from_millis(5000));
        assert_eq!(cfg.allowed_channels, vec!["#connections", "#robot"]);
    }
}
