//! Allowed-channel registry.
//!
//! Holds the set of channel indices the bot may answer on. The set is
//! rebuilt from scratch after every successful connection: channel indices
//! are only meaningful per device session, so nothing survives a rebuild.
//! Membership in this set is the sole authorization gate for replies.

use std::collections::HashSet;

use log::{info, warn};

use crate::link::ChannelInfo;

/// Set of channel indices eligible for bot responses.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    allowed: HashSet<u8>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the allowed set from a fresh channel discovery. A channel
    /// qualifies iff its trimmed, lowercased name exactly matches one of
    /// `accepted_names` (which are already normalized). Unnamed channels
    /// are skipped.
    pub fn rebuild(&mut self, channels: &[ChannelInfo], accepted_names: &[String]) {
        self.allowed.clear();
        let mut found = Vec::new();
        for ch in channels {
            if ch.name.is_empty() {
                continue;
            }
            info!("{}: {}", ch.channel_idx, ch.name);
            let normalized = ch.name.trim().to_lowercase();
            if accepted_names.iter().any(|a| *a == normalized) {
                self.allowed.insert(ch.channel_idx);
                found.push(format!("{} ({})", ch.channel_idx, ch.name));
            }
        }
        if found.is_empty() {
            warn!("No {} channels found.", accepted_names.join("/"));
        } else {
            info!("Bot responds in: {}", found.join(", "));
        }
    }

    /// Is this channel index eligible for replies?
    pub fn allows(&self, channel_idx: u8) -> bool {
        self.allowed.contains(&channel_idx)
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["#connections".to_string(), "#robot".to_string()]
    }

    fn ch(idx: u8, name: &str) -> ChannelInfo {
        ChannelInfo {
            channel_idx: idx,
            name: name.to_string(),
        }
    }

    #[test]
    fn accepts_exact_normalized_names() {
        let mut reg = ChannelRegistry::new();
        reg.rebuild(
            &[ch(0, "Public"), ch(1, " #Robot "), ch(2, "#CONNECTIONS")],
            &names(),
        );
        assert!(!reg.allows(0));
        assert!(reg.allows(1));
        assert!(reg.allows(2));
    }

    #[test]
    fn rejects_near_misses() {
        let mut reg = ChannelRegistry::new();
        reg.rebuild(&[ch(1, "robot"), ch(2, "#robots"), ch(3, "")], &names());
        assert!(reg.is_empty());
    }

    #[test]
    fn rebuild_replaces_previous_set() {
        let mut reg = ChannelRegistry::new();
        reg.rebuild(&[ch(1, "#robot"), ch(2, "#connections")], &names());
        assert!(reg.allows(1));
        assert!(reg.allows(2));

        reg.rebuild(&[ch(3, "#robot")], &names());
        assert!(!reg.allows(1), "stale index survived a rebuild");
        assert!(!reg.allows(2), "stale index survived a rebuild");
        assert!(reg.allows(3));
        assert_eq!(reg.len(), 1);
    }
}
