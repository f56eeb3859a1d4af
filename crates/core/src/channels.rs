//! Notification delivery channels.
//!
//! Channel names are stored as snake_case strings in
//! `notification_logs.channel` and inside the JSONB `channels` arrays of
//! `notifications` and `notification_preferences`.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A delivery medium for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Stored notification shown in the notification bell feed.
    InApp,
    Email,
    Sms,
    WebPush,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::InApp, Channel::Email, Channel::Sms, Channel::WebPush];

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::InApp => "in_app",
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::WebPush => "web_push",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown notification channel '{s}'")))
    }
}

/// An ordered, duplicate-free set of channels.
///
/// Serializes as a JSON array of channel names, e.g. `["in_app","email"]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelSet(BTreeSet<Channel>);

impl ChannelSet {
    /// Every channel enabled; the default for a freshly materialized preference.
    pub fn all() -> Self {
        Channel::ALL.into_iter().collect()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, channel: Channel) -> bool {
        self.0.contains(&channel)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Channel> + '_ {
        self.0.iter().copied()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.iter()
                .map(|c| serde_json::Value::String(c.as_str().to_string()))
                .collect(),
        )
    }

    /// Decode a JSONB `channels` column.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Validation(format!("Invalid channel list: {e}")))
    }
}

impl FromIterator<Channel> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = Channel>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preference_enables_every_channel() {
        let all = ChannelSet::all();
        assert_eq!(all.len(), 4);
        assert!(Channel::ALL.iter().all(|c| all.contains(*c)));
    }

    #[test]
    fn duplicates_collapse() {
        let set: ChannelSet = [Channel::Email, Channel::Email, Channel::InApp]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_json(), serde_json::json!(["in_app", "email"]));
    }

    #[test]
    fn from_json_rejects_unknown_channel() {
        assert!(ChannelSet::from_json(&serde_json::json!(["carrier_pigeon"])).is_err());
        let set = ChannelSet::from_json(&serde_json::json!(["web_push", "sms"])).unwrap();
        assert!(set.contains(Channel::WebPush) && set.contains(Channel::Sms));
    }

    #[test]
    fn parse_matches_storage_names() {
        for channel in Channel::ALL {
            assert_eq!(channel.as_str().parse::<Channel>().unwrap(), channel);
        }
    }
}
