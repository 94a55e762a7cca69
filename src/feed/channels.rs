use serde::{Deserialize, Serialize};

use crate::app::errors::{FeedError, FeedResult};

/// How far a channel's remote identifiers have been looked up.
///
/// Moves strictly forward; see [`Channel::absorb`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Resolution {
    #[default]
    Unresolved,
    PartiallyResolved {
        channel_id: String,
    },
    Resolved {
        channel_id: String,
        uploads_playlist_id: String,
    },
}

impl Resolution {
    fn rank(&self) -> u8 {
        match self {
            Resolution::Unresolved => 0,
            Resolution::PartiallyResolved { .. } => 1,
            Resolution::Resolved { .. } => 2,
        }
    }

    pub fn channel_id(&self) -> Option<&str> {
        match self {
            Resolution::Unresolved => None,
            Resolution::PartiallyResolved { channel_id }
            | Resolution::Resolved { channel_id, .. } => Some(channel_id),
        }
    }

    pub fn uploads_playlist_id(&self) -> Option<&str> {
        match self {
            Resolution::Resolved {
                uploads_playlist_id,
                ..
            } => Some(uploads_playlist_id),
            _ => None,
        }
    }
}

/// A tracked channel keyed by the handle the user typed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ChannelRecord", into = "ChannelRecord")]
pub struct Channel {
    pub human_readable: String,
    pub resolution: Resolution,
}

/// On-disk shape of a channel: empty strings stand for "not resolved yet".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelRecord {
    human_readable: String,
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    uploads_playlist_id: String,
}

impl From<ChannelRecord> for Channel {
    fn from(record: ChannelRecord) -> Self {
        // an uploads id without its channel id can't be trusted
        let resolution = match (record.channel_id.is_empty(), record.uploads_playlist_id.is_empty()) {
            (true, true) => Resolution::Unresolved,
            (true, false) => {
                log::warn!(
                    "channel \"{}\" has uploads id {} but no channel id, dropping it and resolving again",
                    record.human_readable,
                    record.uploads_playlist_id
                );
                Resolution::Unresolved
            }
            (false, true) => Resolution::PartiallyResolved {
                channel_id: record.channel_id,
            },
            (false, false) => Resolution::Resolved {
                channel_id: record.channel_id,
                uploads_playlist_id: record.uploads_playlist_id,
            },
        };

        Channel {
            human_readable: record.human_readable,
            resolution,
        }
    }
}

impl From<Channel> for ChannelRecord {
    fn from(channel: Channel) -> Self {
        let (channel_id, uploads_playlist_id) = match channel.resolution {
            Resolution::Unresolved => (String::new(), String::new()),
            Resolution::PartiallyResolved { channel_id } => (channel_id, String::new()),
            Resolution::Resolved {
                channel_id,
                uploads_playlist_id,
            } => (channel_id, uploads_playlist_id),
        };

        ChannelRecord {
            human_readable: channel.human_readable,
            channel_id,
            uploads_playlist_id,
        }
    }
}

impl Channel {
    pub fn new(human_readable: impl Into<String>) -> Self {
        Channel {
            human_readable: human_readable.into(),
            resolution: Resolution::Unresolved,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, Resolution::Resolved { .. })
    }

    /// Takes over `other`'s identifiers when they are further along than ours.
    /// Never clears or rewrites an identifier already known.
    pub fn absorb(&mut self, other: &Channel) {
        if other.human_readable != self.human_readable {
            return;
        }
        if other.resolution.rank() > self.resolution.rank() {
            if let Some(known) = self.resolution.channel_id() {
                if other.resolution.channel_id() != Some(known) {
                    log::warn!(
                        "ignoring conflicting channel id for \"{}\"",
                        self.human_readable
                    );
                    return;
                }
            }
            self.resolution = other.resolution.clone();
        }
    }
}

/// Trims and validates a handle typed by the user.
pub fn normalize_handle(raw: &str) -> FeedResult<String> {
    let handle = raw.trim();
    if handle.is_empty() {
        return Err(FeedError::validation("channel", "channel handle cannot be empty"));
    }
    if handle.contains(',') {
        return Err(FeedError::validation(
            "channel",
            "channel handle cannot contain a comma",
        ));
    }
    Ok(handle.to_string())
}

/// Inserts a channel keeping the list sorted and unique. Returns `false`
/// when the handle is already tracked.
pub fn insert_channel(channels: &mut Vec<Channel>, channel: Channel) -> bool {
    match channels.binary_search_by(|c| c.human_readable.cmp(&channel.human_readable)) {
        Ok(_) => false,
        Err(idx) => {
            channels.insert(idx, channel);
            true
        }
    }
}

pub fn remove_channel(channels: &mut Vec<Channel>, human_readable: &str) -> Option<Channel> {
    let idx = channels
        .iter()
        .position(|c| c.human_readable == human_readable)?;
    Some(channels.remove(idx))
}

pub fn sort_channels(channels: &mut Vec<Channel>) {
    channels.sort_by(|a, b| a.human_readable.cmp(&b.human_readable));
    channels.dedup_by(|a, b| a.human_readable == b.human_readable);
}
