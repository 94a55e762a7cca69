use crate::{
    app::errors::{FeedError, FeedResult},
    catalog::CatalogClient,
};

use super::channels::{Channel, Resolution};

/// Outcome of a resolution attempt. `channel` always carries whatever got
/// resolved, even when `error` is set, so a channel id learned before a
/// failing uploads lookup isn't looked up again next time.
#[derive(Debug)]
pub struct Resolved {
    pub channel: Channel,
    pub error: Option<FeedError>,
}

/// Fills in the channel id and uploads collection id, calling the remote
/// only for what's still missing.
pub fn resolve<C: CatalogClient + ?Sized>(client: &C, channel: &Channel) -> Resolved {
    let mut channel = channel.clone();

    if channel.human_readable.trim().is_empty() {
        return Resolved {
            channel,
            error: Some(FeedError::validation("channel", "channel handle cannot be empty")),
        };
    }

    if let Resolution::Unresolved = channel.resolution {
        log::info!("Fetching channel ID for {}", channel.human_readable);
        match client.channel_id_for_handle(&channel.human_readable) {
            Ok(channel_id) if !channel_id.is_empty() => {
                channel.resolution = Resolution::PartiallyResolved { channel_id };
            }
            Ok(_) => {
                let error = FeedError::not_found(format!(
                    "channel not found for handle: {}",
                    channel.human_readable
                ));
                return Resolved { channel, error: Some(error) };
            }
            Err(error) => return Resolved { channel, error: Some(error) },
        }
    }

    if let Resolution::PartiallyResolved { channel_id } = channel.resolution.clone() {
        log::info!("Fetching uploads playlist ID for {}", channel.human_readable);
        match client.uploads_playlist_id(&channel_id) {
            Ok(uploads_playlist_id) if !uploads_playlist_id.is_empty() => {
                channel.resolution = Resolution::Resolved {
                    channel_id,
                    uploads_playlist_id,
                };
            }
            Ok(_) => {
                let error = FeedError::not_found(format!(
                    "uploads playlist not found for channel: {channel_id}"
                ));
                return Resolved { channel, error: Some(error) };
            }
            Err(error) => return Resolved { channel, error: Some(error) },
        }
    }

    Resolved {
        channel,
        error: None,
    }
}

impl Resolved {
    pub fn into_result(self) -> FeedResult<Channel> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.channel),
        }
    }
}
