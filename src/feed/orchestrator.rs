use crate::{app::errors::FeedError, catalog::CatalogClient};

use super::{channels::Channel, merge::sort_by_recency, resolver, uploads, videos::Video, CancelToken};

#[derive(Debug)]
pub struct ChannelFailure {
    pub channel: String,
    pub error: FeedError,
}

#[derive(Debug, Default)]
pub struct FetchResult {
    /// Every channel's uploads, newest first.
    pub videos: Vec<Video>,
    /// The input channels, in input order, with any newly learned ids.
    pub channels: Vec<Channel>,
    pub failures: Vec<ChannelFailure>,
    pub cancelled: bool,
}

/// Resolves and enumerates each channel in turn and gathers the uploads
/// into one batch.
///
/// A channel that fails is logged and contributes nothing; the batch itself
/// never fails because of a single channel.
pub fn fetch_videos_and_update_channels<C: CatalogClient + ?Sized>(
    client: &C,
    channels: &[Channel],
    per_channel_count: u32,
    cancel: &CancelToken,
) -> FetchResult {
    let mut result = FetchResult {
        channels: channels.to_vec(),
        ..Default::default()
    };

    for slot in result.channels.iter_mut() {
        if cancel.is_cancelled() {
            log::info!("fetch cancelled before {}", slot.human_readable);
            result.cancelled = true;
            break;
        }

        let channel = if slot.is_resolved() {
            slot.clone()
        } else {
            let resolved = resolver::resolve(client, slot);
            slot.absorb(&resolved.channel);
            match resolved.into_result() {
                Ok(channel) => channel,
                Err(error) => {
                    log::error!(
                        "Error fetching videos for channel {}: {error}",
                        slot.human_readable
                    );
                    result.failures.push(ChannelFailure {
                        channel: slot.human_readable.clone(),
                        error,
                    });
                    continue;
                }
            }
        };

        let Some(uploads_playlist_id) = channel.resolution.uploads_playlist_id() else {
            continue;
        };

        log::info!("Fetching videos for {}", channel.human_readable);
        match uploads::enumerate(client, uploads_playlist_id, per_channel_count, cancel) {
            Ok(videos) => {
                log::debug!("{} returned {} videos", channel.human_readable, videos.len());
                result.videos.extend(videos.into_iter().map(|mut video| {
                    video.source_channel_key = channel.human_readable.clone();
                    video.has_been_watched = false;
                    video
                }));
            }
            Err(error) => {
                log::error!(
                    "Error fetching videos for channel {}: {error}",
                    channel.human_readable
                );
                result.failures.push(ChannelFailure {
                    channel: channel.human_readable.clone(),
                    error,
                });
            }
        }
    }

    if cancel.is_cancelled() {
        result.cancelled = true;
    }

    sort_by_recency(&mut result.videos);
    result
}
