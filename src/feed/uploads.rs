use chrono::{DateTime, Utc};

use crate::{
    app::errors::FeedResult,
    catalog::{CatalogClient, PlaylistEntry, MAX_PAGE_SIZE},
};

use super::{duration::parse_duration, videos::Video, CancelToken};

/// Walks an uploads collection until `requested` items were asked for or the
/// collection runs out, most recent first.
///
/// The budget shrinks by what each page *asked* for, so a short page can end
/// the walk early. Entries with missing fields, and entries whose duration
/// lookup fails, are skipped without failing the page.
pub fn enumerate<C: CatalogClient + ?Sized>(
    client: &C,
    uploads_playlist_id: &str,
    requested: u32,
    cancel: &CancelToken,
) -> FeedResult<Vec<Video>> {
    let mut videos = Vec::new();
    let mut remaining = requested;
    let mut page_token: Option<String> = None;

    while remaining > 0 {
        if cancel.is_cancelled() {
            log::info!("enumeration of {uploads_playlist_id} cancelled");
            break;
        }

        let page_size = remaining.min(MAX_PAGE_SIZE);
        let page = client.playlist_items(uploads_playlist_id, page_size, page_token.as_deref())?;
        remaining -= page_size;

        for entry in page.items {
            if let Some(video) = enrich(client, entry) {
                videos.push(video);
            }
        }

        page_token = page.next_page_token;
        if page_token.is_none() {
            break;
        }
    }

    Ok(videos)
}

fn enrich<C: CatalogClient + ?Sized>(client: &C, entry: PlaylistEntry) -> Option<Video> {
    let PlaylistEntry {
        video_id: Some(video_id),
        title: Some(title),
        published_at: Some(published_at),
        channel_title: Some(channel_title),
        channel_id: Some(channel_id),
    } = entry
    else {
        return None;
    };
    if [&video_id, &title, &published_at, &channel_title, &channel_id]
        .iter()
        .any(|field| field.is_empty())
    {
        return None;
    }

    let published_at = match DateTime::parse_from_rfc3339(&published_at) {
        Ok(published_at) => published_at.with_timezone(&Utc),
        Err(err) => {
            log::debug!("skipping {video_id}: bad publishedAt {published_at:?}: {err}");
            return None;
        }
    };

    let duration = match client.video_duration(&video_id) {
        Ok(duration) => duration.unwrap_or_default(),
        Err(err) => {
            log::warn!("skipping {video_id}: duration lookup failed: {err}");
            return None;
        }
    };

    Some(Video::new(
        video_id,
        title,
        published_at,
        channel_title,
        channel_id,
        parse_duration(&duration),
    ))
}
