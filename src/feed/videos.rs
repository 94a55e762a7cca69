use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::duration::is_short;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub channel_title: String,
    pub channel_id: String,
    /// `humanReadable` of the channel this video was fetched for.
    #[serde(default)]
    pub source_channel_key: String,
    #[serde(default)]
    pub has_been_watched: bool,
    #[serde(default)]
    pub duration_seconds: u64,
    #[serde(default)]
    pub is_short: bool,
}

impl Video {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        published_at: DateTime<Utc>,
        channel_title: impl Into<String>,
        channel_id: impl Into<String>,
        duration_seconds: u64,
    ) -> Self {
        Video {
            id: id.into(),
            title: title.into(),
            published_at,
            channel_title: channel_title.into(),
            channel_id: channel_id.into(),
            source_channel_key: String::new(),
            has_been_watched: false,
            duration_seconds,
            is_short: is_short(duration_seconds),
        }
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

/// View-side filters applied when paging through the cached feed.
#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    pub hide_shorts: bool,
    pub hide_watched: bool,
    /// Lowercased terms; a title containing any of them is hidden.
    pub terms: Vec<String>,
}

impl VideoFilter {
    pub fn parse_terms(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect()
    }

    pub fn matches(&self, video: &Video) -> bool {
        if self.hide_shorts && video.is_short {
            return false;
        }
        if self.hide_watched && video.has_been_watched {
            return false;
        }
        if self.terms.is_empty() {
            return true;
        }
        let title = video.title.to_lowercase();
        !self.terms.iter().any(|term| title.contains(term))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPage {
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub videos: Vec<Video>,
}

/// Returns the 1-based `page` of `videos` after filtering. Pages past the end
/// are clamped to the last page.
pub fn paginate(videos: &[Video], filter: &VideoFilter, page: usize, page_size: usize) -> VideoPage {
    let page_size = page_size.max(1);
    let visible: Vec<&Video> = videos.iter().filter(|v| filter.matches(v)).collect();
    let total_items = visible.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);

    let videos = visible
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .cloned()
        .collect();

    VideoPage {
        page,
        total_pages,
        total_items,
        videos,
    }
}
