//! Boundary to the remote video catalog.
//!
//! The feed pipeline only talks to [`CatalogClient`]; the HTTP implementation
//! lives in [`youtube`] and tests use scripted fakes.

pub mod youtube;

use crate::app::errors::FeedResult;

/// Largest page the remote catalog hands out per request.
pub const MAX_PAGE_SIZE: u32 = 50;

/// One entry of an uploads collection page. Every field is optional because
/// the remote may omit any of them; the enumerator drops incomplete items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub published_at: Option<String>,
    pub channel_title: Option<String>,
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistPage {
    pub items: Vec<PlaylistEntry>,
    pub next_page_token: Option<String>,
}

pub trait CatalogClient {
    /// Looks up a channel by its public handle and returns the durable id.
    fn channel_id_for_handle(&self, handle: &str) -> FeedResult<String>;

    /// Returns the id of the collection holding a channel's uploads.
    fn uploads_playlist_id(&self, channel_id: &str) -> FeedResult<String>;

    fn playlist_items(
        &self,
        playlist_id: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> FeedResult<PlaylistPage>;

    /// Raw `PT..` duration of a single video, `None` when the remote has none.
    fn video_duration(&self, video_id: &str) -> FeedResult<Option<String>>;
}
