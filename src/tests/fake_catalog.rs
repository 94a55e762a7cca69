use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use chrono::{Duration, Utc};

use crate::{
    app::errors::{FeedError, FeedResult},
    catalog::{CatalogClient, PlaylistEntry, PlaylistPage},
};

type Hook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calls {
    pub handle: usize,
    pub uploads: usize,
    pub items: usize,
    pub duration: usize,
}

#[derive(Default)]
struct State {
    handles: HashMap<String, String>,
    uploads: HashMap<String, String>,
    playlists: HashMap<String, Vec<PlaylistEntry>>,
    durations: HashMap<String, String>,
    failing_handles: HashSet<String>,
    failing_playlists: HashSet<String>,
    failing_durations: HashSet<String>,
    item_hooks: HashMap<String, Hook>,
    page_caps: HashMap<String, usize>,
    calls: Calls,
    handle_lookups: Vec<String>,
}

/// Scripted stand-in for the YouTube API. Clones share state, so a test can
/// keep one handle while the service owns another.
#[derive(Clone, Default)]
pub struct FakeCatalog {
    state: Arc<Mutex<State>>,
}

pub fn channel_id(handle: &str) -> String {
    format!("UC-{handle}")
}

pub fn uploads_id(handle: &str) -> String {
    format!("UU-{handle}")
}

pub fn video_id(handle: &str, n: usize) -> String {
    format!("{handle}-{n}")
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a channel with `count` uploads, newest first, one day apart.
    pub fn with_channel(self, handle: &str, count: usize) -> Self {
        let entries = (0..count)
            .map(|n| PlaylistEntry {
                video_id: Some(video_id(handle, n)),
                title: Some(format!("{handle} upload {n}")),
                published_at: Some((Utc::now() - Duration::days(n as i64 + 1)).to_rfc3339()),
                channel_title: Some(format!("{handle} channel")),
                channel_id: Some(channel_id(handle)),
            })
            .collect();
        self.with_entries(handle, entries)
    }

    pub fn with_entries(self, handle: &str, entries: Vec<PlaylistEntry>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.handles.insert(handle.to_string(), channel_id(handle));
            state.uploads.insert(channel_id(handle), uploads_id(handle));
            state.playlists.insert(uploads_id(handle), entries);
        }
        self
    }

    pub fn with_duration(self, video_id: &str, raw: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .durations
            .insert(video_id.to_string(), raw.to_string());
        self
    }

    /// Serves at most `cap` items per page of `handle`'s uploads, whatever
    /// the caller asked for, still handing out a next page token.
    pub fn with_page_cap(self, handle: &str, cap: usize) -> Self {
        self.state
            .lock()
            .unwrap()
            .page_caps
            .insert(uploads_id(handle), cap);
        self
    }

    pub fn fail_handle(&self, handle: &str) {
        self.state.lock().unwrap().failing_handles.insert(handle.to_string());
    }

    pub fn heal_handle(&self, handle: &str) {
        self.state.lock().unwrap().failing_handles.remove(handle);
    }

    pub fn fail_playlist(&self, handle: &str) {
        self.state.lock().unwrap().failing_playlists.insert(uploads_id(handle));
    }

    pub fn fail_duration(&self, video_id: &str) {
        self.state.lock().unwrap().failing_durations.insert(video_id.to_string());
    }

    /// Runs `hook` every time a page of `handle`'s uploads is requested.
    pub fn on_items(&self, handle: &str, hook: impl Fn() + Send + Sync + 'static) {
        self.state
            .lock()
            .unwrap()
            .item_hooks
            .insert(uploads_id(handle), Arc::new(hook));
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().unwrap().calls
    }

    pub fn handle_lookups(&self) -> Vec<String> {
        self.state.lock().unwrap().handle_lookups.clone()
    }
}

impl CatalogClient for FakeCatalog {
    fn channel_id_for_handle(&self, handle: &str) -> FeedResult<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.handle += 1;
        state.handle_lookups.push(handle.to_string());

        if state.failing_handles.contains(handle) {
            return Err(FeedError::network("connection reset"));
        }
        state
            .handles
            .get(handle)
            .cloned()
            .ok_or_else(|| FeedError::not_found(format!("channel not found for handle: {handle}")))
    }

    fn uploads_playlist_id(&self, channel_id: &str) -> FeedResult<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.uploads += 1;
        state
            .uploads
            .get(channel_id)
            .cloned()
            .ok_or_else(|| FeedError::not_found(format!("no uploads for {channel_id}")))
    }

    fn playlist_items(
        &self,
        playlist_id: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> FeedResult<PlaylistPage> {
        let hook = {
            let mut state = self.state.lock().unwrap();
            state.calls.items += 1;
            state.item_hooks.get(playlist_id).cloned()
        };
        // outside the lock, hooks may poke at the fake
        if let Some(hook) = hook {
            hook();
        }

        let state = self.state.lock().unwrap();
        if state.failing_playlists.contains(playlist_id) {
            return Err(FeedError::network("quota exceeded"));
        }
        let entries = state
            .playlists
            .get(playlist_id)
            .ok_or_else(|| FeedError::not_found(format!("playlist {playlist_id}")))?;

        let start: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let mut take = max_results as usize;
        if let Some(cap) = state.page_caps.get(playlist_id) {
            take = take.min(*cap);
        }
        let end = (start + take).min(entries.len());
        let items = entries[start.min(end)..end].to_vec();
        let next_page_token = (end < entries.len()).then(|| end.to_string());

        Ok(PlaylistPage {
            items,
            next_page_token,
        })
    }

    fn video_duration(&self, video_id: &str) -> FeedResult<Option<String>> {
        let mut state = self.state.lock().unwrap();
        state.calls.duration += 1;
        if state.failing_durations.contains(video_id) {
            return Err(FeedError::network("timeout"));
        }
        Ok(Some(
            state
                .durations
                .get(video_id)
                .cloned()
                .unwrap_or_else(|| "PT10M".to_string()),
        ))
    }
}
