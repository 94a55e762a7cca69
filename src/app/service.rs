use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{
    app::errors::{FeedError, FeedResult},
    catalog::CatalogClient,
    config::Config,
    feed::{
        channels::{self, normalize_handle, Channel},
        merge,
        orchestrator::{fetch_videos_and_update_channels, ChannelFailure, FetchResult},
        policy::{Bypass, Decision, FetchReason, FetchScope, RefetchPolicy},
        share,
        videos::{paginate, Video, VideoFilter, VideoPage},
        CancelToken,
    },
    lock::FetchLock,
    settings::{self, Settings, ViewMode},
    storage::{read_json_strict, write_json, StorageManager},
};

/// Builds a catalog client from the current api key.
pub type Connector<C> = Box<dyn Fn(&str) -> FeedResult<C> + Send + Sync>;

#[derive(Debug)]
pub struct FetchSummary {
    pub reason: FetchReason,
    pub scope: FetchScope,
    /// Channels handed to the orchestrator.
    pub channels: usize,
    /// Videos in the batch after dropping removed channels.
    pub fetched: usize,
    /// Size of the cached feed after the commit.
    pub total: usize,
    pub failures: Vec<ChannelFailure>,
    pub cancelled: bool,
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Fetched(FetchSummary),
    Skipped { remaining: Duration },
    /// Another process holds the fetch lock.
    Busy,
    NothingToFetch,
}

#[derive(Debug)]
pub struct ImportOutcome {
    pub added: Vec<String>,
    pub refresh: RefreshOutcome,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedStatus {
    pub channels: usize,
    pub unresolved_channels: usize,
    pub videos: usize,
    pub unwatched_videos: usize,
    pub last_fetch: Option<DateTime<Utc>>,
    pub next_eligible_fetch: Option<DateTime<Utc>>,
    pub per_channel_item_count: u32,
    pub retention_months: u32,
}

pub struct FeedService<C: CatalogClient> {
    store: Arc<dyn StorageManager>,
    connect: Connector<C>,
    policy: RefetchPolicy,
    config: Config,
    api_key_override: Option<String>,
    cancel: CancelToken,
}

impl<C: CatalogClient> FeedService<C> {
    pub fn new(store: Arc<dyn StorageManager>, config: Config, connect: Connector<C>) -> Self {
        Self {
            store,
            connect,
            policy: RefetchPolicy,
            config,
            api_key_override: None,
            cancel: CancelToken::new(),
        }
    }

    /// Api key that wins over the stored one, e.g. from the environment.
    pub fn with_api_key_override(mut self, api_key: Option<String>) -> Self {
        self.api_key_override = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> Settings {
        Settings::load(self.store.as_ref())
    }

    /// Tracked channels, sorted. An unreadable document is an error so that
    /// no caller writes a partial list over it.
    pub fn channels(&self) -> FeedResult<Vec<Channel>> {
        let mut channels: Vec<Channel> =
            read_json_strict(self.store.as_ref(), settings::KEY_CHANNELS)?.unwrap_or_default();
        channels::sort_channels(&mut channels);
        Ok(channels)
    }

    pub fn videos(&self) -> FeedResult<Vec<Video>> {
        Ok(read_json_strict(self.store.as_ref(), settings::KEY_VIDEOS)?.unwrap_or_default())
    }

    fn save_channels(&self, channels: &[Channel]) -> FeedResult<()> {
        write_json(self.store.as_ref(), settings::KEY_CHANNELS, channels)
    }

    fn save_videos(&self, videos: &[Video]) -> FeedResult<()> {
        write_json(self.store.as_ref(), settings::KEY_VIDEOS, videos)
    }

    /// Runs a fetch-merge cycle if the refetch policy allows one.
    ///
    /// Inside the cool-down window only channels that were never resolved
    /// are fetched, and the shared timestamp is left alone.
    pub fn refresh(&self, force: bool) -> FeedResult<RefreshOutcome> {
        let settings = self.settings();
        let channels = self.channels()?;
        if channels.is_empty() {
            log::info!("no channels tracked, nothing to fetch");
            return Ok(RefreshOutcome::NothingToFetch);
        }

        let now = Utc::now();
        let bypass = force.then_some(Bypass::Forced);
        let mut decision = self.policy.evaluate(
            settings.last_fetch(),
            now,
            channels.len(),
            settings.per_channel_item_count,
            bypass,
        );

        let unresolved: Vec<Channel> = channels
            .iter()
            .filter(|channel| !channel.is_resolved())
            .cloned()
            .collect();

        if !decision.should_fetch() && !unresolved.is_empty() {
            decision = self.policy.evaluate(
                settings.last_fetch(),
                now,
                channels.len(),
                settings.per_channel_item_count,
                Some(Bypass::UnresolvedChannels),
            );
        }

        match decision {
            Decision::Skip { remaining } => {
                log::info!(
                    "skipping fetch, next one allowed in {}m {}s",
                    remaining.num_minutes(),
                    remaining.num_seconds() % 60
                );
                Ok(RefreshOutcome::Skipped { remaining })
            }
            Decision::FetchNow { reason } => {
                let targets = match reason.scope() {
                    FetchScope::Full => channels,
                    FetchScope::Partial => unresolved,
                };
                self.run_cycle(targets, reason)
            }
        }
    }

    /// Starts tracking a channel and fetches just that one.
    pub fn add_channel(&self, raw: &str) -> FeedResult<RefreshOutcome> {
        let handle = normalize_handle(raw)?;
        let mut channels = self.channels()?;

        if !channels::insert_channel(&mut channels, Channel::new(handle.clone())) {
            log::info!("\"{handle}\" is already tracked");
            return Ok(RefreshOutcome::NothingToFetch);
        }
        self.save_channels(&channels)?;
        log::info!("added channel \"{handle}\"");

        self.run_cycle(vec![Channel::new(handle)], FetchReason::Bypass(Bypass::NewChannel))
    }

    /// Stops tracking a channel and drops every cached video fetched for it.
    pub fn remove_channel(&self, handle: &str) -> FeedResult<bool> {
        let handle = handle.trim();
        let mut channels = self.channels()?;
        if channels::remove_channel(&mut channels, handle).is_none() {
            return Ok(false);
        }

        let videos = merge::remove_channel_videos(&self.videos()?, handle);
        self.save_channels(&channels)?;
        self.save_videos(&videos)?;
        log::info!("removed channel \"{handle}\"");
        Ok(true)
    }

    /// Unions a shared list into the tracked channels and fetches the
    /// channels that weren't tracked before.
    pub fn import_shared(&self, input: &str) -> FeedResult<ImportOutcome> {
        let handles: Vec<String> = share::decode_channel_list(input)
            .iter()
            .filter_map(|raw| match normalize_handle(raw) {
                Ok(handle) => Some(handle),
                Err(err) => {
                    log::warn!("skipping shared channel {raw:?}: {err}");
                    None
                }
            })
            .collect();

        let (merged, added) = share::union_channels(&self.channels()?, &handles);
        if added.is_empty() {
            return Ok(ImportOutcome {
                added,
                refresh: RefreshOutcome::NothingToFetch,
            });
        }
        self.save_channels(&merged)?;

        let targets = added.iter().map(Channel::new).collect();
        let refresh = self.run_cycle(targets, FetchReason::Bypass(Bypass::SharedList))?;
        Ok(ImportOutcome { added, refresh })
    }

    pub fn share_link(&self) -> FeedResult<String> {
        share::encode_share_link(&self.config.share_base_url, &self.channels()?)
    }

    pub fn set_watched(&self, id: &str, watched: bool) -> FeedResult<()> {
        let mut videos = self.videos()?;
        if !merge::set_watched(&mut videos, id, watched) {
            return Err(FeedError::not_found(format!("video {id}")));
        }
        self.save_videos(&videos)
    }

    pub fn toggle_watched(&self, id: &str) -> FeedResult<bool> {
        let mut videos = self.videos()?;
        let watched = merge::toggle_watched(&mut videos, id)
            .ok_or_else(|| FeedError::not_found(format!("video {id}")))?;
        self.save_videos(&videos)?;
        Ok(watched)
    }

    pub fn set_per_channel_item_count(&self, raw: &str) -> FeedResult<bool> {
        settings::write_bounded(
            self.store.as_ref(),
            settings::KEY_PER_CHANNEL_COUNT,
            raw,
            &settings::PER_CHANNEL_COUNT_RANGE,
        )
    }

    /// Stores a new retention window and culls the cache to it right away.
    pub fn set_retention_months(&self, raw: &str) -> FeedResult<bool> {
        let written = settings::write_bounded(
            self.store.as_ref(),
            settings::KEY_RETENTION_MONTHS,
            raw,
            &settings::RETENTION_MONTHS_RANGE,
        )?;

        if written {
            let months = self.settings().retention_months;
            let videos = self.videos()?;
            let culled = merge::cull(&videos, months, Utc::now());
            if culled.len() != videos.len() {
                log::info!("culled {} videos", videos.len() - culled.len());
                self.save_videos(&culled)?;
            }
        }
        Ok(written)
    }

    pub fn set_api_key(&self, api_key: &str) -> FeedResult<()> {
        write_json(self.store.as_ref(), settings::KEY_API_KEY, api_key.trim())
    }

    pub fn set_view_mode(&self, mode: ViewMode) -> FeedResult<()> {
        write_json(self.store.as_ref(), settings::KEY_VIEW_MODE, &mode)
    }

    pub fn set_hide_shorts(&self, hide: bool) -> FeedResult<()> {
        write_json(self.store.as_ref(), settings::KEY_HIDE_SHORTS, &hide)
    }

    pub fn set_hide_watched(&self, hide: bool) -> FeedResult<()> {
        write_json(self.store.as_ref(), settings::KEY_HIDE_WATCHED, &hide)
    }

    pub fn set_filter_terms(&self, terms: &str) -> FeedResult<()> {
        write_json(self.store.as_ref(), settings::KEY_FILTER_TERMS, terms.trim())
    }

    /// One page of the cached feed under the stored view filters. Without an
    /// explicit page the last viewed one is shown; the shown page is stored.
    pub fn page(&self, page: Option<usize>) -> FeedResult<VideoPage> {
        let settings = self.settings();
        let filter = VideoFilter {
            hide_shorts: settings.hide_shorts,
            hide_watched: settings.hide_watched,
            terms: VideoFilter::parse_terms(&settings.filter_terms),
        };

        let result = paginate(
            &self.videos()?,
            &filter,
            page.unwrap_or(settings.current_page),
            self.config.page_size,
        );

        if result.page != settings.current_page {
            write_json(self.store.as_ref(), settings::KEY_CURRENT_PAGE, &result.page)?;
        }
        Ok(result)
    }

    pub fn status(&self) -> FeedResult<FeedStatus> {
        let settings = self.settings();
        let channels = self.channels()?;
        let videos = self.videos()?;

        Ok(FeedStatus {
            channels: channels.len(),
            unresolved_channels: channels.iter().filter(|c| !c.is_resolved()).count(),
            videos: videos.len(),
            unwatched_videos: videos.iter().filter(|v| !v.has_been_watched).count(),
            last_fetch: settings.last_fetch(),
            next_eligible_fetch: self.policy.next_eligible(
                settings.last_fetch(),
                channels.len(),
                settings.per_channel_item_count,
            ),
            per_channel_item_count: settings.per_channel_item_count,
            retention_months: settings.retention_months,
        })
    }

    fn api_key(&self, settings: &Settings) -> String {
        self.api_key_override
            .clone()
            .unwrap_or_else(|| settings.api_key.clone())
    }

    /// Fetches `targets` under the fetch lock and commits the batch.
    ///
    /// Timer-driven reasons are evaluated again once the lock is held: a
    /// fetch that finished in another process while this one waited makes
    /// the earlier decision stale.
    pub(crate) fn run_cycle(
        &self,
        targets: Vec<Channel>,
        reason: FetchReason,
    ) -> FeedResult<RefreshOutcome> {
        if targets.is_empty() {
            return Ok(RefreshOutcome::NothingToFetch);
        }

        let Some(_lock) = FetchLock::try_acquire(self.config.base_path())? else {
            log::info!("fetch already in progress");
            return Ok(RefreshOutcome::Busy);
        };

        let settings = self.settings();
        if matches!(reason, FetchReason::FirstFetch | FetchReason::IntervalElapsed) {
            let decision = self.policy.evaluate(
                settings.last_fetch(),
                Utc::now(),
                self.channels()?.len(),
                settings.per_channel_item_count,
                None,
            );
            if let Decision::Skip { remaining } = decision {
                log::info!("another fetch finished meanwhile, skipping");
                return Ok(RefreshOutcome::Skipped { remaining });
            }
        }

        let scope = reason.scope();

        let client = (self.connect)(&self.api_key(&settings))?;

        log::info!("fetching {} channels ({reason})", targets.len());
        let result = fetch_videos_and_update_channels(
            &client,
            &targets,
            settings.per_channel_item_count,
            &self.cancel,
        );

        let summary = self.commit(result, reason, scope, targets.len())?;
        log::info!(
            "fetched {} videos, {} cached, {} channels failed",
            summary.fetched,
            summary.total,
            summary.failures.len()
        );
        Ok(RefreshOutcome::Fetched(summary))
    }

    /// Folds a finished batch into whatever the store holds now, so edits
    /// made while the fetch was running survive.
    fn commit(
        &self,
        result: FetchResult,
        reason: FetchReason,
        scope: FetchScope,
        channel_count: usize,
    ) -> FeedResult<FetchSummary> {
        let now = Utc::now();
        let settings = self.settings();

        let mut channels = self.channels()?;
        let current_videos = self.videos()?;
        for fetched in &result.channels {
            if let Some(current) = channels
                .iter_mut()
                .find(|c| c.human_readable == fetched.human_readable)
            {
                current.absorb(fetched);
            }
        }

        let tracked: HashSet<&str> = channels.iter().map(|c| c.human_readable.as_str()).collect();
        let incoming: Vec<Video> = result
            .videos
            .into_iter()
            .filter(|video| tracked.contains(video.source_channel_key.as_str()))
            .collect();

        let merged = merge::merge(&current_videos, &incoming);
        let videos = merge::cull(&merged, settings.retention_months, now);

        self.save_channels(&channels)?;
        self.save_videos(&videos)?;

        if scope == FetchScope::Full && !result.cancelled {
            settings::write_last_fetch(self.store.as_ref(), now)?;
        }

        Ok(FetchSummary {
            reason,
            scope,
            channels: channel_count,
            fetched: incoming.len(),
            total: videos.len(),
            failures: result.failures,
            cancelled: result.cancelled,
        })
    }
}
