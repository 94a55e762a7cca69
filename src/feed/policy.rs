use std::fmt::Display;

use chrono::{DateTime, Duration, Utc};

/// Minutes of cool-down per unit of tracking volume.
const MINUTES_PER_VOLUME_UNIT: i64 = 10;
/// Items per channel that add one unit of volume.
const ITEMS_PER_VOLUME_UNIT: u32 = 10;

/// Why the shared timer may be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bypass {
    /// The user just added a single channel.
    NewChannel,
    /// Explicit `--force` refresh.
    Forced,
    /// Some channels have never been resolved.
    UnresolvedChannels,
    /// Channels arrived through a shared link.
    SharedList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchReason {
    FirstFetch,
    IntervalElapsed,
    Bypass(Bypass),
}

impl Display for FetchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchReason::FirstFetch => write!(f, "no previous fetch"),
            FetchReason::IntervalElapsed => write!(f, "refetch interval elapsed"),
            FetchReason::Bypass(Bypass::NewChannel) => write!(f, "new channel"),
            FetchReason::Bypass(Bypass::Forced) => write!(f, "forced"),
            FetchReason::Bypass(Bypass::UnresolvedChannels) => write!(f, "unresolved channels"),
            FetchReason::Bypass(Bypass::SharedList) => write!(f, "shared channel list"),
        }
    }
}

impl FetchReason {
    pub fn scope(&self) -> FetchScope {
        match self {
            FetchReason::FirstFetch
            | FetchReason::IntervalElapsed
            | FetchReason::Bypass(Bypass::Forced) => FetchScope::Full,
            FetchReason::Bypass(_) => FetchScope::Partial,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchScope {
    /// Every tracked channel; success advances `lastFetchTimestamp`.
    Full,
    /// A subset of channels; the shared timestamp stays put.
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    FetchNow { reason: FetchReason },
    Skip { remaining: Duration },
}

impl Decision {
    pub fn should_fetch(&self) -> bool {
        matches!(self, Decision::FetchNow { .. })
    }
}

/// Throttles remote fetches by how much a full refresh costs: one unit per
/// tracked channel plus one per ten items requested per channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefetchPolicy;

impl RefetchPolicy {
    pub fn volume_scalar(channel_count: usize, per_channel_count: u32) -> i64 {
        i64::from(per_channel_count / ITEMS_PER_VOLUME_UNIT) + channel_count as i64
    }

    pub fn min_interval(channel_count: usize, per_channel_count: u32) -> Duration {
        Duration::minutes(Self::volume_scalar(channel_count, per_channel_count) * MINUTES_PER_VOLUME_UNIT)
    }

    pub fn evaluate(
        &self,
        last_fetch: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        channel_count: usize,
        per_channel_count: u32,
        bypass: Option<Bypass>,
    ) -> Decision {
        if let Some(bypass) = bypass {
            return Decision::FetchNow {
                reason: FetchReason::Bypass(bypass),
            };
        }

        let Some(last_fetch) = last_fetch else {
            return Decision::FetchNow {
                reason: FetchReason::FirstFetch,
            };
        };

        let interval = Self::min_interval(channel_count, per_channel_count);
        let elapsed = now - last_fetch;
        if elapsed >= interval {
            Decision::FetchNow {
                reason: FetchReason::IntervalElapsed,
            }
        } else {
            Decision::Skip {
                remaining: interval - elapsed,
            }
        }
    }

    /// Earliest time a full refresh becomes eligible again.
    pub fn next_eligible(
        &self,
        last_fetch: Option<DateTime<Utc>>,
        channel_count: usize,
        per_channel_count: u32,
    ) -> Option<DateTime<Utc>> {
        last_fetch.map(|last| last + Self::min_interval(channel_count, per_channel_count))
    }
}
