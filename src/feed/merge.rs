use std::collections::HashMap;

use chrono::{DateTime, Months, Utc};

use super::videos::Video;

/// Newest first. Stable, so equal timestamps keep their input order.
pub fn sort_by_recency(videos: &mut [Video]) {
    videos.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

/// Combines the cached feed with a fresh batch.
///
/// Entries are deduplicated by id; the first occurrence keeps its fields and
/// picks up a `true` watched flag from any later duplicate, never the other
/// way round. Merging the same batch twice is a no-op.
pub fn merge(previous: &[Video], incoming: &[Video]) -> Vec<Video> {
    let mut merged: Vec<Video> = Vec::with_capacity(previous.len() + incoming.len());
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(previous.len() + incoming.len());

    for video in previous.iter().chain(incoming.iter()) {
        match index.get(video.id.as_str()) {
            Some(&idx) => {
                if video.has_been_watched {
                    merged[idx].has_been_watched = true;
                }
            }
            None => {
                index.insert(video.id.as_str(), merged.len());
                merged.push(video.clone());
            }
        }
    }

    sort_by_recency(&mut merged);
    merged
}

/// Oldest publish time still inside the retention window.
pub fn retention_cutoff(retention_months: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(retention_months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Drops everything published before `now - retention_months` calendar months.
pub fn cull(videos: &[Video], retention_months: u32, now: DateTime<Utc>) -> Vec<Video> {
    let cutoff = retention_cutoff(retention_months, now);
    videos
        .iter()
        .filter(|video| video.published_at >= cutoff)
        .cloned()
        .collect()
}

pub fn remove_channel_videos(videos: &[Video], source_channel_key: &str) -> Vec<Video> {
    videos
        .iter()
        .filter(|video| video.source_channel_key != source_channel_key)
        .cloned()
        .collect()
}

/// Sets the watched flag of one video. Returns `false` if the id is unknown.
pub fn set_watched(videos: &mut [Video], id: &str, watched: bool) -> bool {
    match videos.iter_mut().find(|video| video.id == id) {
        Some(video) => {
            video.has_been_watched = watched;
            true
        }
        None => false,
    }
}

/// Flips the watched flag of one video and returns the new value.
pub fn toggle_watched(videos: &mut [Video], id: &str) -> Option<bool> {
    let video = videos.iter_mut().find(|video| video.id == id)?;
    video.has_been_watched = !video.has_been_watched;
    Some(video.has_been_watched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 10, 0, 0).unwrap()
    }

    fn video(id: &str, day: u32, watched: bool) -> Video {
        let mut v = Video::new(id, format!("title {id}"), at(day), "Chan", "UC1", 600);
        v.has_been_watched = watched;
        v.source_channel_key = "Foo".into();
        v
    }

    fn ids(videos: &[Video]) -> Vec<&str> {
        videos.iter().map(|v| v.id.as_str()).collect()
    }

    #[test]
    fn merge_dedupes_and_sorts() {
        let previous = vec![video("a", 1, false), video("b", 3, false)];
        let incoming = vec![video("c", 2, false), video("b", 3, false), video("d", 5, false)];

        let merged = merge(&previous, &incoming);
        assert_eq!(ids(&merged), vec!["d", "b", "c", "a"]);

        let unique: HashSet<_> = merged.iter().map(|v| v.id.clone()).collect();
        assert_eq!(unique.len(), merged.len());
    }

    #[test]
    fn merge_is_idempotent() {
        let a = vec![video("a", 1, true), video("b", 2, false)];
        let b = vec![video("b", 2, false), video("c", 4, false)];

        let once = merge(&a, &b);
        let twice = merge(&once, &b);
        assert_eq!(once, twice);
    }

    #[test]
    fn watched_flag_is_sticky() {
        let previous = vec![video("a", 1, true)];
        let incoming = vec![video("a", 1, false)];
        assert!(merge(&previous, &incoming)[0].has_been_watched);

        // a watched duplicate later in the batch upgrades the entry
        let previous = vec![video("a", 1, false)];
        let incoming = vec![video("a", 1, true)];
        assert!(merge(&previous, &incoming)[0].has_been_watched);
    }

    #[test]
    fn merge_keeps_first_occurrence_fields() {
        let previous = vec![video("a", 1, false)];
        let mut changed = video("a", 1, false);
        changed.title = "renamed".into();

        let merged = merge(&previous, &[changed]);
        assert_eq!(merged[0].title, "title a");
    }

    #[test]
    fn ties_keep_input_order() {
        let merged = merge(&[video("x", 2, false)], &[video("y", 2, false), video("z", 2, false)]);
        assert_eq!(ids(&merged), vec!["x", "y", "z"]);
    }

    #[test]
    fn cull_drops_entries_older_than_window() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let mut old = video("old", 1, false);
        old.published_at = Utc.with_ymd_and_hms(2024, 3, 14, 23, 59, 59).unwrap();
        let mut edge = video("edge", 1, false);
        edge.published_at = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        let mut fresh = video("fresh", 1, false);
        fresh.published_at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let videos = vec![fresh, edge, old];
        let culled = cull(&videos, 3, now);
        assert_eq!(ids(&culled), vec!["fresh", "edge"]);
        assert_eq!(cull(&culled, 3, now), culled);
    }

    #[test]
    fn remove_channel_videos_only_touches_that_channel() {
        let mut other = video("b", 2, true);
        other.source_channel_key = "Bar".into();
        let videos = vec![video("a", 1, false), other.clone(), video("c", 3, false)];

        let remaining = remove_channel_videos(&videos, "Foo");
        assert_eq!(remaining, vec![other]);
    }

    #[test]
    fn watched_toggle_and_set() {
        let mut videos = vec![video("a", 1, false)];
        assert_eq!(toggle_watched(&mut videos, "a"), Some(true));
        assert_eq!(toggle_watched(&mut videos, "a"), Some(false));
        assert_eq!(toggle_watched(&mut videos, "zzz"), None);

        assert!(set_watched(&mut videos, "a", true));
        assert!(videos[0].has_been_watched);
        assert!(!set_watched(&mut videos, "zzz", true));
    }
}
