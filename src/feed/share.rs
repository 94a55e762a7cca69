use url::Url;

use crate::app::errors::{FeedError, FeedResult};

use super::channels::Channel;

pub const SHARE_QUERY_PARAM: &str = "channels";
const SHARE_DELIMITER: char = ',';

/// Builds a link carrying the tracked handles in the `channels` parameter.
pub fn encode_share_link(base_url: &str, channels: &[Channel]) -> FeedResult<String> {
    let mut url = Url::parse(base_url)
        .map_err(|err| FeedError::validation("share_base_url", err.to_string()))?;

    let joined = channels
        .iter()
        .map(|channel| channel.human_readable.as_str())
        .collect::<Vec<_>>()
        .join(&SHARE_DELIMITER.to_string());

    url.query_pairs_mut()
        .clear()
        .append_pair(SHARE_QUERY_PARAM, &joined);

    Ok(url.to_string())
}

/// Accepts a share link or a bare comma separated list of handles.
pub fn decode_channel_list(input: &str) -> Vec<String> {
    let input = input.trim();

    let raw = match Url::parse(input) {
        Ok(url) if url.has_host() => url
            .query_pairs()
            .find(|(key, _)| key == SHARE_QUERY_PARAM)
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default(),
        _ => input.to_string(),
    };

    raw.split(SHARE_DELIMITER)
        .map(|handle| handle.trim())
        .filter(|handle| !handle.is_empty())
        .map(|handle| handle.to_string())
        .collect()
}

/// Case-sensitive union of the persisted list with a shared one, sorted.
/// Also returns the handles that weren't tracked before.
pub fn union_channels(persisted: &[Channel], shared: &[String]) -> (Vec<Channel>, Vec<String>) {
    let mut merged = persisted.to_vec();
    let mut added = Vec::new();

    for handle in shared {
        if super::channels::insert_channel(&mut merged, Channel::new(handle.clone())) {
            added.push(handle.clone());
        }
    }

    super::channels::sort_channels(&mut merged);
    added.sort();
    (merged, added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_link_roundtrip_keeps_handles() {
        let channels = vec![Channel::new("Foo"), Channel::new("scott manley")];
        let link = encode_share_link("https://example.com/multiyt/", &channels).unwrap();

        assert!(link.starts_with("https://example.com/multiyt/?channels="));
        assert_eq!(decode_channel_list(&link), vec!["Foo", "scott manley"]);
    }

    #[test]
    fn bare_lists_are_accepted() {
        assert_eq!(decode_channel_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(decode_channel_list("").is_empty());
    }

    #[test]
    fn link_without_parameter_yields_nothing() {
        assert!(decode_channel_list("https://example.com/?other=1").is_empty());
    }

    #[test]
    fn union_is_case_sensitive_and_sorted() {
        let persisted = vec![Channel::new("Foo"), Channel::new("zed")];
        let shared = vec!["foo".to_string(), "Foo".to_string(), "Bar".to_string()];

        let (merged, added) = union_channels(&persisted, &shared);
        let keys: Vec<_> = merged.iter().map(|c| c.human_readable.as_str()).collect();
        assert_eq!(keys, vec!["Bar", "Foo", "foo", "zed"]);
        assert_eq!(added, vec!["Bar", "foo"]);
    }
}
