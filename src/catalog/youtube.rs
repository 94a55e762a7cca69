use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize};

use crate::app::errors::{FeedError, FeedResult};

use super::{CatalogClient, PlaylistEntry, PlaylistPage};

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// YouTube Data API v3 client. The API key is sent with every call.
pub struct YouTubeClient {
    base_url: String,
    api_key: String,
    http: reqwest::blocking::Client,
}

impl YouTubeClient {
    /// Builds the HTTP client. Failing here aborts the whole fetch cycle.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> FeedResult<Self> {
        if api_key.trim().is_empty() {
            return Err(FeedError::validation(
                "apiKey",
                "no API key configured; run `multiyt settings set api-key <KEY>`",
            ));
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("multiyt/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| FeedError::network(format!("failed to initialize http client: {err}")))?;

        Ok(YouTubeClient {
            base_url: base_url.strip_suffix('/').unwrap_or(base_url).to_string(),
            api_key: api_key.trim().to_string(),
            http,
        })
    }

    fn get<T>(&self, resource: &str, params: &[(&str, &str)]) -> FeedResult<T>
    where
        T: DeserializeOwned,
    {
        log::debug!("GET {}/{resource} {params:?}", self.base_url);
        let url = format!("{}/{resource}", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FeedError::not_found(format!("{resource}: {params:?}")));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FeedError::network(format!(
                "{resource} returned {status}: {}",
                api_error_message(&body).unwrap_or(body)
            )));
        }

        Ok(response.json::<T>()?)
    }
}

#[derive(Deserialize, Debug)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ChannelIdItem {
    id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ChannelDetailsItem {
    content_details: Option<ChannelContentDetails>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: Option<RelatedPlaylists>,
}

#[derive(Deserialize, Debug)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    snippet: Option<PlaylistSnippet>,
    content_details: Option<PlaylistItemContentDetails>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PlaylistSnippet {
    title: Option<String>,
    published_at: Option<String>,
    channel_title: Option<String>,
    channel_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemContentDetails {
    video_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    content_details: Option<VideoContentDetails>,
}

#[derive(Deserialize, Debug)]
struct VideoContentDetails {
    duration: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    message: Option<String>,
}

fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
}

fn into_page(response: ListResponse<PlaylistItem>) -> PlaylistPage {
    let items = response
        .items
        .into_iter()
        .map(|item| {
            let snippet = item.snippet;
            let (title, published_at, channel_title, channel_id) = match snippet {
                Some(s) => (s.title, s.published_at, s.channel_title, s.channel_id),
                None => (None, None, None, None),
            };
            PlaylistEntry {
                video_id: item.content_details.and_then(|details| details.video_id),
                title,
                published_at,
                channel_title,
                channel_id,
            }
        })
        .collect();

    PlaylistPage {
        items,
        next_page_token: response.next_page_token.filter(|token| !token.is_empty()),
    }
}

impl CatalogClient for YouTubeClient {
    fn channel_id_for_handle(&self, handle: &str) -> FeedResult<String> {
        let response: ListResponse<ChannelIdItem> =
            self.get("channels", &[("part", "id"), ("forHandle", handle)])?;

        response
            .items
            .into_iter()
            .find_map(|item| item.id)
            .ok_or_else(|| FeedError::not_found(format!("channel not found for handle: {handle}")))
    }

    fn uploads_playlist_id(&self, channel_id: &str) -> FeedResult<String> {
        let response: ListResponse<ChannelDetailsItem> =
            self.get("channels", &[("part", "contentDetails"), ("id", channel_id)])?;

        let channel = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| FeedError::not_found(format!("channel not found for id: {channel_id}")))?;

        channel
            .content_details
            .and_then(|details| details.related_playlists)
            .and_then(|playlists| playlists.uploads)
            .filter(|uploads| !uploads.is_empty())
            .ok_or_else(|| {
                FeedError::not_found(format!("uploads playlist not found for channel: {channel_id}"))
            })
    }

    fn playlist_items(
        &self,
        playlist_id: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> FeedResult<PlaylistPage> {
        let max_results = max_results.to_string();
        let mut params = vec![
            ("part", "snippet,contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response: ListResponse<PlaylistItem> = self.get("playlistItems", &params)?;
        Ok(into_page(response))
    }

    fn video_duration(&self, video_id: &str) -> FeedResult<Option<String>> {
        let response: ListResponse<VideoItem> =
            self.get("videos", &[("part", "contentDetails"), ("id", video_id)])?;

        Ok(response
            .items
            .into_iter()
            .next()
            .and_then(|item| item.content_details)
            .and_then(|details| details.duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_requires_api_key() {
        let result = YouTubeClient::new(DEFAULT_API_BASE_URL, "  ", Duration::from_secs(5));
        assert!(matches!(result, Err(FeedError::Validation { .. })));
    }

    #[test]
    fn playlist_response_maps_to_entries() {
        let body = r#"{
            "nextPageToken": "CAUQAA",
            "items": [
                {
                    "snippet": {
                        "title": "First",
                        "publishedAt": "2024-05-01T12:00:00Z",
                        "channelTitle": "Foo Channel",
                        "channelId": "UC123"
                    },
                    "contentDetails": { "videoId": "vid1" }
                },
                { "contentDetails": { "videoId": "vid2" } }
            ]
        }"#;

        let response: ListResponse<PlaylistItem> = serde_json::from_str(body).unwrap();
        let page = into_page(response);

        assert_eq!(page.next_page_token.as_deref(), Some("CAUQAA"));
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].video_id.as_deref(), Some("vid1"));
        assert_eq!(page.items[0].channel_title.as_deref(), Some("Foo Channel"));
        assert_eq!(page.items[1].title, None);
    }

    #[test]
    fn empty_page_token_ends_pagination() {
        let response: ListResponse<PlaylistItem> =
            serde_json::from_str(r#"{"nextPageToken": ""}"#).unwrap();
        let page = into_page(response);
        assert!(page.items.is_empty());
        assert_eq!(page.next_page_token, None);
    }

    #[test]
    fn api_error_message_is_extracted() {
        let body = r#"{"error":{"code":403,"message":"quota exceeded"}}"#;
        assert_eq!(api_error_message(body).as_deref(), Some("quota exceeded"));
        assert_eq!(api_error_message("<html>"), None);
    }
}
