use crate::error::{AnalyzerError, AnalyzerResult};
use crate::models::ApiChannel;
use log::{debug, error};
use reqwest::Client;
use serde_json::Value;

const CHANNEL_PARTS: &str = "snippet,statistics,contentDetails";
const VIDEO_PARTS: &str = "snippet,statistics,contentDetails,status";

const QUOTA_REASONS: &[&str] = &[
    "quotaExceeded",
    "dailyLimitExceeded",
    "rateLimitExceeded",
    "userRateLimitExceeded",
];
const CREDENTIAL_REASONS: &[&str] = &["keyInvalid", "keyExpired", "accessNotConfigured"];

/// How a channel is looked up on the `channels` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelLookup {
    Id(String),
    Handle(String),
    Username(String),
}

/// One page of an uploads playlist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaylistPage {
    pub video_ids: Vec<String>,
    pub next_page_token: Option<String>,
}

/// The four Data API calls an analysis needs.
#[rocket::async_trait]
pub trait YouTubeApi: Send + Sync {
    async fn find_channel(&self, lookup: &ChannelLookup) -> AnalyzerResult<Option<ApiChannel>>;

    /// Channel ids matching a free-text query, best match first.
    async fn search_channels(&self, query: &str, max_results: usize) -> AnalyzerResult<Vec<String>>;

    async fn fetch_playlist_page(
        &self,
        playlist_id: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> AnalyzerResult<PlaylistPage>;

    /// Raw `videos` items; decoding happens per record so one bad item
    /// does not sink the page.
    async fn fetch_videos(&self, video_ids: &[String]) -> AnalyzerResult<Vec<Value>>;
}

pub struct YouTubeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: String, base_url: &str) -> AnalyzerResult<Self> {
        if api_key.trim().is_empty() {
            return Err(AnalyzerError::InvalidCredential(
                "no YouTube Data API key supplied".to_string(),
            ));
        }

        Ok(YouTubeClient {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> AnalyzerResult<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("GET {url} {params:?}");

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_api_error(status.as_u16(), &body);
            error!("YouTube API call to {endpoint} failed: {err}");
            return Err(err);
        }

        Ok(response.json::<Value>().await?)
    }
}

#[rocket::async_trait]
impl YouTubeApi for YouTubeClient {
    async fn find_channel(&self, lookup: &ChannelLookup) -> AnalyzerResult<Option<ApiChannel>> {
        let (field, value) = match lookup {
            ChannelLookup::Id(id) => ("id", id.as_str()),
            ChannelLookup::Handle(handle) => ("forHandle", handle.as_str()),
            ChannelLookup::Username(name) => ("forUsername", name.as_str()),
        };

        let response = self
            .get("channels", &[("part", CHANNEL_PARTS), (field, value)])
            .await?;

        match response["items"].as_array().and_then(|items| items.first()) {
            Some(item) => serde_json::from_value::<ApiChannel>(item.clone())
                .map(Some)
                .map_err(|e| invalid_response(format!("channel: {e}"))),
            None => Ok(None),
        }
    }

    async fn search_channels(
        &self,
        query: &str,
        max_results: usize,
    ) -> AnalyzerResult<Vec<String>> {
        let max_results = max_results.to_string();
        let response = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "channel"),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;

        Ok(response["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item["snippet"]["channelId"].as_str())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_playlist_page(
        &self,
        playlist_id: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> AnalyzerResult<PlaylistPage> {
        // https://developers.google.com/youtube/v3/docs/playlistItems
        let page_size = page_size.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", page_size.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response = self.get("playlistItems", &params).await?;
        Ok(parse_playlist_page(&response))
    }

    async fn fetch_videos(&self, video_ids: &[String]) -> AnalyzerResult<Vec<Value>> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = video_ids.join(",");
        let response = self
            .get("videos", &[("part", VIDEO_PARTS), ("id", ids.as_str())])
            .await?;

        Ok(response["items"].as_array().cloned().unwrap_or_default())
    }
}

pub fn parse_playlist_page(response: &Value) -> PlaylistPage {
    let video_ids = response["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["snippet"]["resourceId"]["videoId"].as_str())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    PlaylistPage {
        video_ids,
        next_page_token: response["nextPageToken"].as_str().map(String::from),
    }
}

fn invalid_response(message: String) -> AnalyzerError {
    AnalyzerError::Api {
        status: 200,
        message: format!("Invalid API response: {message}"),
    }
}

/// Map an error body of the Data API onto the taxonomy.
pub fn classify_api_error(status: u16, body: &str) -> AnalyzerError {
    let parsed: Value = serde_json::from_str(body).unwrap_or_default();
    let message = parsed["error"]["message"]
        .as_str()
        .map(String::from)
        .unwrap_or_else(|| body.trim().to_string());
    let reason = parsed["error"]["errors"][0]["reason"]
        .as_str()
        .unwrap_or_default();

    if QUOTA_REASONS.contains(&reason) {
        return AnalyzerError::QuotaExceeded(message);
    }
    if CREDENTIAL_REASONS.contains(&reason) || message.contains("API key") {
        return AnalyzerError::InvalidCredential(message);
    }

    match status {
        401 => AnalyzerError::InvalidCredential(message),
        403 => AnalyzerError::InvalidCredential(format!(
            "API key is invalid or quota exceeded. \
             Please check your API key and quota limits. ({message})"
        )),
        404 => AnalyzerError::ChannelNotFound(message),
        429 => AnalyzerError::QuotaExceeded(message),
        _ => AnalyzerError::Api { status, message },
    }
}
