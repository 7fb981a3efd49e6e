use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A fully enriched video. Built once by the collector, read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub duration_seconds: u64,
    pub duration_formatted: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub tags: Vec<String>,
    pub is_short: bool,
    pub thumbnail: String,
    pub channel_title: String,
    pub url: String,
    pub engagement_rate: f64,
    pub day_of_week: String,
    pub hour_of_day: u32,
    pub month: u32,
    pub year: i32,
    pub date_str: String,
    pub views_per_day: f64,
    pub title_words: Vec<String>,
    pub description_words: Vec<String>,
}

/// Display name of a video kind, shared by exports and grouped statistics.
pub fn kind_label(is_short: bool) -> &'static str {
    if is_short {
        "Shorts"
    } else {
        "Long-form"
    }
}

impl Video {
    pub fn kind_label(&self) -> &'static str {
        kind_label(self.is_short)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Channel {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub thumbnail: String,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub view_count: u64,
    pub uploads_playlist_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VideoKind {
    #[default]
    All,
    Shorts,
    LongForm,
}

impl VideoKind {
    pub fn matches(&self, video: &Video) -> bool {
        match self {
            VideoKind::All => true,
            VideoKind::Shorts => video.is_short,
            VideoKind::LongForm => !video.is_short,
        }
    }
}

impl FromStr for VideoKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(VideoKind::All),
            "shorts" | "short" => Ok(VideoKind::Shorts),
            "long-form" | "long_form" | "longform" | "long" => Ok(VideoKind::LongForm),
            other => Err(format!("unknown video kind '{other}'")),
        }
    }
}

/// Body of `POST /api/analysis`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub channel: String,
    pub api_key: Option<String>,
    pub max_results: Option<usize>,
    pub include_shorts: Option<bool>,
    pub include_long_form: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

// Data API v3 wire types. Documentation:
// https://developers.google.com/youtube/v3/docs/videos
// https://developers.google.com/youtube/v3/docs/channels

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVideo {
    pub id: String,
    pub snippet: ApiVideoSnippet,
    #[serde(default)]
    pub statistics: ApiStatistics,
    #[serde(default)]
    pub content_details: ApiVideoContentDetails,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVideoSnippet {
    pub published_at: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub thumbnails: ApiThumbnails,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ApiThumbnails {
    pub high: Option<ApiThumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiThumbnail {
    pub url: String,
}

/// Counts arrive as decimal strings and are omitted when hidden.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
    pub comment_count: Option<String>,
    pub subscriber_count: Option<String>,
    pub video_count: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ApiVideoContentDetails {
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiChannel {
    pub id: String,
    pub snippet: ApiChannelSnippet,
    #[serde(default)]
    pub statistics: ApiStatistics,
    pub content_details: ApiChannelContentDetails,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiChannelSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub thumbnails: ApiThumbnails,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiChannelContentDetails {
    pub related_playlists: ApiRelatedPlaylists,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRelatedPlaylists {
    pub uploads: String,
}

impl From<ApiChannel> for Channel {
    fn from(channel: ApiChannel) -> Self {
        let count = |value: &Option<String>| {
            value
                .as_deref()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0)
        };

        Channel {
            subscriber_count: count(&channel.statistics.subscriber_count),
            video_count: count(&channel.statistics.video_count),
            view_count: count(&channel.statistics.view_count),
            id: channel.id,
            title: channel.snippet.title,
            description: channel.snippet.description,
            published_at: channel.snippet.published_at,
            thumbnail: channel
                .snippet
                .thumbnails
                .high
                .map(|t| t.url)
                .unwrap_or_default(),
            uploads_playlist_id: channel.content_details.related_playlists.uploads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_labels() {
        let mut clip = fixtures::video("a", "2024-03-04T15:00:00Z", "Cat nap", 30, 10, 1, 0);
        clip.is_short = true;
        assert_eq!(clip.kind_label(), "Shorts");
        clip.is_short = false;
        assert_eq!(clip.kind_label(), "Long-form");
        assert_eq!(kind_label(true), "Shorts");
    }

    #[test]
    fn channel_from_wire_format() {
        let raw = json!({
            "id": "UC_x5XG1OV2P6uZZ5FSM9Ttw",
            "snippet": {
                "title": "Google for Developers",
                "description": "Talks",
                "publishedAt": "2007-08-23T00:34:43Z",
                "thumbnails": { "high": { "url": "https://yt3.example/high.jpg" } }
            },
            "statistics": {
                "viewCount": "123456",
                "subscriberCount": "2000",
                "hiddenSubscriberCount": false,
                "videoCount": "42"
            },
            "contentDetails": {
                "relatedPlaylists": { "likes": "", "uploads": "UU_x5XG1OV2P6uZZ5FSM9Ttw" }
            }
        });

        let channel: Channel = serde_json::from_value::<ApiChannel>(raw).unwrap().into();
        assert_eq!(channel.title, "Google for Developers");
        assert_eq!(channel.subscriber_count, 2_000);
        assert_eq!(channel.video_count, 42);
        assert_eq!(channel.view_count, 123_456);
        assert_eq!(channel.uploads_playlist_id, "UU_x5XG1OV2P6uZZ5FSM9Ttw");
        assert_eq!(channel.thumbnail, "https://yt3.example/high.jpg");
    }

    #[test]
    fn video_kind_from_query_values() {
        assert_eq!("Shorts".parse::<VideoKind>(), Ok(VideoKind::Shorts));
        assert_eq!("long-form".parse::<VideoKind>(), Ok(VideoKind::LongForm));
        assert_eq!("all".parse::<VideoKind>(), Ok(VideoKind::All));
        assert!("reels".parse::<VideoKind>().is_err());
    }
}
