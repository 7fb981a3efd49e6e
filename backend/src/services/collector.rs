use crate::channel_input::ChannelInput;
use crate::config::{AnalysisPolicy, SHORTS_MARKER};
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::models::{ApiChannel, ApiVideo, Channel, Video};
use crate::services::youtube_client::{ChannelLookup, YouTubeApi};
use crate::utils::{extract_keywords, format_duration, parse_iso8601_duration_to_seconds};
use chrono::{DateTime, Datelike, Timelike, Utc};
use log::{info, warn};
use serde::Serialize;
use serde_json::Value;

/// Channels considered when resolving a free-text name.
const CHANNEL_SEARCH_RESULTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    pub max_results: usize,
    pub include_shorts: bool,
    pub include_long_form: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProgressStage {
    Collecting,
    Analyzing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub current: usize,
    pub total: usize,
    pub stage: ProgressStage,
}

impl ProgressEvent {
    pub fn message(&self) -> String {
        let text = match self.stage {
            ProgressStage::Collecting => "Collecting video data...",
            ProgressStage::Analyzing => "Analyzing video data...",
        };
        format!("{text} ({}/{})", self.current, self.total)
    }
}

/// Receives an event after every playlist page and once after enrichment.
pub trait ProgressObserver {
    fn on_progress(&mut self, event: &ProgressEvent);
}

impl<F: FnMut(&ProgressEvent)> ProgressObserver for F {
    fn on_progress(&mut self, event: &ProgressEvent) {
        self(event)
    }
}

/// Resolve any parsed channel input to a full channel record.
pub async fn get_channel_info(
    api: &dyn YouTubeApi,
    input: &ChannelInput,
) -> AnalyzerResult<Channel> {
    info!("Resolving channel: {input:?}");

    let found = match input {
        ChannelInput::Id(id) => api.find_channel(&ChannelLookup::Id(id.clone())).await?,
        ChannelInput::Handle(handle) => {
            api.find_channel(&ChannelLookup::Handle(handle.clone()))
                .await?
        }
        ChannelInput::Username(name) => {
            match api
                .find_channel(&ChannelLookup::Username(name.clone()))
                .await?
            {
                Some(channel) => Some(channel),
                None => search_channel(api, name).await?,
            }
        }
        ChannelInput::Name(name) => search_channel(api, name).await?,
    };

    match found {
        Some(channel) => {
            let channel = Channel::from(channel);
            info!("Found channel: {} ({})", channel.title, channel.id);
            Ok(channel)
        }
        None => Err(AnalyzerError::ChannelNotFound(format!(
            "'{}'. Please check the channel name or URL.",
            input.identifier()
        ))),
    }
}

async fn search_channel(
    api: &dyn YouTubeApi,
    query: &str,
) -> AnalyzerResult<Option<ApiChannel>> {
    let ids = api.search_channels(query, CHANNEL_SEARCH_RESULTS).await?;
    match ids.first() {
        Some(id) => api.find_channel(&ChannelLookup::Id(id.clone())).await,
        None => Ok(None),
    }
}

/// Uploads playlist id of a channel; a channel without one has nothing to collect.
pub async fn get_channel_playlist_id(
    api: &dyn YouTubeApi,
    channel_id: &str,
) -> AnalyzerResult<String> {
    let uploads = api
        .find_channel(&ChannelLookup::Id(channel_id.to_string()))
        .await?
        .map(|channel| channel.content_details.related_playlists.uploads)
        .ok_or_else(|| AnalyzerError::ChannelNotFound(channel_id.to_string()))?;

    if uploads.trim().is_empty() {
        return Err(AnalyzerError::EmptyResult(format!(
            "channel {channel_id} has no uploads playlist"
        )));
    }
    Ok(uploads)
}

/// Collect up to `max_results` enriched videos of a channel.
pub async fn collect_videos(
    api: &dyn YouTubeApi,
    channel_id: &str,
    options: CollectOptions,
    policy: &AnalysisPolicy,
    observer: &mut (dyn ProgressObserver + Send),
    now: DateTime<Utc>,
) -> AnalyzerResult<Vec<Video>> {
    let playlist_id = get_channel_playlist_id(api, channel_id).await?;
    collect_playlist_videos(api, &playlist_id, options, policy, observer, now).await
}

/// Page through an uploads playlist, filter by kind and enrich.
pub async fn collect_playlist_videos(
    api: &dyn YouTubeApi,
    playlist_id: &str,
    options: CollectOptions,
    policy: &AnalysisPolicy,
    observer: &mut (dyn ProgressObserver + Send),
    now: DateTime<Utc>,
) -> AnalyzerResult<Vec<Video>> {
    info!(
        "Collecting up to {} videos from playlist {playlist_id} (shorts: {}, long-form: {})",
        options.max_results, options.include_shorts, options.include_long_form
    );

    let mut collected: Vec<ExtractedVideo> = Vec::new();
    let mut next_page_token: Option<String> = None;

    while collected.len() < options.max_results {
        let remaining = options.max_results - collected.len();
        let page = api
            .fetch_playlist_page(
                playlist_id,
                policy.page_size.min(remaining),
                next_page_token.as_deref(),
            )
            .await?;

        if page.video_ids.is_empty() {
            break;
        }

        let items = api.fetch_videos(&page.video_ids).await?;
        for item in items {
            let video = match extract_video(item, policy) {
                Ok(video) => video,
                Err(e) => {
                    warn!("Skipping video: {e}");
                    continue;
                }
            };

            if video.is_short && !options.include_shorts {
                continue;
            }
            if !video.is_short && !options.include_long_form {
                continue;
            }

            collected.push(video);
            if collected.len() >= options.max_results {
                break;
            }
        }

        observer.on_progress(&ProgressEvent {
            current: collected.len(),
            total: options.max_results,
            stage: ProgressStage::Collecting,
        });

        match page.next_page_token {
            Some(token) if collected.len() < options.max_results => {
                next_page_token = Some(token);
            }
            _ => break,
        }

        // Rate limiting
        tokio::time::sleep(policy.page_delay).await;
    }

    observer.on_progress(&ProgressEvent {
        current: collected.len(),
        total: collected.len(),
        stage: ProgressStage::Analyzing,
    });

    let videos: Vec<Video> = collected
        .into_iter()
        .map(|video| enrich_video(video, now))
        .collect();
    info!("Collected {} videos from playlist {playlist_id}", videos.len());
    Ok(videos)
}

/// Fields read straight off the wire, before the derived ones exist.
#[derive(Debug, Clone)]
struct ExtractedVideo {
    video_id: String,
    title: String,
    description: String,
    published_at: DateTime<Utc>,
    duration_seconds: u64,
    view_count: u64,
    like_count: u64,
    comment_count: u64,
    tags: Vec<String>,
    is_short: bool,
    thumbnail: String,
    channel_title: String,
}

fn parse_count(value: &Option<String>, field: &str, video_id: &str) -> Result<u64, String> {
    match value.as_deref() {
        None => Ok(0),
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|e| format!("video {video_id}: invalid {field} '{raw}': {e}")),
    }
}

pub fn is_short(
    duration_seconds: u64,
    title: &str,
    description: &str,
    policy: &AnalysisPolicy,
) -> bool {
    duration_seconds <= policy.shorts_max_duration_secs
        || title.to_lowercase().contains(SHORTS_MARKER)
        || description.to_lowercase().contains(SHORTS_MARKER)
}

pub fn engagement_rate(views: u64, likes: u64, comments: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    (likes + comments) as f64 / views as f64 * 100.0
}

fn extract_video(item: Value, policy: &AnalysisPolicy) -> Result<ExtractedVideo, String> {
    let unknown = item["id"].as_str().unwrap_or("unknown").to_string();
    let video: ApiVideo =
        serde_json::from_value(item).map_err(|e| format!("video {unknown}: {e}"))?;

    let published_at = DateTime::parse_from_rfc3339(&video.snippet.published_at)
        .map_err(|e| {
            format!(
                "video {}: invalid publishedAt '{}': {e}",
                video.id, video.snippet.published_at
            )
        })?
        .with_timezone(&Utc);

    let duration_seconds = parse_iso8601_duration_to_seconds(
        video.content_details.duration.as_deref().unwrap_or("PT0S"),
    );
    let view_count = parse_count(&video.statistics.view_count, "viewCount", &video.id)?;
    let like_count = parse_count(&video.statistics.like_count, "likeCount", &video.id)?;
    let comment_count = parse_count(&video.statistics.comment_count, "commentCount", &video.id)?;

    let snippet = video.snippet;
    Ok(ExtractedVideo {
        is_short: is_short(duration_seconds, &snippet.title, &snippet.description, policy),
        video_id: video.id,
        title: snippet.title,
        description: snippet.description,
        published_at,
        duration_seconds,
        view_count,
        like_count,
        comment_count,
        tags: snippet.tags,
        thumbnail: snippet.thumbnails.high.map(|t| t.url).unwrap_or_default(),
        channel_title: snippet.channel_title,
    })
}

fn enrich_video(video: ExtractedVideo, now: DateTime<Utc>) -> Video {
    let published_at = video.published_at;
    let days_since_upload = (now - published_at).num_days() + 1;
    let views_per_day = if days_since_upload > 0 {
        video.view_count as f64 / days_since_upload as f64
    } else {
        video.view_count as f64
    };

    Video {
        engagement_rate: engagement_rate(video.view_count, video.like_count, video.comment_count),
        duration_formatted: format_duration(video.duration_seconds),
        url: format!("https://www.youtube.com/watch?v={}", video.video_id),
        day_of_week: published_at.format("%A").to_string(),
        hour_of_day: published_at.hour(),
        month: published_at.month(),
        year: published_at.year(),
        date_str: published_at.format("%Y-%m-%d").to_string(),
        views_per_day,
        title_words: extract_keywords(&video.title),
        description_words: extract_keywords(&video.description),
        video_id: video.video_id,
        title: video.title,
        description: video.description,
        published_at,
        duration_seconds: video.duration_seconds,
        view_count: video.view_count,
        like_count: video.like_count,
        comment_count: video.comment_count,
        tags: video.tags,
        is_short: video.is_short,
        thumbnail: video.thumbnail,
        channel_title: video.channel_title,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::youtube_client::PlaylistPage;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    const CHANNEL_ID: &str = "UC_x5XG1OV2P6uZZ5FSM9Ttw";

    struct FakeApi {
        channel: Option<Value>,
        search_results: Vec<String>,
        playlist: Vec<(String, Value)>,
        requested_page_sizes: Mutex<Vec<usize>>,
        fail_with_quota: bool,
    }

    impl FakeApi {
        fn with_videos(playlist: Vec<Value>) -> Self {
            FakeApi {
                channel: Some(channel_json()),
                search_results: vec![CHANNEL_ID.to_string()],
                playlist: playlist
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let id = item["id"]
                            .as_str()
                            .map(String::from)
                            .unwrap_or(format!("bad{i}"));
                        (id, item)
                    })
                    .collect(),
                requested_page_sizes: Mutex::new(Vec::new()),
                fail_with_quota: false,
            }
        }
    }

    #[rocket::async_trait]
    impl YouTubeApi for FakeApi {
        async fn find_channel(
            &self,
            lookup: &ChannelLookup,
        ) -> AnalyzerResult<Option<ApiChannel>> {
            if let ChannelLookup::Username(_) = lookup {
                return Ok(None);
            }
            Ok(self
                .channel
                .clone()
                .map(|c| serde_json::from_value(c).unwrap()))
        }

        async fn search_channels(
            &self,
            _query: &str,
            max_results: usize,
        ) -> AnalyzerResult<Vec<String>> {
            assert_eq!(max_results, CHANNEL_SEARCH_RESULTS);
            Ok(self.search_results.clone())
        }

        async fn fetch_playlist_page(
            &self,
            _playlist_id: &str,
            page_size: usize,
            page_token: Option<&str>,
        ) -> AnalyzerResult<PlaylistPage> {
            if self.fail_with_quota {
                return Err(AnalyzerError::QuotaExceeded("daily limit".to_string()));
            }
            self.requested_page_sizes.lock().unwrap().push(page_size);
            let offset: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
            let end = (offset + page_size).min(self.playlist.len());
            Ok(PlaylistPage {
                video_ids: self.playlist[offset..end]
                    .iter()
                    .map(|(id, _)| id.clone())
                    .collect(),
                next_page_token: (end < self.playlist.len()).then(|| end.to_string()),
            })
        }

        async fn fetch_videos(&self, video_ids: &[String]) -> AnalyzerResult<Vec<Value>> {
            Ok(video_ids
                .iter()
                .filter_map(|id| {
                    self.playlist
                        .iter()
                        .find(|(candidate, _)| candidate == id)
                        .map(|(_, item)| item.clone())
                })
                .collect())
        }
    }

    fn channel_json() -> Value {
        json!({
            "id": CHANNEL_ID,
            "snippet": { "title": "Cats Daily", "description": "cats" },
            "statistics": { "subscriberCount": "1000", "videoCount": "3", "viewCount": "5000" },
            "contentDetails": { "relatedPlaylists": { "uploads": "UU_x5XG1OV2P6uZZ5FSM9Ttw" } }
        })
    }

    fn video_json(id: &str, title: &str, duration: &str, views: u64) -> Value {
        json!({
            "id": id,
            "snippet": {
                "publishedAt": "2024-03-04T15:30:00Z",
                "title": title,
                "description": "",
                "channelTitle": "Cats Daily",
                "tags": ["cat", "funny"]
            },
            "statistics": {
                "viewCount": views.to_string(),
                "likeCount": "10",
                "commentCount": "5"
            },
            "contentDetails": { "duration": duration }
        })
    }

    fn fast_policy() -> AnalysisPolicy {
        AnalysisPolicy {
            page_delay: Duration::ZERO,
            ..AnalysisPolicy::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 13, 12, 0, 0).unwrap()
    }

    fn options(max_results: usize) -> CollectOptions {
        CollectOptions {
            max_results,
            include_shorts: true,
            include_long_form: true,
        }
    }

    fn many_videos(count: usize) -> Vec<Value> {
        (0..count)
            .map(|i| {
                let views = 100 + i as u64;
                video_json(&format!("v{i}"), &format!("Video {i}"), "PT10M", views)
            })
            .collect()
    }

    async fn collect(
        api: &FakeApi,
        options: CollectOptions,
        policy: &AnalysisPolicy,
    ) -> AnalyzerResult<Vec<Video>> {
        let mut observer = |_: &ProgressEvent| {};
        collect_videos(api, CHANNEL_ID, options, policy, &mut observer, now()).await
    }

    fn ids(videos: &[Video]) -> Vec<&str> {
        videos.iter().map(|v| v.video_id.as_str()).collect()
    }

    #[tokio::test]
    async fn never_exceeds_max_results() {
        let api = FakeApi::with_videos(many_videos(130));
        let mut events = Vec::new();
        let mut observer = |e: &ProgressEvent| events.push(e.clone());

        let videos = collect_videos(
            &api,
            CHANNEL_ID,
            options(75),
            &fast_policy(),
            &mut observer,
            now(),
        )
        .await
        .unwrap();

        assert_eq!(videos.len(), 75);
        assert_eq!(*api.requested_page_sizes.lock().unwrap(), vec![50, 25]);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].stage, ProgressStage::Collecting);
        assert_eq!(events[0].current, 50);
        assert_eq!(events[2].stage, ProgressStage::Analyzing);
        assert_eq!(events[2].current, 75);
    }

    #[tokio::test]
    async fn returns_everything_available_below_the_bound() {
        let api = FakeApi::with_videos(many_videos(60));

        let videos = collect(&api, options(1_000), &fast_policy()).await.unwrap();

        assert_eq!(videos.len(), 60);
        assert_eq!(videos[0].video_id, "v0");
        assert_eq!(videos[59].video_id, "v59");
    }

    #[tokio::test(start_paused = true)]
    async fn waits_between_pages_only() {
        let api = FakeApi::with_videos(many_videos(130));
        let started = tokio::time::Instant::now();

        let videos = collect(&api, options(200), &AnalysisPolicy::default())
            .await
            .unwrap();

        assert_eq!(videos.len(), 130);
        assert_eq!(*api.requested_page_sizes.lock().unwrap(), vec![50, 50, 50]);
        // Three pages, two pauses, none after the last page
        assert_eq!(started.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test]
    async fn skips_records_that_fail_to_parse() {
        let mut playlist = many_videos(3);
        playlist.insert(1, json!({ "id": "broken", "snippet": { "title": "no date" } }));
        playlist.insert(2, {
            let mut v = video_json("badcount", "Bad count", "PT5M", 1);
            v["statistics"]["viewCount"] = json!("lots");
            v
        });
        let api = FakeApi::with_videos(playlist);

        let videos = collect(&api, options(10), &fast_policy()).await.unwrap();

        assert_eq!(ids(&videos), vec!["v0", "v1", "v2"]);
    }

    #[tokio::test]
    async fn filters_by_kind() {
        let api = FakeApi::with_videos(vec![
            video_json("short", "Funny Cat #Shorts", "PT1M30S", 100),
            video_json("tiny", "Quick one", "PT45S", 100),
            video_json("long", "Full episode", "PT20M", 100),
        ]);

        let shorts_only = CollectOptions {
            include_long_form: false,
            ..options(10)
        };
        let videos = collect(&api, shorts_only, &fast_policy()).await.unwrap();
        assert_eq!(ids(&videos), vec!["short", "tiny"]);

        let long_only = CollectOptions {
            include_shorts: false,
            ..options(10)
        };
        let videos = collect(&api, long_only, &fast_policy()).await.unwrap();
        assert_eq!(ids(&videos), vec!["long"]);
    }

    #[tokio::test]
    async fn enriches_derived_fields() {
        let api = FakeApi::with_videos(vec![video_json(
            "v",
            "The best CAT video",
            "PT1M5S",
            150,
        )]);

        let videos = collect(&api, options(5), &fast_policy()).await.unwrap();
        let video = &videos[0];

        assert_eq!(video.duration_seconds, 65);
        assert_eq!(video.duration_formatted, "1m 5s");
        assert!(!video.is_short);
        assert_eq!(video.engagement_rate, 10.0);
        assert_eq!(video.day_of_week, "Monday");
        assert_eq!(video.hour_of_day, 15);
        assert_eq!(video.month, 3);
        assert_eq!(video.year, 2024);
        assert_eq!(video.date_str, "2024-03-04");
        // 8 full days elapsed, plus the upload day
        assert_eq!(video.views_per_day, 150.0 / 9.0);
        assert_eq!(video.title_words, vec!["best", "cat", "video"]);
        assert_eq!(video.url, "https://www.youtube.com/watch?v=v");
        assert_eq!(video.tags, vec!["cat", "funny"]);
    }

    #[tokio::test]
    async fn quota_errors_abort_the_run() {
        let mut api = FakeApi::with_videos(many_videos(3));
        api.fail_with_quota = true;

        let result = collect(&api, options(10), &fast_policy()).await;
        assert!(matches!(result, Err(AnalyzerError::QuotaExceeded(_))));
    }

    #[tokio::test]
    async fn unknown_channel_is_an_error() {
        let mut api = FakeApi::with_videos(Vec::new());
        api.channel = None;

        let result = collect(&api, options(10), &fast_policy()).await;
        assert!(matches!(result, Err(AnalyzerError::ChannelNotFound(_))));

        let result = get_channel_info(&api, &ChannelInput::Handle("@missing".to_string())).await;
        assert!(matches!(result, Err(AnalyzerError::ChannelNotFound(_))));
    }

    #[tokio::test]
    async fn channel_without_uploads_playlist_is_empty() {
        let mut api = FakeApi::with_videos(many_videos(3));
        let mut channel = channel_json();
        channel["contentDetails"]["relatedPlaylists"]["uploads"] = json!("");
        api.channel = Some(channel);

        let result = collect(&api, options(10), &fast_policy()).await;
        assert!(matches!(result, Err(AnalyzerError::EmptyResult(_))));
        assert!(api.requested_page_sizes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn resolves_names_through_search() {
        let api = FakeApi::with_videos(Vec::new());

        let channel = get_channel_info(&api, &ChannelInput::Name("cats daily".to_string()))
            .await
            .unwrap();
        assert_eq!(channel.title, "Cats Daily");
        assert_eq!(channel.uploads_playlist_id, "UU_x5XG1OV2P6uZZ5FSM9Ttw");

        // Username lookups fall back to search when the legacy name is unknown
        let channel = get_channel_info(&api, &ChannelInput::Username("catsdaily".to_string()))
            .await
            .unwrap();
        assert_eq!(channel.id, CHANNEL_ID);
    }

    #[test]
    fn shorts_marker_overrides_duration() {
        let policy = AnalysisPolicy::default();
        assert!(is_short(90, "Funny Cat #Shorts", "", &policy));
        assert!(is_short(90, "Funny Cat", "watch more #SHORTS", &policy));
        assert!(is_short(60, "Exactly a minute", "", &policy));
        assert!(!is_short(61, "Just over", "", &policy));
    }

    #[test]
    fn engagement_rate_handles_zero_views() {
        assert_eq!(engagement_rate(0, 10, 10), 0.0);
        assert_eq!(engagement_rate(200, 15, 5), 10.0);
    }

    #[test]
    fn progress_messages() {
        let event = ProgressEvent {
            current: 3,
            total: 10,
            stage: ProgressStage::Collecting,
        };
        assert_eq!(event.message(), "Collecting video data... (3/10)");
    }
}
