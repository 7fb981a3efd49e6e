use crate::error::{AnalyzerError, AnalyzerResult};
use crate::models::{Channel, Video};
use crate::services::analyzer::SummaryReport;
use crate::utils::to_iso8601_duration;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Separator between list items inside a single CSV column.
const TAG_SEPARATOR: &str = "|";

/// Flat CSV view of a [`Video`]: every record field in order, list fields
/// joined with [`TAG_SEPARATOR`].
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    video_id: &'a str,
    title: &'a str,
    description: &'a str,
    published_at: String,
    duration_seconds: u64,
    duration_formatted: &'a str,
    duration_iso: String,
    view_count: u64,
    like_count: u64,
    comment_count: u64,
    tags: String,
    is_short: bool,
    video_type: &'static str,
    thumbnail: &'a str,
    channel_title: &'a str,
    url: &'a str,
    engagement_rate: f64,
    day_of_week: &'a str,
    hour_of_day: u32,
    month: u32,
    year: i32,
    date_str: &'a str,
    views_per_day: f64,
    title_words: String,
    description_words: String,
}

impl<'a> From<&'a Video> for CsvRow<'a> {
    fn from(video: &'a Video) -> Self {
        CsvRow {
            video_id: &video.video_id,
            title: &video.title,
            description: &video.description,
            published_at: video.published_at.to_rfc3339(),
            duration_seconds: video.duration_seconds,
            duration_formatted: &video.duration_formatted,
            duration_iso: to_iso8601_duration(video.duration_seconds),
            view_count: video.view_count,
            like_count: video.like_count,
            comment_count: video.comment_count,
            tags: video.tags.join(TAG_SEPARATOR),
            is_short: video.is_short,
            video_type: video.kind_label(),
            thumbnail: &video.thumbnail,
            channel_title: &video.channel_title,
            url: &video.url,
            engagement_rate: video.engagement_rate,
            day_of_week: &video.day_of_week,
            hour_of_day: video.hour_of_day,
            month: video.month,
            year: video.year,
            date_str: &video.date_str,
            views_per_day: video.views_per_day,
            title_words: video.title_words.join(TAG_SEPARATOR),
            description_words: video.description_words.join(TAG_SEPARATOR),
        }
    }
}

pub fn export_csv(videos: &[Video]) -> AnalyzerResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for video in videos {
        writer.serialize(CsvRow::from(video))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AnalyzerError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AnalyzerError::Export(e.to_string()))
}

#[derive(Serialize)]
struct JsonExport<'a> {
    channel_info: &'a Channel,
    videos: &'a [Video],
}

pub fn export_json(channel: &Channel, videos: &[Video]) -> AnalyzerResult<String> {
    Ok(serde_json::to_string_pretty(&JsonExport {
        channel_info: channel,
        videos,
    })?)
}

/// One `Section - Key: value` line per summary entry.
pub fn export_summary(report: &SummaryReport) -> String {
    report
        .sections
        .iter()
        .flat_map(|section| {
            section
                .entries
                .iter()
                .map(move |entry| {
                    format!("{} - {}: {}\n", section.title, entry.key, entry.value)
                })
        })
        .collect()
}

/// `<channel>_<kind>_<YYYYmmdd_HHMMSS>.<extension>` with the channel title
/// reduced to filename-safe characters.
pub fn export_file_name(
    channel: &Channel,
    kind: &str,
    extension: &str,
    now: DateTime<Utc>,
) -> String {
    let safe: String = channel
        .title
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    let safe = safe.trim_matches('_');
    let safe = if safe.is_empty() { "channel" } else { safe };
    format!("{safe}_{kind}_{}.{extension}", now.format("%Y%m%d_%H%M%S"))
}
