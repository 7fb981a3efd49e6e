//! Read-only statistics over an enriched video list.
//!
//! Nothing here mutates a [`Video`]; every function borrows the slice the
//! collector produced for one analysis run.

use crate::config::AnalysisPolicy;
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::models::{kind_label, Channel, Video, VideoKind};
use crate::utils::{
    compare_desc, format_float_number, format_number, mean, median, mode, quantile, round2,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
/// Keywords reported by the successful-pattern analysis.
const SUCCESS_TOP_KEYWORDS: usize = 10;
const SUCCESS_BEST_TIMES: usize = 5;
const SUMMARY_TITLE_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoMetric {
    #[default]
    ViewCount,
    LikeCount,
    CommentCount,
    EngagementRate,
    ViewsPerDay,
    DurationSeconds,
}

impl VideoMetric {
    pub fn value(&self, video: &Video) -> f64 {
        match self {
            VideoMetric::ViewCount => video.view_count as f64,
            VideoMetric::LikeCount => video.like_count as f64,
            VideoMetric::CommentCount => video.comment_count as f64,
            VideoMetric::EngagementRate => video.engagement_rate,
            VideoMetric::ViewsPerDay => video.views_per_day,
            VideoMetric::DurationSeconds => video.duration_seconds as f64,
        }
    }
}

impl FromStr for VideoMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view_count" | "views" => Ok(VideoMetric::ViewCount),
            "like_count" | "likes" => Ok(VideoMetric::LikeCount),
            "comment_count" | "comments" => Ok(VideoMetric::CommentCount),
            "engagement_rate" | "engagement" => Ok(VideoMetric::EngagementRate),
            "views_per_day" => Ok(VideoMetric::ViewsPerDay),
            "duration_seconds" | "duration" => Ok(VideoMetric::DurationSeconds),
            other => Err(format!("unknown metric '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeywordSource {
    #[default]
    Titles,
    Descriptions,
    Tags,
}

impl FromStr for KeywordSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "titles" | "title" => Ok(KeywordSource::Titles),
            "descriptions" | "description" => Ok(KeywordSource::Descriptions),
            "tags" => Ok(KeywordSource::Tags),
            other => Err(format!("unknown keyword source '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewStats {
    pub total_videos: usize,
    pub shorts_count: usize,
    pub long_form_count: usize,
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub avg_views: f64,
    pub avg_likes: f64,
    pub avg_comments: f64,
    pub median_views: f64,
    pub avg_engagement_rate: f64,
}

pub fn overview(videos: &[Video]) -> OverviewStats {
    let views: Vec<f64> = videos.iter().map(|v| v.view_count as f64).collect();
    let likes: Vec<f64> = videos.iter().map(|v| v.like_count as f64).collect();
    let comments: Vec<f64> = videos.iter().map(|v| v.comment_count as f64).collect();
    let engagement: Vec<f64> = videos.iter().map(|v| v.engagement_rate).collect();
    let shorts_count = videos.iter().filter(|v| v.is_short).count();

    OverviewStats {
        total_videos: videos.len(),
        shorts_count,
        long_form_count: videos.len() - shorts_count,
        total_views: videos.iter().map(|v| v.view_count).sum(),
        total_likes: videos.iter().map(|v| v.like_count).sum(),
        total_comments: videos.iter().map(|v| v.comment_count).sum(),
        avg_views: mean(&views),
        avg_likes: mean(&likes),
        avg_comments: mean(&comments),
        median_views: median(&views),
        avg_engagement_rate: mean(&engagement),
    }
}

/// Largest `count` videos by `metric`; ties keep collection order.
pub fn top_videos(videos: &[Video], metric: VideoMetric, count: usize) -> Vec<&Video> {
    let mut ranked: Vec<&Video> = videos.iter().collect();
    ranked.sort_by(|a, b| compare_desc(metric.value(a), metric.value(b)));
    ranked.truncate(count);
    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayBucket {
    pub day_of_week: String,
    pub uploads: usize,
    pub avg_views: f64,
    pub avg_engagement_rate: f64,
}

/// Upload counts and means per weekday, Monday first, empty days omitted.
pub fn weekday_pattern(videos: &[Video]) -> Vec<WeekdayBucket> {
    WEEKDAYS
        .iter()
        .filter_map(|day| {
            let group: Vec<&Video> = videos.iter().filter(|v| v.day_of_week == *day).collect();
            if group.is_empty() {
                return None;
            }
            Some(WeekdayBucket {
                day_of_week: day.to_string(),
                uploads: group.len(),
                avg_views: mean_of(&group, |v| v.view_count as f64),
                avg_engagement_rate: mean_of(&group, |v| v.engagement_rate),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourBucket {
    pub hour_of_day: u32,
    pub uploads: usize,
    pub avg_views: f64,
}

pub fn hourly_pattern(videos: &[Video]) -> Vec<HourBucket> {
    let mut groups: BTreeMap<u32, Vec<&Video>> = BTreeMap::new();
    for video in videos {
        groups.entry(video.hour_of_day).or_default().push(video);
    }

    groups
        .into_iter()
        .map(|(hour_of_day, group)| HourBucket {
            hour_of_day,
            uploads: group.len(),
            avg_views: mean_of(&group, |v| v.view_count as f64),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    /// `YYYY-MM`
    pub month: String,
    pub video_type: String,
    pub uploads: usize,
    pub avg_views: f64,
    pub avg_likes: f64,
    pub avg_engagement_rate: f64,
}

/// Per month and kind, long-form before shorts within a month.
pub fn monthly_trends(videos: &[Video]) -> Vec<MonthlyTrend> {
    let mut groups: BTreeMap<(String, bool), Vec<&Video>> = BTreeMap::new();
    for video in videos {
        let month = format!("{:04}-{:02}", video.year, video.month);
        groups.entry((month, video.is_short)).or_default().push(video);
    }

    groups
        .into_iter()
        .map(|((month, is_short), group)| MonthlyTrend {
            month,
            video_type: kind_label(is_short).to_string(),
            uploads: group.len(),
            avg_views: mean_of(&group, |v| v.view_count as f64),
            avg_likes: mean_of(&group, |v| v.like_count as f64),
            avg_engagement_rate: mean_of(&group, |v| v.engagement_rate),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub median: f64,
    pub sum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindComparison {
    pub video_type: String,
    pub count: usize,
    pub views: MetricSummary,
    pub likes: MetricSummary,
    pub comments: MetricSummary,
    pub engagement_rate_mean: f64,
    pub engagement_rate_median: f64,
}

/// Shorts against long-form, values rounded to two decimals.
pub fn shorts_vs_long_form(videos: &[Video]) -> Vec<KindComparison> {
    [false, true]
        .into_iter()
        .filter_map(|is_short| {
            let group: Vec<&Video> = videos.iter().filter(|v| v.is_short == is_short).collect();
            if group.is_empty() {
                return None;
            }
            let engagement: Vec<f64> = group.iter().map(|v| v.engagement_rate).collect();
            Some(KindComparison {
                video_type: kind_label(is_short).to_string(),
                count: group.len(),
                views: summarize(&group, |v| v.view_count as f64),
                likes: summarize(&group, |v| v.like_count as f64),
                comments: summarize(&group, |v| v.comment_count as f64),
                engagement_rate_mean: round2(mean(&engagement)),
                engagement_rate_median: round2(median(&engagement)),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadConsistency {
    pub total_videos: usize,
    pub first_upload: String,
    pub last_upload: String,
    pub days_active: i64,
    /// Absent with a single upload
    pub average_gap_days: Option<f64>,
    pub median_gap_days: Option<f64>,
    pub most_consistent_gap: f64,
    pub most_active_day: Option<String>,
    pub most_active_hour: Option<u32>,
    /// Absent when every upload falls on the same day
    pub uploads_per_week: Option<f64>,
}

pub fn upload_consistency(videos: &[Video]) -> AnalyzerResult<UploadConsistency> {
    let mut dates: Vec<_> = videos.iter().map(|v| v.published_at).collect();
    dates.sort();
    let (Some(first), Some(last)) = (dates.first().copied(), dates.last().copied()) else {
        return Err(AnalyzerError::EmptyResult("no videos to analyze".to_string()));
    };

    let gaps: Vec<i64> = dates
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_days())
        .collect();
    let gaps_f: Vec<f64> = gaps.iter().map(|g| *g as f64).collect();
    let days_active = (last - first).num_days();

    Ok(UploadConsistency {
        total_videos: videos.len(),
        first_upload: first.format("%Y-%m-%d").to_string(),
        last_upload: last.format("%Y-%m-%d").to_string(),
        days_active,
        average_gap_days: (!gaps.is_empty()).then(|| round2(mean(&gaps_f))),
        median_gap_days: (!gaps.is_empty()).then(|| round2(median(&gaps_f))),
        most_consistent_gap: mode(gaps.iter().copied()).unwrap_or(0) as f64,
        most_active_day: mode(videos.iter().map(|v| v.day_of_week.clone())),
        most_active_hour: mode(videos.iter().map(|v| v.hour_of_day)),
        uploads_per_week: uploads_per_week(videos.len(), days_active).map(round2),
    })
}

fn uploads_per_week(total: usize, days_active: i64) -> Option<f64> {
    if days_active <= 0 {
        return None;
    }
    Some(total as f64 / (days_active as f64 / 7.0))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
}

fn keywords_of(video: &Video, source: KeywordSource) -> Vec<String> {
    match source {
        KeywordSource::Titles => video.title_words.clone(),
        KeywordSource::Descriptions => video.description_words.clone(),
        KeywordSource::Tags => video.tags.iter().map(|tag| tag.to_lowercase()).collect(),
    }
}

/// Most common keywords; equal counts keep first-seen order.
fn most_common(words: impl IntoIterator<Item = String>, top_n: usize) -> Vec<KeywordCount> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, word) in words.into_iter().enumerate() {
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
        count_b.cmp(count_a).then(first_a.cmp(first_b))
    });
    ranked
        .into_iter()
        .take(top_n)
        .map(|(keyword, (count, _))| KeywordCount { keyword, count })
        .collect()
}

pub fn keyword_frequency(
    videos: &[Video],
    source: KeywordSource,
    top_n: usize,
) -> Vec<KeywordCount> {
    most_common(videos.iter().flat_map(|v| keywords_of(v, source)), top_n)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordPerformance {
    pub keyword: String,
    pub count: usize,
    /// Mean views over every analyzed video whose title carries the keyword
    pub avg_views: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestTime {
    pub period: String,
    pub day_of_week: String,
    pub hour_of_day: u32,
    pub avg_views: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessfulPatterns {
    pub view_threshold: f64,
    pub successful_videos: usize,
    pub top_keywords: Vec<KeywordPerformance>,
    pub best_times: Vec<BestTime>,
}

/// Keyword and timing patterns of the videos at or above the success quantile.
pub fn successful_patterns(
    videos: &[Video],
    policy: &AnalysisPolicy,
) -> AnalyzerResult<SuccessfulPatterns> {
    if videos.is_empty() {
        return Err(AnalyzerError::EmptyResult("no videos to analyze".to_string()));
    }

    let views: Vec<f64> = videos.iter().map(|v| v.view_count as f64).collect();
    let view_threshold = quantile(&views, policy.success_quantile);
    let successful: Vec<&Video> = videos
        .iter()
        .filter(|v| v.view_count as f64 >= view_threshold)
        .collect();

    let top_keywords = most_common(
        successful.iter().flat_map(|v| v.title_words.iter().cloned()),
        SUCCESS_TOP_KEYWORDS,
    )
    .into_iter()
    .filter_map(|KeywordCount { keyword, count }| {
        let carriers: Vec<&Video> = videos
            .iter()
            .filter(|v| v.title_words.contains(&keyword))
            .collect();
        if carriers.is_empty() {
            return None;
        }
        Some(KeywordPerformance {
            avg_views: mean_of(&carriers, |v| v.view_count as f64),
            keyword,
            count,
        })
    })
    .collect();

    let mut slots: BTreeMap<(String, u32), Vec<&Video>> = BTreeMap::new();
    for video in successful.iter().copied() {
        slots
            .entry((video.day_of_week.clone(), video.hour_of_day))
            .or_default()
            .push(video);
    }

    let mut best_times: Vec<BestTime> = slots
        .into_iter()
        .filter(|(_, group)| group.len() >= policy.min_bucket_videos)
        .map(|((day_of_week, hour_of_day), group)| BestTime {
            period: format!("{day_of_week} {hour_of_day}:00"),
            avg_views: mean_of(&group, |v| v.view_count as f64),
            count: group.len(),
            day_of_week,
            hour_of_day,
        })
        .collect();
    best_times.sort_by(|a, b| compare_desc(a.avg_views, b.avg_views));
    best_times.truncate(SUCCESS_BEST_TIMES);

    Ok(SuccessfulPatterns {
        view_threshold,
        successful_videos: successful.len(),
        top_keywords,
        best_times,
    })
}

/// Caller-side narrowing of the record list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoFilter {
    pub kind: VideoKind,
    pub min_views: u64,
    pub title_search: Option<String>,
}

impl VideoFilter {
    pub fn apply<'a>(&self, videos: &'a [Video]) -> Vec<&'a Video> {
        let needle = self
            .title_search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        videos
            .iter()
            .filter(|v| self.kind.matches(v))
            .filter(|v| v.view_count >= self.min_views)
            .filter(|v| match &needle {
                Some(needle) => v.title.to_lowercase().contains(needle),
                None => true,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummarySection {
    pub title: String,
    pub entries: Vec<SummaryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryReport {
    pub sections: Vec<SummarySection>,
}

fn section(title: &str, entries: Vec<(&str, String)>) -> SummarySection {
    SummarySection {
        title: title.to_string(),
        entries: entries
            .into_iter()
            .map(|(key, value)| SummaryEntry {
                key: key.to_string(),
                value,
            })
            .collect(),
    }
}

const NOT_AVAILABLE: &str = "N/A";

pub fn summary_report(videos: &[Video], channel: &Channel) -> AnalyzerResult<SummaryReport> {
    let stats = overview(videos);
    let consistency = upload_consistency(videos)?;
    let top_video = videos
        .iter()
        .reduce(|best, v| if v.view_count > best.view_count { v } else { best })
        .ok_or_else(|| AnalyzerError::EmptyResult("no videos to summarize".to_string()))?;

    let shorts: Vec<&Video> = videos.iter().filter(|v| v.is_short).collect();
    let long_form: Vec<&Video> = videos.iter().filter(|v| !v.is_short).collect();
    let avg_duration_shorts = mean_of(&shorts, |v| v.duration_seconds as f64);
    let avg_duration_long = mean_of(&long_form, |v| v.duration_seconds as f64);
    let views_per_subscriber = stats.total_views as f64 / channel.subscriber_count.max(1) as f64;

    let title_name = if channel.title.is_empty() {
        "Unknown".to_string()
    } else {
        channel.title.clone()
    };

    Ok(SummaryReport {
        sections: vec![
            section(
                "Channel Information",
                vec![
                    ("Channel Name", title_name),
                    (
                        "Total Channel Subscribers",
                        format_number(channel.subscriber_count as i64),
                    ),
                    (
                        "Analysis Period",
                        format!("{} to {}", consistency.first_upload, consistency.last_upload),
                    ),
                ],
            ),
            section(
                "Video Statistics",
                vec![
                    ("Total Videos Analyzed", format_number(stats.total_videos as i64)),
                    ("Shorts", format_number(stats.shorts_count as i64)),
                    ("Long-form", format_number(stats.long_form_count as i64)),
                    ("Total Views", format_number(stats.total_views as i64)),
                    ("Total Likes", format_number(stats.total_likes as i64)),
                    ("Total Comments", format_number(stats.total_comments as i64)),
                ],
            ),
            section(
                "Performance Metrics",
                vec![
                    ("Average Views per Video", format_float_number(stats.avg_views)),
                    ("Median Views per Video", format_float_number(stats.median_views)),
                    (
                        "Average Engagement Rate",
                        format!("{:.2}%", stats.avg_engagement_rate),
                    ),
                    ("Views per Subscriber", format!("{views_per_subscriber:.2}")),
                ],
            ),
            section(
                "Top Performing Video",
                vec![
                    (
                        "Title",
                        top_video.title.chars().take(SUMMARY_TITLE_CHARS).collect(),
                    ),
                    ("Views", format_number(top_video.view_count as i64)),
                    ("Likes", format_number(top_video.like_count as i64)),
                    ("Upload Date", top_video.date_str.clone()),
                ],
            ),
            section(
                "Upload Patterns",
                vec![
                    (
                        "Most Active Day",
                        consistency
                            .most_active_day
                            .clone()
                            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                    ),
                    (
                        "Most Active Hour",
                        consistency
                            .most_active_hour
                            .map(|hour| format!("{hour}:00"))
                            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                    ),
                    (
                        "Average Upload Frequency",
                        uploads_per_week(videos.len(), consistency.days_active)
                            .map(|per_week| format!("{per_week:.1} videos/week"))
                            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                    ),
                ],
            ),
            section(
                "Content Analysis",
                vec![
                    (
                        "Average Shorts Duration",
                        if avg_duration_shorts > 0.0 {
                            format!("{avg_duration_shorts:.0} seconds")
                        } else {
                            NOT_AVAILABLE.to_string()
                        },
                    ),
                    (
                        "Average Long-form Duration",
                        if avg_duration_long > 0.0 {
                            format!("{:.1} minutes", avg_duration_long / 60.0)
                        } else {
                            NOT_AVAILABLE.to_string()
                        },
                    ),
                    (
                        "Shorts Performance",
                        performance(&shorts),
                    ),
                    (
                        "Long-form Performance",
                        performance(&long_form),
                    ),
                ],
            ),
        ],
    })
}

fn performance(group: &[&Video]) -> String {
    if group.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    format!(
        "{} avg views",
        format_float_number(mean_of(group, |v| v.view_count as f64))
    )
}

fn mean_of(group: &[&Video], field: impl Fn(&Video) -> f64) -> f64 {
    let values: Vec<f64> = group.iter().map(|&v| field(v)).collect();
    mean(&values)
}

fn summarize(group: &[&Video], field: impl Fn(&Video) -> f64) -> MetricSummary {
    let values: Vec<f64> = group.iter().map(|&v| field(v)).collect();
    MetricSummary {
        mean: round2(mean(&values)),
        median: round2(median(&values)),
        sum: values.iter().sum(),
    }
}
