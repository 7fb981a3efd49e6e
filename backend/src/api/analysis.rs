use crate::api::channel::client_for;
use crate::channel_input::parse_channel_input;
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::models::{AnalysisRequest, Channel, Video, VideoKind};
use crate::services::analyzer::{
    hourly_pattern, keyword_frequency, monthly_trends, overview, shorts_vs_long_form,
    successful_patterns, top_videos, upload_consistency, weekday_pattern, HourBucket,
    KeywordCount, KeywordSource, KindComparison, MonthlyTrend, OverviewStats, SuccessfulPatterns,
    UploadConsistency, VideoFilter, VideoMetric, WeekdayBucket,
};
use crate::services::collector::{collect_videos, get_channel_info, CollectOptions};
use crate::services::session::{AnalysisSession, ProgressLog, SessionInfo};
use crate::AppState;
use chrono::Utc;
use log::info;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, post, State};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;

const DEFAULT_TOP_COUNT: usize = 10;
const DEFAULT_KEYWORD_COUNT: usize = 20;

#[derive(Debug, Serialize)]
pub struct AnalysisOverview {
    pub session_id: String,
    pub channel: Channel,
    pub overview: OverviewStats,
    pub progress: Vec<String>,
    pub created_at: String,
}

impl From<&AnalysisSession> for AnalysisOverview {
    fn from(session: &AnalysisSession) -> Self {
        AnalysisOverview {
            session_id: session.id.clone(),
            channel: session.channel.clone(),
            overview: overview(&session.videos),
            progress: session.progress.clone(),
            created_at: session.created_at.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadPatterns {
    pub weekday: Vec<WeekdayBucket>,
    pub hourly: Vec<HourBucket>,
    pub monthly: Vec<MonthlyTrend>,
    pub shorts_vs_long_form: Vec<KindComparison>,
}

pub fn find_session(state: &AppState, id: &str) -> AnalyzerResult<Arc<AnalysisSession>> {
    state
        .sessions
        .get_session(id)
        .ok_or_else(|| AnalyzerError::SessionNotFound(id.to_string()))
}

fn parse_param<T: FromStr<Err = String>>(value: Option<&str>, default: T) -> AnalyzerResult<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw.parse::<T>().map_err(AnalyzerError::MalformedInput),
    }
}

#[post("/analysis", format = "json", data = "<request>")]
pub async fn create_analysis(
    request: Json<AnalysisRequest>,
    state: &State<AppState>,
) -> AnalyzerResult<Json<AnalysisOverview>> {
    let request = request.into_inner();
    let input = parse_channel_input(&request.channel)?;
    let options = CollectOptions {
        max_results: request
            .max_results
            .unwrap_or(state.policy.default_max_results),
        include_shorts: request.include_shorts.unwrap_or(true),
        include_long_form: request.include_long_form.unwrap_or(true),
    };
    if !options.include_shorts && !options.include_long_form {
        return Err(AnalyzerError::MalformedInput(
            "Select at least one of shorts or long-form videos".to_string(),
        ));
    }
    let client = client_for(request.api_key.as_deref(), state)?;

    let mut progress = ProgressLog::new();
    progress.record(&format!("Looking up channel '{}'", input.identifier()));
    let channel = get_channel_info(&client, &input).await?;
    progress.record(&format!("Found channel: {}", channel.title));

    let videos = collect_videos(
        &client,
        &channel.id,
        options,
        &state.policy,
        &mut progress,
        Utc::now(),
    )
    .await?;

    if videos.is_empty() {
        return Err(AnalyzerError::EmptyResult(format!(
            "no videos found for channel '{}'",
            channel.title
        )));
    }
    progress.record(&format!("Analysis complete: {} videos", videos.len()));

    let session_id = state
        .sessions
        .add_session(channel, videos, progress.into_lines());
    info!(
        "Stored analysis session {session_id} ({} held)",
        state.sessions.get_size()
    );

    let session = find_session(state, &session_id)?;
    Ok(Json(AnalysisOverview::from(session.as_ref())))
}

#[get("/analysis")]
pub async fn list_analyses(state: &State<AppState>) -> Json<Vec<SessionInfo>> {
    Json(state.sessions.list_sessions())
}

#[get("/analysis/<id>")]
pub async fn get_analysis(
    id: &str,
    state: &State<AppState>,
) -> AnalyzerResult<Json<AnalysisOverview>> {
    let session = find_session(state, id)?;
    Ok(Json(AnalysisOverview::from(session.as_ref())))
}

#[delete("/analysis/<id>")]
pub async fn delete_analysis(id: &str, state: &State<AppState>) -> AnalyzerResult<Status> {
    if state.sessions.remove_session(id) {
        info!("Removed analysis session {id}");
        Ok(Status::NoContent)
    } else {
        Err(AnalyzerError::SessionNotFound(id.to_string()))
    }
}

#[get("/analysis/<id>/videos?<kind>&<min_views>&<search>")]
pub async fn list_analysis_videos(
    id: &str,
    kind: Option<&str>,
    min_views: Option<u64>,
    search: Option<String>,
    state: &State<AppState>,
) -> AnalyzerResult<Json<Vec<Video>>> {
    let session = find_session(state, id)?;
    let filter = VideoFilter {
        kind: parse_param(kind, VideoKind::All)?,
        min_views: min_views.unwrap_or(0),
        title_search: search,
    };
    Ok(Json(
        filter.apply(&session.videos).into_iter().cloned().collect(),
    ))
}

#[get("/analysis/<id>/top?<metric>&<count>")]
pub async fn get_top_videos(
    id: &str,
    metric: Option<&str>,
    count: Option<usize>,
    state: &State<AppState>,
) -> AnalyzerResult<Json<Vec<Video>>> {
    let session = find_session(state, id)?;
    let metric = parse_param(metric, VideoMetric::ViewCount)?;
    let count = count.unwrap_or(DEFAULT_TOP_COUNT);
    Ok(Json(
        top_videos(&session.videos, metric, count)
            .into_iter()
            .cloned()
            .collect(),
    ))
}

#[get("/analysis/<id>/patterns")]
pub async fn get_patterns(
    id: &str,
    state: &State<AppState>,
) -> AnalyzerResult<Json<UploadPatterns>> {
    let session = find_session(state, id)?;
    Ok(Json(UploadPatterns {
        weekday: weekday_pattern(&session.videos),
        hourly: hourly_pattern(&session.videos),
        monthly: monthly_trends(&session.videos),
        shorts_vs_long_form: shorts_vs_long_form(&session.videos),
    }))
}

#[get("/analysis/<id>/consistency")]
pub async fn get_consistency(
    id: &str,
    state: &State<AppState>,
) -> AnalyzerResult<Json<UploadConsistency>> {
    let session = find_session(state, id)?;
    Ok(Json(upload_consistency(&session.videos)?))
}

#[get("/analysis/<id>/keywords?<source>&<top_n>")]
pub async fn get_keywords(
    id: &str,
    source: Option<&str>,
    top_n: Option<usize>,
    state: &State<AppState>,
) -> AnalyzerResult<Json<Vec<KeywordCount>>> {
    let session = find_session(state, id)?;
    let source = parse_param(source, KeywordSource::Titles)?;
    Ok(Json(keyword_frequency(
        &session.videos,
        source,
        top_n.unwrap_or(DEFAULT_KEYWORD_COUNT),
    )))
}

#[get("/analysis/<id>/success")]
pub async fn get_successful_patterns(
    id: &str,
    state: &State<AppState>,
) -> AnalyzerResult<Json<SuccessfulPatterns>> {
    let session = find_session(state, id)?;
    Ok(Json(successful_patterns(&session.videos, &state.policy)?))
}
