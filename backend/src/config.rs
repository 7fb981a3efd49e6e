use crate::services::session::SessionStore;
use crate::AppState;
use anyhow::Result;
use env_logger::Builder;
use lazy_static::lazy_static;
use log::{info, LevelFilter};
use rocket::http::Method;
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Videos at or below this many seconds count as shorts.
pub const SHORTS_MAX_DURATION_SECS: u64 = 60;
/// Lower bound of the "successful" view bracket (top quartile).
pub const SUCCESS_QUANTILE: f64 = 0.75;
/// Largest page the playlistItems endpoint serves.
pub const PAGE_SIZE: usize = 50;
pub const PAGE_DELAY_MS: u64 = 100;
pub const DEFAULT_MAX_RESULTS: usize = 200;
/// (weekday, hour) buckets need this many videos to rank as a best time.
pub const MIN_BUCKET_VIDEOS: usize = 2;
pub const SHORTS_MARKER: &str = "#shorts";

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

lazy_static! {
    pub static ref YOUTUBE_API_KEY: Option<String> =
        env::var("YOUTUBE_API_KEY").ok().filter(|key| !key.trim().is_empty());
    pub static ref YOUTUBE_API_BASE_URL: String = env::var("YOUTUBE_API_BASE_URL")
        .unwrap_or_else(|_| "https://www.googleapis.com/youtube/v3".to_string());
    pub static ref CORS_ALLOWED_ORIGIN: String =
        env::var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| "http://localhost:8080".to_string());
    pub static ref ANALYSIS_POLICY: AnalysisPolicy = AnalysisPolicy::from_env();
}

/// Tunables of an analysis run, resolved once at startup and passed explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisPolicy {
    pub shorts_max_duration_secs: u64,
    pub success_quantile: f64,
    pub page_size: usize,
    pub page_delay: Duration,
    pub default_max_results: usize,
    pub min_bucket_videos: usize,
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        AnalysisPolicy {
            shorts_max_duration_secs: SHORTS_MAX_DURATION_SECS,
            success_quantile: SUCCESS_QUANTILE,
            page_size: PAGE_SIZE,
            page_delay: Duration::from_millis(PAGE_DELAY_MS),
            default_max_results: DEFAULT_MAX_RESULTS,
            min_bucket_videos: MIN_BUCKET_VIDEOS,
        }
    }
}

impl AnalysisPolicy {
    pub fn from_env() -> Self {
        AnalysisPolicy {
            shorts_max_duration_secs: env_or("SHORTS_MAX_DURATION_SECS", SHORTS_MAX_DURATION_SECS),
            success_quantile: env_or("SUCCESS_QUANTILE", SUCCESS_QUANTILE).clamp(0.0, 1.0),
            page_size: env_or("PAGE_SIZE", PAGE_SIZE).clamp(1, PAGE_SIZE),
            page_delay: Duration::from_millis(env_or("PAGE_DELAY_MS", PAGE_DELAY_MS)),
            default_max_results: env_or("DEFAULT_MAX_RESULTS", DEFAULT_MAX_RESULTS).max(1),
            min_bucket_videos: env_or("MIN_BUCKET_VIDEOS", MIN_BUCKET_VIDEOS),
        }
    }
}

pub fn init_logger() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
    info!("Starting channel analyzer backend...");
}

pub fn load_environment() {
    dotenv::dotenv().ok();
}

/// Request credential wins over the configured default.
pub fn resolve_api_key(request_key: Option<&str>) -> Option<String> {
    request_key
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(String::from)
        .or_else(|| YOUTUBE_API_KEY.clone())
}

pub fn create_app_state() -> AppState {
    let policy = ANALYSIS_POLICY.clone();
    info!(
        "Analysis policy: shorts <= {}s, success quantile {}, page size {}, page delay {:?}",
        policy.shorts_max_duration_secs,
        policy.success_quantile,
        policy.page_size,
        policy.page_delay
    );
    info!("YouTube Data API at: {}", *YOUTUBE_API_BASE_URL);

    AppState {
        sessions: Arc::new(SessionStore::new()),
        policy,
        api_base_url: YOUTUBE_API_BASE_URL.clone(),
    }
}

pub fn create_cors() -> Result<rocket_cors::Cors> {
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::some_exact(&[CORS_ALLOWED_ORIGIN.as_str()]))
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Delete, Method::Options]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allowed_headers(AllowedHeaders::some(&["Accept", "Content-Type"]))
        .allow_credentials(true)
        .to_cors()
        .map_err(|e| anyhow::anyhow!("Failed to create CORS options: {}", e))?;

    Ok(cors)
}
