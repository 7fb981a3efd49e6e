use crate::channel_input::{
    clean_channel_url, identifier_type, normalize_input, parse_channel_input, ChannelInput,
    IdentifierType,
};
use crate::config::resolve_api_key;
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::models::Channel;
use crate::services::collector::get_channel_info;
use crate::services::youtube_client::YouTubeClient;
use crate::AppState;
use log::info;
use rocket::serde::json::Json;
use rocket::{get, State};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ResolvedChannel {
    pub identifier: String,
    pub identifier_type: IdentifierType,
    pub input: ChannelInput,
    pub channel: Channel,
    pub url: Option<String>,
}

/// Client for one request; the request's key wins over `YOUTUBE_API_KEY`.
pub fn client_for(api_key: Option<&str>, state: &AppState) -> AnalyzerResult<YouTubeClient> {
    let api_key = resolve_api_key(api_key).ok_or_else(|| {
        AnalyzerError::InvalidCredential("Please enter your YouTube Data API key".to_string())
    })?;
    YouTubeClient::new(api_key, &state.api_base_url)
}

#[get("/channel?<input>&<api_key>")]
pub async fn resolve_channel(
    input: &str,
    api_key: Option<&str>,
    state: &State<AppState>,
) -> AnalyzerResult<Json<ResolvedChannel>> {
    let identifier = normalize_input(input)?;
    let input = parse_channel_input(input)?;
    let client = client_for(api_key, state)?;
    let channel = get_channel_info(&client, &input).await?;
    info!("Resolved '{}' to {}", input.identifier(), channel.id);

    Ok(Json(ResolvedChannel {
        identifier_type: identifier_type(&identifier),
        identifier,
        url: clean_channel_url(&channel),
        input,
        channel,
    }))
}
