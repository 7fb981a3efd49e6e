use crate::error::{AnalyzerError, AnalyzerResult};
use crate::models::Channel;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use url::Url;

lazy_static! {
    static ref CHANNEL_ID_URL: Regex =
        Regex::new(r"youtube\.com/channel/([a-zA-Z0-9_-]+)").expect("valid channel id pattern");
    static ref HANDLE_URL: Regex =
        Regex::new(r"youtube\.com/@([^/?&\s]+)").expect("valid handle pattern");
    static ref USER_URL: Regex =
        Regex::new(r"youtube\.com/user/([^/?&\s]+)").expect("valid user pattern");
    static ref CUSTOM_URL: Regex =
        Regex::new(r"youtube\.com/c/([^/?&\s]+)").expect("valid custom url pattern");
    static ref HANDLE_NAME: Regex = Regex::new(r"^[a-zA-Z0-9._-]+$").expect("valid handle name");
}

const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com"];

/// What a user typed, reduced to something the Data API can look up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ChannelInput {
    /// `UC…` channel id
    Id(String),
    /// `@handle`, marker included
    Handle(String),
    /// Legacy `/user/<name>`
    Username(String),
    /// Free text or `/c/<name>`, resolved through search
    Name(String),
}

impl ChannelInput {
    pub fn identifier(&self) -> &str {
        match self {
            ChannelInput::Id(value)
            | ChannelInput::Handle(value)
            | ChannelInput::Username(value)
            | ChannelInput::Name(value) => value,
        }
    }
}

/// Parse a channel name, `@handle`, id or any channel URL.
pub fn parse_channel_input(input: &str) -> AnalyzerResult<ChannelInput> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AnalyzerError::MalformedInput(
            "Input cannot be empty".to_string(),
        ));
    }

    if !input.starts_with("http") {
        return Ok(classify(input));
    }

    let parsed_url = Url::parse(input)
        .map_err(|e| AnalyzerError::MalformedInput(format!("Error parsing URL: {e}")))?;
    let decoded_url = decode(input);

    if input.contains("/channel/") {
        if let Some(captures) = CHANNEL_ID_URL.captures(input) {
            return Ok(ChannelInput::Id(captures[1].to_string()));
        }
    } else if input.contains("/@") {
        if let Some(captures) = HANDLE_URL.captures(&decoded_url) {
            return Ok(ChannelInput::Handle(format!("@{}", &captures[1])));
        }
    } else if input.contains("/user/") {
        if let Some(captures) = USER_URL.captures(input) {
            return Ok(ChannelInput::Username(decode(&captures[1])));
        }
    } else if input.contains("/c/") {
        if let Some(captures) = CUSTOM_URL.captures(input) {
            return Ok(ChannelInput::Name(decode(&captures[1])));
        }
    }

    // Fall back to the first path segment
    let first_part = parsed_url
        .path_segments()
        .and_then(|mut segments| segments.find(|segment| !segment.is_empty()))
        .map(decode);

    match first_part {
        Some(part) => Ok(classify(&part)),
        None => Err(AnalyzerError::MalformedInput(
            "Could not parse channel information from URL".to_string(),
        )),
    }
}

fn classify(value: &str) -> ChannelInput {
    if value.starts_with('@') {
        ChannelInput::Handle(value.to_string())
    } else if validate_channel_id(value) {
        ChannelInput::Id(value.to_string())
    } else {
        ChannelInput::Name(value.to_string())
    }
}

fn decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

/// YouTube channel ids are 24 characters long and start with `UC`.
pub fn validate_channel_id(channel_id: &str) -> bool {
    channel_id.len() == 24
        && channel_id.starts_with("UC")
        && channel_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// `@` followed by 3-30 of `[A-Za-z0-9._-]`.
pub fn validate_handle(handle: &str) -> bool {
    match handle.strip_prefix('@') {
        Some(username) => (3..=30).contains(&username.len()) && HANDLE_NAME.is_match(username),
        None => false,
    }
}

pub fn clean_channel_name(name: &str) -> String {
    decode(name.trim())
}

pub fn is_youtube_url(input: &str) -> bool {
    Url::parse(input)
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_lowercase()))
        .map(|host| YOUTUBE_HOSTS.contains(&host.as_str()))
        .unwrap_or(false)
}

/// Identifier string for any accepted input form.
pub fn normalize_input(input: &str) -> AnalyzerResult<String> {
    let input = input.trim();
    if is_youtube_url(input) {
        return parse_channel_input(input).map(|parsed| parsed.identifier().to_string());
    }
    Ok(clean_channel_name(input))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierType {
    ChannelId,
    Handle,
    NameOrUsername,
}

pub fn identifier_type(identifier: &str) -> IdentifierType {
    if validate_channel_id(identifier) {
        IdentifierType::ChannelId
    } else if validate_handle(identifier) {
        IdentifierType::Handle
    } else {
        IdentifierType::NameOrUsername
    }
}

pub fn clean_channel_url(channel: &Channel) -> Option<String> {
    if channel.id.is_empty() {
        return None;
    }
    Some(format!("https://www.youtube.com/channel/{}", channel.id))
}
