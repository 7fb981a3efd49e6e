//! Error taxonomy of an analysis run.
//!
//! Every failure a caller can see maps to one variant here. Per-record parse
//! problems never reach this type: the collector logs and skips them.

use crate::models::ErrorResponse;
use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// No credential supplied, or the service rejected it
    #[error("API key is missing or invalid: {0}")]
    InvalidCredential(String),

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("API quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Channel input, duration, metric name or other caller-supplied value
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("No data available: {0}")]
    EmptyResult(String),

    #[error("Analysis session not found: {0}")]
    SessionNotFound(String),

    /// Any other non-success answer from the Data API
    #[error("YouTube API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Export failed: {0}")]
    Export(String),
}

pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

impl AnalyzerError {
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyzerError::InvalidCredential(_) => "invalid_credential",
            AnalyzerError::ChannelNotFound(_) => "channel_not_found",
            AnalyzerError::QuotaExceeded(_) => "quota_exceeded",
            AnalyzerError::MalformedInput(_) => "malformed_input",
            AnalyzerError::EmptyResult(_) => "empty_result",
            AnalyzerError::SessionNotFound(_) => "session_not_found",
            AnalyzerError::Api { .. } => "api_error",
            AnalyzerError::Http(_) => "http_error",
            AnalyzerError::Export(_) => "export_error",
        }
    }

    pub fn status(&self) -> Status {
        match self {
            AnalyzerError::InvalidCredential(_) => Status::Unauthorized,
            AnalyzerError::ChannelNotFound(_)
            | AnalyzerError::EmptyResult(_)
            | AnalyzerError::SessionNotFound(_) => Status::NotFound,
            AnalyzerError::QuotaExceeded(_) => Status::TooManyRequests,
            AnalyzerError::MalformedInput(_) => Status::BadRequest,
            AnalyzerError::Api { .. } | AnalyzerError::Http(_) => Status::BadGateway,
            AnalyzerError::Export(_) => Status::InternalServerError,
        }
    }
}

impl From<csv::Error> for AnalyzerError {
    fn from(e: csv::Error) -> Self {
        AnalyzerError::Export(e.to_string())
    }
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(e: serde_json::Error) -> Self {
        AnalyzerError::Export(e.to_string())
    }
}

impl<'r> Responder<'r, 'static> for AnalyzerError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let body = ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        let json = serde_json::to_string(&body).map_err(|_| Status::InternalServerError)?;
        Response::build()
            .status(self.status())
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}
