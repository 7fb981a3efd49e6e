use crate::api::analysis::find_session;
use crate::error::AnalyzerResult;
use crate::services::analyzer::summary_report;
use crate::services::export::{export_csv, export_file_name, export_json, export_summary};
use crate::services::session::AnalysisSession;
use crate::AppState;
use chrono::Utc;
use rocket::http::{ContentType, Header};
use rocket::{get, Responder, State};

/// File body plus a `Content-Disposition` naming the download.
#[derive(Responder)]
pub struct Download {
    body: (ContentType, String),
    disposition: Header<'static>,
}

impl Download {
    fn new(
        session: &AnalysisSession,
        kind: &str,
        extension: &str,
        content_type: ContentType,
        body: String,
    ) -> Self {
        let file_name = export_file_name(&session.channel, kind, extension, Utc::now());
        Download {
            body: (content_type, body),
            disposition: Header::new(
                "Content-Disposition",
                format!("attachment; filename=\"{file_name}\""),
            ),
        }
    }
}

#[get("/analysis/<id>/export/csv")]
pub async fn download_csv(id: &str, state: &State<AppState>) -> AnalyzerResult<Download> {
    let session = find_session(state, id)?;
    let body = export_csv(&session.videos)?;
    Ok(Download::new(&session, "videos", "csv", ContentType::CSV, body))
}

#[get("/analysis/<id>/export/json")]
pub async fn download_json(id: &str, state: &State<AppState>) -> AnalyzerResult<Download> {
    let session = find_session(state, id)?;
    let body = export_json(&session.channel, &session.videos)?;
    Ok(Download::new(&session, "analysis", "json", ContentType::JSON, body))
}

#[get("/analysis/<id>/export/summary")]
pub async fn download_summary(id: &str, state: &State<AppState>) -> AnalyzerResult<Download> {
    let session = find_session(state, id)?;
    let report = summary_report(&session.videos, &session.channel)?;
    Ok(Download::new(
        &session,
        "summary",
        "txt",
        ContentType::Plain,
        export_summary(&report),
    ))
}
