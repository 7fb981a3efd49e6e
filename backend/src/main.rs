#[macro_use]
extern crate rocket;

mod api;
mod channel_input;
mod config;
mod error;
mod models;
mod services;
mod utils;

use crate::api::*;
use crate::config::{create_app_state, create_cors, init_logger, load_environment, AnalysisPolicy};
use crate::services::session::SessionStore;
use rocket::{Build, Rocket};
use std::sync::Arc;

pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub policy: AnalysisPolicy,
    pub api_base_url: String,
}

pub fn build_rocket(state: AppState) -> anyhow::Result<Rocket<Build>> {
    let cors = create_cors()?;

    Ok(rocket::build()
        .manage(state)
        .mount(
            "/api",
            routes![
                resolve_channel,
                create_analysis,
                list_analyses,
                get_analysis,
                delete_analysis,
                list_analysis_videos,
                get_top_videos,
                get_patterns,
                get_consistency,
                get_keywords,
                get_successful_patterns,
                download_csv,
                download_json,
                download_summary,
            ],
        )
        .attach(cors))
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    load_environment();
    init_logger();

    let state = create_app_state();
    build_rocket(state)?
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Rocket failed to launch: {e}"))?;

    Ok(())
}
