use crate::models::{Channel, Video};
use crate::services::collector::{ProgressEvent, ProgressObserver};
use chrono::{Local, Utc};
use log::info;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One finished analysis run, kept in memory until deleted.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSession {
    pub id: String,
    pub channel: Channel,
    pub videos: Vec<Video>,
    pub progress: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub channel_id: String,
    pub channel_title: String,
    pub video_count: usize,
    pub created_at: String,
}

impl From<&AnalysisSession> for SessionInfo {
    fn from(session: &AnalysisSession) -> Self {
        SessionInfo {
            id: session.id.clone(),
            channel_id: session.channel.id.clone(),
            channel_title: session.channel.title.clone(),
            video_count: session.videos.len(),
            created_at: session.created_at.clone(),
        }
    }
}

pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Arc<AnalysisSession>>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Recovers the map from a poisoned lock.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<AnalysisSession>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a finished run and return its session id.
    pub fn add_session(
        &self,
        channel: Channel,
        videos: Vec<Video>,
        progress: Vec<String>,
    ) -> String {
        let now = Utc::now();
        let id = format!("{}_{}", now.timestamp_millis(), channel.id);
        let session = AnalysisSession {
            id: id.clone(),
            channel,
            videos,
            progress,
            created_at: now.to_rfc3339(),
        };

        self.lock().insert(id.clone(), Arc::new(session));
        id
    }

    pub fn get_session(&self, id: &str) -> Option<Arc<AnalysisSession>> {
        self.lock().get(id).cloned()
    }

    pub fn remove_session(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Oldest first.
    pub fn list_sessions(&self) -> Vec<SessionInfo> {
        let mut infos: Vec<SessionInfo> = self
            .lock()
            .values()
            .map(|s| SessionInfo::from(s.as_ref()))
            .collect();
        infos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        infos
    }

    pub fn get_size(&self) -> usize {
        self.lock().len()
    }
}

/// Progress observer that logs each event and keeps a timestamped copy.
#[derive(Debug, Default)]
pub struct ProgressLog {
    lines: Vec<String>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, message: &str) {
        info!("{message}");
        self.lines
            .push(format!("[{}] {message}", Local::now().format("%H:%M:%S")));
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl ProgressObserver for ProgressLog {
    fn on_progress(&mut self, event: &ProgressEvent) {
        self.record(&event.message());
    }
}
