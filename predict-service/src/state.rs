//! Shared application state for the prediction service.
//!
//! Holds the read-only pipeline every request predicts with, and the
//! per-upload scratch state of the batch mode.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use ml_pipeline::Pipeline;
use predict_core::FeatureTable;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::ServiceConfig;

/// Identifier of one uploaded file.
pub type SessionId = Uuid;

/// Type alias for session ID to upload mapping.
pub type SessionsMap = DashMap<SessionId, UploadSession>;

/// One uploaded CSV file and, once predicted, its augmented copy.
///
/// Tables are shared so a session snapshot never copies row data.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub id: SessionId,
    pub file_name: String,
    pub table: Arc<FeatureTable>,
    pub predicted: Option<Arc<FeatureTable>>,
    pub created_at: DateTime<Utc>,
}

impl UploadSession {
    pub fn new(file_name: String, table: FeatureTable) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name,
            table: Arc::new(table),
            predicted: None,
            created_at: Utc::now(),
        }
    }

    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        chrono::Duration::from_std(ttl)
            .map(|ttl| now - self.created_at > ttl)
            .unwrap_or(false)
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Pre-trained pipeline; never mutated after load.
    pub pipeline: Arc<Pipeline>,

    /// Live upload sessions.
    pub sessions: Arc<SessionsMap>,

    /// Rows shown in table previews.
    pub preview_rows: usize,

    /// How long an upload is kept around.
    pub session_ttl: Duration,

    /// Service start time for uptime calculations
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, config: &ServiceConfig) -> Self {
        Self {
            pipeline,
            sessions: Arc::new(DashMap::new()),
            preview_rows: config.preview_rows,
            session_ttl: config.session_ttl,
            started_at: Utc::now(),
        }
    }

    /// Store a new upload, dropping expired ones first.
    pub fn insert_session(&self, session: UploadSession) -> SessionId {
        self.prune_expired();

        let id = session.id;
        tracing::info!(
            session = %id,
            file = %session.file_name,
            rows = session.table.len(),
            "Upload session created"
        );
        self.sessions.insert(id, session);
        crate::metrics::set_active_sessions(self.sessions.len());
        id
    }

    /// Snapshot of a live session. Expired sessions are dropped first.
    pub fn session(&self, id: &SessionId) -> Option<UploadSession> {
        self.prune_expired();
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Attach the augmented table to a session.
    pub fn set_predictions(&self, id: &SessionId, table: Arc<FeatureTable>) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut entry) => {
                entry.predicted = Some(table);
                true
            }
            None => false,
        }
    }

    /// Remove sessions older than the configured TTL.
    pub fn prune_expired(&self) {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !session.is_expired(now, self.session_ttl));

        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            tracing::info!(removed, "Expired upload sessions removed");
            crate::metrics::set_active_sessions(self.sessions.len());
        }
    }

    /// Get service uptime in seconds.
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// Get total number of live upload sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
