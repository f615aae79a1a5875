//! HTTP-facing error type.
//!
//! Errors are surfaced to the caller as-is; nothing here retries or tries to
//! repair the input.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use ml_pipeline::PipelineError;
use predict_core::{RecordError, TableError};
use serde_json::json;
use thiserror::Error;

use crate::views;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("{0}")]
    BadRequest(String),

    #[error("no uploaded file for this session")]
    SessionNotFound,

    #[error("no predictions have been made for this upload yet")]
    NothingToDownload,
}

impl AppError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Record(_) | Self::Pipeline(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Table(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::SessionNotFound | Self::NothingToDownload => StatusCode::NOT_FOUND,
        }
    }

    /// Short label used for the failure metric.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Record(_) => "invalid_record",
            Self::Table(_) => "invalid_csv",
            Self::Pipeline(_) => "pipeline",
            Self::BadRequest(_) => "bad_request",
            Self::SessionNotFound => "session_not_found",
            Self::NothingToDownload => "nothing_to_download",
        }
    }
}

/// JSON body for the API routes.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        crate::metrics::record_failure(self.reason());
        tracing::warn!(error = %self, reason = self.reason(), "Request failed");

        (
            self.status(),
            Json(json!({ "ok": false, "error": self.to_string() })),
        )
            .into_response()
    }
}

/// Same error, rendered as an HTML page for the browser routes.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<RecordError> for PageError {
    fn from(err: RecordError) -> Self {
        Self(err.into())
    }
}

impl From<TableError> for PageError {
    fn from(err: TableError) -> Self {
        Self(err.into())
    }
}

impl From<PipelineError> for PageError {
    fn from(err: PipelineError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let err = self.0;
        crate::metrics::record_failure(err.reason());
        tracing::warn!(error = %err, reason = err.reason(), "Page request failed");

        (err.status(), Html(views::error_page(&err.to_string()))).into_response()
    }
}
