//! HTTP handlers for the manual and batch prediction modes.
//!
//! Every action is one synchronous call into the shared pipeline; handlers
//! hold no locks while predicting and never retry.

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderValue},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use ml_pipeline::{Classifier, Pipeline, DEFAULT_MODEL};
use predict_core::{FeatureRecord, FeatureTable, PredictionLabel, PREDICTION_COLUMN};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::{AppError, PageError};
use crate::metrics::{self, Mode};
use crate::state::{AppState, SessionId, UploadSession};
use crate::views::{self, AppMode, ManualResult, UploadView, DOWNLOAD_FILE_NAME};

// ============================================================================
// Prediction
// ============================================================================

/// Predict one record: `predict` and `predict_proba` are each called once
/// on a one-row table.
pub fn predict_record(
    pipeline: &Pipeline,
    record: &FeatureRecord,
) -> Result<ManualResult, AppError> {
    record.validate()?;

    let started = Instant::now();
    let table = record.to_table();
    let model = pipeline.default_model();

    let label = model
        .predict(&table)?
        .first()
        .copied()
        .ok_or_else(|| AppError::BadRequest("model returned no prediction".into()))?;
    let probability = model
        .predict_proba(&table)?
        .first()
        .map(|[_, p]| *p)
        .ok_or_else(|| AppError::BadRequest("model returned no probability".into()))?;

    metrics::record_prediction(Mode::Manual, 1, started.elapsed());
    debug!(label = %label, probability, "Manual prediction");

    Ok(ManualResult { label, probability })
}

/// Predict every row and append the `Prediction` column.
pub fn predict_table(pipeline: &Pipeline, table: FeatureTable) -> Result<FeatureTable, AppError> {
    let started = Instant::now();
    let rows = table.len();

    let labels: Vec<String> = pipeline
        .default_model()
        .predict(&table)?
        .into_iter()
        .map(|label| label.to_string())
        .collect();
    let augmented = table.with_column(PREDICTION_COLUMN, labels)?;

    metrics::record_prediction(Mode::Batch, rows, started.elapsed());
    info!(rows, model = %DEFAULT_MODEL, "Batch prediction complete");

    Ok(augmented)
}

fn csv_download(table: &FeatureTable) -> Result<Response, AppError> {
    let body = table.to_csv_bytes()?;
    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static(
                    // Must match DOWNLOAD_FILE_NAME
                    "attachment; filename=\"diabetes_predictions.csv\"",
                ),
            ),
        ],
        body,
    )
        .into_response())
}

// ============================================================================
// HTML Handlers
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ModeQuery {
    #[serde(default)]
    pub mode: AppMode,
}

/// GET / - render the selected mode with an empty form
pub async fn index(Query(query): Query<ModeQuery>) -> Html<String> {
    match query.mode {
        AppMode::Manual => Html(views::manual_page(&FeatureRecord::default(), None)),
        AppMode::Upload => Html(views::upload_page(&UploadView::Empty, 0)),
    }
}

/// POST /manual/predict - predict from the form and show the result
pub async fn manual_predict(
    State(state): State<AppState>,
    Form(record): Form<FeatureRecord>,
) -> Result<Html<String>, PageError> {
    let result = predict_record(&state.pipeline, &record)?;
    Ok(Html(views::manual_page(&record, Some(&result))))
}

/// POST /upload - accept one CSV file and show a preview
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Html<String>, PageError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if file_name.is_empty() {
            continue;
        }
        if !has_csv_extension(&file_name) {
            return Err(AppError::BadRequest(format!("{file_name} is not a .csv file")).into());
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        info!(file = %file_name, bytes = data.len(), "Received upload");

        let table = FeatureTable::from_csv_bytes(&data)?;
        metrics::record_upload();

        let session = UploadSession::new(file_name, table);
        let page = views::upload_page(
            &UploadView::Uploaded {
                id: session.id,
                file_name: &session.file_name,
                table: &session.table,
            },
            state.preview_rows,
        );
        state.insert_session(session);
        return Ok(Html(page));
    }

    Err(AppError::BadRequest("No file uploaded".into()).into())
}

/// POST /upload/{session}/predict - predict over the whole uploaded table
pub async fn upload_predict(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<Html<String>, PageError> {
    let session = state.session(&id).ok_or(AppError::SessionNotFound)?;

    let augmented = Arc::new(predict_table(
        &state.pipeline,
        FeatureTable::clone(&session.table),
    )?);
    let page = views::upload_page(
        &UploadView::Predicted {
            id,
            file_name: &session.file_name,
            table: &augmented,
        },
        state.preview_rows,
    );

    if !state.set_predictions(&id, augmented) {
        return Err(AppError::SessionNotFound.into());
    }
    Ok(Html(page))
}

/// GET /upload/{session}/download - the augmented table as a CSV file
pub async fn upload_download(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<Response, PageError> {
    let session = state.session(&id).ok_or(AppError::SessionNotFound)?;
    let table = session.predicted.ok_or(AppError::NothingToDownload)?;
    Ok(csv_download(&table)?)
}

fn has_csv_extension(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

// ============================================================================
// API Handlers
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub label: PredictionLabel,
    pub class: u8,
    pub probability: f64,
    pub probability_display: String,
}

/// POST /api/predict - JSON feature record in, label and probability out
pub async fn api_predict(
    State(state): State<AppState>,
    Json(record): Json<FeatureRecord>,
) -> Result<Json<PredictResponse>, AppError> {
    let result = predict_record(&state.pipeline, &record)?;
    Ok(Json(PredictResponse {
        label: result.label,
        class: result.label.class(),
        probability: result.probability,
        probability_display: predict_core::format_probability(result.probability),
    }))
}

/// POST /api/predict/batch - CSV body in, augmented CSV out
pub async fn api_predict_batch(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let table = FeatureTable::from_csv_bytes(&body)?;
    let augmented = predict_table(&state.pipeline, table)?;
    csv_download(&augmented)
}

// ============================================================================
// Operational Handlers
// ============================================================================

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

/// GET /ready - the pipeline is loaded before the listener binds, so a
/// responding server is always ready
pub async fn ready(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ready",
        "model": DEFAULT_MODEL.as_str(),
        "download_file_name": DOWNLOAD_FILE_NAME,
        "uptime_secs": state.uptime_secs(),
        "sessions": state.session_count(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_csv_extension() {
        assert!(has_csv_extension("patients.csv"));
        assert!(has_csv_extension("PATIENTS.CSV"));
        assert!(!has_csv_extension("patients.xlsx"));
        assert!(!has_csv_extension("csv"));
        assert!(!has_csv_extension("patients.csv.gz"));
    }

    #[test]
    fn test_download_header_matches_file_name() {
        let table = FeatureTable::from_csv_bytes(b"a\n1\n").unwrap();
        let response = csv_download(&table).unwrap();
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(disposition.contains(DOWNLOAD_FILE_NAME));
    }
}
