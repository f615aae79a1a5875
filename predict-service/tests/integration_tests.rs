//! Integration tests for predict-service
//!
//! Drives the full router in-process with `tower::ServiceExt::oneshot`, using
//! the sample pipeline shipped at the workspace root.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use ml_pipeline::Pipeline;
use predict_service::{router, AppState, ServiceConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "----predict-test-boundary";

const SAMPLE_CSV: &str = "\
bmi,phys_health,high_blood_pressure,high_cholesterol,smoker,stroke,heart_disease_or_attack,physical_activity,fruits,veggies,heavy_alcohol_consumption,gen_health,sex,age,income
25.0,5,0,0,0,0,0,0,0,0,0,Good,Female,35,4
45.0,30,1,1,0,0,0,0,0,0,0,Poor,Male,75,1
22.4,0,0,0,1,0,0,1,1,1,0,Very Good,Female,28,7
";

const TYPICAL_PATIENT_FORM: &str = "bmi=25.0&phys_health=5&high_blood_pressure=0&high_cholesterol=0\
&smoker=0&stroke=0&heart_disease_or_attack=0&physical_activity=0&fruits=0&veggies=0\
&heavy_alcohol_consumption=0&gen_health=Good&sex=Female&age=35&income=4";

fn workspace_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join(name)
}

fn app() -> Router {
    let pipeline = Pipeline::from_path(workspace_file("diabetes_pipeline.json")).unwrap();
    router(AppState::new(Arc::new(pipeline), &ServiceConfig::default()))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<(String, String)>, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn multipart_upload(file_name: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::post("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

/// Pull the session id out of the predict form action in an upload page.
fn session_id(page: &str) -> String {
    let start = page.find("/upload/").unwrap() + "/upload/".len();
    let end = start + page[start..].find('/').unwrap();
    page[start..end].to_string()
}

#[cfg(test)]
mod operational {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, _, body) = send(&app(), Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_ready_endpoint() {
        let (status, _, body) = send(&app(), Request::get("/ready").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["model"], "Logistic Regression");
        assert_eq!(json["sessions"], 0);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_responds() {
        let (status, _, _) = send(&app(), Request::get("/metrics").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_record_predictions() {
        predict_service::metrics::init_metrics().unwrap();
        predict_service::metrics::init_metrics().unwrap();

        let app = app();
        let request = Request::post("/manual/predict")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(TYPICAL_PATIENT_FORM))
            .unwrap();
        let (status, _, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, body) = send(&app, Request::get("/metrics").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("predict_requests_total"));
        assert!(body.contains("mode=\"manual\""));
    }
}

#[cfg(test)]
mod manual_mode {
    use super::*;

    #[tokio::test]
    async fn test_index_defaults_to_manual_form() {
        let (status, _, body) = send(&app(), Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Enter patient information:"));
        assert!(body.contains(r#"action="/manual/predict""#));
        assert!(!body.contains("Upload your dataset"));
    }

    #[tokio::test]
    async fn test_manual_form_prediction() {
        let app = app();
        let request = || {
            Request::post("/manual/predict")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(TYPICAL_PATIENT_FORM))
                .unwrap()
        };

        let (status, _, body) = send(&app, request()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Prediction: Non-Diabetic"));

        let line = body
            .split("Probability of Diabetes: ")
            .nth(1)
            .and_then(|rest| rest.split('<').next())
            .unwrap();
        assert!(line.ends_with('%'));
        let pct: f64 = line.trim_end_matches('%').parse().unwrap();
        assert!((0.0..=100.0).contains(&pct));
        assert_eq!(line.split('.').nth(1).map(str::len), Some(3)); // "dd%"

        // Same input, same page
        let (_, _, again) = send(&app, request()).await;
        assert_eq!(body, again);
    }

    #[tokio::test]
    async fn test_form_out_of_range_rejected() {
        let form = TYPICAL_PATIENT_FORM.replace("age=35", "age=95");
        let request = Request::post("/manual/predict")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap();
        let (status, _, body) = send(&app(), request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("age must be between 18 and 80"));
    }

    #[tokio::test]
    async fn test_api_predict() {
        let record = serde_json::json!({
            "bmi": 45.0, "phys_health": 30, "high_blood_pressure": 1,
            "high_cholesterol": 1, "smoker": 0, "stroke": 0,
            "heart_disease_or_attack": 0, "physical_activity": 0,
            "fruits": 0, "veggies": 0, "heavy_alcohol_consumption": 0,
            "gen_health": "Poor", "sex": "Male", "age": 75, "income": 1
        });
        let request = Request::post("/api/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(record.to_string()))
            .unwrap();

        let (status, _, body) = send(&app(), request).await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["label"], "Diabetic");
        assert_eq!(json["class"], 1);
        let p = json["probability"].as_f64().unwrap();
        assert!(p > 0.5 && p <= 1.0);
        assert!(json["probability_display"].as_str().unwrap().ends_with('%'));
    }
}

#[cfg(test)]
mod upload_mode {
    use super::*;

    #[tokio::test]
    async fn test_upload_page_has_no_predict_control() {
        let (status, _, body) =
            send(&app(), Request::get("/?mode=upload").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Upload your dataset (CSV format)"));
        assert!(!body.contains("Predict for Uploaded Data"));
    }

    #[tokio::test]
    async fn test_upload_predict_download() {
        let app = app();

        let (status, _, page) = send(&app, multipart_upload("patients.csv", SAMPLE_CSV)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(page.contains("Preview of uploaded data"));
        assert!(page.contains("Predict for Uploaded Data"));
        let id = session_id(&page);

        // Download is not offered before predicting
        let (status, _, _) = send(
            &app,
            Request::get(format!("/upload/{id}/download")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, page) = send(&app, post_empty(&format!("/upload/{id}/predict"))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(page.contains("Predictions complete"));
        assert!(page.contains("Download Predictions"));

        let (status, headers, csv) = send(
            &app,
            Request::get(format!("/upload/{id}/download")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(header_value(&headers, "content-type"), Some("text/csv; charset=utf-8"));
        assert!(header_value(&headers, "content-disposition")
            .unwrap()
            .contains("diabetes_predictions.csv"));

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4, "header + 3 data rows");

        let original: Vec<&str> = SAMPLE_CSV.lines().collect();
        assert_eq!(lines[0], format!("{},Prediction", original[0]));
        let expected = ["Non-Diabetic", "Diabetic", "Non-Diabetic"];
        for (i, label) in expected.iter().enumerate() {
            assert_eq!(lines[i + 1], format!("{},{label}", original[i + 1]));
        }
    }

    #[tokio::test]
    async fn test_predict_without_upload_is_not_found() {
        let uri = format!("/upload/{}/predict", uuid::Uuid::new_v4());
        let (status, _, body) = send(&app(), post_empty(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("no uploaded file"));
    }

    #[tokio::test]
    async fn test_upload_rejects_other_extensions() {
        let (status, _, body) = send(&app(), multipart_upload("patients.xlsx", SAMPLE_CSV)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("not a .csv file"));
    }

    #[tokio::test]
    async fn test_schema_mismatch_surfaces_pipeline_error() {
        let app = app();
        let (status, _, page) =
            send(&app, multipart_upload("other.csv", "height,weight\n180,75\n")).await;
        assert_eq!(status, StatusCode::OK);
        let id = session_id(&page);

        let (status, _, body) = send(&app, post_empty(&format!("/upload/{id}/predict"))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("missing column"));
    }

    #[tokio::test]
    async fn test_api_batch_round_trip() {
        let request = Request::post("/api/predict/batch")
            .header(header::CONTENT_TYPE, "text/csv")
            .body(Body::from(SAMPLE_CSV))
            .unwrap();
        let (status, _, csv) = send(&app(), request).await;
        assert_eq!(status, StatusCode::OK);

        let table = predict_core::FeatureTable::from_csv_bytes(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        let idx = table.column_index("Prediction").unwrap();
        assert_eq!(idx, predict_core::FEATURE_COLUMNS.len());
        for row in table.rows() {
            assert!(row[idx] == "Diabetic" || row[idx] == "Non-Diabetic");
        }
    }

    #[tokio::test]
    async fn test_api_batch_empty_body() {
        let request = Request::post("/api/predict/batch").body(Body::empty()).unwrap();
        let (status, _, body) = send(&app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("\"ok\":false"));
    }
}

/// Without a pipeline file the service never starts.
#[test]
fn test_missing_pipeline_is_fatal_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_predict-service"))
        .env("PIPELINE_PATH", dir.path().join("diabetes_pipeline.json"))
        .env("PREDICT_BIND_ADDR", "127.0.0.1:0")
        .env("RUST_LOG", "off")
        .output()
        .unwrap();
    assert!(!output.status.success());
}
