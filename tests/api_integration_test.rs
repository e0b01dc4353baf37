// API integration tests that verify HTTP endpoints
// Tests the actual Axum router with multipart uploads built by hand

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{sample_calendar_bytes, setup_test_db};
use cycle_calendar_service::api::{create_router, AppState};
use cycle_calendar_service::db::{create_pool, CalendarRepository};
use cycle_calendar_service::services::CalendarService;
use http_body_util::BodyExt; // For `.collect()`
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt; // For `oneshot`

const BOUNDARY: &str = "----calendar-test-boundary";

async fn test_router() -> Router {
    router_for(setup_test_db().await)
}

fn router_for(pool: SqlitePool) -> Router {
    create_router(AppState {
        calendar_service: CalendarService::new(CalendarRepository::new(pool)),
        default_uploader: "Admin".to_string(),
        max_upload_bytes: 10 * 1024 * 1024,
    })
}

/// Multipart body with text fields and an optional file part
fn multipart_body(fields: &[(&str, &str)], file: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"calendar.xlsx\"\r\n\
                 Content-Type: application/vnd.openxmlformats-officedocument.spreadsheetml.sheet\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(fields: &[(&str, &str)], file: Option<&[u8]>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields, file)))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_router().await;
    let (status, json) = send(&app, get_request("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_upload_then_fetch_calendar() {
    let app = test_router().await;
    let bytes = sample_calendar_bytes();

    let (status, json) = send(
        &app,
        upload_request(&[("clientName", "PHT"), ("uploadedBy", "jdoe")], Some(&bytes)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "unexpected body: {json}");
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Processed successfully");
    let header_id = json["headerId"].as_i64().expect("headerId should be a number");

    let (status, json) = send(&app, get_request("/api/calendars")).await;
    assert_eq!(status, StatusCode::OK);
    let headers = json.as_array().unwrap();
    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0]["clientName"], "PHT");
    assert_eq!(headers[0]["year"], 2024);
    assert_eq!(headers[0]["cycles"], 2);
    assert_eq!(headers[0]["uploadedBy"], "jdoe");
    assert!(headers[0]["cycleCode"]
        .as_str()
        .unwrap()
        .starts_with("PHT_2024_"));

    let (status, json) = send(&app, get_request(&format!("/api/calendars/{header_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["headerId"], header_id);
    let details = json["details"].as_array().unwrap();
    assert_eq!(details.len(), 4);
    assert_eq!(details[0]["mcpDate"], "2024-01-05");
    assert_eq!(details[0]["type"], "R");
    assert_eq!(details[0]["plotFlag"], true);
    assert_eq!(details[0]["modifiedBy"], "jdoe");
}

#[tokio::test]
async fn test_default_uploader_applied() {
    let app = test_router().await;
    let bytes = sample_calendar_bytes();

    let (status, _) = send(&app, upload_request(&[("clientName", "PHT")], Some(&bytes))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, get_request("/api/calendars")).await;
    assert_eq!(json[0]["uploadedBy"], "Admin");
}

#[tokio::test]
async fn test_duplicate_upload_requires_overwrite() {
    let app = test_router().await;
    let bytes = sample_calendar_bytes();

    let (status, first) = send(&app, upload_request(&[("clientName", "PHT")], Some(&bytes))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, upload_request(&[("clientName", "PHT")], Some(&bytes))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "Calendar for PHT in 2024 already exists.");
    assert_eq!(json["requiresOverwrite"], true);

    let (status, second) = send(
        &app,
        upload_request(&[("clientName", "PHT"), ("overwrite", "true")], Some(&bytes)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(first["headerId"], second["headerId"]);

    let (_, json) = send(&app, get_request("/api/calendars")).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["headerId"], second["headerId"]);

    let old_uri = format!("/api/calendars/{}", first["headerId"]);
    let (status, _) = send(&app, get_request(&old_uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_missing_client_name() {
    let app = test_router().await;
    let bytes = sample_calendar_bytes();

    let (status, json) = send(&app, upload_request(&[], Some(&bytes))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "File and Client Name are required");
}

#[tokio::test]
async fn test_upload_missing_file() {
    let app = test_router().await;

    let (status, json) = send(&app, upload_request(&[("clientName", "PHT")], None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "File and Client Name are required");
}

#[tokio::test]
async fn test_upload_unrecognized_layout() {
    let app = test_router().await;
    let bytes = common::xlsx_bytes(&[(
        "Sheet1",
        vec![vec![common::Text("Name"), common::Text("Amount")]],
    )]);

    let (status, json) = send(&app, upload_request(&[("clientName", "PHT")], Some(&bytes))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"],
        "Invalid format: Could not find headers (Cycle, Cycle Date, Type)."
    );
    assert!(json.get("requiresOverwrite").is_none());
}

#[tokio::test]
async fn test_calendar_not_found() {
    let app = test_router().await;
    let (status, json) = send(&app, get_request("/api/calendars/999")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Calendar not found");
}

#[tokio::test]
async fn test_list_empty() {
    let app = test_router().await;
    let (status, json) = send(&app, get_request("/api/calendars")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, Value::Array(vec![]));
}

#[tokio::test]
async fn test_calendars_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let database_url = format!("sqlite://{}", dir.path().join("calendars.db").display());
    let bytes = sample_calendar_bytes();

    let pool = create_pool(&database_url, 2).await.unwrap();
    let app = router_for(pool.clone());
    let (status, first) = send(&app, upload_request(&[("clientName", "PHT")], Some(&bytes))).await;
    assert_eq!(status, StatusCode::OK);
    pool.close().await;

    // Fresh pool and router over the same file, as on service startup
    let pool = create_pool(&database_url, 2).await.unwrap();
    let app = router_for(pool);

    let (status, json) = send(&app, get_request("/api/calendars")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["headerId"], first["headerId"]);

    let (status, json) = send(&app, upload_request(&[("clientName", "PHT")], Some(&bytes))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["requiresOverwrite"], true);

    let uri = format!("/api/calendars/{}", first["headerId"]);
    let (status, json) = send(&app, get_request(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["details"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_upload_ignores_undecodable_extra_sheet() {
    let app = test_router().await;
    let bytes = common::xlsx_bytes(&[
        ("Notes", vec![vec![common::Text("Prepared by billing")]]),
        ("Cycle Calendar", common::sample_calendar_rows()),
    ]);
    let bytes = common::corrupt_worksheet(&bytes, 1);

    let (status, json) = send(&app, upload_request(&[("clientName", "PHT")], Some(&bytes))).await;
    assert_eq!(status, StatusCode::OK, "unexpected body: {json}");
}
