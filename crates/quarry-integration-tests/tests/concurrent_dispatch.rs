//! Concurrent dispatch through the HTTP surface: for any number of
//! simultaneous scans of the same tag, exactly one request succeeds and
//! the rest are told the block is already gone.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use quarry_api::state::{AppConfig, AppState};

const BOUNDARY: &str = "quarry-race-boundary";

fn test_app() -> (tempfile::TempDir, axum::Router) {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        port: 8080,
        auth_token: None,
        blob_root: dir.path().to_path_buf(),
    };
    let state = AppState::with_config(config, None);
    (dir, quarry_api::app(state))
}

fn multipart_registration() -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in [
        ("name", "Raced Granite"),
        ("dimensions", "2x1x1 m"),
        ("category", "black"),
        ("subcategory", "granite"),
        ("price", "99"),
        ("price_unit", "per ton"),
        ("stock_availability", "In Stock"),
    ] {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"image\"; filename=\"b.png\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(b"photo");
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/v1/blocks")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn dispatch_request(token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/blocks/dispatch")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&serde_json::json!({ "token": token })).unwrap(),
        ))
        .unwrap()
}

#[tokio::test]
async fn exactly_one_of_many_concurrent_dispatches_succeeds() {
    let (_dir, app) = test_app();

    let response = app.clone().oneshot(multipart_registration()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let registered: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let token = registered["token"].as_str().unwrap().to_string();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let app = app.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            app.oneshot(dispatch_request(&token)).await.unwrap().status()
        }));
    }

    let mut ok = 0;
    let mut conflict = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::OK => ok += 1,
            StatusCode::CONFLICT => conflict += 1,
            other => panic!("unexpected status during dispatch race: {other}"),
        }
    }

    assert_eq!(ok, 1, "exactly one dispatch must win");
    assert_eq!(conflict, 15, "every loser must see ALREADY_DISPATCHED");
}

#[tokio::test]
async fn winner_and_losers_agree_on_final_state() {
    let (_dir, app) = test_app();

    let response = app.clone().oneshot(multipart_registration()).await.unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let registered: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let token = registered["token"].as_str().unwrap().to_string();

    let first = app.clone().oneshot(dispatch_request(&token)).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let second = app.clone().oneshot(dispatch_request(&token)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let lookup = app
        .oneshot(
            Request::builder()
                .uri(format!("/v1/blocks/token/{token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = lookup.into_body().collect().await.unwrap().to_bytes();
    let block: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(block["status"], "Dispatched");
    assert_eq!(block["stock_availability"], "Out of Stock");
}
