use serde_json::{json, Value};
use wt_gateway::{serve, Gateway, GatewayConfig};

async fn start(config: GatewayConfig) -> Gateway {
    serve(GatewayConfig { port: 0, ..config }).await.unwrap()
}

fn body(style: &str) -> Value {
    json!({
        "imageUrl": "https://cdn.example.com/photos/cat.jpg",
        "style": style,
        "photoId": "photo-1",
        "aspectRatio": "2:3",
        "watermark": true,
        "quality": "medium",
        "isAuthenticated": false,
    })
}

async fn submit(gateway: &Gateway, body: &Value, key: Option<&str>) -> reqwest::Response {
    let mut request = reqwest::Client::new()
        .post(format!("{}/generate-style-preview", gateway.base_url()))
        .json(body);
    if let Some(key) = key {
        request = request.header("Idempotency-Key", key);
    }
    request.send().await.unwrap()
}

async fn status(gateway: &Gateway, request_id: &str) -> reqwest::Response {
    reqwest::Client::new()
        .get(format!("{}/generate-style-preview/status", gateway.base_url()))
        .query(&[("requestId", request_id)])
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_job_progresses_through_statuses() {
    let gateway = start(GatewayConfig { polls_to_complete: 2, ..Default::default() }).await;

    let submitted: Value = submit(&gateway, &body("watercolor-dreams"), None).await.json().await.unwrap();
    let request_id = submitted["requestId"].as_str().unwrap().to_string();
    assert!(submitted.get("preview_url").is_none());

    let first: Value = status(&gateway, &request_id).await.json().await.unwrap();
    assert_eq!(first["status"], "processing");
    assert!(first.get("preview_url").is_none());

    let second: Value = status(&gateway, &request_id).await.json().await.unwrap();
    assert_eq!(second["status"], "succeeded");
    let url = second["preview_url"].as_str().unwrap();
    assert_eq!(url, format!("{}/previews/{}.png", gateway.base_url(), request_id));

    // finished jobs keep answering the same snapshot
    let third: Value = status(&gateway, &request_id).await.json().await.unwrap();
    assert_eq!(third, second);
}

#[tokio::test]
async fn test_missing_fields_are_bad_requests() {
    let gateway = start(GatewayConfig::default()).await;

    let response = submit(&gateway, &json!({ "style": "neon-splash" }), None).await;
    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["error"], "imageUrl is required");

    let mut bad_ratio = body("neon-splash");
    bad_ratio["aspectRatio"] = json!("16:9");
    let response = submit(&gateway, &bad_ratio, None).await;
    assert_eq!(response.status(), 400);

    let mut bad_quality = body("neon-splash");
    bad_quality["quality"] = json!("ultra");
    let response = submit(&gateway, &bad_quality, None).await;
    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert!(error["error"].as_str().unwrap().contains("ultra"));
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let gateway = start(GatewayConfig::default()).await;

    assert_eq!(status(&gateway, "nope").await.status(), 404);

    let image = reqwest::get(format!("{}/previews/nope.png", gateway.base_url())).await.unwrap();
    assert_eq!(image.status(), 404);
}

#[tokio::test]
async fn test_idempotency_key_reuses_pending_job() {
    let gateway = start(GatewayConfig::default()).await;

    let first: Value = submit(&gateway, &body("pastel-bliss"), Some("pastel-bliss-1-1")).await.json().await.unwrap();
    let again: Value = submit(&gateway, &body("pastel-bliss"), Some("pastel-bliss-1-1")).await.json().await.unwrap();
    let other: Value = submit(&gateway, &body("pastel-bliss"), Some("pastel-bliss-1-2")).await.json().await.unwrap();

    assert_eq!(first["requestId"], again["requestId"]);
    assert_ne!(first["requestId"], other["requestId"]);
    assert_eq!(gateway.state().jobs.get_active_jobs().await.len(), 2);
}

#[tokio::test]
async fn test_concurrent_same_key_submissions_share_one_job() {
    let gateway = start(GatewayConfig::default()).await;
    let body = body("gemstone-poly");

    let responses = futures::future::join_all(
        (0..32).map(|_| submit(&gateway, &body, Some("gemstone-poly-1-1"))),
    )
    .await;

    let mut ids = Vec::new();
    for response in responses {
        let submitted: Value = response.json().await.unwrap();
        ids.push(submitted["requestId"].as_str().unwrap().to_string());
    }
    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(gateway.state().jobs.get_active_jobs().await.len(), 1);
}

#[tokio::test]
async fn test_failed_sync_render_does_not_leave_queued_job() {
    let gateway = start(GatewayConfig { sync_responses: true, ..Default::default() }).await;
    gateway.state().watermark.shutdown();

    let response = submit(&gateway, &body("pop-art-burst"), Some("pop-art-burst-1-1")).await;
    assert_eq!(response.status(), 503);
    assert!(gateway.state().jobs.get_active_jobs().await.is_empty());

    // the key now names a failed job, which polling reports as such
    let again: Value = submit(&gateway, &body("pop-art-burst"), Some("pop-art-burst-1-1")).await.json().await.unwrap();
    let request_id = again["requestId"].as_str().unwrap();
    let snapshot: Value = status(&gateway, request_id).await.json().await.unwrap();
    assert_eq!(snapshot["status"], "failed");
}

#[tokio::test]
async fn test_bearer_token_is_accepted() {
    let gateway = start(GatewayConfig { api_key: Some("secret".into()), ..Default::default() }).await;

    let anonymous = submit(&gateway, &body("neon-splash"), None).await;
    assert_eq!(anonymous.status(), 401);

    let response = reqwest::Client::new()
        .post(format!("{}/generate-style-preview", gateway.base_url()))
        .bearer_auth("secret")
        .json(&body("neon-splash"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_sync_mode_answers_with_url() {
    let gateway = start(GatewayConfig { sync_responses: true, ..Default::default() }).await;

    let submitted: Value = submit(&gateway, &body("classic-oil-painting"), None).await.json().await.unwrap();

    assert!(submitted.get("requestId").is_none());
    assert_eq!(submitted["isAuthenticated"], false);
    let url = submitted["preview_url"].as_str().unwrap();
    let image = reqwest::get(url).await.unwrap();
    assert_eq!(image.status(), 200);
    assert!(gateway.state().watermark.is_started());
}

#[tokio::test]
async fn test_sync_mode_still_polls_failing_styles() {
    let gateway = start(GatewayConfig {
        sync_responses: true,
        polls_to_complete: 1,
        failing_styles: vec!["neon-splash".into()],
        ..Default::default()
    })
    .await;

    let submitted: Value = submit(&gateway, &body("neon-splash"), None).await.json().await.unwrap();
    let request_id = submitted["requestId"].as_str().unwrap();

    let snapshot: Value = status(&gateway, request_id).await.json().await.unwrap();
    assert_eq!(snapshot["status"], "failed");
    assert_eq!(snapshot["error"], "model overloaded");
}
