//! Customer segmentation and branch visibility through the HTTP API.

use axum::Router;
use axum::body::{Body, to_bytes};
use http::{Request, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use pos_server::api;
use pos_server::core::{Config, ServerState};
use pos_server::db::DbService;
use pos_server::dispatch::{DispatchService, NoopCommunicationLog};
use shared::util::DAY_MS;

async fn test_app() -> Router {
    let db = DbService::in_memory().await.unwrap();
    let dispatch = DispatchService::new(
        db.pool.clone(),
        None,
        None,
        Arc::new(NoopCommunicationLog),
        shared::models::DispatchConfig::default(),
    );
    let switcher = Arc::new(pos_server::branches::BranchSwitcher::new(
        db.pool.clone(),
        Arc::new(pos_server::branches::NoopSyncHook),
    ));
    let state = ServerState {
        config: Config::from_env(),
        db,
        dispatch,
        switcher,
    };
    api::build_app(state)
}

async fn send(app: &Router, method: &str, uri: &str, role: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", "tester-1")
        .header("x-role", role);
    let request = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            builder.body(Body::from(json.to_string())).unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn create_defaults_to_new_and_active() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/customers",
        "staff",
        Some(json!({ "name": "Asha Mrema" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["color_tag"], "new");
    assert_eq!(body["is_active"], true);
}

#[tokio::test]
async fn creation_activity_uses_the_365_day_window() {
    let app = test_app().await;
    let now = shared::util::now_millis();

    // 11 months ago: outside 90 days but still "active" at creation
    let (_, recent) = send(
        &app,
        "POST",
        "/api/customers",
        "staff",
        Some(json!({ "name": "Recent", "last_visit": now - 330 * DAY_MS })),
    )
    .await;
    assert_eq!(recent["is_active"], true);

    let (_, stale) = send(
        &app,
        "POST",
        "/api/customers",
        "staff",
        Some(json!({ "name": "Stale", "last_visit": now - 400 * DAY_MS })),
    )
    .await;
    assert_eq!(stale["is_active"], false);

    let (status, inactive) = send(&app, "GET", "/api/customers/inactive", "staff", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = inactive
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Stale"]);
}

#[tokio::test]
async fn complaint_note_marks_complainer() {
    let app = test_app().await;
    let (_, customer) = send(
        &app,
        "POST",
        "/api/customers",
        "staff",
        Some(json!({ "name": "Juma" })),
    )
    .await;
    let id = customer["id"].as_i64().unwrap();

    let (status, detail) = send(
        &app,
        "POST",
        &format!("/api/customers/{id}/notes"),
        "staff",
        Some(json!({ "content": "Customer COMPLAINED about a late repair" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["color_tag"], "complainer");
}

#[tokio::test]
async fn ten_check_ins_reach_vip_and_a_complaint_overrides() {
    let app = test_app().await;
    let (_, customer) = send(
        &app,
        "POST",
        "/api/customers",
        "staff",
        Some(json!({ "name": "Neema" })),
    )
    .await;
    let id = customer["id"].as_i64().unwrap();
    let notes_uri = format!("/api/customers/{id}/notes");

    for i in 0..9 {
        let (_, detail) = send(
            &app,
            "POST",
            &notes_uri,
            "staff",
            Some(json!({ "content": format!("Checked in at till {i}") })),
        )
        .await;
        assert_eq!(detail["color_tag"], "new", "not VIP at {} check-ins", i + 1);
    }

    let (_, detail) = send(
        &app,
        "POST",
        &notes_uri,
        "staff",
        Some(json!({ "content": "Checked in at till 9" })),
    )
    .await;
    assert_eq!(detail["color_tag"], "vip");

    let (_, detail) = send(
        &app,
        "POST",
        &notes_uri,
        "staff",
        Some(json!({ "content": "Filed a complaint about pricing" })),
    )
    .await;
    assert_eq!(detail["color_tag"], "complainer");
}

#[tokio::test]
async fn update_drops_activity_outside_90_days() {
    let app = test_app().await;
    let now = shared::util::now_millis();
    let (_, customer) = send(
        &app,
        "POST",
        "/api/customers",
        "staff",
        Some(json!({ "name": "Omari", "last_visit": now })),
    )
    .await;
    let id = customer["id"].as_i64().unwrap();
    assert_eq!(customer["is_active"], true);

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/customers/{id}"),
        "staff",
        Some(json!({ "last_visit": now - 100 * DAY_MS })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["is_active"], false);
    // The tag is untouched when there are no notes
    assert_eq!(updated["color_tag"], "new");
}

#[tokio::test]
async fn isolated_branch_hides_other_branches_customers() {
    let app = test_app().await;

    let (_, branch_a) = send(
        &app,
        "POST",
        "/api/branches",
        "admin",
        Some(json!({ "name": "Kariakoo", "data_isolation_mode": "isolated" })),
    )
    .await;
    let (_, branch_b) = send(
        &app,
        "POST",
        "/api/branches",
        "admin",
        Some(json!({ "name": "Mbezi" })),
    )
    .await;
    let a = branch_a["id"].as_i64().unwrap();
    let b = branch_b["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/branches/{a}/switch"),
        "admin",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    send(
        &app,
        "POST",
        "/api/customers",
        "staff",
        Some(json!({ "name": "Local", "branch_id": a })),
    )
    .await;
    send(
        &app,
        "POST",
        "/api/customers",
        "staff",
        Some(json!({ "name": "Foreign", "branch_id": b })),
    )
    .await;
    send(
        &app,
        "POST",
        "/api/customers",
        "staff",
        Some(json!({ "name": "SharedRow", "branch_id": b, "is_shared": true })),
    )
    .await;

    let (_, listed) = send(&app, "GET", "/api/customers", "staff", None).await;
    let mut names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Local", "SharedRow"]);
}

#[tokio::test]
async fn missing_identity_header_is_rejected() {
    let app = test_app().await;
    let request = Request::builder()
        .method("GET")
        .uri("/api/customers")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_validates_the_payload() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/customers",
        "staff",
        Some(json!({ "name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");
}
