//! # Integration Tests for coop-api
//!
//! Drives the full router with `oneshot`: generic CRUD for branch-scoped
//! entities, tenant isolation, bulk-delete atomicity, notifications,
//! profile settings, and the one-footstep-per-mutation rule.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use coop_api::auth::issue_token;
use coop_api::config::AppConfig;
use coop_api::footstep::{Footsteps, MemoryFootsteps};
use coop_api::state::AppState;
use coop_core::model::{Notification, NotificationType};
use coop_core::{BranchId, IdentityContext, OrganizationId, UserId};

/// App plus handles on its state and footstep log.
struct TestApp {
    app: axum::Router,
    state: AppState,
    footsteps: MemoryFootsteps,
    identity: IdentityContext,
}

impl TestApp {
    fn new() -> Self {
        let footsteps = MemoryFootsteps::new();
        let state = AppState::with_config(
            AppConfig::default(),
            Footsteps::new(footsteps.clone()),
            None,
        );
        Self {
            app: coop_api::app(state.clone()),
            state,
            footsteps,
            identity: identity(true),
        }
    }

    fn token(&self) -> String {
        issue_token(&self.identity, "test")
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, String) {
        send_as(&self.app, Some(&self.token()), method, uri, body).await
    }

    async fn create_bank(&self, name: &str) -> Value {
        let (status, body) = self
            .send(Method::POST, "/api/v1/bank", Some(json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        serde_json::from_str(&body).unwrap()
    }

    async fn create_user(&self) {
        self.state
            .users
            .create(coop_api::seed::demo_user(&self.identity, "password123"))
            .await
            .unwrap();
    }

    fn activities(&self) -> Vec<(String, String)> {
        self.footsteps
            .entries()
            .into_iter()
            .map(|f| (f.module, f.activity.as_tag()))
            .collect()
    }
}

fn identity(with_branch: bool) -> IdentityContext {
    IdentityContext::new(
        UserId::new(),
        OrganizationId::new(),
        with_branch.then(BranchId::new),
    )
}

async fn send_as(
    app: &axum::Router,
    token: Option<&str>,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_string(response).await)
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn error_message(body: &str) -> String {
    let value: Value = serde_json::from_str(body).unwrap();
    value["error"].as_str().unwrap().to_string()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let t = TestApp::new();
    let (status, body) = send_as(&t.app, None, Method::GET, "/health/liveness", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let t = TestApp::new();
    let (status, body) = send_as(&t.app, None, Method::GET, "/health/readiness", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ready");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let t = TestApp::new();
    let (status, body) = send_as(&t.app, None, Method::GET, "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Cooperative Backend API"));
}

// -- Generic CRUD -------------------------------------------------------------

#[tokio::test]
async fn test_create_bank_stamps_caller() {
    let t = TestApp::new();
    let (status, body) = t
        .send(
            Method::POST,
            "/api/v1/bank",
            Some(json!({"name": "Main Bank", "description": "HQ"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let bank: Value = serde_json::from_str(&body).unwrap();
    assert!(bank["id"].as_str().is_some());
    assert_eq!(bank["name"], "Main Bank");
    assert_eq!(bank["description"], "HQ");
    assert!(bank["created_at"].as_str().is_some());
    assert_eq!(bank["created_by_id"], t.identity.user_id.to_string());
    assert_eq!(bank["branch_id"], t.identity.branch_id.unwrap().to_string());

    assert_eq!(t.activities(), [("Bank".to_string(), "create-success".to_string())]);
}

#[tokio::test]
async fn test_get_after_create_returns_created_record() {
    let t = TestApp::new();
    let created = t.create_bank("Main Bank").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = t.send(Method::GET, &format!("/api/v1/bank/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), created);
}

#[tokio::test]
async fn test_update_restamps_and_audits() {
    let t = TestApp::new();
    let created = t.create_bank("Main Bank").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = t
        .send(
            Method::PUT,
            &format!("/api/v1/bank/{id}"),
            Some(json!({"name": "Main Bank (Downtown)"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let updated: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(updated["name"], "Main Bank (Downtown)");
    assert_eq!(updated["created_at"], created["created_at"]);
    assert_eq!(updated["updated_by_id"], t.identity.user_id.to_string());

    assert_eq!(t.activities()[1], ("Bank".to_string(), "update-success".to_string()));
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let t = TestApp::new();
    let created = t.create_bank("Main Bank").await;
    let uri = format!("/api/v1/bank/{}", created["id"].as_str().unwrap());

    let (status, body) = t.send(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, _) = t.send(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t.send(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(t.activities().last().unwrap().1, "delete-error");
}

#[tokio::test]
async fn test_invalid_payload_is_400_and_audited() {
    let t = TestApp::new();
    let (status, body) = t
        .send(Method::POST, "/api/v1/bank", Some(json!({"name": ""})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "name is required");
    assert_eq!(t.activities(), [("Bank".to_string(), "create-error".to_string())]);
    assert!(t.state.banks.is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_400_and_audited() {
    let t = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/collateral")
        .header("Authorization", format!("Bearer {}", t.token()))
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        t.activities(),
        [("Collateral".to_string(), "create-error".to_string())]
    );
}

#[tokio::test]
async fn test_reads_emit_no_footsteps() {
    let t = TestApp::new();
    let created = t.create_bank("Main Bank").await;
    let before = t.footsteps.len();

    t.send(Method::GET, "/api/v1/bank", None).await;
    t.send(Method::GET, "/api/v1/bank/search", None).await;
    t.send(
        Method::GET,
        &format!("/api/v1/bank/{}", created["id"].as_str().unwrap()),
        None,
    )
    .await;
    t.send(Method::GET, &format!("/api/v1/bank/{}", Uuid::new_v4()), None).await;

    assert_eq!(t.footsteps.len(), before);
}

#[tokio::test]
async fn test_every_entity_route_creates_with_its_module() {
    let t = TestApp::new();
    let cases = [
        ("collateral", json!({"name": "Land title"}), "Collateral"),
        ("funds", json!({"type": "Share Capital"}), "Funds"),
        ("member-type", json!({"name": "Regular", "prefix": "REG"}), "MemberType"),
        ("member-profile", json!({"first_name": "Ana", "last_name": "Cruz"}), "MemberProfile"),
        ("tag-template", json!({"name": "Deposit", "category": "transaction type"}), "TagTemplate"),
    ];
    let expected = cases.len();
    for (path, body, module) in cases {
        let (status, text) = t.send(Method::POST, &format!("/api/v1/{path}"), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{path}: {text}");
        assert_eq!(
            t.activities().last().unwrap(),
            &(module.to_string(), "create-success".to_string())
        );
    }
    assert_eq!(t.footsteps.len(), expected);
}

// -- Bulk Delete --------------------------------------------------------------

#[tokio::test]
async fn test_bulk_delete_empty_ids_is_400() {
    let t = TestApp::new();
    t.create_bank("A").await;

    let (status, body) = t
        .send(Method::DELETE, "/api/v1/bank/bulk-delete", Some(json!({"ids": []})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "ids must not be empty");
    assert_eq!(t.activities().last().unwrap().1, "bulk-delete-error");

    let (_, list) = t.send(Method::GET, "/api/v1/bank", None).await;
    assert_eq!(serde_json::from_str::<Vec<Value>>(&list).unwrap().len(), 1);
}

#[tokio::test]
async fn test_bulk_delete_duplicate_ids_is_400() {
    let t = TestApp::new();
    let bank = t.create_bank("A").await;
    let id = bank["id"].clone();

    let (status, _) = t
        .send(Method::DELETE, "/api/v1/bank/bulk-delete", Some(json!({"ids": [id, id]})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bulk_delete_with_unknown_id_removes_nothing() {
    let t = TestApp::new();
    let a = t.create_bank("A").await;
    let b = t.create_bank("B").await;

    let (status, _) = t
        .send(
            Method::DELETE,
            "/api/v1/bank/bulk-delete",
            Some(json!({"ids": [a["id"], Uuid::new_v4(), b["id"]]})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = t.send(Method::GET, "/api/v1/bank", None).await;
    assert_eq!(serde_json::from_str::<Vec<Value>>(&list).unwrap().len(), 2);
}

#[tokio::test]
async fn test_bulk_delete_removes_all() {
    let t = TestApp::new();
    let a = t.create_bank("A").await;
    let b = t.create_bank("B").await;

    let (status, _) = t
        .send(
            Method::DELETE,
            "/api/v1/bank/bulk-delete",
            Some(json!({"ids": [a["id"], b["id"]]})),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, list) = t.send(Method::GET, "/api/v1/bank", None).await;
    assert_eq!(list, "[]");
    assert_eq!(
        t.activities().last().unwrap(),
        &("Bank".to_string(), "bulk-delete-success".to_string())
    );
}

// -- Identity & Tenant Scope --------------------------------------------------

#[tokio::test]
async fn test_missing_token_is_401_and_audited() {
    let t = TestApp::new();
    let (status, body) = send_as(
        &t.app,
        None,
        Method::POST,
        "/api/v1/bank",
        Some(json!({"name": "Main Bank"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(error_message(&body).contains("missing"));

    let entries = t.footsteps.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].activity.as_tag(), "create-error");
    assert!(entries[0].user_id.is_none());
    assert!(t.state.banks.is_empty());
}

#[tokio::test]
async fn test_principal_without_branch_gets_400() {
    let t = TestApp::new();
    let token = issue_token(&identity(false), "test");

    let (status, body) = send_as(
        &t.app,
        Some(&token),
        Method::POST,
        "/api/v1/bank",
        Some(json!({"name": "Main Bank"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("not assigned to a branch"));
    assert!(t.state.banks.is_empty());

    let (status, _) = send_as(&t.app, Some(&token), Method::GET, "/api/v1/bank/search", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_other_branch_cannot_see_or_delete() {
    let t = TestApp::new();
    let bank = t.create_bank("Main Bank").await;
    let uri = format!("/api/v1/bank/{}", bank["id"].as_str().unwrap());

    let outsider = IdentityContext::new(
        UserId::new(),
        t.identity.organization_id,
        Some(BranchId::new()),
    );
    let token = issue_token(&outsider, "test");

    let (status, _) = send_as(&t.app, Some(&token), Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = send_as(&t.app, Some(&token), Method::GET, "/api/v1/bank", None).await;
    assert_eq!(list, "[]");

    let (status, _) = send_as(&t.app, Some(&token), Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t.send(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_unknown_id_is_404_and_audited_once() {
    let t = TestApp::new();
    let bank = t.create_bank("Main Bank").await;

    let (status, body) = t
        .send(
            Method::PUT,
            &format!("/api/v1/bank/{}", Uuid::new_v4()),
            Some(json!({"name": "Renamed"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

    let errors = t
        .activities()
        .into_iter()
        .filter(|(_, tag)| tag == "update-error")
        .count();
    assert_eq!(errors, 1);
    assert_eq!(t.footsteps.len(), 2);

    let (_, list) = t.send(Method::GET, "/api/v1/bank", None).await;
    let banks: Vec<Value> = serde_json::from_str(&list).unwrap();
    assert_eq!(banks, vec![bank]);
}

#[tokio::test]
async fn test_update_from_other_branch_is_404_and_leaves_record() {
    let t = TestApp::new();
    let bank = t.create_bank("Main Bank").await;
    let uri = format!("/api/v1/bank/{}", bank["id"].as_str().unwrap());

    let outsider = IdentityContext::new(
        UserId::new(),
        t.identity.organization_id,
        Some(BranchId::new()),
    );
    let token = issue_token(&outsider, "test");
    let (status, _) = send_as(
        &t.app,
        Some(&token),
        Method::PUT,
        &uri,
        Some(json!({"name": "Hijacked"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        t.activities().last().unwrap(),
        &("Bank".to_string(), "update-error".to_string())
    );
    assert_eq!(t.footsteps.len(), 2);

    let (status, body) = t.send(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), bank);
}

#[tokio::test]
async fn test_tenant_fields_in_payload_are_ignored() {
    let t = TestApp::new();
    let foreign_branch = Uuid::new_v4();
    let (status, body) = t
        .send(
            Method::POST,
            "/api/v1/bank",
            Some(json!({"name": "Main Bank", "branch_id": foreign_branch})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let bank: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(bank["branch_id"], t.identity.branch_id.unwrap().to_string());
}

// -- Search / Pagination ------------------------------------------------------

#[tokio::test]
async fn test_search_pages_and_filters() {
    let t = TestApp::new();
    for i in 0..12 {
        t.create_bank(&format!("bank {i}")).await;
    }

    let (status, body) = t
        .send(Method::GET, "/api/v1/bank/search?pageIndex=2&pageSize=5", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let page: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert_eq!(page["totalSize"], 12);
    assert_eq!(page["totalPage"], 3);
    assert_eq!(page["pageIndex"], 2);

    let (_, body) = t
        .send(Method::GET, "/api/v1/bank/search?search=BANK%201&sort=name:asc", None)
        .await;
    let page: Value = serde_json::from_str(&body).unwrap();
    let names: Vec<&str> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["bank 1", "bank 10", "bank 11"]);
}

#[tokio::test]
async fn test_search_rejects_oversized_page() {
    let t = TestApp::new();
    let (status, _) = t
        .send(Method::GET, "/api/v1/bank/search?pageSize=5000", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_sorts_date_like_names_as_text() {
    let t = TestApp::new();
    let names = [
        "2024-01-01T10:00:00+09:00",
        "2024-01-01T05:00:00Z",
        "2024-01-01T07",
    ];
    for name in names {
        t.create_bank(name).await;
    }

    let (status, body) = t
        .send(Method::GET, "/api/v1/bank/search?sort=name:asc", None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let page: Value = serde_json::from_str(&body).unwrap();
    let sorted: Vec<&str> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect();
    let mut expected = names.to_vec();
    expected.sort();
    assert_eq!(sorted, expected);
}

// -- References ---------------------------------------------------------------

#[tokio::test]
async fn test_member_asset_requires_profile_in_branch() {
    let t = TestApp::new();
    let (status, body) = t
        .send(
            Method::POST,
            "/api/v1/member-asset",
            Some(json!({"member_profile_id": Uuid::new_v4(), "name": "Farm lot", "cost": "1500.00"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("member_profile_id"));

    let (_, body) = t
        .send(
            Method::POST,
            "/api/v1/member-profile",
            Some(json!({"first_name": "Ana", "last_name": "Cruz"})),
        )
        .await;
    let profile: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(profile["full_name"], "Ana Cruz");
    let profile_id = profile["id"].as_str().unwrap();

    let (status, _) = t
        .send(
            Method::POST,
            "/api/v1/member-asset",
            Some(json!({"member_profile_id": profile_id, "name": "Farm lot", "cost": "1500.00"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = t
        .send(
            Method::GET,
            &format!("/api/v1/member-asset/member-profile/{profile_id}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let assets: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0]["cost"], "1500.00");
}

#[tokio::test]
async fn test_member_type_change_is_recorded() {
    let t = TestApp::new();
    let mut type_ids = Vec::new();
    for name in ["Regular", "Associate"] {
        let (status, body) = t
            .send(Method::POST, "/api/v1/member-type", Some(json!({"name": name})))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let created: Value = serde_json::from_str(&body).unwrap();
        type_ids.push(created["id"].as_str().unwrap().to_string());
    }

    let (status, body) = t
        .send(
            Method::POST,
            "/api/v1/member-profile",
            Some(json!({"first_name": "Ana", "last_name": "Cruz", "member_type_id": type_ids[0]})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let profile_id = serde_json::from_str::<Value>(&body).unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let profile_uri = format!("/api/v1/member-profile/{profile_id}");
    for _ in 0..2 {
        let (status, body) = t
            .send(
                Method::PUT,
                &profile_uri,
                Some(json!({"first_name": "Ana", "last_name": "Cruz", "member_type_id": type_ids[1]})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (status, body) = t.send(Method::GET, "/api/v1/member-type-history", None).await;
    assert_eq!(status, StatusCode::OK);
    let entries: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(entries.len(), 2);
    let mut recorded: Vec<&str> = entries
        .iter()
        .map(|e| e["member_type_id"].as_str().unwrap())
        .collect();
    recorded.sort();
    let mut expected: Vec<&str> = type_ids.iter().map(String::as_str).collect();
    expected.sort();
    assert_eq!(recorded, expected);

    let (status, body) = t
        .send(
            Method::GET,
            &format!("/api/v1/member-type-history/member-profile/{profile_id}/search"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let page: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(page["totalSize"], 2);
    assert!(page["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|e| e["member_profile_id"] == profile_id.as_str()));

    let (status, _) = t
        .send(
            Method::GET,
            &format!("/api/v1/member-type-history/member-profile/{}/search", Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// -- Notifications ------------------------------------------------------------

async fn notify(t: &TestApp, title: &str) -> Uuid {
    let n = Notification::new(t.identity.user_id, title, "", NotificationType::Info, Utc::now());
    t.state.notifications.create(n).await.unwrap().id
}

#[tokio::test]
async fn test_mark_viewed_twice_is_a_no_op() {
    let t = TestApp::new();
    let id = notify(&t, "Welcome").await;

    let (status, body) = t
        .send(Method::PUT, "/api/v1/notification/view", Some(json!({"ids": [id]})))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let first: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(first[0]["is_viewed"], true);

    let (status, body) = t
        .send(Method::PUT, "/api/v1/notification/view", Some(json!({"ids": [id]})))
        .await;
    assert_eq!(status, StatusCode::OK);
    let second: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(second[0]["is_viewed"], true);
    assert_eq!(second[0]["updated_at"], first[0]["updated_at"]);

    assert_eq!(
        t.activities(),
        [
            ("Notification".to_string(), "update-success".to_string()),
            ("Notification".to_string(), "update-success".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_mark_viewed_is_all_or_nothing() {
    let t = TestApp::new();
    let id = notify(&t, "Welcome").await;

    let (status, _) = t
        .send(
            Method::PUT,
            "/api/v1/notification/view",
            Some(json!({"ids": [id, Uuid::new_v4()]})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!t.state.notifications.get_by_id(id).unwrap().is_viewed);
    assert_eq!(t.activities().last().unwrap().1, "update-error");
}

#[tokio::test]
async fn test_view_all_and_unviewed_count() {
    let t = TestApp::new();
    for title in ["a", "b", "c"] {
        notify(&t, title).await;
    }
    // someone else's notification is untouched
    let other = Notification::new(UserId::new(), "x", "", NotificationType::Alert, Utc::now());
    let other_id = t.state.notifications.create(other).await.unwrap().id;

    let (_, body) = t.send(Method::GET, "/api/v1/notification/me/unviewed-count", None).await;
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["count"], 3);

    let (status, body) = t.send(Method::PUT, "/api/v1/notification/view-all", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Vec<Value>>(&body).unwrap().len(), 3);

    let (_, body) = t.send(Method::GET, "/api/v1/notification/me/unviewed-count", None).await;
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["count"], 0);
    assert!(!t.state.notifications.get_by_id(other_id).unwrap().is_viewed);
    assert_eq!(t.footsteps.len(), 1);
}

#[tokio::test]
async fn test_view_all_skips_deleted_notifications() {
    let t = TestApp::new();
    let kept = notify(&t, "kept").await;
    let removed = notify(&t, "removed").await;

    let (status, _) = t
        .send(Method::DELETE, &format!("/api/v1/notification/{removed}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = t.send(Method::PUT, "/api/v1/notification/view-all", None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let viewed: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(viewed.len(), 1);
    assert_eq!(viewed[0]["id"], kept.to_string());
    assert_eq!(t.activities().last().unwrap().1, "update-success");
}

#[tokio::test]
async fn test_notifications_of_others_are_hidden() {
    let t = TestApp::new();
    let other = Notification::new(UserId::new(), "x", "", NotificationType::Alert, Utc::now());
    let id = t.state.notifications.create(other).await.unwrap().id;

    let (status, _) = t
        .send(Method::GET, &format!("/api/v1/notification/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t
        .send(Method::DELETE, &format!("/api/v1/notification/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(t.state.notifications.get_by_id(id).is_ok());
}

// -- Profile ------------------------------------------------------------------

#[tokio::test]
async fn test_same_profile_picture_is_400_without_write() {
    let t = TestApp::new();
    t.create_user().await;
    let media_id = Uuid::new_v4();

    let (status, _) = t
        .send(
            Method::PUT,
            "/api/v1/profile/profile-picture",
            Some(json!({"media_id": media_id})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let before = t
        .state
        .users
        .get_by_id(t.identity.user_id.into_uuid())
        .unwrap();

    let (status, body) = t
        .send(
            Method::PUT,
            "/api/v1/profile/profile-picture",
            Some(json!({"media_id": media_id})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "media_id is unchanged");

    let after = t
        .state
        .users
        .get_by_id(t.identity.user_id.into_uuid())
        .unwrap();
    assert_eq!(after, before);
    assert_eq!(
        t.activities(),
        [
            ("User".to_string(), "update-success".to_string()),
            ("User".to_string(), "update-error".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_change_password_flow() {
    let t = TestApp::new();
    t.create_user().await;

    let (status, body) = t
        .send(
            Method::PUT,
            "/api/v1/profile/password",
            Some(json!({
                "old_password": "wrong-password",
                "new_password": "newpassword1",
                "confirm_password": "newpassword1"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(&body), "Invalid credentials");

    let (status, body) = t
        .send(
            Method::PUT,
            "/api/v1/profile/password",
            Some(json!({
                "old_password": "password123",
                "new_password": "newpassword1",
                "confirm_password": "newpassword1"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(!body.contains("pbkdf2-sha256$"));

    let cached = t.state.sessions.get(t.identity.user_id).unwrap();
    assert!(cached.password.verify("newpassword1").unwrap());
    assert!(!cached.password.verify("password123").unwrap());
}

#[tokio::test]
async fn test_password_confirmation_mismatch_is_400() {
    let t = TestApp::new();
    t.create_user().await;
    let (status, _) = t
        .send(
            Method::PUT,
            "/api/v1/profile/password",
            Some(json!({
                "old_password": "password123",
                "new_password": "newpassword1",
                "confirm_password": "newpassword2"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_general_settings_reset_verification() {
    let t = TestApp::new();
    t.create_user().await;

    let (status, body) = t
        .send(
            Method::PUT,
            "/api/v1/profile/general",
            Some(json!({
                "user_name": "demo",
                "email": "new@coop.local",
                "contact_number": "09170000000",
                "description": "Treasurer"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let user: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(user["email"], "new@coop.local");
    assert_eq!(user["is_email_verified"], false);
    assert_eq!(user["is_contact_verified"], true);

    let (_, body) = t.send(Method::GET, "/api/v1/profile", None).await;
    let profile: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(profile["description"], "Treasurer");
}

#[tokio::test]
async fn test_profile_of_unknown_user_is_401() {
    let t = TestApp::new();
    let (status, _) = t.send(Method::GET, "/api/v1/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_lookup_is_organization_scoped() {
    let t = TestApp::new();
    t.create_user().await;
    let uri = format!("/api/v1/user/{}", t.identity.user_id);

    let (status, _) = t.send(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let stranger = issue_token(&identity(true), "test");
    let (status, _) = send_as(&t.app, Some(&stranger), Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
