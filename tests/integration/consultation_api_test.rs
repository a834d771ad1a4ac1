use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use consultation_gateway::{
    auth::{jwt::JwtService, Role},
    config::LogFormat,
    models::{RequestStatus, TestRequest},
    router::build_router,
    services::{InMemoryFlowLog, InMemoryTestRequestStore},
    startup::build_app_state,
    Config,
};

const SECRET: &str = "integration-test-secret";

struct TestApp {
    router: Router,
    jwt: JwtService,
    store: Arc<InMemoryTestRequestStore>,
}

impl TestApp {
    fn new() -> Result<Self> {
        let config = Config {
            environment: "test".to_string(),
            port: 0,
            jwt_secret: SECRET.to_string(),
            jwt_expiration: 3600,
            request_timeout: 10,
            log_format: LogFormat::Text,
            seed_file: None,
        };
        let store = Arc::new(InMemoryTestRequestStore::new(Arc::new(InMemoryFlowLog::new())));
        for (id, status) in [
            (1, RequestStatus::LabTestCompleted),
            (2, RequestStatus::LabTestCompleted),
            (3, RequestStatus::LabTestInProgress),
            (4, RequestStatus::Initiated),
        ] {
            store.insert(test_request(id, status));
        }

        let metrics = PrometheusBuilder::new().build_recorder().handle();
        let state = build_app_state(&config, store.clone(), metrics)?;
        let jwt = JwtService::new(SECRET, 3600)?;

        Ok(Self {
            router: build_router(state),
            jwt,
            store,
        })
    }

    fn token(&self, username: &str, roles: Vec<Role>) -> String {
        self.jwt
            .issue_token(Uuid::new_v4(), username, roles)
            .expect("token")
    }

    fn doctor_token(&self, username: &str) -> String {
        self.token(username, vec![Role::Doctor])
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn send_raw(
        &self,
        uri: &str,
        token: &str,
        content_type: Option<&str>,
        body: &'static str,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::PUT)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token));
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body)).unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

fn test_request(id: i64, status: RequestStatus) -> TestRequest {
    TestRequest {
        request_id: id,
        name: format!("patient-{}", id),
        gender: "FEMALE".to_string(),
        age: 30 + id as u32,
        email: format!("patient{}@example.com", id),
        phone_number: "9000000000".to_string(),
        pin_code: 110001,
        address: "Sector 9".to_string(),
        created: Utc::now(),
        status,
        consultation: None,
    }
}

fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|r| r["request_id"].as_i64().unwrap())
        .collect()
}

fn findings() -> Value {
    json!({ "suggestion": "HOME_QUARANTINE", "comments": "Mild symptoms, isolate 14 days" })
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() -> Result<()> {
    let app = TestApp::new()?;

    for (method, uri) in [
        (Method::GET, "/api/consultations/in-queue"),
        (Method::GET, "/api/consultations"),
        (Method::PUT, "/api/consultations/assign/1"),
        (Method::PUT, "/api/consultations/update/1"),
    ] {
        let (status, body) = app.call(method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"]["code"], "AUTH_1004");
    }

    let (status, _) = app
        .call(
            Method::GET,
            "/api/consultations/in-queue",
            Some("not-a-jwt"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_non_doctors_are_forbidden_everywhere() -> Result<()> {
    let app = TestApp::new()?;
    let tester = app.token("lab_tech", vec![Role::Tester, Role::User]);

    for (method, uri, body) in [
        (Method::GET, "/api/consultations/in-queue", None),
        (Method::GET, "/api/consultations", None),
        (Method::PUT, "/api/consultations/assign/1", None),
        (Method::PUT, "/api/consultations/update/1", Some(findings())),
    ] {
        let (status, _) = app.call(method, uri, Some(&tester), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
    }

    // The guard runs before the handler, so nothing was assigned
    assert_eq!(app.store.get(1).unwrap().status, RequestStatus::LabTestCompleted);
    Ok(())
}

#[tokio::test]
async fn test_queue_lists_only_lab_test_completed() -> Result<()> {
    let app = TestApp::new()?;
    let token = app.doctor_token("dr_grey");

    let (status, body) = app
        .call(Method::GET, "/api/consultations/in-queue", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 2]);

    let (_, again) = app
        .call(Method::GET, "/api/consultations/in-queue", Some(&token), None)
        .await;
    assert_eq!(body, again);
    Ok(())
}

#[tokio::test]
async fn test_assign_then_list_mine() -> Result<()> {
    let app = TestApp::new()?;
    let grey = app.doctor_token("dr_grey");
    let shepherd = app.doctor_token("dr_shepherd");

    let (status, body) = app
        .call(Method::PUT, "/api/consultations/assign/1", Some(&grey), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["request_id"], 1);
    assert_eq!(body["status"], "DIAGNOSIS_IN_PROCESS");
    assert_eq!(body["consultation"]["doctor"]["user_name"], "dr_grey");

    let (_, mine) = app
        .call(Method::GET, "/api/consultations", Some(&grey), None)
        .await;
    assert_eq!(ids(&mine), vec![1]);

    let (_, theirs) = app
        .call(Method::GET, "/api/consultations", Some(&shepherd), None)
        .await;
    assert!(ids(&theirs).is_empty());

    let (_, queue) = app
        .call(Method::GET, "/api/consultations/in-queue", Some(&grey), None)
        .await;
    assert_eq!(ids(&queue), vec![2]);
    Ok(())
}

#[tokio::test]
async fn test_second_doctor_cannot_take_assigned_request() -> Result<()> {
    let app = TestApp::new()?;
    let grey = app.doctor_token("dr_grey");
    let shepherd = app.doctor_token("dr_shepherd");

    let (first, _) = app
        .call(Method::PUT, "/api/consultations/assign/2", Some(&grey), None)
        .await;
    assert_eq!(first, StatusCode::OK);

    let (second, body) = app
        .call(Method::PUT, "/api/consultations/assign/2", Some(&shepherd), None)
        .await;
    assert_eq!(second, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid ID or State");

    let stored = app.store.get(2).unwrap();
    assert_eq!(
        stored.assigned_doctor().map(|d| d.user_name.as_str()),
        Some("dr_grey")
    );
    Ok(())
}

#[tokio::test]
async fn test_assign_unknown_or_wrong_state_is_bad_request() -> Result<()> {
    let app = TestApp::new()?;
    let token = app.doctor_token("dr_grey");

    for uri in ["/api/consultations/assign/999", "/api/consultations/assign/3"] {
        let (status, body) = app.call(Method::PUT, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"]["message"], "Invalid ID or State");
    }
    Ok(())
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() -> Result<()> {
    let app = TestApp::new()?;
    let token = app.doctor_token("dr_grey");

    let (status, body) = app
        .call(Method::PUT, "/api/consultations/assign/abc", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "id");
    Ok(())
}

#[tokio::test]
async fn test_update_completes_consultation() -> Result<()> {
    let app = TestApp::new()?;
    let token = app.doctor_token("dr_grey");

    app.call(Method::PUT, "/api/consultations/assign/1", Some(&token), None)
        .await;
    let (status, body) = app
        .call(
            Method::PUT,
            "/api/consultations/update/1",
            Some(&token),
            Some(findings()),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");
    assert_eq!(
        body["consultation"]["comments"],
        "Mild symptoms, isolate 14 days"
    );
    assert_eq!(body["consultation"]["suggestion"], "HOME_QUARANTINE");
    assert!(body["consultation"]["updated_on"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_update_missing_comments_lists_field() -> Result<()> {
    let app = TestApp::new()?;
    let token = app.doctor_token("dr_grey");
    app.call(Method::PUT, "/api/consultations/assign/1", Some(&token), None)
        .await;

    let (status, body) = app
        .call(
            Method::PUT,
            "/api/consultations/update/1",
            Some(&token),
            Some(json!({ "suggestion": "ADMIT" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["error"]["violations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["comments"]);
    assert_eq!(app.store.get(1).unwrap().status, RequestStatus::DiagnosisInProcess);
    Ok(())
}

#[tokio::test]
async fn test_update_by_other_doctor_is_forbidden() -> Result<()> {
    let app = TestApp::new()?;
    let grey = app.doctor_token("dr_grey");
    let shepherd = app.doctor_token("dr_shepherd");
    app.call(Method::PUT, "/api/consultations/assign/1", Some(&grey), None)
        .await;

    let (status, _) = app
        .call(
            Method::PUT,
            "/api/consultations/update/1",
            Some(&shepherd),
            Some(findings()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_update_with_unknown_suggestion_is_bad_request() -> Result<()> {
    let app = TestApp::new()?;
    let token = app.doctor_token("dr_grey");

    let (status, _) = app
        .call(
            Method::PUT,
            "/api/consultations/update/1",
            Some(&token),
            Some(json!({ "suggestion": "PRESCRIBE_TEA", "comments": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_update_with_syntax_error_is_invalid_format() -> Result<()> {
    let app = TestApp::new()?;
    let token = app.doctor_token("dr_grey");

    let (status, body) = app
        .send_raw(
            "/api/consultations/update/1",
            &token,
            Some("application/json"),
            r#"{ "suggestion": ADMIT, "comments": "Fever" }"#,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VAL_3003");
    Ok(())
}

#[tokio::test]
async fn test_update_without_json_content_type_is_invalid_format() -> Result<()> {
    let app = TestApp::new()?;
    let token = app.doctor_token("dr_grey");

    let (status, body) = app
        .send_raw(
            "/api/consultations/update/1",
            &token,
            None,
            r#"{ "suggestion": "ADMIT", "comments": "Fever" }"#,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VAL_3003");
    Ok(())
}

#[tokio::test]
async fn test_update_with_overlong_comments_lists_length_violation() -> Result<()> {
    let app = TestApp::new()?;
    let token = app.doctor_token("dr_grey");
    app.call(Method::PUT, "/api/consultations/assign/1", Some(&token), None)
        .await;

    let (status, body) = app
        .call(
            Method::PUT,
            "/api/consultations/update/1",
            Some(&token),
            Some(json!({ "suggestion": "ADMIT", "comments": "a".repeat(1001) })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let violations = body["error"]["violations"].as_array().unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0]["field"], "comments");
    assert_eq!(violations[0]["constraint"], "length");
    assert_eq!(app.store.get(1).unwrap().status, RequestStatus::DiagnosisInProcess);
    Ok(())
}

#[tokio::test]
async fn test_error_body_carries_response_request_id() -> Result<()> {
    let app = TestApp::new()?;
    let token = app.doctor_token("dr_grey");

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri("/api/consultations/assign/999")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let header_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("x-request-id header");
    let bytes = response.into_body().collect().await?.to_bytes();
    let body: Value = serde_json::from_slice(&bytes)?;

    assert_eq!(body["request_id"], header_id);
    Ok(())
}

#[tokio::test]
async fn test_public_endpoints_need_no_token() -> Result<()> {
    let app = TestApp::new()?;

    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, doc) = app
        .call(Method::GET, "/api/docs/openapi.json", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/consultations/in-queue"].is_object());

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert!(response.headers().contains_key("x-request-id"));
    Ok(())
}
