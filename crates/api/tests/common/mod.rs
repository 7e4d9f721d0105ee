//! Shared harness for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use portal_api::auth::jwt::{generate_access_token, JwtConfig};
use portal_api::config::{OtpConfig, ServerConfig};
use portal_api::router::build_app_router;
use portal_api::state::AppState;
use portal_core::legal_instrument::{FieldKind, FieldSpec};
use portal_core::project_status::ProjectStatus;
use portal_core::roles::{ROLE_ADMIN, ROLE_PROPONENT};
use portal_core::types::DbId;
use portal_db::models::legal_instrument::{CreateLegalInstrument, LegalInstrument};
use portal_db::models::user::{CreateUser, User};
use portal_db::models::work_plan::UpsertWorkPlan;
use portal_db::repositories::{
    AttachOutcome, LegalInstrumentInstanceRepo, LegalInstrumentRepo, RoleRepo, UserRepo,
    WorkPlanRepo,
};
use portal_events::MemoryMailer;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
///
/// Only `uni.edu` addresses may request codes.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        public_base_url: "https://portal.uni.edu".to_string(),
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        otp: OtpConfig {
            expiry_mins: 10,
            resend_interval_secs: 25,
            allowed_email_domains: vec!["uni.edu".to_string()],
        },
    }
}

/// The application router plus the mailer it sends through.
pub struct TestApp {
    pub router: Router,
    pub mailer: Arc<MemoryMailer>,
    pub config: ServerConfig,
}

impl TestApp {
    /// A fresh clone of the router, for one request.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Bearer token for `user`, signed with the test secret.
    pub fn token_for(&self, user: &User, role: &str) -> String {
        generate_access_token(user.id, role, &self.config.jwt).unwrap()
    }

    /// The six-digit code in the last email sent to `to`.
    pub fn last_code_sent_to(&self, to: &str) -> String {
        let email = self
            .mailer
            .sent_to(to)
            .pop()
            .unwrap_or_else(|| panic!("no email sent to {to}"));
        email
            .body
            .split_whitespace()
            .find(|w| w.len() == 6 && w.chars().all(|c| c.is_ascii_digit()))
            .unwrap()
            .to_string()
    }
}

/// Build the full application with the production middleware stack and an
/// in-memory mailer.
pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with_mailer(pool, MemoryMailer::new())
}

/// Same as [`build_test_app`] but sending through `mailer`.
pub fn build_test_app_with_mailer(pool: PgPool, mailer: MemoryMailer) -> TestApp {
    let config = test_config();
    let mailer = Arc::new(mailer);

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        mailer: mailer.clone(),
    };

    TestApp {
        router: build_app_router(state, &config),
        mailer,
        config,
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn create_user(pool: &PgPool, email: &str, role: &str) -> User {
    let role = RoleRepo::find_by_name(pool, role).await.unwrap().unwrap();
    let name = email.split('@').next().unwrap_or(email).to_string();
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            name,
            role_id: role.id,
        },
    )
    .await
    .unwrap()
}

pub async fn create_proponent(pool: &PgPool, email: &str) -> User {
    create_user(pool, email, ROLE_PROPONENT).await
}

pub async fn create_admin(pool: &PgPool, email: &str) -> User {
    create_user(pool, email, ROLE_ADMIN).await
}

pub fn nda_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec {
            id: "partner_name".to_string(),
            label: "Partner name".to_string(),
            required: true,
            kind: FieldKind::Text,
            options: vec![],
        },
        FieldSpec {
            id: "term_months".to_string(),
            label: "Term (months)".to_string(),
            required: true,
            kind: FieldKind::Number,
            options: vec![],
        },
        FieldSpec {
            id: "notes".to_string(),
            label: "Notes".to_string(),
            required: false,
            kind: FieldKind::Textarea,
            options: vec![],
        },
    ]
}

pub async fn create_nda(pool: &PgPool) -> LegalInstrument {
    LegalInstrumentRepo::create(
        pool,
        &CreateLegalInstrument {
            instrument_type: "nda".to_string(),
            name: "Non-disclosure agreement".to_string(),
            description: None,
            field_spec: nda_fields(),
            template_body: "Between the university and {{partner_name}} for {{term_months}} months."
                .to_string(),
            template_file_key: None,
        },
    )
    .await
    .unwrap()
}

/// Attach a memorandum with no required fields and save a work plan, so the
/// project passes the submission checks.
pub async fn make_submittable(pool: &PgPool, project_id: DbId) {
    let memorandum = match LegalInstrumentRepo::find_active_by_type(pool, "memorandum_of_understanding")
        .await
        .unwrap()
    {
        Some(existing) => existing,
        None => LegalInstrumentRepo::create(
            pool,
            &CreateLegalInstrument {
                instrument_type: "memorandum_of_understanding".to_string(),
                name: "Memorandum of understanding".to_string(),
                description: None,
                field_spec: vec![FieldSpec {
                    id: "remarks".to_string(),
                    label: "Remarks".to_string(),
                    required: false,
                    kind: FieldKind::Textarea,
                    options: vec![],
                }],
                template_body: "Memorandum for {{remarks}}.".to_string(),
                template_file_key: None,
            },
        )
        .await
        .unwrap(),
    };
    let outcome = LegalInstrumentInstanceRepo::attach(
        pool,
        project_id,
        memorandum.id,
        &[ProjectStatus::Draft, ProjectStatus::Returned],
    )
    .await
    .unwrap();
    assert!(matches!(outcome, AttachOutcome::Attached(_)));

    WorkPlanRepo::upsert(
        pool,
        project_id,
        &UpsertWorkPlan {
            objectives: Some("Sampling".to_string()),
            methodology: None,
            schedule: None,
            team: None,
        },
    )
    .await
    .unwrap();
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Read the full response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: serde_json::Value, token: &str) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(app: Router, uri: &str, body: serde_json::Value, token: &str) -> Response {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn patch_json_auth(app: Router, uri: &str, body: serde_json::Value, token: &str) -> Response {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Assert the status and return the `data` payload.
pub async fn expect_data(response: Response, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    let mut json = body_json(response).await;
    json["data"].take()
}

/// Assert the status and return the error message.
pub async fn expect_error(response: Response, status: StatusCode) -> String {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    json["error"].as_str().unwrap().to_string()
}
