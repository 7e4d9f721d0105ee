//! HTTP-level integration tests for project CRUD, lifecycle transitions and
//! their side effects (audit trail, notifications, emails).

mod common;

use axum::http::StatusCode;
use common::{
    delete_auth, expect_data, expect_error, get_auth, post_json_auth, put_json_auth, TestApp,
};
use portal_db::models::user::User;
use portal_events::MemoryMailer;
use serde_json::{json, Value};
use sqlx::PgPool;

struct Fixture {
    app: TestApp,
    owner: User,
    owner_token: String,
    admin: User,
    admin_token: String,
}

async fn setup(pool: PgPool) -> Fixture {
    setup_with_mailer(pool, MemoryMailer::new()).await
}

async fn setup_with_mailer(pool: PgPool, mailer: MemoryMailer) -> Fixture {
    let owner = common::create_proponent(&pool, "ana@uni.edu").await;
    let admin = common::create_admin(&pool, "dean@uni.edu").await;
    let app = common::build_test_app_with_mailer(pool, mailer);
    let owner_token = app.token_for(&owner, "proponent");
    let admin_token = app.token_for(&admin, "admin");
    Fixture {
        app,
        owner,
        owner_token,
        admin,
        admin_token,
    }
}

async fn create_project(f: &Fixture, title: &str) -> Value {
    let response = post_json_auth(
        f.app.app(),
        "/api/v1/projects",
        json!({ "title": title, "objectives": "Measure soil carbon" }),
        &f.owner_token,
    )
    .await;
    expect_data(response, StatusCode::CREATED).await
}

/// Attach the NDA, fill every required field and save a work plan.
async fn prepare_for_submission(f: &Fixture, pool: &PgPool, project_id: i64) {
    let nda = common::create_nda(pool).await;
    let uri = format!("/api/v1/projects/{project_id}/legal-instrument");
    let response = post_json_auth(
        f.app.app(),
        &uri,
        json!({ "legal_instrument_id": nda.id }),
        &f.owner_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = put_json_auth(
        f.app.app(),
        &format!("{uri}/fill"),
        json!({ "answers": { "partner_name": "Acme", "term_months": 12 } }),
        &f.owner_token,
    )
    .await;
    let view = expect_data(response, StatusCode::OK).await;
    assert_eq!(view["instance"]["fill_status"], "FILLED");

    let response = put_json_auth(
        f.app.app(),
        &format!("/api/v1/projects/{project_id}/work-plan"),
        json!({ "objectives": "Quarterly sampling", "schedule": [], "team": [] }),
        &f.owner_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

async fn act(f: &Fixture, project_id: i64, action: &str, body: Value, token: &str) -> axum::response::Response {
    post_json_auth(
        f.app.app(),
        &format!("/api/v1/projects/{project_id}/{action}"),
        body,
        token,
    )
    .await
}

async fn project_status(f: &Fixture, project_id: i64) -> String {
    let response = get_auth(
        f.app.app(),
        &format!("/api/v1/projects/{project_id}"),
        &f.owner_token,
    )
    .await;
    let project = expect_data(response, StatusCode::OK).await;
    project["status"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_project_starts_as_draft_with_slug(pool: PgPool) {
    let f = setup(pool).await;

    let first = create_project(&f, "Soil Carbon Study").await;
    let second = create_project(&f, "Soil carbon study").await;

    assert_eq!(first["status"], "DRAFT");
    assert_eq!(first["owner_id"], f.owner.id);
    assert_eq!(first["slug"], "soil-carbon-study");
    assert_eq!(second["slug"], "soil-carbon-study-2");

    let response = get_auth(
        f.app.app(),
        "/api/v1/projects/by-slug/soil-carbon-study-2",
        &f.owner_token,
    )
    .await;
    let found = expect_data(response, StatusCode::OK).await;
    assert_eq!(found["id"], second["id"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_blank_title_is_rejected(pool: PgPool) {
    let f = setup(pool).await;

    let response =
        post_json_auth(f.app.app(), "/api/v1/projects", json!({ "title": "" }), &f.owner_token).await;

    let message = expect_error(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(message, "title: must be between 1 and 300 characters");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_mine_only_returns_own_projects(pool: PgPool) {
    let other = common::create_proponent(&pool, "bruno@uni.edu").await;
    let f = setup(pool).await;
    create_project(&f, "Mine").await;
    let other_token = f.app.token_for(&other, "proponent");

    let response = get_auth(f.app.app(), "/api/v1/projects", &other_token).await;
    let projects = expect_data(response, StatusCode::OK).await;

    assert_eq!(projects.as_array().unwrap().len(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_other_proponent_cannot_view_or_edit(pool: PgPool) {
    let other = common::create_proponent(&pool, "bruno@uni.edu").await;
    let f = setup(pool).await;
    let project = create_project(&f, "Private").await;
    let id = project["id"].as_i64().unwrap();
    let other_token = f.app.token_for(&other, "proponent");

    let response = get_auth(f.app.app(), &format!("/api/v1/projects/{id}"), &other_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put_json_auth(
        f.app.app(),
        &format!("/api/v1/projects/{id}"),
        json!({ "title": "Hijacked" }),
        &other_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admins hold project.view_all.
    let response = get_auth(f.app.app(), &format!("/api/v1/projects/{id}"), &f.admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_project_returns_404(pool: PgPool) {
    let f = setup(pool).await;

    let response = get_auth(f.app.app(), "/api/v1/projects/999999", &f.owner_token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(f.app.app(), "/api/v1/projects/by-slug/nope", &f.owner_token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(f.app.app(), "/api/v1/projects/by-slug/Soil_Carbon", &f.owner_token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_only_drafts(pool: PgPool) {
    let f = setup(pool.clone()).await;
    let draft = create_project(&f, "Throwaway").await;
    let draft_id = draft["id"].as_i64().unwrap();

    let response = delete_auth(f.app.app(), &format!("/api/v1/projects/{draft_id}"), &f.owner_token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let submitted = create_project(&f, "Keeper").await;
    let id = submitted["id"].as_i64().unwrap();
    prepare_for_submission(&f, &pool, id).await;
    act(&f, id, "submit", json!({}), &f.owner_token).await;

    let response = delete_auth(f.app.app(), &format!("/api/v1/projects/{id}"), &f.owner_token).await;
    let message = expect_error(response, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert_eq!(message, "Only draft projects can be deleted");
}

// ---------------------------------------------------------------------------
// Submission gating
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_submit_without_legal_instrument_is_refused(pool: PgPool) {
    let f = setup(pool).await;
    let project = create_project(&f, "Soil").await;
    let id = project["id"].as_i64().unwrap();

    let response = act(&f, id, "submit", json!({}), &f.owner_token).await;

    let message = expect_error(response, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert_eq!(message, "A legal instrument must be attached before submitting");
    assert_eq!(project_status(&f, id).await, "DRAFT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_submit_with_partial_instrument_is_refused(pool: PgPool) {
    let f = setup(pool.clone()).await;
    let project = create_project(&f, "Soil").await;
    let id = project["id"].as_i64().unwrap();
    let nda = common::create_nda(&pool).await;
    let uri = format!("/api/v1/projects/{id}/legal-instrument");
    post_json_auth(f.app.app(), &uri, json!({ "legal_instrument_id": nda.id }), &f.owner_token).await;
    put_json_auth(
        f.app.app(),
        &format!("{uri}/fill"),
        json!({ "answers": { "partner_name": "Acme" } }),
        &f.owner_token,
    )
    .await;

    let response = act(&f, id, "submit", json!({}), &f.owner_token).await;

    let message = expect_error(response, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert_eq!(message, "The legal instrument must be completely filled before submitting");
    assert_eq!(project_status(&f, id).await, "DRAFT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_submit_without_work_plan_is_refused(pool: PgPool) {
    let f = setup(pool.clone()).await;
    let project = create_project(&f, "Soil").await;
    let id = project["id"].as_i64().unwrap();
    let nda = common::create_nda(&pool).await;
    let uri = format!("/api/v1/projects/{id}/legal-instrument");
    post_json_auth(f.app.app(), &uri, json!({ "legal_instrument_id": nda.id }), &f.owner_token).await;
    put_json_auth(
        f.app.app(),
        &format!("{uri}/fill"),
        json!({ "answers": { "partner_name": "Acme", "term_months": 6 } }),
        &f.owner_token,
    )
    .await;

    let response = act(&f, id, "submit", json!({}), &f.owner_token).await;

    let message = expect_error(response, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert_eq!(message, "A work plan is required before submitting");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_only_owner_can_submit(pool: PgPool) {
    let other = common::create_proponent(&pool, "bruno@uni.edu").await;
    let f = setup(pool.clone()).await;
    let project = create_project(&f, "Soil").await;
    let id = project["id"].as_i64().unwrap();
    prepare_for_submission(&f, &pool, id).await;

    let response = act(&f, id, "submit", json!({}), &f.app.token_for(&other, "proponent")).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(project_status(&f, id).await, "DRAFT");
}

// ---------------------------------------------------------------------------
// Review decisions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approve_from_draft_is_refused(pool: PgPool) {
    let f = setup(pool).await;
    let project = create_project(&f, "Soil").await;
    let id = project["id"].as_i64().unwrap();

    let response = act(&f, id, "approve", json!({ "opinion": "Fine" }), &f.admin_token).await;

    let message = expect_error(response, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert_eq!(message, "Only projects under review can be approved");
    assert_eq!(project_status(&f, id).await, "DRAFT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_proponent_cannot_review(pool: PgPool) {
    let f = setup(pool.clone()).await;
    let project = create_project(&f, "Soil").await;
    let id = project["id"].as_i64().unwrap();
    prepare_for_submission(&f, &pool, id).await;
    act(&f, id, "submit", json!({}), &f.owner_token).await;

    let response = act(&f, id, "start-review", json!({}), &f.owner_token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(project_status(&f, id).await, "PENDING_REVIEW");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_approval_cycle(pool: PgPool) {
    let f = setup(pool.clone()).await;
    let project = create_project(&f, "Soil carbon").await;
    let id = project["id"].as_i64().unwrap();
    prepare_for_submission(&f, &pool, id).await;

    let response = act(&f, id, "submit", json!({}), &f.owner_token).await;
    let submitted = expect_data(response, StatusCode::OK).await;
    assert_eq!(submitted["status"], "PENDING_REVIEW");
    assert!(!submitted["submitted_at"].is_null());

    let response = act(&f, id, "start-review", json!({}), &f.admin_token).await;
    let reviewing = expect_data(response, StatusCode::OK).await;
    assert_eq!(reviewing["status"], "UNDER_REVIEW");
    assert_eq!(reviewing["reviewer_id"], f.admin.id);

    // An opinion is mandatory.
    let response = act(&f, id, "approve", json!({ "opinion": "   " }), &f.admin_token).await;
    let message = expect_error(response, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert_eq!(message, "An opinion is required to approve the project");

    let response = act(
        &f,
        id,
        "approve",
        json!({ "opinion": "  Sound methodology. " }),
        &f.admin_token,
    )
    .await;
    let approved = expect_data(response, StatusCode::OK).await;
    assert_eq!(approved["status"], "APPROVED");
    assert_eq!(approved["approval_opinion"], "Sound methodology.");
    assert!(!approved["approved_at"].is_null());

    // Terminal: nothing moves an approved project.
    let response = act(&f, id, "submit", json!({}), &f.owner_token).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_return_then_resubmit(pool: PgPool) {
    let f = setup(pool.clone()).await;
    let project = create_project(&f, "Soil").await;
    let id = project["id"].as_i64().unwrap();
    prepare_for_submission(&f, &pool, id).await;
    act(&f, id, "submit", json!({}), &f.owner_token).await;
    act(&f, id, "start-review", json!({}), &f.admin_token).await;

    let response = act(&f, id, "return", json!({}), &f.admin_token).await;
    let message = expect_error(response, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert_eq!(message, "A reason is required to return the project for adjustment");

    let response = act(&f, id, "return", json!({ "reason": "Budget is missing" }), &f.admin_token).await;
    let returned = expect_data(response, StatusCode::OK).await;
    assert_eq!(returned["status"], "RETURNED");
    assert_eq!(returned["return_reason"], "Budget is missing");

    // RETURNED is editable again.
    let response = put_json_auth(
        f.app.app(),
        &format!("/api/v1/projects/{id}"),
        json!({ "scope": "Two campuses" }),
        &f.owner_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = act(&f, id, "submit", json!({}), &f.owner_token).await;
    let resubmitted = expect_data(response, StatusCode::OK).await;
    assert_eq!(resubmitted["status"], "PENDING_REVIEW");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reject_is_terminal_and_locks_edits(pool: PgPool) {
    let f = setup(pool.clone()).await;
    let project = create_project(&f, "Soil").await;
    let id = project["id"].as_i64().unwrap();
    prepare_for_submission(&f, &pool, id).await;
    act(&f, id, "submit", json!({}), &f.owner_token).await;
    act(&f, id, "start-review", json!({}), &f.admin_token).await;

    let response = act(&f, id, "reject", json!({ "reason": "Out of scope" }), &f.admin_token).await;
    let rejected = expect_data(response, StatusCode::OK).await;
    assert_eq!(rejected["status"], "REJECTED");
    assert_eq!(rejected["rejection_reason"], "Out of scope");

    let response = put_json_auth(
        f.app.app(),
        &format!("/api/v1/projects/{id}"),
        json!({ "title": "Renamed" }),
        &f.owner_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ---------------------------------------------------------------------------
// Side effects
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_submit_notifies_approvers_and_approval_notifies_owner(pool: PgPool) {
    let f = setup(pool.clone()).await;
    let project = create_project(&f, "Soil carbon").await;
    let id = project["id"].as_i64().unwrap();
    prepare_for_submission(&f, &pool, id).await;

    act(&f, id, "submit", json!({}), &f.owner_token).await;

    let response = get_auth(f.app.app(), "/api/v1/notifications", &f.admin_token).await;
    let inbox = expect_data(response, StatusCode::OK).await;
    let inbox = inbox.as_array().unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0]["title"], "Project submitted for review");
    assert_eq!(inbox[0]["link"], "/projects/soil-carbon");
    let emails = f.app.mailer.sent_to("dean@uni.edu");
    assert_eq!(emails.len(), 1);
    assert!(emails[0].body.ends_with("https://portal.uni.edu/projects/soil-carbon"));
    // The submitter is not told about their own action.
    assert!(f.app.mailer.sent_to("ana@uni.edu").is_empty());

    act(&f, id, "start-review", json!({}), &f.admin_token).await;
    act(&f, id, "approve", json!({ "opinion": "Good" }), &f.admin_token).await;

    let response = get_auth(f.app.app(), "/api/v1/notifications/unread-count", &f.owner_token).await;
    let count = expect_data(response, StatusCode::OK).await;
    assert_eq!(count["count"], 2);

    let response = get_auth(
        f.app.app(),
        "/api/v1/notifications?unread_only=true&limit=1",
        &f.owner_token,
    )
    .await;
    let latest = expect_data(response, StatusCode::OK).await;
    assert_eq!(latest[0]["kind"], "success");

    let response =
        post_json_auth(f.app.app(), "/api/v1/notifications/read-all", json!({}), &f.owner_token).await;
    let marked = expect_data(response, StatusCode::OK).await;
    assert_eq!(marked["updated"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mail_failures_do_not_block_transitions(pool: PgPool) {
    let f = setup_with_mailer(pool.clone(), MemoryMailer::failing()).await;
    let project = create_project(&f, "Soil carbon").await;
    let id = project["id"].as_i64().unwrap();
    prepare_for_submission(&f, &pool, id).await;

    let response = act(&f, id, "submit", json!({}), &f.owner_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(project_status(&f, id).await, "PENDING_REVIEW");

    let response = act(&f, id, "start-review", json!({}), &f.admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = act(&f, id, "approve", json!({ "opinion": "Good" }), &f.admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(project_status(&f, id).await, "APPROVED");

    assert!(f.app.mailer.sent().is_empty());

    let response = get_auth(f.app.app(), "/api/v1/notifications", &f.admin_token).await;
    let inbox = expect_data(response, StatusCode::OK).await;
    assert_eq!(inbox[0]["title"], "Project submitted for review");
    let response = get_auth(f.app.app(), "/api/v1/notifications/unread-count", &f.owner_token).await;
    let count = expect_data(response, StatusCode::OK).await;
    assert_eq!(count["count"], 2);

    let response = get_auth(
        f.app.app(),
        &format!("/api/v1/projects/{id}/audit"),
        &f.owner_token,
    )
    .await;
    let page = expect_data(response, StatusCode::OK).await;
    let actions: Vec<&str> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(
        &actions[..3],
        ["project.approved", "project.review_started", "project.submitted"]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mark_single_notification_read(pool: PgPool) {
    let f = setup(pool.clone()).await;
    let project = create_project(&f, "Soil").await;
    let id = project["id"].as_i64().unwrap();
    prepare_for_submission(&f, &pool, id).await;
    act(&f, id, "submit", json!({}), &f.owner_token).await;

    let response = get_auth(f.app.app(), "/api/v1/notifications", &f.admin_token).await;
    let inbox = expect_data(response, StatusCode::OK).await;
    let notification_id = inbox[0]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/notifications/{notification_id}/read");

    // Someone else's notification is invisible.
    let response = post_json_auth(f.app.app(), &uri, json!({}), &f.owner_token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_json_auth(f.app.app(), &uri, json!({}), &f.admin_token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(f.app.app(), "/api/v1/notifications/unread-count", &f.admin_token).await;
    let count = expect_data(response, StatusCode::OK).await;
    assert_eq!(count["count"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_audit_trail_records_every_step(pool: PgPool) {
    let f = setup(pool.clone()).await;
    let project = create_project(&f, "Soil").await;
    let id = project["id"].as_i64().unwrap();
    prepare_for_submission(&f, &pool, id).await;
    act(&f, id, "submit", json!({}), &f.owner_token).await;
    act(&f, id, "start-review", json!({}), &f.admin_token).await;
    act(&f, id, "reject", json!({ "reason": "Out of scope" }), &f.admin_token).await;

    let response = get_auth(
        f.app.app(),
        &format!("/api/v1/projects/{id}/audit"),
        &f.owner_token,
    )
    .await;
    let page = expect_data(response, StatusCode::OK).await;

    assert_eq!(page["total"], 5);
    let actions: Vec<&str> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(
        actions,
        [
            "project.rejected",
            "project.review_started",
            "project.submitted",
            "legal_instrument.attached",
            "project.created",
        ]
    );
    let rejected = &page["items"][0];
    assert_eq!(rejected["status_before"], "UNDER_REVIEW");
    assert_eq!(rejected["status_after"], "REJECTED");
    assert_eq!(rejected["actor_id"], f.admin.id);
    assert_eq!(rejected["details"]["text"], "Out of scope");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_audit_trail_hidden_from_strangers(pool: PgPool) {
    let other = common::create_proponent(&pool, "bruno@uni.edu").await;
    let f = setup(pool).await;
    let project = create_project(&f, "Soil").await;
    let id = project["id"].as_i64().unwrap();

    let response = get_auth(
        f.app.app(),
        &format!("/api/v1/projects/{id}/audit"),
        &f.app.token_for(&other, "proponent"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
