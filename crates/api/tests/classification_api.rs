//! HTTP-level integration tests for the classification wizard.

mod common;

use axum::http::StatusCode;
use common::{expect_data, expect_error, get, get_auth, post_json_auth, TestApp};
use serde_json::json;
use sqlx::PgPool;

async fn setup(pool: &PgPool) -> (TestApp, String) {
    let user = common::create_proponent(pool, "ana@uni.edu").await;
    let app = common::build_test_app(pool.clone());
    let token = app.token_for(&user, "proponent");
    (app, token)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_graph_lists_every_node(pool: PgPool) {
    let (app, token) = setup(&pool).await;

    let response = get_auth(app.app(), "/api/v1/classification", &token).await;
    let graph = expect_data(response, StatusCode::OK).await;

    assert_eq!(graph["start"], "confidentiality_only");
    let nodes = graph["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 15);
    assert_eq!(nodes.iter().filter(|n| n["kind"] == "outcome").count(), 8);
    assert_eq!(nodes[0]["yes"], "nda");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_graph_requires_auth(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app.app(), "/api/v1/classification").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_empty_replay_is_at_start(pool: PgPool) {
    let (app, token) = setup(&pool).await;

    let response = post_json_auth(app.app(), "/api/v1/classification/replay", json!({}), &token).await;
    let replay = expect_data(response, StatusCode::OK).await;

    assert_eq!(replay["traversal"]["current"], "confidentiality_only");
    assert!(replay["question"].as_str().unwrap().contains("confidential information"));
    assert!(replay["outcome"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_partial_answers_stop_at_question(pool: PgPool) {
    let (app, token) = setup(&pool).await;

    let response = post_json_auth(
        app.app(),
        "/api/v1/classification/replay",
        json!({ "answers": ["no", "yes"] }),
        &token,
    )
    .await;
    let replay = expect_data(response, StatusCode::OK).await;

    assert_eq!(replay["traversal"]["current"], "partner_funding");
    assert_eq!(replay["traversal"]["history"].as_array().unwrap().len(), 2);
    assert!(replay["outcome"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_outcome_links_active_catalog_entry(pool: PgPool) {
    let (app, token) = setup(&pool).await;
    let nda = common::create_nda(&pool).await;

    let response = post_json_auth(
        app.app(),
        "/api/v1/classification/replay",
        json!({ "answers": ["yes"] }),
        &token,
    )
    .await;
    let replay = expect_data(response, StatusCode::OK).await;

    assert!(replay["question"].is_null());
    assert_eq!(replay["outcome"]["instrument_type"], "nda");
    assert_eq!(replay["outcome"]["label"], "Non-disclosure agreement (NDA)");
    assert_eq!(replay["outcome"]["legal_instrument"]["id"], nda.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_outcome_without_catalog_entry(pool: PgPool) {
    let (app, token) = setup(&pool).await;

    let response = post_json_auth(
        app.app(),
        "/api/v1/classification/replay",
        json!({ "answers": ["no", "no", "yes"] }),
        &token,
    )
    .await;
    let replay = expect_data(response, StatusCode::OK).await;

    assert_eq!(replay["outcome"]["instrument_type"], "service_contract");
    assert!(replay["outcome"]["legal_instrument"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_history_replay_checks_questions(pool: PgPool) {
    let (app, token) = setup(&pool).await;

    let response = post_json_auth(
        app.app(),
        "/api/v1/classification/replay",
        json!({ "history": [
            { "question": "confidentiality_only", "answer": "no" },
            { "question": "research_activities", "answer": "no" }
        ] }),
        &token,
    )
    .await;
    let replay = expect_data(response, StatusCode::OK).await;
    assert_eq!(replay["traversal"]["current"], "paid_service");

    let response = post_json_auth(
        app.app(),
        "/api/v1/classification/replay",
        json!({ "history": [{ "question": "paid_service", "answer": "yes" }] }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_answers_past_outcome_are_rejected(pool: PgPool) {
    let (app, token) = setup(&pool).await;

    let response = post_json_auth(
        app.app(),
        "/api/v1/classification/replay",
        json!({ "answers": ["yes", "no"] }),
        &token,
    )
    .await;

    let message = expect_error(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(
        message,
        "Classification already reached an outcome; reset to start over"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_history_and_answers_together_are_rejected(pool: PgPool) {
    let (app, token) = setup(&pool).await;

    let response = post_json_auth(
        app.app(),
        "/api/v1/classification/replay",
        json!({ "answers": ["yes"], "history": [] }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
