//! Fixtures shared by the repository integration tests.

#![allow(dead_code)]

use portal_core::legal_instrument::{FieldKind, FieldSpec};
use portal_core::project_status::ProjectStatus;
use portal_core::roles::ROLE_PROPONENT;
use portal_core::types::DbId;
use portal_db::models::legal_instrument::{CreateLegalInstrument, LegalInstrument};
use portal_db::models::project::{CreateProject, Project};
use portal_db::models::user::{CreateUser, User};
use portal_db::models::work_plan::UpsertWorkPlan;
use portal_db::repositories::{
    AttachOutcome, LegalInstrumentInstanceRepo, LegalInstrumentRepo, ProjectRepo, RoleRepo,
    UserRepo, WorkPlanRepo,
};
use sqlx::PgPool;

pub async fn create_user(pool: &PgPool, email: &str, name: &str, role: &str) -> User {
    let role = RoleRepo::find_by_name(pool, role).await.unwrap().unwrap();
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            name: name.to_string(),
            role_id: role.id,
        },
    )
    .await
    .unwrap()
}

pub async fn create_proponent(pool: &PgPool, email: &str) -> User {
    let name = email.split('@').next().unwrap_or(email).to_string();
    create_user(pool, email, &name, ROLE_PROPONENT).await
}

pub async fn create_project(pool: &PgPool, owner_id: DbId, slug: &str, title: &str) -> Project {
    ProjectRepo::create(
        pool,
        &CreateProject {
            slug: slug.to_string(),
            title: title.to_string(),
            objectives: Some("Objectives".to_string()),
            justification: None,
            scope: None,
            owner_id,
        },
    )
    .await
    .unwrap()
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

/// Memorandum whose only field is optional, so attaching it already fills it.
pub async fn open_instrument(pool: &PgPool) -> LegalInstrument {
    if let Some(existing) = LegalInstrumentRepo::find_active_by_type(pool, "memorandum_of_understanding")
        .await
        .unwrap()
    {
        return existing;
    }
    LegalInstrumentRepo::create(
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
    .unwrap()
}

/// Give a draft project a filled legal instrument and a work plan.
pub async fn make_submittable(pool: &PgPool, project_id: DbId) {
    let instrument = open_instrument(pool).await;
    let outcome = LegalInstrumentInstanceRepo::attach(
        pool,
        project_id,
        instrument.id,
        &[ProjectStatus::Draft, ProjectStatus::Returned],
    )
    .await
    .unwrap();
    assert!(matches!(outcome, AttachOutcome::Attached(_)));

    WorkPlanRepo::upsert(
        pool,
        project_id,
        &UpsertWorkPlan {
            objectives: Some("Plan".to_string()),
            methodology: None,
            schedule: None,
            team: None,
        },
    )
    .await
    .unwrap();
}
