use portal_core::lifecycle::ProjectAction;
use portal_core::project_status::ProjectStatus;
use portal_core::roles::ROLE_ADMIN;
use portal_db::models::project::{TransitionUpdate, UpdateProject};
use portal_db::models::work_plan::UpsertWorkPlan;
use portal_db::repositories::{LegalInstrumentInstanceRepo, ProjectRepo, WorkPlanRepo};
use sqlx::PgPool;

mod common;

const EDITABLE: [ProjectStatus; 2] = [ProjectStatus::Draft, ProjectStatus::Returned];

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_review_cycle(pool: PgPool) {
    let owner = common::create_proponent(&pool, "ana@uni.edu").await;
    let admin = common::create_user(&pool, "admin@uni.edu", "Admin", ROLE_ADMIN).await;
    let project = common::create_project(&pool, owner.id, "soil", "Soil").await;
    assert_eq!(project.status().unwrap(), ProjectStatus::Draft);
    common::make_submittable(&pool, project.id).await;

    let submitted = ProjectRepo::transition(&pool, project.id, ProjectAction::Submit, &TransitionUpdate::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(submitted.status().unwrap(), ProjectStatus::PendingReview);
    assert!(submitted.submitted_at.is_some());

    let reviewing = ProjectRepo::transition(
        &pool,
        project.id,
        ProjectAction::StartReview,
        &TransitionUpdate {
            reviewer_id: Some(admin.id),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(reviewing.status().unwrap(), ProjectStatus::UnderReview);
    assert_eq!(reviewing.reviewer_id, Some(admin.id));
    assert!(reviewing.review_started_at.is_some());

    let returned = ProjectRepo::transition(
        &pool,
        project.id,
        ProjectAction::ReturnForAdjustment,
        &TransitionUpdate {
            decision_text: Some("Budget is missing".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(returned.status().unwrap(), ProjectStatus::Returned);
    assert_eq!(returned.return_reason.as_deref(), Some("Budget is missing"));

    // Resubmission from RETURNED is the only way back.
    let resubmitted = ProjectRepo::transition(&pool, project.id, ProjectAction::Submit, &TransitionUpdate::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resubmitted.status().unwrap(), ProjectStatus::PendingReview);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_guarded_transition_leaves_status_unchanged(pool: PgPool) {
    let owner = common::create_proponent(&pool, "ana@uni.edu").await;
    let project = common::create_project(&pool, owner.id, "soil", "Soil").await;

    for action in [
        ProjectAction::StartReview,
        ProjectAction::Approve,
        ProjectAction::Reject,
        ProjectAction::ReturnForAdjustment,
    ] {
        let result = ProjectRepo::transition(
            &pool,
            project.id,
            action,
            &TransitionUpdate {
                decision_text: Some("text".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(result.is_none(), "{action:?} applied to a draft");
    }

    let reloaded = ProjectRepo::find_by_id(&pool, project.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status().unwrap(), ProjectStatus::Draft);
    assert!(reloaded.approval_opinion.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_submit_requires_filled_instrument_and_work_plan(pool: PgPool) {
    let owner = common::create_proponent(&pool, "ana@uni.edu").await;
    let project = common::create_project(&pool, owner.id, "soil", "Soil").await;
    let none = TransitionUpdate::default();

    let bare = ProjectRepo::transition(&pool, project.id, ProjectAction::Submit, &none)
        .await
        .unwrap();
    assert!(bare.is_none());

    // A pending instrument does not count as filled.
    let nda = common::create_nda(&pool).await;
    LegalInstrumentInstanceRepo::attach(&pool, project.id, nda.id, &EDITABLE)
        .await
        .unwrap();
    WorkPlanRepo::upsert(
        &pool,
        project.id,
        &UpsertWorkPlan {
            objectives: Some("Plan".to_string()),
            methodology: None,
            schedule: None,
            team: None,
        },
    )
    .await
    .unwrap();
    let pending = ProjectRepo::transition(&pool, project.id, ProjectAction::Submit, &none)
        .await
        .unwrap();
    assert!(pending.is_none());

    let reloaded = ProjectRepo::find_by_id(&pool, project.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status().unwrap(), ProjectStatus::Draft);
    assert!(reloaded.submitted_at.is_none());

    // Re-attaching a fully optional instrument replaces it with a filled one.
    common::make_submittable(&pool, project.id).await;
    let submitted = ProjectRepo::transition(&pool, project.id, ProjectAction::Submit, &none)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(submitted.status().unwrap(), ProjectStatus::PendingReview);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_submit_does_not_apply(pool: PgPool) {
    let owner = common::create_proponent(&pool, "ana@uni.edu").await;
    let project = common::create_project(&pool, owner.id, "soil", "Soil").await;
    common::make_submittable(&pool, project.id).await;

    let first = ProjectRepo::transition(&pool, project.id, ProjectAction::Submit, &TransitionUpdate::default())
        .await
        .unwrap();
    let second = ProjectRepo::transition(&pool, project.id, ProjectAction::Submit, &TransitionUpdate::default())
        .await
        .unwrap();
    assert!(first.is_some());
    assert!(second.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_only_while_editable(pool: PgPool) {
    let owner = common::create_proponent(&pool, "ana@uni.edu").await;
    let project = common::create_project(&pool, owner.id, "soil", "Soil").await;

    let input = UpdateProject {
        title: Some("Soil carbon".to_string()),
        ..Default::default()
    };
    let updated = ProjectRepo::update(&pool, project.id, &input, &EDITABLE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Soil carbon");
    assert_eq!(updated.objectives.as_deref(), Some("Objectives"));

    common::make_submittable(&pool, project.id).await;
    ProjectRepo::transition(&pool, project.id, ProjectAction::Submit, &TransitionUpdate::default())
        .await
        .unwrap()
        .unwrap();
    let blocked = ProjectRepo::update(&pool, project.id, &input, &EDITABLE).await.unwrap();
    assert!(blocked.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_only_drafts(pool: PgPool) {
    let owner = common::create_proponent(&pool, "ana@uni.edu").await;
    let draft = common::create_project(&pool, owner.id, "draft", "Draft").await;
    let submitted = common::create_project(&pool, owner.id, "submitted", "Submitted").await;
    common::make_submittable(&pool, submitted.id).await;
    ProjectRepo::transition(&pool, submitted.id, ProjectAction::Submit, &TransitionUpdate::default())
        .await
        .unwrap()
        .unwrap();

    assert!(ProjectRepo::delete_draft(&pool, draft.id).await.unwrap());
    assert!(!ProjectRepo::delete_draft(&pool, submitted.id).await.unwrap());
    assert!(ProjectRepo::find_by_id(&pool, submitted.id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_slugs_with_prefix(pool: PgPool) {
    let owner = common::create_proponent(&pool, "ana@uni.edu").await;
    common::create_project(&pool, owner.id, "soil", "Soil").await;
    common::create_project(&pool, owner.id, "soil-2", "Soil").await;
    common::create_project(&pool, owner.id, "soils", "Soils").await;

    let mut taken = ProjectRepo::slugs_with_prefix(&pool, "soil").await.unwrap();
    taken.sort();
    assert_eq!(taken, vec!["soil".to_string(), "soil-2".to_string()]);
    assert_eq!(portal_core::slug::unique_slug("soil", &taken), "soil-3");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_slug_violates_unique_constraint(pool: PgPool) {
    let owner = common::create_proponent(&pool, "ana@uni.edu").await;
    common::create_project(&pool, owner.id, "soil", "Soil").await;

    let err = portal_db::repositories::ProjectRepo::create(
        &pool,
        &portal_db::models::project::CreateProject {
            slug: "soil".to_string(),
            title: "Soil again".to_string(),
            objectives: None,
            justification: None,
            scope: None,
            owner_id: owner.id,
        },
    )
    .await
    .unwrap_err();
    let constraint = err
        .as_database_error()
        .and_then(|e| e.constraint())
        .map(str::to_string);
    assert_eq!(constraint.as_deref(), Some("uq_projects_slug"));
}
