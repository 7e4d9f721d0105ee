//! Repositories for `legal_instruments`, `legal_instrument_versions` and
//! `legal_instrument_instances`.

use sqlx::types::Json;
use sqlx::PgPool;
use portal_core::legal_instrument::{derive_fill_status, Answers, FieldSpec, FillStatus};
use portal_core::project_status::ProjectStatus;
use portal_core::types::DbId;

use super::status_texts;
use crate::models::legal_instrument::{
    CreateLegalInstrument, LegalInstrument, LegalInstrumentInstance, LegalInstrumentVersion,
    UpdateLegalInstrument,
};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

const COLUMNS: &str = "id, instrument_type, name, description, field_spec, template_body, \
                       template_file_key, current_version, is_active, created_at, updated_at";

const VERSION_COLUMNS: &str =
    "id, legal_instrument_id, version, field_spec, template_body, template_file_key, created_at";

const INSTANCE_COLUMNS: &str = "id, project_id, version_id, answers, fill_status, \
                                output_file_key, created_at, updated_at";

/// Upper bound for each statement inside the attach transaction.
const ATTACH_STATEMENT_TIMEOUT_MS: u32 = 5_000;

// ---------------------------------------------------------------------------
// LegalInstrumentRepo
// ---------------------------------------------------------------------------

/// Catalog operations.
pub struct LegalInstrumentRepo;

impl LegalInstrumentRepo {
    /// List catalog entries ordered by name, optionally including inactive ones.
    pub async fn list(
        pool: &PgPool,
        include_inactive: bool,
    ) -> Result<Vec<LegalInstrument>, sqlx::Error> {
        let filter = if include_inactive { "" } else { "WHERE is_active" };
        let query = format!("SELECT {COLUMNS} FROM legal_instruments {filter} ORDER BY name, id");
        sqlx::query_as::<_, LegalInstrument>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<LegalInstrument>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM legal_instruments WHERE id = $1");
        sqlx::query_as::<_, LegalInstrument>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active catalog entry for an instrument type (classification outcome).
    pub async fn find_active_by_type(
        pool: &PgPool,
        instrument_type: &str,
    ) -> Result<Option<LegalInstrument>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM legal_instruments WHERE instrument_type = $1 AND is_active"
        );
        sqlx::query_as::<_, LegalInstrument>(&query)
            .bind(instrument_type)
            .fetch_optional(pool)
            .await
    }

    /// Insert a catalog entry at version 1.
    pub async fn create(
        pool: &PgPool,
        input: &CreateLegalInstrument,
    ) -> Result<LegalInstrument, sqlx::Error> {
        let query = format!(
            "INSERT INTO legal_instruments
                (instrument_type, name, description, field_spec, template_body, template_file_key)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LegalInstrument>(&query)
            .bind(&input.instrument_type)
            .bind(&input.name)
            .bind(&input.description)
            .bind(Json(&input.field_spec))
            .bind(&input.template_body)
            .bind(&input.template_file_key)
            .fetch_one(pool)
            .await
    }

    /// Update a catalog entry. Only non-`None` fields are applied; a content
    /// change bumps `current_version`. Existing snapshots are never touched.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateLegalInstrument,
    ) -> Result<Option<LegalInstrument>, sqlx::Error> {
        let query = format!(
            "UPDATE legal_instruments SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                field_spec = COALESCE($4, field_spec),
                template_body = COALESCE($5, template_body),
                template_file_key = COALESCE($6, template_file_key),
                is_active = COALESCE($7, is_active),
                current_version = current_version + CASE WHEN $8 THEN 1 ELSE 0 END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LegalInstrument>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.field_spec.as_ref().map(Json))
            .bind(&input.template_body)
            .bind(&input.template_file_key)
            .bind(input.is_active)
            .bind(input.changes_content())
            .fetch_optional(pool)
            .await
    }
}

// ---------------------------------------------------------------------------
// LegalInstrumentVersionRepo
// ---------------------------------------------------------------------------

/// Read access to immutable version snapshots.
pub struct LegalInstrumentVersionRepo;

impl LegalInstrumentVersionRepo {
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<LegalInstrumentVersion>, sqlx::Error> {
        let query = format!("SELECT {VERSION_COLUMNS} FROM legal_instrument_versions WHERE id = $1");
        sqlx::query_as::<_, LegalInstrumentVersion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Snapshots of one catalog entry, newest first.
    pub async fn list_for_instrument(
        pool: &PgPool,
        legal_instrument_id: DbId,
    ) -> Result<Vec<LegalInstrumentVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM legal_instrument_versions
             WHERE legal_instrument_id = $1
             ORDER BY version DESC"
        );
        sqlx::query_as::<_, LegalInstrumentVersion>(&query)
            .bind(legal_instrument_id)
            .fetch_all(pool)
            .await
    }
}

// ---------------------------------------------------------------------------
// LegalInstrumentInstanceRepo
// ---------------------------------------------------------------------------

/// Result of [`LegalInstrumentInstanceRepo::attach`].
#[derive(Debug)]
pub enum AttachOutcome {
    Attached(LegalInstrumentInstance),
    ProjectNotFound,
    ProjectNotEditable,
    /// The catalog entry does not exist or is inactive.
    InstrumentUnavailable,
}

/// Per-project instance operations.
pub struct LegalInstrumentInstanceRepo;

impl LegalInstrumentInstanceRepo {
    pub async fn find_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Option<LegalInstrumentInstance>, sqlx::Error> {
        let query = format!(
            "SELECT {INSTANCE_COLUMNS} FROM legal_instrument_instances WHERE project_id = $1"
        );
        sqlx::query_as::<_, LegalInstrumentInstance>(&query)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// Fill status of a project's instance, `None` when nothing is attached.
    pub async fn fill_status_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT fill_status FROM legal_instrument_instances WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_optional(pool)
        .await
    }

    /// Attach the current version of a catalog entry to a project.
    ///
    /// Runs in a SERIALIZABLE transaction: the version snapshot for the
    /// entry's `current_version` is created if missing, then the project's
    /// instance is created or repointed. Repointing to a different version
    /// clears the answers. Serialization failures surface as `sqlx::Error`
    /// with SQLSTATE 40001.
    pub async fn attach(
        pool: &PgPool,
        project_id: DbId,
        legal_instrument_id: DbId,
        editable: &[ProjectStatus],
    ) -> Result<AttachOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = {ATTACH_STATEMENT_TIMEOUT_MS}"
        ))
        .execute(&mut *tx)
        .await?;

        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM projects WHERE id = $1 FOR UPDATE")
                .bind(project_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(status) = status else {
            return Ok(AttachOutcome::ProjectNotFound);
        };
        if !status_texts(editable).contains(&status) {
            return Ok(AttachOutcome::ProjectNotEditable);
        }

        sqlx::query(
            "INSERT INTO legal_instrument_versions
                (legal_instrument_id, version, field_spec, template_body, template_file_key)
             SELECT id, current_version, field_spec, template_body, template_file_key
             FROM legal_instruments WHERE id = $1 AND is_active
             ON CONFLICT ON CONSTRAINT uq_legal_instrument_versions DO NOTHING",
        )
        .bind(legal_instrument_id)
        .execute(&mut *tx)
        .await?;

        let version: Option<(DbId, Json<Vec<FieldSpec>>)> = sqlx::query_as(
            "SELECT v.id, v.field_spec FROM legal_instrument_versions v
             JOIN legal_instruments li
               ON li.id = v.legal_instrument_id AND li.current_version = v.version
             WHERE li.id = $1 AND li.is_active",
        )
        .bind(legal_instrument_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((version_id, Json(field_spec))) = version else {
            return Ok(AttachOutcome::InstrumentUnavailable);
        };
        let empty_status = derive_fill_status(&field_spec, &Answers::new());

        let query = format!(
            "INSERT INTO legal_instrument_instances (project_id, version_id, fill_status)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_legal_instrument_instances_project_id DO UPDATE SET
                answers = CASE WHEN legal_instrument_instances.version_id = EXCLUDED.version_id
                               THEN legal_instrument_instances.answers ELSE '{{}}'::jsonb END,
                fill_status = CASE WHEN legal_instrument_instances.version_id = EXCLUDED.version_id
                                   THEN legal_instrument_instances.fill_status ELSE $3 END,
                output_file_key = CASE WHEN legal_instrument_instances.version_id = EXCLUDED.version_id
                                       THEN legal_instrument_instances.output_file_key ELSE NULL END,
                version_id = EXCLUDED.version_id
             RETURNING {INSTANCE_COLUMNS}"
        );
        let instance = sqlx::query_as::<_, LegalInstrumentInstance>(&query)
            .bind(project_id)
            .bind(version_id)
            .bind(empty_status.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(AttachOutcome::Attached(instance))
    }

    /// Replace the answer map and store its derived fill status.
    ///
    /// Only applies while the owning project is in one of `editable`;
    /// returns `None` otherwise.
    pub async fn replace_answers(
        pool: &PgPool,
        instance_id: DbId,
        answers: &Answers,
        fill_status: FillStatus,
        editable: &[ProjectStatus],
    ) -> Result<Option<LegalInstrumentInstance>, sqlx::Error> {
        let query = format!(
            "UPDATE legal_instrument_instances i SET answers = $2, fill_status = $3
             FROM projects p
             WHERE i.id = $1 AND p.id = i.project_id AND p.status = ANY($4)
             RETURNING {}",
            prefixed_instance_columns("i")
        );
        sqlx::query_as::<_, LegalInstrumentInstance>(&query)
            .bind(instance_id)
            .bind(Json(answers))
            .bind(fill_status.as_str())
            .bind(status_texts(editable))
            .fetch_optional(pool)
            .await
    }

    /// Merge `patch` into the stored answers (autosave) and re-derive the
    /// fill status against `fields`, under a row lock.
    pub async fn merge_answers(
        pool: &PgPool,
        instance_id: DbId,
        patch: &Answers,
        fields: &[FieldSpec],
        editable: &[ProjectStatus],
    ) -> Result<Option<LegalInstrumentInstance>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current: Option<Json<Answers>> = sqlx::query_scalar(
            "SELECT i.answers FROM legal_instrument_instances i
             JOIN projects p ON p.id = i.project_id
             WHERE i.id = $1 AND p.status = ANY($2)
             FOR UPDATE OF i",
        )
        .bind(instance_id)
        .bind(status_texts(editable))
        .fetch_optional(&mut *tx)
        .await?;
        let Some(Json(mut answers)) = current else {
            return Ok(None);
        };

        for (key, value) in patch {
            answers.insert(key.clone(), value.clone());
        }
        let fill_status = derive_fill_status(fields, &answers);

        let query = format!(
            "UPDATE legal_instrument_instances SET answers = $2, fill_status = $3
             WHERE id = $1
             RETURNING {INSTANCE_COLUMNS}"
        );
        let instance = sqlx::query_as::<_, LegalInstrumentInstance>(&query)
            .bind(instance_id)
            .bind(Json(&answers))
            .bind(fill_status.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(instance))
    }
}

/// Instance column list qualified with a table alias.
fn prefixed_instance_columns(alias: &str) -> String {
    INSTANCE_COLUMNS
        .split(", ")
        .map(|c| format!("{alias}.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}
