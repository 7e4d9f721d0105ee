//! Legal instrument catalog, version snapshot and per-project instance models.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use portal_core::error::CoreError;
use portal_core::legal_instrument::{Answers, FieldSpec, FillStatus};
use portal_core::types::{DbId, Timestamp};

/// A row from the `legal_instruments` catalog.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LegalInstrument {
    pub id: DbId,
    pub instrument_type: String,
    pub name: String,
    pub description: Option<String>,
    pub field_spec: Json<Vec<FieldSpec>>,
    pub template_body: String,
    pub template_file_key: Option<String>,
    pub current_version: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a catalog entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLegalInstrument {
    pub instrument_type: String,
    pub name: String,
    pub description: Option<String>,
    pub field_spec: Vec<FieldSpec>,
    #[serde(default)]
    pub template_body: String,
    pub template_file_key: Option<String>,
}

/// DTO for updating a catalog entry. Changing `field_spec`, `template_body`
/// or `template_file_key` creates a new version.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLegalInstrument {
    pub name: Option<String>,
    pub description: Option<String>,
    pub field_spec: Option<Vec<FieldSpec>>,
    pub template_body: Option<String>,
    pub template_file_key: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateLegalInstrument {
    /// Whether applying this update changes the versioned content.
    pub fn changes_content(&self) -> bool {
        self.field_spec.is_some() || self.template_body.is_some() || self.template_file_key.is_some()
    }
}

/// Immutable snapshot of a catalog entry's fields and template.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LegalInstrumentVersion {
    pub id: DbId,
    pub legal_instrument_id: DbId,
    pub version: i32,
    pub field_spec: Json<Vec<FieldSpec>>,
    pub template_body: String,
    pub template_file_key: Option<String>,
    pub created_at: Timestamp,
}

/// The instrument attached to one project, pinned to a version.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LegalInstrumentInstance {
    pub id: DbId,
    pub project_id: DbId,
    pub version_id: DbId,
    pub answers: Json<Answers>,
    pub fill_status: String,
    pub output_file_key: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LegalInstrumentInstance {
    /// Parse the stored fill status text.
    pub fn fill_status(&self) -> Result<FillStatus, CoreError> {
        FillStatus::from_str_db(&self.fill_status)
    }
}
