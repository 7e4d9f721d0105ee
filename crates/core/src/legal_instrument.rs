//! Legal instrument types, field specifications, fill-status derivation and
//! template preview rendering.
//!
//! A legal instrument version carries a list of [`FieldSpec`]s. A project's
//! instance stores an answers map (`field id -> JSON value`) from which the
//! [`FillStatus`] is derived on every save.

use std::collections::HashSet;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Answers submitted for a legal instrument instance, keyed by field id.
pub type Answers = Map<String, Value>;

/// Regex matching `{{field_id}}` placeholders in template bodies.
static PLACEHOLDER_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\{\{\s*([A-Za-z0-9_\-]+)\s*\}\}").expect("valid regex"));

/// Maximum number of fields in one specification.
pub const MAX_FIELDS: usize = 200;

/// Maximum length of a field id.
pub const MAX_FIELD_ID_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Instrument types
// ---------------------------------------------------------------------------

/// The eight kinds of legal instrument a project can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentType {
    Nda,
    TechnicalCooperationAgreement,
    PdiPartnershipAgreement,
    PdiFoundationAgreement,
    ServiceContract,
    MemorandumOfUnderstanding,
    LicensingContract,
    TechnologyTransferContract,
}

impl InstrumentType {
    pub const ALL: [InstrumentType; 8] = [
        Self::Nda,
        Self::TechnicalCooperationAgreement,
        Self::PdiPartnershipAgreement,
        Self::PdiFoundationAgreement,
        Self::ServiceContract,
        Self::MemorandumOfUnderstanding,
        Self::LicensingContract,
        Self::TechnologyTransferContract,
    ];

    /// Parse an instrument type string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid instrument type '{s}'. Must be one of: {}",
                    Self::ALL.map(Self::as_str).join(", ")
                ))
            })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nda => "nda",
            Self::TechnicalCooperationAgreement => "technical_cooperation_agreement",
            Self::PdiPartnershipAgreement => "pdi_partnership_agreement",
            Self::PdiFoundationAgreement => "pdi_foundation_agreement",
            Self::ServiceContract => "service_contract",
            Self::MemorandumOfUnderstanding => "memorandum_of_understanding",
            Self::LicensingContract => "licensing_contract",
            Self::TechnologyTransferContract => "technology_transfer_contract",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Nda => "Non-disclosure agreement (NDA)",
            Self::TechnicalCooperationAgreement => "Technical cooperation agreement",
            Self::PdiPartnershipAgreement => "PD&I partnership agreement",
            Self::PdiFoundationAgreement => "PD&I agreement with support foundation",
            Self::ServiceContract => "Service contract",
            Self::MemorandumOfUnderstanding => "Memorandum of understanding",
            Self::LicensingContract => "Technology licensing contract",
            Self::TechnologyTransferContract => "Technology transfer contract",
        }
    }
}

// ---------------------------------------------------------------------------
// Field specifications
// ---------------------------------------------------------------------------

/// Input widget kind for a field. Informational for clients; derivation
/// treats every kind the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Textarea,
    Number,
    Date,
    Select,
}

/// One field of a legal instrument template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub kind: FieldKind,
    /// Allowed values for `select` fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// Validate a field specification list: non-empty, bounded, unique ids made
/// of `[A-Za-z0-9_-]`, and `select` fields carrying options.
pub fn validate_field_specs(fields: &[FieldSpec]) -> Result<(), CoreError> {
    if fields.is_empty() {
        return Err(CoreError::Validation(
            "A legal instrument must declare at least one field".to_string(),
        ));
    }
    if fields.len() > MAX_FIELDS {
        return Err(CoreError::Validation(format!(
            "A legal instrument may declare at most {MAX_FIELDS} fields"
        )));
    }

    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        if field.id.is_empty() || field.id.len() > MAX_FIELD_ID_LEN {
            return Err(CoreError::Validation(format!(
                "Field id must be between 1 and {MAX_FIELD_ID_LEN} characters"
            )));
        }
        if !field
            .id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(CoreError::Validation(format!(
                "Field id '{}' may only contain letters, digits, '_' and '-'",
                field.id
            )));
        }
        if !seen.insert(field.id.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate field id '{}'",
                field.id
            )));
        }
        if field.kind == FieldKind::Select && field.options.is_empty() {
            return Err(CoreError::Validation(format!(
                "Select field '{}' must declare at least one option",
                field.id
            )));
        }
    }
    Ok(())
}

/// Reject answers keyed by ids that are not part of the specification.
pub fn validate_answer_keys(fields: &[FieldSpec], answers: &Answers) -> Result<(), CoreError> {
    let known: HashSet<&str> = fields.iter().map(|f| f.id.as_str()).collect();
    let mut unknown: Vec<&str> = answers
        .keys()
        .map(String::as_str)
        .filter(|k| !known.contains(k))
        .collect();
    if unknown.is_empty() {
        return Ok(());
    }
    unknown.sort_unstable();
    Err(CoreError::Validation(format!(
        "Unknown field(s): {}",
        unknown.join(", ")
    )))
}

// ---------------------------------------------------------------------------
// Fill status
// ---------------------------------------------------------------------------

/// Completion state of a legal instrument instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FillStatus {
    Pending,
    Partial,
    Filled,
}

impl FillStatus {
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PARTIAL" => Ok(Self::Partial),
            "FILLED" => Ok(Self::Filled),
            _ => Err(CoreError::Validation(format!(
                "Invalid fill status '{s}'. Must be one of: PENDING, PARTIAL, FILLED"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Partial => "PARTIAL",
            Self::Filled => "FILLED",
        }
    }
}

/// Whether an answer value counts as provided.
///
/// Strings must be non-blank after trimming; numbers and booleans always
/// count; arrays and objects count when non-empty; `null` never counts.
pub fn is_value_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(_) | Value::Bool(_) => true,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Derive the fill status of an answers map against a field specification.
///
/// - `Filled` when every required field has a present value. A specification
///   without required fields is always `Filled`.
/// - `Partial` when some field has a present value but a required one is missing.
/// - `Pending` otherwise.
pub fn derive_fill_status(fields: &[FieldSpec], answers: &Answers) -> FillStatus {
    let present = |id: &str| answers.get(id).is_some_and(is_value_present);

    if fields.iter().filter(|f| f.required).all(|f| present(&f.id)) {
        FillStatus::Filled
    } else if fields.iter().any(|f| present(&f.id)) {
        FillStatus::Partial
    } else {
        FillStatus::Pending
    }
}

/// Ids of required fields that are still missing, in specification order.
pub fn missing_required_fields<'a>(fields: &'a [FieldSpec], answers: &Answers) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|f| f.required && !answers.get(&f.id).is_some_and(is_value_present))
        .map(|f| f.id.as_str())
        .collect()
}

// ---------------------------------------------------------------------------
// Template rendering
// ---------------------------------------------------------------------------

/// Render a template body by substituting `{{field_id}}` placeholders.
///
/// Missing or empty answers render as `[label]` (or `[field_id]` for
/// placeholders that match no field) so the preview shows what is still
/// to be filled.
pub fn render_template(template: &str, fields: &[FieldSpec], answers: &Answers) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let id = &caps[1];
            match answers.get(id).filter(|v| is_value_present(v)) {
                Some(Value::String(s)) => s.trim().to_string(),
                Some(other) => other.to_string(),
                None => {
                    let label = fields
                        .iter()
                        .find(|f| f.id == id)
                        .map_or(id, |f| f.label.as_str());
                    format!("[{label}]")
                }
            }
        })
        .into_owned()
}
