//! Handlers for the legal instrument classification wizard.
//!
//! The graph is static, so the server is stateless here: clients keep their
//! answer history and replay it to resume.

use axum::extract::State;
use axum::Json;
use portal_core::classification::{Answer, Node, NodeId, Step, Traversal, GRAPH, START};
use portal_core::error::CoreError;
use portal_db::models::legal_instrument::LegalInstrument;
use portal_db::repositories::LegalInstrumentRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// The full question graph.
#[derive(Debug, Serialize)]
pub struct GraphResponse {
    pub start: NodeId,
    pub nodes: &'static [Node],
}

/// Request body for `POST /classification/replay`.
///
/// Either a recorded `history` (checked step by step) or a bare list of
/// `answers` from the start.
#[derive(Debug, Deserialize)]
pub struct ReplayRequest {
    pub history: Option<Vec<Step>>,
    pub answers: Option<Vec<Answer>>,
}

/// Where a replayed traversal ended up.
#[derive(Debug, Serialize)]
pub struct ReplayResponse {
    pub traversal: Traversal,
    /// Prompt of the current question, `None` at an outcome.
    pub question: Option<&'static str>,
    pub outcome: Option<OutcomeView>,
}

/// The instrument type reached and its active catalog entry, if any.
#[derive(Debug, Serialize)]
pub struct OutcomeView {
    pub instrument_type: String,
    pub label: &'static str,
    pub legal_instrument: Option<LegalInstrument>,
}

/// GET /api/v1/classification
pub async fn graph(_auth: AuthUser) -> Json<DataResponse<GraphResponse>> {
    Json(DataResponse {
        data: GraphResponse {
            start: START,
            nodes: &GRAPH,
        },
    })
}

/// POST /api/v1/classification/replay
pub async fn replay(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ReplayRequest>,
) -> AppResult<Json<DataResponse<ReplayResponse>>> {
    let traversal = match (input.history, input.answers) {
        (Some(history), None) => Traversal::replay_history(&history)?,
        (None, Some(answers)) => Traversal::replay(&answers)?,
        (None, None) => Traversal::new(),
        (Some(_), Some(_)) => {
            return Err(AppError::Core(CoreError::Validation(
                "Provide either history or answers, not both".into(),
            )))
        }
    };

    let question = match traversal.current.node() {
        Node::Question { prompt, .. } => Some(*prompt),
        Node::Outcome { .. } => None,
    };

    let outcome = match traversal.outcome() {
        Some(instrument_type) => Some(OutcomeView {
            instrument_type: instrument_type.as_str().to_string(),
            label: instrument_type.label(),
            legal_instrument: LegalInstrumentRepo::find_active_by_type(
                &state.pool,
                instrument_type.as_str(),
            )
            .await?,
        }),
        None => None,
    };

    Ok(Json(DataResponse {
        data: ReplayResponse {
            traversal,
            question,
            outcome,
        },
    }))
}
