//! HTTP handlers for questions, help requests and knowledge

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::error::DeskError;
use crate::server::ServerState;
use crate::types::{AnswerSource, HelpRequest, RequestStatus, Resolution};

/// Question from a caller
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

/// Either a direct answer or an escalation notice
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AskResponse {
    Answered {
        answer: String,
        source: AnswerSource,
    },
    Escalated {
        escalated: bool,
        message: String,
        request_id: String,
        request: HelpRequest,
    },
}

impl From<Resolution> for AskResponse {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Answered { source, text } => AskResponse::Answered { answer: text, source },
            Resolution::Escalated { request, message } => AskResponse::Escalated {
                escalated: true,
                message,
                request_id: request.id.clone(),
                request,
            },
        }
    }
}

/// Supervisor's answer to a help request
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub success: bool,
    pub message: String,
    pub request: HelpRequest,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// `pending` (default), `resolved` or `all`
    #[serde(default)]
    pub status: Option<String>,
}

impl IntoResponse for DeskError {
    fn into_response(self) -> Response {
        let status = match &self {
            DeskError::Validation(_) => StatusCode::BAD_REQUEST,
            DeskError::NotFound { .. } => StatusCode::NOT_FOUND,
            DeskError::AlreadyResolved { .. } => StatusCode::CONFLICT,
            DeskError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if !self.is_recoverable() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
    }
}

/// POST /ask
pub async fn ask_handler(
    State(state): State<ServerState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, DeskError> {
    let resolution = state.desk.submit_question(&req.question).await?;
    Ok(Json(resolution.into()))
}

/// GET /requests
pub async fn list_requests_handler(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<HelpRequest>>, DeskError> {
    let requests = match query.status.as_deref().unwrap_or("pending") {
        "all" => state.desk.list_requests(None).await?,
        other => {
            let status = RequestStatus::parse(other).ok_or_else(|| {
                DeskError::validation(format!("unknown status filter '{}'", other))
            })?;
            state.desk.list_requests(Some(status)).await?
        }
    };
    Ok(Json(requests))
}

/// GET /requests/{id}
pub async fn get_request_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<HelpRequest>, DeskError> {
    Ok(Json(state.desk.get_request(&id).await?))
}

/// POST /requests/{id}
pub async fn resolve_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, DeskError> {
    let request = state.desk.submit_resolution(&id, &req.answer).await?;
    Ok(Json(ResolveResponse {
        success: true,
        message: "Answer saved. The assistant has learned it.".to_string(),
        request,
    }))
}

/// GET /knowledge
pub async fn list_knowledge_handler(State(state): State<ServerState>) -> impl IntoResponse {
    match state.desk.list_knowledge().await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /api/status
pub async fn status_handler(State(state): State<ServerState>) -> impl IntoResponse {
    match state.desk.stats().await {
        Ok(stats) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "version": crate::VERSION,
                "knowledge_entries": stats.knowledge_entries,
                "pending_requests": stats.pending_requests,
                "resolved_requests": stats.resolved_requests,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
