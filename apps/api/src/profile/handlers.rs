use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::AuthContext;
use crate::errors::AppError;
use crate::models::user::User;
use crate::profile::completion::ProfileCompletionState;
use crate::profile::finalizer::{CompletedProfile, CompletionOutcome};
use crate::profile::models::{SectionKind, SectionPayload};
use crate::profile::sessions::SharedSession;
use crate::profile::validation::check_step;
use crate::profile::workflow::{WorkflowSession, WorkflowView};
use crate::state::AppState;
use crate::store::SaveAck;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionResponse {
    pub section: SectionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<SectionPayload>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub absent: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSectionResponse {
    pub ack: SaveAck,
    pub completion: ProfileCompletionState,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    #[serde(flatten)]
    pub completion: ProfileCompletionState,
    pub degraded_sections: Vec<SectionKind>,
}

/// Body of Next, Skip and Submit. `section` lets a stale client be told that
/// the workflow has moved on.
#[derive(Deserialize)]
pub struct TransitionRequest {
    #[serde(default)]
    pub section: Option<SectionKind>,
    pub payload: Value,
}

#[derive(Deserialize, Default)]
pub struct PreviousRequest {
    #[serde(default)]
    pub section: Option<SectionKind>,
    #[serde(default)]
    pub payload: Option<Value>,
}

#[derive(Serialize)]
pub struct CompletedResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub profile: CompletedProfile,
}

fn parse_slug(slug: &str) -> Result<SectionKind, AppError> {
    SectionKind::from_slug(slug)
        .ok_or_else(|| AppError::NotFound(format!("Unknown profile section '{slug}'")))
}

fn decode(kind: SectionKind, value: Value) -> Result<SectionPayload, AppError> {
    SectionPayload::from_value(kind, value)
        .map_err(|e| AppError::BadRequest(format!("Malformed {kind} payload: {e}")))
}

/// Decodes a transition body against the kind the client claims, defaulting
/// to the session's current step.
fn decode_draft(
    session: &WorkflowSession,
    section: Option<SectionKind>,
    value: Value,
) -> Result<SectionPayload, AppError> {
    decode(section.unwrap_or_else(|| session.step().kind()), value)
}

async fn current_session(state: &AppState, auth: &AuthContext) -> Result<SharedSession, AppError> {
    state.sessions.get(auth.user_id).await.ok_or_else(|| {
        AppError::NotFound("No profile workflow in progress, start one first".to_string())
    })
}

fn completed(profile: CompletedProfile) -> Json<CompletedResponse> {
    Json(CompletedResponse { ok: true, profile })
}

/// GET /api/v1/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<User>, AppError> {
    let user = state
        .users
        .find_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", auth.user_id)))?;
    Ok(Json(user))
}

/// GET /api/v1/profile/sections/:kind
pub async fn handle_get_section(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(slug): Path<String>,
) -> Result<Json<SectionResponse>, AppError> {
    let kind = parse_slug(&slug)?;
    let payload = state.store.load_section(auth.user_id, kind).await?;
    Ok(Json(SectionResponse {
        section: kind,
        absent: payload.is_none(),
        payload,
    }))
}

/// PUT|POST /api/v1/profile/sections/:kind
///
/// Full replacement, gated by the same step check as Next.
pub async fn handle_save_section(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(slug): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<SaveSectionResponse>, AppError> {
    let kind = parse_slug(&slug)?;
    let payload = decode(kind, body)?;

    let report = check_step(&payload);
    if !report.passed {
        return Err(AppError::SectionInvalid(report));
    }

    let ack = state.store.save_section(auth.user_id, &payload).await?;
    info!(user_id = %auth.user_id, section = %kind, created = ack.created, "Section saved directly");

    let sections = state.store.load_all_sections(auth.user_id).await;
    Ok(Json(SaveSectionResponse {
        ack,
        completion: ProfileCompletionState::compute(&sections),
    }))
}

/// GET /api/v1/profile/progress
pub async fn handle_progress(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ProgressResponse>, AppError> {
    let sections = state.store.load_all_sections(auth.user_id).await;
    Ok(Json(ProgressResponse {
        completion: ProfileCompletionState::compute(&sections),
        degraded_sections: sections.failed(),
    }))
}

/// POST /api/v1/profile/complete
pub async fn handle_complete(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Response, AppError> {
    match state.finalizer.complete(&auth).await? {
        CompletionOutcome::Completed(profile) => {
            state.sessions.remove(auth.user_id).await;
            Ok(completed(profile).into_response())
        }
        CompletionOutcome::Rejected { missing_sections } => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "ok": false,
                "message": "Please complete all required sections",
                "missingSections": missing_sections,
            })),
        )
            .into_response()),
    }
}

/// POST /api/v1/profile/workflow/start
pub async fn handle_workflow_start(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<WorkflowView>, AppError> {
    let account_email = match state.users.find_user(auth.user_id).await {
        Ok(user) => user.map(|u| u.email).filter(|e| !e.is_empty()),
        Err(e) => {
            warn!(user_id = %auth.user_id, error = %e, "User lookup failed, no email prefill");
            None
        }
    };

    let session = state.workflow.start(auth, account_email).await;
    let view = session.view();
    state.sessions.insert(session).await;
    Ok(Json(view))
}

/// GET /api/v1/profile/workflow
pub async fn handle_workflow_view(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<WorkflowView>, AppError> {
    let shared = current_session(&state, &auth).await?;
    let session = shared.lock().await;
    Ok(Json(session.view()))
}

/// POST /api/v1/profile/workflow/next
pub async fn handle_workflow_next(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<WorkflowView>, AppError> {
    let shared = current_session(&state, &auth).await?;
    let mut session = shared.lock().await;
    let draft = decode_draft(&session, req.section, req.payload)?;
    Ok(Json(state.workflow.next(&mut session, draft).await?))
}

/// POST /api/v1/profile/workflow/previous
pub async fn handle_workflow_previous(
    State(state): State<AppState>,
    auth: AuthContext,
    body: Option<Json<PreviousRequest>>,
) -> Result<Json<WorkflowView>, AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let shared = current_session(&state, &auth).await?;
    let mut session = shared.lock().await;
    let draft = match req.payload {
        Some(value) => Some(decode_draft(&session, req.section, value)?),
        None => None,
    };
    Ok(Json(state.workflow.previous(&mut session, draft).await?))
}

/// POST /api/v1/profile/workflow/skip
pub async fn handle_workflow_skip(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<WorkflowView>, AppError> {
    let shared = current_session(&state, &auth).await?;
    let mut session = shared.lock().await;
    let draft = decode_draft(&session, req.section, req.payload)?;
    Ok(Json(state.workflow.skip(&mut session, draft).await?))
}

/// POST /api/v1/profile/workflow/submit
pub async fn handle_workflow_submit(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<CompletedResponse>, AppError> {
    let shared = current_session(&state, &auth).await?;
    let profile = {
        let mut session = shared.lock().await;
        let draft = decode_draft(&session, req.section, req.payload)?;
        state.workflow.submit(&mut session, draft).await?
    };
    state.sessions.remove(auth.user_id).await;
    Ok(completed(profile))
}
