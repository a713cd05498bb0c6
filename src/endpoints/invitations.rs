use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::endpoints::extractors::AuthUser;
use crate::error::Result;
use crate::services::invitation::{InvitationResponse, IssueInvitationsRequest};
use crate::state::AppState;

/// Create invitation routes, nested under `/api/courses`
pub fn invitations_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/{course_id}/invitations",
            get(list_invitations).post(issue_invitations),
        )
        .with_state(state)
}

/// List invitations of a course (requires enrol/invitation:enrol)
async fn list_invitations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(course_id): Path<i64>,
) -> Result<Json<Vec<InvitationResponse>>> {
    let invitations = state.invitations.list(&user, course_id).await?;
    Ok(Json(
        invitations.into_iter().map(InvitationResponse::from).collect(),
    ))
}

/// Invite one or more email addresses (requires enrol/invitation:enrol)
async fn issue_invitations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(course_id): Path<i64>,
    Json(data): Json<IssueInvitationsRequest>,
) -> Result<(StatusCode, Json<Vec<InvitationResponse>>)> {
    let created = state.invitations.issue(&user, course_id, data).await?;
    Ok((
        StatusCode::CREATED,
        Json(created.into_iter().map(InvitationResponse::from).collect()),
    ))
}
