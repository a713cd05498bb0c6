use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::endpoints::extractors::RequestUser;
use crate::error::{AppError, Result};
use crate::services::redemption::{Redemption, RedemptionError};
use crate::state::AppState;

/// Create enrolment routes
pub fn enrol_routes(state: AppState) -> Router {
    Router::new()
        .route("/invitation/redeem", get(redeem))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RedeemParams {
    pub token: String,
    /// Course id
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub redemption: Redemption,
}

#[derive(Debug, Serialize)]
pub struct NoActionResponse {
    pub status: &'static str,
    pub reason: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// Redeem an invitation link for the current user
async fn redeem(
    State(state): State<AppState>,
    RequestUser(user): RequestUser,
    Query(params): Query<RedeemParams>,
) -> Result<Response> {
    match state
        .redemption
        .redeem(&params.token, params.id, &user, Utc::now())
        .await
    {
        Ok(redemption) => Ok(Json(RedeemResponse {
            status: "enrolled",
            redemption,
        })
        .into_response()),
        Err(e) => redemption_failure(e),
    }
}

/// Expected states answer 200 with no action taken; dead links answer 410
fn redemption_failure(e: RedemptionError) -> Result<Response> {
    if e.is_no_action() {
        tracing::debug!("Redemption took no action: {}", e);
        return Ok(Json(NoActionResponse {
            status: "no_action",
            reason: e.reason(),
        })
        .into_response());
    }

    if e.is_terminal() {
        tracing::info!("Rejected invitation link: {}", e);
        return Err(AppError::Gone("Invitation no longer valid".to_string()));
    }

    Err(AppError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use crate::services::host::EnrolError;

    fn status_of(e: RedemptionError) -> StatusCode {
        match redemption_failure(e) {
            Ok(resp) => resp.status(),
            Err(err) => err.into_response().status(),
        }
    }

    #[test]
    fn test_no_action_states_answer_ok() {
        assert_eq!(status_of(RedemptionError::AlreadyEnrolled), StatusCode::OK);
        assert_eq!(status_of(RedemptionError::NotYetOpen), StatusCode::OK);
        assert_eq!(status_of(RedemptionError::GuestNotAllowed), StatusCode::OK);
        assert_eq!(status_of(RedemptionError::NoRole), StatusCode::OK);
        assert_eq!(status_of(RedemptionError::InstanceDisabled), StatusCode::OK);
    }

    #[test]
    fn test_terminal_states_answer_gone() {
        assert_eq!(status_of(RedemptionError::NotFound), StatusCode::GONE);
        assert_eq!(status_of(RedemptionError::CourseMismatch), StatusCode::GONE);
        assert_eq!(status_of(RedemptionError::Expired), StatusCode::GONE);
        assert_eq!(status_of(RedemptionError::AlreadyRedeemed), StatusCode::GONE);
    }

    #[test]
    fn test_failures_answer_server_error() {
        assert_eq!(
            status_of(RedemptionError::Persist("locked".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(RedemptionError::Enrol(EnrolError::Backend("down".to_string()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
