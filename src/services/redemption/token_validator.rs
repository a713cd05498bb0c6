use chrono::{DateTime, Utc};

use super::RedemptionError;
use crate::models::invitation;
use crate::services::host::{CurrentUser, Directory, TokenStore};
use crate::services::security::is_valid_token;

/// Run every check against the token, in order, without side effects.
///
/// Existence and course binding come first so a token presented for a
/// foreign course is rejected before anything about its window is examined.
/// The instance the token was issued on must still exist in that course and
/// be enabled.
pub(super) async fn validate(
    tokens: &dyn TokenStore,
    directory: &dyn Directory,
    token: &str,
    course_id: i64,
    redeemer: &CurrentUser,
    now: DateTime<Utc>,
) -> Result<invitation::Model, RedemptionError> {
    if !is_valid_token(token) {
        return Err(RedemptionError::NotFound);
    }

    let invitation = tokens
        .find_unused(token)
        .await?
        .ok_or(RedemptionError::NotFound)?;

    if invitation.course_id != course_id {
        return Err(RedemptionError::CourseMismatch);
    }

    match directory.instance(invitation.instance_id).await? {
        Some(instance) if instance.course_id == course_id => {
            if !instance.enabled {
                return Err(RedemptionError::InstanceDisabled);
            }
        }
        _ => return Err(RedemptionError::NotFound),
    }

    if redeemer.is_guest {
        return Err(RedemptionError::GuestNotAllowed);
    }

    if directory.is_enrolled(course_id, redeemer.user_id).await? {
        return Err(RedemptionError::AlreadyEnrolled);
    }

    check_window(
        invitation.enrol_start_date,
        invitation.enrol_end_date,
        now,
    )?;

    if invitation.grant_role().is_none() {
        return Err(RedemptionError::NoRole);
    }

    Ok(invitation)
}

/// Enrolment window check; an unset bound leaves that side open
pub fn check_window(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), RedemptionError> {
    if matches!(start, Some(start) if start > now) {
        return Err(RedemptionError::NotYetOpen);
    }
    if matches!(end, Some(end) if end < now) {
        return Err(RedemptionError::Expired);
    }
    Ok(())
}
