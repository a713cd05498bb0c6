//! Invitation redemption.
//!
//! A redemption runs four steps in a straight line and stops at the first
//! failure: validate the token, enrol the redeemer, consume the token, and
//! notify the inviter. The token is consumed only after the enrolment
//! succeeded. Notification failures never affect the outcome.

mod finalizer;
mod token_validator;

pub use token_validator::check_window;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::models::invitation;
use crate::services::host::{
    CurrentUser, Directory, EnrolError, EnrolmentManager, StoreError, TokenStore,
};
use crate::services::links::SiteLinks;
use crate::services::notification::{enrolment_notice, Notifier};

#[derive(Debug, Error)]
pub enum RedemptionError {
    #[error("Invitation token not found")]
    NotFound,

    #[error("Invitation belongs to another course")]
    CourseMismatch,

    #[error("Invitations are disabled for this course")]
    InstanceDisabled,

    #[error("Guests cannot redeem invitations")]
    GuestNotAllowed,

    #[error("User is already enrolled in the course")]
    AlreadyEnrolled,

    #[error("Enrolment is not open yet")]
    NotYetOpen,

    #[error("Enrolment period has ended")]
    Expired,

    #[error("Invitation has no role to grant")]
    NoRole,

    #[error("Enrolment failed: {0}")]
    Enrol(#[from] EnrolError),

    #[error("Invitation was redeemed by another request")]
    AlreadyRedeemed,

    #[error("Failed to mark invitation as used: {0}")]
    Persist(String),

    #[error("Lookup failed: {0}")]
    Lookup(#[from] StoreError),
}

impl RedemptionError {
    /// Expected states where nothing happens and no error page is shown
    pub fn is_no_action(&self) -> bool {
        matches!(
            self,
            RedemptionError::InstanceDisabled
                | RedemptionError::GuestNotAllowed
                | RedemptionError::AlreadyEnrolled
                | RedemptionError::NotYetOpen
                | RedemptionError::NoRole
        )
    }

    /// Terminal states: the invitation can never be redeemed from this link
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RedemptionError::NotFound
                | RedemptionError::CourseMismatch
                | RedemptionError::Expired
                | RedemptionError::AlreadyRedeemed
        )
    }

    /// Short machine-readable reason
    pub fn reason(&self) -> &'static str {
        match self {
            RedemptionError::NotFound => "not_found",
            RedemptionError::CourseMismatch => "course_mismatch",
            RedemptionError::InstanceDisabled => "instance_disabled",
            RedemptionError::GuestNotAllowed => "guest_not_allowed",
            RedemptionError::AlreadyEnrolled => "already_enrolled",
            RedemptionError::NotYetOpen => "not_yet_open",
            RedemptionError::Expired => "expired",
            RedemptionError::NoRole => "no_role",
            RedemptionError::Enrol(_) => "enrol_failed",
            RedemptionError::AlreadyRedeemed => "already_redeemed",
            RedemptionError::Persist(_) => "persist_failed",
            RedemptionError::Lookup(_) => "lookup_failed",
        }
    }
}

/// Outcome of a successful redemption
#[derive(Debug, Clone, Serialize)]
pub struct Redemption {
    pub invitation_id: i64,
    pub course_id: i64,
    pub user_id: i64,
    pub role_id: i64,
    pub redeemed_at: DateTime<Utc>,
    /// Where the user should land next
    pub course_url: String,
}

/// The redemption flow, wired to the host's collaborators
#[derive(Clone)]
pub struct RedemptionFlow {
    tokens: Arc<dyn TokenStore>,
    enrolments: Arc<dyn EnrolmentManager>,
    directory: Arc<dyn Directory>,
    notifier: Notifier,
    links: SiteLinks,
}

impl RedemptionFlow {
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        enrolments: Arc<dyn EnrolmentManager>,
        directory: Arc<dyn Directory>,
        notifier: Notifier,
        links: SiteLinks,
    ) -> Self {
        Self {
            tokens,
            enrolments,
            directory,
            notifier,
            links,
        }
    }

    pub async fn validate(
        &self,
        token: &str,
        course_id: i64,
        redeemer: &CurrentUser,
        now: DateTime<Utc>,
    ) -> Result<invitation::Model, RedemptionError> {
        token_validator::validate(
            self.tokens.as_ref(),
            self.directory.as_ref(),
            token,
            course_id,
            redeemer,
            now,
        )
        .await
    }

    /// Hand the enrolment to the host; errors surface unchanged
    pub async fn enrol(
        &self,
        instance_id: i64,
        course_id: i64,
        user_id: i64,
        role_id: i64,
    ) -> Result<(), EnrolError> {
        self.enrolments
            .enrol_user(instance_id, course_id, user_id, role_id)
            .await
    }

    pub async fn finalize(
        &self,
        token: &str,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), RedemptionError> {
        finalizer::finalize(self.tokens.as_ref(), token, user_id, now).await
    }

    /// Tell the inviter their invitation was accepted.
    ///
    /// Returns whether a message was handed to the mailer successfully.
    pub async fn notify(&self, invitation: &invitation::Model, invitee: &CurrentUser) -> bool {
        send_notice(
            self.directory.as_ref(),
            &self.notifier,
            &self.links,
            invitation,
            invitee,
        )
        .await
    }

    /// Redeem `token` for `course_id` on behalf of `redeemer`
    pub async fn redeem(
        &self,
        token: &str,
        course_id: i64,
        redeemer: &CurrentUser,
        now: DateTime<Utc>,
    ) -> Result<Redemption, RedemptionError> {
        let invitation = self.validate(token, course_id, redeemer, now).await?;
        let role_id = invitation.grant_role().ok_or(RedemptionError::NoRole)?;

        if let Err(e) = self
            .enrol(invitation.instance_id, course_id, redeemer.user_id, role_id)
            .await
        {
            tracing::warn!(
                "Enrolment of user {} in course {} failed: {}",
                redeemer.user_id,
                course_id,
                e
            );
            // Instance was disabled after validation
            if let EnrolError::InstanceUnavailable(_) = e {
                return Err(RedemptionError::InstanceDisabled);
            }
            return Err(e.into());
        }

        match self.finalize(token, redeemer.user_id, now).await {
            Ok(()) => {}
            Err(RedemptionError::AlreadyRedeemed) => {
                tracing::warn!(
                    "Invitation {} was redeemed concurrently, withdrawing enrolment of user {}",
                    invitation.id,
                    redeemer.user_id
                );
                self.withdraw(invitation.instance_id, redeemer.user_id).await;
                return Err(RedemptionError::AlreadyRedeemed);
            }
            Err(e) => {
                // User is enrolled but the token is still redeemable
                tracing::error!(
                    "Invitation {} stays unused after enrolling user {}: {}",
                    invitation.id,
                    redeemer.user_id,
                    e
                );
                return Err(e);
            }
        }

        tracing::info!(
            "User {} redeemed invitation {} into course {} with role {}",
            redeemer.user_id,
            invitation.id,
            course_id,
            role_id
        );

        self.dispatch_notice(invitation.clone(), redeemer.clone());

        Ok(Redemption {
            invitation_id: invitation.id,
            course_id,
            user_id: redeemer.user_id,
            role_id,
            redeemed_at: now,
            course_url: self.links.course_url(course_id),
        })
    }

    async fn withdraw(&self, instance_id: i64, user_id: i64) {
        if let Err(e) = self.enrolments.unenrol_user(instance_id, user_id).await {
            tracing::error!(
                "Failed to withdraw enrolment of user {} from instance {}: {}",
                user_id,
                instance_id,
                e
            );
        }
    }

    fn dispatch_notice(&self, invitation: invitation::Model, invitee: CurrentUser) {
        let directory = self.directory.clone();
        let notifier = self.notifier.clone();
        let links = self.links.clone();

        tokio::spawn(async move {
            send_notice(directory.as_ref(), &notifier, &links, &invitation, &invitee).await;
        });
    }
}

async fn send_notice(
    directory: &dyn Directory,
    notifier: &Notifier,
    links: &SiteLinks,
    invitation: &invitation::Model,
    invitee: &CurrentUser,
) -> bool {
    let inviter = match directory.user_contact(invitation.creator_id).await {
        Ok(Some(contact)) => contact,
        Ok(None) => {
            tracing::warn!(
                "Inviter {} of invitation {} no longer exists, skipping notice",
                invitation.creator_id,
                invitation.id
            );
            return false;
        }
        Err(e) => {
            tracing::warn!("Failed to look up inviter {}: {}", invitation.creator_id, e);
            return false;
        }
    };

    let course = match directory.course(invitation.course_id).await {
        Ok(Some(course)) => course,
        Ok(None) => {
            tracing::warn!("Course {} not found, skipping notice", invitation.course_id);
            return false;
        }
        Err(e) => {
            tracing::warn!("Failed to look up course {}: {}", invitation.course_id, e);
            return false;
        }
    };

    let message = enrolment_notice(&inviter, &invitee.full_name(), &course, links);
    notifier.notify(&message).await.success
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes_are_disjoint() {
        let errors = [
            RedemptionError::NotFound,
            RedemptionError::CourseMismatch,
            RedemptionError::InstanceDisabled,
            RedemptionError::GuestNotAllowed,
            RedemptionError::AlreadyEnrolled,
            RedemptionError::NotYetOpen,
            RedemptionError::Expired,
            RedemptionError::NoRole,
            RedemptionError::AlreadyRedeemed,
            RedemptionError::Persist("disk full".to_string()),
        ];

        for e in &errors {
            assert!(!(e.is_no_action() && e.is_terminal()), "{:?}", e);
        }
    }

    #[test]
    fn test_no_action_states() {
        assert!(RedemptionError::AlreadyEnrolled.is_no_action());
        assert!(RedemptionError::NotYetOpen.is_no_action());
        assert!(RedemptionError::GuestNotAllowed.is_no_action());
        assert!(RedemptionError::NoRole.is_no_action());
        assert!(RedemptionError::InstanceDisabled.is_no_action());
        assert!(!RedemptionError::Expired.is_no_action());
    }

    #[test]
    fn test_persist_is_neither_terminal_nor_silent() {
        let e = RedemptionError::Persist("locked".to_string());
        assert!(!e.is_terminal());
        assert!(!e.is_no_action());
        assert_eq!(e.reason(), "persist_failed");
    }
}
