//! Issuing invitations.
//!
//! Each recipient gets a fresh token that inherits its role and enrolment
//! window from the course's invitation instance. The invitation email is
//! sent in the background; delivery failures do not undo the invitation.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use validator::{Validate, ValidateEmail, ValidationError};

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::enrol_instance::INVITATION_ENROL;
use crate::models::prelude::*;
use crate::models::{enrol_instance, invitation};
use crate::services::capability::Capability;
use crate::services::host::{CapabilityPolicy, CourseSummary, CurrentUser};
use crate::services::links::SiteLinks;
use crate::services::notification::{invitation_message, Notifier};
use crate::services::security::generate_invitation_token;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IssueInvitationsRequest {
    #[validate(
        length(min = 1, max = 100, message = "Between 1 and 100 emails are required"),
        custom(function = "validate_emails")
    )]
    pub emails: Vec<String>,
    /// Invitation instance to use; defaults to the course's first enabled one
    pub instance_id: Option<i64>,
}

fn validate_emails(emails: &[String]) -> std::result::Result<(), ValidationError> {
    match emails.iter().find(|e| !e.trim().validate_email()) {
        Some(bad) => {
            let mut err = ValidationError::new("email");
            err.message = Some(format!("Invalid email address: {}", bad).into());
            Err(err)
        }
        None => Ok(()),
    }
}

/// Public view of an invitation
#[derive(Debug, Clone, Serialize)]
pub struct InvitationResponse {
    pub id: i64,
    pub email: String,
    pub course_id: i64,
    pub instance_id: i64,
    pub role_id: Option<i64>,
    pub enrol_start_date: Option<chrono::DateTime<Utc>>,
    pub enrol_end_date: Option<chrono::DateTime<Utc>>,
    pub used: bool,
    pub used_at: Option<chrono::DateTime<Utc>>,
    pub redeemed_by_user_id: Option<i64>,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<invitation::Model> for InvitationResponse {
    fn from(inv: invitation::Model) -> Self {
        Self {
            id: inv.id,
            email: inv.email,
            course_id: inv.course_id,
            instance_id: inv.instance_id,
            role_id: inv.role_id,
            enrol_start_date: inv.enrol_start_date,
            enrol_end_date: inv.enrol_end_date,
            used: inv.used,
            used_at: inv.used_at,
            redeemed_by_user_id: inv.redeemed_by_user_id,
            created_at: inv.created_at,
        }
    }
}

#[derive(Clone)]
pub struct InvitationService {
    db: DbConn,
    policy: Arc<dyn CapabilityPolicy>,
    notifier: Notifier,
    links: SiteLinks,
}

impl InvitationService {
    pub fn new(
        db: DbConn,
        policy: Arc<dyn CapabilityPolicy>,
        notifier: Notifier,
        links: SiteLinks,
    ) -> Self {
        Self {
            db,
            policy,
            notifier,
            links,
        }
    }

    /// Create one unused invitation per distinct recipient and mail them out
    pub async fn issue(
        &self,
        inviter: &CurrentUser,
        course_id: i64,
        request: IssueInvitationsRequest,
    ) -> Result<Vec<invitation::Model>> {
        request.validate()?;
        self.require_enrol(inviter, course_id).await?;

        let course = Course::find_by_id(course_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

        let instance = self.resolve_instance(course_id, request.instance_id).await?;
        let recipients = distinct_recipients(&request.emails);
        let now = Utc::now();

        let txn = self.db.begin().await?;
        let mut created = Vec::with_capacity(recipients.len());
        for email in recipients {
            let model = invitation::ActiveModel {
                token: Set(generate_invitation_token()),
                course_id: Set(course_id),
                instance_id: Set(instance.id),
                creator_id: Set(inviter.user_id),
                email: Set(email),
                role_id: Set(instance.role_id),
                enrol_start_date: Set(instance.enrol_start_date),
                enrol_end_date: Set(instance.enrol_end_date),
                used: Set(false),
                used_at: Set(None),
                redeemed_by_user_id: Set(None),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            created.push(model);
        }
        txn.commit().await?;

        tracing::info!(
            "User {} issued {} invitation(s) for course {}",
            inviter.user_id,
            created.len(),
            course_id
        );

        let summary = CourseSummary {
            id: course.id,
            short_name: course.short_name,
            full_name: course.full_name,
        };
        for inv in &created {
            let url = self.links.redeem_url(&inv.token, course_id);
            let message = invitation_message(
                &inv.email,
                &inviter.full_name(),
                &summary,
                &url,
                &self.links,
            );
            self.notifier.dispatch(message);
        }

        Ok(created)
    }

    /// Invitations of a course, newest first
    pub async fn list(&self, user: &CurrentUser, course_id: i64) -> Result<Vec<invitation::Model>> {
        self.require_enrol(user, course_id).await?;

        let invitations = Invitation::find()
            .filter(invitation::Column::CourseId.eq(course_id))
            .order_by_desc(invitation::Column::CreatedAt)
            .order_by_desc(invitation::Column::Id)
            .all(&self.db)
            .await?;

        Ok(invitations)
    }

    async fn require_enrol(&self, user: &CurrentUser, course_id: i64) -> Result<()> {
        if !self
            .policy
            .has_capability(user, Capability::Enrol, course_id)
            .await?
        {
            return Err(AppError::Forbidden(format!(
                "Permission denied: {} required",
                Capability::Enrol
            )));
        }
        Ok(())
    }

    async fn resolve_instance(
        &self,
        course_id: i64,
        instance_id: Option<i64>,
    ) -> Result<enrol_instance::Model> {
        let instance = match instance_id {
            Some(id) => EnrolInstance::find_by_id(id)
                .filter(enrol_instance::Column::CourseId.eq(course_id))
                .one(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Enrolment instance not found".to_string()))?,
            None => EnrolInstance::find()
                .filter(enrol_instance::Column::CourseId.eq(course_id))
                .filter(enrol_instance::Column::Enrol.eq(INVITATION_ENROL))
                .filter(enrol_instance::Column::Enabled.eq(true))
                .order_by_asc(enrol_instance::Column::Id)
                .one(&self.db)
                .await?
                .ok_or_else(|| {
                    AppError::BadRequest(
                        "Course has no enabled invitation enrolment instance".to_string(),
                    )
                })?,
        };

        if !instance.is_invitation() {
            return Err(AppError::BadRequest(format!(
                "Enrolment instance {} is not an invitation instance",
                instance.id
            )));
        }
        if !instance.enabled {
            return Err(AppError::BadRequest(format!(
                "Enrolment instance {} is disabled",
                instance.id
            )));
        }

        Ok(instance)
    }
}

/// Trimmed, lowercased recipients in first-seen order
fn distinct_recipients(emails: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    emails
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| seen.insert(e.clone()))
        .collect()
}
