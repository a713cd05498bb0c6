use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, Set, SqlErr,
};

use super::{
    CapabilityPolicy, Contact, CourseSummary, CurrentUser, Directory, EnrolError,
    EnrolmentManager, InstanceSummary, StoreError, TokenStore,
};
use crate::db::DbConn;
use crate::models::enrol_instance::INVITATION_ENROL;
use crate::models::prelude::*;
use crate::models::{enrol_instance, invitation, role_capability, user_enrolment};
use crate::services::capability::Capability;

/// Host collaborators backed by the service's own database
#[derive(Clone)]
pub struct SeaOrmHost {
    db: DbConn,
}

impl SeaOrmHost {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Invitation instance by id, whether enabled or not
    pub async fn invitation_instance(
        &self,
        instance_id: i64,
    ) -> Result<Option<enrol_instance::Model>, sea_orm::DbErr> {
        EnrolInstance::find_by_id(instance_id)
            .filter(enrol_instance::Column::Enrol.eq(INVITATION_ENROL))
            .one(&self.db)
            .await
    }
}

#[async_trait]
impl TokenStore for SeaOrmHost {
    async fn find_unused(&self, token: &str) -> Result<Option<invitation::Model>, StoreError> {
        let found = Invitation::find()
            .filter(invitation::Column::Token.eq(token))
            .filter(invitation::Column::Used.eq(false))
            .one(&self.db)
            .await?;
        Ok(found)
    }

    async fn mark_used(
        &self,
        token: &str,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = Invitation::update_many()
            .col_expr(invitation::Column::Used, Expr::value(true))
            .col_expr(invitation::Column::UsedAt, Expr::value(now))
            .col_expr(invitation::Column::RedeemedByUserId, Expr::value(user_id))
            .filter(invitation::Column::Token.eq(token))
            .filter(invitation::Column::Used.eq(false))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

#[async_trait]
impl EnrolmentManager for SeaOrmHost {
    async fn enrol_user(
        &self,
        instance_id: i64,
        course_id: i64,
        user_id: i64,
        role_id: i64,
    ) -> Result<(), EnrolError> {
        let instance = self
            .invitation_instance(instance_id)
            .await?
            .filter(|i| i.enabled && i.course_id == course_id)
            .ok_or(EnrolError::InstanceUnavailable(instance_id))?;

        let enrolment = user_enrolment::ActiveModel {
            instance_id: Set(instance.id),
            course_id: Set(course_id),
            user_id: Set(user_id),
            role_id: Set(role_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        match enrolment.insert(&self.db).await {
            Ok(created) => {
                tracing::debug!(
                    "Enrolled user {} in course {} through instance {} (enrolment {})",
                    user_id,
                    course_id,
                    instance.id,
                    created.id
                );
                Ok(())
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(EnrolError::Duplicate { course_id, user_id })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn unenrol_user(&self, instance_id: i64, user_id: i64) -> Result<(), EnrolError> {
        let result = UserEnrolment::delete_many()
            .filter(user_enrolment::Column::InstanceId.eq(instance_id))
            .filter(user_enrolment::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        tracing::debug!(
            "Removed {} enrolment(s) of user {} from instance {}",
            result.rows_affected,
            user_id,
            instance_id
        );
        Ok(())
    }
}

#[async_trait]
impl Directory for SeaOrmHost {
    async fn is_enrolled(&self, course_id: i64, user_id: i64) -> Result<bool, StoreError> {
        let count = UserEnrolment::find()
            .filter(user_enrolment::Column::CourseId.eq(course_id))
            .filter(user_enrolment::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn user_contact(&self, user_id: i64) -> Result<Option<Contact>, StoreError> {
        let found = User::find_by_id(user_id).one(&self.db).await?;
        Ok(found.map(|u| Contact {
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
        }))
    }

    async fn course(&self, course_id: i64) -> Result<Option<CourseSummary>, StoreError> {
        let found = Course::find_by_id(course_id).one(&self.db).await?;
        Ok(found.map(|c| CourseSummary {
            id: c.id,
            short_name: c.short_name,
            full_name: c.full_name,
        }))
    }

    async fn instance(&self, instance_id: i64) -> Result<Option<InstanceSummary>, StoreError> {
        let found = self.invitation_instance(instance_id).await?;
        Ok(found.map(|i| InstanceSummary {
            id: i.id,
            course_id: i.course_id,
            enabled: i.enabled,
        }))
    }
}

#[async_trait]
impl CapabilityPolicy for SeaOrmHost {
    async fn has_capability(
        &self,
        user: &CurrentUser,
        capability: Capability,
        course_id: i64,
    ) -> Result<bool, StoreError> {
        if user.is_guest {
            return Ok(false);
        }
        if user.is_admin {
            return Ok(true);
        }

        // Roles the user holds in this course
        let role_ids: Vec<i64> = UserEnrolment::find()
            .select_only()
            .column(user_enrolment::Column::RoleId)
            .filter(user_enrolment::Column::CourseId.eq(course_id))
            .filter(user_enrolment::Column::UserId.eq(user.user_id))
            .into_tuple()
            .all(&self.db)
            .await?;

        if role_ids.is_empty() {
            return Ok(false);
        }

        let granted = RoleCapability::find()
            .filter(role_capability::Column::RoleId.is_in(role_ids))
            .filter(role_capability::Column::Capability.eq(capability.as_str()))
            .count(&self.db)
            .await?;

        Ok(granted > 0)
    }
}
