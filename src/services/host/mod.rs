//! Interfaces to the services the host platform owns.
//!
//! The redemption flow and the administrative actions only ever talk to the
//! host through these traits. [`SeaOrmHost`] implements all of them on top of
//! the service's own tables.

mod database;

pub use database::SeaOrmHost;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::error::AppError;
use crate::models::{invitation, user};
use crate::services::capability::Capability;

/// Storage failure reported by a collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Database(db) => AppError::Database(db),
            StoreError::Backend(msg) => AppError::Internal(msg),
        }
    }
}

/// Failure reported by the enrolment manager
#[derive(Debug, Error)]
pub enum EnrolError {
    #[error("Enrol instance {0} is not available")]
    InstanceUnavailable(i64),

    #[error("User {user_id} is already enrolled in course {course_id}")]
    Duplicate { course_id: i64, user_id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Enrolment backend error: {0}")]
    Backend(String),
}

/// Identity of the user making a request, passed explicitly to every check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_guest: bool,
    pub is_admin: bool,
}

impl CurrentUser {
    /// Anonymous visitor
    pub fn guest() -> Self {
        Self {
            user_id: 0,
            username: "guest".to_string(),
            email: String::new(),
            first_name: "Guest".to_string(),
            last_name: "user".to_string(),
            is_guest: true,
            is_admin: false,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl From<user::Model> for CurrentUser {
    fn from(user: user::Model) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_guest: user.is_guest,
            is_admin: user.is_admin,
        }
    }
}

/// Mail contact details of a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Enrol instance an invitation was issued on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSummary {
    pub id: i64,
    pub course_id: i64,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseSummary {
    pub id: i64,
    pub short_name: String,
    pub full_name: String,
}

/// Persistence of invitation tokens
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Point lookup of an invitation that has not been used yet
    async fn find_unused(&self, token: &str) -> Result<Option<invitation::Model>, StoreError>;

    /// Conditional update: marks the token used only while it is still unused.
    ///
    /// Returns the number of rows affected (0 or 1).
    async fn mark_used(
        &self,
        token: &str,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError>;
}

/// Enrolment manager of the host
#[async_trait]
pub trait EnrolmentManager: Send + Sync {
    /// Enrol `user_id` through the enrol instance `instance_id` of `course_id`
    async fn enrol_user(
        &self,
        instance_id: i64,
        course_id: i64,
        user_id: i64,
        role_id: i64,
    ) -> Result<(), EnrolError>;

    /// Withdraw an enrolment made through `instance_id`
    async fn unenrol_user(&self, instance_id: i64, user_id: i64) -> Result<(), EnrolError>;
}

/// Read-only lookups of users, courses and enrolments
#[async_trait]
pub trait Directory: Send + Sync {
    async fn is_enrolled(&self, course_id: i64, user_id: i64) -> Result<bool, StoreError>;

    async fn user_contact(&self, user_id: i64) -> Result<Option<Contact>, StoreError>;

    async fn course(&self, course_id: i64) -> Result<Option<CourseSummary>, StoreError>;

    /// Invitation enrol instance by id; other plugin kinds are not returned
    async fn instance(&self, instance_id: i64) -> Result<Option<InstanceSummary>, StoreError>;
}

/// Permission checks against a user and course pair
#[async_trait]
pub trait CapabilityPolicy: Send + Sync {
    async fn has_capability(
        &self,
        user: &CurrentUser,
        capability: Capability,
        course_id: i64,
    ) -> Result<bool, StoreError>;
}
