//! Test helpers shared by the integration tests.
//!
//! Provides migrated in-memory databases with fixture rows, a fully wired
//! `AppState`, a recording mailer, and an in-memory host whose failures and
//! timing can be controlled per test.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

use enrol_invitation::migrations::Migrator;
use enrol_invitation::models::enrol_instance::INVITATION_ENROL;
use enrol_invitation::models::prelude::*;
use enrol_invitation::models::{course, enrol_instance, invitation, role, user, user_enrolment};
use enrol_invitation::services::host::{
    Contact, CourseSummary, CurrentUser, Directory, EnrolError, EnrolmentManager,
    InstanceSummary, StoreError, TokenStore,
};
use enrol_invitation::services::notification::{Mailer, Notifier, SendResult};
use enrol_invitation::services::redemption::RedemptionFlow;
use enrol_invitation::services::SiteLinks;
use enrol_invitation::state::AppState;

pub const SITE_URL: &str = "https://learn.example.org";
pub const SITE_NAME: &str = "Example Learning";

// ============================================================================
// Database fixtures
// ============================================================================

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    // Run migrations using the Migrator
    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

pub async fn role_id(db: &DatabaseConnection, short_name: &str) -> i64 {
    Role::find()
        .filter(role::Column::ShortName.eq(short_name))
        .one(db)
        .await
        .unwrap()
        .expect("role is seeded")
        .id
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@example.org", username)),
        first_name: Set(username.to_string()),
        last_name: Set("Tester".to_string()),
        is_guest: Set(false),
        is_admin: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_course(db: &DatabaseConnection, short_name: &str, full_name: &str) -> course::Model {
    course::ActiveModel {
        short_name: Set(short_name.to_string()),
        full_name: Set(full_name.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_instance(
    db: &DatabaseConnection,
    course_id: i64,
    enrol: &str,
    role_id: Option<i64>,
) -> enrol_instance::Model {
    enrol_instance::ActiveModel {
        course_id: Set(course_id),
        enrol: Set(enrol.to_string()),
        name: Set(None),
        enabled: Set(true),
        role_id: Set(role_id),
        enrol_start_date: Set(None),
        enrol_end_date: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_invitation_instance(
    db: &DatabaseConnection,
    course_id: i64,
    role_id: Option<i64>,
) -> enrol_instance::Model {
    create_instance(db, course_id, INVITATION_ENROL, role_id).await
}

pub async fn create_invitation(
    db: &DatabaseConnection,
    instance: &enrol_instance::Model,
    creator_id: i64,
    token: &str,
    role_id: Option<i64>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> invitation::Model {
    invitation::ActiveModel {
        token: Set(token.to_string()),
        course_id: Set(instance.course_id),
        instance_id: Set(instance.id),
        creator_id: Set(creator_id),
        email: Set(format!("{}@example.org", token.to_lowercase())),
        role_id: Set(role_id),
        enrol_start_date: Set(start),
        enrol_end_date: Set(end),
        used: Set(false),
        used_at: Set(None),
        redeemed_by_user_id: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn enrol(
    db: &DatabaseConnection,
    instance: &enrol_instance::Model,
    user_id: i64,
    role_id: i64,
) -> user_enrolment::Model {
    user_enrolment::ActiveModel {
        instance_id: Set(instance.id),
        course_id: Set(instance.course_id),
        user_id: Set(user_id),
        role_id: Set(role_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn find_invitation(db: &DatabaseConnection, token: &str) -> invitation::Model {
    Invitation::find()
        .filter(invitation::Column::Token.eq(token))
        .one(db)
        .await
        .unwrap()
        .expect("invitation exists")
}

pub async fn enrolments_of(db: &DatabaseConnection, course_id: i64) -> Vec<user_enrolment::Model> {
    UserEnrolment::find()
        .filter(user_enrolment::Column::CourseId.eq(course_id))
        .all(db)
        .await
        .unwrap()
}

pub fn links() -> SiteLinks {
    SiteLinks::new(SITE_URL, SITE_NAME)
}

/// App state over `db` whose mail goes to the returned recorder
pub fn build_app_state(db: DatabaseConnection) -> (AppState, Arc<RecordingMailer>) {
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::new(db, Notifier::new(mailer.clone()), links());
    (state, mailer)
}

// ============================================================================
// Mail
// ============================================================================

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mailer that keeps every message and can be told to fail
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    pub fail: AtomicBool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.fail.store(true, Ordering::SeqCst);
        mailer
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().clone()
    }

    /// Wait for background deliveries to reach `count` messages
    pub async fn wait_for(&self, count: usize) -> Vec<SentMail> {
        for _ in 0..100 {
            if self.sent.lock().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> SendResult {
        self.sent.lock().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        if self.fail.load(Ordering::SeqCst) {
            SendResult::failed("mail server unavailable")
        } else {
            SendResult::sent()
        }
    }
}

// ============================================================================
// In-memory host
// ============================================================================

/// Host collaborators kept in memory, with failure switches
#[derive(Default)]
pub struct MemoryHost {
    invitations: Mutex<Vec<invitation::Model>>,
    /// (instance_id, course_id, user_id, role_id)
    enrolments: Mutex<Vec<(i64, i64, i64, i64)>>,
    instances: Mutex<HashMap<i64, InstanceSummary>>,
    contacts: Mutex<HashMap<i64, Contact>>,
    courses: Mutex<HashMap<i64, CourseSummary>>,
    /// When set, every enrolment waits here before completing
    enrol_barrier: Option<Barrier>,
    pub fail_enrol: AtomicBool,
    pub fail_mark_used: AtomicBool,
    pub fail_unenrol: AtomicBool,
    pub enrol_calls: AtomicUsize,
    pub unenrol_calls: AtomicUsize,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host whose enrolments block until `parties` of them are in flight
    pub fn with_enrol_barrier(parties: usize) -> Self {
        Self {
            enrol_barrier: Some(Barrier::new(parties)),
            ..Default::default()
        }
    }

    pub fn add_invitation(&self, invitation: invitation::Model) {
        self.invitations.lock().push(invitation);
    }

    pub fn add_contact(&self, user_id: i64, contact: Contact) {
        self.contacts.lock().insert(user_id, contact);
    }

    pub fn add_course(&self, course: CourseSummary) {
        self.courses.lock().insert(course.id, course);
    }

    pub fn add_instance(&self, id: i64, course_id: i64, enabled: bool) {
        self.instances.lock().insert(
            id,
            InstanceSummary {
                id,
                course_id,
                enabled,
            },
        );
    }

    pub fn set_instance_enabled(&self, id: i64, enabled: bool) {
        if let Some(instance) = self.instances.lock().get_mut(&id) {
            instance.enabled = enabled;
        }
    }

    pub fn invitation(&self, token: &str) -> Option<invitation::Model> {
        self.invitations
            .lock()
            .iter()
            .find(|i| i.token == token)
            .cloned()
    }

    /// (course_id, user_id, role_id) of every enrolment
    pub fn enrolments(&self) -> Vec<(i64, i64, i64)> {
        self.enrolments
            .lock()
            .iter()
            .map(|(_, c, u, r)| (*c, *u, *r))
            .collect()
    }

    /// Instance ids the enrolments were made through
    pub fn enrolment_instances(&self) -> Vec<i64> {
        self.enrolments.lock().iter().map(|(i, ..)| *i).collect()
    }
}

#[async_trait]
impl TokenStore for MemoryHost {
    async fn find_unused(&self, token: &str) -> Result<Option<invitation::Model>, StoreError> {
        Ok(self
            .invitations
            .lock()
            .iter()
            .find(|i| i.token == token && !i.used)
            .cloned())
    }

    async fn mark_used(
        &self,
        token: &str,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        if self.fail_mark_used.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("database is locked".to_string()));
        }

        let mut invitations = self.invitations.lock();
        match invitations.iter_mut().find(|i| i.token == token && !i.used) {
            Some(row) => {
                row.used = true;
                row.used_at = Some(now);
                row.redeemed_by_user_id = Some(user_id);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl EnrolmentManager for MemoryHost {
    async fn enrol_user(
        &self,
        instance_id: i64,
        course_id: i64,
        user_id: i64,
        role_id: i64,
    ) -> Result<(), EnrolError> {
        self.enrol_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.enrol_barrier {
            barrier.wait().await;
        }
        if self.fail_enrol.load(Ordering::SeqCst) {
            return Err(EnrolError::Backend("enrolment service down".to_string()));
        }

        let available = self
            .instances
            .lock()
            .get(&instance_id)
            .is_some_and(|i| i.enabled && i.course_id == course_id);
        if !available {
            return Err(EnrolError::InstanceUnavailable(instance_id));
        }

        let mut enrolments = self.enrolments.lock();
        if enrolments
            .iter()
            .any(|(_, c, u, _)| *c == course_id && *u == user_id)
        {
            return Err(EnrolError::Duplicate { course_id, user_id });
        }
        enrolments.push((instance_id, course_id, user_id, role_id));
        Ok(())
    }

    async fn unenrol_user(&self, instance_id: i64, user_id: i64) -> Result<(), EnrolError> {
        self.unenrol_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_unenrol.load(Ordering::SeqCst) {
            return Err(EnrolError::Backend("enrolment service down".to_string()));
        }
        self.enrolments
            .lock()
            .retain(|(i, _, u, _)| !(*i == instance_id && *u == user_id));
        Ok(())
    }
}

#[async_trait]
impl Directory for MemoryHost {
    async fn is_enrolled(&self, course_id: i64, user_id: i64) -> Result<bool, StoreError> {
        Ok(self
            .enrolments
            .lock()
            .iter()
            .any(|(_, c, u, _)| *c == course_id && *u == user_id))
    }

    async fn user_contact(&self, user_id: i64) -> Result<Option<Contact>, StoreError> {
        Ok(self.contacts.lock().get(&user_id).cloned())
    }

    async fn course(&self, course_id: i64) -> Result<Option<CourseSummary>, StoreError> {
        Ok(self.courses.lock().get(&course_id).cloned())
    }

    async fn instance(&self, instance_id: i64) -> Result<Option<InstanceSummary>, StoreError> {
        Ok(self.instances.lock().get(&instance_id).cloned())
    }
}

/// Redemption flow over `host`, mailing through `mailer`
pub fn memory_flow(host: Arc<MemoryHost>, mailer: Arc<RecordingMailer>) -> RedemptionFlow {
    RedemptionFlow::new(
        host.clone(),
        host.clone(),
        host,
        Notifier::new(mailer),
        links(),
    )
}

/// Unused invitation row that is not backed by a database
pub fn invitation_row(
    id: i64,
    token: &str,
    course_id: i64,
    creator_id: i64,
    role_id: Option<i64>,
) -> invitation::Model {
    invitation::Model {
        id,
        token: token.to_string(),
        course_id,
        instance_id: 1,
        creator_id,
        email: format!("{}@example.org", token.to_lowercase()),
        role_id,
        enrol_start_date: None,
        enrol_end_date: None,
        used: false,
        used_at: None,
        redeemed_by_user_id: None,
        created_at: Utc::now(),
    }
}

pub fn member(user_id: i64, first_name: &str) -> CurrentUser {
    CurrentUser {
        user_id,
        username: first_name.to_lowercase(),
        email: format!("{}@example.org", first_name.to_lowercase()),
        first_name: first_name.to_string(),
        last_name: "Member".to_string(),
        is_guest: false,
        is_admin: false,
    }
}

pub fn inviter_contact() -> Contact {
    Contact {
        email: "tess@example.org".to_string(),
        first_name: "Tess".to_string(),
        last_name: "Teacher".to_string(),
    }
}

pub fn course_summary(id: i64) -> CourseSummary {
    CourseSummary {
        id,
        short_name: format!("C{}", id),
        full_name: format!("Course {}", id),
    }
}
