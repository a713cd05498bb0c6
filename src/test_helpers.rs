//! Test helpers for unit tests.
//!
//! Builds migrated in-memory SQLite databases and inserts fixture rows.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;

use crate::migrations::Migrator;
use crate::models::enrol_instance::INVITATION_ENROL;
use crate::models::prelude::*;
use crate::models::{course, enrol_instance, invitation, role, user, user_enrolment};

/// Create an in-memory SQLite database with all migrations applied
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

/// Id of a seeded role
pub async fn role_id(db: &DatabaseConnection, short_name: &str) -> i64 {
    Role::find()
        .filter(role::Column::ShortName.eq(short_name))
        .one(db)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("role {} not seeded", short_name))
        .id
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@example.org", username)),
        first_name: Set(capitalize(username)),
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

pub async fn create_course(db: &DatabaseConnection, short_name: &str) -> course::Model {
    course::ActiveModel {
        short_name: Set(short_name.to_string()),
        full_name: Set(format!("{} full name", short_name)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Enabled invitation instance in `course_id`
pub async fn create_instance(
    db: &DatabaseConnection,
    course_id: i64,
    role_id: Option<i64>,
) -> enrol_instance::Model {
    enrol_instance::ActiveModel {
        course_id: Set(course_id),
        enrol: Set(INVITATION_ENROL.to_string()),
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

pub async fn create_invitation(
    db: &DatabaseConnection,
    instance: &enrol_instance::Model,
    creator_id: i64,
    token: &str,
    role_id: Option<i64>,
) -> invitation::Model {
    create_invitation_with_window(db, instance, creator_id, token, role_id, None, None).await
}

pub async fn create_invitation_with_window(
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

/// Enrol `user_id` through `instance` with `role_id`
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
        .unwrap()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
