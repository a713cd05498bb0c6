use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::endpoints::extractors::AuthUser;
use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::{enrol_instance, user_enrolment};
use crate::services::instance_actions::{ActionLink, EnrolButton, Icon};
use crate::state::AppState;

/// Create instance action routes, nested under `/api/courses`
pub fn instances_routes(state: AppState) -> Router {
    Router::new()
        .route("/{course_id}/enrol-actions", get(get_enrol_actions))
        .with_state(state)
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PluginFlags {
    pub roles_protected: bool,
    pub has_bulk_operations: bool,
}

#[derive(Debug, Serialize)]
pub struct InstanceActionsResponse {
    pub id: i64,
    pub name: String,
    pub enabled: bool,
    pub allow_unenrol: bool,
    pub allow_manage: bool,
    pub navigation: Option<ActionLink>,
    pub action_icons: Vec<ActionLink>,
}

#[derive(Debug, Serialize)]
pub struct UserEnrolmentActionsResponse {
    pub id: i64,
    pub user_id: i64,
    pub instance_id: i64,
    pub actions: Vec<ActionLink>,
}

#[derive(Debug, Serialize)]
pub struct EnrolActionsResponse {
    pub course_id: i64,
    pub flags: PluginFlags,
    pub info_icons: Vec<Icon>,
    pub new_instance_link: Option<String>,
    pub manual_enrol_button: Option<EnrolButton>,
    pub instances: Vec<InstanceActionsResponse>,
    pub user_enrolments: Vec<UserEnrolmentActionsResponse>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Everything the invitation plugin contributes to a course's pages
async fn get_enrol_actions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(course_id): Path<i64>,
) -> Result<Json<EnrolActionsResponse>> {
    Course::find_by_id(course_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

    let all_instances = EnrolInstance::find()
        .filter(enrol_instance::Column::CourseId.eq(course_id))
        .order_by_asc(enrol_instance::Column::Id)
        .all(&state.db)
        .await?;

    let plugin = &state.plugin;
    let invitation_instances: Vec<_> = all_instances
        .iter()
        .filter(|i| i.is_invitation())
        .cloned()
        .collect();

    let mut instances = Vec::with_capacity(invitation_instances.len());
    for instance in &invitation_instances {
        instances.push(InstanceActionsResponse {
            id: instance.id,
            name: instance.display_name(),
            enabled: instance.enabled,
            allow_unenrol: plugin.allow_unenrol(instance),
            allow_manage: plugin.allow_manage(instance),
            navigation: plugin.course_navigation(instance, &user).await?,
            action_icons: plugin.action_icons(instance, &user).await?,
        });
    }

    let enrolments = UserEnrolment::find()
        .filter(
            user_enrolment::Column::InstanceId
                .is_in(invitation_instances.iter().map(|i| i.id)),
        )
        .order_by_asc(user_enrolment::Column::Id)
        .all(&state.db)
        .await?;

    let mut user_enrolments = Vec::with_capacity(enrolments.len());
    for enrolment in &enrolments {
        let Some(instance) = invitation_instances
            .iter()
            .find(|i| i.id == enrolment.instance_id)
        else {
            continue;
        };
        user_enrolments.push(UserEnrolmentActionsResponse {
            id: enrolment.id,
            user_id: enrolment.user_id,
            instance_id: enrolment.instance_id,
            actions: plugin.user_enrolment_actions(instance, enrolment, &user).await?,
        });
    }

    Ok(Json(EnrolActionsResponse {
        course_id,
        flags: PluginFlags {
            roles_protected: plugin.roles_protected(),
            has_bulk_operations: plugin.has_bulk_operations(),
        },
        info_icons: if invitation_instances.is_empty() {
            Vec::new()
        } else {
            plugin.info_icons(&invitation_instances)
        },
        new_instance_link: plugin.new_instance_link(course_id, &user).await?,
        manual_enrol_button: plugin.manual_enrol_button(&all_instances, &user).await?,
        instances,
        user_enrolments,
    }))
}
