//! Links and controls the invitation plugin contributes to course pages.
//!
//! Everything here is returned as data; rendering belongs to the caller.
//! Each link is gated by a capability check against the user passed in.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::error::AppError;
use crate::models::{enrol_instance, user_enrolment};
use crate::services::capability::Capability;
use crate::services::host::{CapabilityPolicy, CurrentUser, StoreError};
use crate::services::links::SiteLinks;

pub const PLUGIN_NAME: &str = "Invitation";
pub const PLUGIN_COMPONENT: &str = "enrol_invitation";

#[derive(Debug, Error)]
pub enum ActionError {
    /// The caller handed over an instance owned by another plugin
    #[error("Invalid enrol instance type: {0}")]
    InvalidInstance(String),

    #[error("Capability check failed: {0}")]
    Policy(#[from] StoreError),
}

impl From<ActionError> for AppError {
    fn from(e: ActionError) -> Self {
        match e {
            ActionError::InvalidInstance(kind) => {
                AppError::BadRequest(format!("Invalid enrol instance type: {}", kind))
            }
            ActionError::Policy(e) => e.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Icon {
    pub name: &'static str,
    pub component: &'static str,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionLink {
    pub label: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<&'static str>,
}

/// Button on the enrolled-users page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrolButton {
    pub label: String,
    pub url: String,
    pub method: &'static str,
}

/// Placeholder for bulk operations; the plugin offers none
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkOperation {
    pub name: String,
}

#[derive(Clone)]
pub struct InvitationPlugin {
    policy: Arc<dyn CapabilityPolicy>,
    links: SiteLinks,
}

impl InvitationPlugin {
    pub fn new(policy: Arc<dyn CapabilityPolicy>, links: SiteLinks) -> Self {
        Self { policy, links }
    }

    /// Users with role assignment rights may change roles later
    pub fn roles_protected(&self) -> bool {
        false
    }

    pub fn allow_unenrol(&self, _instance: &enrol_instance::Model) -> bool {
        true
    }

    pub fn allow_manage(&self, _instance: &enrol_instance::Model) -> bool {
        true
    }

    pub fn has_bulk_operations(&self) -> bool {
        false
    }

    pub fn bulk_operations(&self) -> Vec<BulkOperation> {
        Vec::new()
    }

    /// Never enrols without a token
    pub fn try_autoenrol(
        &self,
        _instance: &enrol_instance::Model,
        _user: &CurrentUser,
    ) -> Option<DateTime<Utc>> {
        None
    }

    /// One plugin icon regardless of how many instances the course has
    pub fn info_icons(&self, _instances: &[enrol_instance::Model]) -> Vec<Icon> {
        vec![plugin_icon()]
    }

    /// Settings entry for the course navigation
    pub async fn course_navigation(
        &self,
        instance: &enrol_instance::Model,
        user: &CurrentUser,
    ) -> Result<Option<ActionLink>, ActionError> {
        ensure_invitation(instance)?;

        if !self.can(user, Capability::Config, instance.course_id).await? {
            return Ok(None);
        }

        Ok(Some(ActionLink {
            label: instance.display_name(),
            url: self
                .links
                .edit_instance_url(instance.course_id, Some(instance.id)),
            icon: None,
            class: None,
        }))
    }

    /// Icons on the list of enrolment instances
    pub async fn action_icons(
        &self,
        instance: &enrol_instance::Model,
        user: &CurrentUser,
    ) -> Result<Vec<ActionLink>, ActionError> {
        ensure_invitation(instance)?;

        let mut icons = Vec::new();
        if self.can(user, Capability::Config, instance.course_id).await? {
            icons.push(ActionLink {
                label: "Edit".to_string(),
                url: self
                    .links
                    .edit_instance_url(instance.course_id, Some(instance.id)),
                icon: Some(core_icon("i/edit", "Edit")),
                class: Some("icon"),
            });
        }
        Ok(icons)
    }

    /// Page for adding a new instance; needs both course and plugin config rights
    pub async fn new_instance_link(
        &self,
        course_id: i64,
        user: &CurrentUser,
    ) -> Result<Option<String>, ActionError> {
        if !self.can(user, Capability::CourseEnrolConfig, course_id).await?
            || !self.can(user, Capability::Config, course_id).await?
        {
            return Ok(None);
        }
        Ok(Some(self.links.edit_instance_url(course_id, None)))
    }

    /// "Invite users" button for the first invitation instance among `instances`
    pub async fn manual_enrol_button(
        &self,
        instances: &[enrol_instance::Model],
        user: &CurrentUser,
    ) -> Result<Option<EnrolButton>, ActionError> {
        let Some(instance) = instances.iter().find(|i| i.is_invitation()) else {
            return Ok(None);
        };

        if !self.can(user, Capability::Enrol, instance.course_id).await? {
            return Ok(None);
        }

        Ok(Some(EnrolButton {
            label: "Invite users".to_string(),
            url: self.links.invite_users_url(instance.course_id, instance.id),
            method: "post",
        }))
    }

    /// Actions offered next to one enrolled user
    pub async fn user_enrolment_actions(
        &self,
        instance: &enrol_instance::Model,
        enrolment: &user_enrolment::Model,
        user: &CurrentUser,
    ) -> Result<Vec<ActionLink>, ActionError> {
        ensure_invitation(instance)?;

        let course_id = instance.course_id;
        let mut actions = Vec::new();

        if self.allow_unenrol(instance) && self.can(user, Capability::Unenrol, course_id).await? {
            actions.push(ActionLink {
                label: "Unenrol".to_string(),
                url: self.links.unenrol_user_url(course_id, enrolment.id),
                icon: Some(core_icon("t/delete", "")),
                class: Some("unenrollink"),
            });
        }

        if self.allow_manage(instance) && self.can(user, Capability::Manage, course_id).await? {
            actions.push(ActionLink {
                label: "Edit".to_string(),
                url: self.links.edit_enrolment_url(course_id, enrolment.id),
                icon: Some(core_icon("t/edit", "")),
                class: Some("editenrollink"),
            });
        }

        Ok(actions)
    }

    async fn can(
        &self,
        user: &CurrentUser,
        capability: Capability,
        course_id: i64,
    ) -> Result<bool, ActionError> {
        Ok(self
            .policy
            .has_capability(user, capability, course_id)
            .await?)
    }
}

fn ensure_invitation(instance: &enrol_instance::Model) -> Result<(), ActionError> {
    if instance.is_invitation() {
        Ok(())
    } else {
        Err(ActionError::InvalidInstance(instance.enrol.clone()))
    }
}

fn plugin_icon() -> Icon {
    Icon {
        name: "icon",
        component: PLUGIN_COMPONENT,
        title: PLUGIN_NAME.to_string(),
    }
}

fn core_icon(name: &'static str, title: &str) -> Icon {
    Icon {
        name,
        component: "core",
        title: title.to_string(),
    }
}
