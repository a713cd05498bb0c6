//! Capabilities gating the invitation plugin's administrative surface.
//!
//! Checks are made through a [`CapabilityPolicy`](crate::services::host::CapabilityPolicy)
//! handed to each caller instead of a global permission registry.

use serde::{Deserialize, Serialize};

/// Capability names understood by this service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Configure invitation instances in a course
    Config,
    /// Send invitations
    Enrol,
    /// Unenrol users enrolled through an invitation
    Unenrol,
    /// Edit enrolment period and status
    Manage,
    /// Add enrolment instances to a course (course level)
    CourseEnrolConfig,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Config => "enrol/invitation:config",
            Capability::Enrol => "enrol/invitation:enrol",
            Capability::Unenrol => "enrol/invitation:unenrol",
            Capability::Manage => "enrol/invitation:manage",
            Capability::CourseEnrolConfig => "course:enrolconfig",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|c| c.as_str() == s)
    }

    pub fn all() -> Vec<Capability> {
        vec![
            Capability::Config,
            Capability::Enrol,
            Capability::Unenrol,
            Capability::Manage,
            Capability::CourseEnrolConfig,
        ]
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
