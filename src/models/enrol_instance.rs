use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Plugin kind stored in `enrol` for instances owned by this service.
pub const INVITATION_ENROL: &str = "invitation";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enrol_instances")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    pub enrol: String,
    pub name: Option<String>,
    pub enabled: bool,
    /// Role offered to new invitations
    pub role_id: Option<i64>,
    pub enrol_start_date: Option<DateTimeUtc>,
    pub enrol_end_date: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_invitation(&self) -> bool {
        self.enrol == INVITATION_ENROL
    }

    /// Display name, falling back to the plugin name
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => "Invitation".to_string(),
        }
    }
}
