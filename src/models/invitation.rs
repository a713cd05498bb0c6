use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A single-use invitation token.
///
/// `used` flips from `false` to `true` exactly once, together with `used_at`
/// and `redeemed_by_user_id`. An unset enrolment date means the window is
/// unbounded on that side.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enrol_invitations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub token: String,
    pub course_id: i64,
    pub instance_id: i64,
    pub creator_id: i64,
    pub email: String,
    pub role_id: Option<i64>,
    pub enrol_start_date: Option<DateTimeUtc>,
    pub enrol_end_date: Option<DateTimeUtc>,
    pub used: bool,
    pub used_at: Option<DateTimeUtc>,
    pub redeemed_by_user_id: Option<i64>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatorId",
        to = "super::user::Column::Id"
    )]
    Creator,
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Role to grant on redemption; zero is treated as unset
    pub fn grant_role(&self) -> Option<i64> {
        self.role_id.filter(|id| *id != 0)
    }
}
