use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub short_name: String,
    pub full_name: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::enrol_instance::Entity")]
    EnrolInstances,
}

impl Related<super::enrol_instance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EnrolInstances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
