//! Migration: Create user_enrolments table

use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_users::Users;
use super::m20260301_000003_create_roles::Roles;
use super::m20260301_000004_create_enrol_instances::EnrolInstances;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserEnrolments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserEnrolments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserEnrolments::InstanceId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserEnrolments::CourseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserEnrolments::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserEnrolments::RoleId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserEnrolments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(UserEnrolments::Table, UserEnrolments::InstanceId)
                            .to(EnrolInstances::Table, EnrolInstances::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(UserEnrolments::Table, UserEnrolments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(UserEnrolments::Table, UserEnrolments::RoleId)
                            .to(Roles::Table, Roles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // One enrolment per user and instance
        manager
            .create_index(
                Index::create()
                    .name("idx_user_enrolments_instance_user")
                    .table(UserEnrolments::Table)
                    .col(UserEnrolments::InstanceId)
                    .col(UserEnrolments::UserId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_enrolments_course_user")
                    .table(UserEnrolments::Table)
                    .col(UserEnrolments::CourseId)
                    .col(UserEnrolments::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(UserEnrolments::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum UserEnrolments {
    Table,
    Id,
    InstanceId,
    CourseId,
    UserId,
    RoleId,
    CreatedAt,
}
