//! Migration: Create enrol_invitations table

use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_users::Users;
use super::m20260301_000002_create_courses::Courses;
use super::m20260301_000004_create_enrol_instances::EnrolInstances;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EnrolInvitations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EnrolInvitations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EnrolInvitations::Token)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(EnrolInvitations::CourseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EnrolInvitations::InstanceId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EnrolInvitations::CreatorId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EnrolInvitations::Email).string().not_null())
                    .col(ColumnDef::new(EnrolInvitations::RoleId).big_integer().null())
                    .col(
                        ColumnDef::new(EnrolInvitations::EnrolStartDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(EnrolInvitations::EnrolEndDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(EnrolInvitations::Used)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EnrolInvitations::UsedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(EnrolInvitations::RedeemedByUserId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(EnrolInvitations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(EnrolInvitations::Table, EnrolInvitations::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(EnrolInvitations::Table, EnrolInvitations::InstanceId)
                            .to(EnrolInstances::Table, EnrolInstances::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(EnrolInvitations::Table, EnrolInvitations::CreatorId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(EnrolInvitations::Table, EnrolInvitations::RedeemedByUserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrol_invitations_token_used")
                    .table(EnrolInvitations::Table)
                    .col(EnrolInvitations::Token)
                    .col(EnrolInvitations::Used)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrol_invitations_course")
                    .table(EnrolInvitations::Table)
                    .col(EnrolInvitations::CourseId)
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
                    .table(EnrolInvitations::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum EnrolInvitations {
    Table,
    Id,
    Token,
    CourseId,
    InstanceId,
    CreatorId,
    Email,
    RoleId,
    EnrolStartDate,
    EnrolEndDate,
    Used,
    UsedAt,
    RedeemedByUserId,
    CreatedAt,
}
