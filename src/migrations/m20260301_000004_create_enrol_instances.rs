//! Migration: Create enrol_instances table

use sea_orm_migration::prelude::*;

use super::m20260301_000002_create_courses::Courses;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EnrolInstances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EnrolInstances::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EnrolInstances::CourseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EnrolInstances::Enrol).string().not_null())
                    .col(ColumnDef::new(EnrolInstances::Name).string().null())
                    .col(
                        ColumnDef::new(EnrolInstances::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(EnrolInstances::RoleId).big_integer().null())
                    .col(
                        ColumnDef::new(EnrolInstances::EnrolStartDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(EnrolInstances::EnrolEndDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(EnrolInstances::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(EnrolInstances::Table, EnrolInstances::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrol_instances_course")
                    .table(EnrolInstances::Table)
                    .col(EnrolInstances::CourseId)
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
                    .table(EnrolInstances::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
pub enum EnrolInstances {
    Table,
    Id,
    CourseId,
    Enrol,
    Name,
    Enabled,
    RoleId,
    EnrolStartDate,
    EnrolEndDate,
    CreatedAt,
}
