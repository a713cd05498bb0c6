use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

use crate::services::capability::Capability;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        seed_roles(db).await
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // Seeding is not reversible - data may have been modified
        Ok(())
    }
}

async fn seed_roles(db: &SchemaManagerConnection<'_>) -> Result<(), DbErr> {
    use crate::models::prelude::*;
    use crate::models::{role, role_capability};

    let role_count = Role::find().count(db).await?;
    if role_count > 0 {
        return Ok(());
    }

    let staff_capabilities = [
        Capability::Config,
        Capability::Enrol,
        Capability::Unenrol,
        Capability::Manage,
        Capability::CourseEnrolConfig,
    ];

    let default_roles: [(&str, &str, &[Capability]); 4] = [
        ("manager", "Manager", &staff_capabilities),
        ("editingteacher", "Teacher", &staff_capabilities),
        ("teacher", "Non-editing teacher", &[Capability::Enrol]),
        ("student", "Student", &[]),
    ];

    for (short_name, name, capabilities) in default_roles {
        let created = role::ActiveModel {
            short_name: Set(short_name.to_string()),
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        for capability in capabilities {
            role_capability::ActiveModel {
                role_id: Set(created.id),
                capability: Set(capability.as_str().to_string()),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }

    tracing::info!("Default roles seeded");
    Ok(())
}
