pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users;
mod m20260301_000002_create_courses;
mod m20260301_000003_create_roles;
mod m20260301_000004_create_enrol_instances;
mod m20260301_000005_create_user_enrolments;
mod m20260301_000006_create_enrol_invitations;
mod m20260301_000007_seed_roles;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_users::Migration),
            Box::new(m20260301_000002_create_courses::Migration),
            Box::new(m20260301_000003_create_roles::Migration),
            Box::new(m20260301_000004_create_enrol_instances::Migration),
            Box::new(m20260301_000005_create_user_enrolments::Migration),
            Box::new(m20260301_000006_create_enrol_invitations::Migration),
            Box::new(m20260301_000007_seed_roles::Migration),
        ]
    }
}
