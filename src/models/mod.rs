pub mod course;
pub mod enrol_instance;
pub mod invitation;
pub mod role;
pub mod role_capability;
pub mod user;
pub mod user_enrolment;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::course::{self, Entity as Course};
    pub use super::enrol_instance::{self, Entity as EnrolInstance};
    pub use super::invitation::{self, Entity as Invitation};
    pub use super::role::{self, Entity as Role};
    pub use super::role_capability::{self, Entity as RoleCapability};
    pub use super::user::{self, Entity as User};
    pub use super::user_enrolment::{self, Entity as UserEnrolment};
}
