pub mod capability;
pub mod host;
pub mod instance_actions;
pub mod invitation;
pub mod links;
pub mod notification;
pub mod redemption;
pub mod security;

pub use capability::Capability;
pub use host::{CapabilityPolicy, CurrentUser, Directory, EnrolmentManager, SeaOrmHost, TokenStore};
pub use instance_actions::InvitationPlugin;
pub use invitation::InvitationService;
pub use links::SiteLinks;
pub use notification::Notifier;
pub use redemption::{Redemption, RedemptionError, RedemptionFlow};
pub use security::*;
