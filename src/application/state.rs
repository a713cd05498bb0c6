use std::sync::Arc;

use crate::db::DbConn;
use crate::services::host::SeaOrmHost;
use crate::services::instance_actions::InvitationPlugin;
use crate::services::invitation::InvitationService;
use crate::services::links::SiteLinks;
use crate::services::notification::Notifier;
use crate::services::redemption::RedemptionFlow;

/// Application state containing all shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub host: Arc<SeaOrmHost>,
    pub redemption: Arc<RedemptionFlow>,
    pub invitations: InvitationService,
    pub plugin: InvitationPlugin,
    pub links: SiteLinks,
}

impl AppState {
    /// Wire every service to the database-backed host
    pub fn new(db: DbConn, notifier: Notifier, links: SiteLinks) -> Self {
        let host = Arc::new(SeaOrmHost::new(db.clone()));

        let redemption = Arc::new(RedemptionFlow::new(
            host.clone(),
            host.clone(),
            host.clone(),
            notifier.clone(),
            links.clone(),
        ));
        let invitations =
            InvitationService::new(db.clone(), host.clone(), notifier, links.clone());
        let plugin = InvitationPlugin::new(host.clone(), links.clone());

        Self {
            db,
            host,
            redemption,
            invitations,
            plugin,
            links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::create_test_db;

    #[tokio::test]
    async fn test_app_state_clone_shares_services() {
        let db = create_test_db().await;
        let state1 = AppState::new(
            db,
            Notifier::disabled(),
            SiteLinks::new("http://localhost:8000", "Test Site"),
        );
        let state2 = state1.clone();

        assert!(Arc::ptr_eq(&state1.host, &state2.host));
        assert!(Arc::ptr_eq(&state1.redemption, &state2.redemption));
        assert_eq!(state2.links.site_url(), "http://localhost:8000/");
    }
}
