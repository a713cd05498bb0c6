use std::env;

#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Public base URL used when building links in emails, without trailing slash.
    pub site_url: String,
    pub site_name: String,
}

impl SiteConfig {
    pub fn from_env() -> Self {
        Self {
            site_url: env::var("ENROL_INVITE_SITE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            site_name: env::var("ENROL_INVITE_SITE_NAME")
                .unwrap_or_else(|_| "Learning Site".to_string()),
        }
    }
}
