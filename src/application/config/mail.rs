use std::env;

/// SMTP settings. Mail is disabled when `ENROL_INVITE_SMTP_HOST` is unset.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub from_name: String,
    pub use_tls: bool,
}

impl MailConfig {
    pub fn from_env() -> Self {
        Self {
            smtp_host: env::var("ENROL_INVITE_SMTP_HOST")
                .ok()
                .filter(|h| !h.trim().is_empty()),
            smtp_port: env::var("ENROL_INVITE_SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            username: env::var("ENROL_INVITE_SMTP_USERNAME").ok(),
            password: env::var("ENROL_INVITE_SMTP_PASSWORD").ok(),
            from_address: env::var("ENROL_INVITE_SMTP_FROM")
                .unwrap_or_else(|_| "noreply@localhost".to_string()),
            from_name: env::var("ENROL_INVITE_SMTP_FROM_NAME")
                .unwrap_or_else(|_| "Course Invitations".to_string()),
            use_tls: env::var("ENROL_INVITE_SMTP_TLS")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(true),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.smtp_host.is_some()
    }
}
