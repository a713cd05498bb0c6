mod email;

pub use email::SmtpMailer;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::CONFIG;
use crate::services::host::{Contact, CourseSummary};
use crate::services::links::SiteLinks;

/// Notification message to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub recipient: String,
    pub title: String,
    pub body: String,
}

/// Result of sending a notification
#[derive(Debug)]
pub struct SendResult {
    pub success: bool,
    pub error: Option<String>,
}

impl SendResult {
    pub fn sent() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Mail delivery owned by the host
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> SendResult;
}

/// Best-effort mail notifications.
///
/// Delivery failures are logged and never reported back to the caller's flow.
#[derive(Clone, Default)]
pub struct Notifier {
    mailer: Option<Arc<dyn Mailer>>,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self {
            mailer: Some(mailer),
        }
    }

    /// Notifier that drops every message
    pub fn disabled() -> Self {
        Self { mailer: None }
    }

    /// Build from SMTP configuration; mail stays disabled when unconfigured
    pub fn from_config() -> Self {
        if !CONFIG.mail.is_enabled() {
            tracing::info!("SMTP not configured, email notifications disabled");
            return Self::disabled();
        }

        match SmtpMailer::from_config(&CONFIG.mail) {
            Ok(mailer) => {
                tracing::info!("Email notification provider initialized");
                Self::new(Arc::new(mailer))
            }
            Err(e) => {
                tracing::warn!("Failed to initialize SMTP mailer: {}. Email disabled.", e);
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    /// Send a message and wait for the outcome
    pub async fn notify(&self, message: &NotificationMessage) -> SendResult {
        let Some(mailer) = self.mailer.as_ref() else {
            tracing::debug!(
                "Mail disabled, dropping notification to {}",
                mask_recipient(&message.recipient)
            );
            return SendResult::failed("Mail not configured");
        };

        let result = mailer
            .send(&message.recipient, &message.title, &message.body)
            .await;

        if result.success {
            tracing::info!("Notification sent to {}", mask_recipient(&message.recipient));
        } else {
            tracing::warn!(
                "Notification to {} failed: {}",
                mask_recipient(&message.recipient),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        result
    }

    /// Send a message in the background without waiting
    pub fn dispatch(&self, message: NotificationMessage) {
        let notifier = self.clone();
        tokio::spawn(async move {
            notifier.notify(&message).await;
        });
    }
}

/// Message telling the inviter that their invitation was accepted
pub fn enrolment_notice(
    inviter: &Contact,
    invitee_full_name: &str,
    course: &CourseSummary,
    links: &SiteLinks,
) -> NotificationMessage {
    let title = format!("{} enrolled in {}", invitee_full_name, course.full_name);
    let body = format!(
        "Hello {},\n\n\
         {} accepted your invitation and is now enrolled in \"{}\".\n\n\
         Enrolled users: {}\n\n\
         {}\n{}",
        inviter.full_name(),
        invitee_full_name,
        course.full_name,
        links.enrolled_users_url(course.id),
        links.site_name(),
        links.site_url(),
    );

    NotificationMessage {
        recipient: inviter.email.clone(),
        title,
        body,
    }
}

/// Invitation email carrying the redeem link
pub fn invitation_message(
    recipient: &str,
    inviter_full_name: &str,
    course: &CourseSummary,
    redeem_url: &str,
    links: &SiteLinks,
) -> NotificationMessage {
    let title = format!("Invitation to join {}", course.full_name);
    let body = format!(
        "Hello,\n\n\
         {} invited you to join \"{}\" on {}.\n\n\
         Follow this link to accept. It can be used only once:\n{}\n\n\
         {}",
        inviter_full_name,
        course.full_name,
        links.site_name(),
        redeem_url,
        links.site_url(),
    );

    NotificationMessage {
        recipient: recipient.to_string(),
        title,
        body,
    }
}

/// Mask a recipient for logging (privacy)
fn mask_recipient(recipient: &str) -> String {
    let parts: Vec<&str> = recipient.split('@').collect();
    if parts.len() == 2 && parts[0].chars().count() > 2 {
        // Email: show first 2 chars and domain
        let prefix: String = parts[0].chars().take(2).collect();
        format!("{}***@{}", prefix, parts[1])
    } else {
        "***@***".to_string()
    }
}
