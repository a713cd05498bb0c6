use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use super::{Mailer, SendResult};
use crate::config::mail::MailConfig;

/// SMTP delivery through lettre
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    from_name: String,
}

impl SmtpMailer {
    pub fn from_config(config: &MailConfig) -> Result<Self, String> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| "SMTP host not configured".to_string())?;

        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| format!("Failed to create SMTP transport: {}", e))?
                .port(config.smtp_port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(config.smtp_port)
        };

        if let (Some(user), Some(pass)) = (config.username.clone(), config.password.clone()) {
            builder = builder.credentials(Credentials::new(user, pass));
        }

        Ok(Self {
            transport: builder.build(),
            from_address: config.from_address.clone(),
            from_name: config.from_name.clone(),
        })
    }

    fn build_message(&self, to: &str, subject: &str, body: &str) -> Result<Message, String> {
        let to_mailbox = to
            .parse()
            .map_err(|_| "Invalid recipient email address".to_string())?;

        let from = format!("{} <{}>", self.from_name, self.from_address);
        let from_mailbox = match from.parse() {
            Ok(mbox) => mbox,
            Err(_) => self
                .from_address
                .parse()
                .map_err(|_| "Invalid from email address".to_string())?,
        };

        Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| format!("Failed to build email: {}", e))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> SendResult {
        let email = match self.build_message(to, subject, body) {
            Ok(email) => email,
            Err(e) => return SendResult::failed(e),
        };

        match self.transport.send(email).await {
            Ok(_) => SendResult::sent(),
            Err(e) => SendResult::failed(format!("Failed to send email: {}", e)),
        }
    }
}
