//! Email delivery collaborator.
//!
//! The workflow only ever talks to the `Mailer` trait; `SmtpMailer` is the
//! production implementation over an async SMTP transport. Address validity
//! is checked syntactically before the collaborator is invoked.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::EmailConfig;
use crate::error::{PredicaError, Result};

/// Delivery collaborator. Mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Syntactic email check: one `@`, non-empty local part, dotted domain, no
/// whitespace. Anything stricter is the receiving server's business.
pub fn validate_email(address: &str) -> bool {
    let address = address.trim();
    if address.is_empty() || address.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty()
}

/// SMTP delivery with credentials and relay host from the email config
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        if config.user.is_empty() || config.password.is_empty() {
            return Err(PredicaError::config(
                "email credentials are not set (EMAIL_USER / EMAIL_PASSWORD or the email \
                 section of the config file)",
            ));
        }

        let credentials = Credentials::new(config.user.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_server)
            .map_err(|e| {
                PredicaError::config(format!(
                    "invalid SMTP server '{}': {e}",
                    config.smtp_server
                ))
            })?
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from: config.user.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.from.parse().map_err(|e| {
                PredicaError::config(format!("invalid sender address '{}': {e}", self.from))
            })?)
            .to(to.parse().map_err(|e| {
                PredicaError::upstream(format!("invalid recipient address '{to}': {e}"))
            })?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| PredicaError::upstream(format!("could not build email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| PredicaError::upstream(format!("SMTP delivery failed: {e}")))?;

        info!(%to, "predication emailed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_accepts_plain_addresses() {
        assert!(validate_email("preacher@example.org"));
        assert!(validate_email("  gaillardbx@gmail.com "));
        assert!(validate_email("a.b+c@sub.domain.ch"));
    }

    #[test]
    fn test_validate_email_rejects_malformed_addresses() {
        assert!(!validate_email(""));
        assert!(!validate_email("no-at-sign"));
        assert!(!validate_email("@example.org"));
        assert!(!validate_email("someone@"));
        assert!(!validate_email("someone@nodot"));
        assert!(!validate_email("some one@example.org"));
        assert!(!validate_email("two@@example.org"));
    }

    #[test]
    fn test_smtp_mailer_requires_credentials() {
        let config = EmailConfig {
            smtp_server: "smtp.gmail.com".to_string(),
            user: String::new(),
            password: String::new(),
        };
        assert!(matches!(
            SmtpMailer::new(&config),
            Err(PredicaError::Config(_))
        ));
    }
}
