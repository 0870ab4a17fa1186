//! Email delivery service using lettre/SMTP.

use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::Config;

/// Email delivery service.
pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
}

impl EmailService {
    /// Create a new email service.
    ///
    /// `encryption` controls the SMTP transport mode:
    /// - `"starttls"` (default): Opportunistic STARTTLS on port 587
    /// - `"tls"`: Implicit TLS (SMTPS) on port 465
    /// - `"none"`: Unencrypted (for local dev only)
    pub fn new(
        smtp_host: &str,
        smtp_port: u16,
        smtp_username: Option<&str>,
        smtp_password: Option<&str>,
        encryption: &str,
        from_email: String,
    ) -> Result<Self> {
        let mut builder = match encryption {
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)
                .context("failed to create SMTP relay transport")?
                .port(smtp_port),
            "none" => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host).port(smtp_port)
            }
            _ => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)
                .context("failed to create SMTP STARTTLS transport")?
                .port(smtp_port),
        };

        if let (Some(user), Some(pass)) = (smtp_username, smtp_password) {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(Self {
            transport: builder.build(),
            from_email,
        })
    }

    /// Build the service from configuration; None when SMTP_HOST is unset.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let Some(host) = config.smtp_host.as_deref() else {
            return Ok(None);
        };

        Self::new(
            host,
            config.smtp_port,
            config.smtp_username.as_deref(),
            config.smtp_password.as_deref(),
            &config.smtp_encryption,
            config.smtp_from_email.clone(),
        )
        .map(Some)
    }

    /// Send a plain-text email.
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .context("invalid from email address")?,
            )
            .to(to.parse().context("invalid recipient email address")?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("failed to build email message")?;

        self.transport
            .send(email)
            .await
            .context("failed to send email")?;

        Ok(())
    }

    /// Confirm a newly created conference to its organizer.
    pub async fn send_conference_confirmation(&self, to: &str, conference_info: &str) -> Result<()> {
        let (subject, body) = confirmation_message(conference_info);
        self.send(to, subject, &body).await
    }
}

/// Subject and body of the conference confirmation email.
pub fn confirmation_message(conference_info: &str) -> (&'static str, String) {
    (
        "You created a new Conference!",
        format!("Hi, you have created the following conference:\r\n\r\n{conference_info}"),
    )
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn email_service_construction_is_lazy() {
        // Construction does not connect
        let result = EmailService::new(
            "nonexistent.invalid",
            587,
            None,
            None,
            "starttls",
            "test@example.com".to_string(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn email_service_supports_tls_and_none_modes() {
        for (mode, port) in [("tls", 465), ("none", 25)] {
            let result = EmailService::new(
                "localhost",
                port,
                Some("user"),
                Some("pass"),
                mode,
                "test@example.com".to_string(),
            );
            assert!(result.is_ok(), "{mode}");
        }
    }

    #[test]
    fn confirmation_includes_conference_info() {
        let (subject, body) = confirmation_message("Name: RustConf");
        assert_eq!(subject, "You created a new Conference!");
        assert!(body.ends_with("Name: RustConf"));
    }
}
