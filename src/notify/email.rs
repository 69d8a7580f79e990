//! SMTP notifier via lettre.

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};

use super::{AgentNotifier, ContactDecision, ContactNotice};
use crate::config::parse_var;
use crate::error::{ConfigError, NotifyError};

// ── Configuration ───────────────────────────────────────────────────

/// SMTP configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
    /// Copied on every contact email when set.
    pub agent_inbox: Option<String>,
}

impl SmtpConfig {
    /// Returns `Ok(None)` if `SMTP_USERNAME` or `SMTP_PASSWORD` is unset
    /// (emails disabled).
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// A set `SMTP_PORT` that is not a valid port is an error.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let Some(username) = lookup("SMTP_USERNAME").filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };
        let Some(password) = lookup("SMTP_PASSWORD").filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        let server = lookup("SMTP_SERVER").unwrap_or_else(|| "smtp.gmail.com".to_string());
        let port: u16 = parse_var(&lookup, "SMTP_PORT")?.unwrap_or(587);
        let from_address = lookup("SMTP_FROM").unwrap_or_else(|| username.clone());
        let agent_inbox = lookup("AGENT_INBOX").filter(|s| !s.trim().is_empty());

        Ok(Some(Self {
            server,
            port,
            username,
            password: SecretString::from(password),
            from_address,
            agent_inbox,
        }))
    }
}

// ── Templates ───────────────────────────────────────────────────────

/// Subject and body for a contact notice.
pub fn render(notice: &ContactNotice) -> (String, String) {
    let title = notice.campaign.title();
    match notice.decision {
        ContactDecision::Requested => {
            let contact = notice
                .contact
                .as_deref()
                .or(notice.email.as_deref())
                .unwrap_or("the details you provided");
            (
                format!("Your {title} quote: an agent will be in touch"),
                format!(
                    "Dear {name},\n\n\
                     Thank you for your interest in {title}. One of our agents will \
                     contact you at {contact} shortly to walk you through your options.\n\n\
                     Your estimate:\n{summary}\n\n\
                     Best regards,\nThe Advisory Team",
                    name = notice.name,
                    summary = notice.summary,
                ),
            )
        }
        ContactDecision::Declined => (
            format!("Your {title} quote"),
            format!(
                "Dear {name},\n\n\
                 Thank you for exploring {title} with us. Here is a copy of your \
                 estimate for your records:\n{summary}\n\n\
                 If you change your mind, just start a new chat and pick the plan again.\n\n\
                 Best regards,\nThe Advisory Team",
                name = notice.name,
                summary = notice.summary,
            ),
        ),
    }
}

// ── Notifier ────────────────────────────────────────────────────────

pub struct SmtpNotifier {
    config: SmtpConfig,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, to: &str, notice: &ContactNotice) -> Result<Message, NotifyError> {
        let (subject, body) = render(notice);

        let mut builder = Message::builder()
            .from(parse_mailbox(&self.config.from_address)?)
            .to(parse_mailbox(to)?)
            .subject(subject);
        if let Some(inbox) = &self.config.agent_inbox {
            builder = builder.cc(parse_mailbox(inbox)?);
        }

        builder
            .body(body)
            .map_err(|e| NotifyError::Build(e.to_string()))
    }

    fn send_blocking(config: &SmtpConfig, message: &Message) -> Result<(), NotifyError> {
        let creds = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = SmtpTransport::relay(&config.server)
            .map_err(|e| NotifyError::Send(format!("SMTP relay error: {e}")))?
            .port(config.port)
            .credentials(creds)
            .build();

        transport
            .send(message)
            .map_err(|e| NotifyError::Send(e.to_string()))?;
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<lettre::message::Mailbox, NotifyError> {
    address.parse().map_err(|e: lettre::address::AddressError| NotifyError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl AgentNotifier for SmtpNotifier {
    async fn notify(&self, notice: &ContactNotice) -> Result<(), NotifyError> {
        let Some(to) = notice.email.as_deref() else {
            tracing::debug!(campaign = %notice.campaign, "No email on profile, skipping");
            return Ok(());
        };
        let message = self.build_message(to, notice)?;

        let config = self.config.clone();
        tokio::task::spawn_blocking(move || Self::send_blocking(&config, &message))
            .await
            .map_err(|e| NotifyError::Send(format!("send task failed: {e}")))??;

        tracing::info!(campaign = %notice.campaign, decision = ?notice.decision, "Contact email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaigns::CampaignKind;

    fn notice(decision: ContactDecision) -> ContactNotice {
        ContactNotice {
            campaign: CampaignKind::IncomeProtection,
            decision,
            name: "Ali".into(),
            email: Some("ali@example.com".into()),
            contact: Some("012-3456789".into()),
            summary: "Annual premium: RM1,020".into(),
        }
    }

    fn config(agent_inbox: Option<&str>) -> SmtpConfig {
        SmtpConfig {
            server: "smtp.example.com".into(),
            port: 587,
            username: "bot@example.com".into(),
            password: SecretString::from("secret".to_string()),
            from_address: "bot@example.com".into(),
            agent_inbox: agent_inbox.map(String::from),
        }
    }

    #[test]
    fn requested_template_mentions_contact_and_summary() {
        let (subject, body) = render(&notice(ContactDecision::Requested));
        assert!(subject.contains("Satu Gaji Satu Harapan"));
        assert!(body.contains("Dear Ali"));
        assert!(body.contains("012-3456789"));
        assert!(body.contains("RM1,020"));
    }

    #[test]
    fn declined_template_keeps_summary() {
        let (_, body) = render(&notice(ContactDecision::Declined));
        assert!(body.contains("RM1,020"));
        assert!(!body.contains("012-3456789"));
    }

    #[test]
    fn builds_message_with_agent_cc() {
        let notifier = SmtpNotifier::new(config(Some("agents@example.com")));
        let message = notifier
            .build_message("ali@example.com", &notice(ContactDecision::Requested))
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: ali@example.com"));
        assert!(raw.contains("Cc: agents@example.com"));
    }

    #[test]
    fn invalid_recipient_is_reported() {
        let notifier = SmtpNotifier::new(config(None));
        let err = notifier
            .build_message("not-an-address", &notice(ContactDecision::Declined))
            .unwrap_err();
        assert!(matches!(err, NotifyError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn skips_profiles_without_email() {
        let notifier = SmtpNotifier::new(config(None));
        let mut n = notice(ContactDecision::Requested);
        n.email = None;
        assert!(notifier.notify(&n).await.is_ok());
    }

    #[test]
    fn config_requires_credentials() {
        assert!(SmtpConfig::from_lookup(|_| None).unwrap().is_none());
        let config = SmtpConfig::from_lookup(|k| match k {
            "SMTP_USERNAME" => Some("bot@example.com".into()),
            "SMTP_PASSWORD" => Some("pw".into()),
            _ => None,
        })
        .unwrap()
        .unwrap();
        assert_eq!(config.server, "smtp.gmail.com");
        assert_eq!(config.port, 587);
        assert_eq!(config.from_address, "bot@example.com");
        assert!(config.agent_inbox.is_none());
    }

    #[test]
    fn bad_smtp_port_is_an_error() {
        let lookup = |port: &'static str| {
            move |k: &str| match k {
                "SMTP_USERNAME" => Some("bot@example.com".to_string()),
                "SMTP_PASSWORD" => Some("pw".to_string()),
                "SMTP_PORT" => Some(port.to_string()),
                _ => None,
            }
        };

        for bad in ["smtp", "70000", "-1"] {
            let err = SmtpConfig::from_lookup(lookup(bad)).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "SMTP_PORT"),
                "{bad} should be rejected"
            );
        }

        let config = SmtpConfig::from_lookup(lookup("465")).unwrap().unwrap();
        assert_eq!(config.port, 465);
        let config = SmtpConfig::from_lookup(lookup(" ")).unwrap().unwrap();
        assert_eq!(config.port, 587);
    }
}
