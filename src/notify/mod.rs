//! Agent-contact notifications sent once a user decides on agent contact.

pub mod email;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::campaigns::CampaignKind;
use crate::error::NotifyError;

pub use email::{SmtpConfig, SmtpNotifier};

/// What the user decided when offered an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactDecision {
    Requested,
    Declined,
}

/// Everything a notifier needs to tell the user (and agent) what happens
/// next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactNotice {
    pub campaign: CampaignKind,
    pub decision: ContactDecision,
    pub name: String,
    pub email: Option<String>,
    /// Phone or email the user asked to be reached on.
    pub contact: Option<String>,
    /// The estimate as shown in the chat.
    pub summary: String,
}

#[async_trait]
pub trait AgentNotifier: Send + Sync {
    async fn notify(&self, notice: &ContactNotice) -> Result<(), NotifyError>;
}

/// Used when SMTP is not configured.
pub struct NoopNotifier;

#[async_trait]
impl AgentNotifier for NoopNotifier {
    async fn notify(&self, notice: &ContactNotice) -> Result<(), NotifyError> {
        debug!(
            campaign = %notice.campaign,
            decision = ?notice.decision,
            "SMTP not configured, skipping contact email"
        );
        Ok(())
    }
}

/// Collects notices for assertions.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub notices: tokio::sync::Mutex<Vec<ContactNotice>>,
}

#[cfg(test)]
#[async_trait]
impl AgentNotifier for RecordingNotifier {
    async fn notify(&self, notice: &ContactNotice) -> Result<(), NotifyError> {
        self.notices.lock().await.push(notice.clone());
        Ok(())
    }
}
