//! The five insurance campaigns and the registry that routes to them.

pub mod combo;
pub mod education;
pub mod income;
pub mod legacy;
pub mod medical;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dialog::{CampaignHandler, CampaignScript};
use crate::leads::LeadWriter;
use crate::notify::AgentNotifier;

/// Campaign identifiers. The serialized form is the stable id used in
/// lead rows, logs and the REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampaignKind {
    #[serde(rename = "sgsa")]
    IncomeProtection,
    #[serde(rename = "tabung_warisan")]
    Legacy,
    #[serde(rename = "masa_depan_anak_kita")]
    Education,
    #[serde(rename = "tabung_perubatan")]
    Medical,
    #[serde(rename = "perlindungan_combo")]
    Combo,
}

impl CampaignKind {
    pub const ALL: [CampaignKind; 5] = [
        Self::IncomeProtection,
        Self::Legacy,
        Self::Education,
        Self::Medical,
        Self::Combo,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::IncomeProtection => "sgsa",
            Self::Legacy => "tabung_warisan",
            Self::Education => "masa_depan_anak_kita",
            Self::Medical => "tabung_perubatan",
            Self::Combo => "perlindungan_combo",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::IncomeProtection => "Satu Gaji Satu Harapan",
            Self::Legacy => "Tabung Warisan",
            Self::Education => "Masa Depan Anak Kita",
            Self::Medical => "Tabung Perubatan",
            Self::Combo => "Perlindungan Combo",
        }
    }

    /// One-line pitch listed beside the title in the plan menu.
    pub fn tagline(&self) -> &'static str {
        match self {
            Self::IncomeProtection => "Income protection for your family",
            Self::Legacy => "A guaranteed legacy for your loved ones",
            Self::Education => "Savings for your child's education",
            Self::Medical => "Medical and hospitalisation cover",
            Self::Combo => "Life, medical and critical illness in one plan",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub fn script(&self) -> &'static CampaignScript {
        match self {
            Self::IncomeProtection => &income::SCRIPT,
            Self::Legacy => &legacy::SCRIPT,
            Self::Education => &education::SCRIPT,
            Self::Medical => &medical::SCRIPT,
            Self::Combo => &combo::SCRIPT,
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::IncomeProtection => 0,
            Self::Legacy => 1,
            Self::Education => 2,
            Self::Medical => 3,
            Self::Combo => 4,
        }
    }
}

impl fmt::Display for CampaignKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One handler per campaign, sharing the lead writer and notifier.
pub struct Campaigns {
    handlers: Vec<CampaignHandler>,
}

impl Campaigns {
    pub fn new(leads: LeadWriter, notifier: Arc<dyn AgentNotifier>) -> Self {
        let handlers = CampaignKind::ALL
            .iter()
            .map(|kind| CampaignHandler::new(kind.script(), leads.clone(), Arc::clone(&notifier)))
            .collect();
        Self { handlers }
    }

    pub fn handler(&self, kind: CampaignKind) -> &CampaignHandler {
        &self.handlers[kind.index()]
    }

    /// Drop a session's state in every campaign.
    pub async fn end_session(&self, session_id: &str) {
        for handler in &self.handlers {
            handler.end_session(session_id).await;
        }
    }

    /// Evict idle campaign states. Returns how many were removed.
    pub async fn sweep(&self, max_age: Duration) -> usize {
        let mut evicted = 0;
        for handler in &self.handlers {
            evicted += handler.evict_idle(max_age).await;
        }
        evicted
    }
}
