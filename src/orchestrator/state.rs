//! Onboarding state machine — tracks where a session is in the funnel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::Profile;
use crate::campaigns::CampaignKind;
use crate::dialog::{DialogStep, Response};

/// The steps of the top-level conversation.
///
/// The funnel progresses linearly from `GetName` to `CampaignSelection`.
/// From there the user enters a campaign or says goodbye. Every step
/// may go back to `GetName` on a full reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    GetName,
    GetDob,
    GetEmail,
    GetFinancialConcern,
    GetLifeStage,
    GetDependents,
    GetExistingCoverage,
    GetPremiumBudget,
    CampaignSelection,
    InCampaign,
    Done,
}

impl OnboardingStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: OnboardingStep) -> bool {
        use OnboardingStep::*;
        matches!(
            (self, target),
            (GetName, GetDob)
                | (GetDob, GetEmail)
                | (GetEmail, GetFinancialConcern)
                | (GetFinancialConcern, GetLifeStage)
                | (GetLifeStage, GetDependents)
                | (GetDependents, GetExistingCoverage)
                | (GetExistingCoverage, GetPremiumBudget)
                | (GetPremiumBudget, CampaignSelection)
                | (CampaignSelection, InCampaign)
                | (CampaignSelection, Done)
                | (_, GetName)
        )
    }

    /// Whether the conversation has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<OnboardingStep> {
        use OnboardingStep::*;
        match self {
            GetName => Some(GetDob),
            GetDob => Some(GetEmail),
            GetEmail => Some(GetFinancialConcern),
            GetFinancialConcern => Some(GetLifeStage),
            GetLifeStage => Some(GetDependents),
            GetDependents => Some(GetExistingCoverage),
            GetExistingCoverage => Some(GetPremiumBudget),
            GetPremiumBudget => Some(CampaignSelection),
            CampaignSelection => Some(InCampaign),
            InCampaign | Done => None,
        }
    }
}

impl Default for OnboardingStep {
    fn default() -> Self {
        Self::GetName
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::GetName => "get_name",
            Self::GetDob => "get_dob",
            Self::GetEmail => "get_email",
            Self::GetFinancialConcern => "get_financial_concern",
            Self::GetLifeStage => "get_life_stage",
            Self::GetDependents => "get_dependents",
            Self::GetExistingCoverage => "get_existing_coverage",
            Self::GetPremiumBudget => "get_premium_budget",
            Self::CampaignSelection => "campaign_selection",
            Self::InCampaign => "in_campaign",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}

/// Last free-text message and the reply it got.
#[derive(Debug, Clone)]
pub(crate) struct RecentText {
    pub text: String,
    /// Funnel step and campaign step before the message was handled.
    pub position: (OnboardingStep, Option<DialogStep>),
    pub at: DateTime<Utc>,
    pub response: Response,
}

/// One conversation.
///
/// `active_campaign` is set exactly when the step is `InCampaign`; both are
/// private so only `enter_campaign`, `finish` and `reset` can change them.
#[derive(Debug, Clone, Default)]
pub struct Session {
    step: OnboardingStep,
    pub profile: Profile,
    active_campaign: Option<CampaignKind>,
    /// Campaigns in the order the last menu listed them.
    pub menu: Vec<CampaignKind>,
    pub(crate) recent: Option<RecentText>,
}

impl Session {
    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    pub fn active_campaign(&self) -> Option<CampaignKind> {
        self.active_campaign
    }

    /// Advance to the next funnel step. Campaign entry goes through
    /// `enter_campaign` instead.
    pub fn advance(&mut self) -> Result<OnboardingStep, String> {
        let next = self
            .step
            .next()
            .filter(|next| *next != OnboardingStep::InCampaign)
            .ok_or_else(|| format!("No funnel step after {}", self.step))?;
        if !self.step.can_transition_to(next) {
            return Err(format!("Cannot transition from {} to {}", self.step, next));
        }
        self.step = next;
        Ok(next)
    }

    pub fn enter_campaign(&mut self, kind: CampaignKind) -> Result<(), String> {
        if !self.step.can_transition_to(OnboardingStep::InCampaign) {
            return Err(format!("Cannot enter a campaign from {}", self.step));
        }
        self.step = OnboardingStep::InCampaign;
        self.active_campaign = Some(kind);
        self.profile.selected_plan = Some(kind);
        Ok(())
    }

    /// End the conversation.
    pub fn finish(&mut self) {
        self.step = OnboardingStep::Done;
        self.active_campaign = None;
    }

    /// Replace the session wholesale: profile, menu and step.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
