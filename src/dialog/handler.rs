//! Generic campaign dialog handler.
//!
//! Every campaign runs the same state machine:
//!
//! ```text
//! welcome → benefits_shown → collecting(0..n) → offer_agent_contact
//!         → get_contact_info → contact_confirmed
//!                            ↘ declined
//! ```
//!
//! Leaving the last collecting step computes the estimate and emits the
//! lead. `main_menu` / `restart` short-circuit every step with a
//! return-to-menu control response.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::message::{Choice, Inbound, Response, Transition, choices};
use super::parse::{
    is_affirmative, is_help_command, is_main_menu_command, is_negative, parse_contact,
};
use super::script::{Answers, CampaignScript, EstimateError, FieldSpec};
use crate::campaigns::CampaignKind;
use crate::error::{DialogError, ValidationError};
use crate::leads::{LeadRecord, LeadWriter};
use crate::notify::{AgentNotifier, ContactDecision, ContactNotice};
use crate::orchestrator::model::Profile;
use crate::session::SessionRegistry;

const APOLOGY: &str = "Sorry, something went wrong on our side. Let's start this plan again.";
const NOT_UNDERSTOOD: &str = "Sorry, I didn't catch that.";
const RETURNING: &str = "Returning to the main menu.";

const WELCOME_CHOICES: &[(&str, &str)] = &[
    ("Tell me more", "learn_more"),
    ("Get a quote", "get_quote"),
    ("Not now", "not_now"),
];
const BENEFITS_CHOICES: &[(&str, &str)] = &[("Yes, get a quote", "get_quote"), ("No thanks", "no")];
const OFFER_CHOICES: &[(&str, &str)] = &[
    ("Yes, contact me", "contact_agent"),
    ("No, thanks", "no_contact"),
    ("Main Menu", "main_menu"),
];

/// Steps of the campaign dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogStep {
    Welcome,
    BenefitsShown,
    /// Collecting the script field at this index.
    Collecting(usize),
    OfferAgentContact,
    GetContactInfo,
    ContactConfirmed,
    Declined,
}

impl DialogStep {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ContactConfirmed | Self::Declined)
    }
}

impl std::fmt::Display for DialogStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Welcome => write!(f, "welcome"),
            Self::BenefitsShown => write!(f, "benefits_shown"),
            Self::Collecting(index) => write!(f, "collecting_inputs[{index}]"),
            Self::OfferAgentContact => write!(f, "offer_agent_contact"),
            Self::GetContactInfo => write!(f, "get_contact_info"),
            Self::ContactConfirmed => write!(f, "contact_confirmed"),
            Self::Declined => write!(f, "declined"),
        }
    }
}

/// Per-(session, campaign) dialog state.
#[derive(Debug, Clone)]
pub struct CampaignState {
    pub step: DialogStep,
    /// Snapshot of the onboarding profile, refreshed on every message.
    pub profile: Profile,
    pub answers: Answers,
    /// The current field is waiting for a free amount after "other".
    pub awaiting_custom: bool,
    pub summary: Option<String>,
    /// At most one lead per state lifetime.
    pub lead_submitted: bool,
    started: bool,
}

impl Default for CampaignState {
    fn default() -> Self {
        Self {
            step: DialogStep::Welcome,
            profile: Profile::default(),
            answers: Answers::default(),
            awaiting_custom: false,
            summary: None,
            lead_submitted: false,
            started: false,
        }
    }
}

impl CampaignState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Runs one campaign script for every session.
pub struct CampaignHandler {
    script: &'static CampaignScript,
    states: SessionRegistry<CampaignState>,
    leads: LeadWriter,
    notifier: Arc<dyn AgentNotifier>,
}

impl CampaignHandler {
    pub fn new(
        script: &'static CampaignScript,
        leads: LeadWriter,
        notifier: Arc<dyn AgentNotifier>,
    ) -> Self {
        Self {
            script,
            states: SessionRegistry::new(),
            leads,
            notifier,
        }
    }

    pub fn kind(&self) -> CampaignKind {
        self.script.kind
    }

    /// Begin (or restart) the campaign for a session.
    pub async fn start(&self, session_id: &str, profile: &Profile) -> Response {
        let slot = self.states.get_or_create(session_id).await;
        let mut state = slot.lock().await;
        state.reset();
        state.profile = profile.clone();
        state.started = true;
        info!(session_id, campaign = %self.kind(), "Campaign started");
        self.welcome()
    }

    /// Handle one user message.
    pub async fn process(&self, session_id: &str, message: &Inbound, profile: &Profile) -> Response {
        let normalized = message.normalized();
        if is_main_menu_command(&normalized) {
            info!(session_id, campaign = %self.kind(), "Return to main menu requested");
            return Response::return_to_main_menu(RETURNING);
        }

        let slot = self.states.get_or_create(session_id).await;
        let mut state = slot.lock().await;
        state.profile = profile.clone();

        if !state.started {
            state.started = true;
            return self.welcome();
        }

        let from = state.step;
        match self.step(&mut state, message, &normalized) {
            Ok(transition) => {
                if let Some(next) = transition.next {
                    debug!(session_id, campaign = %self.kind(), %from, to = %next, "Step transition");
                    state.step = next;
                }
                transition.response
            }
            Err(e) => {
                warn!(session_id, campaign = %self.kind(), step = %from, error = %e, "Dialog fault, restarting campaign");
                state.reset();
                state.profile = profile.clone();
                state.started = true;
                self.welcome().prefixed(APOLOGY)
            }
        }
    }

    /// Forget the session's state for this campaign.
    pub async fn end_session(&self, session_id: &str) -> bool {
        self.states.remove(session_id).await
    }

    pub async fn evict_idle(&self, max_age: Duration) -> usize {
        self.states.evict_idle(max_age).await
    }

    /// Copy of the session's state, if any.
    pub async fn snapshot(&self, session_id: &str) -> Option<CampaignState> {
        let slot = self.states.get(session_id).await?;
        let state = slot.lock().await;
        Some(state.clone())
    }

    /// Current step without cloning the whole state.
    pub async fn current_step(&self, session_id: &str) -> Option<DialogStep> {
        let slot = self.states.get(session_id).await?;
        let step = slot.lock().await.step;
        Some(step)
    }

    pub async fn session_count(&self) -> usize {
        self.states.len().await
    }

    // ── Steps ───────────────────────────────────────────────────────

    fn step(
        &self,
        state: &mut CampaignState,
        message: &Inbound,
        normalized: &str,
    ) -> Result<Transition<DialogStep>, DialogError> {
        if is_help_command(normalized) {
            let help = self.help_text(state)?;
            return Ok(Transition::stay(self.prompt_for(state)?.prefixed(help)));
        }

        match state.step {
            DialogStep::Welcome => Ok(self.on_welcome(state, normalized)),
            DialogStep::BenefitsShown => Ok(self.on_benefits(state, normalized)),
            DialogStep::Collecting(index) => self.on_collect(state, index, message, normalized),
            DialogStep::OfferAgentContact => Ok(self.on_offer(state, normalized)),
            DialogStep::GetContactInfo => Ok(self.on_contact_info(state, message, normalized)),
            DialogStep::ContactConfirmed | DialogStep::Declined => {
                Ok(Transition::stay(closing("Is there anything else I can help you with?")))
            }
        }
    }

    fn on_welcome(&self, state: &mut CampaignState, normalized: &str) -> Transition<DialogStep> {
        match normalized {
            "get_quote" => self.begin_collecting(state),
            "learn_more" => Transition::to(DialogStep::BenefitsShown, self.benefits()),
            "not_now" => decline(),
            s if is_affirmative(s) => Transition::to(DialogStep::BenefitsShown, self.benefits()),
            s if is_negative(s) => decline(),
            _ => Transition::stay(self.welcome().prefixed(NOT_UNDERSTOOD)),
        }
    }

    fn on_benefits(&self, state: &mut CampaignState, normalized: &str) -> Transition<DialogStep> {
        match normalized {
            "get_quote" => self.begin_collecting(state),
            s if is_affirmative(s) => self.begin_collecting(state),
            s if is_negative(s) => decline(),
            _ => Transition::stay(self.benefits().prefixed(NOT_UNDERSTOOD)),
        }
    }

    fn begin_collecting(&self, state: &mut CampaignState) -> Transition<DialogStep> {
        match self.advance_from(state, 0) {
            Ok(transition) => transition,
            Err(e) => {
                warn!(campaign = %self.kind(), error = %e, "Estimate failed after prefill");
                Transition::to(DialogStep::Welcome, self.welcome().prefixed(APOLOGY))
            }
        }
    }

    fn on_collect(
        &self,
        state: &mut CampaignState,
        index: usize,
        message: &Inbound,
        normalized: &str,
    ) -> Result<Transition<DialogStep>, DialogError> {
        let field = self.field(index)?;

        if let Some(custom_prompt) = field.custom_prompt {
            if matches!(normalized, "other" | "custom") {
                state.awaiting_custom = true;
                return Ok(Transition::stay(Response::message(custom_prompt)));
            }
        }

        match (field.parse)(message.raw()) {
            Ok(value) => {
                state.answers.insert(field.key, value);
                state.awaiting_custom = false;
                self.advance_from(state, index + 1)
            }
            Err(e) => {
                debug!(campaign = %self.kind(), field = field.key.as_str(), error = %e, "Invalid input");
                let prompt = field_prompt(field, state.awaiting_custom);
                Ok(Transition::stay(prompt.prefixed(&e.to_string())))
            }
        }
    }

    /// Move to the first unanswered field at or after `start`, or finish.
    fn advance_from(
        &self,
        state: &mut CampaignState,
        start: usize,
    ) -> Result<Transition<DialogStep>, DialogError> {
        for (index, field) in self.script.fields.iter().enumerate().skip(start) {
            let prefilled = field.prefill.and_then(|prefill| prefill(&state.profile));
            match prefilled {
                Some(value) => state.answers.insert(field.key, value),
                None => {
                    return Ok(Transition::to(
                        DialogStep::Collecting(index),
                        field_prompt(field, false),
                    ));
                }
            }
        }
        self.finish(state)
    }

    /// Compute the estimate, emit the lead once, offer agent contact.
    fn finish(&self, state: &mut CampaignState) -> Result<Transition<DialogStep>, DialogError> {
        let estimate = match (self.script.estimate)(&state.answers) {
            Ok(estimate) => estimate,
            Err(EstimateError::Rejected(e)) => {
                info!(campaign = %self.kind(), reason = %e, "Estimate rejected");
                return Ok(Transition::to(DialogStep::Declined, closing(&e.to_string())));
            }
            Err(EstimateError::Dialog(e)) => return Err(e),
        };

        if !state.lead_submitted {
            let record = LeadRecord::new(&state.profile, self.kind(), &estimate.lead_columns);
            if self.leads.submit(record) {
                state.lead_submitted = true;
            } else {
                warn!(campaign = %self.kind(), "Lead writer unavailable, lead dropped");
            }
        }

        let text = format!(
            "{}\n\nWould you like one of our agents to contact you?",
            estimate.summary
        );
        state.summary = Some(estimate.summary);
        Ok(Transition::to(
            DialogStep::OfferAgentContact,
            Response::buttons(text, choices(OFFER_CHOICES)),
        ))
    }

    fn on_offer(&self, state: &mut CampaignState, normalized: &str) -> Transition<DialogStep> {
        match normalized {
            "contact_agent" | "yes_contact" => {
                Transition::to(DialogStep::GetContactInfo, self.contact_prompt(state))
            }
            "no_contact" => self.decline_contact(state),
            s if is_affirmative(s) => {
                Transition::to(DialogStep::GetContactInfo, self.contact_prompt(state))
            }
            s if is_negative(s) => self.decline_contact(state),
            _ => Transition::stay(self.offer(state).prefixed("Please choose one of the options.")),
        }
    }

    fn on_contact_info(
        &self,
        state: &mut CampaignState,
        message: &Inbound,
        normalized: &str,
    ) -> Transition<DialogStep> {
        let contact = if normalized == "use_profile_email" {
            match &state.profile.email {
                Some(email) => Ok(email.clone()),
                None => Err(ValidationError::InvalidContact),
            }
        } else {
            parse_contact(message.raw())
        };

        match contact {
            Ok(contact) => {
                self.dispatch_notice(state, ContactDecision::Requested, Some(contact.clone()));
                Transition::to(
                    DialogStep::ContactConfirmed,
                    closing(&format!(
                        "Thank you, {}! One of our agents will contact you at {contact} soon.",
                        state.profile.display_name()
                    )),
                )
            }
            Err(e) => Transition::stay(self.contact_prompt(state).prefixed(&e.to_string())),
        }
    }

    fn decline_contact(&self, state: &CampaignState) -> Transition<DialogStep> {
        self.dispatch_notice(state, ContactDecision::Declined, None);
        Transition::to(
            DialogStep::Declined,
            closing("No problem! Thank you for your time. A copy of your estimate is on its way if we have your email."),
        )
    }

    /// Send the contact notice off the message path.
    fn dispatch_notice(&self, state: &CampaignState, decision: ContactDecision, contact: Option<String>) {
        let notice = ContactNotice {
            campaign: self.kind(),
            decision,
            name: state.profile.display_name().to_string(),
            email: state.profile.email.clone(),
            contact,
            summary: state.summary.clone().unwrap_or_default(),
        };
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&notice).await {
                warn!(campaign = %notice.campaign, error = %e, "Failed to send contact email");
            }
        });
    }

    // ── Prompts ─────────────────────────────────────────────────────

    fn field(&self, index: usize) -> Result<&'static FieldSpec, DialogError> {
        self.script
            .fields
            .get(index)
            .ok_or(DialogError::UnknownField(index))
    }

    fn welcome(&self) -> Response {
        Response::buttons(
            format!("{}\n\n{}", self.kind().title(), self.script.welcome),
            choices(WELCOME_CHOICES),
        )
    }

    fn benefits(&self) -> Response {
        Response::buttons(
            format!(
                "{}\n\nWould you like a personalised estimate?",
                self.script.benefits
            ),
            choices(BENEFITS_CHOICES),
        )
    }

    fn offer(&self, state: &CampaignState) -> Response {
        let summary = state.summary.as_deref().unwrap_or_default();
        Response::buttons(
            format!("{summary}\n\nWould you like one of our agents to contact you?"),
            choices(OFFER_CHOICES),
        )
    }

    fn contact_prompt(&self, state: &CampaignState) -> Response {
        let text = "Great! How should our agent reach you? Type a phone number \
                    (e.g. 012-3456789) or an email address.";
        match &state.profile.email {
            Some(email) => Response::buttons(
                text,
                vec![Choice::new(format!("Use {email}"), "use_profile_email")],
            ),
            None => Response::message(text),
        }
    }

    /// Re-prompt for the current step.
    fn prompt_for(&self, state: &CampaignState) -> Result<Response, DialogError> {
        Ok(match state.step {
            DialogStep::Welcome => self.welcome(),
            DialogStep::BenefitsShown => self.benefits(),
            DialogStep::Collecting(index) => field_prompt(self.field(index)?, state.awaiting_custom),
            DialogStep::OfferAgentContact => self.offer(state),
            DialogStep::GetContactInfo => self.contact_prompt(state),
            DialogStep::ContactConfirmed | DialogStep::Declined => {
                closing("This plan is complete.")
            }
        })
    }

    fn help_text(&self, state: &CampaignState) -> Result<&'static str, DialogError> {
        Ok(match state.step {
            DialogStep::Welcome | DialogStep::BenefitsShown => {
                "Pick an option below, or type \"main_menu\" to go back."
            }
            DialogStep::Collecting(index) => self.field(index)?.help,
            DialogStep::OfferAgentContact => {
                "An agent can explain the plan and answer questions. There's no obligation."
            }
            DialogStep::GetContactInfo => {
                "We only use your contact details to arrange a call about this plan."
            }
            DialogStep::ContactConfirmed | DialogStep::Declined => {
                "Tap \"Main Menu\" to explore another plan."
            }
        })
    }
}

fn field_prompt(field: &FieldSpec, awaiting_custom: bool) -> Response {
    match (awaiting_custom, field.custom_prompt) {
        (true, Some(custom)) => Response::message(custom),
        _ if field.presets.is_empty() => Response::message(field.prompt),
        _ => Response::buttons(field.prompt, choices(field.presets)),
    }
}

fn closing(text: &str) -> Response {
    Response::buttons(text, vec![Choice::new("Main Menu", "main_menu")])
}

fn decline() -> Transition<DialogStep> {
    Transition::to(
        DialogStep::Declined,
        closing("No problem! You can explore our other plans from the main menu."),
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rust_decimal_macros::dec;

    use super::*;
    use crate::campaigns::testing::Harness;
    use crate::dialog::AnswerKey;

    fn finished_state() -> CampaignState {
        let mut state = CampaignState::default();
        state.started = true;
        state.answers.insert(AnswerKey::Age, dec!(30));
        state.answers.insert(AnswerKey::PackageTier, dec!(1));
        state
    }

    #[test]
    fn step_display_names() {
        assert_eq!(DialogStep::Collecting(2).to_string(), "collecting_inputs[2]");
        assert_eq!(DialogStep::OfferAgentContact.to_string(), "offer_agent_contact");
        assert!(DialogStep::Declined.is_terminal());
        assert!(!DialogStep::GetContactInfo.is_terminal());
    }

    #[tokio::test]
    async fn one_lead_per_state_lifetime() {
        let harness = Harness::new();
        let handler = harness.campaigns.handler(CampaignKind::Combo);

        let mut state = finished_state();
        handler.finish(&mut state).unwrap();
        handler.finish(&mut state).unwrap();
        assert!(state.lead_submitted);
        assert_eq!(harness.wait_for_leads(1).await.len(), 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(harness.sink.len().await, 1);

        state.reset();
        assert!(!state.lead_submitted);
    }

    #[tokio::test]
    async fn dialog_fault_restarts_with_apology() {
        let harness = Harness::new();
        let handler = harness.campaigns.handler(CampaignKind::Combo);
        let profile = Profile::default();

        handler.start("s1", &profile).await;
        {
            let slot = handler.states.get("s1").await.unwrap();
            slot.lock().await.step = DialogStep::Collecting(99);
        }

        let response = handler.process("s1", &Inbound::text("5"), &profile).await;
        assert!(response.text().starts_with(APOLOGY));
        assert!(response.text().contains("Perlindungan Combo"));
        let state = handler.snapshot("s1").await.unwrap();
        assert_eq!(state.step, DialogStep::Welcome);
    }

    #[tokio::test]
    async fn first_message_without_start_shows_welcome() {
        let harness = Harness::new();
        let handler = harness.campaigns.handler(CampaignKind::Medical);

        let response = handler
            .process("s1", &Inbound::text("hello"), &Profile::default())
            .await;
        assert!(response.text().contains("Tabung Perubatan"));
        assert_eq!(handler.session_count().await, 1);
    }
}
