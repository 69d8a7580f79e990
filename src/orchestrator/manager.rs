//! Orchestrator — runs the onboarding funnel and routes turns to the
//! active campaign.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::model::{Profile, age_on, title_case};
use super::prompts::{
    ALL_PLANS_PROMPT, ANALYZING, APOLOGY, CONCERN, DOB_PROMPT, EMAIL_PROMPT, EMAIL_THANKS,
    GOODBYE, GREETING, MENU_PROMPT, MENU_RESET, menu_choices, question_for,
};
use super::ranking::{all_campaigns, rank_campaigns};
use super::state::{OnboardingStep, RecentText, Session};
use crate::campaigns::{CampaignKind, Campaigns};
use crate::dialog::parse::{is_main_menu_command, parse_dob, parse_email};
use crate::dialog::{ControlSignal, DialogStep, Inbound, Response};
use crate::error::ValidationError;
use crate::session::SessionRegistry;

/// Where a message landed, for duplicate detection.
type Position = (OnboardingStep, Option<DialogStep>);

/// Read-only view of a session for the REST API.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub step: OnboardingStep,
    pub active_campaign: Option<CampaignKind>,
    pub campaign_step: Option<String>,
    pub has_profile: bool,
}

/// Top-level conversation coordinator. One per process.
pub struct Orchestrator {
    sessions: SessionRegistry<Session>,
    campaigns: Arc<Campaigns>,
    dedup_window: chrono::Duration,
}

impl Orchestrator {
    pub fn new(campaigns: Arc<Campaigns>, dedup_window: Duration) -> Self {
        let dedup_window =
            chrono::Duration::from_std(dedup_window).unwrap_or(chrono::Duration::seconds(60));
        Self {
            sessions: SessionRegistry::new(),
            campaigns,
            dedup_window,
        }
    }

    /// Start a fresh session and return the greeting.
    pub async fn open(&self, session_id: &str) -> Response {
        let slot = self.sessions.get_or_create(session_id).await;
        slot.lock().await.reset();
        info!(session_id, "Session opened");
        Response::message(GREETING)
    }

    /// Destroy the session and every campaign state it owns.
    pub async fn close(&self, session_id: &str) {
        let removed = self.sessions.remove(session_id).await;
        self.campaigns.end_session(session_id).await;
        info!(session_id, removed, "Session closed");
    }

    /// Evict sessions and campaign states idle for longer than `max_age`.
    pub async fn sweep(&self, max_age: Duration) -> usize {
        let sessions = self.sessions.evict_idle(max_age).await;
        let campaign_states = self.campaigns.sweep(max_age).await;
        if sessions + campaign_states > 0 {
            info!(sessions, campaign_states, "Evicted idle conversations");
        }
        sessions + campaign_states
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.len().await
    }

    pub async fn summary(&self, session_id: &str) -> Option<SessionSummary> {
        let slot = self.sessions.get(session_id).await?;
        let session = slot.lock().await;
        let campaign_step = match session.active_campaign() {
            Some(kind) => self
                .campaigns
                .handler(kind)
                .current_step(session_id)
                .await
                .map(|step| step.to_string()),
            None => None,
        };
        Some(SessionSummary {
            session_id: session_id.to_string(),
            step: session.step(),
            active_campaign: session.active_campaign(),
            campaign_step,
            has_profile: !session.profile.is_empty(),
        })
    }

    /// Handle one inbound message for a session.
    ///
    /// Never fails: a panic anywhere below is logged, the session is reset
    /// and the user gets an apology.
    pub async fn advance(&self, session_id: &str, message: &Inbound) -> Response {
        let slot = self.sessions.get_or_create(session_id).await;
        let mut session = slot.lock().await;

        let position = self.position(session_id, &session).await;
        if let Some(replay) = self.replay(&session, message, position) {
            debug!(session_id, "Duplicate message, replaying last response");
            return replay;
        }

        let response = match AssertUnwindSafe(self.dispatch(session_id, &mut session, message))
            .catch_unwind()
            .await
        {
            Ok(response) => response,
            Err(_) => {
                error!(session_id, step = %session.step(), "Conversation handler panicked, resetting session");
                session.reset();
                self.campaigns.end_session(session_id).await;
                Response::message(format!("{APOLOGY}\n\n{GREETING}"))
            }
        };

        if let Inbound::Text(_) = message {
            session.recent = Some(RecentText {
                text: message.normalized(),
                position,
                at: Utc::now(),
                response: response.clone(),
            });
        }
        response
    }

    async fn position(&self, session_id: &str, session: &Session) -> Position {
        let campaign_step = match session.active_campaign() {
            Some(kind) => self.campaigns.handler(kind).current_step(session_id).await,
            None => None,
        };
        (session.step(), campaign_step)
    }

    /// Free text identical to the previous message, sent at the same point
    /// in the conversation within the window, gets the previous reply.
    fn replay(&self, session: &Session, message: &Inbound, position: Position) -> Option<Response> {
        if message.is_choice() {
            return None;
        }
        let recent = session.recent.as_ref()?;
        let fresh = Utc::now() - recent.at <= self.dedup_window;
        (fresh && recent.position == position && recent.text == message.normalized())
            .then(|| recent.response.clone())
    }

    async fn dispatch(&self, session_id: &str, session: &mut Session, message: &Inbound) -> Response {
        match session.step() {
            OnboardingStep::InCampaign => return self.forward(session_id, session, message).await,
            OnboardingStep::Done => {
                session.reset();
                return Response::message(GREETING);
            }
            _ => {}
        }

        let normalized = message.normalized();
        if is_main_menu_command(&normalized) {
            return self.return_to_menu(session_id, session).await;
        }

        match session.step() {
            OnboardingStep::GetName => on_name(session, message),
            OnboardingStep::GetDob => on_dob(session, message),
            OnboardingStep::GetEmail => on_email(session, message),
            OnboardingStep::CampaignSelection => {
                self.on_selection(session_id, session, &normalized).await
            }
            step => on_choice(session, step, message),
        }
    }

    async fn forward(&self, session_id: &str, session: &mut Session, message: &Inbound) -> Response {
        let Some(kind) = session.active_campaign() else {
            warn!(session_id, "In campaign without an active campaign, resetting");
            return self.return_to_menu(session_id, session).await;
        };

        let response = self
            .campaigns
            .handler(kind)
            .process(session_id, message, &session.profile)
            .await;

        if response.control() == Some(ControlSignal::ReturnToMainMenu) {
            return self.return_to_menu(session_id, session).await;
        }
        response
    }

    /// Full reset: profile, campaign states and step.
    async fn return_to_menu(&self, session_id: &str, session: &mut Session) -> Response {
        info!(session_id, from = %session.step(), "Returning to main menu");
        session.reset();
        self.campaigns.end_session(session_id).await;
        Response::return_to_main_menu(MENU_RESET)
    }

    async fn on_selection(&self, session_id: &str, session: &mut Session, normalized: &str) -> Response {
        if session.menu.is_empty() {
            session.menu = rank_campaigns(&session.profile);
        }

        match normalized {
            "all" | "show all" | "show all plans" => {
                session.menu = all_campaigns();
                return menu_response(ALL_PLANS_PROMPT, &session.menu, false);
            }
            "bye" | "done" | "exit" => {
                session.finish();
                info!(session_id, "Conversation finished");
                return Response::message(GOODBYE);
            }
            _ => {}
        }

        let selected = normalized
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| session.menu.get(i).copied())
            .or_else(|| CampaignKind::from_id(normalized))
            .or_else(|| {
                CampaignKind::ALL
                    .into_iter()
                    .find(|kind| kind.title().to_lowercase() == normalized)
            });

        let Some(kind) = selected else {
            let filtered = session.menu.len() < CampaignKind::ALL.len();
            return menu_response(MENU_PROMPT, &session.menu, filtered)
                .prefixed("Please pick one of the plans below.");
        };

        if let Err(e) = session.enter_campaign(kind) {
            warn!(session_id, error = %e, "Campaign selection rejected");
            return menu_response(MENU_PROMPT, &session.menu, false);
        }
        info!(session_id, campaign = %kind, "Campaign selected");
        self.campaigns
            .handler(kind)
            .start(session_id, &session.profile)
            .await
    }
}

fn on_name(session: &mut Session, message: &Inbound) -> Response {
    let name = title_case(message.raw());
    if name.is_empty() {
        return Response::message(ValidationError::EmptyName.to_string());
    }
    session.profile.name = Some(name);
    advance(session);
    Response::message(DOB_PROMPT)
}

fn on_dob(session: &mut Session, message: &Inbound) -> Response {
    let today = Utc::now().date_naive();
    let dob = parse_dob(message.raw()).and_then(|dob| {
        age_on(dob, today)
            .map(|age| (dob, age))
            .ok_or(ValidationError::FutureDate)
    });

    match dob {
        Ok((dob, age)) => {
            session.profile.dob = Some(dob);
            session.profile.age = Some(age);
            advance(session);
            Response::message(format!("You are {age} years old. Thank you!\n\n{EMAIL_PROMPT}"))
        }
        Err(e) => Response::message(DOB_PROMPT).prefixed(&e.to_string()),
    }
}

fn on_email(session: &mut Session, message: &Inbound) -> Response {
    match parse_email(message.raw()) {
        Ok(email) => {
            session.profile.email = Some(email);
            advance(session);
            CONCERN.response().prefixed(EMAIL_THANKS)
        }
        Err(e) => Response::message(EMAIL_PROMPT).prefixed(&e.to_string()),
    }
}

fn on_choice(session: &mut Session, step: OnboardingStep, message: &Inbound) -> Response {
    let Some(question) = question_for(step) else {
        warn!(%step, "No question for onboarding step, restarting funnel");
        session.reset();
        return Response::message(GREETING);
    };

    let Some(value) = question.resolve(message) else {
        return question
            .response()
            .prefixed(&ValidationError::UnknownChoice.to_string());
    };

    store_answer(&mut session.profile, step, value);
    match advance(session) {
        Some(OnboardingStep::CampaignSelection) => {
            session.menu = rank_campaigns(&session.profile);
            let filtered = session.menu.len() < CampaignKind::ALL.len();
            menu_response(MENU_PROMPT, &session.menu, filtered).prefixed(ANALYZING)
        }
        Some(next) => match question_for(next) {
            Some(question) => question.response(),
            None => Response::message(GREETING),
        },
        None => Response::message(GREETING),
    }
}

fn store_answer(profile: &mut Profile, step: OnboardingStep, value: &str) {
    let value = Some(value.to_string());
    match step {
        OnboardingStep::GetFinancialConcern => profile.primary_concern = value,
        OnboardingStep::GetLifeStage => profile.life_stage = value,
        OnboardingStep::GetDependents => profile.dependents = value,
        OnboardingStep::GetExistingCoverage => profile.existing_coverage = value,
        OnboardingStep::GetPremiumBudget => profile.premium_budget = value,
        _ => {}
    }
}

fn advance(session: &mut Session) -> Option<OnboardingStep> {
    match session.advance() {
        Ok(next) => Some(next),
        Err(e) => {
            warn!(error = %e, "Failed to advance onboarding step");
            None
        }
    }
}

/// The prompt lists each plan's tagline; the buttons carry the titles.
fn menu_response(prompt: &str, menu: &[CampaignKind], filtered: bool) -> Response {
    let titles: Vec<&str> = menu.iter().map(|kind| kind.title()).collect();
    let mut text = prompt.to_string();
    for (i, kind) in menu.iter().enumerate() {
        text.push_str(&format!("\n{}. {}: {}", i + 1, kind.title(), kind.tagline()));
    }
    Response::buttons(text, menu_choices(&titles, filtered))
}

/// Spawn the periodic idle-session sweep.
pub fn spawn_idle_sweeper(
    orchestrator: Arc<Orchestrator>,
    every: Duration,
    max_age: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Idle sweeper started (interval: {}s, max idle: {}s)",
            every.as_secs(),
            max_age.as_secs()
        );
        let mut tick = tokio::time::interval(every);
        tick.tick().await; // Skip immediate first tick
        loop {
            tick.tick().await;
            orchestrator.sweep(max_age).await;
        }
    })
}
