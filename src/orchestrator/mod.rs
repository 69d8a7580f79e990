//! Top-level conversation: onboarding funnel, plan menu and campaign
//! routing.

pub mod manager;
pub mod model;
pub mod prompts;
pub mod ranking;
pub mod routes;
pub mod state;

pub use manager::{Orchestrator, SessionSummary, spawn_idle_sweeper};
pub use model::Profile;
pub use routes::{SessionRouteState, session_routes};
pub use state::{OnboardingStep, Session};
