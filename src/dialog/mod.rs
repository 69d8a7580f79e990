//! Campaign dialog machinery shared by all campaigns.

pub mod handler;
pub mod message;
pub mod parse;
pub mod script;

pub use handler::{CampaignHandler, CampaignState, DialogStep};
pub use message::{Choice, ControlSignal, Inbound, Response, Transition};
pub use script::{AnswerKey, Answers, CampaignScript, Estimate, EstimateError, FieldSpec};
