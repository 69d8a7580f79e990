//! Lead Assist — multi-campaign insurance lead-generation chatbot.

pub mod campaigns;
pub mod channels;
pub mod config;
pub mod dialog;
pub mod error;
pub mod leads;
pub mod notify;
pub mod orchestrator;
pub mod premium;
pub mod session;
