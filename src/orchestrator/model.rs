//! User profile collected during onboarding.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::campaigns::CampaignKind;

/// Cross-campaign attributes gathered by the onboarding funnel.
///
/// Fields are filled in funnel order and only cleared by a full reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: Option<String>,
    pub dob: Option<NaiveDate>,
    /// Derived from `dob` once. Authoritative for every campaign.
    pub age: Option<u32>,
    pub email: Option<String>,
    pub primary_concern: Option<String>,
    pub life_stage: Option<String>,
    /// Dependents choice value: "1" is just the user, "2".."4" include others.
    pub dependents: Option<String>,
    pub existing_coverage: Option<String>,
    pub premium_budget: Option<String>,
    pub selected_plan: Option<CampaignKind>,
}

impl Profile {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether anyone other than the user depends on them.
    pub fn has_dependents(&self) -> bool {
        matches!(self.dependents.as_deref(), Some("2" | "3" | "4"))
    }

    pub fn dob_display(&self) -> Option<String> {
        self.dob.map(|d| d.format("%d/%m/%Y").to_string())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("there")
    }
}

/// Age in whole years on `today`. `None` if `dob` is after `today`.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> Option<u32> {
    if dob > today {
        return None;
    }
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    u32::try_from(age).ok()
}

/// Capitalize each word: "ali bin abu" → "Ali Bin Abu".
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
