//! Declarative campaign scripts.
//!
//! A `CampaignScript` is the step table one campaign plugs into the
//! generic handler: copy for the welcome and benefits steps, the ordered
//! input fields with their validators, and the estimate function.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::campaigns::CampaignKind;
use crate::error::{DialogError, ValidationError};
use crate::orchestrator::model::Profile;
use crate::premium::PremiumResult;

/// Names of the answers a campaign can collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKey {
    AnnualIncome,
    Age,
    YearsOfCoverage,
    LegacyAmount,
    ChildAge,
    MonthlySaving,
    CoverageTier,
    PackageTier,
}

impl AnswerKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnnualIncome => "annual_income",
            Self::Age => "age",
            Self::YearsOfCoverage => "years_of_coverage",
            Self::LegacyAmount => "legacy_amount",
            Self::ChildAge => "child_age",
            Self::MonthlySaving => "monthly_saving",
            Self::CoverageTier => "coverage_tier",
            Self::PackageTier => "package_tier",
        }
    }
}

/// Campaign-local answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Answers(BTreeMap<AnswerKey, Decimal>);

impl Answers {
    pub fn insert(&mut self, key: AnswerKey, value: Decimal) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: AnswerKey) -> Option<Decimal> {
        self.0.get(&key).copied()
    }

    pub fn require(&self, key: AnswerKey) -> Result<Decimal, DialogError> {
        self.get(key).ok_or(DialogError::MissingAnswer(key.as_str()))
    }

    pub fn require_whole(&self, key: AnswerKey) -> Result<u32, DialogError> {
        self.require(key)?
            .to_u32()
            .ok_or(DialogError::MissingAnswer(key.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One input-collecting step.
pub struct FieldSpec {
    pub key: AnswerKey,
    pub prompt: &'static str,
    /// Shown before the prompt when the user asks for help.
    pub help: &'static str,
    /// Preset `(label, value)` buttons.
    pub presets: &'static [(&'static str, &'static str)],
    /// When set, "other"/"custom" asks this instead of picking a preset.
    pub custom_prompt: Option<&'static str>,
    pub parse: fn(&str) -> Result<Decimal, ValidationError>,
    /// Skip the step when the profile already answers it.
    pub prefill: Option<fn(&Profile) -> Option<Decimal>>,
}

/// Result of running a campaign's estimate.
#[derive(Debug, Clone)]
pub struct Estimate {
    /// User-facing summary, also used in contact emails.
    pub summary: String,
    pub premium: PremiumResult,
    /// Campaign-specific lead columns.
    pub lead_columns: Vec<(usize, String)>,
}

#[derive(Debug, thiserror::Error)]
pub enum EstimateError {
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    #[error(transparent)]
    Dialog(#[from] DialogError),
}

/// The declarative step table for one campaign.
pub struct CampaignScript {
    pub kind: CampaignKind,
    pub welcome: &'static str,
    pub benefits: &'static str,
    pub fields: &'static [FieldSpec],
    pub estimate: fn(&Answers) -> Result<Estimate, EstimateError>,
}

/// Prefill from the onboarding-derived age.
pub fn profile_age(profile: &Profile) -> Option<Decimal> {
    profile.age.map(Decimal::from)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn answers_require() {
        let mut answers = Answers::default();
        assert!(answers.is_empty());
        assert!(matches!(
            answers.require(AnswerKey::Age),
            Err(DialogError::MissingAnswer("age"))
        ));

        answers.insert(AnswerKey::Age, dec!(36));
        answers.insert(AnswerKey::AnnualIncome, dec!(60000.50));
        assert_eq!(answers.require_whole(AnswerKey::Age).unwrap(), 36);
        assert_eq!(answers.require(AnswerKey::AnnualIncome).unwrap(), dec!(60000.50));
        assert_eq!(answers.len(), 2);
    }

    #[test]
    fn age_prefill_reads_profile() {
        let profile = Profile {
            age: Some(42),
            ..Default::default()
        };
        assert_eq!(profile_age(&profile), Some(dec!(42)));
        assert_eq!(profile_age(&Profile::default()), None);
    }
}
