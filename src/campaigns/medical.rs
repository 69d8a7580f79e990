//! Tabung Perubatan — medical coverage.

use rust_decimal::Decimal;

use super::CampaignKind;
use crate::dialog::parse::{parse_in_range, parse_number};
use crate::dialog::script::{
    AnswerKey, Answers, CampaignScript, Estimate, EstimateError, FieldSpec, profile_age,
};
use crate::error::{DialogError, ValidationError};
use crate::leads::column;
use crate::premium::{self, CoverageTier, format_money};

pub static SCRIPT: CampaignScript = CampaignScript {
    kind: CampaignKind::Medical,
    welcome: "A single hospital stay can wipe out years of savings. Tabung Perubatan \
              covers your medical bills so you can focus on getting better.",
    benefits: "Tabung Perubatan includes:\n\
               • Hospital room and board, surgery and ICU cover\n\
               • Cashless admission at panel hospitals\n\
               • Pre- and post-hospitalisation treatment\n\
               • Annual limits from RM100,000 to RM1,000,000",
    fields: &[
        FieldSpec {
            key: AnswerKey::Age,
            prompt: "How old are you?",
            help: "Cover is available from birth to age 100.",
            presets: &[],
            custom_prompt: None,
            parse: parse_age,
            prefill: Some(profile_age),
        },
        FieldSpec {
            key: AnswerKey::CoverageTier,
            prompt: "Which coverage level suits you?",
            help: "Higher levels raise your annual limit. You can type 1, 2 or 3 too.",
            presets: &[
                ("Basic (RM100,000)", "1"),
                ("Medium (RM500,000)", "2"),
                ("Comprehensive (RM1,000,000)", "3"),
            ],
            custom_prompt: None,
            parse: parse_coverage_tier,
            prefill: None,
        },
    ],
    estimate,
};

fn parse_age(input: &str) -> Result<Decimal, ValidationError> {
    parse_in_range(input, "an age", 0, 100).map(Decimal::from)
}

/// Accepts 1-3, a level name, or the coverage amount ("500k", "1m").
fn parse_coverage_tier(input: &str) -> Result<Decimal, ValidationError> {
    let lowered = input.trim().to_lowercase();
    let tier = if lowered.contains("basic") || lowered.contains("100k") {
        Some(CoverageTier::Basic)
    } else if lowered.contains("medium") || lowered.contains("500k") {
        Some(CoverageTier::Medium)
    } else if lowered.contains("comprehensive")
        || lowered.contains("1m")
        || lowered.contains("million")
    {
        Some(CoverageTier::Comprehensive)
    } else {
        let value = parse_number(&lowered)?;
        [CoverageTier::Basic, CoverageTier::Medium, CoverageTier::Comprehensive]
            .into_iter()
            .find(|tier| Decimal::from(tier.number()) == value || tier.coverage_amount() == value)
    };

    tier.map(|t| Decimal::from(t.number()))
        .ok_or_else(|| ValidationError::out_of_range("a coverage level", 1, 3))
}

fn estimate(answers: &Answers) -> Result<Estimate, EstimateError> {
    let age = answers.require_whole(AnswerKey::Age)?;
    let tier = CoverageTier::from_number(answers.require_whole(AnswerKey::CoverageTier)?)
        .ok_or(DialogError::MissingAnswer("coverage_tier"))?;

    let premium = premium::medical(age, tier)?;
    let mut summary = format!(
        "Here is your Tabung Perubatan estimate:\n\
         • Annual limit: {}\n\
         • Monthly premium: {}\n\
         • Annual premium: {}",
        format_money(tier.coverage_amount()),
        format_money(premium.monthly),
        format_money(premium.annual),
    );
    if age > 60 {
        summary.push_str("\n\nNote: premiums from age 61 include a senior rate and an age loading.");
    }

    Ok(Estimate {
        summary,
        premium,
        lead_columns: vec![(column::COVERAGE_TIER, tier.number().to_string())],
    })
}
