//! Tabung Warisan — legacy / whole-life.

use rust_decimal::Decimal;

use super::CampaignKind;
use crate::dialog::parse::{parse_in_range, parse_number};
use crate::dialog::script::{
    AnswerKey, Answers, CampaignScript, Estimate, EstimateError, FieldSpec, profile_age,
};
use crate::error::ValidationError;
use crate::leads::column;
use crate::premium::{self, LEGACY_MAXIMUM, LEGACY_MINIMUM, format_money};

pub static SCRIPT: CampaignScript = CampaignScript {
    kind: CampaignKind::Legacy,
    welcome: "Tabung Warisan helps you leave a guaranteed legacy for the people you love, \
              whatever happens to the markets.",
    benefits: "With Tabung Warisan you get:\n\
               • A guaranteed lump sum for your beneficiaries\n\
               • Lifelong protection with premiums fixed from day one\n\
               • Cash value that grows over time\n\
               • Fast payout to help with estate costs",
    fields: &[
        FieldSpec {
            key: AnswerKey::Age,
            prompt: "How old are you?",
            help: "Plans are available from age 18 to 70.",
            presets: &[],
            custom_prompt: None,
            parse: parse_age,
            prefill: Some(profile_age),
        },
        FieldSpec {
            key: AnswerKey::LegacyAmount,
            prompt: "How much would you like to leave for your loved ones?",
            help: "Pick one of the amounts, or choose \"Other amount\" to type your own.",
            presets: &[
                ("RM100,000", "100000"),
                ("RM250,000", "250000"),
                ("RM500,000", "500000"),
                ("RM1,000,000", "1000000"),
                ("Other amount", "other"),
            ],
            custom_prompt: Some("Please type the amount you'd like to leave (minimum RM1,000)."),
            parse: parse_legacy_amount,
            prefill: None,
        },
    ],
    estimate,
};

fn parse_age(input: &str) -> Result<Decimal, ValidationError> {
    parse_in_range(input, "an age", 18, 70).map(Decimal::from)
}

fn parse_legacy_amount(input: &str) -> Result<Decimal, ValidationError> {
    let amount = parse_number(input)?;
    if amount < LEGACY_MINIMUM || amount > LEGACY_MAXIMUM {
        return Err(ValidationError::out_of_range(
            "an amount",
            format_money(LEGACY_MINIMUM),
            format_money(LEGACY_MAXIMUM),
        ));
    }
    Ok(amount)
}

fn estimate(answers: &Answers) -> Result<Estimate, EstimateError> {
    let age = answers.require_whole(AnswerKey::Age)?;
    let amount = answers.require(AnswerKey::LegacyAmount)?;

    let premium = premium::legacy(amount, age)?;
    let summary = format!(
        "Here is your Tabung Warisan estimate:\n\
         • Legacy amount: {}\n\
         • Annual premium: {}\n\
         • Monthly premium: {}",
        format_money(amount),
        format_money(premium.annual),
        format_money(premium.monthly),
    );

    Ok(Estimate {
        summary,
        premium,
        lead_columns: vec![(column::LEGACY_AMOUNT, amount.normalize().to_string())],
    })
}
