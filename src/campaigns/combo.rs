//! Perlindungan Combo — bundled life, medical and critical illness cover.

use rust_decimal::Decimal;

use super::CampaignKind;
use crate::dialog::parse::parse_in_range;
use crate::dialog::script::{
    AnswerKey, Answers, CampaignScript, Estimate, EstimateError, FieldSpec, profile_age,
};
use crate::error::{DialogError, ValidationError};
use crate::leads::column;
use crate::premium::{self, PackageTier, format_money};

pub static SCRIPT: CampaignScript = CampaignScript {
    kind: CampaignKind::Combo,
    welcome: "Why juggle three policies? Perlindungan Combo bundles life, medical and \
              critical illness protection into one plan with one premium.",
    benefits: "Every Perlindungan Combo package includes:\n\
               • Life cover with a lump sum for your family\n\
               • Medical cover for hospital and surgical bills\n\
               • Critical illness payout on diagnosis\n\
               • One premium, one policy, one renewal date",
    fields: &[
        FieldSpec {
            key: AnswerKey::Age,
            prompt: "How old are you?",
            help: "Combo packages are available from age 18 to 60.",
            presets: &[],
            custom_prompt: None,
            parse: parse_age,
            prefill: Some(profile_age),
        },
        FieldSpec {
            key: AnswerKey::PackageTier,
            prompt: "Which package would you like to see?",
            help: "Silver covers the essentials, Gold adds higher limits, Platinum gives the widest cover.",
            presets: &[("Silver", "1"), ("Gold", "2"), ("Platinum", "3")],
            custom_prompt: None,
            parse: parse_package_tier,
            prefill: None,
        },
    ],
    estimate,
};

fn parse_age(input: &str) -> Result<Decimal, ValidationError> {
    parse_in_range(input, "an age", 18, 60).map(Decimal::from)
}

fn parse_package_tier(input: &str) -> Result<Decimal, ValidationError> {
    let lowered = input.trim().to_lowercase();
    let tier = match lowered.as_str() {
        s if s.contains("silver") => PackageTier::Silver,
        s if s.contains("gold") => PackageTier::Gold,
        s if s.contains("platinum") => PackageTier::Platinum,
        s => {
            let n = parse_in_range(s, "a package number", 1, 3)?;
            PackageTier::from_number(n).ok_or(ValidationError::UnknownChoice)?
        }
    };
    Ok(Decimal::from(tier.number()))
}

fn estimate(answers: &Answers) -> Result<Estimate, EstimateError> {
    let age = answers.require_whole(AnswerKey::Age)?;
    let tier = PackageTier::from_number(answers.require_whole(AnswerKey::PackageTier)?)
        .ok_or(DialogError::MissingAnswer("package_tier"))?;

    let premium = premium::combo(age, tier)?;
    let summary = format!(
        "Here is your Perlindungan Combo {} estimate:\n\
         • Annual premium: {}\n\
         • Monthly premium: {}",
        tier.name(),
        format_money(premium.annual),
        format_money(premium.monthly),
    );

    Ok(Estimate {
        summary,
        premium,
        lead_columns: vec![(column::PACKAGE_TIER, tier.number().to_string())],
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn package_inputs() {
        assert_eq!(parse_package_tier("2").unwrap(), dec!(2));
        assert_eq!(parse_package_tier("Platinum").unwrap(), dec!(3));
        assert_eq!(parse_package_tier("the silver one").unwrap(), dec!(1));
        assert!(parse_package_tier("4").is_err());
        assert!(parse_package_tier("bronze").is_err());
    }

    #[test]
    fn age_outside_band_is_rejected_with_guidance() {
        let mut answers = Answers::default();
        answers.insert(AnswerKey::Age, dec!(65));
        answers.insert(AnswerKey::PackageTier, dec!(1));

        match estimate(&answers) {
            Err(EstimateError::Rejected(e)) => assert!(e.to_string().contains("ages 18-60")),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn gold_package_estimate() {
        let mut answers = Answers::default();
        answers.insert(AnswerKey::Age, dec!(45));
        answers.insert(AnswerKey::PackageTier, dec!(2));

        let estimate = estimate(&answers).unwrap();
        assert_eq!(estimate.premium.annual, dec!(4500));
        assert!(estimate.summary.contains("Gold"));
        assert!(estimate.summary.contains("RM375"));
    }
}
