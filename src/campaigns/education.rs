//! Masa Depan Anak Kita — education savings.

use rust_decimal::Decimal;

use super::CampaignKind;
use crate::dialog::parse::{parse_in_range, parse_number};
use crate::dialog::script::{AnswerKey, Answers, CampaignScript, Estimate, EstimateError, FieldSpec};
use crate::error::ValidationError;
use crate::leads::column;
use crate::premium::{self, EDUCATION_SAVING_MAXIMUM, EDUCATION_SAVING_MINIMUM, format_money};

pub static SCRIPT: CampaignScript = CampaignScript {
    kind: CampaignKind::Education,
    welcome: "University fees keep rising. Masa Depan Anak Kita helps you save a little \
              every month so your child's education is ready when they are.",
    benefits: "Masa Depan Anak Kita offers:\n\
               • Regular savings that grow until your child turns 18\n\
               • Protection: savings continue even if something happens to you\n\
               • Flexible monthly amounts from RM100\n\
               • Payouts timed for university enrolment",
    fields: &[
        FieldSpec {
            key: AnswerKey::ChildAge,
            prompt: "How old is your child? (0-17)",
            help: "Enter your child's current age. Savings are projected until they turn 18.",
            presets: &[],
            custom_prompt: None,
            parse: parse_child_age,
            prefill: None,
        },
        FieldSpec {
            key: AnswerKey::MonthlySaving,
            prompt: "How much would you like to save each month?",
            help: "Pick an amount, or choose \"Other amount\" for anything from RM100 to RM10,000.",
            presets: &[
                ("RM200", "200"),
                ("RM300", "300"),
                ("RM400", "400"),
                ("RM500", "500"),
                ("Other amount", "custom"),
            ],
            custom_prompt: Some("Please type a monthly amount between RM100 and RM10,000."),
            parse: parse_monthly_saving,
            prefill: None,
        },
    ],
    estimate,
};

fn parse_child_age(input: &str) -> Result<Decimal, ValidationError> {
    parse_in_range(input, "a child's age", 0, 17).map(Decimal::from)
}

fn parse_monthly_saving(input: &str) -> Result<Decimal, ValidationError> {
    let amount = parse_number(input)?;
    if amount < EDUCATION_SAVING_MINIMUM || amount > EDUCATION_SAVING_MAXIMUM {
        return Err(ValidationError::out_of_range(
            "a monthly amount",
            format_money(EDUCATION_SAVING_MINIMUM),
            format_money(EDUCATION_SAVING_MAXIMUM),
        ));
    }
    Ok(amount)
}

fn estimate(answers: &Answers) -> Result<Estimate, EstimateError> {
    let child_age = answers.require_whole(AnswerKey::ChildAge)?;
    let saving = answers.require(AnswerKey::MonthlySaving)?;

    let premium = premium::education(saving, child_age)?;
    let years = premium::EDUCATION_TARGET_AGE - child_age;

    let mut summary = format!(
        "Here is your Masa Depan Anak Kita projection:\n\
         • Monthly saving: {} ({} a year)\n\
         • Saving period: {years} years, until age 18",
        format_money(saving),
        format_money(premium.annual),
    );
    for line in premium.breakdown.iter().filter(|l| l.label.starts_with("Projected")) {
        summary.push_str(&format!("\n• {}: {}", line.label, format_money(line.value)));
    }

    Ok(Estimate {
        summary,
        premium,
        lead_columns: vec![
            (column::CHILD_AGE, child_age.to_string()),
            (column::MONTHLY_SAVING, saving.normalize().to_string()),
        ],
    })
}
