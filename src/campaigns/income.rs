//! Satu Gaji Satu Harapan — income protection.

use rust_decimal::Decimal;

use super::CampaignKind;
use crate::dialog::parse::{parse_in_range, parse_number};
use crate::dialog::script::{
    AnswerKey, Answers, CampaignScript, Estimate, EstimateError, FieldSpec, profile_age,
};
use crate::error::ValidationError;
use crate::leads::column;
use crate::premium::{self, format_money};

pub static SCRIPT: CampaignScript = CampaignScript {
    kind: CampaignKind::IncomeProtection,
    welcome: "If your income stopped tomorrow, how long could your family keep going? \
              Satu Gaji Satu Harapan pays a lump sum so the people who rely on you \
              are looked after.",
    benefits: "Here's what the plan gives you:\n\
               • Income replacement: a lump sum of up to 10x your annual income\n\
               • Flexible coverage periods from 1 to 50 years\n\
               • Affordable premiums, from RM100 a year\n\
               • No medical check-up for most applicants\n\
               • Tax relief on premiums paid",
    fields: &[
        FieldSpec {
            key: AnswerKey::AnnualIncome,
            prompt: "What is your annual income in RM? (e.g. 60000)",
            help: "Your yearly income before tax. \"60,000\" or \"sixty thousand\" both work.",
            presets: &[],
            custom_prompt: None,
            parse: parse_income,
            prefill: None,
        },
        FieldSpec {
            key: AnswerKey::Age,
            prompt: "How old are you?",
            help: "Cover is available from age 18 to 70.",
            presets: &[],
            custom_prompt: None,
            parse: parse_age,
            prefill: Some(profile_age),
        },
        FieldSpec {
            key: AnswerKey::YearsOfCoverage,
            prompt: "For how many years would you like to be covered? (1-50)",
            help: "Many people choose cover until their youngest child finishes school.",
            presets: &[],
            custom_prompt: None,
            parse: parse_years,
            prefill: None,
        },
    ],
    estimate,
};

fn parse_income(input: &str) -> Result<Decimal, ValidationError> {
    let income = parse_number(input)?;
    premium::check_income(income)?;
    Ok(income)
}

fn parse_age(input: &str) -> Result<Decimal, ValidationError> {
    parse_in_range(input, "an age", 18, 70).map(Decimal::from)
}

fn parse_years(input: &str) -> Result<Decimal, ValidationError> {
    parse_in_range(input, "a number of years", 1, 50).map(Decimal::from)
}

fn estimate(answers: &Answers) -> Result<Estimate, EstimateError> {
    let income = answers.require(AnswerKey::AnnualIncome)?;
    let age = answers.require_whole(AnswerKey::Age)?;
    let years = answers.require_whole(AnswerKey::YearsOfCoverage)?;

    let premium = premium::income_protection(income, age)?;
    let coverage = premium
        .line("Recommended coverage")
        .unwrap_or(income * premium::INCOME_COVERAGE_MULTIPLE);

    let summary = format!(
        "Here is your Satu Gaji Satu Harapan estimate:\n\
         • Recommended coverage: {}\n\
         • Coverage period: {years} years\n\
         • Annual premium: {}\n\
         • Monthly premium: {}",
        format_money(coverage),
        format_money(premium.annual),
        format_money(premium.monthly),
    );

    Ok(Estimate {
        summary,
        premium,
        lead_columns: vec![
            (column::ANNUAL_INCOME, income.normalize().to_string()),
            (column::COVERAGE_YEARS, years.to_string()),
        ],
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn field_validators() {
        assert_eq!(parse_income("RM60,000").unwrap(), dec!(60000));
        assert!(parse_income("0").is_err());
        assert!(parse_age("17").is_err());
        assert_eq!(parse_age("70").unwrap(), dec!(70));
        assert!(parse_years("0").is_err());
        assert!(parse_years("51").is_err());
    }

    #[test]
    fn estimate_summary_and_columns() {
        let mut answers = Answers::default();
        answers.insert(AnswerKey::AnnualIncome, dec!(60000));
        answers.insert(AnswerKey::Age, dec!(36));
        answers.insert(AnswerKey::YearsOfCoverage, dec!(20));

        let estimate = estimate(&answers).unwrap();
        assert_eq!(estimate.premium.annual, dec!(1020));
        assert!(estimate.summary.contains("RM600,000"));
        assert!(estimate.summary.contains("RM1,020"));
        assert!(estimate.summary.contains("RM85"));
        assert_eq!(
            estimate.lead_columns,
            vec![
                (column::ANNUAL_INCOME, "60000".to_string()),
                (column::COVERAGE_YEARS, "20".to_string()),
            ]
        );
    }

    #[test]
    fn estimate_requires_all_answers() {
        let mut answers = Answers::default();
        answers.insert(AnswerKey::AnnualIncome, dec!(60000));
        assert!(matches!(estimate(&answers), Err(EstimateError::Dialog(_))));
    }
}
