//! Premium calculators, one per campaign.
//!
//! Pure and deterministic. Out-of-domain inputs come back as a
//! `ValidationError` so the dialog layer can re-prompt or explain.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Floor on the yearly income-protection premium.
pub const MINIMUM_ANNUAL_PREMIUM: Decimal = dec!(100);

/// Recommended cover as a multiple of annual income.
pub const INCOME_COVERAGE_MULTIPLE: Decimal = dec!(10);
pub const INCOME_MAXIMUM: Decimal = dec!(100000000);

pub const LEGACY_MINIMUM: Decimal = dec!(1000);
pub const LEGACY_MAXIMUM: Decimal = dec!(10000000);

pub const EDUCATION_TARGET_AGE: u32 = 18;
pub const EDUCATION_SAVING_MINIMUM: Decimal = dec!(100);
pub const EDUCATION_SAVING_MAXIMUM: Decimal = dec!(10000);

/// Low / base / high projection rates for education savings.
pub const EDUCATION_RATES: [Decimal; 3] = [dec!(0.06), dec!(0.08), dec!(0.10)];

const INCOME_AGE_GUIDANCE: &str =
    "Income protection is available for ages 18-70. Please consult our advisor for alternative options.";
const LEGACY_AGE_GUIDANCE: &str =
    "Legacy plans are available for ages 18-70. Please consult our advisor for alternative options.";
const MEDICAL_AGE_GUIDANCE: &str =
    "Medical plans are available for ages 0-100. Please consult our advisor for alternative options.";
const COMBO_AGE_GUIDANCE: &str =
    "Combo plans are typically for ages 18-60. Please consult our advisor for alternative options.";

/// Combo annual premiums: rows are package tiers, columns are age bands
/// 18-30, 31-40, 41-50, 51-60.
const COMBO_TABLE: [[Decimal; 4]; 3] = [
    [dec!(1200), dec!(1800), dec!(2700), dec!(4000)],
    [dec!(2000), dec!(3000), dec!(4500), dec!(6500)],
    [dec!(3000), dec!(4500), dec!(6500), dec!(9500)],
];

/// Outcome of a premium estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PremiumResult {
    pub annual: Decimal,
    pub monthly: Decimal,
    pub breakdown: Vec<BreakdownLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownLine {
    pub label: String,
    pub value: Decimal,
}

impl PremiumResult {
    fn from_annual(annual: Decimal, breakdown: Vec<BreakdownLine>) -> Self {
        Self {
            annual,
            monthly: annual / dec!(12),
            breakdown,
        }
    }

    fn from_monthly(monthly: Decimal, breakdown: Vec<BreakdownLine>) -> Self {
        Self {
            annual: monthly * dec!(12),
            monthly,
            breakdown,
        }
    }

    /// Look up a breakdown value by label.
    pub fn line(&self, label: &str) -> Option<Decimal> {
        self.breakdown
            .iter()
            .find(|l| l.label == label)
            .map(|l| l.value)
    }
}

fn line(label: impl Into<String>, value: Decimal) -> BreakdownLine {
    BreakdownLine {
        label: label.into(),
        value,
    }
}

fn check_age(age: u32, min: u32, max: u32, guidance: &'static str) -> Result<(), ValidationError> {
    if (min..=max).contains(&age) {
        Ok(())
    } else {
        Err(ValidationError::AgeOutOfBand { age, guidance })
    }
}

// ── Income protection ───────────────────────────────────────────────

/// Yearly rate per RM1,000 of cover.
pub fn income_rate_per_thousand(age: u32) -> Decimal {
    match age {
        0..=30 => dec!(1.20),
        31..=40 => dec!(1.70),
        41..=50 => dec!(2.80),
        _ => dec!(4.50),
    }
}

/// Income must be positive and no more than `INCOME_MAXIMUM`.
pub fn check_income(annual_income: Decimal) -> Result<(), ValidationError> {
    if annual_income <= Decimal::ZERO {
        return Err(ValidationError::NotPositive {
            field: "an annual income",
        });
    }
    if annual_income > INCOME_MAXIMUM {
        return Err(income_too_large());
    }
    Ok(())
}

fn income_too_large() -> ValidationError {
    ValidationError::TooLarge {
        field: "an annual income",
        max: format_money(INCOME_MAXIMUM),
    }
}

pub fn income_protection(annual_income: Decimal, age: u32) -> Result<PremiumResult, ValidationError> {
    check_age(age, 18, 70, INCOME_AGE_GUIDANCE)?;
    check_income(annual_income)?;

    let rate = income_rate_per_thousand(age);
    let coverage = annual_income.checked_mul(INCOME_COVERAGE_MULTIPLE);
    let annual = coverage
        .and_then(|c| c.checked_div(dec!(1000)))
        .and_then(|per_thousand| per_thousand.checked_mul(rate));
    let (Some(coverage), Some(annual)) = (coverage, annual) else {
        return Err(income_too_large());
    };
    let annual = annual.max(MINIMUM_ANNUAL_PREMIUM);

    Ok(PremiumResult::from_annual(
        annual,
        vec![
            line("Recommended coverage", coverage),
            line("Rate per RM1,000", rate),
        ],
    ))
}

// ── Legacy ──────────────────────────────────────────────────────────

pub fn legacy_band_factor(age: u32) -> Decimal {
    match age {
        0..=35 => dec!(30),
        36..=45 => dec!(40),
        _ => dec!(55),
    }
}

pub fn legacy(legacy_amount: Decimal, age: u32) -> Result<PremiumResult, ValidationError> {
    check_age(age, 18, 70, LEGACY_AGE_GUIDANCE)?;
    if legacy_amount < LEGACY_MINIMUM || legacy_amount > LEGACY_MAXIMUM {
        return Err(ValidationError::out_of_range(
            "a legacy amount",
            format_money(LEGACY_MINIMUM),
            format_money(LEGACY_MAXIMUM),
        ));
    }

    let factor = legacy_band_factor(age);
    let annual = legacy_amount / dec!(1000) * factor;

    Ok(PremiumResult::from_annual(
        annual,
        vec![
            line("Legacy amount", legacy_amount),
            line("Rate per RM1,000", factor),
        ],
    ))
}

// ── Education ───────────────────────────────────────────────────────

/// Future value of an ordinary annuity.
pub fn future_value_annuity(payment: Decimal, rate: Decimal, periods: u32) -> Decimal {
    if rate.is_zero() {
        return payment * Decimal::from(periods);
    }
    payment * (((Decimal::ONE + rate).powi(i64::from(periods)) - Decimal::ONE) / rate)
}

/// Projects education savings up to age 18.
///
/// Contributions are annualized (`monthly × 12`) and compounded yearly.
/// `monthly` on the result is the saving itself, `annual` the yearly
/// contribution.
pub fn education(monthly_saving: Decimal, child_age: u32) -> Result<PremiumResult, ValidationError> {
    if child_age >= EDUCATION_TARGET_AGE {
        return Err(ValidationError::out_of_range("a child's age", 0, EDUCATION_TARGET_AGE - 1));
    }
    if monthly_saving < EDUCATION_SAVING_MINIMUM || monthly_saving > EDUCATION_SAVING_MAXIMUM {
        return Err(ValidationError::out_of_range(
            "a monthly saving",
            format_money(EDUCATION_SAVING_MINIMUM),
            format_money(EDUCATION_SAVING_MAXIMUM),
        ));
    }

    let years = EDUCATION_TARGET_AGE - child_age;
    let contribution = monthly_saving * dec!(12);

    let mut breakdown = vec![line("Years until 18", Decimal::from(years))];
    for rate in EDUCATION_RATES {
        let percent = (rate * dec!(100)).normalize();
        breakdown.push(line(
            format!("Projected at {percent}%"),
            future_value_annuity(contribution, rate, years),
        ));
    }

    Ok(PremiumResult {
        annual: contribution,
        monthly: monthly_saving,
        breakdown,
    })
}

// ── Medical ─────────────────────────────────────────────────────────

/// Medical coverage level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageTier {
    Basic,
    Medium,
    Comprehensive,
}

impl CoverageTier {
    pub fn from_number(n: u32) -> Option<Self> {
        match n {
            1 => Some(Self::Basic),
            2 => Some(Self::Medium),
            3 => Some(Self::Comprehensive),
            _ => None,
        }
    }

    pub fn number(&self) -> u32 {
        match self {
            Self::Basic => 1,
            Self::Medium => 2,
            Self::Comprehensive => 3,
        }
    }

    pub fn multiplier(&self) -> Decimal {
        match self {
            Self::Basic => dec!(1.0),
            Self::Medium => dec!(2.0),
            Self::Comprehensive => dec!(3.5),
        }
    }

    pub fn coverage_amount(&self) -> Decimal {
        match self {
            Self::Basic => dec!(100000),
            Self::Medium => dec!(500000),
            Self::Comprehensive => dec!(1000000),
        }
    }
}

pub fn medical_base_premium(age: u32) -> Decimal {
    match age {
        0..=17 => dec!(80),
        18..=60 => dec!(120),
        _ => dec!(350),
    }
}

pub fn medical_age_surcharge(age: u32) -> Decimal {
    if age > 40 {
        Decimal::from(age - 40) * dec!(2.5)
    } else {
        Decimal::ZERO
    }
}

/// Monthly medical premium: `base × multiplier + surcharge`.
pub fn medical(age: u32, tier: CoverageTier) -> Result<PremiumResult, ValidationError> {
    check_age(age, 0, 100, MEDICAL_AGE_GUIDANCE)?;

    let base = medical_base_premium(age);
    let surcharge = medical_age_surcharge(age);
    let monthly = base * tier.multiplier() + surcharge;

    Ok(PremiumResult::from_monthly(
        monthly,
        vec![
            line("Base premium", base),
            line("Coverage multiplier", tier.multiplier()),
            line("Age surcharge", surcharge),
            line("Coverage amount", tier.coverage_amount()),
        ],
    ))
}

// ── Combo ───────────────────────────────────────────────────────────

/// Combo package tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageTier {
    Silver,
    Gold,
    Platinum,
}

impl PackageTier {
    pub fn from_number(n: u32) -> Option<Self> {
        match n {
            1 => Some(Self::Silver),
            2 => Some(Self::Gold),
            3 => Some(Self::Platinum),
            _ => None,
        }
    }

    pub fn number(&self) -> u32 {
        match self {
            Self::Silver => 1,
            Self::Gold => 2,
            Self::Platinum => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
        }
    }
}

fn combo_age_band(age: u32) -> Option<usize> {
    match age {
        18..=30 => Some(0),
        31..=40 => Some(1),
        41..=50 => Some(2),
        51..=60 => Some(3),
        _ => None,
    }
}

pub fn combo(age: u32, tier: PackageTier) -> Result<PremiumResult, ValidationError> {
    let band = combo_age_band(age).ok_or(ValidationError::AgeOutOfBand {
        age,
        guidance: COMBO_AGE_GUIDANCE,
    })?;
    let row = (tier.number() - 1) as usize;
    let annual = COMBO_TABLE[row][band];

    Ok(PremiumResult::from_annual(
        annual,
        vec![line(format!("{} package", tier.name()), annual)],
    ))
}

// ── Formatting ──────────────────────────────────────────────────────

/// Round to cents, halves away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Render as `RM1,234.56`, or `RM1,234` for whole amounts.
pub fn format_money(amount: Decimal) -> String {
    let rounded = round_money(amount);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = rounded.abs();
    let whole = abs.trunc();
    let cents = ((abs - whole) * dec!(100)).to_u32().unwrap_or(0);

    let digits = whole.normalize().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    if cents == 0 {
        format!("{sign}RM{grouped}")
    } else {
        format!("{sign}RM{grouped}.{cents:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn income_premium_has_floor_and_exact_monthly() {
        let incomes = [dec!(1), dec!(500), dec!(8000), dec!(60000), dec!(250000)];
        for age in 18..=70 {
            for income in incomes {
                let result = income_protection(income, age).unwrap();
                assert!(result.annual >= MINIMUM_ANNUAL_PREMIUM, "age {age} income {income}");
                assert_eq!(result.monthly, result.annual / dec!(12));
            }
        }
    }

    #[test]
    fn income_rate_non_decreasing() {
        let mut previous = income_rate_per_thousand(18);
        for age in 19..=70 {
            let rate = income_rate_per_thousand(age);
            assert!(rate >= previous, "rate dropped at age {age}");
            previous = rate;
        }
        assert_eq!(income_rate_per_thousand(30), dec!(1.20));
        assert_eq!(income_rate_per_thousand(31), dec!(1.70));
        assert_eq!(income_rate_per_thousand(50), dec!(2.80));
        assert_eq!(income_rate_per_thousand(51), dec!(4.50));
    }

    #[test]
    fn income_coverage_is_ten_times_income() {
        let result = income_protection(dec!(60000), 36).unwrap();
        assert_eq!(result.line("Recommended coverage"), Some(dec!(600000)));
        assert_eq!(result.annual, dec!(1020));
    }

    #[test]
    fn income_rejects_out_of_domain() {
        assert!(matches!(
            income_protection(dec!(50000), 17),
            Err(ValidationError::AgeOutOfBand { age: 17, .. })
        ));
        assert!(matches!(
            income_protection(dec!(50000), 71),
            Err(ValidationError::AgeOutOfBand { .. })
        ));
        assert!(matches!(
            income_protection(Decimal::ZERO, 30),
            Err(ValidationError::NotPositive { .. })
        ));
    }

    #[test]
    fn income_above_maximum_is_rejected_not_overflowed() {
        let at_cap = income_protection(INCOME_MAXIMUM, 70).unwrap();
        assert_eq!(at_cap.line("Recommended coverage"), Some(dec!(1000000000)));

        let huge = Decimal::from_str_exact("9999999999999999999999999999").unwrap();
        assert!(matches!(
            income_protection(huge, 40),
            Err(ValidationError::TooLarge { .. })
        ));
        assert!(matches!(
            income_protection(INCOME_MAXIMUM + dec!(1), 40),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn legacy_is_linear_in_amount() {
        for age in 18..=70 {
            for amount in [dec!(1000), dec!(100000), dec!(250000), dec!(500000)] {
                let single = legacy(amount, age).unwrap();
                let double = legacy(amount * dec!(2), age).unwrap();
                assert_eq!(double.annual, single.annual * dec!(2), "age {age}");
            }
        }
    }

    #[test]
    fn legacy_scenario_age_fifty() {
        let result = legacy(dec!(500000), 50).unwrap();
        assert_eq!(result.annual, dec!(27500));

        // Age 45 sits in the 40-per-thousand band.
        let result = legacy(dec!(500000), 45).unwrap();
        assert_eq!(result.annual, dec!(20000));
        assert_eq!(round_money(result.monthly), dec!(1666.67));
    }

    #[test]
    fn legacy_rejects_small_amounts() {
        assert!(matches!(
            legacy(dec!(999), 30),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn annuity_future_value() {
        // One period: FV equals the payment.
        assert_eq!(future_value_annuity(dec!(1200), dec!(0.06), 1), dec!(1200));
        // Two periods: p + p(1+r).
        assert_eq!(future_value_annuity(dec!(1000), dec!(0.10), 2), dec!(2100));
        assert_eq!(future_value_annuity(dec!(1000), Decimal::ZERO, 5), dec!(5000));
    }

    #[test]
    fn education_projection_uses_annual_contributions() {
        let result = education(dec!(200), 17).unwrap();
        assert_eq!(result.annual, dec!(2400));
        assert_eq!(result.monthly, dec!(200));
        assert_eq!(result.line("Years until 18"), Some(dec!(1)));
        assert_eq!(result.line("Projected at 6%"), Some(dec!(2400)));

        let result = education(dec!(300), 8).unwrap();
        let low = result.line("Projected at 6%").unwrap();
        let base = result.line("Projected at 8%").unwrap();
        let high = result.line("Projected at 10%").unwrap();
        assert!(low < base && base < high);
        assert!(low > dec!(3600) * dec!(10));
    }

    #[test]
    fn education_rejects_out_of_domain() {
        assert!(education(dec!(200), 18).is_err());
        assert!(education(dec!(99), 5).is_err());
        assert!(education(dec!(10001), 5).is_err());
    }

    #[test]
    fn medical_senior_comprehensive() {
        let result = medical(65, CoverageTier::Comprehensive).unwrap();
        assert_eq!(result.line("Base premium"), Some(dec!(350)));
        assert_eq!(result.line("Age surcharge"), Some(dec!(62.5)));
        assert_eq!(result.monthly, dec!(1287.5));
        assert_eq!(result.annual, dec!(15450));
    }

    #[test]
    fn medical_age_tiers() {
        assert_eq!(medical(10, CoverageTier::Basic).unwrap().monthly, dec!(80));
        assert_eq!(medical(40, CoverageTier::Medium).unwrap().monthly, dec!(240));
        assert_eq!(medical(41, CoverageTier::Basic).unwrap().monthly, dec!(122.5));
        assert!(medical(101, CoverageTier::Basic).is_err());
    }

    #[test]
    fn combo_table_lookup() {
        let result = combo(35, PackageTier::Gold).unwrap();
        assert_eq!(result.annual, dec!(3000));
        assert_eq!(result.monthly, dec!(250));
        assert_eq!(combo(60, PackageTier::Platinum).unwrap().annual, dec!(9500));
        assert_eq!(combo(18, PackageTier::Silver).unwrap().annual, dec!(1200));
    }

    #[test]
    fn combo_rejects_outside_band_with_guidance() {
        let err = combo(61, PackageTier::Silver).unwrap_err();
        assert!(err.to_string().contains("ages 18-60"));
        assert!(combo(17, PackageTier::Gold).is_err());
    }

    #[test]
    fn tier_numbers_round_trip() {
        for n in 1..=3 {
            assert_eq!(CoverageTier::from_number(n).unwrap().number(), n);
            assert_eq!(PackageTier::from_number(n).unwrap().number(), n);
        }
        assert!(CoverageTier::from_number(4).is_none());
        assert!(PackageTier::from_number(0).is_none());
    }

    #[test]
    fn money_formatting() {
        assert_eq!(format_money(dec!(1666.666666)), "RM1,666.67");
        assert_eq!(format_money(dec!(600000)), "RM600,000");
        assert_eq!(format_money(dec!(1287.5)), "RM1,287.50");
        assert_eq!(format_money(dec!(100)), "RM100");
        assert_eq!(format_money(dec!(1000000)), "RM1,000,000");
    }
}
