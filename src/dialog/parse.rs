//! Input parsing shared by every dialog: numbers, yes/no vocabulary,
//! control commands, contact details.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::ValidationError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").expect("email regex")
});

static DOB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("dob regex"));

/// Malaysian mobile numbers: `012-3456789`, `+60123456789`, `60123456789`.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+?6?01)[0-46-9]-*[0-9]{7,8}$").expect("phone regex"));

const AFFIRMATIVE: &[&str] = &[
    "yes", "y", "ya", "yeah", "yep", "sure", "ok", "okay", "proceed", "continue",
    "interested", "definitely", "of course",
];

const NEGATIVE: &[&str] = &[
    "no", "n", "nope", "nah", "not now", "no thanks", "no thank you", "not interested",
    "later", "skip", "cancel",
];

/// `true` for an affirmative reply. Matches the whole message or its
/// first word ("yes please").
pub fn is_affirmative(normalized: &str) -> bool {
    matches_vocabulary(normalized, AFFIRMATIVE)
}

pub fn is_negative(normalized: &str) -> bool {
    matches_vocabulary(normalized, NEGATIVE)
}

fn matches_vocabulary(normalized: &str, vocabulary: &[&str]) -> bool {
    let trimmed = normalized.trim_end_matches(['!', '.', ',']);
    if vocabulary.contains(&trimmed) {
        return true;
    }
    trimmed
        .split_whitespace()
        .next()
        .is_some_and(|first| vocabulary.contains(&first.trim_end_matches([',', '!', '.'])))
}

/// Commands that return to the main menu from anywhere.
pub fn is_main_menu_command(normalized: &str) -> bool {
    matches!(normalized, "main_menu" | "main menu" | "restart")
}

pub fn is_help_command(normalized: &str) -> bool {
    matches!(normalized, "help" | "?")
}

/// Parse a number, ignoring everything but digits and the decimal point
/// ("RM 60,000" → 60000). Falls back to cardinal words ("fifty thousand").
pub fn parse_number(input: &str) -> Result<Decimal, ValidationError> {
    if input.chars().any(|c| c.is_ascii_digit()) {
        let cleaned: String = input
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        return Decimal::from_str(cleaned.trim_matches('.'))
            .map_err(|_| ValidationError::NotANumber);
    }
    parse_number_words(input)
        .map(Decimal::from)
        .ok_or(ValidationError::NotANumber)
}

/// Parse a whole number, rejecting fractions.
pub fn parse_whole(input: &str) -> Result<u32, ValidationError> {
    let value = parse_number(input)?;
    if !value.fract().is_zero() {
        return Err(ValidationError::NotWholeNumber);
    }
    value.to_u32().ok_or(ValidationError::NotWholeNumber)
}

/// Parse a whole number and check it against an inclusive range.
pub fn parse_in_range(
    input: &str,
    field: &'static str,
    min: u32,
    max: u32,
) -> Result<u32, ValidationError> {
    let value = parse_whole(input)?;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::out_of_range(field, min, max))
    }
}

fn word_value(word: &str) -> Option<u64> {
    let value = match word {
        "zero" => 0,
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        "seventy" => 70,
        "eighty" => 80,
        "ninety" => 90,
        _ => return None,
    };
    Some(value)
}

/// Cardinal words to a number: "twenty five" → 25, "fifty thousand" → 50000.
fn parse_number_words(input: &str) -> Option<u64> {
    let lowered = input.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| c.is_whitespace() || c == '-' || c == ',')
        .filter(|w| !w.is_empty() && *w != "and" && *w != "a" && *w != "rm")
        .collect();
    if words.is_empty() {
        return None;
    }

    let mut total: u64 = 0;
    let mut current: u64 = 0;
    for word in words {
        match word {
            "hundred" => current = current.max(1).checked_mul(100)?,
            "thousand" => {
                total = total.checked_add(current.max(1).checked_mul(1_000)?)?;
                current = 0;
            }
            "million" => {
                total = total.checked_add(current.max(1).checked_mul(1_000_000)?)?;
                current = 0;
            }
            other => current = current.checked_add(word_value(other)?)?,
        }
    }
    total.checked_add(current)
}

/// Validate and lower-case an email address.
pub fn parse_email(input: &str) -> Result<String, ValidationError> {
    let email = input.trim().to_lowercase();
    if EMAIL_RE.is_match(&email) {
        Ok(email)
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// Parse a `DD/MM/YYYY` date of birth that is a real calendar date.
pub fn parse_dob(input: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = input.trim();
    if !DOB_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidDate);
    }
    NaiveDate::parse_from_str(trimmed, "%d/%m/%Y").map_err(|_| ValidationError::InvalidDate)
}

/// Accept either an email address or a Malaysian phone number.
pub fn parse_contact(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if let Ok(email) = parse_email(trimmed) {
        return Ok(email);
    }
    let compact: String = trimmed.chars().filter(|c| *c != ' ').collect();
    if PHONE_RE.is_match(&compact) {
        Ok(compact)
    } else {
        Err(ValidationError::InvalidContact)
    }
}
