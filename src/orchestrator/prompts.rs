//! Onboarding copy and the choice lists for each funnel question.

use super::state::OnboardingStep;
use crate::dialog::{Choice, Inbound, Response};
use crate::dialog::message::choices;

pub const GREETING: &str = "Hello! I'm here to help you find the insurance plan that fits your \
                            life. I'll ask a few quick questions first.\n\nWhat's your name?";
pub const DOB_PROMPT: &str = "What is your date of birth? (DD/MM/YYYY)";
pub const EMAIL_PROMPT: &str = "What is your email address? (e.g., example@email.com)";
pub const EMAIL_THANKS: &str = "Thank you! Now, let's understand your financial goals better.";
pub const ANALYZING: &str =
    "Thank you for sharing your details! Let me analyze the best options for you...";
pub const MENU_PROMPT: &str = "Here are the plans that suit you best. Please select one:";
pub const ALL_PLANS_PROMPT: &str = "Here are all of our plans. Please select one:";
pub const MENU_RESET: &str = "Welcome back to the main menu! What's your name?";
pub const GOODBYE: &str = "Thank you for chatting with us. Have a great day! \
                           Send any message if you'd like to start again.";
pub const APOLOGY: &str = "Sorry, something went wrong on our side. Let's start over.";

/// A funnel question answered with one of a fixed set of choices.
pub struct ChoiceQuestion {
    pub prompt: &'static str,
    pub choices: &'static [(&'static str, &'static str)],
}

pub static CONCERN: ChoiceQuestion = ChoiceQuestion {
    prompt: "What's your biggest financial concern right now?",
    choices: &[
        ("Protecting my family's income", "income_protection"),
        ("Covering medical expenses", "medical_expenses"),
        ("Saving for children's education", "education"),
        ("Building long-term wealth", "wealth_building"),
        ("Planning for retirement", "retirement"),
    ],
};

pub static LIFE_STAGE: ChoiceQuestion = ChoiceQuestion {
    prompt: "Which best describes your current life stage?",
    choices: &[
        ("Just starting a family", "starting_family"),
        ("Raising young children", "raising_children"),
        ("Paying off a home", "home_owner"),
        ("Nearing retirement", "pre_retirement"),
        ("Single and independent", "single"),
        ("Retired", "retired"),
    ],
};

pub static DEPENDENTS: ChoiceQuestion = ChoiceQuestion {
    prompt: "How many people depend on your income?",
    choices: &[
        ("Just myself", "1"),
        ("1 other person", "2"),
        ("2-3 people", "3"),
        ("4+ people", "4"),
    ],
};

pub static EXISTING_COVERAGE: ChoiceQuestion = ChoiceQuestion {
    prompt: "Do you have any existing life or medical insurance?",
    choices: &[
        ("No coverage at all", "none"),
        ("Basic employer coverage", "basic"),
        ("Some personal coverage", "some"),
        ("Comprehensive coverage", "full"),
    ],
};

pub static PREMIUM_BUDGET: ChoiceQuestion = ChoiceQuestion {
    prompt: "What's your budget for monthly premiums? (RM)",
    choices: &[
        ("< RM200", "<200"),
        ("RM201 - RM500", "201-500"),
        ("RM501 - RM1000", "501-1000"),
        ("> RM1000", ">1000"),
    ],
};

/// The choice question asked at `step`, if it is a choice step.
pub fn question_for(step: OnboardingStep) -> Option<&'static ChoiceQuestion> {
    match step {
        OnboardingStep::GetFinancialConcern => Some(&CONCERN),
        OnboardingStep::GetLifeStage => Some(&LIFE_STAGE),
        OnboardingStep::GetDependents => Some(&DEPENDENTS),
        OnboardingStep::GetExistingCoverage => Some(&EXISTING_COVERAGE),
        OnboardingStep::GetPremiumBudget => Some(&PREMIUM_BUDGET),
        _ => None,
    }
}

impl ChoiceQuestion {
    pub fn response(&self) -> Response {
        Response::buttons(self.prompt, choices(self.choices))
    }

    /// Resolve a reply to a choice value: the value itself, the label, or
    /// the 1-based position in the list.
    pub fn resolve(&self, message: &Inbound) -> Option<&'static str> {
        let normalized = message.normalized();
        if let Some((_, value)) = self
            .choices
            .iter()
            .find(|(label, value)| normalized == *value || normalized == label.to_lowercase())
        {
            return Some(*value);
        }
        normalized
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.choices.get(i))
            .map(|(_, value)| *value)
    }
}

/// Numbered menu buttons, plus "Show all plans" when the list is filtered.
pub fn menu_choices(titles: &[&str], filtered: bool) -> Vec<Choice> {
    let mut buttons: Vec<Choice> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| Choice::new(format!("{}. {title}", i + 1), (i + 1).to_string()))
        .collect();
    if filtered {
        buttons.push(Choice::new("Show all plans", "all"));
    }
    buttons
}
