//! Inbound messages and the uniform `Response` type.

use serde::{Deserialize, Serialize};

/// A message from the user, as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Free text typed by the user.
    Text(String),
    /// A button click.
    Choice { value: String, label: Option<String> },
}

impl Inbound {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn choice(value: impl Into<String>) -> Self {
        Self::Choice {
            value: value.into(),
            label: None,
        }
    }

    /// The raw content, trimmed but with case preserved.
    pub fn raw(&self) -> &str {
        match self {
            Self::Text(text) => text.trim(),
            Self::Choice { value, .. } => value.trim(),
        }
    }

    /// Lower-cased, trimmed content used for matching.
    pub fn normalized(&self) -> String {
        self.raw().to_lowercase()
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Choice { .. })
    }
}

/// One button offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub value: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Build choices from a static `(label, value)` table.
pub fn choices(table: &[(&str, &str)]) -> Vec<Choice> {
    table
        .iter()
        .map(|(label, value)| Choice::new(*label, *value))
        .collect()
}

/// Out-of-band instruction overriding normal step transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlSignal {
    ReturnToMainMenu,
}

/// What every processing step returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Message { text: String },
    Buttons { text: String, choices: Vec<Choice> },
    Control { text: String, signal: ControlSignal },
}

impl Response {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message { text: text.into() }
    }

    pub fn buttons(text: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self::Buttons {
            text: text.into(),
            choices,
        }
    }

    pub fn return_to_main_menu(text: impl Into<String>) -> Self {
        Self::Control {
            text: text.into(),
            signal: ControlSignal::ReturnToMainMenu,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Message { text } | Self::Buttons { text, .. } | Self::Control { text, .. } => text,
        }
    }

    pub fn choices(&self) -> &[Choice] {
        match self {
            Self::Buttons { choices, .. } => choices,
            _ => &[],
        }
    }

    pub fn control(&self) -> Option<ControlSignal> {
        match self {
            Self::Control { signal, .. } => Some(*signal),
            _ => None,
        }
    }

    /// Prepend a line to the message body.
    pub fn prefixed(self, prefix: &str) -> Self {
        let join = |text: String| format!("{prefix}\n\n{text}");
        match self {
            Self::Message { text } => Self::Message { text: join(text) },
            Self::Buttons { text, choices } => Self::Buttons {
                text: join(text),
                choices,
            },
            control @ Self::Control { .. } => control,
        }
    }
}

/// A response plus the step the owning state machine moves to.
/// `next: None` means stay put.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    pub response: Response,
    pub next: Option<S>,
}

impl<S> Transition<S> {
    pub fn to(next: S, response: Response) -> Self {
        Self {
            response,
            next: Some(next),
        }
    }

    pub fn stay(response: Response) -> Self {
        Self {
            response,
            next: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_prefers_choice_value() {
        let msg = Inbound::Choice {
            value: " Contact_Agent ".into(),
            label: Some("Yes, contact me".into()),
        };
        assert_eq!(msg.normalized(), "contact_agent");
        assert_eq!(Inbound::text("  Hello There ").normalized(), "hello there");
        assert_eq!(Inbound::text("  Ali bin Abu ").raw(), "Ali bin Abu");
    }

    #[test]
    fn prefixed_keeps_choices() {
        let response = Response::buttons("Pick one", vec![Choice::new("A", "a")]).prefixed("Oops.");
        assert_eq!(response.text(), "Oops.\n\nPick one");
        assert_eq!(response.choices().len(), 1);

        let control = Response::return_to_main_menu("bye").prefixed("ignored");
        assert_eq!(control.text(), "bye");
        assert_eq!(control.control(), Some(ControlSignal::ReturnToMainMenu));
    }
}
