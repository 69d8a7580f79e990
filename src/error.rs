//! Error types for Lead Assist.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Lead error: {0}")]
    Lead(#[from] LeadError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Lead persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum LeadError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Append timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Sheet rejected append with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Agent notification errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP send failed: {0}")]
    Send(String),
}

/// Transport errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
}

/// User input that failed validation.
///
/// The `Display` text is shown to the user as the re-prompt preface, so it
/// never carries internal detail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a number.")]
    NotANumber,

    #[error("Please enter a whole number.")]
    NotWholeNumber,

    #[error("Please enter {field} between {min} and {max}.")]
    OutOfRange {
        field: &'static str,
        min: String,
        max: String,
    },

    #[error("Please enter {field} greater than zero.")]
    NotPositive { field: &'static str },

    #[error("Please enter {field} of at most {max}.")]
    TooLarge { field: &'static str, max: String },

    #[error("Please enter a valid date in DD/MM/YYYY format.")]
    InvalidDate,

    #[error("Your date of birth can't be in the future.")]
    FutureDate,

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Please enter a valid phone number (e.g. 012-3456789) or email address.")]
    InvalidContact,

    #[error("Please pick one of the options below.")]
    UnknownChoice,

    #[error("{guidance}")]
    AgeOutOfBand { age: u32, guidance: &'static str },

    #[error("Please tell me your name.")]
    EmptyName,
}

impl ValidationError {
    pub fn out_of_range(field: &'static str, min: impl ToString, max: impl ToString) -> Self {
        Self::OutOfRange {
            field,
            min: min.to_string(),
            max: max.to_string(),
        }
    }
}

/// Internal dialog faults. Recovered at the handler boundary.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("Step refers to unknown field index {0}")]
    UnknownField(usize),

    #[error("Missing answer for {0}")]
    MissingAnswer(&'static str),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store() -> Result<()> {
        let opened: std::result::Result<(), LeadError> =
            Err(LeadError::Database("disk full".into()));
        opened?;
        Ok(())
    }

    fn serve() -> Result<()> {
        let served: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken"));
        served?;
        Ok(())
    }

    #[test]
    fn startup_failures_convert_into_service_error() {
        let err = open_store().unwrap_err();
        assert!(matches!(err, Error::Lead(LeadError::Database(_))));
        assert_eq!(err.to_string(), "Lead error: Database error: disk full");

        assert!(matches!(serve().unwrap_err(), Error::Io(_)));

        let err: Error = ConfigError::InvalidValue {
            key: "SMTP_PORT".into(),
            message: "invalid digit found in string".into(),
        }
        .into();
        assert!(
            err.to_string()
                .starts_with("Configuration error: Invalid configuration value for SMTP_PORT")
        );
    }
}
