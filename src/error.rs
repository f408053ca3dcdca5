use thiserror::Error;

/// Errors produced by the gateway client.
///
/// `Validation` concerns caller-supplied input, `Parse` concerns data received
/// from the gateway (including signature mismatches), and `Gateway` is a
/// rejection reported by the remote system itself.
#[derive(Error, Debug)]
pub enum RedsysError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Validation error on `{field}`: {message}")]
    Validation {
        message: String,
        field: String,
        value: Option<String>,
    },
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        code: Option<String>,
        description: Option<&'static str>,
    },
    #[error("Gateway error {code}: {message}")]
    Gateway {
        message: String,
        code: u32,
        raw: String,
    },
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Internal error: {0}")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RedsysError {
    pub fn validation(
        message: impl Into<String>,
        field: impl Into<String>,
        value: Option<&str>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            field: field.into(),
            value: value.map(str::to_owned),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: None,
            description: None,
        }
    }

    /// The offending field for validation failures.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RedsysError>;
