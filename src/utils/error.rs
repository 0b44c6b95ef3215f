use crate::domain::card::CardError;
use crate::domain::ports::ApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StartError {
    #[error(transparent)]
    Card(#[from] CardError),

    #[error("request to {operation} failed with status {status}: {body}")]
    Provider {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("request to {operation} failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid value for {field}: `{value}` ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("missing required configuration field: {field}")]
    MissingConfig { field: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl StartError {
    /// Attaches the failed operation's name to a gateway error once the
    /// active retry policy has given up on it.
    pub(crate) fn from_api(operation: &'static str, err: ApiError) -> Self {
        match err {
            ApiError::Status { status, body } => StartError::Provider {
                operation,
                status,
                body,
            },
            ApiError::Transport(source) => StartError::Transport { operation, source },
        }
    }

    /// Status code of the provider response, when the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            StartError::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StartError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::Card;

    #[test]
    fn test_card_error_converts() {
        fn issue(number: &str) -> Result<Card> {
            let card = Card::new(number, "123", 11, 2099, "John Doe")?;
            Ok(card)
        }

        let err = issue("4111111111111112").unwrap_err();
        assert!(matches!(err, StartError::Card(_)));
        assert!(err.to_string().contains("number"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_provider_error_carries_status_and_body() {
        let err = StartError::from_api(
            "create token",
            ApiError::Status {
                status: 402,
                body: "{\"error\":\"card_declined\"}".to_string(),
            },
        );
        assert_eq!(err.status(), Some(402));
        let message = err.to_string();
        assert!(message.contains("create token"));
        assert!(message.contains("402"));
        assert!(message.contains("card_declined"));
    }

    #[test]
    fn test_transport_error_names_operation() {
        let source = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = StartError::from_api("create token", ApiError::Transport(Box::new(source)));
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("create token"));
    }
}
