pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One outbound request: the prompt plus the model it goes to.
/// Built immediately before the call, not retained afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
}

/// A successful generation: the text payload plus whatever usage
/// metadata the service reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// Token usage from a single service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Accumulate another usage into this one.
    pub fn add(&mut self, other: TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.output_tokens += other.output_tokens;
    }

    /// Total tokens (prompt + output).
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.output_tokens
    }
}

/// Why a service call failed. `Clone + PartialEq` so scripted tests
/// can carry and compare these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Could not reach the service at all.
    #[error("network error: {0}")]
    Network(String),

    /// The transport gave up waiting.
    #[error("request timed out")]
    Timeout,

    /// The service rejected the credential.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// Quota exhausted or too many requests.
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// The service rejected the request itself.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The prompt was refused by the service's safety layer.
    #[error("prompt blocked: {0}")]
    Blocked(String),

    /// Any other non-success status.
    #[error("service error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// A well-formed response with no text in it.
    #[error("empty response from model")]
    Empty,
}

impl ServiceError {
    /// Whether a retry could plausibly succeed. Nothing here retries
    /// automatically; the classification exists for logging.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout | Self::RateLimited(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// The generation capability. Real traffic goes through
/// [`gemini::GeminiGenerator`]; tests script a [`mock::MockGenerator`].
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_add_accumulates() {
        let mut usage = TokenUsage {
            prompt_tokens: 10,
            output_tokens: 5,
        };
        usage.add(TokenUsage {
            prompt_tokens: 3,
            output_tokens: 7,
        });
        assert_eq!(usage.prompt_tokens, 13);
        assert_eq!(usage.output_tokens, 12);
        assert_eq!(usage.total(), 25);
    }

    #[test]
    fn usage_default_is_zero() {
        assert_eq!(TokenUsage::default().total(), 0);
    }

    #[test]
    fn transient_errors() {
        assert!(ServiceError::Network("connection refused".into()).is_transient());
        assert!(ServiceError::Timeout.is_transient());
        assert!(ServiceError::RateLimited("quota".into()).is_transient());
        assert!(
            ServiceError::Api {
                status: 503,
                message: "overloaded".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn permanent_errors() {
        assert!(!ServiceError::Auth("bad key".into()).is_transient());
        assert!(!ServiceError::InvalidRequest("no contents".into()).is_transient());
        assert!(!ServiceError::Blocked("SAFETY".into()).is_transient());
        assert!(!ServiceError::Malformed("not json".into()).is_transient());
        assert!(!ServiceError::Empty.is_transient());
        assert!(
            !ServiceError::Api {
                status: 404,
                message: "no such model".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn error_messages_name_the_cause() {
        assert_eq!(
            ServiceError::Timeout.to_string(),
            "request timed out"
        );
        assert_eq!(
            ServiceError::Auth("key expired".into()).to_string(),
            "authentication rejected: key expired"
        );
        assert_eq!(
            ServiceError::Api {
                status: 500,
                message: "internal".into()
            }
            .to_string(),
            "service error (500): internal"
        );
    }
}
