use thiserror::Error;

pub type Result<T> = std::result::Result<T, SlpmError>;

#[derive(Debug, Error)]
pub enum SlpmError {
    /// The master key could not be derived. Ends the session.
    #[error("scrypt fail: {0}")]
    KeyDerivation(String),

    /// HMAC setup/update/finalize failed for one site query.
    #[error("hmac fail: {0}")]
    SeedDerivation(String),

    #[error("Pattern {pattern:?} in template '{template}' is invalid: {reason}")]
    InvalidTemplate {
        template: &'static str,
        pattern: &'static str,
        reason: &'static str,
    },

    #[error("Invalid password pattern: {0}")]
    InvalidPattern(&'static str),

    #[error("Failed to find address of ssh-agent (SSH_AUTH_SOCK)")]
    AgentNotConfigured,

    #[error("Failed to connect to ssh-agent: {0}")]
    AgentConnect(#[source] std::io::Error),

    #[error("ssh-agent communication failed: {0}")]
    AgentIo(#[source] std::io::Error),

    #[error("Unexpected result size from ssh-agent (length {0})")]
    AgentUnexpectedLength(u32),

    #[error("ssh-agent did not return success (status {0})")]
    AgentFailure(u8),

    /// A key could not be removed again. Its slot is freed regardless.
    #[error("ssh-agent did not return success at removing key: {0}")]
    AgentRemove(#[source] Box<SlpmError>),

    #[error("Operation cancelled: no passphrase given")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SlpmError {
    /// Whether the error must end the whole session rather than one query.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SlpmError::KeyDerivation(_) | SlpmError::Cancelled | SlpmError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classes() {
        assert!(SlpmError::KeyDerivation("out of memory".into()).is_fatal());
        assert!(SlpmError::Cancelled.is_fatal());
        assert!(!SlpmError::SeedDerivation("bad key".into()).is_fatal());
        assert!(!SlpmError::AgentFailure(5).is_fatal());
        assert!(!SlpmError::AgentUnexpectedLength(2).is_fatal());
        assert!(!SlpmError::AgentNotConfigured.is_fatal());
        assert!(!SlpmError::AgentRemove(Box::new(SlpmError::AgentFailure(5))).is_fatal());
    }
}
