//! Workspace error type.
//!
//! One enum for the whole bot. Interaction decoding, reply dispatch,
//! scheduling, and storage all report through `CourseBellError` so handler
//! code can bubble everything with `?` and let the dispatcher decide what the
//! requester gets to see.

use thiserror::Error;

/// Result alias used across all CourseBell crates.
pub type Result<T> = std::result::Result<T, CourseBellError>;

#[derive(Debug, Error)]
pub enum CourseBellError {
    // ─── Protocol errors (malformed or stale component identifiers) ───
    /// The identifier names an action no registry knows about.
    #[error("unsupported action '{0}'")]
    UnsupportedAction(String),

    /// The identifier carries the wrong number of arguments for its action.
    #[error("action '{action}' expects {expected} argument(s), got {actual}")]
    ArgumentCountMismatch {
        action: String,
        expected: usize,
        actual: usize,
    },

    /// An argument token is not a valid 64-bit integer.
    #[error("action '{action}': argument '{token}' is not an integer")]
    ArgumentParseError { action: String, token: String },

    // ─── Reply-state errors (programming errors in handlers) ───
    /// A reply operation is not legal in the request's current state.
    #[error("illegal reply state: {0}")]
    IllegalReplyState(String),

    /// REDIRECT_CHANNEL was requested but no redirect channel is attached.
    #[error("no redirect channel attached to this interaction")]
    MissingRedirectTarget,

    /// The renderer cannot produce this payload kind.
    #[error("unsupported response type '{0}'")]
    UnsupportedResponseType(String),

    // ─── Scheduling / firing ───
    /// The trigger store rejected an add, or a trigger references an
    /// unregistered job kind.
    #[error("scheduling failure: {0}")]
    Scheduling(String),

    // ─── Collaborators ───
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("channel error: {0}")]
    Channel(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CourseBellError {
    /// True for errors caused by untrusted identifier input (spec: always
    /// recoverable locally, answered with a short non-sensitive message).
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedAction(_)
                | Self::ArgumentCountMismatch { .. }
                | Self::ArgumentParseError { .. }
        )
    }

    /// Short message safe to show the requester. Never leaks internal state.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedAction(_) => {
                "This button is no longer supported. It may come from an older version.".into()
            }
            Self::ArgumentCountMismatch { .. } | Self::ArgumentParseError { .. } => {
                "This interaction is malformed and cannot be processed.".into()
            }
            _ => "Something went wrong while handling your request.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_classification() {
        assert!(CourseBellError::UnsupportedAction("x".into()).is_protocol());
        assert!(
            CourseBellError::ArgumentCountMismatch {
                action: "a".into(),
                expected: 2,
                actual: 1,
            }
            .is_protocol()
        );
        assert!(!CourseBellError::MissingRedirectTarget.is_protocol());
        assert!(!CourseBellError::Scheduling("dup".into()).is_protocol());
    }

    #[test]
    fn test_count_mismatch_message_names_counts() {
        let err = CourseBellError::ArgumentCountMismatch {
            action: "event_edit".into(),
            expected: 2,
            actual: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("expects 2"));
        assert!(msg.contains("got 3"));
    }

    #[test]
    fn test_user_message_is_not_internal() {
        let err = CourseBellError::Storage("sqlite says no".into());
        assert!(!err.user_message().contains("sqlite"));
    }
}
