use thiserror::Error;

pub type FplResult<T> = Result<T, FplError>;

/// Everything the core can fail with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FplError {
    /// Network-level failure that outlived the retry policy.
    #[error("transport failed for {url} after {attempts} attempt(s): {message}")]
    Transport {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("request to {url} was cancelled")]
    Cancelled { url: String },

    /// HTTP 503: the game is updating.
    #[error("the game is currently updating, please try again later ({url})")]
    ServiceUnavailable { url: String },

    #[error("upstream returned http {status} for {url}")]
    Upstream { url: String, status: u16 },

    #[error("unknown player id {0}")]
    UnknownPlayer(u32),

    #[error("gameweek {gameweek}: {what}")]
    MissingData { gameweek: u8, what: String },

    #[error("malformed {resource} response: {reason}")]
    MalformedResponse {
        resource: &'static str,
        reason: String,
    },
}

impl FplError {
    /// Errors that must abort the whole flow instead of skipping one gameweek.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FplError::Transport { .. } | FplError::Cancelled { .. })
    }

    pub fn missing(gameweek: u8, what: impl Into<String>) -> Self {
        FplError::MissingData {
            gameweek,
            what: what.into(),
        }
    }

    pub fn malformed(resource: &'static str, reason: impl ToString) -> Self {
        FplError::MalformedResponse {
            resource,
            reason: reason.to_string(),
        }
    }
}
