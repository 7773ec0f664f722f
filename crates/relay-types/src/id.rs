//! Stream token type.
//!
//! A [`StreamToken`] is the only thing a producer and a consumer share.
//! It is minted from a random UUID v4, so it cannot be guessed from the
//! sequence of previously issued tokens.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Prefix used by the [`Display`](std::fmt::Display) form.
const TOKEN_PREFIX: &str = "tok:";

/// Opaque key correlating a producing computation with its drain loop.
///
/// Possession of the token is the only access control on a stream.
/// Tokens are never reused: every call to [`StreamToken::new`] draws
/// fresh randomness.
///
/// # Passing Through String State
///
/// Producers usually receive the token through string-typed invocation
/// state. The [`Display`](std::fmt::Display) form round-trips through
/// [`FromStr`], and the bare UUID form is accepted as well.
///
/// # Example
///
/// ```
/// use relay_types::StreamToken;
///
/// let a = StreamToken::new();
/// let b = StreamToken::new();
/// assert_ne!(a, b);
///
/// let parsed: StreamToken = a.to_string().parse().unwrap();
/// assert_eq!(parsed, a);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamToken(pub Uuid);

#[allow(clippy::new_without_default)] // a default token would never be registered
impl StreamToken {
    /// Mints a new token from a random UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns the first eight hex digits, for log lines.
    ///
    /// ```
    /// use relay_types::StreamToken;
    ///
    /// let token = StreamToken::new();
    /// assert_eq!(token.short().len(), 8);
    /// assert!(token.uuid().to_string().starts_with(&token.short()));
    /// ```
    #[must_use]
    pub fn short(&self) -> String {
        let mut buf = Uuid::encode_buffer();
        let simple = self.0.simple().encode_lower(&mut buf);
        simple[..8].to_string()
    }
}

impl std::fmt::Display for StreamToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{TOKEN_PREFIX}{}", self.0)
    }
}

/// Failure to parse a [`StreamToken`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid stream token '{input}'")]
pub struct ParseTokenError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for StreamToken {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let raw = raw.strip_prefix(TOKEN_PREFIX).unwrap_or(raw);
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| ParseTokenError {
                input: s.to_string(),
            })
    }
}

// NOTE: StreamToken intentionally does NOT implement Default.
// Tokens are minted by StreamRegistry::create(); a free-standing token
// refers to nothing and every lookup with it would come back empty.
