//! Webhook registration handshake (`hub.verify_token` / `hub.challenge`).
//!
//! The platform calls the webhook once with a verify token and a challenge;
//! echoing the challenge back accepts the subscription. The exchange is pure:
//! the same query against the same configured token always has the same
//! outcome.

use reqwest::StatusCode;
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

/// Query parameters of a registration request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HandshakeQuery {
    /// Subscription mode, normally `subscribe`.
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    /// Token the platform was given when the webhook was configured.
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    /// Value that must be echoed back verbatim.
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Terminal state of a handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// Tokens matched: respond `200` with the challenge.
    Accepted {
        /// The challenge to echo.
        challenge: String,
    },
    /// Tokens did not match: respond `401` with an empty body.
    Rejected,
}

impl HandshakeOutcome {
    /// HTTP status to respond with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Accepted { .. } => StatusCode::OK,
            Self::Rejected => StatusCode::UNAUTHORIZED,
        }
    }

    /// Plain-text response body.
    pub fn body(&self) -> &str {
        match self {
            Self::Accepted { challenge } => challenge,
            Self::Rejected => "",
        }
    }
}

/// Decide a handshake against the configured verify token.
///
/// An empty configured token rejects every request.
pub fn evaluate(configured_token: &str, query: &HandshakeQuery) -> HandshakeOutcome {
    let token_matches = !configured_token.is_empty()
        && query
            .verify_token
            .as_deref()
            .is_some_and(|token| {
                bool::from(token.as_bytes().ct_eq(configured_token.as_bytes()))
            });

    if token_matches {
        info!(mode = ?query.mode, "webhook handshake accepted");
        HandshakeOutcome::Accepted {
            challenge: query.challenge.clone().unwrap_or_default(),
        }
    } else {
        warn!(mode = ?query.mode, "webhook handshake rejected: verify token mismatch");
        HandshakeOutcome::Rejected
    }
}
