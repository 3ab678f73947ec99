//! Messenger Platform boundary: signed Send API client, webhook signature
//! verification, registration handshake and per-page account resolution.
//!
//! Everything here is stateless with respect to conversations. The only
//! shared state is an immutable [`ClientConfig`] and a cloned HTTP transport.

pub mod client;
pub mod events;
pub mod handshake;
pub mod message;
pub mod resolver;
pub mod signing;

pub use client::{ClientConfig, MessengerClient};
pub use events::{Activity, ChannelAccount, MessengerChannelData, WebhookBatch};
pub use handshake::{HandshakeOutcome, HandshakeQuery};
pub use resolver::{resolver_fn, AccessTokenResolver, ClientFactory, StaticTokenResolver};
pub use signing::{compute_proof, escape_non_ascii, verify_signature, WebhookRequest};

/// Errors from the Messenger boundary.
#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    /// The inbound activity does not carry a usable account identifier.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// A secret required for signing, or a resolved page token, is empty.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// The client was constructed with absent or malformed configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// HTTP transport failure. Never retried here.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The outbound payload could not be serialized to JSON.
    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The request URL could not be built from the configured host and path.
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    /// The caller cancelled the send before the transport completed.
    #[error("request cancelled")]
    Cancelled,
}
