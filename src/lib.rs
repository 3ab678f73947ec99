//! Signed Messenger Platform client and webhook verifier.
//!
//! Outbound: every Graph API call carries the access token and a fresh
//! `appsecret_proof`. Inbound: webhook bodies are checked against
//! `x-hub-signature` before they are parsed, and the registration handshake
//! echoes the challenge only for the configured verify token.
//!
//! See `DESIGN.md` for the module map.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod credentials;
pub mod logging;

pub mod messenger;
pub mod webhook;
