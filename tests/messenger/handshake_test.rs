//! Webhook registration handshake.

use reqwest::StatusCode;

use messenger_gateway::messenger::{ClientConfig, HandshakeOutcome, HandshakeQuery};

fn config_with_verify_token(token: &str) -> ClientConfig {
    match ClientConfig::new("graph.facebook.com", "v3.2", "secret", "", token) {
        Ok(config) => config,
        Err(err) => panic!("config should build: {err}"),
    }
}

fn query(token: Option<&str>, challenge: Option<&str>) -> HandshakeQuery {
    HandshakeQuery {
        mode: Some("subscribe".to_owned()),
        verify_token: token.map(str::to_owned),
        challenge: challenge.map(str::to_owned),
    }
}

#[test]
fn matching_token_echoes_challenge() {
    let config = config_with_verify_token("my-verify-token");
    let outcome = config.handshake(&query(Some("my-verify-token"), Some("abc123")));
    assert_eq!(
        outcome,
        HandshakeOutcome::Accepted {
            challenge: "abc123".to_owned()
        }
    );
    assert_eq!(outcome.status(), StatusCode::OK);
    assert_eq!(outcome.body(), "abc123");
}

#[test]
fn mismatched_token_is_unauthorized_with_empty_body() {
    let config = config_with_verify_token("my-verify-token");
    let outcome = config.handshake(&query(Some("other-token"), Some("abc123")));
    assert_eq!(outcome, HandshakeOutcome::Rejected);
    assert_eq!(outcome.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(outcome.body(), "");
}

#[test]
fn missing_token_is_rejected() {
    let config = config_with_verify_token("my-verify-token");
    let outcome = config.handshake(&query(None, Some("abc123")));
    assert_eq!(outcome, HandshakeOutcome::Rejected);
}

#[test]
fn empty_configured_token_rejects_everything() {
    let config = config_with_verify_token("");
    assert_eq!(
        config.handshake(&query(Some(""), Some("abc123"))),
        HandshakeOutcome::Rejected
    );
    assert_eq!(
        config.handshake(&HandshakeQuery::default()),
        HandshakeOutcome::Rejected
    );
}

#[test]
fn token_comparison_is_exact() {
    let config = config_with_verify_token("Token");
    assert_eq!(
        config.handshake(&query(Some("token"), Some("c"))),
        HandshakeOutcome::Rejected
    );
    assert_eq!(
        config.handshake(&query(Some("Token "), Some("c"))),
        HandshakeOutcome::Rejected
    );
}

#[test]
fn token_prefix_or_extension_is_rejected() {
    let config = config_with_verify_token("verify-me");
    for candidate in ["verify", "verify-me-too", "verify-mE", "\0erify-me"] {
        assert_eq!(
            config.handshake(&query(Some(candidate), Some("c"))),
            HandshakeOutcome::Rejected,
            "{candidate:?} should not match"
        );
    }
}

#[test]
fn missing_challenge_echoes_empty_body() {
    let config = config_with_verify_token("t");
    let outcome = config.handshake(&query(Some("t"), None));
    assert_eq!(outcome.status(), StatusCode::OK);
    assert_eq!(outcome.body(), "");
}

#[test]
fn handshake_is_idempotent() {
    let config = config_with_verify_token("t");
    let accepted = query(Some("t"), Some("xyz"));
    let rejected = query(Some("nope"), Some("xyz"));
    for _ in 0..3 {
        assert_eq!(config.handshake(&accepted).body(), "xyz");
        assert_eq!(config.handshake(&rejected), HandshakeOutcome::Rejected);
    }
}
