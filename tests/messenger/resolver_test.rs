//! Account resolution for inbound activities.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use messenger_gateway::messenger::resolver::account_id_for;
use messenger_gateway::messenger::{
    compute_proof, resolver_fn, Activity, ChannelAccount, ClientConfig, ClientFactory,
    MessengerChannelData, MessengerError, StaticTokenResolver,
};

const SECRET: &str = "app-secret";

fn base_config(access_token: &str) -> ClientConfig {
    match ClientConfig::new("graph.facebook.com", "v3.2", SECRET, access_token, "verify") {
        Ok(config) => config,
        Err(err) => panic!("config should build: {err}"),
    }
}

fn activity(from: &str, recipient: &str, is_echo: bool) -> Activity {
    Activity {
        from: ChannelAccount::new(from),
        recipient: ChannelAccount::new(recipient),
        channel_data: MessengerChannelData {
            is_echo,
            ..MessengerChannelData::default()
        },
        ..Activity::default()
    }
}

/// Resolver returning `token-<id>` and recording every lookup.
fn recording_factory() -> (ClientFactory, Arc<Mutex<Vec<String>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&calls);
    let resolver = resolver_fn(move |account_id: String| {
        let recorded = Arc::clone(&recorded);
        async move {
            if let Ok(mut calls) = recorded.lock() {
                calls.push(account_id.clone());
            }
            Ok::<_, MessengerError>(format!("token-{account_id}"))
        }
    });
    let factory = ClientFactory::new(reqwest::Client::new(), base_config(""))
        .with_resolver(Arc::new(resolver));
    (factory, calls)
}

fn recorded_calls(calls: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    match calls.lock() {
        Ok(calls) => calls.clone(),
        Err(err) => panic!("lock should not be poisoned: {err}"),
    }
}

fn expected_proof(token: &str) -> String {
    match compute_proof(SECRET, token) {
        Ok(proof) => proof,
        Err(err) => panic!("proof should compute: {err}"),
    }
}

#[test]
fn account_id_uses_recipient_for_regular_messages() {
    let event = activity("USER", "PAGE", false);
    assert!(matches!(account_id_for(&event), Ok("PAGE")));
}

#[test]
fn account_id_uses_sender_for_echoes() {
    let event = activity("PAGE", "USER", true);
    assert!(matches!(account_id_for(&event), Ok("PAGE")));
}

#[tokio::test]
async fn global_token_short_circuits_resolution() {
    let (_, calls) = recording_factory();
    let factory = ClientFactory::new(reqwest::Client::new(), base_config("global-token"));

    // Even an activity without a recipient resolves in single-page mode.
    let client = factory
        .resolve_client_for_activity(&activity("USER", "", false))
        .await;
    let client = match client {
        Ok(client) => client,
        Err(err) => panic!("single-page resolution should succeed: {err}"),
    };
    assert_eq!(
        client.config().proof().ok(),
        Some(expected_proof("global-token"))
    );
    assert!(recorded_calls(&calls).is_empty());
}

#[tokio::test]
async fn regular_message_resolves_recipient_page() {
    let (factory, calls) = recording_factory();
    let client = factory
        .resolve_client_for_activity(&activity("USER9", "PAGE1", false))
        .await
        .expect("resolution should succeed");

    assert_eq!(recorded_calls(&calls), vec!["PAGE1".to_owned()]);
    assert_eq!(
        client.config().proof().ok(),
        Some(expected_proof("token-PAGE1"))
    );
}

#[tokio::test]
async fn echo_resolves_sender_page() {
    let (factory, calls) = recording_factory();
    let client = factory
        .resolve_client_for_activity(&activity("PAGE1", "USER9", true))
        .await
        .expect("resolution should succeed");

    assert_eq!(recorded_calls(&calls), vec!["PAGE1".to_owned()]);
    assert_eq!(
        client.config().proof().ok(),
        Some(expected_proof("token-PAGE1"))
    );
}

#[tokio::test]
async fn empty_recipient_is_invalid_reference() {
    let (factory, calls) = recording_factory();
    let result = factory
        .resolve_client_for_activity(&activity("USER9", "", false))
        .await;
    assert!(matches!(result, Err(MessengerError::InvalidReference(_))));
    assert!(recorded_calls(&calls).is_empty());
}

#[tokio::test]
async fn echo_without_sender_is_invalid_reference() {
    let (factory, _) = recording_factory();
    let result = factory
        .resolve_client_for_activity(&activity("  ", "USER9", true))
        .await;
    assert!(matches!(result, Err(MessengerError::InvalidReference(_))));
}

#[tokio::test]
async fn empty_resolved_token_is_missing_credential() {
    let resolver =
        resolver_fn(|_account_id: String| async { Ok::<_, MessengerError>(String::new()) });
    let factory = ClientFactory::new(reqwest::Client::new(), base_config(""))
        .with_resolver(Arc::new(resolver));
    let result = factory
        .resolve_client_for_activity(&activity("USER9", "PAGE1", false))
        .await;
    assert!(matches!(result, Err(MessengerError::MissingCredential(_))));
}

#[tokio::test]
async fn no_token_and_no_resolver_is_missing_credential() {
    let factory = ClientFactory::new(reqwest::Client::new(), base_config(""));
    let result = factory
        .resolve_client_for_activity(&activity("USER9", "PAGE1", false))
        .await;
    assert!(matches!(result, Err(MessengerError::MissingCredential(_))));
}

#[tokio::test]
async fn resolver_errors_propagate() {
    let resolver = resolver_fn(|account_id: String| async move {
        Err::<String, _>(MessengerError::InvalidReference(format!(
            "unknown page {account_id}"
        )))
    });
    let factory = ClientFactory::new(reqwest::Client::new(), base_config(""))
        .with_resolver(Arc::new(resolver));
    let result = factory
        .resolve_client_for_activity(&activity("USER9", "PAGE1", false))
        .await;
    assert!(matches!(result, Err(MessengerError::InvalidReference(_))));
}

#[tokio::test]
async fn static_resolver_maps_known_pages() {
    let mut tokens = HashMap::new();
    tokens.insert("PAGE1".to_owned(), "page-one-token".to_owned());
    let factory = ClientFactory::new(reqwest::Client::new(), base_config(""))
        .with_resolver(Arc::new(StaticTokenResolver::new(tokens)));

    let known = factory
        .resolve_client_for_activity(&activity("USER9", "PAGE1", false))
        .await
        .expect("known page should resolve");
    assert_eq!(
        known.config().proof().ok(),
        Some(expected_proof("page-one-token"))
    );

    let unknown = factory
        .resolve_client_for_activity(&activity("USER9", "PAGE2", false))
        .await;
    assert!(matches!(unknown, Err(MessengerError::MissingCredential(_))));
}

#[test]
fn static_resolver_debug_hides_tokens() {
    let mut tokens = HashMap::new();
    tokens.insert("PAGE1".to_owned(), "page-one-token".to_owned());
    let debug = format!("{:?}", StaticTokenResolver::new(tokens));
    assert!(debug.contains("PAGE1"));
    assert!(!debug.contains("page-one-token"));
}
