//! Per-page credential resolution for inbound activities.
//!
//! Page access tokens are scoped to one page, so a deployment serving several
//! pages builds a client per activity. A single configured token short-cuts
//! the lookup.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{Activity, ClientConfig, MessengerClient, MessengerError};

/// Looks up the page access token for an account id.
#[async_trait]
pub trait AccessTokenResolver: Send + Sync {
    /// Return the access token for `account_id`. An empty string means none.
    async fn access_token_for(&self, account_id: &str) -> Result<String, MessengerError>;
}

/// Tokens held in memory, keyed by page id.
#[derive(Clone, Default)]
pub struct StaticTokenResolver {
    tokens: HashMap<String, String>,
}

impl std::fmt::Debug for StaticTokenResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenResolver")
            .field("pages", &self.tokens.keys().collect::<Vec<_>>())
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}

impl StaticTokenResolver {
    /// Build from a page id → token map.
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl AccessTokenResolver for StaticTokenResolver {
    async fn access_token_for(&self, account_id: &str) -> Result<String, MessengerError> {
        Ok(self.tokens.get(account_id).cloned().unwrap_or_default())
    }
}

/// Adapter that turns an async function into an [`AccessTokenResolver`].
#[derive(Clone)]
pub struct ResolverFn<F> {
    f: F,
}

/// Wrap an async function `(account_id) -> token` as a resolver.
pub fn resolver_fn<F, Fut>(f: F) -> ResolverFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, MessengerError>> + Send + 'static,
{
    ResolverFn { f }
}

#[async_trait]
impl<F, Fut> AccessTokenResolver for ResolverFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, MessengerError>> + Send + 'static,
{
    async fn access_token_for(&self, account_id: &str) -> Result<String, MessengerError> {
        (self.f)(account_id.to_owned()).await
    }
}

/// The account whose credentials apply to `activity`.
///
/// Normally the recipient (the page). Echoes swap the roles, so the sender
/// is used instead.
///
/// # Errors
///
/// Returns [`MessengerError::InvalidReference`] when that id is empty.
pub fn account_id_for(activity: &Activity) -> Result<&str, MessengerError> {
    let (account, role) = if activity.is_echo() {
        (&activity.from, "sender")
    } else {
        (&activity.recipient, "recipient")
    };
    let id = account.id.trim();
    if id.is_empty() {
        return Err(MessengerError::InvalidReference(format!(
            "activity has no {role} id"
        )));
    }
    Ok(id)
}

/// Builds clients for activities on a shared HTTP transport.
#[derive(Clone)]
pub struct ClientFactory {
    http: reqwest::Client,
    base: ClientConfig,
    resolver: Option<Arc<dyn AccessTokenResolver>>,
}

impl std::fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFactory")
            .field("base", &self.base)
            .field("has_resolver", &self.resolver.is_some())
            .finish()
    }
}

impl ClientFactory {
    /// Create a factory. `base` supplies host, version and secrets.
    pub fn new(http: reqwest::Client, base: ClientConfig) -> Self {
        Self {
            http,
            base,
            resolver: None,
        }
    }

    /// Attach the resolver used when `base` has no access token.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn AccessTokenResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// The base configuration.
    pub fn base(&self) -> &ClientConfig {
        &self.base
    }

    /// Pick the client whose credentials apply to `activity`.
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError::InvalidReference`] if the activity has no
    /// usable account id, or [`MessengerError::MissingCredential`] if no
    /// non-empty token is found for it.
    pub async fn resolve_client_for_activity(
        &self,
        activity: &Activity,
    ) -> Result<MessengerClient, MessengerError> {
        if self.base.has_access_token() {
            return Ok(MessengerClient::with_http(
                self.http.clone(),
                self.base.clone(),
            ));
        }

        let account_id = account_id_for(activity)?;
        let Some(resolver) = self.resolver.as_ref() else {
            return Err(MessengerError::MissingCredential(format!(
                "no access token configured for account {account_id}"
            )));
        };

        let token = resolver.access_token_for(account_id).await?;
        if token.is_empty() {
            return Err(MessengerError::MissingCredential(format!(
                "resolver returned no access token for account {account_id}"
            )));
        }

        debug!(account_id, echo = activity.is_echo(), "resolved page credentials");
        Ok(MessengerClient::with_http(
            self.http.clone(),
            self.base.with_access_token(token),
        ))
    }
}
