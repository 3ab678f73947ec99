//! Signed HTTP client for the Messenger Platform Graph API.
//!
//! Every request carries `access_token` and a freshly computed
//! `appsecret_proof` as query parameters, in that order.

use std::future::Future;
use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Response};
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::handshake::{self, HandshakeOutcome, HandshakeQuery};
use super::message::{
    OutboundMessage, Recipient, SenderAction, ThreadControl, MESSAGES_PATH,
    PASS_THREAD_CONTROL_PATH, REQUEST_THREAD_CONTROL_PATH, TAKE_THREAD_CONTROL_PATH,
};
use super::signing::{self, WebhookRequest};
use super::MessengerError;

/// Default Graph API host.
pub const DEFAULT_API_HOST: &str = "graph.facebook.com";

/// Default Graph API version.
pub const DEFAULT_API_VERSION: &str = "v3.2";

/// Default URL scheme.
pub const DEFAULT_API_SCHEME: &str = "https";

/// Immutable client configuration. Rotating a secret means building a new one.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_scheme: String,
    api_host: String,
    api_version: String,
    app_secret: String,
    access_token: String,
    verify_token: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_scheme", &self.api_scheme)
            .field("api_host", &self.api_host)
            .field("api_version", &self.api_version)
            .field("app_secret", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .field("verify_token", &"[REDACTED]")
            .finish()
    }
}

impl ClientConfig {
    /// Build a configuration.
    ///
    /// `access_token` may be empty for multi-page deployments where tokens are
    /// resolved per activity; signing with an empty token fails at send time.
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError::Configuration`] when the host or version is empty.
    pub fn new(
        api_host: impl Into<String>,
        api_version: impl Into<String>,
        app_secret: impl Into<String>,
        access_token: impl Into<String>,
        verify_token: impl Into<String>,
    ) -> Result<Self, MessengerError> {
        let api_host = api_host.into().trim().trim_end_matches('/').to_owned();
        let api_version = api_version.into().trim().trim_matches('/').to_owned();
        if api_host.is_empty() {
            return Err(MessengerError::Configuration(
                "api_host must not be empty".to_owned(),
            ));
        }
        if api_version.is_empty() {
            return Err(MessengerError::Configuration(
                "api_version must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            api_scheme: DEFAULT_API_SCHEME.to_owned(),
            api_host,
            api_version,
            app_secret: app_secret.into(),
            access_token: access_token.into(),
            verify_token: verify_token.into(),
        })
    }

    /// Override the URL scheme, e.g. `http` for a local mock of the Graph API.
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError::Configuration`] for anything but `http` or `https`.
    pub fn with_scheme(mut self, scheme: &str) -> Result<Self, MessengerError> {
        let scheme = scheme.trim().to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(MessengerError::Configuration(format!(
                "unsupported api scheme: {scheme}"
            )));
        }
        self.api_scheme = scheme;
        Ok(self)
    }

    /// A copy of this configuration carrying a different access token.
    pub fn with_access_token(&self, access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..self.clone()
        }
    }

    /// URL scheme (`https` unless overridden).
    pub fn api_scheme(&self) -> &str {
        &self.api_scheme
    }

    /// Graph API host, possibly with a port.
    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    /// Graph API version segment, e.g. `v3.2`.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Whether a global access token is configured (single-page mode).
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Compute the `appsecret_proof` for the configured access token.
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError::MissingCredential`] if the secret or token is empty.
    pub fn proof(&self) -> Result<String, MessengerError> {
        signing::compute_proof(&self.app_secret, &self.access_token)
    }

    /// Verify a raw webhook body against its `x-hub-signature` header value.
    pub fn verify_signature(&self, raw_body: &[u8], signature_header: &str) -> bool {
        signing::verify_signature(&self.app_secret, raw_body, signature_header)
    }

    /// Whether a captured webhook request was signed by the platform.
    pub fn verify_request(&self, request: &WebhookRequest) -> bool {
        request.is_authentic(&self.app_secret)
    }

    /// Answer a webhook registration handshake.
    pub fn handshake(&self, query: &HandshakeQuery) -> HandshakeOutcome {
        handshake::evaluate(&self.verify_token, query)
    }

    /// Build the signed request URL for an API-relative `path`.
    ///
    /// A missing leading `/` on `path` is added. `path` must not carry its own
    /// query or fragment.
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError::Configuration`] when `path` contains `?` or
    /// `#`, [`MessengerError::MissingCredential`] when signing inputs are
    /// empty, or [`MessengerError::Url`] if the result is not a valid URL.
    pub fn request_url(&self, path: &str) -> Result<Url, MessengerError> {
        if path.contains(['?', '#']) {
            return Err(MessengerError::Configuration(format!(
                "request path must not carry a query or fragment: {path}"
            )));
        }
        let proof = self.proof()?;
        let separator = if path.starts_with('/') { "" } else { "/" };
        let mut url = Url::parse(&format!(
            "{}://{}/{}{separator}{path}",
            self.api_scheme, self.api_host, self.api_version
        ))?;
        url.query_pairs_mut()
            .append_pair("access_token", &self.access_token)
            .append_pair("appsecret_proof", &proof);
        Ok(url)
    }
}

/// Client for one page's credentials.
///
/// Cheap to clone: the HTTP transport is a shared connection pool and the
/// configuration is reference counted.
#[derive(Debug, Clone)]
pub struct MessengerClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl MessengerClient {
    /// Create a client with its own HTTP transport.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http(reqwest::Client::new(), config)
    }

    /// Create a client on a shared, caller-owned HTTP transport.
    pub fn with_http(http: reqwest::Client, config: ClientConfig) -> Self {
        Self {
            http,
            config: Arc::new(config),
        }
    }

    /// The configuration this client signs with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `message` as JSON to `path` and return the raw response.
    ///
    /// `method` defaults to `POST`. The status code is not interpreted, nothing
    /// is retried and no timeout is applied beyond the transport's own.
    /// Dropping the returned future aborts the in-flight request.
    ///
    /// # Errors
    ///
    /// Returns signing, serialization, URL or transport errors.
    pub async fn send<M>(
        &self,
        path: &str,
        message: &M,
        method: Option<Method>,
    ) -> Result<Response, MessengerError>
    where
        M: Serialize + ?Sized,
    {
        let method = method.unwrap_or(Method::POST);
        let url = self.config.request_url(path)?;
        let body = serde_json::to_vec(message)?;

        debug!(%method, path, bytes = body.len(), "sending Messenger API request");
        let response = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        debug!(path, status = %response.status(), "Messenger API responded");
        Ok(response)
    }

    /// Like [`send`](Self::send), but gives up when `cancel` resolves first.
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError::Cancelled`] if `cancel` completes before the
    /// response arrives, otherwise the same errors as `send`.
    pub async fn send_until<M, C>(
        &self,
        path: &str,
        message: &M,
        method: Option<Method>,
        cancel: C,
    ) -> Result<Response, MessengerError>
    where
        M: Serialize + ?Sized,
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            () = cancel => {
                debug!(path, "Messenger API request cancelled by caller");
                Err(MessengerError::Cancelled)
            }
            result = self.send(path, message, method) => result,
        }
    }

    /// Send a text reply to a user.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn send_text(
        &self,
        recipient_id: &str,
        text: &str,
    ) -> Result<Response, MessengerError> {
        let message = OutboundMessage::text(recipient_id, text);
        self.send(MESSAGES_PATH, &message, None).await
    }

    /// Send a typing or read indicator.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn send_sender_action(
        &self,
        recipient_id: &str,
        action: SenderAction,
    ) -> Result<Response, MessengerError> {
        let message = OutboundMessage::sender_action(recipient_id, action);
        self.send(MESSAGES_PATH, &message, None).await
    }

    /// Pass thread control for `user_id` to another app.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn pass_thread_control(
        &self,
        user_id: &str,
        target_app_id: &str,
        metadata: Option<&str>,
    ) -> Result<Response, MessengerError> {
        let body = ThreadControl {
            recipient: Recipient::new(user_id),
            target_app_id: Some(target_app_id.to_owned()),
            metadata: metadata.map(str::to_owned),
        };
        self.send(PASS_THREAD_CONTROL_PATH, &body, None).await
    }

    /// Take thread control for `user_id` back as the primary receiver.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn take_thread_control(
        &self,
        user_id: &str,
        metadata: Option<&str>,
    ) -> Result<Response, MessengerError> {
        let body = ThreadControl {
            recipient: Recipient::new(user_id),
            target_app_id: None,
            metadata: metadata.map(str::to_owned),
        };
        self.send(TAKE_THREAD_CONTROL_PATH, &body, None).await
    }

    /// Ask the primary receiver for thread control of `user_id`.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn request_thread_control(
        &self,
        user_id: &str,
        metadata: Option<&str>,
    ) -> Result<Response, MessengerError> {
        let body = ThreadControl {
            recipient: Recipient::new(user_id),
            target_app_id: None,
            metadata: metadata.map(str::to_owned),
        };
        self.send(REQUEST_THREAD_CONTROL_PATH, &body, None).await
    }
}
