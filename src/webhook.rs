//! HTTP endpoint for platform webhooks.
//!
//! `GET` answers the registration handshake. `POST` verifies the
//! `x-hub-signature` over the raw body before any JSON decoding, then
//! forwards the resulting activities to the application over an mpsc channel.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::messenger::signing::SIGNATURE_HEADER;
use crate::messenger::{
    Activity, ClientConfig, HandshakeOutcome, HandshakeQuery, WebhookBatch, WebhookRequest,
};

/// Shared state of the webhook routes.
#[derive(Debug)]
struct WebhookState {
    config: ClientConfig,
    activity_tx: mpsc::Sender<Activity>,
}

/// Build the webhook router mounted at `path`.
///
/// `config` supplies the app secret and verify token; verified activities
/// are sent on `activity_tx`.
pub fn router(path: &str, config: ClientConfig, activity_tx: mpsc::Sender<Activity>) -> Router {
    let state = Arc::new(WebhookState {
        config,
        activity_tx,
    });
    Router::new()
        .route(path, get(handle_handshake).post(handle_ingest))
        .with_state(state)
}

/// Serve `router` on `bind` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve<F>(bind: SocketAddr, router: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind webhook listener on {bind}"))?;
    info!(%bind, "webhook endpoint listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("webhook server failed")
}

async fn handle_handshake(
    State(state): State<Arc<WebhookState>>,
    query: Result<Query<HandshakeQuery>, QueryRejection>,
) -> Response {
    // A query that does not parse is answered like any other token mismatch.
    let outcome = match query {
        Ok(Query(query)) => state.config.handshake(&query),
        Err(e) => {
            warn!(error = %e, "webhook handshake rejected: malformed query");
            HandshakeOutcome::Rejected
        }
    };
    (outcome.status(), outcome.body().to_owned()).into_response()
}

async fn handle_ingest(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let request = WebhookRequest::new(body.to_vec(), signature);

    if !state.config.verify_request(&request) {
        warn!(
            has_signature = request.signature().is_some(),
            "webhook rejected: signature mismatch"
        );
        return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }

    let batch = match WebhookBatch::from_slice(request.body()) {
        Ok(batch) => batch,
        Err(e) => {
            warn!(error = %e, "webhook rejected: invalid payload");
            return (StatusCode::BAD_REQUEST, "invalid payload").into_response();
        }
    };

    let object = batch.object.clone();
    let activities = batch.into_activities();
    debug!(object, count = activities.len(), "webhook batch verified");

    for activity in activities {
        if state.activity_tx.send(activity).await.is_err() {
            warn!("activity receiver dropped, refusing webhook");
            return (StatusCode::SERVICE_UNAVAILABLE, "unavailable").into_response();
        }
    }

    StatusCode::OK.into_response()
}
