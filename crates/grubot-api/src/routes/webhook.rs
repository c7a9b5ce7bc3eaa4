use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
};
use grubot_core::AppState;
use grubot_models::webhook::{MessagingEvent, WebhookBody};
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::error::ApiError;
use crate::signature;

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Subscription handshake: echo the challenge when the token matches.
pub async fn verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<String, ApiError> {
    let token_matches =
        params.verify_token.as_deref() == Some(state.config.validation_token.as_str());
    if params.mode.as_deref() == Some("subscribe") && token_matches {
        tracing::info!("webhook validated");
        Ok(params.challenge.unwrap_or_default())
    } else {
        tracing::warn!(mode = ?params.mode, "webhook validation failed");
        Err(ApiError::Forbidden)
    }
}

/// Inbound deliveries. The response goes out as soon as the signature and
/// shape are checked; events are handled on spawned tasks.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = signature::verify_headers(&headers, &state.config.app_secret, &body) {
        tracing::warn!(error = %e, "rejecting unsigned webhook delivery");
        return Err(ApiError::Forbidden);
    }

    let body: WebhookBody = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid webhook body: {e}")))?;
    if body.object != "page" {
        tracing::debug!(object = %body.object, "ignoring non-page webhook");
        return Err(ApiError::NotFound);
    }

    dispatch(&state, body);
    Ok(StatusCode::OK)
}

/// Spawn one task per sender. Each task handles that sender's events in
/// delivery order; different senders proceed concurrently. Events that do
/// not parse are logged and skipped.
pub fn dispatch(state: &AppState, body: WebhookBody) -> Vec<JoinHandle<()>> {
    let mut by_sender: HashMap<String, Vec<MessagingEvent>> = HashMap::new();
    for entry in body.entry {
        tracing::debug!(page_id = %entry.id, time = ?entry.time, events = entry.messaging.len(), "page entry");
        let page_id = entry.id.clone();
        for event in entry.events() {
            match event {
                Ok(event) => by_sender
                    .entry(event.sender.id.clone())
                    .or_default()
                    .push(event),
                Err(e) => {
                    tracing::warn!(page_id = %page_id, error = %e, "unreadable messaging event dropped");
                }
            }
        }
    }

    by_sender
        .into_values()
        .map(|events| {
            let state = state.clone();
            tokio::spawn(async move {
                for event in &events {
                    grubot_core::handlers::handle_event(&state, event).await;
                }
            })
        })
        .collect()
}
