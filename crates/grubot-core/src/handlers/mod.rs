//! Inbound event handling.
//!
//! [`handle_event`] is the entry point for one classified messaging event.
//! It never fails: errors are logged, and the ones meant for the subscriber
//! are answered with a short notice.

mod polls;
mod relay;
mod subscription;
mod workflow;

use std::future::Future;

use grubot_messenger::send::SenderAction;
use grubot_messenger::{templates, SendRequest};
use grubot_models::webhook::{EventKind, MessageKind, MessagingEvent};
use grubot_models::{Postback, User};

use crate::conversation::{Input, Keyword};
use crate::error::CoreError;
use crate::{directory, AppState};

pub use subscription::{subscribe, unsubscribe, GREETING};

pub async fn handle_event(app: &AppState, event: &MessagingEvent) {
    let sender_id = event.sender.id.as_str();
    match event.kind() {
        EventKind::Message(MessageKind::Echo(message)) => {
            tracing::debug!(
                message_id = message.mid.as_deref().unwrap_or_default(),
                app_id = ?message.app_id,
                metadata = message.metadata.as_deref().unwrap_or_default(),
                "echo received"
            );
        }
        EventKind::Message(MessageKind::Empty) => {
            tracing::debug!(sender_id, "message without content ignored");
        }
        EventKind::Message(kind) => {
            serialized(app, sender_id, handle_message(app, sender_id, kind)).await;
        }
        EventKind::Postback(postback) => {
            tracing::info!(
                sender_id,
                title = postback.title.as_deref().unwrap_or_default(),
                "postback received"
            );
            let payload = postback.payload.as_str();
            serialized(app, sender_id, handle_postback(app, sender_id, payload)).await;
        }
        EventKind::Optin(optin) => {
            tracing::info!(
                sender_id,
                reference = optin.reference.as_deref().unwrap_or_default(),
                "authentication received"
            );
            notify(app, &templates::text(sender_id, "Authentication successful")).await;
        }
        EventKind::Delivery(delivery) => {
            tracing::debug!(
                sender_id,
                delivered = delivery.mids.len(),
                watermark = ?delivery.watermark,
                "delivery confirmed"
            );
        }
        EventKind::Read(read) => {
            tracing::debug!(sender_id, watermark = ?read.watermark, "messages read");
        }
        EventKind::AccountLinking(linking) => {
            tracing::info!(
                sender_id,
                status = linking.status.as_str(),
                authorization_code = linking.authorization_code.as_deref().unwrap_or_default(),
                "account linking"
            );
        }
        EventKind::Unknown => {
            tracing::warn!(sender_id, "unknown messaging event dropped");
        }
    }
}

/// Run `work` holding the sender's lock, then report any error.
async fn serialized(
    app: &AppState,
    sender_id: &str,
    work: impl Future<Output = Result<(), CoreError>>,
) {
    let guard = app.locks.acquire(sender_id).await;
    let result = work.await;
    drop(guard);
    app.locks.forget(sender_id);

    if let Err(e) = result {
        report(app, sender_id, &e).await;
    }
}

async fn report(app: &AppState, sender_id: &str, error: &CoreError) {
    match error.notice() {
        Some(notice) => {
            tracing::info!(sender_id, error = %error, "answering with notice");
            notify(app, &templates::text(sender_id, notice)).await;
        }
        None => tracing::warn!(sender_id, error = %error, "event handling failed"),
    }
}

async fn handle_message(
    app: &AppState,
    sender_id: &str,
    kind: MessageKind<'_>,
) -> Result<(), CoreError> {
    notify(app, &templates::sender_action(sender_id, SenderAction::MarkSeen)).await;
    let user = directory::find(&app.db, sender_id).await?;

    match kind {
        MessageKind::QuickReply { payload, text } => match Postback::parse(payload) {
            Ok(postback) => on_postback(app, sender_id, user, postback).await,
            Err(e) => match text {
                Some(text) => {
                    tracing::debug!(sender_id, error = %e, "quick reply payload unreadable, using its text");
                    on_text(app, sender_id, user, text).await
                }
                None => Err(e.into()),
            },
        },
        MessageKind::Text(text) => on_text(app, sender_id, user, text).await,
        MessageKind::Attachments(attachments) => {
            let user = user.ok_or(CoreError::NotRegistered)?;
            workflow::run(app, &user, Input::NonText, attachments).await
        }
        MessageKind::Echo(_) | MessageKind::Empty => Ok(()),
    }
}

async fn on_text(
    app: &AppState,
    sender_id: &str,
    user: Option<User>,
    text: &str,
) -> Result<(), CoreError> {
    match user {
        Some(user) => workflow::run(app, &user, Input::Text(text), &[]).await,
        None if Keyword::parse(text) == Some(Keyword::Subscribe) => {
            subscribe(app, sender_id).await.map(|_| ())
        }
        None => Err(CoreError::NotRegistered),
    }
}

async fn handle_postback(app: &AppState, sender_id: &str, payload: &str) -> Result<(), CoreError> {
    let postback = Postback::parse(payload)?;
    let user = directory::find(&app.db, sender_id).await?;
    on_postback(app, sender_id, user, postback).await
}

async fn on_postback(
    app: &AppState,
    sender_id: &str,
    user: Option<User>,
    postback: Postback,
) -> Result<(), CoreError> {
    if postback == Postback::NewUser {
        return subscription::welcome(app, sender_id, user).await;
    }
    let user = user.ok_or(CoreError::NotRegistered)?;

    if let Some(keyword) = Keyword::from_postback(&postback) {
        return workflow::run(app, &user, Input::Tapped(keyword), &[]).await;
    }
    match postback {
        Postback::DeletePost { post_id } => {
            crate::posts::remove_post(&app.db, post_id).await?;
            notify(app, &templates::text(sender_id, "The post has been deleted.")).await;
            Ok(())
        }
        Postback::ViewPoll { poll_id } => polls::show(app, sender_id, poll_id).await,
        Postback::DeletePoll { poll_id } => polls::delete(app, sender_id, poll_id).await,
        Postback::Vote { poll_id, choice_id } => {
            polls::vote(app, &user, poll_id, choice_id).await
        }
        other => {
            tracing::debug!(sender_id, postback = ?other, "postback needs no action");
            Ok(())
        }
    }
}

/// Deliver one request, logging a failed delivery. Returns whether it went out.
pub async fn notify(app: &AppState, request: &SendRequest) -> bool {
    match app.messenger.send(request).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(
                recipient_id = request.recipient_id(),
                error = %CoreError::from(e),
                "delivery failed"
            );
            false
        }
    }
}

/// Send one request per subscriber other than `sender_id`. A failed
/// delivery does not stop the loop. Returns how many went out.
pub async fn broadcast<F>(app: &AppState, sender_id: &str, build: F) -> Result<usize, CoreError>
where
    F: Fn(&User) -> Vec<SendRequest>,
{
    let audience = directory::list_others(&app.db, sender_id).await?;
    let mut delivered = 0;
    for user in &audience {
        for request in build(user) {
            if !notify(app, &request).await {
                break;
            }
            delivered += 1;
        }
    }
    tracing::debug!(sender_id, audience = audience.len(), delivered, "broadcast done");
    Ok(delivered)
}

#[cfg(test)]
mod tests;
