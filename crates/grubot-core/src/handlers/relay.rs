use grubot_messenger::send::Attachment;
use grubot_messenger::templates;
use grubot_models::webhook::InboundAttachment;
use grubot_models::User;

use super::broadcast;
use crate::error::CoreError;
use crate::AppState;

/// Share a chat line with the rest of the channel as `"<name>: <text>"`.
pub(super) async fn text(app: &AppState, user: &User, text: &str) -> Result<(), CoreError> {
    let line = format!("{}: {}", user.name(), text);
    broadcast(app, &user.id, |other| vec![templates::text(&other.id, &line)]).await?;
    Ok(())
}

/// Share attachments: a `"<name>:"` header, then each attachment that can be re-sent.
pub(super) async fn attachments(
    app: &AppState,
    user: &User,
    attachments: &[InboundAttachment],
) -> Result<(), CoreError> {
    let relayable: Vec<Attachment> = attachments
        .iter()
        .filter_map(|a| {
            let relayed = Attachment::relay(&a.kind, &a.payload);
            if relayed.is_none() {
                tracing::debug!(user_id = %user.id, kind = %a.kind, "attachment not relayable");
            }
            relayed
        })
        .collect();
    if relayable.is_empty() {
        return Ok(());
    }

    let header = format!("{}:", user.name());
    broadcast(app, &user.id, |other| {
        std::iter::once(templates::text(&other.id, &header))
            .chain(
                relayable
                    .iter()
                    .map(|a| templates::attachment(&other.id, a.clone())),
            )
            .collect()
    })
    .await?;
    Ok(())
}
