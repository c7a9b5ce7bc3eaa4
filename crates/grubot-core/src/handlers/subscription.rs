use grubot_messenger::{format, templates};
use grubot_models::User;

use super::{broadcast, notify};
use crate::error::CoreError;
use crate::{directory, AppState};

pub const GREETING: &str = "Hi! I'm Grubot, your group chat assistant - What can I do for you?";

/// Register the sender with their platform profile and announce them.
pub async fn subscribe(app: &AppState, sender_id: &str) -> Result<User, CoreError> {
    if directory::find(&app.db, sender_id).await?.is_some() {
        return Err(CoreError::AlreadyRegistered);
    }
    let profile = app.messenger.fetch_profile(sender_id).await?;
    let user = directory::register(&app.db, sender_id, &profile).await?;

    notify(app, &templates::text(sender_id, "You have joined the channel.")).await;
    let joined = format!("{} has joined!", user.name());
    broadcast(app, sender_id, |other| vec![templates::text(&other.id, &joined)]).await?;
    Ok(user)
}

pub async fn unsubscribe(app: &AppState, user: &User) -> Result<(), CoreError> {
    directory::unregister(&app.db, &user.id).await?;

    notify(app, &templates::text(&user.id, "You have left the channel.")).await;
    let left = format!("{} left the channel.", user.name());
    broadcast(app, &user.id, |other| vec![templates::text(&other.id, &left)]).await?;
    Ok(())
}

/// "Get Started": subscribe a newcomer, then greet with the main actions.
pub(super) async fn welcome(
    app: &AppState,
    sender_id: &str,
    user: Option<User>,
) -> Result<(), CoreError> {
    if user.is_none() {
        subscribe(app, sender_id).await?;
    }
    notify(app, &templates::text(sender_id, GREETING)).await;
    notify(app, &format::help(sender_id)).await;
    Ok(())
}
