use grubot_messenger::{format, templates};
use grubot_models::User;

use super::notify;
use crate::error::CoreError;
use crate::{polls, AppState};

pub(super) async fn show(app: &AppState, sender_id: &str, poll_id: i64) -> Result<(), CoreError> {
    let poll = polls::get_poll(&app.db, poll_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    let tally = polls::tally(&app.db, poll_id).await?;
    notify(app, &format::poll_card(sender_id, &poll, &tally)).await;
    Ok(())
}

pub(super) async fn delete(app: &AppState, sender_id: &str, poll_id: i64) -> Result<(), CoreError> {
    polls::remove_poll(&app.db, poll_id).await?;
    notify(app, &templates::text(sender_id, "The poll has been deleted.")).await;
    Ok(())
}

pub(super) async fn vote(
    app: &AppState,
    user: &User,
    poll_id: i64,
    choice_id: i64,
) -> Result<(), CoreError> {
    let poll = polls::get_poll(&app.db, poll_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    polls::add_vote(&app.db, poll_id, choice_id, &user.id).await?;
    tracing::info!(user_id = %user.id, poll_id, choice_id, "vote recorded");

    let tally = polls::tally(&app.db, poll_id).await?;
    let summary = format!(
        "Your vote has been counted.\n{}",
        format::tally_summary(&poll, &tally)
    );
    notify(app, &templates::text(&user.id, summary)).await;
    Ok(())
}
