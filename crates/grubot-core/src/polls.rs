//! Polls, their choices and votes.

use grubot_db::polls as db;
use grubot_db::DbPool;
use grubot_models::{ChoiceTally, Poll, PollChoice, PollVote};

use crate::error::CoreError;

pub async fn add_poll(pool: &DbPool, owner: &str, question: &str) -> Result<Poll, CoreError> {
    Ok(db::create_poll(pool, owner, question).await?.into())
}

/// Removes the poll with its choices and votes.
pub async fn remove_poll(pool: &DbPool, id: i64) -> Result<(), CoreError> {
    db::delete_poll(pool, id).await?;
    tracing::info!(poll_id = id, "poll deleted");
    Ok(())
}

pub async fn get_poll(pool: &DbPool, id: i64) -> Result<Option<Poll>, CoreError> {
    Ok(db::get_poll(pool, id).await?.map(Poll::from))
}

pub async fn list_polls(pool: &DbPool) -> Result<Vec<Poll>, CoreError> {
    Ok(db::get_all_polls(pool)
        .await?
        .into_iter()
        .map(Poll::from)
        .collect())
}

/// Polls fit to show the channel: drafts still being built are left out.
pub async fn list_published_polls(pool: &DbPool) -> Result<Vec<Poll>, CoreError> {
    Ok(db::get_published_polls(pool)
        .await?
        .into_iter()
        .map(Poll::from)
        .collect())
}

pub async fn add_choice(pool: &DbPool, poll_id: i64, text: &str) -> Result<PollChoice, CoreError> {
    Ok(db::add_choice(pool, poll_id, text).await?.into())
}

pub async fn list_choices(pool: &DbPool, poll_id: i64) -> Result<Vec<PollChoice>, CoreError> {
    Ok(db::get_choices(pool, poll_id)
        .await?
        .into_iter()
        .map(PollChoice::from)
        .collect())
}

/// The same subscriber may vote any number of times.
pub async fn add_vote(
    pool: &DbPool,
    poll_id: i64,
    choice_id: i64,
    user_id: &str,
) -> Result<PollVote, CoreError> {
    Ok(db::add_vote(pool, poll_id, choice_id, user_id).await?.into())
}

pub async fn list_votes_for_poll(pool: &DbPool, poll_id: i64) -> Result<Vec<PollVote>, CoreError> {
    Ok(db::get_poll_votes(pool, poll_id)
        .await?
        .into_iter()
        .map(PollVote::from)
        .collect())
}

pub async fn list_votes_for_choice(
    pool: &DbPool,
    choice_id: i64,
) -> Result<Vec<PollVote>, CoreError> {
    Ok(db::get_choice_votes(pool, choice_id)
        .await?
        .into_iter()
        .map(PollVote::from)
        .collect())
}

pub async fn tally(pool: &DbPool, poll_id: i64) -> Result<Vec<ChoiceTally>, CoreError> {
    Ok(db::get_tally(pool, poll_id)
        .await?
        .into_iter()
        .map(ChoiceTally::from)
        .collect())
}
