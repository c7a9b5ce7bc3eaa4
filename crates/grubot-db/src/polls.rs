use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};
use grubot_models::{ChoiceTally, Poll, PollChoice, PollVote};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PollRow {
    pub id: i64,
    pub owner: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChoiceRow {
    pub id: i64,
    pub poll_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VoteRow {
    pub id: i64,
    pub poll_id: i64,
    pub choice_id: i64,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TallyRow {
    pub id: i64,
    pub poll_id: i64,
    pub text: String,
    pub votes: i64,
}

impl From<PollRow> for Poll {
    fn from(row: PollRow) -> Self {
        Poll {
            id: row.id,
            owner: row.owner,
            text: row.text,
            created_at: row.created_at,
        }
    }
}

impl From<ChoiceRow> for PollChoice {
    fn from(row: ChoiceRow) -> Self {
        PollChoice {
            id: row.id,
            poll_id: row.poll_id,
            text: row.text,
        }
    }
}

impl From<VoteRow> for PollVote {
    fn from(row: VoteRow) -> Self {
        PollVote {
            id: row.id,
            poll_id: row.poll_id,
            choice_id: row.choice_id,
            user_id: row.user_id,
        }
    }
}

impl From<TallyRow> for ChoiceTally {
    fn from(row: TallyRow) -> Self {
        ChoiceTally {
            choice: PollChoice {
                id: row.id,
                poll_id: row.poll_id,
                text: row.text,
            },
            votes: row.votes,
        }
    }
}

pub async fn create_poll(pool: &DbPool, owner: &str, question: &str) -> Result<PollRow, DbError> {
    let row = sqlx::query_as::<_, PollRow>(
        "INSERT INTO polls (owner, text) VALUES (?1, ?2)
         RETURNING id, owner, text, created_at",
    )
    .bind(owner)
    .bind(question)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_poll(pool: &DbPool, id: i64) -> Result<Option<PollRow>, DbError> {
    let row = sqlx::query_as::<_, PollRow>(
        "SELECT id, owner, text, created_at FROM polls WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_all_polls(pool: &DbPool) -> Result<Vec<PollRow>, DbError> {
    let rows = sqlx::query_as::<_, PollRow>(
        "SELECT id, owner, text, created_at FROM polls ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Polls that no subscriber is still building.
pub async fn get_published_polls(pool: &DbPool) -> Result<Vec<PollRow>, DbError> {
    let rows = sqlx::query_as::<_, PollRow>(
        "SELECT id, owner, text, created_at FROM polls
         WHERE id NOT IN (
             SELECT building_poll_id FROM users WHERE building_poll_id IS NOT NULL
         )
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Deletes the poll together with its choices and votes.
pub async fn delete_poll(pool: &DbPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM polls WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Fails with `NotFound` when the poll does not exist.
pub async fn add_choice(pool: &DbPool, poll_id: i64, text: &str) -> Result<ChoiceRow, DbError> {
    sqlx::query_as::<_, ChoiceRow>(
        "INSERT INTO poll_choices (poll_id, text) VALUES (?1, ?2)
         RETURNING id, poll_id, text",
    )
    .bind(poll_id)
    .bind(text)
    .fetch_one(pool)
    .await
    .map_err(DbError::from_constraint)
}

pub async fn get_choices(pool: &DbPool, poll_id: i64) -> Result<Vec<ChoiceRow>, DbError> {
    let rows = sqlx::query_as::<_, ChoiceRow>(
        "SELECT id, poll_id, text FROM poll_choices WHERE poll_id = ?1 ORDER BY id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fails with `NotFound` unless `choice_id` belongs to `poll_id`.
pub async fn add_vote(
    pool: &DbPool,
    poll_id: i64,
    choice_id: i64,
    user_id: &str,
) -> Result<VoteRow, DbError> {
    sqlx::query_as::<_, VoteRow>(
        "INSERT INTO poll_votes (poll_id, choice_id, user_id) VALUES (?1, ?2, ?3)
         RETURNING id, poll_id, choice_id, user_id, created_at",
    )
    .bind(poll_id)
    .bind(choice_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(DbError::from_constraint)
}

pub async fn get_poll_votes(pool: &DbPool, poll_id: i64) -> Result<Vec<VoteRow>, DbError> {
    let rows = sqlx::query_as::<_, VoteRow>(
        "SELECT id, poll_id, choice_id, user_id, created_at
         FROM poll_votes WHERE poll_id = ?1 ORDER BY id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_choice_votes(pool: &DbPool, choice_id: i64) -> Result<Vec<VoteRow>, DbError> {
    let rows = sqlx::query_as::<_, VoteRow>(
        "SELECT id, poll_id, choice_id, user_id, created_at
         FROM poll_votes WHERE choice_id = ?1 ORDER BY id",
    )
    .bind(choice_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Every choice of the poll with its vote count, in creation order.
pub async fn get_tally(pool: &DbPool, poll_id: i64) -> Result<Vec<TallyRow>, DbError> {
    let rows = sqlx::query_as::<_, TallyRow>(
        "SELECT c.id, c.poll_id, c.text, COUNT(v.id) AS votes
         FROM poll_choices c
         LEFT JOIN poll_votes v ON v.choice_id = c.id
         WHERE c.poll_id = ?1
         GROUP BY c.id, c.poll_id, c.text
         ORDER BY c.id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
