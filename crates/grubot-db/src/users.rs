use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};
use grubot_models::{ConversationState, User, UserProfile};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub conversation_state: String,
    pub first_name: String,
    pub last_name: String,
    pub timezone: Option<f64>,
    pub gender: Option<String>,
    pub building_poll_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn state(&self) -> Result<ConversationState, DbError> {
        self.conversation_state
            .parse::<ConversationState>()
            .map_err(|e| DbError::InvalidRow(e.to_string()))
    }

    pub fn into_user(self) -> Result<User, DbError> {
        let conversation_state = self.state()?;
        Ok(User {
            id: self.id,
            conversation_state,
            first_name: self.first_name,
            last_name: self.last_name,
            timezone: self.timezone,
            gender: self.gender,
            building_poll_id: self.building_poll_id,
            created_at: self.created_at,
        })
    }
}

const USER_COLUMNS: &str =
    "id, conversation_state, first_name, last_name, timezone, gender, building_poll_id, created_at";

pub async fn create_user(
    pool: &DbPool,
    id: &str,
    profile: &UserProfile,
) -> Result<UserRow, DbError> {
    let sql = format!(
        "INSERT INTO users (id, conversation_state, first_name, last_name, timezone, gender)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING {USER_COLUMNS}"
    );
    sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .bind(ConversationState::Default.as_str())
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.timezone)
        .bind(profile.gender.as_deref())
        .fetch_one(pool)
        .await
        .map_err(DbError::from_constraint)
}

pub async fn get_user(pool: &DbPool, id: &str) -> Result<Option<UserRow>, DbError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Returns whether a row was removed.
pub async fn delete_user(pool: &DbPool, id: &str) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Every subscriber except `exclude_id`.
pub async fn get_other_users(pool: &DbPool, exclude_id: &str) -> Result<Vec<UserRow>, DbError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id <> ?1 ORDER BY created_at, id");
    let rows = sqlx::query_as::<_, UserRow>(&sql)
        .bind(exclude_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn count_users(pool: &DbPool) -> Result<i64, DbError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Write the conversation state. `building_poll_id` is dropped unless the
/// new state is one that keeps a poll under construction.
pub async fn update_state(
    pool: &DbPool,
    id: &str,
    state: ConversationState,
    building_poll_id: Option<i64>,
) -> Result<UserRow, DbError> {
    let building_poll_id = building_poll_id.filter(|_| state.holds_building_poll());
    let sql = format!(
        "UPDATE users SET conversation_state = ?2, building_poll_id = ?3
         WHERE id = ?1
         RETURNING {USER_COLUMNS}"
    );
    sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .bind(state.as_str())
        .bind(building_poll_id)
        .fetch_optional(pool)
        .await
        .map_err(DbError::from_constraint)?
        .ok_or(DbError::NotFound)
}
