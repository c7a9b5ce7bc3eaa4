//! Subscriber directory.

use grubot_db::{users, DbError, DbPool};
use grubot_models::{ConversationState, User, UserProfile};

use crate::error::CoreError;

pub async fn register(pool: &DbPool, id: &str, profile: &UserProfile) -> Result<User, CoreError> {
    let row = users::create_user(pool, id, profile)
        .await
        .map_err(|e| match e {
            DbError::AlreadyExists => CoreError::AlreadyRegistered,
            other => CoreError::from(other),
        })?;
    tracing::info!(user_id = id, "subscriber registered");
    Ok(row.into_user()?)
}

pub async fn unregister(pool: &DbPool, id: &str) -> Result<(), CoreError> {
    if !users::delete_user(pool, id).await? {
        return Err(CoreError::NotRegistered);
    }
    tracing::info!(user_id = id, "subscriber removed");
    Ok(())
}

pub async fn find(pool: &DbPool, id: &str) -> Result<Option<User>, CoreError> {
    match users::get_user(pool, id).await? {
        Some(row) => Ok(Some(row.into_user()?)),
        None => Ok(None),
    }
}

/// Every subscriber except `exclude_id`.
pub async fn list_others(pool: &DbPool, exclude_id: &str) -> Result<Vec<User>, CoreError> {
    let rows = users::get_other_users(pool, exclude_id).await?;
    let mut others = Vec::with_capacity(rows.len());
    for row in rows {
        others.push(row.into_user()?);
    }
    Ok(others)
}

/// Persist a state change, then read it back. A read-back that disagrees
/// is logged and otherwise ignored.
pub async fn set_state(
    pool: &DbPool,
    id: &str,
    state: ConversationState,
    building_poll_id: Option<i64>,
) -> Result<User, CoreError> {
    users::update_state(pool, id, state, building_poll_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound => CoreError::NotRegistered,
            other => CoreError::from(other),
        })?;

    let user = find(pool, id).await?.ok_or(CoreError::NotRegistered)?;
    let expected_poll = building_poll_id.filter(|_| state.holds_building_poll());
    if user.conversation_state != state || user.building_poll_id != expected_poll {
        let mismatch = CoreError::StateConsistencyMismatch {
            user_id: id.to_string(),
            expected: state,
            actual: user.conversation_state,
        };
        tracing::warn!(
            error = %mismatch,
            expected_poll = ?expected_poll,
            actual_poll = ?user.building_poll_id,
            "state read-back differs"
        );
    } else {
        tracing::debug!(user_id = id, state = %state, "state updated");
    }
    Ok(user)
}

pub async fn count(pool: &DbPool) -> Result<i64, CoreError> {
    Ok(users::count_users(pool).await?)
}
