use grubot_db::DbError;
use grubot_messenger::MessengerError;
use grubot_models::{ConversationState, PostbackError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("persistence failed: {0}")]
    Database(DbError),
    #[error("upstream call failed: {0}")]
    Upstream(#[from] MessengerError),
    #[error("user is already registered")]
    AlreadyRegistered,
    #[error("user is not registered")]
    NotRegistered,
    #[error("not found")]
    NotFound,
    #[error("invalid postback: {0}")]
    InvalidPostback(String),
    #[error("state of {user_id} reads back as {actual}, expected {expected}")]
    StateConsistencyMismatch {
        user_id: String,
        expected: ConversationState,
        actual: ConversationState,
    },
}

impl From<DbError> for CoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound => CoreError::NotFound,
            other => CoreError::Database(other),
        }
    }
}

impl From<PostbackError> for CoreError {
    fn from(e: PostbackError) -> Self {
        CoreError::InvalidPostback(e.to_string())
    }
}

impl CoreError {
    /// Short text sent back to the subscriber, if the error is theirs to see.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            CoreError::AlreadyRegistered => Some("You are already subscribed to a channel."),
            CoreError::NotRegistered => Some(
                "You are not subscribed to any channels. Please subscribe before sending a message.",
            ),
            CoreError::NotFound => Some("That item no longer exists."),
            CoreError::InvalidPostback(_) => Some("Sorry, I didn't understand that."),
            _ => None,
        }
    }
}
