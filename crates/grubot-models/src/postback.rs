use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Developer-defined payload carried by postback buttons and quick replies.
///
/// Serialized as a JSON object tagged by `type`, e.g.
/// `{"type":"DELETE_POST","postID":12}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Postback {
    NewUser,
    Help,
    PinPost,
    StartPoll,
    ViewPosts,
    DeletePost {
        #[serde(rename = "postID")]
        post_id: i64,
    },
    ViewPolls,
    ViewPoll {
        #[serde(rename = "pollID")]
        poll_id: i64,
    },
    DeletePoll {
        #[serde(rename = "pollID")]
        poll_id: i64,
    },
    Vote {
        #[serde(rename = "pollID")]
        poll_id: i64,
        #[serde(rename = "choiceID")]
        choice_id: i64,
    },
    AnotherChoice,
    PublishPoll,
}

#[derive(Debug, Error)]
pub enum PostbackError {
    #[error("postback payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl Postback {
    pub fn parse(payload: &str) -> Result<Self, PostbackError> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn to_payload(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
