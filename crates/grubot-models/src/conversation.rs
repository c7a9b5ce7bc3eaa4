use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a subscriber currently is in a multi-turn workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationState {
    #[default]
    Default,
    Posting,
    PollInputQuestion,
    PollInputChoice,
    PollInputContinue,
}

impl ConversationState {
    pub const ALL: [ConversationState; 5] = [
        ConversationState::Default,
        ConversationState::Posting,
        ConversationState::PollInputQuestion,
        ConversationState::PollInputChoice,
        ConversationState::PollInputContinue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConversationState::Default => "DEFAULT",
            ConversationState::Posting => "POSTING",
            ConversationState::PollInputQuestion => "POLL_INPUT_QUESTION",
            ConversationState::PollInputChoice => "POLL_INPUT_CHOICE",
            ConversationState::PollInputContinue => "POLL_INPUT_CONTINUE",
        }
    }

    /// States in which the user has a half-built poll remembered.
    pub fn holds_building_poll(self) -> bool {
        matches!(
            self,
            ConversationState::PollInputChoice | ConversationState::PollInputContinue
        )
    }

    pub fn is_workflow(self) -> bool {
        self != ConversationState::Default
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown conversation state: {0}")]
pub struct UnknownState(pub String);

impl FromStr for ConversationState {
    type Err = UnknownState;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        ConversationState::ALL
            .into_iter()
            .find(|state| state.as_str() == raw)
            .ok_or_else(|| UnknownState(raw.to_string()))
    }
}
