pub mod conversation;
pub mod poll;
pub mod post;
pub mod postback;
pub mod user;
pub mod webhook;

pub use conversation::ConversationState;
pub use poll::{ChoiceTally, Poll, PollChoice, PollVote};
pub use post::Post;
pub use postback::{Postback, PostbackError};
pub use user::{User, UserProfile};
