pub mod client;
pub mod format;
pub mod outbox;
pub mod send;
pub mod templates;

use grubot_models::UserProfile;
use thiserror::Error;

pub use client::GraphClient;
pub use outbox::Outbox;
pub use send::{SendRequest, SendResponse, SenderAction};

pub const DEFAULT_GRAPH_API_URL: &str = "https://graph.facebook.com/v2.6";

#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("http error: {0}")]
    Http(String),
    #[error("graph api returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("decode error: {0}")]
    Decode(String),
}

/// Delivery and profile lookup against the messaging platform.
#[allow(async_fn_in_trait)]
pub trait MessengerBackend: Send + Sync {
    /// Deliver one message or sender action.
    async fn send(&self, request: &SendRequest) -> Result<SendResponse, MessengerError>;

    /// Look up the public profile of a subscriber.
    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, MessengerError>;
}

/// Enum-dispatch wrapper so the backend can be cloned into handler tasks.
#[derive(Debug, Clone)]
pub enum Messenger {
    Graph(GraphClient),
    Outbox(Outbox),
}

impl Messenger {
    pub async fn send(&self, request: &SendRequest) -> Result<SendResponse, MessengerError> {
        match self {
            Messenger::Graph(m) => m.send(request).await,
            Messenger::Outbox(m) => m.send(request).await,
        }
    }

    pub async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, MessengerError> {
        match self {
            Messenger::Graph(m) => m.fetch_profile(user_id).await,
            Messenger::Outbox(m) => m.fetch_profile(user_id).await,
        }
    }
}

impl From<GraphClient> for Messenger {
    fn from(client: GraphClient) -> Self {
        Messenger::Graph(client)
    }
}

impl From<Outbox> for Messenger {
    fn from(outbox: Outbox) -> Self {
        Messenger::Outbox(outbox)
    }
}
