pub mod conversation;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod locks;
pub mod polls;
pub mod posts;

use grubot_db::DbPool;
use grubot_messenger::Messenger;

pub use error::CoreError;
pub use locks::SubscriberLocks;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub messenger: Messenger,
    pub config: AppConfig,
    pub locks: SubscriberLocks,
}

impl AppState {
    pub fn new(db: DbPool, messenger: Messenger, config: AppConfig) -> Self {
        Self {
            db,
            messenger,
            config,
            locks: SubscriberLocks::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Key for the webhook signature HMAC.
    pub app_secret: String,
    /// Token the platform echoes back when verifying the webhook.
    pub validation_token: String,
    /// The public URL of this server, used in account-linking pages.
    pub server_url: String,
}
