use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use grubot_models::UserProfile;

use crate::send::{SendRequest, SendResponse};
use crate::{MessengerBackend, MessengerError};

#[derive(Debug, Default)]
struct OutboxInner {
    sent: Vec<SendRequest>,
    profiles: HashMap<String, UserProfile>,
    failing: HashSet<String>,
}

/// In-memory backend that records every request instead of delivering it.
///
/// Profiles are served from the ones registered with [`Outbox::with_profile`];
/// recipients marked with [`Outbox::fail_for`] get an API error.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    inner: Arc<Mutex<OutboxInner>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, user_id: &str, first_name: &str, last_name: &str) -> Self {
        self.lock().profiles.insert(
            user_id.to_string(),
            UserProfile {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                ..UserProfile::default()
            },
        );
        self
    }

    pub fn fail_for(&self, recipient_id: &str) {
        self.lock().failing.insert(recipient_id.to_string());
    }

    /// Every successfully recorded request, in send order.
    pub fn sent(&self) -> Vec<SendRequest> {
        self.lock().sent.clone()
    }

    pub fn sent_to(&self, recipient_id: &str) -> Vec<SendRequest> {
        self.lock()
            .sent
            .iter()
            .filter(|r| r.recipient_id() == recipient_id)
            .cloned()
            .collect()
    }

    /// Text bodies delivered to one recipient, skipping templates and actions.
    pub fn texts_to(&self, recipient_id: &str) -> Vec<String> {
        self.sent_to(recipient_id)
            .iter()
            .filter_map(|r| r.text().map(str::to_string))
            .collect()
    }

    pub fn clear(&self) {
        self.lock().sent.clear();
    }

    fn lock(&self) -> MutexGuard<'_, OutboxInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl MessengerBackend for Outbox {
    async fn send(&self, request: &SendRequest) -> Result<SendResponse, MessengerError> {
        let mut inner = self.lock();
        if inner.failing.contains(request.recipient_id()) {
            return Err(MessengerError::Api {
                status: 400,
                message: format!("recipient {} is unreachable", request.recipient_id()),
            });
        }
        inner.sent.push(request.clone());
        Ok(SendResponse {
            recipient_id: Some(request.recipient_id().to_string()),
            message_id: Some(format!("mid.{}", inner.sent.len())),
        })
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, MessengerError> {
        self.lock()
            .profiles
            .get(user_id)
            .cloned()
            .ok_or_else(|| MessengerError::Api {
                status: 404,
                message: format!("no profile for {user_id}"),
            })
    }
}
