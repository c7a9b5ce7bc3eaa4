//! Inbound Messenger Platform webhook payloads.
//!
//! A delivery is a batch of page entries, each carrying a batch of messaging
//! events. Events stay raw JSON until [`PageEntry::events`] parses them one
//! at a time, so one malformed event cannot sink the rest of the batch.
//! Exactly one of the optional event fields is set on a well-formed event;
//! [`MessagingEvent::kind`] classifies it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookBody {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<PageEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub messaging: Vec<Value>,
}

impl PageEntry {
    /// Parse each raw event independently, in delivery order.
    pub fn events(self) -> impl Iterator<Item = Result<MessagingEvent, serde_json::Error>> {
        self.messaging.into_iter().map(serde_json::from_value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagingEvent {
    pub sender: Party,
    pub recipient: Party,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub optin: Option<Optin>,
    #[serde(default)]
    pub message: Option<InboundMessage>,
    #[serde(default)]
    pub delivery: Option<Delivery>,
    #[serde(default)]
    pub postback: Option<PostbackEvent>,
    #[serde(default)]
    pub read: Option<Read>,
    #[serde(default)]
    pub account_linking: Option<AccountLinking>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Optin {
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub mid: Option<String>,
    #[serde(default)]
    pub is_echo: bool,
    #[serde(default)]
    pub app_id: Option<i64>,
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<InboundAttachment>,
    #[serde(default)]
    pub quick_reply: Option<QuickReplyEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundAttachment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuickReplyEvent {
    pub payload: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Delivery {
    #[serde(default)]
    pub mids: Vec<String>,
    #[serde(default)]
    pub watermark: Option<i64>,
    #[serde(default)]
    pub seq: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostbackEvent {
    #[serde(default)]
    pub title: Option<String>,
    pub payload: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Read {
    #[serde(default)]
    pub watermark: Option<i64>,
    #[serde(default)]
    pub seq: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountLinking {
    pub status: String,
    #[serde(default)]
    pub authorization_code: Option<String>,
}

/// Classified view over a [`MessagingEvent`].
#[derive(Debug, Clone, Copy)]
pub enum EventKind<'a> {
    Optin(&'a Optin),
    Message(MessageKind<'a>),
    Delivery(&'a Delivery),
    Postback(&'a PostbackEvent),
    Read(&'a Read),
    AccountLinking(&'a AccountLinking),
    Unknown,
}

#[derive(Debug, Clone, Copy)]
pub enum MessageKind<'a> {
    Echo(&'a InboundMessage),
    QuickReply {
        payload: &'a str,
        text: Option<&'a str>,
    },
    Text(&'a str),
    Attachments(&'a [InboundAttachment]),
    Empty,
}

impl MessagingEvent {
    pub fn kind(&self) -> EventKind<'_> {
        if let Some(optin) = &self.optin {
            EventKind::Optin(optin)
        } else if let Some(message) = &self.message {
            EventKind::Message(message.kind())
        } else if let Some(delivery) = &self.delivery {
            EventKind::Delivery(delivery)
        } else if let Some(postback) = &self.postback {
            EventKind::Postback(postback)
        } else if let Some(read) = &self.read {
            EventKind::Read(read)
        } else if let Some(linking) = &self.account_linking {
            EventKind::AccountLinking(linking)
        } else {
            EventKind::Unknown
        }
    }
}

impl InboundMessage {
    pub fn kind(&self) -> MessageKind<'_> {
        if self.is_echo {
            return MessageKind::Echo(self);
        }
        if let Some(quick_reply) = &self.quick_reply {
            return MessageKind::QuickReply {
                payload: &quick_reply.payload,
                text: self.text.as_deref(),
            };
        }
        // Text and attachments are mutually exclusive on the platform.
        match (&self.text, self.attachments.is_empty()) {
            (Some(text), _) => MessageKind::Text(text),
            (None, false) => MessageKind::Attachments(&self.attachments),
            (None, true) => MessageKind::Empty,
        }
    }
}
