//! Send API request bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
}

/// One call to `/me/messages`: either a message or a sender action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendRequest {
    pub recipient: Recipient,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<OutboundMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_action: Option<SenderAction>,
}

impl SendRequest {
    pub fn message(recipient_id: &str, message: OutboundMessage) -> Self {
        Self {
            recipient: Recipient {
                id: recipient_id.to_string(),
            },
            message: Some(message),
            sender_action: None,
        }
    }

    pub fn action(recipient_id: &str, action: SenderAction) -> Self {
        Self {
            recipient: Recipient {
                id: recipient_id.to_string(),
            },
            message: None,
            sender_action: Some(action),
        }
    }

    pub fn recipient_id(&self) -> &str {
        &self.recipient.id
    }

    /// Plain text of the message, if it is a text or quick-reply message.
    pub fn text(&self) -> Option<&str> {
        self.message.as_ref()?.text.as_deref()
    }

    pub fn template(&self) -> Option<&Template> {
        match self.message.as_ref()?.attachment.as_ref()? {
            Attachment::Template(template) => Some(template),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutboundMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quick_replies: Vec<QuickReply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderAction {
    MarkSeen,
    TypingOn,
    TypingOff,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum Attachment {
    Template(Template),
    Image(MediaPayload),
    Audio(MediaPayload),
    Video(MediaPayload),
    File(MediaPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaPayload {
    pub url: String,
}

impl Attachment {
    /// Rebuild an inbound attachment for relaying. Only URL-backed media can
    /// be re-sent; sticker metadata is dropped and only the image URL kept.
    pub fn relay(kind: &str, payload: &Value) -> Option<Self> {
        let url = payload.get("url")?.as_str()?.to_string();
        let media = MediaPayload { url };
        match kind {
            "image" => Some(Attachment::Image(media)),
            "audio" => Some(Attachment::Audio(media)),
            "video" => Some(Attachment::Video(media)),
            "file" => Some(Attachment::File(media)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "template_type", rename_all = "lowercase")]
pub enum Template {
    Button {
        text: String,
        buttons: Vec<Button>,
    },
    List {
        top_element_style: ListStyle,
        elements: Vec<Element>,
    },
    Generic {
        elements: Vec<Element>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    Compact,
    Large,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

impl Element {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            buttons: Vec::new(),
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn button(mut self, button: Button) -> Self {
        self.buttons.push(button);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Button {
    Postback { title: String, payload: String },
}

impl Button {
    pub fn postback(title: impl Into<String>, payload: &grubot_models::Postback) -> Self {
        Button::Postback {
            title: title.into(),
            payload: payload.to_payload(),
        }
    }

    pub fn payload(&self) -> &str {
        match self {
            Button::Postback { payload, .. } => payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "content_type", rename_all = "snake_case")]
pub enum QuickReply {
    Text { title: String, payload: String },
}

impl QuickReply {
    pub fn text(title: impl Into<String>, payload: &grubot_models::Postback) -> Self {
        QuickReply::Text {
            title: title.into(),
            payload: payload.to_payload(),
        }
    }
}

/// Successful Send API response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use grubot_models::Postback;
    use serde_json::json;

    #[test]
    fn button_template_wire_shape() {
        let request = SendRequest::message(
            "42",
            OutboundMessage {
                attachment: Some(Attachment::Template(Template::Button {
                    text: "Your message has been posted.".into(),
                    buttons: vec![Button::postback("View posts", &Postback::ViewPosts)],
                })),
                ..OutboundMessage::default()
            },
        );
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "recipient": {"id": "42"},
                "message": {
                    "attachment": {
                        "type": "template",
                        "payload": {
                            "template_type": "button",
                            "text": "Your message has been posted.",
                            "buttons": [{
                                "type": "postback",
                                "title": "View posts",
                                "payload": "{\"type\":\"VIEW_POSTS\"}"
                            }]
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn sender_action_wire_shape() {
        let request = SendRequest::action("42", SenderAction::MarkSeen);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"recipient": {"id": "42"}, "sender_action": "mark_seen"})
        );
    }

    #[test]
    fn quick_replies_carry_content_type() {
        let reply = QuickReply::text("Publish poll", &Postback::PublishPoll);
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({
                "content_type": "text",
                "title": "Publish poll",
                "payload": "{\"type\":\"PUBLISH_POLL\"}"
            })
        );
    }

    #[test]
    fn relay_keeps_only_the_url() {
        let sticker = json!({"url": "https://cdn/sticker.png", "sticker_id": 369239263222822_u64});
        let relayed = Attachment::relay("image", &sticker).unwrap();
        assert_eq!(
            serde_json::to_value(&relayed).unwrap(),
            json!({"type": "image", "payload": {"url": "https://cdn/sticker.png"}})
        );
        assert!(Attachment::relay("location", &json!({"coordinates": {}})).is_none());
    }
}
