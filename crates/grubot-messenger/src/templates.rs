//! Builders for the message shapes the bot sends, with platform limits applied.

use crate::send::{
    Attachment, Button, Element, ListStyle, OutboundMessage, QuickReply, SendRequest,
    SenderAction, Template,
};

pub const MAX_BUTTONS: usize = 3;
pub const MAX_LIST_ELEMENTS: usize = 4;
pub const MAX_GENERIC_ELEMENTS: usize = 10;
pub const MAX_QUICK_REPLIES: usize = 13;

const METADATA: &str = "DEVELOPER_DEFINED_METADATA";

pub fn text(recipient_id: &str, text: impl Into<String>) -> SendRequest {
    SendRequest::message(
        recipient_id,
        OutboundMessage {
            text: Some(text.into()),
            metadata: Some(METADATA.to_string()),
            ..OutboundMessage::default()
        },
    )
}

pub fn attachment(recipient_id: &str, attachment: Attachment) -> SendRequest {
    SendRequest::message(
        recipient_id,
        OutboundMessage {
            attachment: Some(attachment),
            ..OutboundMessage::default()
        },
    )
}

pub fn sender_action(recipient_id: &str, action: SenderAction) -> SendRequest {
    SendRequest::action(recipient_id, action)
}

pub fn button(recipient_id: &str, text: impl Into<String>, buttons: Vec<Button>) -> SendRequest {
    template(
        recipient_id,
        Template::Button {
            text: text.into(),
            buttons: cap(buttons, MAX_BUTTONS, "button template buttons"),
        },
    )
}

pub fn generic(recipient_id: &str, elements: Vec<Element>) -> SendRequest {
    let elements = cap(elements, MAX_GENERIC_ELEMENTS, "generic template elements")
        .into_iter()
        .map(cap_element_buttons)
        .collect();
    template(recipient_id, Template::Generic { elements })
}

/// List template over `elements` (oldest first).
///
/// - no elements: a plain text message with `empty_text`
/// - one element: a single generic bubble, since lists need at least two
/// - more than [`MAX_LIST_ELEMENTS`]: only the most recent ones, order kept
pub fn list(
    recipient_id: &str,
    style: ListStyle,
    elements: Vec<Element>,
    empty_text: &str,
) -> SendRequest {
    match elements.len() {
        0 => text(recipient_id, empty_text),
        1 => generic(recipient_id, elements),
        len => {
            let skip = len.saturating_sub(MAX_LIST_ELEMENTS);
            let elements = elements
                .into_iter()
                .skip(skip)
                .map(|mut element| {
                    // List rows carry at most one button.
                    element.buttons.truncate(1);
                    element
                })
                .collect();
            template(
                recipient_id,
                Template::List {
                    top_element_style: style,
                    elements,
                },
            )
        }
    }
}

pub fn quick_replies(
    recipient_id: &str,
    text: impl Into<String>,
    replies: Vec<QuickReply>,
) -> SendRequest {
    SendRequest::message(
        recipient_id,
        OutboundMessage {
            text: Some(text.into()),
            quick_replies: cap(replies, MAX_QUICK_REPLIES, "quick replies"),
            ..OutboundMessage::default()
        },
    )
}

fn template(recipient_id: &str, template: Template) -> SendRequest {
    attachment(recipient_id, Attachment::Template(template))
}

fn cap_element_buttons(mut element: Element) -> Element {
    element.buttons = cap(element.buttons, MAX_BUTTONS, "element buttons");
    element
}

fn cap<T>(mut items: Vec<T>, max: usize, what: &str) -> Vec<T> {
    if items.len() > max {
        tracing::warn!(what, count = items.len(), max, "truncating to platform limit");
        items.truncate(max);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use grubot_models::Postback;

    fn post_elements(n: usize) -> Vec<Element> {
        (1..=n)
            .map(|i| {
                Element::new(format!("post {i}")).button(Button::postback(
                    "Delete",
                    &Postback::DeletePost { post_id: i as i64 },
                ))
            })
            .collect()
    }

    fn titles(request: &SendRequest) -> Vec<String> {
        match request.template() {
            Some(Template::List { elements, .. }) | Some(Template::Generic { elements }) => {
                elements.iter().map(|e| e.title.clone()).collect()
            }
            other => panic!("not a list or generic template: {other:?}"),
        }
    }

    #[test]
    fn compact_list_keeps_the_last_four_in_order() {
        let request = list("u", ListStyle::Compact, post_elements(5), "none");
        assert!(matches!(
            request.template(),
            Some(Template::List {
                top_element_style: ListStyle::Compact,
                ..
            })
        ));
        assert_eq!(titles(&request), ["post 2", "post 3", "post 4", "post 5"]);
    }

    #[test]
    fn short_lists_are_not_truncated() {
        let request = list("u", ListStyle::Compact, post_elements(3), "none");
        assert_eq!(titles(&request), ["post 1", "post 2", "post 3"]);
    }

    #[test]
    fn single_item_becomes_a_generic_bubble() {
        let request = list("u", ListStyle::Compact, post_elements(1), "none");
        assert!(matches!(request.template(), Some(Template::Generic { .. })));
        assert_eq!(titles(&request), ["post 1"]);
    }

    #[test]
    fn empty_list_is_a_text_message() {
        let request = list("u", ListStyle::Large, Vec::new(), "There are no posts yet.");
        assert_eq!(request.text(), Some("There are no posts yet."));
        assert!(request.template().is_none());
    }

    #[test]
    fn button_template_is_capped_at_three() {
        let buttons = (0..5)
            .map(|_| Button::postback("Help", &Postback::Help))
            .collect();
        let request = button("u", "pick", buttons);
        match request.template() {
            Some(Template::Button { buttons, .. }) => assert_eq!(buttons.len(), MAX_BUTTONS),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn quick_replies_are_capped() {
        let replies = (0..20)
            .map(|i| QuickReply::text(format!("r{i}"), &Postback::Help))
            .collect();
        let request = quick_replies("u", "pick", replies);
        assert_eq!(
            request.message.as_ref().unwrap().quick_replies.len(),
            MAX_QUICK_REPLIES
        );
    }
}
