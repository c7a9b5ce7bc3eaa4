//! Domain data rendered into Send API requests.

use grubot_models::{ChoiceTally, Poll, Post, Postback};

use crate::send::{Button, Element, ListStyle, QuickReply, SendRequest};
use crate::templates::{self, MAX_BUTTONS, MAX_GENERIC_ELEMENTS};

const MAX_BUTTON_TITLE: usize = 20;

pub const NO_POSTS: &str = "There are no posts yet.";
pub const NO_POLLS: &str = "There are no polls yet.";
pub const PROMPT_POST: &str = "What would you like to post to the channel?";
pub const PROMPT_QUESTION: &str = "What question would you like to ask?";
pub const PROMPT_CHOICE: &str = "Send me a choice for your poll.";
pub const PROMPT_CONTINUE: &str = "Add another choice or publish the poll?";

pub fn post_list(recipient_id: &str, posts: &[Post]) -> SendRequest {
    let elements = posts
        .iter()
        .map(|post| {
            Element::new(&post.text)
                .subtitle(&post.owner)
                .button(Button::postback(
                    "Delete",
                    &Postback::DeletePost { post_id: post.id },
                ))
        })
        .collect();
    templates::list(recipient_id, ListStyle::Compact, elements, NO_POSTS)
}

pub fn poll_list(recipient_id: &str, polls: &[Poll]) -> SendRequest {
    let elements = polls
        .iter()
        .map(|poll| {
            Element::new(&poll.text)
                .subtitle(format!("Asked by {}", poll.owner))
                .button(Button::postback(
                    "View",
                    &Postback::ViewPoll { poll_id: poll.id },
                ))
        })
        .collect();
    templates::list(recipient_id, ListStyle::Compact, elements, NO_POLLS)
}

/// A poll as a carousel: the first bubble offers deletion, and each bubble
/// after it offers up to three vote buttons.
pub fn poll_card(recipient_id: &str, poll: &Poll, tally: &[ChoiceTally]) -> SendRequest {
    if tally.is_empty() {
        return templates::text(recipient_id, format!("\"{}\" has no choices yet.", poll.text));
    }

    let delete = Element::new(&poll.text)
        .subtitle(format!("Asked by {}", poll.owner))
        .button(Button::postback(
            "Delete poll",
            &Postback::DeletePoll { poll_id: poll.id },
        ));
    let votes = tally
        .chunks(MAX_BUTTONS)
        .take(MAX_GENERIC_ELEMENTS - 1)
        .map(|chunk| {
            let subtitle = chunk
                .iter()
                .map(|t| format!("{} ({})", t.choice.text, t.votes))
                .collect::<Vec<_>>()
                .join(", ");
            chunk.iter().fold(
                Element::new(&poll.text).subtitle(subtitle),
                |element, t| {
                    element.button(Button::postback(
                        button_title(&t.choice.text),
                        &Postback::Vote {
                            poll_id: poll.id,
                            choice_id: t.choice.id,
                        },
                    ))
                },
            )
        });
    let elements = std::iter::once(delete).chain(votes).collect();
    templates::generic(recipient_id, elements)
}

pub fn post_success(recipient_id: &str) -> SendRequest {
    templates::button(
        recipient_id,
        "Your message has been posted.",
        vec![Button::postback("View posts", &Postback::ViewPosts)],
    )
}

pub fn help(recipient_id: &str) -> SendRequest {
    templates::button(
        recipient_id,
        "Send \"pin post\", \"start poll\", \"view posts\", \"view polls\" or \
         \"unsubscribe\". Anything else is shared with the channel.",
        vec![
            Button::postback("Pin post", &Postback::PinPost),
            Button::postback("Start poll", &Postback::StartPoll),
            Button::postback("View polls", &Postback::ViewPolls),
        ],
    )
}

pub fn continue_prompt(recipient_id: &str) -> SendRequest {
    templates::quick_replies(
        recipient_id,
        PROMPT_CONTINUE,
        vec![
            QuickReply::text("Another one", &Postback::AnotherChoice),
            QuickReply::text("Publish poll", &Postback::PublishPoll),
        ],
    )
}

pub fn tally_summary(poll: &Poll, tally: &[ChoiceTally]) -> String {
    let lines = tally
        .iter()
        .map(|t| {
            let noun = if t.votes == 1 { "vote" } else { "votes" };
            format!("{}: {} {}", t.choice.text, t.votes, noun)
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n{}", poll.text, lines)
}

fn button_title(text: &str) -> String {
    if text.chars().count() <= MAX_BUTTON_TITLE {
        text.to_string()
    } else {
        let mut title: String = text.chars().take(MAX_BUTTON_TITLE - 1).collect();
        title.push('…');
        title
    }
}
