//! Conversation state machine.
//!
//! [`transition`] is pure: it maps the subscriber's current state and one
//! input to the next state plus the effect the handlers must carry out. The
//! handlers persist `next` before anything is sent to the platform.

use grubot_models::{ConversationState, Postback};

use ConversationState as S;

/// Words the bot reacts to. Matching is trimmed and ASCII case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Subscribe,
    Unsubscribe,
    PinPost,
    StartPoll,
    ViewPosts,
    ViewPolls,
    Help,
    AnotherOne,
    PublishPoll,
    Cancel,
}

impl Keyword {
    const TABLE: [(&'static str, Keyword); 10] = [
        ("subscribe", Keyword::Subscribe),
        ("unsubscribe", Keyword::Unsubscribe),
        ("pin post", Keyword::PinPost),
        ("start poll", Keyword::StartPoll),
        ("view posts", Keyword::ViewPosts),
        ("view polls", Keyword::ViewPolls),
        ("help", Keyword::Help),
        ("another one", Keyword::AnotherOne),
        ("publish poll", Keyword::PublishPoll),
        ("cancel", Keyword::Cancel),
    ];

    pub fn parse(text: &str) -> Option<Keyword> {
        let text = text.trim();
        Self::TABLE
            .iter()
            .find(|(word, _)| word.eq_ignore_ascii_case(text))
            .map(|(_, keyword)| *keyword)
    }

    /// Postbacks that stand in for typing a keyword.
    pub fn from_postback(postback: &Postback) -> Option<Keyword> {
        match postback {
            Postback::PinPost => Some(Keyword::PinPost),
            Postback::StartPoll => Some(Keyword::StartPoll),
            Postback::ViewPosts => Some(Keyword::ViewPosts),
            Postback::ViewPolls => Some(Keyword::ViewPolls),
            Postback::Help => Some(Keyword::Help),
            Postback::AnotherChoice => Some(Keyword::AnotherOne),
            Postback::PublishPoll => Some(Keyword::PublishPoll),
            _ => None,
        }
    }

    fn is_read_only(self) -> bool {
        matches!(self, Keyword::ViewPosts | Keyword::ViewPolls | Keyword::Help)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    /// Free text typed by the subscriber.
    Text(&'a str),
    /// A button or quick reply standing in for a keyword.
    Tapped(Keyword),
    /// Attachments or anything else without text.
    NonText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect<'a> {
    PromptPost,
    CreatePost(&'a str),
    PromptQuestion,
    CreatePoll(&'a str),
    AddChoice(&'a str),
    PromptChoice,
    PublishPoll,
    /// Abandon the workflow, deleting any half-built poll.
    Cancel,
    /// Send the prompt of the (unchanged) current state again.
    Reprompt,
    ViewPosts,
    ViewPolls,
    Help,
    Unsubscribe,
    AlreadySubscribed,
    Relay(&'a str),
    RelayAttachments,
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<'a> {
    pub next: ConversationState,
    pub effect: Effect<'a>,
}

fn to(next: ConversationState, effect: Effect<'_>) -> Transition<'_> {
    Transition { next, effect }
}

pub fn transition<'a>(state: ConversationState, input: &Input<'a>) -> Transition<'a> {
    match *input {
        Input::Text(text) => on_text(state, text),
        Input::Tapped(keyword) => on_tap(state, keyword),
        Input::NonText if state == S::Default => to(S::Default, Effect::RelayAttachments),
        Input::NonText => to(state, Effect::Reprompt),
    }
}

fn on_text(state: ConversationState, text: &str) -> Transition<'_> {
    let keyword = Keyword::parse(text);
    if state.is_workflow() && keyword == Some(Keyword::Cancel) {
        return to(S::Default, Effect::Cancel);
    }
    match state {
        S::Default => keyword
            .and_then(on_default_keyword)
            .unwrap_or(to(S::Default, Effect::Relay(text))),
        S::Posting => to(S::Default, Effect::CreatePost(text)),
        S::PollInputQuestion => to(S::PollInputChoice, Effect::CreatePoll(text)),
        S::PollInputChoice => to(S::PollInputContinue, Effect::AddChoice(text)),
        S::PollInputContinue => on_continue(keyword),
    }
}

fn on_tap(state: ConversationState, keyword: Keyword) -> Transition<'static> {
    match state {
        S::Default => on_default_keyword(keyword).unwrap_or(to(S::Default, Effect::Nothing)),
        S::PollInputContinue => on_continue(Some(keyword)),
        _ if keyword.is_read_only() => {
            on_default_keyword(keyword).map_or(to(state, Effect::Reprompt), |t| to(state, t.effect))
        }
        _ => to(state, Effect::Reprompt),
    }
}

fn on_default_keyword(keyword: Keyword) -> Option<Transition<'static>> {
    let transition = match keyword {
        Keyword::PinPost => to(S::Posting, Effect::PromptPost),
        Keyword::StartPoll => to(S::PollInputQuestion, Effect::PromptQuestion),
        Keyword::ViewPosts => to(S::Default, Effect::ViewPosts),
        Keyword::ViewPolls => to(S::Default, Effect::ViewPolls),
        Keyword::Help => to(S::Default, Effect::Help),
        Keyword::Unsubscribe => to(S::Default, Effect::Unsubscribe),
        Keyword::Subscribe => to(S::Default, Effect::AlreadySubscribed),
        Keyword::AnotherOne | Keyword::PublishPoll | Keyword::Cancel => return None,
    };
    Some(transition)
}

fn on_continue(keyword: Option<Keyword>) -> Transition<'static> {
    match keyword {
        Some(Keyword::AnotherOne) => to(S::PollInputChoice, Effect::PromptChoice),
        Some(Keyword::PublishPoll) => to(S::Default, Effect::PublishPoll),
        Some(Keyword::Cancel) => to(S::Default, Effect::Cancel),
        Some(keyword) if keyword.is_read_only() => {
            on_default_keyword(keyword).map_or(to(S::PollInputContinue, Effect::Reprompt), |t| {
                to(S::PollInputContinue, t.effect)
            })
        }
        _ => to(S::PollInputContinue, Effect::Reprompt),
    }
}
