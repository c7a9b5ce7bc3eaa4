use grubot_messenger::send::{Attachment, SenderAction, Template};
use grubot_messenger::{format, Outbox};
use grubot_models::webhook::MessagingEvent;
use grubot_models::{ConversationState, Postback, UserProfile};
use serde_json::{json, Value};

use super::handle_event;
use crate::testing;
use crate::{directory, polls, posts, AppState};

fn event(sender: &str, body: Value) -> MessagingEvent {
    let mut raw = json!({
        "sender": {"id": sender},
        "recipient": {"id": "page"},
        "timestamp": 1,
    });
    if let (Some(raw), Some(body)) = (raw.as_object_mut(), body.as_object()) {
        raw.extend(body.clone());
    }
    serde_json::from_value(raw).unwrap()
}

async fn say(app: &AppState, sender: &str, text: &str) {
    let ev = event(sender, json!({"message": {"mid": "m", "text": text}}));
    handle_event(app, &ev).await;
}

async fn tap(app: &AppState, sender: &str, postback: &Postback) {
    let ev = event(
        sender,
        json!({"postback": {"title": "tap", "payload": postback.to_payload()}}),
    );
    handle_event(app, &ev).await;
}

async fn join(app: &AppState, id: &str, first_name: &str) {
    let profile = UserProfile {
        first_name: first_name.to_string(),
        last_name: "Doe".to_string(),
        ..UserProfile::default()
    };
    directory::register(&app.db, id, &profile).await.unwrap();
}

async fn channel_of_three() -> (AppState, Outbox) {
    let (app, outbox) = testing::state(&[]).await;
    join(&app, "1", "A").await;
    join(&app, "2", "B").await;
    join(&app, "3", "C").await;
    (app, outbox)
}

async fn state_of(app: &AppState, id: &str) -> ConversationState {
    directory::find(&app.db, id)
        .await
        .unwrap()
        .unwrap()
        .conversation_state
}

#[tokio::test]
async fn pin_post_is_stored_and_broadcast() {
    let (app, outbox) = channel_of_three().await;

    say(&app, "1", "Pin post").await;
    assert_eq!(state_of(&app, "1").await, ConversationState::Posting);
    assert_eq!(outbox.texts_to("1"), [format::PROMPT_POST]);

    say(&app, "1", "Hello everyone").await;
    assert_eq!(state_of(&app, "1").await, ConversationState::Default);

    let stored = posts::list_posts(&app.db).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].owner, "A");
    assert_eq!(stored[0].text, "Hello everyone");

    for other in ["2", "3"] {
        assert_eq!(
            outbox.texts_to(other),
            ["A posted a message: Hello everyone"]
        );
    }
    let last = outbox.sent_to("1").pop().unwrap();
    assert!(matches!(last.template(), Some(Template::Button { text, .. }) if text == "Your message has been posted."));
}

#[tokio::test]
async fn poll_flow_ends_in_default_with_one_poll() {
    let (app, outbox) = channel_of_three().await;

    for input in ["start poll", "Lunch?", "Tacos", "Another one", "Ramen", "publish poll"] {
        say(&app, "1", input).await;
    }

    let user = directory::find(&app.db, "1").await.unwrap().unwrap();
    assert_eq!(user.conversation_state, ConversationState::Default);
    assert!(user.building_poll_id.is_none());

    let all = polls::list_polls(&app.db).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].text, "Lunch?");
    let choices = polls::list_choices(&app.db, all[0].id).await.unwrap();
    let texts: Vec<&str> = choices.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["Tacos", "Ramen"]);

    let received = outbox.sent_to("2");
    assert_eq!(received[0].text(), Some("A started a poll:"));
    assert!(matches!(received[1].template(), Some(Template::Generic { .. })));
}

#[tokio::test]
async fn continue_state_reprompts_on_other_text() {
    let (app, outbox) = channel_of_three().await;
    for input in ["start poll", "Lunch?", "Tacos"] {
        say(&app, "1", input).await;
    }
    outbox.clear();

    say(&app, "1", "Sushi").await;
    assert_eq!(state_of(&app, "1").await, ConversationState::PollInputContinue);
    assert_eq!(outbox.texts_to("1"), [format::PROMPT_CONTINUE]);
    let poll = &polls::list_polls(&app.db).await.unwrap()[0];
    assert_eq!(polls::list_choices(&app.db, poll.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn cancel_discards_the_half_built_poll() {
    let (app, outbox) = channel_of_three().await;
    for input in ["start poll", "Lunch?", "Tacos", "cancel"] {
        say(&app, "1", input).await;
    }

    let user = directory::find(&app.db, "1").await.unwrap().unwrap();
    assert_eq!(user.conversation_state, ConversationState::Default);
    assert!(user.building_poll_id.is_none());
    assert!(polls::list_polls(&app.db).await.unwrap().is_empty());
    assert!(outbox.sent_to("2").is_empty());
}

#[tokio::test]
async fn view_polls_hides_drafts_until_published() {
    let (app, outbox) = channel_of_three().await;
    for input in ["start poll", "Lunch?", "Tacos"] {
        say(&app, "1", input).await;
    }

    tap(&app, "2", &Postback::ViewPolls).await;
    assert_eq!(outbox.texts_to("2"), [format::NO_POLLS]);

    say(&app, "1", "publish poll").await;
    outbox.clear();
    tap(&app, "2", &Postback::ViewPolls).await;
    let sent = outbox.sent_to("2");
    assert_eq!(sent.len(), 3);
    assert!(matches!(sent[1].template(), Some(Template::Generic { .. })));
    assert_eq!(polls::list_published_polls(&app.db).await.unwrap().len(), 1);
}

#[tokio::test]
async fn subscribe_registers_and_announces() {
    let (app, outbox) = testing::state(&[("9", "Ada", "Lovelace")]).await;
    join(&app, "1", "A").await;

    say(&app, "9", "Subscribe").await;
    assert!(directory::find(&app.db, "9").await.unwrap().is_some());
    assert_eq!(outbox.texts_to("9"), ["You have joined the channel."]);
    assert_eq!(outbox.texts_to("1"), ["Ada Lovelace has joined!"]);

    say(&app, "9", "subscribe").await;
    assert_eq!(
        outbox.texts_to("9").last().map(String::as_str),
        Some("You are already subscribed to a channel.")
    );
    assert_eq!(directory::count(&app.db).await.unwrap(), 2);
}

#[tokio::test]
async fn subscribe_without_profile_registers_nobody() {
    let (app, outbox) = testing::state(&[]).await;
    say(&app, "9", "subscribe").await;
    assert!(directory::find(&app.db, "9").await.unwrap().is_none());
    assert!(outbox.texts_to("9").is_empty());
}

#[tokio::test]
async fn strangers_are_asked_to_subscribe() {
    let (app, outbox) = testing::state(&[]).await;
    say(&app, "9", "hello?").await;
    assert_eq!(
        outbox.texts_to("9"),
        ["You are not subscribed to any channels. Please subscribe before sending a message."]
    );
}

#[tokio::test]
async fn get_started_registers_and_greets() {
    let (app, outbox) = testing::state(&[("9", "Ada", "Lovelace")]).await;
    tap(&app, "9", &Postback::NewUser).await;

    assert!(directory::find(&app.db, "9").await.unwrap().is_some());
    assert!(outbox.texts_to("9").contains(&super::GREETING.to_string()));
}

#[tokio::test]
async fn chat_lines_are_relayed_to_everyone_else() {
    let (app, outbox) = channel_of_three().await;
    say(&app, "1", "hi all").await;

    assert_eq!(outbox.texts_to("2"), ["A Doe: hi all"]);
    assert_eq!(outbox.texts_to("3"), ["A Doe: hi all"]);
    assert!(outbox.texts_to("1").is_empty());
    assert_eq!(outbox.sent_to("1").len(), 1, "only the seen marker");
}

#[tokio::test]
async fn broadcast_continues_past_a_failed_recipient() {
    let (app, outbox) = channel_of_three().await;
    outbox.fail_for("2");
    say(&app, "1", "anyone?").await;

    assert!(outbox.sent_to("2").is_empty());
    assert_eq!(outbox.texts_to("3"), ["A Doe: anyone?"]);
}

#[tokio::test]
async fn attachments_are_relayed_by_url() {
    let (app, outbox) = channel_of_three().await;
    let ev = event(
        "1",
        json!({"message": {"mid": "m", "attachments": [
            {"type": "image", "payload": {"url": "https://cdn/cat.png", "sticker_id": 1}},
            {"type": "location", "payload": {"coordinates": {"lat": 0, "long": 0}}}
        ]}}),
    );
    handle_event(&app, &ev).await;

    let received = outbox.sent_to("2");
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].text(), Some("A Doe:"));
    let attachment = received[1]
        .message
        .as_ref()
        .and_then(|m| m.attachment.clone());
    assert!(matches!(attachment, Some(Attachment::Image(media)) if media.url == "https://cdn/cat.png"));
}

#[tokio::test]
async fn attachments_inside_a_workflow_reprompt() {
    let (app, outbox) = channel_of_three().await;
    say(&app, "1", "pin post").await;
    let ev = event(
        "1",
        json!({"message": {"mid": "m", "attachments": [
            {"type": "image", "payload": {"url": "https://cdn/cat.png"}}
        ]}}),
    );
    handle_event(&app, &ev).await;

    assert_eq!(state_of(&app, "1").await, ConversationState::Posting);
    assert_eq!(outbox.texts_to("1"), [format::PROMPT_POST, format::PROMPT_POST]);
    assert!(outbox.sent_to("2").is_empty());
}

#[tokio::test]
async fn unsubscribe_removes_and_announces() {
    let (app, outbox) = channel_of_three().await;
    say(&app, "2", "unsubscribe").await;

    assert!(directory::find(&app.db, "2").await.unwrap().is_none());
    assert_eq!(outbox.texts_to("2"), ["You have left the channel."]);
    assert_eq!(outbox.texts_to("1"), ["B Doe left the channel."]);
    assert!(app.locks.is_empty());
}

#[tokio::test]
async fn votes_are_counted_and_reported() {
    let (app, outbox) = channel_of_three().await;
    let poll = polls::add_poll(&app.db, "A", "Lunch?").await.unwrap();
    let tacos = polls::add_choice(&app.db, poll.id, "Tacos").await.unwrap();
    polls::add_choice(&app.db, poll.id, "Ramen").await.unwrap();

    let vote = Postback::Vote {
        poll_id: poll.id,
        choice_id: tacos.id,
    };
    tap(&app, "2", &vote).await;
    tap(&app, "2", &vote).await;

    assert_eq!(polls::list_votes_for_poll(&app.db, poll.id).await.unwrap().len(), 2);
    assert_eq!(
        outbox.texts_to("2").last().map(String::as_str),
        Some("Your vote has been counted.\nLunch?\nTacos: 2 votes\nRamen: 0 votes")
    );
}

#[tokio::test]
async fn view_posts_lists_the_latest_four() {
    let (app, outbox) = channel_of_three().await;
    for i in 1..=5 {
        posts::add_post(&app.db, "A", &format!("post {i}")).await.unwrap();
    }
    tap(&app, "2", &Postback::ViewPosts).await;

    let sent = outbox.sent_to("2");
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0].sender_action, Some(SenderAction::TypingOn));
    assert_eq!(sent[2].sender_action, Some(SenderAction::TypingOff));
    let list = &sent[1];
    let Some(Template::List { elements, .. }) = list.template() else {
        panic!("expected a list, got {list:?}");
    };
    let titles: Vec<&str> = elements.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["post 2", "post 3", "post 4", "post 5"]);
}

#[tokio::test]
async fn delete_post_twice_reports_missing() {
    let (app, outbox) = channel_of_three().await;
    let post = posts::add_post(&app.db, "A", "bye").await.unwrap();
    let delete = Postback::DeletePost { post_id: post.id };

    tap(&app, "1", &delete).await;
    tap(&app, "1", &delete).await;

    assert!(posts::list_posts(&app.db).await.unwrap().is_empty());
    assert_eq!(
        outbox.texts_to("1"),
        ["The post has been deleted.", "That item no longer exists."]
    );
}

#[tokio::test]
async fn malformed_postbacks_get_a_notice() {
    let (app, outbox) = channel_of_three().await;
    let ev = event(
        "1",
        json!({"postback": {"title": "x", "payload": "{\"type\":\"LAUNCH_ROCKET\"}"}}),
    );
    handle_event(&app, &ev).await;
    assert_eq!(outbox.texts_to("1"), ["Sorry, I didn't understand that."]);
}

#[tokio::test]
async fn quick_reply_payloads_drive_the_workflow() {
    let (app, _outbox) = channel_of_three().await;
    for input in ["start poll", "Lunch?", "Tacos"] {
        say(&app, "1", input).await;
    }
    let ev = event(
        "1",
        json!({"message": {"mid": "m", "text": "Publish poll",
            "quick_reply": {"payload": Postback::PublishPoll.to_payload()}}}),
    );
    handle_event(&app, &ev).await;
    assert_eq!(state_of(&app, "1").await, ConversationState::Default);
}

#[tokio::test]
async fn unreadable_quick_reply_falls_back_to_text() {
    let (app, outbox) = channel_of_three().await;
    let ev = event(
        "1",
        json!({"message": {"mid": "m", "text": "sounds good",
            "quick_reply": {"payload": "LEGACY_PAYLOAD"}}}),
    );
    handle_event(&app, &ev).await;
    assert_eq!(outbox.texts_to("2"), ["A Doe: sounds good"]);
}

#[tokio::test]
async fn optin_confirms_authentication() {
    let (app, outbox) = testing::state(&[]).await;
    let ev = event("7", json!({"optin": {"ref": "PASS_THROUGH"}}));
    handle_event(&app, &ev).await;
    assert_eq!(outbox.texts_to("7"), ["Authentication successful"]);
}

#[tokio::test]
async fn echoes_and_receipts_send_nothing() {
    let (app, outbox) = channel_of_three().await;
    for body in [
        json!({"message": {"mid": "m", "is_echo": true, "app_id": 5, "text": "echo"}}),
        json!({"delivery": {"mids": ["m"], "watermark": 3, "seq": 1}}),
        json!({"read": {"watermark": 3, "seq": 1}}),
        json!({"account_linking": {"status": "linked", "authorization_code": "abc"}}),
        json!({}),
    ] {
        handle_event(&app, &event("1", body)).await;
    }
    assert!(outbox.sent().is_empty());
}
