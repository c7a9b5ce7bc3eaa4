use grubot_messenger::send::SenderAction;
use grubot_messenger::{format, templates, SendRequest};
use grubot_models::webhook::InboundAttachment;
use grubot_models::{ConversationState, User};

use super::{broadcast, notify, relay, subscription};
use crate::conversation::{transition, Effect, Input};
use crate::error::CoreError;
use crate::{directory, polls, posts, AppState};

const POLL_LOST: &str = "Your poll is no longer available. Send \"start poll\" to begin again.";

/// Feed one input through the state machine and carry out the effect.
/// The new state is written before anything is sent.
pub(super) async fn run(
    app: &AppState,
    user: &User,
    input: Input<'_>,
    attachments: &[InboundAttachment],
) -> Result<(), CoreError> {
    let current = user.conversation_state;
    let step = transition(current, &input);
    tracing::debug!(
        user_id = %user.id,
        from = %current,
        to = %step.next,
        effect = ?step.effect,
        "conversation step"
    );

    match step.effect {
        Effect::PromptPost | Effect::PromptQuestion => {
            directory::set_state(&app.db, &user.id, step.next, None).await?;
            notify(app, &prompt(&user.id, step.next)).await;
        }
        Effect::CreatePost(text) => {
            let post = posts::add_post(&app.db, &user.first_name, text).await?;
            directory::set_state(&app.db, &user.id, step.next, None).await?;
            tracing::info!(user_id = %user.id, post_id = post.id, "post pinned");

            notify(app, &format::post_success(&user.id)).await;
            let announcement = format!("{} posted a message: {}", user.first_name, post.text);
            broadcast(app, &user.id, |other| {
                vec![templates::text(&other.id, &announcement)]
            })
            .await?;
        }
        Effect::CreatePoll(question) => {
            let poll = polls::add_poll(&app.db, &user.first_name, question).await?;
            directory::set_state(&app.db, &user.id, step.next, Some(poll.id)).await?;
            notify(app, &prompt(&user.id, step.next)).await;
        }
        Effect::AddChoice(text) => {
            let added = match user.building_poll_id {
                Some(poll_id) => match polls::add_choice(&app.db, poll_id, text).await {
                    Ok(choice) => Some(choice),
                    Err(CoreError::NotFound) => None,
                    Err(e) => return Err(e),
                },
                None => None,
            };
            match added {
                Some(choice) => {
                    directory::set_state(&app.db, &user.id, step.next, Some(choice.poll_id))
                        .await?;
                    notify(app, &prompt(&user.id, step.next)).await;
                }
                None => poll_lost(app, user).await?,
            }
        }
        Effect::PromptChoice => match user.building_poll_id {
            Some(poll_id) => {
                directory::set_state(&app.db, &user.id, step.next, Some(poll_id)).await?;
                notify(app, &prompt(&user.id, step.next)).await;
            }
            None => poll_lost(app, user).await?,
        },
        Effect::PublishPoll => publish_poll(app, user, step.next).await?,
        Effect::Cancel => {
            directory::set_state(&app.db, &user.id, step.next, None).await?;
            if let Some(poll_id) = user.building_poll_id {
                match polls::remove_poll(&app.db, poll_id).await {
                    Ok(()) | Err(CoreError::NotFound) => {}
                    Err(e) => return Err(e),
                }
            }
            notify(app, &templates::text(&user.id, "Cancelled.")).await;
        }
        Effect::Reprompt => {
            notify(app, &prompt(&user.id, current)).await;
        }
        Effect::ViewPosts => {
            notify(app, &templates::sender_action(&user.id, SenderAction::TypingOn)).await;
            let posts = posts::list_posts(&app.db).await?;
            notify(app, &format::post_list(&user.id, &posts)).await;
            notify(app, &templates::sender_action(&user.id, SenderAction::TypingOff)).await;
        }
        Effect::ViewPolls => {
            notify(app, &templates::sender_action(&user.id, SenderAction::TypingOn)).await;
            let polls = polls::list_published_polls(&app.db).await?;
            notify(app, &format::poll_list(&user.id, &polls)).await;
            notify(app, &templates::sender_action(&user.id, SenderAction::TypingOff)).await;
        }
        Effect::Help => {
            notify(app, &format::help(&user.id)).await;
        }
        Effect::Unsubscribe => subscription::unsubscribe(app, user).await?,
        Effect::AlreadySubscribed => return Err(CoreError::AlreadyRegistered),
        Effect::Relay(text) => relay::text(app, user, text).await?,
        Effect::RelayAttachments => relay::attachments(app, user, attachments).await?,
        Effect::Nothing => {}
    }
    Ok(())
}

async fn publish_poll(
    app: &AppState,
    user: &User,
    next: ConversationState,
) -> Result<(), CoreError> {
    directory::set_state(&app.db, &user.id, next, None).await?;
    let poll = match user.building_poll_id {
        Some(poll_id) => polls::get_poll(&app.db, poll_id).await?,
        None => None,
    };
    let Some(poll) = poll else {
        notify(app, &templates::text(&user.id, POLL_LOST)).await;
        return Ok(());
    };
    tracing::info!(user_id = %user.id, poll_id = poll.id, "poll published");

    let tally = polls::tally(&app.db, poll.id).await?;
    notify(app, &templates::text(&user.id, "Your poll has been published.")).await;
    let intro = format!("{} started a poll:", user.first_name);
    broadcast(app, &user.id, |other| {
        vec![
            templates::text(&other.id, &intro),
            format::poll_card(&other.id, &poll, &tally),
        ]
    })
    .await?;
    Ok(())
}

/// The remembered poll is gone (deleted meanwhile): drop back to the default state.
async fn poll_lost(app: &AppState, user: &User) -> Result<(), CoreError> {
    directory::set_state(&app.db, &user.id, ConversationState::Default, None).await?;
    notify(app, &templates::text(&user.id, POLL_LOST)).await;
    Ok(())
}

fn prompt(recipient_id: &str, state: ConversationState) -> SendRequest {
    match state {
        ConversationState::Posting => templates::text(recipient_id, format::PROMPT_POST),
        ConversationState::PollInputQuestion => {
            templates::text(recipient_id, format::PROMPT_QUESTION)
        }
        ConversationState::PollInputChoice => templates::text(recipient_id, format::PROMPT_CHOICE),
        ConversationState::PollInputContinue => format::continue_prompt(recipient_id),
        ConversationState::Default => format::help(recipient_id),
    }
}
