//! Telegram update handlers.
//!
//! Each handler converts a teloxide update into a platform-neutral
//! [`sdb_core::dispatch::Update`] and hands it to the dispatcher.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Chat, Message},
};

use sdb_core::{
    dispatch::{ButtonPress, IncomingMessage, Update},
    domain::{ChatId, ChatKind, MessageId, MessageRef, UserId},
    events::OpsEvent,
};

use crate::router::AppState;

fn chat_kind(chat: &Chat) -> ChatKind {
    if chat.is_group() || chat.is_supergroup() {
        ChatKind::Group
    } else {
        ChatKind::Private
    }
}

fn message_ref(msg: &Message) -> MessageRef {
    MessageRef::new(ChatId(msg.chat.id.0), MessageId(msg.id.0))
}

fn to_incoming(msg: &Message) -> IncomingMessage {
    IncomingMessage {
        chat_id: ChatId(msg.chat.id.0),
        chat_kind: chat_kind(&msg.chat),
        message_id: MessageId(msg.id.0),
        user_id: msg.from().map(|u| UserId(u.id.0 as i64)),
        text: msg.text().map(str::to_string),
    }
}

fn to_press(q: &CallbackQuery) -> Option<ButtonPress> {
    let msg = q.message.as_ref()?;
    Some(ButtonPress {
        chat_id: ChatId(msg.chat.id.0),
        chat_kind: chat_kind(&msg.chat),
        user_id: UserId(q.from.id.0 as i64),
        callback_id: q.id.clone(),
        data: q.data.clone().unwrap_or_default(),
        message: message_ref(msg),
        reply_to: msg.reply_to_message().map(message_ref),
    })
}

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let Some(press) = to_press(&q) else {
        // Inline-mode callbacks carry no message to act on.
        state.sink.record(OpsEvent::UpdateDropped {
            reason: "callback without message".to_string(),
        });
        let _ = bot.answer_callback_query(q.id).await;
        return Ok(());
    };

    state.dispatcher.dispatch(Update::Button(press)).await;
    Ok(())
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    state
        .dispatcher
        .dispatch(Update::Message(to_incoming(&msg)))
        .await;
    Ok(())
}
