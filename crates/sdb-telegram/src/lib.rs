//! Telegram adapter (teloxide).
//!
//! Implements the `sdb-core` ports (messaging, deletion, membership lookup)
//! over the Telegram Bot API.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{ChatMemberKind, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode},
    ApiError, RequestError,
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use sdb_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ButtonAction, InlineKeyboard},
    },
    permission::{MembershipLookup, Role},
    scheduler::DeleteAction,
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }

    /// Like [`Self::with_retry`], but errors for which `benign` holds count as success.
    async fn with_retry_tolerant<T, Fut>(
        &self,
        benign: fn(&ApiError) -> bool,
        mut op: impl FnMut() -> Fut,
    ) -> Result<()>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(_) => return Ok(()),
                Err(RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    sleep(d).await;
                }
                Err(RequestError::Api(ref api)) if benign(api) => {
                    tracing::debug!(error = %api, "ignoring benign telegram error");
                    return Ok(());
                }
                Err(other) => return Err(Self::map_err(other)),
            }
        }
    }
}

fn is_not_modified(e: &ApiError) -> bool {
    matches!(e, ApiError::MessageNotModified)
}

fn is_already_deleted(e: &ApiError) -> bool {
    matches!(e, ApiError::MessageToDeleteNotFound)
}

fn to_markup(keyboard: InlineKeyboard) -> Result<InlineKeyboardMarkup> {
    let mut rows = Vec::with_capacity(keyboard.rows.len());
    for row in keyboard.rows {
        let mut out = Vec::with_capacity(row.len());
        for b in row {
            let button = match b.action {
                ButtonAction::Callback(data) => InlineKeyboardButton::callback(b.label, data),
                ButtonAction::Url(url) => {
                    let url = reqwest::Url::parse(&url)
                        .map_err(|e| Error::External(format!("invalid button url {url}: {e}")))?;
                    InlineKeyboardButton::url(b.label, url)
                }
            };
            out.push(button);
        }
        rows.push(out);
    }
    Ok(InlineKeyboardMarkup::new(rows))
}

fn to_role(kind: &ChatMemberKind) -> Role {
    match kind {
        ChatMemberKind::Owner(_) => Role::Owner,
        ChatMemberKind::Administrator(_) => Role::Administrator,
        ChatMemberKind::Member => Role::Member,
        _ => Role::Other,
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
            })
            .await?;

        Ok(MessageRef::new(chat_id, MessageId(msg.id.0)))
    }

    async fn send_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef> {
        let markup = to_markup(keyboard)?;

        let msg = self
            .with_retry(|| {
                let mut req = self
                    .bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
                    .reply_markup(markup.clone());
                if let Some(id) = reply_to {
                    req = req
                        .reply_to_message_id(Self::tg_msg_id(id))
                        .allow_sending_without_reply(true);
                }
                req
            })
            .await?;

        Ok(MessageRef::new(chat_id, MessageId(msg.id.0)))
    }

    async fn edit_html(
        &self,
        msg: MessageRef,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()> {
        let markup = keyboard.map(to_markup).transpose()?;

        self.with_retry_tolerant(is_not_modified, || {
            let mut req = self
                .bot
                .edit_message_text(
                    Self::tg_chat(msg.chat_id),
                    Self::tg_msg_id(msg.message_id),
                    html.to_string(),
                )
                .parse_mode(ParseMode::Html);
            if let Some(m) = &markup {
                req = req.reply_markup(m.clone());
            }
            req
        })
        .await
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string()).show_alert(show_alert);
            }
            req
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl DeleteAction for TelegramMessenger {
    async fn delete_message(&self, target: MessageRef) -> Result<()> {
        self.with_retry_tolerant(is_already_deleted, || {
            self.bot.delete_message(
                Self::tg_chat(target.chat_id),
                Self::tg_msg_id(target.message_id),
            )
        })
        .await
    }
}

#[async_trait]
impl MembershipLookup for TelegramMessenger {
    async fn get_role(&self, chat_id: ChatId, user_id: UserId) -> Result<Role> {
        let Ok(uid) = u64::try_from(user_id.0) else {
            return Ok(Role::Other);
        };
        let member = self
            .with_retry(|| {
                self.bot
                    .get_chat_member(Self::tg_chat(chat_id), teloxide::types::UserId(uid))
            })
            .await?;
        Ok(to_role(&member.kind))
    }
}
