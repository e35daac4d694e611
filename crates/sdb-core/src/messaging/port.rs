use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    messaging::types::InlineKeyboard,
    Result,
};

/// Outbound messenger port used by the dispatcher.
///
/// Telegram is the only implementation; tests use an in-memory fake.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    async fn send_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef>;

    /// Replace a message's text (and keyboard, when given; `None` removes it).
    ///
    /// Implementations treat "message is not modified" as success.
    async fn edit_html(
        &self,
        msg: MessageRef,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()>;

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<()>;
}
