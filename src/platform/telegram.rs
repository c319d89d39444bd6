use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{MessageId, ReplyParameters};
use tracing::{debug, info, warn};

use crate::annotator::{Annotator, BotContext};
use crate::config::ProfileConfig;
use crate::error::AnnotateError;
use crate::platform::{IncomingMessage, ReplyDraft, ReplyPublisher};

/// Resolve the bot's own identity, publish its profile text and load the
/// profile image.
pub async fn activate(bot: &Bot, profile: &ProfileConfig) -> Result<BotContext> {
    let me = bot.get_me().await.context("Failed to fetch bot identity")?;
    info!(
        "Running as @{} ({})",
        me.user.username.as_deref().unwrap_or("?"),
        me.user.id.0
    );

    if let Err(e) = bot
        .set_my_name()
        .name(profile.display_name.clone())
        .await
    {
        warn!("Failed to set bot name: {}", e);
    }
    if let Err(e) = bot
        .set_my_short_description()
        .short_description(profile.description.clone())
        .await
    {
        warn!("Failed to set bot description: {}", e);
    }

    let profile_image = tokio::fs::read(&profile.image_path)
        .await
        .with_context(|| {
            format!(
                "Couldn't read profile image: {}",
                profile.image_path.display()
            )
        })?;

    Ok(BotContext {
        bot_id: me.user.id.0.to_string(),
        profile_image: Arc::new(profile_image),
    })
}

/// Sends replies into the chat of the triggering message.
pub struct TelegramPublisher {
    bot: Bot,
}

impl TelegramPublisher {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ReplyPublisher for TelegramPublisher {
    async fn publish(&self, draft: ReplyDraft) -> Result<(), AnnotateError> {
        let chat_id: i64 = draft
            .chat_id
            .parse()
            .map_err(|_| AnnotateError::Publish(format!("invalid chat id {}", draft.chat_id)))?;
        let parent_id: i32 = draft.parent_id.parse().map_err(|_| {
            AnnotateError::Publish(format!("invalid parent id {}", draft.parent_id))
        })?;

        debug!("Replying as {} in chat {}", draft.author_id, chat_id);
        self.bot
            .send_message(ChatId(chat_id), draft.message)
            .reply_parameters(ReplyParameters::new(MessageId(parent_id)))
            .await
            .map_err(|e| AnnotateError::Publish(e.to_string()))?;
        Ok(())
    }
}

/// Convert a Telegram text message into a platform-agnostic one.
fn to_incoming(msg: &Message) -> Option<IncomingMessage> {
    let user = msg.from.as_ref()?;
    let text = msg.text()?;
    let parent = msg.reply_to_message().map(|m| m.id).unwrap_or(msg.id);

    Some(IncomingMessage {
        platform: "telegram".to_string(),
        user_id: user.id.0.to_string(),
        chat_id: msg.chat.id.0.to_string(),
        parent_id: parent.0.to_string(),
        user_name: user.first_name.clone(),
        text: text.to_string(),
    })
}

/// Run the Telegram bot platform
pub async fn run(bot: Bot, annotator: Arc<Annotator>, allowed_chat_ids: Vec<i64>) -> Result<()> {
    info!("Starting Telegram platform...");

    let handler = Update::filter_message()
        .filter(move |msg: Message| {
            allowed_chat_ids.is_empty() || allowed_chat_ids.contains(&msg.chat.id.0)
        })
        .endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![annotator])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(msg: Message, annotator: Arc<Annotator>) -> ResponseResult<()> {
    let Some(incoming) = to_incoming(&msg) else {
        return Ok(());
    };

    debug!(
        "Telegram message from {} ({}) in chat {}",
        incoming.user_name, incoming.user_id, incoming.chat_id
    );

    let outcomes = annotator.handle_message(&incoming).await;
    let posted: Vec<&str> = outcomes
        .iter()
        .filter(|o| o.result.is_ok())
        .map(|o| o.link.as_str())
        .collect();
    if !outcomes.is_empty() {
        debug!("Annotated {} of {} links: {:?}", posted.len(), outcomes.len(), posted);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn telegram_message(extra: serde_json::Value) -> Message {
        let mut value = json!({
            "message_id": 42,
            "date": 1700000000,
            "chat": { "id": 7, "type": "private", "first_name": "alice" },
            "from": { "id": 7, "is_bot": false, "first_name": "alice" },
            "text": "see https://en.wikipedia.org/wiki/Go"
        });
        if let (Some(base), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
            for (key, v) in extra {
                base.insert(key.clone(), v.clone());
            }
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_to_incoming_uses_own_id_as_parent() {
        let incoming = to_incoming(&telegram_message(json!({}))).unwrap();
        assert_eq!(incoming.platform, "telegram");
        assert_eq!(incoming.user_id, "7");
        assert_eq!(incoming.chat_id, "7");
        assert_eq!(incoming.parent_id, "42");
        assert_eq!(incoming.user_name, "alice");
        assert_eq!(incoming.text, "see https://en.wikipedia.org/wiki/Go");
    }

    #[test]
    fn test_to_incoming_uses_replied_message_as_parent() {
        let msg = telegram_message(json!({
            "reply_to_message": {
                "message_id": 40,
                "date": 1699999999,
                "chat": { "id": 7, "type": "private", "first_name": "alice" },
                "from": { "id": 7, "is_bot": false, "first_name": "alice" },
                "text": "what is Go?"
            }
        }));
        assert_eq!(to_incoming(&msg).unwrap().parent_id, "40");
    }
}
