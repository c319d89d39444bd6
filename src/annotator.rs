use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::AnnotateError;
use crate::links::{extract_reference, find_links};
use crate::platform::{IncomingMessage, ReplyDraft, ReplyPublisher};
use crate::wikipedia::{parse_summary, SummaryFetcher};

/// Identity state established once at activation.
#[derive(Debug, Clone)]
pub struct BotContext {
    /// The bot's own user ID, as the transport reports message authors.
    pub bot_id: String,
    /// Profile image bytes, served verbatim.
    pub profile_image: Arc<Vec<u8>>,
}

/// What happened to one link of a message.
#[derive(Debug)]
pub struct LinkOutcome {
    pub link: String,
    pub result: Result<(), AnnotateError>,
}

/// Watches messages for Wikipedia links and replies with page summaries.
pub struct Annotator {
    context: BotContext,
    fetcher: Arc<dyn SummaryFetcher>,
    publisher: Arc<dyn ReplyPublisher>,
}

impl Annotator {
    pub fn new(
        context: BotContext,
        fetcher: Arc<dyn SummaryFetcher>,
        publisher: Arc<dyn ReplyPublisher>,
    ) -> Self {
        Self {
            context,
            fetcher,
            publisher,
        }
    }

    pub fn context(&self) -> &BotContext {
        &self.context
    }

    /// Process every link in `msg` in order. Failures are logged per link and
    /// never returned to the caller.
    pub async fn handle_message(&self, msg: &IncomingMessage) -> Vec<LinkOutcome> {
        if msg.user_id == self.context.bot_id {
            return Vec::new();
        }

        let mut outcomes = Vec::new();
        for link in find_links(&msg.text) {
            let result = self.annotate_link(msg, link).await;
            match &result {
                Ok(()) => info!("Posted summary for {} in chat {}", link, msg.chat_id),
                Err(e @ (AnnotateError::Extraction { .. } | AnnotateError::Fetch(_))) => {
                    warn!(link, stage = e.stage(), "Skipping link: {}", e)
                }
                Err(e) => error!(link, stage = e.stage(), "Skipping link: {}", e),
            }
            outcomes.push(LinkOutcome {
                link: link.to_string(),
                result,
            });
        }
        outcomes
    }

    async fn annotate_link(&self, msg: &IncomingMessage, link: &str) -> Result<(), AnnotateError> {
        let page = extract_reference(link)?;
        debug!(
            "Link {} -> page '{}' (anchor: {:?})",
            link, page.identifier, page.anchor
        );

        let raw = self.fetcher.fetch_summary(&page.identifier).await?;
        let message = parse_summary(&raw)?;

        self.publisher
            .publish(ReplyDraft {
                author_id: self.context.bot_id.clone(),
                message,
                parent_id: msg.parent_id.clone(),
                chat_id: msg.chat_id.clone(),
            })
            .await
    }
}
