use std::time::Duration;

use relay_logging::{relay_debug, relay_info, relay_warn};
use serde::Deserialize;
use serde_json::json;

use crate::config::Destination;
use crate::media::{classify, GalleryResolver, MediaKind};
use crate::types::map_reqwest_error;
use crate::{FailureKind, MessageId, Post, RelayError};

/// Destination messaging API.
#[async_trait::async_trait]
pub trait Messenger: Send + Sync {
    async fn send_photo(&self, photo_url: &str) -> Result<MessageId, RelayError>;
    async fn send_document(&self, document_url: &str) -> Result<MessageId, RelayError>;
    async fn edit_caption(&self, message_id: MessageId, caption: &str) -> Result<(), RelayError>;
}

/// Pause inserted between batches of deliveries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    pub every: usize,
    pub pause: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            every: 5,
            pause: Duration::from_secs(5),
        }
    }
}

impl Pacing {
    /// True after the item at 1-based `position` when more items follow.
    fn pause_after(&self, position: usize, total: usize) -> bool {
        self.every > 0 && position % self.every == 0 && position < total
    }
}

/// Send `posts` in order. Unsupported posts are skipped.
///
/// Returns the number of posts delivered, or the first transport error.
/// Messages already sent stay sent.
pub async fn deliver(
    posts: &[Post],
    messenger: &dyn Messenger,
    galleries: &dyn GalleryResolver,
    pacing: &Pacing,
) -> Result<usize, RelayError> {
    relay_info!("Sending {} posts", posts.len());
    let mut delivered = 0;

    for (index, post) in posts.iter().enumerate() {
        relay_debug!("Sending {}", post.url);
        match classify(&post.url) {
            MediaKind::Unsupported(reason) => {
                relay_debug!("Skipping {}: {}", post.url, reason);
            }
            MediaKind::Gallery => {
                let images = galleries.resolve(&post.url).await?;
                if images.is_empty() {
                    relay_warn!("Gallery {} has no images", post.url);
                }
                for (image_index, image) in images.iter().enumerate() {
                    relay_debug!("Gallery item {}", image);
                    let message_id = messenger.send_photo(image).await?;
                    if image_index == 0 {
                        messenger.edit_caption(message_id, &post.title).await?;
                    }
                }
                delivered += 1;
            }
            MediaKind::Gif => {
                let message_id = messenger.send_document(&post.url).await?;
                if let Err(err) = messenger.edit_caption(message_id, &post.title).await {
                    relay_warn!("Could not caption {}: {}", post.url, err);
                }
                delivered += 1;
            }
            MediaKind::Image => {
                let message_id = messenger.send_photo(&post.url).await?;
                messenger.edit_caption(message_id, &post.title).await?;
                delivered += 1;
            }
        }

        if pacing.pause_after(index + 1, posts.len()) {
            relay_debug!("Sleep for {:?}", pacing.pause);
            tokio::time::sleep(pacing.pause).await;
        }
    }

    Ok(delivered)
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: MessageId,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    username: Option<String>,
}

/// Bot API client bound to one chat.
pub struct TelegramMessenger {
    client: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: i64,
}

impl TelegramMessenger {
    /// Validate the bot token with `getMe` before any message is sent.
    pub async fn connect(
        client: reqwest::Client,
        api_base: &str,
        destination: &Destination,
    ) -> Result<Self, RelayError> {
        let messenger = Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: destination.token.clone(),
            chat_id: destination.chat_id,
        };
        let me: BotUser = messenger.call("getMe", json!({})).await?;
        relay_info!(
            "Authorized on bot account {}",
            me.username.as_deref().unwrap_or("<unnamed>")
        );
        Ok(messenger)
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        payload: serde_json::Value,
    ) -> Result<T, RelayError> {
        let url = format!("{}/bot{}/{}", self.api_base, self.token, method);
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err.without_url()))?;

        let status = response.status();
        let body: Option<ApiResponse<T>> = response.json().await.ok();
        let description = body
            .as_ref()
            .and_then(|body| body.description.clone())
            .unwrap_or_default();

        if !status.is_success() {
            return Err(RelayError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("{method}: {description}"),
            ));
        }
        match body {
            Some(ApiResponse {
                ok: true,
                result: Some(result),
                ..
            }) => Ok(result),
            Some(_) => Err(RelayError::new(FailureKind::Api, format!("{method}: {description}"))),
            None => Err(RelayError::new(
                FailureKind::Parse,
                format!("{method}: unreadable response"),
            )),
        }
    }
}

#[async_trait::async_trait]
impl Messenger for TelegramMessenger {
    async fn send_photo(&self, photo_url: &str) -> Result<MessageId, RelayError> {
        let sent: SentMessage = self
            .call("sendPhoto", json!({"chat_id": self.chat_id, "photo": photo_url}))
            .await?;
        Ok(sent.message_id)
    }

    async fn send_document(&self, document_url: &str) -> Result<MessageId, RelayError> {
        let sent: SentMessage = self
            .call(
                "sendDocument",
                json!({"chat_id": self.chat_id, "document": document_url}),
            )
            .await?;
        Ok(sent.message_id)
    }

    async fn edit_caption(&self, message_id: MessageId, caption: &str) -> Result<(), RelayError> {
        let _: serde_json::Value = self
            .call(
                "editMessageCaption",
                json!({"chat_id": self.chat_id, "message_id": message_id, "caption": caption}),
            )
            .await?;
        Ok(())
    }
}
