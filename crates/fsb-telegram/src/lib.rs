//! Telegram adapter (teloxide).
//!
//! Implements the `fsb-core` messaging and file-source ports over the Bot API
//! and hosts the update handlers.

use std::{future::IntoFuture, path::Path, sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::StreamExt;
use teloxide::{net::Download, prelude::*, types::ParseMode};
use tokio::{
    sync::{OwnedSemaphorePermit, Semaphore},
    time::sleep,
};
use tokio_util::io::ReaderStream;

pub mod handlers;
pub mod media;
pub mod router;

use fsb_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::port::MessagingPort,
    ports::{ByteStream, FileSource},
    Result,
};

pub(crate) fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
    teloxide::types::ChatId(chat_id.0)
}

pub(crate) fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
    teloxide::types::MessageId(message_id.0)
}

pub(crate) fn map_err(e: teloxide::RequestError) -> Error {
    Error::External(format!("telegram error: {e}"))
}

/// Run a Bot API request, waiting out one flood wait and retrying once.
/// Waits longer than `sleep_threshold` are logged as warnings.
pub async fn with_retry<T, Fut>(
    sleep_threshold: Duration,
    mut op: impl FnMut() -> Fut,
) -> std::result::Result<T, teloxide::RequestError>
where
    Fut: IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
    Fut::IntoFuture: Send,
{
    const MAX_RETRIES: usize = 1;
    let mut attempts = 0usize;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(teloxide::RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                attempts += 1;
                if d > sleep_threshold {
                    tracing::warn!("flood wait of {}s, retrying", d.as_secs());
                } else {
                    tracing::debug!("flood wait of {}s, retrying", d.as_secs());
                }
                sleep(d).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
    sleep_threshold: Duration,
}

impl TelegramMessenger {
    pub fn new(bot: Bot, sleep_threshold: Duration) -> Self {
        Self { bot, sleep_threshold }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = with_retry(self.sleep_threshold, || {
            self.bot
                .send_message(tg_chat(chat_id), html.to_string())
                .parse_mode(ParseMode::Html)
                .disable_web_page_preview(true)
        })
        .await
        .map_err(map_err)?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn edit_html(&self, msg: MessageRef, html: &str) -> Result<()> {
        with_retry(self.sleep_threshold, || {
            self.bot
                .edit_message_text(tg_chat(msg.chat_id), tg_msg_id(msg.message_id), html.to_string())
                .parse_mode(ParseMode::Html)
                .disable_web_page_preview(true)
        })
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        with_retry(self.sleep_threshold, || {
            self.bot.delete_message(tg_chat(msg.chat_id), tg_msg_id(msg.message_id))
        })
        .await
        .map_err(map_err)?;
        Ok(())
    }
}

/// Reads bin-channel files back through the Bot API file endpoints.
/// At most `workers` downloads run at once.
#[derive(Clone)]
pub struct TelegramFiles {
    bot: Bot,
    permits: Arc<Semaphore>,
}

impl TelegramFiles {
    pub fn new(bot: Bot, workers: usize) -> Self {
        Self {
            bot,
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }
}

#[async_trait]
impl FileSource for TelegramFiles {
    async fn open(&self, file_id: &str) -> Result<ByteStream> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| Error::External(format!("download pool closed: {e}")))?;

        let file = self.bot.get_file(file_id.to_string()).await.map_err(map_err)?;
        tracing::debug!(file_id, path = %file.path, size = file.meta.size, "opening telegram file");

        // a local Bot API server (--local) hands out absolute paths on its own disk
        if Path::new(&file.path).is_absolute() {
            return open_local(Path::new(&file.path), permit).await;
        }

        let stream = self.bot.download_file_stream(&file.path).map(move |chunk| {
            // the permit is released when the body is dropped
            let _held = &permit;
            chunk.map_err(|e| Error::External(format!("telegram download error: {e}")))
        });
        Ok(stream.boxed())
    }
}

async fn open_local(path: &Path, permit: OwnedSemaphorePermit) -> Result<ByteStream> {
    let file = tokio::fs::File::open(path).await?;
    let stream = ReaderStream::new(file).map(move |chunk| {
        let _held = &permit;
        chunk.map_err(Error::from)
    });
    Ok(stream.boxed())
}
