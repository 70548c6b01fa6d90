use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream::BoxStream, TryStreamExt};

use crate::Result;

/// Byte stream of a stored file, chunked however the backend delivers it.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Port for reading files back out of the bin channel.
///
/// The Telegram adapter implements this over the Bot API file endpoints;
/// the web server only ever sees this trait.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Open the whole file identified by its Bot API `file_id`.
    async fn open(&self, file_id: &str) -> Result<ByteStream>;

    /// Read a (small) file fully into memory.
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>> {
        let stream = self.open(file_id).await?;
        let chunks: Vec<Bytes> = stream.try_collect().await?;
        Ok(chunks.concat())
    }
}
