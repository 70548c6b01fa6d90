use futures::{future, StreamExt};

use fsb_core::ports::ByteStream;

/// Narrow a whole-file stream to `len` bytes starting at `start`. Chunks
/// before the window are dropped; the stream ends once the window is served.
pub fn slice_stream(inner: ByteStream, start: u64, len: u64) -> ByteStream {
    let end = start.saturating_add(len);

    inner
        .scan(0u64, move |pos, item| {
            let out = match item {
                Err(e) => Some(Some(Err(e))),
                Ok(_) if *pos >= end => None,
                Ok(chunk) => {
                    let chunk_start = *pos;
                    let chunk_len = chunk.len() as u64;
                    *pos += chunk_len;

                    let lo = start.saturating_sub(chunk_start).min(chunk_len);
                    let hi = end.min(*pos) - chunk_start;
                    if lo >= hi {
                        Some(None)
                    } else {
                        Some(Some(Ok(chunk.slice(lo as usize..hi as usize))))
                    }
                }
            };
            future::ready(out)
        })
        .filter_map(future::ready)
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::{stream, TryStreamExt};

    fn chunks(parts: &'static [&'static str]) -> ByteStream {
        stream::iter(parts.iter().map(|p| Ok(Bytes::from_static(p.as_bytes())))).boxed()
    }

    async fn collect(s: ByteStream) -> String {
        let parts: Vec<Bytes> = s.try_collect().await.unwrap();
        String::from_utf8(parts.concat()).unwrap()
    }

    #[tokio::test]
    async fn window_inside_one_chunk() {
        let s = slice_stream(chunks(&["hello world"]), 6, 5);
        assert_eq!(collect(s).await, "world");
    }

    #[tokio::test]
    async fn window_across_chunks() {
        let s = slice_stream(chunks(&["abc", "def", "ghi", "jkl"]), 2, 6);
        assert_eq!(collect(s).await, "cdefgh");
    }

    #[tokio::test]
    async fn window_at_edges() {
        assert_eq!(collect(slice_stream(chunks(&["abc", "def"]), 0, 6)).await, "abcdef");
        assert_eq!(collect(slice_stream(chunks(&["abc", "def"]), 5, 1)).await, "f");
        assert_eq!(collect(slice_stream(chunks(&["abc", "def"]), 0, 0)).await, "");
    }

    #[tokio::test]
    async fn stops_pulling_after_window() {
        let polled = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = polled.clone();
        let inner = stream::iter(0..100)
            .map(move |_| {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(Bytes::from_static(b"xx"))
            })
            .boxed();

        assert_eq!(collect(slice_stream(inner, 0, 4)).await, "xxxx");
        assert!(polled.load(std::sync::atomic::Ordering::SeqCst) <= 3);
    }
}
