use reqwest::Url;

use crate::{errors::Error, Result};

/// Public links handed out for one stored file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileLinks {
    pub stream: String,
    pub download: String,
    pub short: String,
}

impl FileLinks {
    /// `base` is the public server URL (see `Config::url`). The file name is
    /// percent-encoded as a single path segment.
    pub fn build(base: &str, message_id: i32, file_name: &str, hash: &str) -> Result<Self> {
        let base = Url::parse(base).map_err(|e| Error::Config(format!("invalid public url {base:?}: {e}")))?;

        Ok(Self {
            stream: file_url(&base, "watch", message_id, file_name, hash)?,
            download: file_url(&base, "dl", message_id, file_name, hash)?,
            short: segment_url(&base, &[hash])?.to_string(),
        })
    }
}

fn file_url(base: &Url, route: &str, message_id: i32, file_name: &str, hash: &str) -> Result<String> {
    let mut url = segment_url(base, &[route, &message_id.to_string(), file_name])?;
    url.query_pairs_mut().append_pair("hash", hash);
    Ok(url.to_string())
}

fn segment_url(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| Error::Config(format!("public url cannot be a base: {base}")))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_all_three_links() {
        let links = FileLinks::build("http://files.example.com:8080/", 42, "movie.mp4", "0123456789ab").unwrap();
        assert_eq!(links.stream, "http://files.example.com:8080/watch/42/movie.mp4?hash=0123456789ab");
        assert_eq!(links.download, "http://files.example.com:8080/dl/42/movie.mp4?hash=0123456789ab");
        assert_eq!(links.short, "http://files.example.com:8080/0123456789ab");
    }

    #[test]
    fn file_name_is_a_single_encoded_segment() {
        let links = FileLinks::build("https://x.test/", 7, "Band - Song/1?.mp3", "abc").unwrap();
        assert_eq!(links.download, "https://x.test/dl/7/Band%20-%20Song%2F1%3F.mp3?hash=abc");
    }

    #[test]
    fn rejects_garbage_base() {
        assert!(FileLinks::build("not a url", 1, "a", "b").is_err());
    }
}
