//! Framework-neutral view of the media attached to a Telegram message.

use std::fmt;

use crate::formatting::format_size;

/// Media kinds the bot accepts, in the order they are looked up on a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Document,
    Video,
    Audio,
    Animation,
    Voice,
    VideoNote,
    Photo,
    Sticker,
}

impl MediaKind {
    pub const ALL: [MediaKind; 8] = [
        MediaKind::Document,
        MediaKind::Video,
        MediaKind::Audio,
        MediaKind::Animation,
        MediaKind::Voice,
        MediaKind::VideoNote,
        MediaKind::Photo,
        MediaKind::Sticker,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Document => "document",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Animation => "animation",
            MediaKind::Voice => "voice",
            MediaKind::VideoNote => "video_note",
            MediaKind::Photo => "photo",
            MediaKind::Sticker => "sticker",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Title-cased label for user-facing messages ("Video Note").
    pub fn label(self) -> String {
        self.as_str()
            .split('_')
            .map(|w| {
                let mut c = w.chars();
                match c.next() {
                    Some(first) => first.to_uppercase().chain(c).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaInfo {
    pub kind: MediaKind,
    pub file_id: String,
    pub file_unique_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: u64,
    /// Audio only.
    pub title: Option<String>,
    /// Audio only.
    pub performer: Option<String>,
}

impl MediaInfo {
    pub fn hash(&self) -> String {
        file_hash(&self.file_unique_id)
    }

    /// File name shown to users and used in links.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.file_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }

        let uid = &self.file_unique_id;
        match self.kind {
            MediaKind::Photo => format!("photo_{uid}.jpg"),
            MediaKind::Video => format!("video_{uid}.mp4"),
            MediaKind::Audio => {
                let title = self.title.as_deref().unwrap_or("audio");
                let performer = self.performer.as_deref().unwrap_or("unknown");
                format!("{performer} - {title}.mp3")
            }
            MediaKind::Voice => format!("voice_{uid}.ogg"),
            MediaKind::VideoNote => format!("video_note_{uid}.mp4"),
            MediaKind::Sticker => format!("sticker_{uid}.webp"),
            MediaKind::Animation => format!("animation_{uid}.gif"),
            MediaKind::Document => format!("file_{uid}"),
        }
    }

    /// Reported MIME type, or one guessed from the display name.
    pub fn effective_mime(&self) -> String {
        match self.mime_type.as_deref().filter(|m| !m.is_empty()) {
            Some(m) => m.to_string(),
            None => guess_mime(&self.display_name()).to_string(),
        }
    }
}

/// Short link token: first 12 hex chars of the MD5 of Telegram's
/// `file_unique_id`.
pub fn file_hash(file_unique_id: &str) -> String {
    let digest = md5::compute(file_unique_id.as_bytes());
    let mut hex = format!("{digest:x}");
    hex.truncate(12);
    hex
}

pub fn validate_file_size(size: u64, min: u64, max: u64) -> Result<(), String> {
    if size < min {
        return Err(format!("File too small. Minimum size: {}", format_size(min)));
    }
    if size > max {
        return Err(format!("File too large. Maximum size: {}", format_size(max)));
    }
    Ok(())
}

/// An empty allow-list accepts everything. Entries are lowercase and without
/// the leading dot.
pub fn validate_file_extension(file_name: &str, allowed: &[String]) -> Result<(), String> {
    if allowed.is_empty() {
        return Ok(());
    }

    if let Some(ext) = extension(file_name) {
        if allowed.iter().any(|a| a == &ext) {
            return Ok(());
        }
    }

    Err(format!(
        "File type not allowed. Allowed types: {}",
        allowed.join(", ")
    ))
}

fn extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

pub fn guess_mime(file_name: &str) -> &'static str {
    let Some(ext) = extension(file_name) else {
        return "application/octet-stream";
    };

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "rar" => "application/vnd.rar",
        "7z" => "application/x-7z-compressed",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "apk" => "application/vnd.android.package-archive",
        "json" => "application/json",
        "txt" | "log" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "srt" => "application/x-subrip",
        "vtt" => "text/vtt",
        _ => "application/octet-stream",
    }
}
