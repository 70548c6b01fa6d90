//! teloxide message → framework-neutral `MediaInfo`.

use teloxide::types::{FileMeta, Message, User};

use fsb_core::{
    media::{MediaInfo, MediaKind},
    store::UserProfile,
};

fn info(kind: MediaKind, file: &FileMeta) -> MediaInfo {
    MediaInfo {
        kind,
        file_id: file.id.clone(),
        file_unique_id: file.unique_id.clone(),
        file_name: None,
        mime_type: None,
        file_size: file.size as u64,
        title: None,
        performer: None,
    }
}

/// First attached media in lookup order; photos use the largest size.
pub fn media_of(msg: &Message) -> Option<MediaInfo> {
    if let Some(d) = msg.document() {
        return Some(MediaInfo {
            file_name: d.file_name.clone(),
            mime_type: d.mime_type.as_ref().map(|m| m.to_string()),
            ..info(MediaKind::Document, &d.file)
        });
    }
    if let Some(v) = msg.video() {
        return Some(MediaInfo {
            file_name: v.file_name.clone(),
            mime_type: v.mime_type.as_ref().map(|m| m.to_string()),
            ..info(MediaKind::Video, &v.file)
        });
    }
    if let Some(a) = msg.audio() {
        return Some(MediaInfo {
            file_name: a.file_name.clone(),
            mime_type: a.mime_type.as_ref().map(|m| m.to_string()),
            title: a.title.clone(),
            performer: a.performer.clone(),
            ..info(MediaKind::Audio, &a.file)
        });
    }
    if let Some(a) = msg.animation() {
        return Some(MediaInfo {
            file_name: a.file_name.clone(),
            mime_type: a.mime_type.as_ref().map(|m| m.to_string()),
            ..info(MediaKind::Animation, &a.file)
        });
    }
    if let Some(v) = msg.voice() {
        return Some(MediaInfo {
            mime_type: v.mime_type.as_ref().map(|m| m.to_string()),
            ..info(MediaKind::Voice, &v.file)
        });
    }
    if let Some(v) = msg.video_note() {
        return Some(info(MediaKind::VideoNote, &v.file));
    }
    if let Some(sizes) = msg.photo() {
        let best = sizes.iter().max_by_key(|p| (p.width * p.height, p.file.size))?;
        return Some(info(MediaKind::Photo, &best.file));
    }
    if let Some(s) = msg.sticker() {
        return Some(info(MediaKind::Sticker, &s.file));
    }
    None
}

pub fn profile_of(user: &User) -> UserProfile {
    UserProfile {
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
        last_name: user.last_name.clone(),
        language_code: user.language_code.clone(),
        is_premium: Some(user.is_premium),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(extra: serde_json::Value) -> Message {
        let mut base = json!({
            "message_id": 1,
            "date": 1_700_000_000,
            "chat": {"id": 42, "type": "private", "first_name": "Ada"},
            "from": {"id": 42, "is_bot": false, "first_name": "Ada"},
        });
        if let (Some(obj), Some(ext)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in ext {
                obj.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn document_keeps_name_and_mime() {
        let msg = message(json!({
            "document": {
                "file_id": "doc-id",
                "file_unique_id": "doc-uid",
                "file_size": 2048,
                "file_name": "report.pdf",
                "mime_type": "application/pdf"
            }
        }));
        let m = media_of(&msg).unwrap();
        assert_eq!(m.kind, MediaKind::Document);
        assert_eq!(m.file_id, "doc-id");
        assert_eq!(m.file_size, 2048);
        assert_eq!(m.display_name(), "report.pdf");
        assert_eq!(m.mime_type.as_deref(), Some("application/pdf"));
    }

    #[test]
    fn photo_picks_largest_size() {
        let msg = message(json!({
            "photo": [
                {"file_id": "small", "file_unique_id": "s", "width": 90, "height": 90, "file_size": 1000},
                {"file_id": "big", "file_unique_id": "b", "width": 1280, "height": 720, "file_size": 90000}
            ]
        }));
        let m = media_of(&msg).unwrap();
        assert_eq!(m.kind, MediaKind::Photo);
        assert_eq!(m.file_id, "big");
        assert_eq!(m.display_name(), "photo_b.jpg");
    }

    #[test]
    fn text_message_has_no_media() {
        let msg = message(json!({"text": "hello"}));
        assert!(media_of(&msg).is_none());
    }

    #[test]
    fn profile_copies_telegram_fields() {
        let msg = message(json!({"text": "hi"}));
        let p = profile_of(msg.from().unwrap());
        assert_eq!(p.first_name.as_deref(), Some("Ada"));
        assert_eq!(p.is_premium, Some(false));
        assert!(p.username.is_none());
    }
}
