//! Upload flow: validate, copy into the bin channel, record, reply with links.

use teloxide::{prelude::*, types::ParseMode};

use fsb_core::{
    domain::ChatId as CoreChatId,
    links::FileLinks,
    media::{validate_file_extension, validate_file_size, MediaInfo},
    store::{NewFile, User},
};

use crate::media::media_of;
use crate::router::AppState;
use crate::with_retry;

use super::{edit_view, send_view, subscription, views};

pub(crate) async fn handle_file(bot: &Bot, msg: &Message, state: &AppState, user: &User) -> anyhow::Result<()> {
    let chat_id = msg.chat.id;

    if !subscription::enforce(bot, state, chat_id, user.id).await? {
        return Ok(());
    }
    if user.is_banned {
        send_view(bot, chat_id, "🚫 You are banned from using this bot.", None).await?;
        return Ok(());
    }

    let Some(media) = media_of(msg) else {
        return Ok(());
    };
    let file_name = media.display_name();

    let cfg = &state.cfg;
    let checks = validate_file_size(media.file_size, cfg.min_file_size, cfg.effective_max_file_size())
        .and_then(|_| validate_file_extension(&file_name, &cfg.allowed_extensions));
    if let Err(reason) = checks {
        send_view(bot, chat_id, format!("❌ {reason}"), None).await?;
        return Ok(());
    }

    let processing = bot
        .send_message(chat_id, views::processing_text(&file_name, media.file_size))
        .parse_mode(ParseMode::Html)
        .reply_to_message_id(msg.id)
        .await?;

    match store_upload(bot, msg, state, user, &media, &file_name).await {
        Ok((links, hash)) => {
            edit_view(
                bot,
                &processing,
                views::upload_success_text(&file_name, media.file_size, media.kind, &links),
                Some(views::upload_keyboard(&links, &hash)),
            )
            .await?;
            tracing::info!(user_id = user.id, hash = %hash, "file uploaded: {file_name}");

            if let Some(log_channel) = cfg.log_channel {
                let line = views::upload_log_line(user.id, &user.full_name(), &file_name, media.file_size, &links.short);
                if let Err(e) = state.messenger.send_html(CoreChatId(log_channel), &line).await {
                    tracing::warn!("log channel notice failed: {e}");
                }
            }
        }
        Err(e) => {
            tracing::error!(user_id = user.id, "file upload error: {e:#}");
            edit_view(bot, &processing, views::upload_failed_text(), None).await?;
        }
    }
    Ok(())
}

async fn store_upload(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    user: &User,
    media: &MediaInfo,
    file_name: &str,
) -> anyhow::Result<(FileLinks, String)> {
    let cfg = &state.cfg;
    let forwarded = with_retry(cfg.sleep_threshold, || {
        bot.forward_message(ChatId(cfg.bin_channel), msg.chat.id, msg.id)
    })
    .await?;

    // file ids are taken from the bin channel copy, which outlives the user's chat
    let stored = media_of(&forwarded).unwrap_or_else(|| media.clone());
    let hash = stored.hash();
    let links = FileLinks::build(&cfg.url(), forwarded.id.0, file_name, &hash)?;

    state
        .store
        .record_upload(&NewFile {
            file_id: stored.file_id.clone(),
            file_unique_id: stored.file_unique_id.clone(),
            file_hash: hash.clone(),
            message_id: forwarded.id.0,
            user_id: user.id,
            file_name: Some(file_name.to_string()),
            file_size: media.file_size as i64,
            file_type: media.kind,
            mime_type: Some(media.effective_mime()),
        })
        .await?;

    Ok((links, hash))
}
