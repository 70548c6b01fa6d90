use chrono::Utc;
use teloxide::prelude::*;

use fsb_core::{
    domain::{ChatId as CoreChatId, MessageId as CoreMessageId, MessageRef},
    messaging::port::MessagingPort,
};

use crate::media::profile_of;
use crate::router::AppState;

use super::{admin, commands, edit_view, subscription, views};

/// What to answer the callback query with.
enum Answer {
    Silent,
    Toast(String),
    Alert(String),
}

pub(crate) async fn handle_callback(bot: &Bot, q: &CallbackQuery, state: &AppState) -> anyhow::Result<()> {
    let data = q.data.as_deref().unwrap_or_default();
    let answer = route(bot, q, state, data).await?;

    let req = bot.answer_callback_query(q.id.clone());
    match answer {
        Answer::Silent => req.await?,
        Answer::Toast(text) => req.text(text).await?,
        Answer::Alert(text) => req.text(text).show_alert(true).await?,
    };
    Ok(())
}

async fn route(bot: &Bot, q: &CallbackQuery, state: &AppState, data: &str) -> anyhow::Result<Answer> {
    let Some(msg) = q.message.as_ref() else {
        return Ok(Answer::Silent);
    };
    let user_id = q.from.id.0 as i64;
    let user = state.store.get_or_create_user(user_id, &profile_of(&q.from)).await?;

    if let Some(hash) = data.strip_prefix("file_stats:") {
        let own = state.store.find_user_file_by_hash(user_id, hash).await?;
        let file = match own {
            Some(f) => Some(f),
            None => state.store.find_file_by_hash(hash).await?,
        };
        return Ok(match file {
            Some(file) => Answer::Alert(views::file_stats_alert(&file)),
            None => Answer::Alert("❌ File not found.".to_string()),
        });
    }
    if let Some(hash) = data.strip_prefix("delete_file:") {
        return delete_file(bot, msg, state, user_id, hash).await;
    }

    match data {
        "home" => {
            edit_view(
                bot,
                msg,
                views::welcome_text(user.id, &user.full_name()),
                Some(views::welcome_keyboard()),
            )
            .await?;
        }
        "help" => {
            edit_view(
                bot,
                msg,
                views::help_text(state.cfg.effective_max_file_size(), state.cfg.bot_api_capped()),
                Some(views::help_keyboard()),
            )
            .await?;
        }
        "about" => {
            edit_view(bot, msg, views::about_text(), Some(views::about_keyboard())).await?;
        }
        "settings" => {
            edit_view(bot, msg, views::settings_text(&user), Some(views::home_keyboard())).await?;
        }
        "stats" | "refresh_stats" => {
            let text = commands::user_stats(state, &user).await?;
            edit_view(bot, msg, text, Some(views::stats_keyboard())).await?;
            if data == "refresh_stats" {
                return Ok(Answer::Toast("🔄 Refreshed".to_string()));
            }
        }
        "detailed_stats" => {
            let files = state.store.files_for_user(user.id).await?;
            edit_view(
                bot,
                msg,
                views::detailed_stats_text(&files, 10),
                Some(views::detailed_stats_keyboard()),
            )
            .await?;
        }
        "check_sub" => return check_sub(bot, msg, state, user_id).await,
        "admin_users" | "admin_stats" => {
            if !state.cfg.is_admin(user_id) {
                return Ok(Answer::Alert("❌ Admins only.".to_string()));
            }
            let text = if data == "admin_users" {
                admin::users_overview(state).await?
            } else {
                let stats = state.store.refresh_bot_stats().await?;
                views::global_stats_text(&stats, Utc::now())
            };
            edit_view(bot, msg, text, Some(views::admin_keyboard())).await?;
        }
        other => tracing::debug!(data = other, "unknown callback"),
    }
    Ok(Answer::Silent)
}

async fn check_sub(bot: &Bot, msg: &Message, state: &AppState, user_id: i64) -> anyhow::Result<Answer> {
    let Some(channel) = state.cfg.force_sub_target() else {
        edit_view(bot, msg, views::subscribed_text(), None).await?;
        return Ok(Answer::Silent);
    };

    match subscription::is_member(bot, channel, user_id).await {
        Ok(true) => {
            edit_view(bot, msg, views::subscribed_text(), None).await?;
            Ok(Answer::Silent)
        }
        Ok(false) => Ok(Answer::Alert("❌ You haven't joined the channel yet!".to_string())),
        Err(e) => {
            tracing::error!(user_id, "subscription check error: {e}");
            Ok(Answer::Alert(
                "❌ Error checking subscription. Please try again.".to_string(),
            ))
        }
    }
}

/// Only the uploader may delete. Removes the bin channel copy and the record.
async fn delete_file(bot: &Bot, msg: &Message, state: &AppState, user_id: i64, hash: &str) -> anyhow::Result<Answer> {
    let Some(file) = state.store.find_user_file_by_hash(user_id, hash).await? else {
        let text = if state.store.find_file_by_hash(hash).await?.is_some() {
            "❌ Only the uploader can delete this file."
        } else {
            "❌ File not found."
        };
        return Ok(Answer::Alert(text.to_string()));
    };

    let bin_copy = MessageRef {
        chat_id: CoreChatId(state.cfg.bin_channel),
        message_id: CoreMessageId(file.message_id),
    };
    if let Err(e) = state.messenger.delete_message(bin_copy).await {
        tracing::warn!(message_id = file.message_id, "bin channel delete failed: {e}");
    }
    state.store.delete_file(file.id).await?;
    tracing::info!(user_id, hash, "file deleted");

    let name = file.file_name.as_deref().unwrap_or("unnamed");
    edit_view(bot, msg, views::file_deleted_text(name), None).await?;
    Ok(Answer::Toast("🗑 Deleted".to_string()))
}
