//! Telegram update handlers.
//!
//! Every private message upserts its sender first. Handlers report their own
//! failures to the user; anything that still bubbles up is logged here so the
//! dispatcher keeps running.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, InlineKeyboardMarkup, Message, ParseMode},
    RequestError,
};

use crate::media::{media_of, profile_of};
use crate::router::AppState;

mod admin;
mod callback;
mod commands;
mod file;
mod subscription;
pub mod views;

pub async fn handle_callback(bot: Bot, q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let data = q.data.clone().unwrap_or_default();
    if let Err(e) = callback::handle_callback(&bot, &q, &state).await {
        tracing::error!(user_id = q.from.id.0, data = %data, "callback failed: {e:#}");
        let _ = bot.answer_callback_query(q.id.clone()).await;
    }
    Ok(())
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if !msg.chat.is_private() {
        return Ok(());
    }
    let Some(from) = msg.from() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;

    let user = match state.store.get_or_create_user(user_id, &profile_of(from)).await {
        Ok(u) => u,
        Err(e) => {
            tracing::error!(user_id, "user upsert failed: {e}");
            let _ = bot
                .send_message(msg.chat.id, "❌ Something went wrong. Please try again later.")
                .await;
            return Ok(());
        }
    };

    let outcome = if let Some(text) = msg.text() {
        if !text.starts_with('/') {
            return Ok(());
        }
        let (cmd, arg) = parse_command(text);
        if admin::is_admin_command(&cmd) {
            if !state.cfg.is_admin(user_id) {
                return Ok(());
            }
            admin::handle_admin_command(&bot, &msg, &state, &user, &cmd, &arg).await
        } else {
            commands::handle_command(&bot, &msg, &state, &user, &cmd).await
        }
    } else if media_of(&msg).is_some() {
        file::handle_file(&bot, &msg, &state, &user).await
    } else {
        return Ok(());
    };

    if let Err(e) = outcome {
        tracing::error!(user_id, "message handler failed: {e:#}");
    }
    Ok(())
}

/// `/cmd@botname rest of line` → (`cmd`, `rest of line`).
pub(crate) fn parse_command(text: &str) -> (String, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub(crate) async fn send_view(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    keyboard: Option<InlineKeyboardMarkup>,
) -> ResponseResult<Message> {
    let mut req = bot
        .send_message(chat_id, text.into())
        .parse_mode(ParseMode::Html)
        .disable_web_page_preview(true);
    if let Some(kb) = keyboard {
        req = req.reply_markup(kb);
    }
    req.await
}

/// Re-render a message in place. Re-rendering identical content is not an
/// error.
pub(crate) async fn edit_view(
    bot: &Bot,
    msg: &Message,
    text: impl Into<String>,
    keyboard: Option<InlineKeyboardMarkup>,
) -> ResponseResult<()> {
    let mut req = bot
        .edit_message_text(msg.chat.id, msg.id, text.into())
        .parse_mode(ParseMode::Html)
        .disable_web_page_preview(true);
    if let Some(kb) = keyboard {
        req = req.reply_markup(kb);
    }
    match req.await {
        Ok(_) => Ok(()),
        Err(RequestError::Api(teloxide::ApiError::MessageNotModified)) => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_bot_suffix_and_args() {
        assert_eq!(parse_command("/start"), ("start".to_string(), String::new()));
        assert_eq!(
            parse_command("/Broadcast@FileBot  hello   world "),
            ("broadcast".to_string(), "hello   world".to_string())
        );
        assert_eq!(parse_command("/ban 12345"), ("ban".to_string(), "12345".to_string()));
    }
}
