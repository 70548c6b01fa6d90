use chrono::Utc;
use teloxide::prelude::*;

use fsb_core::store::User;

use crate::router::AppState;

use super::{send_view, subscription, views};

pub(crate) async fn handle_command(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    user: &User,
    cmd: &str,
) -> anyhow::Result<()> {
    let chat_id = msg.chat.id;

    match cmd {
        "start" => {
            if !subscription::enforce(bot, state, chat_id, user.id).await? {
                return Ok(());
            }
            send_view(
                bot,
                chat_id,
                views::welcome_text(user.id, &user.full_name()),
                Some(views::welcome_keyboard()),
            )
            .await?;
        }
        "help" => {
            send_view(
                bot,
                chat_id,
                views::help_text(state.cfg.effective_max_file_size(), state.cfg.bot_api_capped()),
                Some(views::help_keyboard()),
            )
            .await?;
        }
        "about" => {
            send_view(bot, chat_id, views::about_text(), Some(views::about_keyboard())).await?;
        }
        "stats" => {
            let text = user_stats(state, user).await?;
            send_view(bot, chat_id, text, Some(views::stats_keyboard())).await?;
        }
        _ => {}
    }
    Ok(())
}

pub(crate) async fn user_stats(state: &AppState, user: &User) -> anyhow::Result<String> {
    let (views_total, downloads) = state.store.user_file_totals(user.id).await?;
    Ok(views::user_stats_text(user, views_total, downloads, Utc::now()))
}
