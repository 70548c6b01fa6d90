//! Force-subscribe gate.

use teloxide::{prelude::*, types::Recipient, RequestError};

use crate::router::AppState;

use super::{send_view, views};

/// `@name` or a numeric chat id.
pub(crate) fn channel_recipient(channel: &str) -> Recipient {
    match channel.trim().parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(channel.trim().to_string()),
    }
}

/// Owners, administrators, members and restricted members count as joined.
pub(crate) async fn is_member(bot: &Bot, channel: &str, user_id: i64) -> Result<bool, RequestError> {
    let member = bot
        .get_chat_member(channel_recipient(channel), UserId(user_id as u64))
        .await?;
    Ok(member.kind.is_present())
}

/// Returns false when the user was shown the join prompt instead.
/// A failing membership lookup lets the user through.
pub(crate) async fn enforce(bot: &Bot, state: &AppState, chat_id: ChatId, user_id: i64) -> anyhow::Result<bool> {
    let Some(channel) = state.cfg.force_sub_target() else {
        return Ok(true);
    };

    match is_member(bot, channel, user_id).await {
        Ok(true) => Ok(true),
        Ok(false) => {
            send_view(
                bot,
                chat_id,
                views::force_sub_text(channel),
                Some(views::force_sub_keyboard(channel)),
            )
            .await?;
            Ok(false)
        }
        Err(e) => {
            tracing::error!(user_id, "force sub check error: {e}");
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipient_from_username_or_id() {
        assert_eq!(
            channel_recipient("@updates"),
            Recipient::ChannelUsername("@updates".to_string())
        );
        assert_eq!(channel_recipient("-1001234567890"), Recipient::Id(ChatId(-1001234567890)));
    }
}
