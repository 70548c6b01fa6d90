use chrono::{Duration, Utc};
use teloxide::prelude::*;

use fsb_core::{
    domain::{ChatId as CoreChatId, MessageRef},
    messaging::port::MessagingPort,
    store::{BroadcastStatus, User},
};

use crate::router::AppState;

use super::{send_view, views};

const ADMIN_COMMANDS: &[&str] = &[
    "admin",
    "users",
    "user",
    "ban",
    "unban",
    "broadcast",
    "broadcast_stats",
    "stats_global",
];

const PROGRESS_EVERY: u64 = 10;
const RECENT_ADMIN_LOGS: i64 = 5;

pub(crate) fn is_admin_command(cmd: &str) -> bool {
    ADMIN_COMMANDS.contains(&cmd)
}

pub(crate) async fn handle_admin_command(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    admin: &User,
    cmd: &str,
    arg: &str,
) -> anyhow::Result<()> {
    let chat_id = msg.chat.id;

    match cmd {
        "admin" => {
            let recent = state.store.recent_admin_logs(RECENT_ADMIN_LOGS).await?;
            let text = views::admin_text(&recent, Utc::now());
            send_view(bot, chat_id, text, Some(views::admin_keyboard())).await?;
        }
        "users" => {
            send_view(bot, chat_id, users_overview(state).await?, None).await?;
        }
        "user" => {
            let Some(target) = parse_user_id(arg) else {
                send_view(bot, chat_id, "<b>Usage:</b> /user &lt;user_id&gt;", None).await?;
                return Ok(());
            };
            let text = match state.store.get_user(target).await? {
                Some(u) => {
                    let (v, d) = state.store.user_file_totals(u.id).await?;
                    views::user_info_text(&u, v, d)
                }
                None => "❌ User not found.".to_string(),
            };
            send_view(bot, chat_id, text, None).await?;
        }
        "ban" | "unban" => {
            let banned = cmd == "ban";
            let Some(target) = parse_user_id(arg) else {
                send_view(bot, chat_id, format!("<b>Usage:</b> /{cmd} &lt;user_id&gt;"), None).await?;
                return Ok(());
            };
            let text = set_ban(state, admin.id, target, banned).await?;
            send_view(bot, chat_id, text, None).await?;
        }
        "broadcast" => {
            if !state.cfg.enable_broadcast {
                send_view(bot, chat_id, "❌ Broadcasting is disabled.", None).await?;
                return Ok(());
            }
            if arg.is_empty() {
                send_view(bot, chat_id, views::broadcast_usage_text(), None).await?;
                return Ok(());
            }
            broadcast(state, admin.id, CoreChatId(chat_id.0), arg).await?;
        }
        "broadcast_stats" => {
            let recent = state.store.recent_broadcasts(10).await?;
            send_view(bot, chat_id, views::broadcast_stats_text(&recent), None).await?;
        }
        "stats_global" => {
            let stats = state.store.refresh_bot_stats().await?;
            send_view(bot, chat_id, views::global_stats_text(&stats, Utc::now()), None).await?;
        }
        _ => {}
    }
    Ok(())
}

fn parse_user_id(arg: &str) -> Option<i64> {
    arg.split_whitespace().next()?.parse().ok()
}

pub(crate) async fn users_overview(state: &AppState) -> anyhow::Result<String> {
    let now = Utc::now();
    let summary = state.store.user_summary().await?;
    let today = state.store.new_users_since(now - Duration::days(1)).await?;
    let week = state.store.new_users_since(now - Duration::days(7)).await?;
    let month = state.store.new_users_since(now - Duration::days(30)).await?;
    Ok(views::users_text(&summary, today, week, month))
}

async fn set_ban(state: &AppState, admin_id: i64, target: i64, banned: bool) -> anyhow::Result<String> {
    if banned && state.cfg.is_admin(target) {
        return Ok("❌ Admins cannot be banned.".to_string());
    }
    if !state.store.set_banned(target, banned).await? {
        return Ok("❌ User not found.".to_string());
    }

    let action = if banned { "ban" } else { "unban" };
    state.store.log_admin_action(admin_id, action, Some(target), None).await?;
    tracing::info!(admin_id, target, "{action}");

    Ok(if banned {
        format!("🔨 User <code>{target}</code> has been banned.")
    } else {
        format!("✅ User <code>{target}</code> has been unbanned.")
    })
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct BroadcastOutcome {
    pub success: u64,
    pub failed: u64,
}

/// Send `html` to every recipient through `sender`, editing `status` every
/// few users and once at the end.
pub(crate) async fn run_broadcast(
    sender: &dyn MessagingPort,
    progress: &dyn MessagingPort,
    status: MessageRef,
    recipients: &[i64],
    html: &str,
) -> BroadcastOutcome {
    let total = recipients.len() as u64;
    let mut out = BroadcastOutcome::default();

    for (i, &user_id) in recipients.iter().enumerate() {
        match sender.send_html(CoreChatId(user_id), html).await {
            Ok(_) => out.success += 1,
            Err(e) => {
                out.failed += 1;
                tracing::warn!(user_id, "broadcast send failed: {e}");
            }
        }

        let done = i as u64 + 1;
        if done % PROGRESS_EVERY == 0 || done == total {
            let text = views::broadcast_progress_text(done, total, out.success, out.failed);
            if let Err(e) = progress.edit_html(status, &text).await {
                tracing::debug!("broadcast progress edit failed: {e}");
            }
        }
    }
    out
}

async fn broadcast(state: &AppState, admin_id: i64, chat_id: CoreChatId, text: &str) -> anyhow::Result<()> {
    let recipients = state.store.broadcast_recipients().await?;
    let total = recipients.len() as u64;

    let record_id = state.store.create_broadcast(admin_id, text, total as i64).await?;
    let status = state
        .messenger
        .send_html(chat_id, &views::broadcast_start_text(total))
        .await?;

    let outcome = run_broadcast(
        state.broadcaster.as_ref(),
        state.messenger.as_ref(),
        status,
        &recipients,
        &views::broadcast_message(text),
    )
    .await;

    let final_status = if total > 0 && outcome.success == 0 {
        BroadcastStatus::Failed
    } else {
        BroadcastStatus::Completed
    };
    state
        .store
        .finish_broadcast(record_id, outcome.success as i64, outcome.failed as i64, final_status)
        .await?;
    state
        .store
        .log_admin_action(
            admin_id,
            "broadcast",
            None,
            Some(&format!("broadcast #{record_id}: {}/{total} delivered", outcome.success)),
        )
        .await?;

    state
        .messenger
        .edit_html(status, &views::broadcast_report_text(total, outcome.success, outcome.failed))
        .await?;
    tracing::info!(admin_id, total, success = outcome.success, failed = outcome.failed, "broadcast finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use fsb_core::{domain::MessageId, Error, Result};

    fn status_ref(chat_id: i64, message_id: i32) -> MessageRef {
        MessageRef {
            chat_id: CoreChatId(chat_id),
            message_id: MessageId(message_id),
        }
    }

    #[derive(Default)]
    struct Fake {
        fail_for: Vec<i64>,
        sent: Mutex<Vec<i64>>,
        edits: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessagingPort for Fake {
        async fn send_html(&self, chat_id: CoreChatId, _html: &str) -> Result<MessageRef> {
            if self.fail_for.contains(&chat_id.0) {
                return Err(Error::External("blocked by user".to_string()));
            }
            self.sent.lock().unwrap().push(chat_id.0);
            Ok(status_ref(chat_id.0, 1))
        }

        async fn edit_html(&self, _msg: MessageRef, html: &str) -> Result<()> {
            self.edits.lock().unwrap().push(html.to_string());
            Ok(())
        }

        async fn delete_message(&self, _msg: MessageRef) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn counts_successes_and_failures() {
        let sender = Fake {
            fail_for: vec![3, 7],
            ..Default::default()
        };
        let progress = Fake::default();
        let recipients: Vec<i64> = (1..=12).collect();

        let out = run_broadcast(&sender, &progress, status_ref(99, 5), &recipients, "hi").await;
        assert_eq!(out, BroadcastOutcome { success: 10, failed: 2 });
        assert_eq!(sender.sent.lock().unwrap().len(), 10);

        // after the 10th user and after the last one
        let edits = progress.edits.lock().unwrap();
        assert_eq!(edits.len(), 2);
        assert!(edits[1].contains("100.0%"));
    }

    #[tokio::test]
    async fn empty_recipient_list_sends_nothing() {
        let sender = Fake::default();
        let progress = Fake::default();
        let out = run_broadcast(&sender, &progress, status_ref(1, 1), &[], "hi").await;
        assert_eq!(out, BroadcastOutcome::default());
        assert!(progress.edits.lock().unwrap().is_empty());
    }

    #[test]
    fn admin_command_set() {
        assert!(is_admin_command("broadcast_stats"));
        assert!(!is_admin_command("start"));
        assert_eq!(parse_user_id(" 123 extra"), Some(123));
        assert_eq!(parse_user_id("abc"), None);
    }
}
