//! Message texts and inline keyboards. Everything here is pure so it can be
//! tested without a bot.

use chrono::{DateTime, Utc};
use reqwest::Url;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use fsb_core::{
    formatting::{
        create_progress_bar, escape_html, format_count, format_duration, format_size, get_readable_time, success_rate,
    },
    links::FileLinks,
    media::MediaKind,
    store::{AdminLog, BotStats, Broadcast, FileRecord, User, UserSummary},
};

pub const SUPPORT_URL: &str = "https://t.me/your_support_group";
pub const UPDATES_URL: &str = "https://t.me/your_updates_channel";
pub const SOURCE_URL: &str = "https://github.com/yourusername/repo";
pub const DEVELOPER_URL: &str = "https://t.me/yourusername";

const BOT_VERSION: &str = env!("CARGO_PKG_VERSION");
const GIB: i64 = 1024 * 1024 * 1024;

fn cb(text: &str, data: &str) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.to_string(), data.to_string())
}

fn link(text: &str, url: &str) -> Option<InlineKeyboardButton> {
    Url::parse(url)
        .ok()
        .map(|u| InlineKeyboardButton::url(text.to_string(), u))
}

fn keyboard(rows: Vec<Vec<Option<InlineKeyboardButton>>>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        rows.into_iter()
            .map(|r| r.into_iter().flatten().collect::<Vec<_>>())
            .filter(|r| !r.is_empty()),
    )
}

fn home_row() -> Vec<Option<InlineKeyboardButton>> {
    vec![Some(cb("🏠 Home", "home"))]
}

fn mention(user_id: i64, name: &str) -> String {
    format!(r#"<a href="tg://user?id={user_id}">{}</a>"#, escape_html(name))
}

// ---- general ----

pub fn welcome_text(user_id: i64, name: &str) -> String {
    format!(
        "🎉 <b>Welcome, {}!</b>\n\n\
I'm a <b>File Stream Bot</b> that can generate direct download links for your files.\n\n\
<b>✨ Features:</b>\n\
• 📁 Support for all file types\n\
• 🔗 Instant streaming links\n\
• 📊 File statistics tracking\n\
• 🚀 High-speed streaming\n\
• 🔒 Secure and private\n\n\
<b>📤 How to use:</b>\n\
Simply send me any file, and I'll give you a direct link!\n\n\
<b>🤖 Commands:</b>\n\
/help - Show help message\n\
/stats - View your statistics\n\
/about - About this bot\n\n\
<b>💡 Pro tip:</b> You can also forward files from other chats!",
        mention(user_id, name)
    )
}

pub fn welcome_keyboard() -> InlineKeyboardMarkup {
    keyboard(vec![
        vec![Some(cb("📚 Help", "help")), Some(cb("📊 Stats", "stats"))],
        vec![Some(cb("ℹ️ About", "about")), Some(cb("⚙️ Settings", "settings"))],
        vec![link("👥 Support Group", SUPPORT_URL), link("📢 Updates", UPDATES_URL)],
    ])
}

/// `capped` marks a size limit imposed by the public Bot API.
pub fn help_text(max_file_size: u64, capped: bool) -> String {
    let limit_note = if capped {
        "\n💡 Larger files need the bot owner to run a local Bot API server"
    } else {
        ""
    };
    format!(
        "📚 <b>Help Menu</b>\n\n\
<b>General Commands:</b>\n\
• /start - Start the bot\n\
• /help - Show this help message\n\
• /stats - View your statistics\n\
• /about - About this bot\n\n\
<b>File Commands:</b>\n\
• Just send me any file to get a streaming link!\n\n\
<b>Supported File Types:</b>\n\
📄 Documents\n🎥 Videos\n🎵 Audio files\n🖼 Photos\n🎤 Voice messages\n📹 Video notes\n✨ Animations (GIFs)\n🎨 Stickers\n\n\
<b>Features:</b>\n\
• <b>Instant Links</b> - Get streaming links immediately\n\
• <b>Large Files</b> - Upload files up to {}\n\
• <b>Statistics</b> - Track your file views and downloads\n\n\
<b>Tips:</b>\n\
💡 You can forward files from any chat\n\
💡 Links never expire\n\
💡 Share links with anyone{}",
        format_size(max_file_size),
        limit_note
    )
}

pub fn help_keyboard() -> InlineKeyboardMarkup {
    keyboard(vec![home_row(), vec![link("👥 Support", SUPPORT_URL)]])
}

pub fn about_text() -> String {
    format!(
        "ℹ️ <b>About This Bot</b>\n\n\
<b>🤖 Bot Information:</b>\n\
• <b>Name:</b> File Stream Bot\n\
• <b>Version:</b> {BOT_VERSION}\n\
• <b>Language:</b> Rust\n\
• <b>Framework:</b> teloxide + axum\n\n\
<b>🔧 Features:</b>\n\
• High-speed file streaming\n\
• Support for all file types\n\
• Real-time statistics\n\n\
<b>📝 Source Code:</b>\n\
This bot is open source!"
    )
}

pub fn about_keyboard() -> InlineKeyboardMarkup {
    keyboard(vec![
        vec![link("👨‍💻 Developer", DEVELOPER_URL), link("📦 Source", SOURCE_URL)],
        home_row(),
    ])
}

pub fn settings_text(user: &User) -> String {
    let flag = |on: bool| if on { "✅ On" } else { "❌ Off" };
    let caption = user
        .custom_caption
        .as_deref()
        .map(escape_html)
        .unwrap_or_else(|| "None".to_string());
    format!(
        "⚙️ <b>Your Settings</b>\n\n\
• <b>Notifications:</b> {}\n\
• <b>Show file info:</b> {}\n\
• <b>Language:</b> {}\n\
• <b>Custom caption:</b> {caption}",
        flag(user.notification_enabled),
        flag(user.show_file_info),
        escape_html(&user.language_code),
    )
}

pub fn home_keyboard() -> InlineKeyboardMarkup {
    keyboard(vec![home_row()])
}

// ---- per-user stats ----

pub fn achievements(user: &User, total_views: i64) -> Vec<&'static str> {
    let mut out = Vec::new();
    if user.files_uploaded >= 1 {
        out.push("🎯 First Upload");
    }
    if user.files_uploaded >= 10 {
        out.push("📦 10 Files Uploaded");
    }
    if user.files_uploaded >= 100 {
        out.push("💎 100 Files Master");
    }
    if user.total_size_uploaded >= GIB {
        out.push("💾 1GB+ Uploaded");
    }
    if total_views >= 1000 {
        out.push("👁 1K+ Views");
    }
    out
}

fn achievements_block(user: &User, total_views: i64) -> String {
    let list = achievements(user, total_views);
    if list.is_empty() {
        return "• No achievements yet".to_string();
    }
    list.iter().map(|a| format!("• {a}")).collect::<Vec<_>>().join("\n")
}

pub fn user_stats_text(user: &User, views: i64, downloads: i64, now: DateTime<Utc>) -> String {
    let days = (now - user.joined_date).num_days().max(0);
    format!(
        "📊 <b>Your Statistics</b>\n\n\
👤 <b>User Info:</b>\n\
• <b>Name:</b> {}\n\
• <b>User ID:</b> <code>{}</code>\n\
• <b>Joined:</b> {days} days ago\n\n\
📁 <b>File Statistics:</b>\n\
• <b>Total Files:</b> {}\n\
• <b>Total Size:</b> {}\n\
• <b>Total Views:</b> {}\n\
• <b>Total Downloads:</b> {}\n\n\
📈 <b>Activity:</b>\n\
• <b>Last Active:</b> {}\n\
• <b>Status:</b> {}\n\
• <b>Account Type:</b> {}\n\n\
🏆 <b>Achievements:</b>\n{}",
        escape_html(&user.full_name()),
        user.id,
        format_count(user.files_uploaded),
        format_size(user.total_size_uploaded.max(0) as u64),
        format_count(views),
        format_count(downloads),
        user.last_activity.format("%Y-%m-%d %H:%M"),
        if user.is_banned { "🔴 Banned" } else { "🟢 Active" },
        if user.is_premium { "⭐ Premium" } else { "👤 Free" },
        achievements_block(user, views),
    )
}

pub fn stats_keyboard() -> InlineKeyboardMarkup {
    keyboard(vec![
        vec![Some(cb("🔄 Refresh", "refresh_stats")), Some(cb("📈 Detailed", "detailed_stats"))],
        home_row(),
    ])
}

/// Most recent uploads with their counters.
pub fn detailed_stats_text(files: &[FileRecord], limit: usize) -> String {
    if files.is_empty() {
        return "📈 <b>Detailed Statistics</b>\n\nYou haven't uploaded any files yet.".to_string();
    }
    let mut out = format!(
        "📈 <b>Detailed Statistics</b>\n\nShowing {} of {} files:\n",
        files.len().min(limit),
        files.len()
    );
    for f in files.iter().take(limit) {
        let name = f.file_name.as_deref().unwrap_or("unnamed");
        out.push_str(&format!(
            "\n• <code>{}</code>\n  {} · 👁 {} · 📥 {}",
            escape_html(name),
            format_size(f.file_size.max(0) as u64),
            format_count(f.views),
            format_count(f.downloads),
        ));
    }
    out
}

pub fn detailed_stats_keyboard() -> InlineKeyboardMarkup {
    keyboard(vec![vec![Some(cb("⬅️ Back", "stats")), Some(cb("🏠 Home", "home"))]])
}

// ---- force subscribe ----

/// `@name` channels get a t.me join link. Numeric ids have no public link.
pub fn channel_join_url(channel: &str) -> Option<String> {
    let name = channel.strip_prefix('@')?;
    if name.is_empty() {
        return None;
    }
    Some(format!("https://t.me/{name}"))
}

pub fn force_sub_text(channel: &str) -> String {
    format!(
        "❌ <b>Access Denied!</b>\n\n\
You need to join our channel to use this bot.\n\n\
👉 <b>Join Channel:</b> {}\n\n\
After joining, click <b>\"✅ Check\"</b> button below.",
        escape_html(channel)
    )
}

pub fn force_sub_keyboard(channel: &str) -> InlineKeyboardMarkup {
    let join = channel_join_url(channel).and_then(|u| link("📢 Join Channel", &u));
    keyboard(vec![vec![join, Some(cb("✅ Check", "check_sub"))]])
}

pub fn subscribed_text() -> &'static str {
    "✅ <b>Thank you for subscribing!</b>\nYou can now use the bot. Send /start to begin."
}

// ---- uploads ----

pub fn processing_text(name: &str, size: u64) -> String {
    format!(
        "⏳ <b>Processing your file...</b>\n📁 Name: <code>{}</code>\n📊 Size: {}",
        escape_html(name),
        format_size(size)
    )
}

pub fn upload_success_text(name: &str, size: u64, kind: MediaKind, links: &FileLinks) -> String {
    format!(
        "✅ <b>File Uploaded Successfully!</b>\n\n\
📁 <b>File Details:</b>\n\
• <b>Name:</b> <code>{}</code>\n\
• <b>Size:</b> {}\n\
• <b>Type:</b> {}\n\n\
🔗 <b>Your Links:</b>\n\
• <b>Stream Link:</b> <a href=\"{}\">Click Here</a>\n\
• <b>Download Link:</b> <a href=\"{}\">Click Here</a>\n\
• <b>Short Link:</b> <code>{}</code>\n\n\
📊 <b>Statistics:</b>\n\
• <b>Views:</b> 0\n\
• <b>Downloads:</b> 0\n\n\
💡 <b>Tip:</b> Share these links with anyone to let them stream or download your file!",
        escape_html(name),
        format_size(size),
        kind.label(),
        escape_html(&links.stream),
        escape_html(&links.download),
        escape_html(&links.short),
    )
}

pub fn upload_keyboard(links: &FileLinks, hash: &str) -> InlineKeyboardMarkup {
    keyboard(vec![
        vec![link("▶️ Stream", &links.stream), link("📥 Download", &links.download)],
        vec![
            Some(cb("📊 Stats", &format!("file_stats:{hash}"))),
            Some(cb("🗑 Delete", &format!("delete_file:{hash}"))),
        ],
        vec![Some(InlineKeyboardButton::switch_inline_query(
            "🔗 Share".to_string(),
            links.short.clone(),
        ))],
    ])
}

pub fn upload_failed_text() -> &'static str {
    "❌ <b>Error uploading file!</b>\nPlease try again later or contact support."
}

/// One-line notice for the log channel.
pub fn upload_log_line(user_id: i64, user_name: &str, file_name: &str, size: u64, short_link: &str) -> String {
    format!(
        "📤 {} (<code>{user_id}</code>) uploaded <code>{}</code> ({}) {}",
        escape_html(user_name),
        escape_html(file_name),
        format_size(size),
        escape_html(short_link),
    )
}

/// Callback alerts are plain text and capped at 200 chars by Telegram.
pub fn file_stats_alert(file: &FileRecord) -> String {
    let full = file.file_name.as_deref().unwrap_or("unnamed");
    let mut name: String = full.chars().take(120).collect();
    if full.chars().count() > 120 {
        name.push('…');
    }
    format!(
        "📊 {name}\n\n👁 Views: {}\n📥 Downloads: {}",
        format_count(file.views),
        format_count(file.downloads)
    )
}

pub fn file_deleted_text(name: &str) -> String {
    format!(
        "🗑 <b>File deleted.</b>\n\n<code>{}</code> is no longer available.",
        escape_html(name)
    )
}

// ---- admin ----

const ADMIN_MENU: &str = "👮 <b>Admin Panel</b>\n\n\
<b>User Management:</b>\n\
• /users - User statistics\n\
• /user &lt;user_id&gt; - Get user info\n\
• /ban &lt;user_id&gt; - Ban a user\n\
• /unban &lt;user_id&gt; - Unban a user\n\n\
<b>Broadcast:</b>\n\
• /broadcast &lt;message&gt; - Send message to all users\n\
• /broadcast_stats - View broadcast statistics\n\n\
<b>Statistics:</b>\n\
• /stats_global - Global bot statistics";

/// Admin menu followed by the latest admin actions, newest first.
pub fn admin_text(recent: &[AdminLog], now: DateTime<Utc>) -> String {
    let mut text = ADMIN_MENU.to_string();
    if recent.is_empty() {
        return text;
    }
    text.push_str("\n\n<b>Recent Actions:</b>");
    for log in recent {
        let age = (now - log.timestamp).num_seconds().max(0) as u64;
        text.push_str(&format!("\n• <code>{}</code> by {}", escape_html(&log.action), log.admin_id));
        if let Some(target) = log.target_user_id {
            text.push_str(&format!(" on {target}"));
        }
        if let Some(details) = &log.details {
            text.push_str(&format!(" ({})", escape_html(details)));
        }
        text.push_str(&format!(", {} ago", format_duration(age)));
    }
    text
}

pub fn admin_keyboard() -> InlineKeyboardMarkup {
    keyboard(vec![
        vec![Some(cb("👥 Users", "admin_users")), Some(cb("📊 Stats", "admin_stats"))],
        home_row(),
    ])
}

pub fn users_text(summary: &UserSummary, today: i64, week: i64, month: i64) -> String {
    format!(
        "👥 <b>User Statistics</b>\n\n\
<b>📊 Overview:</b>\n\
• <b>Total Users:</b> {}\n\
• <b>Active (7d):</b> {}\n\
• <b>Banned:</b> {}\n\
• <b>Premium:</b> {}\n\n\
<b>📈 Growth:</b>\n\
• <b>Today:</b> +{}\n\
• <b>This Week:</b> +{}\n\
• <b>This Month:</b> +{}\n\n\
Use /user &lt;user_id&gt; to get specific user info.",
        format_count(summary.total),
        format_count(summary.active_weekly),
        format_count(summary.banned),
        format_count(summary.premium),
        format_count(today),
        format_count(week),
        format_count(month),
    )
}

pub fn user_info_text(user: &User, views: i64, downloads: i64) -> String {
    let username = user
        .username
        .as_deref()
        .map(|u| format!("@{}", escape_html(u)))
        .unwrap_or_else(|| "none".to_string());
    format!(
        "👤 <b>User Info</b>\n\n\
• <b>Name:</b> {}\n\
• <b>ID:</b> <code>{}</code>\n\
• <b>Username:</b> {username}\n\
• <b>Language:</b> {}\n\
• <b>Joined:</b> {}\n\
• <b>Last Active:</b> {}\n\
• <b>Files:</b> {} ({})\n\
• <b>Views / Downloads:</b> {} / {}\n\
• <b>Status:</b> {}",
        mention(user.id, &user.full_name()),
        user.id,
        escape_html(&user.language_code),
        user.joined_date.format("%Y-%m-%d"),
        user.last_activity.format("%Y-%m-%d %H:%M"),
        format_count(user.files_uploaded),
        format_size(user.total_size_uploaded.max(0) as u64),
        format_count(views),
        format_count(downloads),
        if user.is_banned { "🔴 Banned" } else { "🟢 Active" },
    )
}

pub fn broadcast_usage_text() -> &'static str {
    "<b>Usage:</b> /broadcast &lt;message&gt;\n<b>Example:</b> /broadcast Hello everyone!"
}

pub fn broadcast_message(text: &str) -> String {
    format!("📢 <b>Broadcast Message</b>\n\n{}", escape_html(text))
}

pub fn broadcast_start_text(total: u64) -> String {
    format!(
        "📢 <b>Broadcasting to {total} users...</b>\nProgress: {}",
        create_progress_bar(0, total, 20)
    )
}

pub fn broadcast_progress_text(done: u64, total: u64, success: u64, failed: u64) -> String {
    format!(
        "📢 <b>Broadcasting...</b>\nProgress: {}\n✅ Success: {success}\n❌ Failed: {failed}",
        create_progress_bar(done, total, 20)
    )
}

pub fn broadcast_report_text(total: u64, success: u64, failed: u64) -> String {
    format!(
        "✅ <b>Broadcast Completed!</b>\n\n\
📊 <b>Results:</b>\n\
• Total Users: {total}\n\
• Success: {success}\n\
• Failed: {failed}\n\
• Success Rate: {}",
        success_rate(success, total)
    )
}

pub fn broadcast_stats_text(items: &[Broadcast]) -> String {
    if items.is_empty() {
        return "📢 <b>Broadcast Statistics</b>\n\nNo broadcasts yet.".to_string();
    }
    let mut out = "📢 <b>Broadcast Statistics</b>\n".to_string();
    for b in items {
        let preview: String = b.message.chars().take(40).collect();
        out.push_str(&format!(
            "\n<b>#{}</b> · {} · {}\n  ✅ {} / ❌ {} of {} ({})\n  <i>{}</i>\n",
            b.id,
            b.created_at.format("%Y-%m-%d %H:%M"),
            b.status.as_str(),
            b.success_count,
            b.failed_count,
            b.total_users,
            success_rate(b.success_count.max(0) as u64, b.total_users.max(0) as u64),
            escape_html(&preview),
        ));
    }
    out
}

pub fn global_stats_text(stats: &BotStats, now: DateTime<Utc>) -> String {
    let uptime = (now - stats.uptime_start).num_seconds().max(0) as u64;
    format!(
        "📊 <b>Global Statistics</b>\n\n\
<b>👥 Users:</b>\n\
• Total: {}\n\
• Active today: {}\n\
• Active this week: {}\n\
• Active this month: {}\n\
• Banned: {}\n\n\
<b>📁 Files:</b>\n\
• Total: {}\n\
• Size: {}\n\
• Views: {}\n\
• Downloads: {}\n\n\
<b>⚙️ Server:</b>\n\
• Uptime: {}\n\
• Avg response: {:.0} ms\n\
• Updated: {}",
        format_count(stats.total_users),
        format_count(stats.active_users_daily),
        format_count(stats.active_users_weekly),
        format_count(stats.active_users_monthly),
        format_count(stats.banned_users),
        format_count(stats.total_files),
        format_size(stats.total_size.max(0) as u64),
        format_count(stats.total_views),
        format_count(stats.total_downloads),
        get_readable_time(uptime),
        stats.avg_response_time,
        stats.last_updated.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn admin_panel_lists_recent_actions() {
        let now = Utc::now();
        assert!(!admin_text(&[], now).contains("Recent Actions"));

        let logs = vec![
            AdminLog {
                id: 2,
                admin_id: 9,
                action: "broadcast".into(),
                target_user_id: None,
                details: Some("sent <4>".into()),
                timestamp: now - Duration::seconds(200),
            },
            AdminLog {
                id: 1,
                admin_id: 9,
                action: "ban".into(),
                target_user_id: Some(4),
                details: None,
                timestamp: now - Duration::seconds(7500),
            },
        ];
        let text = admin_text(&logs, now);
        assert!(text.starts_with("👮 <b>Admin Panel</b>"));
        assert!(text.contains("• <code>broadcast</code> by 9 (sent &lt;4&gt;), 3m 20s ago"));
        assert!(text.contains("• <code>ban</code> by 9 on 4, 2h 5m ago"));
        assert!(text.find("broadcast</code>") < text.find("ban</code>"));
    }

    #[test]
    fn help_states_the_enforced_limit() {
        let capped = help_text(20 * 1024 * 1024, true);
        assert!(capped.contains("up to 20.0 MiB"));
        assert!(capped.contains("local Bot API server"));

        let local = help_text(2 * 1024 * 1024 * 1024, false);
        assert!(local.contains("up to 2.0 GiB"));
        assert!(!local.contains("local Bot API server"));
    }

    fn user(files: i64, size: i64) -> User {
        let now = Utc::now();
        User {
            id: 42,
            username: Some("ada".to_string()),
            first_name: Some("Ada".to_string()),
            last_name: None,
            language_code: "en".to_string(),
            files_uploaded: files,
            total_size_uploaded: size,
            last_activity: now,
            is_banned: false,
            is_premium: false,
            joined_date: now - Duration::days(3),
            notification_enabled: true,
            show_file_info: true,
            custom_caption: None,
        }
    }

    #[test]
    fn no_achievements_for_new_user() {
        let u = user(0, 0);
        assert!(achievements(&u, 0).is_empty());
        assert!(user_stats_text(&u, 0, 0, Utc::now()).contains("No achievements yet"));
    }

    #[test]
    fn achievements_accumulate() {
        assert_eq!(achievements(&user(1, 10), 0), vec!["🎯 First Upload"]);
        assert_eq!(
            achievements(&user(10, 10), 999),
            vec!["🎯 First Upload", "📦 10 Files Uploaded"]
        );
        assert_eq!(
            achievements(&user(100, GIB), 1000),
            vec![
                "🎯 First Upload",
                "📦 10 Files Uploaded",
                "💎 100 Files Master",
                "💾 1GB+ Uploaded",
                "👁 1K+ Views"
            ]
        );
    }

    #[test]
    fn stats_text_reports_days_and_counts() {
        let text = user_stats_text(&user(3, 2048), 1500, 7, Utc::now());
        assert!(text.contains("3 days ago"));
        assert!(text.contains("<b>Total Views:</b> 1,500"));
        assert!(text.contains("2.0 KiB"));
        assert!(text.contains("🟢 Active"));
    }

    #[test]
    fn broadcast_report_rates() {
        assert!(broadcast_report_text(0, 0, 0).contains("Success Rate: 0.0%"));
        assert!(broadcast_report_text(4, 3, 1).contains("Success Rate: 75.0%"));
    }

    #[test]
    fn join_url_only_for_usernames() {
        assert_eq!(channel_join_url("@news").as_deref(), Some("https://t.me/news"));
        assert_eq!(channel_join_url("-1001234"), None);
        assert_eq!(channel_join_url("@"), None);
    }

    #[test]
    fn force_sub_keyboard_drops_join_for_numeric_channels() {
        let kb = force_sub_keyboard("-1001234");
        assert_eq!(kb.inline_keyboard.len(), 1);
        assert_eq!(kb.inline_keyboard[0].len(), 1);

        let kb = force_sub_keyboard("@news");
        assert_eq!(kb.inline_keyboard[0].len(), 2);
    }

    #[test]
    fn upload_keyboard_carries_hash_callbacks() {
        let links = FileLinks::build("http://h.test/", 5, "a.mp4", "abcdef012345").unwrap();
        let kb = upload_keyboard(&links, "abcdef012345");
        assert_eq!(kb.inline_keyboard.len(), 3);
        assert_eq!(kb.inline_keyboard[0].len(), 2);
        let texts = upload_success_text("a.mp4", 10, MediaKind::VideoNote, &links);
        assert!(texts.contains("Video Note"));
        assert!(texts.contains("http://h.test/abcdef012345"));
    }

    #[test]
    fn user_input_is_escaped() {
        let mut u = user(0, 0);
        u.first_name = Some("<b>x</b>".to_string());
        assert!(user_stats_text(&u, 0, 0, Utc::now()).contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(broadcast_message("a < b").contains("a &lt; b"));
    }
}
