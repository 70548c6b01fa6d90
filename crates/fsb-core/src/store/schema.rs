//! SQLite DDL for the bot database.
//!
//! All timestamps are unix seconds (UTC); booleans are INTEGER 0/1.
//! `file_stats` holds one row per bin-channel message, so the same Telegram
//! file uploaded twice has two rows.

pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NULL,
    first_name TEXT NULL,
    last_name TEXT NULL,
    language_code TEXT NOT NULL DEFAULT 'en',
    files_uploaded INTEGER NOT NULL DEFAULT 0,
    total_size_uploaded INTEGER NOT NULL DEFAULT 0,
    last_activity INTEGER NOT NULL,
    is_banned INTEGER NOT NULL DEFAULT 0,
    is_premium INTEGER NOT NULL DEFAULT 0,
    joined_date INTEGER NOT NULL,
    notification_enabled INTEGER NOT NULL DEFAULT 1,
    show_file_info INTEGER NOT NULL DEFAULT 1,
    custom_caption TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_last_activity ON users(last_activity);
CREATE INDEX IF NOT EXISTS idx_users_joined_date ON users(joined_date);

CREATE TABLE IF NOT EXISTS file_stats (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id TEXT NOT NULL,
    file_unique_id TEXT NOT NULL,
    file_hash TEXT NOT NULL,
    message_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    file_name TEXT NULL,
    file_size INTEGER NOT NULL,
    file_type TEXT NOT NULL,
    mime_type TEXT NULL,
    views INTEGER NOT NULL DEFAULT 0,
    downloads INTEGER NOT NULL DEFAULT 0,
    last_accessed INTEGER NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_file_stats_file_id ON file_stats(file_id);
CREATE INDEX IF NOT EXISTS idx_file_stats_hash ON file_stats(file_hash);
CREATE INDEX IF NOT EXISTS idx_file_stats_message ON file_stats(message_id);
CREATE INDEX IF NOT EXISTS idx_file_stats_user ON file_stats(user_id);

CREATE TABLE IF NOT EXISTS bot_stats (
    id INTEGER PRIMARY KEY,
    total_users INTEGER NOT NULL DEFAULT 0,
    active_users_daily INTEGER NOT NULL DEFAULT 0,
    active_users_weekly INTEGER NOT NULL DEFAULT 0,
    active_users_monthly INTEGER NOT NULL DEFAULT 0,
    banned_users INTEGER NOT NULL DEFAULT 0,
    total_files INTEGER NOT NULL DEFAULT 0,
    total_size INTEGER NOT NULL DEFAULT 0,
    total_views INTEGER NOT NULL DEFAULT 0,
    total_downloads INTEGER NOT NULL DEFAULT 0,
    avg_response_time REAL NOT NULL DEFAULT 0.0,
    uptime_start INTEGER NOT NULL,
    last_updated INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS broadcasts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    admin_id INTEGER NOT NULL,
    message TEXT NOT NULL,
    total_users INTEGER NOT NULL DEFAULT 0,
    success_count INTEGER NOT NULL DEFAULT 0,
    failed_count INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'pending',
    started_at INTEGER NULL,
    completed_at INTEGER NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS admin_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    admin_id INTEGER NOT NULL,
    action TEXT NOT NULL,
    target_user_id INTEGER NULL,
    details TEXT NULL,
    timestamp INTEGER NOT NULL
)
"#;
