//! SQLite persistence for users, stored files, bot aggregates, broadcasts
//! and the admin audit log.

mod models;
mod schema;

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

pub use models::{
    AdminLog, BotStats, Broadcast, BroadcastStatus, FileAction, FileRecord, NewFile, User,
    UserProfile, UserSummary,
};
use schema::SQLITE_INIT;

use crate::Result;

type SqlitePool = Pool<Sqlite>;

const STATS_ROW: i64 = 1;

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) the database behind `url` and apply the schema.
    pub async fn connect(url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Private in-memory database. Lives as long as the store.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn init_schema(&self) -> Result<()> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    // ---- users ----

    /// Insert the user on first sight; afterwards refresh the profile fields
    /// Telegram sent and touch `last_activity`.
    pub async fn get_or_create_user(&self, id: i64, profile: &UserProfile) -> Result<User> {
        let now = Utc::now().timestamp();

        sqlx::query(
            "INSERT OR IGNORE INTO users (id, language_code, last_activity, joined_date) VALUES (?, 'en', ?, ?)",
        )
        .bind(id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            UPDATE users SET
                username = COALESCE(?, username),
                first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                language_code = COALESCE(?, language_code),
                is_premium = COALESCE(?, is_premium),
                last_activity = ?
            WHERE id = ?
            "#,
        )
        .bind(profile.username.as_deref())
        .bind(profile.first_name.as_deref())
        .bind(profile.last_name.as_deref())
        .bind(profile.language_code.as_deref())
        .bind(profile.is_premium)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(User::from_row(&row)?)
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(User::from_row).transpose()?)
    }

    /// Returns false when the user is unknown.
    pub async fn set_banned(&self, id: i64, banned: bool) -> Result<bool> {
        let res = sqlx::query("UPDATE users SET is_banned = ? WHERE id = ?")
            .bind(banned)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn user_summary(&self) -> Result<UserSummary> {
        let week_ago = (Utc::now() - Duration::days(7)).timestamp();
        let (total, active_weekly, banned, premium): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN last_activity >= ? THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(is_banned), 0),
                COALESCE(SUM(is_premium), 0)
            FROM users
            "#,
        )
        .bind(week_ago)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserSummary {
            total,
            active_weekly,
            banned,
            premium,
        })
    }

    pub async fn new_users_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE joined_date >= ?")
            .bind(since.timestamp())
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    /// Ids of every user that is not banned, oldest first.
    pub async fn broadcast_recipients(&self) -> Result<Vec<i64>> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE is_banned = 0 ORDER BY joined_date, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }

    // ---- files ----

    /// Persist an upload and credit it to the uploader in one transaction.
    /// Every bin-channel copy gets its own row, so earlier links and
    /// ownership stay intact when the same file is uploaded again.
    pub async fn record_upload(&self, file: &NewFile) -> Result<i64> {
        let now = Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT OR IGNORE INTO users (id, language_code, last_activity, joined_date) VALUES (?, 'en', ?, ?)",
        )
        .bind(file.user_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let id = sqlx::query(
            r#"
            INSERT INTO file_stats (
                file_id, file_unique_id, file_hash, message_id, user_id,
                file_name, file_size, file_type, mime_type, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&file.file_id)
        .bind(&file.file_unique_id)
        .bind(&file.file_hash)
        .bind(file.message_id)
        .bind(file.user_id)
        .bind(file.file_name.as_deref())
        .bind(file.file_size)
        .bind(file.file_type.as_str())
        .bind(file.mime_type.as_deref())
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        sqlx::query(
            r#"
            UPDATE users SET
                files_uploaded = files_uploaded + 1,
                total_size_uploaded = total_size_uploaded + ?,
                last_activity = ?
            WHERE id = ?
            "#,
        )
        .bind(file.file_size)
        .bind(now)
        .bind(file.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    /// Bump the view or download counter of one stored copy. Returns false
    /// for an unknown row.
    pub async fn update_file_stats(&self, id: i64, action: FileAction) -> Result<bool> {
        let sql = match action {
            FileAction::View => "UPDATE file_stats SET views = views + 1, last_accessed = ? WHERE id = ?",
            FileAction::Download => "UPDATE file_stats SET downloads = downloads + 1, last_accessed = ? WHERE id = ?",
        };
        let res = sqlx::query(sql)
            .bind(Utc::now().timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn find_file_by_hash(&self, hash: &str) -> Result<Option<FileRecord>> {
        let row = sqlx::query("SELECT * FROM file_stats WHERE file_hash = ? ORDER BY id DESC LIMIT 1")
            .bind(hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(FileRecord::from_row).transpose()?)
    }

    /// The caller's own newest copy of the file behind `hash`.
    pub async fn find_user_file_by_hash(&self, user_id: i64, hash: &str) -> Result<Option<FileRecord>> {
        let row = sqlx::query("SELECT * FROM file_stats WHERE file_hash = ? AND user_id = ? ORDER BY id DESC LIMIT 1")
            .bind(hash)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(FileRecord::from_row).transpose()?)
    }

    pub async fn find_file_by_message(&self, message_id: i32) -> Result<Option<FileRecord>> {
        let row = sqlx::query("SELECT * FROM file_stats WHERE message_id = ? ORDER BY id DESC LIMIT 1")
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(FileRecord::from_row).transpose()?)
    }

    /// Newest first.
    pub async fn files_for_user(&self, user_id: i64) -> Result<Vec<FileRecord>> {
        let rows = sqlx::query("SELECT * FROM file_stats WHERE user_id = ? ORDER BY created_at DESC, id DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(FileRecord::from_row).collect::<sqlx::Result<_>>()?)
    }

    /// `(views, downloads)` summed over the user's files.
    pub async fn user_file_totals(&self, user_id: i64) -> Result<(i64, i64)> {
        let totals: (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(views), 0), COALESCE(SUM(downloads), 0) FROM file_stats WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }

    pub async fn delete_file(&self, id: i64) -> Result<bool> {
        let res = sqlx::query("DELETE FROM file_stats WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // ---- bot stats ----

    async fn ensure_stats_row(&self) -> Result<()> {
        let now = Utc::now().timestamp();
        sqlx::query("INSERT OR IGNORE INTO bot_stats (id, uptime_start, last_updated) VALUES (?, ?, ?)")
            .bind(STATS_ROW)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_bot_stats(&self) -> Result<BotStats> {
        self.ensure_stats_row().await?;
        let row = sqlx::query("SELECT * FROM bot_stats WHERE id = ?")
            .bind(STATS_ROW)
            .fetch_one(&self.pool)
            .await?;
        Ok(BotStats::from_row(&row)?)
    }

    /// Start the uptime clock for this process.
    pub async fn mark_started(&self) -> Result<()> {
        self.ensure_stats_row().await?;
        sqlx::query("UPDATE bot_stats SET uptime_start = ? WHERE id = ?")
            .bind(Utc::now().timestamp())
            .bind(STATS_ROW)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Recompute every aggregate from the users and file_stats tables.
    pub async fn refresh_bot_stats(&self) -> Result<BotStats> {
        self.ensure_stats_row().await?;
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE bot_stats SET
                total_users = (SELECT COUNT(*) FROM users),
                active_users_daily = (SELECT COUNT(*) FROM users WHERE last_activity >= ?),
                active_users_weekly = (SELECT COUNT(*) FROM users WHERE last_activity >= ?),
                active_users_monthly = (SELECT COUNT(*) FROM users WHERE last_activity >= ?),
                banned_users = (SELECT COUNT(*) FROM users WHERE is_banned = 1),
                total_files = (SELECT COUNT(*) FROM file_stats),
                total_size = (SELECT COALESCE(SUM(file_size), 0) FROM file_stats),
                total_views = (SELECT COALESCE(SUM(views), 0) FROM file_stats),
                total_downloads = (SELECT COALESCE(SUM(downloads), 0) FROM file_stats),
                last_updated = ?
            WHERE id = ?
            "#,
        )
        .bind((now - Duration::days(1)).timestamp())
        .bind((now - Duration::days(7)).timestamp())
        .bind((now - Duration::days(30)).timestamp())
        .bind(now.timestamp())
        .bind(STATS_ROW)
        .execute(&self.pool)
        .await?;

        self.get_bot_stats().await
    }

    /// Fold one served-request latency into the moving average.
    pub async fn record_response_time(&self, millis: f64) -> Result<()> {
        self.ensure_stats_row().await?;
        sqlx::query(
            r#"
            UPDATE bot_stats SET avg_response_time =
                CASE WHEN avg_response_time = 0 THEN ? ELSE avg_response_time * 0.9 + ? * 0.1 END
            WHERE id = ?
            "#,
        )
        .bind(millis)
        .bind(millis)
        .bind(STATS_ROW)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ---- broadcasts ----

    pub async fn create_broadcast(&self, admin_id: i64, message: &str, total_users: i64) -> Result<i64> {
        let now = Utc::now().timestamp();
        let res = sqlx::query(
            r#"
            INSERT INTO broadcasts (admin_id, message, total_users, status, started_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(admin_id)
        .bind(message)
        .bind(total_users)
        .bind(BroadcastStatus::InProgress.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn finish_broadcast(
        &self,
        id: i64,
        success: i64,
        failed: i64,
        status: BroadcastStatus,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE broadcasts SET success_count = ?, failed_count = ?, status = ?, completed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(success)
        .bind(failed)
        .bind(status.as_str())
        .bind(Utc::now().timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn recent_broadcasts(&self, limit: i64) -> Result<Vec<Broadcast>> {
        let rows = sqlx::query("SELECT * FROM broadcasts ORDER BY id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(Broadcast::from_row).collect::<sqlx::Result<_>>()?)
    }

    // ---- admin log ----

    pub async fn log_admin_action(
        &self,
        admin_id: i64,
        action: &str,
        target_user_id: Option<i64>,
        details: Option<&str>,
    ) -> Result<i64> {
        let res = sqlx::query(
            "INSERT INTO admin_logs (admin_id, action, target_user_id, details, timestamp) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(admin_id)
        .bind(action)
        .bind(target_user_id)
        .bind(details)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn recent_admin_logs(&self, limit: i64) -> Result<Vec<AdminLog>> {
        let rows = sqlx::query("SELECT * FROM admin_logs ORDER BY id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(AdminLog::from_row).collect::<sqlx::Result<_>>()?)
    }
}
