use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use crate::media::MediaKind;

pub(crate) fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: String,
    pub files_uploaded: i64,
    pub total_size_uploaded: i64,
    pub last_activity: DateTime<Utc>,
    pub is_banned: bool,
    pub is_premium: bool,
    pub joined_date: DateTime<Utc>,
    pub notification_enabled: bool,
    pub show_file_info: bool,
    pub custom_caption: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            "Anonymous".to_string()
        } else {
            parts.join(" ")
        }
    }

    pub(crate) fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            language_code: row.try_get("language_code")?,
            files_uploaded: row.try_get("files_uploaded")?,
            total_size_uploaded: row.try_get("total_size_uploaded")?,
            last_activity: from_unix(row.try_get("last_activity")?),
            is_banned: row.try_get("is_banned")?,
            is_premium: row.try_get("is_premium")?,
            joined_date: from_unix(row.try_get("joined_date")?),
            notification_enabled: row.try_get("notification_enabled")?,
            show_file_info: row.try_get("show_file_info")?,
            custom_caption: row.try_get("custom_caption")?,
        })
    }
}

/// Profile fields Telegram reports on every update. `None` leaves the
/// stored value alone.
#[derive(Clone, Debug, Default)]
pub struct UserProfile {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
    pub is_premium: Option<bool>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FileRecord {
    pub id: i64,
    pub file_id: String,
    pub file_unique_id: String,
    pub file_hash: String,
    pub message_id: i32,
    pub user_id: i64,
    pub file_name: Option<String>,
    pub file_size: i64,
    pub file_type: String,
    pub mime_type: Option<String>,
    pub views: i64,
    pub downloads: i64,
    pub last_accessed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn kind(&self) -> Option<MediaKind> {
        MediaKind::parse(&self.file_type)
    }

    pub(crate) fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let last_accessed: Option<i64> = row.try_get("last_accessed")?;
        Ok(Self {
            id: row.try_get("id")?,
            file_id: row.try_get("file_id")?,
            file_unique_id: row.try_get("file_unique_id")?,
            file_hash: row.try_get("file_hash")?,
            message_id: row.try_get("message_id")?,
            user_id: row.try_get("user_id")?,
            file_name: row.try_get("file_name")?,
            file_size: row.try_get("file_size")?,
            file_type: row.try_get("file_type")?,
            mime_type: row.try_get("mime_type")?,
            views: row.try_get("views")?,
            downloads: row.try_get("downloads")?,
            last_accessed: last_accessed.map(from_unix),
            created_at: from_unix(row.try_get("created_at")?),
        })
    }
}

#[derive(Clone, Debug)]
pub struct NewFile {
    pub file_id: String,
    pub file_unique_id: String,
    pub file_hash: String,
    pub message_id: i32,
    pub user_id: i64,
    pub file_name: Option<String>,
    pub file_size: i64,
    pub file_type: MediaKind,
    pub mime_type: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileAction {
    View,
    Download,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BotStats {
    pub total_users: i64,
    pub active_users_daily: i64,
    pub active_users_weekly: i64,
    pub active_users_monthly: i64,
    pub banned_users: i64,
    pub total_files: i64,
    pub total_size: i64,
    pub total_views: i64,
    pub total_downloads: i64,
    pub avg_response_time: f64,
    pub uptime_start: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl BotStats {
    pub(crate) fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            total_users: row.try_get("total_users")?,
            active_users_daily: row.try_get("active_users_daily")?,
            active_users_weekly: row.try_get("active_users_weekly")?,
            active_users_monthly: row.try_get("active_users_monthly")?,
            banned_users: row.try_get("banned_users")?,
            total_files: row.try_get("total_files")?,
            total_size: row.try_get("total_size")?,
            total_views: row.try_get("total_views")?,
            total_downloads: row.try_get("total_downloads")?,
            avg_response_time: row.try_get("avg_response_time")?,
            uptime_start: from_unix(row.try_get("uptime_start")?),
            last_updated: from_unix(row.try_get("last_updated")?),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BroadcastStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl BroadcastStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BroadcastStatus::Pending => "pending",
            BroadcastStatus::InProgress => "in_progress",
            BroadcastStatus::Completed => "completed",
            BroadcastStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BroadcastStatus::Pending),
            "in_progress" => Some(BroadcastStatus::InProgress),
            "completed" => Some(BroadcastStatus::Completed),
            "failed" => Some(BroadcastStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Broadcast {
    pub id: i64,
    pub admin_id: i64,
    pub message: String,
    pub total_users: i64,
    pub success_count: i64,
    pub failed_count: i64,
    pub status: BroadcastStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Broadcast {
    pub(crate) fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;
        let started_at: Option<i64> = row.try_get("started_at")?;
        let completed_at: Option<i64> = row.try_get("completed_at")?;
        Ok(Self {
            id: row.try_get("id")?,
            admin_id: row.try_get("admin_id")?,
            message: row.try_get("message")?,
            total_users: row.try_get("total_users")?,
            success_count: row.try_get("success_count")?,
            failed_count: row.try_get("failed_count")?,
            status: BroadcastStatus::parse(&status).unwrap_or(BroadcastStatus::Failed),
            started_at: started_at.map(from_unix),
            completed_at: completed_at.map(from_unix),
            created_at: from_unix(row.try_get("created_at")?),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AdminLog {
    pub id: i64,
    pub admin_id: i64,
    pub action: String,
    pub target_user_id: Option<i64>,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AdminLog {
    pub(crate) fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            admin_id: row.try_get("admin_id")?,
            action: row.try_get("action")?,
            target_user_id: row.try_get("target_user_id")?,
            details: row.try_get("details")?,
            timestamp: from_unix(row.try_get("timestamp")?),
        })
    }
}

/// Counts shown on the admin `/users` view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UserSummary {
    pub total: i64,
    pub active_weekly: i64,
    pub banned: i64,
    pub premium: i64,
}
