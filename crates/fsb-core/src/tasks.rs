//! Long-running background jobs started next to the bot and web server.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::store::Store;

pub const STATS_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Recompute the cached bot aggregates every `every` until cancelled.
/// A failed refresh is logged and retried on the next tick.
pub fn spawn_stats_refresher(store: Store, every: Duration, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tick.tick() => {
                    match store.refresh_bot_stats().await {
                        Ok(stats) => tracing::debug!(
                            users = stats.total_users,
                            files = stats.total_files,
                            "bot stats refreshed"
                        ),
                        Err(e) => tracing::error!("bot stats refresh failed: {e}"),
                    }
                }
            }
        }
        tracing::debug!("stats refresher stopped");
    })
}

/// Ping our own public URL so the Heroku dyno is not idled.
pub fn spawn_keep_alive(url: String, every: Duration, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let mut tick = tokio::time::interval(every);
        // first tick fires immediately; the server may not be listening yet
        tick.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tick.tick() => {
                    match client.get(&url).timeout(Duration::from_secs(10)).send().await {
                        Ok(resp) => tracing::debug!(status = %resp.status(), "keep-alive ping to {url}"),
                        Err(e) => tracing::error!("keep-alive ping to {url} failed: {e}"),
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UserProfile;

    #[tokio::test]
    async fn refresher_updates_stats_and_stops_on_cancel() {
        let store = Store::in_memory().await.unwrap();
        store.get_or_create_user(1, &UserProfile::default()).await.unwrap();

        let cancel = CancellationToken::new();
        let handle = spawn_stats_refresher(store.clone(), Duration::from_millis(10), cancel.clone());

        // the first tick fires immediately
        let mut refreshed = false;
        for _ in 0..50 {
            if store.get_bot_stats().await.unwrap().total_users == 1 {
                refreshed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(refreshed);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn keep_alive_exits_when_cancelled() {
        let cancel = CancellationToken::new();
        let handle = spawn_keep_alive(
            "http://127.0.0.1:9/".to_string(),
            Duration::from_secs(3600),
            cancel.clone(),
        );
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
