use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

use crate::{
    domain::{ChatId, MessageRef},
    messaging::port::MessagingPort,
    Result,
};

/// Spacing rules for bulk sends.
#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Gap between any two calls. Telegram allows about 30 messages per
    /// second across all chats.
    pub global_gap: Duration,
    /// Gap between two calls to the same chat (broadcast progress edits).
    pub per_chat_gap: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_gap: Duration::from_millis(40),
            per_chat_gap: Duration::from_millis(1050),
        }
    }
}

/// Slot bookkeeping for the global lane and each chat lane.
#[derive(Debug)]
struct Pacer {
    cfg: ThrottleConfig,
    global_next: Instant,
    chat_next: HashMap<i64, Instant>,
}

impl Pacer {
    fn new(cfg: ThrottleConfig) -> Self {
        Self {
            cfg,
            global_next: Instant::now(),
            chat_next: HashMap::new(),
        }
    }

    /// Book the earliest instant that respects both lanes and return it.
    /// Chat lanes whose gap has already elapsed are dropped.
    fn book(&mut self, chat_id: i64, now: Instant) -> Instant {
        self.chat_next.retain(|_, ready| *ready > now);
        let chat_ready = self.chat_next.get(&chat_id).copied().unwrap_or(now);
        let at = now.max(self.global_next).max(chat_ready);

        self.global_next = at + self.cfg.global_gap;
        self.chat_next.insert(chat_id, at + self.cfg.per_chat_gap);
        at
    }
}

/// MessagingPort decorator that paces outbound calls for broadcasts.
/// Telegram may still answer with a flood wait; this only keeps the
/// steady-state rate under the documented limits.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    pacer: Mutex<Pacer>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            pacer: Mutex::new(Pacer::new(cfg)),
        }
    }

    async fn wait_turn(&self, chat: ChatId) {
        let at = self.pacer.lock().await.book(chat.0, Instant::now());
        sleep_until(at).await;
    }
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.wait_turn(chat_id).await;
        self.inner.send_html(chat_id, html).await
    }

    async fn edit_html(&self, msg: MessageRef, html: &str) -> Result<()> {
        self.wait_turn(msg.chat_id).await;
        self.inner.edit_html(msg, html).await
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.wait_turn(msg.chat_id).await;
        self.inner.delete_message(msg).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageId;

    #[derive(Default)]
    struct Clock {
        calls: std::sync::Mutex<Vec<(i64, Instant)>>,
    }

    #[async_trait::async_trait]
    impl MessagingPort for Clock {
        async fn send_html(&self, chat_id: ChatId, _html: &str) -> Result<MessageRef> {
            self.calls.lock().unwrap().push((chat_id.0, Instant::now()));
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(1),
            })
        }

        async fn edit_html(&self, msg: MessageRef, _html: &str) -> Result<()> {
            self.calls.lock().unwrap().push((msg.chat_id.0, Instant::now()));
            Ok(())
        }

        async fn delete_message(&self, _msg: MessageRef) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pacer_books_both_lanes() {
        let cfg = ThrottleConfig {
            global_gap: Duration::from_millis(10),
            per_chat_gap: Duration::from_millis(100),
        };
        let mut pacer = Pacer::new(cfg);
        let t0 = Instant::now();

        assert_eq!(pacer.book(1, t0), t0);
        assert_eq!(pacer.book(2, t0), t0 + Duration::from_millis(10));
        assert_eq!(pacer.book(1, t0), t0 + Duration::from_millis(100));
        assert_eq!(pacer.book(3, t0), t0 + Duration::from_millis(110));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_chat_lanes_are_forgotten() {
        let cfg = ThrottleConfig {
            global_gap: Duration::from_millis(10),
            per_chat_gap: Duration::from_millis(100),
        };
        let mut pacer = Pacer::new(cfg);
        let t0 = Instant::now();

        for chat in 1..=50 {
            pacer.book(chat, t0);
        }
        assert_eq!(pacer.chat_next.len(), 50);

        let later = t0 + Duration::from_secs(5);
        assert_eq!(pacer.book(1, later), later);
        assert_eq!(pacer.chat_next.len(), 1);
        assert_eq!(pacer.chat_next[&1], later + Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn broadcast_to_distinct_chats_only_waits_for_global_gap() {
        let clock = Arc::new(Clock::default());
        let throttled = ThrottledMessenger::new(clock.clone(), ThrottleConfig::default());

        for chat in 1..=5 {
            throttled.send_html(ChatId(chat), "hi").await.unwrap();
        }

        let calls = clock.calls.lock().unwrap().clone();
        let span = calls[4].1 - calls[0].1;
        assert!(span >= Duration::from_millis(160));
        assert!(span < Duration::from_millis(1050));
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_edits_to_one_chat_are_spaced() {
        let clock = Arc::new(Clock::default());
        let throttled = ThrottledMessenger::new(clock.clone(), ThrottleConfig::default());
        let status = MessageRef {
            chat_id: ChatId(9),
            message_id: MessageId(3),
        };

        throttled.edit_html(status, "10/100").await.unwrap();
        throttled.edit_html(status, "20/100").await.unwrap();

        let calls = clock.calls.lock().unwrap().clone();
        assert!(calls[1].1 - calls[0].1 >= Duration::from_millis(1050));
    }
}
