use std::{sync::Arc, time::Duration};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio_util::sync::CancellationToken;

use fsb_core::messaging::throttled::{ThrottleConfig, ThrottledMessenger};
use fsb_core::{config::Config, messaging::port::MessagingPort, store::Store};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub store: Store,
    /// Direct sends: replies, progress edits, the log channel.
    pub messenger: Arc<dyn MessagingPort>,
    /// Fan-out sends (broadcasts), rate-limited.
    pub broadcaster: Arc<dyn MessagingPort>,
    pub bot_username: String,
}

impl AppState {
    pub fn new(cfg: Arc<Config>, store: Store, bot: Bot, bot_username: String) -> Self {
        let raw: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot, cfg.sleep_threshold));
        let broadcaster: Arc<dyn MessagingPort> =
            Arc::new(ThrottledMessenger::new(raw.clone(), ThrottleConfig::default()));
        Self {
            cfg,
            store,
            messenger: raw,
            broadcaster,
            bot_username,
        }
    }
}

/// Bot client for the configured token, pointed at a custom Bot API server
/// when `BOT_API_URL` is set.
pub fn build_bot(cfg: &Config) -> anyhow::Result<Bot> {
    let mut bot = Bot::new(cfg.bot_token.clone());
    if let Some(api) = cfg.bot_api_url.as_deref() {
        let url = reqwest::Url::parse(api).map_err(|e| anyhow::anyhow!("invalid BOT_API_URL {api:?}: {e}"))?;
        bot = bot.set_api_url(url);
    }
    Ok(bot)
}

/// Resolve our own username and make sure the bin channel is reachable.
pub async fn startup_checks(bot: &Bot, cfg: &Config) -> anyhow::Result<String> {
    let me = bot.get_me().await?;
    let username = me.username().to_string();
    tracing::info!("bot started as @{username}");

    match bot.get_chat(teloxide::types::ChatId(cfg.bin_channel)).await {
        Ok(chat) => tracing::info!(
            "bin channel: {} ({})",
            chat.title().unwrap_or("untitled"),
            cfg.bin_channel
        ),
        Err(e) => tracing::error!(
            "cannot access BIN_CHANNEL {}: {e}. Add the bot to the channel as an admin.",
            cfg.bin_channel
        ),
    }
    Ok(username)
}

/// Long-poll updates until `cancel` fires.
pub async fn run_polling(bot: Bot, state: Arc<AppState>, cancel: CancellationToken) -> anyhow::Result<()> {
    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|_| async {})
        .build();

    let token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        cancel.cancelled().await;
        // shutdown is refused while the dispatcher is idle
        for _ in 0..50 {
            match token.shutdown() {
                Ok(done) => {
                    done.await;
                    return;
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }
        tracing::warn!("dispatcher did not accept shutdown");
    });

    tracing::info!("polling for updates");
    dispatcher.dispatch().await;
    tracing::info!("dispatcher stopped");
    Ok(())
}
