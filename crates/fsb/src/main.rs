use std::{env, path::Path, process::ExitCode, sync::Arc};

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use fsb_core::{
    bootstrap::{self, Preflight, ENV_EXAMPLE_FILE, ENV_FILE},
    config::Config,
    logging,
    store::Store,
    tasks,
};
use fsb_telegram::{
    router::{build_bot, run_polling, startup_checks, AppState},
    TelegramFiles,
};
use fsb_web::WebState;

const STATIC_DIR: &str = "static";

fn external(context: &str) -> impl FnOnce(anyhow::Error) -> fsb_core::Error + '_ {
    move |e| fsb_core::Error::External(format!("{context}: {e:#}"))
}

/// Startup checks and config loading. Failures are reported here; `None`
/// means the process should exit with status 1.
fn prepare(root: &Path) -> Option<Config> {
    if let Err(e) = bootstrap::check_min_version(env!("FSB_RUSTC_VERSION"), env!("CARGO_PKG_RUST_VERSION")) {
        error!("{e}");
        return None;
    }

    match bootstrap::preflight(root, |k| env::var(k).ok()) {
        Ok(Preflight::Ready) => {}
        Ok(Preflight::EnvCreated) => {
            warn!("{ENV_FILE} was created from {ENV_EXAMPLE_FILE}; edit it with your credentials and start again");
            return None;
        }
        Ok(Preflight::EnvMissing) => {
            error!("{ENV_FILE} not found and no {ENV_EXAMPLE_FILE} to copy from");
            return None;
        }
        Ok(Preflight::MissingVars(names)) => {
            for name in names {
                error!("missing required environment variable: {name}");
            }
            return None;
        }
        Err(e) => {
            error!("startup checks failed: {e}");
            return None;
        }
    }

    match Config::load() {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!("{e}");
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cfg = tracing::subscriber::with_default(logging::console(), || {
        let root = match env::current_dir() {
            Ok(root) => root,
            Err(e) => {
                error!("cannot resolve working directory: {e}");
                return None;
            }
        };
        prepare(&root)
    });
    let Some(cfg) = cfg else {
        return ExitCode::FAILURE;
    };

    if let Err(e) = logging::init(&cfg.log_level, Some(cfg.log_file.as_path())) {
        tracing::subscriber::with_default(logging::console(), || error!("{e}"));
        return ExitCode::FAILURE;
    }

    match run(Arc::new(cfg)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: Arc<Config>) -> Result<(), fsb_core::Error> {
    info!(url = %cfg.url(), "starting file stream bot");

    let store = Store::connect(&cfg.database_url).await?;
    store.mark_started().await?;

    let bot = build_bot(&cfg).map_err(external("telegram client"))?;
    let bot_username = startup_checks(&bot, &cfg)
        .await
        .map_err(external("telegram startup"))?;

    let state = Arc::new(AppState::new(cfg.clone(), store.clone(), bot.clone(), bot_username.clone()));
    let web_state = WebState {
        store: store.clone(),
        files: Arc::new(TelegramFiles::new(bot.clone(), cfg.workers)),
        bot_username,
        public_url: cfg.url(),
    };

    let cancel = CancellationToken::new();
    let mut jobs = Vec::new();
    if cfg.enable_stats {
        jobs.push(tasks::spawn_stats_refresher(
            store.clone(),
            tasks::STATS_REFRESH_INTERVAL,
            cancel.clone(),
        ));
    }
    if cfg.on_heroku {
        jobs.push(tasks::spawn_keep_alive(cfg.url(), cfg.ping_interval, cancel.clone()));
    }

    let web = {
        let cancel = cancel.clone();
        let host = cfg.bind_host().to_string();
        let port = cfg.port;
        tokio::spawn(async move {
            if let Err(e) = fsb_web::serve(web_state, STATIC_DIR, &host, port, cancel.clone()).await {
                error!("web server failed: {e:#}");
                cancel.cancel();
            }
        })
    };

    let polling = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = run_polling(bot, state, cancel.clone()).await {
                error!("telegram polling failed: {e:#}");
            }
            cancel.cancel();
        })
    };

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                error!("failed to listen for ctrl-c: {e}");
            }
            info!("shutdown requested");
        }
        _ = cancel.cancelled() => info!("a component stopped, shutting down"),
    }
    cancel.cancel();

    for job in jobs.into_iter().chain([web, polling]) {
        if let Err(e) = job.await {
            error!("task ended abnormally: {e}");
        }
    }

    store.close().await;
    info!("bye");
    Ok(())
}
