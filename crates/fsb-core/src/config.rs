use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::{errors::Error, Result};

const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Largest file the public Bot API returns from `getFile`.
pub const BOT_API_DOWNLOAD_LIMIT: u64 = 20 * 1024 * 1024;

/// Typed configuration, read from the process environment (after `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram credentials
    pub api_id: i32,
    pub api_hash: String,
    pub bot_token: String,
    pub bot_api_url: Option<String>,

    // Channels
    pub bin_channel: i64,
    pub log_channel: Option<i64>,

    // Web server
    pub port: u16,
    pub bind_address: String,
    pub fqdn: String,
    pub has_ssl: bool,
    pub no_port: bool,

    // Bot runtime
    pub workers: usize,
    pub sleep_threshold: Duration,
    pub ping_interval: Duration,

    // Admins
    pub admins: Vec<i64>,
    pub owner_id: i64,

    // Feature flags
    pub enable_stats: bool,
    pub enable_broadcast: bool,
    pub enable_force_sub: bool,
    pub force_sub_channel: Option<String>,

    // Upload limits
    pub max_file_size: u64,
    pub min_file_size: u64,
    pub allowed_extensions: Vec<String>,

    // Storage
    pub database_url: String,

    // Logging
    pub log_level: String,
    pub log_file: PathBuf,

    // Hosting
    pub on_heroku: bool,
    pub app_name: Option<String>,
}

impl Config {
    /// Load from the process environment and validate required settings.
    pub fn load() -> Result<Self> {
        let cfg = Self::from_lookup(|key| env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build a config from an arbitrary key lookup (the environment in
    /// production, a map in tests). Does not validate required settings.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let api_id = parse_or(&get, "API_ID", 0)?;
        let api_hash = get("API_HASH").unwrap_or_default();
        let bot_token = get("BOT_TOKEN").unwrap_or_default();
        let bot_api_url = get("BOT_API_URL");

        let bin_channel = parse_or(&get, "BIN_CHANNEL", 0)?;
        let log_channel = parse_opt(&get, "LOG_CHANNEL")?;

        let port = parse_or(&get, "PORT", 8080)?;
        let bind_address = get("WEB_SERVER_BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string());
        let fqdn = get("FQDN").unwrap_or_else(|| bind_address.clone());
        let has_ssl = bool_or(&get, "HAS_SSL", false);
        let no_port = bool_or(&get, "NO_PORT", false);

        let workers = parse_or::<usize>(&get, "WORKERS", 8)?.max(1);
        let sleep_threshold = Duration::from_secs(parse_or(&get, "SLEEP_THRESHOLD", 60)?);
        let ping_interval = Duration::from_secs(parse_or::<u64>(&get, "PING_INTERVAL", 1200)?.max(1));

        let admins = parse_id_list(get("ADMINS"))?;
        let owner_id = parse_or(&get, "OWNER_ID", 0)?;

        let enable_stats = bool_or(&get, "ENABLE_STATS", true);
        let enable_broadcast = bool_or(&get, "ENABLE_BROADCAST", true);
        let enable_force_sub = bool_or(&get, "ENABLE_FORCE_SUB", false);
        let force_sub_channel = get("FORCE_SUB_CHANNEL");

        let max_file_size = parse_or(&get, "MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE)?;
        let min_file_size = parse_or(&get, "MIN_FILE_SIZE", 0)?;
        let allowed_extensions = get("ALLOWED_EXTENSIONS")
            .map(|s| {
                s.split_whitespace()
                    .map(|ext| ext.trim_start_matches('.').to_lowercase())
                    .collect()
            })
            .unwrap_or_default();

        let database_url = get("DATABASE_URL").unwrap_or_else(|| "sqlite://data/bot.db".to_string());

        let log_level = get("LOG_LEVEL").unwrap_or_else(|| "INFO".to_string());
        let log_file = PathBuf::from(get("LOG_FILE").unwrap_or_else(|| "bot.log".to_string()));

        // Heroku sets DYNO on every dyno; the value itself is irrelevant.
        let on_heroku = lookup("DYNO").is_some();
        let app_name = if on_heroku { get("APP_NAME") } else { None };

        Ok(Self {
            api_id,
            api_hash,
            bot_token,
            bot_api_url,
            bin_channel,
            log_channel,
            port,
            bind_address,
            fqdn,
            has_ssl,
            no_port,
            workers,
            sleep_threshold,
            ping_interval,
            admins,
            owner_id,
            enable_stats,
            enable_broadcast,
            enable_force_sub,
            force_sub_channel,
            max_file_size,
            min_file_size,
            allowed_extensions,
            database_url,
            log_level,
            log_file,
            on_heroku,
            app_name,
        })
    }

    /// Check the settings the bot cannot run without.
    pub fn validate(&self) -> Result<()> {
        if self.api_id == 0 {
            return Err(Error::Config("API_ID must be a non-zero integer".to_string()));
        }
        if self.api_hash.trim().is_empty() {
            return Err(Error::Config("API_HASH is required".to_string()));
        }
        if self.bot_token.trim().is_empty() {
            return Err(Error::Config("BOT_TOKEN is required".to_string()));
        }
        if self.bin_channel == 0 {
            return Err(Error::Config("BIN_CHANNEL must be a non-zero chat id".to_string()));
        }
        if self.on_heroku && self.app_name.is_none() {
            return Err(Error::Config("APP_NAME is required when running on Heroku".to_string()));
        }
        Ok(())
    }

    /// Public base URL, always ending in `/`.
    pub fn url(&self) -> String {
        if self.on_heroku {
            let app = self.app_name.as_deref().unwrap_or_default();
            return format!("https://{app}.herokuapp.com/");
        }

        let scheme = if self.has_ssl { "https" } else { "http" };
        if self.no_port {
            format!("{scheme}://{}/", self.fqdn)
        } else {
            format!("{scheme}://{}:{}/", self.fqdn, self.port)
        }
    }

    /// Address the web server binds to. Heroku routes to all interfaces.
    pub fn bind_host(&self) -> &str {
        if self.on_heroku {
            "0.0.0.0"
        } else {
            &self.bind_address
        }
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admins.contains(&user_id) || (self.owner_id != 0 && self.owner_id == user_id)
    }

    /// Upload ceiling actually enforced. Without a local Bot API server
    /// (`BOT_API_URL`) files above [`BOT_API_DOWNLOAD_LIMIT`] could be stored
    /// but never streamed back.
    pub fn effective_max_file_size(&self) -> u64 {
        if self.bot_api_url.is_some() {
            self.max_file_size
        } else {
            self.max_file_size.min(BOT_API_DOWNLOAD_LIMIT)
        }
    }

    /// True when uploads are capped by the public Bot API rather than by
    /// `MAX_FILE_SIZE`.
    pub fn bot_api_capped(&self) -> bool {
        self.effective_max_file_size() < self.max_file_size
    }

    /// Force-subscribe is active only when both the flag and the channel are set.
    pub fn force_sub_target(&self) -> Option<&str> {
        if !self.enable_force_sub {
            return None;
        }
        self.force_sub_channel.as_deref()
    }
}

fn parse_or<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T> {
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

fn parse_opt<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    let Some(raw) = get(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} has an invalid value: {raw:?}")))
}

fn bool_or(get: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    get(key)
        .map(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn parse_id_list(v: Option<String>) -> Result<Vec<i64>> {
    v.unwrap_or_default()
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| Error::Config(format!("ADMINS contains an invalid user id: {s:?}")))
        })
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
