use crate::error::{AppError, Result};

pub const SITE_BASE_URL: &str = "https://www.kleinanzeigen.de";

/// Browser identity sent with every rendered fetch. The site only hydrates
/// the listing grid for script-capable clients, so the session has to look
/// like a real desktop browser.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Delay between full sweeps over the watch list (seconds).
pub const POLL_INTERVAL_SECS: u64 = 120;

/// Scroll-to-bottom rounds per page load, to trigger lazy-loaded tiles.
pub const SCROLL_ROUNDS: usize = 5;

/// Pause after each scroll round (seconds).
pub const SCROLL_PAUSE_SECS: u64 = 2;

/// Upper bound on waiting for the rendered document to finish loading (seconds).
pub const RENDER_WAIT_TIMEOUT_SECS: u64 = 40;

/// Poll step while waiting for document readiness (milliseconds).
pub const RENDER_POLL_INTERVAL_MS: u64 = 500;

/// Request timeout for Telegram Bot API calls (seconds).
pub const TELEGRAM_TIMEOUT_SECS: u64 = 30;

/// Titles containing any of these substrings (lower-cased match) are never
/// purchasable listings: wanted-ads, repair services, trades and accessories.
pub const EXCLUDE_KEYWORDS: &[&str] = &[
    "ankauf",
    "reparatur",
    "tausch",
    "für",
    "keyboard",
    "tastatur",
];

/// Price text the site shows for open-to-offers listings ("Verhandlungsbasis").
pub const NEGOTIABLE_MARKER: &str = "vb";

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    pub chat_id: String,
    pub webdriver_url: String,
    pub db_path: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            telegram_token: std::env::var("TELEGRAM_TOKEN")
                .map_err(|_| AppError::Config("TELEGRAM_TOKEN not set".to_string()))?,
            chat_id: std::env::var("CHAT_ID")
                .map_err(|_| AppError::Config("CHAT_ID not set".to_string()))?,
            webdriver_url: std::env::var("WEBDRIVER_URL")
                .unwrap_or_else(|_| "http://localhost:9515".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "seen_ads.db".to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
