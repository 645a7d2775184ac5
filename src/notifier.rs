use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::config::TELEGRAM_TIMEOUT_SECS;
use crate::error::{AppError, Result};
use crate::types::AdRecord;

/// Characters Telegram requires to be backslash-escaped in MarkdownV2 text.
const MARKDOWN_ESCAPE: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escape marketplace text so its MarkdownV2 control characters cannot break
/// message formatting or delivery.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if MARKDOWN_ESCAPE.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// One alert message per new ad: model header plus the listing fields, every
/// interpolated value escaped.
pub fn format_message(ad: &AdRecord, model: &str) -> String {
    format!(
        "*Neue Anzeige gefunden für {}\\!*\n*Titel*: {}\n*Preis*: {}\n*Beschreibung*: {}\n*Link*: {}",
        escape_markdown(model),
        escape_markdown(&ad.title),
        escape_markdown(&ad.price),
        escape_markdown(&ad.description),
        escape_markdown(&ad.link),
    )
}

/// Delivery seam — lets the driver run against a recording notifier in tests.
#[async_trait]
pub trait SendAlert {
    async fn send_new_ad(&self, ad: &AdRecord, model: &str) -> Result<()>;
}

pub struct TelegramNotifier {
    client: reqwest::Client,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TELEGRAM_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            token,
            chat_id,
        })
    }
}

#[async_trait]
impl SendAlert for TelegramNotifier {
    async fn send_new_ad(&self, ad: &AdRecord, model: &str) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        let body = json!({
            "chat_id": self.chat_id,
            "text": format_message(ad, model),
            "parse_mode": "MarkdownV2",
        });

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        let parsed: Value = serde_json::from_str(&text)?;

        if !status.is_success() || parsed.get("ok").and_then(Value::as_bool) != Some(true) {
            let description = parsed
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("no description");
            return Err(AppError::Telegram(format!(
                "sendMessage failed ({status}): {description}"
            )));
        }

        info!("notification sent for ad {} ({model})", ad.id);
        Ok(())
    }
}
