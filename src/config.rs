use std::{fmt, fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

/// Bot configuration, loaded from the JSON file given as the single
/// command-line argument. Only `key` and `secret` are required; the
/// tunables default to the values the strategy was written for.
#[derive(Clone, Deserialize)]
pub struct BotConfig {
    pub key: String,
    pub secret: String,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default = "default_min_offer_amount")]
    pub min_offer_amount: f64,
    #[serde(default = "default_max_offer_pending_secs")]
    pub max_offer_pending_secs: f64,
    #[serde(default = "default_false")]
    pub dry_run: bool,
}

fn default_symbol() -> String {
    "fUSD".to_string()
}

fn default_ws_url() -> String {
    "wss://api.bitfinex.com/ws/2".to_string()
}

fn default_min_offer_amount() -> f64 {
    50.0
}

fn default_max_offer_pending_secs() -> f64 {
    120.0
}

fn default_false() -> bool {
    false
}

impl BotConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.as_ref().display()))?;
        let cfg: BotConfig = serde_json::from_str(&contents)
            .with_context(|| format!("invalid JSON in {}", path.as_ref().display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.key.is_empty(), "key must not be empty");
        anyhow::ensure!(!self.secret.is_empty(), "secret must not be empty");
        anyhow::ensure!(
            self.min_offer_amount > 0.0,
            "min_offer_amount must be greater than zero"
        );
        anyhow::ensure!(
            self.max_offer_pending_secs > 0.0,
            "max_offer_pending_secs must be greater than zero"
        );
        anyhow::ensure!(
            self.symbol.starts_with('f'),
            "symbol must be a funding symbol (got {})",
            self.symbol
        );
        let url = Url::parse(&self.ws_url)
            .with_context(|| format!("invalid ws_url {}", self.ws_url))?;
        anyhow::ensure!(
            url.scheme() == "ws" || url.scheme() == "wss",
            "ws_url must use a ws or wss scheme (got {})",
            url.scheme()
        );
        Ok(())
    }
}

// The API secret must never reach the logs.
impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("symbol", &self.symbol)
            .field("ws_url", &self.ws_url)
            .field("min_offer_amount", &self.min_offer_amount)
            .field("max_offer_pending_secs", &self.max_offer_pending_secs)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}
