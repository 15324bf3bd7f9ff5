use serde_json::Value;

use crate::{
    errors::DecodeResult,
    events::{elem_f64, elem_i64, elem_str},
};

// Wallet record: [wallet_type, currency, balance, unsettled, available, ...]
const IDX_WALLET_TYPE: usize = 0;
const IDX_WALLET_CURRENCY: usize = 1;
const IDX_WALLET_AVAILABLE: usize = 4;

// Funding ticker: [frr, bid, bid_period, ...]
const IDX_TICKER_BID: usize = 1;
const IDX_TICKER_BID_PERIOD: usize = 2;

/// Last observed market and balance snapshot. Overwritten wholesale on
/// each relevant event; no history is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketState {
    pub available_balance: f64,
    pub last_bid_rate: f64,
    pub last_bid_period: i64,
}

impl Default for MarketState {
    fn default() -> Self {
        Self {
            available_balance: 0.0,
            last_bid_rate: 0.0,
            last_bid_period: 30,
        }
    }
}

impl MarketState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one wallet update record. Only the funding USD wallet is
    /// tracked; records for other wallets or currencies are ignored.
    /// Returns whether the balance changed.
    pub fn apply_wallet_update(&mut self, record: &Value) -> DecodeResult<bool> {
        let context = "wallet update";
        let wallet_type = elem_str(record, IDX_WALLET_TYPE, context)?;
        let currency = elem_str(record, IDX_WALLET_CURRENCY, context)?;
        if wallet_type != "funding" || currency != "USD" {
            return Ok(false);
        }
        self.available_balance = elem_f64(record, IDX_WALLET_AVAILABLE, context)?;
        Ok(true)
    }

    /// Apply one public funding ticker payload. Both fields are parsed
    /// before either is written, so a short payload mutates nothing.
    pub fn apply_ticker(&mut self, payload: &Value) -> DecodeResult<()> {
        let context = "funding ticker";
        let bid_rate = elem_f64(payload, IDX_TICKER_BID, context)?;
        let bid_period = elem_i64(payload, IDX_TICKER_BID_PERIOD, context)?;
        self.last_bid_rate = bid_rate;
        self.last_bid_period = bid_period;
        Ok(())
    }
}
