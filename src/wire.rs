use serde_json::json;

use crate::{auth::AuthRequest, types::OfferId};

/// One outbound websocket frame.
#[derive(Debug, Clone)]
pub enum Outbound {
    Auth(AuthRequest),
    Subscribe {
        channel: &'static str,
        symbol: String,
    },
    Submit {
        symbol: String,
        amount: f64,
        rate: f64,
        period: i64,
    },
    Cancel(OfferId),
}

impl Outbound {
    pub fn subscribe_trades(symbol: &str) -> Self {
        Outbound::Subscribe {
            channel: "trades",
            symbol: symbol.to_string(),
        }
    }

    pub fn subscribe_ticker(symbol: &str) -> Self {
        Outbound::Subscribe {
            channel: "ticker",
            symbol: symbol.to_string(),
        }
    }

    /// Serialize to the exchange wire format. Amount and rate travel as
    /// strings, per the venue's offer submission schema.
    pub fn to_wire(&self) -> String {
        match self {
            Outbound::Auth(request) => json!(request).to_string(),
            Outbound::Subscribe { channel, symbol } => json!({
                "event": "subscribe",
                "channel": channel,
                "symbol": symbol,
            })
            .to_string(),
            Outbound::Submit {
                symbol,
                amount,
                rate,
                period,
            } => json!([
                0,
                "fon",
                null,
                {
                    "type": "LIMIT",
                    "symbol": symbol,
                    "amount": amount.to_string(),
                    "rate": rate.to_string(),
                    "period": period,
                }
            ])
            .to_string(),
            Outbound::Cancel(id) => {
                json!([0, "foc", null, { "id": id.into_inner() }]).to_string()
            }
        }
    }
}
