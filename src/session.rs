use chrono::Utc;
use serde_json::Value;

use crate::{
    auth::{AuthRequest, NonceSeq},
    config::BotConfig,
    engine::{Command, DecisionEngine},
    errors::DecodeResult,
    events::{classify, Event},
    ledger::{self, OfferLedger, OfferRecord},
    market::MarketState,
    wire::Outbound,
};

/// Connection lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unauthenticated,
    AwaitingAuth,
    Ready,
}

/// One connection's worth of state: lifecycle phase, offer ledger,
/// market snapshot and the decision engine acting on them. The single
/// mutation point for all of it is [`Session::on_message`], so a
/// decision always sees the ledger and market state as of one inbound
/// message. A fresh session is built per connection; nothing survives a
/// reconnect.
pub struct Session {
    phase: SessionPhase,
    ledger: OfferLedger,
    market: MarketState,
    nonces: NonceSeq,
    engine: DecisionEngine,
    key: String,
    secret: String,
    symbol: String,
}

impl Session {
    pub fn new(config: &BotConfig) -> Self {
        Self {
            phase: SessionPhase::Unauthenticated,
            ledger: OfferLedger::new(),
            market: MarketState::new(),
            nonces: NonceSeq::new(),
            engine: DecisionEngine::new(config.min_offer_amount, config.max_offer_pending_secs),
            key: config.key.clone(),
            secret: config.secret.clone(),
            symbol: config.symbol.clone(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn ledger(&self) -> &OfferLedger {
        &self.ledger
    }

    pub fn market(&self) -> &MarketState {
        &self.market
    }

    /// Process one inbound message completely: classify, mutate state,
    /// and produce any outbound frames. The caller must send the frames
    /// (and only then feed the next message), which keeps every
    /// decision on a consistent snapshot.
    pub fn on_message(&mut self, message: &Value) -> DecodeResult<Vec<Outbound>> {
        self.on_message_at(message, Utc::now().timestamp_millis())
    }

    pub fn on_message_at(&mut self, message: &Value, now_ms: i64) -> DecodeResult<Vec<Outbound>> {
        match classify(message) {
            Event::Error(report) => {
                tracing::warn!(%report, "exchange reported an error");
                Ok(Vec::new())
            }
            Event::Connected => Ok(self.on_connected()),
            Event::Authenticated => {
                if self.phase == SessionPhase::AwaitingAuth {
                    self.phase = SessionPhase::Ready;
                }
                tracing::info!("authenticated");
                Ok(Vec::new())
            }
            Event::Subscribed(ack) => {
                tracing::info!(
                    channel = ack.get("channel").and_then(serde_json::Value::as_str).unwrap_or("?"),
                    symbol = ack.get("symbol").and_then(serde_json::Value::as_str).unwrap_or("?"),
                    "subscribed"
                );
                Ok(Vec::new())
            }
            Event::HeartBeat(channel) => {
                if channel.is_private() {
                    tracing::debug!("private heartbeat");
                    Ok(self.run_engine(now_ms))
                } else {
                    Ok(Vec::new())
                }
            }
            Event::WalletUpdate(record) => {
                if self.market.apply_wallet_update(&record)? {
                    tracing::info!(
                        available = self.market.available_balance,
                        "funding USD balance updated"
                    );
                }
                Ok(Vec::new())
            }
            Event::FundingOfferSnapshot(payload) => {
                let records = ledger::parse_snapshot(&payload)?;
                self.ledger.apply_snapshot(&records);
                tracing::info!(
                    count = self.ledger.len(),
                    offers = %ledger::describe(&self.ledger),
                    "offer snapshot applied"
                );
                Ok(Vec::new())
            }
            Event::FundingOfferUpdate(record) => {
                self.ledger.apply(&OfferRecord::from_wire(&record)?);
                tracing::info!(
                    count = self.ledger.len(),
                    offers = %ledger::describe(&self.ledger),
                    "offer update applied"
                );
                Ok(Vec::new())
            }
            Event::PublicFundingTradeExecuted(channel) => {
                tracing::debug!(%channel, "public funding trade executed");
                Ok(Vec::new())
            }
            Event::PublicFundingTicker(payload) => {
                self.market.apply_ticker(&payload)?;
                tracing::info!(
                    rate = self.market.last_bid_rate,
                    period = self.market.last_bid_period,
                    "last bid updated"
                );
                Ok(self.run_engine(now_ms))
            }
            Event::Unrecognized => Ok(Vec::new()),
        }
    }

    /// Cancel frames for every live ledger entry, sent best-effort on
    /// graceful shutdown.
    pub fn shutdown_commands(&self) -> Vec<Outbound> {
        self.ledger
            .iter()
            .map(|(id, _)| Outbound::Cancel(id))
            .collect()
    }

    fn on_connected(&mut self) -> Vec<Outbound> {
        if self.phase != SessionPhase::Unauthenticated {
            tracing::debug!(phase = ?self.phase, "ignoring duplicate platform-up notice");
            return Vec::new();
        }
        tracing::info!("platform up, authenticating");
        self.phase = SessionPhase::AwaitingAuth;
        let nonce = self.nonces.next();
        vec![
            Outbound::Auth(AuthRequest::new(&self.key, &self.secret, nonce)),
            Outbound::subscribe_trades(&self.symbol),
            Outbound::subscribe_ticker(&self.symbol),
        ]
    }

    // Decision triggers only count once authenticated; before that
    // there is nothing to cancel and no authority to submit.
    fn run_engine(&mut self, now_ms: i64) -> Vec<Outbound> {
        if self.phase != SessionPhase::Ready {
            return Vec::new();
        }
        self.engine
            .evaluate(&self.ledger, &self.market, now_ms)
            .into_iter()
            .map(|command| match command {
                Command::Cancel(id) => Outbound::Cancel(id),
                Command::Submit {
                    amount,
                    rate,
                    period,
                } => Outbound::Submit {
                    symbol: self.symbol.clone(),
                    amount,
                    rate,
                    period,
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OfferId;
    use serde_json::json;

    const NOW_MS: i64 = 1_700_000_000_000;

    fn config() -> BotConfig {
        BotConfig {
            key: "k".to_string(),
            secret: "s".to_string(),
            symbol: "fUSD".to_string(),
            ws_url: "wss://api.bitfinex.com/ws/2".to_string(),
            min_offer_amount: 50.0,
            max_offer_pending_secs: 120.0,
            dry_run: false,
        }
    }

    fn ready_session() -> Session {
        let mut session = Session::new(&config());
        session
            .on_message_at(&json!({"event": "info", "platform": {"status": 1}}), NOW_MS)
            .unwrap();
        session
            .on_message_at(&json!({"event": "auth", "status": "OK"}), NOW_MS)
            .unwrap();
        assert_eq!(session.phase(), SessionPhase::Ready);
        session
    }

    #[test]
    fn test_connected_sends_auth_then_subscriptions() {
        let mut session = Session::new(&config());
        let outbound = session
            .on_message_at(&json!({"event": "info", "platform": {"status": 1}}), NOW_MS)
            .unwrap();

        assert_eq!(session.phase(), SessionPhase::AwaitingAuth);
        assert_eq!(outbound.len(), 3);
        assert!(matches!(outbound[0], Outbound::Auth(_)));
        assert!(matches!(
            outbound[1],
            Outbound::Subscribe {
                channel: "trades",
                ..
            }
        ));
        assert!(matches!(
            outbound[2],
            Outbound::Subscribe {
                channel: "ticker",
                ..
            }
        ));
    }

    #[test]
    fn test_auth_reply_completes_handshake_silently() {
        let mut session = Session::new(&config());
        session
            .on_message_at(&json!({"event": "info", "platform": {"status": 1}}), NOW_MS)
            .unwrap();
        let outbound = session
            .on_message_at(&json!({"event": "auth", "status": "OK"}), NOW_MS)
            .unwrap();
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert!(outbound.is_empty());
    }

    #[test]
    fn test_private_heartbeat_triggers_submit() {
        let mut session = ready_session();
        session
            .on_message_at(&json!([0, "wu", ["funding", "USD", 120.0, 0.0, 100.0]]), NOW_MS)
            .unwrap();

        let outbound = session.on_message_at(&json!([0, "hb"]), NOW_MS).unwrap();
        assert_eq!(outbound.len(), 1);
        assert!(matches!(
            outbound[0],
            Outbound::Submit { amount, .. } if amount == 50.0
        ));
    }

    #[test]
    fn test_public_heartbeat_is_not_a_trigger() {
        let mut session = ready_session();
        session
            .on_message_at(&json!([0, "wu", ["funding", "USD", 120.0, 0.0, 100.0]]), NOW_MS)
            .unwrap();

        let outbound = session.on_message_at(&json!([5, "hb"]), NOW_MS).unwrap();
        assert!(outbound.is_empty());
    }

    #[test]
    fn test_ticker_updates_market_and_triggers() {
        let mut session = ready_session();
        session
            .on_message_at(&json!([0, "wu", ["funding", "USD", 120.0, 0.0, 100.0]]), NOW_MS)
            .unwrap();

        let outbound = session
            .on_message_at(&json!([17, [0.0004, 0.0003, 7, 1000.0]]), NOW_MS)
            .unwrap();
        assert_eq!(session.market().last_bid_rate, 0.0003);
        assert_eq!(
            outbound.len(),
            1,
            "one submit expected, got {outbound:?}"
        );
        assert!(matches!(
            &outbound[0],
            Outbound::Submit { rate, period, .. } if *rate == 0.0003 && *period == 7
        ));
    }

    #[test]
    fn test_triggers_are_inert_before_ready() {
        let mut session = Session::new(&config());
        session
            .on_message_at(&json!([0, "wu", ["funding", "USD", 120.0, 0.0, 100.0]]), NOW_MS)
            .unwrap();

        assert!(session.on_message_at(&json!([0, "hb"]), NOW_MS).unwrap().is_empty());
        assert!(session
            .on_message_at(&json!([17, [0.0004, 0.0003, 7]]), NOW_MS)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_stale_offer_cancelled_on_heartbeat() {
        let mut session = ready_session();
        let record = json!([
            41, "fUSD", NOW_MS - 121_000, NOW_MS - 121_000, 50.0, 50.0, 0, 0, null, null,
            "ACTIVE", null, null, null, 0.0003, 2
        ]);
        session
            .on_message_at(&json!([0, "fon", record]), NOW_MS)
            .unwrap();

        let outbound = session.on_message_at(&json!([0, "hb"]), NOW_MS).unwrap();
        assert_eq!(outbound.len(), 1);
        assert!(matches!(outbound[0], Outbound::Cancel(id) if id == OfferId::new(41)));
    }

    #[test]
    fn test_error_event_does_not_change_phase() {
        let mut session = ready_session();
        let outbound = session
            .on_message_at(&json!({"event": "error", "msg": "nonce too small"}), NOW_MS)
            .unwrap();
        assert!(outbound.is_empty());
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[test]
    fn test_unrecognized_mutates_nothing() {
        let mut session = ready_session();
        let outbound = session
            .on_message_at(&json!({"weird": [1, 2, 3]}), NOW_MS)
            .unwrap();
        assert!(outbound.is_empty());
        assert!(session.ledger().is_empty());
        assert_eq!(*session.market(), MarketState::new());
    }

    #[test]
    fn test_shutdown_commands_cover_ledger() {
        let mut session = ready_session();
        for id in [3, 1, 2] {
            let record = json!([
                id, "fUSD", NOW_MS, NOW_MS, 50.0, 50.0, 0, 0, null, null,
                "ACTIVE", null, null, null, 0.0003, 2
            ]);
            session
                .on_message_at(&json!([0, "fon", record]), NOW_MS)
                .unwrap();
        }

        let commands = session.shutdown_commands();
        let ids: Vec<i64> = commands
            .iter()
            .map(|frame| match frame {
                Outbound::Cancel(id) => id.into_inner(),
                other => panic!("unexpected frame {other:?}"),
            })
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
