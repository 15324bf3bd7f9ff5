use crate::{ledger::OfferLedger, market::MarketState, types::OfferId};

/// One trading decision. Sending is delegated to the session so the
/// engine stays side-effect-free.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Cancel(OfferId),
    Submit { amount: f64, rate: f64, period: i64 },
}

/// Offer-lifecycle decision engine. Evaluated on the private heartbeat
/// and on every public ticker update, against one consistent
/// ledger/market snapshot.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    pub min_offer_amount: f64,
    pub max_pending_secs: f64,
}

impl DecisionEngine {
    pub fn new(min_offer_amount: f64, max_pending_secs: f64) -> Self {
        Self {
            min_offer_amount,
            max_pending_secs,
        }
    }

    /// Scan the whole ledger for offers pending longer than the
    /// configured maximum and cancel them, then submit one fixed-size
    /// offer at the last observed bid when balance allows. Cancels come
    /// first, ordered by offer id.
    pub fn evaluate(
        &self,
        ledger: &OfferLedger,
        market: &MarketState,
        now_ms: i64,
    ) -> Vec<Command> {
        let mut commands = Vec::new();

        for (id, offer) in ledger.iter() {
            let age_secs = (now_ms - offer.created_at) as f64 / 1000.0;
            if age_secs > self.max_pending_secs {
                tracing::info!(%id, age_secs, "cancelling stale offer");
                commands.push(Command::Cancel(id));
            }
        }

        if market.available_balance >= self.min_offer_amount {
            tracing::info!(
                amount = self.min_offer_amount,
                rate = market.last_bid_rate,
                period = market.last_bid_period,
                "submitting offer"
            );
            commands.push(Command::Submit {
                amount: self.min_offer_amount,
                rate: market.last_bid_rate,
                period: market.last_bid_period,
            });
        }

        commands
    }
}
