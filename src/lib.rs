pub mod auth;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod feed;
pub mod ledger;
pub mod market;
pub mod session;
pub mod types;
pub mod wire;

pub use auth::{AuthRequest, NonceSeq};
pub use config::BotConfig;
pub use engine::{Command, DecisionEngine};
pub use errors::{DecodeError, DecodeResult, WsError, WsResult};
pub use events::{classify, Event};
pub use feed::ExponentialBackoff;
pub use ledger::{parse_snapshot, Offer, OfferLedger, OfferRecord};
pub use market::MarketState;
pub use session::{Session, SessionPhase};
pub use types::{ChannelId, OfferId};
pub use wire::Outbound;
