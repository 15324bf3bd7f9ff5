use std::collections::BTreeMap;

use serde_json::Value;

use crate::{
    errors::{DecodeError, DecodeResult},
    events::{elem_f64, elem_i64, elem_str},
    types::OfferId,
};

const STATUS_ACTIVE: &str = "ACTIVE";

// Positional layout of a funding offer record on the wire.
const IDX_ID: usize = 0;
const IDX_CREATED_AT: usize = 3;
const IDX_AMOUNT: usize = 4;
const IDX_STATUS: usize = 10;
const IDX_RATE: usize = 14;

/// One funding offer record as reported by the exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferRecord {
    pub id: OfferId,
    pub created_at: i64,
    pub amount: f64,
    pub rate: f64,
    pub status: String,
}

impl OfferRecord {
    pub fn from_wire(record: &Value) -> DecodeResult<Self> {
        let context = "funding offer record";
        Ok(Self {
            id: OfferId::new(elem_i64(record, IDX_ID, context)?),
            created_at: elem_i64(record, IDX_CREATED_AT, context)?,
            amount: elem_f64(record, IDX_AMOUNT, context)?,
            rate: elem_f64(record, IDX_RATE, context)?,
            status: elem_str(record, IDX_STATUS, context)?.to_string(),
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }
}

/// An offer retained in the ledger. The reported status is not stored:
/// presence in the ledger means ACTIVE.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offer {
    pub created_at: i64,
    pub amount: f64,
    pub rate: f64,
}

/// In-memory map of the currently active funding offers, keyed by offer
/// id. Mutated only through exchange-reported offer records.
#[derive(Debug, Default)]
pub struct OfferLedger {
    offers: BTreeMap<OfferId, Offer>,
}

impl OfferLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one offer record: an ACTIVE record inserts or overwrites
    /// the entry, any other status removes it (no-op when absent).
    pub fn apply(&mut self, record: &OfferRecord) {
        if record.is_active() {
            self.offers.insert(
                record.id,
                Offer {
                    created_at: record.created_at,
                    amount: record.amount,
                    rate: record.rate,
                },
            );
        } else {
            self.offers.remove(&record.id);
        }
    }

    /// Apply a full snapshot. Additive over the current map: offers
    /// absent from the snapshot are not removed.
    pub fn apply_snapshot(&mut self, records: &[OfferRecord]) {
        for record in records {
            self.apply(record);
        }
    }

    pub fn get(&self, id: OfferId) -> Option<&Offer> {
        self.offers.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (OfferId, &Offer)> {
        self.offers.iter().map(|(id, offer)| (*id, offer))
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

/// Parse every record of a snapshot payload before any is applied, so a
/// malformed element leaves the ledger untouched.
pub fn parse_snapshot(payload: &Value) -> DecodeResult<Vec<OfferRecord>> {
    let context = "funding offer snapshot";
    let items = payload.as_array().ok_or(DecodeError::BadType {
        context,
        index: 0,
    })?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            // Surface the element position, not the field position,
            // when a snapshot entry is not even an array.
            if !item.is_array() {
                return Err(DecodeError::BadType { context, index });
            }
            OfferRecord::from_wire(item)
        })
        .collect()
}

// Log-friendly rendering of the current ledger contents.
pub(crate) fn describe(ledger: &OfferLedger) -> String {
    let entries: Vec<String> = ledger
        .iter()
        .map(|(id, offer)| format!("{}: {:.2} @ {:.6}", id, offer.amount, offer.rate))
        .collect();
    entries.join(", ")
}
