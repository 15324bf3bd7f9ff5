use serde_json::Value;

use crate::{
    errors::{DecodeError, DecodeResult},
    types::ChannelId,
};

/// One inbound websocket message, classified by structural shape.
///
/// Payload-carrying variants hold the raw value; decoding the inner
/// fields is deferred to the ledger/market apply operations so a bad
/// payload can be reported as a per-message decode error.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Error(Value),
    Connected,
    Authenticated,
    Subscribed(Value),
    HeartBeat(ChannelId),
    WalletUpdate(Value),
    FundingOfferSnapshot(Value),
    FundingOfferUpdate(Value),
    PublicFundingTradeExecuted(ChannelId),
    PublicFundingTicker(Value),
    Unrecognized,
}

/// Classify one decoded message. Total: any shape that matches no rule
/// comes back as [`Event::Unrecognized`], never an error, so unknown
/// messages cannot abort the session. Rules are checked in order and
/// the first match wins.
pub fn classify(message: &Value) -> Event {
    if let Some(object) = message.as_object() {
        return match object.get("event").and_then(Value::as_str) {
            Some("error") => Event::Error(message.clone()),
            Some("info") if platform_status(message) == Some(1) => Event::Connected,
            Some("auth") if object.get("status").and_then(Value::as_str) == Some("OK") => {
                Event::Authenticated
            }
            Some("subscribed") => Event::Subscribed(message.clone()),
            _ => Event::Unrecognized,
        };
    }

    let Some(items) = message.as_array() else {
        return Event::Unrecognized;
    };
    let Some(channel) = items.first().and_then(Value::as_i64).map(ChannelId::new) else {
        return Event::Unrecognized;
    };
    let Some(tag) = items.get(1) else {
        return Event::Unrecognized;
    };

    if tag.as_str() == Some("hb") {
        return Event::HeartBeat(channel);
    }

    if channel.is_private() {
        let Some(payload) = items.get(2) else {
            return Event::Unrecognized;
        };
        return match tag.as_str() {
            Some("wu") => Event::WalletUpdate(payload.clone()),
            Some("fos") => Event::FundingOfferSnapshot(payload.clone()),
            Some("fon") | Some("fou") | Some("foc") => Event::FundingOfferUpdate(payload.clone()),
            _ => Event::Unrecognized,
        };
    }

    if tag.as_str() == Some("fte") {
        return Event::PublicFundingTradeExecuted(channel);
    }

    // A ticker payload is itself an array of scalars; a nested array in
    // the first slot would be a trade list instead.
    if let Some(inner) = tag.as_array() {
        if inner.first().map(|first| !first.is_array()).unwrap_or(false) {
            return Event::PublicFundingTicker(tag.clone());
        }
    }

    Event::Unrecognized
}

fn platform_status(message: &Value) -> Option<i64> {
    message.get("platform")?.get("status")?.as_i64()
}

pub(crate) fn elem<'a>(
    payload: &'a Value,
    index: usize,
    context: &'static str,
) -> DecodeResult<&'a Value> {
    payload
        .get(index)
        .ok_or(DecodeError::Missing { context, index })
}

pub(crate) fn elem_f64(payload: &Value, index: usize, context: &'static str) -> DecodeResult<f64> {
    elem(payload, index, context)?
        .as_f64()
        .ok_or(DecodeError::BadType { context, index })
}

pub(crate) fn elem_i64(payload: &Value, index: usize, context: &'static str) -> DecodeResult<i64> {
    elem(payload, index, context)?
        .as_i64()
        .ok_or(DecodeError::BadType { context, index })
}

pub(crate) fn elem_str<'a>(
    payload: &'a Value,
    index: usize,
    context: &'static str,
) -> DecodeResult<&'a str> {
    elem(payload, index, context)?
        .as_str()
        .ok_or(DecodeError::BadType { context, index })
}
