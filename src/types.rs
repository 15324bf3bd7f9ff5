use std::fmt;

/// Identifier for a funding offer.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OfferId(pub i64);

impl OfferId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl From<i64> for OfferId {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<OfferId> for i64 {
    fn from(value: OfferId) -> Self {
        value.into_inner()
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a websocket channel. Channel 0 is the authenticated
/// account channel; every other id is a public market-data channel.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(pub i64);

impl ChannelId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn into_inner(self) -> i64 {
        self.0
    }

    pub const fn is_private(self) -> bool {
        self.0 == 0
    }
}

impl From<i64> for ChannelId {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<ChannelId> for i64 {
    fn from(value: ChannelId) -> Self {
        value.into_inner()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
