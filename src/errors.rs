use thiserror::Error;

pub type WsResult<T> = std::result::Result<T, WsError>;

/// Transport-level failures. Any of these abandons the current session;
/// the feed loop reconnects with backoff and rebuilds state from the
/// next snapshot.
#[derive(Debug, Error)]
pub enum WsError {
    #[error("unsupported websocket scheme {0}")]
    UnsupportedScheme(String),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Malformed payload inside a recognized message variant. Recoverable:
/// the offending message is skipped and the session continues.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{context}: missing element {index}")]
    Missing {
        context: &'static str,
        index: usize,
    },
    #[error("{context}: element {index} has unexpected type")]
    BadType {
        context: &'static str,
        index: usize,
    },
}
