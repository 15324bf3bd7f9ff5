use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use url::Url;

use crate::{
    config::BotConfig,
    errors::{WsError, WsResult},
    session::Session,
    wire::Outbound,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: f64,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl ExponentialBackoff {
    pub fn advance(&self, delay: Duration) -> Duration {
        delay.mul_f64(self.multiplier).min(self.max)
    }
}

enum PumpOutcome {
    Disconnected,
    Shutdown,
}

fn endpoint(config: &BotConfig) -> WsResult<Url> {
    let url = Url::parse(&config.ws_url)?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(WsError::UnsupportedScheme(other.to_string())),
    }
}

/// Dial-and-pump loop. Each successful dial gets a fresh [`Session`];
/// in-memory ledger and market state die with the connection and are
/// rebuilt from the post-auth snapshot. Transport failures reconnect
/// with jittered exponential backoff; Ctrl-C cancels outstanding offers
/// best-effort and returns.
pub async fn run(config: BotConfig) -> anyhow::Result<()> {
    let url = endpoint(&config)?;
    let backoff = ExponentialBackoff::default();
    let mut delay = backoff.initial;

    loop {
        match connect_async(url.as_str()).await {
            Ok((mut stream, _)) => {
                tracing::info!(%url, "connected");
                delay = backoff.initial;
                let mut session = Session::new(&config);
                match pump(&mut stream, &mut session, &config).await {
                    Ok(PumpOutcome::Shutdown) => return Ok(()),
                    Ok(PumpOutcome::Disconnected) => {
                        tracing::warn!("connection closed, reconnecting");
                    }
                    Err(err) => {
                        tracing::warn!(%err, "transport error, reconnecting");
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%err, "dial failed");
            }
        }

        let jitter = rand::thread_rng().gen_range(0.9..1.1);
        let actual_delay = delay.mul_f64(jitter);
        tracing::info!(?actual_delay, "waiting before reconnect");
        tokio::time::sleep(actual_delay).await;
        delay = backoff.advance(delay);
    }
}

async fn pump(
    stream: &mut WsStream,
    session: &mut Session,
    config: &BotConfig,
) -> WsResult<PumpOutcome> {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested, cancelling outstanding offers");
                let frames = session.shutdown_commands();
                if let Err(err) = send_all(stream, config, &frames).await {
                    tracing::warn!(%err, "failed to send shutdown cancels");
                }
                let _ = stream.close(None).await;
                return Ok(PumpOutcome::Shutdown);
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    handle_frame(stream, session, config, &text).await?;
                }
                Some(Ok(Message::Binary(binary))) => match String::from_utf8(binary) {
                    Ok(text) => handle_frame(stream, session, config, &text).await?,
                    Err(_) => tracing::warn!("skipping non-utf8 binary frame"),
                },
                Some(Ok(Message::Ping(payload))) => {
                    stream.send(Message::Pong(payload)).await?;
                }
                Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(?frame, "server closed the connection");
                    return Ok(PumpOutcome::Disconnected);
                }
                Some(Err(err)) => return Err(err.into()),
                None => return Ok(PumpOutcome::Disconnected),
            }
        }
    }
}

// One inbound message, processed to completion before the next frame is
// read. Parse and decode failures skip the message; only send failures
// propagate and tear the connection down.
async fn handle_frame(
    stream: &mut WsStream,
    session: &mut Session,
    config: &BotConfig,
    text: &str,
) -> WsResult<()> {
    let message: Value = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(err) => {
            tracing::warn!(%err, "skipping invalid JSON frame");
            return Ok(());
        }
    };

    match session.on_message(&message) {
        Ok(frames) => send_all(stream, config, &frames).await,
        Err(err) => {
            tracing::warn!(%err, "skipping malformed payload");
            Ok(())
        }
    }
}

async fn send_all(
    stream: &mut WsStream,
    config: &BotConfig,
    frames: &[Outbound],
) -> WsResult<()> {
    for frame in frames {
        let payload = frame.to_wire();
        if config.dry_run {
            tracing::info!(%payload, "dry run, not sending");
            continue;
        }
        tracing::debug!(%payload, "sending");
        stream.send(Message::Text(payload)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_url(ws_url: &str) -> BotConfig {
        BotConfig {
            key: "k".to_string(),
            secret: "s".to_string(),
            symbol: "fUSD".to_string(),
            ws_url: ws_url.to_string(),
            min_offer_amount: 50.0,
            max_offer_pending_secs: 120.0,
            dry_run: true,
        }
    }

    #[test]
    fn test_endpoint_accepts_ws_schemes() {
        assert!(endpoint(&config_with_url("wss://api.bitfinex.com/ws/2")).is_ok());
        assert!(endpoint(&config_with_url("ws://localhost:8080/ws/2")).is_ok());
    }

    #[test]
    fn test_endpoint_rejects_other_schemes() {
        assert!(matches!(
            endpoint(&config_with_url("https://api.bitfinex.com/ws/2")),
            Err(WsError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            endpoint(&config_with_url("not a url")),
            Err(WsError::Url(_))
        ));
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let backoff = ExponentialBackoff::default();
        let mut delay = backoff.initial;
        assert_eq!(delay, Duration::from_millis(500));

        delay = backoff.advance(delay);
        assert_eq!(delay, Duration::from_secs(1));

        for _ in 0..10 {
            delay = backoff.advance(delay);
        }
        assert_eq!(delay, Duration::from_secs(30));
    }
}
