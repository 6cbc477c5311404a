// Live log stream
//
// One WebSocket connection to the dashboard's `/ws/logs/` endpoint,
// authenticated by the session cookie on the upgrade request. Each text
// frame carries `{"message": "..."}`; frames fan out to subscribers as
// [`LogEvent`]s. When the connection ends, for any reason, a terminal
// [`LogEvent::Closed`] is emitted and the task exits. There is no
// automatic reconnect: opening a new channel is always the caller's
// explicit decision.

use std::time::Duration;

use chrono::{DateTime, Local};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::ClientRequestBuilder;
use tokio_tungstenite::tungstenite::http::Uri;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::client::Client;
use crate::error::Error;

const EVENT_CHANNEL_CAPACITY: usize = 1024;
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// One event from the live log stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// The connection is up. Emitted exactly once, before any line.
    Connected,
    /// One log line, stamped when it arrived.
    Line {
        received_at: DateTime<Local>,
        message: String,
    },
    /// The connection ended; no further events will follow. `reason` is
    /// the close-frame text or transport error, when one exists.
    Closed { reason: Option<String> },
}

/// Handle to a live log stream.
///
/// Dropping the handle does not stop the stream task; call
/// [`LogChannel::shutdown`] or cancel the token passed at connect.
pub struct LogChannel {
    events: broadcast::Receiver<LogEvent>,
    sender: broadcast::Sender<LogEvent>,
    cancel: CancellationToken,
}

impl Client {
    /// Open the live log stream for the current session.
    ///
    /// The connection is attempted in the background; the outcome arrives
    /// through the channel as [`LogEvent::Connected`] or a terminal
    /// [`LogEvent::Closed`].
    pub fn log_channel(&self, cancel: CancellationToken) -> Result<LogChannel, Error> {
        let url = self.ws_url()?;
        Ok(LogChannel::connect(url, self.cookie_header(), cancel))
    }
}

impl LogChannel {
    /// Connect to `ws_url`, sending `cookie` on the upgrade request when
    /// present. Returns immediately; events stream in as they happen.
    #[must_use]
    pub fn connect(ws_url: Url, cookie: Option<String>, cancel: CancellationToken) -> Self {
        let (sender, events) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let task_tx = sender.clone();
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let reason = match connect_and_read(&ws_url, &task_tx, &task_cancel, cookie).await {
                Ok(reason) => reason,
                Err(e) => {
                    warn!(error = %e, "log stream failed");
                    Some(e.to_string())
                }
            };
            let _ = task_tx.send(LogEvent::Closed { reason });
            debug!("log stream task exiting");
        });
        Self {
            events,
            sender,
            cancel,
        }
    }

    /// Receive the next event. Returns `None` once the stream task is gone
    /// and all buffered events are drained; [`LogEvent::Closed`] always
    /// precedes that. A slow consumer skips overwritten lines rather than
    /// stalling the stream.
    pub async fn recv(&mut self) -> Option<LogEvent> {
        loop {
            match self.events.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("log stream consumer lagged, skipped {skipped} lines");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Additional receiver for a second observer. It only sees events sent
    /// after this call; use [`LogChannel::recv`] for the primary consumer.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.sender.subscribe()
    }

    /// Stop the stream task. Idempotent.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// Run one connection to completion. Returns the peer's close reason, or
/// `None` for cancellation and clean stream end.
async fn connect_and_read(
    ws_url: &Url,
    events: &broadcast::Sender<LogEvent>,
    cancel: &CancellationToken,
    cookie: Option<String>,
) -> Result<Option<String>, Error> {
    let uri: Uri = ws_url
        .as_str()
        .parse()
        .map_err(|e| Error::WebSocket(format!("bad stream URL {ws_url}: {e}")))?;
    let mut request = ClientRequestBuilder::new(uri);
    if let Some(cookie) = cookie {
        request = request.with_header("Cookie", cookie);
    }

    let (stream, _response) = connect_async(request)
        .await
        .map_err(|e| Error::WebSocket(e.to_string()))?;
    info!("log stream connected to {ws_url}");
    let _ = events.send(LogEvent::Connected);

    let (mut write, mut read) = stream.split();

    // The consumer drops idle sockets; a periodic heartbeat keeps the
    // session alive. Swallow the interval's immediate first tick.
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("log stream cancelled");
                let _ = write.send(Message::Close(None)).await;
                return Ok(None);
            }

            _ = heartbeat.tick() => {
                let frame = serde_json::json!({"type": "heartbeat"}).to_string();
                if let Err(e) = write.send(Message::Text(frame.into())).await {
                    return Err(Error::WebSocket(format!("heartbeat failed: {e}")));
                }
                trace!("heartbeat sent");
            }

            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(event) = parse_line(&text) {
                            let _ = events.send(event);
                        }
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        trace!("stream ping/pong");
                    }
                    Some(Ok(Message::Close(close))) => {
                        debug!("log stream closed by server");
                        let reason = close.and_then(|frame| {
                            let text = frame.reason.to_string();
                            (!text.is_empty()).then_some(text)
                        });
                        return Ok(reason);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        return Err(Error::WebSocket(e.to_string()));
                    }
                    None => {
                        debug!("log stream ended");
                        return Ok(None);
                    }
                }
            }
        }
    }
}

/// Parse a text frame into a [`LogEvent::Line`]. Frames that are not
/// `{"message": "..."}` are logged and skipped.
fn parse_line(text: &str) -> Option<LogEvent> {
    #[derive(Deserialize)]
    struct Frame {
        message: String,
    }

    match serde_json::from_str::<Frame>(text) {
        Ok(frame) => Some(LogEvent::Line {
            received_at: Local::now(),
            message: frame.message,
        }),
        Err(e) => {
            debug!(error = %e, "skipping unparseable log frame");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn parses_message_frames() {
        let event = parse_line(r#"{"message": "a1b2c3d4: Motion detected"}"#).unwrap();
        match event {
            LogEvent::Line { message, .. } => {
                assert_eq!(message, "a1b2c3d4: Motion detected");
            }
            other => panic!("expected Line, got {other:?}"),
        }
    }

    #[test]
    fn skips_frames_without_message() {
        assert!(parse_line(r#"{"type": "heartbeat"}"#).is_none());
        assert!(parse_line("not json").is_none());
        assert!(parse_line("{}").is_none());
    }

    #[tokio::test]
    async fn refused_connection_yields_terminal_closed() {
        // Port 1 is never listening; the connect fails fast.
        let url = Url::parse("ws://127.0.0.1:1/ws/logs/").unwrap();
        let mut channel = LogChannel::connect(url, None, CancellationToken::new());
        match channel.recv().await {
            Some(LogEvent::Closed { reason }) => assert!(reason.is_some()),
            other => panic!("expected Closed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let url = Url::parse("ws://127.0.0.1:1/ws/logs/").unwrap();
        let channel = LogChannel::connect(url, None, CancellationToken::new());
        channel.shutdown();
        channel.shutdown();
    }
}
