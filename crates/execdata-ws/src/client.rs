//! `RestEventsClient`: [`EventSource`] over the Access node's REST
//! WebSocket endpoint (`/v1/subscribe_events`).
//!
//! The connection is opened before `subscribe_events` returns, so an
//! unreachable server is reported to the caller directly. A background task
//! then owns the socket and forwards converted messages over a channel
//! until the server closes the stream, an error occurs, or the consumer
//! drops the stream.

use async_trait::async_trait;
use futures::{stream, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use execdata_core::{BlockEvents, EventFilter, EventSource, EventStream, SourceError, StartPosition};

use crate::error::WsError;
use crate::message::parse_message;

const SUBSCRIBE_EVENTS_PATH: &str = "/v1/subscribe_events";

/// Messages buffered between the socket task and the consumer.
const CHANNEL_CAPACITY: usize = 16;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Client for the REST event streaming endpoint.
#[derive(Debug, Clone)]
pub struct RestEventsClient {
    /// `host:port` of the REST API.
    address: String,
}

impl RestEventsClient {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    /// `ws://<address>/v1/subscribe_events?<query>` for this start and filter.
    pub fn subscribe_url(&self, start: &StartPosition, filter: &EventFilter) -> Result<Url, WsError> {
        let mut url = Url::parse(&format!("ws://{}{SUBSCRIBE_EVENTS_PATH}", self.address)).map_err(|e| {
            WsError::InvalidAddress {
                address: self.address.clone(),
                reason: e.to_string(),
            }
        })?;

        let pairs = filter.query_pairs(start);
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }
}

#[async_trait]
impl EventSource for RestEventsClient {
    async fn subscribe_events(&self, start: StartPosition, filter: &EventFilter) -> Result<EventStream, SourceError> {
        let url = self.subscribe_url(&start, filter)?;

        info!(url = %url, "Connecting to event stream");
        let (socket, _) = connect_async(url.as_str()).await.map_err(|e| WsError::Connect {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        info!(url = %url, "Event stream connected");

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(read_events(socket, tx));
        Ok(Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })))
    }
}

// ─── Internal read loop ───────────────────────────────────────────────────────

async fn read_events(mut socket: Socket, tx: mpsc::Sender<Result<BlockEvents, SourceError>>) {
    loop {
        // A silent server must not keep the socket alive once the consumer is gone.
        let frame = tokio::select! {
            biased;
            _ = tx.closed() => {
                debug!("Event stream consumer dropped");
                break;
            }
            frame = socket.next() => frame,
        };
        let Some(frame) = frame else {
            info!("Event stream ended");
            return;
        };

        let parsed = match frame {
            Ok(Message::Text(text)) => parse_message(&text),
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => parse_message(text),
                Err(e) => Err(WsError::Decode(format!("binary frame is not UTF-8: {e}"))),
            },
            Ok(Message::Close(frame)) => {
                info!(frame = ?frame, "Event stream closed by server");
                return;
            }
            // Pings are answered by the library.
            Ok(_) => continue,
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                info!("Event stream connection closed");
                return;
            }
            Err(e) => Err(WsError::WebSocket(e.to_string())),
        };

        match parsed {
            Ok(block) => {
                debug!(height = block.height, events = block.events.len(), "Received block events");
                if tx.send(Ok(block)).await.is_err() {
                    debug!("Event stream consumer dropped");
                    break;
                }
            }
            Err(err) => {
                warn!(error = %err, "Event stream failed");
                let _ = tx.send(Err(err.into())).await;
                break;
            }
        }
    }

    let _ = socket.close(None).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use execdata_core::Identifier;

    #[test]
    fn url_without_filter_has_no_query() {
        let client = RestEventsClient::new("localhost:8070");
        let url = client.subscribe_url(&StartPosition::Latest, &EventFilter::default()).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8070/v1/subscribe_events");
    }

    #[test]
    fn url_carries_start_and_filter() {
        let client = RestEventsClient::new("rest-mainnet.onflow.org");
        let filter = EventFilter::from_csv("", "A.1654653399040a61.FlowToken", "");
        let url = client.subscribe_url(&StartPosition::Height(100), &filter).unwrap();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("height".to_string(), "100".to_string()),
                ("contracts".to_string(), "A.1654653399040a61.FlowToken".to_string()),
            ]
        );

        let id = Identifier::new([0xaa; 32]);
        let url = client.subscribe_url(&StartPosition::BlockId(id), &EventFilter::default()).unwrap();
        assert_eq!(url.query(), Some(format!("start_block_id={id}").as_str()));
    }

    #[test]
    fn bad_address_is_rejected() {
        let client = RestEventsClient::new("bad host:1");
        assert!(matches!(
            client.subscribe_url(&StartPosition::Latest, &EventFilter::default()),
            Err(WsError::InvalidAddress { .. })
        ));
    }
}
