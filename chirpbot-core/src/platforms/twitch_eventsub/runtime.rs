// twitch_eventsub/runtime.rs

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};

use crate::Error;
use crate::eventbus::{BotEvent, EventBus};
use crate::platforms::ConnectionStatus;
use crate::platforms::twitch::client::TwitchHelixClient;

use super::events::{parse_twitch_notification, EventSubNotificationEnvelope};
use super::subscriptions::SubscriptionDescriptor;

pub const EVENTSUB_WS_URL: &str = "wss://eventsub.wss.twitch.tv/ws";
const RECONNECT_BACKOFF: Duration = Duration::from_secs(15);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One decoded text frame from the EventSub socket.
#[derive(Debug)]
pub enum EventSubFrame {
    Welcome { session_id: String },
    Keepalive,
    Reconnect { url: String },
    Notification(Option<BotEvent>),
    Revocation { sub_type: String, status: String },
    Other(Option<String>),
}

/// Decode a TEXT frame. Errors only on invalid JSON or a reconnect frame
/// without a URL.
pub fn parse_frame(txt: &str) -> Result<EventSubFrame, Error> {
    let parsed: serde_json::Value = serde_json::from_str(txt)
        .map_err(|e| Error::Platform(format!("bad json: {e}")))?;

    let message_type = parsed
        .pointer("/metadata/message_type")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let frame = match message_type.as_deref() {
        Some("session_welcome") => {
            let session_id = parsed
                .pointer("/payload/session/id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| Error::Platform("welcome without session id".into()))?;
            EventSubFrame::Welcome { session_id: session_id.to_string() }
        }
        Some("session_keepalive") => EventSubFrame::Keepalive,
        Some("session_reconnect") => {
            let url = parsed
                .pointer("/payload/session/reconnect_url")
                .and_then(|v| v.as_str())
                .ok_or_else(|| Error::Platform("missing reconnect_url".into()))?;
            EventSubFrame::Reconnect { url: url.to_string() }
        }
        Some("notification") => {
            let evt = parsed
                .get("payload")
                .cloned()
                .and_then(|p| serde_json::from_value::<EventSubNotificationEnvelope>(p).ok())
                .and_then(|env| parse_twitch_notification(&env.subscription.sub_type, &env.event));
            EventSubFrame::Notification(evt)
        }
        Some("revocation") => {
            let sub_type = parsed
                .pointer("/payload/subscription/type")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let status = parsed
                .pointer("/payload/subscription/status")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            EventSubFrame::Revocation { sub_type, status }
        }
        _ => EventSubFrame::Other(message_type),
    };
    Ok(frame)
}

/// How a read loop ended.
enum ReadOutcome {
    /// Twitch asked us to hop to a new URL.
    Reconnect(String),
    /// Socket closed by the peer.
    Closed,
    /// Local shutdown requested.
    Shutdown,
}

/// Holds all state for the EventSub websocket session.
pub struct TwitchEventSubPlatform {
    helix: TwitchHelixClient,
    subscriptions: Vec<SubscriptionDescriptor>,
    event_bus: Arc<EventBus>,
    status_tx: watch::Sender<ConnectionStatus>,
    ws_url: String,
}

impl TwitchEventSubPlatform {
    pub fn new(
        helix: TwitchHelixClient,
        subscriptions: Vec<SubscriptionDescriptor>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            helix,
            subscriptions,
            event_bus,
            status_tx,
            ws_url: EVENTSUB_WS_URL.to_string(),
        }
    }

    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = url.into();
        self
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status_tx.borrow().clone()
    }

    fn set_status(&self, status: ConnectionStatus) {
        debug!("[EventSub] status → {:?}", status);
        self.status_tx.send_replace(status);
    }

    /// Entrypoint: keeps the socket alive and hops when Twitch says so.
    /// Returns `Ok(())` on shutdown, `Err` on a fatal auth failure.
    pub async fn start_loop(&mut self) -> Result<(), Error> {
        let mut shutdown_rx = self.event_bus.shutdown_rx.clone();
        let mut url = self.ws_url.clone();
        // Subscriptions survive a server-initiated reconnect.
        let mut subscribe_on_welcome = true;

        loop {
            if self.event_bus.is_shutdown() {
                break;
            }

            self.set_status(ConnectionStatus::Connecting);
            let connected = tokio::select! {
                res = connect_async(url.as_str()) => res,
                _ = shutdown_rx.changed() => break,
            };
            let mut ws = match connected {
                Ok((ws, _)) => ws,
                Err(e) => {
                    error!("[EventSub] connect error: {}", e);
                    self.set_status(ConnectionStatus::Reconnecting);
                    if Self::backoff(&mut shutdown_rx).await {
                        break;
                    }
                    continue;
                }
            };
            info!("[EventSub] connected → {}", url);

            match self.run_read_loop(&mut ws, &mut shutdown_rx, subscribe_on_welcome).await {
                Ok(ReadOutcome::Reconnect(new_url)) => {
                    warn!("[EventSub] reconnecting → {}", new_url);
                    let _ = ws.close(None).await;
                    url = new_url;
                    subscribe_on_welcome = false;
                    self.set_status(ConnectionStatus::Reconnecting);
                }
                Ok(ReadOutcome::Closed) => {
                    warn!("[EventSub] websocket closed by peer; reconnecting");
                    url = self.ws_url.clone();
                    subscribe_on_welcome = true;
                    self.set_status(ConnectionStatus::Reconnecting);
                    if Self::backoff(&mut shutdown_rx).await {
                        break;
                    }
                }
                Ok(ReadOutcome::Shutdown) => {
                    let _ = ws.close(None).await;
                    break;
                }
                Err(Error::Validation(msg)) => {
                    error!("[EventSub] auth failure, giving up: {}", msg);
                    let _ = ws.close(None).await;
                    self.set_status(ConnectionStatus::Disconnected);
                    return Err(Error::Validation(msg));
                }
                Err(e) => {
                    error!("[EventSub] loop error: {}", e);
                    let _ = ws.close(None).await;
                    url = self.ws_url.clone();
                    subscribe_on_welcome = true;
                    self.set_status(ConnectionStatus::Reconnecting);
                    if Self::backoff(&mut shutdown_rx).await {
                        break;
                    }
                }
            }
        }

        info!("[EventSub] subscription closed.");
        self.set_status(ConnectionStatus::Disconnected);
        Ok(())
    }

    /// Sleeps for the backoff period. Returns `true` if shutdown fired meanwhile.
    async fn backoff(shutdown_rx: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            _ = sleep(RECONNECT_BACKOFF) => *shutdown_rx.borrow(),
            _ = shutdown_rx.changed() => true,
        }
    }

    /// Reads until the socket closes, a reconnect URL arrives or shutdown fires.
    async fn run_read_loop(
        &self,
        ws: &mut WsStream,
        shutdown_rx: &mut watch::Receiver<bool>,
        subscribe_on_welcome: bool,
    ) -> Result<ReadOutcome, Error> {
        loop {
            let next = tokio::select! {
                msg = ws.next() => msg,
                _ = shutdown_rx.changed() => return Ok(ReadOutcome::Shutdown),
            };
            let Some(msg_res) = next else {
                return Ok(ReadOutcome::Closed);
            };
            let msg = msg_res.map_err(|e| Error::Platform(format!("ws error: {e}")))?;

            // control frames
            if msg.is_close() {
                return Ok(ReadOutcome::Closed);
            }
            if msg.is_ping() || msg.is_pong() {
                continue;
            }

            // text frames
            let Message::Text(txt) = msg else { continue };
            match parse_frame(txt.as_str())? {
                EventSubFrame::Welcome { session_id } => {
                    debug!("[EventSub] session_welcome id={}", session_id);
                    if subscribe_on_welcome {
                        self.subscribe_all_events(&session_id).await?;
                    }
                    self.set_status(ConnectionStatus::Subscribed);
                }
                EventSubFrame::Keepalive => trace!("keepalive"),
                EventSubFrame::Reconnect { url } => return Ok(ReadOutcome::Reconnect(url)),
                EventSubFrame::Notification(Some(evt)) => {
                    self.event_bus.publish(evt).await;
                }
                EventSubFrame::Notification(None) => {
                    debug!("[EventSub] notification of an unhandled type");
                }
                EventSubFrame::Revocation { sub_type, status } => {
                    warn!("subscription {} revoked ({}) – check scopes", sub_type, status);
                }
                EventSubFrame::Other(other) => debug!("unhandled message_type={:?}", other),
            }
        }
    }

    async fn subscribe_all_events(&self, session_id: &str) -> Result<(), Error> {
        for descriptor in &self.subscriptions {
            match self.helix.create_eventsub_subscription(session_id, descriptor).await {
                Ok(()) => debug!("[EventSub] subscribed to {} OK", descriptor.kind.event_type()),
                Err(e @ Error::Validation(_)) => return Err(e),
                Err(e) => warn!("[EventSub] {}", e),
            }
        }
        Ok(())
    }
}
