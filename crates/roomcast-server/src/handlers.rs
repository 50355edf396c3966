//! Connection handlers for the Roomcast server.
//!
//! This module handles the connection lifecycle and event processing.

use crate::config::Config;
use crate::metrics::{self, ConnectionMetricsGuard};
use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use roomcast_core::{ConnectionId, Directory, EventSink, Router as EventRouter};
use roomcast_protocol::{codec, ServerEvent};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Fan-out table from connection id to its outbound frame queue.
///
/// This is the router's delivery seam: encoding failures and dead
/// receivers are logged and swallowed, never surfaced back to routing.
#[derive(Default)]
pub struct ConnectionTable {
    senders: DashMap<ConnectionId, mpsc::UnboundedSender<String>>,
}

impl ConnectionTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection's outbound queue.
    pub fn register(&self, conn: ConnectionId, tx: mpsc::UnboundedSender<String>) {
        self.senders.insert(conn, tx);
    }

    /// Remove a connection's outbound queue.
    pub fn deregister(&self, conn: &ConnectionId) {
        self.senders.remove(conn);
    }

    /// Number of registered connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// Check if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

impl EventSink for ConnectionTable {
    fn deliver(&self, target: &ConnectionId, event: &ServerEvent) {
        let text = match codec::encode(event) {
            Ok(text) => text,
            Err(e) => {
                error!(event = event.name(), error = %e, "Failed to encode outbound event");
                metrics::record_error("encode");
                return;
            }
        };

        match self.senders.get(target) {
            Some(tx) => {
                metrics::record_event(text.len(), "outbound");
                if tx.send(text).is_err() {
                    warn!(connection = %target, "Dropping event for closed connection");
                }
            }
            None => {
                debug!(connection = %target, "Dropping event for unknown connection");
            }
        }
    }
}

/// Shared server state.
pub struct AppState {
    /// The event router.
    pub router: EventRouter,
    /// Outbound queues per connection.
    pub connections: Arc<ConnectionTable>,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Create new app state.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured room seed is invalid.
    pub fn new(config: Config) -> Result<Self> {
        let connections = Arc::new(ConnectionTable::new());

        let directory = if config.rooms.is_empty() {
            Directory::seed()
        } else {
            Directory::from_seed(config.rooms.clone())?
        };

        let router = EventRouter::with_directory(directory, connections.clone());

        Ok(Self {
            router,
            connections,
            config,
        })
    }
}

/// Run the HTTP/WebSocket server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(config.clone())?);

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    // Build router
    let app = Router::new()
        .route(&config.transport.websocket_path, get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    // Bind and serve
    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr).await?;

    info!("Roomcast server listening on {}", addr);
    info!(
        "WebSocket endpoint: ws://{}{}",
        addr, config.transport.websocket_path
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_websocket(socket: WebSocket, state: Arc<AppState>) {
    // Record connection metrics
    let _metrics_guard = ConnectionMetricsGuard::new();

    let connection_id = ConnectionId::generate();
    debug!(connection = %connection_id, "WebSocket connected");

    // Split the WebSocket
    let (mut sender, mut receiver) = socket.split();

    // Register the outbound queue before the router can address us
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    state.connections.register(connection_id.clone(), tx);
    state.router.connect(&connection_id);

    // Event processing loop
    loop {
        tokio::select! {
            biased;

            // Forward outbound events queued by the router
            Some(text) = rx.recv() => {
                if sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }

            // Receive from WebSocket
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let start = Instant::now();
                        metrics::record_event(text.len(), "inbound");

                        match codec::decode(&text) {
                            Ok(event) => state.router.handle(&connection_id, event),
                            Err(e) => {
                                // Best-effort model: undecodable frames are dropped,
                                // never answered with an error event.
                                debug!(connection = %connection_id, error = %e, "Dropping undecodable frame");
                                metrics::record_error("decode");
                            }
                        }

                        metrics::set_occupied_rooms(state.router.stats().occupied_rooms);
                        metrics::record_latency(start.elapsed().as_secs_f64());
                    }
                    Some(Ok(Message::Binary(_))) => {
                        debug!(connection = %connection_id, "Dropping unexpected binary frame");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        // Ignore pongs
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!(connection = %connection_id, "Received close frame");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(connection = %connection_id, error = %e, "WebSocket error");
                        metrics::record_error("websocket");
                        break;
                    }
                    None => {
                        debug!(connection = %connection_id, "WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    // Cleanup: force the leave path for whatever room this connection held
    state.connections.deregister(&connection_id);
    state.router.disconnect(&connection_id);
    metrics::set_occupied_rooms(state.router.stats().occupied_rooms);

    debug!(connection = %connection_id, "WebSocket disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomcast_protocol::{ClientEvent, JoinRoomRequest};

    #[test]
    fn test_connection_table_delivers_to_registered() {
        let table = ConnectionTable::new();
        let conn = ConnectionId::new("conn-1");
        let (tx, mut rx) = mpsc::unbounded_channel();
        table.register(conn.clone(), tx);

        table.deliver(&conn, &ServerEvent::Enter(serde_json::json!("Alice")));

        let frame = rx.try_recv().unwrap();
        assert!(frame.contains("\"enter\""));
    }

    #[test]
    fn test_connection_table_swallows_unknown_target() {
        let table = ConnectionTable::new();
        // No registration; delivery must be a silent no-op.
        table.deliver(
            &ConnectionId::new("ghost"),
            &ServerEvent::Enter(serde_json::json!("Alice")),
        );
    }

    #[test]
    fn test_app_state_routes_through_table() {
        let state = AppState::new(Config::default()).unwrap();
        let conn = ConnectionId::new("conn-1");
        let (tx, mut rx) = mpsc::unbounded_channel();
        state.connections.register(conn.clone(), tx);
        state.router.connect(&conn);

        state.router.handle(
            &conn,
            ClientEvent::JoinRoom(JoinRoomRequest {
                room_id: Some("team-alpha".to_string()),
                user_name: "Alice".to_string(),
            }),
        );

        let frame = rx.try_recv().unwrap();
        assert!(frame.contains("\"joinedRoom\""));
        assert!(frame.contains("\"memberCount\":1"));
    }

    #[test]
    fn test_app_state_rejects_bad_seed() {
        let mut config = Config::default();
        config.rooms = vec![roomcast_protocol::RoomInfo {
            id: "orphan".to_string(),
            name: "Orphan".to_string(),
            kind: roomcast_protocol::RoomKind::Team,
            icon: "👻".to_string(),
            parent: Some("missing".to_string()),
            children: Vec::new(),
            expanded: false,
        }];

        assert!(AppState::new(config).is_err());
    }
}
