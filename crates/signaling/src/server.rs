//! WebSocket-Server – Bindet Socket, nimmt Upgrades an
//!
//! Der `SignalingServer` stellt zwei Routen bereit:
//! - `ws_pfad` (Standard `/`) – WebSocket-Upgrade fuer Clients
//! - `GET /stats` – Relay-Statistik als JSON
//!
//! ## Shutdown
//! Auf `true` im Shutdown-Kanal werden keine Upgrades mehr angenommen,
//! alle Transports geschlossen und beide Registries geleert.

use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use ghostly_observability::request_timing_layer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{watch, Semaphore};

use crate::connection::verbindung_verarbeiten;
use crate::error::SignalingResult;
use crate::relay::Relay;
use crate::stats::RelayStats;

/// Standard-Pfad fuer WebSocket-Upgrades
pub const DEFAULT_WS_PFAD: &str = "/";

/// Standard-Obergrenze gleichzeitiger Clients
pub const DEFAULT_MAX_CLIENTS: usize = 512;

#[derive(Clone)]
struct AppState {
    relay: Arc<Relay>,
    max_clients: usize,
    /// Ein Permit pro Verbindung, reserviert vor dem Upgrade
    plaetze: Arc<Semaphore>,
    shutdown_rx: watch::Receiver<bool>,
}

/// WebSocket-Signaling-Server
pub struct SignalingServer {
    relay: Arc<Relay>,
    ws_pfad: String,
    max_clients: usize,
}

impl SignalingServer {
    pub fn neu(relay: Arc<Relay>) -> Self {
        Self {
            relay,
            ws_pfad: DEFAULT_WS_PFAD.to_string(),
            max_clients: DEFAULT_MAX_CLIENTS,
        }
    }

    pub fn mit_ws_pfad(mut self, pfad: impl Into<String>) -> Self {
        self.ws_pfad = pfad.into();
        self
    }

    pub fn mit_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients;
        self
    }

    /// Axum-Router mit WebSocket-Route und `/stats`
    pub fn router(&self, shutdown_rx: watch::Receiver<bool>) -> Router {
        let state = AppState {
            relay: Arc::clone(&self.relay),
            max_clients: self.max_clients,
            plaetze: Arc::new(Semaphore::new(self.max_clients)),
            shutdown_rx,
        };

        Router::new()
            .route(&self.ws_pfad, get(ws_handler))
            .with_state(state)
            .merge(stats_router(Arc::clone(&self.relay)))
            .layer(request_timing_layer())
    }

    /// Bindet `bind_addr` und laeuft bis zum Shutdown-Signal
    pub async fn starten(
        self,
        bind_addr: SocketAddr,
        shutdown_rx: watch::Receiver<bool>,
    ) -> SignalingResult<()> {
        let listener = TcpListener::bind(bind_addr).await?;
        self.mit_listener(listener, shutdown_rx).await
    }

    /// Laeuft auf einem bereits gebundenen Listener (z.B. Port 0 in Tests)
    pub async fn mit_listener(
        self,
        listener: TcpListener,
        shutdown_rx: watch::Receiver<bool>,
    ) -> SignalingResult<()> {
        let lokale_addr = listener.local_addr()?;
        let app = self.router(shutdown_rx.clone());

        tracing::info!(
            adresse = %lokale_addr,
            ws_pfad = %self.ws_pfad,
            max_clients = self.max_clients,
            "WebSocket Signaling-Server gestartet"
        );

        let relay = Arc::clone(&self.relay);
        let mut signal_rx = shutdown_rx;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            while signal_rx.changed().await.is_ok() {
                if *signal_rx.borrow() {
                    break;
                }
            }
            tracing::info!("Signaling-Server: Shutdown-Signal empfangen");
            relay.alle_schliessen();
        })
        .await?;

        tracing::info!("WebSocket Signaling-Server gestoppt");
        Ok(())
    }
}

/// Router nur fuer `GET /stats` (auch fuer den Observability-Server)
pub fn stats_router(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/stats", get(stats_handler))
        .with_state(relay)
}

async fn stats_handler(State(relay): State<Arc<Relay>>) -> Json<RelayStats> {
    Json(relay.statistik())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app): State<AppState>,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
) -> Response {
    if *app.shutdown_rx.borrow() {
        return (StatusCode::SERVICE_UNAVAILABLE, "Server wird heruntergefahren").into_response();
    }

    // Der Platz wird vor dem Upgrade reserviert und erst mit dem Ende des
    // Verbindungs-Tasks freigegeben
    let Ok(platz) = Arc::clone(&app.plaetze).try_acquire_owned() else {
        tracing::warn!(
            peer = %peer_addr,
            max = app.max_clients,
            "Server voll – Upgrade abgelehnt"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Server voll").into_response();
    };

    let relay = app.relay;
    let shutdown_rx = app.shutdown_rx;
    ws.on_upgrade(move |socket| async move {
        verbindung_verarbeiten(relay, socket, peer_addr, shutdown_rx).await;
        drop(platz);
    })
}
