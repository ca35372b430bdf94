//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede Verbindung bekommt einen eigenen tokio-Task. Eingehende Frames
//! werden strikt nacheinander verarbeitet, was die Reihenfolge pro
//! Absender garantiert. Ausgehende Frames kommen aus der `QueueTransport`-
//! Queue und werden von einem Schreib-Task auf den Socket gelegt.
//!
//! Das Aufraeumen erledigt ein Drop-Guard, damit es auch bei Abbruch des
//! Tasks (Panic, Runtime-Shutdown) genau einmal passiert.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use ghostly_core::ClientId;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::relay::Relay;
use crate::transport::QueueTransport;

/// Wartezeit fuer den Schreib-Task nach dem Trennen
const SCHREIB_NACHLAUF: Duration = Duration::from_secs(2);

/// Trennt den Client beim Drop
struct TrennGuard {
    relay: Arc<Relay>,
    client_id: ClientId,
}

impl Drop for TrennGuard {
    fn drop(&mut self) {
        self.relay.trennen(&self.client_id);
    }
}

/// Verarbeitet eine WebSocket-Verbindung bis zum Ende
pub async fn verbindung_verarbeiten(
    relay: Arc<Relay>,
    socket: WebSocket,
    peer_addr: SocketAddr,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let (transport, mut ausgang_rx) = QueueTransport::neu(relay.config().sende_queue);
    let client_id = relay.verbinden(Box::new(transport));
    let guard = TrennGuard {
        relay: Arc::clone(&relay),
        client_id: client_id.clone(),
    };

    tracing::debug!(peer = %peer_addr, client_id = %client_id, "WebSocket verbunden");

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Queue -> Socket. Endet wenn die Registry den Transport schliesst.
    let schreiber = tokio::spawn(async move {
        while let Some(text) = ausgang_rx.recv().await {
            if ws_tx.send(Message::Text(text)).await.is_err() {
                return;
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    loop {
        tokio::select! {
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        relay.nachricht_verarbeiten(&client_id, &text).await;
                    }
                    Some(Ok(Message::Binary(daten))) => {
                        relay.binaer_verworfen(&client_id, daten.len());
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(client_id = %client_id, "Verbindung vom Client geschlossen");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(client_id = %client_id, fehler = %e, "WebSocket-Lesefehler");
                        break;
                    }
                }
            }

            Ok(()) = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    tracing::debug!(client_id = %client_id, "Shutdown-Signal – Verbindung wird getrennt");
                    break;
                }
            }
        }
    }

    // Trennen schliesst den Transport, der Schreib-Task leert die Queue und endet
    drop(guard);
    if tokio::time::timeout(SCHREIB_NACHLAUF, schreiber).await.is_err() {
        tracing::debug!(client_id = %client_id, "Schreib-Task nicht rechtzeitig beendet");
    }

    tracing::debug!(peer = %peer_addr, client_id = %client_id, "Verbindungs-Task beendet");
}
