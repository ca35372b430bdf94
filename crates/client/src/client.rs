//! SignalingClient – WebSocket-Verbindung zum Relay
//!
//! Nach `verbinden` laufen zwei Tasks:
//! - Schreib-Task: leert die Ausgangs-Queue auf den Socket
//! - Lese-Task: dekodiert Frames, merkt sich `welcome`/`authenticated`
//!   und reicht alles andere ueber eine Queue an den Aufrufer weiter
//!
//! `welcome` wird intern verbraucht; `verbinden` kehrt erst zurueck, wenn
//! die Client-ID bekannt ist.

use futures_util::{SinkExt, StreamExt};
use ghostly_core::{ClientId, RoomId};
use ghostly_protocol::{
    client_kodieren, jetzt_ms, server_dekodieren, ClientNachricht, ServerNachricht, SignalArt,
};
use serde::Serialize;
use serde_json::value::RawValue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::{ClientFehler, ClientResult};

/// Maximale Wartezeit auf `welcome` nach dem Handshake
const WELCOME_TIMEOUT: Duration = Duration::from_secs(5);

/// Gemeinsamer Verbindungsstatus zwischen Client und Lese-Task
#[derive(Default)]
struct Status {
    verbunden: AtomicBool,
    authentifiziert: AtomicBool,
}

pub struct SignalingClient {
    client_id: ClientId,
    status: Arc<Status>,
    ausgang_tx: Option<mpsc::UnboundedSender<Message>>,
    eingang_rx: mpsc::UnboundedReceiver<ServerNachricht>,
}

impl SignalingClient {
    /// Verbindet sich mit `url` (z.B. `ws://127.0.0.1:8080/`) und wartet
    /// auf die Begruessung
    pub async fn verbinden(url: &str) -> ClientResult<Self> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| ClientFehler::Verbindung(e.to_string()))?;
        let (mut ws_write, mut ws_read) = ws_stream.split();

        let status = Arc::new(Status::default());
        status.verbunden.store(true, Ordering::SeqCst);

        let (ausgang_tx, mut ausgang_rx) = mpsc::unbounded_channel::<Message>();
        let (eingang_tx, eingang_rx) = mpsc::unbounded_channel::<ServerNachricht>();
        let (welcome_tx, welcome_rx) = oneshot::channel::<ClientId>();

        tokio::spawn(async move {
            while let Some(nachricht) = ausgang_rx.recv().await {
                let ist_close = matches!(nachricht, Message::Close(_));
                if ws_write.send(nachricht).await.is_err() || ist_close {
                    break;
                }
            }
        });

        let lese_status = Arc::clone(&status);
        tokio::spawn(async move {
            let mut welcome_tx = Some(welcome_tx);
            while let Some(frame) = ws_read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        let nachricht = match server_dekodieren(&text, usize::MAX) {
                            Ok(n) => n,
                            Err(e) => {
                                tracing::warn!(fehler = %e, "Ungueltige Nachricht vom Relay");
                                continue;
                            }
                        };
                        match nachricht {
                            ServerNachricht::Welcome { client_id } => {
                                tracing::debug!(client_id = %client_id, "Client-ID zugewiesen");
                                if let Some(tx) = welcome_tx.take() {
                                    let _ = tx.send(client_id);
                                }
                            }
                            andere => {
                                if let ServerNachricht::Authenticated { verified, .. } = &andere {
                                    lese_status
                                        .authentifiziert
                                        .store(*verified, Ordering::SeqCst);
                                }
                                if eingang_tx.send(andere).is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Ok(Message::Binary(daten)) => {
                        tracing::warn!(laenge = daten.len(), "Binaer-Frame vom Relay ignoriert");
                    }
                    Ok(Message::Close(_)) => {
                        tracing::debug!("Relay hat die Verbindung geschlossen");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::debug!(fehler = %e, "WebSocket-Lesefehler");
                        break;
                    }
                }
            }
            lese_status.verbunden.store(false, Ordering::SeqCst);
        });

        let client_id = match tokio::time::timeout(WELCOME_TIMEOUT, welcome_rx).await {
            Ok(Ok(id)) => id,
            Ok(Err(_)) => {
                return Err(ClientFehler::Verbindung(
                    "Verbindung vor welcome geschlossen".into(),
                ))
            }
            Err(_) => return Err(ClientFehler::Timeout),
        };

        Ok(Self {
            client_id,
            status,
            ausgang_tx: Some(ausgang_tx),
            eingang_rx,
        })
    }

    /// Vom Relay vergebene ID
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Ergebnis des letzten `authenticated`
    pub fn ist_authentifiziert(&self) -> bool {
        self.status.authentifiziert.load(Ordering::SeqCst)
    }

    pub fn ist_verbunden(&self) -> bool {
        self.ausgang_tx.is_some() && self.status.verbunden.load(Ordering::SeqCst)
    }

    // -----------------------------------------------------------------------
    // Senden
    // -----------------------------------------------------------------------

    fn senden(&self, nachricht: &ClientNachricht) -> ClientResult<()> {
        if !self.ist_verbunden() {
            return Err(ClientFehler::NichtVerbunden);
        }
        let tx = self.ausgang_tx.as_ref().ok_or(ClientFehler::NichtVerbunden)?;
        let text = client_kodieren(nachricht, jetzt_ms())?;
        tx.send(Message::Text(text))
            .map_err(|_| ClientFehler::NichtVerbunden)
    }

    pub fn authentifizieren(&self, token: Option<&str>, did: Option<&str>) -> ClientResult<()> {
        self.senden(&ClientNachricht::Authenticate {
            token: token.map(str::to_string),
            did: did.map(str::to_string),
        })
    }

    /// Tritt einem Raum bei; ungueltige IDs werden lokal abgelehnt
    pub fn raum_beitreten(&self, room_id: &str) -> ClientResult<()> {
        let room_id = RoomId::neu(room_id)?;
        self.senden(&ClientNachricht::JoinRoom { room_id })
    }

    pub fn raum_verlassen(&self, room_id: &str) -> ClientResult<()> {
        let room_id = RoomId::neu(room_id)?;
        self.senden(&ClientNachricht::LeaveRoom { room_id })
    }

    /// Sendet eine Signal-Nachricht mit bereits kodiertem Payload
    pub fn signal_senden(
        &self,
        art: SignalArt,
        ziel: &ClientId,
        payload: Box<RawValue>,
    ) -> ClientResult<()> {
        self.senden(&ClientNachricht::Signal {
            art,
            target_id: ziel.clone(),
            payload,
        })
    }

    pub fn offer_senden<T: Serialize + ?Sized>(&self, ziel: &ClientId, offer: &T) -> ClientResult<()> {
        self.signal_senden(SignalArt::Offer, ziel, roh_kodieren(offer)?)
    }

    pub fn answer_senden<T: Serialize + ?Sized>(
        &self,
        ziel: &ClientId,
        answer: &T,
    ) -> ClientResult<()> {
        self.signal_senden(SignalArt::Answer, ziel, roh_kodieren(answer)?)
    }

    pub fn ice_candidate_senden<T: Serialize + ?Sized>(
        &self,
        ziel: &ClientId,
        candidate: &T,
    ) -> ClientResult<()> {
        self.signal_senden(SignalArt::IceCandidate, ziel, roh_kodieren(candidate)?)
    }

    pub fn ping(&self) -> ClientResult<()> {
        self.senden(&ClientNachricht::Ping)
    }

    // -----------------------------------------------------------------------
    // Empfangen
    // -----------------------------------------------------------------------

    /// Naechste Nachricht vom Relay, `None` wenn die Verbindung zu ist
    pub async fn naechste_nachricht(&mut self) -> Option<ServerNachricht> {
        self.eingang_rx.recv().await
    }

    pub async fn naechste_nachricht_timeout(
        &mut self,
        dauer: Duration,
    ) -> ClientResult<ServerNachricht> {
        match tokio::time::timeout(dauer, self.eingang_rx.recv()).await {
            Ok(Some(nachricht)) => Ok(nachricht),
            Ok(None) => Err(ClientFehler::NichtVerbunden),
            Err(_) => Err(ClientFehler::Timeout),
        }
    }

    /// Schliesst die Verbindung; weitere Sendeversuche schlagen fehl
    pub fn trennen(&mut self) {
        if let Some(tx) = self.ausgang_tx.take() {
            let _ = tx.send(Message::Close(None));
            tracing::debug!(client_id = %self.client_id, "Verbindung getrennt");
        }
        self.status.verbunden.store(false, Ordering::SeqCst);
    }
}

impl Drop for SignalingClient {
    fn drop(&mut self) {
        self.trennen();
    }
}

fn roh_kodieren<T: Serialize + ?Sized>(wert: &T) -> ClientResult<Box<RawValue>> {
    serde_json::value::to_raw_value(wert).map_err(|e| ClientFehler::Serialisierung(e.to_string()))
}
