//! Relay – Fassade ueber Registries, Dispatcher und Lifecycle
//!
//! Der gesamte veraenderliche Zustand liegt hinter einem einzigen
//! `parking_lot::Mutex`. Kein `.await` haelt den Lock; die einzige
//! Wartestelle (Token-Verifikation) liegt zwischen zwei kurzen
//! kritischen Abschnitten.

use ghostly_auth::TokenVerifier;
use ghostly_core::ClientId;
use ghostly_observability::metrics::grund;
use ghostly_observability::RelayMetrics;
use ghostly_protocol::{client_dekodieren, ProtokollFehler};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::dispatcher::{self, DispatchErgebnis};
use crate::events::RelayEvent;
use crate::handlers::auth_handler;
use crate::lifecycle::{self, ClientZustand};
use crate::server_state::{RelayConfig, RelayKontext, RelayState};
use crate::stats::RelayStats;
use crate::transport::Transport;

pub struct Relay {
    state: Mutex<RelayState>,
    kontext: RelayKontext,
    verifier: Arc<dyn TokenVerifier>,
}

impl Relay {
    pub fn neu(
        config: RelayConfig,
        verifier: Arc<dyn TokenVerifier>,
        metriken: Option<RelayMetrics>,
    ) -> Self {
        tracing::debug!(
            verifier = verifier.name(),
            auth_erforderlich = config.auth_erforderlich,
            "Relay erstellt"
        );
        Self {
            state: Mutex::new(RelayState::default()),
            kontext: RelayKontext::neu(config, metriken),
            verifier,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.kontext.config
    }

    /// Registriert einen neuen Transport; der Client bekommt `welcome`
    pub fn verbinden(&self, transport: Box<dyn Transport>) -> ClientId {
        let client_id = {
            let mut state = self.state.lock();
            let id = state.clients.registrieren(transport);
            self.kontext.bestand(&state);
            id
        };

        tracing::info!(client_id = %client_id, "Client verbunden");
        self.kontext.ereignis(RelayEvent::ClientVerbunden {
            client_id: client_id.clone(),
        });
        client_id
    }

    /// Verarbeitet einen eingehenden Text-Frame
    ///
    /// Ungueltige Nachrichten werden geloggt und verworfen; die Verbindung
    /// bleibt bestehen.
    pub async fn nachricht_verarbeiten(&self, client_id: &ClientId, text: &str) {
        let nachricht = match client_dekodieren(text, self.kontext.config.max_nachricht_bytes) {
            Ok(n) => n,
            Err(ProtokollFehler::UnbekannterTyp(typ)) => {
                tracing::warn!(client_id = %client_id, typ = %typ, "Unbekannter Nachrichtentyp");
                self.kontext.verworfen(grund::UNBEKANNTER_TYP);
                return;
            }
            Err(e) => {
                tracing::warn!(client_id = %client_id, fehler = %e, "Ungueltige Nachricht verworfen");
                self.kontext.verworfen(grund::UNGUELTIG);
                return;
            }
        };

        let ergebnis = {
            let mut state = self.state.lock();
            dispatcher::dispatch(&mut state, &self.kontext, client_id, nachricht)
        };

        if let DispatchErgebnis::Authentifizieren { token, did } = ergebnis {
            self.authentifizieren(client_id, token, did).await;
        }
    }

    async fn authentifizieren(
        &self,
        client_id: &ClientId,
        token: Option<String>,
        did: Option<String>,
    ) {
        let verifiziert = auth_handler::token_pruefen(
            self.verifier.as_ref(),
            token.as_deref(),
            self.kontext.config.verifizierungs_timeout,
        )
        .await;

        let mut state = self.state.lock();
        auth_handler::ergebnis_anwenden(&mut state, &self.kontext, client_id, verifiziert, did);
    }

    /// Binaere Frames gehoeren nicht zum Protokoll
    pub fn binaer_verworfen(&self, client_id: &ClientId, laenge: usize) {
        tracing::warn!(client_id = %client_id, laenge, "Binaerer Frame verworfen");
        self.kontext.verworfen(grund::BINAER);
    }

    /// Trennt einen Client; `false` wenn er bereits entfernt war
    pub fn trennen(&self, client_id: &ClientId) -> bool {
        let mut state = self.state.lock();
        lifecycle::client_trennen(&mut state, &self.kontext, client_id).is_some()
    }

    /// Schliesst alle Transports und leert beide Registries (Shutdown)
    ///
    /// Peers werden nicht einzeln mit `peer-left` benachrichtigt, da alle
    /// Verbindungen gleichzeitig enden.
    pub fn alle_schliessen(&self) -> usize {
        let mut state = self.state.lock();
        let ids = state.clients.client_ids();

        for client_id in &ids {
            if let Some(eintrag) = state.clients.eintrag_mut(client_id) {
                eintrag.zustand.wechseln(ClientZustand::Trennend);
            }
            let raeume = state.clients.entfernen(client_id).unwrap_or_default();
            self.kontext.ereignis(RelayEvent::ClientGetrennt {
                client_id: client_id.clone(),
                raeume: raeume.into_iter().collect(),
            });
        }
        for room_id in state.rooms.leeren() {
            self.kontext.ereignis(RelayEvent::RaumGeloescht { room_id });
        }
        self.kontext.bestand(&state);

        tracing::info!(clients = ids.len(), "Alle Verbindungen geschlossen");
        ids.len()
    }

    pub fn statistik(&self) -> RelayStats {
        RelayStats::erfassen(&self.state.lock())
    }

    pub fn client_anzahl(&self) -> usize {
        self.state.lock().clients.anzahl()
    }

    pub fn ereignisse_abonnieren(&self) -> broadcast::Receiver<RelayEvent> {
        self.kontext.abonnieren()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
