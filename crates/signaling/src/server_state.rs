//! Gemeinsamer Relay-Zustand
//!
//! `RelayState` enthaelt die beiden Registries und liegt hinter genau einem
//! Mutex im `Relay`. `RelayKontext` buendelt alles Unveraenderliche, was
//! Handler zusaetzlich brauchen: Konfiguration, Event-Kanal, Metriken.

use ghostly_observability::RelayMetrics;
use ghostly_protocol::DEFAULT_MAX_NACHRICHT_BYTES;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::events::RelayEvent;
use crate::registry::ConnectionRegistry;
use crate::rooms::RoomRegistry;
use crate::transport::DEFAULT_SENDE_QUEUE;

/// Groesse des Broadcast-Kanals fuer Relay-Events
const EVENT_KANAL_GROESSE: usize = 256;

/// Konfiguration fuer das Relay
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Kapazitaet der Sende-Queue pro Client
    pub sende_queue: usize,
    /// Groessere Text-Frames werden vor dem Parsen verworfen
    pub max_nachricht_bytes: usize,
    /// Unbekanntes Ziel mit lokalem `error` an den Absender quittieren
    pub ziel_diagnose: bool,
    /// Nur `authenticate` und `ping` vor erfolgreicher Authentifizierung
    pub auth_erforderlich: bool,
    /// Obergrenze fuer einen Verifier-Aufruf
    pub verifizierungs_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            sende_queue: DEFAULT_SENDE_QUEUE,
            max_nachricht_bytes: DEFAULT_MAX_NACHRICHT_BYTES,
            ziel_diagnose: false,
            auth_erforderlich: false,
            verifizierungs_timeout: Duration::from_secs(5),
        }
    }
}

/// Veraenderlicher Zustand: Clients und Raeume
#[derive(Debug, Default)]
pub struct RelayState {
    pub clients: ConnectionRegistry,
    pub rooms: RoomRegistry,
}

/// Unveraenderlicher Kontext fuer Handler
pub struct RelayKontext {
    pub config: RelayConfig,
    ereignisse: broadcast::Sender<RelayEvent>,
    metriken: Option<RelayMetrics>,
}

impl RelayKontext {
    pub fn neu(config: RelayConfig, metriken: Option<RelayMetrics>) -> Self {
        let (ereignisse, _) = broadcast::channel(EVENT_KANAL_GROESSE);
        Self {
            config,
            ereignisse,
            metriken,
        }
    }

    /// Versendet ein Event; ohne Abonnenten passiert nichts
    pub fn ereignis(&self, event: RelayEvent) {
        let _ = self.ereignisse.send(event);
    }

    pub fn abonnieren(&self) -> broadcast::Receiver<RelayEvent> {
        self.ereignisse.subscribe()
    }

    pub fn weitergeleitet(&self, typ: &str) {
        if let Some(m) = &self.metriken {
            m.weitergeleitet(typ);
        }
    }

    pub fn verworfen(&self, grund: &str) {
        if let Some(m) = &self.metriken {
            m.verworfen(grund);
        }
    }

    pub fn authentifizierung(&self, verifiziert: bool) {
        if let Some(m) = &self.metriken {
            m.authentifizierung(verifiziert);
        }
    }

    pub fn bestand(&self, state: &RelayState) {
        if let Some(m) = &self.metriken {
            m.bestand_setzen(state.clients.anzahl(), state.rooms.anzahl());
        }
    }
}
