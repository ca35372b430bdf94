//! Connection-Registry – Verwaltet alle verbundenen Clients
//!
//! Haelt pro Client den Transport, den Auth-Status, die optionale DID und
//! die Raum-Mitgliedschaften. Die Registry besitzt den Transport exklusiv;
//! Entfernen schliesst ihn.
//!
//! Senden ist der einzige Punkt an dem "Peer nicht erreichbar" anfaellt.
//! Der Aufrufer bekommt nur `false`, der Grund wird geloggt.

use ghostly_core::{ClientId, RoomId};
use ghostly_protocol::{jetzt_ms, server_kodieren, ServerNachricht};
use std::collections::{BTreeSet, HashMap};

use crate::lifecycle::ClientZustand;
use crate::transport::{Transport, TransportFehler};

// ---------------------------------------------------------------------------
// ClientEintrag
// ---------------------------------------------------------------------------

/// Zustand eines verbundenen Clients
pub struct ClientEintrag {
    transport: Box<dyn Transport>,
    pub authentifiziert: bool,
    pub did: Option<String>,
    pub raeume: BTreeSet<RoomId>,
    pub zustand: ClientZustand,
}

impl ClientEintrag {
    fn neu(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            authentifiziert: false,
            did: None,
            raeume: BTreeSet::new(),
            zustand: ClientZustand::Verbunden,
        }
    }
}

impl std::fmt::Debug for ClientEintrag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientEintrag")
            .field("authentifiziert", &self.authentifiziert)
            .field("did", &self.did)
            .field("raeume", &self.raeume)
            .field("zustand", &self.zustand)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ConnectionRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    clients: HashMap<ClientId, ClientEintrag>,
}

impl ConnectionRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert einen neuen Client und sendet ihm `welcome`
    pub fn registrieren(&mut self, transport: Box<dyn Transport>) -> ClientId {
        let mut client_id = ClientId::generieren();
        while self.clients.contains_key(&client_id) {
            client_id = ClientId::generieren();
        }

        self.clients
            .insert(client_id.clone(), ClientEintrag::neu(transport));
        self.senden(
            &client_id,
            &ServerNachricht::Welcome {
                client_id: client_id.clone(),
            },
        );
        client_id
    }

    /// Entfernt einen Client und schliesst seinen Transport
    ///
    /// Gibt die Raeume zurueck in denen er war. `None` wenn der Client
    /// bereits entfernt wurde (Disconnect-Rennen sind erwartet).
    pub fn entfernen(&mut self, client_id: &ClientId) -> Option<BTreeSet<RoomId>> {
        let mut eintrag = self.clients.remove(client_id)?;
        eintrag.transport.schliessen();
        eintrag.zustand.wechseln(ClientZustand::Entfernt);
        Some(eintrag.raeume)
    }

    /// Sendet eine Nachricht an einen Client
    ///
    /// `false` wenn der Client unbekannt ist oder sein Transport nichts
    /// mehr annimmt.
    pub fn senden(&self, client_id: &ClientId, nachricht: &ServerNachricht) -> bool {
        match kodieren(nachricht) {
            Some(text) => self.text_senden(client_id, text),
            None => false,
        }
    }

    /// Sendet dieselbe Nachricht an mehrere Clients, kodiert nur einmal
    pub fn an_mehrere_senden<'a>(
        &self,
        empfaenger: impl IntoIterator<Item = &'a ClientId>,
        nachricht: &ServerNachricht,
    ) -> usize {
        let Some(text) = kodieren(nachricht) else {
            return 0;
        };
        empfaenger
            .into_iter()
            .filter(|id| self.text_senden(id, text.clone()))
            .count()
    }

    /// Sendet an alle registrierten Clients ausser `ausser`
    ///
    /// Best-effort: ein fehlgeschlagener Client haelt die anderen nicht auf.
    pub fn an_alle_senden(&self, nachricht: &ServerNachricht, ausser: Option<&ClientId>) -> usize {
        let empfaenger = self
            .clients
            .keys()
            .filter(|id| Some(*id) != ausser);
        self.an_mehrere_senden(empfaenger, nachricht)
    }

    fn text_senden(&self, client_id: &ClientId, text: String) -> bool {
        let Some(eintrag) = self.clients.get(client_id) else {
            tracing::debug!(client_id = %client_id, "Senden an unbekannten Client");
            return false;
        };

        match eintrag.transport.senden(text) {
            Ok(()) => true,
            Err(TransportFehler::QueueVoll) => {
                tracing::warn!(client_id = %client_id, "Send-Queue voll – Nachricht verworfen");
                false
            }
            Err(TransportFehler::Geschlossen) => {
                tracing::debug!(client_id = %client_id, "Transport geschlossen – Nachricht verworfen");
                false
            }
        }
    }

    pub fn eintrag(&self, client_id: &ClientId) -> Option<&ClientEintrag> {
        self.clients.get(client_id)
    }

    pub fn eintrag_mut(&mut self, client_id: &ClientId) -> Option<&mut ClientEintrag> {
        self.clients.get_mut(client_id)
    }

    pub fn ist_registriert(&self, client_id: &ClientId) -> bool {
        self.clients.contains_key(client_id)
    }

    pub fn anzahl(&self) -> usize {
        self.clients.len()
    }

    pub fn authentifizierte_anzahl(&self) -> usize {
        self.clients.values().filter(|e| e.authentifiziert).count()
    }

    pub fn verifizierte_identitaeten(&self) -> usize {
        self.clients.values().filter(|e| e.did.is_some()).count()
    }

    pub fn client_ids(&self) -> Vec<ClientId> {
        self.clients.keys().cloned().collect()
    }
}

fn kodieren(nachricht: &ServerNachricht) -> Option<String> {
    match server_kodieren(nachricht, jetzt_ms()) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!(typ = nachricht.typ(), fehler = %e, "Kodieren fehlgeschlagen");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::QueueTransport;
    use tokio::sync::mpsc;

    fn client(registry: &mut ConnectionRegistry) -> (ClientId, mpsc::Receiver<String>) {
        let (transport, mut rx) = QueueTransport::neu(8);
        let id = registry.registrieren(Box::new(transport));
        let welcome = rx.try_recv().expect("welcome erwartet");
        assert!(welcome.contains(r#""type":"welcome""#));
        assert!(welcome.contains(id.as_str()));
        (id, rx)
    }

    #[test]
    fn registrieren_sendet_welcome() {
        let mut registry = ConnectionRegistry::neu();
        let (id, _rx) = client(&mut registry);
        let eintrag = registry.eintrag(&id).unwrap();
        assert!(!eintrag.authentifiziert);
        assert!(eintrag.raeume.is_empty());
        assert_eq!(eintrag.zustand, ClientZustand::Verbunden);
    }

    #[test]
    fn entfernen_ist_idempotent_und_schliesst() {
        let mut registry = ConnectionRegistry::neu();
        let (id, mut rx) = client(&mut registry);
        registry
            .eintrag_mut(&id)
            .unwrap()
            .raeume
            .insert(RoomId::neu("lobby").unwrap());

        let raeume = registry.entfernen(&id).unwrap();
        assert_eq!(raeume.len(), 1);
        assert!(registry.entfernen(&id).is_none());
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn senden_an_unbekannten_ist_false() {
        let registry = ConnectionRegistry::neu();
        assert!(!registry.senden(&ClientId::von_client("client_weg"), &ServerNachricht::Pong));
    }

    #[test]
    fn broadcast_mit_ausnahme() {
        let mut registry = ConnectionRegistry::neu();
        let (a, mut rx_a) = client(&mut registry);
        let (_b, mut rx_b) = client(&mut registry);
        let (_c, mut rx_c) = client(&mut registry);

        let gesendet = registry.an_alle_senden(&ServerNachricht::Pong, Some(&a));
        assert_eq!(gesendet, 2);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
        assert!(rx_c.try_recv().is_ok());
    }

    #[test]
    fn voller_client_blockiert_andere_nicht() {
        let mut registry = ConnectionRegistry::neu();
        let (voll_transport, _rx_voll) = QueueTransport::neu(1);
        registry.registrieren(Box::new(voll_transport)); // welcome fuellt die Queue
        let (_b, mut rx_b) = client(&mut registry);

        assert_eq!(registry.an_alle_senden(&ServerNachricht::Pong, None), 1);
        assert!(rx_b.try_recv().is_ok());
    }
}
