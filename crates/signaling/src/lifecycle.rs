//! Lifecycle-Manager – Aufraeumen beim Verbindungsende
//!
//! ## State Machine
//! ```text
//! Verbunden <-> Authentifiziert
//!     |               |
//!     +---> Trennend <+
//!              |
//!              v
//!           Entfernt
//! ```
//!
//! `client_trennen` laeuft komplett unter dem Relay-Mutex. Der zweite Aufruf
//! fuer denselben Client findet keinen Eintrag mehr und tut nichts.

use ghostly_core::{ClientId, RoomId};
use ghostly_protocol::ServerNachricht;

use crate::events::RelayEvent;
use crate::server_state::{RelayKontext, RelayState};

/// Zustand eines Clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientZustand {
    /// Verbunden, noch nicht (oder nicht mehr) authentifiziert
    Verbunden,
    /// Token erfolgreich verifiziert
    Authentifiziert,
    /// Aufraeumen laeuft
    Trennend,
    /// Aus allen Registries entfernt
    Entfernt,
}

impl ClientZustand {
    /// Prueft ob der Uebergang erlaubt ist
    pub fn uebergang_erlaubt(self, nach: ClientZustand) -> bool {
        use ClientZustand::*;
        matches!(
            (self, nach),
            (Verbunden, Authentifiziert)
                | (Authentifiziert, Verbunden)
                | (Authentifiziert, Authentifiziert)
                | (Verbunden | Authentifiziert, Trennend)
                | (Trennend, Entfernt)
        )
    }

    /// Wechselt den Zustand; unerlaubte Uebergaenge werden ignoriert
    pub fn wechseln(&mut self, nach: ClientZustand) -> bool {
        if self.uebergang_erlaubt(nach) {
            *self = nach;
            true
        } else {
            tracing::debug!(von = ?self, nach = ?nach, "Zustandswechsel ignoriert");
            false
        }
    }
}

/// Trennt einen Client: Raeume verlassen, Peers benachrichtigen, entfernen
///
/// Gibt die Raeume zurueck in denen der Client war, oder `None` wenn er
/// bereits entfernt wurde. Sendungen sind best-effort; auch ein halb
/// kaputter Transport haelt das Aufraeumen nicht auf.
pub fn client_trennen(
    state: &mut RelayState,
    kontext: &RelayKontext,
    client_id: &ClientId,
) -> Option<Vec<RoomId>> {
    let eintrag = state.clients.eintrag_mut(client_id)?;
    eintrag.zustand.wechseln(ClientZustand::Trennend);

    let austritte = state.rooms.alle_verlassen(client_id);
    let mut raeume = Vec::with_capacity(austritte.len());

    for austritt in austritte {
        let peer_left = ServerNachricht::PeerLeft {
            client_id: client_id.clone(),
            room_id: austritt.room_id.clone(),
        };
        let benachrichtigt = state.clients.an_mehrere_senden(&austritt.verbleibend, &peer_left);
        tracing::debug!(
            client_id = %client_id,
            room_id = %austritt.room_id,
            benachrichtigt,
            "Raum beim Trennen verlassen"
        );

        if austritt.raum_geloescht {
            kontext.ereignis(RelayEvent::RaumGeloescht {
                room_id: austritt.room_id.clone(),
            });
        }
        raeume.push(austritt.room_id);
    }

    state.clients.entfernen(client_id);
    kontext.bestand(state);

    tracing::info!(client_id = %client_id, raeume = raeume.len(), "Client getrennt");
    kontext.ereignis(RelayEvent::ClientGetrennt {
        client_id: client_id.clone(),
        raeume: raeume.clone(),
    });

    Some(raeume)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erlaubte_uebergaenge() {
        use ClientZustand::*;
        assert!(Verbunden.uebergang_erlaubt(Authentifiziert));
        assert!(Authentifiziert.uebergang_erlaubt(Verbunden));
        assert!(Verbunden.uebergang_erlaubt(Trennend));
        assert!(Authentifiziert.uebergang_erlaubt(Trennend));
        assert!(Trennend.uebergang_erlaubt(Entfernt));
    }

    #[test]
    fn kein_weg_zurueck_nach_trennung() {
        use ClientZustand::*;
        let mut z = Trennend;
        assert!(!z.wechseln(Verbunden));
        assert!(!z.wechseln(Authentifiziert));
        assert!(z.wechseln(Entfernt));
        assert!(!z.wechseln(Trennend));
        assert_eq!(z, Entfernt);
    }

    #[test]
    fn entfernen_nur_ueber_trennend() {
        let mut z = ClientZustand::Verbunden;
        assert!(!z.wechseln(ClientZustand::Entfernt));
        assert_eq!(z, ClientZustand::Verbunden);
    }
}
