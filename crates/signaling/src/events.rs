//! Relay-Events fuer lokale Beobachter (Logging, Tests, Admin-Tools)

use ghostly_core::{ClientId, RoomId};

/// Events die das Relay versendet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// Transport verbunden, `welcome` gesendet
    ClientVerbunden { client_id: ClientId },
    /// Ergebnis einer Authentifizierung
    ClientAuthentifiziert { client_id: ClientId, verified: bool },
    /// Client vollstaendig entfernt
    ClientGetrennt {
        client_id: ClientId,
        raeume: Vec<RoomId>,
    },
    /// Raum beim ersten Beitritt angelegt
    RaumErstellt { room_id: RoomId },
    /// Letztes Mitglied hat den Raum verlassen
    RaumGeloescht { room_id: RoomId },
}
