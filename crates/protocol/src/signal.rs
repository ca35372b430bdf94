//! Signaling-Nachrichten (WebSocket, JSON)
//!
//! Definiert alle Nachrichten die zwischen Client und Relay ausgetauscht
//! werden. Die Serialisierung erfolgt ueber den flachen `Umschlag` in
//! `wire.rs`; hier liegen nur die typisierten Varianten.
//!
//! ## Design
//! - Offer/Answer/ICE-Candidate teilen sich eine Variante mit `SignalArt`
//! - Payloads bleiben rohes JSON (`RawValue`) und werden nie interpretiert
//! - Die Absender-ID setzt immer das Relay, nie der Client

use ghostly_core::{ClientId, RoomId};
use serde_json::value::RawValue;

// ---------------------------------------------------------------------------
// Nachrichtentypen
// ---------------------------------------------------------------------------

pub const TYP_WELCOME: &str = "welcome";
pub const TYP_AUTHENTICATE: &str = "authenticate";
pub const TYP_AUTHENTICATED: &str = "authenticated";
pub const TYP_JOIN_ROOM: &str = "join-room";
pub const TYP_LEAVE_ROOM: &str = "leave-room";
pub const TYP_ROOM_JOINED: &str = "room-joined";
pub const TYP_PEER_JOINED: &str = "peer-joined";
pub const TYP_PEER_LEFT: &str = "peer-left";
pub const TYP_OFFER: &str = "offer";
pub const TYP_ANSWER: &str = "answer";
pub const TYP_ICE_CANDIDATE: &str = "ice-candidate";
pub const TYP_PING: &str = "ping";
pub const TYP_PONG: &str = "pong";
pub const TYP_ERROR: &str = "error";

/// Diagnose-Grund fuer ein unbekanntes Weiterleitungsziel
pub const GRUND_ZIEL_NICHT_GEFUNDEN: &str = "target-not-found";

/// Art einer weitergeleiteten WebRTC-Nachricht
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalArt {
    Offer,
    Answer,
    IceCandidate,
}

impl SignalArt {
    /// Wire-Name des Nachrichtentyps
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offer => TYP_OFFER,
            Self::Answer => TYP_ANSWER,
            Self::IceCandidate => TYP_ICE_CANDIDATE,
        }
    }

    /// Ordnet einen Wire-Namen einer Signal-Art zu
    pub fn aus_typ(typ: &str) -> Option<Self> {
        match typ {
            TYP_OFFER => Some(Self::Offer),
            TYP_ANSWER => Some(Self::Answer),
            TYP_ICE_CANDIDATE => Some(Self::IceCandidate),
            _ => None,
        }
    }
}

impl std::fmt::Display for SignalArt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Client -> Relay
// ---------------------------------------------------------------------------

/// Nachricht vom Client an das Relay
#[derive(Debug, Clone)]
pub enum ClientNachricht {
    /// Authentifizierung mit Bearer-Token und optionaler DID
    Authenticate {
        token: Option<String>,
        did: Option<String>,
    },
    /// Raum beitreten (wird bei Bedarf angelegt)
    JoinRoom { room_id: RoomId },
    /// Raum verlassen
    LeaveRoom { room_id: RoomId },
    /// Offer/Answer/ICE-Candidate an einen anderen Client
    Signal {
        art: SignalArt,
        target_id: ClientId,
        payload: Box<RawValue>,
    },
    /// Liveness-Pruefung
    Ping,
}

impl ClientNachricht {
    /// Wire-Name des Nachrichtentyps
    pub fn typ(&self) -> &'static str {
        match self {
            Self::Authenticate { .. } => TYP_AUTHENTICATE,
            Self::JoinRoom { .. } => TYP_JOIN_ROOM,
            Self::LeaveRoom { .. } => TYP_LEAVE_ROOM,
            Self::Signal { art, .. } => art.as_str(),
            Self::Ping => TYP_PING,
        }
    }
}

// ---------------------------------------------------------------------------
// Relay -> Client
// ---------------------------------------------------------------------------

/// Nachricht vom Relay an einen Client
#[derive(Debug, Clone)]
pub enum ServerNachricht {
    /// Begruessung mit der zugewiesenen Client-ID
    Welcome { client_id: ClientId },
    /// Ergebnis einer Authentifizierung
    Authenticated { client_id: ClientId, verified: bool },
    /// Beitritt bestaetigt, enthaelt die bereits anwesenden Peers
    RoomJoined {
        room_id: RoomId,
        peers: Vec<ClientId>,
    },
    /// Ein Peer ist dem Raum beigetreten
    PeerJoined { client_id: ClientId, room_id: RoomId },
    /// Ein Peer hat den Raum verlassen oder die Verbindung verloren
    PeerLeft { client_id: ClientId, room_id: RoomId },
    /// Weitergeleitete WebRTC-Nachricht
    Signal {
        art: SignalArt,
        sender_id: ClientId,
        payload: Box<RawValue>,
    },
    /// Antwort auf `ping`
    Pong,
    /// Lokale Diagnose, wird nie an Dritte weitergeleitet
    Error {
        reason: String,
        target_id: Option<ClientId>,
    },
}

impl ServerNachricht {
    /// Wire-Name des Nachrichtentyps
    pub fn typ(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => TYP_WELCOME,
            Self::Authenticated { .. } => TYP_AUTHENTICATED,
            Self::RoomJoined { .. } => TYP_ROOM_JOINED,
            Self::PeerJoined { .. } => TYP_PEER_JOINED,
            Self::PeerLeft { .. } => TYP_PEER_LEFT,
            Self::Signal { art, .. } => art.as_str(),
            Self::Pong => TYP_PONG,
            Self::Error { .. } => TYP_ERROR,
        }
    }

    /// Erstellt die Diagnose fuer ein nicht erreichbares Ziel
    pub fn ziel_nicht_gefunden(target_id: ClientId) -> Self {
        Self::Error {
            reason: GRUND_ZIEL_NICHT_GEFUNDEN.to_string(),
            target_id: Some(target_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_art_namen() {
        for art in [SignalArt::Offer, SignalArt::Answer, SignalArt::IceCandidate] {
            assert_eq!(SignalArt::aus_typ(art.as_str()), Some(art));
        }
        assert_eq!(SignalArt::aus_typ("join-room"), None);
    }

    #[test]
    fn typ_namen_der_server_nachrichten() {
        let id = ClientId::von_client("client_a");
        assert_eq!(ServerNachricht::Pong.typ(), "pong");
        assert_eq!(
            ServerNachricht::Welcome { client_id: id.clone() }.typ(),
            "welcome"
        );
        assert_eq!(ServerNachricht::ziel_nicht_gefunden(id).typ(), "error");
    }
}
