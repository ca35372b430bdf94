//! Wire-Format fuer WebSocket-Verbindungen
//!
//! Jede Nachricht ist ein JSON-Objekt in einem Text-Frame:
//!
//! ```text
//! { "type": "offer", "timestamp": 1700000000000, "targetId": "...", "payload": {...} }
//! ```
//!
//! Beide Richtungen verwenden denselben flachen `Umschlag`. Typspezifische
//! Felder sind optional und werden erst beim Umwandeln in `ClientNachricht`
//! bzw. `ServerNachricht` geprueft. Payloads bleiben `RawValue` und werden
//! byte-genau durchgereicht.

use ghostly_core::{ClientId, RoomId};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{ProtokollFehler, ProtokollResult};
use crate::signal::*;

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Standard-maximale Nachrichtengroesse (1 MB)
pub const DEFAULT_MAX_NACHRICHT_BYTES: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// Umschlag
// ---------------------------------------------------------------------------

/// Flacher JSON-Umschlag fuer alle Nachrichtentypen
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Umschlag {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    /// Beliebige JSON-Zahl; eingehend wird der Wert nicht ausgewertet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(default, alias = "covenantToken", skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
    #[serde(default, alias = "clients", skip_serializing_if = "Option::is_none")]
    pub peers: Option<Vec<ClientId>>,
    #[serde(default, alias = "covenantVerified", skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(
        default,
        alias = "offer",
        alias = "answer",
        alias = "candidate",
        skip_serializing_if = "Option::is_none"
    )]
    pub payload: Option<Box<RawValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Umschlag {
    fn mit_typ(typ: &str, timestamp: i64) -> Self {
        Self {
            typ: Some(typ.to_string()),
            timestamp: Some(timestamp.into()),
            ..Default::default()
        }
    }

    fn parsen(text: &str, max_bytes: usize) -> ProtokollResult<Self> {
        if text.len() > max_bytes {
            return Err(ProtokollFehler::ZuGross {
                groesse: text.len(),
                maximum: max_bytes,
            });
        }
        serde_json::from_str(text).map_err(|e| ProtokollFehler::UngueltigesJson(e.to_string()))
    }

    fn typ_nehmen(&mut self) -> ProtokollResult<String> {
        self.typ.take().ok_or(ProtokollFehler::TypFehlt)
    }

    fn raum(&mut self, typ: &str) -> ProtokollResult<RoomId> {
        let roh = self
            .room_id
            .take()
            .ok_or_else(|| ProtokollFehler::feld_fehlt(typ, "roomId"))?;
        RoomId::neu(roh).map_err(|e| ProtokollFehler::UngueltigesFeld {
            feld: "roomId",
            grund: e.to_string(),
        })
    }

    fn payload_oder_null(&mut self) -> Box<RawValue> {
        self.payload.take().unwrap_or_else(null_payload)
    }

    fn zu_text(&self) -> ProtokollResult<String> {
        serde_json::to_string(self).map_err(|e| ProtokollFehler::Serialisierung(e.to_string()))
    }
}

fn null_payload() -> Box<RawValue> {
    RawValue::NULL.to_owned()
}

/// Aktueller Zeitstempel in Millisekunden seit Unix-Epoche
pub fn jetzt_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ---------------------------------------------------------------------------
// Client -> Relay
// ---------------------------------------------------------------------------

/// Dekodiert eine Client-Nachricht aus einem Text-Frame
///
/// # Fehler
/// - `ZuGross` wenn der Frame `max_bytes` ueberschreitet
/// - `UngueltigesJson` / `TypFehlt` bei kaputtem Umschlag
/// - `UnbekannterTyp` fuer nicht unterstuetzte Typen
/// - `FeldFehlt` / `UngueltigesFeld` bei fehlenden Pflichtfeldern
pub fn client_dekodieren(text: &str, max_bytes: usize) -> ProtokollResult<ClientNachricht> {
    let mut u = Umschlag::parsen(text, max_bytes)?;
    let typ = u.typ_nehmen()?;

    if let Some(art) = SignalArt::aus_typ(&typ) {
        let target_id = u
            .target_id
            .take()
            .ok_or_else(|| ProtokollFehler::feld_fehlt(&typ, "targetId"))?;
        return Ok(ClientNachricht::Signal {
            art,
            target_id,
            payload: u.payload_oder_null(),
        });
    }

    match typ.as_str() {
        TYP_AUTHENTICATE => Ok(ClientNachricht::Authenticate {
            token: u.token.take(),
            did: u.did.take(),
        }),
        TYP_JOIN_ROOM => Ok(ClientNachricht::JoinRoom {
            room_id: u.raum(&typ)?,
        }),
        TYP_LEAVE_ROOM => Ok(ClientNachricht::LeaveRoom {
            room_id: u.raum(&typ)?,
        }),
        TYP_PING => Ok(ClientNachricht::Ping),
        _ => Err(ProtokollFehler::UnbekannterTyp(typ)),
    }
}

/// Kodiert eine Client-Nachricht (fuer den Begleit-Client)
pub fn client_kodieren(nachricht: &ClientNachricht, timestamp: i64) -> ProtokollResult<String> {
    let mut u = Umschlag::mit_typ(nachricht.typ(), timestamp);
    match nachricht {
        ClientNachricht::Authenticate { token, did } => {
            u.token = token.clone();
            u.did = did.clone();
        }
        ClientNachricht::JoinRoom { room_id } | ClientNachricht::LeaveRoom { room_id } => {
            u.room_id = Some(room_id.to_string());
        }
        ClientNachricht::Signal {
            target_id, payload, ..
        } => {
            u.target_id = Some(target_id.clone());
            u.payload = Some(payload.clone());
        }
        ClientNachricht::Ping => {}
    }
    u.zu_text()
}

// ---------------------------------------------------------------------------
// Relay -> Client
// ---------------------------------------------------------------------------

/// Kodiert eine Server-Nachricht als JSON-Text
pub fn server_kodieren(nachricht: &ServerNachricht, timestamp: i64) -> ProtokollResult<String> {
    let mut u = Umschlag::mit_typ(nachricht.typ(), timestamp);
    match nachricht {
        ServerNachricht::Welcome { client_id } => {
            u.client_id = Some(client_id.clone());
        }
        ServerNachricht::Authenticated {
            client_id,
            verified,
        } => {
            u.client_id = Some(client_id.clone());
            u.verified = Some(*verified);
        }
        ServerNachricht::RoomJoined { room_id, peers } => {
            u.room_id = Some(room_id.to_string());
            u.peers = Some(peers.clone());
        }
        ServerNachricht::PeerJoined { client_id, room_id }
        | ServerNachricht::PeerLeft { client_id, room_id } => {
            u.client_id = Some(client_id.clone());
            u.room_id = Some(room_id.to_string());
        }
        ServerNachricht::Signal {
            sender_id, payload, ..
        } => {
            u.sender_id = Some(sender_id.clone());
            u.payload = Some(payload.clone());
        }
        ServerNachricht::Pong => {}
        ServerNachricht::Error { reason, target_id } => {
            u.reason = Some(reason.clone());
            u.target_id = target_id.clone();
        }
    }
    u.zu_text()
}

/// Dekodiert eine Server-Nachricht (fuer den Begleit-Client)
pub fn server_dekodieren(text: &str, max_bytes: usize) -> ProtokollResult<ServerNachricht> {
    let mut u = Umschlag::parsen(text, max_bytes)?;
    let typ = u.typ_nehmen()?;

    let client_id = |u: &mut Umschlag| {
        u.client_id
            .take()
            .ok_or_else(|| ProtokollFehler::feld_fehlt(&typ, "clientId"))
    };

    if let Some(art) = SignalArt::aus_typ(&typ) {
        let sender_id = u
            .sender_id
            .take()
            .ok_or_else(|| ProtokollFehler::feld_fehlt(&typ, "senderId"))?;
        return Ok(ServerNachricht::Signal {
            art,
            sender_id,
            payload: u.payload_oder_null(),
        });
    }

    match typ.as_str() {
        TYP_WELCOME => Ok(ServerNachricht::Welcome {
            client_id: client_id(&mut u)?,
        }),
        TYP_AUTHENTICATED => Ok(ServerNachricht::Authenticated {
            client_id: client_id(&mut u)?,
            verified: u.verified.unwrap_or(false),
        }),
        TYP_ROOM_JOINED => Ok(ServerNachricht::RoomJoined {
            room_id: u.raum(&typ)?,
            peers: u.peers.take().unwrap_or_default(),
        }),
        TYP_PEER_JOINED => Ok(ServerNachricht::PeerJoined {
            client_id: client_id(&mut u)?,
            room_id: u.raum(&typ)?,
        }),
        TYP_PEER_LEFT => Ok(ServerNachricht::PeerLeft {
            client_id: client_id(&mut u)?,
            room_id: u.raum(&typ)?,
        }),
        TYP_PONG => Ok(ServerNachricht::Pong),
        TYP_ERROR => Ok(ServerNachricht::Error {
            reason: u.reason.take().unwrap_or_default(),
            target_id: u.target_id.take(),
        }),
        _ => Err(ProtokollFehler::UnbekannterTyp(typ)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = DEFAULT_MAX_NACHRICHT_BYTES;

    #[test]
    fn join_room_dekodieren() {
        let msg = client_dekodieren(r#"{"type":"join-room","roomId":"lobby","timestamp":1}"#, MAX)
            .unwrap();
        match msg {
            ClientNachricht::JoinRoom { room_id } => assert_eq!(room_id.as_str(), "lobby"),
            andere => panic!("Erwartet JoinRoom, erhalten {:?}", andere),
        }
    }

    #[test]
    fn gebrochener_timestamp_wird_akzeptiert() {
        let msg = client_dekodieren(r#"{"type":"ping","timestamp":1700000000000.5}"#, MAX).unwrap();
        assert!(matches!(msg, ClientNachricht::Ping));

        let msg =
            client_dekodieren(r#"{"type":"join-room","roomId":"lobby","timestamp":1.5}"#, MAX)
                .unwrap();
        assert!(matches!(msg, ClientNachricht::JoinRoom { .. }));

        let msg = client_dekodieren(
            r#"{"type":"offer","targetId":"client_b","payload":{},"timestamp":-3e2}"#,
            MAX,
        )
        .unwrap();
        assert!(matches!(msg, ClientNachricht::Signal { .. }));
    }

    #[test]
    fn offer_payload_bleibt_byte_genau() {
        let payload = r#"{ "sdp" : "v=0\r\no=- 1 2 IN IP4 0.0.0.0",  "type":"offer" }"#;
        let text = format!(r#"{{"type":"offer","targetId":"client_b","payload":{}}}"#, payload);
        let msg = client_dekodieren(&text, MAX).unwrap();
        let ClientNachricht::Signal {
            art,
            target_id,
            payload: roh,
        } = msg
        else {
            panic!("Erwartet Signal");
        };
        assert_eq!(art, SignalArt::Offer);
        assert_eq!(target_id.as_str(), "client_b");
        assert_eq!(roh.get(), payload);

        let weiter = server_kodieren(
            &ServerNachricht::Signal {
                art,
                sender_id: ClientId::von_client("client_a"),
                payload: roh,
            },
            42,
        )
        .unwrap();
        assert!(weiter.contains(payload), "Payload muss unveraendert sein: {weiter}");
        assert!(weiter.contains(r#""senderId":"client_a""#));
        assert!(!weiter.contains("targetId"));
    }

    #[test]
    fn quellfeldnamen_werden_akzeptiert() {
        let msg = client_dekodieren(
            r#"{"type":"ice-candidate","targetId":"client_b","candidate":{"candidate":"c1"}}"#,
            MAX,
        )
        .unwrap();
        let ClientNachricht::Signal { art, payload, .. } = msg else {
            panic!("Erwartet Signal");
        };
        assert_eq!(art, SignalArt::IceCandidate);
        assert_eq!(payload.get(), r#"{"candidate":"c1"}"#);

        let auth = client_dekodieren(
            r#"{"type":"authenticate","covenantToken":"abc","did":"did:key:z6"}"#,
            MAX,
        )
        .unwrap();
        let ClientNachricht::Authenticate { token, did } = auth else {
            panic!("Erwartet Authenticate");
        };
        assert_eq!(token.as_deref(), Some("abc"));
        assert_eq!(did.as_deref(), Some("did:key:z6"));
    }

    #[test]
    fn fehlender_payload_wird_null() {
        let msg =
            client_dekodieren(r#"{"type":"ice-candidate","targetId":"client_b"}"#, MAX).unwrap();
        let ClientNachricht::Signal { payload, .. } = msg else {
            panic!("Erwartet Signal");
        };
        assert_eq!(payload.get(), "null");
    }

    #[test]
    fn unbekannter_typ() {
        let err = client_dekodieren(r#"{"type":"teleport"}"#, MAX).unwrap_err();
        assert_eq!(err, ProtokollFehler::UnbekannterTyp("teleport".into()));
    }

    #[test]
    fn kaputter_umschlag() {
        assert!(matches!(
            client_dekodieren("kein json", MAX),
            Err(ProtokollFehler::UngueltigesJson(_))
        ));
        assert_eq!(
            client_dekodieren(r#"{"roomId":"x"}"#, MAX).unwrap_err(),
            ProtokollFehler::TypFehlt
        );
        assert!(matches!(
            client_dekodieren(r#"{"type":"offer","payload":1}"#, MAX),
            Err(ProtokollFehler::FeldFehlt { feld: "targetId", .. })
        ));
        assert!(matches!(
            client_dekodieren(r#"{"type":"join-room","roomId":""}"#, MAX),
            Err(ProtokollFehler::UngueltigesFeld { feld: "roomId", .. })
        ));
    }

    #[test]
    fn zu_grosse_nachricht() {
        let err = client_dekodieren(r#"{"type":"ping"}"#, 4).unwrap_err();
        assert!(matches!(err, ProtokollFehler::ZuGross { maximum: 4, .. }));
    }

    #[test]
    fn room_joined_kodieren() {
        let text = server_kodieren(
            &ServerNachricht::RoomJoined {
                room_id: RoomId::neu("lobby").unwrap(),
                peers: vec![ClientId::von_client("client_a")],
            },
            1234,
        )
        .unwrap();
        let wert: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(wert["type"], "room-joined");
        assert_eq!(wert["timestamp"], 1234);
        assert_eq!(wert["roomId"], "lobby");
        assert_eq!(wert["peers"], serde_json::json!(["client_a"]));
    }

    #[test]
    fn pong_hat_nur_typ_und_zeitstempel() {
        let text = server_kodieren(&ServerNachricht::Pong, 7).unwrap();
        assert_eq!(text, r#"{"type":"pong","timestamp":7}"#);
    }

    #[test]
    fn server_nachricht_zurueck_dekodieren() {
        let text = server_kodieren(
            &ServerNachricht::Authenticated {
                client_id: ClientId::von_client("client_x"),
                verified: true,
            },
            1,
        )
        .unwrap();
        match server_dekodieren(&text, MAX).unwrap() {
            ServerNachricht::Authenticated {
                client_id,
                verified,
            } => {
                assert_eq!(client_id.as_str(), "client_x");
                assert!(verified);
            }
            andere => panic!("Erwartet Authenticated, erhalten {:?}", andere),
        }
    }

    #[test]
    fn client_nachricht_kodieren() {
        let text = client_kodieren(
            &ClientNachricht::LeaveRoom {
                room_id: RoomId::neu("r1").unwrap(),
            },
            99,
        )
        .unwrap();
        assert_eq!(text, r#"{"type":"leave-room","timestamp":99,"roomId":"r1"}"#);
    }
}
