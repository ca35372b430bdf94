//! Gemeinsame Identifikationstypen fuer das Signaling
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! Client- und Raum-IDs zur Compilezeit auszuschliessen.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Praefix aller vom Relay vergebenen Client-IDs
pub const CLIENT_ID_PRAEFIX: &str = "client_";

/// Anzahl Zufallsbytes pro Client-ID (hex-kodiert doppelt so lang)
const CLIENT_ID_BYTES: usize = 16;

/// Maximale Laenge einer Raum-ID in Bytes
pub const MAX_RAUM_ID_LAENGE: usize = 128;

/// Eindeutige Client-ID
///
/// Wird ausschliesslich vom Relay beim Verbindungsaufbau erzeugt. Beim
/// Deserialisieren wird jeder String akzeptiert, da Clients fremde IDs
/// als `targetId` angeben.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Erzeugt eine neue, nicht erratbare Client-ID aus OS-Zufall
    pub fn generieren() -> Self {
        let mut bytes = [0u8; CLIENT_ID_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(format!("{}{}", CLIENT_ID_PRAEFIX, hex::encode(bytes)))
    }

    /// Uebernimmt eine vom Client gelieferte ID ohne Pruefung
    pub fn von_client(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Vom Aufrufer gewaehlter Raum-Bezeichner
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Erstellt eine RoomId nach Laengenpruefung
    pub fn neu(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::UngueltigeRaumId("leer".into()));
        }
        if id.len() > MAX_RAUM_ID_LAENGE {
            return Err(CoreError::UngueltigeRaumId(format!(
                "{} Bytes (Maximum: {})",
                id.len(),
                MAX_RAUM_ID_LAENGE
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::neu(value)
    }
}

impl From<RoomId> for String {
    fn from(value: RoomId) -> Self {
        value.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_eindeutig() {
        let a = ClientId::generieren();
        let b = ClientId::generieren();
        assert_ne!(a, b, "Zwei neue ClientIds muessen verschieden sein");
    }

    #[test]
    fn client_id_format() {
        let id = ClientId::generieren();
        let s = id.as_str();
        assert!(s.starts_with(CLIENT_ID_PRAEFIX));
        let hex_teil = &s[CLIENT_ID_PRAEFIX.len()..];
        assert_eq!(hex_teil.len(), 32);
        assert!(hex_teil.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn raum_id_leer_abgelehnt() {
        assert!(RoomId::neu("").is_err());
    }

    #[test]
    fn raum_id_zu_lang_abgelehnt() {
        assert!(RoomId::neu("x".repeat(MAX_RAUM_ID_LAENGE + 1)).is_err());
        assert!(RoomId::neu("x".repeat(MAX_RAUM_ID_LAENGE)).is_ok());
    }

    #[test]
    fn ids_sind_serde_kompatibel() {
        let id = ClientId::generieren();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));

        let raum: RoomId = serde_json::from_str("\"lobby\"").unwrap();
        assert_eq!(raum.as_str(), "lobby");
        assert!(serde_json::from_str::<RoomId>("\"\"").is_err());
    }
}
