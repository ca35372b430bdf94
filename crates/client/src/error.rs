//! Fehlertypen fuer den Signaling-Client

use ghostly_core::CoreError;
use ghostly_protocol::ProtokollFehler;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientFehler {
    /// Verbindungsaufbau oder Handshake fehlgeschlagen
    #[error("Verbindung fehlgeschlagen: {0}")]
    Verbindung(String),

    /// Die Verbindung ist bereits getrennt
    #[error("Nicht mit dem Relay verbunden")]
    NichtVerbunden,

    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] ProtokollFehler),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// Keine Antwort innerhalb der Wartezeit
    #[error("Zeitueberschreitung")]
    Timeout,

    #[error("Payload nicht serialisierbar: {0}")]
    Serialisierung(String),
}

pub type ClientResult<T> = Result<T, ClientFehler>;
