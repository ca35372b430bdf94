//! ghostly-protocol – Nachrichtendefinitionen fuer das Signaling
//!
//! Dieses Crate definiert alle Nachrichten die zwischen Client und Relay
//! ueber die WebSocket-Verbindung ausgetauscht werden, sowie das
//! JSON-Wire-Format.

pub mod error;
pub mod signal;
pub mod wire;

pub use error::{ProtokollFehler, ProtokollResult};
pub use signal::{ClientNachricht, ServerNachricht, SignalArt};
pub use wire::{
    client_dekodieren, client_kodieren, jetzt_ms, server_dekodieren, server_kodieren,
    DEFAULT_MAX_NACHRICHT_BYTES,
};
