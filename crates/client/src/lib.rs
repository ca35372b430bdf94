//! ghostly-client – Gegenstueck zum Signaling-Relay
//!
//! Verbindet sich per WebSocket, merkt sich die zugewiesene Client-ID und
//! stellt die eingehenden Nachrichten als `ServerNachricht` bereit.

pub mod client;
pub mod error;

pub use client::SignalingClient;
pub use error::{ClientFehler, ClientResult};
