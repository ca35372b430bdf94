//! ghostly-core – Gemeinsame Typen und Fehlertypen
//!
//! Stellt die Identifikationstypen bereit, die Protokoll, Relay und
//! Client gemeinsam nutzen.

pub mod error;
pub mod types;

pub use error::CoreError;
pub use types::{ClientId, RoomId};
