//! Handler fuer alle Client-Nachrichten
//!
//! Jeder Handler ist fuer eine Nachrichtengruppe zustaendig und arbeitet
//! auf dem bereits gesperrten `RelayState`.

pub mod auth_handler;
pub mod room_handler;
pub mod signal_handler;
