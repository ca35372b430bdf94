//! ghostly-signaling – WebRTC-Signaling-Relay
//!
//! Vermittelt Offer/Answer/ICE-Candidates zwischen Peers, die sich ueber
//! benannte Raeume finden. Das Relay interpretiert keine Payloads.
//!
//! ## Architektur
//!
//! ```text
//! WebSocket-Listener (SignalingServer)
//!     |
//!     v
//! Connection-Task (pro Verbindung, Drop-Guard fuer das Aufraeumen)
//!     |
//!     v
//! Relay (ein Mutex ueber RelayState)
//!     |
//!     +-- MessageDispatcher
//!     |     +-- auth_handler    (authenticate, Gate)
//!     |     +-- room_handler    (join-room, leave-room)
//!     |     +-- signal_handler  (offer, answer, ice-candidate)
//!     |
//!     +-- ConnectionRegistry  – Clients, Transports, Auth-Status
//!     +-- RoomRegistry        – Raum -> Mitglieder
//!     +-- Lifecycle           – Trennen, peer-left an alle Raeume
//! ```

pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod handlers;
pub mod lifecycle;
pub mod registry;
pub mod relay;
pub mod rooms;
pub mod server;
pub mod server_state;
pub mod stats;
pub mod transport;

// Bequeme Re-Exporte
pub use error::{SignalingError, SignalingResult};
pub use events::RelayEvent;
pub use lifecycle::ClientZustand;
pub use registry::ConnectionRegistry;
pub use relay::Relay;
pub use rooms::RoomRegistry;
pub use server::{stats_router, SignalingServer};
pub use server_state::RelayConfig;
pub use stats::{RaumStatistik, RelayStats};
pub use transport::{QueueTransport, Transport, TransportFehler};
