//! Fehlertypen fuer den Signaling-Service

use thiserror::Error;

/// Fehler beim Betrieb des WebSocket-Servers
///
/// Fehler einzelner Clients erscheinen hier nicht: sie werden geloggt und
/// betreffen nie andere Verbindungen.
#[derive(Debug, Error)]
pub enum SignalingError {
    /// IO-Fehler (Listener, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_fehler_wird_uebernommen() {
        let e: SignalingError =
            std::io::Error::new(std::io::ErrorKind::AddrInUse, "belegt").into();
        assert_eq!(e.to_string(), "IO-Fehler: belegt");
    }
}
