//! Fehlertypen fuer die Token-Verifikation

use thiserror::Error;

/// Alle moeglichen Fehler bei der Token-Verifikation
#[derive(Debug, Error)]
pub enum AuthError {
    // --- Token-Format ---
    #[error("Token hat ungueltiges Format: {0}")]
    TokenFormat(String),

    #[error("Algorithmus nicht unterstuetzt: {0}")]
    AlgorithmusNichtUnterstuetzt(String),

    // --- Pruefung ---
    #[error("Signatur ungueltig")]
    SignaturUngueltig,

    #[error("Token abgelaufen")]
    TokenAbgelaufen,

    #[error("Token noch nicht gueltig")]
    TokenNochNichtGueltig,

    #[error("Aussteller fehlt oder stimmt nicht")]
    FalscherAussteller,

    // --- Verifier ---
    #[error("Verifier nicht erreichbar: {0}")]
    VerifierNichtErreichbar(String),

    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),
}

impl AuthError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::TokenFormat(msg.into())
    }
}

/// Result-Alias fuer die Token-Verifikation
pub type AuthResult<T> = Result<T, AuthError>;
