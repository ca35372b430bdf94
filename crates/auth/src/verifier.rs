//! TokenVerifier – austauschbare Pruefung von Bearer-Tokens
//!
//! Das Relay kennt nur diese Faehigkeit: "ist dieses Token gueltig?".
//! Woher die Tokens stammen und wie sie signiert sind, entscheidet die
//! jeweilige Implementierung.

use async_trait::async_trait;

use crate::error::AuthResult;

/// Prueft opake Bearer-Tokens
///
/// `Ok(false)` bedeutet abgelehnt. `Err` bedeutet, dass keine Aussage
/// moeglich war (z.B. externer Dienst nicht erreichbar); der Aufrufer
/// behandelt das wie eine Ablehnung.
#[async_trait]
pub trait TokenVerifier: Send + Sync + 'static {
    /// Prueft ein Token
    async fn verifizieren(&self, token: &str) -> AuthResult<bool>;

    /// Kurzname fuer Logs
    fn name(&self) -> &'static str;
}

/// Lehnt jedes Token ab (kein Credential-Dienst konfiguriert)
#[derive(Debug, Default, Clone, Copy)]
pub struct AblehnenderVerifier;

#[async_trait]
impl TokenVerifier for AblehnenderVerifier {
    async fn verifizieren(&self, _token: &str) -> AuthResult<bool> {
        Ok(false)
    }

    fn name(&self) -> &'static str {
        "keiner"
    }
}
