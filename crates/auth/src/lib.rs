//! ghostly-auth – Token-Verifikation fuer das Signaling
//!
//! Stellt die `TokenVerifier`-Faehigkeit bereit, die das Relay vor der
//! Freischaltung eines Clients aufruft, sowie drei Implementierungen:
//!
//! - `AblehnenderVerifier` – kein Credential-Dienst, lehnt alles ab
//! - `StatischerVerifier`  – feste Token-Liste (SHA-256-Digests)
//! - `JwtVerifier`         – HS256-JWT mit Signatur-, exp/nbf- und iss-Pruefung

pub mod error;
pub mod jwt;
pub mod statisch;
pub mod verifier;

pub use error::{AuthError, AuthResult};
pub use jwt::{JwtClaims, JwtVerifier};
pub use statisch::StatischerVerifier;
pub use verifier::{AblehnenderVerifier, TokenVerifier};
