//! Fehlertypen fuer die gemeinsamen Typen

use thiserror::Error;

/// Fehler beim Erzeugen oder Pruefen gemeinsamer Typen
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Ungueltige Raum-ID: {0}")]
    UngueltigeRaumId(String),
}
