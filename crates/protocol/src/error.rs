//! Fehlertypen fuer das Wire-Protokoll

use thiserror::Error;

/// Fehler beim Kodieren oder Dekodieren einer Nachricht
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtokollFehler {
    /// Kein gueltiges JSON-Objekt
    #[error("Ungueltiges JSON: {0}")]
    UngueltigesJson(String),

    /// Feld `type` fehlt
    #[error("Nachrichtentyp fehlt")]
    TypFehlt,

    /// Typ wird nicht unterstuetzt
    #[error("Unbekannter Nachrichtentyp: {0}")]
    UnbekannterTyp(String),

    /// Pflichtfeld fehlt
    #[error("Feld '{feld}' fehlt in '{typ}'")]
    FeldFehlt { typ: String, feld: &'static str },

    /// Feld vorhanden aber ungueltig
    #[error("Feld '{feld}' ungueltig: {grund}")]
    UngueltigesFeld { feld: &'static str, grund: String },

    /// Nachricht ueberschreitet die maximale Groesse
    #[error("Nachricht zu gross: {groesse} Bytes (Maximum: {maximum} Bytes)")]
    ZuGross { groesse: usize, maximum: usize },

    /// Serialisierung fehlgeschlagen
    #[error("JSON-Serialisierung fehlgeschlagen: {0}")]
    Serialisierung(String),
}

impl ProtokollFehler {
    pub fn feld_fehlt(typ: &str, feld: &'static str) -> Self {
        Self::FeldFehlt {
            typ: typ.to_string(),
            feld,
        }
    }
}

/// Result-Typ fuer das Wire-Protokoll
pub type ProtokollResult<T> = Result<T, ProtokollFehler>;
