//! Transport-Abstraktion zwischen Relay und Verbindung
//!
//! Das Relay kennt nur `Transport`: Text senden, Zustand pruefen, schliessen.
//! Die WebSocket-Anbindung verwendet `QueueTransport`, eine begrenzte
//! mpsc-Queue die vom Verbindungs-Task geleert wird. Senden blockiert nie;
//! bei voller Queue wird die Nachricht verworfen.

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

/// Standard-Kapazitaet der Sende-Queue pro Client
pub const DEFAULT_SENDE_QUEUE: usize = 256;

/// Fehler beim Einreihen einer ausgehenden Nachricht
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFehler {
    #[error("Transport geschlossen")]
    Geschlossen,

    #[error("Sende-Queue voll")]
    QueueVoll,
}

/// Ausgehende Seite einer Client-Verbindung
pub trait Transport: Send + Sync + 'static {
    /// Reiht einen Text-Frame ein, ohne zu blockieren
    fn senden(&self, text: String) -> Result<(), TransportFehler>;

    /// `true` solange Nachrichten angenommen werden
    fn ist_offen(&self) -> bool;

    /// Schliesst den Transport; bereits eingereihte Frames werden noch zugestellt
    fn schliessen(&self);
}

// ---------------------------------------------------------------------------
// QueueTransport
// ---------------------------------------------------------------------------

/// Transport ueber eine begrenzte mpsc-Queue
///
/// Schliessen verwirft den Sender. Der Empfaenger liefert danach die
/// restlichen Frames und anschliessend `None`, woraufhin der
/// Verbindungs-Task den Socket schliesst.
#[derive(Debug)]
pub struct QueueTransport {
    tx: Mutex<Option<mpsc::Sender<String>>>,
}

impl QueueTransport {
    /// Erstellt Transport und zugehoerige Empfangs-Queue
    pub fn neu(kapazitaet: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(kapazitaet.max(1));
        (
            Self {
                tx: Mutex::new(Some(tx)),
            },
            rx,
        )
    }
}

impl Transport for QueueTransport {
    fn senden(&self, text: String) -> Result<(), TransportFehler> {
        let tx = self.tx.lock();
        let Some(tx) = tx.as_ref() else {
            return Err(TransportFehler::Geschlossen);
        };
        tx.try_send(text).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportFehler::QueueVoll,
            mpsc::error::TrySendError::Closed(_) => TransportFehler::Geschlossen,
        })
    }

    fn ist_offen(&self) -> bool {
        self.tx
            .lock()
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    fn schliessen(&self) {
        self.tx.lock().take();
    }
}
