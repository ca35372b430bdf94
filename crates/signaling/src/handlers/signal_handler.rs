//! Signal-Handler – Offer/Answer/ICE-Candidate weiterleiten
//!
//! Der Payload wird nie angefasst. Die Absender-ID setzt das Relay.
//! Ein Raum ist fuer die Weiterleitung nicht noetig.

use ghostly_core::ClientId;
use ghostly_observability::metrics::grund;
use ghostly_protocol::{ServerNachricht, SignalArt};
use serde_json::value::RawValue;

use crate::server_state::{RelayKontext, RelayState};

/// Leitet eine Signal-Nachricht an `ziel` weiter
///
/// Unbekannte Ziele werden still verworfen. Mit `ziel_diagnose` bekommt
/// nur der Absender ein lokales `error{reason:"target-not-found"}`.
pub fn weiterleiten(
    state: &RelayState,
    kontext: &RelayKontext,
    absender: &ClientId,
    art: SignalArt,
    ziel: ClientId,
    payload: Box<RawValue>,
) {
    if !state.clients.ist_registriert(&ziel) {
        tracing::debug!(
            client_id = %absender,
            ziel = %ziel,
            typ = art.as_str(),
            "Ziel nicht verbunden – Nachricht verworfen"
        );
        kontext.verworfen(grund::ZIEL_UNBEKANNT);
        if kontext.config.ziel_diagnose {
            state
                .clients
                .senden(absender, &ServerNachricht::ziel_nicht_gefunden(ziel));
        }
        return;
    }

    let nachricht = ServerNachricht::Signal {
        art,
        sender_id: absender.clone(),
        payload,
    };

    if state.clients.senden(&ziel, &nachricht) {
        tracing::debug!(client_id = %absender, ziel = %ziel, typ = art.as_str(), "Weitergeleitet");
        kontext.weitergeleitet(art.as_str());
    } else {
        kontext.verworfen(grund::NICHT_ZUSTELLBAR);
    }
}
