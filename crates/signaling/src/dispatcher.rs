//! Message-Dispatcher – Routet Client-Nachrichten an die Handler
//!
//! Laeuft synchron unter dem Relay-Mutex: jede Nachricht wird komplett
//! verarbeitet (Registry-Aenderung plus eingereihte Sendungen), bevor die
//! naechste drankommt.
//!
//! ## Auth-Gate
//! Mit `auth_erforderlich` werden vor erfolgreicher Authentifizierung nur
//! `authenticate` und `ping` angenommen, alles andere wird verworfen.
//!
//! `authenticate` selbst braucht den Verifier (async) und wird deshalb
//! als `DispatchErgebnis::Authentifizieren` an das Relay zurueckgegeben.

use ghostly_core::ClientId;
use ghostly_observability::metrics::grund;
use ghostly_protocol::{ClientNachricht, ServerNachricht};

use crate::handlers::{room_handler, signal_handler};
use crate::server_state::{RelayKontext, RelayState};

/// Was nach dem synchronen Teil noch zu tun ist
#[derive(Debug, PartialEq, Eq)]
pub enum DispatchErgebnis {
    /// Nachricht vollstaendig verarbeitet (oder verworfen)
    Erledigt,
    /// Token muss ausserhalb des Mutex geprueft werden
    Authentifizieren {
        token: Option<String>,
        did: Option<String>,
    },
}

/// Verarbeitet eine dekodierte Nachricht von `absender`
pub fn dispatch(
    state: &mut RelayState,
    kontext: &RelayKontext,
    absender: &ClientId,
    nachricht: ClientNachricht,
) -> DispatchErgebnis {
    let Some(eintrag) = state.clients.eintrag(absender) else {
        tracing::debug!(client_id = %absender, "Nachricht von getrenntem Client verworfen");
        return DispatchErgebnis::Erledigt;
    };

    let gesperrt = kontext.config.auth_erforderlich
        && !eintrag.authentifiziert
        && !matches!(
            nachricht,
            ClientNachricht::Authenticate { .. } | ClientNachricht::Ping
        );
    if gesperrt {
        tracing::warn!(
            client_id = %absender,
            typ = nachricht.typ(),
            "Nicht authentifiziert – Nachricht verworfen"
        );
        kontext.verworfen(grund::NICHT_AUTHENTIFIZIERT);
        return DispatchErgebnis::Erledigt;
    }

    match nachricht {
        ClientNachricht::Authenticate { token, did } => {
            return DispatchErgebnis::Authentifizieren { token, did };
        }
        ClientNachricht::JoinRoom { room_id } => {
            room_handler::raum_beitreten(state, kontext, absender, room_id);
        }
        ClientNachricht::LeaveRoom { room_id } => {
            room_handler::raum_verlassen(state, kontext, absender, room_id);
        }
        ClientNachricht::Signal {
            art,
            target_id,
            payload,
        } => {
            signal_handler::weiterleiten(state, kontext, absender, art, target_id, payload);
        }
        ClientNachricht::Ping => {
            state.clients.senden(absender, &ServerNachricht::Pong);
        }
    }

    DispatchErgebnis::Erledigt
}
