//! Auth-Handler – Token pruefen, Ergebnis uebernehmen
//!
//! Die Pruefung laeuft ausserhalb des Relay-Mutex (der Verifier darf
//! Netzwerk-I/O machen). Das Ergebnis wird danach in einem zweiten,
//! kurzen Abschnitt angewendet, sofern der Client noch existiert.
//!
//! Fehlgeschlagene Authentifizierung ist nie fatal: der Client bekommt
//! `authenticated{verified:false}` und bleibt verbunden.

use ghostly_auth::TokenVerifier;
use ghostly_core::ClientId;
use ghostly_protocol::ServerNachricht;
use std::time::Duration;

use crate::events::RelayEvent;
use crate::lifecycle::ClientZustand;
use crate::server_state::{RelayKontext, RelayState};

/// Prueft ein Token mit Zeitlimit
///
/// Fehlendes oder leeres Token, Verifier-Fehler und Timeout gelten als
/// nicht verifiziert.
pub async fn token_pruefen(
    verifier: &dyn TokenVerifier,
    token: Option<&str>,
    zeitlimit: Duration,
) -> bool {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        tracing::debug!("Authentifizierung ohne Token");
        return false;
    };

    match tokio::time::timeout(zeitlimit, verifier.verifizieren(token)).await {
        Ok(Ok(verifiziert)) => verifiziert,
        Ok(Err(e)) => {
            tracing::warn!(verifier = verifier.name(), fehler = %e, "Token-Verifikation fehlgeschlagen");
            false
        }
        Err(_) => {
            tracing::warn!(
                verifier = verifier.name(),
                timeout_ms = zeitlimit.as_millis() as u64,
                "Token-Verifikation Timeout"
            );
            false
        }
    }
}

/// Uebernimmt das Pruefergebnis und antwortet mit `authenticated`
///
/// Gibt `false` zurueck wenn der Client inzwischen getrennt wurde.
pub fn ergebnis_anwenden(
    state: &mut RelayState,
    kontext: &RelayKontext,
    client_id: &ClientId,
    verifiziert: bool,
    did: Option<String>,
) -> bool {
    let Some(eintrag) = state.clients.eintrag_mut(client_id) else {
        tracing::debug!(client_id = %client_id, "Auth-Ergebnis fuer getrennten Client verworfen");
        return false;
    };

    if verifiziert {
        eintrag.authentifiziert = true;
        eintrag.did = did;
        eintrag.zustand.wechseln(ClientZustand::Authentifiziert);
    } else {
        eintrag.authentifiziert = false;
        eintrag.did = None;
        eintrag.zustand.wechseln(ClientZustand::Verbunden);
    }

    tracing::info!(
        client_id = %client_id,
        verified = verifiziert,
        did = ?state.clients.eintrag(client_id).and_then(|e| e.did.as_deref()),
        "Authentifizierung abgeschlossen"
    );

    state.clients.senden(
        client_id,
        &ServerNachricht::Authenticated {
            client_id: client_id.clone(),
            verified: verifiziert,
        },
    );

    kontext.authentifizierung(verifiziert);
    kontext.ereignis(RelayEvent::ClientAuthentifiziert {
        client_id: client_id.clone(),
        verified: verifiziert,
    });
    true
}
