//! Room-Handler – join-room, leave-room

use ghostly_core::{ClientId, RoomId};
use ghostly_protocol::ServerNachricht;

use crate::events::RelayEvent;
use crate::server_state::{RelayKontext, RelayState};

/// Verarbeitet `join-room`
///
/// Der Beitretende bekommt `room-joined` mit den bisherigen Mitgliedern,
/// diese bekommen je ein `peer-joined`. Ein erneuter Beitritt wird nur
/// mit `room-joined` beantwortet, ohne die Peers erneut zu benachrichtigen.
pub fn raum_beitreten(
    state: &mut RelayState,
    kontext: &RelayKontext,
    absender: &ClientId,
    room_id: RoomId,
) {
    let beitritt = state.rooms.beitreten(&room_id, absender);

    if let Some(eintrag) = state.clients.eintrag_mut(absender) {
        eintrag.raeume.insert(room_id.clone());
    }

    if beitritt.raum_erstellt {
        kontext.ereignis(RelayEvent::RaumErstellt {
            room_id: room_id.clone(),
        });
    }

    if beitritt.neu_beigetreten {
        let peer_joined = ServerNachricht::PeerJoined {
            client_id: absender.clone(),
            room_id: room_id.clone(),
        };
        state.clients.an_mehrere_senden(&beitritt.peers, &peer_joined);
    }

    tracing::debug!(
        client_id = %absender,
        room_id = %room_id,
        peers = beitritt.peers.len(),
        neu = beitritt.neu_beigetreten,
        "Raum beigetreten"
    );

    state.clients.senden(
        absender,
        &ServerNachricht::RoomJoined {
            room_id,
            peers: beitritt.peers,
        },
    );
    kontext.bestand(state);
}

/// Verarbeitet `leave-room`
///
/// Ohne Mitgliedschaft passiert nichts, auch keine Antwort.
pub fn raum_verlassen(
    state: &mut RelayState,
    kontext: &RelayKontext,
    absender: &ClientId,
    room_id: RoomId,
) {
    let Some(austritt) = state.rooms.verlassen(&room_id, absender) else {
        tracing::debug!(client_id = %absender, room_id = %room_id, "Verlassen ohne Mitgliedschaft");
        return;
    };

    if let Some(eintrag) = state.clients.eintrag_mut(absender) {
        eintrag.raeume.remove(&room_id);
    }

    let peer_left = ServerNachricht::PeerLeft {
        client_id: absender.clone(),
        room_id: room_id.clone(),
    };
    state.clients.an_mehrere_senden(&austritt.verbleibend, &peer_left);

    if austritt.raum_geloescht {
        kontext.ereignis(RelayEvent::RaumGeloescht {
            room_id: room_id.clone(),
        });
    }

    tracing::debug!(client_id = %absender, room_id = %room_id, "Raum verlassen");
    kontext.bestand(state);
}
