//! Relay-Statistik (`GET /stats`)

use ghostly_core::RoomId;
use serde::Serialize;

use crate::server_state::RelayState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaumStatistik {
    pub room_id: RoomId,
    pub clients: usize,
}

/// Momentaufnahme des Relay-Zustands
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayStats {
    pub total_clients: usize,
    pub total_rooms: usize,
    pub authenticated_clients: usize,
    pub verified_identities: usize,
    pub rooms: Vec<RaumStatistik>,
}

impl RelayStats {
    pub fn erfassen(state: &RelayState) -> Self {
        Self {
            total_clients: state.clients.anzahl(),
            total_rooms: state.rooms.anzahl(),
            authenticated_clients: state.clients.authentifizierte_anzahl(),
            verified_identities: state.clients.verifizierte_identitaeten(),
            rooms: state
                .rooms
                .uebersicht()
                .into_iter()
                .map(|(room_id, clients)| RaumStatistik { room_id, clients })
                .collect(),
        }
    }

    /// Mitgliederzahl eines Raums, 0 wenn er nicht existiert
    pub fn raum_groesse(&self, room_id: &str) -> usize {
        self.rooms
            .iter()
            .find(|r| r.room_id.as_str() == room_id)
            .map_or(0, |r| r.clients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostly_core::ClientId;

    #[test]
    fn json_ist_camel_case() {
        let mut state = RelayState::default();
        let raum = RoomId::neu("lobby").unwrap();
        state.rooms.beitreten(&raum, &ClientId::von_client("a"));

        let stats = RelayStats::erfassen(&state);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalClients"], 0);
        assert_eq!(json["totalRooms"], 1);
        assert_eq!(json["authenticatedClients"], 0);
        assert_eq!(json["verifiedIdentities"], 0);
        assert_eq!(json["rooms"][0]["roomId"], "lobby");
        assert_eq!(json["rooms"][0]["clients"], 1);
        assert_eq!(stats.raum_groesse("lobby"), 1);
        assert_eq!(stats.raum_groesse("fehlt"), 0);
    }
}
