//! Room-Registry – Raum -> Mitglieder
//!
//! Raeume entstehen beim ersten Beitritt und verschwinden sobald das letzte
//! Mitglied geht. Es gibt nie einen leeren Raum in der Registry.

use ghostly_core::{ClientId, RoomId};
use std::collections::{BTreeSet, HashMap};

/// Ergebnis von `beitreten`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beitritt {
    /// Mitglieder vor dem Beitritt (ohne den Beitretenden), sortiert
    pub peers: Vec<ClientId>,
    /// `false` wenn der Client bereits Mitglied war
    pub neu_beigetreten: bool,
    pub raum_erstellt: bool,
}

/// Ergebnis eines Austritts aus einem Raum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Austritt {
    pub room_id: RoomId,
    /// Verbleibende Mitglieder, sortiert
    pub verbleibend: Vec<ClientId>,
    pub raum_geloescht: bool,
}

#[derive(Debug, Default)]
pub struct RoomRegistry {
    raeume: HashMap<RoomId, BTreeSet<ClientId>>,
}

impl RoomRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Tritt einem Raum bei und legt ihn bei Bedarf an
    pub fn beitreten(&mut self, room_id: &RoomId, client_id: &ClientId) -> Beitritt {
        let raum_erstellt = !self.raeume.contains_key(room_id);
        let mitglieder = self.raeume.entry(room_id.clone()).or_default();

        let peers = mitglieder
            .iter()
            .filter(|id| *id != client_id)
            .cloned()
            .collect();
        let neu_beigetreten = mitglieder.insert(client_id.clone());

        if raum_erstellt {
            tracing::debug!(room_id = %room_id, "Raum erstellt");
        }

        Beitritt {
            peers,
            neu_beigetreten,
            raum_erstellt,
        }
    }

    /// Verlaesst einen Raum; `None` wenn Raum oder Mitgliedschaft fehlen
    pub fn verlassen(&mut self, room_id: &RoomId, client_id: &ClientId) -> Option<Austritt> {
        let mitglieder = self.raeume.get_mut(room_id)?;
        if !mitglieder.remove(client_id) {
            return None;
        }

        let verbleibend: Vec<ClientId> = mitglieder.iter().cloned().collect();
        let raum_geloescht = verbleibend.is_empty();
        if raum_geloescht {
            self.raeume.remove(room_id);
            tracing::debug!(room_id = %room_id, "Raum geloescht");
        }

        Some(Austritt {
            room_id: room_id.clone(),
            verbleibend,
            raum_geloescht,
        })
    }

    /// Entfernt den Client aus allen Raeumen (Disconnect)
    ///
    /// Durchsucht alle Raeume statt der Client-Mitgliedschaften, damit auch
    /// eine inkonsistente Client-Sicht keinen Waisen-Eintrag hinterlaesst.
    pub fn alle_verlassen(&mut self, client_id: &ClientId) -> Vec<Austritt> {
        let mut betroffen: Vec<RoomId> = self
            .raeume
            .iter()
            .filter(|(_, mitglieder)| mitglieder.contains(client_id))
            .map(|(id, _)| id.clone())
            .collect();
        betroffen.sort();

        betroffen
            .iter()
            .filter_map(|room_id| self.verlassen(room_id, client_id))
            .collect()
    }

    /// Momentaufnahme der Mitglieder, sortiert
    pub fn mitglieder(&self, room_id: &RoomId) -> Vec<ClientId> {
        self.raeume
            .get(room_id)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn existiert(&self, room_id: &RoomId) -> bool {
        self.raeume.contains_key(room_id)
    }

    pub fn anzahl(&self) -> usize {
        self.raeume.len()
    }

    /// Raum-IDs mit Mitgliederzahl, nach ID sortiert
    pub fn uebersicht(&self) -> Vec<(RoomId, usize)> {
        let mut liste: Vec<(RoomId, usize)> = self
            .raeume
            .iter()
            .map(|(id, m)| (id.clone(), m.len()))
            .collect();
        liste.sort();
        liste
    }

    /// Entfernt alle Raeume und gibt ihre IDs zurueck
    pub fn leeren(&mut self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.raeume.drain().map(|(id, _)| id).collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raum(name: &str) -> RoomId {
        RoomId::neu(name).unwrap()
    }

    fn client(name: &str) -> ClientId {
        ClientId::von_client(name)
    }

    #[test]
    fn erster_beitritt_erstellt_raum() {
        let mut rooms = RoomRegistry::neu();
        let b = rooms.beitreten(&raum("lobby"), &client("a"));
        assert!(b.raum_erstellt);
        assert!(b.neu_beigetreten);
        assert!(b.peers.is_empty());
        assert!(rooms.existiert(&raum("lobby")));
    }

    #[test]
    fn beitritt_liefert_vorherige_mitglieder() {
        let mut rooms = RoomRegistry::neu();
        rooms.beitreten(&raum("lobby"), &client("c"));
        rooms.beitreten(&raum("lobby"), &client("a"));
        let b = rooms.beitreten(&raum("lobby"), &client("b"));
        assert!(!b.raum_erstellt);
        assert_eq!(b.peers, vec![client("a"), client("c")]);
    }

    #[test]
    fn doppelter_beitritt_ist_idempotent() {
        let mut rooms = RoomRegistry::neu();
        rooms.beitreten(&raum("r"), &client("a"));
        rooms.beitreten(&raum("r"), &client("b"));
        let einmal = rooms.mitglieder(&raum("r"));

        let zweimal = rooms.beitreten(&raum("r"), &client("b"));
        assert!(!zweimal.neu_beigetreten);
        assert_eq!(zweimal.peers, vec![client("a")]);
        assert_eq!(rooms.mitglieder(&raum("r")), einmal);
    }

    #[test]
    fn letzter_austritt_loescht_raum() {
        let mut rooms = RoomRegistry::neu();
        let ids = ["a", "b", "c"];
        for id in ids {
            rooms.beitreten(&raum("r"), &client(id));
        }
        for (i, id) in ids.iter().enumerate() {
            let a = rooms.verlassen(&raum("r"), &client(id)).unwrap();
            assert_eq!(a.raum_geloescht, i == ids.len() - 1);
        }
        assert!(!rooms.existiert(&raum("r")));
        assert_eq!(rooms.anzahl(), 0);
    }

    #[test]
    fn verlassen_ohne_mitgliedschaft_ist_noop() {
        let mut rooms = RoomRegistry::neu();
        assert!(rooms.verlassen(&raum("nirgends"), &client("a")).is_none());
        rooms.beitreten(&raum("r"), &client("a"));
        assert!(rooms.verlassen(&raum("r"), &client("b")).is_none());
        assert_eq!(rooms.mitglieder(&raum("r")), vec![client("a")]);
    }

    #[test]
    fn alle_verlassen_ueber_mehrere_raeume() {
        let mut rooms = RoomRegistry::neu();
        rooms.beitreten(&raum("r1"), &client("c"));
        rooms.beitreten(&raum("r1"), &client("p1"));
        rooms.beitreten(&raum("r2"), &client("c"));
        rooms.beitreten(&raum("r2"), &client("p2"));
        rooms.beitreten(&raum("solo"), &client("c"));

        let austritte = rooms.alle_verlassen(&client("c"));
        assert_eq!(austritte.len(), 3);
        assert_eq!(austritte[0].room_id, raum("r1"));
        assert_eq!(austritte[0].verbleibend, vec![client("p1")]);
        assert_eq!(austritte[1].verbleibend, vec![client("p2")]);
        assert!(austritte[2].raum_geloescht);
        assert_eq!(rooms.anzahl(), 2);
        assert!(rooms.alle_verlassen(&client("c")).is_empty());
    }

    #[test]
    fn uebersicht_sortiert() {
        let mut rooms = RoomRegistry::neu();
        rooms.beitreten(&raum("b"), &client("x"));
        rooms.beitreten(&raum("a"), &client("x"));
        rooms.beitreten(&raum("a"), &client("y"));
        assert_eq!(rooms.uebersicht(), vec![(raum("a"), 2), (raum("b"), 1)]);
    }
}
