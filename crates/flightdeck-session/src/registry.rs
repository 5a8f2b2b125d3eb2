//! The set of active players.

use std::collections::{BTreeMap, HashMap};

use flightdeck_protocol::{MovementSnapshot, PlayerId};
use flightdeck_transport::PeerId;

use crate::{Player, SessionError};

/// Active players keyed by id, with a reverse index by peer.
///
/// Ids come from a counter that starts at 1 and only goes up, so iteration
/// order (ascending id) is also join order.
#[derive(Debug)]
pub struct PlayerRegistry {
    players: BTreeMap<PlayerId, Player>,
    by_peer: HashMap<PeerId, PlayerId>,
    next_id: u32,
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self {
            players: BTreeMap::new(),
            by_peer: HashMap::new(),
            next_id: 1,
        }
    }

    /// Creates a player for `peer` with the next free id.
    ///
    /// # Errors
    /// - [`SessionError::AlreadyActive`] if `peer` already owns a player
    /// - [`SessionError::IdsExhausted`] if the id counter overflowed
    pub fn promote(
        &mut self,
        peer: PeerId,
        name: impl Into<String>,
        movement: MovementSnapshot,
    ) -> Result<&Player, SessionError> {
        if self.by_peer.contains_key(&peer) {
            return Err(SessionError::AlreadyActive(peer));
        }

        let id = PlayerId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(SessionError::IdsExhausted)?;

        let player = Player::new(id, name.into(), peer, movement);
        tracing::info!(%peer, player_id = %id, name = %player.name(), "player joined");

        self.by_peer.insert(peer, id);
        Ok(self.players.entry(id).or_insert(player))
    }

    /// Removes the player owned by `peer`.
    ///
    /// Spectators of the removed player keep their target; call
    /// [`release_spectators`](Self::release_spectators) afterwards.
    pub fn remove(&mut self, peer: PeerId) -> Option<Player> {
        let id = self.by_peer.remove(&peer)?;
        let player = self.players.remove(&id)?;
        tracing::info!(%peer, player_id = %id, name = %player.name(), "player left");
        Some(player)
    }

    /// Clears the spectate target of everyone watching `target`. Returns the
    /// ids of the released players.
    pub fn release_spectators(&mut self, target: PlayerId) -> Vec<PlayerId> {
        let mut released = Vec::new();
        for player in self.players.values_mut() {
            if player.spectate_target() == Some(target) {
                player.stop_spectating();
                released.push(player.id());
            }
        }
        if !released.is_empty() {
            tracing::debug!(target_id = %target, count = released.len(), "spectators released");
        }
        released
    }

    pub fn get(&self, peer: PeerId) -> Option<&Player> {
        self.by_peer.get(&peer).and_then(|id| self.players.get(id))
    }

    pub fn get_mut(&mut self, peer: PeerId) -> Option<&mut Player> {
        let id = self.by_peer.get(&peer)?;
        self.players.get_mut(id)
    }

    pub fn by_id(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn contains_peer(&self, peer: PeerId) -> bool {
        self.by_peer.contains_key(&peer)
    }

    /// All active players in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Active players that are not spectating, in id order.
    pub fn in_game(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| !p.is_spectating())
    }

    /// Peers of all active players, in id order.
    pub fn peers(&self) -> Vec<PeerId> {
        self.players.values().map(Player::peer).collect()
    }

    /// Names of players in the game.
    pub fn roster(&self) -> BTreeMap<PlayerId, String> {
        self.in_game()
            .map(|p| (p.id(), p.name().to_owned()))
            .collect()
    }

    /// Latest movement of players in the game.
    pub fn movements(&self) -> BTreeMap<PlayerId, MovementSnapshot> {
        self.in_game()
            .map(|p| (p.id(), p.movement().clone()))
            .collect()
    }

    /// Players in the game whose name starts with `prefix`, ignoring case.
    pub fn find_by_name_prefix(&self, prefix: &str) -> Vec<&Player> {
        let prefix = prefix.to_lowercase();
        self.in_game()
            .filter(|p| p.name().to_lowercase().starts_with(&prefix))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: u64) -> PeerId {
        PeerId::new(id)
    }

    fn join(registry: &mut PlayerRegistry, p: u64, name: &str) -> PlayerId {
        registry
            .promote(peer(p), name, MovementSnapshot(vec![p as u8]))
            .unwrap()
            .id()
    }

    // =====================================================================
    // promote / remove
    // =====================================================================

    #[test]
    fn test_promote_assigns_ids_from_one() {
        let mut registry = PlayerRegistry::new();
        assert_eq!(join(&mut registry, 10, "ada"), PlayerId(1));
        assert_eq!(join(&mut registry, 11, "bob"), PlayerId(2));
    }

    #[test]
    fn test_promote_same_peer_twice_returns_already_active() {
        let mut registry = PlayerRegistry::new();
        join(&mut registry, 1, "ada");

        let result = registry.promote(peer(1), "ada2", MovementSnapshot::default());
        assert!(matches!(result, Err(SessionError::AlreadyActive(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_ids_are_not_reused_after_remove() {
        let mut registry = PlayerRegistry::new();
        join(&mut registry, 1, "ada");
        registry.remove(peer(1));

        assert_eq!(join(&mut registry, 2, "bob"), PlayerId(2));
    }

    #[test]
    fn test_promote_with_exhausted_counter_returns_ids_exhausted() {
        let mut registry = PlayerRegistry::new();
        registry.next_id = u32::MAX;

        let result = registry.promote(peer(1), "ada", MovementSnapshot::default());

        assert!(matches!(result, Err(SessionError::IdsExhausted)));
        assert!(registry.is_empty());
        assert!(!registry.contains_peer(peer(1)));
    }

    #[test]
    fn test_remove_unknown_peer_returns_none() {
        let mut registry = PlayerRegistry::new();
        assert!(registry.remove(peer(3)).is_none());
    }

    #[test]
    fn test_remove_drops_peer_index() {
        let mut registry = PlayerRegistry::new();
        let id = join(&mut registry, 1, "ada");

        let removed = registry.remove(peer(1)).unwrap();

        assert_eq!(removed.id(), id);
        assert!(!registry.contains_peer(peer(1)));
        assert!(registry.by_id(id).is_none());
    }

    // =====================================================================
    // Spectating
    // =====================================================================

    #[test]
    fn test_release_spectators_clears_only_watchers_of_target() {
        let mut registry = PlayerRegistry::new();
        let a = join(&mut registry, 1, "ada");
        let b = join(&mut registry, 2, "bob");
        join(&mut registry, 3, "cy");
        join(&mut registry, 4, "dee");
        registry.get_mut(peer(3)).unwrap().spectate(a).unwrap();
        registry.get_mut(peer(4)).unwrap().spectate(b).unwrap();

        let released = registry.release_spectators(a);

        assert_eq!(released, vec![PlayerId(3)]);
        assert!(!registry.get(peer(3)).unwrap().is_spectating());
        assert!(registry.get(peer(4)).unwrap().is_spectating());
    }

    #[test]
    fn test_roster_and_movements_skip_spectators() {
        let mut registry = PlayerRegistry::new();
        let a = join(&mut registry, 1, "ada");
        let b = join(&mut registry, 2, "bob");
        registry.get_mut(peer(2)).unwrap().spectate(a).unwrap();

        let roster = registry.roster();
        let movements = registry.movements();

        assert_eq!(roster.len(), 1);
        assert_eq!(roster[&a], "ada");
        assert!(!movements.contains_key(&b));
        assert_eq!(movements[&a], MovementSnapshot(vec![1]));
    }

    // =====================================================================
    // Lookup
    // =====================================================================

    #[test]
    fn test_find_by_name_prefix_ignores_case() {
        let mut registry = PlayerRegistry::new();
        join(&mut registry, 1, "Alice");
        join(&mut registry, 2, "bob");

        let found = registry.find_by_name_prefix("al");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "Alice");
    }

    #[test]
    fn test_find_by_name_prefix_returns_all_matches() {
        let mut registry = PlayerRegistry::new();
        join(&mut registry, 1, "bob");
        join(&mut registry, 2, "bobby");

        assert_eq!(registry.find_by_name_prefix("bob").len(), 2);
    }

    #[test]
    fn test_find_by_name_prefix_skips_spectators() {
        let mut registry = PlayerRegistry::new();
        let a = join(&mut registry, 1, "ada");
        join(&mut registry, 2, "adam");
        registry.get_mut(peer(2)).unwrap().spectate(a).unwrap();

        let found = registry.find_by_name_prefix("ada");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), a);
    }

    #[test]
    fn test_peers_in_id_order() {
        let mut registry = PlayerRegistry::new();
        join(&mut registry, 9, "ada");
        join(&mut registry, 3, "bob");

        assert_eq!(registry.peers(), vec![peer(9), peer(3)]);
    }
}
