//! A player that completed the handshake.

use flightdeck_protocol::{MovementSnapshot, PlayerId};
use flightdeck_transport::PeerId;

use crate::SessionError;

/// An active player.
///
/// The spectate target is stored as a [`PlayerId`], never as a reference:
/// it is resolved through the registry at use time, and the registry clears
/// it when the target leaves. "Spectating" simply means "has a target", so
/// the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    name: String,
    peer: PeerId,
    movement: MovementSnapshot,
    spectating: Option<PlayerId>,
}

impl Player {
    pub(crate) fn new(id: PlayerId, name: String, peer: PeerId, movement: MovementSnapshot) -> Self {
        Self {
            id,
            name,
            peer,
            movement,
            spectating: None,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    pub fn movement(&self) -> &MovementSnapshot {
        &self.movement
    }

    /// Replaces the stored movement. Last write wins.
    pub fn set_movement(&mut self, movement: MovementSnapshot) {
        self.movement = movement;
    }

    pub fn is_spectating(&self) -> bool {
        self.spectating.is_some()
    }

    pub fn spectate_target(&self) -> Option<PlayerId> {
        self.spectating
    }

    /// Starts spectating `target`.
    ///
    /// # Errors
    /// [`SessionError::SelfSpectate`] if `target` is this player.
    pub fn spectate(&mut self, target: PlayerId) -> Result<(), SessionError> {
        if target == self.id {
            return Err(SessionError::SelfSpectate(self.id));
        }
        self.spectating = Some(target);
        Ok(())
    }

    /// Stops spectating. Returns the previous target, if any.
    pub fn stop_spectating(&mut self) -> Option<PlayerId> {
        self.spectating.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: u32) -> Player {
        Player::new(
            PlayerId(id),
            format!("p{id}"),
            PeerId::new(id as u64),
            MovementSnapshot::default(),
        )
    }

    #[test]
    fn test_new_player_is_not_spectating() {
        let p = player(1);
        assert!(!p.is_spectating());
        assert_eq!(p.spectate_target(), None);
    }

    #[test]
    fn test_spectate_other_sets_target_and_flag() {
        let mut p = player(1);
        p.spectate(PlayerId(2)).unwrap();

        assert!(p.is_spectating());
        assert_eq!(p.spectate_target(), Some(PlayerId(2)));
    }

    #[test]
    fn test_spectate_self_is_rejected() {
        let mut p = player(1);
        assert!(matches!(
            p.spectate(PlayerId(1)),
            Err(SessionError::SelfSpectate(_))
        ));
        assert!(!p.is_spectating());
    }

    #[test]
    fn test_stop_spectating_clears_target() {
        let mut p = player(1);
        p.spectate(PlayerId(2)).unwrap();

        assert_eq!(p.stop_spectating(), Some(PlayerId(2)));
        assert!(!p.is_spectating());
        assert_eq!(p.stop_spectating(), None);
    }

    #[test]
    fn test_set_movement_last_write_wins() {
        let mut p = player(1);
        p.set_movement(MovementSnapshot(vec![1]));
        p.set_movement(MovementSnapshot(vec![2]));
        assert_eq!(p.movement(), &MovementSnapshot(vec![2]));
    }
}
