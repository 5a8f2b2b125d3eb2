//! Integration tests for moving peers through the session layer.
//!
//! These drive the pending tracker and the registry together the way the
//! server does: connect, wait, promote or time out, leave.

use std::time::{Duration, Instant};

use flightdeck_protocol::{MovementSnapshot, PlayerId};
use flightdeck_session::{HANDSHAKE_TIMEOUT, PendingConnections, PlayerRegistry};
use flightdeck_transport::PeerId;

struct Sessions {
    pending: PendingConnections,
    players: PlayerRegistry,
}

impl Sessions {
    fn new() -> Self {
        Self {
            pending: PendingConnections::new(),
            players: PlayerRegistry::new(),
        }
    }

    fn connect(&mut self, peer: u64, now: Instant) -> PeerId {
        let peer = PeerId::new(peer);
        self.pending.add(peer, now);
        peer
    }

    fn handshake(&mut self, peer: PeerId, name: &str) -> PlayerId {
        assert!(self.pending.remove(peer));
        self.players
            .promote(peer, name, MovementSnapshot::default())
            .unwrap()
            .id()
    }

    fn leave(&mut self, peer: PeerId) {
        self.pending.remove(peer);
        if let Some(player) = self.players.remove(peer) {
            self.players.release_spectators(player.id());
        }
    }
}

#[test]
fn test_peer_is_in_exactly_one_set_after_handshake() {
    let mut s = Sessions::new();
    let now = Instant::now();
    let peer = s.connect(1, now);

    assert!(s.pending.contains(peer));
    assert!(!s.players.contains_peer(peer));

    s.handshake(peer, "ada");

    assert!(!s.pending.contains(peer));
    assert!(s.players.contains_peer(peer));
}

#[test]
fn test_promoted_peer_is_not_swept() {
    let mut s = Sessions::new();
    let start = Instant::now();
    let early = s.connect(1, start);
    let late = s.connect(2, start);
    s.handshake(early, "ada");

    let expired = s
        .pending
        .sweep_expired(start + HANDSHAKE_TIMEOUT + Duration::from_millis(1), HANDSHAKE_TIMEOUT);

    assert_eq!(expired, vec![late]);
}

#[test]
fn test_ids_stay_unique_across_churn() {
    let mut s = Sessions::new();
    let now = Instant::now();
    let mut seen = Vec::new();

    for round in 0..5u64 {
        let a = s.connect(round * 2, now);
        let b = s.connect(round * 2 + 1, now);
        seen.push(s.handshake(a, "a"));
        seen.push(s.handshake(b, "b"));
        s.leave(a);
    }

    let mut deduped = seen.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), seen.len());

    let active: Vec<PlayerId> = s.players.iter().map(|p| p.id()).collect();
    assert_eq!(active.len(), 5);
}

#[test]
fn test_spectator_released_when_target_leaves() {
    let mut s = Sessions::new();
    let now = Instant::now();
    let bob_peer = s.connect(1, now);
    let ada_peer = s.connect(2, now);
    let bob = s.handshake(bob_peer, "bob");
    s.handshake(ada_peer, "ada");
    s.players.get_mut(ada_peer).unwrap().spectate(bob).unwrap();

    s.leave(bob_peer);

    let ada = s.players.get(ada_peer).unwrap();
    assert!(!ada.is_spectating());
    assert_eq!(ada.spectate_target(), None);
}

#[test]
fn test_leave_is_idempotent() {
    let mut s = Sessions::new();
    let peer = s.connect(1, Instant::now());
    s.handshake(peer, "ada");

    s.leave(peer);
    s.leave(peer);

    assert!(s.players.is_empty());
    assert!(s.pending.is_empty());
}
