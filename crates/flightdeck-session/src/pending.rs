//! Connections that have not finished the handshake yet.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use flightdeck_transport::PeerId;

/// How long a connection may stay pending before it is dropped.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// A transport-level connection waiting for its handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingConnection {
    pub peer: PeerId,
    pub joined_at: Instant,
}

impl PendingConnection {
    /// Time spent pending as of `now`. Zero if `now` is before the join.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.joined_at)
    }
}

/// Tracks pending connections and finds the ones that waited too long.
///
/// Pending sets are small and short-lived, so sweeping is a plain linear
/// scan once per tick.
#[derive(Debug, Default)]
pub struct PendingConnections {
    connections: HashMap<PeerId, PendingConnection>,
}

impl PendingConnections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `peer`, joined at `now`. Re-adding a peer restarts
    /// its clock.
    pub fn add(&mut self, peer: PeerId, now: Instant) {
        self.connections.insert(
            peer,
            PendingConnection {
                peer,
                joined_at: now,
            },
        );
        tracing::debug!(%peer, pending = self.connections.len(), "connection pending");
    }

    /// Stops tracking `peer`. Returns `false` if it was not tracked, which
    /// is not an error: removal is idempotent.
    pub fn remove(&mut self, peer: PeerId) -> bool {
        self.connections.remove(&peer).is_some()
    }

    pub fn contains(&self, peer: PeerId) -> bool {
        self.connections.contains_key(&peer)
    }

    pub fn get(&self, peer: PeerId) -> Option<&PendingConnection> {
        self.connections.get(&peer)
    }

    /// Peers whose age is at least `timeout` as of `now`.
    ///
    /// Returns a snapshot; nothing is removed. The caller disconnects each
    /// returned peer, which removes it.
    pub fn sweep_expired(&self, now: Instant, timeout: Duration) -> Vec<PeerId> {
        let mut expired: Vec<PeerId> = self
            .connections
            .values()
            .filter(|conn| conn.age(now) >= timeout)
            .map(|conn| conn.peer)
            .collect();
        // Stable order keeps logs and tests deterministic.
        expired.sort_unstable();
        expired
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: u64) -> PeerId {
        PeerId::new(id)
    }

    #[test]
    fn test_add_then_contains() {
        let mut pending = PendingConnections::new();
        let now = Instant::now();

        pending.add(peer(1), now);

        assert!(pending.contains(peer(1)));
        assert_eq!(pending.get(peer(1)).unwrap().joined_at, now);
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut pending = PendingConnections::new();
        pending.add(peer(1), Instant::now());

        assert!(pending.remove(peer(1)));
        assert!(!pending.remove(peer(1)));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_remove_unknown_peer_is_noop() {
        let mut pending = PendingConnections::new();
        assert!(!pending.remove(peer(5)));
    }

    #[test]
    fn test_sweep_expired_returns_only_old_connections() {
        let mut pending = PendingConnections::new();
        let start = Instant::now();
        pending.add(peer(1), start);
        pending.add(peer(2), start + Duration::from_secs(3));

        let expired = pending.sweep_expired(start + HANDSHAKE_TIMEOUT, HANDSHAKE_TIMEOUT);

        assert_eq!(expired, vec![peer(1)]);
    }

    #[test]
    fn test_sweep_expired_age_equal_to_timeout_counts() {
        let mut pending = PendingConnections::new();
        let start = Instant::now();
        pending.add(peer(1), start);

        let just_before = start + HANDSHAKE_TIMEOUT - Duration::from_millis(1);
        assert!(pending.sweep_expired(just_before, HANDSHAKE_TIMEOUT).is_empty());
        assert_eq!(
            pending.sweep_expired(start + HANDSHAKE_TIMEOUT, HANDSHAKE_TIMEOUT),
            vec![peer(1)]
        );
    }

    #[test]
    fn test_sweep_expired_does_not_remove() {
        let mut pending = PendingConnections::new();
        let start = Instant::now();
        pending.add(peer(1), start);

        let _ = pending.sweep_expired(start + Duration::from_secs(60), HANDSHAKE_TIMEOUT);

        assert!(pending.contains(peer(1)));
    }

    #[test]
    fn test_age_saturates_for_earlier_now() {
        let start = Instant::now();
        let conn = PendingConnection {
            peer: peer(1),
            joined_at: start + Duration::from_secs(1),
        };
        assert_eq!(conn.age(start), Duration::ZERO);
    }
}
