//! Periodic movement broadcast.

use std::time::{Duration, Instant};

use flightdeck_protocol::{Codec, ServerMessage};
use flightdeck_transport::Transport;

use crate::SessionServer;

/// Decides when the next movement broadcast is due.
///
/// The first check is always due. After that a broadcast is due once
/// `interval` has passed since the last one that was actually sent.
#[derive(Debug, Clone)]
pub struct BroadcastScheduler {
    interval: Duration,
    last: Option<Instant>,
}

impl BroadcastScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn due(&self, now: Instant) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Records a broadcast sent at `now`.
    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }
}

impl<T: Transport, C: Codec> SessionServer<T, C> {
    /// Sends every in-game player's latest movement to every active player,
    /// spectators included. Spectators' own movement is left out.
    pub(crate) fn broadcast_movement(&mut self) {
        let movements = self.players.movements();
        let recipients = self.players.peers();
        tracing::trace!(
            players = movements.len(),
            recipients = recipients.len(),
            "movement broadcast"
        );
        if let Err(e) = self.send_to_many(&recipients, &ServerMessage::MoveData(movements)) {
            tracing::error!(error = %e, "failed to encode movement broadcast");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_check_is_due() {
        let scheduler = BroadcastScheduler::new(Duration::from_millis(33));
        assert!(scheduler.due(Instant::now()));
    }

    #[test]
    fn test_due_after_interval_only() {
        let start = Instant::now();
        let mut scheduler = BroadcastScheduler::new(Duration::from_millis(33));
        scheduler.mark(start);

        assert!(!scheduler.due(start + Duration::from_millis(32)));
        assert!(scheduler.due(start + Duration::from_millis(33)));
    }

    #[test]
    fn test_unmarked_check_does_not_reset() {
        let start = Instant::now();
        let mut scheduler = BroadcastScheduler::new(Duration::from_millis(10));
        scheduler.mark(start);

        let later = start + Duration::from_millis(50);
        assert!(scheduler.due(later));
        assert!(scheduler.due(later));
    }
}
