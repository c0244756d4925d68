//! Game event hub.
//!
//! Multiplexes lifecycle, level-up, burst and calibration events into a
//! bounded history plus a broadcast stream for live subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::broadcast;

use crate::history::BoundedHistory;

pub mod events;

pub use events::GameEvent;

/// Snapshot of hub state for CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EventSnapshot {
    pub recent: Vec<GameEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based hub retaining a bounded history of game events.
pub struct EventHub {
    tx: broadcast::Sender<GameEvent>,
    history: Mutex<BoundedHistory<GameEvent>>,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl EventHub {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(BoundedHistory::new(history_capacity)),
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: GameEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        log::debug!("[EventHub] {:?}", event);
        if self.lock_history().push(event.clone()).is_some() {
            self.dropped_history.fetch_add(1, Ordering::Relaxed);
        }

        // no subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.tx.subscribe()
    }

    pub fn total_events(&self) -> u64 {
        self.total_events.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> EventSnapshot {
        let history = self.lock_history();
        EventSnapshot {
            recent: history.to_vec(),
            total_events: self.total_events(),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }

    /// History is append-only, so a poisoned guard is still consistent
    fn lock_history(&self) -> MutexGuard<'_, BoundedHistory<GameEvent>> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(id: &str) -> GameEvent {
        GameEvent::Started {
            game_id: id.to_string(),
        }
    }

    #[test]
    fn hub_records_history() {
        let hub = EventHub::new(8, 3);
        hub.publish(started("boat_1"));
        hub.publish(GameEvent::LevelUp {
            game_id: "boat_1".to_string(),
            level: 2,
        });

        let snapshot = hub.snapshot();
        assert_eq!(snapshot.recent.len(), 2);
        assert_eq!(snapshot.total_events, 2);
        assert_eq!(snapshot.dropped_events, 0);
        assert!(matches!(snapshot.recent[1], GameEvent::LevelUp { level: 2, .. }));
    }

    #[test]
    fn hub_drops_history_when_full() {
        let hub = EventHub::new(8, 2);
        hub.publish(started("a"));
        hub.publish(started("b"));
        hub.publish(started("c"));

        let snapshot = hub.snapshot();
        assert_eq!(snapshot.recent.len(), 2);
        assert_eq!(snapshot.dropped_events, 1);
        assert_eq!(snapshot.recent[0], started("b"));
    }

    #[test]
    fn subscribers_receive_events() {
        let hub = EventHub::default();
        let mut rx = hub.subscribe();
        hub.publish(started("balloon_3"));
        assert_eq!(rx.try_recv().unwrap(), started("balloon_3"));
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(GameEvent::Burst {
            game_id: "balloon_1".to_string(),
            score: 40,
        })
        .unwrap();
        assert_eq!(json["type"], "burst");
        assert_eq!(json["payload"]["score"], 40);
    }
}
