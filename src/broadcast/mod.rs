use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::events::MatchEvent;

// Events a subscriber can fall behind before the channel starts dropping
// the oldest ones. A lagged viewer reconciles by refetching match detail.
const ROOM_CAPACITY: usize = 64;

/// Per-match fan-out registry. One room per match id; rooms are created
/// lazily on first subscription and never destroyed. Delivery is
/// at-most-once to the subscribers connected at publish time.
pub struct MatchBroadcaster {
    rooms: Mutex<HashMap<Uuid, broadcast::Sender<MatchEvent>>>,
}

impl MatchBroadcaster {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self, match_id: Uuid) -> broadcast::Receiver<MatchEvent> {
        let mut rooms = self.rooms.lock().expect("broadcast registry poisoned");
        rooms
            .entry(match_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Push an event to everyone currently in the room. Returns the number
    /// of subscribers it reached; publishing into an empty or non-existent
    /// room drops the event.
    pub fn publish(&self, match_id: Uuid, event: MatchEvent) -> usize {
        let rooms = self.rooms.lock().expect("broadcast registry poisoned");
        let delivered = match rooms.get(&match_id) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        };

        tracing::debug!(
            "Broadcast to match room {} reached {} subscribers",
            match_id,
            delivered
        );
        delivered
    }

    pub fn subscriber_count(&self, match_id: Uuid) -> usize {
        let rooms = self.rooms.lock().expect("broadcast registry poisoned");
        rooms
            .get(&match_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for MatchBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_current_subscribers_only() {
        let broadcaster = MatchBroadcaster::new();
        let room = Uuid::new_v4();
        let other_room = Uuid::new_v4();

        let mut rx = broadcaster.subscribe(room);
        let mut other_rx = broadcaster.subscribe(other_room);

        let delivered = broadcaster.publish(
            room,
            MatchEvent::QuarterChanged {
                match_id: room,
                quarter: 2,
            },
        );
        assert_eq!(delivered, 1);

        let event = rx.try_recv().expect("subscriber should receive the event");
        assert_eq!(
            event,
            MatchEvent::QuarterChanged {
                match_id: room,
                quarter: 2
            }
        );

        // Room isolation: the other subscriber sees nothing
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_without_room_drops_the_event() {
        let broadcaster = MatchBroadcaster::new();
        let delivered = broadcaster.publish(
            Uuid::new_v4(),
            MatchEvent::GameCanceled {
                match_id: Uuid::new_v4(),
            },
        );
        assert_eq!(delivered, 0);
    }
}
