use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::{broadcast, mpsc};

use super::events::{RealtimeCommand, RealtimeEvent, Room};

/// Realtime capability injected into each screen
pub trait RealtimeChannel: Send + Sync {
    /// Publish a room command to the socket server
    fn publish(&self, command: RealtimeCommand);

    /// Attach a new event listener. Dropping the receiver detaches it.
    fn listen(&self) -> broadcast::Receiver<RealtimeEvent>;

    /// Number of distinct chat rooms currently joined
    fn joined_chats(&self) -> usize;
}

/// Process-wide channel shared by every screen.
///
/// Room memberships are reference counted: a join is forwarded to the
/// transport only for the first member, a leave only for the last one.
pub struct RealtimeHub {
    events: broadcast::Sender<RealtimeEvent>,
    commands: mpsc::UnboundedSender<RealtimeCommand>,
    rooms: Mutex<HashMap<Room, usize>>,
}

impl RealtimeHub {
    /// Returns the hub and the command queue the transport drains
    pub fn new(capacity: usize) -> (Self, mpsc::UnboundedReceiver<RealtimeCommand>) {
        let (events, _) = broadcast::channel(capacity);
        let (commands, commands_rx) = mpsc::unbounded_channel();

        let hub = Self {
            events,
            commands,
            rooms: Mutex::new(HashMap::new()),
        };
        (hub, commands_rx)
    }

    /// Fan an event out to every attached listener. Returns how many received it.
    pub fn deliver(&self, event: RealtimeEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }

    /// Decode a raw socket frame and deliver it
    pub fn deliver_json(&self, frame: &str) -> Result<usize> {
        let event: RealtimeEvent =
            serde_json::from_str(frame).context("Failed to decode realtime frame")?;
        Ok(self.deliver(event))
    }

    pub fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }

    pub fn members(&self, room: &Room) -> usize {
        self.lock_rooms().get(room).copied().unwrap_or(0)
    }

    fn lock_rooms(&self) -> std::sync::MutexGuard<'_, HashMap<Room, usize>> {
        match self.rooms.lock() {
            Ok(rooms) => rooms,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn forward(&self, command: RealtimeCommand) {
        debug!("Forwarding realtime command {:?}", command);
        if self.commands.send(command).is_err() {
            warn!("Realtime transport is gone, command dropped");
        }
    }
}

impl RealtimeChannel for RealtimeHub {
    fn publish(&self, command: RealtimeCommand) {
        let room = command.room();
        let forward = {
            let mut rooms = self.lock_rooms();
            if command.is_join() {
                let count = rooms.entry(room).or_insert(0);
                *count += 1;
                *count == 1
            } else {
                match rooms.get_mut(&room) {
                    Some(count) if *count > 1 => {
                        *count -= 1;
                        false
                    }
                    Some(_) => {
                        rooms.remove(&room);
                        true
                    }
                    None => {
                        warn!("Leaving {:?} which was never joined", room);
                        false
                    }
                }
            }
        };

        if forward {
            self.forward(command);
        }
    }

    fn listen(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.events.subscribe()
    }

    fn joined_chats(&self) -> usize {
        self.lock_rooms()
            .keys()
            .filter(|room| matches!(room, Room::Chat(_)))
            .count()
    }
}
