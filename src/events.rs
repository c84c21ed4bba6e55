//! Outbound notifications for kills and respawns.
//!
//! The arena reports through [`EventSink`] so scoring, presentation or
//! networking can listen without the simulation knowing about them.
use std::sync::mpsc::Sender;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::character::CharacterId;
use crate::combat::EliminationKind;

/// Event emitted by the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArenaEvent {
    /// A character was eliminated.
    Killed {
        /// Character credited with the kill.
        killer: CharacterId,
        /// Character removed from play.
        victim: CharacterId,
        /// How the kill happened.
        kind: EliminationKind,
    },
    /// A character came back into play.
    Respawned(CharacterId),
}

/// Receives arena notifications.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink {
    /// `killer` eliminated `victim`.
    fn character_killed(&mut self, killer: CharacterId, victim: CharacterId, kind: EliminationKind);

    /// `character` came back into play.
    fn character_respawned(&mut self, _character: CharacterId) {}
}

/// Keeps every event in memory until drained.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<ArenaEvent>,
}

impl EventLog {
    /// Events buffered so far.
    #[must_use]
    pub fn events(&self) -> &[ArenaEvent] {
        &self.events
    }

    /// Takes all buffered events.
    pub fn drain(&mut self) -> Vec<ArenaEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for EventLog {
    fn character_killed(&mut self, killer: CharacterId, victim: CharacterId, kind: EliminationKind) {
        self.events.push(ArenaEvent::Killed {
            killer,
            victim,
            kind,
        });
    }

    fn character_respawned(&mut self, character: CharacterId) {
        self.events.push(ArenaEvent::Respawned(character));
    }
}

/// Forwards events over a channel. A disconnected receiver is not an error;
/// the event is dropped and logged at debug level.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    sender: Sender<ArenaEvent>,
}

impl ChannelSink {
    /// Forwards into `sender`.
    #[must_use]
    pub const fn new(sender: Sender<ArenaEvent>) -> Self {
        Self { sender }
    }

    fn forward(&self, event: ArenaEvent) {
        if self.sender.send(event).is_err() {
            debug!("event receiver gone; dropping {event:?}");
        }
    }
}

impl EventSink for ChannelSink {
    fn character_killed(&mut self, killer: CharacterId, victim: CharacterId, kind: EliminationKind) {
        self.forward(ArenaEvent::Killed {
            killer,
            victim,
            kind,
        });
    }

    fn character_respawned(&mut self, character: CharacterId) {
        self.forward(ArenaEvent::Respawned(character));
    }
}
