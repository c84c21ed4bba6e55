//! Shared fixtures for arena tests.
//!
//! Level grids, an [`ArenaBuilder`] with sensible test defaults, a
//! [`RecordingSink`] whose log stays readable after the arena takes
//! ownership of it, and a [`FixedSpawn`] provider for deterministic
//! respawns.
use std::sync::{Arc, Mutex, PoisonError};

use brawl::character::{Character, CharacterId, Role};
use brawl::combat::EliminationKind;
use brawl::config::SimConfig;
use brawl::events::{ArenaEvent, EventSink};
use brawl::lifecycle::SpawnProvider;
use brawl::{Arena, TickReport, TileMap};
use glam::Vec2;

pub mod levels {
    //! Level grids used across tests. All use 16 px tiles.

    /// One unbroken floor whose top edge is at `y = 96`.
    pub const FLAT: &str = "\
................................
................................
................................
................................
................................
................................
################################
";

    /// Floor plus a one-way ledge whose top edge is at `y = 48`.
    pub const LEDGE: &str = "\
................................
................................
................................
..............=======...........
................................
................................
################################
";

    /// [`FLAT`] with an ice floor.
    pub const ICE: &str = "\
................................
................................
................................
................................
................................
................................
~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
";

    /// Floor and two raised steps, each a single jump above the last.
    pub const STAIRS: &str = "\
........................
........................
................####....
........................
........................
.........#####..........
........................
........................
########################
";
}

/// Tile size of every fixture level.
pub const TILE: f32 = 16.0;

/// Top edge of the floor in [`levels::FLAT`], [`levels::LEDGE`] and
/// [`levels::ICE`].
pub const FLAT_FLOOR_TOP: f32 = 96.0;

/// Top edge of the one-way ledge in [`levels::LEDGE`].
pub const LEDGE_TOP: f32 = 48.0;

/// Centre of a default-sized character standing on a surface at `surface_y`.
pub fn standing_at(x: f32, surface_y: f32) -> Vec2 {
    let half = SimConfig::default().physics.half_extents;
    Vec2::new(x, surface_y - half.y)
}

/// Builds arenas from a fixture level.
#[derive(Clone, Debug)]
pub struct ArenaBuilder {
    config: SimConfig,
    level: &'static str,
}

impl Default for ArenaBuilder {
    fn default() -> Self {
        Self {
            config: SimConfig::default(),
            level: levels::FLAT,
        }
    }
}

impl ArenaBuilder {
    pub fn level(mut self, level: &'static str) -> Self {
        self.level = level;
        self
    }

    pub fn config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    /// # Panics
    /// Panics if the level grid is malformed.
    pub fn build(self) -> Arena {
        let map = TileMap::parse(self.level, TILE).expect("fixture level parses");
        Arena::new(self.config, map)
    }
}

/// Event sink that records into a shared log.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    log: Arc<Mutex<Vec<ArenaEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<ArenaEvent> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Kills recorded so far as `(killer, victim, kind)`.
    pub fn kills(&self) -> Vec<(CharacterId, CharacterId, EliminationKind)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ArenaEvent::Killed {
                    killer,
                    victim,
                    kind,
                } => Some((killer, victim, kind)),
                ArenaEvent::Respawned(_) => None,
            })
            .collect()
    }

    fn push(&self, event: ArenaEvent) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl EventSink for RecordingSink {
    fn character_killed(&mut self, killer: CharacterId, victim: CharacterId, kind: EliminationKind) {
        self.push(ArenaEvent::Killed {
            killer,
            victim,
            kind,
        });
    }

    fn character_respawned(&mut self, character: CharacterId) {
        self.push(ArenaEvent::Respawned(character));
    }
}

/// Spawn provider that always answers the same position.
#[derive(Clone, Copy, Debug)]
pub struct FixedSpawn(pub Vec2);

impl SpawnProvider for FixedSpawn {
    fn spawn_position_for(&mut self, _character: &Character, _roster: &[Character]) -> Vec2 {
        self.0
    }
}

/// Adds an NPC directly above a character at `target`, falling fast enough
/// to land on it next tick.
pub fn drop_npc_onto(arena: &mut Arena, target: Vec2) -> CharacterId {
    let half = arena.config().physics.half_extents;
    let id = arena.spawn(Role::Npc, target - Vec2::new(0.0, 2.0 * half.y + 2.0));
    if let Some(npc) = arena.character_mut(id) {
        npc.motion.velocity.y = 300.0;
    }
    id
}

/// Runs `ticks` ticks and returns every report.
pub fn run_ticks(arena: &mut Arena, ticks: usize) -> Vec<TickReport> {
    (0..ticks).map(|_| arena.tick()).collect()
}
