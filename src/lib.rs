#![cfg_attr(docsrs, feature(doc_cfg))]
//! Simulation core for a 2D platformer arena where characters eliminate
//! each other by stomping.
//!
//! The [`arena::Arena`] owns the roster and runs a fixed-timestep pipeline:
//! AI planning, kinematics, collision, combat and lifecycle. NPCs navigate a
//! precomputed [`navigation::NavGraph`] built from the same physics
//! constants the bodies obey. [`plugin::ArenaPlugin`] drives the arena from
//! a Bevy app.
pub mod ai;
pub mod arena;
pub mod character;
pub mod collision;
pub mod combat;
pub mod config;
pub mod constants;
pub mod events;
pub mod geometry;
pub mod input;
pub mod kinematics;
pub mod level;
pub mod lifecycle;
pub mod logging;
pub mod navigation;
pub mod numeric;
pub mod plugin;

pub use arena::{Arena, Score, TickReport};
pub use character::{Character, CharacterId, LifeState, Role, SpeedModifier, Surface};
pub use config::{ConfigError, SimConfig};
pub use events::{ArenaEvent, ChannelSink, EventLog, EventSink};
pub use input::VirtualInput;
pub use level::{LevelError, Tile, TileMap, WorldQuery};
pub use lifecycle::{SpawnPoints, SpawnProvider};
pub use logging::init as init_logging;
pub use navigation::NavGraph;
pub use plugin::{ArenaPlugin, PlayerIntent};

pub mod prelude {
    //! Common imports for embedding the arena.
    //!
    //! ```rust,no_run
    //! use brawl::prelude::*;
    //! ```

    pub use crate::ai::{Mode, Planner};
    pub use crate::combat::{Elimination, EliminationKind};
    pub use crate::config::{AiConfig, CombatConfig, LifecycleConfig, NavConfig, PhysicsConfig};
    pub use crate::level::DEMO_ARENA;
    pub use crate::plugin::{CharacterKilled, CharacterRespawned};
    pub use crate::{
        Arena, ArenaEvent, Character, CharacterId, EventSink, LifeState, Role, SimConfig,
        SpawnProvider, TickReport, TileMap, VirtualInput,
    };
    pub use glam::Vec2;
}
