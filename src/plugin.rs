//! Bevy integration.
//!
//! [`ArenaPlugin`] owns an [`Arena`] as a non-send resource and steps it on
//! `FixedUpdate` at the configured tick rate. The player's input is read
//! from the [`PlayerIntent`] resource. Kills and respawns are re-emitted as
//! observer events so game code can react without polling.
use std::sync::mpsc::{self, Receiver};

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use log::error;
use thiserror::Error;

use crate::arena::Arena;
use crate::character::CharacterId;
use crate::combat::EliminationKind;
use crate::config::SimConfig;
use crate::constants::TILE_SIZE;
use crate::events::{ArenaEvent, ChannelSink};
use crate::input::VirtualInput;
use crate::level::{TileMap, DEMO_ARENA};

/// Input applied to the player on the next fixed tick.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerIntent(pub VirtualInput);

/// Observer event raised when a character is eliminated.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharacterKilled {
    /// Character credited with the kill.
    pub killer: CharacterId,
    /// Character removed from play.
    pub victim: CharacterId,
    /// How the kill happened.
    pub kind: EliminationKind,
}

/// Observer event raised when a character comes back into play.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharacterRespawned {
    /// Character back in play.
    pub character: CharacterId,
}

/// Raised when the plugin cannot build its arena.
#[derive(Event, Debug, Clone, Error)]
#[error("arena setup failed: {detail}")]
pub struct ArenaSetupError {
    /// Why the arena could not be built.
    pub detail: String,
}

/// Non-send resource holding the running match.
pub struct ArenaState {
    arena: Arena,
    events: Receiver<ArenaEvent>,
}

impl ArenaState {
    /// Wraps `arena` and subscribes to its events.
    #[must_use]
    pub fn new(mut arena: Arena) -> Self {
        let (sender, events) = mpsc::channel();
        arena.add_sink(Box::new(ChannelSink::new(sender)));
        Self { arena, events }
    }

    /// The running arena.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Mutable access for scripted setups.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }
}

/// Installs the arena and its fixed-step system.
#[derive(Clone, Debug)]
pub struct ArenaPlugin {
    /// Simulation parameters.
    pub config: SimConfig,
    /// ASCII level grid.
    pub level: String,
    /// Number of NPCs to spawn.
    pub npcs: usize,
}

impl Default for ArenaPlugin {
    fn default() -> Self {
        Self {
            config: SimConfig::default(),
            level: DEMO_ARENA.to_owned(),
            npcs: 3,
        }
    }
}

impl ArenaPlugin {
    fn build_arena(&self) -> Result<Arena, ArenaSetupError> {
        let fail = |detail: String| ArenaSetupError { detail };
        self.config.validate().map_err(|e| fail(e.to_string()))?;
        let map = TileMap::parse(&self.level, TILE_SIZE)
            .map_err(|e| fail(e.to_string()))?;
        let mut arena = Arena::new(self.config.clone(), map);
        arena.populate(self.npcs);
        Ok(arena)
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn log_setup_error(event: On<ArenaSetupError>) {
    error!("{}", event.event());
}

impl Plugin for ArenaPlugin {
    fn build(&self, app: &mut App) {
        app.add_observer(log_setup_error);

        let arena = match self.build_arena() {
            Ok(built) => built,
            Err(err) => {
                app.world_mut().trigger(err);
                return;
            }
        };

        app.init_resource::<PlayerIntent>();
        app.insert_resource(Time::<Fixed>::from_hz(f64::from(self.config.tick_rate)));
        app.world_mut().insert_non_send_resource(ArenaState::new(arena));
        app.add_systems(FixedUpdate, step_arena_system);
    }
}

/// Runs one arena tick and re-emits its events.
///
/// The jump edges in [`PlayerIntent`] are consumed by the tick.
pub fn step_arena_system(world: &mut World) {
    let intent = world.get_resource::<PlayerIntent>().copied().unwrap_or_default();
    let Some(mut state) = world.get_non_send_resource_mut::<ArenaState>() else {
        return;
    };
    state.arena.set_player_input(intent.0);
    state.arena.tick();
    let events: Vec<ArenaEvent> = state.events.try_iter().collect();
    drop(state);

    if let Some(mut pending) = world.get_resource_mut::<PlayerIntent>() {
        pending.0.jump_pressed = false;
        pending.0.jump_released = false;
    }
    for event in events {
        match event {
            ArenaEvent::Killed {
                killer,
                victim,
                kind,
            } => world.trigger(CharacterKilled {
                killer,
                victim,
                kind,
            }),
            ArenaEvent::Respawned(character) => world.trigger(CharacterRespawned { character }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Role;
    use glam::Vec2;
    use rstest::rstest;

    #[derive(Resource, Default, Debug)]
    struct Kills(Vec<CharacterKilled>);

    #[expect(
        clippy::needless_pass_by_value,
        reason = "Observer systems must take On<T> by value."
    )]
    fn record_kill(event: On<CharacterKilled>, mut kills: ResMut<Kills>) {
        kills.0.push(*event.event());
    }

    fn app_with(plugin: ArenaPlugin) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(plugin);
        app
    }

    #[rstest]
    fn plugin_installs_resources() {
        let app = app_with(ArenaPlugin::default());
        assert!(app.world().contains_resource::<PlayerIntent>());
        let state = app
            .world()
            .get_non_send_resource::<ArenaState>()
            .expect("arena state installed");
        assert_eq!(state.arena().characters().len(), 4);
    }

    #[rstest]
    fn broken_level_skips_installation() {
        let app = app_with(ArenaPlugin {
            level: "##\n#".to_owned(),
            ..ArenaPlugin::default()
        });
        assert!(app.world().get_non_send_resource::<ArenaState>().is_none());
    }

    #[rstest]
    fn fixed_step_advances_and_consumes_jump() {
        let mut app = app_with(ArenaPlugin {
            npcs: 0,
            ..ArenaPlugin::default()
        });
        app.insert_resource(PlayerIntent(VirtualInput::moving(1.0).with_jump()));
        app.world_mut().run_schedule(FixedUpdate);
        let intent = app.world().resource::<PlayerIntent>().0;
        assert!(!intent.jump_pressed);
        assert_eq!(intent.move_direction, 1.0);
        let state = app
            .world()
            .get_non_send_resource::<ArenaState>()
            .expect("arena state installed");
        assert_eq!(state.arena().ticks(), 1);
    }

    #[rstest]
    fn kills_become_observer_events() {
        let mut app = app_with(ArenaPlugin {
            npcs: 0,
            ..ArenaPlugin::default()
        });
        app.init_resource::<Kills>();
        app.world_mut().add_observer(record_kill);
        let (player, npc) = {
            let mut state = app
                .world_mut()
                .get_non_send_resource_mut::<ArenaState>()
                .expect("arena state installed");
            let arena = state.arena_mut();
            let player = arena.player().expect("player spawned");
            let at = arena.character(player).map(|c| c.position).expect("player exists");
            let npc = arena.spawn(Role::Npc, at - Vec2::new(0.0, 16.0));
            if let Some(c) = arena.character_mut(npc) {
                c.motion.velocity.y = 300.0;
            }
            (player, npc)
        };
        app.world_mut().run_schedule(FixedUpdate);
        let kills = &app.world().resource::<Kills>().0;
        assert_eq!(
            kills.as_slice(),
            &[CharacterKilled {
                killer: npc,
                victim: player,
                kind: EliminationKind::Stomp,
            }]
        );
    }
}
