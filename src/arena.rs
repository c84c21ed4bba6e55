//! The arena: roster ownership and the fixed-timestep tick pipeline.
//!
//! Every tick runs the same stages in the same order:
//!
//! 1. gather input (player intent or the NPC's planner),
//! 2. integrate velocities,
//! 3. snapshot pre-resolution velocities,
//! 4. move bodies against the tile map,
//! 5. separate overlapping characters and collect contacts,
//! 6. wrap bodies that left the play area,
//! 7. classify contacts into eliminations,
//! 8. advance lifecycle timers and respawn,
//! 9. apply this tick's eliminations,
//! 10. advance death markers.
//!
//! Nothing inside a tick fails; degenerate situations fall back to safe
//! defaults and are logged.
use glam::Vec2;
use hashbrown::{HashMap, HashSet};
use log::{debug, info, warn};

use crate::ai::{targeting::TargetCache, Planner, PlannerContext};
use crate::character::{Character, CharacterId, LifeState, Role, SpeedModifier, Surface};
use crate::collision::{move_against_world, resolve_character_contacts, wrap_position};
use crate::combat::{resolve_eliminations, Elimination, EliminationKind};
use crate::config::SimConfig;
use crate::events::EventSink;
use crate::input::VirtualInput;
use crate::kinematics::integrate;
use crate::level::{TileMap, WorldQuery};
use crate::lifecycle::{self, DeathMarker, SpawnPoints, SpawnProvider, Transition};
use crate::navigation::NavGraph;
use crate::numeric::count_to_f32;

/// What happened during one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Index of the tick that just ran, starting at zero.
    pub tick: u64,
    /// Kills resolved this tick, in resolution order.
    pub eliminations: Vec<Elimination>,
    /// Characters that came back this tick.
    pub respawned: Vec<CharacterId>,
}

/// A scoreboard line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Score {
    /// Character the line belongs to.
    pub id: CharacterId,
    /// Player or NPC.
    pub role: Role,
    /// Eliminations scored so far.
    pub kills: u32,
}

/// A running match.
pub struct Arena {
    config: SimConfig,
    map: TileMap,
    graph: NavGraph,
    characters: Vec<Character>,
    planners: HashMap<CharacterId, Planner>,
    targets: TargetCache,
    markers: Vec<DeathMarker>,
    spawner: Box<dyn SpawnProvider>,
    sinks: Vec<Box<dyn EventSink>>,
    player_input: VirtualInput,
    tick: u64,
    next_id: u32,
}

impl Arena {
    /// Builds the navigation graph for `map` and an empty roster. Respawns
    /// use the level's spawn points until another provider is injected.
    #[must_use]
    pub fn new(config: SimConfig, map: TileMap) -> Self {
        let graph = NavGraph::build(&map, &config.physics, &config.nav);
        if graph.is_empty() {
            warn!("level has no navigation nodes; NPCs will chase directly");
        }
        let spawner = Box::new(SpawnPoints::from_level(&map, config.physics.half_extents));
        info!(
            "arena ready: {}x{} tiles, {} nav nodes",
            map.columns(),
            map.rows(),
            graph.nodes().len()
        );
        Self {
            config,
            map,
            graph,
            characters: Vec::new(),
            planners: HashMap::new(),
            targets: TargetCache::default(),
            markers: Vec::new(),
            spawner,
            sinks: Vec::new(),
            player_input: VirtualInput::IDLE,
            tick: 0,
            next_id: 1,
        }
    }

    /// Replaces the spawn provider.
    #[must_use]
    pub fn with_spawn_provider(mut self, spawner: Box<dyn SpawnProvider>) -> Self {
        self.spawner = spawner;
        self
    }

    /// Registers an observer for kills and respawns.
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Adds a character centred at `position`.
    pub fn spawn(&mut self, role: Role, position: Vec2) -> CharacterId {
        let id = CharacterId(self.next_id);
        self.next_id += 1;
        self.characters.push(Character::new(id, role, position));
        if role == Role::Npc {
            // Stagger planner cadences so NPCs do not all think on one tick.
            let interval = self.config.ai.planner_interval;
            let offset = count_to_f32(self.planners.len()) * self.config.dt();
            let phase = if interval > 0.0 { offset % interval } else { 0.0 };
            self.planners.insert(id, Planner::with_phase(id, phase));
        }
        debug!("spawned {role:?} {id} at {position}");
        id
    }

    /// Places the player on the level's player spawn and `npcs` NPCs on the
    /// spawn points chosen by the spawn provider.
    pub fn populate(&mut self, npcs: usize) -> CharacterId {
        let half = self.config.physics.half_extents;
        let player_position = self.map.player_spawns().first().map_or_else(
            || self.map.bounds().center(),
            |feet| Vec2::new(feet.x, feet.y - half.y),
        );
        let player = self.spawn(Role::Player, player_position);
        for _ in 0..npcs {
            let placeholder = Character::new(CharacterId(self.next_id), Role::Npc, Vec2::ZERO);
            let position = self
                .spawner
                .spawn_position_for(&placeholder, &self.characters);
            self.spawn(Role::Npc, position);
        }
        player
    }

    /// Sets the player's input for the coming ticks. Jump press and release
    /// are edges: they apply to the next tick only.
    pub fn set_player_input(&mut self, input: VirtualInput) {
        self.player_input = input.sanitized();
    }

    /// Changes a character's speed modifier. Returns `false` for unknown ids.
    pub fn set_speed_modifier(&mut self, id: CharacterId, modifier: SpeedModifier) -> bool {
        let Some(character) = self.character_mut(id) else {
            return false;
        };
        character.motion.speed_modifier = modifier;
        true
    }

    /// Configuration the arena was built with.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Level geometry.
    #[must_use]
    pub const fn map(&self) -> &TileMap {
        &self.map
    }

    /// Navigation graph built from the level.
    #[must_use]
    pub const fn graph(&self) -> &NavGraph {
        &self.graph
    }

    /// Every character in spawn order.
    #[must_use]
    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    /// Looks up a character by id.
    #[must_use]
    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Mutable access for scripted setups and tests.
    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.id == id)
    }

    /// An NPC's planner. `None` for the player.
    #[must_use]
    pub fn planner(&self, id: CharacterId) -> Option<&Planner> {
        self.planners.get(&id)
    }

    /// Death markers still in flight.
    #[must_use]
    pub fn markers(&self) -> &[DeathMarker] {
        &self.markers
    }

    /// Number of ticks run so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.tick
    }

    /// Id of the first player character.
    #[must_use]
    pub fn player(&self) -> Option<CharacterId> {
        self.characters
            .iter()
            .find(|c| c.role == Role::Player)
            .map(|c| c.id)
    }

    /// Kill counts, best first. Ties keep roster order.
    #[must_use]
    pub fn scoreboard(&self) -> Vec<Score> {
        let mut scores: Vec<Score> = self
            .characters
            .iter()
            .map(|c| Score {
                id: c.id,
                role: c.role,
                kills: c.kills,
            })
            .collect();
        scores.sort_by(|a, b| b.kills.cmp(&a.kills));
        scores
    }

    /// Runs one fixed-timestep tick.
    pub fn tick(&mut self) -> TickReport {
        let Self {
            config,
            map,
            graph,
            characters,
            planners,
            targets,
            markers,
            spawner,
            sinks,
            player_input,
            tick,
            ..
        } = self;
        let dt = config.dt();
        let half = config.physics.half_extents;

        targets.advance(dt, config.ai.target_refresh_interval, characters);
        let inputs: Vec<VirtualInput> = {
            let ctx = PlannerContext {
                graph,
                roster: characters.as_slice(),
                targets,
                physics: &config.physics,
                ai: &config.ai,
                tile_size: map.tile_size(),
                dt,
            };
            characters
                .iter()
                .map(|c| match c.role {
                    Role::Player => *player_input,
                    Role::Npc => planners
                        .get_mut(&c.id)
                        .map_or(VirtualInput::IDLE, |p| p.update(&ctx)),
                })
                .collect()
        };

        for (character, input) in characters.iter_mut().zip(&inputs) {
            if !character.is_alive() {
                continue;
            }
            let surface = if character.motion.grounded && map.is_surface_ice(character.feet(half)) {
                Surface::Ice
            } else {
                Surface::Normal
            };
            let step = integrate(&character.motion, input, surface, dt, &config.physics);
            character.motion = step.motion;
            character.position.y += step.nudge;
        }

        let pre_velocities: HashMap<CharacterId, Vec2> = characters
            .iter()
            .filter(|c| c.is_alive())
            .map(|c| (c.id, c.motion.velocity))
            .collect();

        for character in characters.iter_mut().filter(|c| c.life.collides_with_world()) {
            let moved = move_against_world(
                map,
                character.position,
                character.motion.velocity,
                half,
                dt,
                config.physics.ground_snap,
                character.motion.drop_through_timer <= 0.0,
            );
            character.position = moved.position;
            character.motion.velocity = moved.velocity;
            character.motion.grounded = moved.grounded;
            character.motion.on_one_way = moved.on_one_way;
        }

        let contacts = resolve_character_contacts(map, characters, &pre_velocities, half);

        let bounds = map.used_platform_bounds();
        for character in characters.iter_mut().filter(|c| c.is_alive()) {
            if let Some(wrapped) =
                wrap_position(character.position, &bounds, config.physics.wrap_inward_offset)
            {
                character.position = wrapped;
            }
        }

        let eligible: HashSet<CharacterId> = characters
            .iter()
            .filter(|c| c.life == LifeState::AliveUnprotected)
            .map(|c| c.id)
            .collect();
        let eliminations = resolve_eliminations(&contacts, &pre_velocities, &eligible, &config.combat);

        let mut due = Vec::new();
        for character in characters.iter_mut() {
            match lifecycle::advance(character, dt) {
                Some(Transition::RespawnDue) => due.push(character.id),
                Some(Transition::ProtectionEnded) => {
                    debug!("{} spawn protection ended", character.id);
                }
                None => {}
            }
        }
        let mut respawned = Vec::with_capacity(due.len());
        for id in due {
            let Some(position) = characters
                .iter()
                .find(|c| c.id == id)
                .map(|c| spawner.spawn_position_for(c, characters))
            else {
                continue;
            };
            let Some(character) = characters.iter_mut().find(|c| c.id == id) else {
                continue;
            };
            lifecycle::respawn(character, position, &config.lifecycle);
            if let Some(planner) = planners.get_mut(&id) {
                planner.reset();
            }
            debug!("{id} respawned at {position}");
            for sink in sinks.iter_mut() {
                sink.character_respawned(id);
            }
            respawned.push(id);
        }

        for elimination in &eliminations {
            let Elimination {
                killer,
                victim,
                kind,
            } = *elimination;
            if let Some(victim_character) = characters.iter_mut().find(|c| c.id == victim) {
                lifecycle::despawn(victim_character, &config.lifecycle, markers);
            }
            if let Some(planner) = planners.get_mut(&victim) {
                planner.reset();
            }
            if let Some(killer_character) = characters.iter_mut().find(|c| c.id == killer) {
                killer_character.kills += 1;
                if kind == EliminationKind::Stomp {
                    killer_character.motion.velocity.y = -config.combat.stomp_bounce_speed;
                    killer_character.motion.grounded = false;
                }
            }
            debug!("{killer} eliminated {victim} by {kind:?}");
            for sink in sinks.iter_mut() {
                sink.character_killed(killer, victim, kind);
            }
        }

        lifecycle::advance_markers(
            markers,
            dt,
            config.physics.gravity,
            config.physics.terminal_velocity,
        );

        player_input.jump_pressed = false;
        player_input.jump_released = false;

        let report = TickReport {
            tick: *tick,
            eliminations,
            respawned,
        };
        *tick += 1;
        report
    }
}
