//! Lifecycle state machine.
//!
//! ```text
//! AliveUnprotected --killed--> Despawned --respawn delay--> AliveProtected
//!        ^                                                      |
//!        +--------------------protection elapsed----------------+
//! ```
//!
//! Timers are advanced before the tick's eliminations are applied, so a
//! character despawned this tick starts its full respawn delay next tick.
use glam::Vec2;
use log::warn;

use crate::character::{Character, LifeState, Motion};
use crate::config::LifecycleConfig;
use crate::constants::{CHARACTER_HALF_HEIGHT, CHARACTER_HALF_WIDTH, TIMER_EPSILON};
use crate::geometry::Aabb;
use crate::level::TileMap;

/// Chooses where a despawned character comes back.
#[cfg_attr(test, mockall::automock)]
pub trait SpawnProvider {
    /// Centre position for `character`, given the whole roster.
    fn spawn_position_for(&mut self, character: &Character, roster: &[Character]) -> Vec2;
}

/// Spawn provider backed by level spawn markers.
///
/// Points whose hitbox would overlap a living character are skipped. Among
/// the free points it picks the one farthest from every other living
/// character; ties go to the earliest marker in level order. When every
/// marker is taken the fallback is used if it is free, otherwise the
/// farthest marker.
#[derive(Clone, Debug)]
pub struct SpawnPoints {
    points: Vec<Vec2>,
    fallback: Vec2,
    half_extents: Vec2,
    warned: bool,
}

impl SpawnPoints {
    /// Spawn points given as hitbox centres, for default-sized characters.
    #[must_use]
    pub const fn new(points: Vec<Vec2>, fallback: Vec2) -> Self {
        Self {
            points,
            fallback,
            half_extents: Vec2::new(CHARACTER_HALF_WIDTH, CHARACTER_HALF_HEIGHT),
            warned: false,
        }
    }

    /// Sets the hitbox used for the occupancy check.
    #[must_use]
    pub const fn with_half_extents(mut self, half_extents: Vec2) -> Self {
        self.half_extents = half_extents;
        self
    }

    /// Uses the level's `S` markers, converted from feet to centre positions.
    #[must_use]
    pub fn from_level(map: &TileMap, half_extents: Vec2) -> Self {
        let to_centre = |feet: &Vec2| Vec2::new(feet.x, feet.y - half_extents.y);
        let points = map.spawn_points().iter().map(to_centre).collect();
        let fallback = map
            .player_spawns()
            .first()
            .map_or_else(|| map.bounds().center(), to_centre);
        Self::new(points, fallback).with_half_extents(half_extents)
    }

    /// Candidate centres in level order.
    #[must_use]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }
}

/// Living characters other than `character`.
fn others<'a>(character: &'a Character, roster: &'a [Character]) -> impl Iterator<Item = &'a Character> {
    roster
        .iter()
        .filter(move |other| other.id != character.id && other.is_alive())
}

impl SpawnProvider for SpawnPoints {
    fn spawn_position_for(&mut self, character: &Character, roster: &[Character]) -> Vec2 {
        if self.points.is_empty() {
            if !self.warned {
                warn!("no spawn points in level; respawning at {}", self.fallback);
                self.warned = true;
            }
            return self.fallback;
        }
        let half = self.half_extents;
        let occupied = |point: Vec2| {
            let body = Aabb::from_center(point, half);
            others(character, roster).any(|other| body.penetration(&other.hitbox(half)).is_some())
        };
        let clearance = |point: Vec2| {
            others(character, roster)
                .map(|other| other.position.distance_squared(point))
                .fold(f32::INFINITY, f32::min)
        };
        let farthest = |free_only: bool| {
            let mut best = None;
            let mut best_clearance = f32::NEG_INFINITY;
            for &point in &self.points {
                if free_only && occupied(point) {
                    continue;
                }
                let score = clearance(point);
                if score > best_clearance {
                    best = Some(point);
                    best_clearance = score;
                }
            }
            best
        };
        if let Some(point) = farthest(true) {
            return point;
        }
        if !occupied(self.fallback) {
            warn!("every spawn point is occupied; respawning at {}", self.fallback);
            return self.fallback;
        }
        let point = farthest(false).unwrap_or(self.fallback);
        warn!("every spawn point is occupied; respawning on top of a character at {point}");
        point
    }
}

/// A short-lived visual left where a character died.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeathMarker {
    /// Where the character died.
    pub position: Vec2,
    /// Velocity at death; the marker keeps falling.
    pub velocity: Vec2,
    /// Seconds until the marker disappears.
    pub remaining: f32,
}

/// Timer-driven transition reported by [`advance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The respawn delay elapsed; the caller must pick a position and call
    /// [`respawn`].
    RespawnDue,
    /// Spawn protection ended.
    ProtectionEnded,
}

/// Advances the character's lifecycle timers by `dt`.
pub fn advance(character: &mut Character, dt: f32) -> Option<Transition> {
    match character.life {
        LifeState::AliveUnprotected => None,
        LifeState::Despawned => {
            character.respawn_timer -= dt;
            (character.respawn_timer <= TIMER_EPSILON).then_some(Transition::RespawnDue)
        }
        LifeState::AliveProtected => {
            character.protection_timer -= dt;
            if character.protection_timer <= TIMER_EPSILON {
                character.protection_timer = 0.0;
                character.life = LifeState::AliveUnprotected;
                Some(Transition::ProtectionEnded)
            } else {
                None
            }
        }
    }
}

/// Removes a living character from play and records where it died.
///
/// Returns `false` without changes if the character was already despawned.
pub fn despawn(
    character: &mut Character,
    config: &LifecycleConfig,
    markers: &mut Vec<DeathMarker>,
) -> bool {
    if !character.is_alive() {
        return false;
    }
    markers.push(DeathMarker {
        position: character.position,
        velocity: character.motion.velocity,
        remaining: config.death_marker_lifetime,
    });
    character.life = LifeState::Despawned;
    character.respawn_timer = config.respawn_delay;
    character.protection_timer = 0.0;
    character.motion = Motion {
        speed_modifier: character.motion.speed_modifier,
        ..Motion::default()
    };
    true
}

/// Brings a despawned character back at `position` with spawn protection.
///
/// Any overshoot of the respawn timer is carried into the protection timer
/// so the whole cycle stays aligned to the configured durations.
pub fn respawn(character: &mut Character, position: Vec2, config: &LifecycleConfig) {
    let overshoot = character.respawn_timer.min(0.0);
    character.position = position;
    character.respawn_timer = 0.0;
    character.motion = Motion {
        speed_modifier: character.motion.speed_modifier,
        ..Motion::default()
    };
    character.protection_timer = config.protection_duration + overshoot;
    character.life = if character.protection_timer > TIMER_EPSILON {
        LifeState::AliveProtected
    } else {
        character.protection_timer = 0.0;
        LifeState::AliveUnprotected
    };
}

/// Moves death markers ballistically and drops the expired ones.
pub fn advance_markers(markers: &mut Vec<DeathMarker>, dt: f32, gravity: f32, terminal: f32) {
    for marker in markers.iter_mut() {
        marker.velocity.y = (marker.velocity.y + gravity * dt).min(terminal);
        marker.position += marker.velocity * dt;
        marker.remaining -= dt;
    }
    markers.retain(|m| m.remaining > TIMER_EPSILON);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{CharacterId, Role};
    use rstest::{fixture, rstest};

    const DT: f32 = 1.0 / 60.0;

    #[fixture]
    fn config() -> LifecycleConfig {
        LifecycleConfig::default()
    }

    fn character(id: u32, x: f32) -> Character {
        Character::new(CharacterId(id), Role::Npc, Vec2::new(x, 0.0))
    }

    #[rstest]
    fn full_cycle_lands_on_exact_tick(config: LifecycleConfig) {
        let mut c = character(1, 0.0);
        let mut markers = Vec::new();
        assert!(despawn(&mut c, &config, &mut markers));
        assert_eq!(markers.len(), 1);

        let mut respawn_tick = None;
        let mut unprotected_tick = None;
        for tick in 1..=200_u32 {
            match advance(&mut c, DT) {
                Some(Transition::RespawnDue) => {
                    respawn(&mut c, Vec2::new(50.0, 0.0), &config);
                    respawn_tick = Some(tick);
                }
                Some(Transition::ProtectionEnded) => unprotected_tick = Some(tick),
                None => {}
            }
        }
        assert_eq!(respawn_tick, Some(120));
        assert_eq!(unprotected_tick, Some(180));
        assert_eq!(c.life, LifeState::AliveUnprotected);
        assert_eq!(c.position, Vec2::new(50.0, 0.0));
    }

    #[rstest]
    fn despawning_twice_is_a_no_op(config: LifecycleConfig) {
        let mut c = character(1, 0.0);
        let mut markers = Vec::new();
        assert!(despawn(&mut c, &config, &mut markers));
        assert!(!despawn(&mut c, &config, &mut markers));
        assert_eq!(markers.len(), 1);
    }

    #[rstest]
    fn zero_protection_skips_protected_state() {
        let config = LifecycleConfig {
            protection_duration: 0.0,
            ..LifecycleConfig::default()
        };
        let mut c = character(1, 0.0);
        c.life = LifeState::Despawned;
        respawn(&mut c, Vec2::ZERO, &config);
        assert_eq!(c.life, LifeState::AliveUnprotected);
    }

    #[rstest]
    fn spawn_point_farthest_from_living_characters() {
        let mut points = SpawnPoints::new(
            vec![Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0), Vec2::new(200.0, 0.0)],
            Vec2::ZERO,
        );
        let roster = vec![character(1, 10.0), character(2, 190.0), character(3, 100.0)];
        let mut dead = character(3, 100.0);
        dead.life = LifeState::Despawned;
        // Character 3 is the one respawning and must not repel itself.
        let chosen = points.spawn_position_for(&dead, &roster);
        assert_eq!(chosen, Vec2::new(100.0, 0.0));
    }

    #[rstest]
    fn occupied_point_is_skipped_even_when_farther() {
        let mut points = SpawnPoints::new(vec![Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0)], Vec2::ZERO);
        // Overlaps the first point vertically; only touches the second.
        let mut roster = vec![character(1, 0.0), character(2, 111.0)];
        roster[0].position.y = 13.0;
        let dead = character(3, 500.0);
        assert_eq!(points.spawn_position_for(&dead, &roster), Vec2::new(100.0, 0.0));
    }

    #[rstest]
    #[case(LifeState::AliveProtected)]
    #[case(LifeState::AliveUnprotected)]
    fn taken_point_defers_to_free_fallback(#[case] life: LifeState) {
        let point = Vec2::new(100.0, 50.0);
        let mut points = SpawnPoints::new(vec![point], Vec2::ZERO);
        let mut camper = Character::new(CharacterId(1), Role::Player, point);
        camper.life = life;
        let chosen = points.spawn_position_for(&character(2, 0.0), &[camper]);
        assert_ne!(chosen, point);
        assert_eq!(chosen, Vec2::ZERO);
    }

    #[rstest]
    fn despawned_characters_do_not_occupy_points() {
        let point = Vec2::new(100.0, 50.0);
        let mut points = SpawnPoints::new(vec![point], Vec2::ZERO);
        let mut ghost = Character::new(CharacterId(1), Role::Npc, point);
        ghost.life = LifeState::Despawned;
        assert_eq!(points.spawn_position_for(&character(2, 0.0), &[ghost]), point);
    }

    #[rstest]
    fn everything_taken_picks_the_farthest_point() {
        let mut points = SpawnPoints::new(vec![Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0)], Vec2::ZERO);
        let mut roster = vec![character(1, 0.0), character(2, 100.0)];
        roster[1].position.y = 3.0;
        let chosen = points.spawn_position_for(&character(3, 500.0), &roster);
        assert_eq!(chosen, Vec2::new(100.0, 0.0));
    }

    #[rstest]
    fn no_spawn_points_uses_fallback() {
        let mut points = SpawnPoints::new(Vec::new(), Vec2::new(7.0, 9.0));
        let c = character(1, 0.0);
        assert_eq!(points.spawn_position_for(&c, &[]), Vec2::new(7.0, 9.0));
    }

    #[rstest]
    fn markers_fall_and_expire() {
        let mut markers = vec![DeathMarker {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            remaining: 0.05,
        }];
        advance_markers(&mut markers, DT, 1000.0, 600.0);
        assert!(markers[0].position.y > 0.0);
        advance_markers(&mut markers, DT, 1000.0, 600.0);
        advance_markers(&mut markers, DT, 1000.0, 600.0);
        assert!(markers.is_empty());
    }
}
