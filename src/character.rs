//! Character records shared by every stage of the tick pipeline.
//!
//! A [`Character`] owns its position, its [`Motion`] state and its
//! [`LifeState`]. Visibility and collision participation are never stored;
//! they are derived from the life state so the two can never disagree.
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::geometry::Aabb;

/// Stable identifier for a character within one arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterId(pub u32);

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who drives the character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Driven by external input.
    Player,
    /// Driven by a planner.
    Npc,
}

/// Lifecycle state of a character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifeState {
    /// Playing and killable.
    #[default]
    AliveUnprotected,
    /// Recently respawned: visible and colliding with the world, but
    /// ignored by other characters.
    AliveProtected,
    /// Waiting to respawn: invisible and non-colliding.
    Despawned,
}

impl LifeState {
    /// True for either alive state.
    #[must_use]
    pub const fn is_alive(self) -> bool {
        !matches!(self, Self::Despawned)
    }

    /// Rendered by presentation layers.
    #[must_use]
    pub const fn is_visible(self) -> bool {
        self.is_alive()
    }

    /// Collides with level geometry.
    #[must_use]
    pub const fn collides_with_world(self) -> bool {
        self.is_alive()
    }

    /// Takes part in character-to-character contacts.
    #[must_use]
    pub const fn collides_with_characters(self) -> bool {
        matches!(self, Self::AliveUnprotected)
    }
}

/// Speed modifier selecting the effective maximum speed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedModifier {
    #[default]
    /// Standard speed.
    Normal,
    /// Faster walking and higher jumps.
    Turbo,
    /// Reduced top speed.
    Slowdown,
}

/// Surface kind last stood on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Surface {
    #[default]
    /// Ordinary floor.
    Normal,
    /// Slippery floor: slow to speed up and to stop.
    Ice,
}

/// Motion state owned by the kinematics integrator and the collision
/// resolver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    /// Velocity in pixels per second; positive `y` is downward.
    pub velocity: Vec2,
    /// Standing on something as of the last collision pass.
    pub grounded: bool,
    /// Standing on a one-way platform.
    pub on_one_way: bool,
    /// Surface of the last floor touched.
    pub surface: Surface,
    /// Active speed modifier.
    pub speed_modifier: SpeedModifier,
    /// Remaining grace time for jumping after leaving the ground.
    pub coyote_timer: f32,
    /// Remaining time a buffered jump press stays valid.
    pub jump_buffer_timer: f32,
    /// Remaining time one-way platforms are ignored.
    pub drop_through_timer: f32,
}

impl Motion {
    /// At rest on the ground with the given modifier.
    #[must_use]
    pub fn grounded(speed_modifier: SpeedModifier) -> Self {
        Self {
            grounded: true,
            speed_modifier,
            ..Self::default()
        }
    }

    /// Airborne with the given velocity.
    #[must_use]
    pub fn airborne(velocity: Vec2) -> Self {
        Self {
            velocity,
            ..Self::default()
        }
    }
}

/// One simulated body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Stable identifier.
    pub id: CharacterId,
    /// Who drives the character.
    pub role: Role,
    /// Centre of the hitbox.
    pub position: Vec2,
    /// Kinematic state.
    pub motion: Motion,
    /// Where the character is in its lifecycle.
    pub life: LifeState,
    /// Remaining spawn protection while [`LifeState::AliveProtected`].
    pub protection_timer: f32,
    /// Remaining wait while [`LifeState::Despawned`]. Goes slightly negative
    /// on the tick it elapses; the overshoot is carried into protection.
    pub respawn_timer: f32,
    /// Eliminations scored.
    pub kills: u32,
}

impl Character {
    /// A fresh, unprotected character at rest.
    #[must_use]
    pub fn new(id: CharacterId, role: Role, position: Vec2) -> Self {
        Self {
            id,
            role,
            position,
            motion: Motion::default(),
            life: LifeState::AliveUnprotected,
            protection_timer: 0.0,
            respawn_timer: 0.0,
            kills: 0,
        }
    }

    /// Hitbox for the given half extents.
    #[must_use]
    pub fn hitbox(&self, half_extents: Vec2) -> Aabb {
        Aabb::from_center(self.position, half_extents)
    }

    /// Bottom-centre point of the hitbox.
    #[must_use]
    pub fn feet(&self, half_extents: Vec2) -> Vec2 {
        Vec2::new(self.position.x, self.position.y + half_extents.y)
    }

    /// True unless despawned.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.life.is_alive()
    }

    /// True for planner-driven characters.
    #[must_use]
    pub const fn is_npc(&self) -> bool {
        matches!(self.role, Role::Npc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::unprotected(LifeState::AliveUnprotected, true, true, true)]
    #[case::protected(LifeState::AliveProtected, true, true, false)]
    #[case::despawned(LifeState::Despawned, false, false, false)]
    fn collision_flags_follow_life_state(
        #[case] life: LifeState,
        #[case] visible: bool,
        #[case] world: bool,
        #[case] characters: bool,
    ) {
        assert_eq!(life.is_visible(), visible);
        assert_eq!(life.collides_with_world(), world);
        assert_eq!(life.collides_with_characters(), characters);
    }

    #[rstest]
    fn feet_sit_on_hitbox_bottom() {
        let c = Character::new(CharacterId(1), Role::Npc, Vec2::new(10.0, 20.0));
        let half = Vec2::new(5.0, 7.0);
        assert_eq!(c.feet(half), Vec2::new(10.0, 27.0));
        assert_eq!(c.hitbox(half).max.y, 27.0);
    }
}
