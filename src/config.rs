//! Tuning parameters for every simulation stage.
//!
//! [`SimConfig::default`] carries the canonical constant set from
//! [`crate::constants`]. Configs load from JSON with missing fields falling
//! back to those defaults, and are validated before an arena is built.
use std::{fs, path::Path};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::character::{SpeedModifier, Surface};
use crate::constants::{
    ACCELERATION, AIR_FRICTION, AI_ARRIVAL_TOLERANCE, AI_BLOCKED_TIMEOUT, AI_BRAKING_SAFETY,
    AI_ENGAGE_RANGE_X, AI_ENGAGE_RANGE_Y, AI_HOP_RANGE, AI_JUMP_ALIGNMENT_TOLERANCE,
    AI_PLANNER_INTERVAL, AI_PROGRESS_EPSILON, AI_TARGET_REFRESH_INTERVAL, CHARACTER_HALF_HEIGHT,
    CHARACTER_HALF_WIDTH, COYOTE_TIME, DEATH_MARKER_LIFETIME, DROP_THROUGH_NUDGE,
    DROP_THROUGH_TIME, GRAVITY, GROUND_FRICTION, GROUND_SNAP_DISTANCE, ICE_ACCELERATION,
    ICE_FRICTION, JUMP_BUFFER_TIME, JUMP_CUT_SPEED, JUMP_SPEED, NAV_DROP_COST_FACTOR,
    NAV_JUMP_COST_FACTOR, NAV_JUMP_COST_PENALTY, NAV_NODE_SPACING, NAV_REACH_MARGIN,
    PROTECTION_DURATION, RESPAWN_DELAY, SLOWDOWN_SPEED, STOMP_BOUNCE_SPEED,
    STOMP_NORMAL_THRESHOLD, TERMINAL_VELOCITY, TICK_RATE, TURBO_JUMP_SPEED,
    TURBO_JUMP_THRESHOLD, TURBO_SPEED, WALK_SPEED, WRAP_INWARD_OFFSET,
};

/// Errors raised while loading or validating a [`SimConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    /// The config file could not be read.
    Io {
        /// File that failed to open.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    /// The config is not valid JSON.
    Parse(#[from] serde_json::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    /// A value is out of range.
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn ensure_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("expected a positive number, got {value}")))
    }
}

fn ensure_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("expected a non-negative number, got {value}")))
    }
}

/// Parameters for the kinematics integrator and collision resolver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Half extents of every character hitbox.
    pub half_extents: Vec2,
    /// Top speed without a modifier.
    pub walk_speed: f32,
    /// Top speed under turbo.
    pub turbo_speed: f32,
    /// Top speed under slowdown.
    pub slowdown_speed: f32,
    /// Horizontal acceleration on normal floor and in the air.
    pub acceleration: f32,
    /// Horizontal acceleration on ice.
    pub ice_acceleration: f32,
    /// Deceleration on normal floor with no input.
    pub ground_friction: f32,
    /// Deceleration on ice with no input.
    pub ice_friction: f32,
    /// Deceleration in the air with no input.
    pub air_friction: f32,
    /// Downward acceleration.
    pub gravity: f32,
    /// Maximum falling speed.
    pub terminal_velocity: f32,
    /// Launch speed of a normal jump.
    pub jump_speed: f32,
    /// Launch speed of a turbo jump.
    pub turbo_jump_speed: f32,
    /// Horizontal speed at or above which a turbo jump is granted.
    pub turbo_jump_threshold: f32,
    /// Upward speed a released jump is cut down to.
    pub jump_cut_speed: f32,
    /// Jump grace time after leaving the ground.
    pub coyote_time: f32,
    /// How long a jump press is remembered.
    pub jump_buffer_time: f32,
    /// How long one-way platforms are ignored after a drop.
    pub drop_through_time: f32,
    /// Downward shift on the tick a drop starts.
    pub drop_through_nudge: f32,
    /// Distance below the feet searched for a floor.
    pub ground_snap: f32,
    /// Offset inside the opposite edge after wrapping.
    pub wrap_inward_offset: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            half_extents: Vec2::new(CHARACTER_HALF_WIDTH, CHARACTER_HALF_HEIGHT),
            walk_speed: WALK_SPEED,
            turbo_speed: TURBO_SPEED,
            slowdown_speed: SLOWDOWN_SPEED,
            acceleration: ACCELERATION,
            ice_acceleration: ICE_ACCELERATION,
            ground_friction: GROUND_FRICTION,
            ice_friction: ICE_FRICTION,
            air_friction: AIR_FRICTION,
            gravity: GRAVITY,
            terminal_velocity: TERMINAL_VELOCITY,
            jump_speed: JUMP_SPEED,
            turbo_jump_speed: TURBO_JUMP_SPEED,
            turbo_jump_threshold: TURBO_JUMP_THRESHOLD,
            jump_cut_speed: JUMP_CUT_SPEED,
            coyote_time: COYOTE_TIME,
            jump_buffer_time: JUMP_BUFFER_TIME,
            drop_through_time: DROP_THROUGH_TIME,
            drop_through_nudge: DROP_THROUGH_NUDGE,
            ground_snap: GROUND_SNAP_DISTANCE,
            wrap_inward_offset: WRAP_INWARD_OFFSET,
        }
    }
}

impl PhysicsConfig {
    /// Effective horizontal speed cap for a modifier.
    #[must_use]
    pub const fn max_speed(&self, modifier: SpeedModifier) -> f32 {
        match modifier {
            SpeedModifier::Normal => self.walk_speed,
            SpeedModifier::Turbo => self.turbo_speed,
            SpeedModifier::Slowdown => self.slowdown_speed,
        }
    }

    /// Acceleration applied while input is held.
    #[must_use]
    pub const fn acceleration_on(&self, surface: Surface, grounded: bool) -> f32 {
        match (surface, grounded) {
            (Surface::Ice, true) => self.ice_acceleration,
            _ => self.acceleration,
        }
    }

    /// Deceleration applied while no input is held.
    #[must_use]
    pub const fn friction_on(&self, surface: Surface, grounded: bool) -> f32 {
        match (surface, grounded) {
            (_, false) => self.air_friction,
            (Surface::Ice, true) => self.ice_friction,
            (Surface::Normal, true) => self.ground_friction,
        }
    }

    /// Launch speed for a jump taken at horizontal speed `vx`.
    #[must_use]
    pub fn jump_speed_for(&self, vx: f32, modifier: SpeedModifier) -> f32 {
        if modifier == SpeedModifier::Turbo && vx.abs() >= self.turbo_jump_threshold {
            self.turbo_jump_speed
        } else {
            self.jump_speed
        }
    }

    /// Fastest upward speed any rule can produce.
    #[must_use]
    pub fn max_rise_speed(&self) -> f32 {
        self.jump_speed.max(self.turbo_jump_speed)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.half_extents.x > 0.0 && self.half_extents.y > 0.0) {
            return Err(invalid("physics.half_extents", "both extents must be positive"));
        }
        for (field, value) in [
            ("physics.walk_speed", self.walk_speed),
            ("physics.turbo_speed", self.turbo_speed),
            ("physics.slowdown_speed", self.slowdown_speed),
            ("physics.acceleration", self.acceleration),
            ("physics.ice_acceleration", self.ice_acceleration),
            ("physics.ground_friction", self.ground_friction),
            ("physics.ice_friction", self.ice_friction),
            ("physics.air_friction", self.air_friction),
            ("physics.gravity", self.gravity),
            ("physics.terminal_velocity", self.terminal_velocity),
            ("physics.jump_speed", self.jump_speed),
            ("physics.turbo_jump_speed", self.turbo_jump_speed),
        ] {
            ensure_positive(field, value)?;
        }
        for (field, value) in [
            ("physics.turbo_jump_threshold", self.turbo_jump_threshold),
            ("physics.jump_cut_speed", self.jump_cut_speed),
            ("physics.coyote_time", self.coyote_time),
            ("physics.jump_buffer_time", self.jump_buffer_time),
            ("physics.drop_through_time", self.drop_through_time),
            ("physics.drop_through_nudge", self.drop_through_nudge),
            ("physics.ground_snap", self.ground_snap),
            ("physics.wrap_inward_offset", self.wrap_inward_offset),
        ] {
            ensure_non_negative(field, value)?;
        }
        Ok(())
    }
}

/// Parameters for the combat rule engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Minimum alignment of a contact normal with the vertical axis for a stomp or bonk.
    pub stomp_normal_threshold: f32,
    /// Upward speed given to a stomper after a kill. Zero disables the bounce.
    pub stomp_bounce_speed: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            stomp_normal_threshold: STOMP_NORMAL_THRESHOLD,
            stomp_bounce_speed: STOMP_BOUNCE_SPEED,
        }
    }
}

/// Parameters for the lifecycle state machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Time spent despawned.
    pub respawn_delay: f32,
    /// Spawn protection after a respawn.
    pub protection_duration: f32,
    /// Lifetime of a death marker.
    pub death_marker_lifetime: f32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            respawn_delay: RESPAWN_DELAY,
            protection_duration: PROTECTION_DURATION,
            death_marker_lifetime: DEATH_MARKER_LIFETIME,
        }
    }
}

/// Parameters for navigation graph construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Spacing in tiles between nodes on a platform.
    pub node_spacing: u32,
    /// Fraction of the jump envelope the graph trusts.
    pub reach_margin: f32,
    /// Distance multiplier for jump edges.
    pub jump_cost_factor: f32,
    /// Flat cost added to every jump edge.
    pub jump_cost_penalty: f32,
    /// Distance multiplier for drop edges.
    pub drop_cost_factor: f32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            node_spacing: NAV_NODE_SPACING,
            reach_margin: NAV_REACH_MARGIN,
            jump_cost_factor: NAV_JUMP_COST_FACTOR,
            jump_cost_penalty: NAV_JUMP_COST_PENALTY,
            drop_cost_factor: NAV_DROP_COST_FACTOR,
        }
    }
}

/// Parameters for the NPC planner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Time between replans while no path is held.
    pub planner_interval: f32,
    /// Time between target cache refreshes.
    pub target_refresh_interval: f32,
    /// Multiplier on the stopping distance; must exceed 1.
    pub braking_safety: f32,
    /// Distance at which a walk waypoint counts as reached.
    pub arrival_tolerance: f32,
    /// Horizontal slack when lining up a jump or drop.
    pub jump_alignment_tolerance: f32,
    /// Time without progress before a path is abandoned.
    pub blocked_timeout: f32,
    /// Minimum improvement that counts as progress.
    pub progress_epsilon: f32,
    /// Horizontal and vertical reach of the direct-engage override.
    pub engage_range: Vec2,
    /// Horizontal distance inside which a chasing NPC hops.
    pub hop_range: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            planner_interval: AI_PLANNER_INTERVAL,
            target_refresh_interval: AI_TARGET_REFRESH_INTERVAL,
            braking_safety: AI_BRAKING_SAFETY,
            arrival_tolerance: AI_ARRIVAL_TOLERANCE,
            jump_alignment_tolerance: AI_JUMP_ALIGNMENT_TOLERANCE,
            blocked_timeout: AI_BLOCKED_TIMEOUT,
            progress_epsilon: AI_PROGRESS_EPSILON,
            engage_range: Vec2::new(AI_ENGAGE_RANGE_X, AI_ENGAGE_RANGE_Y),
            hop_range: AI_HOP_RANGE,
        }
    }
}

/// Complete simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed ticks per second.
    pub tick_rate: u32,
    /// Kinematics and collision.
    pub physics: PhysicsConfig,
    /// Stomp and bonk rules.
    pub combat: CombatConfig,
    /// Respawn and protection timing.
    pub lifecycle: LifecycleConfig,
    /// Navigation graph construction.
    pub nav: NavConfig,
    /// NPC planner tuning.
    pub ai: AiConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            physics: PhysicsConfig::default(),
            combat: CombatConfig::default(),
            lifecycle: LifecycleConfig::default(),
            nav: NavConfig::default(),
            ai: AiConfig::default(),
        }
    }
}

impl SimConfig {
    /// Fixed step length in seconds.
    #[must_use]
    pub fn dt(&self) -> f32 {
        1.0 / f32::from(u16::try_from(self.tick_rate).unwrap_or(u16::MAX))
    }

    /// Parses and validates a JSON document.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] when a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`SimConfig::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = path.as_ref();
        let text = fs::read_to_string(file).map_err(|source| ConfigError::Io {
            path: file.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Checks that every parameter is inside its valid range.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 || self.tick_rate > u32::from(u16::MAX) {
            return Err(invalid("tick_rate", format!("{} is out of range", self.tick_rate)));
        }
        self.physics.validate()?;

        let threshold = self.combat.stomp_normal_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(invalid(
                "combat.stomp_normal_threshold",
                format!("{threshold} is outside (0, 1]"),
            ));
        }
        ensure_non_negative("combat.stomp_bounce_speed", self.combat.stomp_bounce_speed)?;

        ensure_non_negative("lifecycle.respawn_delay", self.lifecycle.respawn_delay)?;
        ensure_non_negative("lifecycle.protection_duration", self.lifecycle.protection_duration)?;
        ensure_non_negative(
            "lifecycle.death_marker_lifetime",
            self.lifecycle.death_marker_lifetime,
        )?;

        if self.nav.node_spacing == 0 {
            return Err(invalid("nav.node_spacing", "must be at least one tile"));
        }
        let margin = self.nav.reach_margin;
        if !(margin > 0.0 && margin <= 1.0) {
            return Err(invalid("nav.reach_margin", format!("{margin} is outside (0, 1]")));
        }
        ensure_positive("nav.jump_cost_factor", self.nav.jump_cost_factor)?;
        ensure_non_negative("nav.jump_cost_penalty", self.nav.jump_cost_penalty)?;
        ensure_positive("nav.drop_cost_factor", self.nav.drop_cost_factor)?;

        ensure_positive("ai.planner_interval", self.ai.planner_interval)?;
        ensure_positive("ai.target_refresh_interval", self.ai.target_refresh_interval)?;
        if !(self.ai.braking_safety > 1.0 && self.ai.braking_safety.is_finite()) {
            return Err(invalid(
                "ai.braking_safety",
                format!("{} must be greater than 1", self.ai.braking_safety),
            ));
        }
        ensure_positive("ai.arrival_tolerance", self.ai.arrival_tolerance)?;
        ensure_positive("ai.jump_alignment_tolerance", self.ai.jump_alignment_tolerance)?;
        ensure_positive("ai.blocked_timeout", self.ai.blocked_timeout)?;
        ensure_non_negative("ai.progress_epsilon", self.ai.progress_epsilon)?;
        ensure_non_negative("ai.engage_range.x", self.ai.engage_range.x)?;
        ensure_non_negative("ai.engage_range.y", self.ai.engage_range.y)?;
        ensure_non_negative("ai.hop_range", self.ai.hop_range)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    fn defaults_validate() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.dt(), 1.0 / 60.0);
    }

    #[rstest]
    fn partial_json_falls_back_to_defaults() {
        let config = SimConfig::from_json_str(r#"{ "physics": { "gravity": 900.0 } }"#)
            .expect("partial config should parse");
        assert_relative_eq!(config.physics.gravity, 900.0);
        assert_relative_eq!(config.physics.jump_speed, JUMP_SPEED);
        assert_eq!(config.tick_rate, TICK_RATE);
    }

    #[rstest]
    #[case::zero_rate(r#"{ "tick_rate": 0 }"#, "tick_rate")]
    #[case::braking(r#"{ "ai": { "braking_safety": 1.0 } }"#, "ai.braking_safety")]
    #[case::threshold(r#"{ "combat": { "stomp_normal_threshold": 1.5 } }"#, "combat.stomp_normal_threshold")]
    #[case::gravity(r#"{ "physics": { "gravity": -1.0 } }"#, "physics.gravity")]
    #[case::spacing(r#"{ "nav": { "node_spacing": 0 } }"#, "nav.node_spacing")]
    fn rejects_out_of_range_values(#[case] json: &str, #[case] expected_field: &str) {
        match SimConfig::from_json_str(json) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected invalid {expected_field}, got {other:?}"),
        }
    }

    #[rstest]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            SimConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[rstest]
    #[case(SpeedModifier::Normal, 0.0, JUMP_SPEED)]
    #[case(SpeedModifier::Turbo, 100.0, JUMP_SPEED)]
    #[case(SpeedModifier::Turbo, TURBO_JUMP_THRESHOLD, TURBO_JUMP_SPEED)]
    #[case(SpeedModifier::Normal, TURBO_JUMP_THRESHOLD, JUMP_SPEED)]
    fn turbo_jump_needs_speed_and_modifier(
        #[case] modifier: SpeedModifier,
        #[case] vx: f32,
        #[case] expected: f32,
    ) {
        let physics = PhysicsConfig::default();
        assert_relative_eq!(physics.jump_speed_for(vx, modifier), expected);
        assert_relative_eq!(physics.jump_speed_for(-vx, modifier), expected);
    }
}
