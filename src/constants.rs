//! Canonical simulation constants.
//!
//! Units are pixels and seconds with `y` growing downward. Per-second values
//! are derived from the per-frame tuning model at 60 Hz: velocities scale by
//! 60 and accelerations by 3600. These are the defaults behind
//! [`SimConfig`](crate::config::SimConfig); nothing reads them directly at
//! runtime except the config layer and tests.

/// Fixed simulation rate.
pub const TICK_RATE: u32 = 60;
/// Default edge length of a level tile.
pub const TILE_SIZE: f32 = 16.0;

/// Horizontal half extent of every character hitbox.
pub const CHARACTER_HALF_WIDTH: f32 = 5.0;
/// Vertical half extent of every character hitbox.
pub const CHARACTER_HALF_HEIGHT: f32 = 7.0;

// Horizontal motion.
/// Top horizontal speed without a modifier.
pub const WALK_SPEED: f32 = 180.0;
/// Top horizontal speed under [`SpeedModifier::Turbo`](crate::character::SpeedModifier::Turbo).
pub const TURBO_SPEED: f32 = 270.0;
/// Top horizontal speed under [`SpeedModifier::Slowdown`](crate::character::SpeedModifier::Slowdown).
pub const SLOWDOWN_SPEED: f32 = 90.0;
/// Horizontal acceleration while input is held.
pub const ACCELERATION: f32 = 900.0;
/// Horizontal acceleration on ice.
pub const ICE_ACCELERATION: f32 = 270.0;
/// Deceleration on normal ground with no input.
pub const GROUND_FRICTION: f32 = 1260.0;
/// Deceleration on ice with no input.
pub const ICE_FRICTION: f32 = 108.0;
/// Deceleration in the air with no input.
pub const AIR_FRICTION: f32 = 360.0;

// Vertical motion.
/// Downward acceleration.
pub const GRAVITY: f32 = 1260.0;
/// Maximum falling speed.
pub const TERMINAL_VELOCITY: f32 = 600.0;
/// Launch speed of a normal jump.
pub const JUMP_SPEED: f32 = 420.0;
/// Launch speed of a jump taken at turbo speed.
pub const TURBO_JUMP_SPEED: f32 = 480.0;
/// Horizontal speed at or above which a turbo jump is granted.
pub const TURBO_JUMP_THRESHOLD: f32 = 240.0;
/// Upward speed a released jump is cut down to.
pub const JUMP_CUT_SPEED: f32 = 150.0;

// Grace windows.
/// How long after leaving a ledge a jump is still granted.
pub const COYOTE_TIME: f32 = 0.1;
/// How long a jump press is remembered before landing.
pub const JUMP_BUFFER_TIME: f32 = 0.1;
/// How long one-way platforms are ignored after dropping.
pub const DROP_THROUGH_TIME: f32 = 0.2;
/// Downward shift applied on the tick a drop starts.
pub const DROP_THROUGH_NUDGE: f32 = 0.5;

/// Distance below the feet searched for a floor after moving.
pub const GROUND_SNAP_DISTANCE: f32 = 0.5;
/// Offset applied when wrapping a body to the opposite edge of the arena.
pub const WRAP_INWARD_OFFSET: f32 = 2.0;

// Combat.
/// Minimum dot product between a contact normal and the vertical axis for a
/// contact to count as a stomp or bonk.
pub const STOMP_NORMAL_THRESHOLD: f32 = 0.7;
/// Upward speed given to a stomper.
pub const STOMP_BOUNCE_SPEED: f32 = 240.0;

// Lifecycle.
/// Time spent despawned.
pub const RESPAWN_DELAY: f32 = 2.0;
/// Spawn protection after a respawn.
pub const PROTECTION_DURATION: f32 = 1.0;
/// Lifetime of the marker left where a character died.
pub const DEATH_MARKER_LIFETIME: f32 = 1.5;
/// Timers at or below this value count as elapsed. Absorbs float drift from
/// repeated fixed-step decrements.
pub const TIMER_EPSILON: f32 = 1e-4;

// Navigation graph.
/// Spacing in tiles between sampled nodes along a platform.
pub const NAV_NODE_SPACING: u32 = 3;
/// Fraction of the theoretical jump envelope the graph trusts.
pub const NAV_REACH_MARGIN: f32 = 0.85;
/// Distance multiplier for jump edges.
pub const NAV_JUMP_COST_FACTOR: f32 = 1.5;
/// Flat cost added to every jump edge.
pub const NAV_JUMP_COST_PENALTY: f32 = 24.0;
/// Distance multiplier for drop edges.
pub const NAV_DROP_COST_FACTOR: f32 = 0.8;

// AI planner.
/// Time between replans of an NPC without a path.
pub const AI_PLANNER_INTERVAL: f32 = 0.1;
/// Time between target cache refreshes.
pub const AI_TARGET_REFRESH_INTERVAL: f32 = 0.5;
/// Multiplier applied to the kinematic stopping distance; must exceed 1.
pub const AI_BRAKING_SAFETY: f32 = 1.2;
/// Distance at which a walk waypoint counts as reached.
pub const AI_ARRIVAL_TOLERANCE: f32 = 2.0;
/// Horizontal slack when lining up a jump or drop.
pub const AI_JUMP_ALIGNMENT_TOLERANCE: f32 = 4.0;
/// Time without progress before a path is abandoned.
pub const AI_BLOCKED_TIMEOUT: f32 = 1.0;
/// Minimum improvement that counts as progress along a path.
pub const AI_PROGRESS_EPSILON: f32 = 1.0;
/// Horizontal reach of the direct-engage override.
pub const AI_ENGAGE_RANGE_X: f32 = 40.0;
/// Vertical reach of the direct-engage override.
pub const AI_ENGAGE_RANGE_Y: f32 = 80.0;
/// Horizontal distance inside which a chasing NPC hops to set up a stomp.
pub const AI_HOP_RANGE: f32 = 40.0;
