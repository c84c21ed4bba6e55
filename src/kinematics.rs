//! Kinematics integrator.
//!
//! Turns a [`VirtualInput`] and the current [`Motion`] into the motion for
//! the next tick: horizontal acceleration and friction, gravity, jump grants
//! with coyote time and input buffering, jump cutting and drop-through.
//! Positions are not touched here; the collision resolver moves bodies.

use crate::character::{Motion, SpeedModifier, Surface};
use crate::config::PhysicsConfig;
use crate::constants::TIMER_EPSILON;
use crate::geometry::decay_toward_zero;
use crate::input::VirtualInput;

/// Result of one integration step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Integration {
    /// Motion for the next tick.
    pub motion: Motion,
    /// Downward displacement to apply before collision, used to slip
    /// through a one-way platform.
    pub nudge: f32,
    /// A jump was granted this tick.
    pub jumped: bool,
    /// A drop through a one-way platform started this tick.
    pub dropped_through: bool,
}

fn countdown(timer: f32, dt: f32) -> f32 {
    (timer - dt).max(0.0)
}

fn is_running(timer: f32) -> bool {
    timer > TIMER_EPSILON
}

/// New horizontal speed after one tick of input or friction.
///
/// The result is always inside the effective speed cap, and friction lands
/// exactly on zero rather than reversing direction.
///
/// # Examples
/// ```
/// use brawl::character::{SpeedModifier, Surface};
/// use brawl::config::PhysicsConfig;
/// use brawl::kinematics::horizontal_velocity;
/// let physics = PhysicsConfig::default();
/// let vx = horizontal_velocity(
///     10.0, 0.0, Surface::Normal, true, SpeedModifier::Normal, 1.0 / 60.0, &physics,
/// );
/// assert_eq!(vx, 0.0);
/// ```
#[must_use]
pub fn horizontal_velocity(
    vx: f32,
    direction: f32,
    surface: Surface,
    grounded: bool,
    modifier: SpeedModifier,
    dt: f32,
    params: &PhysicsConfig,
) -> f32 {
    let cap = params.max_speed(modifier);
    let next = if direction == 0.0 {
        decay_toward_zero(vx, params.friction_on(surface, grounded) * dt)
    } else {
        vx + direction * params.acceleration_on(surface, grounded) * dt
    };
    next.clamp(-cap, cap)
}

/// Advances `motion` by one tick.
///
/// Gravity only acts on bodies that started the tick airborne and did not
/// jump, so the tick a jump is granted leaves the vertical speed at exactly
/// the launch speed.
#[must_use]
pub fn integrate(
    motion: &Motion,
    input: &VirtualInput,
    surface: Surface,
    dt: f32,
    params: &PhysicsConfig,
) -> Integration {
    let mut next = *motion;
    let was_grounded = motion.grounded;
    // Coyote grants read the window as it stood at the start of the tick.
    let may_jump = was_grounded || is_running(motion.coyote_timer);

    if was_grounded {
        next.surface = surface;
        next.coyote_timer = params.coyote_time;
    } else {
        next.coyote_timer = countdown(motion.coyote_timer, dt);
    }
    next.jump_buffer_timer = if input.jump_pressed {
        params.jump_buffer_time
    } else {
        countdown(motion.jump_buffer_timer, dt)
    };
    next.drop_through_timer = countdown(motion.drop_through_timer, dt);

    next.velocity.x = horizontal_velocity(
        motion.velocity.x,
        input.move_direction,
        next.surface,
        was_grounded,
        motion.speed_modifier,
        dt,
        params,
    );

    let mut nudge = 0.0;
    let mut jumped = false;
    let mut dropped_through = false;

    if was_grounded && motion.on_one_way && input.drop_pressed && input.jump_pressed {
        next.drop_through_timer = params.drop_through_time;
        next.jump_buffer_timer = 0.0;
        next.coyote_timer = 0.0;
        next.grounded = false;
        next.on_one_way = false;
        nudge = params.drop_through_nudge;
        dropped_through = true;
    } else if is_running(next.jump_buffer_timer) && may_jump {
        next.velocity.y = -params.jump_speed_for(next.velocity.x, motion.speed_modifier);
        next.jump_buffer_timer = 0.0;
        next.coyote_timer = 0.0;
        next.grounded = false;
        next.on_one_way = false;
        jumped = true;
    }

    if !was_grounded && !jumped {
        next.velocity.y = (next.velocity.y + params.gravity * dt).min(params.terminal_velocity);
    }

    if input.jump_released && next.velocity.y < -params.jump_cut_speed {
        next.velocity.y = -params.jump_cut_speed;
    }
    next.velocity.y = next.velocity.y.max(-params.max_rise_speed());

    Integration {
        motion: next,
        nudge,
        jumped,
        dropped_through,
    }
}
