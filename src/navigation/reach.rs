//! Closed-form jump and fall envelopes.
//!
//! Every function assumes the body starts at rest and accelerates
//! horizontally at the configured rate up to the walk speed. Displacements
//! use world axes, so a target above the take-off point has negative `y`.
use glam::Vec2;

use crate::config::PhysicsConfig;

/// Horizontal distance covered in `time` starting from rest.
///
/// # Examples
/// ```
/// use brawl::navigation::reach::horizontal_reach;
/// // 0.2 s to reach 180 px/s at 900 px/s², then cruise.
/// assert!((horizontal_reach(0.2, 900.0, 180.0) - 18.0).abs() < 1e-4);
/// assert!((horizontal_reach(1.2, 900.0, 180.0) - 198.0).abs() < 1e-3);
/// ```
#[must_use]
pub fn horizontal_reach(time: f32, acceleration: f32, max_speed: f32) -> f32 {
    if time <= 0.0 {
        return 0.0;
    }
    let ramp = max_speed / acceleration;
    if time <= ramp {
        0.5 * acceleration * time * time
    } else {
        0.5 * acceleration * ramp * ramp + max_speed * (time - ramp)
    }
}

/// Time to fall `depth` from vertical rest, honouring terminal velocity.
#[must_use]
pub fn fall_time(depth: f32, gravity: f32, terminal: f32) -> f32 {
    if depth <= 0.0 {
        return 0.0;
    }
    let free_fall = terminal * terminal / (2.0 * gravity);
    if depth <= free_fall {
        (2.0 * depth / gravity).sqrt()
    } else {
        terminal / gravity + (depth - free_fall) / terminal
    }
}

/// Distance fallen after `time` from vertical rest.
#[must_use]
pub fn fall_distance(time: f32, gravity: f32, terminal: f32) -> f32 {
    if time <= 0.0 {
        return 0.0;
    }
    let capped_at = terminal / gravity;
    if time <= capped_at {
        0.5 * gravity * time * time
    } else {
        0.5 * gravity * capped_at * capped_at + terminal * (time - capped_at)
    }
}

/// Apex height of a standing jump.
#[must_use]
pub fn jump_apex(physics: &PhysicsConfig) -> f32 {
    physics.jump_speed * physics.jump_speed / (2.0 * physics.gravity)
}

/// Airtime of a jump that lands `dy` below the take-off point, or `None`
/// if the landing height is above the apex.
#[must_use]
pub fn jump_airtime(dy: f32, physics: &PhysicsConfig) -> Option<f32> {
    let apex = jump_apex(physics);
    if -dy > apex {
        return None;
    }
    let rise = physics.jump_speed / physics.gravity;
    Some(rise + fall_time(apex + dy, physics.gravity, physics.terminal_velocity))
}

/// Vertical offset from the take-off point `time` seconds into a jump.
#[must_use]
pub fn jump_offset_at(time: f32, physics: &PhysicsConfig) -> f32 {
    let rise = physics.jump_speed / physics.gravity;
    if time <= rise {
        -physics.jump_speed * time + 0.5 * physics.gravity * time * time
    } else {
        -jump_apex(physics) + fall_distance(time - rise, physics.gravity, physics.terminal_velocity)
    }
}

/// Whether a standing jump can land at `displacement`, trusting only
/// `margin` of the theoretical height and distance.
///
/// # Examples
/// ```
/// use brawl::config::PhysicsConfig;
/// use brawl::navigation::reach::jump_reachable;
/// use glam::Vec2;
/// let physics = PhysicsConfig::default();
/// assert!(jump_reachable(Vec2::new(48.0, -32.0), &physics, 0.85));
/// assert!(!jump_reachable(Vec2::new(0.0, -96.0), &physics, 0.85));
/// assert!(!jump_reachable(Vec2::new(200.0, 0.0), &physics, 0.85));
/// ```
#[must_use]
pub fn jump_reachable(displacement: Vec2, physics: &PhysicsConfig, margin: f32) -> bool {
    if -displacement.y > jump_apex(physics) * margin {
        return false;
    }
    jump_airtime(displacement.y, physics).is_some_and(|airtime| {
        displacement.x.abs()
            <= horizontal_reach(airtime, physics.acceleration, physics.walk_speed) * margin
    })
}

/// Horizontal distance coverable while falling `depth` after stepping off a
/// ledge, scaled by `margin`.
#[must_use]
pub fn drop_reach(depth: f32, physics: &PhysicsConfig, margin: f32) -> f32 {
    let time = fall_time(depth, physics.gravity, physics.terminal_velocity);
    horizontal_reach(time, physics.acceleration, physics.walk_speed) * margin
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn physics() -> PhysicsConfig {
        PhysicsConfig::default()
    }

    #[rstest]
    #[case::up_and_across(Vec2::new(48.0, -32.0), true)]
    #[case::mirrored(Vec2::new(-48.0, -32.0), true)]
    #[case::three_tiles_up(Vec2::new(16.0, -48.0), true)]
    #[case::too_high(Vec2::new(0.0, -96.0), false)]
    #[case::too_far(Vec2::new(200.0, 0.0), false)]
    #[case::below_and_across(Vec2::new(96.0, 64.0), true)]
    fn reachability(physics: PhysicsConfig, #[case] displacement: Vec2, #[case] expected: bool) {
        assert_eq!(jump_reachable(displacement, &physics, 0.85), expected);
    }

    #[rstest]
    fn airtime_of_level_jump_is_symmetric(physics: PhysicsConfig) {
        let airtime = jump_airtime(0.0, &physics).expect("level landing is reachable");
        assert_relative_eq!(airtime, 2.0 * physics.jump_speed / physics.gravity, epsilon = 1e-5);
        assert_relative_eq!(jump_offset_at(airtime, &physics), 0.0, epsilon = 1e-3);
    }

    #[rstest]
    fn fall_time_inverts_fall_distance(physics: PhysicsConfig) {
        for depth in [8.0, 64.0, 200.0, 500.0] {
            let t = fall_time(depth, physics.gravity, physics.terminal_velocity);
            assert_relative_eq!(
                fall_distance(t, physics.gravity, physics.terminal_velocity),
                depth,
                epsilon = 1e-2
            );
        }
    }
}
