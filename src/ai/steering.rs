//! Horizontal steering with kinematic braking.
//!
//! A body that releases input decelerates at the surface friction, so the
//! distance it still covers is `v² / 2f`. Steering releases input once the
//! remaining distance falls inside that envelope scaled by a safety factor,
//! which stops the body on its mark instead of overshooting.
use crate::geometry::sign_outside;

/// Distance covered while decelerating from `speed` to rest.
///
/// # Examples
/// ```
/// use brawl::ai::steering::stopping_distance;
/// assert!((stopping_distance(180.0, 1260.0) - 12.857).abs() < 1e-3);
/// assert_eq!(stopping_distance(10.0, 0.0), f32::INFINITY);
/// ```
#[must_use]
pub fn stopping_distance(speed: f32, deceleration: f32) -> f32 {
    if deceleration <= 0.0 {
        return f32::INFINITY;
    }
    speed * speed / (2.0 * deceleration)
}

/// True when a body `remaining` away from its mark should release input.
#[must_use]
pub fn should_brake(remaining: f32, speed: f32, deceleration: f32, safety: f32) -> bool {
    remaining <= stopping_distance(speed, deceleration) * safety
}

/// Tuning for [`seek`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Seek {
    /// Friction that will act once input is released.
    pub deceleration: f32,
    /// Multiplier on the stopping distance.
    pub safety: f32,
    /// Distance at which the mark counts as reached.
    pub arrival: f32,
    /// Release input early to stop on the mark. Disable when the body should
    /// carry its speed past the mark.
    pub brake: bool,
}

/// Move direction in `{-1, 0, 1}` that takes a body at `x` with horizontal
/// speed `vx` to `target_x`.
#[must_use]
pub fn seek(x: f32, target_x: f32, vx: f32, tuning: &Seek) -> f32 {
    let offset = target_x - x;
    let direction = sign_outside(offset, tuning.arrival);
    if direction == 0.0 {
        return 0.0;
    }
    let closing = vx * direction > 0.0;
    if tuning.brake
        && closing
        && should_brake(offset.abs(), vx.abs(), tuning.deceleration, tuning.safety)
    {
        return 0.0;
    }
    direction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{Motion, SpeedModifier, Surface};
    use crate::config::PhysicsConfig;
    use crate::input::VirtualInput;
    use crate::kinematics::integrate;
    use rstest::rstest;

    const DT: f32 = 1.0 / 60.0;

    fn drive_to(target: f32, start_speed: f32, surface: Surface) -> (f32, f32) {
        let physics = PhysicsConfig::default();
        let tuning = Seek {
            deceleration: physics.friction_on(surface, true),
            safety: 1.2,
            arrival: 2.0,
            brake: true,
        };
        let mut x = 0.0;
        let mut motion = Motion::grounded(SpeedModifier::Normal);
        motion.surface = surface;
        motion.velocity.x = start_speed;
        for _ in 0..1200 {
            let direction = seek(x, target, motion.velocity.x, &tuning);
            motion = integrate(&motion, &VirtualInput::moving(direction), surface, DT, &physics).motion;
            x += motion.velocity.x * DT;
        }
        (x, motion.velocity.x)
    }

    #[rstest]
    #[case::from_rest(0.0)]
    #[case::half_speed(90.0)]
    #[case::full_speed(180.0)]
    fn braking_stops_on_the_mark(#[case] start_speed: f32) {
        let (x, vx) = drive_to(150.0, start_speed, Surface::Normal);
        assert!((x - 150.0).abs() <= 4.0, "stopped at {x}");
        assert_eq!(vx, 0.0);
    }

    #[rstest]
    fn braking_on_ice_settles_near_the_mark() {
        let (x, vx) = drive_to(200.0, 0.0, Surface::Ice);
        assert!((x - 200.0).abs() <= 4.0, "stopped at {x}");
        assert_eq!(vx, 0.0);
    }

    #[rstest]
    #[case::far(100.0, 180.0, 1.0)]
    #[case::inside_envelope(10.0, 180.0, 0.0)]
    #[case::arrived(1.0, 0.0, 0.0)]
    #[case::moving_away(10.0, -180.0, 1.0)]
    fn seek_cases(#[case] remaining: f32, #[case] vx: f32, #[case] expected: f32) {
        let tuning = Seek {
            deceleration: 1260.0,
            safety: 1.2,
            arrival: 2.0,
            brake: true,
        };
        assert_eq!(seek(0.0, remaining, vx, &tuning), expected);
    }

    #[rstest]
    fn no_brake_keeps_driving() {
        let tuning = Seek {
            deceleration: 1260.0,
            safety: 1.2,
            arrival: 2.0,
            brake: false,
        };
        assert_eq!(seek(0.0, 10.0, 180.0, &tuning), 1.0);
    }
}
