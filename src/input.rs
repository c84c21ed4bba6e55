//! Per-tick control intent shared by the player and the AI planner.
use serde::{Deserialize, Serialize};

/// Control intent for one character for one tick.
///
/// Both the external player controller and the NPC planner speak this type,
/// so the physics pipeline never knows who is driving.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualInput {
    /// Horizontal intent in `[-1, 1]`.
    pub move_direction: f32,
    /// Jump pressed this tick.
    pub jump_pressed: bool,
    /// Jump released this tick.
    pub jump_released: bool,
    /// Drop-through held this tick.
    pub drop_pressed: bool,
}

impl VirtualInput {
    /// No intent at all.
    pub const IDLE: Self = Self {
        move_direction: 0.0,
        jump_pressed: false,
        jump_released: false,
        drop_pressed: false,
    };

    /// Builds an input, clamping the direction into `[-1, 1]` and mapping
    /// non-finite directions to zero.
    #[must_use]
    pub fn new(move_direction: f32, jump_pressed: bool, jump_released: bool, drop_pressed: bool) -> Self {
        Self {
            move_direction,
            jump_pressed,
            jump_released,
            drop_pressed,
        }
        .sanitized()
    }

    /// Horizontal movement only.
    #[must_use]
    pub fn moving(direction: f32) -> Self {
        Self::new(direction, false, false, false)
    }

    /// Same input with jump pressed.
    #[must_use]
    pub const fn with_jump(mut self) -> Self {
        self.jump_pressed = true;
        self
    }

    /// Same input with jump released.
    #[must_use]
    pub const fn with_jump_release(mut self) -> Self {
        self.jump_released = true;
        self
    }

    /// Same input with drop-through held.
    #[must_use]
    pub const fn with_drop(mut self) -> Self {
        self.drop_pressed = true;
        self
    }

    /// Returns a copy whose direction is finite and inside `[-1, 1]`.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let move_direction = if self.move_direction.is_finite() {
            self.move_direction.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        Self {
            move_direction,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.5, 0.5)]
    #[case(3.0, 1.0)]
    #[case(-7.5, -1.0)]
    #[case(f32::NAN, 0.0)]
    #[case(f32::NEG_INFINITY, 0.0)]
    fn direction_is_sanitised(#[case] raw: f32, #[case] expected: f32) {
        assert_eq!(VirtualInput::moving(raw).move_direction, expected);
    }

    #[rstest]
    fn builders_set_flags() {
        let input = VirtualInput::moving(1.0).with_jump().with_drop();
        assert!(input.jump_pressed);
        assert!(input.drop_pressed);
        assert!(!input.jump_released);
    }
}
