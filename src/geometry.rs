//! Axis-aligned boxes and small vector helpers.
//!
//! World space is two-dimensional with `y` growing downward, so "up" is the
//! negative `y` direction.
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Unit vector pointing up in world space.
pub const UP: Vec2 = Vec2::new(0.0, -1.0);
/// Unit vector pointing down in world space.
pub const DOWN: Vec2 = Vec2::new(0.0, 1.0);

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Top-left corner.
    pub min: Vec2,
    /// Bottom-right corner.
    pub max: Vec2,
}

impl Aabb {
    /// Builds a box from its corners.
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Builds a box centred on `center` with the given half extents.
    ///
    /// # Examples
    /// ```
    /// use brawl::geometry::Aabb;
    /// use glam::Vec2;
    /// let b = Aabb::from_center(Vec2::new(10.0, 10.0), Vec2::new(2.0, 3.0));
    /// assert_eq!(b.min, Vec2::new(8.0, 7.0));
    /// assert_eq!(b.max, Vec2::new(12.0, 13.0));
    /// ```
    #[must_use]
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Centre point of the box.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Width and height.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// True when the box has no area.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        let size = self.size();
        !(size.x > 0.0 && size.y > 0.0)
    }

    /// True when `point` lies inside or on the edge of the box.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Penetration depth on each axis, or `None` when the boxes only touch
    /// or are apart.
    #[must_use]
    pub fn penetration(&self, other: &Self) -> Option<Vec2> {
        let x = (self.max.x - other.min.x).min(other.max.x - self.min.x);
        let y = (self.max.y - other.min.y).min(other.max.y - self.min.y);
        (x > 0.0 && y > 0.0).then_some(Vec2::new(x, y))
    }
}

/// Moves `value` toward zero by `step`, landing exactly on zero instead of
/// crossing it.
///
/// # Examples
/// ```
/// use brawl::geometry::decay_toward_zero;
/// assert_eq!(decay_toward_zero(5.0, 2.0), 3.0);
/// assert_eq!(decay_toward_zero(-1.0, 2.0), 0.0);
/// ```
#[must_use]
pub fn decay_toward_zero(value: f32, step: f32) -> f32 {
    if value.abs() <= step {
        0.0
    } else {
        value - value.signum() * step
    }
}

/// Sign of `value` with a dead zone: returns `0.0` when `|value| <= dead_zone`.
#[must_use]
pub fn sign_outside(value: f32, dead_zone: f32) -> f32 {
    if value.abs() <= dead_zone {
        0.0
    } else {
        value.signum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::overlap(Vec2::new(8.0, 0.0), Some(Vec2::new(2.0, 10.0)))]
    #[case::touching(Vec2::new(10.0, 0.0), None)]
    #[case::apart(Vec2::new(30.0, 0.0), None)]
    #[case::above(Vec2::new(0.0, -9.0), Some(Vec2::new(10.0, 1.0)))]
    fn penetration_depths(#[case] offset: Vec2, #[case] expected: Option<Vec2>) {
        let half = Vec2::new(5.0, 5.0);
        let a = Aabb::from_center(Vec2::ZERO, half);
        let b = Aabb::from_center(offset, half);
        assert_eq!(a.penetration(&b), expected);
        assert_eq!(b.penetration(&a), expected);
    }

    #[rstest]
    fn zero_size_box_is_degenerate() {
        assert!(Aabb::default().is_degenerate());
        assert!(!Aabb::new(Vec2::ZERO, Vec2::ONE).is_degenerate());
    }

    #[rstest]
    #[case(0.5, 1.0, 0.0)]
    #[case(3.0, 1.0, 1.0)]
    #[case(-3.0, 1.0, -1.0)]
    fn dead_zone_sign(#[case] value: f32, #[case] dead: f32, #[case] expected: f32) {
        assert_eq!(sign_outside(value, dead), expected);
    }
}
