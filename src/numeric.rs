//! Numeric conversion helpers used across the project.
//!
//! These utilities guard conversions between floating-point world units and
//! integer tile indices. Out-of-range values clamp rather than wrap so a
//! runaway body never indexes a neighbouring row by accident.

/// Floor a finite `f32` and clamp it into the `i32` domain.
///
/// Non-finite values map to `0`.
#[expect(
    clippy::cast_possible_truncation,
    reason = "The value is clamped to the i32 bounds before casting."
)]
#[must_use]
pub fn floor_to_i32(value: f32) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    // i32::MAX is not representable in f32; stay a step inside it.
    let floored = value.floor().clamp(-2_147_483_520.0, 2_147_483_520.0);
    floored as i32
}

/// Tile index containing the world coordinate `value`.
///
/// # Examples
/// ```
/// use brawl::numeric::cell_index;
/// assert_eq!(cell_index(15.9, 16.0), 0);
/// assert_eq!(cell_index(16.0, 16.0), 1);
/// assert_eq!(cell_index(-0.1, 16.0), -1);
/// ```
#[must_use]
pub fn cell_index(value: f32, tile_size: f32) -> i32 {
    floor_to_i32(value / tile_size)
}

/// Index of the last tile touched by a span ending exactly at `value`.
///
/// A span ending on a tile boundary does not touch the next tile, so bodies
/// resting flush against a wall are not reported as overlapping it.
#[must_use]
pub fn last_cell_index(value: f32, tile_size: f32) -> i32 {
    floor_to_i32((value / tile_size).ceil()) - 1
}

/// Convert a count into `f32` for world-space arithmetic.
#[expect(
    clippy::cast_precision_loss,
    reason = "Tile counts stay far below the f32 mantissa limit."
)]
#[must_use]
pub const fn count_to_f32(count: usize) -> f32 {
    count as f32
}

/// Convert an `i32` tile index into `f32`.
#[expect(
    clippy::cast_precision_loss,
    reason = "Tile indices stay far below the f32 mantissa limit."
)]
#[must_use]
pub const fn index_to_f32(index: i32) -> f32 {
    index as f32
}

/// Round a non-negative `f32` up to a `u32`, saturating at `max`.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "The value is clamped to [0, max] before casting."
)]
#[must_use]
pub fn ceil_to_u32(value: f32, max: u32) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    #[expect(
        clippy::cast_precision_loss,
        reason = "Caller-supplied caps are small step counts."
    )]
    let cap = max as f32;
    value.ceil().min(cap) as u32
}
