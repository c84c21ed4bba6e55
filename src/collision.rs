//! Collision resolver.
//!
//! Moves bodies through the tile grid one axis at a time, separates
//! overlapping characters and wraps bodies that leave the arena. Character
//! contacts are reported from both perspectives so combat rules can read
//! each side independently.
use glam::Vec2;
use hashbrown::HashMap;

use crate::character::{Character, CharacterId};
use crate::geometry::{Aabb, DOWN, UP};
use crate::level::{Tile, TileMap};
use crate::numeric::{cell_index, ceil_to_u32, last_cell_index};

/// Upper bound on sub-steps per tick.
const MAX_SUBSTEPS: u32 = 64;
/// Tolerance when comparing a previous bottom edge with a one-way top.
const ONE_WAY_TOLERANCE: f32 = 0.01;

/// Outcome of moving one body against level geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldMove {
    /// Hitbox centre after the move.
    pub position: Vec2,
    /// Velocity with blocked axes zeroed.
    pub velocity: Vec2,
    /// A floor is directly underfoot.
    pub grounded: bool,
    /// That floor is a one-way platform.
    pub on_one_way: bool,
    /// A wall stopped horizontal motion.
    pub blocked_x: bool,
    /// A floor or ceiling stopped vertical motion.
    pub blocked_y: bool,
}

/// A touching pair seen from `actor`'s side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Character whose perspective this is.
    pub actor: CharacterId,
    /// Character it touched.
    pub other: CharacterId,
    /// Unit normal pointing from `other` toward `actor`.
    pub normal: Vec2,
    /// Pre-resolution velocity of `actor` minus that of `other`.
    pub relative_velocity: Vec2,
}

struct CellSpan {
    first: i32,
    last: i32,
}

impl CellSpan {
    fn of(min: f32, max: f32, tile_size: f32) -> Self {
        Self {
            first: cell_index(min, tile_size),
            last: last_cell_index(max, tile_size),
        }
    }

    fn iter(&self) -> std::ops::RangeInclusive<i32> {
        self.first..=self.last
    }
}

fn blocking_column(map: &TileMap, body: &Aabb, moving_right: bool) -> Option<i32> {
    let ts = map.tile_size();
    let columns = CellSpan::of(body.min.x, body.max.x, ts);
    let rows = CellSpan::of(body.min.y, body.max.y, ts);
    let hit = |column: i32| rows.iter().any(|row| map.tile(column, row).is_solid());
    if moving_right {
        columns.iter().find(|&c| hit(c))
    } else {
        columns.iter().rev().find(|&c| hit(c))
    }
}

fn blocking_row(
    map: &TileMap,
    body: &Aabb,
    moving_down: bool,
    previous_bottom: f32,
    one_way_enabled: bool,
) -> Option<i32> {
    let ts = map.tile_size();
    let columns = CellSpan::of(body.min.x, body.max.x, ts);
    let rows = CellSpan::of(body.min.y, body.max.y, ts);
    let blocks = |column: i32, row: i32| match map.tile(column, row) {
        Tile::Solid | Tile::Ice => true,
        // One-way tops only catch bodies that were above them last step.
        Tile::OneWay => {
            moving_down
                && one_way_enabled
                && previous_bottom <= map.row_top(row) + ONE_WAY_TOLERANCE
        }
        Tile::Empty => false,
    };
    let hit = |row: i32| columns.iter().any(|column| blocks(column, row));
    if moving_down {
        rows.iter().find(|&r| hit(r))
    } else {
        rows.iter().rev().find(|&r| hit(r))
    }
}

/// Finds a floor directly under the feet. Returns the floor's top edge and
/// whether it is a one-way platform.
fn floor_within(
    map: &TileMap,
    position: Vec2,
    half: Vec2,
    reach: f32,
    one_way_enabled: bool,
) -> Option<(f32, bool)> {
    let ts = map.tile_size();
    let feet = position.y + half.y;
    let row = cell_index(feet + reach, ts);
    let top = map.row_top(row);
    if (top - feet).abs() > reach {
        return None;
    }
    let columns = CellSpan::of(position.x - half.x, position.x + half.x, ts);
    let mut one_way_only = true;
    let mut found = false;
    for column in columns.iter() {
        match map.tile(column, row) {
            Tile::Solid | Tile::Ice => {
                found = true;
                one_way_only = false;
            }
            Tile::OneWay if one_way_enabled => found = true,
            _ => {}
        }
    }
    found.then_some((top, one_way_only))
}

/// Moves a body by `velocity * dt` against the tile grid.
///
/// Motion is split into sub-steps no longer than half a tile so fast bodies
/// cannot tunnel. Each sub-step resolves X before Y. A blocked axis has its
/// velocity zeroed. One-way platforms are only solid from above and only
/// while `one_way_enabled`.
#[must_use]
pub fn move_against_world(
    map: &TileMap,
    position: Vec2,
    velocity: Vec2,
    half: Vec2,
    dt: f32,
    reach: f32,
    one_way_enabled: bool,
) -> WorldMove {
    let ts = map.tile_size();
    let delta = velocity * dt;
    let steps = if ts > 0.0 {
        ceil_to_u32(delta.abs().max_element() / (ts * 0.5), MAX_SUBSTEPS).max(1)
    } else {
        1
    };
    let mut step = delta / f32::from(u16::try_from(steps).unwrap_or(1));
    let mut out = WorldMove {
        position,
        velocity,
        ..WorldMove::default()
    };

    for _ in 0..steps {
        if step.x != 0.0 {
            out.position.x += step.x;
            let body = Aabb::from_center(out.position, half);
            if let Some(column) = blocking_column(map, &body, step.x > 0.0) {
                out.position.x = if step.x > 0.0 {
                    map.column_left(column) - half.x
                } else {
                    map.column_left(column + 1) + half.x
                };
                out.velocity.x = 0.0;
                out.blocked_x = true;
                step.x = 0.0;
            }
        }
        if step.y != 0.0 {
            let previous_bottom = out.position.y + half.y;
            out.position.y += step.y;
            let body = Aabb::from_center(out.position, half);
            let moving_down = step.y > 0.0;
            if let Some(row) = blocking_row(map, &body, moving_down, previous_bottom, one_way_enabled) {
                out.position.y = if moving_down {
                    map.row_top(row) - half.y
                } else {
                    map.row_top(row + 1) + half.y
                };
                out.velocity.y = 0.0;
                out.blocked_y = true;
                step.y = 0.0;
            }
        }
    }

    if out.velocity.y >= 0.0 {
        if let Some((top, one_way)) = floor_within(map, out.position, half, reach, one_way_enabled) {
            out.position.y = top - half.y;
            out.velocity.y = 0.0;
            out.grounded = true;
            out.on_one_way = one_way;
        }
    }
    out
}

/// Separates overlapping characters and reports each touching pair twice,
/// once per perspective.
///
/// Only characters whose life state collides with other characters take
/// part. `pre_velocities` holds velocities from before any resolution this
/// tick and feeds [`Contact::relative_velocity`]. Separation never pushes a
/// body into solid tiles.
pub fn resolve_character_contacts<S: std::hash::BuildHasher>(
    map: &TileMap,
    characters: &mut [Character],
    pre_velocities: &HashMap<CharacterId, Vec2, S>,
    half: Vec2,
) -> Vec<Contact> {
    let mut contacts = Vec::new();
    for i in 0..characters.len() {
        let (head, tail) = characters.split_at_mut(i + 1);
        let Some(a) = head.last_mut() else { continue };
        if !a.life.collides_with_characters() {
            continue;
        }
        for b in tail.iter_mut() {
            if !b.life.collides_with_characters() {
                continue;
            }
            let Some(depth) = a.hitbox(half).penetration(&b.hitbox(half)) else {
                continue;
            };
            let normal_for_a = separate(map, a, b, depth, half);
            let pre_a = pre_velocities.get(&a.id).copied().unwrap_or(a.motion.velocity);
            let pre_b = pre_velocities.get(&b.id).copied().unwrap_or(b.motion.velocity);
            contacts.push(Contact {
                actor: a.id,
                other: b.id,
                normal: normal_for_a,
                relative_velocity: pre_a - pre_b,
            });
            contacts.push(Contact {
                actor: b.id,
                other: a.id,
                normal: -normal_for_a,
                relative_velocity: pre_b - pre_a,
            });
        }
    }
    contacts
}

/// Horizontal position after shifting by `dx`, stopped at the first solid
/// column.
fn shift_x(map: &TileMap, position: Vec2, dx: f32, half: Vec2) -> f32 {
    let moved = Vec2::new(position.x + dx, position.y);
    match blocking_column(map, &Aabb::from_center(moved, half), dx > 0.0) {
        Some(column) if dx > 0.0 => map.column_left(column) - half.x,
        Some(column) => map.column_left(column + 1) + half.x,
        None => moved.x,
    }
}

/// Vertical position after shifting by `dy`, stopped at the first blocking
/// row. One-way tops stop downward pushes.
fn shift_y(map: &TileMap, position: Vec2, dy: f32, half: Vec2) -> f32 {
    let moved = Vec2::new(position.x, position.y + dy);
    let body = Aabb::from_center(moved, half);
    let down = dy > 0.0;
    match blocking_row(map, &body, down, position.y + half.y, true) {
        Some(row) if down => map.row_top(row) - half.y,
        Some(row) => map.row_top(row + 1) + half.y,
        None => moved.y,
    }
}

/// Pushes `a` and `b` apart along the axis of least penetration and returns
/// the contact normal as seen by `a`.
///
/// Whatever one body cannot move because of the tile grid is passed on to
/// the other.
fn separate(map: &TileMap, a: &mut Character, b: &mut Character, depth: Vec2, half: Vec2) -> Vec2 {
    if depth.y <= depth.x {
        let a_on_top = a.position.y <= b.position.y;
        let (upper, lower) = if a_on_top { (a, b) } else { (b, a) };
        // The upper body comes to rest on the lower one's head.
        let raised = shift_y(map, upper.position, -depth.y, half);
        let shortfall = depth.y - (upper.position.y - raised);
        upper.position.y = raised;
        if shortfall > 0.0 {
            lower.position.y = shift_y(map, lower.position, shortfall, half);
        }
        if upper.motion.velocity.y > 0.0 {
            upper.motion.velocity.y = 0.0;
        }
        if lower.motion.velocity.y < 0.0 {
            lower.motion.velocity.y = 0.0;
        }
        if a_on_top { UP } else { DOWN }
    } else {
        let a_left = a.position.x <= b.position.x;
        let push = depth.x * 0.5;
        let (left, right) = if a_left { (a, b) } else { (b, a) };
        let left_x = shift_x(map, left.position, -push, half);
        let shortfall = depth.x - (left.position.x - left_x);
        left.position.x = left_x;
        right.position.x = shift_x(map, right.position, shortfall, half);
        left.motion.velocity.x = left.motion.velocity.x.min(0.0);
        right.motion.velocity.x = right.motion.velocity.x.max(0.0);
        if a_left {
            Vec2::new(-1.0, 0.0)
        } else {
            Vec2::new(1.0, 0.0)
        }
    }
}

/// Wraps a body centre that has left `bounds` to just inside the opposite
/// edge. Returns `None` when no wrap is needed or the bounds are degenerate.
///
/// # Examples
/// ```
/// use brawl::collision::wrap_position;
/// use brawl::geometry::Aabb;
/// use glam::Vec2;
/// let bounds = Aabb::new(Vec2::ZERO, Vec2::new(100.0, 50.0));
/// assert_eq!(
///     wrap_position(Vec2::new(101.0, 10.0), &bounds, 2.0),
///     Some(Vec2::new(2.0, 10.0))
/// );
/// assert_eq!(wrap_position(Vec2::new(50.0, 10.0), &bounds, 2.0), None);
/// ```
#[must_use]
pub fn wrap_position(position: Vec2, bounds: &Aabb, inward: f32) -> Option<Vec2> {
    if bounds.is_degenerate() {
        return None;
    }
    let mut wrapped = position;
    if position.x < bounds.min.x {
        wrapped.x = bounds.max.x - inward;
    } else if position.x > bounds.max.x {
        wrapped.x = bounds.min.x + inward;
    }
    if position.y < bounds.min.y {
        wrapped.y = bounds.max.y - inward;
    } else if position.y > bounds.max.y {
        wrapped.y = bounds.min.y + inward;
    }
    (wrapped != position).then_some(wrapped)
}
