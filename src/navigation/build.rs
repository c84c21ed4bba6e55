//! Navigation graph construction from a [`TileMap`].
use glam::Vec2;
use log::{debug, info};

use super::reach::{
    drop_reach, fall_distance, fall_time, horizontal_reach, jump_airtime, jump_offset_at,
    jump_reachable,
};
use super::{DropStyle, EdgeId, EdgeKind, NavEdge, NavGraph, NavNode, NodeId, Platform, PlatformId};
use crate::config::{NavConfig, PhysicsConfig};
use crate::geometry::Aabb;
use crate::level::{Tile, TileMap};
use crate::numeric::{cell_index, ceil_to_u32, last_cell_index};

/// Trajectory samples per edge clearance check.
const TRAJECTORY_SAMPLES: u16 = 16;
/// Shrinks sample hitboxes so grazing a tile corner is not a collision.
const CLEARANCE_SKIN: f32 = 0.5;

impl NavGraph {
    /// Builds the graph for `map`.
    #[must_use]
    pub fn build(map: &TileMap, physics: &PhysicsConfig, nav: &NavConfig) -> Self {
        let mut graph = Self {
            half_extents: physics.half_extents,
            heuristic_scale: 1.0_f32.min(nav.jump_cost_factor).min(nav.drop_cost_factor),
            ..Self::default()
        };
        graph.platforms = extract_platforms(map, physics.half_extents);
        graph.nodes = sample_nodes(map, &graph.platforms, physics.half_extents, nav.node_spacing);
        graph.outgoing = vec![Vec::new(); graph.nodes.len()];

        graph.add_walk_edges();
        graph.add_jump_edges(map, physics, nav);
        graph.add_ledge_drops(map, physics, nav);
        graph.add_fall_throughs(map, physics, nav);

        let count = |kind: EdgeKind| graph.edges.iter().filter(|e| e.kind == kind).count();
        info!(
            "navigation graph: {} platforms, {} nodes, {} edges",
            graph.platforms.len(),
            graph.nodes.len(),
            graph.edges.len()
        );
        debug!(
            "edge kinds: {} walk, {} jump, {} drop",
            count(EdgeKind::Walk),
            count(EdgeKind::Jump),
            count(EdgeKind::Drop)
        );
        graph
    }

    fn push_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind, cost: f32, drop: Option<DropStyle>) {
        let id = EdgeId(self.edges.len());
        self.edges.push(NavEdge {
            id,
            from,
            to,
            kind,
            cost,
            drop,
        });
        if let Some(out) = self.outgoing.get_mut(from.0) {
            out.push(id);
        }
    }

    fn add_walk_edges(&mut self) {
        let pairs: Vec<(NavNode, NavNode)> = self
            .nodes
            .windows(2)
            .filter_map(|w| match w {
                [a, b] if a.platform == b.platform => Some((*a, *b)),
                _ => None,
            })
            .collect();
        for (a, b) in pairs {
            let cost = (b.position.x - a.position.x).abs();
            self.push_edge(a.id, b.id, EdgeKind::Walk, cost, None);
            self.push_edge(b.id, a.id, EdgeKind::Walk, cost, None);
        }
    }

    fn add_jump_edges(&mut self, map: &TileMap, physics: &PhysicsConfig, nav: &NavConfig) {
        let mut found = Vec::new();
        for a in &self.nodes {
            for b in &self.nodes {
                if a.platform == b.platform || b.position.y > a.position.y {
                    continue;
                }
                if jump_feasible(map, physics, nav, a, b) {
                    let cost = a.position.distance(b.position) * nav.jump_cost_factor
                        + nav.jump_cost_penalty;
                    found.push((a.id, b.id, cost));
                }
            }
        }
        for (from, to, cost) in found {
            self.push_edge(from, to, EdgeKind::Jump, cost, None);
        }
    }

    fn add_ledge_drops(&mut self, map: &TileMap, physics: &PhysicsConfig, nav: &NavConfig) {
        let half = physics.half_extents;
        let mut found = Vec::new();
        for platform in &self.platforms {
            let on_platform: Vec<&NavNode> = self
                .nodes
                .iter()
                .filter(|n| n.platform == platform.id)
                .collect();
            let ends = [
                (on_platform.first().copied(), -1.0, platform.left_x - half.x),
                (on_platform.last().copied(), 1.0, platform.right_x + half.x),
            ];
            for (end, direction, takeoff_x) in ends {
                let Some(node) = end else { continue };
                let takeoff = Vec2::new(takeoff_x, node.position.y);
                if !body_clear(map, takeoff, half, false) {
                    continue;
                }
                for target in &self.nodes {
                    if target.platform == platform.id || target.position.y <= node.position.y {
                        continue;
                    }
                    let offset = target.position - takeoff;
                    let reach = drop_reach(offset.y, physics, nav.reach_margin);
                    if offset.x * direction < -map.tile_size() || offset.x.abs() > reach {
                        continue;
                    }
                    if fall_clear(map, physics, takeoff, target.position, None) {
                        let cost = node.position.distance(target.position) * nav.drop_cost_factor;
                        found.push((node.id, target.id, cost, direction));
                    }
                }
            }
        }
        for (from, to, cost, direction) in found {
            self.push_edge(from, to, EdgeKind::Drop, cost, Some(DropStyle::StepOff { direction }));
        }
    }

    fn add_fall_throughs(&mut self, map: &TileMap, physics: &PhysicsConfig, nav: &NavConfig) {
        let mut found = Vec::new();
        for a in self.nodes.iter().filter(|n| n.one_way) {
            let Some(platform) = self.platform(a.platform) else { continue };
            for b in &self.nodes {
                if b.platform == a.platform || b.position.y <= a.position.y {
                    continue;
                }
                let offset = b.position - a.position;
                if offset.x.abs() > drop_reach(offset.y, physics, nav.reach_margin) {
                    continue;
                }
                if fall_clear(map, physics, a.position, b.position, Some(platform.row)) {
                    let cost = a.position.distance(b.position) * nav.drop_cost_factor;
                    found.push((a.id, b.id, cost));
                }
            }
        }
        for (from, to, cost) in found {
            self.push_edge(from, to, EdgeKind::Drop, cost, Some(DropStyle::FallThrough));
        }
    }
}

/// The jump reachability check: the standing-jump envelope holds and both
/// the eager and the evenly-paced trajectories are free of solid tiles.
#[must_use]
pub fn jump_feasible(
    map: &TileMap,
    physics: &PhysicsConfig,
    nav: &NavConfig,
    from: &NavNode,
    to: &NavNode,
) -> bool {
    let offset = to.position - from.position;
    if !jump_reachable(offset, physics, nav.reach_margin) {
        return false;
    }
    let Some(airtime) = jump_airtime(offset.y, physics) else {
        return false;
    };
    let vertical = |t: f32| jump_offset_at(t, physics);
    trajectory_clear(map, physics, from.position, offset, airtime, vertical, None)
}

fn fall_clear(
    map: &TileMap,
    physics: &PhysicsConfig,
    start: Vec2,
    end: Vec2,
    through_row: Option<i32>,
) -> bool {
    let offset = end - start;
    let duration = fall_time(offset.y, physics.gravity, physics.terminal_velocity);
    let vertical = |t: f32| fall_distance(t, physics.gravity, physics.terminal_velocity);
    trajectory_clear(map, physics, start, offset, duration, vertical, through_row)
}

/// Samples a trajectory lasting `duration` whose vertical offset follows
/// `vertical`. Two horizontal profiles are checked: full acceleration
/// toward the target and progress proportional to the reachable distance.
///
/// During falls one-way tiles block, except on `through_row`.
fn trajectory_clear(
    map: &TileMap,
    physics: &PhysicsConfig,
    start: Vec2,
    offset: Vec2,
    duration: f32,
    vertical: impl Fn(f32) -> f32,
    through_row: Option<i32>,
) -> bool {
    let half = physics.half_extents;
    let reach = |t: f32| horizontal_reach(t, physics.acceleration, physics.walk_speed);
    let full = reach(duration);
    let direction = offset.x.signum();
    let is_fall = offset.y > 0.0 && vertical(duration) > 0.0;
    (1..TRAJECTORY_SAMPLES).all(|i| {
        let t = duration * f32::from(i) / f32::from(TRAJECTORY_SAMPLES);
        let y = start.y + vertical(t);
        let paced = if full > 0.0 { offset.x * reach(t) / full } else { 0.0 };
        let eager = direction * reach(t).min(offset.x.abs());
        [paced, eager].into_iter().all(|dx| {
            let centre = Vec2::new(start.x + dx, y);
            let one_way_blocks = is_fall && !overlaps_row(map, centre, half, through_row);
            body_clear(map, centre, half, one_way_blocks)
        })
    })
}

fn overlaps_row(map: &TileMap, centre: Vec2, half: Vec2, row: Option<i32>) -> bool {
    row.is_some_and(|through| {
        let ts = map.tile_size();
        let first = cell_index(centre.y - half.y, ts);
        let last = last_cell_index(centre.y + half.y + CLEARANCE_SKIN, ts);
        (first..=last).contains(&through)
    })
}

/// True when a slightly shrunken hitbox at `centre` touches no blocking
/// tile.
fn body_clear(map: &TileMap, centre: Vec2, half: Vec2, one_way_blocks: bool) -> bool {
    let ts = map.tile_size();
    let body = Aabb::from_center(centre, half - Vec2::splat(CLEARANCE_SKIN));
    let columns = cell_index(body.min.x, ts)..=last_cell_index(body.max.x, ts);
    columns.into_iter().all(|column| {
        (cell_index(body.min.y, ts)..=last_cell_index(body.max.y, ts)).all(|row| {
            match map.tile(column, row) {
                Tile::Solid | Tile::Ice => false,
                Tile::OneWay => !one_way_blocks,
                Tile::Empty => true,
            }
        })
    })
}

fn standable(map: &TileMap, column: i32, row: i32, headroom: i32) -> bool {
    map.tile(column, row).is_floor() && (1..=headroom).all(|k| !map.tile(column, row - k).is_solid())
}

fn extract_platforms(map: &TileMap, half: Vec2) -> Vec<Platform> {
    let ts = map.tile_size();
    let headroom = i32::try_from(ceil_to_u32(2.0 * half.y / ts, 64)).unwrap_or(1).max(1);
    let columns = i32::try_from(map.columns()).unwrap_or(i32::MAX);
    let rows = i32::try_from(map.rows()).unwrap_or(i32::MAX);
    let mut platforms = Vec::new();
    for row in 0..rows {
        let mut column = 0;
        while column < columns {
            if !standable(map, column, row, headroom) {
                column += 1;
                continue;
            }
            let first = column;
            let mut one_way = true;
            while column < columns && standable(map, column, row, headroom) {
                one_way &= map.tile(column, row) == Tile::OneWay;
                column += 1;
            }
            let last = column - 1;
            platforms.push(Platform {
                id: PlatformId(platforms.len()),
                row,
                first_column: first,
                last_column: last,
                surface_y: map.row_top(row),
                left_x: map.column_left(first),
                right_x: map.column_left(last + 1),
                one_way,
            });
        }
    }
    platforms
}

fn sample_nodes(map: &TileMap, platforms: &[Platform], half: Vec2, spacing_tiles: u32) -> Vec<NavNode> {
    let ts = map.tile_size();
    let spacing = i32::try_from(spacing_tiles).unwrap_or(1).max(1);
    let mut nodes = Vec::new();
    for platform in platforms {
        let mut columns: Vec<i32> = (platform.first_column..=platform.last_column)
            .step_by(usize::try_from(spacing).unwrap_or(1))
            .collect();
        if columns.last() != Some(&platform.last_column) {
            columns.push(platform.last_column);
        }
        for column in columns {
            nodes.push(NavNode {
                id: NodeId(nodes.len()),
                platform: platform.id,
                position: Vec2::new(
                    map.column_left(column) + ts * 0.5,
                    platform.surface_y - half.y,
                ),
                column,
                one_way: map.tile(column, platform.row) == Tile::OneWay,
            });
        }
    }
    debug!("sampled {} nodes at spacing {spacing}", nodes.len());
    nodes
}
