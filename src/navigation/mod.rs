//! Navigation graph over level platforms.
//!
//! Standable runs of tiles become [`Platform`]s. Nodes are sampled along
//! each platform at a fixed tile spacing and always at both ends. Edges
//! describe how a body moves between nodes:
//!
//! - [`EdgeKind::Walk`] between neighbouring nodes on one platform,
//! - [`EdgeKind::Jump`] to a node at the same height or higher that a
//!   standing jump can reach with a clear trajectory,
//! - [`EdgeKind::Drop`] to a lower node, either by stepping off a ledge or
//!   by falling through a one-way platform.
//!
//! The graph is built once per level and is read-only afterwards.
mod build;
pub mod path;
pub mod reach;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use build::jump_feasible;

/// Index of a node in [`NavGraph::nodes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Index of an edge in [`NavGraph::edges`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub usize);

/// Index of a platform in [`NavGraph::platforms`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlatformId(pub usize);

/// A maximal horizontal run of standable tiles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    /// Index in [`NavGraph::platforms`].
    pub id: PlatformId,
    /// Tile row of the walking surface.
    pub row: i32,
    /// Leftmost tile column.
    pub first_column: i32,
    /// Rightmost tile column.
    pub last_column: i32,
    /// World y of the walking surface.
    pub surface_y: f32,
    /// World x of the left edge.
    pub left_x: f32,
    /// World x of the right edge.
    pub right_x: f32,
    /// Every tile in the run is a one-way platform.
    pub one_way: bool,
}

/// A standing position on a platform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavNode {
    /// Index in [`NavGraph::nodes`].
    pub id: NodeId,
    /// Platform the node stands on.
    pub platform: PlatformId,
    /// Hitbox centre of a body standing here.
    pub position: Vec2,
    /// Tile column underfoot.
    pub column: i32,
    /// The tile underfoot is a one-way platform.
    pub one_way: bool,
}

/// Traversal kind of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Stay on the platform.
    Walk,
    /// Leave the ground with a jump.
    Jump,
    /// Fall off or through the platform.
    Drop,
}

/// How a [`EdgeKind::Drop`] edge leaves its platform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum DropStyle {
    /// Walk off the ledge in `direction` (`-1.0` or `1.0`).
    StepOff {
        /// Sign of the horizontal walk-off direction.
        direction: f32,
    },
    /// Drop through the one-way platform underfoot.
    FallThrough,
}

/// Directed, weighted connection between two nodes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavEdge {
    /// Index in [`NavGraph::edges`].
    pub id: EdgeId,
    /// Start node.
    pub from: NodeId,
    /// End node.
    pub to: NodeId,
    /// How the edge is traversed.
    pub kind: EdgeKind,
    /// A* weight; never negative.
    pub cost: f32,
    /// Set for drop edges only.
    pub drop: Option<DropStyle>,
}

/// Platforms, nodes and edges for one level.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NavGraph {
    platforms: Vec<Platform>,
    nodes: Vec<NavNode>,
    edges: Vec<NavEdge>,
    outgoing: Vec<Vec<EdgeId>>,
    half_extents: Vec2,
    heuristic_scale: f32,
}

/// Vertical slack when deciding which platform a body stands on.
const STANDING_TOLERANCE: f32 = 1.0;

impl NavGraph {
    /// Platforms in scan order.
    #[must_use]
    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    /// Nodes grouped by platform.
    #[must_use]
    pub fn nodes(&self) -> &[NavNode] {
        &self.nodes
    }

    /// Every edge.
    #[must_use]
    pub fn edges(&self) -> &[NavEdge] {
        &self.edges
    }

    /// True when the level has nowhere to stand.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&NavNode> {
        self.nodes.get(id.0)
    }

    /// Looks up an edge.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&NavEdge> {
        self.edges.get(id.0)
    }

    /// Looks up a platform.
    #[must_use]
    pub fn platform(&self, id: PlatformId) -> Option<&Platform> {
        self.platforms.get(id.0)
    }

    /// Outgoing edges of `node`.
    pub fn edges_from(&self, node: NodeId) -> impl Iterator<Item = &NavEdge> + '_ {
        self.outgoing
            .get(node.0)
            .into_iter()
            .flatten()
            .filter_map(|id| self.edges.get(id.0))
    }

    /// First edge from `from` to `to`, if any.
    #[must_use]
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<&NavEdge> {
        self.edges_from(from).find(|e| e.to == to)
    }

    /// Lower bound on the cost of travelling from `a` to `b`.
    #[must_use]
    pub fn heuristic(&self, a: NodeId, b: NodeId) -> f32 {
        match (self.node(a), self.node(b)) {
            (Some(from), Some(to)) => from.position.distance(to.position) * self.heuristic_scale,
            _ => 0.0,
        }
    }

    /// Platform whose surface the hitbox centred at `position` rests on.
    #[must_use]
    pub fn platform_under(&self, position: Vec2) -> Option<PlatformId> {
        let half = self.half_extents;
        let feet = position.y + half.y;
        self.platforms
            .iter()
            .find(|p| {
                (feet - p.surface_y).abs() <= STANDING_TOLERANCE
                    && position.x + half.x > p.left_x
                    && position.x - half.x < p.right_x
            })
            .map(|p| p.id)
    }

    /// Node closest to `position` in a straight line.
    #[must_use]
    pub fn nearest_node(&self, position: Vec2) -> Option<NodeId> {
        self.closest(position, |_| true)
    }

    /// Node a body at `position` should plan from: the closest node on the
    /// platform it stands on, or the closest node overall when airborne.
    #[must_use]
    pub fn locate(&self, position: Vec2) -> Option<NodeId> {
        match self.platform_under(position) {
            Some(platform) => self.closest(position, |n| n.platform == platform),
            None => self.nearest_node(position),
        }
    }

    fn closest(&self, position: Vec2, keep: impl Fn(&NavNode) -> bool) -> Option<NodeId> {
        self.nodes
            .iter()
            .filter(|n| keep(n))
            .min_by(|a, b| {
                a.position
                    .distance_squared(position)
                    .total_cmp(&b.position.distance_squared(position))
            })
            .map(|n| n.id)
    }

    /// Cheapest edge sequence from `from` to `to`; see [`path::find_path`].
    #[must_use]
    pub fn find_path(&self, from: NodeId, to: NodeId) -> Option<Vec<EdgeId>> {
        path::find_path(self, from, to)
    }
}
