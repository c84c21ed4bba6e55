//! Execution of a planned edge sequence.
use log::trace;

use super::steering::{seek, Seek};
use super::PlannerContext;
use crate::character::Character;
use crate::geometry::sign_outside;
use crate::input::VirtualInput;
use crate::navigation::{DropStyle, EdgeId, EdgeKind, NavEdge, NavNode, NodeId};

/// Where the body is within the current edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// On the take-off platform, lining up.
    Approach,
    /// Jump or drop committed; `left_ground` flips once the body is seen
    /// airborne.
    Airborne { left_ground: bool },
}

/// Result of one execution step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    /// Drive with this input this tick.
    Input(VirtualInput),
    /// The goal node was reached.
    Finished,
    /// No progress for too long, or a traversal landed somewhere else.
    Blocked,
}

/// An A* path being followed.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    edges: Vec<EdgeId>,
    cursor: usize,
    goal: NodeId,
    phase: Phase,
    best_remaining: f32,
    stalled_for: f32,
}

impl Plan {
    /// A plan over `edges` that ends at `goal`.
    #[must_use]
    pub const fn new(edges: Vec<EdgeId>, goal: NodeId) -> Self {
        Self {
            edges,
            cursor: 0,
            goal,
            phase: Phase::Approach,
            best_remaining: f32::INFINITY,
            stalled_for: 0.0,
        }
    }

    /// Node the plan ends at.
    #[must_use]
    pub const fn goal(&self) -> NodeId {
        self.goal
    }

    /// Edges not yet completed.
    #[must_use]
    pub fn remaining(&self) -> &[EdgeId] {
        self.edges.get(self.cursor..).unwrap_or_default()
    }

    /// Edge being traversed.
    #[must_use]
    pub fn current(&self) -> Option<EdgeId> {
        self.edges.get(self.cursor).copied()
    }

    /// True while a committed jump or drop is in flight.
    #[must_use]
    pub const fn is_airborne(&self) -> bool {
        matches!(self.phase, Phase::Airborne { .. })
    }

    fn advance(&mut self) {
        self.cursor += 1;
        self.phase = Phase::Approach;
        self.best_remaining = f32::INFINITY;
        self.stalled_for = 0.0;
    }

    /// Produces this tick's input for `me`.
    pub fn step(&mut self, me: &Character, ctx: &PlannerContext<'_>) -> Step {
        // A completed edge hands straight over to the next one.
        for _ in 0..2 {
            let Some(edge) = self.current().and_then(|id| ctx.graph.edge(id)).copied() else {
                return Step::Finished;
            };
            let (Some(from), Some(to)) = (ctx.graph.node(edge.from), ctx.graph.node(edge.to)) else {
                return Step::Blocked;
            };
            if self.stalled(me, to, ctx) {
                return Step::Blocked;
            }
            let outcome = match edge.kind {
                EdgeKind::Walk => self.walk(me, &edge, to, ctx),
                EdgeKind::Jump => self.jump(me, from, to, ctx),
                EdgeKind::Drop => self.drop(me, &edge, from, to, ctx),
            };
            match outcome {
                Edge::Steer(input) => return Step::Input(input),
                Edge::Failed => return Step::Blocked,
                Edge::Done => {
                    trace!("{} finished edge {:?}", me.id, edge.id);
                    self.advance();
                }
            }
        }
        Step::Input(VirtualInput::IDLE)
    }

    fn stalled(&mut self, me: &Character, to: &NavNode, ctx: &PlannerContext<'_>) -> bool {
        let remaining = me.position.distance(to.position);
        if remaining < self.best_remaining - ctx.ai.progress_epsilon {
            self.best_remaining = remaining;
            self.stalled_for = 0.0;
        } else {
            self.stalled_for += ctx.dt;
        }
        self.stalled_for >= ctx.ai.blocked_timeout
    }

    fn next_edge<'g>(&self, ctx: &'g PlannerContext<'_>) -> Option<&'g NavEdge> {
        self.edges
            .get(self.cursor + 1)
            .and_then(|id| ctx.graph.edge(*id))
    }

    /// Whether the following edge keeps moving the same way without needing
    /// to stop first.
    fn carries_on(&self, direction: f32, ctx: &PlannerContext<'_>) -> bool {
        let Some(next) = self.next_edge(ctx) else {
            return false;
        };
        match (next.kind, next.drop) {
            (EdgeKind::Walk, _) => {
                let (Some(a), Some(b)) = (ctx.graph.node(next.from), ctx.graph.node(next.to)) else {
                    return false;
                };
                sign_outside(b.position.x - a.position.x, 0.0) == direction
            }
            (EdgeKind::Drop, Some(DropStyle::StepOff { direction: d })) => d == direction,
            _ => false,
        }
    }

    fn seek_tuning(me: &Character, brake: bool, ctx: &PlannerContext<'_>) -> Seek {
        Seek {
            deceleration: ctx
                .physics
                .friction_on(me.motion.surface, me.motion.grounded),
            safety: ctx.ai.braking_safety,
            arrival: ctx.ai.arrival_tolerance,
            brake,
        }
    }

    fn walk(&self, me: &Character, edge: &NavEdge, to: &NavNode, ctx: &PlannerContext<'_>) -> Edge {
        let Some(from) = ctx.graph.node(edge.from) else {
            return Edge::Failed;
        };
        let direction = sign_outside(to.position.x - from.position.x, 0.0);
        let carries_on = self.carries_on(direction, ctx);
        let offset = to.position.x - me.position.x;
        let arrived = if carries_on {
            offset * direction <= ctx.ai.arrival_tolerance
        } else {
            offset.abs() <= ctx.ai.arrival_tolerance
        };
        if arrived && me.motion.grounded {
            return Edge::Done;
        }
        let tuning = Self::seek_tuning(me, !carries_on, ctx);
        Edge::Steer(VirtualInput::moving(seek(
            me.position.x,
            to.position.x,
            me.motion.velocity.x,
            &tuning,
        )))
    }

    fn jump(&mut self, me: &Character, from: &NavNode, to: &NavNode, ctx: &PlannerContext<'_>) -> Edge {
        match self.phase {
            Phase::Approach => {
                let offset = from.position.x - me.position.x;
                if me.motion.grounded && offset.abs() <= ctx.ai.jump_alignment_tolerance {
                    self.phase = Phase::Airborne { left_ground: false };
                    let toward = sign_outside(to.position.x - me.position.x, ctx.ai.arrival_tolerance);
                    return Edge::Steer(VirtualInput::moving(toward).with_jump());
                }
                let tuning = Self::seek_tuning(me, true, ctx);
                Edge::Steer(VirtualInput::moving(seek(
                    me.position.x,
                    from.position.x,
                    me.motion.velocity.x,
                    &tuning,
                )))
            }
            Phase::Airborne { left_ground } => {
                if me.motion.grounded && !left_ground {
                    // The jump has not fired yet; keep asking.
                    return Edge::Steer(self.air_steer(me, to, ctx).with_jump());
                }
                self.in_flight(me, to, left_ground, ctx)
            }
        }
    }

    fn drop(
        &mut self,
        me: &Character,
        edge: &NavEdge,
        from: &NavNode,
        to: &NavNode,
        ctx: &PlannerContext<'_>,
    ) -> Edge {
        match (self.phase, edge.drop) {
            (Phase::Approach, Some(DropStyle::StepOff { direction })) => {
                if me.motion.grounded {
                    Edge::Steer(VirtualInput::moving(direction))
                } else {
                    self.phase = Phase::Airborne { left_ground: true };
                    Edge::Steer(self.air_steer(me, to, ctx))
                }
            }
            (Phase::Approach, _) => {
                let offset = from.position.x - me.position.x;
                if me.motion.grounded && offset.abs() <= ctx.ai.jump_alignment_tolerance {
                    self.phase = Phase::Airborne { left_ground: false };
                    return Edge::Steer(VirtualInput::IDLE.with_jump().with_drop());
                }
                let tuning = Self::seek_tuning(me, true, ctx);
                Edge::Steer(VirtualInput::moving(seek(
                    me.position.x,
                    from.position.x,
                    me.motion.velocity.x,
                    &tuning,
                )))
            }
            (Phase::Airborne { left_ground }, _) => {
                if me.motion.grounded && !left_ground {
                    return Edge::Steer(VirtualInput::IDLE.with_jump().with_drop());
                }
                self.in_flight(me, to, left_ground, ctx)
            }
        }
    }

    fn in_flight(&mut self, me: &Character, to: &NavNode, left_ground: bool, ctx: &PlannerContext<'_>) -> Edge {
        if !me.motion.grounded {
            if !left_ground {
                self.phase = Phase::Airborne { left_ground: true };
            }
            return Edge::Steer(self.air_steer(me, to, ctx));
        }
        if ctx.graph.platform_under(me.position) == Some(to.platform) {
            Edge::Done
        } else {
            Edge::Failed
        }
    }

    fn air_steer(&self, me: &Character, to: &NavNode, ctx: &PlannerContext<'_>) -> VirtualInput {
        let tuning = Self::seek_tuning(me, true, ctx);
        VirtualInput::moving(seek(
            me.position.x,
            to.position.x,
            me.motion.velocity.x,
            &tuning,
        ))
    }
}

enum Edge {
    Steer(VirtualInput),
    Done,
    Failed,
}
