//! NPC planner.
//!
//! Each NPC owns a [`Planner`] that turns the world state into a
//! [`VirtualInput`] every tick. Decisions follow a fixed priority:
//!
//! 1. no living target: idle,
//! 2. target below and within engage range: drive straight at it,
//! 3. a navigation path to the target's node: follow it edge by edge,
//! 4. otherwise: chase directly, hopping when close or stuck.
//!
//! Target selection and path planning run on a fixed cadence; edge
//! execution and the engage check run every tick.
pub mod plan;
pub mod steering;
pub mod targeting;

use log::debug;

use crate::character::{Character, CharacterId, LifeState};
use crate::config::{AiConfig, PhysicsConfig};
use crate::geometry::sign_outside;
use crate::input::VirtualInput;
use crate::navigation::NavGraph;
use plan::{Plan, Step};
use steering::{seek, Seek};
use targeting::TargetCache;

/// Horizontal speed below which a chasing NPC counts as stuck.
const STUCK_SPEED: f32 = 1.0;
/// Time a chasing NPC may stay stuck before it hops.
const STUCK_HOP_DELAY: f32 = 0.15;

/// Read-only world view handed to planners each tick.
#[derive(Clone, Copy, Debug)]
pub struct PlannerContext<'a> {
    /// Navigation graph of the level.
    pub graph: &'a NavGraph,
    /// Every character, dead or alive.
    pub roster: &'a [Character],
    /// Hunt candidates as of the last refresh.
    pub targets: &'a TargetCache,
    /// Physics the NPC obeys.
    pub physics: &'a PhysicsConfig,
    /// Planner tuning.
    pub ai: &'a AiConfig,
    /// Edge length of a level tile.
    pub tile_size: f32,
    /// Fixed timestep.
    pub dt: f32,
}

impl PlannerContext<'_> {
    fn find(&self, id: CharacterId) -> Option<&Character> {
        self.roster.iter().find(|c| c.id == id)
    }
}

/// What the planner is currently doing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    /// No target; stand still.
    Idle,
    /// Target is just below; go straight for it.
    Engage,
    /// Executing a navigation plan.
    FollowPath,
    /// No usable path; steer straight at the target.
    Chase,
}

/// Counters for diagnostics and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlannerStats {
    /// Paths found by A*.
    pub plans_made: u32,
    /// Paths abandoned for lack of progress.
    pub plans_blocked: u32,
}

/// Per-NPC decision state.
#[derive(Clone, Debug)]
pub struct Planner {
    id: CharacterId,
    target: Option<CharacterId>,
    plan: Option<Plan>,
    mode: Mode,
    think_in: f32,
    stuck_for: f32,
    stats: PlannerStats,
}

impl Planner {
    /// A planner that thinks on its first update.
    #[must_use]
    pub fn new(id: CharacterId) -> Self {
        Self::with_phase(id, 0.0)
    }

    /// A planner whose first think is delayed by `phase` seconds, used to
    /// spread planning across ticks.
    #[must_use]
    pub fn with_phase(id: CharacterId, phase: f32) -> Self {
        Self {
            id,
            target: None,
            plan: None,
            mode: Mode::Idle,
            think_in: phase,
            stuck_for: 0.0,
            stats: PlannerStats::default(),
        }
    }

    /// The NPC this planner drives.
    #[must_use]
    pub const fn id(&self) -> CharacterId {
        self.id
    }

    /// Current hunt target.
    #[must_use]
    pub const fn target(&self) -> Option<CharacterId> {
        self.target
    }

    /// Path being followed, if any.
    #[must_use]
    pub const fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    /// Current decision mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Diagnostic counters.
    #[must_use]
    pub const fn stats(&self) -> PlannerStats {
        self.stats
    }

    /// Forgets the target and plan; the next update thinks from scratch.
    pub fn reset(&mut self) {
        self.target = None;
        self.plan = None;
        self.mode = Mode::Idle;
        self.think_in = 0.0;
        self.stuck_for = 0.0;
    }

    /// Decides this tick's input.
    pub fn update(&mut self, ctx: &PlannerContext<'_>) -> VirtualInput {
        let Some(me) = ctx.find(self.id).filter(|c| c.is_alive()) else {
            self.reset();
            return VirtualInput::IDLE;
        };

        self.think_in -= ctx.dt;
        let think = self.think_in <= 0.0;
        if think {
            self.think_in = ctx.ai.planner_interval;
            let chosen = ctx.targets.nearest(me, ctx.roster);
            if chosen != self.target {
                debug!("{} now hunting {chosen:?}", self.id);
                self.plan = None;
            }
            self.target = chosen;
        }

        let Some(target) = self
            .target
            .and_then(|id| ctx.find(id))
            .filter(|t| t.is_alive())
        else {
            self.target = None;
            self.plan = None;
            self.mode = Mode::Idle;
            return VirtualInput::IDLE;
        };

        if let Some(input) = engage(me, target, ctx) {
            self.mode = Mode::Engage;
            return input;
        }
        if think {
            self.replan(me, target, ctx);
        }
        self.follow(me, target, ctx)
    }

    fn replan(&mut self, me: &Character, target: &Character, ctx: &PlannerContext<'_>) {
        let target_node = ctx.graph.locate(target.position);
        if let Some(plan) = &self.plan {
            if plan.is_airborne() || Some(plan.goal()) == target_node {
                return;
            }
        }
        self.plan = None;
        let Some(goal) = target_node else { return };
        let Some(start) = ctx.graph.locate(me.position) else {
            return;
        };
        if let Some(path) = ctx.graph.find_path(start, goal) {
            self.stats.plans_made += 1;
            self.plan = Some(Plan::new(path, goal));
        } else {
            debug!("{} has no path to {}; chasing directly", self.id, target.id);
        }
    }

    fn follow(&mut self, me: &Character, target: &Character, ctx: &PlannerContext<'_>) -> VirtualInput {
        if let Some(plan) = self.plan.as_mut() {
            match plan.step(me, ctx) {
                Step::Input(input) => {
                    self.mode = Mode::FollowPath;
                    return input;
                }
                Step::Finished => self.plan = None,
                Step::Blocked => {
                    debug!("{} blocked on its path; replanning", self.id);
                    self.stats.plans_blocked += 1;
                    self.plan = None;
                    self.replan(me, target, ctx);
                    if let Some(fresh) = self.plan.as_mut() {
                        if let Step::Input(input) = fresh.step(me, ctx) {
                            self.mode = Mode::FollowPath;
                            return input;
                        }
                    }
                    self.plan = None;
                }
            }
        }
        self.mode = Mode::Chase;
        self.chase(me, target, ctx)
    }

    fn chase(&mut self, me: &Character, target: &Character, ctx: &PlannerContext<'_>) -> VirtualInput {
        let offset = target.position - me.position;
        let direction = sign_outside(offset.x, ctx.ai.arrival_tolerance);
        if me.motion.grounded && direction != 0.0 && me.motion.velocity.x.abs() < STUCK_SPEED {
            self.stuck_for += ctx.dt;
        } else {
            self.stuck_for = 0.0;
        }
        let close = offset.x.abs() <= ctx.ai.hop_range && offset.y >= -ctx.tile_size;
        let above = offset.y < -ctx.tile_size && offset.x.abs() <= 3.0 * ctx.tile_size;
        let stuck = self.stuck_for >= STUCK_HOP_DELAY;
        let input = VirtualInput::moving(direction);
        if me.motion.grounded && (close || above || stuck) {
            self.stuck_for = 0.0;
            input.with_jump()
        } else {
            input
        }
    }
}

/// Direct pursuit when the target sits below the NPC inside the engage
/// window. Grounded NPCs only engage from one-way platforms, which they
/// drop through.
fn engage(me: &Character, target: &Character, ctx: &PlannerContext<'_>) -> Option<VirtualInput> {
    if target.life != LifeState::AliveUnprotected {
        return None;
    }
    let offset = target.position - me.position;
    let range = ctx.ai.engage_range;
    if !(offset.y > 0.0 && offset.y <= range.y && offset.x.abs() <= range.x) {
        return None;
    }
    let tuning = Seek {
        deceleration: ctx.physics.friction_on(me.motion.surface, me.motion.grounded),
        safety: ctx.ai.braking_safety,
        arrival: 1.0,
        brake: true,
    };
    let direction = seek(me.position.x, target.position.x, me.motion.velocity.x, &tuning);
    if !me.motion.grounded {
        Some(VirtualInput::moving(direction))
    } else if me.motion.on_one_way {
        Some(VirtualInput::moving(direction).with_jump().with_drop())
    } else {
        None
    }
}
