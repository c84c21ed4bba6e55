//! Behaviour-driven tests for the stomp, despawn and respawn cycle.
//!
//! An NPC lands on an idle player; the player drops out of play, returns
//! after the respawn delay with spawn protection, and becomes vulnerable
//! again once protection lapses.

use brawl::character::{Character, CharacterId, LifeState, Role, SpeedModifier};
use brawl::combat::EliminationKind;
use glam::Vec2;
use std::fmt;
use test_utils::{
    drop_npc_onto, run_ticks, standing_at, ArenaBuilder, FixedSpawn, RecordingSink, FLAT_FLOOR_TOP,
};

/// Where the player comes back, far from the slowed-down killer.
fn respawn_point() -> Vec2 {
    standing_at(450.0, FLAT_FLOOR_TOP)
}

/// Snapshot of a scripted match after a number of ticks.
#[derive(Clone, Default)]
struct StompMatch {
    player: Option<Character>,
    npc: Option<Character>,
    kills: Vec<(CharacterId, CharacterId, EliminationKind)>,
    respawns: usize,
}

impl fmt::Debug for StompMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StompMatch")
            .field("player", &self.player.as_ref().map(|c| c.life))
            .field("kills", &self.kills)
            .finish_non_exhaustive()
    }
}

impl StompMatch {
    fn run(&mut self, ticks: usize) {
        let mut arena = ArenaBuilder::default()
            .build()
            .with_spawn_provider(Box::new(FixedSpawn(respawn_point())));
        let sink = RecordingSink::new();
        arena.add_sink(Box::new(sink.clone()));

        let player = arena.spawn(Role::Player, standing_at(100.0, FLAT_FLOOR_TOP));
        let npc = drop_npc_onto(&mut arena, standing_at(100.0, FLAT_FLOOR_TOP));
        arena.set_speed_modifier(npc, SpeedModifier::Slowdown);

        let reports = run_ticks(&mut arena, ticks);
        self.player = arena.character(player).cloned();
        self.npc = arena.character(npc).cloned();
        self.kills = sink.kills();
        self.respawns = reports.iter().map(|r| r.respawned.len()).sum();
    }

    fn player(&self) -> &Character {
        self.player.as_ref().expect("player simulated")
    }

    fn npc(&self) -> &Character {
        self.npc.as_ref().expect("npc simulated")
    }
}

#[test]
fn stomp_then_respawn() {
    rspec::run(&rspec::given(
        "an NPC falling onto an idle player",
        StompMatch::default(),
        |ctx| {
            ctx.when("one tick runs", |ctx| {
                ctx.before_each(|m| m.run(1));
                ctx.then("the player is despawned and invisible", |m| {
                    assert_eq!(m.player().life, LifeState::Despawned);
                    assert!(!m.player().life.is_visible());
                });
                ctx.then("the NPC scores and bounces", |m| {
                    assert_eq!(m.npc().kills, 1);
                    assert!(m.npc().motion.velocity.y < 0.0);
                });
                ctx.then("observers hear about the stomp", |m| {
                    let npc = m.npc().id;
                    let player = m.player().id;
                    assert_eq!(m.kills, vec![(npc, player, EliminationKind::Stomp)]);
                });
            });

            ctx.when("just under two seconds pass", |ctx| {
                ctx.before_each(|m| m.run(120));
                ctx.then("the player is still waiting", |m| {
                    assert_eq!(m.player().life, LifeState::Despawned);
                    assert_eq!(m.respawns, 0);
                });
            });

            ctx.when("the respawn delay elapses", |ctx| {
                ctx.before_each(|m| m.run(121));
                ctx.then("the player is back, at rest and protected", |m| {
                    let player = m.player();
                    assert_eq!(player.life, LifeState::AliveProtected);
                    assert_eq!(player.position, respawn_point());
                    assert_eq!(player.motion.velocity, Vec2::ZERO);
                    assert_eq!(m.respawns, 1);
                });
                ctx.then("the player collides with tiles but not characters", |m| {
                    let life = m.player().life;
                    assert!(life.is_visible());
                    assert!(life.collides_with_world());
                    assert!(!life.collides_with_characters());
                });
            });

            ctx.when("protection is about to lapse", |ctx| {
                ctx.before_each(|m| m.run(180));
                ctx.then("the player is still protected", |m| {
                    assert_eq!(m.player().life, LifeState::AliveProtected);
                });
            });

            ctx.when("three seconds have passed", |ctx| {
                ctx.before_each(|m| m.run(181));
                ctx.then("the player is vulnerable again", |m| {
                    assert_eq!(m.player().life, LifeState::AliveUnprotected);
                    assert_eq!(m.kills.len(), 1);
                });
            });
        },
    ));
}
