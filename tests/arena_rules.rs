//! Movement and combat rules exercised through the full tick pipeline.

use anyhow::{ensure, Context, Result};
use brawl::character::{LifeState, Role};
use brawl::combat::{Elimination, EliminationKind};
use brawl::geometry::Aabb;
use brawl::input::VirtualInput;
use brawl::SimConfig;
use glam::Vec2;
use rstest::rstest;
use test_utils::{
    drop_npc_onto, levels, run_ticks, standing_at, ArenaBuilder, FLAT_FLOOR_TOP, LEDGE_TOP,
};

/// [`levels::FLAT`] with one NPC spawn point and a player spawn far away.
const ONE_SPAWN: &str = "\
................................
................................
................................
................................
................................
......S..................P......
################################
";

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

#[rstest]
fn drop_through_a_ledge_then_land_on_it_again() -> Result<()> {
    let mut arena = ArenaBuilder::default().level(levels::LEDGE).build();
    let player = arena.spawn(Role::Player, standing_at(280.0, LEDGE_TOP));
    arena.tick();
    let on_ledge = arena.character(player).context("player exists")?;
    ensure!(on_ledge.motion.grounded && on_ledge.motion.on_one_way, "not standing on the ledge");

    arena.set_player_input(VirtualInput::IDLE.with_drop().with_jump());
    arena.tick();
    let dropping = arena.character(player).context("player exists")?;
    ensure!(!dropping.motion.grounded);
    ensure!(dropping.motion.drop_through_timer > 0.0);
    ensure!(dropping.motion.velocity.y >= 0.0, "drop-through must not launch a jump");

    arena.set_player_input(VirtualInput::IDLE);
    run_ticks(&mut arena, 60);
    let below = arena.character(player).context("player exists")?;
    ensure!(close(below.position.y, standing_at(280.0, FLAT_FLOOR_TOP).y), "y = {}", below.position.y);
    ensure!(below.motion.grounded && !below.motion.on_one_way);
    ensure!(below.motion.drop_through_timer == 0.0);

    // With the timer spent the ledge catches a falling body again.
    arena.set_player_input(VirtualInput::IDLE.with_jump());
    run_ticks(&mut arena, 60);
    let relanded = arena.character(player).context("player exists")?;
    ensure!(close(relanded.position.y, standing_at(280.0, LEDGE_TOP).y), "y = {}", relanded.position.y);
    ensure!(relanded.motion.grounded && relanded.motion.on_one_way);
    Ok(())
}

#[rstest]
fn ice_floor_slows_acceleration() -> Result<()> {
    let speed_after = |level: &'static str| -> Result<f32> {
        let mut arena = ArenaBuilder::default().level(level).build();
        let player = arena.spawn(Role::Player, standing_at(40.0, FLAT_FLOOR_TOP));
        arena.tick();
        arena.set_player_input(VirtualInput::moving(1.0));
        run_ticks(&mut arena, 15);
        Ok(arena.character(player).context("player exists")?.motion.velocity.x)
    };
    let walk = SimConfig::default().physics.walk_speed;
    let on_floor = speed_after(levels::FLAT)?;
    let on_ice = speed_after(levels::ICE)?;
    ensure!(on_floor == walk, "floor speed {on_floor}");
    ensure!(on_ice > 0.0 && on_ice < walk * 0.5, "ice speed {on_ice}");
    Ok(())
}

#[rstest]
fn rising_into_a_standing_character_kills_the_riser() -> Result<()> {
    let mut arena = ArenaBuilder::default().level(levels::LEDGE).build();
    let stander = arena.spawn(Role::Player, standing_at(280.0, LEDGE_TOP));
    arena.tick();
    // Below the ledge, jumping up through it into the stander's feet.
    let riser = arena.spawn(Role::Npc, Vec2::new(280.0, LEDGE_TOP + 10.0));
    arena
        .character_mut(riser)
        .context("riser exists")?
        .motion
        .velocity
        .y = -300.0;

    let report = arena.tick();

    ensure!(
        report.eliminations
            == vec![Elimination {
                killer: stander,
                victim: riser,
                kind: EliminationKind::Bonk,
            }],
        "got {:?}",
        report.eliminations
    );
    ensure!(arena.character(riser).context("riser exists")?.life == LifeState::Despawned);
    let survivor = arena.character(stander).context("stander exists")?;
    ensure!(survivor.life == LifeState::AliveUnprotected);
    ensure!(survivor.kills == 1);
    Ok(())
}

#[rstest]
fn respawn_skips_a_spawn_point_someone_stands_on() -> Result<()> {
    let mut arena = ArenaBuilder::default().level(ONE_SPAWN).build();
    let spawn = standing_at(104.0, FLAT_FLOOR_TOP);
    let player = arena.spawn(Role::Player, spawn);
    let npc = drop_npc_onto(&mut arena, spawn);

    let reports = run_ticks(&mut arena, 121);

    ensure!(reports.first().is_some_and(|r| r.eliminations.len() == 1));
    ensure!(reports.iter().any(|r| r.respawned.contains(&player)));
    let half = arena.config().physics.half_extents;
    let camper = arena.character(npc).context("npc exists")?;
    ensure!(
        camper.hitbox(half).penetration(&Aabb::from_center(spawn, half)).is_some(),
        "killer wandered off the spawn point to {}",
        camper.position
    );
    let back = arena.character(player).context("player exists")?;
    ensure!(back.life == LifeState::AliveProtected);
    ensure!(back.position == standing_at(408.0, FLAT_FLOOR_TOP), "respawned at {}", back.position);
    Ok(())
}
