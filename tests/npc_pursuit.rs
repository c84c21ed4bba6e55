//! End-to-end checks of NPC behaviour driven through the full tick pipeline.

use anyhow::{ensure, Context, Result};
use brawl::ai::Mode;
use brawl::character::Role;
use brawl::level::DEMO_ARENA;
use brawl::{Arena, SimConfig, TileMap};
use rstest::rstest;
use test_utils::{levels, run_ticks, standing_at, ArenaBuilder, FLAT_FLOOR_TOP};

#[rstest]
fn npc_closes_on_an_idle_player() -> Result<()> {
    let mut arena = ArenaBuilder::default().build();
    let player = arena.spawn(Role::Player, standing_at(400.0, FLAT_FLOOR_TOP));
    let npc = arena.spawn(Role::Npc, standing_at(80.0, FLAT_FLOOR_TOP));

    let reports = run_ticks(&mut arena, 240);

    let killed = reports.iter().any(|r| !r.eliminations.is_empty());
    let gap = {
        let p = arena.character(player).context("player exists")?;
        let n = arena.character(npc).context("npc exists")?;
        (p.position.x - n.position.x).abs()
    };
    ensure!(killed || gap < 48.0, "NPC stayed {gap} px away");
    Ok(())
}

#[rstest]
fn npc_jumps_toward_a_raised_player() -> Result<()> {
    let mut arena = ArenaBuilder::default().level(levels::STAIRS).build();
    // Top step spans columns 16..=19, its surface at y = 32.
    arena.spawn(Role::Player, standing_at(290.0, 32.0));
    let npc = arena.spawn(Role::Npc, standing_at(40.0, 128.0));
    let start_y = arena.character(npc).context("npc exists")?.position.y;

    let mut highest = start_y;
    for _ in 0..360 {
        arena.tick();
        let y = arena.character(npc).context("npc exists")?.position.y;
        highest = highest.min(y);
    }
    ensure!(highest < start_y - 40.0, "NPC never left the floor (best {highest})");
    Ok(())
}

#[rstest]
fn lone_npc_idles() -> Result<()> {
    let mut arena = ArenaBuilder::default().build();
    let npc = arena.spawn(Role::Npc, standing_at(200.0, FLAT_FLOOR_TOP));
    run_ticks(&mut arena, 60);
    let planner = arena.planner(npc).context("npc has a planner")?;
    ensure!(planner.mode() == Mode::Idle);
    ensure!(planner.target().is_none());
    let body = arena.character(npc).context("npc exists")?;
    ensure!(body.motion.velocity.x == 0.0);
    Ok(())
}

#[rstest]
fn matches_are_deterministic() -> Result<()> {
    let play = || -> Result<Arena> {
        let map = TileMap::parse(DEMO_ARENA, 16.0)?;
        let mut arena = Arena::new(SimConfig::default(), map);
        arena.populate(4);
        run_ticks(&mut arena, 900);
        Ok(arena)
    };
    let first = play()?;
    let second = play()?;
    ensure!(first.characters() == second.characters());
    ensure!(first.scoreboard() == second.scoreboard());
    Ok(())
}
