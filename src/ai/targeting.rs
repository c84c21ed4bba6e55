//! Shared target cache.
//!
//! NPCs choose whom to hunt from a snapshot of living characters refreshed
//! on a fixed interval rather than scanning the roster every tick.
use glam::Vec2;

use crate::character::{Character, CharacterId};

/// Position of a living character when the cache was last refreshed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetSnapshot {
    /// Character the snapshot belongs to.
    pub id: CharacterId,
    /// Hitbox centre at refresh time.
    pub position: Vec2,
}

/// Periodically refreshed list of hunt candidates.
#[derive(Clone, Debug, Default)]
pub struct TargetCache {
    entries: Vec<TargetSnapshot>,
    until_refresh: f32,
}

impl TargetCache {
    /// Counts down and refreshes from `roster` when the interval elapses.
    /// A fresh cache refreshes on its first call.
    pub fn advance(&mut self, dt: f32, interval: f32, roster: &[Character]) {
        self.until_refresh -= dt;
        if self.until_refresh <= 0.0 {
            self.refresh(roster);
            self.until_refresh = interval;
        }
    }

    /// Rebuilds the snapshot immediately.
    pub fn refresh(&mut self, roster: &[Character]) {
        self.entries = roster
            .iter()
            .filter(|c| c.is_alive())
            .map(|c| TargetSnapshot {
                id: c.id,
                position: c.position,
            })
            .collect();
    }

    /// Candidates in roster order.
    #[must_use]
    pub fn entries(&self) -> &[TargetSnapshot] {
        &self.entries
    }

    /// Nearest cached candidate other than `seeker` that is still alive in
    /// the live `roster`.
    #[must_use]
    pub fn nearest(&self, seeker: &Character, roster: &[Character]) -> Option<CharacterId> {
        let alive = |id: CharacterId| roster.iter().any(|c| c.id == id && c.is_alive());
        self.entries
            .iter()
            .filter(|e| e.id != seeker.id && alive(e.id))
            .min_by(|a, b| {
                a.position
                    .distance_squared(seeker.position)
                    .total_cmp(&b.position.distance_squared(seeker.position))
            })
            .map(|e| e.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{LifeState, Role};
    use rstest::rstest;

    fn at(id: u32, x: f32) -> Character {
        Character::new(CharacterId(id), Role::Npc, Vec2::new(x, 0.0))
    }

    #[rstest]
    fn picks_nearest_other_living_character() {
        let roster = vec![at(1, 0.0), at(2, 50.0), at(3, -20.0)];
        let mut cache = TargetCache::default();
        cache.advance(1.0 / 60.0, 0.5, &roster);
        assert_eq!(cache.nearest(&roster[0], &roster), Some(CharacterId(3)));
    }

    #[rstest]
    fn skips_characters_that_died_since_refresh() {
        let mut roster = vec![at(1, 0.0), at(2, 50.0), at(3, -20.0)];
        let mut cache = TargetCache::default();
        cache.refresh(&roster);
        roster[2].life = LifeState::Despawned;
        assert_eq!(cache.nearest(&roster[0], &roster), Some(CharacterId(2)));
    }

    #[rstest]
    fn refreshes_only_on_interval() {
        let mut roster = vec![at(1, 0.0)];
        let mut cache = TargetCache::default();
        cache.advance(0.1, 0.5, &roster);
        roster.push(at(2, 10.0));
        cache.advance(0.1, 0.5, &roster);
        assert_eq!(cache.entries().len(), 1);
        for _ in 0..5 {
            cache.advance(0.1, 0.5, &roster);
        }
        assert_eq!(cache.entries().len(), 2);
    }

    #[rstest]
    fn alone_means_no_target() {
        let roster = vec![at(1, 0.0)];
        let mut cache = TargetCache::default();
        cache.refresh(&roster);
        assert_eq!(cache.nearest(&roster[0], &roster), None);
    }
}
