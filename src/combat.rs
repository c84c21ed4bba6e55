//! Combat rule engine.
//!
//! Classifies character contacts as stomps, bonks or harmless bumps and
//! produces the eliminations for a tick. A stomp is landing on someone from
//! above while falling; a bonk is hitting someone from below while rising
//! and kills the *rising* character.
use glam::Vec2;
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::character::CharacterId;
use crate::collision::Contact;
use crate::config::CombatConfig;
use crate::geometry::{DOWN, UP};

/// How a single contact resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactOutcome {
    /// The actor landed on the other character and kills it.
    Stomp,
    /// The actor hit the other character from below and dies.
    Bonk,
    /// Nothing happens beyond physical separation.
    Bump,
}

/// Cause of an elimination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EliminationKind {
    /// Landed on the victim from above.
    Stomp,
    /// Rose into the killer from below.
    Bonk,
}

/// One kill produced this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elimination {
    /// Character credited with the kill.
    pub killer: CharacterId,
    /// Character removed from play.
    pub victim: CharacterId,
    /// How the kill happened.
    pub kind: EliminationKind,
}

/// Classifies a contact from the actor's perspective.
///
/// `actor_pre_vy` is the actor's vertical velocity before collision
/// resolution this tick; positive is downward.
///
/// # Examples
/// ```
/// use brawl::character::CharacterId;
/// use brawl::collision::Contact;
/// use brawl::combat::{classify, ContactOutcome};
/// use brawl::geometry::UP;
/// use glam::Vec2;
/// let contact = Contact {
///     actor: CharacterId(1),
///     other: CharacterId(2),
///     normal: UP,
///     relative_velocity: Vec2::new(0.0, 200.0),
/// };
/// assert_eq!(classify(&contact, 200.0, 0.7), ContactOutcome::Stomp);
/// assert_eq!(classify(&contact, 0.0, 0.7), ContactOutcome::Bump);
/// ```
#[must_use]
pub fn classify(contact: &Contact, actor_pre_vy: f32, threshold: f32) -> ContactOutcome {
    if contact.normal.dot(UP) >= threshold && actor_pre_vy > 0.0 {
        ContactOutcome::Stomp
    } else if contact.normal.dot(DOWN) >= threshold && actor_pre_vy < 0.0 {
        ContactOutcome::Bonk
    } else {
        ContactOutcome::Bump
    }
}

fn pair_key(a: CharacterId, b: CharacterId) -> (CharacterId, CharacterId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Resolves every contact of a tick into eliminations.
///
/// Contacts are read in order. A pair is decided at most once, and a
/// character already eliminated this tick can neither die again nor score.
/// Only characters in `eligible` (alive and unprotected at the start of
/// resolution) take part.
#[must_use]
pub fn resolve_eliminations<S, T>(
    contacts: &[Contact],
    pre_velocities: &HashMap<CharacterId, Vec2, S>,
    eligible: &HashSet<CharacterId, T>,
    config: &CombatConfig,
) -> Vec<Elimination>
where
    S: std::hash::BuildHasher,
    T: std::hash::BuildHasher,
{
    let mut decided: HashSet<(CharacterId, CharacterId)> = HashSet::new();
    let mut eliminated: HashSet<CharacterId> = HashSet::new();
    let mut out = Vec::new();
    for contact in contacts {
        if !eligible.contains(&contact.actor) || !eligible.contains(&contact.other) {
            continue;
        }
        if eliminated.contains(&contact.actor) || eliminated.contains(&contact.other) {
            continue;
        }
        let key = pair_key(contact.actor, contact.other);
        if decided.contains(&key) {
            continue;
        }
        let pre_vy = pre_velocities.get(&contact.actor).map_or(0.0, |v| v.y);
        let elimination = match classify(contact, pre_vy, config.stomp_normal_threshold) {
            ContactOutcome::Stomp => Elimination {
                killer: contact.actor,
                victim: contact.other,
                kind: EliminationKind::Stomp,
            },
            ContactOutcome::Bonk => Elimination {
                killer: contact.other,
                victim: contact.actor,
                kind: EliminationKind::Bonk,
            },
            ContactOutcome::Bump => continue,
        };
        decided.insert(key);
        eliminated.insert(elimination.victim);
        out.push(elimination);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn contact(actor: u32, other: u32, normal: Vec2) -> Contact {
        Contact {
            actor: CharacterId(actor),
            other: CharacterId(other),
            normal,
            relative_velocity: Vec2::ZERO,
        }
    }

    fn both(a: u32, b: u32, normal_for_a: Vec2) -> [Contact; 2] {
        [contact(a, b, normal_for_a), contact(b, a, -normal_for_a)]
    }

    #[fixture]
    fn config() -> CombatConfig {
        CombatConfig::default()
    }

    fn all_eligible(ids: &[u32]) -> HashSet<CharacterId> {
        ids.iter().copied().map(CharacterId).collect()
    }

    fn velocities(entries: &[(u32, f32)]) -> HashMap<CharacterId, Vec2> {
        entries
            .iter()
            .map(|&(id, vy)| (CharacterId(id), Vec2::new(0.0, vy)))
            .collect()
    }

    #[rstest]
    #[case::stomp(UP, 250.0, ContactOutcome::Stomp)]
    #[case::resting_on_head(UP, 0.0, ContactOutcome::Bump)]
    #[case::bonk(DOWN, -300.0, ContactOutcome::Bonk)]
    #[case::falling_from_below(DOWN, 50.0, ContactOutcome::Bump)]
    #[case::side(Vec2::new(1.0, 0.0), 250.0, ContactOutcome::Bump)]
    #[case::steep_diagonal(Vec2::new(0.6, -0.8), 100.0, ContactOutcome::Stomp)]
    #[case::shallow_diagonal(Vec2::new(0.8, -0.6), 100.0, ContactOutcome::Bump)]
    fn classifies_by_normal_and_velocity(
        #[case] normal: Vec2,
        #[case] pre_vy: f32,
        #[case] expected: ContactOutcome,
    ) {
        assert_eq!(classify(&contact(1, 2, normal), pre_vy, 0.7), expected);
    }

    #[rstest]
    fn stomp_kills_lower_character(config: CombatConfig) {
        let contacts = both(1, 2, UP);
        let kills = resolve_eliminations(
            &contacts,
            &velocities(&[(1, 300.0), (2, 0.0)]),
            &all_eligible(&[1, 2]),
            &config,
        );
        assert_eq!(
            kills,
            vec![Elimination {
                killer: CharacterId(1),
                victim: CharacterId(2),
                kind: EliminationKind::Stomp
            }]
        );
    }

    #[rstest]
    fn bonk_kills_rising_character(config: CombatConfig) {
        // 1 is below 2 and jumping into it.
        let contacts = both(1, 2, DOWN);
        let kills = resolve_eliminations(
            &contacts,
            &velocities(&[(1, -350.0), (2, 0.0)]),
            &all_eligible(&[1, 2]),
            &config,
        );
        assert_eq!(kills.len(), 1);
        assert_eq!(kills[0].victim, CharacterId(1));
        assert_eq!(kills[0].killer, CharacterId(2));
        assert_eq!(kills[0].kind, EliminationKind::Bonk);
    }

    #[rstest]
    fn rising_into_falling_decides_once(config: CombatConfig) {
        let contacts = both(1, 2, DOWN);
        let kills = resolve_eliminations(
            &contacts,
            &velocities(&[(1, -350.0), (2, 200.0)]),
            &all_eligible(&[1, 2]),
            &config,
        );
        assert_eq!(kills.len(), 1);
        assert_eq!(kills[0].victim, CharacterId(1));
    }

    #[rstest]
    fn protected_characters_are_ignored(config: CombatConfig) {
        let contacts = both(1, 2, UP);
        let kills = resolve_eliminations(
            &contacts,
            &velocities(&[(1, 300.0)]),
            &all_eligible(&[1]),
            &config,
        );
        assert!(kills.is_empty());
    }

    #[rstest]
    fn eliminated_character_cannot_score(config: CombatConfig) {
        // 1 stomps 2; 2 was also landing on 3 but is already gone.
        let mut contacts = both(1, 2, UP).to_vec();
        contacts.extend(both(2, 3, UP));
        let kills = resolve_eliminations(
            &contacts,
            &velocities(&[(1, 300.0), (2, 300.0), (3, 0.0)]),
            &all_eligible(&[1, 2, 3]),
            &config,
        );
        assert_eq!(kills.len(), 1);
        assert_eq!(kills[0].victim, CharacterId(2));
    }

    #[rstest]
    fn side_bumps_never_kill(config: CombatConfig) {
        let contacts = both(1, 2, Vec2::new(-1.0, 0.0));
        let kills = resolve_eliminations(
            &contacts,
            &velocities(&[(1, 300.0), (2, -300.0)]),
            &all_eligible(&[1, 2]),
            &config,
        );
        assert!(kills.is_empty());
    }
}
