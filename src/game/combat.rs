// Combat resolution
//
// Runs once per frame after every character has updated: live hitboxes are
// tested against the bodies of characters on other teams, and each hit is
// applied to the target and reported.

use glam::Vec2;

use crate::core::Rect;
use crate::game::actions::StatusEffect;
use crate::game::characters::{ActionSlot, Character, CharacterId};

/// One landed hit
#[derive(Debug, Clone, PartialEq)]
pub struct HitEvent {
    pub attacker: CharacterId,
    pub target: CharacterId,
    pub slot: ActionSlot,
    /// Damage actually taken after defense
    pub damage: i32,
    /// Velocity given to the target
    pub knockback: Vec2,
    /// Effects for external status systems to apply
    pub status_effects: Vec<StatusEffect>,
    /// The hit brought the target to zero health
    pub lethal: bool,
}

/// Target snapshot taken before any hit lands
struct Body {
    index: usize,
    id: CharacterId,
    team: u8,
    rect: Rect,
}

/// Test every live hitbox against every live opponent and apply the hits
pub fn resolve_hits(characters: &mut [Character]) -> Vec<HitEvent> {
    let bodies: Vec<Body> = characters
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_alive())
        .map(|(index, c)| Body {
            index,
            id: c.id,
            team: c.stats.team,
            rect: c.body_rect(),
        })
        .collect();

    // Detection first, so every hit this frame sees the same positions
    let mut landed = Vec::new();
    for attacker_index in 0..characters.len() {
        let attacker = &mut characters[attacker_index];
        if !attacker.is_alive() {
            continue;
        }
        let team = attacker.stats.team;
        for slot in attacker.active_hitboxes() {
            for body in bodies.iter().filter(|b| b.team != team) {
                // One hit per target per activation, whatever the policy
                let already_hit = attacker
                    .hitbox(slot)
                    .is_some_and(|hitbox| hitbox.has_hit(body.id));
                if already_hit {
                    continue;
                }
                if attacker.check_hit(slot, body.id, &body.rect) {
                    landed.push((attacker_index, body.index, slot));
                }
            }
        }
    }

    let mut hits = Vec::with_capacity(landed.len());
    for (attacker_index, target_index, slot) in landed {
        let attacker = &characters[attacker_index];
        let Some(config) = attacker.action_config(slot) else {
            continue;
        };
        let damage = attacker.stats.outgoing_damage(config.damage);
        let facing = attacker.motion().facing;
        let knockback = Vec2::new(config.knockback.x * facing, config.knockback.y);
        let status_effects = config.status_effects.clone();
        let attacker_id = attacker.id;

        let target = &mut characters[target_index];
        if !target.is_alive() {
            continue;
        }
        let taken = target.take_damage(damage);
        if taken == 0 {
            continue;
        }
        let lethal = !target.is_alive();
        if !lethal {
            target.apply_knockback(knockback);
        }

        log::debug!(
            "{} hit {} with {} for {}",
            attacker_id,
            target.id,
            slot,
            taken
        );
        hits.push(HitEvent {
            attacker: attacker_id,
            target: target.id,
            slot,
            damage: taken,
            knockback,
            status_effects,
            lethal,
        });
    }
    hits
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::engine::input::InputSnapshot;
    use crate::engine::EnvironmentSnapshot;
    use crate::game::characters::{CharacterStats, Loadout};

    fn spawn(id: CharacterId, team: u8, x: f32) -> Character {
        Character::new(
            id,
            "fighter",
            CharacterStats::standard().with_team(team),
            Loadout::standard(),
            Vec2::new(x, 0.0),
        )
    }

    fn step(characters: &mut [Character], dt: u32, attacker_input: InputSnapshot) -> Vec<HitEvent> {
        let env = EnvironmentSnapshot::grounded();
        for (i, c) in characters.iter_mut().enumerate() {
            let input = if i == 0 {
                attacker_input
            } else {
                InputSnapshot::empty()
            };
            c.update(dt, &input, &env);
        }
        resolve_hits(characters)
    }

    fn attack() -> InputSnapshot {
        InputSnapshot {
            attack_pressed: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_melee_hits_once_per_swing() {
        let mut characters = vec![spawn(1, 0, 0.0), spawn(2, 1, 1.5)];

        assert!(step(&mut characters, 16, attack()).is_empty());

        // Wind-up is 150ms; the hitbox then stays open for 150ms
        let mut hits = Vec::new();
        for _ in 0..20 {
            hits.extend(step(&mut characters, 16, InputSnapshot::empty()));
        }
        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!((hit.attacker, hit.target), (1, 2));
        assert_eq!(hit.damage, 10);
        assert_relative_eq!(hit.knockback.x, 4.0);
        assert_eq!(characters[1].health(), 90);
    }

    #[test]
    fn test_same_team_is_never_hit() {
        let mut characters = vec![spawn(1, 0, 0.0), spawn(2, 0, 1.5)];
        step(&mut characters, 16, attack());
        for _ in 0..20 {
            assert!(step(&mut characters, 16, InputSnapshot::empty()).is_empty());
        }
        assert_eq!(characters[1].health(), 100);
    }

    #[test]
    fn test_out_of_reach_misses() {
        let mut characters = vec![spawn(1, 0, 0.0), spawn(2, 1, 6.0)];
        step(&mut characters, 16, attack());
        for _ in 0..20 {
            assert!(step(&mut characters, 16, InputSnapshot::empty()).is_empty());
        }
    }

    #[test]
    fn test_strength_and_mirrored_knockback() {
        let mut attacker = Character::new(
            1,
            "brute",
            CharacterStats::standard().with_strength(50),
            Loadout::standard(),
            Vec2::ZERO,
        );
        // Face left toward the target
        let left = InputSnapshot {
            horizontal: -1.0,
            ..Default::default()
        };
        attacker.update(16, &left, &EnvironmentSnapshot::grounded());
        attacker.set_position(Vec2::ZERO);
        let mut characters = vec![attacker, spawn(2, 1, -1.5)];

        step(&mut characters, 16, attack());
        let mut hits = Vec::new();
        for _ in 0..20 {
            hits.extend(step(&mut characters, 16, InputSnapshot::empty()));
        }
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].damage, 15);
        assert_relative_eq!(hits[0].knockback.x, -4.0);
    }

    #[test]
    fn test_lethal_hit() {
        let mut characters = vec![spawn(1, 0, 0.0), spawn(2, 1, 1.5)];
        characters[1].take_damage(95);

        step(&mut characters, 16, attack());
        let mut hits = Vec::new();
        for _ in 0..20 {
            hits.extend(step(&mut characters, 16, InputSnapshot::empty()));
        }
        assert_eq!(hits.len(), 1);
        assert!(hits[0].lethal);
        assert_eq!(hits[0].damage, 5);
        assert!(!characters[1].is_alive());
    }

    #[test]
    fn test_status_effects_are_reported() {
        let mut characters = vec![spawn(1, 0, 0.0), spawn(2, 1, 0.5)];
        let mut stomp = InputSnapshot::empty();
        stomp.skill_pressed[4] = true; // skill_s: multi-target stun pulse

        let hits = step(&mut characters, 16, stomp);
        assert!(!hits.is_empty());
        assert_eq!(hits[0].slot, ActionSlot::SkillS);
        assert!(matches!(
            hits[0].status_effects.as_slice(),
            [StatusEffect::Stun { .. }]
        ));
    }

    #[test]
    fn test_multi_target_pulse_hits_each_target_once() {
        let mut characters = vec![spawn(1, 0, 0.0), spawn(2, 1, 0.5), spawn(3, 1, -0.5)];
        let mut stomp = InputSnapshot::empty();
        stomp.skill_pressed[4] = true;

        // The pulse stays open for 240ms; run well past it
        let mut hits = step(&mut characters, 16, stomp);
        for _ in 0..40 {
            hits.extend(step(&mut characters, 16, InputSnapshot::empty()));
        }

        let mut targets: Vec<_> = hits.iter().map(|hit| hit.target).collect();
        targets.sort();
        assert_eq!(targets, vec![2, 3]);
        assert_eq!(characters[1].health(), 99);
        assert_eq!(characters[2].health(), 99);
    }
}
