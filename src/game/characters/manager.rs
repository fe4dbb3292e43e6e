// Character management

use glam::Vec2;

use crate::engine::input::InputSnapshot;
use crate::engine::EnvironmentSnapshot;
use crate::game::actions::ProjectileRequest;
use crate::game::combat::{self, HitEvent};

use super::character::{Character, CharacterId, Loadout};
use super::events::CharacterEvent;
use super::stats::CharacterStats;

/// Owns every character in a match
#[derive(Debug, Default)]
pub struct CharacterManager {
    characters: Vec<Character>,
    next_id: CharacterId,
}

impl CharacterManager {
    pub fn new() -> Self {
        Self {
            characters: Vec::new(),
            next_id: 0,
        }
    }

    /// Spawn a new character
    pub fn spawn_character(
        &mut self,
        name: &str,
        stats: CharacterStats,
        loadout: Loadout,
        position: Vec2,
    ) -> CharacterId {
        let id = self.next_id;
        self.next_id += 1;

        log::info!("spawned {} (#{}) at ({:.1}, {:.1})", name, id, position.x, position.y);
        self.characters
            .push(Character::new(id, name, stats, loadout, position));
        id
    }

    /// Get a character by ID
    pub fn get(&self, id: CharacterId) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Get a mutable character by ID
    pub fn get_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.id == id)
    }

    /// Get all characters
    pub fn all(&self) -> &[Character] {
        &self.characters
    }

    /// Get all characters mutably
    pub fn all_mut(&mut self) -> &mut [Character] {
        &mut self.characters
    }

    /// Advance every character one frame, then resolve combat.
    ///
    /// `frame` supplies each character's input and environment; it stands in
    /// for the input and physics collaborators.
    pub fn update<F>(&mut self, dt_ms: u32, mut frame: F) -> Vec<HitEvent>
    where
        F: FnMut(&Character) -> (InputSnapshot, EnvironmentSnapshot),
    {
        for character in &mut self.characters {
            let (input, env) = frame(character);
            character.update(dt_ms, &input, &env);
        }
        combat::resolve_hits(&mut self.characters)
    }

    /// Take every character's queued events
    pub fn drain_events(&mut self) -> Vec<(CharacterId, CharacterEvent)> {
        self.characters
            .iter_mut()
            .flat_map(|c| {
                let id = c.id;
                c.drain_events().into_iter().map(move |event| (id, event))
            })
            .collect()
    }

    /// Take every character's queued projectile spawns
    pub fn drain_projectiles(&mut self) -> Vec<ProjectileRequest> {
        self.characters
            .iter_mut()
            .flat_map(|c| c.drain_projectiles())
            .collect()
    }

    /// Respawn a character. Returns false for unknown IDs.
    pub fn respawn(&mut self, id: CharacterId, position: Vec2) -> bool {
        match self.get_mut(id) {
            Some(character) => {
                character.respawn(position);
                true
            }
            None => false,
        }
    }

    /// Remove a character by ID, cancelling everything it had scheduled
    pub fn remove(&mut self, id: CharacterId) -> Option<Character> {
        let pos = self.characters.iter().position(|c| c.id == id)?;
        let mut character = self.characters.remove(pos);
        character.destroy();
        Some(character)
    }

    /// Tear down every character (scene end)
    pub fn clear(&mut self) {
        for character in &mut self.characters {
            character.destroy();
        }
        self.characters.clear();
    }

    /// Get the number of characters
    pub fn count(&self) -> usize {
        self.characters.len()
    }

    /// Get the number of alive characters
    pub fn alive_count(&self) -> usize {
        self.characters.iter().filter(|c| c.is_alive()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::characters::ActionState;

    fn manager_with_two() -> (CharacterManager, CharacterId, CharacterId) {
        let mut manager = CharacterManager::new();
        let hero = manager.spawn_character(
            "hero",
            CharacterStats::standard(),
            Loadout::standard(),
            Vec2::ZERO,
        );
        let dummy = manager.spawn_character(
            "dummy",
            CharacterStats::standard().with_team(1),
            Loadout::standard(),
            Vec2::new(1.5, 0.0),
        );
        (manager, hero, dummy)
    }

    #[test]
    fn test_character_manager_new() {
        let manager = CharacterManager::new();
        assert_eq!(manager.count(), 0);
    }

    #[test]
    fn test_spawn_assigns_ids() {
        let (manager, hero, dummy) = manager_with_two();
        assert_eq!((hero, dummy), (0, 1));
        assert_eq!(manager.count(), 2);
        assert_eq!(manager.get(dummy).map(|c| c.name.as_str()), Some("dummy"));
    }

    #[test]
    fn test_update_resolves_combat() {
        let (mut manager, hero, dummy) = manager_with_two();

        let mut hits = Vec::new();
        for frame in 0..20 {
            hits.extend(manager.update(16, |c| {
                let input = InputSnapshot {
                    attack_pressed: c.id == hero && frame == 0,
                    ..Default::default()
                };
                (input, EnvironmentSnapshot::grounded())
            }));
        }
        assert_eq!(hits.len(), 1);
        assert_eq!(manager.get(dummy).map(|c| c.health()), Some(90));

        let events = manager.drain_events();
        assert!(events.contains(&(
            dummy,
            CharacterEvent::Damaged {
                amount: 10,
                health: 90
            }
        )));
    }

    #[test]
    fn test_respawn_and_alive_count() {
        let (mut manager, _, dummy) = manager_with_two();
        if let Some(c) = manager.get_mut(dummy) {
            c.take_damage(1000);
        }
        assert_eq!(manager.alive_count(), 1);

        assert!(manager.respawn(dummy, Vec2::new(3.0, 0.0)));
        assert_eq!(manager.alive_count(), 2);
        assert_eq!(manager.get(dummy).map(|c| c.state()), Some(ActionState::Idle));
        assert!(!manager.respawn(99, Vec2::ZERO));
    }

    #[test]
    fn test_remove_destroys() {
        let (mut manager, hero, _) = manager_with_two();
        let removed = manager.remove(hero).unwrap();
        assert!(removed.is_destroyed());
        assert_eq!(removed.pending_timers(), 0);
        assert_eq!(manager.count(), 1);
        assert!(manager.remove(hero).is_none());

        manager.clear();
        assert_eq!(manager.count(), 0);
    }
}
