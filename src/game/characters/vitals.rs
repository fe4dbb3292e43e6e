// Health, mana and invincibility

use crate::engine::{Scheduler, TimerHandle};

use super::events::TimerEvent;
use super::stats::CharacterStats;

/// Highest fraction of incoming damage defense can absorb
pub const MAX_DAMAGE_REDUCTION: f64 = 0.8;

/// Damage left after defense. Never below 1 for a positive hit.
pub fn mitigated_damage(amount: i32, defense: i32) -> i32 {
    let reduction = (f64::from(defense.max(0)) * 0.01).min(MAX_DAMAGE_REDUCTION);
    let damage = (f64::from(amount) * (1.0 - reduction)).floor() as i32;
    damage.max(1)
}

/// Mutable resource pools of a character
#[derive(Debug, Clone)]
pub struct Vitals {
    pub health: i32,
    pub max_health: i32,
    pub mana: i32,
    pub max_mana: i32,
    pub defense: i32,
    invincible: bool,
    invincibility_timer: Option<TimerHandle>,
}

impl Vitals {
    pub fn new(stats: &CharacterStats) -> Self {
        Self {
            health: stats.max_health,
            max_health: stats.max_health,
            mana: stats.max_mana,
            max_mana: stats.max_mana,
            defense: stats.defense,
            invincible: false,
            invincibility_timer: None,
        }
    }

    /// Apply a hit after defense. Returns the damage actually taken.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        if self.invincible || amount <= 0 || self.health <= 0 {
            return 0;
        }
        let damage = mitigated_damage(amount, self.defense).min(self.health);
        self.health -= damage;
        damage
    }

    /// Restore health up to the maximum. Returns the amount gained.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.health;
        self.health = (self.health + amount.max(0)).min(self.max_health);
        self.health - before
    }

    /// Restore mana up to the maximum. Returns the amount gained.
    pub fn restore_mana(&mut self, amount: i32) -> i32 {
        let before = self.mana;
        self.mana = (self.mana + amount.max(0)).min(self.max_mana);
        self.mana - before
    }

    /// Spend mana if there is enough; otherwise change nothing and return false
    pub fn consume_mana(&mut self, amount: i32) -> bool {
        let amount = amount.max(0);
        if self.mana < amount {
            return false;
        }
        self.mana -= amount;
        true
    }

    pub fn is_depleted(&self) -> bool {
        self.health <= 0
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible
    }

    /// Become invincible for `duration_ms`, replacing any running window
    pub fn grant_invincibility(&mut self, timers: &mut Scheduler<TimerEvent>, duration_ms: u32) {
        timers.cancel_slot(&mut self.invincibility_timer);
        self.invincible = true;
        self.invincibility_timer =
            Some(timers.schedule(duration_ms, TimerEvent::InvincibilityExpired));
    }

    pub fn clear_invincibility(&mut self, timers: &mut Scheduler<TimerEvent>) {
        timers.cancel_slot(&mut self.invincibility_timer);
        self.invincible = false;
    }

    /// Called when an `InvincibilityExpired` timer fires; false for stale timers
    pub fn on_invincibility_expired(&mut self, handle: TimerHandle) -> bool {
        if self.invincibility_timer != Some(handle) {
            return false;
        }
        self.invincibility_timer = None;
        self.invincible = false;
        true
    }

    /// Back to full pools
    pub fn reset(&mut self, timers: &mut Scheduler<TimerEvent>) {
        self.clear_invincibility(timers);
        self.health = self.max_health;
        self.mana = self.max_mana;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vitals() -> Vitals {
        Vitals::new(&CharacterStats::standard())
    }

    #[test]
    fn test_mitigated_damage() {
        assert_eq!(mitigated_damage(10, 0), 10);
        assert_eq!(mitigated_damage(10, 50), 5);
        // Reduction caps at 80%, and a hit always lands for at least 1
        assert_eq!(mitigated_damage(10, 1000), 1);
        assert_eq!(mitigated_damage(1, 79), 1);
    }

    #[test]
    fn test_take_damage_with_defense() {
        let mut v = vitals();
        v.defense = 50;
        assert_eq!(v.take_damage(10), 5);
        assert_eq!(v.health, 95);
    }

    #[test]
    fn test_take_damage_high_defense_floors_at_one() {
        let mut v = vitals();
        v.defense = 1000;
        assert_eq!(v.take_damage(10), 1);
        assert_eq!(v.health, 99);
    }

    #[test]
    fn test_health_clamps_at_zero() {
        let mut v = vitals();
        assert_eq!(v.take_damage(250), 100);
        assert_eq!(v.health, 0);
        assert!(v.is_depleted());
        assert_eq!(v.take_damage(10), 0);
    }

    #[test]
    fn test_heal_and_mana_clamp() {
        let mut v = vitals();
        v.health = 90;
        assert_eq!(v.heal(50), 10);
        assert_eq!(v.health, 100);

        v.mana = 95;
        assert_eq!(v.restore_mana(20), 5);
        assert_eq!(v.mana, 100);
    }

    #[test]
    fn test_consume_mana() {
        let mut v = vitals();
        v.mana = 30;
        assert!(!v.consume_mana(50));
        assert_eq!(v.mana, 30);
        assert!(v.consume_mana(20));
        assert_eq!(v.mana, 10);
    }

    #[test]
    fn test_invincibility_window() {
        let mut timers = Scheduler::new();
        let mut v = vitals();
        v.grant_invincibility(&mut timers, 300);
        assert_eq!(v.take_damage(10), 0);
        assert_eq!(v.health, 100);

        for (handle, event) in timers.advance(300) {
            assert_eq!(event, TimerEvent::InvincibilityExpired);
            assert!(v.on_invincibility_expired(handle));
        }
        assert!(!v.is_invincible());
        assert_eq!(v.take_damage(10), 10);
    }

    #[test]
    fn test_regrant_replaces_timer() {
        let mut timers = Scheduler::new();
        let mut v = vitals();
        v.grant_invincibility(&mut timers, 100);
        v.grant_invincibility(&mut timers, 500);
        assert_eq!(timers.len(), 1);

        assert!(timers.advance(200).is_empty());
        assert!(v.is_invincible());
    }
}
