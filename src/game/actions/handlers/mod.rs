// Action handlers
//
// One strategy per timing shape. A handler never owns state of its own: it
// receives the character's primitives through an `ActionContext`, wires them
// together for one activation and returns the lock time it asked for.

pub mod channeling;
pub mod instant;
pub mod melee;
pub mod movement;
pub mod projectile;

use std::collections::HashMap;
use std::fmt;

use glam::Vec2;

use crate::engine::Scheduler;
use crate::game::characters::animation::AnimationController;
use crate::game::characters::events::{CharacterEvent, TimerEvent};
use crate::game::characters::hitbox::HitboxRegion;
use crate::game::characters::lock::StateLock;
use crate::game::characters::{ActionSlot, CharacterId, CharacterStats, Motion, Vitals};

use super::config::{ActionConfig, HandlerKind, StatusEffect};

pub use channeling::{ChannelState, ChannelingHandler};
pub use instant::InstantHandler;
pub use melee::MeleeHandler;
pub use movement::MovementHandler;
pub use projectile::ProjectileHandler;

/// Spawn order for the external projectile manager
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileRequest {
    pub owner: CharacterId,
    pub team: u8,
    pub slot: ActionSlot,
    /// World-space spawn point
    pub position: Vec2,
    /// Units per second
    pub velocity: Vec2,
    pub size: Vec2,
    pub lifetime_ms: u32,
    /// Wait this long before launching
    pub delay_ms: u32,
    /// Damage with the owner's strength already applied
    pub damage: i32,
    pub knockback: Vec2,
    pub status_effects: Vec<StatusEffect>,
}

/// Mutable view of one character, lent to a handler for a single call
pub struct ActionContext<'a> {
    pub owner: CharacterId,
    pub slot: ActionSlot,
    /// Identifies the running action instance
    pub serial: u64,
    pub stats: &'a CharacterStats,
    pub timers: &'a mut Scheduler<TimerEvent>,
    pub lock: &'a mut StateLock,
    pub animation: &'a mut AnimationController,
    pub hitbox: Option<&'a mut HitboxRegion>,
    pub vitals: &'a mut Vitals,
    pub motion: &'a mut Motion,
    pub channel: &'a mut Option<ChannelState>,
    pub events: &'a mut Vec<CharacterEvent>,
    pub projectiles: &'a mut Vec<ProjectileRequest>,
}

impl ActionContext<'_> {
    /// Play the action's animation and take the lock for as long as it asks.
    ///
    /// Falls back to the configured nominal duration when neither the
    /// animation nor the config yields a lock time.
    pub fn play_and_lock(&mut self, config: &ActionConfig) -> u32 {
        let played = self.animation.play(
            self.timers,
            &config.animation,
            config.frame_rate,
            config.lock_duration_ms,
        );
        self.lock_for(played, config)
    }

    /// Take the lock for `played` ms, or the nominal duration when that is 0
    pub fn lock_for(&mut self, played: u32, config: &ActionConfig) -> u32 {
        let lock_ms = if played > 0 {
            played
        } else {
            config.duration_ms
        };
        self.lock.lock(self.timers, lock_ms, TimerEvent::LockExpired);
        lock_ms
    }

    /// Move the hitbox onto the owner and hand it over together with the
    /// scheduler. Returns false when the action has no hitbox.
    pub fn with_hitbox(
        &mut self,
        f: impl FnOnce(&mut HitboxRegion, &mut Scheduler<TimerEvent>),
    ) -> bool {
        let Some(hitbox) = self.hitbox.as_deref_mut() else {
            return false;
        };
        hitbox.sync_owner(self.motion.position, self.motion.is_facing_left());
        f(hitbox, &mut *self.timers);
        true
    }

    /// Deactivate the action's hitbox, if it has one
    pub fn release_hitbox(&mut self) {
        if let Some(hitbox) = self.hitbox.as_deref_mut() {
            hitbox.deactivate(self.timers);
        }
    }
}

/// One timing shape of action
pub trait ActionHandler: fmt::Debug + Send + Sync {
    /// The config kind this handler runs
    fn kind(&self) -> HandlerKind;

    /// Start the action. Returns the lock duration it acquired.
    fn execute(&self, ctx: &mut ActionContext<'_>, config: &ActionConfig) -> u32;

    /// A periodic tick scheduled by this handler fired
    fn on_tick(&self, _ctx: &mut ActionContext<'_>, _config: &ActionConfig) {}

    /// The lock ran out normally. A hitbox never outlives its action.
    fn on_complete(&self, ctx: &mut ActionContext<'_>, _config: &ActionConfig) {
        ctx.release_hitbox();
    }

    /// The action is being cut short (stop, watchdog, death)
    fn interrupt(&self, ctx: &mut ActionContext<'_>, _config: &ActionConfig) {
        ctx.release_hitbox();
    }
}

/// Static lookup from config kind to handler
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<HandlerKind, Box<dyn ActionHandler>>,
}

impl HandlerRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the five built-in handlers
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(MeleeHandler));
        registry.register(Box::new(ProjectileHandler));
        registry.register(Box::new(MovementHandler));
        registry.register(Box::new(ChannelingHandler));
        registry.register(Box::new(InstantHandler));
        registry
    }

    /// Install a handler for its kind, replacing any previous one
    pub fn register(&mut self, handler: Box<dyn ActionHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn get(&self, kind: HandlerKind) -> Option<&dyn ActionHandler> {
        self.handlers.get(&kind).map(|handler| handler.as_ref())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Noop;

    impl ActionHandler for Noop {
        fn kind(&self) -> HandlerKind {
            HandlerKind::Melee
        }

        fn execute(&self, _ctx: &mut ActionContext<'_>, _config: &ActionConfig) -> u32 {
            0
        }
    }

    #[test]
    fn test_standard_registry_covers_every_kind() {
        let registry = HandlerRegistry::standard();
        assert_eq!(registry.len(), 5);
        for kind in [
            HandlerKind::Melee,
            HandlerKind::Projectile,
            HandlerKind::Movement,
            HandlerKind::Channeling,
            HandlerKind::Instant,
        ] {
            assert_eq!(registry.get(kind).map(|h| h.kind()), Some(kind));
        }
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = HandlerRegistry::standard();
        registry.register(Box::new(Noop));
        assert_eq!(registry.len(), 5);

        let mut config = ActionConfig::new(HandlerKind::Melee, "attack");
        config.duration_ms = 400;
        let mut parts = fixture::Parts::new(&config);
        let handler = registry.get(HandlerKind::Melee).unwrap();
        assert_eq!(handler.execute(&mut parts.context(1), &config), 0);
        assert!(!parts.lock.is_locked());
    }

    #[test]
    fn test_lock_falls_back_to_nominal_duration() {
        let mut config = ActionConfig::new(HandlerKind::Melee, "no_such_animation");
        config.duration_ms = 400;
        let mut parts = fixture::Parts::new(&config);

        let lock_ms = parts.context(1).play_and_lock(&config);
        assert_eq!(lock_ms, 400);
        assert!(parts.lock.is_locked());
        assert_eq!(parts.animation.current_animation(), "idle");
    }
}
