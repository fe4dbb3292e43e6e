// Melee: swing, lock, then open the hitbox (optionally after a wind-up)

use crate::game::actions::config::{ActionConfig, HandlerKind};

use super::{ActionContext, ActionHandler};

#[derive(Debug, Default, Clone, Copy)]
pub struct MeleeHandler;

impl ActionHandler for MeleeHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Melee
    }

    fn execute(&self, ctx: &mut ActionContext<'_>, config: &ActionConfig) -> u32 {
        let lock_ms = ctx.play_and_lock(config);
        let delay = config.hitbox_delay_ms;
        let armed = ctx.with_hitbox(|hitbox, timers| hitbox.activate_after(timers, delay, None));
        if !armed {
            log::warn!("melee action {} has no hitbox", ctx.slot);
        }
        lock_ms
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::game::actions::handlers::fixture::{shape, Parts};
    use crate::game::characters::events::TimerEvent;

    fn swing(delay: u32) -> ActionConfig {
        ActionConfig {
            hitbox: Some(shape(150)),
            hitbox_delay_ms: delay,
            ..ActionConfig::new(HandlerKind::Melee, "attack")
        }
    }

    #[test]
    fn test_locks_for_animation_length() {
        let config = swing(0);
        let mut parts = Parts::new(&config);

        let lock_ms = MeleeHandler.execute(&mut parts.context(1), &config);
        assert_eq!(lock_ms, 500);
        assert!(parts.lock.is_locked());
        assert_eq!(parts.animation.current_animation(), "attack");
    }

    #[test]
    fn test_immediate_hitbox() {
        let config = swing(0);
        let mut parts = Parts::new(&config);
        parts.motion.position = Vec2::new(3.0, 0.0);

        MeleeHandler.execute(&mut parts.context(1), &config);
        assert!(parts.hitbox.is_active());
        assert_eq!(parts.hitbox.bounds().unwrap().center(), Vec2::new(4.0, 0.0));
    }

    #[test]
    fn test_delayed_hitbox() {
        let config = swing(150);
        let mut parts = Parts::new(&config);

        MeleeHandler.execute(&mut parts.context(1), &config);
        assert!(!parts.hitbox.is_active());
        assert!(parts.hitbox.has_pending_timer());

        for (handle, event) in parts.advance(150) {
            if let TimerEvent::Hitbox { phase, .. } = event {
                parts.hitbox.on_timer(&mut parts.timers, handle, phase);
            }
        }
        assert!(parts.hitbox.is_active());
    }

    #[test]
    fn test_mirrored_when_facing_left() {
        let config = swing(0);
        let mut parts = Parts::new(&config);
        parts.motion.facing = -1.0;

        MeleeHandler.execute(&mut parts.context(1), &config);
        assert_eq!(parts.hitbox.world_offset(), Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_completion_cancels_pending_hitbox() {
        let config = swing(600);
        let mut parts = Parts::new(&config);

        MeleeHandler.execute(&mut parts.context(1), &config);
        assert!(parts.hitbox.has_pending_timer());

        MeleeHandler.on_complete(&mut parts.context(1), &config);
        assert!(!parts.hitbox.has_pending_timer());
        assert!(!parts.hitbox.is_active());
    }
}
