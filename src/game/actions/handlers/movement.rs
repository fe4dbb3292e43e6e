// Movement: dash or roll for the length of the lock

use crate::game::actions::config::{ActionConfig, HandlerKind};

use super::{ActionContext, ActionHandler};

#[derive(Debug, Default, Clone, Copy)]
pub struct MovementHandler;

impl MovementHandler {
    fn stop(ctx: &mut ActionContext<'_>) {
        ctx.motion.velocity.x = 0.0;
        ctx.release_hitbox();
    }
}

impl ActionHandler for MovementHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Movement
    }

    fn execute(&self, ctx: &mut ActionContext<'_>, config: &ActionConfig) -> u32 {
        let lock_ms = ctx.play_and_lock(config);

        let Some(spec) = config.movement else {
            log::warn!("movement action {} has no movement spec", ctx.slot);
            return lock_ms;
        };

        ctx.motion.velocity.x = ctx.motion.facing * spec.resolved_speed(lock_ms);
        if spec.invincible {
            ctx.vitals.grant_invincibility(ctx.timers, lock_ms);
        }
        lock_ms
    }

    fn on_complete(&self, ctx: &mut ActionContext<'_>, _config: &ActionConfig) {
        Self::stop(ctx);
    }

    fn interrupt(&self, ctx: &mut ActionContext<'_>, _config: &ActionConfig) {
        Self::stop(ctx);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::game::actions::config::MovementSpec;
    use crate::game::actions::handlers::fixture::Parts;
    use crate::game::characters::events::TimerEvent;

    fn dash(speed: Option<f32>) -> ActionConfig {
        ActionConfig {
            lock_duration_ms: Some(250),
            movement: Some(MovementSpec {
                distance: 5.0,
                speed,
                invincible: true,
            }),
            ..ActionConfig::new(HandlerKind::Movement, "skill_e")
        }
    }

    #[test]
    fn test_explicit_lock_and_speed_from_distance() {
        let config = dash(None);
        let mut parts = Parts::new(&config);

        let lock_ms = MovementHandler.execute(&mut parts.context(1), &config);
        assert_eq!(lock_ms, 250);
        assert_relative_eq!(parts.motion.velocity.x, 20.0);
    }

    #[test]
    fn test_explicit_speed_and_facing() {
        let config = dash(Some(25.0));
        let mut parts = Parts::new(&config);
        parts.motion.facing = -1.0;

        MovementHandler.execute(&mut parts.context(1), &config);
        assert_relative_eq!(parts.motion.velocity.x, -25.0);
    }

    #[test]
    fn test_invincible_for_the_dash() {
        let config = dash(None);
        let mut parts = Parts::new(&config);

        MovementHandler.execute(&mut parts.context(1), &config);
        assert!(parts.vitals.is_invincible());

        for (handle, event) in parts.advance(250) {
            if event == TimerEvent::InvincibilityExpired {
                parts.vitals.on_invincibility_expired(handle);
            }
        }
        assert!(!parts.vitals.is_invincible());
    }

    #[test]
    fn test_completion_restores_control() {
        let config = dash(None);
        let mut parts = Parts::new(&config);

        MovementHandler.execute(&mut parts.context(1), &config);
        MovementHandler.on_complete(&mut parts.context(1), &config);
        assert_relative_eq!(parts.motion.velocity.x, 0.0);
    }
}
