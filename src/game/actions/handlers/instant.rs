// Instant: hitbox (or hitbox sequence) live from the first frame

use crate::game::actions::config::{ActionConfig, HandlerKind};

use super::{ActionContext, ActionHandler};

#[derive(Debug, Default, Clone, Copy)]
pub struct InstantHandler;

impl ActionHandler for InstantHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Instant
    }

    fn execute(&self, ctx: &mut ActionContext<'_>, config: &ActionConfig) -> u32 {
        let lock_ms = ctx.play_and_lock(config);

        // Step length: explicit step duration, then the step's hitbox, then the lock
        let steps = &config.hitbox_sequence;
        ctx.with_hitbox(|hitbox, timers| {
            if steps.is_empty() {
                hitbox.activate(timers, None);
            } else {
                hitbox.activate_sequence(timers, steps, lock_ms);
            }
        });
        lock_ms
    }
}
