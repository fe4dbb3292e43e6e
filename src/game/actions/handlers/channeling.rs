// Channeling: a held cast with periodic ticks and a payoff at the end.
//
// Ticks are spaced by the channel's tick interval on the scheduler, not run
// every frame. A tick due at the same instant as the lock expiry loses to
// it, so a 700ms channel with 100ms ticks applies six ticks and then the
// final effect. Interrupting skips the final effect.

use crate::engine::TimerHandle;
use crate::game::actions::config::{ActionConfig, ChannelSpec, HandlerKind};
use crate::game::characters::events::{CharacterEvent, TimerEvent};

use super::{ActionContext, ActionHandler};

/// Bookkeeping of the channel in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelState {
    pub serial: u64,
    tick: Option<TimerHandle>,
    ticks_applied: u32,
}

impl ChannelState {
    /// Check if `handle` is this channel's outstanding tick
    pub fn owns_tick(&self, handle: TimerHandle) -> bool {
        self.tick == Some(handle)
    }

    pub fn ticks_applied(&self) -> u32 {
        self.ticks_applied
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ChannelingHandler;

impl ChannelingHandler {
    fn apply(ctx: &mut ActionContext<'_>, heal: i32, mana: i32) {
        let healed = ctx.vitals.heal(heal);
        if healed > 0 {
            ctx.events.push(CharacterEvent::Healed {
                amount: healed,
                health: ctx.vitals.health,
            });
        }
        ctx.vitals.restore_mana(mana);
    }

    fn schedule_tick(ctx: &mut ActionContext<'_>, spec: &ChannelSpec) {
        let serial = ctx.serial;
        if let Some(channel) = ctx.channel.as_mut() {
            channel.tick = Some(
                ctx.timers
                    .schedule(spec.tick_interval_ms, TimerEvent::ChannelTick { serial }),
            );
        }
    }

    fn end(ctx: &mut ActionContext<'_>) -> Option<ChannelState> {
        ctx.release_hitbox();
        let mut channel = ctx.channel.take()?;
        ctx.timers.cancel_slot(&mut channel.tick);
        Some(channel)
    }
}

impl ActionHandler for ChannelingHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Channeling
    }

    fn execute(&self, ctx: &mut ActionContext<'_>, config: &ActionConfig) -> u32 {
        let Some(spec) = &config.channel else {
            log::warn!("channeling action {} has no channel spec", ctx.slot);
            return ctx.play_and_lock(config);
        };

        let explicit = config
            .lock_duration_ms
            .or((config.duration_ms > 0).then_some(config.duration_ms));
        let played = ctx.animation.play_layered(
            ctx.timers,
            &config.animation,
            &spec.loop_animation,
            config.frame_rate,
            explicit,
        );
        let lock_ms = ctx.lock_for(played, config);

        Self::end(ctx);
        *ctx.channel = Some(ChannelState {
            serial: ctx.serial,
            tick: None,
            ticks_applied: 0,
        });
        if spec.tick_interval_ms > 0 {
            Self::schedule_tick(ctx, spec);
        }
        lock_ms
    }

    fn on_tick(&self, ctx: &mut ActionContext<'_>, config: &ActionConfig) {
        let Some(spec) = &config.channel else {
            return;
        };
        match ctx.channel.as_mut() {
            Some(channel) if channel.serial == ctx.serial => {
                channel.tick = None;
                channel.ticks_applied += 1;
            }
            _ => return,
        }
        Self::apply(ctx, spec.heal_per_tick, spec.mana_per_tick);
        Self::schedule_tick(ctx, spec);
    }

    fn on_complete(&self, ctx: &mut ActionContext<'_>, config: &ActionConfig) {
        let Some(channel) = Self::end(ctx) else {
            return;
        };
        if let Some(spec) = &config.channel {
            log::debug!(
                "channel {} complete after {} ticks",
                ctx.slot,
                channel.ticks_applied
            );
            Self::apply(ctx, spec.final_heal, spec.final_mana);
        }
    }

    fn interrupt(&self, ctx: &mut ActionContext<'_>, _config: &ActionConfig) {
        if let Some(channel) = Self::end(ctx) {
            log::debug!(
                "channel {} interrupted after {} ticks",
                ctx.slot,
                channel.ticks_applied
            );
        }
        ctx.lock.force_unlock(ctx.timers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::actions::handlers::fixture::Parts;

    fn meditate() -> ActionConfig {
        ActionConfig {
            lock_duration_ms: Some(700),
            channel: Some(ChannelSpec {
                loop_animation: "skill_r_loop".to_string(),
                tick_interval_ms: 100,
                heal_per_tick: 2,
                mana_per_tick: 1,
                final_heal: 10,
                final_mana: 5,
            }),
            ..ActionConfig::new(HandlerKind::Channeling, "skill_r")
        }
    }

    /// Deliver ticks and the lock expiry the way the owning character does
    fn run(parts: &mut Parts, config: &ActionConfig, dt: u32) {
        let until = parts.timers.now_ms() + u64::from(dt);
        while let Some((handle, event)) = parts.timers.pop_due(until) {
            match event {
                TimerEvent::ChannelTick { serial } => {
                    let owned = parts.channel.is_some_and(|c| c.owns_tick(handle));
                    if owned {
                        ChannelingHandler.on_tick(&mut parts.context(serial), config);
                    }
                }
                TimerEvent::LockExpired => {
                    if parts.lock.on_expired(handle) {
                        ChannelingHandler.on_complete(&mut parts.context(1), config);
                    }
                }
                _ => {}
            }
        }
        parts.timers.settle(until);
    }

    #[test]
    fn test_layered_animation_and_full_lock() {
        let config = meditate();
        let mut parts = Parts::new(&config);

        let lock_ms = ChannelingHandler.execute(&mut parts.context(1), &config);
        assert_eq!(lock_ms, 700);
        assert_eq!(parts.animation.current_animation(), "skill_r");
        assert_eq!(parts.animation.overlay_animation(), Some("skill_r_loop"));
    }

    #[test]
    fn test_ticks_are_throttled() {
        let config = meditate();
        let mut parts = Parts::new(&config);
        parts.vitals.health = 50;
        parts.vitals.mana = 50;

        ChannelingHandler.execute(&mut parts.context(1), &config);

        // Many small frames still only tick once per interval
        for _ in 0..16 {
            run(&mut parts, &config, 16);
        }
        // 256ms in: ticks at 100 and 200
        assert_eq!(parts.channel.map(|c| c.ticks_applied()), Some(2));
        assert_eq!(parts.vitals.health, 54);
        assert_eq!(parts.vitals.mana, 52);
    }

    #[test]
    fn test_completion_applies_final_effect() {
        let config = meditate();
        let mut parts = Parts::new(&config);
        parts.vitals.health = 50;
        parts.vitals.mana = 50;

        ChannelingHandler.execute(&mut parts.context(1), &config);
        run(&mut parts, &config, 700);

        // Six ticks (100..600), the tick due at 700 loses to the lock expiry
        assert_eq!(parts.vitals.health, 50 + 6 * 2 + 10);
        assert_eq!(parts.vitals.mana, 50 + 6 + 5);
        assert!(parts.channel.is_none());
        assert!(!parts.lock.is_locked());
    }

    #[test]
    fn test_interrupt_skips_final_effect() {
        let config = meditate();
        let mut parts = Parts::new(&config);
        parts.vitals.health = 50;

        ChannelingHandler.execute(&mut parts.context(1), &config);
        run(&mut parts, &config, 300);
        ChannelingHandler.interrupt(&mut parts.context(1), &config);

        assert!(!parts.lock.is_locked());
        assert!(parts.channel.is_none());
        assert_eq!(parts.vitals.health, 56);

        // Nothing left to fire
        run(&mut parts, &config, 1000);
        assert_eq!(parts.vitals.health, 56);
    }

    #[test]
    fn test_tick_for_old_serial_is_ignored() {
        let config = meditate();
        let mut parts = Parts::new(&config);
        parts.vitals.health = 50;

        ChannelingHandler.execute(&mut parts.context(2), &config);
        ChannelingHandler.on_tick(&mut parts.context(1), &config);
        assert_eq!(parts.vitals.health, 50);
    }
}
