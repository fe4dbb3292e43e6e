// Projectile: cast, lock, and queue a spawn for the projectile manager

use glam::Vec2;

use crate::game::actions::config::{ActionConfig, HandlerKind};

use super::{ActionContext, ActionHandler, ProjectileRequest};

#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectileHandler;

impl ActionHandler for ProjectileHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Projectile
    }

    fn execute(&self, ctx: &mut ActionContext<'_>, config: &ActionConfig) -> u32 {
        let lock_ms = ctx.play_and_lock(config);

        let Some(spec) = config.projectile else {
            log::warn!("projectile action {} has no projectile spec", ctx.slot);
            return lock_ms;
        };

        let facing = ctx.motion.facing;
        ctx.projectiles.push(ProjectileRequest {
            owner: ctx.owner,
            team: ctx.stats.team,
            slot: ctx.slot,
            position: ctx.motion.position + Vec2::new(spec.offset.x * facing, spec.offset.y),
            velocity: Vec2::new(spec.speed * facing, 0.0),
            size: spec.size,
            lifetime_ms: spec.lifetime_ms,
            delay_ms: spec.delay_ms,
            damage: ctx.stats.outgoing_damage(config.damage),
            knockback: Vec2::new(config.knockback.x * facing, config.knockback.y),
            status_effects: config.status_effects.clone(),
        });
        lock_ms
    }
}
