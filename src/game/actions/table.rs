// Action tables: the per-kind mapping from action slot to configuration

use std::collections::HashMap;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::game::characters::hitbox::{HitboxShape, HitboxStep, TargetPolicy};
use crate::game::characters::ActionSlot;

use super::config::{
    ActionConfig, ChannelSpec, HandlerKind, MovementSpec, ProjectileSpec, StatusEffect,
};
use super::ConfigError;

/// Read-only set of actions a character kind can perform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionTable {
    actions: HashMap<ActionSlot, ActionConfig>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an action
    pub fn insert(&mut self, slot: ActionSlot, config: ActionConfig) {
        self.actions.insert(slot, config);
    }

    /// Builder-style insert
    pub fn with(mut self, slot: ActionSlot, config: ActionConfig) -> Self {
        self.insert(slot, config);
        self
    }

    pub fn get(&self, slot: ActionSlot) -> Option<&ActionConfig> {
        self.actions.get(&slot)
    }

    pub fn contains(&self, slot: ActionSlot) -> bool {
        self.actions.contains_key(&slot)
    }

    /// Configured slots in a stable order
    pub fn slots(&self) -> Vec<ActionSlot> {
        let mut slots: Vec<_> = self.actions.keys().copied().collect();
        slots.sort();
        slots
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Parse and validate a RON action table
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let table: Self = ron::from_str(source)?;
        table.validate()?;
        Ok(table)
    }

    /// Load and validate a RON action table from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        let table = Self::from_ron_str(&source)?;
        log::info!(
            "loaded {} actions from {}",
            table.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    /// Check every action for settings its handler cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        for slot in self.slots() {
            if let Some(config) = self.get(slot) {
                validate_action(slot, config)?;
            }
        }
        Ok(())
    }

    /// The default fighter kit
    pub fn standard() -> Self {
        Self::new()
            .with(
                ActionSlot::Attack,
                ActionConfig {
                    frame_rate: 12.0,
                    duration_ms: 500,
                    hitbox: Some(HitboxShape {
                        offset: Vec2::new(1.0, 0.0),
                        size: Vec2::new(1.5, 1.5),
                        duration_ms: 150,
                    }),
                    hitbox_delay_ms: 150,
                    damage: 10,
                    knockback: Vec2::new(4.0, 2.0),
                    ..ActionConfig::new(HandlerKind::Melee, "attack")
                },
            )
            .with(
                ActionSlot::AirAttack,
                ActionConfig {
                    frame_rate: 12.0,
                    duration_ms: 333,
                    hitbox: Some(HitboxShape {
                        offset: Vec2::new(0.8, -0.2),
                        size: Vec2::new(1.4, 1.4),
                        duration_ms: 200,
                    }),
                    damage: 8,
                    knockback: Vec2::new(2.0, -3.0),
                    ..ActionConfig::new(HandlerKind::Melee, "air_attack")
                },
            )
            .with(
                ActionSlot::SkillQ,
                ActionConfig {
                    duration_ms: 500,
                    hitbox_sequence: vec![
                        HitboxStep::new(Vec2::new(1.0, 0.0), Vec2::new(1.5, 1.5), 100),
                        HitboxStep::new(Vec2::new(2.0, 0.0), Vec2::new(2.0, 1.0), 150),
                    ],
                    damage: 15,
                    knockback: Vec2::new(6.0, 1.0),
                    mana_cost: 10,
                    cooldown_ms: 1000,
                    ..ActionConfig::new(HandlerKind::Instant, "skill_q")
                },
            )
            .with(
                ActionSlot::SkillW,
                ActionConfig {
                    duration_ms: 500,
                    damage: 12,
                    knockback: Vec2::new(3.0, 1.0),
                    status_effects: vec![StatusEffect::Burn {
                        damage_per_second: 2,
                        duration_ms: 2000,
                    }],
                    mana_cost: 15,
                    cooldown_ms: 800,
                    projectile: Some(ProjectileSpec {
                        offset: Vec2::new(0.8, 0.3),
                        size: Vec2::new(0.5, 0.5),
                        speed: 20.0,
                        lifetime_ms: 1500,
                        delay_ms: 0,
                    }),
                    ..ActionConfig::new(HandlerKind::Projectile, "skill_w")
                },
            )
            .with(
                ActionSlot::SkillE,
                ActionConfig {
                    duration_ms: 300,
                    lock_duration_ms: Some(300),
                    mana_cost: 5,
                    cooldown_ms: 600,
                    movement: Some(MovementSpec {
                        distance: 4.0,
                        speed: None,
                        invincible: true,
                    }),
                    ..ActionConfig::new(HandlerKind::Movement, "skill_e")
                },
            )
            .with(
                ActionSlot::SkillR,
                ActionConfig {
                    duration_ms: 700,
                    lock_duration_ms: Some(700),
                    cooldown_ms: 3000,
                    channel: Some(ChannelSpec {
                        loop_animation: "skill_r_loop".to_string(),
                        tick_interval_ms: 100,
                        heal_per_tick: 2,
                        mana_per_tick: 1,
                        final_heal: 10,
                        final_mana: 0,
                    }),
                    ..ActionConfig::new(HandlerKind::Channeling, "skill_r")
                },
            )
            .with(
                ActionSlot::SkillS,
                ActionConfig {
                    duration_ms: 500,
                    hitbox: Some(HitboxShape {
                        offset: Vec2::ZERO,
                        size: Vec2::new(3.0, 2.0),
                        duration_ms: 240,
                    }),
                    target_policy: TargetPolicy::Multi,
                    damage: 1,
                    knockback: Vec2::new(1.0, 0.0),
                    status_effects: vec![StatusEffect::Stun { duration_ms: 300 }],
                    mana_cost: 30,
                    cooldown_ms: 5000,
                    ..ActionConfig::new(HandlerKind::Instant, "skill_s")
                },
            )
    }
}

fn invalid(slot: ActionSlot, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        slot,
        reason: reason.to_string(),
    }
}

fn validate_action(slot: ActionSlot, config: &ActionConfig) -> Result<(), ConfigError> {
    if config.frame_rate < 0.0 {
        return Err(invalid(slot, "frame rate must not be negative"));
    }
    if config.damage < 0 || config.mana_cost < 0 {
        return Err(invalid(slot, "damage and mana cost must not be negative"));
    }
    if let Some(shape) = &config.hitbox {
        if shape.size.x <= 0.0 || shape.size.y <= 0.0 {
            return Err(invalid(slot, "hitbox size must be positive"));
        }
    }
    if config
        .hitbox_sequence
        .iter()
        .any(|step| step.size.x <= 0.0 || step.size.y <= 0.0)
    {
        return Err(invalid(slot, "hitbox sequence step size must be positive"));
    }
    if !config.hitbox_sequence.is_empty() && config.kind != HandlerKind::Instant {
        return Err(invalid(slot, "hitbox sequences are only supported by instant actions"));
    }

    match config.kind {
        HandlerKind::Movement if config.movement.is_none() => {
            Err(invalid(slot, "movement action needs a movement spec"))
        }
        HandlerKind::Projectile if config.projectile.is_none() => {
            Err(invalid(slot, "projectile action needs a projectile spec"))
        }
        HandlerKind::Channeling => match &config.channel {
            None => Err(invalid(slot, "channeling action needs a channel spec")),
            Some(channel) if channel.tick_interval_ms == 0 => {
                Err(invalid(slot, "channel tick interval must be positive"))
            }
            Some(_) => Ok(()),
        },
        _ => Ok(()),
    }
}
