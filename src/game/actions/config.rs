// Static per-action configuration

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::game::characters::hitbox::{HitboxShape, HitboxStep, TargetPolicy};

/// Which handler strategy runs an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    /// Swing with a hitbox, optionally delayed
    #[default]
    Melee,
    /// Cast that spawns a projectile for the projectile manager
    Projectile,
    /// Dash or roll driven by a velocity impulse
    Movement,
    /// Sustained cast with periodic and final effects
    Channeling,
    /// Hitbox or hitbox sequence starting on the first frame
    Instant,
}

/// Lingering effect carried by a hit, applied by external effect systems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEffect {
    Burn { damage_per_second: i32, duration_ms: u32 },
    Slow { factor: f32, duration_ms: u32 },
    Stun { duration_ms: u32 },
}

/// Dash / roll parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementSpec {
    /// Distance covered over the lock duration
    #[serde(default)]
    pub distance: f32,
    /// Explicit speed, overrides distance / duration
    #[serde(default)]
    pub speed: Option<f32>,
    /// Ignore damage for the whole action
    #[serde(default)]
    pub invincible: bool,
}

impl MovementSpec {
    /// Horizontal speed in units/second for a lock of `duration_ms`
    pub fn resolved_speed(&self, duration_ms: u32) -> f32 {
        match self.speed {
            Some(speed) => speed,
            None if duration_ms > 0 => self.distance / (duration_ms as f32 / 1000.0),
            None => 0.0,
        }
    }
}

/// Channel parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Looped animation layered over the entry animation
    pub loop_animation: String,
    /// Spacing of periodic effects
    pub tick_interval_ms: u32,
    #[serde(default)]
    pub heal_per_tick: i32,
    #[serde(default)]
    pub mana_per_tick: i32,
    /// Applied once when the channel completes uninterrupted
    #[serde(default)]
    pub final_heal: i32,
    #[serde(default)]
    pub final_mana: i32,
}

/// Projectile launch parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpec {
    /// Spawn offset from the owner, for a right-facing owner
    pub offset: Vec2,
    pub size: Vec2,
    /// Units per second along the facing direction
    pub speed: f32,
    pub lifetime_ms: u32,
    /// Delay between cast start and launch
    #[serde(default)]
    pub delay_ms: u32,
}

/// Everything needed to run one action. Shared and read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Logical animation name (resolved per sprite set)
    pub animation: String,
    /// Playback rate; 0 uses the clip's own rate
    pub frame_rate: f32,
    /// Nominal duration, used when no animation timing is available
    pub duration_ms: u32,
    /// Lock time independent of the animation (dashes, channels)
    pub lock_duration_ms: Option<u32>,
    /// Watchdog bound; defaults to lock time plus a grace period
    pub max_duration_ms: Option<u32>,
    pub kind: HandlerKind,

    pub hitbox: Option<HitboxShape>,
    pub hitbox_delay_ms: u32,
    pub hitbox_sequence: Vec<HitboxStep>,
    pub target_policy: TargetPolicy,

    pub damage: i32,
    pub knockback: Vec2,
    pub status_effects: Vec<StatusEffect>,

    pub mana_cost: i32,
    pub cooldown_ms: u32,

    pub movement: Option<MovementSpec>,
    pub channel: Option<ChannelSpec>,
    pub projectile: Option<ProjectileSpec>,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            animation: String::new(),
            frame_rate: 0.0,
            duration_ms: 0,
            lock_duration_ms: None,
            max_duration_ms: None,
            kind: HandlerKind::Melee,
            hitbox: None,
            hitbox_delay_ms: 0,
            hitbox_sequence: Vec::new(),
            target_policy: TargetPolicy::Single,
            damage: 0,
            knockback: Vec2::ZERO,
            status_effects: Vec::new(),
            mana_cost: 0,
            cooldown_ms: 0,
            movement: None,
            channel: None,
            projectile: None,
        }
    }
}

impl ActionConfig {
    pub fn new(kind: HandlerKind, animation: &str) -> Self {
        Self {
            kind,
            animation: animation.to_string(),
            ..Self::default()
        }
    }

    /// Check if this action carries any kind of hitbox
    pub fn has_hitbox(&self) -> bool {
        self.hitbox.is_some() || !self.hitbox_sequence.is_empty()
    }
}
