// Character system
//
// This module contains everything related to fighters:
// - Character entity and management
// - Character stats, health and mana
// - State machine and state lock
// - Animation control and hitboxes

pub mod animation;
pub mod character;
pub mod events;
pub mod hitbox;
pub mod lock;
pub mod manager;
pub mod state;
pub mod stats;
pub mod vitals;

// Re-export commonly used types
pub use animation::{
    AnimationClip, AnimationController, AnimationFrameData, AnimationRegistry, ClipLibrary,
};
pub use character::{Character, CharacterId, Loadout, Motion};
pub use events::{CharacterEvent, TimerEvent};
pub use hitbox::{HitboxRegion, HitboxShape, HitboxStep, TargetPolicy};
pub use lock::StateLock;
pub use manager::CharacterManager;
pub use state::{ActionSlot, ActionState, ActionStateMachine};
pub use stats::CharacterStats;
pub use vitals::Vitals;

use crate::game::actions::HandlerKind;

/// Why an action did not start
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("character has been destroyed")]
    Destroyed,

    #[error("character is dead")]
    Dead,

    #[error("another action holds the lock")]
    Locked,

    #[error("no config for action '{0}'")]
    MissingConfig(ActionSlot),

    #[error("no handler for {0:?} actions")]
    MissingHandler(HandlerKind),

    #[error("on cooldown for another {remaining_ms}ms")]
    OnCooldown { remaining_ms: u64 },

    #[error("not enough mana: need {needed}, have {available}")]
    InsufficientMana { needed: i32, available: i32 },
}
