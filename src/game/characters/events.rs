// Events flowing through a character: timers it schedules for itself and
// notifications it queues for the rest of the game

use super::state::ActionSlot;
use super::ActionError;

/// Payload of a character-owned timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The state lock ran out
    LockExpired,
    /// Upper bound on an action's runtime
    Watchdog { serial: u64 },
    /// A one-shot animation reached its last frame
    AnimationComplete,
    /// Activation timing for one of the character's hitboxes
    Hitbox { slot: ActionSlot, phase: HitboxPhase },
    /// Periodic effect of a channeled action
    ChannelTick { serial: u64 },
    /// Temporary invincibility ran out
    InvincibilityExpired,
    /// The death cinematic window is over
    DeathWindowElapsed,
}

/// Which part of a hitbox activation a timer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitboxPhase {
    /// Delayed activation should start now
    Start,
    /// Current sequence step is over
    StepEnd,
    /// Single activation is over
    Expire,
}

/// Notifications a character queues for the game each frame
#[derive(Debug, Clone, PartialEq)]
pub enum CharacterEvent {
    ActionStarted { slot: ActionSlot },
    ActionRejected { slot: ActionSlot, reason: ActionError },
    ActionFinished { slot: ActionSlot, interrupted: bool },
    Damaged { amount: i32, health: i32 },
    Healed { amount: i32, health: i32 },
    Died,
    /// Hand-off point for the respawn / game-over flow
    DeathSequenceFinished,
    Respawned,
}
