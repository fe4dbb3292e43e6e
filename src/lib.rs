// Rusted Combat
//
// Frame-driven combat core for a 2D action game: state locks, animation
// timing, hitboxes, the per-character action state machine and the action
// handlers that tie them together.

pub mod core;
pub mod engine;
pub mod game;

pub use game::actions::{ActionConfig, ActionTable, ConfigError, HandlerRegistry};
pub use game::characters::{
    ActionError, ActionSlot, ActionState, Character, CharacterEvent, CharacterId,
    CharacterManager, CharacterStats, Loadout,
};
