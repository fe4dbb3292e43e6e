// Game modules: characters, their actions and combat resolution

pub mod actions;
pub mod characters;
pub mod combat;

pub use combat::{resolve_hits, HitEvent};
