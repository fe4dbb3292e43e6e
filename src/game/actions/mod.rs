// Action system
//
// Static action configuration (what an attack or skill looks like) and the
// handler strategies that turn a configuration into animation, lock and
// hitbox timing on a character.

pub mod config;
pub mod handlers;
pub mod table;

pub use config::{
    ActionConfig, ChannelSpec, HandlerKind, MovementSpec, ProjectileSpec, StatusEffect,
};
pub use handlers::{
    ActionContext, ActionHandler, ChannelState, HandlerRegistry, ProjectileRequest,
};
pub use table::ActionTable;

use crate::game::characters::ActionSlot;

/// Action configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse action table: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Invalid action '{slot}': {reason}")]
    Invalid { slot: ActionSlot, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            slot: ActionSlot::SkillE,
            reason: "movement action needs a movement spec".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid action 'skill_e': movement action needs a movement spec"
        );
    }
}
