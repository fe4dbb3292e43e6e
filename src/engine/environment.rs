// Per-frame environment facts supplied by the outer game loop

/// Everything the state machine needs to know about the world this frame.
///
/// Assembled by the caller (physics for ground contact, UI for overlays) so
/// the combat core has no hidden global state to read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentSnapshot {
    /// Character is touching the ground
    pub grounded: bool,
    /// Vertical velocity (positive = rising)
    pub velocity_y: f32,
    /// A selection or menu overlay is capturing input
    pub overlay_open: bool,
    /// Character is mid-respawn and must not act
    pub respawning: bool,
}

impl Default for EnvironmentSnapshot {
    fn default() -> Self {
        Self::grounded()
    }
}

impl EnvironmentSnapshot {
    /// Standing on the ground with nothing else going on
    pub fn grounded() -> Self {
        Self {
            grounded: true,
            velocity_y: 0.0,
            overlay_open: false,
            respawning: false,
        }
    }

    /// Airborne with the given vertical velocity
    pub fn airborne(velocity_y: f32) -> Self {
        Self {
            grounded: false,
            velocity_y,
            ..Self::grounded()
        }
    }

    /// Check if input should be ignored this frame
    pub fn blocks_input(&self) -> bool {
        self.overlay_open || self.respawning
    }

    /// Check if the character is moving upward
    pub fn is_rising(&self) -> bool {
        !self.grounded && self.velocity_y > 0.0
    }
}
