// Per-frame input snapshot consumed by the combat core

use super::action::Action;

/// Dead zone below which horizontal input counts as released
pub const AXIS_DEAD_ZONE: f32 = 0.1;

/// Immutable view of one frame's input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    /// Horizontal movement axis (-1 to 1)
    pub horizontal: f32,
    /// Run modifier held
    pub run: bool,
    /// Jump pressed this frame
    pub jump_pressed: bool,
    /// Attack pressed this frame
    pub attack_pressed: bool,
    /// Skill slots Q, W, E, R, S pressed this frame
    pub skill_pressed: [bool; 5],
}

impl InputSnapshot {
    /// Snapshot with no input at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from held and just-pressed actions.
    ///
    /// Movement actions are read from `held`, everything else from `just_pressed`.
    pub fn from_actions(held: &[Action], just_pressed: &[Action]) -> Self {
        let mut snapshot = Self::default();

        for action in held {
            match action {
                Action::MoveLeft => snapshot.horizontal -= 1.0,
                Action::MoveRight => snapshot.horizontal += 1.0,
                Action::Run => snapshot.run = true,
                _ => {}
            }
        }

        for action in just_pressed {
            match action {
                Action::Jump => snapshot.jump_pressed = true,
                Action::Attack => snapshot.attack_pressed = true,
                skill => {
                    if let Some(index) = skill.skill_index() {
                        snapshot.skill_pressed[index] = true;
                    }
                }
            }
        }

        snapshot.horizontal = snapshot.horizontal.clamp(-1.0, 1.0);
        snapshot
    }

    /// Horizontal direction (-1, 0 or 1) after the dead zone
    pub fn direction(&self) -> f32 {
        if self.horizontal > AXIS_DEAD_ZONE {
            1.0
        } else if self.horizontal < -AXIS_DEAD_ZONE {
            -1.0
        } else {
            0.0
        }
    }

    /// Check if horizontal input is present
    pub fn has_horizontal(&self) -> bool {
        self.direction() != 0.0
    }

    /// Check if a skill slot was pressed
    pub fn skill(&self, index: usize) -> bool {
        self.skill_pressed.get(index).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let snapshot = InputSnapshot::empty();
        assert!(!snapshot.has_horizontal());
        assert!(!snapshot.attack_pressed);
        assert!(!snapshot.skill(0));
    }

    #[test]
    fn test_from_actions_movement() {
        let snapshot = InputSnapshot::from_actions(&[Action::MoveRight, Action::Run], &[]);
        assert_eq!(snapshot.direction(), 1.0);
        assert!(snapshot.run);
    }

    #[test]
    fn test_opposite_directions_cancel() {
        let snapshot = InputSnapshot::from_actions(&[Action::MoveLeft, Action::MoveRight], &[]);
        assert!(!snapshot.has_horizontal());
    }

    #[test]
    fn test_from_actions_pressed() {
        let snapshot =
            InputSnapshot::from_actions(&[], &[Action::Jump, Action::Attack, Action::SkillR]);
        assert!(snapshot.jump_pressed);
        assert!(snapshot.attack_pressed);
        assert!(snapshot.skill(3));
        assert!(!snapshot.skill(0));
    }

    #[test]
    fn test_dead_zone() {
        let snapshot = InputSnapshot {
            horizontal: 0.05,
            ..Default::default()
        };
        assert_eq!(snapshot.direction(), 0.0);

        let snapshot = InputSnapshot {
            horizontal: -0.5,
            ..Default::default()
        };
        assert_eq!(snapshot.direction(), -1.0);
    }

    #[test]
    fn test_skill_out_of_range() {
        assert!(!InputSnapshot::empty().skill(9));
    }
}
