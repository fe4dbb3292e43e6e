// Game action definitions

/// Represents all possible in-game actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Movement
    MoveLeft,
    MoveRight,
    Run,
    Jump,

    // Combat
    Attack,
    SkillQ,
    SkillW,
    SkillE,
    SkillR,
    SkillS,
}

impl Action {
    /// Skill actions in slot order
    pub const SKILLS: [Action; 5] = [
        Action::SkillQ,
        Action::SkillW,
        Action::SkillE,
        Action::SkillR,
        Action::SkillS,
    ];

    /// Index into the skill slot array, if this is a skill action
    pub fn skill_index(self) -> Option<usize> {
        Self::SKILLS.iter().position(|skill| *skill == self)
    }

    /// Check if this is a movement action (held, not edge-triggered)
    pub fn is_movement(self) -> bool {
        matches!(
            self,
            Action::MoveLeft | Action::MoveRight | Action::Run
        )
    }
}
