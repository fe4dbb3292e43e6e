// Character stats
//
// Per-character numeric tuning. What a character can DO comes from its action
// table; these numbers only scale how fast it moves and how much it can take.

/// Numeric properties of a character
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterStats {
    // Movement
    /// Horizontal speed while walking (units/second)
    pub walk_speed: f32,
    /// Horizontal speed with the run modifier held (units/second)
    pub run_speed: f32,
    /// Upward velocity assigned on jump
    pub jump_force: f32,

    // Combat
    pub max_health: i32,
    pub max_mana: i32,
    /// Outgoing damage bonus in percent
    pub strength: i32,
    /// Incoming damage reduction, 1% per point, capped at 80%
    pub defense: i32,
    /// Characters on the same team never hit each other
    pub team: u8,

    // Dimensions (for the body rectangle)
    /// Character width in world units
    pub width: f32,
    /// Character height in world units
    pub height: f32,

    /// How long the death cinematic holds before respawn takes over
    pub death_lock_ms: u32,
}

/// Baseline fighter stats
pub const BASE_STATS: CharacterStats = CharacterStats {
    walk_speed: 6.0,
    run_speed: 10.0,
    jump_force: 30.0,

    max_health: 100,
    max_mana: 100,
    strength: 0,
    defense: 0,
    team: 0,

    width: 1.0,
    height: 2.0,

    death_lock_ms: 1500,
};

impl Default for CharacterStats {
    fn default() -> Self {
        BASE_STATS
    }
}

impl CharacterStats {
    /// Get the baseline fighter stats
    pub fn standard() -> Self {
        BASE_STATS
    }

    /// Same stats on a different team
    pub fn with_team(mut self, team: u8) -> Self {
        self.team = team;
        self
    }

    pub fn with_defense(mut self, defense: i32) -> Self {
        self.defense = defense;
        self
    }

    pub fn with_strength(mut self, strength: i32) -> Self {
        self.strength = strength;
        self
    }

    /// Apply strength to a base damage value
    pub fn outgoing_damage(&self, base: i32) -> i32 {
        (base * (100 + self.strength.max(0)) / 100).max(0)
    }
}
