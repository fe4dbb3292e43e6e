// Character state machine

use serde::{Deserialize, Serialize};

use crate::engine::input::InputSnapshot;
use crate::engine::EnvironmentSnapshot;

use super::ActionError;

/// Represents the current state of a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActionState {
    /// Standing still on ground
    #[default]
    Idle,
    /// Moving horizontally on ground
    Walk,
    /// Moving horizontally on ground with the run modifier
    Run,
    /// In the air, moving upward
    Jump,
    /// In the air, moving downward
    JumpDown,
    /// Grounded basic attack
    Attack,
    SkillQ,
    SkillW,
    SkillE,
    SkillR,
    SkillS,
    /// Basic attack started in the air
    AirAttack,
    /// Character is dead
    Death,
}

impl ActionState {
    /// Check if this state is driven by an action handler
    pub fn is_action(&self) -> bool {
        self.slot().is_some()
    }

    /// Check if this state is driven by input and ground contact
    pub fn is_movement(&self) -> bool {
        matches!(
            self,
            Self::Idle | Self::Walk | Self::Run | Self::Jump | Self::JumpDown
        )
    }

    /// Check if the character is in the air
    pub fn is_airborne(&self) -> bool {
        matches!(self, Self::Jump | Self::JumpDown)
    }

    /// Check if the character is on the ground moving
    pub fn is_locomotion(&self) -> bool {
        matches!(self, Self::Walk | Self::Run)
    }

    /// Explicit state changes may only pre-empt states of equal or lower priority
    pub fn priority(&self) -> u8 {
        match self {
            Self::Death => 2,
            state if state.is_action() => 1,
            _ => 0,
        }
    }

    /// Action slot that owns this state, if any
    pub fn slot(&self) -> Option<ActionSlot> {
        match self {
            Self::Attack => Some(ActionSlot::Attack),
            Self::AirAttack => Some(ActionSlot::AirAttack),
            Self::SkillQ => Some(ActionSlot::SkillQ),
            Self::SkillW => Some(ActionSlot::SkillW),
            Self::SkillE => Some(ActionSlot::SkillE),
            Self::SkillR => Some(ActionSlot::SkillR),
            Self::SkillS => Some(ActionSlot::SkillS),
            _ => None,
        }
    }

    /// Get the animation name for this state
    pub fn animation_name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Walk => "walk",
            Self::Run => "run",
            Self::Jump => "jump",
            Self::JumpDown => "jump_down",
            Self::Death => "death",
            state => state.slot().map(|slot| slot.name()).unwrap_or("idle"),
        }
    }
}

/// Invokable action, the key into a character's action table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSlot {
    Attack,
    AirAttack,
    SkillQ,
    SkillW,
    SkillE,
    SkillR,
    SkillS,
}

impl ActionSlot {
    pub const ALL: [ActionSlot; 7] = [
        ActionSlot::Attack,
        ActionSlot::AirAttack,
        ActionSlot::SkillQ,
        ActionSlot::SkillW,
        ActionSlot::SkillE,
        ActionSlot::SkillR,
        ActionSlot::SkillS,
    ];

    /// Skill slots in input order (Q, W, E, R, S)
    pub const SKILLS: [ActionSlot; 5] = [
        ActionSlot::SkillQ,
        ActionSlot::SkillW,
        ActionSlot::SkillE,
        ActionSlot::SkillR,
        ActionSlot::SkillS,
    ];

    /// State the character is in while this action runs
    pub fn state(&self) -> ActionState {
        match self {
            Self::Attack => ActionState::Attack,
            Self::AirAttack => ActionState::AirAttack,
            Self::SkillQ => ActionState::SkillQ,
            Self::SkillW => ActionState::SkillW,
            Self::SkillE => ActionState::SkillE,
            Self::SkillR => ActionState::SkillR,
            Self::SkillS => ActionState::SkillS,
        }
    }

    /// Logical name, also the default animation name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::AirAttack => "air_attack",
            Self::SkillQ => "skill_q",
            Self::SkillW => "skill_w",
            Self::SkillE => "skill_e",
            Self::SkillR => "skill_r",
            Self::SkillS => "skill_s",
        }
    }
}

impl std::fmt::Display for ActionSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One running instance of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveAction {
    pub slot: ActionSlot,
    /// Increments on every action start; lets stale timers recognise themselves
    pub serial: u64,
}

/// State machine that handles character state transitions
#[derive(Debug)]
pub struct ActionStateMachine {
    current_state: ActionState,
    previous_state: ActionState,
    state_time_ms: u64,
    active: Option<ActiveAction>,
    next_serial: u64,
}

impl Default for ActionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionStateMachine {
    pub fn new() -> Self {
        Self {
            current_state: ActionState::Idle,
            previous_state: ActionState::Idle,
            state_time_ms: 0,
            active: None,
            next_serial: 1,
        }
    }

    /// Get the current state
    pub fn state(&self) -> ActionState {
        self.current_state
    }

    /// Get the previous state
    pub fn previous_state(&self) -> ActionState {
        self.previous_state
    }

    /// Get time spent in current state
    pub fn state_time_ms(&self) -> u64 {
        self.state_time_ms
    }

    /// The action currently running, if any
    pub fn active_action(&self) -> Option<ActiveAction> {
        self.active
    }

    /// Transition to a new state. Returns true if the state changed.
    fn transition(&mut self, new_state: ActionState) -> bool {
        if self.current_state == new_state {
            return false;
        }

        log::debug!("state {:?} -> {:?}", self.current_state, new_state);

        // Walk and run swap in place so the locomotion cycle keeps its timing
        let toggle = self.current_state.is_locomotion() && new_state.is_locomotion();

        self.previous_state = self.current_state;
        self.current_state = new_state;
        if !toggle {
            self.state_time_ms = 0;
        }
        if !new_state.is_action() {
            self.active = None;
        }
        true
    }

    /// Advance the time spent in the current state
    pub fn tick(&mut self, dt_ms: u32) {
        self.state_time_ms += u64::from(dt_ms);
    }

    /// Movement state implied by ground contact and input
    fn movement_state(input: &InputSnapshot, env: &EnvironmentSnapshot) -> ActionState {
        if !env.grounded {
            if env.velocity_y > 0.0 {
                ActionState::Jump
            } else {
                ActionState::JumpDown
            }
        } else if input.has_horizontal() {
            if input.run {
                ActionState::Run
            } else {
                ActionState::Walk
            }
        } else {
            ActionState::Idle
        }
    }

    /// Evaluate the per-frame transition rules. Returns true if the state changed.
    ///
    /// Death is terminal until respawn. A held lock freezes any action state.
    /// Everything else follows ground contact and horizontal input.
    pub fn evaluate(
        &mut self,
        input: &InputSnapshot,
        env: &EnvironmentSnapshot,
        locked: bool,
    ) -> bool {
        if self.current_state == ActionState::Death {
            return false;
        }

        if locked && self.current_state.is_action() {
            return false;
        }

        self.transition(Self::movement_state(input, env))
    }

    /// Enter an action state. Only allowed while the lock is free.
    pub fn begin_action(
        &mut self,
        slot: ActionSlot,
        locked: bool,
    ) -> Result<ActiveAction, ActionError> {
        if self.current_state == ActionState::Death {
            return Err(ActionError::Dead);
        }
        if locked {
            return Err(ActionError::Locked);
        }

        let action = ActiveAction {
            slot,
            serial: self.next_serial,
        };
        self.next_serial += 1;

        // Force so that repeating the same action restarts the state clock
        self.previous_state = self.current_state;
        self.current_state = slot.state();
        self.state_time_ms = 0;
        self.active = Some(action);

        log::debug!("action {} started (#{})", slot, action.serial);
        Ok(action)
    }

    /// Leave whatever action is running and fall back to idle or jump
    pub fn fall_back(&mut self, env: &EnvironmentSnapshot) -> bool {
        if self.current_state == ActionState::Death {
            return false;
        }
        self.active = None;
        self.transition(Self::movement_state(&InputSnapshot::empty(), env))
    }

    /// Explicit state change honouring priorities.
    ///
    /// While locked, only a state of equal or higher priority may replace the
    /// current one.
    pub fn request_state(&mut self, new_state: ActionState, locked: bool) -> bool {
        if locked && new_state.priority() < self.current_state.priority() {
            return false;
        }
        if self.current_state == ActionState::Death && new_state != ActionState::Death {
            return false;
        }
        self.transition(new_state)
    }

    /// Kill the character. Death outranks every other state, so this only
    /// fails when the character is already dead.
    pub fn die(&mut self, locked: bool) -> bool {
        if !self.request_state(ActionState::Death, locked) {
            return false;
        }
        self.active = None;
        true
    }

    /// Leave the death state after a respawn
    pub fn respawn(&mut self, env: &EnvironmentSnapshot) {
        self.previous_state = self.current_state;
        self.current_state = Self::movement_state(&InputSnapshot::empty(), env);
        self.state_time_ms = 0;
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walking() -> InputSnapshot {
        InputSnapshot {
            horizontal: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_state() {
        let sm = ActionStateMachine::new();
        assert_eq!(sm.state(), ActionState::Idle);
        assert!(sm.active_action().is_none());
    }

    #[test]
    fn test_walk_and_idle() {
        let mut sm = ActionStateMachine::new();
        let env = EnvironmentSnapshot::grounded();

        assert!(sm.evaluate(&walking(), &env, false));
        assert_eq!(sm.state(), ActionState::Walk);

        sm.evaluate(&InputSnapshot::empty(), &env, false);
        assert_eq!(sm.state(), ActionState::Idle);
        assert_eq!(sm.previous_state(), ActionState::Walk);
    }

    #[test]
    fn test_walk_run_toggle_keeps_state_time() {
        let mut sm = ActionStateMachine::new();
        let env = EnvironmentSnapshot::grounded();

        sm.evaluate(&walking(), &env, false);
        sm.tick(120);

        let running = InputSnapshot {
            run: true,
            ..walking()
        };
        assert!(sm.evaluate(&running, &env, false));
        assert_eq!(sm.state(), ActionState::Run);
        assert_eq!(sm.state_time_ms(), 120);

        // Staying in run is not a transition
        assert!(!sm.evaluate(&running, &env, false));
    }

    #[test]
    fn test_airborne_states() {
        let mut sm = ActionStateMachine::new();
        sm.evaluate(&walking(), &EnvironmentSnapshot::airborne(5.0), false);
        assert_eq!(sm.state(), ActionState::Jump);

        sm.evaluate(&walking(), &EnvironmentSnapshot::airborne(-2.0), false);
        assert_eq!(sm.state(), ActionState::JumpDown);
    }

    #[test]
    fn test_lock_freezes_action_state() {
        let mut sm = ActionStateMachine::new();
        sm.begin_action(ActionSlot::Attack, false).unwrap();
        assert_eq!(sm.state(), ActionState::Attack);

        assert!(!sm.evaluate(&walking(), &EnvironmentSnapshot::airborne(3.0), true));
        assert_eq!(sm.state(), ActionState::Attack);

        // Once unlocked the finished action gives way
        sm.evaluate(&InputSnapshot::empty(), &EnvironmentSnapshot::grounded(), false);
        assert_eq!(sm.state(), ActionState::Idle);
        assert!(sm.active_action().is_none());
    }

    #[test]
    fn test_begin_action_rejected_while_locked() {
        let mut sm = ActionStateMachine::new();
        let result = sm.begin_action(ActionSlot::SkillQ, true);
        assert!(matches!(result, Err(ActionError::Locked)));
        assert_eq!(sm.state(), ActionState::Idle);
    }

    #[test]
    fn test_action_serials_increase() {
        let mut sm = ActionStateMachine::new();
        let first = sm.begin_action(ActionSlot::Attack, false).unwrap();
        let second = sm.begin_action(ActionSlot::Attack, false).unwrap();
        assert!(second.serial > first.serial);
        assert_eq!(sm.active_action(), Some(second));
    }

    #[test]
    fn test_fall_back() {
        let mut sm = ActionStateMachine::new();
        sm.begin_action(ActionSlot::SkillR, false).unwrap();
        sm.fall_back(&EnvironmentSnapshot::airborne(-1.0));
        assert_eq!(sm.state(), ActionState::JumpDown);

        sm.begin_action(ActionSlot::SkillR, false).unwrap();
        sm.fall_back(&EnvironmentSnapshot::grounded());
        assert_eq!(sm.state(), ActionState::Idle);
    }

    #[test]
    fn test_death_wins_and_sticks() {
        let mut sm = ActionStateMachine::new();
        sm.begin_action(ActionSlot::Attack, false).unwrap();
        assert!(sm.request_state(ActionState::Death, true));
        assert_eq!(sm.state(), ActionState::Death);

        assert!(!sm.evaluate(&walking(), &EnvironmentSnapshot::grounded(), false));
        assert!(!sm.request_state(ActionState::Idle, false));
        assert!(matches!(
            sm.begin_action(ActionSlot::Attack, false),
            Err(ActionError::Dead)
        ));
    }

    #[test]
    fn test_request_state_respects_priority() {
        let mut sm = ActionStateMachine::new();
        sm.begin_action(ActionSlot::Attack, false).unwrap();
        assert!(!sm.request_state(ActionState::Idle, true));
        assert!(sm.request_state(ActionState::SkillS, true));
        assert!(sm.request_state(ActionState::Idle, false));
    }

    #[test]
    fn test_respawn() {
        let mut sm = ActionStateMachine::new();
        sm.die(false);
        sm.respawn(&EnvironmentSnapshot::airborne(-1.0));
        assert_eq!(sm.state(), ActionState::JumpDown);
    }

    #[test]
    fn test_animation_names() {
        assert_eq!(ActionState::Idle.animation_name(), "idle");
        assert_eq!(ActionState::JumpDown.animation_name(), "jump_down");
        assert_eq!(ActionState::SkillQ.animation_name(), "skill_q");
        assert_eq!(ActionState::AirAttack.animation_name(), "air_attack");
    }

    #[test]
    fn test_state_categories() {
        assert!(ActionState::Attack.is_action());
        assert!(!ActionState::Death.is_action());
        assert!(ActionState::Jump.is_movement());
        assert!(ActionState::JumpDown.is_airborne());
        assert!(ActionState::Death.priority() > ActionState::SkillS.priority());
    }

    #[test]
    fn test_slot_round_trip_through_state() {
        for slot in ActionSlot::ALL {
            assert_eq!(slot.state().slot(), Some(slot));
        }
    }

    #[test]
    fn test_die_overrides_locked_action() {
        let mut sm = ActionStateMachine::new();
        sm.begin_action(ActionSlot::SkillQ, false).unwrap();

        assert!(sm.die(true));
        assert_eq!(sm.state(), ActionState::Death);
        assert!(sm.active_action().is_none());
        assert!(!sm.die(true));
    }
}
