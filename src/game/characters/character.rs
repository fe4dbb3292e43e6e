// Character entity
//
// A character owns every combat primitive (scheduler, lock, animation,
// hitboxes, state machine) and is the only thing that dispatches their
// timers. What it can do comes from its loadout, never from a subclass.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec2;

use crate::core::Rect;
use crate::engine::input::InputSnapshot;
use crate::engine::{EnvironmentSnapshot, Scheduler, TimerHandle};
use crate::game::actions::{
    ActionConfig, ActionContext, ActionTable, ChannelState, HandlerRegistry, ProjectileRequest,
};

use super::animation::{AnimationController, AnimationFrameData, AnimationRegistry, ClipLibrary};
use super::events::{CharacterEvent, TimerEvent};
use super::hitbox::HitboxRegion;
use super::lock::StateLock;
use super::state::{ActionSlot, ActionState, ActionStateMachine};
use super::stats::CharacterStats;
use super::vitals::Vitals;
use super::ActionError;

/// Unique identifier for a character
pub type CharacterId = u32;

/// Extra time an action may overrun its lock before the watchdog steps in
pub const WATCHDOG_GRACE_MS: u32 = 500;

/// Position and velocity, owned by the character and read by the physics
/// collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub position: Vec2,
    /// Units per second (positive y = up)
    pub velocity: Vec2,
    /// 1 = right, -1 = left
    pub facing: f32,
}

impl Default for Motion {
    fn default() -> Self {
        Self::at(Vec2::ZERO)
    }
}

impl Motion {
    /// At rest at `position`, facing right
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            facing: 1.0,
        }
    }

    pub fn is_facing_left(&self) -> bool {
        self.facing < 0.0
    }
}

/// Shared, read-only description of a character kind
#[derive(Debug, Clone)]
pub struct Loadout {
    pub actions: Arc<ActionTable>,
    pub animations: Arc<dyn AnimationRegistry>,
    pub handlers: Arc<HandlerRegistry>,
    /// Animation name prefix ("knight" plays "knight_attack" when it exists)
    pub sprite_set: Option<String>,
}

impl Loadout {
    pub fn new(
        actions: ActionTable,
        animations: impl AnimationRegistry + 'static,
        handlers: HandlerRegistry,
    ) -> Self {
        Self {
            actions: Arc::new(actions),
            animations: Arc::new(animations),
            handlers: Arc::new(handlers),
            sprite_set: None,
        }
    }

    /// The standard fighter: standard actions, clips and handlers
    pub fn standard() -> Self {
        Self::new(
            ActionTable::standard(),
            ClipLibrary::standard(),
            HandlerRegistry::standard(),
        )
    }

    pub fn with_sprite_set(mut self, sprite_set: &str) -> Self {
        self.sprite_set = Some(sprite_set.to_string());
        self
    }
}

/// Which handler hook a timer or interruption maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerCall {
    Tick,
    Complete,
    Interrupt,
}

/// A player- or AI-controlled fighter
#[derive(Debug)]
pub struct Character {
    /// Unique identifier
    pub id: CharacterId,
    /// Character name (for display and logs)
    pub name: String,
    /// Character properties
    pub stats: CharacterStats,

    vitals: Vitals,
    motion: Motion,
    state_machine: ActionStateMachine,
    animation: AnimationController,
    lock: StateLock,
    timers: Scheduler<TimerEvent>,
    /// One region per hitbox-bearing action, reused across activations
    hitboxes: HashMap<ActionSlot, HitboxRegion>,
    loadout: Loadout,

    /// Clock time at which each slot is ready again
    cooldowns: HashMap<ActionSlot, u64>,
    channel: Option<ChannelState>,
    watchdog: Option<TimerHandle>,
    death_timer: Option<TimerHandle>,
    /// Last environment seen, adjusted for this frame's jump
    environment: EnvironmentSnapshot,

    events: Vec<CharacterEvent>,
    projectiles: Vec<ProjectileRequest>,
    destroyed: bool,
}

impl Character {
    /// Create a character standing at `position`
    pub fn new(
        id: CharacterId,
        name: &str,
        stats: CharacterStats,
        loadout: Loadout,
        position: Vec2,
    ) -> Self {
        let mut hitboxes = HashMap::new();
        for slot in loadout.actions.slots() {
            let Some(config) = loadout.actions.get(slot) else {
                continue;
            };
            if config.has_hitbox() {
                let shape = config.hitbox.unwrap_or_default();
                hitboxes.insert(slot, HitboxRegion::new(slot, shape, config.target_policy));
            }
        }

        let animation = AnimationController::new(
            Arc::clone(&loadout.animations),
            loadout.sprite_set.clone(),
        );

        Self {
            id,
            name: name.to_string(),
            vitals: Vitals::new(&stats),
            stats,
            motion: Motion::at(position),
            state_machine: ActionStateMachine::new(),
            animation,
            lock: StateLock::new(),
            timers: Scheduler::new(),
            hitboxes,
            loadout,
            cooldowns: HashMap::new(),
            channel: None,
            watchdog: None,
            death_timer: None,
            environment: EnvironmentSnapshot::grounded(),
            events: Vec::new(),
            projectiles: Vec::new(),
            destroyed: false,
        }
    }

    /// Advance one frame.
    ///
    /// Order within the frame: due timers, input, state evaluation, action
    /// start, hitbox placement. A hitbox opened this frame is already in place
    /// for the combat pass that follows.
    pub fn update(&mut self, dt_ms: u32, input: &InputSnapshot, env: &EnvironmentSnapshot) {
        if self.destroyed {
            return;
        }
        self.environment = *env;

        let until = self.timers.now_ms() + u64::from(dt_ms);
        while let Some((handle, event)) = self.timers.pop_due(until) {
            log::trace!("{}: timer {} -> {:?}", self.name, handle.id(), event);
            self.handle_timer(handle, event);
        }
        self.timers.settle(until);

        if self.state() != ActionState::Death {
            let input = if env.blocks_input() {
                InputSnapshot::empty()
            } else {
                *input
            };

            self.environment = self.apply_locomotion(&input, env);
            self.state_machine
                .evaluate(&input, &self.environment, self.lock.is_locked());

            if let Some(slot) = self.requested_action(&input) {
                // Rejections are logged and queued as events
                let _ = self.try_action(slot);
            }
            self.play_state_animation();
        }

        self.animation
            .set_flip_horizontal(self.motion.is_facing_left());
        self.sync_hitboxes();
        self.state_machine.tick(dt_ms);
        self.animation.update(dt_ms);
    }

    /// Horizontal movement and jump. Returns the environment as the state
    /// machine should see it this frame.
    fn apply_locomotion(
        &mut self,
        input: &InputSnapshot,
        env: &EnvironmentSnapshot,
    ) -> EnvironmentSnapshot {
        let mut env = *env;
        if self.lock.is_locked() {
            return env;
        }

        let direction = input.direction();
        if direction != 0.0 {
            let speed = if input.run {
                self.stats.run_speed
            } else {
                self.stats.walk_speed
            };
            self.motion.velocity.x = direction * speed;
            self.motion.facing = direction;
        } else if env.grounded {
            self.motion.velocity.x = 0.0;
        }

        if input.jump_pressed && env.grounded {
            self.motion.velocity.y = self.stats.jump_force;
            env.grounded = false;
            env.velocity_y = self.stats.jump_force;
        }
        env
    }

    /// Action requested by this frame's input, attack first, then Q..S
    fn requested_action(&self, input: &InputSnapshot) -> Option<ActionSlot> {
        if input.attack_pressed {
            let airborne = !self.environment.grounded;
            if airborne && self.loadout.actions.contains(ActionSlot::AirAttack) {
                return Some(ActionSlot::AirAttack);
            }
            return Some(ActionSlot::Attack);
        }
        ActionSlot::SKILLS
            .iter()
            .enumerate()
            .find(|(index, _)| input.skill(*index))
            .map(|(_, slot)| *slot)
    }

    fn play_state_animation(&mut self) {
        let state = self.state();
        if state.is_movement() {
            self.animation
                .play_looping(&mut self.timers, state.animation_name());
        }
    }

    fn sync_hitboxes(&mut self) {
        let flip = self.motion.is_facing_left();
        for hitbox in self.hitboxes.values_mut() {
            hitbox.sync_owner(self.motion.position, flip);
        }
    }

    /// Start an action if the character is free to.
    ///
    /// Every rejection is logged and queued as `ActionRejected`; callers that
    /// don't care can ignore the result.
    pub fn try_action(&mut self, slot: ActionSlot) -> Result<(), ActionError> {
        let result = self.start_action(slot);
        if let Err(err) = &result {
            log::debug!("{}: {} rejected: {}", self.name, slot, err);
            if *err != ActionError::Destroyed {
                self.events.push(CharacterEvent::ActionRejected {
                    slot,
                    reason: err.clone(),
                });
            }
        }
        result
    }

    fn start_action(&mut self, slot: ActionSlot) -> Result<(), ActionError> {
        if self.destroyed {
            return Err(ActionError::Destroyed);
        }
        if self.state() == ActionState::Death {
            return Err(ActionError::Dead);
        }
        if self.lock.is_locked() {
            return Err(ActionError::Locked);
        }

        let actions = Arc::clone(&self.loadout.actions);
        let handlers = Arc::clone(&self.loadout.handlers);
        let Some(config) = actions.get(slot) else {
            log::warn!("{}: no config for action {}", self.name, slot);
            return Err(ActionError::MissingConfig(slot));
        };
        let Some(handler) = handlers.get(config.kind) else {
            log::warn!("{}: no handler for {:?} actions", self.name, config.kind);
            return Err(ActionError::MissingHandler(config.kind));
        };

        let remaining_ms = self.cooldown_remaining_ms(slot);
        if remaining_ms > 0 {
            return Err(ActionError::OnCooldown { remaining_ms });
        }
        if self.vitals.mana < config.mana_cost {
            return Err(ActionError::InsufficientMana {
                needed: config.mana_cost,
                available: self.vitals.mana,
            });
        }

        let active = self
            .state_machine
            .begin_action(slot, self.lock.is_locked())?;
        self.vitals.consume_mana(config.mana_cost);
        if config.cooldown_ms > 0 {
            self.cooldowns
                .insert(slot, self.timers.now_ms() + u64::from(config.cooldown_ms));
        }

        let lock_ms = {
            let mut ctx = self.context(slot, active.serial);
            handler.execute(&mut ctx, config)
        };
        self.arm_watchdog(config, lock_ms, active.serial);
        self.sync_hitboxes();

        log::debug!("{}: {} started, locked for {}ms", self.name, slot, lock_ms);
        self.events.push(CharacterEvent::ActionStarted { slot });
        Ok(())
    }

    fn arm_watchdog(&mut self, config: &ActionConfig, lock_ms: u32, serial: u64) {
        let bound = config
            .max_duration_ms
            .unwrap_or_else(|| lock_ms.saturating_add(WATCHDOG_GRACE_MS))
            .max(lock_ms);
        self.timers.cancel_slot(&mut self.watchdog);
        self.watchdog = Some(self.timers.schedule(bound, TimerEvent::Watchdog { serial }));
    }

    /// Lend the character's primitives to a handler
    fn context(&mut self, slot: ActionSlot, serial: u64) -> ActionContext<'_> {
        ActionContext {
            owner: self.id,
            slot,
            serial,
            stats: &self.stats,
            timers: &mut self.timers,
            lock: &mut self.lock,
            animation: &mut self.animation,
            hitbox: self.hitboxes.get_mut(&slot),
            vitals: &mut self.vitals,
            motion: &mut self.motion,
            channel: &mut self.channel,
            events: &mut self.events,
            projectiles: &mut self.projectiles,
        }
    }

    /// Run a handler hook for the action in progress
    fn call_handler(&mut self, call: HandlerCall) {
        let Some(active) = self.state_machine.active_action() else {
            return;
        };
        let actions = Arc::clone(&self.loadout.actions);
        let handlers = Arc::clone(&self.loadout.handlers);
        let Some(config) = actions.get(active.slot) else {
            return;
        };
        let Some(handler) = handlers.get(config.kind) else {
            return;
        };

        let mut ctx = self.context(active.slot, active.serial);
        match call {
            HandlerCall::Tick => handler.on_tick(&mut ctx, config),
            HandlerCall::Complete => handler.on_complete(&mut ctx, config),
            HandlerCall::Interrupt => handler.interrupt(&mut ctx, config),
        }
    }

    fn handle_timer(&mut self, handle: TimerHandle, event: TimerEvent) {
        match event {
            TimerEvent::LockExpired => {
                if self.lock.on_expired(handle) {
                    self.finish_action(false);
                }
            }
            TimerEvent::Watchdog { serial } => {
                if self.watchdog != Some(handle) {
                    return;
                }
                self.watchdog = None;
                let current = self.state_machine.active_action().map(|a| a.serial);
                if current == Some(serial) {
                    log::warn!(
                        "{}: {:?} overran its time limit, forcing fallback",
                        self.name,
                        self.state()
                    );
                    self.finish_action(true);
                }
            }
            TimerEvent::AnimationComplete => {
                // Normal end for actions that did not hold the lock
                if self.animation.on_complete(handle)
                    && self.state().is_action()
                    && !self.lock.is_locked()
                {
                    self.finish_action(false);
                }
            }
            TimerEvent::Hitbox { slot, phase } => {
                if let Some(hitbox) = self.hitboxes.get_mut(&slot) {
                    hitbox.on_timer(&mut self.timers, handle, phase);
                }
            }
            TimerEvent::ChannelTick { serial } => {
                let owned = self
                    .channel
                    .is_some_and(|c| c.serial == serial && c.owns_tick(handle));
                let current = self.state_machine.active_action().map(|a| a.serial);
                if owned && current == Some(serial) {
                    self.call_handler(HandlerCall::Tick);
                }
            }
            TimerEvent::InvincibilityExpired => {
                self.vitals.on_invincibility_expired(handle);
            }
            TimerEvent::DeathWindowElapsed => {
                if self.death_timer == Some(handle) {
                    self.death_timer = None;
                    log::info!("{}: death sequence finished", self.name);
                    self.events.push(CharacterEvent::DeathSequenceFinished);
                }
            }
        }
    }

    /// End the action in progress and fall back to idle or jump
    fn finish_action(&mut self, interrupted: bool) {
        let Some(active) = self.state_machine.active_action() else {
            return;
        };
        if interrupted {
            self.call_handler(HandlerCall::Interrupt);
            self.lock.force_unlock(&mut self.timers);
        } else {
            self.call_handler(HandlerCall::Complete);
        }
        self.timers.cancel_slot(&mut self.watchdog);

        self.state_machine.fall_back(&self.environment);
        self.play_state_animation();
        self.events.push(CharacterEvent::ActionFinished {
            slot: active.slot,
            interrupted,
        });
    }

    /// Interrupt a running channel. The state reads idle or jump on return.
    ///
    /// Returns false when nothing was channeling.
    pub fn stop_channel(&mut self) -> bool {
        if self.destroyed || self.channel.is_none() {
            return false;
        }
        self.finish_action(true);
        true
    }

    /// Apply a hit. Returns the damage actually taken.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        if self.destroyed || self.state() == ActionState::Death {
            return 0;
        }
        let taken = self.vitals.take_damage(amount);
        if taken > 0 {
            log::debug!("{}: took {} damage ({} left)", self.name, taken, self.vitals.health);
            self.events.push(CharacterEvent::Damaged {
                amount: taken,
                health: self.vitals.health,
            });
        }
        if self.vitals.is_depleted() {
            self.die();
        }
        taken
    }

    /// Returns the health actually restored
    pub fn heal(&mut self, amount: i32) -> i32 {
        if self.destroyed || self.state() == ActionState::Death {
            return 0;
        }
        let healed = self.vitals.heal(amount);
        if healed > 0 {
            self.events.push(CharacterEvent::Healed {
                amount: healed,
                health: self.vitals.health,
            });
        }
        healed
    }

    /// Returns the mana actually restored
    pub fn restore_mana(&mut self, amount: i32) -> i32 {
        if self.destroyed {
            return 0;
        }
        self.vitals.restore_mana(amount)
    }

    /// Spend mana; false (and no change) when there is not enough
    pub fn consume_mana(&mut self, amount: i32) -> bool {
        !self.destroyed && self.vitals.consume_mana(amount)
    }

    /// Ignore damage for `duration_ms`, replacing any running window
    pub fn grant_invincibility(&mut self, duration_ms: u32) {
        if !self.destroyed {
            self.vitals.grant_invincibility(&mut self.timers, duration_ms);
        }
    }

    /// Replace velocity after being hit
    pub fn apply_knockback(&mut self, knockback: Vec2) {
        if self.is_alive() {
            self.motion.velocity = knockback;
        }
    }

    /// Start the death sequence
    pub fn die(&mut self) {
        if self.destroyed || self.state() == ActionState::Death {
            return;
        }

        if let Some(active) = self.state_machine.active_action() {
            self.call_handler(HandlerCall::Interrupt);
            self.events.push(CharacterEvent::ActionFinished {
                slot: active.slot,
                interrupted: true,
            });
        }
        self.timers.cancel_slot(&mut self.watchdog);
        for hitbox in self.hitboxes.values_mut() {
            hitbox.deactivate(&mut self.timers);
        }
        self.vitals.clear_invincibility(&mut self.timers);
        self.motion.velocity.x = 0.0;

        self.state_machine.die(self.lock.is_locked());
        self.lock.lock_indefinitely(&mut self.timers);
        self.animation
            .play(&mut self.timers, ActionState::Death.animation_name(), 0.0, None);

        self.timers.cancel_slot(&mut self.death_timer);
        self.death_timer = Some(
            self.timers
                .schedule(self.stats.death_lock_ms, TimerEvent::DeathWindowElapsed),
        );

        log::info!("{} died", self.name);
        self.events.push(CharacterEvent::Died);
    }

    /// Bring the character back at `position` with full health and mana
    pub fn respawn(&mut self, position: Vec2) {
        if self.destroyed {
            return;
        }
        if self.state_machine.active_action().is_some() {
            self.finish_action(true);
        }

        self.timers.cancel_slot(&mut self.death_timer);
        self.lock.unlock(&mut self.timers);
        self.vitals.reset(&mut self.timers);
        self.cooldowns.clear();
        self.motion = Motion {
            facing: self.motion.facing,
            ..Motion::at(position)
        };

        self.state_machine.respawn(&self.environment);
        self.play_state_animation();
        self.sync_hitboxes();

        log::info!("{} respawned at ({:.1}, {:.1})", self.name, position.x, position.y);
        self.events.push(CharacterEvent::Respawned);
    }

    /// Tear down: cancel every timer and turn all later calls into no-ops
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        for hitbox in self.hitboxes.values_mut() {
            hitbox.detach(&mut self.timers);
        }
        self.lock.detach(&mut self.timers);
        self.animation.detach(&mut self.timers);
        self.vitals.clear_invincibility(&mut self.timers);
        self.channel = None;
        self.watchdog = None;
        self.death_timer = None;
        self.timers.clear();
        self.projectiles.clear();
        self.destroyed = true;
        log::info!("{} destroyed", self.name);
    }

    // Queries

    pub fn state(&self) -> ActionState {
        self.state_machine.state()
    }

    pub fn state_machine(&self) -> &ActionStateMachine {
        &self.state_machine
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    pub fn is_alive(&self) -> bool {
        !self.destroyed && self.state() != ActionState::Death
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    pub fn health(&self) -> i32 {
        self.vitals.health
    }

    pub fn mana(&self) -> i32 {
        self.vitals.mana
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    pub fn position(&self) -> Vec2 {
        self.motion.position
    }

    /// Teleport (physics collaborator or spawn logic)
    pub fn set_position(&mut self, position: Vec2) {
        self.motion.position = position;
    }

    pub fn velocity(&self) -> Vec2 {
        self.motion.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.motion.velocity = velocity;
    }

    /// Body rectangle used for hit detection
    pub fn body_rect(&self) -> Rect {
        Rect::from_center_size(
            self.motion.position,
            Vec2::new(self.stats.width, self.stats.height),
        )
    }

    pub fn animation(&self) -> &AnimationController {
        &self.animation
    }

    /// Get animation data for rendering
    pub fn frame_data(&self) -> AnimationFrameData {
        self.animation.get_frame_data()
    }

    pub fn loadout(&self) -> &Loadout {
        &self.loadout
    }

    pub fn action_config(&self, slot: ActionSlot) -> Option<&ActionConfig> {
        self.loadout.actions.get(slot)
    }

    pub fn hitbox(&self, slot: ActionSlot) -> Option<&HitboxRegion> {
        self.hitboxes.get(&slot)
    }

    /// Slots whose hitbox is currently live, in a stable order
    pub fn active_hitboxes(&self) -> Vec<ActionSlot> {
        let mut slots: Vec<_> = self
            .hitboxes
            .iter()
            .filter(|(_, hitbox)| hitbox.is_active())
            .map(|(slot, _)| *slot)
            .collect();
        slots.sort();
        slots
    }

    /// Test `body` against one of this character's hitboxes and record the hit
    pub fn check_hit(&mut self, slot: ActionSlot, target: CharacterId, body: &Rect) -> bool {
        if self.destroyed {
            return false;
        }
        self.hitboxes
            .get_mut(&slot)
            .is_some_and(|hitbox| hitbox.check_hit(target, body))
    }

    pub fn cooldown_remaining_ms(&self, slot: ActionSlot) -> u64 {
        self.cooldowns
            .get(&slot)
            .map(|ready_at| ready_at.saturating_sub(self.timers.now_ms()))
            .unwrap_or(0)
    }

    pub fn channel(&self) -> Option<&ChannelState> {
        self.channel.as_ref()
    }

    /// Character clock in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    /// Number of timers still waiting to fire
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Take the events queued since the last call
    pub fn drain_events(&mut self) -> Vec<CharacterEvent> {
        std::mem::take(&mut self.events)
    }

    /// Take the projectile spawns queued since the last call
    pub fn drain_projectiles(&mut self) -> Vec<ProjectileRequest> {
        std::mem::take(&mut self.projectiles)
    }
}
