// Timed damage regions attached to a character

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::Rect;
use crate::engine::{Scheduler, TimerHandle};

use super::character::CharacterId;
use super::events::{HitboxPhase, TimerEvent};
use super::state::ActionSlot;

/// Stable identity of something a hitbox can hit
pub type TargetId = CharacterId;

/// How repeated overlaps with the same activation are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPolicy {
    /// Each target is hit at most once per activation
    #[default]
    Single,
    /// Only the first target hit per activation counts
    FirstHitOnly,
    /// Every overlap query hits; the record is bookkeeping only
    Multi,
}

/// Static shape of a hitbox
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitboxShape {
    /// Center offset from the owner, for a right-facing owner
    pub offset: Vec2,
    pub size: Vec2,
    /// Default active window
    pub duration_ms: u32,
}

impl Default for HitboxShape {
    fn default() -> Self {
        Self {
            offset: Vec2::new(1.0, 0.0),
            size: Vec2::new(1.0, 1.0),
            duration_ms: 100,
        }
    }
}

/// One window of a multi-phase activation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitboxStep {
    pub offset: Vec2,
    pub size: Vec2,
    /// Explicit window length for this step
    #[serde(default)]
    pub duration_ms: Option<u32>,
    /// Active time of the step's own hitbox, used when no explicit length is set
    #[serde(default)]
    pub hitbox_duration_ms: Option<u32>,
}

impl HitboxStep {
    pub fn new(offset: Vec2, size: Vec2, duration_ms: u32) -> Self {
        Self {
            offset,
            size,
            duration_ms: Some(duration_ms),
            hitbox_duration_ms: None,
        }
    }

    /// Step length: explicit duration, then the hitbox's own, then `fallback_ms`
    pub fn resolved_duration(&self, fallback_ms: u32) -> u32 {
        self.duration_ms
            .or(self.hitbox_duration_ms)
            .unwrap_or(fallback_ms)
    }
}

/// A rectangle that follows its owner and detects overlaps while active.
///
/// Created once per hitbox-bearing action and reused for every activation.
#[derive(Debug)]
pub struct HitboxRegion {
    slot: ActionSlot,
    shape: HitboxShape,
    policy: TargetPolicy,

    // Current geometry
    offset: Vec2,
    size: Vec2,
    owner_position: Vec2,
    flip: bool,

    active: bool,
    hit_targets: Vec<TargetId>,

    // Sequence playback
    steps: Vec<HitboxStep>,
    step_index: usize,
    step_fallback_ms: u32,

    /// The one outstanding timer (delayed start, step end or expiry)
    pending: Option<TimerHandle>,
    delayed_duration: Option<u32>,
    detached: bool,
}

impl HitboxRegion {
    pub fn new(slot: ActionSlot, shape: HitboxShape, policy: TargetPolicy) -> Self {
        Self {
            slot,
            shape,
            policy,
            offset: shape.offset,
            size: shape.size,
            owner_position: Vec2::ZERO,
            flip: false,
            active: false,
            hit_targets: Vec::new(),
            steps: Vec::new(),
            step_index: 0,
            step_fallback_ms: 0,
            pending: None,
            delayed_duration: None,
            detached: false,
        }
    }

    pub fn slot(&self) -> ActionSlot {
        self.slot
    }

    pub fn policy(&self) -> TargetPolicy {
        self.policy
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Check if a delayed start or step timer is outstanding
    pub fn has_pending_timer(&self) -> bool {
        self.pending.is_some()
    }

    /// Follow the owner (called every frame and on activation)
    pub fn sync_owner(&mut self, position: Vec2, flip: bool) {
        self.owner_position = position;
        self.flip = flip;
    }

    /// Current offset, mirrored for a left-facing owner
    pub fn world_offset(&self) -> Vec2 {
        let x = if self.flip { -self.offset.x } else { self.offset.x };
        Vec2::new(x, self.offset.y)
    }

    /// World-space bounds while active
    pub fn bounds(&self) -> Option<Rect> {
        self.active.then(|| {
            Rect::from_center_size(self.owner_position + self.world_offset(), self.size)
        })
    }

    fn schedule(&mut self, timers: &mut Scheduler<TimerEvent>, delay_ms: u32, phase: HitboxPhase) {
        timers.cancel_slot(&mut self.pending);
        self.pending = Some(timers.schedule(
            delay_ms,
            TimerEvent::Hitbox {
                slot: self.slot,
                phase,
            },
        ));
    }

    /// Become active now and expire after `duration_ms` (default: the shape's)
    pub fn activate(&mut self, timers: &mut Scheduler<TimerEvent>, duration_ms: Option<u32>) {
        if self.detached {
            return;
        }
        self.steps.clear();
        self.hit_targets.clear();
        self.offset = self.shape.offset;
        self.size = self.shape.size;
        self.active = true;
        self.delayed_duration = None;

        let duration = duration_ms.unwrap_or(self.shape.duration_ms);
        self.schedule(timers, duration, HitboxPhase::Expire);
        log::trace!("hitbox {} active for {}ms", self.slot, duration);
    }

    /// Activate after `delay_ms`; a zero delay activates immediately
    pub fn activate_after(
        &mut self,
        timers: &mut Scheduler<TimerEvent>,
        delay_ms: u32,
        duration_ms: Option<u32>,
    ) {
        if self.detached {
            return;
        }
        if delay_ms == 0 {
            self.activate(timers, duration_ms);
            return;
        }
        self.active = false;
        self.hit_targets.clear();
        self.delayed_duration = duration_ms;
        self.schedule(timers, delay_ms, HitboxPhase::Start);
    }

    /// Play windows back-to-back, each with its own offset, size and length.
    ///
    /// Hit records are kept across steps: the sequence is one activation.
    pub fn activate_sequence(
        &mut self,
        timers: &mut Scheduler<TimerEvent>,
        steps: &[HitboxStep],
        fallback_ms: u32,
    ) {
        if self.detached {
            return;
        }
        let Some(first) = steps.first() else {
            log::warn!("hitbox {} given an empty sequence", self.slot);
            return;
        };

        self.hit_targets.clear();
        self.steps = steps.to_vec();
        self.step_index = 0;
        self.step_fallback_ms = fallback_ms;
        self.offset = first.offset;
        self.size = first.size;
        self.active = true;
        self.delayed_duration = None;

        self.schedule(
            timers,
            first.resolved_duration(fallback_ms),
            HitboxPhase::StepEnd,
        );
    }

    /// Handle one of this region's timers. Returns false for stale timers.
    pub fn on_timer(
        &mut self,
        timers: &mut Scheduler<TimerEvent>,
        handle: TimerHandle,
        phase: HitboxPhase,
    ) -> bool {
        if self.detached || self.pending != Some(handle) {
            return false;
        }
        self.pending = None;

        match phase {
            HitboxPhase::Start => {
                let duration = self.delayed_duration.take();
                self.activate(timers, duration);
            }
            HitboxPhase::StepEnd => {
                self.step_index += 1;
                match self.steps.get(self.step_index).copied() {
                    Some(step) => {
                        self.offset = step.offset;
                        self.size = step.size;
                        self.schedule(
                            timers,
                            step.resolved_duration(self.step_fallback_ms),
                            HitboxPhase::StepEnd,
                        );
                    }
                    None => self.deactivate(timers),
                }
            }
            HitboxPhase::Expire => self.deactivate(timers),
        }
        true
    }

    /// Stop detecting hits and drop any pending timer. Safe to call repeatedly.
    pub fn deactivate(&mut self, timers: &mut Scheduler<TimerEvent>) {
        timers.cancel_slot(&mut self.pending);
        self.active = false;
        self.hit_targets.clear();
        self.steps.clear();
        self.step_index = 0;
        self.delayed_duration = None;
        self.offset = self.shape.offset;
        self.size = self.shape.size;
    }

    /// Test a target's body against the region and record the hit.
    pub fn check_hit(&mut self, target: TargetId, body: &Rect) -> bool {
        let Some(bounds) = self.bounds() else {
            return false;
        };

        match self.policy {
            TargetPolicy::Single if self.hit_targets.contains(&target) => return false,
            TargetPolicy::FirstHitOnly if !self.hit_targets.is_empty() => return false,
            _ => {}
        }

        if !bounds.overlaps(body) {
            return false;
        }

        if !self.hit_targets.contains(&target) {
            self.hit_targets.push(target);
        }
        true
    }

    /// Check if a target was recorded during the current activation
    pub fn has_hit(&self, target: TargetId) -> bool {
        self.hit_targets.contains(&target)
    }

    /// Targets recorded during the current activation
    pub fn hit_targets(&self) -> &[TargetId] {
        &self.hit_targets
    }

    /// Owner is going away: drop the timer and ignore further activations
    pub fn detach(&mut self, timers: &mut Scheduler<TimerEvent>) {
        self.deactivate(timers);
        self.detached = true;
    }
}
