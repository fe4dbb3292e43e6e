// Character animation system

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::engine::{Scheduler, TimerHandle};

use super::events::TimerEvent;

/// Animation used whenever a requested one is missing
pub const FALLBACK_ANIMATION: &str = "idle";

/// A single animation clip
#[derive(Debug, Clone)]
pub struct AnimationClip {
    /// Name of the animation (e.g., "idle", "walk", "knight_attack")
    pub name: String,
    /// Number of frames in the animation
    pub frame_count: usize,
    /// Default playback rate in frames per second
    pub frame_rate: f32,
    /// Whether the animation loops
    pub looping: bool,
}

impl AnimationClip {
    /// Create a new animation clip
    pub fn new(name: &str, frame_count: usize, frame_rate: f32, looping: bool) -> Self {
        Self {
            name: name.to_string(),
            frame_count,
            frame_rate,
            looping,
        }
    }

    /// Create a looping animation
    pub fn looping(name: &str, frame_count: usize, frame_rate: f32) -> Self {
        Self::new(name, frame_count, frame_rate, true)
    }

    /// Create a one-shot animation (plays once)
    pub fn one_shot(name: &str, frame_count: usize, frame_rate: f32) -> Self {
        Self::new(name, frame_count, frame_rate, false)
    }

    /// Duration of one cycle at `frame_rate` (or the clip's own rate when 0),
    /// rounded to the nearest millisecond: 4 frames at 12 fps lasts 333ms,
    /// 5 frames at 12 fps lasts 417ms.
    pub fn duration_ms(&self, frame_rate: f32) -> u32 {
        let rate = if frame_rate > 0.0 {
            frame_rate
        } else {
            self.frame_rate
        };
        if rate <= 0.0 {
            return 0;
        }
        (self.frame_count as f32 / rate * 1000.0).round() as u32
    }
}

/// Read-only source of animation metadata, shared by every character of a kind
pub trait AnimationRegistry: fmt::Debug + Send + Sync {
    /// Look up a clip by its concrete name
    fn clip(&self, name: &str) -> Option<&AnimationClip>;

    fn frame_count(&self, name: &str) -> Option<usize> {
        self.clip(name).map(|clip| clip.frame_count)
    }

    fn exists(&self, name: &str) -> bool {
        self.clip(name).is_some()
    }
}

/// In-memory animation registry
#[derive(Debug, Clone, Default)]
pub struct ClipLibrary {
    clips: HashMap<String, AnimationClip>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an animation clip
    pub fn add(&mut self, clip: AnimationClip) {
        self.clips.insert(clip.name.clone(), clip);
    }

    /// Builder-style add
    pub fn with(mut self, clip: AnimationClip) -> Self {
        self.add(clip);
        self
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Clips for the standard fighter sprite set
    pub fn standard() -> Self {
        Self::new()
            // Locomotion
            .with(AnimationClip::looping("idle", 8, 10.0))
            .with(AnimationClip::looping("walk", 8, 12.0))
            .with(AnimationClip::looping("run", 8, 16.0))
            .with(AnimationClip::looping("jump", 4, 10.0))
            .with(AnimationClip::looping("jump_down", 4, 10.0))
            // Actions: 6 frames at 12 fps = 500ms swing
            .with(AnimationClip::one_shot("attack", 6, 12.0))
            .with(AnimationClip::one_shot("air_attack", 4, 12.0))
            .with(AnimationClip::one_shot("skill_q", 8, 16.0))
            .with(AnimationClip::one_shot("skill_w", 10, 20.0))
            .with(AnimationClip::one_shot("skill_e", 6, 12.0))
            .with(AnimationClip::one_shot("skill_r", 4, 10.0))
            .with(AnimationClip::looping("skill_r_loop", 6, 10.0))
            .with(AnimationClip::one_shot("skill_s", 9, 18.0))
            .with(AnimationClip::one_shot("death", 10, 10.0))
    }
}

impl AnimationRegistry for ClipLibrary {
    fn clip(&self, name: &str) -> Option<&AnimationClip> {
        self.clips.get(name)
    }
}

/// Drives one character's sprite animation and reports action lock times
#[derive(Debug)]
pub struct AnimationController {
    registry: Arc<dyn AnimationRegistry>,
    /// Prefix for per-character animation names ("knight" -> "knight_attack")
    sprite_set: Option<String>,
    /// Currently playing animation (concrete key)
    current_animation: String,
    /// Looped layer playing alongside the main one (channels)
    overlay: Option<String>,
    /// Playback rate for the current animation
    frame_rate: f32,
    looping: bool,
    current_frame: usize,
    frame_timer_ms: f32,
    playing: bool,
    flip_horizontal: bool,
    completion: Option<TimerHandle>,
    detached: bool,
}

impl AnimationController {
    pub fn new(registry: Arc<dyn AnimationRegistry>, sprite_set: Option<String>) -> Self {
        let mut controller = Self {
            registry,
            sprite_set,
            current_animation: String::new(),
            overlay: None,
            frame_rate: 0.0,
            looping: true,
            current_frame: 0,
            frame_timer_ms: 0.0,
            playing: false,
            flip_horizontal: false,
            completion: None,
            detached: false,
        };
        controller.start_looping(FALLBACK_ANIMATION);
        controller
    }

    /// Map a logical action name to the concrete animation for this sprite set
    pub fn resolve_animation_key(&self, name: &str) -> Option<String> {
        if let Some(set) = &self.sprite_set {
            let prefixed = format!("{set}_{name}");
            if self.registry.exists(&prefixed) {
                return Some(prefixed);
            }
        }
        self.registry.exists(name).then(|| name.to_string())
    }

    /// Play a one-shot animation and return how long the action should lock.
    ///
    /// `explicit_ms` wins when given. Otherwise the lock lasts
    /// `frame_count / frame_rate` seconds (`frame_rate` 0 uses the clip's rate).
    /// A missing animation logs a warning and falls back to idle.
    pub fn play(
        &mut self,
        timers: &mut Scheduler<TimerEvent>,
        name: &str,
        frame_rate: f32,
        explicit_ms: Option<u32>,
    ) -> u32 {
        if self.detached {
            return explicit_ms.unwrap_or(0);
        }
        timers.cancel_slot(&mut self.completion);
        self.overlay = None;

        let Some(key) = self.resolve_animation_key(name) else {
            log::warn!("animation '{name}' not found, falling back to {FALLBACK_ANIMATION}");
            self.start_looping(FALLBACK_ANIMATION);
            return explicit_ms.unwrap_or(0);
        };
        let Some(clip) = self.registry.clip(&key).cloned() else {
            return explicit_ms.unwrap_or(0);
        };

        let natural_ms = clip.duration_ms(frame_rate);
        self.current_animation = key;
        self.frame_rate = if frame_rate > 0.0 {
            frame_rate
        } else {
            clip.frame_rate
        };
        self.looping = false;
        self.current_frame = 0;
        self.frame_timer_ms = 0.0;
        self.playing = true;
        self.completion = Some(timers.schedule(natural_ms, TimerEvent::AnimationComplete));

        explicit_ms.unwrap_or(natural_ms)
    }

    /// Play an entry animation with a looped layer on top (channeled actions)
    pub fn play_layered(
        &mut self,
        timers: &mut Scheduler<TimerEvent>,
        entry: &str,
        channel_loop: &str,
        frame_rate: f32,
        explicit_ms: Option<u32>,
    ) -> u32 {
        let lock_ms = self.play(timers, entry, frame_rate, explicit_ms);
        if self.detached {
            return lock_ms;
        }
        match self.resolve_animation_key(channel_loop) {
            Some(key) => self.overlay = Some(key),
            None => log::warn!("channel animation '{channel_loop}' not found"),
        }
        lock_ms
    }

    /// Switch to a looping animation unless it is already playing
    pub fn play_looping(&mut self, timers: &mut Scheduler<TimerEvent>, name: &str) {
        if self.detached {
            return;
        }
        timers.cancel_slot(&mut self.completion);
        self.overlay = None;

        match self.resolve_animation_key(name) {
            Some(key) if key == self.current_animation && self.looping => {}
            Some(key) => self.start_looping(&key),
            None => {
                log::warn!("animation '{name}' not found, falling back to {FALLBACK_ANIMATION}");
                self.start_looping(FALLBACK_ANIMATION);
            }
        }
    }

    fn start_looping(&mut self, key: &str) {
        let rate = self
            .registry
            .clip(key)
            .map(|clip| clip.frame_rate)
            .unwrap_or(0.0);
        self.current_animation = key.to_string();
        self.frame_rate = rate;
        self.looping = true;
        self.current_frame = 0;
        self.frame_timer_ms = 0.0;
        self.playing = true;
    }

    /// Halt playback and drop the pending completion event
    pub fn stop_and_clear_events(&mut self, timers: &mut Scheduler<TimerEvent>) {
        timers.cancel_slot(&mut self.completion);
        self.overlay = None;
        self.playing = false;
    }

    /// Called when an `AnimationComplete` timer fires; false for stale timers
    pub fn on_complete(&mut self, handle: TimerHandle) -> bool {
        if self.detached || self.completion != Some(handle) {
            return false;
        }
        self.completion = None;
        self.playing = false;
        true
    }

    /// Advance frames (called every frame)
    pub fn update(&mut self, dt_ms: u32) {
        if !self.playing || self.frame_rate <= 0.0 {
            return;
        }
        let Some(frame_count) = self.registry.frame_count(&self.current_animation) else {
            return;
        };
        if frame_count == 0 {
            return;
        }

        let frame_duration_ms = 1000.0 / self.frame_rate;
        self.frame_timer_ms += dt_ms as f32;

        while self.frame_timer_ms >= frame_duration_ms {
            self.frame_timer_ms -= frame_duration_ms;
            self.current_frame += 1;

            if self.current_frame >= frame_count {
                if self.looping {
                    self.current_frame = 0;
                } else {
                    // Stay on last frame
                    self.current_frame = frame_count - 1;
                    self.playing = false;
                    break;
                }
            }
        }
    }

    /// Set horizontal flip state
    pub fn set_flip_horizontal(&mut self, flip: bool) {
        self.flip_horizontal = flip;
    }

    pub fn is_flipped_horizontal(&self) -> bool {
        self.flip_horizontal
    }

    /// Get the current animation name
    pub fn current_animation(&self) -> &str {
        &self.current_animation
    }

    /// Looped layer playing alongside the current animation
    pub fn overlay_animation(&self) -> Option<&str> {
        self.overlay.as_deref()
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Check if a one-shot animation has finished
    pub fn is_finished(&self) -> bool {
        !self.looping && !self.playing
    }

    /// Check if a completion event is still pending
    pub fn has_pending_completion(&self) -> bool {
        self.completion.is_some()
    }

    /// Get animation data for rendering
    pub fn get_frame_data(&self) -> AnimationFrameData {
        AnimationFrameData {
            animation_name: self.current_animation.clone(),
            overlay: self.overlay.clone(),
            frame_index: self.current_frame,
            flip_horizontal: self.flip_horizontal,
        }
    }

    /// Owner is going away: drop timers and ignore further playback requests
    pub fn detach(&mut self, timers: &mut Scheduler<TimerEvent>) {
        self.stop_and_clear_events(timers);
        self.detached = true;
    }
}

/// Data needed to render the current animation frame
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFrameData {
    pub animation_name: String,
    pub overlay: Option<String>,
    pub frame_index: usize,
    pub flip_horizontal: bool,
}
