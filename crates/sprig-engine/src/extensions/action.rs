// extensions/action.rs
//
// Time-driven mutator of a target: status state machine, delay/repeat
// bookkeeping, optional interpolator and single-slot callbacks.
// What gets mutated is decided by the `Animatable` behavior it wraps.
//
// Usage:
//   let mut action = Action::new(ActionKind::move_to(Vec2::new(100.0, 0.0)), 0.5)?
//       .with_interpolator(Interpolator::ease_out(2.0));
//   action.step(dt, &mut node);  // once per frame until it reports Ended

use std::fmt;
use std::rc::Rc;

use glam::Vec2;

use crate::api::error::{EngineError, EngineResult};
use crate::core::time::{RepeatPolicy, TimeUnitConfig};
use super::interpolator::Interpolator;

/// Lifecycle of an [`Action`].
///
/// `Created -> Running -> Ended`, `Running <-> Paused -> Resumed -> Running`,
/// and `restart()` returns any state to `Created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionStatus {
    #[default]
    Created,
    Running,
    Paused,
    /// Resumed but not stepped yet; the next step fires `on_resume`.
    Resumed,
    Ended,
}

/// Value produced by one behavior update, forwarded to `on_apply`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ApplyResult {
    #[default]
    None,
    Scalar(f32),
    Point(Vec2),
}

/// Behavior plugged into an [`Action`]: the actual property mutation.
pub trait Animatable: Clone {
    type Target;

    /// Called once, right before the first update, to snapshot start values.
    fn init_with_target(&mut self, target: &Self::Target, relative: bool);

    /// Mutate the target for `time`, the eased progress of the current cycle.
    fn update(&mut self, time: f64, target: &mut Self::Target) -> ApplyResult;

    /// Composites lay out their children and report their own duration in
    /// stored time units. Leaves return `None`.
    fn layout(&mut self) -> EngineResult<Option<f64>> {
        Ok(None)
    }

    /// Reverse by restructuring instead of by reversing time. Returns whether
    /// the behavior handled it.
    fn reverse_structure(&mut self) -> bool {
        false
    }

    /// Reset any nested runtime state.
    fn restart(&mut self) {}

    /// Copy that keeps nested runtime state. Cloning an `Action` starts it
    /// fresh, so composites override this to snapshot their children.
    fn snapshot(&self) -> Self {
        self.clone()
    }
}

/// Callback fired on start, end, pause and resume.
pub type ActionCallback<A> = Rc<dyn Fn(&Action<A>, &mut <A as Animatable>::Target)>;
/// Callback fired when a new repetition begins, with its index.
pub type RepeatCallback<A> = Rc<dyn Fn(&Action<A>, &mut <A as Animatable>::Target, u64)>;
/// Callback fired after every update, with the update's result.
pub type ApplyCallback<A> = Rc<dyn Fn(&Action<A>, &mut <A as Animatable>::Target, &ApplyResult)>;

struct Callbacks<A: Animatable> {
    on_start: Option<ActionCallback<A>>,
    on_end: Option<ActionCallback<A>>,
    on_repeat: Option<RepeatCallback<A>>,
    on_apply: Option<ApplyCallback<A>>,
    on_pause: Option<ActionCallback<A>>,
    on_resume: Option<ActionCallback<A>>,
}

impl<A: Animatable> Default for Callbacks<A> {
    fn default() -> Self {
        Self {
            on_start: None,
            on_end: None,
            on_repeat: None,
            on_apply: None,
            on_pause: None,
            on_resume: None,
        }
    }
}

// Shares the closures, never copies them.
impl<A: Animatable> Clone for Callbacks<A> {
    fn clone(&self) -> Self {
        Self {
            on_start: self.on_start.clone(),
            on_end: self.on_end.clone(),
            on_repeat: self.on_repeat.clone(),
            on_apply: self.on_apply.clone(),
            on_pause: self.on_pause.clone(),
            on_resume: self.on_resume.clone(),
        }
    }
}

/// A time-driven mutator applied to a target once per frame while active.
///
/// Durations and delays are stored pre-multiplied by the action's
/// [`TimeUnitConfig`]; `step` scales its delta the same way.
pub struct Action<A: Animatable> {
    tag: String,
    duration: f64,
    delay_before: f64,
    delay_after: f64,
    repeat: RepeatPolicy,
    speed: f64,
    relative: bool,
    reversed_time: bool,
    reversed: bool,
    status: ActionStatus,
    current_time: f64,
    current_repeat_count: u64,
    first_execution: bool,
    /// `delay_before + chain_offset`.
    start_time: f64,
    /// End of the predecessor inside an owning sequence.
    chain_offset: f64,
    interpolator: Option<Interpolator>,
    callbacks: Callbacks<A>,
    units: TimeUnitConfig,
    behavior: A,
}

impl<A: Animatable> Action<A> {
    /// Create an action lasting `duration` seconds.
    pub fn new(behavior: A, duration: f64) -> EngineResult<Self> {
        Self::with_time_units(behavior, duration, TimeUnitConfig::default())
    }

    /// Create an action whose times are expressed in `units`.
    pub fn with_time_units(behavior: A, duration: f64, units: TimeUnitConfig) -> EngineResult<Self> {
        let mut action = Self::blank(behavior, units);
        action.set_duration(duration)?;
        Ok(action)
    }

    /// Create an action whose duration comes from its behavior's layout.
    pub fn composite(behavior: A, units: TimeUnitConfig) -> EngineResult<Self> {
        let mut action = Self::blank(behavior, units);
        action.update_duration()?;
        if action.duration <= 0.0 {
            return Err(EngineError::InvalidDuration { field: "duration", value: action.duration });
        }
        Ok(action)
    }

    fn blank(behavior: A, units: TimeUnitConfig) -> Self {
        Self {
            tag: String::new(),
            duration: 0.0,
            delay_before: 0.0,
            delay_after: 0.0,
            repeat: RepeatPolicy::default(),
            speed: 1.0,
            relative: false,
            reversed_time: false,
            reversed: false,
            status: ActionStatus::Created,
            current_time: 0.0,
            current_repeat_count: 0,
            first_execution: true,
            start_time: 0.0,
            chain_offset: 0.0,
            interpolator: None,
            callbacks: Callbacks::default(),
            units,
            behavior,
        }
    }

    // -- Builder methods --

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_interpolator(mut self, interpolator: Interpolator) -> Self {
        self.interpolator = Some(interpolator);
        self
    }

    pub fn with_relative(mut self, relative: bool) -> Self {
        self.relative = relative;
        self
    }

    pub fn with_reversed_time(mut self, reversed_time: bool) -> Self {
        self.reversed_time = reversed_time;
        self
    }

    pub fn with_on_start(mut self, f: impl Fn(&Action<A>, &mut A::Target) + 'static) -> Self {
        self.set_on_start(f);
        self
    }

    pub fn with_on_end(mut self, f: impl Fn(&Action<A>, &mut A::Target) + 'static) -> Self {
        self.set_on_end(f);
        self
    }

    pub fn with_on_repeat(mut self, f: impl Fn(&Action<A>, &mut A::Target, u64) + 'static) -> Self {
        self.set_on_repeat(f);
        self
    }

    pub fn with_on_apply(
        mut self,
        f: impl Fn(&Action<A>, &mut A::Target, &ApplyResult) + 'static,
    ) -> Self {
        self.set_on_apply(f);
        self
    }

    // -- Configuration --

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    /// Set the duration of one cycle. Composites recompute theirs from their
    /// children, so for them this has no lasting effect.
    pub fn set_duration(&mut self, duration: f64) -> EngineResult<()> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(EngineError::InvalidDuration { field: "duration", value: duration });
        }
        self.duration = self.units.scale(duration);
        self.update_duration()
    }

    /// Delay before the first application.
    pub fn set_delay(&mut self, delay: f64) -> EngineResult<()> {
        self.delay_before = self.units.scale(checked_delay("delayBefore", delay)?);
        self.update_duration()
    }

    /// Dead time appended to every cycle, during which progress holds at 1.
    pub fn set_delay_after_application(&mut self, delay: f64) -> EngineResult<()> {
        self.delay_after = self.units.scale(checked_delay("delayAfter", delay)?);
        Ok(())
    }

    pub fn set_repeat_times(&mut self, times: u32) -> EngineResult<()> {
        if times == 0 {
            return Err(EngineError::InvalidRepeatCount);
        }
        self.repeat = RepeatPolicy::Finite(times);
        Ok(())
    }

    pub fn set_repeat_forever(&mut self) {
        self.repeat = RepeatPolicy::Infinite;
    }

    pub fn set_repeat(&mut self, repeat: RepeatPolicy) -> EngineResult<()> {
        match repeat {
            RepeatPolicy::Finite(times) => self.set_repeat_times(times),
            RepeatPolicy::Infinite => {
                self.set_repeat_forever();
                Ok(())
            }
        }
    }

    /// Multiplier on elapsed time. Any finite value is accepted.
    pub fn set_speed(&mut self, speed: f64) -> EngineResult<()> {
        if !speed.is_finite() {
            return Err(EngineError::InvalidSpeed(speed));
        }
        self.speed = speed;
        Ok(())
    }

    pub fn set_relative(&mut self, relative: bool) {
        self.relative = relative;
    }

    pub fn set_reversed_time(&mut self, reversed_time: bool) {
        self.reversed_time = reversed_time;
    }

    pub fn set_interpolator(&mut self, interpolator: Option<Interpolator>) {
        self.interpolator = interpolator;
    }

    /// Applies to values set from now on; stored values keep their scale.
    pub fn set_time_units(&mut self, units: TimeUnitConfig) {
        self.units = units;
    }

    /// Toggle the `reversed` flag. Leaves reverse their interpolator (a
    /// linear one is installed first if none is set); composites reorder.
    pub fn set_reversed(&mut self) {
        self.reversed = !self.reversed;
        if self.behavior.reverse_structure() {
            if let Err(err) = self.update_duration() {
                log::error!("action '{}': layout failed after reversal: {}", self.tag, err);
            }
            return;
        }
        let interpolator = self.interpolator.unwrap_or_default();
        self.interpolator = Some(interpolator.reverse());
    }

    /// Clone of this action with [`set_reversed`](Self::set_reversed) applied.
    pub fn create_reversed(&self) -> Self {
        let mut reversed = self.clone();
        reversed.set_reversed();
        reversed
    }

    pub fn set_on_start(&mut self, f: impl Fn(&Action<A>, &mut A::Target) + 'static) {
        self.callbacks.on_start = Some(Rc::new(f));
    }

    pub fn set_on_end(&mut self, f: impl Fn(&Action<A>, &mut A::Target) + 'static) {
        self.callbacks.on_end = Some(Rc::new(f));
    }

    pub fn set_on_repeat(&mut self, f: impl Fn(&Action<A>, &mut A::Target, u64) + 'static) {
        self.callbacks.on_repeat = Some(Rc::new(f));
    }

    pub fn set_on_apply(&mut self, f: impl Fn(&Action<A>, &mut A::Target, &ApplyResult) + 'static) {
        self.callbacks.on_apply = Some(Rc::new(f));
    }

    pub fn set_on_pause(&mut self, f: impl Fn(&Action<A>, &mut A::Target) + 'static) {
        self.callbacks.on_pause = Some(Rc::new(f));
    }

    pub fn set_on_resume(&mut self, f: impl Fn(&Action<A>, &mut A::Target) + 'static) {
        self.callbacks.on_resume = Some(Rc::new(f));
    }

    // -- Accessors --

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// One cycle, in stored units.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn delay_before(&self) -> f64 {
        self.delay_before
    }

    pub fn delay_after(&self) -> f64 {
        self.delay_after
    }

    pub fn repeat(&self) -> RepeatPolicy {
        self.repeat
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn is_relative(&self) -> bool {
        self.relative
    }

    pub fn is_reversed_time(&self) -> bool {
        self.reversed_time
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn status(&self) -> ActionStatus {
        self.status
    }

    /// Accumulated, speed-scaled time in stored units.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn current_repeat_count(&self) -> u64 {
        self.current_repeat_count
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn interpolator(&self) -> Option<&Interpolator> {
        self.interpolator.as_ref()
    }

    pub fn time_units(&self) -> TimeUnitConfig {
        self.units
    }

    pub fn behavior(&self) -> &A {
        &self.behavior
    }

    pub(crate) fn behavior_mut(&mut self) -> &mut A {
        &mut self.behavior
    }

    /// `duration + delay_after`: the period after which progress resets.
    pub fn one_repetition_duration(&self) -> f64 {
        self.duration + self.delay_after
    }

    /// All repetitions, or `None` when repeating forever.
    pub fn total_duration(&self) -> Option<f64> {
        self.repeat
            .count()
            .map(|times| self.one_repetition_duration() * times as f64)
    }

    /// Time at which the action expires, or `None` when repeating forever.
    pub fn end_time(&self) -> Option<f64> {
        self.total_duration().map(|total| self.start_time + total)
    }

    // -- Composition --

    /// Re-derive `start_time` and, for composites, lay out children and take
    /// their combined duration.
    pub fn update_duration(&mut self) -> EngineResult<()> {
        if let Some(duration) = self.behavior.layout()? {
            self.duration = duration;
        }
        self.start_time = self.delay_before + self.chain_offset;
        Ok(())
    }

    /// Set by the owning composite: where the predecessor ends.
    pub(crate) fn set_chain_offset(&mut self, offset: f64) {
        self.chain_offset = offset;
        self.start_time = self.delay_before + offset;
    }

    // -- Time math --

    fn window_contains(&self, time: f64) -> bool {
        match self.total_duration() {
            None => true,
            Some(total) => self.start_time <= time && time < self.start_time + total,
        }
    }

    fn has_expired(&self, time: f64) -> bool {
        self.end_time().is_some_and(|end| time >= end)
    }

    /// Whether `step` would apply at the current time.
    pub fn is_applicable(&self) -> bool {
        match self.status {
            ActionStatus::Paused | ActionStatus::Ended => false,
            _ => self.window_contains(self.current_time),
        }
    }

    /// Progress at the current time after delay, repetition, time reversal
    /// and interpolation.
    pub fn normalized_time(&self) -> f64 {
        self.normalize_time(self.current_time)
    }

    /// Progress at `time`, in stored units since the action began.
    pub fn normalize_time(&self, time: f64) -> f64 {
        let mut normalized = if time < self.start_time {
            0.0
        } else {
            let elapsed = time - self.start_time;
            match self.total_duration() {
                Some(total) if elapsed >= total => 1.0,
                _ => {
                    let in_cycle = elapsed % self.one_repetition_duration();
                    if in_cycle < self.duration {
                        in_cycle / self.duration
                    } else {
                        // Inside the delay-after dead zone.
                        1.0
                    }
                }
            }
        };

        if self.reversed_time {
            normalized = 1.0 - normalized;
        }

        match &self.interpolator {
            Some(interpolator) => interpolator.evaluate(normalized),
            None => normalized,
        }
    }

    // -- Lifecycle --

    /// Advance by `delta` (caller units, scaled by time units and speed) and
    /// apply to `target`. Never fails; returns the resulting status.
    pub fn step(&mut self, delta: f64, target: &mut A::Target) -> ActionStatus {
        match self.status {
            ActionStatus::Ended | ActionStatus::Paused => return self.status,
            ActionStatus::Resumed => {
                log::debug!("action '{}' resumed at t={}", self.tag, self.current_time);
                self.fire(target, |c| c.on_resume.clone());
                self.status = ActionStatus::Running;
            }
            ActionStatus::Created | ActionStatus::Running => {}
        }

        self.current_time += self.units.scale(delta) * self.speed;
        self.advance(target)
    }

    /// Jump to an absolute time (stored units) and apply. Unlike `step`, an
    /// ended action whose window contains `time` again is brought back, and
    /// an action that already ran is put back at progress 0 when `time`
    /// drops before its start. Composites use this to play children
    /// backwards.
    pub fn seek(&mut self, time: f64, target: &mut A::Target) -> ActionStatus {
        if self.status == ActionStatus::Paused {
            return self.status;
        }
        let rewound = time < self.start_time && !self.first_execution;
        if self.status == ActionStatus::Ended {
            if !(rewound || self.window_contains(time)) {
                return self.status;
            }
            self.status = ActionStatus::Running;
        }
        self.current_time = time;
        if rewound {
            self.apply(target);
            return self.status;
        }
        self.advance(target)
    }

    fn advance(&mut self, target: &mut A::Target) -> ActionStatus {
        if self.is_applicable() {
            self.apply(target);
        } else if self.has_expired(self.current_time) && self.apply(target).is_some() {
            self.finish(target);
        }
        self.status
    }

    fn apply(&mut self, target: &mut A::Target) -> Option<ApplyResult> {
        if self.first_execution {
            log::debug!("action '{}' started at t={}", self.tag, self.current_time);
            self.fire(target, |c| c.on_start.clone());
            self.first_execution = false;
            self.behavior.init_with_target(target, self.relative);
        }

        self.status = ActionStatus::Running;

        let time = self.normalized_time();
        if !time.is_finite() {
            log::error!(
                "action '{}' produced non-finite progress {} at t={}; ending it",
                self.tag,
                time,
                self.current_time
            );
            self.finish(target);
            return None;
        }

        let result = self.behavior.update(time, target);
        log::trace!("action '{}' applied at {} -> {:?}", self.tag, time, result);

        if let Some(cb) = self.callbacks.on_apply.clone() {
            cb(self, target, &result);
        }
        self.check_repetition(target);
        Some(result)
    }

    fn check_repetition(&mut self, target: &mut A::Target) {
        if self.repeat == RepeatPolicy::Finite(1) || self.current_time < self.start_time {
            return;
        }

        let elapsed = self.current_time - self.start_time;
        // Float-to-int casts saturate, so huge times cannot overflow.
        let mut index = (elapsed / self.one_repetition_duration()).floor() as u64;
        if let RepeatPolicy::Finite(times) = self.repeat {
            index = index.min(u64::from(times) - 1);
        }

        if index != self.current_repeat_count {
            self.current_repeat_count = index;
            log::debug!("action '{}' repetition {}", self.tag, index);
            if let Some(cb) = self.callbacks.on_repeat.clone() {
                cb(self, target, index);
            }
        }
    }

    fn finish(&mut self, target: &mut A::Target) {
        self.status = ActionStatus::Ended;
        log::debug!("action '{}' ended at t={}", self.tag, self.current_time);
        self.fire(target, |c| c.on_end.clone());
    }

    fn fire(
        &mut self,
        target: &mut A::Target,
        pick: impl FnOnce(&Callbacks<A>) -> Option<ActionCallback<A>>,
    ) {
        if let Some(cb) = pick(&self.callbacks) {
            cb(self, target);
        }
    }

    /// Suspend. No-op once ended or already paused.
    pub fn pause(&mut self, target: &mut A::Target) {
        if matches!(self.status, ActionStatus::Ended | ActionStatus::Paused) {
            return;
        }
        self.status = ActionStatus::Paused;
        log::debug!("action '{}' paused at t={}", self.tag, self.current_time);
        self.fire(target, |c| c.on_pause.clone());
    }

    /// Leave the paused state; `on_resume` fires on the next step. No-op
    /// unless paused.
    pub fn resume(&mut self) {
        if self.status == ActionStatus::Paused {
            self.status = ActionStatus::Resumed;
        }
    }

    /// Force the end without a final update. No-op once ended.
    pub fn stop(&mut self, target: &mut A::Target) {
        if self.status == ActionStatus::Ended {
            return;
        }
        self.finish(target);
    }

    /// Back to `Created` with the clock at zero.
    pub fn restart(&mut self) {
        self.status = ActionStatus::Created;
        self.first_execution = true;
        self.current_repeat_count = 0;
        self.current_time = 0.0;
        self.behavior.restart();
        log::debug!("action '{}' restarted", self.tag);
    }
}

fn checked_delay(field: &'static str, delay: f64) -> EngineResult<f64> {
    if delay.is_finite() && delay >= 0.0 {
        Ok(delay)
    } else {
        Err(EngineError::InvalidDuration { field, value: delay })
    }
}

/// Copies configuration and shares callbacks. The copy starts fresh
/// (`Created`, clock at zero) and detached from any owning sequence.
impl<A: Animatable> Clone for Action<A> {
    fn clone(&self) -> Self {
        let mut behavior = self.behavior.clone();
        behavior.restart();
        Self {
            tag: self.tag.clone(),
            duration: self.duration,
            delay_before: self.delay_before,
            delay_after: self.delay_after,
            repeat: self.repeat,
            speed: self.speed,
            relative: self.relative,
            reversed_time: self.reversed_time,
            reversed: self.reversed,
            status: ActionStatus::Created,
            current_time: 0.0,
            current_repeat_count: 0,
            first_execution: true,
            start_time: self.delay_before,
            chain_offset: 0.0,
            interpolator: self.interpolator,
            callbacks: self.callbacks.clone(),
            units: self.units,
            behavior,
        }
    }
}

impl<A: Animatable> Action<A> {
    /// Exact copy, runtime state and chain offset included.
    pub(crate) fn snapshot(&self) -> Self {
        Self {
            status: self.status,
            current_time: self.current_time,
            current_repeat_count: self.current_repeat_count,
            first_execution: self.first_execution,
            start_time: self.start_time,
            chain_offset: self.chain_offset,
            behavior: self.behavior.snapshot(),
            ..self.clone()
        }
    }
}

impl<A: Animatable + fmt::Debug> fmt::Debug for Action<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("tag", &self.tag)
            .field("status", &self.status)
            .field("duration", &self.duration)
            .field("start_time", &self.start_time)
            .field("current_time", &self.current_time)
            .field("repeat", &self.repeat)
            .field("interpolator", &self.interpolator)
            .field("behavior", &self.behavior)
            .finish_non_exhaustive()
    }
}
