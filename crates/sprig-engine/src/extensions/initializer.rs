// extensions/initializer.rs
//
// JSON wire form of node actions. Times are expressed in the caller's time
// units, the same ones passed to `Action::from_initializer`.
//
// Usage:
//   let init = ActionInitializer::from_json(r#"{"type":"move","duration":0.5,"to":[100,0]}"#)?;
//   let action = Action::from_initializer(&init, TimeUnitConfig::seconds())?;
//   let json = action.initializer().to_json()?;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::error::{EngineError, EngineResult};
use crate::core::time::{RepeatPolicy, TimeUnitConfig};
use super::action::Action;
use super::behaviors::{ActionKind, NodeProperty};
use super::interpolator::{Interpolator, InterpolatorSpec};

/// A `from`/`to` value: one number, or an `[x, y]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitValue {
    Scalar(f32),
    Pair([f32; 2]),
}

impl InitValue {
    fn scalar(self, field: &'static str) -> EngineResult<f32> {
        match self {
            InitValue::Scalar(v) => Ok(v),
            InitValue::Pair(_) => Err(EngineError::invalid_value(field, "expected a number")),
        }
    }

    fn pair(self, field: &'static str) -> EngineResult<Vec2> {
        match self {
            InitValue::Pair([x, y]) => Ok(Vec2::new(x, y)),
            InitValue::Scalar(_) => Err(EngineError::invalid_value(field, "expected an [x, y] pair")),
        }
    }

    /// Scales accept a single number as a uniform factor.
    fn pair_or_splat(self) -> Vec2 {
        match self {
            InitValue::Scalar(v) => Vec2::splat(v),
            InitValue::Pair([x, y]) => Vec2::new(x, y),
        }
    }
}

impl From<Vec2> for InitValue {
    fn from(v: Vec2) -> Self {
        InitValue::Pair([v.x, v.y])
    }
}

impl From<f32> for InitValue {
    fn from(v: f32) -> Self {
        InitValue::Scalar(v)
    }
}

/// Plain description of an action, sufficient to rebuild an equivalent one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionInitializer {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_before: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_after: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolator: Option<InterpolatorSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<InitValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<InitValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_times: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_forever: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<NodeProperty>,
    /// Children of a `sequence`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionInitializer>,
}

impl ActionInitializer {
    pub fn new(kind: &str) -> Self {
        Self { kind: Some(kind.to_string()), ..Self::default() }
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn required_to(&self) -> EngineResult<InitValue> {
        self.to.ok_or(EngineError::MissingField("to"))
    }

    fn behavior(&self, kind: &str) -> EngineResult<ActionKind> {
        let behavior = match kind {
            "move" => {
                let to = self.required_to()?.pair("to")?;
                match self.from {
                    Some(from) => ActionKind::move_between(from.pair("from")?, to),
                    None => ActionKind::move_to(to),
                }
            }
            "rotate" => {
                let to = self.required_to()?.scalar("to")?;
                match self.from {
                    Some(from) => ActionKind::rotate_between(from.scalar("from")?, to),
                    None => ActionKind::rotate_to(to),
                }
            }
            "scale" => {
                let to = self.required_to()?.pair_or_splat();
                match self.from {
                    Some(from) => ActionKind::scale_between(from.pair_or_splat(), to),
                    None => ActionKind::scale_to(to),
                }
            }
            "property" | "fade" => {
                let property = if kind == "fade" {
                    NodeProperty::Alpha
                } else {
                    self.property.ok_or(EngineError::MissingField("property"))?
                };
                let to = self.required_to()?.scalar("to")?;
                match self.from {
                    Some(from) => ActionKind::property_between(property, from.scalar("from")?, to),
                    None => ActionKind::property_to(property, to),
                }
            }
            other => return Err(EngineError::UnknownActionType(other.to_string())),
        };
        Ok(behavior)
    }
}

impl Action<ActionKind> {
    /// Build an action (recursively, for sequences) from its initializer.
    pub fn from_initializer(init: &ActionInitializer, units: TimeUnitConfig) -> EngineResult<Self> {
        let kind = init.kind.as_deref().ok_or(EngineError::MissingField("type"))?;

        let mut action = if kind == "sequence" {
            let children = init
                .actions
                .iter()
                .map(|child| Self::from_initializer(child, units))
                .collect::<EngineResult<Vec<_>>>()?;
            Self::sequence_with_units(children, units)?
        } else {
            let duration = init.duration.ok_or(EngineError::MissingField("duration"))?;
            Self::with_time_units(init.behavior(kind)?, duration, units)?
        };

        if let Some(tag) = &init.tag {
            action.set_tag(tag.as_str());
        }
        if let Some(delay) = init.delay_before {
            action.set_delay(delay)?;
        }
        if let Some(delay) = init.delay_after {
            action.set_delay_after_application(delay)?;
        }
        if init.repeat_forever == Some(true) {
            action.set_repeat_forever();
        } else if let Some(times) = init.repeat_times {
            action.set_repeat_times(times)?;
        }
        if let Some(speed) = init.speed {
            action.set_speed(speed)?;
        }
        if let Some(relative) = init.relative {
            action.set_relative(relative);
        }
        if let Some(spec) = &init.interpolator {
            action.set_interpolator(Some(Interpolator::parse(spec)?));
        }
        if init.reversed == Some(true) {
            action.set_reversed();
        }

        Ok(action)
    }

    /// Describe this action so [`from_initializer`](Self::from_initializer)
    /// rebuilds an equivalent one.
    ///
    /// Times are written in the action's current [`time_units`](Self::time_units),
    /// whatever units were active when they were set, so rebuild with
    /// `time_units()`. After a `set_time_units` call the numbers change but
    /// the stored durations they describe do not.
    pub fn initializer(&self) -> ActionInitializer {
        let factor = self.time_units().factor();
        let unscale = |v: f64| v / factor;

        let mut init = ActionInitializer::new(self.behavior().type_name());
        if !self.tag().is_empty() {
            init.tag = Some(self.tag().to_string());
        }
        if self.delay_before() > 0.0 {
            init.delay_before = Some(unscale(self.delay_before()));
        }
        if self.delay_after() > 0.0 {
            init.delay_after = Some(unscale(self.delay_after()));
        }
        match self.repeat() {
            RepeatPolicy::Infinite => init.repeat_forever = Some(true),
            RepeatPolicy::Finite(1) => {}
            RepeatPolicy::Finite(times) => init.repeat_times = Some(times),
        }
        if self.speed() != 1.0 {
            init.speed = Some(self.speed());
        }
        if self.is_relative() {
            init.relative = Some(true);
        }

        match self.behavior() {
            // Children are already stored in reversed order, so a reversed
            // sequence is described as a plain one.
            ActionKind::Sequence(seq) => {
                init.actions = seq.children().iter().map(Action::initializer).collect();
                init.interpolator = self.interpolator().map(Interpolator::describe);
            }
            leaf => {
                init.duration = Some(unscale(self.duration()));
                describe_leaf(leaf, &mut init);
                // Rebuilding re-applies the reversal, so describe the
                // interpolator as it was before it.
                let interpolator = match self.interpolator() {
                    Some(i) if self.is_reversed() => Some(i.reverse()),
                    other => other.copied(),
                };
                init.interpolator = interpolator.map(|i| i.describe());
                if self.is_reversed() {
                    init.reversed = Some(true);
                }
            }
        }
        init
    }
}

fn describe_leaf(kind: &ActionKind, init: &mut ActionInitializer) {
    match kind {
        ActionKind::Move(a) => {
            init.from = a.from.map(InitValue::from);
            init.to = Some(a.to.into());
        }
        ActionKind::Rotate(a) => {
            init.from = a.from.map(InitValue::from);
            init.to = Some(a.to.into());
        }
        ActionKind::Scale(a) => {
            init.from = a.from.map(InitValue::from);
            init.to = Some(a.to.into());
        }
        ActionKind::Property(a) => {
            init.property = Some(a.property);
            init.from = a.from.map(InitValue::from);
            init.to = Some(a.to.into());
        }
        ActionKind::Sequence(_) => {}
    }
}
