// extensions/behaviors.rs
//
// Concrete action kinds that animate a `Node`, plus the sequence composite.
//
// Usage:
//   let slide = Action::new(ActionKind::move_to(Vec2::new(100.0, 0.0)), 0.5)?;
//   let fade = Action::new(ActionKind::fade_out(), 0.25)?;
//   let both = Action::sequence(vec![slide, fade])?;

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::error::{EngineError, EngineResult};
use crate::core::node::Node;
use crate::core::time::TimeUnitConfig;
use super::action::{Action, Animatable, ApplyResult};

/// Scalar node property a [`PropertyAction`] can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeProperty {
    X,
    Y,
    /// Degrees.
    Rotation,
    ScaleX,
    ScaleY,
    Alpha,
    Width,
    Height,
}

impl NodeProperty {
    pub const ALL: [NodeProperty; 8] = [
        NodeProperty::X,
        NodeProperty::Y,
        NodeProperty::Rotation,
        NodeProperty::ScaleX,
        NodeProperty::ScaleY,
        NodeProperty::Alpha,
        NodeProperty::Width,
        NodeProperty::Height,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NodeProperty::X => "x",
            NodeProperty::Y => "y",
            NodeProperty::Rotation => "rotation",
            NodeProperty::ScaleX => "scaleX",
            NodeProperty::ScaleY => "scaleY",
            NodeProperty::Alpha => "alpha",
            NodeProperty::Width => "width",
            NodeProperty::Height => "height",
        }
    }

    pub fn read(self, node: &Node) -> f32 {
        match self {
            NodeProperty::X => node.position().x,
            NodeProperty::Y => node.position().y,
            NodeProperty::Rotation => node.rotation(),
            NodeProperty::ScaleX => node.scale().x,
            NodeProperty::ScaleY => node.scale().y,
            NodeProperty::Alpha => node.alpha(),
            NodeProperty::Width => node.size().x,
            NodeProperty::Height => node.size().y,
        }
    }

    pub fn write(self, node: &mut Node, value: f32) {
        match self {
            NodeProperty::X => node.set_x(value),
            NodeProperty::Y => node.set_y(value),
            NodeProperty::Rotation => node.set_rotation(value),
            NodeProperty::ScaleX => node.set_scale_x(value),
            NodeProperty::ScaleY => node.set_scale_y(value),
            NodeProperty::Alpha => node.set_alpha(value),
            NodeProperty::Width => node.set_size(Vec2::new(value, node.size().y)),
            NodeProperty::Height => node.set_size(Vec2::new(node.size().x, value)),
        }
    }
}

impl fmt::Display for NodeProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NodeProperty {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeProperty::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| EngineError::invalid_value("property", format!("unknown property '{s}'")))
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f64) -> f32 {
    a + (b - a) * t as f32
}

/// Animates `Node::position`. Without `from`, starts wherever the node is.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveAction {
    pub from: Option<Vec2>,
    pub to: Vec2,
    start: Vec2,
    end: Vec2,
}

/// Animates `Node::rotation` in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct RotateAction {
    pub from: Option<f32>,
    pub to: f32,
    start: f32,
    end: f32,
}

/// Animates `Node::scale`. Relative targets multiply the start scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleAction {
    pub from: Option<Vec2>,
    pub to: Vec2,
    start: Vec2,
    end: Vec2,
}

/// Animates one scalar [`NodeProperty`].
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAction {
    pub property: NodeProperty,
    pub from: Option<f32>,
    pub to: f32,
    start: f32,
    end: f32,
}

impl MoveAction {
    fn init(&mut self, node: &Node, relative: bool) {
        self.start = self.from.unwrap_or(node.position());
        self.end = if relative { self.start + self.to } else { self.to };
    }

    fn update(&self, t: f64, node: &mut Node) -> ApplyResult {
        let pos = self.start + (self.end - self.start) * t as f32;
        node.set_position(pos);
        ApplyResult::Point(pos)
    }
}

impl RotateAction {
    fn init(&mut self, node: &Node, relative: bool) {
        self.start = self.from.unwrap_or(node.rotation());
        self.end = if relative { self.start + self.to } else { self.to };
    }

    fn update(&self, t: f64, node: &mut Node) -> ApplyResult {
        let angle = lerp(self.start, self.end, t);
        node.set_rotation(angle);
        ApplyResult::Scalar(angle)
    }
}

impl ScaleAction {
    fn init(&mut self, node: &Node, relative: bool) {
        self.start = self.from.unwrap_or(node.scale());
        self.end = if relative { self.start * self.to } else { self.to };
    }

    fn update(&self, t: f64, node: &mut Node) -> ApplyResult {
        let scale = self.start + (self.end - self.start) * t as f32;
        node.set_scale(scale);
        ApplyResult::Point(scale)
    }
}

impl PropertyAction {
    fn init(&mut self, node: &Node, relative: bool) {
        self.start = self.from.unwrap_or(self.property.read(node));
        self.end = if relative { self.start + self.to } else { self.to };
    }

    fn update(&self, t: f64, node: &mut Node) -> ApplyResult {
        let value = lerp(self.start, self.end, t);
        self.property.write(node, value);
        ApplyResult::Scalar(value)
    }
}

/// Children played one after another. Each child starts where its
/// predecessor ends (plus its own delay); the sequence lasts until the last
/// child ends.
#[derive(Debug, Clone)]
pub struct Sequence {
    children: Vec<Action<ActionKind>>,
    /// Stored units, refreshed by `layout`.
    duration: f64,
    /// Local time of the last update.
    clock: Option<f64>,
}

impl Sequence {
    pub fn new(children: Vec<Action<ActionKind>>) -> Self {
        Self { children, duration: 0.0, clock: None }
    }

    pub fn children(&self) -> &[Action<ActionKind>] {
        &self.children
    }

    /// Combined duration as of the last layout.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    fn layout(&mut self) -> EngineResult<f64> {
        if self.children.is_empty() {
            return Err(EngineError::EmptySequence);
        }

        let mut offset = 0.0;
        for child in &mut self.children {
            child.update_duration()?;
            child.set_chain_offset(offset);
            let total = child.total_duration().ok_or(EngineError::UnboundedSequenceChild)?;
            offset = child.start_time() + total;
        }
        self.duration = offset;
        Ok(offset)
    }

    /// Walks children in play order, or last to first when the clock went
    /// back, so the child owning `local` is applied last either way.
    fn update(&mut self, t: f64, node: &mut Node) -> ApplyResult {
        let local = t * self.duration;
        let backwards = self.clock.is_some_and(|last| local < last);
        self.clock = Some(local);

        if backwards {
            for child in self.children.iter_mut().rev() {
                child.seek(local, node);
            }
        } else {
            for child in &mut self.children {
                child.seek(local, node);
            }
        }
        ApplyResult::None
    }

    fn reverse(&mut self) {
        self.children.reverse();
        for child in &mut self.children {
            child.set_reversed();
        }
    }

    fn restart(&mut self) {
        self.clock = None;
        for child in &mut self.children {
            child.restart();
        }
    }

    fn snapshot(&self) -> Self {
        Self {
            children: self.children.iter().map(Action::snapshot).collect(),
            duration: self.duration,
            clock: self.clock,
        }
    }
}

/// Every action kind that can animate a [`Node`].
#[derive(Debug, Clone)]
pub enum ActionKind {
    Move(MoveAction),
    Rotate(RotateAction),
    Scale(ScaleAction),
    Property(PropertyAction),
    Sequence(Sequence),
}

impl ActionKind {
    /// Move from the node's current position to `to`.
    pub fn move_to(to: Vec2) -> Self {
        Self::moving(None, to)
    }

    pub fn move_between(from: Vec2, to: Vec2) -> Self {
        Self::moving(Some(from), to)
    }

    fn moving(from: Option<Vec2>, to: Vec2) -> Self {
        ActionKind::Move(MoveAction { from, to, start: Vec2::ZERO, end: Vec2::ZERO })
    }

    /// Rotate from the node's current angle to `degrees`.
    pub fn rotate_to(degrees: f32) -> Self {
        Self::rotating(None, degrees)
    }

    pub fn rotate_between(from: f32, to: f32) -> Self {
        Self::rotating(Some(from), to)
    }

    fn rotating(from: Option<f32>, to: f32) -> Self {
        ActionKind::Rotate(RotateAction { from, to, start: 0.0, end: 0.0 })
    }

    pub fn scale_to(to: Vec2) -> Self {
        Self::scaling(None, to)
    }

    pub fn scale_between(from: Vec2, to: Vec2) -> Self {
        Self::scaling(Some(from), to)
    }

    fn scaling(from: Option<Vec2>, to: Vec2) -> Self {
        ActionKind::Scale(ScaleAction { from, to, start: Vec2::ONE, end: Vec2::ONE })
    }

    pub fn property_to(property: NodeProperty, to: f32) -> Self {
        Self::property(property, None, to)
    }

    pub fn property_between(property: NodeProperty, from: f32, to: f32) -> Self {
        Self::property(property, Some(from), to)
    }

    fn property(property: NodeProperty, from: Option<f32>, to: f32) -> Self {
        ActionKind::Property(PropertyAction { property, from, to, start: 0.0, end: 0.0 })
    }

    /// Fade in from transparent.
    pub fn fade_in() -> Self {
        Self::property_between(NodeProperty::Alpha, 0.0, 1.0)
    }

    /// Fade out to transparent.
    pub fn fade_out() -> Self {
        Self::property_between(NodeProperty::Alpha, 1.0, 0.0)
    }

    /// Name used by action initializers.
    pub fn type_name(&self) -> &'static str {
        match self {
            ActionKind::Move(_) => "move",
            ActionKind::Rotate(_) => "rotate",
            ActionKind::Scale(_) => "scale",
            ActionKind::Property(_) => "property",
            ActionKind::Sequence(_) => "sequence",
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            ActionKind::Sequence(seq) => Some(seq),
            _ => None,
        }
    }
}

impl Animatable for ActionKind {
    type Target = Node;

    fn init_with_target(&mut self, target: &Node, relative: bool) {
        match self {
            ActionKind::Move(a) => a.init(target, relative),
            ActionKind::Rotate(a) => a.init(target, relative),
            ActionKind::Scale(a) => a.init(target, relative),
            ActionKind::Property(a) => a.init(target, relative),
            // Children snapshot their own start values when they first apply.
            ActionKind::Sequence(_) => {}
        }
    }

    fn update(&mut self, time: f64, target: &mut Node) -> ApplyResult {
        match self {
            ActionKind::Move(a) => a.update(time, target),
            ActionKind::Rotate(a) => a.update(time, target),
            ActionKind::Scale(a) => a.update(time, target),
            ActionKind::Property(a) => a.update(time, target),
            ActionKind::Sequence(seq) => seq.update(time, target),
        }
    }

    fn layout(&mut self) -> EngineResult<Option<f64>> {
        match self {
            ActionKind::Sequence(seq) => seq.layout().map(Some),
            _ => Ok(None),
        }
    }

    fn reverse_structure(&mut self) -> bool {
        match self {
            ActionKind::Sequence(seq) => {
                seq.reverse();
                true
            }
            _ => false,
        }
    }

    fn restart(&mut self) {
        if let ActionKind::Sequence(seq) = self {
            seq.restart();
        }
    }

    fn snapshot(&self) -> Self {
        match self {
            ActionKind::Sequence(seq) => ActionKind::Sequence(seq.snapshot()),
            other => other.clone(),
        }
    }
}

impl Action<ActionKind> {
    /// Play `children` back to back, with times in seconds.
    pub fn sequence(children: Vec<Action<ActionKind>>) -> EngineResult<Self> {
        Self::sequence_with_units(children, TimeUnitConfig::default())
    }

    pub fn sequence_with_units(
        children: Vec<Action<ActionKind>>,
        units: TimeUnitConfig,
    ) -> EngineResult<Self> {
        Action::composite(ActionKind::Sequence(Sequence::new(children)), units)
    }

    /// Children of a sequence; empty for leaf actions.
    pub fn children(&self) -> &[Action<ActionKind>] {
        match self.behavior().as_sequence() {
            Some(seq) => seq.children(),
            None => &[],
        }
    }

    /// Append a child to a sequence and lay it out again.
    pub fn push_child(&mut self, child: Action<ActionKind>) -> EngineResult<()> {
        match self.behavior_mut() {
            ActionKind::Sequence(seq) => seq.children.push(child),
            other => {
                return Err(EngineError::invalid_value(
                    "children",
                    format!("'{}' action cannot hold children", other.type_name()),
                ))
            }
        }
        self.relayout_or_pop()
    }

    /// Edit one child of a sequence in place and lay the sequence out again.
    /// If the edit or the new layout fails, the child is put back as it was.
    pub fn edit_child(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut Action<ActionKind>) -> EngineResult<()>,
    ) -> EngineResult<()> {
        let child = match self.behavior_mut() {
            ActionKind::Sequence(seq) => seq.children.get_mut(index),
            _ => None,
        };
        let child = child.ok_or_else(|| {
            EngineError::invalid_value("children", format!("no child at index {index}"))
        })?;

        let backup = child.snapshot();
        let mut result = edit(child);
        if result.is_ok() {
            result = self.update_duration();
        }
        if result.is_err() {
            if let ActionKind::Sequence(seq) = self.behavior_mut() {
                if let Some(slot) = seq.children.get_mut(index) {
                    *slot = backup;
                }
            }
            self.update_duration()?;
        }
        result
    }

    fn relayout_or_pop(&mut self) -> EngineResult<()> {
        let result = self.update_duration();
        if result.is_err() {
            if let ActionKind::Sequence(seq) = self.behavior_mut() {
                seq.children.pop();
            }
            self.update_duration()?;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::action::ActionStatus;
    use crate::extensions::interpolator::Interpolator;
    use crate::api::types::NodeId;
    use crate::core::time::RepeatPolicy;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn node() -> Node {
        Node::new(NodeId(1))
    }

    fn millis(kind: ActionKind, duration: f64) -> Action<ActionKind> {
        Action::with_time_units(kind, duration, TimeUnitConfig::millis()).unwrap()
    }

    #[test]
    fn move_snapshots_start_lazily() {
        let mut target = node().with_pos(Vec2::new(10.0, 0.0));
        let mut action = millis(ActionKind::move_to(Vec2::new(110.0, 0.0)), 1000.0);

        // Position set after construction is what the action starts from.
        target.set_x(20.0);
        action.step(500.0, &mut target);
        assert!((target.position().x - 65.0).abs() < 1e-4);

        action.step(500.0, &mut target);
        assert_eq!(target.position(), Vec2::new(110.0, 0.0));
        assert_eq!(action.status(), ActionStatus::Ended);
    }

    #[test]
    fn relative_move_offsets_from_start() {
        let mut target = node().with_pos(Vec2::new(10.0, 10.0));
        let mut action = millis(ActionKind::move_to(Vec2::new(5.0, -5.0)), 100.0).with_relative(true);
        action.step(100.0, &mut target);
        assert_eq!(target.position(), Vec2::new(15.0, 5.0));
    }

    #[test]
    fn rotate_and_scale() {
        let mut target = node();
        let mut rotate = millis(ActionKind::rotate_between(0.0, 90.0), 100.0);
        let mut scale = millis(ActionKind::scale_to(Vec2::splat(2.0)), 100.0).with_relative(true);

        rotate.step(50.0, &mut target);
        assert!((target.rotation() - 45.0).abs() < 1e-4);

        scale.step(100.0, &mut target);
        assert_eq!(target.scale(), Vec2::splat(2.0));
    }

    #[test]
    fn fade_reports_alpha_to_on_apply() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut target = node();
        let mut fade = millis(ActionKind::fade_out(), 100.0)
            .with_on_apply(move |_, _, result| sink.borrow_mut().push(*result));

        fade.step(25.0, &mut target);
        fade.step(75.0, &mut target);
        assert_eq!(*seen.borrow(), vec![ApplyResult::Scalar(0.75), ApplyResult::Scalar(0.0)]);
        assert_eq!(target.alpha(), 0.0);
    }

    #[test]
    fn property_actions_write_size() {
        let mut target = node().with_size(Vec2::new(10.0, 10.0));
        let mut grow = millis(ActionKind::property_to(NodeProperty::Width, 30.0), 100.0);
        grow.step(100.0, &mut target);
        assert_eq!(target.size(), Vec2::new(30.0, 10.0));
    }

    #[test]
    fn reversed_move_plays_backwards() {
        let mut target = node();
        let forward = millis(ActionKind::move_between(Vec2::ZERO, Vec2::new(100.0, 0.0)), 100.0);
        let mut backward = forward.create_reversed();

        backward.step(25.0, &mut target);
        assert!((target.position().x - 75.0).abs() < 1e-4);
    }

    #[test]
    fn sequence_chains_start_times() {
        let mut first = millis(ActionKind::move_to(Vec2::new(100.0, 0.0)), 100.0);
        first.set_delay(50.0).unwrap();
        let mut second = millis(ActionKind::fade_out(), 200.0);
        second.set_delay(10.0).unwrap();
        let third = millis(ActionKind::rotate_to(90.0), 100.0);

        let seq = Action::sequence_with_units(vec![first, second, third], TimeUnitConfig::millis()).unwrap();
        let starts: Vec<f64> = seq.children().iter().map(|c| c.start_time()).collect();
        assert_eq!(starts, vec![50.0, 160.0, 360.0]);
        assert_eq!(seq.duration(), 460.0);
    }

    #[test]
    fn sequence_plays_children_in_order() {
        let mut target = node();
        let slide = millis(ActionKind::move_between(Vec2::ZERO, Vec2::new(100.0, 0.0)), 100.0);
        let fade = millis(ActionKind::fade_out(), 100.0);
        let mut seq = Action::sequence_with_units(vec![slide, fade], TimeUnitConfig::millis()).unwrap();

        seq.step(50.0, &mut target);
        assert!((target.position().x - 50.0).abs() < 1e-3);
        assert_eq!(target.alpha(), 1.0);

        seq.step(100.0, &mut target);
        assert!((target.position().x - 100.0).abs() < 1e-3);
        assert!((target.alpha() - 0.5).abs() < 1e-3);
        assert_eq!(seq.children()[0].status(), ActionStatus::Ended);

        assert_eq!(seq.step(100.0, &mut target), ActionStatus::Ended);
        assert_eq!(target.alpha(), 0.0);
        assert!(seq.children().iter().all(|c| c.status() == ActionStatus::Ended));
    }

    #[test]
    fn large_frame_finishes_skipped_children() {
        let mut target = node();
        let slide = millis(ActionKind::move_to(Vec2::new(100.0, 0.0)), 100.0);
        let spin = millis(ActionKind::rotate_to(180.0), 100.0);
        let mut seq = Action::sequence_with_units(vec![slide, spin], TimeUnitConfig::millis()).unwrap();

        assert_eq!(seq.step(1000.0, &mut target), ActionStatus::Ended);
        assert_eq!(target.position(), Vec2::new(100.0, 0.0));
        assert_eq!(target.rotation(), 180.0);
    }

    #[test]
    fn reversed_sequence_swaps_child_order() {
        let mut target = node();
        let slide = millis(ActionKind::move_between(Vec2::ZERO, Vec2::new(100.0, 0.0)), 100.0);
        let spin = millis(ActionKind::rotate_between(0.0, 90.0), 300.0);
        let seq = Action::sequence_with_units(vec![slide, spin], TimeUnitConfig::millis()).unwrap();

        let mut reversed = seq.create_reversed();
        assert!(reversed.is_reversed());
        assert!(reversed.interpolator().is_none());
        let starts: Vec<f64> = reversed.children().iter().map(|c| c.start_time()).collect();
        assert_eq!(starts, vec![0.0, 300.0]);

        // Rotation plays first, backwards from 90.
        reversed.step(150.0, &mut target);
        assert!((target.rotation() - 45.0).abs() < 1e-3);
        assert_eq!(target.position(), Vec2::ZERO);
    }

    #[test]
    fn repeated_sequence_replays_children() {
        let mut target = node();
        let slide = millis(ActionKind::move_between(Vec2::ZERO, Vec2::new(100.0, 0.0)), 100.0);
        let mut seq = Action::sequence_with_units(vec![slide], TimeUnitConfig::millis()).unwrap();
        seq.set_repeat_times(2).unwrap();

        seq.step(100.0, &mut target);
        seq.step(50.0, &mut target);
        assert!((target.position().x - 50.0).abs() < 1e-3);
    }

    #[test]
    fn sequence_rejects_bad_children() {
        assert!(matches!(Action::sequence(Vec::new()), Err(EngineError::EmptySequence)));

        let mut forever = millis(ActionKind::fade_in(), 100.0);
        forever.set_repeat_forever();
        assert!(matches!(
            Action::sequence(vec![forever.clone()]),
            Err(EngineError::UnboundedSequenceChild)
        ));

        let mut seq = Action::sequence(vec![millis(ActionKind::fade_in(), 100.0)]).unwrap();
        assert!(seq.push_child(forever).is_err());
        assert_eq!(seq.children().len(), 1);
        assert_eq!(seq.duration(), 100.0);
    }

    #[test]
    fn push_and_edit_child_relayout() {
        let mut seq = Action::sequence(vec![millis(ActionKind::fade_in(), 100.0)]).unwrap();
        seq.push_child(millis(ActionKind::fade_out(), 50.0)).unwrap();
        assert_eq!(seq.duration(), 150.0);

        seq.edit_child(0, |child| child.set_delay_after_application(25.0)).unwrap();
        assert_eq!(seq.children()[1].start_time(), 125.0);
        assert_eq!(seq.duration(), 175.0);

        assert!(seq.edit_child(5, |_| Ok(())).is_err());

        let mut leaf = millis(ActionKind::fade_in(), 100.0);
        assert!(leaf.push_child(millis(ActionKind::fade_out(), 50.0)).is_err());
    }

    #[test]
    fn failed_edit_leaves_sequence_unchanged() {
        let mut seq = Action::sequence_with_units(
            vec![millis(ActionKind::fade_in(), 100.0), millis(ActionKind::fade_out(), 100.0)],
            TimeUnitConfig::millis(),
        )
        .unwrap();

        let result = seq.edit_child(0, |child| {
            child.set_repeat_forever();
            Ok(())
        });
        assert!(matches!(result, Err(EngineError::UnboundedSequenceChild)));
        assert_eq!(seq.children()[0].repeat(), RepeatPolicy::Finite(1));
        assert_eq!(seq.duration(), 200.0);
        assert_eq!(seq.children()[1].start_time(), 100.0);

        let result = seq.edit_child(1, |child| {
            child.set_duration(400.0)?;
            Err(EngineError::invalid_value("duration", "rejected"))
        });
        assert!(result.is_err());
        assert_eq!(seq.children()[1].duration(), 100.0);
        assert_eq!(seq.duration(), 200.0);
    }

    #[test]
    fn failed_edit_keeps_child_progress() {
        let mut target = node();
        let mut seq = Action::sequence_with_units(
            vec![millis(ActionKind::move_between(Vec2::ZERO, Vec2::new(100.0, 0.0)), 100.0)],
            TimeUnitConfig::millis(),
        )
        .unwrap();
        seq.step(40.0, &mut target);

        assert!(seq.edit_child(0, |child| { child.set_repeat_forever(); Ok(()) }).is_err());
        assert_eq!(seq.children()[0].status(), ActionStatus::Running);
        assert_eq!(seq.children()[0].current_time(), 40.0);
    }

    #[test]
    fn reversed_time_sequence_returns_to_start() {
        let mut target = node();
        let across = millis(ActionKind::property_between(NodeProperty::X, 0.0, 100.0), 100.0);
        let down = millis(ActionKind::property_between(NodeProperty::Y, 0.0, 100.0), 100.0);
        let mut seq = Action::sequence_with_units(vec![across, down], TimeUnitConfig::millis())
            .unwrap()
            .with_reversed_time(true);

        let mut frames = 0;
        while seq.step(30.0, &mut target) != ActionStatus::Ended {
            frames += 1;
            assert!(frames < 100);
        }
        assert_eq!(target.position(), Vec2::ZERO);
    }

    #[test]
    fn pingpong_sequence_rewinds_later_children() {
        let mut target = node();
        let across = millis(ActionKind::property_between(NodeProperty::X, 0.0, 100.0), 100.0);
        let down = millis(ActionKind::property_between(NodeProperty::Y, 0.0, 100.0), 100.0);
        let mut seq = Action::sequence_with_units(vec![across, down], TimeUnitConfig::millis())
            .unwrap()
            .with_interpolator(Interpolator::linear().with_pingpong(true));

        // Forward half: local clock reaches 200 at t = 100.
        seq.step(100.0, &mut target);
        assert_eq!(target.position(), Vec2::new(100.0, 100.0));

        // Backward half: local 200 -> 80 crosses the second child's start.
        seq.step(60.0, &mut target);
        assert!((target.position().x - 80.0).abs() < 1e-3);
        assert_eq!(target.position().y, 0.0);

        assert_eq!(seq.step(100.0, &mut target), ActionStatus::Ended);
        assert_eq!(target.position(), Vec2::ZERO);
    }

    #[test]
    fn nested_sequences_lay_out_recursively() {
        let inner = Action::sequence_with_units(
            vec![millis(ActionKind::fade_in(), 100.0), millis(ActionKind::fade_out(), 100.0)],
            TimeUnitConfig::millis(),
        )
        .unwrap();
        let outer = Action::sequence_with_units(
            vec![millis(ActionKind::rotate_to(10.0), 50.0), inner],
            TimeUnitConfig::millis(),
        )
        .unwrap();

        assert_eq!(outer.duration(), 250.0);
        assert_eq!(outer.children()[1].start_time(), 50.0);
        assert_eq!(outer.children()[1].children()[1].start_time(), 100.0);
    }

    #[test]
    fn eased_sequence_still_lands_on_targets() {
        let mut target = node();
        let slide = millis(ActionKind::move_between(Vec2::ZERO, Vec2::new(10.0, 0.0)), 100.0);
        let mut seq = Action::sequence_with_units(vec![slide], TimeUnitConfig::millis())
            .unwrap()
            .with_interpolator(Interpolator::ease_in(2.0));

        seq.step(50.0, &mut target);
        assert!((target.position().x - 2.5).abs() < 1e-3);
        seq.step(50.0, &mut target);
        assert_eq!(target.position().x, 10.0);
    }

    #[test]
    fn property_names_parse() {
        for p in NodeProperty::ALL {
            assert_eq!(p.name().parse::<NodeProperty>().unwrap(), p);
        }
        assert!("depth".parse::<NodeProperty>().is_err());
    }
}
