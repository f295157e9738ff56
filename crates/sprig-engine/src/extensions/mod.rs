// extensions/mod.rs
//
// Animation layer on top of the scene graph: interpolators, the generic
// action state machine, node behaviors, their JSON form and the per-frame
// action list.

pub mod action;
pub mod behaviors;
pub mod initializer;
pub mod interpolator;
pub mod manager;

pub use action::{Action, ActionStatus, Animatable, ApplyResult};
pub use behaviors::{ActionKind, NodeProperty, Sequence};
pub use initializer::{ActionInitializer, InitValue};
pub use interpolator::{Easing, Interpolator, InterpolatorKind, InterpolatorSpec};
pub use manager::ActionManager;
