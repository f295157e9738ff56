pub mod api;
pub mod core;
pub mod extensions;

// Re-export key types at crate root for convenience
pub use api::error::{EngineError, EngineResult};
pub use api::types::{ActionId, NodeId};
pub use core::node::{Aabb, Node, NodeFlags};
pub use core::scene::SceneGraph;
pub use core::time::{RepeatPolicy, TimeUnitConfig};

pub use extensions::{
    Action, ActionStatus, Animatable, ApplyResult,
    ActionKind, NodeProperty, Sequence,
    ActionInitializer, InitValue,
    Easing, Interpolator, InterpolatorKind, InterpolatorSpec,
    ActionManager,
};
