// extensions/manager.rs
//
// Per-frame action list keyed by ActionId. Each action is bound to the node
// it animates; the scene graph owns the nodes.
//
// Usage:
//   let mut actions = ActionManager::new();
//   actions.add(node_id, Action::new(ActionKind::fade_out(), 0.3)?);
//   actions.tick(dt, &mut scene);  // Steps every action, drops the ended ones

use std::collections::HashMap;

use crate::api::types::{ActionId, NodeId};
use crate::core::scene::SceneGraph;
use super::action::{Action, ActionStatus};
use super::behaviors::ActionKind;

/// Manages all running node actions.
#[derive(Debug, Default)]
pub struct ActionManager {
    actions: HashMap<ActionId, (NodeId, Action<ActionKind>)>,
    next_id: u32,
    /// Actions that ended since the last drain.
    completed: Vec<ActionId>,
}

impl ActionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an action to a node. Returns a handle for later control.
    pub fn add(&mut self, node: NodeId, action: Action<ActionKind>) -> ActionId {
        let id = ActionId(self.next_id);
        self.next_id += 1;
        self.actions.insert(id, (node, action));
        id
    }

    /// Remove an action without ending it.
    pub fn remove(&mut self, id: ActionId) -> Option<Action<ActionKind>> {
        self.actions.remove(&id).map(|(_, action)| action)
    }

    /// Remove all actions bound to a node.
    pub fn remove_node(&mut self, node: NodeId) {
        self.actions.retain(|_, (n, _)| *n != node);
    }

    /// Pause an action. Returns false if the action or its node is gone.
    pub fn pause(&mut self, id: ActionId, scene: &mut SceneGraph) -> bool {
        let Some((node_id, action)) = self.actions.get_mut(&id) else {
            return false;
        };
        match scene.get_mut(*node_id) {
            Some(node) => {
                action.pause(node);
                true
            }
            None => false,
        }
    }

    /// Resume a paused action.
    pub fn resume(&mut self, id: ActionId) -> bool {
        match self.actions.get_mut(&id) {
            Some((_, action)) => {
                action.resume();
                true
            }
            None => false,
        }
    }

    pub fn pause_all(&mut self, scene: &mut SceneGraph) {
        for (node_id, action) in self.actions.values_mut() {
            if let Some(node) = scene.get_mut(*node_id) {
                action.pause(node);
            }
        }
    }

    pub fn resume_all(&mut self) {
        for (_, action) in self.actions.values_mut() {
            action.resume();
        }
    }

    /// End an action now without a final update. Its `on_end` fires if the
    /// node still exists.
    pub fn stop(&mut self, id: ActionId, scene: &mut SceneGraph) -> bool {
        let Some((node_id, mut action)) = self.actions.remove(&id) else {
            return false;
        };
        if let Some(node) = scene.get_mut(node_id) {
            action.stop(node);
        }
        self.completed.push(id);
        true
    }

    pub fn get(&self, id: ActionId) -> Option<&Action<ActionKind>> {
        self.actions.get(&id).map(|(_, a)| a)
    }

    pub fn get_mut(&mut self, id: ActionId) -> Option<&mut Action<ActionKind>> {
        self.actions.get_mut(&id).map(|(_, a)| a)
    }

    /// Node an action is bound to.
    pub fn target(&self, id: ActionId) -> Option<NodeId> {
        self.actions.get(&id).map(|(n, _)| *n)
    }

    /// Lowest-id action with the given tag.
    pub fn find_by_tag(&self, tag: &str) -> Option<ActionId> {
        self.actions
            .iter()
            .filter(|(_, (_, a))| a.tag() == tag)
            .map(|(&id, _)| id)
            .min()
    }

    /// Step every action by `dt` and apply it to its node.
    /// Actions run in the order they were added. Returns the number of
    /// actions that ended this tick.
    pub fn tick(&mut self, dt: f64, scene: &mut SceneGraph) -> usize {
        let mut ids: Vec<ActionId> = self.actions.keys().copied().collect();
        ids.sort_unstable();

        let mut ended = Vec::new();
        for id in ids {
            let Some((node_id, action)) = self.actions.get_mut(&id) else {
                continue;
            };
            let Some(node) = scene.get_mut(*node_id) else {
                log::warn!("action {:?} ('{}') targets missing {}; dropped", id, action.tag(), node_id);
                self.actions.remove(&id);
                continue;
            };
            if action.step(dt, node) == ActionStatus::Ended {
                ended.push(id);
            }
        }

        let count = ended.len();
        for id in ended {
            self.actions.remove(&id);
            self.completed.push(id);
        }
        count
    }

    /// Drain the ids of actions that ended since the last call.
    pub fn drain_completed(&mut self) -> impl Iterator<Item = ActionId> + '_ {
        self.completed.drain(..)
    }

    /// Number of live actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
        self.completed.clear();
    }
}
