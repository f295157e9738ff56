// core/scene.rs
//
// Node storage plus parent/child hierarchy.
// The graph owns every node; a parent owns the lifetime of its children
// (removing a node removes its subtree), children keep only the parent's id.
//
// Usage:
//   let mut scene = SceneGraph::new();
//   let root = scene.spawn(Node::new(NodeId(1)));
//   let child = scene.add_child(root, Node::new(NodeId(2)))?;
//   scene.visit(|node| draw(node));  // refreshes dirty transforms top-down

use std::collections::HashMap;

use glam::Affine2;

use crate::api::error::{EngineError, EngineResult};
use crate::api::types::NodeId;
use crate::core::node::{Node, NodeFlags};

/// Scene graph: flat node storage keyed by id, traversed from the roots.
#[derive(Debug)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    /// Nodes with no parent, in insertion order.
    roots: Vec<NodeId>,
    next_id: u32,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::with_capacity(256),
            roots: Vec::new(),
            next_id: 1,
        }
    }

    /// Generate the next unused node id.
    pub fn next_id(&mut self) -> NodeId {
        loop {
            let id = NodeId(self.next_id);
            self.next_id += 1;
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    /// Add a node as a root. A node already stored under the same id is
    /// removed first, together with its subtree.
    pub fn spawn(&mut self, mut node: Node) -> NodeId {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            log::warn!("{} spawned twice; replacing previous subtree", id);
            self.remove(id);
        }
        node.parent = None;
        node.children.clear();
        node.request_transform();
        self.nodes.insert(id, node);
        self.roots.push(id);
        id
    }

    /// Add a node under `parent`. Unlike `spawn`, an id already in the graph
    /// is rejected and the graph is left untouched.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> EngineResult<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return Err(EngineError::UnknownNode(parent));
        }
        if self.nodes.contains_key(&node.id) {
            return Err(EngineError::DuplicateNode(node.id));
        }
        let id = self.spawn(node);
        self.set_parent(id, Some(parent))?;
        Ok(id)
    }

    /// Move `child` under `parent`, or make it a root with `None`.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> EngineResult<()> {
        if !self.nodes.contains_key(&child) {
            return Err(EngineError::UnknownNode(child));
        }
        if let Some(p) = parent {
            if !self.nodes.contains_key(&p) {
                return Err(EngineError::UnknownNode(p));
            }
            if p == child || self.is_ancestor(child, p) {
                return Err(EngineError::HierarchyCycle { child, parent: p });
            }
        }

        // Detach from old parent or from roots
        let old_parent = self.nodes.get(&child).and_then(|n| n.parent);
        match old_parent {
            Some(old) => {
                if let Some(old_node) = self.nodes.get_mut(&old) {
                    old_node.children.retain(|&c| c != child);
                }
            }
            None => self.roots.retain(|&r| r != child),
        }

        match parent {
            Some(p) => {
                if let Some(parent_node) = self.nodes.get_mut(&p) {
                    parent_node.children.push(child);
                }
            }
            None => self.roots.push(child),
        }

        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = parent;
            node.request_transform();
        }
        Ok(())
    }

    /// Whether `ancestor` appears on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.nodes.get(&id).and_then(|n| n.parent);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.nodes.get(&p).and_then(|n| n.parent);
        }
        false
    }

    /// Remove a node and its whole subtree. Returns the removed node.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id)?;
        match node.parent {
            Some(parent) => {
                if let Some(parent_node) = self.nodes.get_mut(&parent) {
                    parent_node.children.retain(|&c| c != id);
                }
            }
            None => self.roots.retain(|&r| r != id),
        }

        let mut pending = node.children.clone();
        while let Some(child) = pending.pop() {
            if let Some(child_node) = self.nodes.remove(&child) {
                pending.extend(child_node.children);
            }
        }
        Some(node)
    }

    /// Get a reference to a node by id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a mutable reference to a node by id.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> Option<&[NodeId]> {
        self.nodes.get(&id).map(|n| n.children.as_slice())
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Find the first node with the given tag.
    pub fn find_by_tag(&self, tag: &str) -> Option<&Node> {
        self.nodes.values().find(|n| n.tag == tag)
    }

    /// Iterate over all nodes in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Clear all nodes.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }

    /// Refresh dirty transforms and bounding boxes of visible nodes without
    /// visiting them.
    pub fn update_transforms(&mut self) {
        self.visit(|_| {});
    }

    /// Depth-first traversal in draw order: parents before children,
    /// siblings in insertion order. Invisible nodes are skipped along with
    /// their subtree. World matrices are recomputed only where the node or an
    /// ancestor changed. Returns the number of nodes visited.
    pub fn visit<F: FnMut(&Node)>(&mut self, mut visitor: F) -> usize {
        let roots = self.roots.clone();
        let mut visited = 0;
        for root in roots {
            visited += self.visit_recursive(root, &Affine2::IDENTITY, true, false, &mut visitor);
        }
        visited
    }

    fn visit_recursive<F: FnMut(&Node)>(
        &mut self,
        id: NodeId,
        parent_world: &Affine2,
        parent_axis_aligned: bool,
        parent_changed: bool,
        visitor: &mut F,
    ) -> usize {
        let Some(node) = self.nodes.get_mut(&id) else { return 0 };

        if !node.is_visible() {
            // Remember that the ancestor moved so the subtree catches up once shown.
            if parent_changed {
                node.request_transform();
            }
            return 0;
        }

        let changed = node.refresh_transform(parent_world, parent_axis_aligned, parent_changed);
        node.refresh_aabb();
        visitor(node);

        let world = node.world_transform();
        let axis_aligned = node.is_axis_aligned();
        let children = node.children.clone();

        let mut visited = 1;
        for child in children {
            visited += self.visit_recursive(child, &world, axis_aligned, changed, visitor);
        }
        visited
    }

    /// Whether any node still waits for a transform refresh.
    pub fn has_pending_transforms(&self) -> bool {
        self.nodes
            .values()
            .any(|n| n.flags().intersects(NodeFlags::TRANSFORM_DIRTY | NodeFlags::REQUEST_TRANSFORM))
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    fn world_origin(scene: &SceneGraph, id: NodeId) -> Vec2 {
        scene.get(id).unwrap().world_transform().transform_point2(Vec2::ZERO)
    }

    #[test]
    fn spawn_and_get() {
        let mut scene = SceneGraph::new();
        let id = scene.next_id();
        scene.spawn(Node::new(id).with_pos(Vec2::new(10.0, 20.0)));
        assert_eq!(scene.get(id).unwrap().position(), Vec2::new(10.0, 20.0));
        assert_eq!(scene.roots(), &[id]);
    }

    #[test]
    fn parent_child_relationship() {
        let mut scene = SceneGraph::new();
        let parent = scene.spawn(Node::new(NodeId(1)));
        let child = scene.add_child(parent, Node::new(NodeId(2))).unwrap();

        assert_eq!(scene.parent(child), Some(parent));
        assert_eq!(scene.children(parent), Some([child].as_slice()));
        assert_eq!(scene.roots(), &[parent]);
    }

    #[test]
    fn add_child_to_missing_parent_fails() {
        let mut scene = SceneGraph::new();
        let err = scene.add_child(NodeId(9), Node::new(NodeId(1))).unwrap_err();
        assert!(matches!(err, EngineError::UnknownNode(NodeId(9))));
        assert!(scene.is_empty());
    }

    #[test]
    fn add_child_with_taken_id_keeps_hierarchy() {
        let mut scene = SceneGraph::new();
        let root = scene.spawn(Node::new(NodeId(1)));
        let child = scene.add_child(root, Node::new(NodeId(2))).unwrap();

        let err = scene.add_child(child, Node::new(NodeId(1))).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateNode(NodeId(1))));
        let err = scene.add_child(root, Node::new(NodeId(2))).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateNode(NodeId(2))));

        assert_eq!(scene.len(), 2);
        assert_eq!(scene.parent(child), Some(root));
        assert_eq!(scene.children(root), Some(&[child][..]));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut scene = SceneGraph::new();
        let a = scene.spawn(Node::new(NodeId(1)));
        let b = scene.add_child(a, Node::new(NodeId(2))).unwrap();
        let c = scene.add_child(b, Node::new(NodeId(3))).unwrap();

        assert!(matches!(scene.set_parent(a, Some(c)), Err(EngineError::HierarchyCycle { .. })));
        assert!(matches!(scene.set_parent(a, Some(a)), Err(EngineError::HierarchyCycle { .. })));
        assert_eq!(scene.parent(a), None);
    }

    #[test]
    fn remove_takes_subtree() {
        let mut scene = SceneGraph::new();
        let parent = scene.spawn(Node::new(NodeId(1)));
        let child = scene.add_child(parent, Node::new(NodeId(2))).unwrap();
        scene.add_child(child, Node::new(NodeId(3))).unwrap();
        let other = scene.spawn(Node::new(NodeId(4)));

        let removed = scene.remove(parent).unwrap();
        assert_eq!(removed.id, parent);
        assert_eq!(scene.len(), 1);
        assert!(scene.get(other).is_some());
        assert_eq!(scene.roots(), &[other]);
    }

    #[test]
    fn reparent_to_root() {
        let mut scene = SceneGraph::new();
        let parent = scene.spawn(Node::new(NodeId(1)));
        let child = scene.add_child(parent, Node::new(NodeId(2))).unwrap();

        scene.set_parent(child, None).unwrap();
        assert_eq!(scene.parent(child), None);
        assert_eq!(scene.children(parent), Some([].as_slice()));
        assert_eq!(scene.roots(), &[parent, child]);
    }

    #[test]
    fn visit_order_is_depth_first() {
        let mut scene = SceneGraph::new();
        let a = scene.spawn(Node::new(NodeId(1)));
        let b = scene.add_child(a, Node::new(NodeId(2))).unwrap();
        scene.add_child(b, Node::new(NodeId(3))).unwrap();
        scene.add_child(a, Node::new(NodeId(4))).unwrap();
        scene.spawn(Node::new(NodeId(5)));

        let mut order = Vec::new();
        let count = scene.visit(|n| order.push(n.id.0));
        assert_eq!(order, vec![1, 2, 3, 4, 5]);
        assert_eq!(count, 5);
    }

    #[test]
    fn invisible_subtree_is_skipped() {
        let mut scene = SceneGraph::new();
        let a = scene.spawn(Node::new(NodeId(1)));
        let b = scene.add_child(a, Node::new(NodeId(2))).unwrap();
        scene.add_child(b, Node::new(NodeId(3))).unwrap();
        scene.get_mut(b).unwrap().set_visible(false);

        let mut order = Vec::new();
        scene.visit(|n| order.push(n.id.0));
        assert_eq!(order, vec![1]);
    }

    #[test]
    fn child_world_follows_parent() {
        let mut scene = SceneGraph::new();
        let parent = scene.spawn(Node::new(NodeId(1)).with_pos(Vec2::new(100.0, 100.0)));
        let child = scene
            .add_child(parent, Node::new(NodeId(2)).with_pos(Vec2::new(50.0, 0.0)))
            .unwrap();

        scene.update_transforms();
        assert!(approx(world_origin(&scene, child), Vec2::new(150.0, 100.0)));

        // Only the parent changes; the child must still pick it up.
        scene.get_mut(parent).unwrap().set_x(0.0);
        scene.update_transforms();
        assert!(approx(world_origin(&scene, child), Vec2::new(50.0, 100.0)));
        assert!(!scene.has_pending_transforms());
    }

    #[test]
    fn rotated_ancestor_disables_fast_path() {
        let mut scene = SceneGraph::new();
        let parent = scene.spawn(
            Node::new(NodeId(1))
                .with_anchors(Vec2::ZERO, Vec2::ZERO)
                .with_rotation(90.0),
        );
        let child = scene
            .add_child(parent, Node::new(NodeId(2)).with_pos(Vec2::new(10.0, 0.0)))
            .unwrap();

        scene.update_transforms();
        let node = scene.get(child).unwrap();
        assert!(!node.is_axis_aligned());
        assert!(approx(world_origin(&scene, child), Vec2::new(0.0, 10.0)));
    }

    #[test]
    fn scaled_parents_compose_on_fast_path() {
        let mut scene = SceneGraph::new();
        let parent = scene.spawn(
            Node::new(NodeId(1))
                .with_anchors(Vec2::ZERO, Vec2::ZERO)
                .with_pos(Vec2::new(10.0, 0.0))
                .with_scale(Vec2::splat(2.0)),
        );
        let child = scene
            .add_child(
                parent,
                Node::new(NodeId(2))
                    .with_anchors(Vec2::ZERO, Vec2::ZERO)
                    .with_pos(Vec2::new(5.0, 5.0))
                    .with_size(Vec2::new(1.0, 1.0)),
            )
            .unwrap();

        scene.update_transforms();
        let node = scene.get(child).unwrap();
        assert!(node.is_axis_aligned());
        assert!(approx(node.aabb().min, Vec2::new(20.0, 10.0)));
        assert!(approx(node.aabb().max, Vec2::new(22.0, 12.0)));
    }

    #[test]
    fn hidden_child_catches_up_when_shown() {
        let mut scene = SceneGraph::new();
        let parent = scene.spawn(Node::new(NodeId(1)));
        let child = scene.add_child(parent, Node::new(NodeId(2))).unwrap();
        scene.update_transforms();

        scene.get_mut(child).unwrap().set_visible(false);
        scene.get_mut(parent).unwrap().set_position(Vec2::new(7.0, 0.0));
        scene.update_transforms();

        scene.get_mut(child).unwrap().set_visible(true);
        scene.update_transforms();
        assert!(approx(world_origin(&scene, child), Vec2::new(7.0, 0.0)));
    }

    #[test]
    fn find_by_tag() {
        let mut scene = SceneGraph::new();
        scene.spawn(Node::new(NodeId(1)).with_tag("hero"));
        scene.spawn(Node::new(NodeId(2)).with_tag("enemy"));
        assert_eq!(scene.find_by_tag("hero").unwrap().id, NodeId(1));
    }
}
