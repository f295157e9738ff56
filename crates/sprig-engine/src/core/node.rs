// core/node.rs
//
// A scene node: local transform inputs, dirty flags and the cached local and
// world matrices. The scene graph refreshes the cache during traversal.
//
// Usage:
//   let mut node = Node::new(NodeId(1)).with_pos(Vec2::new(10.0, 20.0));
//   node.set_rotation(45.0);  // marks transform and AABB dirty

use std::ops::{BitOr, BitOrAssign};

use glam::{Affine2, Mat2, Vec2};

use crate::api::types::NodeId;

/// Packed state bits of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeFlags(u32);

impl NodeFlags {
    pub const EMPTY: NodeFlags = NodeFlags(0);
    /// Local matrix must be rebuilt from position/rotation/scale/anchors.
    pub const TRANSFORM_DIRTY: NodeFlags = NodeFlags(1 << 0);
    /// World bounding box must be rebuilt from the world matrix.
    pub const AABB_DIRTY: NodeFlags = NodeFlags(1 << 1);
    pub const VISIBLE: NodeFlags = NodeFlags(1 << 2);
    /// World matrix must be rebuilt even though the local one is current
    /// (set on reparenting).
    pub const REQUEST_TRANSFORM: NodeFlags = NodeFlags(1 << 3);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        NodeFlags(bits)
    }

    /// All bits of `other` are set.
    pub const fn contains(self, other: NodeFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Any bit of `other` is set.
    pub const fn intersects(self, other: NodeFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: NodeFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: NodeFlags) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: NodeFlags, on: bool) {
        if on {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl BitOr for NodeFlags {
    type Output = NodeFlags;

    fn bitor(self, rhs: NodeFlags) -> NodeFlags {
        NodeFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for NodeFlags {
    fn bitor_assign(&mut self, rhs: NodeFlags) {
        self.0 |= rhs.0;
    }
}

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_points(points: &[Vec2]) -> Self {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for &p in points {
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// A scene-graph node: transform state, cached matrices and tree links.
///
/// Transform setters only flag the node; matrices are rebuilt lazily by the
/// owning [`SceneGraph`](crate::SceneGraph) during traversal.
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique identifier.
    pub id: NodeId,
    /// String tag for finding nodes by name.
    pub tag: String,
    position: Vec2,
    /// Degrees.
    rotation: f32,
    scale: Vec2,
    size: Vec2,
    /// Point of the content box (normalized) that sits at `position`.
    position_anchor: Vec2,
    /// Pivot (normalized) for rotation and scale.
    transform_anchor: Vec2,
    alpha: f32,
    flags: NodeFlags,
    local: Affine2,
    world: Affine2,
    /// World transform has no rotation anywhere up the ancestor chain.
    axis_aligned: bool,
    aabb: Aabb,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    /// Create a visible node at the origin with no size.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            tag: String::new(),
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            size: Vec2::ZERO,
            position_anchor: Vec2::ZERO,
            transform_anchor: Vec2::splat(0.5),
            alpha: 1.0,
            flags: NodeFlags::TRANSFORM_DIRTY | NodeFlags::AABB_DIRTY | NodeFlags::VISIBLE,
            local: Affine2::IDENTITY,
            world: Affine2::IDENTITY,
            axis_aligned: true,
            aabb: Aabb::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    // -- Builder pattern --

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.set_position(pos);
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.set_rotation(degrees);
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.set_scale(scale);
        self
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.set_size(size);
        self
    }

    pub fn with_anchors(mut self, position_anchor: Vec2, transform_anchor: Vec2) -> Self {
        self.set_anchors(position_anchor, transform_anchor);
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    // -- Accessors --

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn position_anchor(&self) -> Vec2 {
        self.position_anchor
    }

    pub fn transform_anchor(&self) -> Vec2 {
        self.transform_anchor
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }

    /// Local matrix as of the last traversal.
    pub fn local_transform(&self) -> Affine2 {
        self.local
    }

    /// World matrix as of the last traversal.
    pub fn world_transform(&self) -> Affine2 {
        self.world
    }

    /// World bounding box of the content rectangle as of the last traversal.
    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    pub fn is_axis_aligned(&self) -> bool {
        self.axis_aligned
    }

    // -- Mutators --

    fn invalidate(&mut self) {
        self.flags |= NodeFlags::TRANSFORM_DIRTY | NodeFlags::AABB_DIRTY;
    }

    pub fn set_position(&mut self, pos: Vec2) {
        self.position = pos;
        self.invalidate();
    }

    pub fn set_x(&mut self, x: f32) {
        self.position.x = x;
        self.invalidate();
    }

    pub fn set_y(&mut self, y: f32) {
        self.position.y = y;
        self.invalidate();
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = degrees;
        self.invalidate();
    }

    pub fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
        self.invalidate();
    }

    pub fn set_scale_x(&mut self, x: f32) {
        self.scale.x = x;
        self.invalidate();
    }

    pub fn set_scale_y(&mut self, y: f32) {
        self.scale.y = y;
        self.invalidate();
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
        self.invalidate();
    }

    pub fn set_anchors(&mut self, position_anchor: Vec2, transform_anchor: Vec2) {
        self.position_anchor = position_anchor;
        self.transform_anchor = transform_anchor;
        self.invalidate();
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.flags.set(NodeFlags::VISIBLE, visible);
    }

    /// Force the world matrix to be rebuilt on the next traversal.
    pub fn request_transform(&mut self) {
        self.flags.insert(NodeFlags::REQUEST_TRANSFORM);
    }

    // -- Transform cache --

    /// Rotation is a whole number of turns.
    pub fn is_locally_axis_aligned(&self) -> bool {
        self.rotation % 360.0 == 0.0
    }

    fn compute_local(&self) -> Affine2 {
        let pivot = self.transform_anchor * self.size;
        let origin = self.position - self.position_anchor * self.size;

        if self.is_locally_axis_aligned() {
            // origin + pivot + scale * (p - pivot)
            Affine2::from_mat2_translation(
                Mat2::from_diagonal(self.scale),
                origin + pivot - self.scale * pivot,
            )
        } else {
            Affine2::from_translation(origin + pivot)
                * Affine2::from_angle(self.rotation.to_radians())
                * Affine2::from_scale(self.scale)
                * Affine2::from_translation(-pivot)
        }
    }

    /// Rebuild cached matrices if this node or its parent changed.
    /// Returns whether the world matrix was recomputed.
    pub(crate) fn refresh_transform(
        &mut self,
        parent_world: &Affine2,
        parent_axis_aligned: bool,
        parent_changed: bool,
    ) -> bool {
        let own_dirty = self
            .flags
            .intersects(NodeFlags::TRANSFORM_DIRTY | NodeFlags::REQUEST_TRANSFORM);
        if !own_dirty && !parent_changed {
            return false;
        }

        if self.flags.contains(NodeFlags::TRANSFORM_DIRTY) {
            self.local = self.compute_local();
        }

        self.axis_aligned = parent_axis_aligned && self.is_locally_axis_aligned();
        self.world = if self.axis_aligned {
            // Both matrices are diagonal: skip the full multiply.
            let parent_scale = Vec2::new(parent_world.matrix2.x_axis.x, parent_world.matrix2.y_axis.y);
            let local_scale = Vec2::new(self.local.matrix2.x_axis.x, self.local.matrix2.y_axis.y);
            Affine2::from_mat2_translation(
                Mat2::from_diagonal(parent_scale * local_scale),
                parent_world.translation + parent_scale * self.local.translation,
            )
        } else {
            *parent_world * self.local
        };

        self.flags.remove(NodeFlags::TRANSFORM_DIRTY | NodeFlags::REQUEST_TRANSFORM);
        self.flags.insert(NodeFlags::AABB_DIRTY);
        true
    }

    pub(crate) fn refresh_aabb(&mut self) {
        if !self.flags.contains(NodeFlags::AABB_DIRTY) {
            return;
        }
        let w = self.size.x;
        let h = self.size.y;
        self.aabb = if self.axis_aligned {
            Aabb::from_points(&[
                self.world.transform_point2(Vec2::ZERO),
                self.world.transform_point2(Vec2::new(w, h)),
            ])
        } else {
            Aabb::from_points(&[
                self.world.transform_point2(Vec2::ZERO),
                self.world.transform_point2(Vec2::new(w, 0.0)),
                self.world.transform_point2(Vec2::new(w, h)),
                self.world.transform_point2(Vec2::new(0.0, h)),
            ])
        };
        self.flags.remove(NodeFlags::AABB_DIRTY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn flag_operations() {
        let mut flags = NodeFlags::EMPTY;
        flags.insert(NodeFlags::VISIBLE | NodeFlags::AABB_DIRTY);
        assert!(flags.contains(NodeFlags::VISIBLE));
        assert!(!flags.contains(NodeFlags::VISIBLE | NodeFlags::TRANSFORM_DIRTY));
        assert!(flags.intersects(NodeFlags::VISIBLE | NodeFlags::TRANSFORM_DIRTY));

        flags.remove(NodeFlags::VISIBLE);
        assert!(!flags.contains(NodeFlags::VISIBLE));
        flags.set(NodeFlags::VISIBLE, true);
        assert_eq!(flags.bits(), (NodeFlags::VISIBLE | NodeFlags::AABB_DIRTY).bits());
    }

    #[test]
    fn new_node_is_dirty_and_visible() {
        let node = Node::new(NodeId(1));
        assert!(node.is_visible());
        assert!(node.flags().contains(NodeFlags::TRANSFORM_DIRTY | NodeFlags::AABB_DIRTY));
    }

    #[test]
    fn setters_mark_transform_dirty() {
        let mut node = Node::new(NodeId(1));
        node.refresh_transform(&Affine2::IDENTITY, true, false);
        assert!(!node.flags().contains(NodeFlags::TRANSFORM_DIRTY));

        node.set_alpha(0.5);
        assert!(!node.flags().contains(NodeFlags::TRANSFORM_DIRTY));

        node.set_x(4.0);
        assert!(node.flags().contains(NodeFlags::TRANSFORM_DIRTY));
    }

    #[test]
    fn clean_node_skips_recompute() {
        let mut node = Node::new(NodeId(1)).with_pos(Vec2::new(3.0, 4.0));
        assert!(node.refresh_transform(&Affine2::IDENTITY, true, false));
        assert!(!node.refresh_transform(&Affine2::IDENTITY, true, false));
        assert!(node.refresh_transform(&Affine2::IDENTITY, true, true));
    }

    #[test]
    fn rotation_pivots_on_transform_anchor() {
        let mut node = Node::new(NodeId(1))
            .with_size(Vec2::new(10.0, 10.0))
            .with_rotation(90.0);
        node.refresh_transform(&Affine2::IDENTITY, true, false);

        assert!(!node.is_axis_aligned());
        let corner = node.world_transform().transform_point2(Vec2::ZERO);
        assert!(approx(corner, Vec2::new(10.0, 0.0)), "corner at {:?}", corner);
    }

    #[test]
    fn full_turn_takes_axis_aligned_path() {
        let mut node = Node::new(NodeId(1))
            .with_pos(Vec2::new(5.0, 5.0))
            .with_size(Vec2::new(10.0, 10.0))
            .with_scale(Vec2::splat(2.0))
            .with_rotation(-720.0);
        node.refresh_transform(&Affine2::IDENTITY, true, false);
        assert!(node.is_axis_aligned());

        // Scaled about the center: (0,0) moves to 5 + 5 - 2*5 = 0.
        let corner = node.world_transform().transform_point2(Vec2::ZERO);
        assert!(approx(corner, Vec2::ZERO));
        let far = node.world_transform().transform_point2(Vec2::new(10.0, 10.0));
        assert!(approx(far, Vec2::new(20.0, 20.0)));
    }

    #[test]
    fn position_anchor_offsets_origin() {
        let mut node = Node::new(NodeId(1))
            .with_pos(Vec2::new(50.0, 50.0))
            .with_size(Vec2::new(20.0, 10.0))
            .with_anchors(Vec2::splat(0.5), Vec2::splat(0.5));
        node.refresh_transform(&Affine2::IDENTITY, true, false);
        node.refresh_aabb();

        assert!(approx(node.aabb().min, Vec2::new(40.0, 45.0)));
        assert!(approx(node.aabb().max, Vec2::new(60.0, 55.0)));
        assert!(node.aabb().contains(Vec2::new(50.0, 50.0)));
    }

    #[test]
    fn rotated_aabb_covers_all_corners() {
        let mut node = Node::new(NodeId(1))
            .with_size(Vec2::new(10.0, 10.0))
            .with_rotation(45.0);
        node.refresh_transform(&Affine2::IDENTITY, true, false);
        node.refresh_aabb();

        let diagonal = 10.0 * std::f32::consts::SQRT_2;
        assert!((node.aabb().size().x - diagonal).abs() < 1e-3);
        assert!(!node.flags().contains(NodeFlags::AABB_DIRTY));
    }
}
