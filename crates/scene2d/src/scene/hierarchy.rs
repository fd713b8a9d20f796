//! Transform hierarchy
//!
//! Transform nodes live in an arena and refer to each other by key. A node
//! keeps its parent key and a reverse index of its children; dropping a
//! parent detaches the children without touching their local data.
//!
//! World matrices are computed lazily. Mutating a node marks only that node
//! dirty. Reading a world matrix walks up to the root, then recomputes from
//! the topmost dirty ancestor down to the queried node. Each recompute marks
//! the node's direct children dirty, so deeper descendants pick up the change
//! when they are next read.
//!
//! The parent graph must be acyclic. `set_parent` does not check this.

use slotmap::SlotMap;

use crate::ecs::Entity;
use crate::foundation::math::{utils, Mat4, Transform, Vec3};

slotmap::new_key_type! {
    /// Key of a node in the [`TransformArena`]
    pub struct TransformKey;
}

/// One node of the hierarchy
#[derive(Debug, Clone)]
pub struct TransformNode {
    entity: Entity,
    local: Transform,
    world: Mat4,
    dirty: bool,
    revision: u64,
    parent: Option<TransformKey>,
    children: Vec<TransformKey>,
}

impl TransformNode {
    /// Entity owning this node
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Local position, rotation and scale
    pub fn local(&self) -> &Transform {
        &self.local
    }

    /// Cached world matrix; may be stale, see [`TransformArena::world_matrix`]
    pub fn cached_world_matrix(&self) -> &Mat4 {
        &self.world
    }

    /// Whether this node's own matrix is marked out of date
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Parent node, if any
    pub fn parent(&self) -> Option<TransformKey> {
        self.parent
    }

    /// Direct children in attachment order
    pub fn children(&self) -> &[TransformKey] {
        &self.children
    }
}

/// Arena owning every transform node of a world
#[derive(Debug, Default)]
pub struct TransformArena {
    nodes: SlotMap<TransformKey, TransformNode>,
}

impl TransformArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root node; it starts dirty
    pub fn insert(&mut self, entity: Entity, local: Transform) -> TransformKey {
        self.nodes.insert(TransformNode {
            entity,
            local,
            world: Mat4::identity(),
            dirty: true,
            revision: 0,
            parent: None,
            children: Vec::new(),
        })
    }

    /// Remove a node, detaching it from its parent and orphaning its children
    pub fn remove(&mut self, key: TransformKey) -> Option<TransformNode> {
        let node = self.nodes.remove(key)?;

        if let Some(parent) = node.parent {
            if let Some(parent) = self.nodes.get_mut(parent) {
                parent.children.retain(|child| *child != key);
            }
        }
        for child in &node.children {
            if let Some(child) = self.nodes.get_mut(*child) {
                child.parent = None;
                child.dirty = true;
            }
        }

        Some(node)
    }

    /// Whether `key` refers to a live node
    pub fn contains(&self, key: TransformKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Node stored under `key`
    pub fn get(&self, key: TransformKey) -> Option<&TransformNode> {
        self.nodes.get(key)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Local transform of a node
    pub fn local(&self, key: TransformKey) -> Option<&Transform> {
        self.nodes.get(key).map(|node| &node.local)
    }

    /// Apply `change` to the local transform and mark the node dirty
    ///
    /// Returns `false` if the node does not exist.
    pub fn modify(&mut self, key: TransformKey, change: impl FnOnce(&mut Transform)) -> bool {
        match self.nodes.get_mut(key) {
            Some(node) => {
                change(&mut node.local);
                node.dirty = true;
                true
            }
            None => {
                log::warn!("TransformArena: Ignoring change to missing transform {:?}", key);
                false
            }
        }
    }

    /// Set the local position
    pub fn set_position(&mut self, key: TransformKey, position: Vec3) -> bool {
        self.modify(key, |local| local.position = position)
    }

    /// Set the local rotation, per axis in degrees
    pub fn set_rotation(&mut self, key: TransformKey, degrees: Vec3) -> bool {
        self.modify(key, |local| local.rotation = degrees)
    }

    /// Set only the Z rotation, in degrees
    pub fn set_z_rotation(&mut self, key: TransformKey, degrees: f32) -> bool {
        self.modify(key, |local| local.rotation.z = degrees)
    }

    /// Set the local scale
    pub fn set_scale(&mut self, key: TransformKey, scale: Vec3) -> bool {
        self.modify(key, |local| local.scale = scale)
    }

    /// Set the same scale on every axis
    pub fn set_uniform_scale(&mut self, key: TransformKey, scale: f32) -> bool {
        self.set_scale(key, Vec3::new(scale, scale, scale))
    }

    /// Move relative to the current local position
    pub fn translate(&mut self, key: TransformKey, delta: Vec3) -> bool {
        self.modify(key, |local| local.position += delta)
    }

    /// Rotate relative to the current local rotation, in degrees
    pub fn rotate(&mut self, key: TransformKey, degrees: Vec3) -> bool {
        self.modify(key, |local| local.rotation += degrees)
    }

    /// Multiply the local scale component-wise
    pub fn scale_by(&mut self, key: TransformKey, factors: Vec3) -> bool {
        self.modify(key, |local| local.scale.component_mul_assign(&factors))
    }

    /// Re-parent a node, or make it a root with `None`
    ///
    /// Keeps the local transform, so the world placement changes with the
    /// new parent. The caller must not create a cycle.
    pub fn set_parent(&mut self, key: TransformKey, parent: Option<TransformKey>) -> bool {
        if !self.nodes.contains_key(key) {
            log::warn!("TransformArena: Cannot re-parent missing transform {:?}", key);
            return false;
        }
        if let Some(parent) = parent {
            if !self.nodes.contains_key(parent) {
                log::warn!("TransformArena: Parent transform {:?} does not exist", parent);
                return false;
            }
        }

        let previous = self.nodes[key].parent;
        if let Some(old_parent) = previous {
            if let Some(old_parent) = self.nodes.get_mut(old_parent) {
                old_parent.children.retain(|child| *child != key);
            }
        }
        if let Some(new_parent) = parent {
            self.nodes[new_parent].children.push(key);
        }

        let node = &mut self.nodes[key];
        node.parent = parent;
        node.dirty = true;
        true
    }

    /// Parent of a node
    pub fn parent(&self, key: TransformKey) -> Option<TransformKey> {
        self.nodes.get(key)?.parent
    }

    /// Direct children of a node
    pub fn children(&self, key: TransformKey) -> &[TransformKey] {
        match self.nodes.get(key) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    /// Whether reading the node's world matrix would trigger a recompute
    pub fn needs_refresh(&self, key: TransformKey) -> bool {
        let mut cursor = Some(key);
        let mut steps = 0;
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(current) else {
                return false;
            };
            if node.dirty {
                return true;
            }
            cursor = node.parent;
            steps += 1;
            debug_assert!(steps <= self.nodes.len(), "transform hierarchy contains a cycle");
        }
        false
    }

    /// Counter bumped every time the node's world matrix is recomputed
    pub fn revision(&self, key: TransformKey) -> Option<u64> {
        self.nodes.get(key).map(|node| node.revision)
    }

    /// Bring the node's world matrix up to date
    ///
    /// Returns `false` if the node does not exist.
    pub fn update_world_matrix(&mut self, key: TransformKey) -> bool {
        let mut chain = Vec::new();
        let mut cursor = Some(key);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(current) else {
                break;
            };
            chain.push(current);
            cursor = node.parent;
            debug_assert!(chain.len() <= self.nodes.len(), "transform hierarchy contains a cycle");
        }
        if chain.is_empty() {
            return false;
        }

        // chain runs from `key` up to the root
        let Some(topmost_dirty) = chain.iter().rposition(|k| self.nodes[*k].dirty) else {
            return true;
        };
        for index in (0..=topmost_dirty).rev() {
            self.recompute(chain[index]);
        }
        true
    }

    fn recompute(&mut self, key: TransformKey) {
        let parent_world = self.nodes[key]
            .parent
            .and_then(|parent| self.nodes.get(parent))
            .map(|parent| parent.world);

        let node = &mut self.nodes[key];
        let local = node.local.to_matrix();
        node.world = match parent_world {
            Some(parent_world) => parent_world * local,
            None => local,
        };
        node.dirty = false;
        node.revision += 1;

        let children = std::mem::take(&mut node.children);
        for child in &children {
            if let Some(child) = self.nodes.get_mut(*child) {
                child.dirty = true;
            }
        }
        self.nodes[key].children = children;
    }

    /// Up-to-date world matrix of a node
    pub fn world_matrix(&mut self, key: TransformKey) -> Option<Mat4> {
        if !self.update_world_matrix(key) {
            return None;
        }
        Some(self.nodes[key].world)
    }

    /// World-space position (translation column of the world matrix)
    pub fn world_position(&mut self, key: TransformKey) -> Option<Vec3> {
        self.world_matrix(key).map(|world| utils::translation_of(&world))
    }

    /// Map a point from the node's local space to world space
    pub fn local_to_world_position(&mut self, key: TransformKey, point: Vec3) -> Option<Vec3> {
        let world = self.world_matrix(key)?;
        let transformed = world * point.push(1.0);
        Some(transformed.xyz())
    }
}
