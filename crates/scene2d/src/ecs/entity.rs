//! Entity identifiers and their allocator

use std::collections::BTreeSet;
use std::fmt;

/// Entity identifier
///
/// Ids start at 1 and are never reused within one [`EntityManager`], so a
/// stale id can always be detected with [`EntityManager::has_entity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity {
    id: u32,
}

impl Entity {
    /// Create a new entity with the given ID
    pub(crate) fn new(id: u32) -> Self {
        Self { id }
    }

    /// Get the entity ID
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity {}", self.id)
    }
}

/// Allocates and retires entity ids
///
/// Knows nothing about components; destroying an entity's components is the
/// job of [`World::destroy_entity`](crate::ecs::World::destroy_entity).
#[derive(Debug)]
pub struct EntityManager {
    next_entity_id: u32,
    live: BTreeSet<Entity>,
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityManager {
    /// Create an empty manager whose first id is 1
    pub fn new() -> Self {
        Self {
            next_entity_id: 1,
            live: BTreeSet::new(),
        }
    }

    /// Allocate the next unused id and mark it live
    pub fn create_entity(&mut self) -> Entity {
        let entity = Entity::new(self.next_entity_id);
        self.next_entity_id += 1;
        self.live.insert(entity);
        log::debug!("EntityManager: Created {}", entity);
        entity
    }

    /// Mark an id retired; returns `false` if it was not live
    pub(crate) fn retire(&mut self, entity: Entity) -> bool {
        let removed = self.live.remove(&entity);
        if removed {
            log::debug!("EntityManager: Destroyed {}", entity);
        }
        removed
    }

    /// Check if an entity exists
    pub fn has_entity(&self, entity: Entity) -> bool {
        self.live.contains(&entity)
    }

    /// Snapshot of all live entities
    pub fn all_entities(&self) -> Vec<Entity> {
        self.live.iter().copied().collect()
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no entity is live
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
