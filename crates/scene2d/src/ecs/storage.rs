//! Component storage
//!
//! Components live in one slot map. Two indices point into it:
//! - a per-type list, types in registration order and components in
//!   insertion order (this is the per-frame iteration order)
//! - a per-entity list of `(type, keys)` entries used for sibling lookups
//!
//! The store itself never runs lifecycle hooks; [`World`](super::World)
//! checks instances out of their slots to call them.

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use bitflags::bitflags;
use slotmap::SlotMap;

use super::component::{Component, ComponentHandle};
use super::Entity;

slotmap::new_key_type! {
    /// Key of a component slot
    pub struct ComponentKey;
}

bitflags! {
    /// Lifecycle state of a component slot
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SlotFlags: u8 {
        /// Receives `start`, `update` and `fixed_update`
        const ENABLED = 1 << 0;
        /// `start` has been called by the update loop
        const STARTED = 1 << 1;
        /// `destroy` is running; further removal requests are ignored
        const REMOVING = 1 << 2;
    }
}

struct ComponentSlot {
    entity: Entity,
    type_id: TypeId,
    sequence: u64,
    flags: SlotFlags,
    instance: Option<Box<dyn Component>>,
}

struct TypeList {
    type_id: TypeId,
    type_name: &'static str,
    keys: Vec<ComponentKey>,
}

struct EntityTypeEntry {
    type_id: TypeId,
    keys: Vec<ComponentKey>,
}

/// Typed component storage keyed by entity and component type
#[derive(Default)]
pub struct ComponentStore {
    slots: SlotMap<ComponentKey, ComponentSlot>,
    registry: HashMap<TypeId, usize>,
    types: Vec<TypeList>,
    entity_index: HashMap<Entity, Vec<EntityTypeEntry>>,
    next_sequence: u64,
}

impl ComponentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `component` under `entity` in both indices
    ///
    /// Liveness of `entity` is the caller's concern.
    pub(crate) fn insert<T: Component>(&mut self, entity: Entity, component: T) -> ComponentKey {
        let type_id = TypeId::of::<T>();
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let key = self.slots.insert(ComponentSlot {
            entity,
            type_id,
            sequence,
            flags: SlotFlags::ENABLED,
            instance: Some(Box::new(component)),
        });

        let index = match self.registry.get(&type_id) {
            Some(&index) => index,
            None => {
                self.types.push(TypeList {
                    type_id,
                    type_name: type_name::<T>(),
                    keys: Vec::new(),
                });
                let index = self.types.len() - 1;
                self.registry.insert(type_id, index);
                log::debug!("ComponentStore: Registered component type {}", type_name::<T>());
                index
            }
        };
        self.types[index].keys.push(key);

        let entries = self.entity_index.entry(entity).or_default();
        match entries.iter_mut().find(|entry| entry.type_id == type_id) {
            Some(entry) => entry.keys.push(key),
            None => entries.push(EntityTypeEntry {
                type_id,
                keys: vec![key],
            }),
        }

        key
    }

    /// Remove a slot from both indices without running any hook
    ///
    /// Per-entity type entries that become empty are deleted, as is the
    /// entity's index entry once it holds no types.
    pub(crate) fn detach(&mut self, key: ComponentKey) -> Option<Box<dyn Component>> {
        let slot = self.slots.remove(key)?;

        if let Some(&index) = self.registry.get(&slot.type_id) {
            let keys = &mut self.types[index].keys;
            if let Some(position) = keys.iter().position(|k| *k == key) {
                keys.remove(position);
            }
        }

        if let Some(entries) = self.entity_index.get_mut(&slot.entity) {
            if let Some(entry_index) = entries.iter().position(|entry| entry.type_id == slot.type_id) {
                let entry = &mut entries[entry_index];
                entry.keys.retain(|k| *k != key);
                if entry.keys.is_empty() {
                    entries.remove(entry_index);
                }
            }
            if entries.is_empty() {
                self.entity_index.remove(&slot.entity);
            }
        }

        slot.instance
    }

    /// Take the instance out of its slot so a hook can run on it
    pub(crate) fn checkout(&mut self, key: ComponentKey) -> Option<(Entity, Box<dyn Component>)> {
        let slot = self.slots.get_mut(key)?;
        let instance = slot.instance.take()?;
        Some((slot.entity, instance))
    }

    /// Return a checked-out instance; dropped if its slot no longer exists
    pub(crate) fn checkin(&mut self, key: ComponentKey, instance: Box<dyn Component>) {
        match self.slots.get_mut(key) {
            Some(slot) if slot.instance.is_none() => slot.instance = Some(instance),
            _ => log::warn!("ComponentStore: Dropping instance for vanished slot {:?}", key),
        }
    }

    /// Check out an instance for its `destroy` hook, marking the slot as removing
    ///
    /// Returns `None` when a removal is already in progress or the instance
    /// is checked out by a running hook.
    pub(crate) fn begin_removal(&mut self, key: ComponentKey) -> Option<(Entity, Box<dyn Component>)> {
        let slot = self.slots.get_mut(key)?;
        if slot.flags.contains(SlotFlags::REMOVING) || slot.instance.is_none() {
            return None;
        }
        slot.flags.insert(SlotFlags::REMOVING);
        let instance = slot.instance.take()?;
        Some((slot.entity, instance))
    }

    fn type_list<T: Component>(&self) -> Option<&TypeList> {
        match self.registry.get(&TypeId::of::<T>()) {
            Some(&index) => Some(&self.types[index]),
            None => {
                log::error!("ComponentStore: Component type {} is not registered", type_name::<T>());
                None
            }
        }
    }

    fn entity_keys<T: Component>(&self, entity: Entity) -> Option<&[ComponentKey]> {
        let type_id = self.type_list::<T>()?.type_id;
        self.entity_index
            .get(&entity)?
            .iter()
            .find(|entry| entry.type_id == type_id)
            .map(|entry| entry.keys.as_slice())
    }

    /// Whether any component of type `T` was ever added
    pub fn is_registered<T: Component>(&self) -> bool {
        self.registry.contains_key(&TypeId::of::<T>())
    }

    /// First component of type `T` on `entity`
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        let key = *self.entity_keys::<T>(entity)?.first()?;
        self.get_by_key(key)
    }

    /// Mutable access to the first component of type `T` on `entity`
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let key = *self.entity_keys::<T>(entity)?.first()?;
        self.get_by_key_mut(key)
    }

    /// Handles to every component of type `T` on `entity`, in insertion order
    pub fn handles<T: Component>(&self, entity: Entity) -> Vec<ComponentHandle<T>> {
        self.entity_keys::<T>(entity)
            .map(|keys| keys.iter().copied().map(ComponentHandle::new).collect())
            .unwrap_or_default()
    }

    /// Component stored under `key`, if it has type `T`
    pub fn get_by_key<T: Component>(&self, key: ComponentKey) -> Option<&T> {
        self.slots
            .get(key)?
            .instance
            .as_deref()?
            .as_any()
            .downcast_ref::<T>()
    }

    /// Mutable component stored under `key`, if it has type `T`
    pub fn get_by_key_mut<T: Component>(&mut self, key: ComponentKey) -> Option<&mut T> {
        self.slots
            .get_mut(key)?
            .instance
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Resolve a typed handle
    pub fn get_by_handle<T: Component>(&self, handle: ComponentHandle<T>) -> Option<&T> {
        self.get_by_key(handle.key())
    }

    /// Resolve a typed handle mutably
    pub fn get_by_handle_mut<T: Component>(&mut self, handle: ComponentHandle<T>) -> Option<&mut T> {
        self.get_by_key_mut(handle.key())
    }

    /// Entities holding at least one component of type `T`, in first-insertion order
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        let Some(list) = self.type_list::<T>() else {
            return Vec::new();
        };
        let mut entities: Vec<Entity> = Vec::with_capacity(list.keys.len());
        for key in &list.keys {
            if let Some(slot) = self.slots.get(*key) {
                if !entities.contains(&slot.entity) {
                    entities.push(slot.entity);
                }
            }
        }
        entities
    }

    /// Whether a slot exists for `key`
    pub fn contains(&self, key: ComponentKey) -> bool {
        self.slots.contains_key(key)
    }

    /// Owner of the component under `key`
    pub fn entity_of(&self, key: ComponentKey) -> Option<Entity> {
        self.slots.get(key).map(|slot| slot.entity)
    }

    /// Name of the component type stored under `key`
    pub fn type_name_of(&self, key: ComponentKey) -> Option<&'static str> {
        let slot = self.slots.get(key)?;
        let index = *self.registry.get(&slot.type_id)?;
        Some(self.types[index].type_name)
    }

    /// Lifecycle flags of the component under `key`
    pub fn flags(&self, key: ComponentKey) -> Option<SlotFlags> {
        self.slots.get(key).map(|slot| slot.flags)
    }

    /// Whether the component under `key` is enabled
    pub fn is_enabled(&self, key: ComponentKey) -> bool {
        self.flags(key).is_some_and(|flags| flags.contains(SlotFlags::ENABLED))
    }

    /// Enable or disable a component; its started flag is left untouched
    pub fn set_enabled(&mut self, key: ComponentKey, enabled: bool) {
        match self.slots.get_mut(key) {
            Some(slot) => slot.flags.set(SlotFlags::ENABLED, enabled),
            None => log::warn!("ComponentStore: Cannot change enabled state of missing component {:?}", key),
        }
    }

    /// Whether the update loop has already called `start` on the component
    pub fn is_started(&self, key: ComponentKey) -> bool {
        self.flags(key).is_some_and(|flags| flags.contains(SlotFlags::STARTED))
    }

    pub(crate) fn mark_started(&mut self, key: ComponentKey) {
        if let Some(slot) = self.slots.get_mut(key) {
            slot.flags.insert(SlotFlags::STARTED);
        }
    }

    /// All components of `entity`, oldest first
    pub(crate) fn keys_of_entity(&self, entity: Entity) -> Vec<ComponentKey> {
        let Some(entries) = self.entity_index.get(&entity) else {
            return Vec::new();
        };
        let mut keys: Vec<ComponentKey> = entries.iter().flat_map(|entry| entry.keys.iter().copied()).collect();
        keys.sort_by_key(|key| self.slots.get(*key).map_or(u64::MAX, |slot| slot.sequence));
        keys
    }

    /// Snapshot of the per-frame iteration order
    pub(crate) fn iteration_order(&self) -> Vec<ComponentKey> {
        self.types.iter().flat_map(|list| list.keys.iter().copied()).collect()
    }

    /// Number of stored components
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the store holds no components
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of stored components of type `T`
    pub fn count<T: Component>(&self) -> usize {
        self.registry
            .get(&TypeId::of::<T>())
            .map_or(0, |&index| self.types[index].keys.len())
    }

    /// Whether `entity` has an index entry for type `T`
    pub fn has_type_entry<T: Component>(&self, entity: Entity) -> bool {
        let type_id = TypeId::of::<T>();
        self.entity_index
            .get(&entity)
            .is_some_and(|entries| entries.iter().any(|entry| entry.type_id == type_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Health(u32);
    impl Component for Health {}

    struct Tag(&'static str);
    impl Component for Tag {}

    struct Unused;
    impl Component for Unused {}

    fn entity(id: u32) -> Entity {
        Entity::new(id)
    }

    #[test]
    fn test_insert_indexes_by_type_and_entity() {
        let mut store = ComponentStore::new();
        let key = store.insert(entity(1), Health(10));

        assert_eq!(store.get::<Health>(entity(1)).map(|h| h.0), Some(10));
        assert_eq!(store.entity_of(key), Some(entity(1)));
        assert_eq!(store.count::<Health>(), 1);
        assert!(store.is_enabled(key));
        assert!(!store.is_started(key));
    }

    #[test]
    fn test_multiple_components_of_one_type_keep_order() {
        let mut store = ComponentStore::new();
        store.insert(entity(1), Tag("first"));
        store.insert(entity(1), Tag("second"));

        let names: Vec<_> = store
            .handles::<Tag>(entity(1))
            .into_iter()
            .filter_map(|h| store.get_by_handle(h).map(|t| t.0))
            .collect();

        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(store.get::<Tag>(entity(1)).map(|t| t.0), Some("first"));
    }

    #[test]
    fn test_detach_deletes_empty_type_entry() {
        let mut store = ComponentStore::new();
        let health = store.insert(entity(1), Health(3));
        store.insert(entity(1), Tag("keep"));

        assert!(store.detach(health).is_some());

        assert!(!store.has_type_entry::<Health>(entity(1)));
        assert!(store.has_type_entry::<Tag>(entity(1)));
        assert!(store.get::<Health>(entity(1)).is_none());
        assert!(store.is_registered::<Health>());
        assert_eq!(store.count::<Health>(), 0);
    }

    #[test]
    fn test_unregistered_type_is_a_miss() {
        let mut store = ComponentStore::new();
        store.insert(entity(1), Health(1));

        assert!(store.get::<Unused>(entity(1)).is_none());
        assert!(store.handles::<Unused>(entity(1)).is_empty());
        assert!(store.entities_with::<Unused>().is_empty());
    }

    #[test]
    fn test_iteration_order_groups_by_registration() {
        let mut store = ComponentStore::new();
        let a = store.insert(entity(1), Health(1));
        let b = store.insert(entity(2), Tag("b"));
        let c = store.insert(entity(3), Health(2));

        assert_eq!(store.iteration_order(), vec![a, c, b]);
        assert_eq!(store.keys_of_entity(entity(1)), vec![a]);
    }

    #[test]
    fn test_checkout_hides_instance_until_checkin() {
        let mut store = ComponentStore::new();
        let key = store.insert(entity(1), Health(7));

        let (owner, instance) = store.checkout(key).unwrap();
        assert_eq!(owner, entity(1));
        assert!(store.get::<Health>(entity(1)).is_none());
        assert!(store.begin_removal(key).is_none());

        store.checkin(key, instance);
        assert_eq!(store.get::<Health>(entity(1)).map(|h| h.0), Some(7));
    }

    #[test]
    fn test_enabled_flag_does_not_touch_started() {
        let mut store = ComponentStore::new();
        let key = store.insert(entity(1), Health(1));
        store.mark_started(key);

        store.set_enabled(key, false);
        assert!(!store.is_enabled(key));
        assert!(store.is_started(key));

        store.set_enabled(key, true);
        assert!(store.is_started(key));
    }
}
