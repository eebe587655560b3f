use crate::entity::Entity;
use crate::record::{ParentLink, SceneRecord};
use glam::{Mat4, Vec3};
use scenery_common::EntityId;
use scenery_reactive::{MapCell, Subscription};
use std::collections::BTreeMap;
use tracing::warn;

/// Errors from scene mutations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
    #[error("entity {0} has no Transform component")]
    MissingTransform(EntityId),
    #[error("reparenting {child} under {parent} would create a cycle")]
    HierarchyCycle { child: EntityId, parent: EntityId },
}

/// Deep snapshot of the entity arena and hierarchy, taken before a play run.
///
/// Structurally independent of the live scene: every entity is a value
/// clone, so no cell or listener is shared with live state.
#[derive(Debug, Clone)]
struct SceneBackup {
    entities: BTreeMap<EntityId, Entity>,
    parents: BTreeMap<EntityId, EntityId>,
}

/// The entity arena plus the authoritative hierarchy.
///
/// All entities live in one keyed map; parent/child edges are a single
/// adjacency structure mutated only through [`Scene::reparent`], so the two
/// sides of an edge can never disagree. UI collaborators subscribe to
/// entity add/remove through the arena's map cell and to individual fields
/// through the component cells.
#[derive(Debug)]
pub struct Scene {
    entities: MapCell<EntityId, Entity>,
    parents: BTreeMap<EntityId, EntityId>,
    children: BTreeMap<EntityId, Vec<EntityId>>,
    backup: Option<SceneBackup>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            entities: MapCell::new(),
            parents: BTreeMap::new(),
            children: BTreeMap::new(),
            backup: None,
        }
    }

    // --- entity-manager surface ---

    /// Create a root entity carrying a default Transform and return its id.
    pub fn create_entity(&mut self, name: impl Into<String>) -> EntityId {
        let mut entity = Entity::new(name);
        entity.add_component(crate::components::TransformComponent::new());
        let id = entity.id();
        self.entities.insert(id, entity);
        self.update_world_transforms(id);
        id
    }

    /// Insert an externally-built entity as a root. An entity with the same
    /// id is replaced.
    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        let id = entity.id();
        self.entities.insert(id, entity);
        self.update_world_transforms(id);
        id
    }

    /// Remove an entity and its whole subtree, destroying each entity's
    /// components. Returns false if the id is unknown.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        if !self.entities.contains_key(&id) {
            return false;
        }
        // Detach from the parent's child list first.
        if let Some(parent) = self.parents.remove(&id) {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|c| *c != id);
            }
        }
        for removed in self.collect_subtree(id) {
            self.parents.remove(&removed);
            self.children.remove(&removed);
            if let Some(mut entity) = self.entities.remove(&removed) {
                entity.destroy();
            }
        }
        true
    }

    pub fn get_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn iter_entities(&self) -> impl Iterator<Item = (&EntityId, &Entity)> {
        self.entities.iter()
    }

    /// Subscribe to entity insertion. For hierarchy/inspector UIs.
    pub fn on_entity_added(
        &mut self,
        listener: impl Fn(&EntityId, &Entity) + 'static,
    ) -> Subscription {
        self.entities.on_insert(listener)
    }

    /// Subscribe to entity removal.
    pub fn on_entity_removed(
        &mut self,
        listener: impl Fn(&EntityId, &Entity) + 'static,
    ) -> Subscription {
        self.entities.on_remove(listener)
    }

    // --- hierarchy ---

    pub fn parent_of(&self, id: EntityId) -> Option<EntityId> {
        self.parents.get(&id).copied()
    }

    pub fn children_of(&self, id: EntityId) -> &[EntityId] {
        self.children.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Entities with no parent, in id order.
    pub fn roots(&self) -> Vec<EntityId> {
        self.entities
            .keys()
            .filter(|id| !self.parents.contains_key(*id))
            .copied()
            .collect()
    }

    /// Move `child` under `new_parent` (or to the root set with `None`).
    /// The single mutation point for hierarchy edges; both the parent map
    /// and the child index update together, and the child's subtree world
    /// matrices are recomputed against the new ancestor chain.
    pub fn reparent(
        &mut self,
        child: EntityId,
        new_parent: Option<EntityId>,
    ) -> Result<(), SceneError> {
        if !self.entities.contains_key(&child) {
            return Err(SceneError::EntityNotFound(child));
        }
        if let Some(parent) = new_parent {
            if !self.entities.contains_key(&parent) {
                return Err(SceneError::EntityNotFound(parent));
            }
            // Walking up from the prospective parent must not reach the child.
            let mut cursor = Some(parent);
            while let Some(current) = cursor {
                if current == child {
                    return Err(SceneError::HierarchyCycle { child, parent });
                }
                cursor = self.parents.get(&current).copied();
            }
        }

        if let Some(old_parent) = self.parents.remove(&child) {
            if let Some(siblings) = self.children.get_mut(&old_parent) {
                siblings.retain(|c| *c != child);
            }
        }
        if let Some(parent) = new_parent {
            self.parents.insert(child, parent);
            self.children.entry(parent).or_default().push(child);
        }
        self.update_world_transforms(child);
        Ok(())
    }

    // --- transform cascade ---

    /// Write an entity's local position and synchronously recompute its
    /// subtree's world matrices.
    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> Result<(), SceneError> {
        self.with_transform_field(id, |t| t.position.set(position))
    }

    /// Write an entity's local rotation (Euler degrees) and recompute.
    pub fn set_rotation(&mut self, id: EntityId, rotation: Vec3) -> Result<(), SceneError> {
        self.with_transform_field(id, |t| t.rotation.set(rotation))
    }

    /// Write an entity's local scale and recompute.
    pub fn set_scale(&mut self, id: EntityId, scale: Vec3) -> Result<(), SceneError> {
        self.with_transform_field(id, |t| t.scale.set(scale))
    }

    fn with_transform_field(
        &mut self,
        id: EntityId,
        write: impl FnOnce(&mut crate::components::TransformComponent),
    ) -> Result<(), SceneError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(SceneError::EntityNotFound(id))?;
        let transform = entity
            .transform_mut()
            .ok_or(SceneError::MissingTransform(id))?;
        write(transform);
        self.update_world_transforms(id);
        Ok(())
    }

    pub fn world_matrix(&self, id: EntityId) -> Option<Mat4> {
        self.entities
            .get(&id)
            .and_then(Entity::transform)
            .map(|t| t.world_matrix())
    }

    /// Drive an entity to a desired world matrix: the local matrix is the
    /// parent's inverse world times the target, decomposed back into the
    /// position/rotation/scale fields (which triggers the usual recompute).
    pub fn set_world_matrix(&mut self, id: EntityId, world: Mat4) -> Result<(), SceneError> {
        let parent_world = self.parent_world(id);
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(SceneError::EntityNotFound(id))?;
        let transform = entity
            .transform_mut()
            .ok_or(SceneError::MissingTransform(id))?;
        transform.set_world_matrix(world, parent_world);
        self.update_world_transforms(id);
        Ok(())
    }

    fn parent_world(&self, id: EntityId) -> Option<Mat4> {
        self.parents
            .get(&id)
            .and_then(|p| self.entities.get(p))
            .and_then(Entity::transform)
            .map(|t| t.world_matrix())
    }

    /// Recompute world matrices for an entity and all descendants,
    /// parent-before-child.
    fn update_world_transforms(&mut self, root: EntityId) {
        for id in self.collect_subtree(root) {
            let parent_world = self.parent_world(id);
            if let Some(transform) = self.entities.get_mut(&id).and_then(Entity::transform_mut) {
                transform.refresh(parent_world);
            }
        }
    }

    /// Recompute every dirty subtree. Direct component-cell writes only mark
    /// the dirty flag; the runtime calls this once per frame to absorb them.
    /// Below a recomputed transform the whole subtree recomputes, dirty or
    /// not, since its ancestor chain changed.
    pub fn flush_transforms(&mut self) {
        for root in self.roots() {
            self.flush_subtree(root, false);
        }
    }

    fn flush_subtree(&mut self, id: EntityId, ancestor_updated: bool) {
        let dirty = self
            .entities
            .get(&id)
            .and_then(Entity::transform)
            .is_some_and(|t| t.is_dirty());
        let recompute = ancestor_updated || dirty;
        if recompute {
            let parent_world = self.parent_world(id);
            if let Some(transform) = self.entities.get_mut(&id).and_then(Entity::transform_mut) {
                transform.refresh(parent_world);
            }
        }
        for child in self.children_of(id).to_vec() {
            self.flush_subtree(child, recompute);
        }
    }

    /// Pre-order subtree ids, root first.
    fn collect_subtree(&self, root: EntityId) -> Vec<EntityId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !self.entities.contains_key(&id) {
                continue;
            }
            order.push(id);
            // Reverse so the first child is processed first.
            for child in self.children_of(id).iter().rev() {
                stack.push(*child);
            }
        }
        order
    }

    // --- snapshot / restore ---

    /// Snapshot the current state. Replaces any previous backup with deep
    /// clones of every entity and the hierarchy edges. Called before a play
    /// run so edits made while running can be reverted.
    pub fn save_state(&mut self) {
        let entities = self
            .entities
            .iter()
            .map(|(id, entity)| (*id, entity.clone()))
            .collect();
        self.backup = Some(SceneBackup {
            entities,
            parents: self.parents.clone(),
        });
    }

    pub fn has_backup(&self) -> bool {
        self.backup.is_some()
    }

    /// Reconcile the live scene back to the most recent [`save_state`].
    ///
    /// Ids in both live and backup are restored in place via
    /// [`Entity::restore_from`], preserving live instance identity; ids only
    /// in the backup are re-inserted as clones; live ids absent from the
    /// backup are removed and destroyed. The hierarchy and every world
    /// matrix are rebuilt. Returns false (with a warning) when no backup
    /// exists.
    pub fn restore_state(&mut self) -> bool {
        let Some(backup) = self.backup.take() else {
            warn!("restore_state called with no saved state");
            return false;
        };

        for (id, snapshot) in &backup.entities {
            match self.entities.get_mut(id) {
                Some(live) => live.restore_from(snapshot),
                None => {
                    self.entities.insert(*id, snapshot.clone());
                }
            }
        }

        let stale: Vec<EntityId> = self
            .entities
            .keys()
            .filter(|id| !backup.entities.contains_key(*id))
            .copied()
            .collect();
        for id in stale {
            if let Some(mut entity) = self.entities.remove(&id) {
                entity.destroy();
            }
        }

        self.parents = backup.parents.clone();
        self.rebuild_children_index();
        for root in self.roots() {
            self.update_world_transforms(root);
        }

        // The backup survives the restore; stop/restore can run again until
        // the next save replaces it.
        self.backup = Some(backup);
        true
    }

    fn rebuild_children_index(&mut self) {
        self.children.clear();
        for (child, parent) in &self.parents {
            self.children.entry(*parent).or_default().push(*child);
        }
    }

    // --- records ---

    pub fn to_record(&self) -> SceneRecord {
        SceneRecord {
            entities: self.entities.values().map(Entity::to_record).collect(),
            parents: self
                .parents
                .iter()
                .map(|(child, parent)| ParentLink {
                    child: *child,
                    parent: *parent,
                })
                .collect(),
        }
    }

    /// Rebuild a scene from a record. Hierarchy links with a missing side
    /// are skipped with a warning; the remaining entities still load.
    pub fn from_record(record: &SceneRecord) -> Self {
        let mut scene = Self::new();
        for entity_record in &record.entities {
            let entity = Entity::from_record(entity_record);
            scene.entities.insert(entity.id(), entity);
        }
        for link in &record.parents {
            if let Err(err) = scene.reparent(link.child, Some(link.parent)) {
                warn!(%err, "skipping unresolvable hierarchy link");
            }
        }
        for root in scene.roots() {
            scene.update_world_transforms(root);
        }
        scene
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentKind;
    use crate::components::{MeshComponent, TransformComponent};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn translation(m: Mat4) -> Vec3 {
        m.transform_point3(Vec3::ZERO)
    }

    fn vec3_close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn create_entity_has_transform() {
        let mut scene = Scene::new();
        let id = scene.create_entity("box");
        assert!(scene.get_entity(id).unwrap().transform().is_some());
        assert_eq!(scene.roots(), vec![id]);
    }

    #[test]
    fn parent_position_cascades_to_child() {
        let mut scene = Scene::new();
        let root = scene.create_entity("root");
        let child = scene.create_entity("child");
        scene.reparent(child, Some(root)).unwrap();

        scene.set_position(child, Vec3::new(1.0, 0.0, 0.0)).unwrap();
        scene.set_position(root, Vec3::new(5.0, 0.0, 0.0)).unwrap();

        let world = scene.world_matrix(child).unwrap();
        assert!(vec3_close(translation(world), Vec3::new(6.0, 0.0, 0.0)));
    }

    #[test]
    fn three_level_chain_composes() {
        let mut scene = Scene::new();
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        let c = scene.create_entity("c");
        scene.reparent(b, Some(a)).unwrap();
        scene.reparent(c, Some(b)).unwrap();

        scene.set_position(b, Vec3::new(0.0, 2.0, 0.0)).unwrap();
        scene.set_position(c, Vec3::new(0.0, 0.0, 3.0)).unwrap();
        scene.set_position(a, Vec3::new(1.0, 0.0, 0.0)).unwrap();

        let a_world = scene.world_matrix(a).unwrap();
        let b_local = scene.get_entity(b).unwrap().transform().unwrap().local_matrix();
        let c_local = scene.get_entity(c).unwrap().transform().unwrap().local_matrix();
        let expected = a_world * b_local * c_local;
        let actual = scene.world_matrix(c).unwrap();
        assert!(vec3_close(translation(expected), translation(actual)));
        assert!(vec3_close(translation(actual), Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn reparent_cycle_rejected() {
        let mut scene = Scene::new();
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        scene.reparent(b, Some(a)).unwrap();

        let err = scene.reparent(a, Some(b)).unwrap_err();
        assert!(matches!(err, SceneError::HierarchyCycle { .. }));
        let err = scene.reparent(a, Some(a)).unwrap_err();
        assert!(matches!(err, SceneError::HierarchyCycle { .. }));
    }

    #[test]
    fn reparent_to_root_recomputes() {
        let mut scene = Scene::new();
        let root = scene.create_entity("root");
        let child = scene.create_entity("child");
        scene.reparent(child, Some(root)).unwrap();
        scene.set_position(root, Vec3::new(5.0, 0.0, 0.0)).unwrap();
        scene.set_position(child, Vec3::new(1.0, 0.0, 0.0)).unwrap();

        scene.reparent(child, None).unwrap();
        let world = scene.world_matrix(child).unwrap();
        assert!(vec3_close(translation(world), Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn remove_entity_takes_subtree() {
        let mut scene = Scene::new();
        let root = scene.create_entity("root");
        let child = scene.create_entity("child");
        let grandchild = scene.create_entity("grandchild");
        scene.reparent(child, Some(root)).unwrap();
        scene.reparent(grandchild, Some(child)).unwrap();

        assert!(scene.remove_entity(child));
        assert!(scene.contains(root));
        assert!(!scene.contains(child));
        assert!(!scene.contains(grandchild));
        assert!(scene.children_of(root).is_empty());
    }

    #[test]
    fn entity_add_remove_listeners_fire() {
        let mut scene = Scene::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let l1 = log.clone();
        scene.on_entity_added(move |_, e| l1.borrow_mut().push(format!("+{}", e.name.get())));
        let l2 = log.clone();
        scene.on_entity_removed(move |_, e| l2.borrow_mut().push(format!("-{}", e.name.get())));

        let id = scene.create_entity("box");
        scene.remove_entity(id);
        assert_eq!(*log.borrow(), vec!["+box", "-box"]);
    }

    #[test]
    fn flush_absorbs_direct_cell_writes() {
        let mut scene = Scene::new();
        let root = scene.create_entity("root");
        let child = scene.create_entity("child");
        scene.reparent(child, Some(root)).unwrap();

        // Direct component write: no cascade yet, only a dirty mark.
        scene
            .get_entity_mut(root)
            .unwrap()
            .transform_mut()
            .unwrap()
            .position
            .set(Vec3::new(4.0, 0.0, 0.0));

        scene.flush_transforms();
        let world = scene.world_matrix(child).unwrap();
        assert!(vec3_close(translation(world), Vec3::new(4.0, 0.0, 0.0)));
    }

    #[test]
    fn save_then_restore_reverts_adds_removes_and_edits() {
        let mut scene = Scene::new();
        let kept = scene.create_entity("kept");
        let doomed = scene.create_entity("doomed");
        scene.set_position(kept, Vec3::new(1.0, 1.0, 1.0)).unwrap();
        scene.save_state();

        // Mutations during the "run": add X, remove Y, edit Z.
        let added = scene.create_entity("added");
        scene.remove_entity(doomed);
        scene.set_position(kept, Vec3::new(9.0, 9.0, 9.0)).unwrap();

        assert!(scene.restore_state());
        assert!(!scene.contains(added));
        assert!(scene.contains(doomed));
        let pos = *scene
            .get_entity(kept)
            .unwrap()
            .transform()
            .unwrap()
            .position
            .get();
        assert_eq!(pos, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn restore_preserves_live_component_identity() {
        let mut scene = Scene::new();
        let id = scene.create_entity("box");
        scene.save_state();

        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        scene
            .get_entity_mut(id)
            .unwrap()
            .transform_mut()
            .unwrap()
            .position
            .subscribe(move |_| *c.borrow_mut() += 1);

        scene.set_position(id, Vec3::new(3.0, 0.0, 0.0)).unwrap();
        assert_eq!(*count.borrow(), 1);

        scene.restore_state();
        // The live transform was reconciled via copy_from: the subscription
        // is still attached and observed the restore write.
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn restore_rebuilds_hierarchy_and_matrices() {
        let mut scene = Scene::new();
        let root = scene.create_entity("root");
        let child = scene.create_entity("child");
        scene.reparent(child, Some(root)).unwrap();
        scene.set_position(root, Vec3::new(5.0, 0.0, 0.0)).unwrap();
        scene.set_position(child, Vec3::new(1.0, 0.0, 0.0)).unwrap();
        scene.save_state();

        scene.reparent(child, None).unwrap();
        scene.set_position(root, Vec3::new(50.0, 0.0, 0.0)).unwrap();

        scene.restore_state();
        assert_eq!(scene.parent_of(child), Some(root));
        let world = scene.world_matrix(child).unwrap();
        assert!(vec3_close(translation(world), Vec3::new(6.0, 0.0, 0.0)));
    }

    #[test]
    fn restore_restores_removed_mesh_data() {
        let mut scene = Scene::new();
        let id = scene.create_entity("box");
        scene
            .get_entity_mut(id)
            .unwrap()
            .add_component(MeshComponent::unit_cube());
        scene.save_state();

        scene
            .get_entity_mut(id)
            .unwrap()
            .remove_component(ComponentKind::Mesh);

        scene.restore_state();
        let mesh = scene.get_entity(id).unwrap().mesh().expect("mesh back");
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.index_count(), 36);
    }

    #[test]
    fn restore_without_save_warns_and_returns_false() {
        let mut scene = Scene::new();
        assert!(!scene.restore_state());
    }

    #[test]
    fn set_world_matrix_round_trips() {
        let mut scene = Scene::new();
        let root = scene.create_entity("root");
        let child = scene.create_entity("child");
        scene.reparent(child, Some(root)).unwrap();
        scene.set_position(root, Vec3::new(10.0, 0.0, 0.0)).unwrap();

        let target = Mat4::from_translation(Vec3::new(12.0, 0.0, 0.0));
        scene.set_world_matrix(child, target).unwrap();

        let local = *scene
            .get_entity(child)
            .unwrap()
            .transform()
            .unwrap()
            .position
            .get();
        assert!(vec3_close(local, Vec3::new(2.0, 0.0, 0.0)));
        let world = scene.world_matrix(child).unwrap();
        assert!(vec3_close(translation(world), Vec3::new(12.0, 0.0, 0.0)));
    }

    #[test]
    fn missing_transform_is_an_error() {
        let mut scene = Scene::new();
        let entity = Entity::new("bare");
        let id = entity.id();
        scene.add_entity(entity);

        let err = scene.set_position(id, Vec3::ONE).unwrap_err();
        assert!(matches!(err, SceneError::MissingTransform(_)));
    }

    #[test]
    fn scene_record_round_trip() {
        let mut scene = Scene::new();
        let root = scene.create_entity("root");
        let child = scene.create_entity("child");
        scene.reparent(child, Some(root)).unwrap();
        scene.set_position(root, Vec3::new(2.0, 0.0, 0.0)).unwrap();
        scene
            .get_entity_mut(child)
            .unwrap()
            .add_component(MeshComponent::unit_cube());

        let record = scene.to_record();
        let back = Scene::from_record(&record);
        assert_eq!(back.entity_count(), 2);
        assert_eq!(back.parent_of(child), Some(root));
        let world = back.world_matrix(child).unwrap();
        assert!(vec3_close(translation(world), Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn record_with_dangling_parent_link_is_skipped() {
        let mut scene = Scene::new();
        let root = scene.create_entity("root");
        let mut record = scene.to_record();
        record.parents.push(ParentLink {
            child: root,
            parent: EntityId::new(),
        });

        let back = Scene::from_record(&record);
        assert_eq!(back.entity_count(), 1);
        assert_eq!(back.parent_of(root), None);
    }

    #[test]
    fn save_state_backup_is_independent() {
        let mut scene = Scene::new();
        let id = scene.create_entity("box");
        scene.save_state();

        // Mutating live state must not leak into the backup.
        scene.set_position(id, Vec3::new(7.0, 7.0, 7.0)).unwrap();
        scene.restore_state();
        let pos = *scene
            .get_entity(id)
            .unwrap()
            .transform()
            .unwrap()
            .position
            .get();
        assert_eq!(pos, Vec3::ZERO);
    }

    #[test]
    fn transform_component_standalone_add() {
        let mut scene = Scene::new();
        let entity = Entity::new("late-transform");
        let id = entity.id();
        scene.add_entity(entity);
        scene
            .get_entity_mut(id)
            .unwrap()
            .add_component(TransformComponent::new());
        scene.flush_transforms();
        assert!(scene.world_matrix(id).is_some());
    }
}
