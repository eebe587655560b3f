use scenery_common::EntityId;
use scenery_scene::{schema_for, FieldDescriptor, Scene};

/// Read-only queries against scene state for debugging and development UI.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene.
    pub fn summary(scene: &Scene) -> SceneSummary {
        SceneSummary {
            entity_count: scene.entity_count(),
            root_count: scene.roots().len(),
            has_backup: scene.has_backup(),
        }
    }

    /// Describe one entity: flags, components, and each component's schema
    /// fields. Returns `None` for unknown ids.
    pub fn inspect_entity(scene: &Scene, id: EntityId) -> Option<EntityInfo> {
        let entity = scene.get_entity(id)?;
        let components = entity
            .components()
            .map(|component| ComponentInfo {
                kind: component.kind().name(),
                enabled: component.is_enabled(),
                fields: component.schema(),
            })
            .collect();
        Some(EntityInfo {
            id,
            name: entity.name.cloned(),
            is_enabled: entity.is_enabled,
            parent: scene.parent_of(id),
            child_count: scene.children_of(id).len(),
            components,
        })
    }

    /// All entity ids, in arena order.
    pub fn list_entities(scene: &Scene) -> Vec<EntityId> {
        scene.entity_ids()
    }
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone)]
pub struct SceneSummary {
    pub entity_count: usize,
    pub root_count: usize,
    pub has_backup: bool,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: entities={} roots={} backup={}",
            self.entity_count, self.root_count, self.has_backup
        )
    }
}

/// One component as the inspector shows it.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    pub kind: &'static str,
    pub enabled: bool,
    pub fields: &'static [FieldDescriptor],
}

/// Detailed info about a single entity.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    pub id: EntityId,
    pub name: String,
    pub is_enabled: bool,
    pub parent: Option<EntityId>,
    pub child_count: usize,
    pub components: Vec<ComponentInfo>,
}

impl std::fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Entity [{}] '{}' components=[{}]",
            self.id.short(),
            self.name,
            self.components
                .iter()
                .map(|c| c.kind)
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// Check a kind's schema is available by tag alone (UI dropdowns).
pub fn field_names(kind: scenery_scene::ComponentKind) -> Vec<&'static str> {
    schema_for(kind).iter().map(|field| field.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenery_scene::{ComponentKind, MeshComponent};

    #[test]
    fn summary_counts() {
        let mut scene = Scene::new();
        let root = scene.create_entity("root");
        let child = scene.create_entity("child");
        scene.reparent(child, Some(root)).unwrap();

        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.entity_count, 2);
        assert_eq!(summary.root_count, 1);
        assert!(!summary.has_backup);
    }

    #[test]
    fn inspect_entity_lists_schema_fields() {
        let mut scene = Scene::new();
        let id = scene.create_entity("box");
        scene
            .get_entity_mut(id)
            .unwrap()
            .add_component(MeshComponent::unit_cube());

        let info = SceneInspector::inspect_entity(&scene, id).unwrap();
        assert_eq!(info.components.len(), 2);
        let mesh = info.components.iter().find(|c| c.kind == "Mesh").unwrap();
        assert!(mesh.fields.iter().any(|f| f.name == "name"));
    }

    #[test]
    fn inspect_unknown_entity_is_none() {
        let scene = Scene::new();
        assert!(SceneInspector::inspect_entity(&scene, EntityId::new()).is_none());
    }

    #[test]
    fn field_names_by_tag() {
        let names = field_names(ComponentKind::Light);
        assert!(names.contains(&"intensity"));
    }

    #[test]
    fn summary_display() {
        let scene = Scene::new();
        let text = format!("{}", SceneInspector::summary(&scene));
        assert!(text.contains("entities=0"));
    }
}
