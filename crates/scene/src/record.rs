//! External record format for entities and scenes.
//!
//! Field names follow the persistence collaborator's wire shape
//! (`isEnabled`, `components: [{type, data}]`), so records serialize
//! byte-compatible with what inspector and storage layers exchange.

use crate::component::ComponentRecord;
use scenery_common::EntityId;
use serde::{Deserialize, Serialize};

/// Wire shape of one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub id: EntityId,
    pub name: String,
    pub is_enabled: bool,
    pub is_awaked: bool,
    pub is_started: bool,
    pub components: Vec<ComponentRecord>,
}

/// One hierarchy edge: `child` is parented under `parent`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentLink {
    pub child: EntityId,
    pub parent: EntityId,
}

/// Wire shape of a whole scene: flat entity list plus hierarchy edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneRecord {
    pub entities: Vec<EntityRecord>,
    pub parents: Vec<ParentLink>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::TransformComponent;
    use crate::entity::Entity;

    #[test]
    fn entity_record_uses_camel_case_names() {
        let mut entity = Entity::new("box");
        entity.add_component(TransformComponent::new());
        let json = serde_json::to_value(entity.to_record()).unwrap();

        assert!(json.get("isEnabled").is_some());
        assert!(json.get("isAwaked").is_some());
        assert!(json.get("isStarted").is_some());
        let components = json.get("components").unwrap().as_array().unwrap();
        assert_eq!(components[0].get("type").unwrap(), "Transform");
        assert!(components[0].get("data").is_some());
    }

    #[test]
    fn scene_record_round_trips_through_json() {
        let mut entity = Entity::new("box");
        entity.add_component(TransformComponent::new());
        let record = SceneRecord {
            entities: vec![entity.to_record()],
            parents: vec![],
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: SceneRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entities.len(), 1);
        assert_eq!(back.entities[0].id, entity.id());
    }
}
