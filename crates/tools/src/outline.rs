use scenery_common::EntityId;
use scenery_scene::Scene;

/// Debug text rendering of the hierarchy tree.
///
/// For CLI output, logging, and testing the scene surface without a GPU.
#[derive(Debug, Default)]
pub struct SceneOutline;

impl SceneOutline {
    pub fn new() -> Self {
        Self
    }

    /// Render the hierarchy as an indented tree, one entity per line.
    pub fn render(&self, scene: &Scene) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "=== Scene ({} entities) ===\n",
            scene.entity_count()
        ));
        for root in scene.roots() {
            self.render_subtree(scene, root, 0, &mut out);
        }
        out
    }

    fn render_subtree(&self, scene: &Scene, id: EntityId, depth: usize, out: &mut String) {
        let Some(entity) = scene.get_entity(id) else {
            return;
        };
        let kinds: Vec<&str> = entity.components().map(|c| c.kind().name()).collect();
        let position = entity
            .transform()
            .map(|t| *t.position.get())
            .unwrap_or_default();
        out.push_str(&format!(
            "{}[{}] {} pos=({:.2}, {:.2}, {:.2}) {{{}}}\n",
            "  ".repeat(depth),
            entity.id().short(),
            entity.name.get(),
            position.x,
            position.y,
            position.z,
            kinds.join(", "),
        ));
        for child in scene.children_of(id) {
            self.render_subtree(scene, *child, depth + 1, out);
        }
    }
}
