use crate::component::Component;
use crate::entity::Entity;
use crate::scene::Scene;
use glam::Vec3;
use scenery_common::EntityId;
use tracing::debug;

/// Play-mode state of the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Running,
    Paused,
}

/// Cooperative, tick-driven frame loop.
///
/// One `tick` drives the phase order awake → start → fixed-update → update →
/// late-update, synchronously. `play` snapshots the scene before the first
/// running tick; `stop` restores it, so edits made while running are
/// discarded and edits made while stopped persist. `pause` freezes ticking
/// without restoring.
#[derive(Debug)]
pub struct Runtime {
    state: PlayState,
    fixed_timestep: f32,
    accumulator: f32,
    fixed_steps_run: u64,
}

enum BehaviorWrite {
    Rotation(EntityId, Vec3),
    OrbitAngle(EntityId, f32),
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            state: PlayState::Stopped,
            fixed_timestep: 1.0 / 60.0,
            accumulator: 0.0,
            fixed_steps_run: 0,
        }
    }

    pub fn with_fixed_timestep(fixed_timestep: f32) -> Self {
        Self {
            fixed_timestep,
            ..Self::new()
        }
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PlayState::Running
    }

    /// Fixed-update steps executed since construction.
    pub fn fixed_steps_run(&self) -> u64 {
        self.fixed_steps_run
    }

    /// Enter play mode. From Stopped this snapshots the scene first; from
    /// Paused it resumes without re-snapshotting (the pre-play snapshot
    /// stays the restore target).
    pub fn play(&mut self, scene: &mut Scene) {
        match self.state {
            PlayState::Stopped => {
                scene.save_state();
                self.state = PlayState::Running;
                debug!("play: scene state saved, entering run mode");
            }
            PlayState::Paused => self.state = PlayState::Running,
            PlayState::Running => {}
        }
    }

    /// Freeze ticking. No restore happens.
    pub fn pause(&mut self) {
        if self.state == PlayState::Running {
            self.state = PlayState::Paused;
        }
    }

    /// Leave play mode and revert the scene to the pre-play snapshot.
    pub fn stop(&mut self, scene: &mut Scene) {
        if self.state == PlayState::Stopped {
            return;
        }
        scene.restore_state();
        self.state = PlayState::Stopped;
        self.accumulator = 0.0;
        debug!("stop: scene state restored");
    }

    /// Advance one frame. A no-op unless Running.
    pub fn tick(&mut self, scene: &mut Scene, dt: f32) {
        if self.state != PlayState::Running {
            return;
        }

        let ids = scene.entity_ids();

        // Awake: enabled entities that have never been awoken.
        for id in &ids {
            if let Some(entity) = scene.get_entity_mut(*id) {
                if entity.is_enabled && !entity.is_awaked {
                    entity.is_awaked = true;
                }
            }
        }

        // Start: awoken entities that have never started.
        for id in &ids {
            if let Some(entity) = scene.get_entity_mut(*id) {
                if entity.is_enabled && entity.is_awaked && !entity.is_started {
                    entity.is_started = true;
                }
            }
        }

        // Fixed update: drain the accumulator in fixed_timestep slices.
        // Hook point for physics; no built-in fixed systems yet.
        self.accumulator += dt;
        while self.accumulator >= self.fixed_timestep {
            self.accumulator -= self.fixed_timestep;
            self.fixed_steps_run += 1;
        }

        // Update: behavior components mutate transforms through the scene so
        // the world-matrix cascade runs parent-before-child.
        let writes = Self::gather_behavior_writes(scene, &ids, dt);
        for write in writes {
            match write {
                BehaviorWrite::Rotation(id, rotation) => {
                    let _ = scene.set_rotation(id, rotation);
                }
                BehaviorWrite::OrbitAngle(id, angle) => {
                    if let Some(orbit) = scene.get_entity_mut(id).and_then(Entity::orbit_mut) {
                        orbit.angle_deg.set(angle);
                    }
                    let position = scene
                        .get_entity(id)
                        .and_then(Entity::orbit)
                        .map(|o| o.position_at_angle());
                    if let Some(position) = position {
                        let _ = scene.set_position(id, position);
                    }
                }
            }
        }

        // Late update: absorb any direct component-cell writes made by
        // systems or UI since the last frame.
        scene.flush_transforms();
    }

    fn gather_behavior_writes(scene: &Scene, ids: &[EntityId], dt: f32) -> Vec<BehaviorWrite> {
        let mut writes = Vec::new();
        for id in ids {
            let Some(entity) = scene.get_entity(*id) else {
                continue;
            };
            if !entity.is_enabled || entity.transform().is_none() {
                continue;
            }
            if let (Some(rotate), Some(transform)) = (entity.rotate(), entity.transform()) {
                if *rotate.enabled().get() {
                    let rotation =
                        transform.rotation.copied() + rotate.speed_deg_per_sec.copied() * dt;
                    writes.push(BehaviorWrite::Rotation(*id, rotation));
                }
            }
            if let Some(orbit) = entity.orbit() {
                if *orbit.enabled().get() {
                    let angle = orbit.angle_deg.copied() + orbit.speed_deg_per_sec.copied() * dt;
                    writes.push(BehaviorWrite::OrbitAngle(*id, angle));
                }
            }
        }
        writes
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{OrbitComponent, RotateComponent};

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn tick_while_stopped_is_noop() {
        let mut runtime = Runtime::new();
        let mut scene = Scene::new();
        let id = scene.create_entity("box");
        runtime.tick(&mut scene, 1.0);
        assert!(!scene.get_entity(id).unwrap().is_awaked);
    }

    #[test]
    fn awake_then_start_flags() {
        let mut runtime = Runtime::new();
        let mut scene = Scene::new();
        let id = scene.create_entity("box");

        runtime.play(&mut scene);
        runtime.tick(&mut scene, 0.016);
        let entity = scene.get_entity(id).unwrap();
        assert!(entity.is_awaked);
        assert!(entity.is_started);
    }

    #[test]
    fn disabled_entity_not_awoken() {
        let mut runtime = Runtime::new();
        let mut scene = Scene::new();
        let id = scene.create_entity("box");
        scene.get_entity_mut(id).unwrap().is_enabled = false;

        runtime.play(&mut scene);
        runtime.tick(&mut scene, 0.016);
        assert!(!scene.get_entity(id).unwrap().is_awaked);
    }

    #[test]
    fn rotate_behavior_advances_rotation() {
        let mut runtime = Runtime::new();
        let mut scene = Scene::new();
        let id = scene.create_entity("spinner");
        scene
            .get_entity_mut(id)
            .unwrap()
            .add_component(RotateComponent::new());

        runtime.play(&mut scene);
        runtime.tick(&mut scene, 1.0);
        let rotation = *scene
            .get_entity(id)
            .unwrap()
            .transform()
            .unwrap()
            .rotation
            .get();
        assert!(close(rotation.y, 45.0));
    }

    #[test]
    fn orbit_behavior_moves_entity() {
        let mut runtime = Runtime::new();
        let mut scene = Scene::new();
        let id = scene.create_entity("satellite");
        let mut orbit = OrbitComponent::new();
        orbit.speed_deg_per_sec.set(90.0);
        scene.get_entity_mut(id).unwrap().add_component(orbit);

        runtime.play(&mut scene);
        runtime.tick(&mut scene, 1.0);
        let position = *scene
            .get_entity(id)
            .unwrap()
            .transform()
            .unwrap()
            .position
            .get();
        assert!(close(position.x, 0.0));
        assert!(close(position.z, 5.0));
    }

    #[test]
    fn stop_reverts_run_edits() {
        let mut runtime = Runtime::new();
        let mut scene = Scene::new();
        let id = scene.create_entity("spinner");
        scene
            .get_entity_mut(id)
            .unwrap()
            .add_component(RotateComponent::new());

        runtime.play(&mut scene);
        for _ in 0..10 {
            runtime.tick(&mut scene, 0.1);
        }
        let mid = *scene
            .get_entity(id)
            .unwrap()
            .transform()
            .unwrap()
            .rotation
            .get();
        assert!(mid.y > 0.0);

        runtime.stop(&mut scene);
        assert_eq!(runtime.state(), PlayState::Stopped);
        let entity = scene.get_entity(id).unwrap();
        assert_eq!(entity.transform().unwrap().rotation.get().y, 0.0);
        // Lifecycle flags revert with the snapshot too.
        assert!(!entity.is_awaked);
        assert!(!entity.is_started);
    }

    #[test]
    fn pause_freezes_without_restoring() {
        let mut runtime = Runtime::new();
        let mut scene = Scene::new();
        let id = scene.create_entity("spinner");
        scene
            .get_entity_mut(id)
            .unwrap()
            .add_component(RotateComponent::new());

        runtime.play(&mut scene);
        runtime.tick(&mut scene, 1.0);
        runtime.pause();
        assert_eq!(runtime.state(), PlayState::Paused);

        let frozen = *scene
            .get_entity(id)
            .unwrap()
            .transform()
            .unwrap()
            .rotation
            .get();
        runtime.tick(&mut scene, 1.0);
        let after = *scene
            .get_entity(id)
            .unwrap()
            .transform()
            .unwrap()
            .rotation
            .get();
        assert_eq!(frozen, after);

        // Resume keeps the original pre-play snapshot as restore target.
        runtime.play(&mut scene);
        runtime.tick(&mut scene, 1.0);
        runtime.stop(&mut scene);
        assert_eq!(
            scene
                .get_entity(id)
                .unwrap()
                .transform()
                .unwrap()
                .rotation
                .get()
                .y,
            0.0
        );
    }

    #[test]
    fn fixed_steps_drain_accumulator() {
        let mut runtime = Runtime::with_fixed_timestep(1.0 / 60.0);
        let mut scene = Scene::new();
        scene.create_entity("box");

        runtime.play(&mut scene);
        runtime.tick(&mut scene, 1.0 / 30.0);
        assert_eq!(runtime.fixed_steps_run(), 2);
    }
}
