//! Fill and wireframe group
//!
//! A group node holding two renderables that share one mesh: a filled
//! surface and its wireframe overlay. The group stays put while an
//! [`OrbitController`] circles the camera around it.

use scene_engine::prelude::*;
use tutorial_app::{launch, spawn_key_light, OrbitController};

const KNOT_MESH: MeshHandle = MeshHandle(1);
const FILL_MATERIAL: MaterialHandle = MaterialHandle(1);
const WIREFRAME_MATERIAL: MaterialHandle = MaterialHandle(2);

/// Radians per second of camera auto-rotation
const ORBIT_SPEED: f32 = 0.5;

struct OrbitGroup {
    group: Option<NodeId>,
    controller: OrbitController,
}

impl OrbitGroup {
    fn new() -> Self {
        Self {
            group: None,
            controller: OrbitController::new(Vec3::zeros(), 2.0).with_speed(ORBIT_SPEED),
        }
    }
}

impl Application for OrbitGroup {
    fn initialize(&mut self, scene: &mut SceneGraph, camera: &mut Camera) -> Result<(), AppError> {
        spawn_key_light(scene)?;

        let group = scene.spawn_root(Transform::identity());
        scene.set_name(group, "group")?;

        let fill = scene.spawn_child(group, Transform::identity())?;
        scene.set_name(fill, "fill")?;
        scene.set_renderable(fill, Some(Renderable::new(KNOT_MESH, FILL_MATERIAL)))?;

        let wireframe = scene.spawn_child(group, Transform::identity())?;
        scene.set_name(wireframe, "wireframe")?;
        scene.set_renderable(wireframe, Some(Renderable::new(KNOT_MESH, WIREFRAME_MATERIAL)))?;

        self.group = Some(group);
        self.controller.apply(camera, 0.0);
        Ok(())
    }

    fn update(&mut self, frame: &mut FrameContext<'_>) -> Result<(), AppError> {
        let t = frame.elapsed_secs();
        self.controller.apply(frame.camera, t);
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = OrbitGroup::new();
    launch("orbit_group", &mut app)?;
    Ok(())
}
