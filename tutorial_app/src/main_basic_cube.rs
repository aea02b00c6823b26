//! Rotating cube
//!
//! One renderable node at the origin spinning about X and Y, viewed from two
//! units down +Z.

use scene_engine::prelude::*;
use tutorial_app::{launch, spawn_key_light};

const CUBE_MESH: MeshHandle = MeshHandle(0);
const CUBE_MATERIAL: MaterialHandle = MaterialHandle(0);

#[derive(Default)]
struct BasicCube {
    cube: Option<NodeId>,
}

impl Application for BasicCube {
    fn initialize(&mut self, scene: &mut SceneGraph, camera: &mut Camera) -> Result<(), AppError> {
        camera.transform.position = Vec3::new(0.0, 0.0, 2.0);

        spawn_key_light(scene)?;

        let cube = scene.spawn_root(Transform::identity());
        scene.set_name(cube, "cube")?;
        scene.set_renderable(cube, Some(Renderable::new(CUBE_MESH, CUBE_MATERIAL)))?;
        self.cube = Some(cube);
        Ok(())
    }

    fn update(&mut self, frame: &mut FrameContext<'_>) -> Result<(), AppError> {
        let t = frame.elapsed_secs();
        let cube = self.cube.ok_or_else(|| AppError::Custom("cube not initialized".to_string()))?;
        if let Some(transform) = frame.scene.transform_mut(cube) {
            transform.rotation = Quat::from_euler_angles(t, t, 0.0);
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = BasicCube::default();
    launch("basic_cube", &mut app)?;
    Ok(())
}
