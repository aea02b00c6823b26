//! Sun, earth and moon
//!
//! Lit by the shared key light, a separate root.
//!
//! ```text
//! solar_system (spin t/2)
//! ├── sun (scale 3)
//! └── earth_orbit (x = 10, spin 2t)
//!     ├── earth
//!     └── moon_orbit (x = 2, spin 5t)
//!         └── moon (scale 0.5)
//! ```

use scene_engine::prelude::*;
use tutorial_app::{launch, spawn_key_light};

const SPHERE_MESH: MeshHandle = MeshHandle(2);
const SUN_MATERIAL: MaterialHandle = MaterialHandle(10);
const EARTH_MATERIAL: MaterialHandle = MaterialHandle(11);
const MOON_MATERIAL: MaterialHandle = MaterialHandle(12);

#[derive(Debug, Clone, Copy)]
struct Orbits {
    solar_system: NodeId,
    earth_orbit: NodeId,
    moon_orbit: NodeId,
}

#[derive(Default)]
struct SolarSystem {
    orbits: Option<Orbits>,
}

fn spin(scene: &mut SceneGraph, node: NodeId, angle: f32) {
    if let Some(transform) = scene.transform_mut(node) {
        transform.rotation = Quat::from_axis_angle(&Vec3::y_axis(), angle);
    }
}

impl Application for SolarSystem {
    fn initialize(&mut self, scene: &mut SceneGraph, camera: &mut Camera) -> Result<(), AppError> {
        camera.transform.position = Vec3::new(0.0, 0.0, 25.0);

        spawn_key_light(scene)?;

        let solar_system = scene.spawn_root(Transform::identity());
        scene.set_name(solar_system, "solar_system")?;

        let sun = scene.spawn_child(solar_system, Transform::identity().with_uniform_scale(3.0))?;
        scene.set_name(sun, "sun")?;
        scene.set_renderable(sun, Some(Renderable::new(SPHERE_MESH, SUN_MATERIAL)))?;

        let earth_orbit = scene.spawn_child(solar_system, Transform::from_position(Vec3::new(10.0, 0.0, 0.0)))?;
        scene.set_name(earth_orbit, "earth_orbit")?;

        let earth = scene.spawn_child(earth_orbit, Transform::identity())?;
        scene.set_name(earth, "earth")?;
        scene.set_renderable(earth, Some(Renderable::new(SPHERE_MESH, EARTH_MATERIAL)))?;

        let moon_orbit = scene.spawn_child(earth_orbit, Transform::from_position(Vec3::new(2.0, 0.0, 0.0)))?;
        scene.set_name(moon_orbit, "moon_orbit")?;

        let moon = scene.spawn_child(moon_orbit, Transform::identity().with_uniform_scale(0.5))?;
        scene.set_name(moon, "moon")?;
        scene.set_renderable(moon, Some(Renderable::new(SPHERE_MESH, MOON_MATERIAL)))?;

        self.orbits = Some(Orbits {
            solar_system,
            earth_orbit,
            moon_orbit,
        });
        log::info!("Solar system built with {} nodes", scene.len());
        Ok(())
    }

    fn update(&mut self, frame: &mut FrameContext<'_>) -> Result<(), AppError> {
        let t = frame.elapsed_secs();
        let orbits = self.orbits.ok_or_else(|| AppError::Custom("solar system not initialized".to_string()))?;

        spin(frame.scene, orbits.solar_system, t / 2.0);
        spin(frame.scene, orbits.earth_orbit, t * 2.0);
        spin(frame.scene, orbits.moon_orbit, t * 5.0);
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut app = SolarSystem::default();
    launch("solar_system", &mut app)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use scene_engine::foundation::math::constants::PI;
    use scene_engine::foundation::time::ManualTimeSource;
    use std::time::Duration;

    #[test]
    fn test_world_positions_follow_the_hierarchy() {
        let mut scene = SceneGraph::new();
        let mut camera = Camera::default();
        let mut renderer = HeadlessRenderer::with_history(1);
        let mut app = SolarSystem::default();
        let time = ManualTimeSource::new();

        {
            let mut render_loop =
                RenderLoop::with_time_source(&mut app, &mut scene, &mut camera, &mut renderer, time.clone());
            render_loop.start().unwrap();
            // t = PI: solar system turned by PI/2, earth orbit by 2PI
            time.set(Duration::from_secs_f32(PI));
            render_loop.frame().unwrap();
        }

        let earth = scene.find_by_name("earth").unwrap();
        let moon = scene.find_by_name("moon").unwrap();

        // Rotating +X by PI/2 about +Y lands on -Z
        assert_relative_eq!(scene.world_position(earth).unwrap(), Vec3::new(0.0, 0.0, -10.0), epsilon = 1e-4);
        let moon_offset = scene.world_position(moon).unwrap() - scene.world_position(earth).unwrap();
        assert_relative_eq!(moon_offset.norm(), 2.0, epsilon = 1e-4);

        let last = renderer.last_frame().unwrap();
        assert_eq!(last.draw_list.len(), 3);
        assert_eq!(last.lights.len(), 1);
        assert_eq!(last.draw_list[0].renderable.material, SUN_MATERIAL);
        assert_eq!(last.draw_list[2].renderable.material, MOON_MATERIAL);
    }
}
