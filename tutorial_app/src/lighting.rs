//! Shared scene lighting

use scene_engine::foundation::math::{Transform, Vec3};
use scene_engine::scene::{Light, NodeId, SceneError, SceneGraph};

/// Position of the key light used by every tutorial scene
pub const KEY_LIGHT_POSITION: Vec3 = Vec3::new(-1.0, 2.0, 4.0);

/// Add a white directional key light as a new root
pub fn spawn_key_light(scene: &mut SceneGraph) -> Result<NodeId, SceneError> {
    let light = scene.spawn_root(Transform::from_position(KEY_LIGHT_POSITION));
    scene.set_name(light, "key_light")?;
    scene.set_light(light, Some(Light::white()))?;
    Ok(light)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_light_is_listed_after_propagation() {
        let mut scene = SceneGraph::new();
        let light = spawn_key_light(&mut scene).unwrap();
        scene.propagate().unwrap();

        let lights: Vec<_> = scene.lights().collect();
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].node, light);
        assert_eq!(lights[0].position(), KEY_LIGHT_POSITION);
        assert_eq!(scene.find_by_name("key_light"), Some(light));
    }
}
