//! Light payloads
//!
//! Lights are scene data: a node carries one, the graph places it through
//! the same propagation as renderables, and the renderer receives the
//! resulting world-space light list. Shading itself is up to the renderer.

use super::node::NodeId;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Types of lights a node can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    /// Parallel rays shining from the node towards the world origin
    Directional,
    /// Light radiating in all directions from the node position
    Point,
}

/// Light attached to a scene node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// Kind of light
    pub light_type: LightType,
    /// RGB color (0.0 to 1.0 range)
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
}

impl Light {
    /// Directional light
    pub fn directional(color: Vec3, intensity: f32) -> Self {
        Self {
            light_type: LightType::Directional,
            color,
            intensity,
        }
    }

    /// Point light
    pub fn point(color: Vec3, intensity: f32) -> Self {
        Self {
            light_type: LightType::Point,
            color,
            intensity,
        }
    }

    /// White directional light at full intensity
    pub fn white() -> Self {
        Self::directional(Vec3::new(1.0, 1.0, 1.0), 1.0)
    }
}

/// One entry of the world-space light list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightItem {
    /// Node the light was produced from
    pub node: NodeId,

    /// World-space matrix of the node
    pub world: Mat4,

    /// Light parameters
    pub light: Light,
}

impl LightItem {
    /// World-space position of the light
    pub fn position(&self) -> Vec3 {
        self.world.translation_part()
    }

    /// Unit direction the light travels in, for directional lights
    ///
    /// Points from the light towards the world origin; a light sitting at
    /// the origin shines down its local -Z axis instead.
    pub fn direction(&self) -> Vec3 {
        let position = self.position();
        if position.norm_squared() > f32::EPSILON {
            return -position.normalize();
        }
        self.world
            .transform_vector(&Vec3::new(0.0, 0.0, -1.0))
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| Vec3::new(0.0, 0.0, -1.0))
    }
}
