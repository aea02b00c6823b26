//! # 3D Camera
//!
//! Perspective camera whose pose is a regular [`Transform`]. The camera can
//! stand on its own or follow a scene node, in which case its world transform
//! comes from the node's propagated world matrix.
//!
//! ## Coordinate System
//! Right-handed, Y-up. The camera looks down its local -Z axis, the projection
//! maps view-space depth to OpenGL clip space `[-1, 1]`.

use crate::core::config::CameraConfig;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Quat, Transform, Vec3};
use crate::scene::{NodeId, SceneGraph};
use thiserror::Error;

/// Camera errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// A viewport dimension was zero
    #[error("Invalid viewport {width}x{height}: both dimensions must be positive")]
    InvalidViewport {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
}

/// Perspective camera
///
/// The projection matrix is cached and only rebuilt when a projection
/// parameter changes. The view matrix is derived on demand from the current
/// pose, so camera controllers can mutate `transform` freely between frames.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Pose of a free camera; ignored while following a node
    pub transform: Transform,

    node: Option<NodeId>,
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
    projection: Mat4,
}

impl Camera {
    /// Create a new perspective camera
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    ///
    /// # Example
    /// ```rust
    /// use scene_engine::foundation::math::Vec3;
    /// use scene_engine::render::Camera;
    ///
    /// let camera = Camera::perspective(Vec3::new(0.0, 0.0, 25.0), 75.0, 16.0 / 9.0, 0.1, 100.0);
    /// assert_eq!(camera.aspect(), 16.0 / 9.0);
    /// ```
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let fov = utils::deg_to_rad(fov_degrees);
        Self {
            transform: Transform::from_position(position),
            node: None,
            fov,
            aspect,
            near,
            far,
            projection: Mat4::perspective(fov, aspect, near, far),
        }
    }

    /// Create a camera from configuration for an initial viewport
    ///
    /// A zero-sized initial viewport falls back to an aspect ratio of 1.
    pub fn from_config(config: &CameraConfig, width: u32, height: u32) -> Self {
        let position = Vec3::new(config.position[0], config.position[1], config.position[2]);
        let mut camera = Self::perspective(position, config.fov_degrees, 1.0, config.near, config.far);
        if let Err(err) = camera.resize(width, height) {
            log::warn!("Camera created with {}; using aspect 1.0", err);
        }
        camera
    }

    /// Adapt the projection to a new viewport size
    ///
    /// A zero dimension is rejected and the last valid aspect ratio and
    /// projection are kept. Transient zero-size layouts are common while a
    /// window is being created or minimized.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), CameraError> {
        if width == 0 || height == 0 {
            return Err(CameraError::InvalidViewport { width, height });
        }

        let aspect = width as f32 / height as f32;
        if (self.aspect - aspect).abs() > 0.01 {
            log::info!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
        self.update_projection();
        Ok(())
    }

    /// Change the vertical field of view
    pub fn set_fov(&mut self, fov_degrees: f32) {
        self.fov = utils::deg_to_rad(fov_degrees);
        self.update_projection();
    }

    /// Change the clipping planes
    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
        self.update_projection();
    }

    /// Orient the free camera towards `target`
    ///
    /// Leaves the orientation unchanged (and logs a warning) if the view
    /// direction is degenerate or parallel to `up`.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let direction = target - self.transform.position;
        if direction.cross(&up).norm_squared() <= f32::EPSILON {
            log::warn!("Camera look_at ignored: direction {:?} is degenerate for up {:?}", direction, up);
            return;
        }
        self.transform.rotation = Quat::look_at_rh(&direction, &up).inverse();
        log::trace!("Camera look_at updated - target: {:?}, up: {:?}", target, up);
    }

    /// Follow a scene node instead of the free transform
    pub fn attach_to(&mut self, node: NodeId) {
        self.node = Some(node);
    }

    /// Go back to the free transform
    pub fn detach(&mut self) -> Option<NodeId> {
        self.node.take()
    }

    /// Node the camera follows, if any
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Vertical field of view in degrees
    pub fn fov_degrees(&self) -> f32 {
        utils::rad_to_deg(self.fov)
    }

    /// Current aspect ratio
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Near and far clipping distances
    pub fn clip_planes(&self) -> (f32, f32) {
        (self.near, self.far)
    }

    /// Cached perspective projection matrix
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection
    }

    /// World transform of the camera
    ///
    /// Uses the followed node's propagated world matrix when the node is
    /// alive, the free transform otherwise.
    pub fn world_matrix(&self, scene: &SceneGraph) -> Mat4 {
        match self.node.and_then(|node| scene.world_matrix(node)) {
            Some(world) => world,
            None => self.transform.local_matrix(),
        }
    }

    /// View matrix (inverse of the camera world transform)
    ///
    /// A singular world transform (zero scale somewhere up the chain) yields
    /// the identity view.
    pub fn view_matrix(&self, scene: &SceneGraph) -> Mat4 {
        self.world_matrix(scene).try_inverse().unwrap_or_else(|| {
            log::warn!("Camera world transform is singular; using identity view");
            Mat4::identity()
        })
    }

    /// Combined `projection * view` matrix
    pub fn view_projection(&self, scene: &SceneGraph) -> Mat4 {
        self.projection * self.view_matrix(scene)
    }

    fn update_projection(&mut self) {
        self.projection = Mat4::perspective(self.fov, self.aspect, self.near, self.far);
    }
}

impl Default for Camera {
    /// 75 degree camera 25 units back on +Z, looking at the origin
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 1, 1)
    }
}
