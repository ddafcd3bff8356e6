// ============================================================================
// camera.rs — WASD Viewport Controls
// Camera frames, per-tick displacement math, and the viewport camera.
// ============================================================================

use glam::{EulerRot, Mat4, Quat, Vec3};

/// World-space camera state as reported by the host for one tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraFrame {
    pub position: Vec3,
    pub center_of_interest: Vec3,
    /// Camera world matrix; only its linear part is used.
    pub orientation: Mat4,
}

/// Movement tuning for one tick.
#[derive(Copy, Clone, Debug)]
pub struct StepParams {
    pub step_size: f32,
    pub move_scale_factor: f32,
    pub max_distance: Option<f32>,
}

impl CameraFrame {
    /// Distance to the center of interest; movement scales with it so steps
    /// stay proportional to the framed subject.
    pub fn scale_metric(&self) -> f32 {
        self.center_of_interest.distance(self.position)
    }

    /// Camera-local direction expressed in world space, or `None` when the
    /// orientation collapses it.
    pub fn world_direction(&self, local_dir: Vec3) -> Option<Vec3> {
        let world = self.orientation.transform_vector3(local_dir);
        if world.length_squared() > 0.0 && world.is_finite() {
            Some(world.normalize())
        } else {
            None
        }
    }

    /// Position after one tick of travel along `local_dir` (unit length).
    pub fn stepped_position(&self, local_dir: Vec3, params: &StepParams) -> Option<Vec3> {
        let world_dir = self.world_direction(local_dir)?;
        let mut distance = params.step_size * self.scale_metric() * params.move_scale_factor;
        if let Some(cap) = params.max_distance {
            distance = distance.min(cap.max(0.0));
        }
        Some(self.position + world_dir * distance)
    }
}

// ======================== Viewport Camera ========================

/// GPU-side camera uniforms uploaded every frame.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniforms {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }
}

/// Perspective camera with a yaw/pitch orientation and a center of interest
/// held as a distance along the view axis.
#[derive(Clone, Debug)]
pub struct ViewCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub coi_distance: f32,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for ViewCamera {
    fn default() -> Self {
        let mut cam = Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            coi_distance: 1.0,
            fovy: 54.0f32.to_radians(),
            znear: 0.05,
            zfar: 2000.0,
        };
        cam.look_at(Vec3::new(14.0, 10.0, 18.0), Vec3::ZERO);
        cam
    }
}

impl ViewCamera {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Camera looks down its local -Z.
    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Z
    }

    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation(), self.position)
    }

    pub fn center_of_interest(&self) -> Vec3 {
        self.position + self.forward() * self.coi_distance
    }

    /// Place the camera at `eye` aiming at `target`; the COI becomes `target`.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3) {
        self.position = eye;
        let to_target = target - eye;
        let distance = to_target.length();
        if distance <= f32::EPSILON {
            return;
        }
        let dir = to_target / distance;
        self.yaw = (-dir.x).atan2(-dir.z);
        self.pitch = dir.y.clamp(-1.0, 1.0).asin();
        self.coi_distance = distance;
    }

    pub fn frame(&self) -> CameraFrame {
        CameraFrame {
            position: self.position,
            center_of_interest: self.center_of_interest(),
            orientation: self.world_matrix(),
        }
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let view = self.world_matrix().inverse();
        let proj = Mat4::perspective_rh(self.fovy, aspect.max(1e-3), self.znear, self.zfar);
        proj * view
    }

    pub fn uniforms(&self, aspect: f32) -> CameraUniforms {
        CameraUniforms {
            view_proj: self.view_proj(aspect).to_cols_array_2d(),
        }
    }
}
