use glam::{Mat4, Vec3};

/// Film gauge used to convert between focal length and vertical fov.
pub const FILM_GAUGE_MM: f32 = 35.0;

const POLAR_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    look_target: Vec3,
    fov_deg: f32,
    aspect: f32,
    near: f32,
    far: f32,
    projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            look_target: Vec3::ZERO,
            fov_deg,
            aspect: sanitize_aspect(aspect),
            near,
            far,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }

    pub fn focal_length(&self) -> f32 {
        0.5 * FILM_GAUGE_MM / (self.fov_deg.to_radians() * 0.5).tan()
    }

    pub fn set_focal_length(&mut self, focal_length_mm: f32) {
        let focal = focal_length_mm.max(1e-3);
        self.fov_deg = 2.0 * (0.5 * FILM_GAUGE_MM / focal).atan().to_degrees();
        self.update_projection();
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.look_target = target;
    }

    pub fn view_matrix(&self) -> Mat4 {
        let forward = self.look_target - self.position;
        if forward.length_squared() < 1e-12 {
            return Mat4::from_translation(-self.position);
        }
        let up = if forward.normalize().cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        Mat4::look_at_rh(self.position, self.look_target, up)
    }

    /// Takes effect on the next [`update_projection`](Self::update_projection).
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = sanitize_aspect(aspect);
    }

    /// Takes effect on the next [`update_projection`](Self::update_projection).
    pub fn set_clip(&mut self, near: f32, far: f32) {
        self.near = near.max(1e-6);
        self.far = far.max(self.near * 2.0);
    }

    pub fn update_projection(&mut self) {
        self.projection =
            Mat4::perspective_rh_gl(self.fov_deg.to_radians(), self.aspect, self.near, self.far);
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn fov_deg(&self) -> f32 {
        self.fov_deg
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}

/// Damped user orbit around a fixed target, y-up.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    enabled: bool,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    theta_delta: f32,
    phi_delta: f32,
    zoom_scale: f32,
}

impl OrbitControls {
    /// Starts disabled; the first completed camera transition enables it.
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            enabled: false,
            enable_damping: true,
            damping_factor: 0.05,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: std::f32::consts::PI,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            theta_delta: 0.0,
            phi_delta: 0.0,
            zoom_scale: 1.0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disables user control and drops any motion still being damped out.
    pub fn suspend(&mut self) {
        self.enabled = false;
        self.flush();
    }

    pub fn resume(&mut self) {
        self.flush();
        self.enabled = true;
    }

    pub fn flush(&mut self) {
        self.theta_delta = 0.0;
        self.phi_delta = 0.0;
        self.zoom_scale = 1.0;
    }

    #[cfg(test)]
    pub fn has_pending_motion(&self) -> bool {
        self.theta_delta.abs() > 1e-6 || self.phi_delta.abs() > 1e-6 || self.zoom_scale != 1.0
    }

    /// Pointer drag in pixels. A full viewport height drag is one full turn.
    pub fn rotate(&mut self, dx_px: f32, dy_px: f32, viewport_height: f32) {
        if !self.enabled {
            return;
        }
        let height = viewport_height.max(1.0);
        self.theta_delta -= std::f32::consts::TAU * dx_px / height * self.rotate_speed;
        self.phi_delta -= std::f32::consts::TAU * dy_px / height * self.rotate_speed;
    }

    /// Positive steps zoom in.
    pub fn zoom(&mut self, wheel_steps: f32) {
        if !self.enabled || wheel_steps == 0.0 {
            return;
        }
        let scale = 0.95f32.powf(self.zoom_speed * wheel_steps.abs());
        if wheel_steps > 0.0 {
            self.zoom_scale *= scale;
        } else {
            self.zoom_scale /= scale;
        }
    }

    /// Integrates pending motion (when enabled) and aims the camera at the
    /// target. While disabled the camera position is left untouched.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        if self.enabled {
            let offset = camera.position - self.target;
            let radius = offset.length();
            if radius > 1e-6 {
                let mut theta = offset.x.atan2(offset.z);
                let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
                if self.enable_damping {
                    theta += self.theta_delta * self.damping_factor;
                    phi += self.phi_delta * self.damping_factor;
                } else {
                    theta += self.theta_delta;
                    phi += self.phi_delta;
                }
                phi = phi
                    .clamp(self.min_polar_angle, self.max_polar_angle)
                    .clamp(POLAR_EPSILON, std::f32::consts::PI - POLAR_EPSILON);
                let radius = (radius * self.zoom_scale).clamp(self.min_distance, self.max_distance);
                let sin_phi = phi.sin();
                camera.position = self.target
                    + Vec3::new(
                        radius * sin_phi * theta.sin(),
                        radius * phi.cos(),
                        radius * sin_phi * theta.cos(),
                    );
            }
            if self.enable_damping {
                self.theta_delta *= 1.0 - self.damping_factor;
                self.phi_delta *= 1.0 - self.damping_factor;
            } else {
                self.theta_delta = 0.0;
                self.phi_delta = 0.0;
            }
            self.zoom_scale = 1.0;
        }
        camera.look_at(self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::{OrbitControls, PerspectiveCamera};
    use glam::{Mat4, Vec3};

    #[test]
    fn test_longer_focal_length_narrows_fov() {
        let mut camera = PerspectiveCamera::new(60.0, 16.0 / 9.0, 0.01, 1000.0);
        let focal = camera.focal_length();
        assert!((focal - 30.31).abs() < 0.05);
        camera.set_focal_length(focal + 10.0);
        assert!((camera.fov_deg() - 47.0).abs() < 0.2);
        assert!(camera.projection().to_cols_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_aspect_change_needs_projection_refresh() {
        let mut camera = PerspectiveCamera::new(60.0, 1.0, 0.1, 100.0);
        let before = camera.projection();
        camera.set_aspect(2.0);
        assert_eq!(camera.projection(), before);
        camera.update_projection();
        assert_ne!(camera.projection(), before);
        assert_eq!(camera.aspect(), 2.0);
    }

    #[test]
    fn test_disabled_controls_ignore_input_and_keep_position() {
        let mut camera = PerspectiveCamera::new(60.0, 1.0, 0.1, 100.0);
        camera.position = Vec3::new(0.0, 2.0, 10.0);
        let mut orbit = OrbitControls::new(Vec3::ZERO);
        orbit.rotate(200.0, 0.0, 800.0);
        orbit.zoom(3.0);
        assert!(!orbit.has_pending_motion());
        orbit.update(&mut camera);
        assert_eq!(camera.position, Vec3::new(0.0, 2.0, 10.0));
        assert_eq!(
            camera.view_matrix(),
            Mat4::look_at_rh(camera.position, Vec3::ZERO, Vec3::Y)
        );
    }

    #[test]
    fn test_damping_decays_and_preserves_distance() {
        let mut camera = PerspectiveCamera::new(60.0, 1.0, 0.1, 100.0);
        camera.position = Vec3::new(0.0, 3.0, 10.0);
        let radius = camera.position.length();
        let mut orbit = OrbitControls::new(Vec3::ZERO);
        orbit.resume();
        orbit.rotate(100.0, 0.0, 800.0);

        let start = camera.position;
        for _ in 0..400 {
            orbit.update(&mut camera);
        }
        assert!(!orbit.has_pending_motion());
        assert!((camera.position - start).length() > 0.1);
        assert!((camera.position.length() - radius).abs() < 1e-3);
    }

    #[test]
    fn test_suspend_flushes_pending_motion() {
        let mut orbit = OrbitControls::new(Vec3::ZERO);
        orbit.resume();
        orbit.rotate(50.0, 25.0, 600.0);
        assert!(orbit.has_pending_motion());
        orbit.suspend();
        assert!(!orbit.is_enabled());
        assert!(!orbit.has_pending_motion());
    }

    #[test]
    fn test_polar_angle_is_clamped() {
        let mut camera = PerspectiveCamera::new(60.0, 1.0, 0.1, 100.0);
        camera.position = Vec3::new(0.0, 1.0, 10.0);
        let mut orbit = OrbitControls::new(Vec3::ZERO);
        orbit.enable_damping = false;
        orbit.max_polar_angle = 0.9 * std::f32::consts::FRAC_PI_2;
        orbit.resume();
        orbit.rotate(0.0, -2000.0, 800.0);
        orbit.update(&mut camera);
        let phi = (camera.position.y / camera.position.length()).acos();
        assert!(phi <= orbit.max_polar_angle + 1e-4);
    }
}
