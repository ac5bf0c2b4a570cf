//! Camera types, controller and uniforms for view/projection.
//!
//! The camera is a first-person free-fly camera: a world position plus
//! yaw/pitch angles. A [`CameraController`] accumulates keyboard and mouse
//! input and applies it scaled by the frame delta, and a [`Projection`] turns
//! the surface dimensions into either a perspective or an orthographic
//! projection matrix depending on its [`ProjectionMode`].

use cgmath::{Angle, InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use instant::Duration;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// cgmath produces OpenGL clip space (z in -1..1); wgpu expects z in 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const PITCH_LIMIT: Rad<f32> = Rad(std::f32::consts::FRAC_PI_2 - 0.01);
const MIN_FOV_DEG: f32 = 1.0;
const MAX_FOV_DEG: f32 = 45.0;

#[derive(Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    pub fn forward(&self) -> Vector3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), Vector3::unit_y())
    }
}

/// Which projection the render loop applies.
///
/// Exactly one mode is active at any time by construction; the P and O keys
/// select a variant rather than toggling a pair of flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionMode {
    Perspective,
    Orthographic,
}

#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
    /// Half-extent of the orthographic view volume in x and y.
    ortho_extent: f32,
    mode: ProjectionMode,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
            ortho_extent: 7.0,
            mode: ProjectionMode::Perspective,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ProjectionMode) {
        self.mode = mode;
    }

    pub fn fovy(&self) -> Rad<f32> {
        self.fovy
    }

    /// Narrow or widen the field of view; positive `delta` zooms in.
    /// Only meaningful in perspective mode, clamped to sane angles.
    pub fn zoom(&mut self, delta: f32) {
        let fov = cgmath::Deg::from(self.fovy).0 - delta;
        self.fovy = cgmath::Deg(fov.clamp(MIN_FOV_DEG, MAX_FOV_DEG)).into();
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
            }
            ProjectionMode::Orthographic => {
                let e = self.ortho_extent;
                OPENGL_TO_WGPU_MATRIX * cgmath::ortho(-e, e, -e, e, 0.0, self.zfar)
            }
        }
    }
}

/// The camera state mirrored into a GPU buffer: world position for specular
/// view direction plus the combined view-projection matrix.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates raw input between frames and applies it to the camera and
/// projection once per frame, scaled by the elapsed time.
#[derive(Debug)]
pub struct CameraController {
    amount_left: f32,
    amount_right: f32,
    amount_forward: f32,
    amount_backward: f32,
    amount_up: f32,
    amount_down: f32,
    rotate_horizontal: f32,
    rotate_vertical: f32,
    scroll: f32,
    speed: f32,
    sensitivity: f32,
}

impl CameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            amount_left: 0.0,
            amount_right: 0.0,
            amount_forward: 0.0,
            amount_backward: 0.0,
            amount_up: 0.0,
            amount_down: 0.0,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            scroll: 0.0,
            speed,
            sensitivity,
        }
    }

    /// Feed a movement key. Returns whether the key was consumed.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        let amount = if state.is_pressed() { 1.0 } else { 0.0 };
        match key {
            KeyCode::KeyW => {
                self.amount_forward = amount;
                true
            }
            KeyCode::KeyS => {
                self.amount_backward = amount;
                true
            }
            KeyCode::KeyA => {
                self.amount_left = amount;
                true
            }
            KeyCode::KeyD => {
                self.amount_right = amount;
                true
            }
            KeyCode::KeyQ => {
                self.amount_up = amount;
                true
            }
            KeyCode::KeyE => {
                self.amount_down = amount;
                true
            }
            _ => false,
        }
    }

    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.rotate_horizontal += dx as f32;
        self.rotate_vertical += dy as f32;
    }

    pub fn process_scroll(&mut self, delta: &MouseScrollDelta) {
        self.scroll += match delta {
            MouseScrollDelta::LineDelta(_, lines) => *lines,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
        };
    }

    /// Route the window events this controller cares about.
    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                self.process_keyboard(*code, *state);
            }
            WindowEvent::MouseWheel { delta, .. } => self.process_scroll(delta),
            _ => (),
        }
    }

    pub fn update(&mut self, camera: &mut Camera, projection: &mut Projection, dt: Duration) {
        let dt = dt.as_secs_f32();

        // Planar movement follows the view direction projected on the ground,
        // vertical movement is world-space up/down.
        let (yaw_sin, yaw_cos) = camera.yaw.sin_cos();
        let forward = Vector3::new(yaw_cos, 0.0, yaw_sin).normalize();
        let right = Vector3::new(-yaw_sin, 0.0, yaw_cos).normalize();
        camera.position += forward * (self.amount_forward - self.amount_backward) * self.speed * dt;
        camera.position += right * (self.amount_right - self.amount_left) * self.speed * dt;
        camera.position.y += (self.amount_up - self.amount_down) * self.speed * dt;

        // Mouse deltas are already per-event amounts; scaling them by dt
        // would make look sensitivity depend on the frame rate.
        camera.yaw += Rad(self.rotate_horizontal * self.sensitivity);
        camera.pitch -= Rad(self.rotate_vertical * self.sensitivity);
        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;

        if camera.pitch < -PITCH_LIMIT {
            camera.pitch = -PITCH_LIMIT;
        } else if camera.pitch > PITCH_LIMIT {
            camera.pitch = PITCH_LIMIT;
        }

        projection.zoom(self.scroll);
        self.scroll = 0.0;
    }
}

/// GPU-side bundle for the camera: state, controller, uniform and bind group.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, EuclideanSpace};

    fn test_camera() -> Camera {
        Camera::new((0.0, 2.0, 2.0), Deg(-90.0), Deg(0.0))
    }

    #[test]
    fn forward_points_down_negative_z_at_default_yaw() {
        let camera = test_camera();
        let fwd = camera.forward();
        assert!(fwd.z < -0.99);
        assert!(fwd.y.abs() < 1e-6);
    }

    #[test]
    fn view_matrix_is_finite() {
        let camera = test_camera();
        let m = camera.calc_matrix();
        for col in 0..4 {
            for row in 0..4 {
                assert!(m[col][row].is_finite());
            }
        }
    }

    #[test]
    fn controller_moves_camera_forward() {
        let mut camera = test_camera();
        let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        let mut controller = CameraController::new(2.5, 0.4);
        let start = camera.position;
        controller.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        controller.update(&mut camera, &mut projection, Duration::from_secs(1));
        assert!((camera.position.z - start.z) < -1.0);
        // Planar movement never changes altitude.
        assert!((camera.position.y - start.y).abs() < 1e-6);
    }

    #[test]
    fn vertical_keys_change_altitude_only() {
        let mut camera = test_camera();
        let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        let mut controller = CameraController::new(2.5, 0.4);
        let start = camera.position;
        controller.process_keyboard(KeyCode::KeyQ, ElementState::Pressed);
        controller.update(&mut camera, &mut projection, Duration::from_secs(1));
        assert!(camera.position.y > start.y);
        assert!((camera.position.to_vec().x - start.to_vec().x).abs() < 1e-6);
    }

    #[test]
    fn mouse_look_rotation_ignores_frame_time() {
        let turn_with_dt = |dt: Duration| {
            let mut camera = test_camera();
            let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
            let mut controller = CameraController::new(2.5, 0.002);
            let start = camera.yaw;
            controller.handle_mouse(100.0, 0.0);
            controller.update(&mut camera, &mut projection, dt);
            camera.yaw - start
        };
        // The same physical mouse move turns the camera the same amount
        // whether the frame took a second or ten milliseconds.
        let slow = turn_with_dt(Duration::from_secs(1));
        let fast = turn_with_dt(Duration::from_millis(10));
        assert!(slow.0 > 0.0);
        assert_eq!(slow, fast);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = test_camera();
        let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        let mut controller = CameraController::new(2.5, 1.0);
        controller.handle_mouse(0.0, -10_000.0);
        controller.update(&mut camera, &mut projection, Duration::from_secs(1));
        assert!(camera.pitch <= PITCH_LIMIT);
        controller.handle_mouse(0.0, 10_000.0);
        controller.update(&mut camera, &mut projection, Duration::from_secs(1));
        assert!(camera.pitch >= -PITCH_LIMIT);
    }

    #[test]
    fn projection_mode_is_exclusive() {
        let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        assert_eq!(projection.mode(), ProjectionMode::Perspective);
        projection.set_mode(ProjectionMode::Orthographic);
        assert_eq!(projection.mode(), ProjectionMode::Orthographic);
        projection.set_mode(ProjectionMode::Perspective);
        assert_eq!(projection.mode(), ProjectionMode::Perspective);
    }

    #[test]
    fn perspective_and_ortho_matrices_differ() {
        let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        let persp = projection.calc_matrix();
        projection.set_mode(ProjectionMode::Orthographic);
        let ortho = projection.calc_matrix();
        // Orthographic projection has no perspective divide term.
        assert_eq!(ortho[3][3], 1.0);
        assert_ne!(persp[3][3], 1.0);
    }

    #[test]
    fn zoom_clamps_fov() {
        let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        projection.zoom(1_000.0);
        assert!(Deg::from(projection.fovy()).0 >= MIN_FOV_DEG);
        projection.zoom(-1_000.0);
        assert!(Deg::from(projection.fovy()).0 <= MAX_FOV_DEG);
    }
}
