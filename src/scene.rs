//! Scene host: camera, lights, placeholder cube and orbit controls.

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::swapper::SceneSlots;

const CAMERA_FOV_DEGREES: f32 = 75.0;
const CAMERA_NEAR: f32 = 0.1;
const CAMERA_FAR: f32 = 1000.0;
const CAMERA_START: Vec3 = Vec3::new(0.0, 0.0, 5.0);

const DEFAULT_DAMPING: f32 = 0.05;
const MAX_PITCH: f32 = 89.0 * std::f32::consts::PI / 180.0;
const MIN_RADIUS: f32 = 0.5;
const MAX_RADIUS: f32 = 100.0;

// Input sensitivities (per pixel / per scroll line)
const ORBIT_SENSITIVITY: f32 = 0.01;
const PAN_SENSITIVITY: f32 = 0.002;
const ZOOM_SENSITIVITY: f32 = 0.2;

/// Marker for the green cube shown before the first weather model arrives.
#[derive(Component)]
pub struct PlaceholderCube;

/// Damped orbit/zoom/pan around a target point.
///
/// Input accumulates into pending deltas. Each frame [`step`](Self::step)
/// applies `damping` of each delta and keeps the rest, so motion eases out
/// over several frames after the input stops.
#[derive(Component, Debug, Clone)]
pub struct OrbitController {
    pub target: Vec3,
    /// Radians around the Y axis; 0 looks down -Z.
    pub yaw: f32,
    /// Radians above the horizontal plane.
    pub pitch: f32,
    pub radius: f32,
    pub damping: f32,
    rotate_delta: Vec2,
    zoom_delta: f32,
    pan_delta: Vec3,
}

impl OrbitController {
    pub fn looking_at(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let radius = offset.length().clamp(MIN_RADIUS, MAX_RADIUS);
        let pitch = (offset.y / radius).clamp(-1.0, 1.0).asin().clamp(-MAX_PITCH, MAX_PITCH);
        let yaw = offset.x.atan2(offset.z);
        Self {
            target,
            yaw,
            pitch,
            radius,
            damping: DEFAULT_DAMPING,
            rotate_delta: Vec2::ZERO,
            zoom_delta: 0.0,
            pan_delta: Vec3::ZERO,
        }
    }

    /// Queue a rotation (yaw, pitch) in radians.
    pub fn rotate(&mut self, delta: Vec2) {
        self.rotate_delta += delta;
    }

    /// Queue a zoom. Positive values move the camera closer.
    pub fn zoom(&mut self, amount: f32) {
        self.zoom_delta -= amount;
    }

    /// Queue a pan from a screen-space drag in pixels.
    pub fn pan(&mut self, screen_delta: Vec2) {
        let transform = self.transform();
        let right = *transform.right();
        let up = *transform.up();
        let scale = self.radius * PAN_SENSITIVITY;
        self.pan_delta += (-right * screen_delta.x + up * screen_delta.y) * scale;
    }

    pub fn step(&mut self) {
        let f = self.damping;
        let keep = 1.0 - f;

        self.yaw += self.rotate_delta.x * f;
        self.pitch = (self.pitch + self.rotate_delta.y * f).clamp(-MAX_PITCH, MAX_PITCH);
        self.rotate_delta *= keep;

        self.radius = (self.radius * (self.zoom_delta * f).exp()).clamp(MIN_RADIUS, MAX_RADIUS);
        self.zoom_delta *= keep;

        self.target += self.pan_delta * f;
        self.pan_delta *= keep;
    }

    pub fn eye(&self) -> Vec3 {
        let horizontal = self.radius * self.pitch.cos();
        self.target
            + Vec3::new(
                horizontal * self.yaw.sin(),
                self.radius * self.pitch.sin(),
                horizontal * self.yaw.cos(),
            )
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye()).looking_at(self.target, Vec3::Y)
    }

    pub fn is_settled(&self) -> bool {
        self.rotate_delta.length_squared() < 1e-12
            && self.zoom_delta.abs() < 1e-6
            && self.pan_delta.length_squared() < 1e-12
    }
}

pub fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut slots: ResMut<SceneSlots>,
) {
    let orbit = OrbitController::looking_at(CAMERA_START, Vec3::ZERO);
    commands.spawn((
        Name::new("Scene camera"),
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: CAMERA_FOV_DEGREES.to_radians(),
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            ..default()
        }),
        orbit.transform(),
        orbit,
    ));

    commands.spawn((
        Name::new("Key light"),
        DirectionalLight {
            illuminance: 8_000.0,
            ..default()
        },
        Transform::from_xyz(3.0, 6.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let cube = commands
        .spawn((
            Name::new("Placeholder cube"),
            PlaceholderCube,
            Mesh3d(meshes.add(Cuboid::new(1.0, 1.0, 1.0))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(0.0, 1.0, 0.0),
                unlit: true,
                ..default()
            })),
            Transform::default(),
        ))
        .id();
    slots.model = Some(cube);

    info!("Scene ready");
}

/// Feed mouse input into the orbit controller.
///
/// - **Left drag**: orbit
/// - **Right/middle drag**: pan
/// - **Scroll**: zoom
pub fn capture_orbit_input(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut scroll_events: MessageReader<MouseWheel>,
    mut contexts: EguiContexts,
    mut cameras: Query<&mut OrbitController>,
) {
    // Don't steer the camera while dragging or scrolling inside the panel
    let egui_wants = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input() || ctx.is_pointer_over_area())
        .unwrap_or(false);

    let Ok(mut orbit) = cameras.single_mut() else {
        mouse_motion.clear();
        scroll_events.clear();
        return;
    };
    if egui_wants {
        mouse_motion.clear();
        scroll_events.clear();
        return;
    }

    let drag: Vec2 = mouse_motion.read().map(|event| event.delta).sum();
    if mouse_button.pressed(MouseButton::Left) {
        orbit.rotate(-drag * ORBIT_SENSITIVITY);
    } else if mouse_button.pressed(MouseButton::Right) || mouse_button.pressed(MouseButton::Middle) {
        orbit.pan(drag);
    }

    for event in scroll_events.read() {
        let lines = match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y * 0.01,
        };
        orbit.zoom(lines * ZOOM_SENSITIVITY);
    }
}

pub fn apply_orbit_damping(mut cameras: Query<(&mut OrbitController, &mut Transform)>) {
    for (mut orbit, mut transform) in cameras.iter_mut() {
        if orbit.is_settled() {
            continue;
        }
        orbit.step();
        *transform = orbit.transform();
    }
}

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneSlots>()
            .insert_resource(ClearColor(Color::BLACK))
            .add_systems(Startup, setup_scene)
            .add_systems(
                Update,
                (capture_orbit_input, apply_orbit_damping.after(capture_orbit_input)),
            );
    }
}
