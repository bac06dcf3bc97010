use bevy::input::mouse::MouseScrollUnit;
use bevy::math::EulerRot;
use bevy::{
    input::mouse::{MouseMotion, MouseWheel},
    prelude::*,
};

use crate::engine::anchors::registry::AnchorRegistry;
use crate::tools::picking::targeting::PointerTarget;
use crate::tools::selection::{Selection, SelectionChanged, focus_anchor};

/// Distance kept between the camera and a framed anchor.
pub const FRAME_ANCHOR_DISTANCE: f32 = 18.0;

/// Closest the orbit may get to its focus point.
pub const MIN_ORBIT_DISTANCE: f32 = 0.05;

/// Focus offset used when the orbit centre is pulled onto the camera.
const EYE_FOCUS_DISTANCE: f32 = 0.1;

/// Focus offset used by `Z` when nothing has been hovered yet.
const AHEAD_FOCUS_DISTANCE: f32 = 5.0;

/// Overview eye position as a fraction of the model diagonal.
const OVERVIEW_OFFSET: Vec3 = Vec3::new(0.25, 0.22, 0.28);

const MAX_PITCH: f32 = 1.55;

/// The main scene camera. Marker overlay cameras parent to it.
#[derive(Component)]
pub struct MainCamera;

#[derive(Resource, Debug, Clone)]
pub struct ViewportCamera {
    pub focus_point: Vec3,
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub home_focus: Vec3,
    pub home_distance: f32,
    /// Diagonal of the loaded model's bounds, if a model was framed.
    pub model_size: Option<f32>,
}

impl ViewportCamera {
    pub fn new(focus_point: Vec3, distance: f32) -> Self {
        Self {
            focus_point,
            distance,
            pitch: -0.6,
            yaw: 0.0,
            home_focus: focus_point,
            home_distance: distance,
            model_size: None,
        }
    }

    /// Frame a bounding box and make it the reset target.
    pub fn with_bounds(min: Vec3, max: Vec3) -> Self {
        let center = (min + max) * 0.5;
        let size = (max - min).length();
        let radius = (size * 0.5).max(1.0);
        Self {
            model_size: Some(size),
            ..Self::new(center, radius * 2.2)
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// World position implied by focus, distance and orientation.
    pub fn eye(&self) -> Vec3 {
        self.focus_point + self.rotation() * Vec3::new(0.0, 0.0, self.distance)
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Z
    }

    pub fn frame(&mut self, target: Vec3, distance: f32) {
        self.focus_point = target;
        self.distance = distance.max(1.0);
    }

    pub fn frame_anchor(&mut self, position: Vec3) {
        self.frame(position, FRAME_ANCHOR_DISTANCE);
    }

    /// Orbit `target` from `eye`, deriving distance and orientation.
    pub fn look_from(&mut self, eye: Vec3, target: Vec3) {
        let offset = eye - target;
        let distance = offset.length();
        self.focus_point = target;
        if distance < f32::EPSILON {
            self.distance = MIN_ORBIT_DISTANCE;
            return;
        }
        self.distance = distance.max(MIN_ORBIT_DISTANCE);
        self.pitch = (-offset.y / distance).clamp(-1.0, 1.0).asin().clamp(-MAX_PITCH, MAX_PITCH);
        self.yaw = offset.x.atan2(offset.z);
    }

    /// Move the orbit centre to `point` without moving the camera.
    pub fn retarget(&mut self, point: Vec3) {
        let eye = self.eye();
        self.look_from(eye, point);
    }

    /// Orbit centre just ahead of the camera, so rotation turns the view
    /// in place.
    pub fn focus_ahead(&mut self, distance: f32) {
        let eye = self.eye();
        self.focus_point = eye + self.forward() * distance;
        self.distance = distance;
    }

    /// Wide view of the whole model. Returns false when no model is framed.
    pub fn overview(&mut self) -> bool {
        let Some(size) = self.model_size else {
            return false;
        };
        let home = self.home_focus;
        self.look_from(home + OVERVIEW_OFFSET * size, home);
        true
    }

    pub fn reset(&mut self) {
        self.focus_point = self.home_focus;
        self.distance = self.home_distance;
        self.pitch = -0.6;
        self.yaw = 0.0;
    }
}

impl Default for ViewportCamera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 120.0)
    }
}

pub fn camera_controller(
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
    mut maps_camera: ResMut<ViewportCamera>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
) {
    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();

    // Right drag orbits around the focus point
    if mouse_button.pressed(MouseButton::Right) && mouse_delta != Vec2::ZERO {
        let yaw_sens = 0.0035;
        let pitch_sens = 0.0030;
        maps_camera.yaw += -mouse_delta.x * yaw_sens;
        maps_camera.pitch += -mouse_delta.y * pitch_sens;
        maps_camera.pitch = maps_camera.pitch.clamp(-MAX_PITCH, MAX_PITCH);
    }

    let mut scroll_accum = 0.0;
    for ev in scroll_events.read() {
        scroll_accum += match ev.unit {
            MouseScrollUnit::Line => ev.y * 1.0,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        };
    }

    if scroll_accum.abs() > f32::EPSILON {
        let dolly_speed = (maps_camera.distance * 0.1).clamp(0.05, 200.0);
        maps_camera.distance =
            (maps_camera.distance - scroll_accum * dolly_speed).max(MIN_ORBIT_DISTANCE);
    }

    let mut move_input = Vec3::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        move_input.z -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        move_input.z += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        move_input.x += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        move_input.x -= 1.0;
    }

    if move_input != Vec3::ZERO {
        // Pan on the ground plane relative to the current heading
        let heading = Quat::from_rotation_y(maps_camera.yaw);
        let world_delta = heading * move_input;

        let mut speed = (maps_camera.distance * 0.8).clamp(2.0, 200.0);
        if keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]) {
            speed *= 3.5;
        }
        if keyboard.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]) {
            speed *= 0.25;
        }
        maps_camera.focus_point += world_delta.normalize() * speed * time.delta_secs();
    }

    let target_rot = maps_camera.rotation();
    let target_pos = maps_camera.eye();

    let lerp_speed = (12.0 * time.delta_secs()).min(1.0);
    camera_transform.translation = camera_transform.translation.lerp(target_pos, lerp_speed);
    camera_transform.rotation = camera_transform.rotation.slerp(target_rot, lerp_speed);
}

/// Navigation keys:
/// - `F` frames the selected anchor, selecting the one nearest the focus
///   point first when nothing is selected.
/// - `R` returns to the model framing and `E` to a wide overview.
/// - `C` pulls the orbit centre onto the camera.
/// - `Z` orbits the last surface point under the pointer.
pub fn camera_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    registry: Res<AnchorRegistry>,
    pointer: Res<PointerTarget>,
    mut maps_camera: ResMut<ViewportCamera>,
    mut selection: ResMut<Selection>,
    mut changed: EventWriter<SelectionChanged>,
) {
    if keyboard.just_pressed(KeyCode::KeyR) {
        maps_camera.reset();
    }

    if keyboard.just_pressed(KeyCode::KeyE) && !maps_camera.overview() {
        debug!("No model to overview");
    }

    if keyboard.just_pressed(KeyCode::KeyC) {
        maps_camera.focus_ahead(EYE_FOCUS_DISTANCE);
    }

    if keyboard.just_pressed(KeyCode::KeyZ) {
        match pointer.last_hit {
            Some(point) => maps_camera.retarget(point),
            None => maps_camera.focus_ahead(AHEAD_FOCUS_DISTANCE),
        }
    }

    if keyboard.just_pressed(KeyCode::KeyF) {
        let target = selection
            .selected()
            .or_else(|| registry.nearest_to(maps_camera.focus_point));
        let Some(index) = target else {
            return;
        };
        if let Some(event) = focus_anchor(index, &registry, &mut selection, &mut maps_camera) {
            changed.write(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn eye_sits_distance_away_from_focus() {
        let camera = ViewportCamera::new(Vec3::new(5.0, 0.0, -3.0), 40.0);
        assert_relative_eq!(camera.eye().distance(camera.focus_point), 40.0, epsilon = 1e-3);
    }

    #[test]
    fn retarget_keeps_the_eye_in_place() {
        let mut camera = ViewportCamera::new(Vec3::ZERO, 30.0);
        camera.yaw = 0.7;
        let eye = camera.eye();

        let point = Vec3::new(4.0, -2.0, 6.0);
        camera.retarget(point);
        assert_eq!(camera.focus_point, point);
        assert_relative_eq!(camera.distance, eye.distance(point), epsilon = 1e-4);
        assert!(camera.eye().abs_diff_eq(eye, 1e-3));
    }

    #[test]
    fn focus_ahead_turns_in_place() {
        let mut camera = ViewportCamera::new(Vec3::new(3.0, 1.0, 0.0), 25.0);
        let eye = camera.eye();
        camera.focus_ahead(0.1);
        assert_relative_eq!(camera.distance, 0.1);
        assert!(camera.eye().abs_diff_eq(eye, 1e-3));
        assert!(camera.focus_point.distance(eye) < 0.11);
    }

    #[test]
    fn overview_needs_a_framed_model() {
        let mut camera = ViewportCamera::default();
        assert!(!camera.overview());

        let mut camera = ViewportCamera::with_bounds(Vec3::splat(-10.0), Vec3::splat(10.0));
        let size = camera.model_size.unwrap();
        assert!(camera.overview());
        assert_eq!(camera.focus_point, Vec3::ZERO);
        assert!(camera.eye().abs_diff_eq(Vec3::new(0.25, 0.22, 0.28) * size, 1e-2));
    }

    #[test]
    fn reset_restores_home_framing() {
        let mut camera = ViewportCamera::with_bounds(Vec3::splat(-10.0), Vec3::splat(10.0));
        let home = camera.focus_point;
        camera.frame(Vec3::new(50.0, 1.0, 50.0), 0.2);
        assert_eq!(camera.distance, 1.0);
        camera.yaw = 2.0;
        camera.reset();
        assert_eq!(camera.focus_point, home);
        assert_eq!(camera.yaw, 0.0);
    }
}
