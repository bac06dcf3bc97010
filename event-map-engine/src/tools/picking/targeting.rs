use bevy::prelude::*;
use bevy::window::CursorMoved;

use super::picker::{CursorRay, SurfaceHits};
use crate::engine::camera::viewport_camera::ViewportCamera;

/// Two left presses closer than this count as a double click.
pub const DOUBLE_CLICK_SECS: f64 = 0.3;

/// Pointer state used to move the orbit centre onto the model.
#[derive(Resource, Debug, Default, Clone)]
pub struct PointerTarget {
    /// Last model surface point under the pointer.
    pub last_hit: Option<Vec3>,
    last_press: Option<f64>,
}

impl PointerTarget {
    /// Record a press at `now` seconds. Returns true when it completes a
    /// double click; the pair is then consumed.
    pub fn register_press(&mut self, now: f64) -> bool {
        let double = self
            .last_press
            .is_some_and(|previous| (0.0..=DOUBLE_CLICK_SECS).contains(&(now - previous)));
        self.last_press = if double { None } else { Some(now) };
        double
    }
}

/// Remember the surface point under the pointer whenever it moves.
pub fn track_pointer_hit(
    mut moved: EventReader<CursorMoved>,
    cursor: CursorRay,
    surfaces: SurfaceHits,
    mut pointer: ResMut<PointerTarget>,
) {
    if moved.read().count() == 0 {
        return;
    }
    let Some(ray) = cursor.ray() else {
        return;
    };
    if let Some(point) = surfaces.nearest_point(ray) {
        pointer.last_hit = Some(point);
    }
}

/// Double click on the model orbits around the clicked point.
pub fn retarget_on_double_click(
    time: Res<Time>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    interactions: Query<&Interaction>,
    cursor: CursorRay,
    surfaces: SurfaceHits,
    mut pointer: ResMut<PointerTarget>,
    mut viewport: ResMut<ViewportCamera>,
) {
    if !mouse_button.just_pressed(MouseButton::Left) {
        return;
    }
    if interactions.iter().any(|i| *i != Interaction::None) {
        return;
    }
    if !pointer.register_press(time.elapsed_secs_f64()) {
        return;
    }
    let Some(point) = cursor.ray().and_then(|ray| surfaces.nearest_point(ray)) else {
        return;
    };
    debug!("Orbit centre moved to {:?}", point);
    pointer.last_hit = Some(point);
    viewport.retarget(point);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presses_pair_into_double_clicks() {
        let mut pointer = PointerTarget::default();
        assert!(!pointer.register_press(1.0));
        assert!(pointer.register_press(1.2));
        // A third quick press starts a new pair.
        assert!(!pointer.register_press(1.3));
        assert!(!pointer.register_press(2.0));
        assert!(pointer.register_press(2.25));
    }

    #[test]
    fn slow_presses_are_single_clicks() {
        let mut pointer = PointerTarget::default();
        assert!(!pointer.register_press(0.0));
        assert!(!pointer.register_press(0.5));
        assert!(!pointer.register_press(1.0));
    }
}
