use bevy::prelude::*;

/// Toggleable whole-scene display modes.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewModes {
    pub xray: bool,
    pub heatmap: bool,
}

impl ViewModes {
    pub fn toggle_xray(&mut self) -> bool {
        self.xray = !self.xray;
        self.xray
    }

    pub fn toggle_heatmap(&mut self) -> bool {
        self.heatmap = !self.heatmap;
        self.heatmap
    }
}

/// Keyboard toggles for view modes.
/// Web builds change `ViewModes` through RPC, so only change logging runs there.
pub fn view_mode_system(
    mut view_modes: ResMut<ViewModes>,
    #[cfg(not(target_arch = "wasm32"))] keyboard: Res<ButtonInput<KeyCode>>,
) {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if keyboard.just_pressed(KeyCode::KeyH) {
            let enabled = view_modes.toggle_heatmap();
            info!("Heatmap: {}", if enabled { "on" } else { "off" });
        }

        if keyboard.just_pressed(KeyCode::KeyX) {
            let enabled = view_modes.toggle_xray();
            info!("X-ray: {}", if enabled { "on" } else { "off" });
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        if view_modes.is_changed() && !view_modes.is_added() {
            info!("View modes changed to: {:?}", *view_modes);
        }
    }
}
