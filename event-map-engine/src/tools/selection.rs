use bevy::prelude::*;

use crate::engine::anchors::registry::AnchorRegistry;
use crate::engine::camera::viewport_camera::ViewportCamera;

/// At most one selected anchor, by registry index.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct Selection {
    selected: Option<usize>,
}

/// Emitted whenever the selected anchor changes, including deselection.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SelectionChanged {
    pub selected: Option<usize>,
}

impl Selection {
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected == Some(index)
    }

    /// Returns true when the selection actually changed.
    pub fn select(&mut self, index: usize) -> bool {
        let changed = self.selected != Some(index);
        self.selected = Some(index);
        changed
    }

    pub fn deselect(&mut self) -> bool {
        self.selected.take().is_some()
    }
}

/// Select anchor `index` and frame it, whether or not it was already
/// selected. Returns the change event to publish when the selection moved.
pub fn focus_anchor(
    index: usize,
    registry: &AnchorRegistry,
    selection: &mut Selection,
    viewport: &mut ViewportCamera,
) -> Option<SelectionChanged> {
    let anchor = registry.get(index)?;
    viewport.frame_anchor(anchor.world_position);
    selection.select(index).then(|| {
        info!("Selected anchor {}", anchor.name);
        SelectionChanged {
            selected: Some(index),
        }
    })
}

/// Escape clears the selection on native builds; web hosts use RPC.
pub fn deselect_on_escape(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut selection: ResMut<Selection>,
    mut changed: EventWriter<SelectionChanged>,
) {
    if keyboard.just_pressed(KeyCode::Escape) && selection.deselect() {
        info!("Selection cleared");
        changed.write(SelectionChanged { selected: None });
    }
}
