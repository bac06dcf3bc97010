//! Anchor markers.
//!
//! `MarkerBuffer` is the instance buffer the rest of the engine writes to:
//! one transform and color per anchor slot plus a visible count. The sync
//! system mirrors it into marker entities on the overlay render layer, where
//! they are drawn after the scene and so are never hidden by geometry.

use bevy::pbr::NotShadowCaster;
use bevy::prelude::*;
use bevy::render::view::{NoFrustumCulling, RenderLayers};
use constants::render_settings::{MARKER_OPACITY, MARKER_RADIUS, MAX_MARKERS};

/// Render layer drawn by the overlay camera.
pub const MARKER_RENDER_LAYER: usize = 1;

#[derive(Resource, Debug, Clone)]
pub struct MarkerBuffer {
    transforms: Vec<Transform>,
    colors: Vec<Srgba>,
    visible_count: usize,
    capacity: usize,
    dirty: bool,
}

impl Default for MarkerBuffer {
    fn default() -> Self {
        Self::with_capacity(MAX_MARKERS)
    }
}

impl MarkerBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            transforms: Vec::new(),
            colors: Vec::new(),
            visible_count: 0,
            capacity,
            dirty: false,
        }
    }

    fn ensure_slot(&mut self, index: usize) -> bool {
        if index >= self.capacity {
            return false;
        }
        if index >= self.transforms.len() {
            self.transforms.resize(index + 1, Transform::IDENTITY);
            self.colors.resize(index + 1, Srgba::WHITE);
        }
        true
    }

    pub fn set_instance_transform(&mut self, index: usize, transform: Transform) {
        if self.ensure_slot(index) {
            self.transforms[index] = transform;
        }
    }

    pub fn set_instance_color(&mut self, index: usize, color: Srgba) {
        if self.ensure_slot(index) {
            self.colors[index] = color;
        }
    }

    pub fn set_visible_count(&mut self, count: usize) {
        let count = count.min(self.capacity);
        if count > 0 {
            self.ensure_slot(count - 1);
        }
        self.visible_count = count;
        self.dirty = true;
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Slot contents, `None` beyond the visible count.
    pub fn instance(&self, index: usize) -> Option<(Transform, Srgba)> {
        (index < self.visible_count).then(|| (self.transforms[index], self.colors[index]))
    }

    pub fn instances(&self) -> impl Iterator<Item = (usize, Transform)> + '_ {
        self.transforms[..self.visible_count]
            .iter()
            .copied()
            .enumerate()
    }
}

/// Runtime marker appearance.
#[derive(Resource, Debug, Clone)]
pub struct MarkerSettings {
    pub opacity: f32,
}

impl Default for MarkerSettings {
    fn default() -> Self {
        Self {
            opacity: MARKER_OPACITY,
        }
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct AnchorMarker {
    pub index: usize,
}

#[derive(Resource)]
pub struct MarkerAssets {
    pub mesh: Handle<Mesh>,
}

pub fn setup_marker_assets(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>) {
    let mesh = meshes.add(Sphere::new(MARKER_RADIUS).mesh().uv(24, 24));
    commands.insert_resource(MarkerAssets { mesh });
}

/// Mirror the instance buffer into marker entities, spawning and despawning
/// to match the visible count.
pub fn sync_marker_instances(
    mut commands: Commands,
    mut buffer: ResMut<MarkerBuffer>,
    settings: Res<MarkerSettings>,
    marker_assets: Option<Res<MarkerAssets>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut markers: Query<(
        Entity,
        &AnchorMarker,
        &mut Transform,
        &MeshMaterial3d<StandardMaterial>,
    )>,
) {
    if !buffer.take_dirty() && !settings.is_changed() {
        return;
    }

    let mut present = vec![false; buffer.visible_count()];
    for (entity, marker, mut transform, material) in &mut markers {
        let Some((instance_transform, color)) = buffer.instance(marker.index) else {
            commands.entity(entity).despawn();
            continue;
        };
        present[marker.index] = true;
        *transform = instance_transform;
        if let Some(material) = materials.get_mut(&material.0) {
            material.base_color = Color::Srgba(color.with_alpha(settings.opacity));
        }
    }

    let Some(marker_assets) = marker_assets else {
        return;
    };
    for (index, _) in present.iter().enumerate().filter(|(_, seen)| !**seen) {
        let Some((transform, color)) = buffer.instance(index) else {
            continue;
        };
        let material = materials.add(StandardMaterial {
            base_color: Color::Srgba(color.with_alpha(settings.opacity)),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        });
        commands.spawn((
            Mesh3d(marker_assets.mesh.clone()),
            MeshMaterial3d(material),
            transform,
            AnchorMarker { index },
            NotShadowCaster,
            NoFrustumCulling,
            RenderLayers::layer(MARKER_RENDER_LAYER),
        ));
    }
}
