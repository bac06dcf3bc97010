//! Reversible see-through mode.
//!
//! While active every model surface renders with a translucent copy of its
//! original material and a companion crease-edge wireframe. The side table
//! owns the override materials and companions; deactivation restores the
//! original handles and releases everything it created, so nothing carries
//! over between toggle cycles.

use bevy::pbr::NotShadowCaster;
use bevy::prelude::*;
use constants::render_settings::{
    XRAY_EDGE_COLOR, XRAY_EDGE_OPACITY, XRAY_EDGE_THRESHOLD_DEG, XRAY_FALLBACK_COLOR,
    XRAY_OPACITY, hex_to_rgb,
};
use std::collections::HashMap;

use crate::engine::anchors::ModelSurface;
use crate::engine::mesh::edges::{crease_edges, edge_line_mesh};
use crate::engine::mesh::triangles::mesh_triangles;
use crate::engine::systems::view_mode::ViewModes;

/// Wireframe spawned for a surface while x-ray is active.
#[derive(Component, Debug, Clone, Copy)]
pub struct XRayCompanion {
    pub source: Entity,
}

#[derive(Debug, Clone)]
struct XRayEntry {
    original: Handle<StandardMaterial>,
    override_material: Handle<StandardMaterial>,
    companion: Option<Entity>,
    edge_mesh: Option<Handle<Mesh>>,
    edge_material: Option<Handle<StandardMaterial>>,
}

#[derive(Resource, Debug, Default)]
pub struct XRayOverlay {
    active: bool,
    entries: HashMap<Entity, XRayEntry>,
    originals: HashMap<Entity, Handle<StandardMaterial>>,
}

fn rgb(hex: u32) -> Color {
    let [r, g, b] = hex_to_rgb(hex);
    Color::srgb(r, g, b)
}

impl XRayOverlay {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Remember a surface's material as loaded, restored on deactivation.
    pub fn record_original(&mut self, surface: Entity, material: Handle<StandardMaterial>) {
        self.originals.entry(surface).or_insert(material);
    }

    fn override_for(
        &self,
        original: &Handle<StandardMaterial>,
        materials: &Assets<StandardMaterial>,
    ) -> StandardMaterial {
        let mut material = materials.get(original).cloned().unwrap_or_else(|| StandardMaterial {
            base_color: rgb(XRAY_FALLBACK_COLOR),
            ..default()
        });
        material.base_color = material.base_color.with_alpha(XRAY_OPACITY);
        material.alpha_mode = AlphaMode::Blend;
        material.double_sided = true;
        material.cull_mode = None;
        material
    }

    pub fn activate<'a>(
        &mut self,
        commands: &mut Commands,
        surfaces: impl IntoIterator<
            Item = (
                Entity,
                &'a Mesh3d,
                &'a MeshMaterial3d<StandardMaterial>,
                &'a GlobalTransform,
            ),
        >,
        meshes: &mut Assets<Mesh>,
        materials: &mut Assets<StandardMaterial>,
    ) {
        if self.active {
            return;
        }
        self.active = true;

        for (entity, mesh, material, global) in surfaces {
            let original = self
                .originals
                .get(&entity)
                .cloned()
                .unwrap_or_else(|| material.0.clone());
            let translucent = self.override_for(&original, materials);
            let override_material = materials.add(translucent);
            commands
                .entity(entity)
                .insert(MeshMaterial3d(override_material.clone()));

            let segments = meshes
                .get(&mesh.0)
                .and_then(mesh_triangles)
                .map(|soup| crease_edges(&soup, XRAY_EDGE_THRESHOLD_DEG))
                .unwrap_or_default();

            let mut entry = XRayEntry {
                original,
                override_material,
                companion: None,
                edge_mesh: None,
                edge_material: None,
            };

            if !segments.is_empty() {
                let edge_mesh = meshes.add(edge_line_mesh(&segments));
                let edge_material = materials.add(StandardMaterial {
                    base_color: rgb(XRAY_EDGE_COLOR).with_alpha(XRAY_EDGE_OPACITY),
                    alpha_mode: AlphaMode::Blend,
                    unlit: true,
                    ..default()
                });
                let companion = commands
                    .spawn((
                        Mesh3d(edge_mesh.clone()),
                        MeshMaterial3d(edge_material.clone()),
                        global.compute_transform(),
                        XRayCompanion { source: entity },
                        NotShadowCaster,
                    ))
                    .id();
                entry.companion = Some(companion);
                entry.edge_mesh = Some(edge_mesh);
                entry.edge_material = Some(edge_material);
            }

            self.entries.insert(entity, entry);
        }
        info!("X-ray enabled for {} surfaces", self.entries.len());
    }

    pub fn deactivate(
        &mut self,
        commands: &mut Commands,
        meshes: &mut Assets<Mesh>,
        materials: &mut Assets<StandardMaterial>,
    ) {
        if !self.active {
            return;
        }
        self.active = false;

        for (entity, entry) in self.entries.drain() {
            if let Ok(mut surface) = commands.get_entity(entity) {
                surface.insert(MeshMaterial3d(entry.original));
            }
            if let Some(companion) = entry.companion {
                commands.entity(companion).despawn();
            }
            if let Some(edge_mesh) = entry.edge_mesh {
                meshes.remove(&edge_mesh);
            }
            if let Some(edge_material) = entry.edge_material {
                materials.remove(&edge_material);
            }
            materials.remove(&entry.override_material);
        }
        info!("X-ray disabled");
    }
}

/// Bring the overlay in line with the requested view mode.
pub fn apply_xray_mode(
    mut commands: Commands,
    view_modes: Res<ViewModes>,
    mut overlay: ResMut<XRayOverlay>,
    surfaces: Query<
        (
            Entity,
            &Mesh3d,
            &MeshMaterial3d<StandardMaterial>,
            &GlobalTransform,
        ),
        With<ModelSurface>,
    >,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    match (view_modes.xray, overlay.is_active()) {
        (true, false) => overlay.activate(&mut commands, &surfaces, &mut meshes, &mut materials),
        (false, true) => overlay.deactivate(&mut commands, &mut meshes, &mut materials),
        _ => {}
    }
}

/// Companions follow their surface's world transform every frame.
pub fn sync_xray_companions(
    overlay: Res<XRayOverlay>,
    sources: Query<&GlobalTransform, With<ModelSurface>>,
    mut companions: Query<(&XRayCompanion, &mut Transform)>,
) {
    if !overlay.is_active() {
        return;
    }
    for (companion, mut transform) in &mut companions {
        if let Ok(global) = sources.get(companion.source) {
            *transform = global.compute_transform();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .init_asset::<StandardMaterial>()
            .init_resource::<ViewModes>()
            .init_resource::<XRayOverlay>()
            .add_systems(Update, (apply_xray_mode, sync_xray_companions).chain());
        app
    }

    fn spawn_surface(app: &mut App, position: Vec3) -> (Entity, Handle<StandardMaterial>) {
        let world = app.world_mut();
        let mesh = world
            .resource_mut::<Assets<Mesh>>()
            .add(Mesh::from(Cuboid::new(1.0, 1.0, 1.0)));
        let material = world
            .resource_mut::<Assets<StandardMaterial>>()
            .add(StandardMaterial::default());
        let entity = world
            .spawn((
                Mesh3d(mesh),
                MeshMaterial3d(material.clone()),
                Transform::from_translation(position),
                GlobalTransform::from_translation(position),
                ModelSurface,
            ))
            .id();
        world
            .resource_mut::<XRayOverlay>()
            .record_original(entity, material.clone());
        (entity, material)
    }

    fn companion_count(app: &mut App) -> usize {
        let mut query = app.world_mut().query::<&XRayCompanion>();
        query.iter(app.world()).count()
    }

    fn surface_material(app: &App, entity: Entity) -> Handle<StandardMaterial> {
        app.world()
            .entity(entity)
            .get::<MeshMaterial3d<StandardMaterial>>()
            .unwrap()
            .0
            .clone()
    }

    #[test]
    fn activate_then_deactivate_restores_materials() {
        let mut app = test_app();
        let (a, a_material) = spawn_surface(&mut app, Vec3::ZERO);
        let (b, b_material) = spawn_surface(&mut app, Vec3::new(5.0, 0.0, 0.0));
        let baseline_materials = app.world().resource::<Assets<StandardMaterial>>().len();
        let baseline_meshes = app.world().resource::<Assets<Mesh>>().len();

        app.world_mut().resource_mut::<ViewModes>().xray = true;
        app.update();

        assert!(app.world().resource::<XRayOverlay>().is_active());
        assert_eq!(companion_count(&mut app), 2);
        assert_ne!(surface_material(&app, a), a_material);
        let override_handle = surface_material(&app, a);
        let override_material = app
            .world()
            .resource::<Assets<StandardMaterial>>()
            .get(&override_handle)
            .unwrap();
        assert_eq!(override_material.alpha_mode, AlphaMode::Blend);
        assert!(override_material.double_sided);
        assert!((override_material.base_color.alpha() - XRAY_OPACITY).abs() < 1e-6);

        app.world_mut().resource_mut::<ViewModes>().xray = false;
        app.update();

        assert!(!app.world().resource::<XRayOverlay>().is_active());
        assert_eq!(app.world().resource::<XRayOverlay>().entry_count(), 0);
        assert_eq!(companion_count(&mut app), 0);
        assert_eq!(surface_material(&app, a), a_material);
        assert_eq!(surface_material(&app, b), b_material);
        assert_eq!(
            app.world().resource::<Assets<StandardMaterial>>().len(),
            baseline_materials
        );
        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), baseline_meshes);
    }

    #[test]
    fn activation_is_idempotent() {
        let mut app = test_app();
        spawn_surface(&mut app, Vec3::ZERO);
        app.world_mut().resource_mut::<ViewModes>().xray = true;
        app.update();
        app.update();
        assert_eq!(companion_count(&mut app), 1);
        assert_eq!(app.world().resource::<XRayOverlay>().entry_count(), 1);
    }

    #[test]
    fn companions_track_moving_surfaces() {
        let mut app = test_app();
        let (surface, _) = spawn_surface(&mut app, Vec3::ZERO);
        app.world_mut().resource_mut::<ViewModes>().xray = true;
        app.update();

        let moved = Vec3::new(0.0, 3.0, -2.0);
        *app.world_mut().get_mut::<GlobalTransform>(surface).unwrap() =
            GlobalTransform::from_translation(moved);
        app.update();

        let mut query = app.world_mut().query::<(&XRayCompanion, &Transform)>();
        let (_, transform) = query.single(app.world()).unwrap();
        assert_eq!(transform.translation, moved);
    }
}
