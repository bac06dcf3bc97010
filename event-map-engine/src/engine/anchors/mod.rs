//! Anchor discovery.
//!
//! When the model scene is ready its hierarchy is walked once, depth first
//! in pre-order from the model root. Nodes named with the configured prefix
//! become anchors; nodes carrying a mesh become model surfaces for picking
//! and x-ray. The model is moved so its bounds are centred on the origin,
//! where the heat floor lies, before anchor positions are recorded. Marker
//! slots are seeded from the anchors as part of the walk.

pub mod registry;

use bevy::prelude::*;
use bevy::render::mesh::MeshAabb;
use bevy::render::primitives::Aabb;

use crate::engine::assets::startup_config::StartupConfig;
use crate::engine::camera::viewport_camera::ViewportCamera;
use crate::engine::events::model::EventModel;
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::render::markers::MarkerBuffer;
use crate::engine::render::pulse::{PulseSettings, marker_transform};
use crate::engine::scene::xray::XRayOverlay;
use registry::{AnchorRegistry, SceneNode};

/// Root entity of the loaded model scene.
#[derive(Component, Debug, Default)]
pub struct ModelRoot;

/// A renderable surface of the model.
#[derive(Component, Debug, Default)]
pub struct ModelSurface;

/// The model finished loading. `root` is `None` when it failed.
#[derive(Event, Debug, Clone, Copy)]
pub struct ModelReady {
    pub root: Option<Entity>,
}

/// The registry has been built with `count` anchors.
#[derive(Event, Debug, Clone, Copy)]
pub struct AnchorsRegistered {
    pub count: usize,
}

/// Result of one walk over the model hierarchy.
#[derive(Debug, Default)]
pub struct SceneWalk {
    /// Named nodes in pre-order.
    pub nodes: Vec<SceneNode>,
    /// Every visited entity with its composed world transform.
    pub transforms: Vec<(Entity, GlobalTransform)>,
}

impl SceneWalk {
    /// Shift every recorded world position and transform by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        let shift = GlobalTransform::from_translation(offset);
        for node in &mut self.nodes {
            node.world_position += offset;
        }
        for (_, global) in &mut self.transforms {
            *global = shift * *global;
        }
    }
}

/// Depth-first pre-order walk composing local transforms on the way down,
/// so world positions are correct before transform propagation has run.
pub fn walk_scene(
    root: Entity,
    children: &Query<&Children>,
    locals: &Query<(Option<&Name>, Option<&Transform>)>,
) -> SceneWalk {
    let mut walk = SceneWalk::default();
    let mut stack = vec![(root, GlobalTransform::IDENTITY)];

    while let Some((entity, parent)) = stack.pop() {
        let (name, local) = locals.get(entity).unwrap_or((None, None));
        let global = parent.mul_transform(local.copied().unwrap_or_default());

        if let Some(name) = name {
            walk.nodes.push(SceneNode {
                entity,
                name: name.as_str().to_string(),
                world_position: global.translation(),
            });
        }
        walk.transforms.push((entity, global));

        // Reversed so the first child is popped first
        if let Ok(kids) = children.get(entity) {
            for i in (0..kids.len()).rev() {
                stack.push((kids[i], global));
            }
        }
    }
    walk
}

fn world_bounds(aabb: &Aabb, global: &GlobalTransform) -> (Vec3, Vec3) {
    let center = Vec3::from(aabb.center);
    let half = Vec3::from(aabb.half_extents);
    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for i in 0..8 {
        let corner = center
            + half
                * Vec3::new(
                    if i & 1 == 0 { -1.0 } else { 1.0 },
                    if i & 2 == 0 { -1.0 } else { 1.0 },
                    if i & 4 == 0 { -1.0 } else { 1.0 },
                );
        let world = global.transform_point(corner);
        min = min.min(world);
        max = max.max(world);
    }
    (min, max)
}

/// World bounds of every mesh surface in the walk.
fn surface_bounds(
    walk: &SceneWalk,
    surfaces: &Query<(&Mesh3d, Option<&MeshMaterial3d<StandardMaterial>>)>,
    meshes: &Assets<Mesh>,
) -> Option<(Vec3, Vec3)> {
    let mut bounds: Option<(Vec3, Vec3)> = None;
    for (entity, global) in &walk.transforms {
        let Ok((mesh, _)) = surfaces.get(*entity) else {
            continue;
        };
        let Some(aabb) = meshes.get(&mesh.0).and_then(|mesh| mesh.compute_aabb()) else {
            continue;
        };
        let (min, max) = world_bounds(&aabb, global);
        bounds = Some(match bounds {
            Some((lo, hi)) => (lo.min(min), hi.max(max)),
            None => (min, max),
        });
    }
    bounds
}

/// Build the registry, seed marker slots, tag surfaces and frame the camera.
/// Waits for the startup config, which the model spawn also waits on.
pub fn build_anchor_registry(
    mut commands: Commands,
    mut ready: EventReader<ModelReady>,
    mut loading_progress: ResMut<LoadingProgress>,
    config: Option<Res<StartupConfig>>,
    pulse: Res<PulseSettings>,
    children: Query<&Children>,
    locals: Query<(Option<&Name>, Option<&Transform>)>,
    surfaces: Query<(&Mesh3d, Option<&MeshMaterial3d<StandardMaterial>>)>,
    meshes: Res<Assets<Mesh>>,
    mut buffer: ResMut<MarkerBuffer>,
    mut overlay: ResMut<XRayOverlay>,
    mut viewport: ResMut<ViewportCamera>,
    mut registered: EventWriter<AnchorsRegistered>,
) {
    let Some(config) = config else {
        return;
    };
    let Some(ModelReady { root }) = ready.read().last().copied() else {
        return;
    };
    if loading_progress.anchors_registered {
        return;
    }

    let mut walk = root
        .map(|root| walk_scene(root, &children, &locals))
        .unwrap_or_default();

    let bounds = surface_bounds(&walk, &surfaces, &meshes);
    if let (Some(root), Some((min, max))) = (root, bounds) {
        let center = (min + max) * 0.5;
        let local = locals
            .get(root)
            .ok()
            .and_then(|(_, local)| local.copied())
            .unwrap_or_default();
        commands
            .entity(root)
            .insert(local.with_translation(local.translation - center));
        walk.translate(-center);
        *viewport = ViewportCamera::with_bounds(min - center, max - center);
        debug!("Model recentred by {:?}", -center);
    }

    let registry = AnchorRegistry::from_nodes(&config.camera_prefix, &walk.nodes);

    // Idle markers sit at the base scale until the first animation frame
    for anchor in registry.iter() {
        buffer.set_instance_transform(
            anchor.index,
            marker_transform(anchor.world_position, pulse.base_scale),
        );
    }
    buffer.set_visible_count(registry.len());

    for (entity, _) in &walk.transforms {
        let Ok((_, material)) = surfaces.get(*entity) else {
            continue;
        };
        commands.entity(*entity).insert(ModelSurface);
        if let Some(material) = material {
            overlay.record_original(*entity, material.0.clone());
        }
    }

    info!(
        "Registered {} anchors with prefix '{}'",
        registry.len(),
        registry.prefix()
    );
    commands.insert_resource(EventModel::with_anchor_count(registry.len()));
    registered.write(AnchorsRegistered {
        count: registry.len(),
    });
    commands.insert_resource(registry);
    loading_progress.anchors_registered = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::ingestion::{
        ConnectionStatus, EventIngestion, start_event_ingestion,
    };

    fn spawn_named(world: &mut World, name: &str, translation: Vec3) -> Entity {
        world
            .spawn((Name::new(name.to_string()), Transform::from_translation(translation)))
            .id()
    }

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .init_asset::<StandardMaterial>()
            .add_event::<ModelReady>()
            .add_event::<AnchorsRegistered>()
            .init_resource::<LoadingProgress>()
            .init_resource::<StartupConfig>()
            .init_resource::<PulseSettings>()
            .init_resource::<MarkerBuffer>()
            .init_resource::<XRayOverlay>()
            .init_resource::<ViewportCamera>()
            .init_resource::<AnchorRegistry>()
            .init_resource::<EventModel>()
            .init_resource::<EventIngestion>()
            .add_systems(Update, (build_anchor_registry, start_event_ingestion).chain());
        app
    }

    #[test]
    fn registers_prefixed_nodes_and_starts_simulating() {
        let mut app = test_app();
        let world = app.world_mut();
        let root = world.spawn((Transform::default(), ModelRoot)).id();
        let site = spawn_named(world, "Site", Vec3::new(10.0, 0.0, 0.0));
        let cam_1 = spawn_named(world, "CCTV_1", Vec3::new(0.0, 3.0, 0.0));
        let cam_2 = spawn_named(world, "CCTV_2", Vec3::new(5.0, 3.0, 0.0));
        let wall = spawn_named(world, "Wall", Vec3::ZERO);
        world.entity_mut(root).add_child(site);
        world.entity_mut(site).add_children(&[cam_1, cam_2, wall]);
        world.send_event(ModelReady { root: Some(root) });

        app.update();

        let registry = app.world().resource::<AnchorRegistry>();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("CCTV_1"), Some(0));
        assert_eq!(registry.lookup("CCTV_2"), Some(1));
        assert_eq!(registry.get(1).unwrap().world_position, Vec3::new(15.0, 3.0, 0.0));

        assert_eq!(app.world().resource::<EventModel>().len(), 2);
        assert_eq!(app.world().resource::<MarkerBuffer>().visible_count(), 2);
        let (marker, _) = app.world().resource::<MarkerBuffer>().instance(0).unwrap();
        assert!((marker.translation.y - 3.2).abs() < 1e-5);

        assert_eq!(
            app.world().resource::<EventIngestion>().status(),
            ConnectionStatus::Simulating
        );
    }

    #[test]
    fn offset_model_is_centred_before_anchors_are_read() {
        use crate::engine::scene::heatmap::HeatRaster;

        let mut app = test_app();
        let mesh = app
            .world_mut()
            .resource_mut::<Assets<Mesh>>()
            .add(Cuboid::new(2.0, 2.0, 2.0));
        let world = app.world_mut();
        let root = world.spawn((Transform::default(), ModelRoot)).id();
        let building = world
            .spawn((Mesh3d(mesh), Transform::from_xyz(500.0, 0.0, 500.0)))
            .id();
        let cam = spawn_named(world, "CCTV_1", Vec3::new(500.0, 3.0, 500.0));
        world.entity_mut(root).add_children(&[building, cam]);
        world.send_event(ModelReady { root: Some(root) });

        app.update();

        let root_xf = app.world().get::<Transform>(root).unwrap();
        assert!(root_xf.translation.abs_diff_eq(Vec3::new(-500.0, 0.0, -500.0), 1e-3));
        assert!(app.world().get::<ModelSurface>(building).is_some());

        let registry = app.world().resource::<AnchorRegistry>();
        let anchor = registry.get(0).unwrap().world_position;
        assert!(anchor.abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), 1e-3));
        assert!(app.world().resource::<ViewportCamera>().focus_point.length() < 1e-3);

        // The centred anchor lands on the floor raster, the raw one would not.
        let mut raster = HeatRaster::default();
        raster.stamp(500.0, 500.0, 1.0);
        assert!(raster.is_transparent());
        raster.stamp(anchor.x, anchor.z, 1.0);
        assert!(!raster.is_transparent());
    }

    #[test]
    fn waits_for_startup_config() {
        let mut app = test_app();
        app.world_mut().remove_resource::<StartupConfig>();
        let world = app.world_mut();
        let root = world.spawn((Transform::default(), ModelRoot)).id();
        let cam = spawn_named(world, "CCTV_1", Vec3::ZERO);
        world.entity_mut(root).add_child(cam);

        app.update();
        assert!(!app.world().resource::<LoadingProgress>().anchors_registered);

        app.insert_resource(StartupConfig::default());
        app.world_mut().send_event(ModelReady { root: Some(root) });
        app.update();
        assert!(app.world().resource::<LoadingProgress>().anchors_registered);
        assert_eq!(app.world().resource::<AnchorRegistry>().len(), 1);
    }

    #[test]
    fn failed_model_leaves_registry_empty() {
        let mut app = test_app();
        app.world_mut().send_event(ModelReady { root: None });
        app.update();

        assert!(app.world().resource::<AnchorRegistry>().is_empty());
        assert_eq!(app.world().resource::<MarkerBuffer>().visible_count(), 0);
        let ingestion = app.world().resource::<EventIngestion>();
        assert_eq!(ingestion.status(), ConnectionStatus::Disabled);
        assert!(!ingestion.is_simulating());
    }
}
