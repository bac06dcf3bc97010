use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::render::primitives::Aabb;
use bevy::window::PrimaryWindow;
use constants::render_settings::MARKER_RADIUS;

use super::ray::{ray_hits_obb, ray_sphere_hit_t, ray_triangle_hit_t};
use crate::engine::anchors::registry::AnchorRegistry;
use crate::engine::anchors::ModelSurface;
use crate::engine::camera::viewport_camera::{MainCamera, ViewportCamera};
use crate::engine::mesh::triangles::mesh_triangles;
use crate::engine::render::markers::MarkerBuffer;
use crate::tools::selection::{Selection, SelectionChanged, focus_anchor};

/// Nearest marker hit along the ray, as `(slot, t)`. Markers are spheres of
/// radius `MARKER_RADIUS * scale` at their instance translation.
pub fn pick_marker(
    origin: Vec3,
    dir: Vec3,
    instances: impl IntoIterator<Item = (usize, Transform)>,
) -> Option<(usize, f32)> {
    instances
        .into_iter()
        .filter_map(|(index, transform)| {
            let radius = MARKER_RADIUS * transform.scale.max_element();
            ray_sphere_hit_t(origin, dir, transform.translation, radius).map(|t| (index, t))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// First name along `chain` (the hit surface, then its ancestors) that is a
/// registered anchor.
pub fn resolve_anchor<'a>(
    registry: &AnchorRegistry,
    chain: impl IntoIterator<Item = Option<&'a str>>,
) -> Option<usize> {
    chain
        .into_iter()
        .flatten()
        .find_map(|name| registry.lookup(name))
}

/// Nearest hit against one surface: world bounds first, then triangles.
fn surface_hit_t(
    origin: Vec3,
    dir: Vec3,
    xf: &GlobalTransform,
    aabb: &Aabb,
    mesh: Option<&Mesh>,
) -> Option<f32> {
    let min = Vec3::from(aabb.min());
    let max = Vec3::from(aabb.max());
    ray_hits_obb(origin, dir, xf, min, max)?;

    let Some(soup) = mesh.and_then(mesh_triangles) else {
        return None;
    };
    let inv = xf.compute_matrix().inverse();
    let o_local = inv.transform_point3(origin);
    let d_local = inv.transform_vector3(dir);
    soup.triangles()
        .filter_map(|tri| ray_triangle_hit_t(o_local, d_local, tri))
        .min_by(|a, b| a.total_cmp(b))
}

/// Cursor ray through the main camera.
#[derive(SystemParam)]
pub struct CursorRay<'w, 's> {
    windows: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
    cameras: Query<'w, 's, (&'static Camera, &'static GlobalTransform), With<MainCamera>>,
}

impl CursorRay<'_, '_> {
    pub fn ray(&self) -> Option<Ray3d> {
        let window = self.windows.single().ok()?;
        let cursor = window.cursor_position()?;
        let (camera, camera_xf) = self.cameras.single().ok()?;
        camera.viewport_to_world(camera_xf, cursor).ok()
    }
}

/// Model surfaces with what ray tests need.
#[derive(SystemParam)]
pub struct SurfaceHits<'w, 's> {
    surfaces: Query<
        'w,
        's,
        (Entity, &'static GlobalTransform, &'static Aabb, &'static Mesh3d),
        With<ModelSurface>,
    >,
    meshes: Res<'w, Assets<Mesh>>,
}

impl SurfaceHits<'_, '_> {
    /// Nearest surface along the ray as `(entity, t)`.
    pub fn nearest(&self, ray: Ray3d) -> Option<(Entity, f32)> {
        let origin = ray.origin;
        let dir = *ray.direction;
        self.surfaces
            .iter()
            .filter_map(|(entity, xf, aabb, mesh)| {
                surface_hit_t(origin, dir, xf, aabb, self.meshes.get(&mesh.0)).map(|t| (entity, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// World point of the nearest surface hit.
    pub fn nearest_point(&self, ray: Ray3d) -> Option<Vec3> {
        self.nearest(ray).map(|(_, t)| ray.get_point(t))
    }
}

/// Pointer-down picking: markers first, then model surfaces resolved through
/// their names. A hit selects and frames the anchor; a miss leaves the
/// selection untouched. Clicks landing on UI widgets are ignored.
pub fn pick_on_click(
    mouse_button: Res<ButtonInput<MouseButton>>,
    cursor: CursorRay,
    interactions: Query<&Interaction>,
    buffer: Res<MarkerBuffer>,
    registry: Res<AnchorRegistry>,
    surfaces: SurfaceHits,
    names: Query<&Name>,
    parents: Query<&ChildOf>,
    mut selection: ResMut<Selection>,
    mut viewport: ResMut<ViewportCamera>,
    mut changed: EventWriter<SelectionChanged>,
) {
    if !mouse_button.just_pressed(MouseButton::Left) {
        return;
    }
    if interactions.iter().any(|i| *i != Interaction::None) {
        return;
    }
    let Some(ray) = cursor.ray() else {
        return;
    };

    let picked = pick_marker(ray.origin, *ray.direction, buffer.instances())
        .map(|(index, _)| index)
        .or_else(|| {
            let (entity, _) = surfaces.nearest(ray)?;
            let chain = std::iter::once(entity).chain(parents.iter_ancestors(entity));
            resolve_anchor(
                &registry,
                chain.map(|e| names.get(e).ok().map(|name| name.as_str())),
            )
        });

    let Some(index) = picked else {
        return;
    };
    if let Some(event) = focus_anchor(index, &registry, &mut selection, &mut viewport) {
        changed.write(event);
    }
}
