//! Persistent floor heat raster.
//!
//! Pixels are premultiplied RGBA in `[0, 1]`. Blobs composite additively so
//! repeated events at one spot intensify; every frame the whole raster fades
//! by a constant fraction whether or not it is shown.

use crate::engine::render::pulse::heat_color;
use crate::engine::systems::view_mode::ViewModes;
use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use constants::coordinate_system::world_to_raster;
use constants::heat_raster::*;

#[derive(Resource, Clone)]
pub struct HeatRaster {
    width: usize,
    height: usize,
    floor_size: f32,
    pixels: Vec<[f32; 4]>,
    lit: bool,
    dirty: bool,
}

impl Default for HeatRaster {
    fn default() -> Self {
        Self::new(HEAT_RASTER_SIZE, HEAT_RASTER_SIZE, HEAT_FLOOR_SIZE)
    }
}

impl HeatRaster {
    pub fn new(width: usize, height: usize, floor_size: f32) -> Self {
        Self {
            width,
            height,
            floor_size,
            pixels: vec![[0.0; 4]; width * height],
            lit: false,
            dirty: true,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Composite a soft radial blob centred on the projected world position.
    /// Radius and colour grow with severity.
    pub fn stamp(&mut self, world_x: f32, world_z: f32, severity: f32) {
        if !world_x.is_finite() || !world_z.is_finite() {
            return;
        }
        let severity = severity.clamp(0.0, 1.0);
        let (cx, cy) = world_to_raster(world_x, world_z, self.floor_size, self.width, self.height);
        let radius = (HEAT_BLOB_BASE_RADIUS + HEAT_BLOB_SEVERITY_RADIUS * severity).floor();
        let colour = heat_color(severity);
        let inner = 1.0_f32;

        let reach = radius as i32;
        // Projections far off the floor saturate at the i32 limits
        let x_range = cx.saturating_sub(reach).max(0)..=cx.saturating_add(reach).min(self.width as i32 - 1);
        let y_range = cy.saturating_sub(reach).max(0)..=cy.saturating_add(reach).min(self.height as i32 - 1);

        for py in y_range {
            for px in x_range.clone() {
                let dx = px as f32 + 0.5 - cx as f32;
                let dy = py as f32 + 0.5 - cy as f32;
                let distance = (dx * dx + dy * dy).sqrt();
                if distance > radius {
                    continue;
                }

                let t = ((distance - inner) / (radius - inner)).clamp(0.0, 1.0);
                let coverage = 1.0 - t;
                let pixel = &mut self.pixels[py as usize * self.width + px as usize];
                pixel[0] = (pixel[0] + colour.red * coverage).min(1.0);
                pixel[1] = (pixel[1] + colour.green * coverage).min(1.0);
                pixel[2] = (pixel[2] + colour.blue * coverage).min(1.0);
                pixel[3] = (pixel[3] + coverage).min(1.0);
            }
        }

        self.lit = true;
        self.dirty = true;
    }

    /// Fade every pixel towards transparent. Values under one 8-bit step are
    /// flushed so the raster reaches exactly zero.
    pub fn decay_step(&mut self) {
        if !self.lit {
            return;
        }

        let keep = 1.0 - HEAT_DECAY_ALPHA;
        let mut lit = false;
        for pixel in &mut self.pixels {
            if pixel[3] == 0.0 {
                continue;
            }
            for channel in pixel.iter_mut() {
                *channel *= keep;
                if *channel < HEAT_ZERO_THRESHOLD {
                    *channel = 0.0;
                }
            }
            if pixel[3] == 0.0 {
                *pixel = [0.0; 4];
            } else {
                lit = true;
            }
        }

        self.lit = lit;
        self.dirty = true;
    }

    /// Premultiplied pixel at `(x, y)`, row 0 at the `+Z` edge.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[f32; 4]> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    pub fn is_transparent(&self) -> bool {
        self.pixels.iter().all(|p| p[3] == 0.0)
    }

    /// Straight-alpha RGBA8 copy for texture upload.
    pub fn to_rgba8(&self) -> Vec<[u8; 4]> {
        self.pixels
            .iter()
            .map(|p| {
                if p[3] <= 0.0 {
                    return [0; 4];
                }
                let unpremultiply = |c: f32| ((c / p[3]).clamp(0.0, 1.0) * 255.0).round() as u8;
                [
                    unpremultiply(p[0]),
                    unpremultiply(p[1]),
                    unpremultiply(p[2]),
                    (p[3].clamp(0.0, 1.0) * 255.0).round() as u8,
                ]
            })
            .collect()
    }

    /// Returns whether the raster changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[derive(Component)]
pub struct HeatFloor;

#[derive(Resource)]
pub struct HeatFloorTexture(pub Handle<Image>);

/// Spawn the hidden floor plane that displays the raster.
pub fn spawn_heat_floor(
    mut commands: Commands,
    raster: Res<HeatRaster>,
    mut images: ResMut<Assets<Image>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let image = Image::new_fill(
        Extent3d {
            width: raster.width() as u32,
            height: raster.height() as u32,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0, 0, 0, 0],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );
    let texture = images.add(image);

    let material = materials.add(StandardMaterial {
        base_color: Color::srgba(1.0, 1.0, 1.0, HEAT_FLOOR_OPACITY),
        base_color_texture: Some(texture.clone()),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        double_sided: true,
        cull_mode: None,
        ..default()
    });

    commands.spawn((
        Mesh3d(meshes.add(create_floor_mesh(HEAT_FLOOR_SIZE))),
        MeshMaterial3d(material),
        Transform::from_xyz(0.0, HEAT_FLOOR_ELEVATION, 0.0),
        Visibility::Hidden,
        HeatFloor,
    ));
    commands.insert_resource(HeatFloorTexture(texture));
}

/// Quad on the XZ plane whose UVs follow the raster layout (V = 0 at `+Z`).
fn create_floor_mesh(size: f32) -> Mesh {
    let half = size * 0.5;
    let positions = vec![
        [-half, 0.0, -half],
        [half, 0.0, -half],
        [half, 0.0, half],
        [-half, 0.0, half],
    ];
    let uvs = vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
    let normals = vec![[0.0, 1.0, 0.0]; 4];

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(vec![0, 2, 1, 0, 3, 2]));
    mesh
}

/// Per-frame fade, independent of visibility.
pub fn decay_heat_raster(mut raster: ResMut<HeatRaster>) {
    raster.decay_step();
}

/// Show or hide the floor and upload the raster while it is visible.
pub fn sync_heat_floor(
    view_modes: Res<ViewModes>,
    texture: Option<Res<HeatFloorTexture>>,
    mut raster: ResMut<HeatRaster>,
    mut images: ResMut<Assets<Image>>,
    mut floors: Query<&mut Visibility, With<HeatFloor>>,
) {
    let target = if view_modes.heatmap {
        Visibility::Visible
    } else {
        Visibility::Hidden
    };
    for mut visibility in &mut floors {
        visibility.set_if_neq(target);
    }

    if !view_modes.heatmap || !raster.take_dirty() {
        return;
    }
    let Some(texture) = texture else {
        return;
    };
    if let Some(image) = images.get_mut(&texture.0) {
        image.data = Some(bytemuck::cast_slice(&raster.to_rgba8()).to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centre_alpha(raster: &HeatRaster) -> f32 {
        raster.pixel(256, 256).unwrap()[3]
    }

    #[test]
    fn stamp_lights_projected_centre() {
        let mut raster = HeatRaster::default();
        raster.stamp(0.0, 0.0, 1.0);
        assert_eq!(centre_alpha(&raster), 1.0);
        // 20 + 40 px radius at full severity, nothing beyond it.
        assert!(raster.pixel(256 + 59, 256).unwrap()[3] > 0.0);
        assert_eq!(raster.pixel(256 + 61, 256).unwrap()[3], 0.0);
        assert_eq!(raster.pixel(0, 0).unwrap()[3], 0.0);
    }

    #[test]
    fn overlapping_stamps_intensify() {
        let mut raster = HeatRaster::default();
        raster.stamp(0.0, 0.0, 0.3);
        let edge_once = raster.pixel(256 + 15, 256).unwrap()[3];
        raster.stamp(0.0, 0.0, 0.3);
        let edge_twice = raster.pixel(256 + 15, 256).unwrap()[3];
        assert!(edge_twice > edge_once);
        assert!(edge_twice <= 1.0);
    }

    #[test]
    fn stamps_off_the_floor_are_clipped() {
        let mut raster = HeatRaster::default();
        raster.stamp(500.0, 500.0, 1.0);
        assert!(raster.is_transparent());
        raster.stamp(99.0, -99.0, 1.0);
        assert!(raster.pixel(511, 511).unwrap()[3] > 0.0);
    }

    #[test]
    fn extreme_positions_are_ignored() {
        let mut raster = HeatRaster::default();
        raster.stamp(f32::MAX, -f32::MAX, 1.0);
        raster.stamp(-1.0e30, 1.0e30, 1.0);
        raster.stamp(f32::NAN, 0.0, 1.0);
        raster.stamp(0.0, f32::INFINITY, 1.0);
        assert!(raster.is_transparent());
    }

    #[test]
    fn decay_converges_to_transparent() {
        let mut raster = HeatRaster::default();
        raster.stamp(10.0, 10.0, 1.0);
        let before = raster.pixel(268, 243).unwrap()[3];
        raster.decay_step();
        assert!(raster.pixel(268, 243).unwrap()[3] < before);

        for _ in 0..400 {
            raster.decay_step();
        }
        assert!(raster.is_transparent());
    }

    #[test]
    fn decay_without_stamps_stays_transparent() {
        let mut raster = HeatRaster::default();
        for _ in 0..10 {
            raster.decay_step();
        }
        assert!(raster.is_transparent());
    }

    #[test]
    fn upload_is_straight_alpha() {
        let mut raster = HeatRaster::new(8, 8, 8.0);
        raster.stamp(0.0, 0.0, 1.0);
        let bytes = raster.to_rgba8();
        let centre = bytes[4 * 8 + 4];
        // Full coverage of the high ramp stop, #ff2d2d.
        assert_eq!(centre, [0xff, 0x2d, 0x2d, 0xff]);
        assert!(raster.take_dirty());
        assert!(!raster.take_dirty());
    }
}
