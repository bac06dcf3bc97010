/// Ground plane mapping shared by the heat raster and the floor mesh.
///
/// The plane is centred on the world origin, spans `floor_size` units along
/// X and Z, and raster row 0 lies at `+Z` (texture V grows towards `-Z`).

/// Project a world XZ position onto normalised plane UV coordinates.
/// Values outside `[0, 1]` lie beyond the plane edge.
pub fn world_to_uv(world_x: f32, world_z: f32, floor_size: f32) -> (f32, f32) {
    let half = floor_size * 0.5;
    let u = (world_x + half) / floor_size;
    let v = 1.0 - ((world_z + half) / floor_size);
    (u, v)
}

/// Project a world XZ position onto integer raster pixel coordinates.
pub fn world_to_raster(
    world_x: f32,
    world_z: f32,
    floor_size: f32,
    width: usize,
    height: usize,
) -> (i32, i32) {
    let (u, v) = world_to_uv(world_x, world_z, floor_size);
    (
        (u * width as f32).floor() as i32,
        (v * height as f32).floor() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn origin_maps_to_centre() {
        let (u, v) = world_to_uv(0.0, 0.0, 200.0);
        assert_relative_eq!(u, 0.5);
        assert_relative_eq!(v, 0.5);
        assert_eq!(world_to_raster(0.0, 0.0, 200.0, 512, 512), (256, 256));
    }

    #[test]
    fn positive_z_maps_to_top_rows() {
        assert_eq!(world_to_raster(-100.0, 100.0, 200.0, 512, 512), (0, 0));
        let (_, row) = world_to_raster(0.0, -99.9, 200.0, 512, 512);
        assert_eq!(row, 511);
    }
}
