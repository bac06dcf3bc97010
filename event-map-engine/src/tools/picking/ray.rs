use bevy::prelude::*;

/// Ray against an oriented box given as a local-space AABB under `xf`.
/// The returned `t` is measured along the world-space `dir`.
pub fn ray_hits_obb(origin: Vec3, dir: Vec3, xf: &GlobalTransform, min: Vec3, max: Vec3) -> Option<f32> {
    let inv = xf.compute_matrix().inverse();
    let o_local = inv.transform_point3(origin);
    let d_local = inv.transform_vector3(dir);
    ray_aabb_hit_t(o_local, d_local, min, max)
}

// Slab-method ray–AABB intersection, returns Some(t) or None
pub fn ray_aabb_hit_t(ray_origin: Vec3, ray_direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let inv = ray_direction.recip();
    let t1 = (min - ray_origin) * inv;
    let t2 = (max - ray_origin) * inv;

    // NaN from 0 * inf on a slab boundary is ignored by max/min
    let tmin = t1.min(t2).max_element();
    let tmax = t1.max(t2).min_element();

    if tmax < tmin.max(0.0) {
        return None;
    }
    Some(if tmin >= 0.0 { tmin } else { tmax })
}

/// Nearest non-negative hit against a sphere, `dir` need not be unit length.
pub fn ray_sphere_hit_t(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let a = dir.length_squared();
    if a <= f32::EPSILON {
        return None;
    }
    let half_b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = half_b * half_b - a * c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_d = disc.sqrt();
    let near = (-half_b - sqrt_d) / a;
    let far = (-half_b + sqrt_d) / a;
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        Some(far)
    } else {
        None
    }
}

/// Möller–Trumbore, double sided.
pub fn ray_triangle_hit_t(origin: Vec3, dir: Vec3, tri: [Vec3; 3]) -> Option<f32> {
    let edge1 = tri[1] - tri[0];
    let edge2 = tri[2] - tri[0];
    let p = dir.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < 1e-8 {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - tri[0];
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn aabb_hit_from_outside_and_inside() {
        let t = ray_aabb_hit_t(Vec3::new(-5.0, 0.5, 0.5), Vec3::X, Vec3::ZERO, Vec3::ONE).unwrap();
        assert_relative_eq!(t, 5.0);
        let t = ray_aabb_hit_t(Vec3::splat(0.5), Vec3::X, Vec3::ZERO, Vec3::ONE).unwrap();
        assert_relative_eq!(t, 0.5);
        assert!(ray_aabb_hit_t(Vec3::new(-5.0, 3.0, 0.5), Vec3::X, Vec3::ZERO, Vec3::ONE).is_none());
        assert!(ray_aabb_hit_t(Vec3::new(5.0, 0.5, 0.5), Vec3::X, Vec3::ZERO, Vec3::ONE).is_none());
    }

    #[test]
    fn obb_hit_respects_transform() {
        let xf = GlobalTransform::from(Transform::from_xyz(10.0, 0.0, 0.0));
        let hit = ray_hits_obb(Vec3::ZERO, Vec3::X, &xf, Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_relative_eq!(hit.unwrap(), 9.0, epsilon = 1e-5);
    }

    #[test]
    fn sphere_hits_near_side() {
        let t = ray_sphere_hit_t(Vec3::ZERO, Vec3::Z, Vec3::new(0.0, 0.0, 10.0), 2.0).unwrap();
        assert_relative_eq!(t, 8.0, epsilon = 1e-5);
        assert!(ray_sphere_hit_t(Vec3::ZERO, Vec3::Z, Vec3::new(5.0, 0.0, 10.0), 2.0).is_none());
        assert!(ray_sphere_hit_t(Vec3::ZERO, -Vec3::Z, Vec3::new(0.0, 0.0, 10.0), 2.0).is_none());
    }

    #[test]
    fn triangle_hit_inside_only() {
        let tri = [Vec3::new(-1.0, -1.0, 3.0), Vec3::new(1.0, -1.0, 3.0), Vec3::new(0.0, 1.0, 3.0)];
        assert_relative_eq!(ray_triangle_hit_t(Vec3::ZERO, Vec3::Z, tri).unwrap(), 3.0, epsilon = 1e-5);
        assert!(ray_triangle_hit_t(Vec3::new(3.0, 0.0, 0.0), Vec3::Z, tri).is_none());
    }
}
