//! Ray casting against the simple volumes the garden needs.

use glam::{Quat, Vec2, Vec3};

/// A half-line in world space. `direction` is normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray through normalized device coordinates (`-1..=1`, +y up) of a
    /// perspective camera looking down its local -Z.
    pub fn from_camera(position: Vec3, rotation: Quat, fov_y: f32, aspect: f32, ndc: Vec2) -> Self {
        let half_height = (fov_y / 2.0).tan();
        let local = Vec3::new(ndc.x * half_height * aspect, ndc.y * half_height, -1.0);
        Self::new(position, rotation * local)
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance to the horizontal plane at height `y`, if hit in front.
    pub fn intersect_plane_y(&self, y: f32) -> Option<f32> {
        if self.direction.y.abs() < f32::EPSILON {
            return None;
        }
        let t = (y - self.origin.y) / self.direction.y;
        (t >= 0.0).then_some(t)
    }

    /// Distance to the nearest front-facing hit on a sphere.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sqrt = disc.sqrt();
        let near = -b - sqrt;
        let far = -b + sqrt;
        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            // Origin is inside the sphere
            Some(0.0)
        } else {
            None
        }
    }

    /// Distance to a capped, upright cylinder spanning `base.y..base.y + height`.
    pub fn intersect_vertical_cylinder(&self, base: Vec3, radius: f32, height: f32) -> Option<f32> {
        let top = base.y + height;
        let within_height = |t: f32| {
            let y = self.at(t).y;
            y >= base.y && y <= top
        };
        let within_radius = |t: f32| {
            let p = self.at(t);
            Vec2::new(p.x - base.x, p.z - base.z).length_squared() <= radius * radius
        };

        let mut best: Option<f32> = None;
        let mut consider = |t: f32| {
            if t >= 0.0 && best.map_or(true, |b| t < b) {
                best = Some(t);
            }
        };

        // Side wall
        let d = Vec2::new(self.direction.x, self.direction.z);
        let o = Vec2::new(self.origin.x - base.x, self.origin.z - base.z);
        let a = d.length_squared();
        if a > f32::EPSILON {
            let b = o.dot(d);
            let c = o.length_squared() - radius * radius;
            let disc = b * b - a * c;
            if disc >= 0.0 {
                let sqrt = disc.sqrt();
                for t in [(-b - sqrt) / a, (-b + sqrt) / a] {
                    if within_height(t) {
                        consider(t);
                    }
                }
            }
        }

        // Caps
        for y in [base.y, top] {
            if let Some(t) = self.intersect_plane_y(y) {
                if within_radius(t) {
                    consider(t);
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_plane_hit_from_above() {
        let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        let t = ray.intersect_plane_y(0.0).unwrap();
        let p = ray.at(t);
        assert!(p.y.abs() < 1e-5);
        assert!((p.x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_plane_miss_when_looking_up_or_parallel() {
        let up = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::Y);
        assert_eq!(up.intersect_plane_y(0.0), None);
        let flat = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::X);
        assert_eq!(flat.intersect_plane_y(0.0), None);
    }

    #[test]
    fn test_sphere_hit_and_miss() {
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let t = ray.intersect_sphere(Vec3::new(0.0, 0.0, -10.0), 2.0).unwrap();
        assert!((t - 8.0).abs() < 1e-5);
        assert_eq!(ray.intersect_sphere(Vec3::new(5.0, 0.0, -10.0), 2.0), None);
        assert_eq!(ray.intersect_sphere(Vec3::new(0.0, 0.0, 10.0), 2.0), None);
    }

    #[test]
    fn test_cylinder_side_and_cap() {
        let side = Ray::new(Vec3::new(-10.0, 1.0, 0.0), Vec3::X);
        let t = side.intersect_vertical_cylinder(Vec3::ZERO, 0.5, 3.0).unwrap();
        assert!((t - 9.5).abs() < 1e-5);

        let top = Ray::new(Vec3::new(0.1, 10.0, 0.0), Vec3::NEG_Y);
        let t = top.intersect_vertical_cylinder(Vec3::ZERO, 0.5, 3.0).unwrap();
        assert!((t - 7.0).abs() < 1e-5);

        let over = Ray::new(Vec3::new(-10.0, 4.0, 0.0), Vec3::X);
        assert_eq!(over.intersect_vertical_cylinder(Vec3::ZERO, 0.5, 3.0), None);
    }

    #[test]
    fn test_camera_ray_center_looks_forward() {
        let ray = Ray::from_camera(Vec3::ZERO, Quat::IDENTITY, FRAC_PI_2, 1.5, Vec2::ZERO);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-6);

        let turned = Ray::from_camera(
            Vec3::ZERO,
            Quat::from_rotation_y(FRAC_PI_2),
            FRAC_PI_2,
            1.0,
            Vec2::ZERO,
        );
        assert!((turned.direction - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_camera_ray_corner_spreads_by_fov() {
        // 90 degree vertical fov: top edge is 45 degrees up
        let ray = Ray::from_camera(Vec3::ZERO, Quat::IDENTITY, FRAC_PI_2, 1.0, Vec2::new(0.0, 1.0));
        assert!((ray.direction.y - ray.direction.z.abs()).abs() < 1e-5);
    }
}
