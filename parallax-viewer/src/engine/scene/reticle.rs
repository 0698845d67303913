use bevy::prelude::*;

use constants::render_settings::{
    FLOOR_GRID_COLOUR, HIT_MARKER_COLOUR, HIT_MARKER_RADIUS, WALL_GRID_COLOUR,
};

use crate::engine::camera::head_tracked_camera::{CurrentProjection, HeadTrackedCamera};
use crate::engine::camera::projection::FrustumBounds;
use crate::engine::settings::ViewerSettings;

/// Local plane a proxy occupies: floors lie in XZ, walls in XY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyPlane {
    Floor,
    Wall,
}

impl ProxyPlane {
    fn local_normal(self) -> Dir3 {
        match self {
            Self::Floor => Dir3::Y,
            Self::Wall => Dir3::Z,
        }
    }

    fn in_plane(self, local: Vec3) -> Vec2 {
        match self {
            Self::Floor => Vec2::new(local.x, local.z),
            Self::Wall => Vec2::new(local.x, local.y),
        }
    }

    fn colour(self) -> Color {
        match self {
            Self::Floor => FLOOR_GRID_COLOUR,
            Self::Wall => WALL_GRID_COLOUR,
        }
    }
}

/// Finite rectangle the crosshair ray is tested against.
#[derive(Component, Debug, Clone, Copy)]
pub struct ReticleProxy {
    pub plane: ProxyPlane,
    pub half_extents: Vec2,
}

impl ReticleProxy {
    fn world_plane(&self, transform: &GlobalTransform) -> InfinitePlane3d {
        InfinitePlane3d {
            normal: transform.rotation() * self.plane.local_normal(),
        }
    }

    /// Distance along `ray` to the rectangle, if it is hit in front of the origin.
    pub fn intersect(&self, ray: Ray3d, transform: &GlobalTransform) -> Option<f32> {
        let distance = ray.intersect_plane(transform.translation(), self.world_plane(transform))?;
        let local = transform
            .affine()
            .inverse()
            .transform_point3(ray.get_point(distance));
        let on_plane = self.plane.in_plane(local).abs();
        (on_plane.x <= self.half_extents.x && on_plane.y <= self.half_extents.y).then_some(distance)
    }

    /// Orthogonal projection of `point` onto the proxy's infinite plane.
    pub fn project_onto(&self, point: Vec3, transform: &GlobalTransform) -> Vec3 {
        let normal = *self.world_plane(transform).normal;
        point - normal * (point - transform.translation()).dot(normal)
    }

    /// Segment from the eye's shadow on this plane to the hit's shadow.
    pub fn shadow_line(&self, eye: Vec3, hit: Vec3, transform: &GlobalTransform) -> (Vec3, Vec3) {
        (
            self.project_onto(eye, transform),
            self.project_onto(hit, transform),
        )
    }
}

/// Where the crosshair currently lands, if anywhere.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct ReticleHit(pub Option<Vec3>);

/// Ray from the eye through the centre of the off-axis window.
pub fn centre_ray(camera: &GlobalTransform, frustum: &FrustumBounds) -> Option<Ray3d> {
    let direction = Dir3::new(camera.rotation() * frustum.centre_direction()).ok()?;
    Some(Ray3d::new(camera.translation(), direction))
}

/// Nearest proxy hit along `ray`.
pub fn cast_reticle<'a>(
    ray: Ray3d,
    proxies: impl IntoIterator<Item = (&'a ReticleProxy, &'a GlobalTransform)>,
) -> Option<Vec3> {
    proxies
        .into_iter()
        .filter_map(|(proxy, transform)| proxy.intersect(ray, transform))
        .min_by(|a, b| a.total_cmp(b))
        .map(|distance| ray.get_point(distance))
}

pub fn update_reticle(
    settings: Res<ViewerSettings>,
    current: Res<CurrentProjection>,
    cameras: Query<&GlobalTransform, With<HeadTrackedCamera>>,
    proxies: Query<(&ReticleProxy, &GlobalTransform)>,
    mut hit: ResMut<ReticleHit>,
    mut gizmos: Gizmos,
) {
    let camera = cameras.single().ok();
    let point = if settings.show_crosshair {
        current
            .0
            .zip(camera)
            .and_then(|(output, camera)| centre_ray(camera, output.frustum()))
            .and_then(|ray| cast_reticle(ray, &proxies))
    } else {
        None
    };
    hit.set_if_neq(ReticleHit(point));

    let (Some(point), Some(camera)) = (point, camera) else {
        return;
    };

    gizmos.sphere(
        Isometry3d::from_translation(point),
        HIT_MARKER_RADIUS,
        HIT_MARKER_COLOUR,
    );
    let eye = camera.translation();
    for (proxy, transform) in &proxies {
        let (from, to) = proxy.shadow_line(eye, point, transform);
        if from.distance_squared(to) > 1e-6 {
            gizmos.line(from, to, proxy.plane.colour());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxies() -> Vec<(ReticleProxy, GlobalTransform)> {
        vec![
            (
                ReticleProxy {
                    plane: ProxyPlane::Floor,
                    half_extents: Vec2::splat(10.0),
                },
                GlobalTransform::from(Transform::from_xyz(0.0, -4.0, 2.0)),
            ),
            (
                ReticleProxy {
                    plane: ProxyPlane::Wall,
                    half_extents: Vec2::splat(10.0),
                },
                GlobalTransform::from(Transform::from_xyz(0.0, 6.0, -8.0)),
            ),
        ]
    }

    fn ray(origin: Vec3, direction: Vec3) -> Ray3d {
        Ray3d::new(origin, Dir3::new(direction).unwrap())
    }

    #[test]
    fn straight_ahead_hits_back_wall() {
        let proxies = proxies();
        let hit = cast_reticle(
            ray(Vec3::new(0.0, 0.0, 6.0), Vec3::NEG_Z),
            proxies.iter().map(|(p, t)| (p, t)),
        )
        .unwrap();
        assert!((hit - Vec3::new(0.0, 0.0, -8.0)).length() < 1e-4);
    }

    #[test]
    fn downward_ray_hits_floor_first() {
        let proxies = proxies();
        let hit = cast_reticle(
            ray(Vec3::new(0.0, 0.0, 6.0), Vec3::new(0.0, -1.0, -1.0)),
            proxies.iter().map(|(p, t)| (p, t)),
        )
        .unwrap();
        assert!((hit.y + 4.0).abs() < 1e-4);
        assert!((hit.z - 2.0).abs() < 1e-4);
    }

    #[test]
    fn ray_outside_extents_misses() {
        let proxies = proxies();
        let hit = cast_reticle(
            ray(Vec3::new(0.0, 0.0, 6.0), Vec3::new(5.0, 0.0, -1.0)),
            proxies.iter().map(|(p, t)| (p, t)),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn projection_drops_onto_floor() {
        let (floor, transform) = proxies()[0];
        let foot = floor.project_onto(Vec3::new(1.0, 3.0, -8.0), &transform);
        assert!((foot - Vec3::new(1.0, -4.0, -8.0)).length() < 1e-5);
    }

    #[test]
    fn shadow_lines_run_from_eye_to_hit_on_each_plane() {
        let proxies = proxies();
        let eye = Vec3::new(0.0, 0.0, 6.0);
        let hit = Vec3::new(1.0, 0.0, -8.0);

        let (floor, floor_transform) = proxies[0];
        let (from, to) = floor.shadow_line(eye, hit, &floor_transform);
        assert!((from - Vec3::new(0.0, -4.0, 6.0)).length() < 1e-5);
        assert!((to - Vec3::new(1.0, -4.0, -8.0)).length() < 1e-5);

        let (wall, wall_transform) = proxies[1];
        let (from, to) = wall.shadow_line(Vec3::new(0.5, 2.0, 6.0), hit, &wall_transform);
        assert!((from - Vec3::new(0.5, 2.0, -8.0)).length() < 1e-5);
        assert!((to - hit).length() < 1e-5);
    }

    #[test]
    fn centre_ray_follows_off_axis_window() {
        let frustum = FrustumBounds {
            left: -0.1,
            right: 0.3,
            top: 0.1,
            bottom: -0.1,
            near: 0.1,
            far: 100.0,
        };
        let ray = centre_ray(&GlobalTransform::IDENTITY, &frustum).unwrap();
        assert!(ray.direction.x > 0.0);
        assert!(ray.direction.y.abs() < 1e-6);
    }
}
