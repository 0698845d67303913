use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};

use constants::render_settings::{
    FLOOR_GRID_COLOUR, FLOOR_Y, GRID_DIVISIONS, GRID_EXTENT, WALL_CENTRE_Y, WALL_GRID_COLOUR,
    WALL_Z,
};

use super::reticle::{ProxyPlane, ReticleProxy};
use crate::engine::locomotion::scene_root::SceneRoot;

/// Sphere circling a fixed centre inside the scene root.
#[derive(Component, Debug, Clone, Copy)]
pub struct Orbit {
    pub centre: Vec3,
    pub radius: f32,
    /// Radians per second.
    pub speed: f32,
    pub phase: f32,
}

impl Orbit {
    pub fn position_at(&self, seconds: f32) -> Vec3 {
        let angle = self.phase + self.speed * seconds;
        self.centre + Vec3::new(angle.cos(), 0.0, angle.sin()) * self.radius
    }
}

/// Square grid of lines centred on the origin of the given proxy plane.
pub fn grid_line_mesh(plane: ProxyPlane, extent: f32, divisions: u32) -> Mesh {
    let half = extent * 0.5;
    let step = extent / divisions.max(1) as f32;
    let point = |a: f32, b: f32| match plane {
        ProxyPlane::Floor => [a, 0.0, b],
        ProxyPlane::Wall => [a, b, 0.0],
    };

    let mut vertices = Vec::new();
    for i in 0..=divisions {
        let offset = -half + i as f32 * step;
        vertices.push(point(offset, -half));
        vertices.push(point(offset, half));
        vertices.push(point(-half, offset));
        vertices.push(point(half, offset));
    }
    let indices = (0..vertices.len() as u32).collect();

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::RENDER_WORLD);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, vertices);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

fn line_material(materials: &mut Assets<StandardMaterial>, colour: Color) -> Handle<StandardMaterial> {
    materials.add(StandardMaterial {
        base_color: colour,
        unlit: true,
        ..default()
    })
}

/// Floor and back-wall grids plus three spheres at different depths, all
/// parented to the scene root.
pub fn spawn_demo_scene(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) {
    let half_extents = Vec2::splat(GRID_EXTENT * 0.5);

    let floor = (
        Mesh3d(meshes.add(grid_line_mesh(ProxyPlane::Floor, GRID_EXTENT, GRID_DIVISIONS))),
        MeshMaterial3d(line_material(materials, FLOOR_GRID_COLOUR)),
        Transform::from_xyz(0.0, FLOOR_Y, WALL_Z + GRID_EXTENT * 0.5),
        ReticleProxy {
            plane: ProxyPlane::Floor,
            half_extents,
        },
    );
    let wall = (
        Mesh3d(meshes.add(grid_line_mesh(ProxyPlane::Wall, GRID_EXTENT, GRID_DIVISIONS))),
        MeshMaterial3d(line_material(materials, WALL_GRID_COLOUR)),
        Transform::from_xyz(0.0, WALL_CENTRE_Y, WALL_Z),
        ReticleProxy {
            plane: ProxyPlane::Wall,
            half_extents,
        },
    );

    let spheres = [
        (Vec3::new(-3.0, -2.0, -5.0), 1.2, Color::srgb(0.9, 0.3, 0.2), 0.6),
        (Vec3::new(2.5, 0.0, -2.0), 0.8, Color::srgb(0.2, 0.8, 0.3), -0.9),
        (Vec3::new(0.0, 1.0, 2.0), 0.4, Color::srgb(0.2, 0.4, 0.9), 1.4),
    ];

    commands
        .spawn((SceneRoot, Transform::IDENTITY, Visibility::Visible))
        .with_children(|root| {
            root.spawn(floor);
            root.spawn(wall);
            for (index, (centre, radius, colour, speed)) in spheres.into_iter().enumerate() {
                let orbit = Orbit {
                    centre,
                    radius: 0.5,
                    speed,
                    phase: index as f32,
                };
                root.spawn((
                    Mesh3d(meshes.add(Sphere::new(radius).mesh().uv(32, 18))),
                    MeshMaterial3d(materials.add(StandardMaterial {
                        base_color: colour,
                        perceptual_roughness: 0.4,
                        ..default()
                    })),
                    Transform::from_translation(orbit.position_at(0.0)),
                    orbit,
                ));
            }
        });
}

pub fn animate_orbits(time: Res<Time>, mut orbits: Query<(&Orbit, &mut Transform)>) {
    let seconds = time.elapsed_secs();
    for (orbit, mut transform) in &mut orbits {
        transform.translation = orbit.position_at(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::mesh::VertexAttributeValues;

    #[test]
    fn grid_has_two_lines_per_division_step() {
        let mesh = grid_line_mesh(ProxyPlane::Floor, 20.0, 4);
        let Some(VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            panic!("grid mesh has no positions");
        };
        // 5 lines each way, two endpoints per line
        assert_eq!(positions.len(), 20);
        assert!(positions.iter().all(|p| p[1] == 0.0));
        assert!(positions.iter().all(|p| p[0].abs() <= 10.0 && p[2].abs() <= 10.0));
    }

    #[test]
    fn wall_grid_lies_in_xy_plane() {
        let mesh = grid_line_mesh(ProxyPlane::Wall, 10.0, 2);
        let Some(VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            panic!("grid mesh has no positions");
        };
        assert!(positions.iter().all(|p| p[2] == 0.0));
    }

    #[test]
    fn orbit_stays_on_its_circle() {
        let orbit = Orbit {
            centre: Vec3::new(1.0, 2.0, 3.0),
            radius: 0.5,
            speed: 2.0,
            phase: 0.3,
        };
        for t in [0.0, 0.7, 4.2] {
            let offset = orbit.position_at(t) - orbit.centre;
            assert!((offset.length() - 0.5).abs() < 1e-5);
            assert_eq!(offset.y, 0.0);
        }
    }
}
