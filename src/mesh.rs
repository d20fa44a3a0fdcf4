//! Procedural meshes for the static parts of the scenes.
//!
//! Every generator returns an indexed triangle list with counter-clockwise
//! front faces and one RGBA colour per vertex. Faces that should look flat get
//! their own vertices so colours do not bleed across edges.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3, Vec4};

/// Interleaved vertex as stored in GPU vertex buffers.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub fn new(position: Vec3, color: Vec4) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
        }
    }

    #[inline]
    pub fn pos(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// Indexed triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Triangles as vertex position triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                self.vertices[tri[0] as usize].pos(),
                self.vertices[tri[1] as usize].pos(),
                self.vertices[tri[2] as usize].pos(),
            ]
        })
    }

    /// Append a quad `a b c d` (counter-clockwise seen from the front).
    fn push_quad(&mut self, corners: [Vec3; 4], color: Vec4) {
        let base = self.vertices.len() as u32;
        self.vertices
            .extend(corners.iter().map(|p| Vertex::new(*p, color)));
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Cone with its apex at `z = +1` and a rim of `segments` vertices of the
/// given radius at `z = -1`. White; the caller tints it.
///
/// Seen from +Z with depth testing, overlapping cones resolve to the nearest
/// apex, which is what makes the Voronoi trick work. Fewer than three
/// segments are raised to three.
pub fn cone(segments: u32, radius: f32) -> MeshData {
    let segments = segments.max(3);
    let mut mesh = MeshData::default();
    mesh.vertices.push(Vertex::new(Vec3::Z, Vec4::ONE));
    for i in 0..segments {
        let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
        let rim = Vec3::new(angle.cos() * radius, angle.sin() * radius, -1.0);
        mesh.vertices.push(Vertex::new(rim, Vec4::ONE));
    }
    for i in 0..segments {
        mesh.indices
            .extend_from_slice(&[0, 1 + i, 1 + (i + 1) % segments]);
    }
    mesh
}

/// Axis-aligned cube of side `size` centred on the origin: 24 vertices, 36
/// indices. Faces are shaded slightly differently so edges read without
/// lighting.
pub fn cube(size: f32, color: Vec4) -> MeshData {
    cuboid(Vec3::ZERO, Vec3::splat(size / 2.0), color)
}

/// Axis-aligned box around `center` with the given half extents, shaded per
/// face like [`cube`].
pub fn cuboid(center: Vec3, half_extents: Vec3, color: Vec4) -> MeshData {
    // (normal, u, v) with u x v == normal
    const FACES: [(Vec3, Vec3, Vec3, f32); 6] = [
        (Vec3::X, Vec3::Y, Vec3::Z, 0.85),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y, 0.7),
        (Vec3::Y, Vec3::Z, Vec3::X, 1.0),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z, 0.5),
        (Vec3::Z, Vec3::X, Vec3::Y, 0.9),
        (Vec3::NEG_Z, Vec3::Y, Vec3::X, 0.75),
    ];

    let mut mesh = MeshData::default();
    for (normal, u, v, shade) in FACES {
        let c = center + normal * half_extents;
        let (u, v) = (u * half_extents, v * half_extents);
        let tint = Vec4::new(color.x * shade, color.y * shade, color.z * shade, color.w);
        mesh.push_quad([c - u - v, c + u - v, c + u + v, c - u + v], tint);
    }
    mesh
}

/// Fuselage of a toy plane: a slim box along Y from -0.5 (tail) to 0.5
/// (nose).
pub fn plane_body() -> MeshData {
    cuboid(Vec3::ZERO, Vec3::new(0.12, 0.5, 0.12), Vec4::new(0.85, 0.85, 0.8, 1.0))
}

/// One wing on the `side` of the fuselage (`1.0` right, `-1.0` left),
/// spanning `0.05..0.95` from the centre line.
pub fn plane_wing(side: f32) -> MeshData {
    cuboid(
        Vec3::new(0.5 * side.signum(), 0.05, 0.0),
        Vec3::new(0.45, 0.12, 0.02),
        Vec4::new(0.9, 0.75, 0.2, 1.0),
    )
}

/// Two-bladed propeller spanning `-1..1` on X, centred on its hub.
pub fn plane_propeller() -> MeshData {
    cuboid(Vec3::ZERO, Vec3::new(1.0, 0.08, 0.02), Vec4::new(0.25, 0.25, 0.25, 1.0))
}

/// Checkerboard floor on the `y = 0` plane spanning `[-half_extent,
/// half_extent]` on X and Z, split into `tiles × tiles` squares. Faces up.
pub fn floor(half_extent: f32, tiles: u32) -> MeshData {
    const LIGHT: Vec4 = Vec4::new(0.55, 0.55, 0.58, 1.0);
    const DARK: Vec4 = Vec4::new(0.3, 0.3, 0.33, 1.0);

    let tiles = tiles.max(1);
    let step = half_extent * 2.0 / tiles as f32;
    let mut mesh = MeshData::default();
    for row in 0..tiles {
        for col in 0..tiles {
            let x0 = -half_extent + col as f32 * step;
            let z0 = -half_extent + row as f32 * step;
            let (x1, z1) = (x0 + step, z0 + step);
            let color = if (row + col) % 2 == 0 { LIGHT } else { DARK };
            mesh.push_quad(
                [
                    Vec3::new(x0, 0.0, z0),
                    Vec3::new(x0, 0.0, z1),
                    Vec3::new(x1, 0.0, z1),
                    Vec3::new(x1, 0.0, z0),
                ],
                color,
            );
        }
    }
    mesh
}

/// Continuous rotation about `axis`, applied between an object's parent
/// transform and its `local` transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub axis: Vec3,
    /// Radians per second.
    pub rate: f32,
    pub local: Mat4,
}

/// Where a mesh sits, possibly animated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub model: Mat4,
    pub spin: Option<Spin>,
}

impl Placement {
    pub fn fixed(model: Mat4) -> Self {
        Self { model, spin: None }
    }

    pub fn spinning(model: Mat4, spin: Spin) -> Self {
        Self {
            model,
            spin: Some(spin),
        }
    }

    /// Model matrix after `elapsed` seconds.
    pub fn at(&self, elapsed: f32) -> Mat4 {
        match self.spin {
            Some(spin) => {
                self.model * Mat4::from_axis_angle(spin.axis, spin.rate * elapsed) * spin.local
            }
            None => self.model,
        }
    }
}

/// A mesh placed in the world.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub label: &'static str,
    pub mesh: MeshData,
    pub placement: Placement,
}

impl SceneObject {
    pub fn fixed(label: &'static str, mesh: MeshData, model: Mat4) -> Self {
        Self {
            label,
            mesh,
            placement: Placement::fixed(model),
        }
    }
}

/// Propeller speed in radians per second.
pub const PROPELLER_RATE: f32 = 10.0;
const PLANE_SCALE: f32 = 0.5;

/// The parts of one toy plane placed by `model`: fuselage, two main wings,
/// two half-size tail wings and a propeller spinning at the nose.
pub fn plane(model: Mat4) -> Vec<SceneObject> {
    let tail = Mat4::from_translation(Vec3::new(0.0, -0.5, 0.0)) * Mat4::from_scale(Vec3::splat(0.5));
    vec![
        SceneObject::fixed("Plane Body", plane_body(), model),
        SceneObject::fixed("Plane Wing Right", plane_wing(1.0), model),
        SceneObject::fixed("Plane Wing Left", plane_wing(-1.0), model),
        SceneObject::fixed("Plane Tail Right", plane_wing(1.0), model * tail),
        SceneObject::fixed("Plane Tail Left", plane_wing(-1.0), model * tail),
        SceneObject {
            label: "Plane Propeller",
            mesh: plane_propeller(),
            placement: Placement::spinning(
                model * Mat4::from_translation(Vec3::new(0.0, 0.5, 0.0)),
                Spin {
                    axis: Vec3::Y,
                    rate: PROPELLER_RATE,
                    local: Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2)
                        * Mat4::from_scale(Vec3::splat(0.5)),
                },
            ),
        },
    ]
}

/// Static set dressing for the weather scene: a checkerboard floor, two
/// rotated cubes and two planes with spinning propellers.
pub fn weather_scene() -> Vec<SceneObject> {
    use std::f32::consts::FRAC_PI_4;

    let mut scene = vec![
        SceneObject::fixed("Floor", floor(25.0, 20), Mat4::IDENTITY),
        SceneObject::fixed(
            "Red Cube",
            cube(1.0, Vec4::new(0.8, 0.25, 0.2, 1.0)),
            Mat4::from_scale_rotation_translation(
                Vec3::splat(1.5),
                Quat::from_rotation_y(0.6),
                Vec3::new(-2.5, 0.75, -6.0),
            ),
        ),
        SceneObject::fixed(
            "Blue Cube",
            cube(1.0, Vec4::new(0.2, 0.35, 0.8, 1.0)),
            Mat4::from_scale_rotation_translation(
                Vec3::splat(2.0),
                Quat::from_euler(glam::EulerRot::YXZ, -0.4, 0.3, 0.0),
                Vec3::new(3.0, 1.5, -10.0),
            ),
        ),
    ];
    for (position, pitch) in [
        (Vec3::new(-2.0, 0.5, 2.0), FRAC_PI_4),
        (Vec3::new(2.0, 0.5, -2.0), FRAC_PI_4 * 3.0),
    ] {
        scene.extend(plane(Mat4::from_scale_rotation_translation(
            Vec3::splat(PLANE_SCALE),
            Quat::from_rotation_x(pitch),
            position,
        )));
    }
    scene
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal(tri: [Vec3; 3]) -> Vec3 {
        (tri[1] - tri[0]).cross(tri[2] - tri[0])
    }

    fn indices_in_range(mesh: &MeshData) -> bool {
        mesh.indices
            .iter()
            .all(|i| (*i as usize) < mesh.vertices.len())
    }

    #[test]
    fn test_cube_counts_and_winding() {
        let mesh = cube(2.0, Vec4::ONE);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert!(indices_in_range(&mesh));
        for tri in mesh.triangles() {
            let centroid = (tri[0] + tri[1] + tri[2]) / 3.0;
            assert!(normal(tri).dot(centroid) > 0.0, "inward face {:?}", tri);
        }
        assert!(mesh
            .vertices
            .iter()
            .all(|v| v.pos().abs().max_element() == 1.0));
    }

    #[test]
    fn test_cube_keeps_alpha() {
        let mesh = cube(1.0, Vec4::new(1.0, 0.5, 0.25, 0.6));
        assert!(mesh.vertices.iter().all(|v| v.color[3] == 0.6));
    }

    #[test]
    fn test_cone_shape() {
        let mesh = cone(32, 2.0);
        assert_eq!(mesh.vertices.len(), 33);
        assert_eq!(mesh.triangle_count(), 32);
        assert!(indices_in_range(&mesh));
        assert_eq!(mesh.vertices[0].pos(), Vec3::Z);
        for v in &mesh.vertices[1..] {
            assert_eq!(v.position[2], -1.0);
            assert!((v.pos().truncate().length() - 2.0).abs() < 1e-5);
        }
        // facing the viewer on +Z
        assert!(mesh.triangles().all(|t| normal(t).z > 0.0));
    }

    #[test]
    fn test_cone_minimum_segments() {
        assert_eq!(cone(0, 1.0).triangle_count(), 3);
    }

    #[test]
    fn test_weather_scene_sits_on_floor() {
        let scene = weather_scene();
        assert_eq!(scene.len(), 3 + 2 * 6);
        for t in [0.0, 0.1, 1.7] {
            for object in &scene[1..] {
                let model = object.placement.at(t);
                let lowest = object
                    .mesh
                    .vertices
                    .iter()
                    .map(|v| model.transform_point3(v.pos()).y)
                    .fold(f32::MAX, f32::min);
                assert!(lowest > -0.01, "{} sinks into the floor", object.label);
            }
        }
    }

    #[test]
    fn test_only_propellers_move() {
        let scene = weather_scene();
        let spinning: Vec<_> = scene
            .iter()
            .filter(|o| o.placement.at(0.0) != o.placement.at(0.3))
            .map(|o| o.label)
            .collect();
        assert_eq!(spinning, vec!["Plane Propeller", "Plane Propeller"]);
    }

    #[test]
    fn test_propeller_turns_around_its_hub() {
        let parts = plane(Mat4::IDENTITY);
        let propeller = parts
            .iter()
            .find(|o| o.label == "Plane Propeller")
            .unwrap();
        let tip = Vec3::X;
        let hub = Vec3::new(0.0, 0.5, 0.0);

        let start = propeller.placement.at(0.0).transform_point3(tip);
        // a quarter turn at 10 rad/s
        let t = std::f32::consts::FRAC_PI_2 / PROPELLER_RATE;
        let quarter = propeller.placement.at(t).transform_point3(tip);

        assert!((start - hub).length() > 0.4);
        assert!(((start - hub).length() - (quarter - hub).length()).abs() < 1e-5);
        assert!((start - hub).dot(quarter - hub).abs() < 1e-5);
        assert!((start.y - hub.y).abs() < 1e-5 && (quarter.y - hub.y).abs() < 1e-5);
        // the hub itself does not move
        let centre = propeller.placement.at(t).transform_point3(Vec3::ZERO);
        assert!((centre - hub).length() < 1e-5);
    }

    #[test]
    fn test_wings_mirror_each_other() {
        let right = plane_wing(1.0);
        let left = plane_wing(-1.0);
        let max_x = right.vertices.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
        let min_x = left.vertices.iter().map(|v| v.position[0]).fold(f32::MAX, f32::min);
        assert!((max_x + min_x).abs() < 1e-6);
        assert!(right.vertices.iter().all(|v| v.position[0] > 0.0));
        for mesh in [&right, &left] {
            for tri in mesh.triangles() {
                let centroid = (tri[0] + tri[1] + tri[2]) / 3.0;
                let outward = centroid - Vec3::new(0.5 * mesh.vertices[0].position[0].signum(), 0.05, 0.0);
                assert!(normal(tri).dot(outward) > 0.0);
            }
        }
    }

    #[test]
    fn test_floor_checkerboard() {
        let mesh = floor(10.0, 4);
        assert_eq!(mesh.vertices.len(), 4 * 16);
        assert_eq!(mesh.indices.len(), 6 * 16);
        assert!(indices_in_range(&mesh));
        assert!(mesh.triangles().all(|t| normal(t).y > 0.0));
        assert_ne!(mesh.vertices[0].color, mesh.vertices[4].color);
        assert_eq!(mesh.vertices[0].color, mesh.vertices[4 * 5].color);
        let max = mesh
            .vertices
            .iter()
            .map(|v| v.pos().abs().max_element())
            .fold(0.0f32, f32::max);
        assert!((max - 10.0).abs() < 1e-5);
    }
}
