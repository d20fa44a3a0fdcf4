//! WGSL sources, embedded at compile time.

/// Static meshes: `vs_main`, `fs_main`.
pub const MESH_SHADER: &str = include_str!("shaders/mesh.wgsl");
/// Rain streaks as a line list: `vs_main`, `fs_main`.
pub const RAIN_SHADER: &str = include_str!("shaders/rain.wgsl");
/// Snow flake quads: `vs_main`, `fs_main`.
pub const SNOW_SHADER: &str = include_str!("shaders/snow.wgsl");
/// Emitted sparks: `vs_main`, `fs_main`.
pub const SPARK_SHADER: &str = include_str!("shaders/sparks.wgsl");
/// Voronoi cones: `vs_main` plus one fragment entry point per
/// [`ShadeMode`](crate::voronoi::ShadeMode).
pub const VORONOI_SHADER: &str = include_str!("shaders/voronoi.wgsl");

/// Every embedded shader with the label its module is created under.
pub const ALL_SHADERS: [(&str, &str); 5] = [
    ("Mesh Shader", MESH_SHADER),
    ("Rain Shader", RAIN_SHADER),
    ("Snow Shader", SNOW_SHADER),
    ("Spark Shader", SPARK_SHADER),
    ("Voronoi Shader", VORONOI_SHADER),
];
