//! Voronoi diagrams drawn as depth-tested cones.
//!
//! Every site is a cone seen from above with its apex on the site. Cone depth
//! grows linearly with distance from the apex, so after depth testing each
//! pixel keeps the colour of its nearest site. [`VoronoiDiagram::nearest_site`]
//! is the same rule evaluated on the CPU.

use glam::{Vec2, Vec3};
use serde::Deserialize;

use crate::input::cursor_in_range;
use crate::spawn::SpawnContext;

/// How cone fragments are coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadeMode {
    /// Flat site colour.
    #[default]
    Color,
    /// Grey ramp from fragment depth, i.e. distance to the site.
    Distance,
    /// Site colour darkened with distance.
    DistanceColor,
}

impl ShadeMode {
    pub const ALL: [ShadeMode; 3] = [ShadeMode::Color, ShadeMode::Distance, ShadeMode::DistanceColor];

    /// Mode bound to number key `digit` (1, 2, 3).
    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            1 => Some(ShadeMode::Color),
            2 => Some(ShadeMode::Distance),
            3 => Some(ShadeMode::DistanceColor),
            _ => None,
        }
    }

    /// Fragment entry point in `voronoi.wgsl`.
    pub fn entry_point(self) -> &'static str {
        match self {
            ShadeMode::Color => "fs_color",
            ShadeMode::Distance => "fs_distance",
            ShadeMode::DistanceColor => "fs_distance_color",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShadeMode::Color => "color",
            ShadeMode::Distance => "distance",
            ShadeMode::DistanceColor => "distance-color",
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One Voronoi site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeSite {
    /// Position in normalized device coordinates.
    pub offset: Vec2,
    pub color: Vec3,
}

/// Sites plus the active shading mode.
#[derive(Debug, Clone)]
pub struct VoronoiDiagram {
    sites: Vec<ConeSite>,
    mode: ShadeMode,
    max_sites: usize,
    cone_radius: f32,
}

impl VoronoiDiagram {
    /// Empty diagram whose cones have the given NDC radius.
    pub fn new(cone_radius: f32) -> Self {
        Self {
            sites: Vec::new(),
            mode: ShadeMode::default(),
            max_sites: 256,
            cone_radius,
        }
    }

    pub fn with_max_sites(mut self, max_sites: usize) -> Self {
        self.max_sites = max_sites;
        self
    }

    pub fn with_mode(mut self, mode: ShadeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Add a site. Returns `false` once the diagram is full.
    pub fn add_site(&mut self, offset: Vec2, color: Vec3) -> bool {
        if self.sites.len() >= self.max_sites {
            log::warn!("voronoi site limit ({}) reached", self.max_sites);
            return false;
        }
        self.sites.push(ConeSite { offset, color });
        log::info!(
            "added site {} at ({:.3}, {:.3})",
            self.sites.len(),
            offset.x,
            offset.y
        );
        true
    }

    /// Add a randomly coloured site under the cursor.
    pub fn add_site_at_cursor(
        &mut self,
        cursor: Vec2,
        window_size: (u32, u32),
        ctx: &mut SpawnContext,
    ) -> Option<ConeSite> {
        let offset = cursor_in_range(cursor, window_size, -1.0, 1.0);
        let color = ctx.random_color();
        self.add_site(offset, color).then_some(ConeSite { offset, color })
    }

    /// Switch shading. Returns `true` if the mode changed.
    pub fn set_mode(&mut self, mode: ShadeMode) -> bool {
        if self.mode == mode {
            return false;
        }
        log::info!("voronoi shading: {}", mode.name());
        self.mode = mode;
        true
    }

    /// Apply a number key. Unbound digits are ignored.
    pub fn handle_digit(&mut self, digit: u8) -> bool {
        ShadeMode::from_digit(digit).is_some_and(|mode| self.set_mode(mode))
    }

    #[inline]
    pub fn mode(&self) -> ShadeMode {
        self.mode
    }

    #[inline]
    pub fn sites(&self) -> &[ConeSite] {
        &self.sites
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    #[inline]
    pub fn max_sites(&self) -> usize {
        self.max_sites
    }

    #[inline]
    pub fn cone_radius(&self) -> f32 {
        self.cone_radius
    }

    pub fn clear(&mut self) {
        self.sites.clear();
    }

    /// Depth the cone of `site` writes at `point`, in `[0, 1]`; 1 outside
    /// the cone.
    pub fn cone_depth(&self, site: &ConeSite, point: Vec2) -> f32 {
        (point.distance(site.offset) / self.cone_radius).min(1.0)
    }

    /// Site whose cone wins the depth test at `point`. Points beyond every
    /// cone's rim have no owner.
    pub fn nearest_site(&self, point: Vec2) -> Option<usize> {
        self.sites
            .iter()
            .enumerate()
            .map(|(i, site)| (i, self.cone_depth(site, point)))
            .filter(|(_, depth)| *depth < 1.0)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

impl Default for VoronoiDiagram {
    fn default() -> Self {
        Self::new(3.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_select_modes() {
        let mut diagram = VoronoiDiagram::default();
        assert!(diagram.handle_digit(2));
        assert_eq!(diagram.mode(), ShadeMode::Distance);
        assert!(!diagram.handle_digit(2));
        assert!(diagram.handle_digit(3));
        assert_eq!(diagram.mode(), ShadeMode::DistanceColor);
        assert!(!diagram.handle_digit(7));
        assert_eq!(diagram.mode(), ShadeMode::DistanceColor);
    }

    #[test]
    fn test_entry_points_are_distinct() {
        let mut names: Vec<_> = ShadeMode::ALL.iter().map(|m| m.entry_point()).collect();
        names.dedup();
        assert_eq!(names.len(), 3);
        for (i, mode) in ShadeMode::ALL.iter().enumerate() {
            assert_eq!(mode.index(), i);
        }
    }

    #[test]
    fn test_click_adds_site_in_ndc() {
        let mut ctx = SpawnContext::seeded(1);
        let mut diagram = VoronoiDiagram::default();
        let site = diagram
            .add_site_at_cursor(Vec2::new(600.0, 150.0), (800, 600), &mut ctx)
            .unwrap();
        assert_eq!(site.offset, Vec2::new(0.5, 0.5));
        assert!(site.color.cmpge(Vec3::ZERO).all() && site.color.cmple(Vec3::ONE).all());
        assert_eq!(diagram.sites(), &[site]);
    }

    #[test]
    fn test_site_limit() {
        let mut diagram = VoronoiDiagram::default().with_max_sites(2);
        assert!(diagram.add_site(Vec2::ZERO, Vec3::ONE));
        assert!(diagram.add_site(Vec2::X, Vec3::ONE));
        assert!(!diagram.add_site(Vec2::Y, Vec3::ONE));
        assert_eq!(diagram.len(), 2);
    }

    #[test]
    fn test_nearest_site_wins_depth_test() {
        let mut diagram = VoronoiDiagram::new(2.0);
        diagram.add_site(Vec2::new(-0.5, 0.0), Vec3::X);
        diagram.add_site(Vec2::new(0.5, 0.0), Vec3::Y);
        assert_eq!(diagram.nearest_site(Vec2::new(-0.1, 0.3)), Some(0));
        assert_eq!(diagram.nearest_site(Vec2::new(0.1, -0.3)), Some(1));
        assert_eq!(diagram.nearest_site(Vec2::new(10.0, 0.0)), None);

        let apex = diagram.cone_depth(&diagram.sites()[0], Vec2::new(-0.5, 0.0));
        assert_eq!(apex, 0.0);
    }

    #[test]
    fn test_empty_diagram_has_no_owner() {
        let diagram = VoronoiDiagram::default();
        assert!(diagram.is_empty());
        assert_eq!(diagram.nearest_site(Vec2::ZERO), None);
    }
}
