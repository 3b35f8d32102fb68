// PrintBench - core/slice.rs
//
// Plane cutting: step a horizontal plane through the mesh bounding box and
// turn each cut into 2D outlines.
//
// Per plane:
//   1. Z-band filter selects candidate triangles.
//   2. Each triangle contributes at most one segment: its three edges are
//      intersected with the plane, duplicates (vertex exactly on the plane)
//      are merged, and exactly two distinct points form a segment.
//   3. Segments are chained into polylines through a tolerance-quantised
//      endpoint hash map. A chain that returns to its start is a closed
//      outline; a chain that dead-ends (non-manifold input) stays open.

use rayon::prelude::*;
use std::collections::HashMap;

use crate::core::mesh::{Point3D, TriMesh, Triangle};
use crate::util::constants;
use crate::util::error::SliceError;

/// Slicing parameters.
#[derive(Debug, Clone, Copy)]
pub struct SliceConfig {
    /// Vertical distance between cutting planes, millimetres.
    pub layer_height: f64,

    /// Geometric tolerance for intersection and endpoint matching.
    pub tolerance: f64,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            layer_height: constants::DEFAULT_LAYER_HEIGHT_MM,
            tolerance: constants::SLICE_TOLERANCE,
        }
    }
}

impl SliceConfig {
    /// Reject layer heights outside the documented range before any work
    /// is scheduled.
    pub fn validate(&self) -> Result<(), SliceError> {
        if !self.layer_height.is_finite()
            || self.layer_height < constants::MIN_LAYER_HEIGHT_MM
            || self.layer_height > constants::MAX_LAYER_HEIGHT_MM
        {
            return Err(SliceError::InvalidLayerHeight {
                value: self.layer_height,
                min: constants::MIN_LAYER_HEIGHT_MM,
                max: constants::MAX_LAYER_HEIGHT_MM,
            });
        }
        Ok(())
    }
}

/// A 2D point on a cutting plane.
pub type PlanePoint = [f64; 2];

/// A polyline in one cross-section.
#[derive(Debug, Clone)]
pub struct Outline {
    pub points: Vec<PlanePoint>,
    pub closed: bool,
}

impl Outline {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// One cut: the plane height and its outlines.
#[derive(Debug, Clone)]
pub struct CutPlane {
    pub z: f64,
    pub outlines: Vec<Outline>,
}

impl CutPlane {
    pub fn is_empty(&self) -> bool {
        self.outlines.iter().all(Outline::is_empty)
    }

    pub fn point_count(&self) -> usize {
        self.outlines.iter().map(Outline::len).sum()
    }
}

/// Segment produced by one triangle/plane intersection.
#[derive(Debug, Clone, Copy)]
struct Segment {
    start: PlanePoint,
    end: PlanePoint,
}

// =============================================================================
// Plane generation
// =============================================================================

/// Plane heights for a mesh Z range: mid-layer sampling from `z_min + h/2`
/// upward, strictly below `z_max`. A flat mesh (z_min == z_max) still gets
/// one plane so a 2D model produces a one-layer stack.
pub fn plane_heights(z_min: f64, z_max: f64, layer_height: f64) -> Vec<f64> {
    if z_max - z_min < layer_height / 2.0 {
        return vec![z_min];
    }
    let mut heights = Vec::new();
    let mut z = z_min + layer_height / 2.0;
    while z < z_max {
        heights.push(z);
        z += layer_height;
    }
    heights
}

// =============================================================================
// Whole-mesh slicing
// =============================================================================

/// Cut the mesh with every plane, in parallel, and return the non-empty
/// cuts in ascending Z order.
///
/// Fails fast if the plane count would exceed the hard layer cap.
pub fn slice_mesh(mesh: &TriMesh, config: &SliceConfig) -> Result<Vec<CutPlane>, SliceError> {
    config.validate()?;

    let heights = plane_heights(mesh.min.z, mesh.max.z, config.layer_height);
    if heights.len() > constants::MAX_SLICE_LAYERS {
        return Err(SliceError::TooManyLayers {
            requested: heights.len(),
            max: constants::MAX_SLICE_LAYERS,
        });
    }

    tracing::debug!(
        planes = heights.len(),
        layer_height = config.layer_height,
        "Cutting planes generated"
    );

    let mut cuts: Vec<CutPlane> = heights
        .par_iter()
        .map(|&z| cut_plane(mesh, z, config.tolerance))
        .filter(|cut| !cut.is_empty())
        .collect();

    // par_iter does not guarantee ordering; the stack must ascend in Z.
    cuts.sort_by(|a, b| a.z.total_cmp(&b.z));

    Ok(cuts)
}

/// Cut the mesh with a single horizontal plane at `z`.
pub fn cut_plane(mesh: &TriMesh, z: f64, tolerance: f64) -> CutPlane {
    let segments: Vec<Segment> = mesh
        .triangles_crossing(z, tolerance)
        .filter_map(|tri| triangle_section(tri, z))
        .collect();

    CutPlane {
        z,
        outlines: chain_segments(&segments, tolerance),
    }
}

// =============================================================================
// Triangle / plane intersection
// =============================================================================

/// Intersect one triangle with the horizontal plane at `z`.
///
/// Returns the section segment, or `None` when the plane misses the
/// triangle or only grazes a single vertex.
fn triangle_section(tri: &Triangle, z: f64) -> Option<Segment> {
    let (lo, hi) = tri.z_range();
    if z < lo || z > hi {
        return None;
    }

    let mut points: Vec<PlanePoint> = Vec::with_capacity(3);
    let edges = [(tri.a, tri.b), (tri.b, tri.c), (tri.c, tri.a)];
    for (p, q) in edges {
        if let Some(hit) = edge_section(p, q, z) {
            points.push(hit);
        }
    }

    // A vertex lying exactly on the plane is reported by both adjacent edges.
    points.dedup_by(|a, b| (a[0] - b[0]).hypot(a[1] - b[1]) < 1e-10);
    if points.len() > 2 {
        let first = points[0];
        points.retain(|p| (p[0] - first[0]).hypot(p[1] - first[1]) >= 1e-10);
        points.insert(0, first);
    }

    if points.len() == 2 {
        Some(Segment {
            start: points[0],
            end: points[1],
        })
    } else {
        None
    }
}

/// Intersect the edge `p`-`q` with the plane at `z`.
fn edge_section(p: Point3D, q: Point3D, z: f64) -> Option<PlanePoint> {
    // Endpoint exactly on the plane.
    if (p.z - z).abs() < 1e-10 {
        return Some([p.x, p.y]);
    }
    if (q.z - z).abs() < 1e-10 {
        return Some([q.x, q.y]);
    }

    // Both endpoints on the same side.
    if (p.z < z && q.z < z) || (p.z > z && q.z > z) {
        return None;
    }

    let t = (z - p.z) / (q.z - p.z);
    Some([p.x + t * (q.x - p.x), p.y + t * (q.y - p.y)])
}

// =============================================================================
// Segment chaining
// =============================================================================

/// Quantised endpoint key so floating-point coordinates can be hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct EndpointKey {
    x: i64,
    y: i64,
}

impl EndpointKey {
    fn new(p: PlanePoint, tolerance: f64) -> Self {
        let scale = 1.0 / tolerance;
        Self {
            x: (p[0] * scale).round() as i64,
            y: (p[1] * scale).round() as i64,
        }
    }
}

/// Chain section segments into outlines.
///
/// Each endpoint maps to the segments touching it; starting from any unused
/// segment, the chain follows matching endpoints until it either returns to
/// the start (closed) or finds no continuation (open).
fn chain_segments(segments: &[Segment], tolerance: f64) -> Vec<Outline> {
    if segments.is_empty() {
        return Vec::new();
    }

    let mut by_endpoint: HashMap<EndpointKey, Vec<usize>> = HashMap::new();
    for (i, seg) in segments.iter().enumerate() {
        by_endpoint
            .entry(EndpointKey::new(seg.start, tolerance))
            .or_default()
            .push(i);
        by_endpoint
            .entry(EndpointKey::new(seg.end, tolerance))
            .or_default()
            .push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut outlines = Vec::new();

    for first in 0..segments.len() {
        if used[first] {
            continue;
        }
        used[first] = true;

        let origin = segments[first].start;
        let mut points = vec![origin];
        let mut cursor = segments[first].start;
        let mut current = first;

        let closed = loop {
            let seg = &segments[current];
            let next_point = if distance(seg.start, cursor) < tolerance {
                seg.end
            } else {
                seg.start
            };
            points.push(next_point);

            if distance(next_point, origin) < tolerance {
                break true;
            }

            let key = EndpointKey::new(next_point, tolerance);
            let next = by_endpoint
                .get(&key)
                .and_then(|ids| ids.iter().copied().find(|&i| !used[i]));

            match next {
                Some(i) => {
                    used[i] = true;
                    current = i;
                    cursor = next_point;
                }
                None => break false,
            }
        };

        if points.len() >= 2 {
            outlines.push(Outline { points, closed });
        }
    }

    outlines
}

fn distance(a: PlanePoint, b: PlanePoint) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::Point3D;

    /// Axis-aligned box as a 12-triangle soup.
    fn boxy(w: f64, d: f64, h: f64) -> TriMesh {
        let p = |x: f64, y: f64, z: f64| Point3D::new(x, y, z);
        let quad = |a: Point3D, b: Point3D, c: Point3D, dd: Point3D| {
            [Triangle::new(a, b, c), Triangle::new(a, c, dd)]
        };

        let mut tris = Vec::new();
        // bottom, top
        tris.extend(quad(p(0., 0., 0.), p(w, 0., 0.), p(w, d, 0.), p(0., d, 0.)));
        tris.extend(quad(p(0., 0., h), p(w, 0., h), p(w, d, h), p(0., d, h)));
        // front, back
        tris.extend(quad(p(0., 0., 0.), p(w, 0., 0.), p(w, 0., h), p(0., 0., h)));
        tris.extend(quad(p(0., d, 0.), p(w, d, 0.), p(w, d, h), p(0., d, h)));
        // left, right
        tris.extend(quad(p(0., 0., 0.), p(0., d, 0.), p(0., d, h), p(0., 0., h)));
        tris.extend(quad(p(w, 0., 0.), p(w, d, 0.), p(w, d, h), p(w, 0., h)));

        TriMesh::new(tris).unwrap()
    }

    #[test]
    fn plane_heights_step_mid_layer() {
        let hs = plane_heights(0.0, 10.0, 1.0);
        assert_eq!(hs.len(), 10);
        assert!((hs[0] - 0.5).abs() < 1e-12);
        assert!((hs[9] - 9.5).abs() < 1e-12);
    }

    #[test]
    fn flat_mesh_yields_single_plane() {
        let hs = plane_heights(2.0, 2.0, 1.0);
        assert_eq!(hs, vec![2.0]);
    }

    #[test]
    fn box_cut_is_one_closed_rectangle() {
        let mesh = boxy(10.0, 6.0, 4.0);
        let cut = cut_plane(&mesh, 2.0, 1e-6);

        assert_eq!(cut.outlines.len(), 1, "outlines: {:?}", cut.outlines);
        let outline = &cut.outlines[0];
        assert!(outline.closed);
        // Every point sits on the box perimeter at the cut height.
        for p in &outline.points {
            let on_x = p[0].abs() < 1e-9 || (p[0] - 10.0).abs() < 1e-9;
            let on_y = p[1].abs() < 1e-9 || (p[1] - 6.0).abs() < 1e-9;
            assert!(on_x || on_y, "point {p:?} off the perimeter");
        }
    }

    #[test]
    fn box_stack_has_expected_layer_count_and_order() {
        let mesh = boxy(10.0, 10.0, 5.0);
        let cuts = slice_mesh(&mesh, &SliceConfig::default()).unwrap();

        assert_eq!(cuts.len(), 5);
        for pair in cuts.windows(2) {
            assert!(pair[0].z < pair[1].z, "stack out of order");
        }
    }

    #[test]
    fn single_triangle_yields_open_outline() {
        let mesh = TriMesh::new(vec![Triangle::new(
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(10.0, 0.0, 0.0),
            Point3D::new(5.0, 10.0, 10.0),
        )])
        .unwrap();

        let cut = cut_plane(&mesh, 5.0, 1e-6);
        assert_eq!(cut.outlines.len(), 1);
        assert!(!cut.outlines[0].closed);
    }

    #[test]
    fn plane_above_mesh_cuts_nothing() {
        let mesh = boxy(4.0, 4.0, 4.0);
        let cut = cut_plane(&mesh, 9.0, 1e-6);
        assert!(cut.is_empty());
    }

    #[test]
    fn unreasonable_layer_height_is_rejected() {
        let mesh = boxy(4.0, 4.0, 4.0);
        let config = SliceConfig {
            layer_height: 0.0001,
            ..Default::default()
        };
        assert!(matches!(
            slice_mesh(&mesh, &config),
            Err(SliceError::InvalidLayerHeight { .. })
        ));
    }
}
