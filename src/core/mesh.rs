// PrintBench - core/mesh.rs
//
// Triangle mesh representation and STL loading.
//
// STL faces arrive as indices into a deduplicated vertex table (stl_io's
// IndexedMesh); they are expanded into a flat triangle soup here because
// every downstream consumer (plane cutting, viewport shading) works per
// triangle and never needs shared-vertex adjacency.

use nalgebra::{Point3, Vector3};
use std::path::Path;

use crate::util::error::MeshError;

/// 3D point in model space (millimetres).
pub type Point3D = Point3<f64>;

/// 3D vector in model space.
pub type Vector3D = Vector3<f64>;

/// Triangle defined by three vertices.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub a: Point3D,
    pub b: Point3D,
    pub c: Point3D,
}

impl Triangle {
    pub fn new(a: Point3D, b: Point3D, c: Point3D) -> Self {
        Self { a, b, c }
    }

    /// Unit normal via the right-hand rule.
    ///
    /// Degenerate triangles (zero area, colinear vertices) return +Z so
    /// callers never see NaN components.
    pub fn normal(&self) -> Vector3D {
        let cross = (self.b - self.a).cross(&(self.c - self.a));
        let norm = cross.norm();
        if norm < 1e-12 || !norm.is_finite() {
            return Vector3D::new(0.0, 0.0, 1.0);
        }
        cross / norm
    }

    /// Triangle area.
    pub fn area(&self) -> f64 {
        (self.b - self.a).cross(&(self.c - self.a)).norm() / 2.0
    }

    /// Minimum and maximum Z over the three vertices.
    pub fn z_range(&self) -> (f64, f64) {
        let lo = self.a.z.min(self.b.z).min(self.c.z);
        let hi = self.a.z.max(self.b.z).max(self.c.z);
        (lo, hi)
    }

    /// Vertex iterator, used by bounds computation and the viewport.
    pub fn vertices(&self) -> [Point3D; 3] {
        [self.a, self.b, self.c]
    }
}

/// Triangle soup with a precomputed axis-aligned bounding box.
#[derive(Debug, Clone)]
pub struct TriMesh {
    pub triangles: Vec<Triangle>,
    pub min: Point3D,
    pub max: Point3D,
}

impl TriMesh {
    /// Build a mesh from a triangle soup.
    ///
    /// Returns `None` for an empty soup; STL loading maps that to a typed
    /// error carrying the path.
    pub fn new(triangles: Vec<Triangle>) -> Option<Self> {
        if triangles.is_empty() {
            return None;
        }
        let (min, max) = Self::compute_bounds(&triangles);
        Some(Self {
            triangles,
            min,
            max,
        })
    }

    /// Load a mesh from an STL file (binary or ASCII).
    pub fn load_stl(path: &Path) -> Result<Self, MeshError> {
        let mut file = std::fs::File::open(path).map_err(|e| MeshError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;

        let stl = stl_io::read_stl(&mut file).map_err(|e| MeshError::Decode {
            path: path.to_path_buf(),
            source: e,
        })?;

        // Faces index into the deduplicated vertex table.
        let triangles: Vec<Triangle> = stl
            .faces
            .iter()
            .map(|face| {
                let v = |i: usize| {
                    let p = &stl.vertices[face.vertices[i]];
                    Point3D::new(p[0] as f64, p[1] as f64, p[2] as f64)
                };
                Triangle::new(v(0), v(1), v(2))
            })
            .collect();

        let mesh = Self::new(triangles).ok_or_else(|| MeshError::Empty {
            path: path.to_path_buf(),
        })?;

        tracing::info!(
            path = %path.display(),
            triangles = mesh.triangle_count(),
            dims = ?mesh.dimensions().as_slice(),
            "STL loaded"
        );

        Ok(mesh)
    }

    fn compute_bounds(triangles: &[Triangle]) -> (Point3D, Point3D) {
        let mut min = Point3D::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut max = Point3D::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);

        for tri in triangles {
            for v in tri.vertices() {
                min.x = min.x.min(v.x);
                min.y = min.y.min(v.y);
                min.z = min.z.min(v.z);

                max.x = max.x.max(v.x);
                max.y = max.y.max(v.y);
                max.z = max.z.max(v.z);
            }
        }

        (min, max)
    }

    /// Triangles whose Z range overlaps `z` within `tolerance`.
    pub fn triangles_crossing(&self, z: f64, tolerance: f64) -> impl Iterator<Item = &Triangle> {
        self.triangles.iter().filter(move |tri| {
            let (lo, hi) = tri.z_range();
            hi >= z - tolerance && lo <= z + tolerance
        })
    }

    /// Bounding-box dimensions.
    pub fn dimensions(&self) -> Vector3D {
        self.max - self.min
    }

    /// Bounding-box centre.
    pub fn center(&self) -> Point3D {
        Point3D::from((self.min.coords + self.max.coords) / 2.0)
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(ax: f64, ay: f64, az: f64, bx: f64, by: f64, bz: f64, cx: f64, cy: f64, cz: f64) -> Triangle {
        Triangle::new(
            Point3D::new(ax, ay, az),
            Point3D::new(bx, by, bz),
            Point3D::new(cx, cy, cz),
        )
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let mesh = TriMesh::new(vec![
            tri(0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 2.0),
            tri(-1.0, 0.0, 0.0, 1.0, 3.0, 0.0, 0.0, 1.0, 0.5),
        ])
        .unwrap();

        assert_eq!(mesh.min, Point3D::new(-1.0, 0.0, 0.0));
        assert_eq!(mesh.max, Point3D::new(1.0, 3.0, 2.0));
        assert_eq!(mesh.dimensions(), Vector3D::new(2.0, 3.0, 2.0));
    }

    #[test]
    fn empty_soup_is_rejected() {
        assert!(TriMesh::new(Vec::new()).is_none());
    }

    #[test]
    fn area_and_normal_of_unit_right_triangle() {
        let t = tri(0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0);
        assert!((t.area() - 0.5).abs() < 1e-12);
        assert_eq!(t.normal(), Vector3D::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn degenerate_triangle_normal_is_finite() {
        let t = tri(0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0);
        let n = t.normal();
        assert!(n.x.is_finite() && n.y.is_finite() && n.z.is_finite());
        assert_eq!(n, Vector3D::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn crossing_filter_respects_z_band() {
        let mesh = TriMesh::new(vec![
            tri(0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0), // z 0..1
            tri(0.0, 0.0, 5.0, 1.0, 0.0, 5.0, 0.0, 1.0, 6.0), // z 5..6
        ])
        .unwrap();

        assert_eq!(mesh.triangles_crossing(0.5, 1e-6).count(), 1);
        assert_eq!(mesh.triangles_crossing(5.5, 1e-6).count(), 1);
        assert_eq!(mesh.triangles_crossing(3.0, 1e-6).count(), 0);
    }

    #[test]
    fn load_missing_file_reports_open_error() {
        let err = TriMesh::load_stl(Path::new("/nonexistent/printbench-test.stl")).unwrap_err();
        assert!(matches!(err, MeshError::Open { .. }), "got {err:?}");
    }
}
