// PrintBench - core/raster.rs
//
// Rasterise cut outlines into RGBA images.
//
// All layers of one stack share a single world-to-pixel transform derived
// from the mesh XY bounding box, so features stay put while the user scrubs
// through the stack. Closed outlines are filled with an even-odd scanline
// pass (per-row intersection pairing); every outline is then stroked on top.

use image::{Rgba, RgbaImage};

use crate::core::mesh::TriMesh;
use crate::core::slice::{CutPlane, Outline, PlanePoint};
use crate::util::constants;

/// Background: opaque white.
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Interior fill for closed outlines.
const FILL: Rgba<u8> = Rgba([191, 219, 254, 255]);

/// Outline stroke.
const STROKE: Rgba<u8> = Rgba([30, 64, 175, 255]);

/// Raster output parameters.
#[derive(Debug, Clone, Copy)]
pub struct RasterConfig {
    pub width: u32,
    pub height: u32,

    /// Blank border around the model, pixels.
    pub margin_px: u32,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            width: constants::DEFAULT_RASTER_SIZE,
            height: constants::DEFAULT_RASTER_SIZE,
            margin_px: constants::RASTER_MARGIN_PX,
        }
    }
}

impl RasterConfig {
    pub fn square(size: u32) -> Self {
        Self {
            width: size,
            height: size,
            margin_px: constants::RASTER_MARGIN_PX,
        }
    }
}

/// Uniform world-to-pixel mapping shared by every layer of a stack.
#[derive(Debug, Clone, Copy)]
pub struct PixelFrame {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    height: u32,
    width: u32,
}

impl PixelFrame {
    /// Fit the mesh XY bounds into the image with uniform scale, centred,
    /// honouring the margin. Zero-extent models map to the image centre.
    pub fn fit(mesh: &TriMesh, config: &RasterConfig) -> Self {
        let span_x = (mesh.max.x - mesh.min.x).max(f64::EPSILON);
        let span_y = (mesh.max.y - mesh.min.y).max(f64::EPSILON);

        let usable_w = config.width.saturating_sub(2 * config.margin_px).max(1) as f64;
        let usable_h = config.height.saturating_sub(2 * config.margin_px).max(1) as f64;

        let scale = (usable_w / span_x).min(usable_h / span_y);

        // Centre the model in the image.
        let offset_x = (config.width as f64 - span_x * scale) / 2.0 - mesh.min.x * scale;
        let offset_y = (config.height as f64 - span_y * scale) / 2.0 - mesh.min.y * scale;

        Self {
            scale,
            offset_x,
            offset_y,
            height: config.height,
            width: config.width,
        }
    }

    /// Project a plane point to pixel coordinates. Y is flipped: world +Y
    /// is up, image rows grow downward.
    pub fn project(&self, p: PlanePoint) -> (f64, f64) {
        let x = p[0] * self.scale + self.offset_x;
        let y = self.height as f64 - (p[1] * self.scale + self.offset_y);
        (x, y)
    }
}

/// Rasterise one cut into an image.
pub fn rasterize_plane(cut: &CutPlane, frame: &PixelFrame) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(frame.width, frame.height, BACKGROUND);

    fill_closed_outlines(&mut image, &cut.outlines, frame);

    for outline in &cut.outlines {
        stroke_outline(&mut image, outline, frame);
    }

    image
}

// =============================================================================
// Even-odd scanline fill
// =============================================================================

/// Fill the union of all closed outlines with even-odd parity.
///
/// For each pixel row, every closed outline edge crossing the row centre
/// contributes one X intersection; sorting and pairing them gives the
/// interior spans. Holes (nested outlines) come out unfilled for free.
fn fill_closed_outlines(image: &mut RgbaImage, outlines: &[Outline], frame: &PixelFrame) {
    // Project every closed outline once.
    let polys: Vec<Vec<(f64, f64)>> = outlines
        .iter()
        .filter(|o| o.closed && o.points.len() >= 3)
        .map(|o| o.points.iter().map(|&p| frame.project(p)).collect())
        .collect();
    if polys.is_empty() {
        return;
    }

    let mut crossings: Vec<f64> = Vec::new();
    for row in 0..frame.height {
        let y = row as f64 + 0.5;
        crossings.clear();

        for poly in &polys {
            let n = poly.len();
            for i in 0..n {
                let (x1, y1) = poly[i];
                let (x2, y2) = poly[(i + 1) % n];
                // Half-open test so a vertex touching the row is counted once.
                if (y1 <= y && y2 > y) || (y2 <= y && y1 > y) {
                    let t = (y - y1) / (y2 - y1);
                    crossings.push(x1 + t * (x2 - x1));
                }
            }
        }

        crossings.sort_by(|a, b| a.total_cmp(b));

        for pair in crossings.chunks_exact(2) {
            let x_start = pair[0].ceil().max(0.0) as u32;
            let x_end = pair[1].floor().min(frame.width as f64 - 1.0);
            if x_end < 0.0 {
                continue;
            }
            for x in x_start..=x_end as u32 {
                image.put_pixel(x, row, FILL);
            }
        }
    }
}

// =============================================================================
// Outline stroke
// =============================================================================

/// Draw the outline polyline (and its closing edge when closed).
fn stroke_outline(image: &mut RgbaImage, outline: &Outline, frame: &PixelFrame) {
    if outline.points.len() < 2 {
        return;
    }

    let projected: Vec<(f64, f64)> = outline.points.iter().map(|&p| frame.project(p)).collect();

    for pair in projected.windows(2) {
        draw_line(image, pair[0], pair[1]);
    }
    if outline.closed {
        // Chained outlines normally repeat their origin as the final point;
        // close explicitly when they do not.
        let first = projected[0];
        let last = projected[projected.len() - 1];
        if (first.0 - last.0).hypot(first.1 - last.1) > 0.5 {
            draw_line(image, last, first);
        }
    }
}

/// Stroke a line by sampling it at sub-pixel steps.
fn draw_line(image: &mut RgbaImage, from: (f64, f64), to: (f64, f64)) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;

    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = from.0 + dx * t;
        let y = from.1 + dy * t;
        if x >= 0.0 && y >= 0.0 && (x as u32) < image.width() && (y as u32) < image.height() {
            image.put_pixel(x as u32, y as u32, STROKE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::{Point3D, TriMesh, Triangle};
    use crate::core::slice::Outline;

    fn flat_square_mesh() -> TriMesh {
        // Only the XY bounds matter for frame fitting.
        TriMesh::new(vec![
            Triangle::new(
                Point3D::new(0.0, 0.0, 0.0),
                Point3D::new(10.0, 0.0, 0.0),
                Point3D::new(10.0, 10.0, 5.0),
            ),
            Triangle::new(
                Point3D::new(0.0, 0.0, 0.0),
                Point3D::new(10.0, 10.0, 5.0),
                Point3D::new(0.0, 10.0, 0.0),
            ),
        ])
        .unwrap()
    }

    fn square_outline() -> Outline {
        Outline {
            points: vec![[1.0, 1.0], [9.0, 1.0], [9.0, 9.0], [1.0, 9.0], [1.0, 1.0]],
            closed: true,
        }
    }

    #[test]
    fn frame_projection_is_uniform_and_y_flipped() {
        let mesh = flat_square_mesh();
        let frame = PixelFrame::fit(&mesh, &RasterConfig::square(128));

        let (x0, y0) = frame.project([0.0, 0.0]);
        let (x1, y1) = frame.project([10.0, 10.0]);

        // Uniform scale: both axes span the same pixel distance.
        assert!(((x1 - x0) - (y0 - y1)).abs() < 1e-9);
        // +Y in world goes up in the image.
        assert!(y1 < y0);
    }

    #[test]
    fn closed_square_interior_is_filled() {
        let mesh = flat_square_mesh();
        let config = RasterConfig::square(128);
        let frame = PixelFrame::fit(&mesh, &config);
        let cut = CutPlane {
            z: 1.0,
            outlines: vec![square_outline()],
        };

        let img = rasterize_plane(&cut, &frame);

        let (cx, cy) = frame.project([5.0, 5.0]);
        assert_eq!(*img.get_pixel(cx as u32, cy as u32), FILL);

        // A corner of the image stays background.
        assert_eq!(*img.get_pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn nested_outline_leaves_hole_unfilled() {
        let mesh = flat_square_mesh();
        let frame = PixelFrame::fit(&mesh, &RasterConfig::square(128));
        let hole = Outline {
            points: vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0], [4.0, 4.0]],
            closed: true,
        };
        let cut = CutPlane {
            z: 1.0,
            outlines: vec![square_outline(), hole],
        };

        let img = rasterize_plane(&cut, &frame);

        let (cx, cy) = frame.project([5.0, 5.0]);
        assert_eq!(*img.get_pixel(cx as u32, cy as u32), BACKGROUND);

        let (rx, ry) = frame.project([2.5, 5.0]);
        assert_eq!(*img.get_pixel(rx as u32, ry as u32), FILL);
    }

    #[test]
    fn open_outline_is_stroked_not_filled() {
        let mesh = flat_square_mesh();
        let frame = PixelFrame::fit(&mesh, &RasterConfig::square(128));
        let cut = CutPlane {
            z: 1.0,
            outlines: vec![Outline {
                points: vec![[1.0, 5.0], [9.0, 5.0]],
                closed: false,
            }],
        };

        let img = rasterize_plane(&cut, &frame);

        let (x, y) = frame.project([5.0, 5.0]);
        assert_eq!(*img.get_pixel(x as u32, y as u32), STROKE);

        let (x, y) = frame.project([5.0, 7.0]);
        assert_eq!(*img.get_pixel(x as u32, y as u32), BACKGROUND);
    }

    #[test]
    fn registration_is_stable_across_layers() {
        // The same outline rasterised for two different cut heights lands on
        // identical pixels because the frame comes from the mesh, not the cut.
        let mesh = flat_square_mesh();
        let frame = PixelFrame::fit(&mesh, &RasterConfig::square(64));
        let a = rasterize_plane(
            &CutPlane {
                z: 0.5,
                outlines: vec![square_outline()],
            },
            &frame,
        );
        let b = rasterize_plane(
            &CutPlane {
                z: 4.5,
                outlines: vec![square_outline()],
            },
            &frame,
        );
        assert_eq!(a.as_raw(), b.as_raw());
    }
}
