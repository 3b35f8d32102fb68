// PrintBench - ui/viewport.rs
//
// Software-projected 3D preview of the loaded mesh.
//
// An orbit camera (yaw/pitch/distance around a target point) projects each
// triangle onto the panel; triangles are depth-sorted back to front and
// painted as Lambert-shaded convex polygons. A build-plate grid and origin
// axes give spatial reference. Good enough for "is this the right part,
// the right way up" — there is deliberately no GPU scene behind it.

use egui::{Color32, Pos2, Sense, Shape, Stroke, Vec2};
use nalgebra::{Point3, Vector3};

use crate::core::mesh::TriMesh;
use crate::ui::theme;

/// Triangles above this count are decimated (every Nth drawn) to keep the
/// painter responsive on dense scans.
const MAX_DRAWN_TRIANGLES: usize = 60_000;

/// Field-of-view factor: focal length as a fraction of the panel size.
const FOCAL_FACTOR: f32 = 1.2;

/// Near clip distance.
const NEAR_CLIP: f32 = 0.1;

/// Degrees of rotation per dragged pixel.
const DRAG_DEGREES_PER_PX: f32 = 0.4;

/// Build plate grid pitch, millimetres.
const GRID_PITCH_MM: f32 = 10.0;

type Vec3 = Vector3<f32>;
type Pt3 = Point3<f32>;

/// Orbit-camera state for the 3D preview.
#[derive(Debug)]
pub struct Viewport3d {
    yaw_deg: f32,
    pitch_deg: f32,
    distance: f32,
    target: Pt3,
}

impl Viewport3d {
    pub fn new() -> Self {
        Self {
            yaw_deg: 45.0,
            pitch_deg: 30.0,
            distance: 150.0,
            target: Pt3::origin(),
        }
    }

    /// Point the camera at the mesh and back off far enough to frame it.
    pub fn frame_mesh(&mut self, mesh: &TriMesh) {
        let c = mesh.center();
        self.target = Pt3::new(c.x as f32, c.y as f32, c.z as f32);

        let d = mesh.dimensions();
        let max_dim = d.x.max(d.y).max(d.z) as f32;
        self.distance = (max_dim * 2.0).max(1.0);
        self.yaw_deg = 45.0;
        self.pitch_deg = 30.0;

        tracing::debug!(
            distance = self.distance,
            target = ?self.target.coords.as_slice(),
            "Viewport camera framed"
        );
    }

    /// Render the viewport into the available space and handle interaction.
    pub fn show(&mut self, ui: &mut egui::Ui, mesh: Option<&TriMesh>) {
        let size = ui.available_size();
        let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        painter.rect_filled(rect, egui::CornerRadius::ZERO, theme::VIEWPORT_BG);

        // -- Interaction --
        if response.dragged() {
            let delta = response.drag_delta();
            self.yaw_deg -= delta.x * DRAG_DEGREES_PER_PX;
            self.pitch_deg = (self.pitch_deg + delta.y * DRAG_DEGREES_PER_PX).clamp(-89.0, 89.0);
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                self.distance = (self.distance * 0.999_f32.powf(scroll * 3.0)).clamp(1.0, 1.0e5);
            }
        }

        let camera = Camera::new(self, rect);

        let Some(mesh) = mesh else {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "No model loaded — use \u{201c}Show STL\u{201d}",
                egui::FontId::proportional(14.0),
                theme::DIM,
            );
            return;
        };

        self.paint_plate(&painter, &camera, mesh);
        self.paint_mesh(&painter, &camera, mesh);
        self.paint_axes(&painter, &camera);
    }

    // -------------------------------------------------------------------------
    // Painting
    // -------------------------------------------------------------------------

    fn paint_mesh(&self, painter: &egui::Painter, camera: &Camera, mesh: &TriMesh) {
        let step = (mesh.triangle_count() / MAX_DRAWN_TRIANGLES).max(1);
        let light = Vec3::new(0.35, -0.45, 0.82).normalize();

        // Project, shade, and depth-key every drawn triangle.
        let mut faces: Vec<(f32, [Pos2; 3], Color32)> =
            Vec::with_capacity(mesh.triangle_count() / step + 1);

        let p32 = |p: &crate::core::mesh::Point3D| Pt3::new(p.x as f32, p.y as f32, p.z as f32);

        for tri in mesh.triangles.iter().step_by(step) {
            let a = camera.project(p32(&tri.a));
            let b = camera.project(p32(&tri.b));
            let c = camera.project(p32(&tri.c));
            let (Some(a), Some(b), Some(c)) = (a, b, c) else {
                continue; // behind the near plane
            };

            let n = tri.normal();
            let n = Vec3::new(n.x as f32, n.y as f32, n.z as f32);
            // Both winding orders occur in the wild; shade by unsigned
            // incidence rather than culling.
            let lambert = n.dot(&light).abs();
            let lum = 0.25 + 0.75 * lambert;
            let base = theme::MESH_BASE;
            let colour = Color32::from_rgb(
                (base.r() as f32 * lum) as u8,
                (base.g() as f32 * lum) as u8,
                (base.b() as f32 * lum) as u8,
            );

            let depth = (a.1 + b.1 + c.1) / 3.0;
            faces.push((depth, [a.0, b.0, c.0], colour));
        }

        // Painter's algorithm: far faces first.
        faces.sort_by(|x, y| y.0.total_cmp(&x.0));

        for (_, pts, colour) in faces {
            painter.add(Shape::convex_polygon(
                pts.to_vec(),
                colour,
                Stroke::NONE,
            ));
        }
    }

    /// Grid on the build plate at the bottom of the mesh bounds.
    fn paint_plate(&self, painter: &egui::Painter, camera: &Camera, mesh: &TriMesh) {
        let z = mesh.min.z as f32;
        let pad = GRID_PITCH_MM * 2.0;
        let x0 = (mesh.min.x as f32 / GRID_PITCH_MM).floor() * GRID_PITCH_MM - pad;
        let x1 = (mesh.max.x as f32 / GRID_PITCH_MM).ceil() * GRID_PITCH_MM + pad;
        let y0 = (mesh.min.y as f32 / GRID_PITCH_MM).floor() * GRID_PITCH_MM - pad;
        let y1 = (mesh.max.y as f32 / GRID_PITCH_MM).ceil() * GRID_PITCH_MM + pad;

        let stroke = Stroke::new(1.0, theme::PLATE_GRID);

        let mut x = x0;
        while x <= x1 {
            self.line(painter, camera, Pt3::new(x, y0, z), Pt3::new(x, y1, z), stroke);
            x += GRID_PITCH_MM;
        }
        let mut y = y0;
        while y <= y1 {
            self.line(painter, camera, Pt3::new(x0, y, z), Pt3::new(x1, y, z), stroke);
            y += GRID_PITCH_MM;
        }
    }

    /// Origin axes: X red, Y green, Z blue.
    fn paint_axes(&self, painter: &egui::Painter, camera: &Camera) {
        let o = Pt3::origin();
        let len = self.distance * 0.15;
        let axes = [
            (Pt3::new(len, 0.0, 0.0), theme::AXIS_X),
            (Pt3::new(0.0, len, 0.0), theme::AXIS_Y),
            (Pt3::new(0.0, 0.0, len), theme::AXIS_Z),
        ];
        for (end, colour) in axes {
            self.line(painter, camera, o, end, Stroke::new(2.0, colour));
        }
    }

    fn line(
        &self,
        painter: &egui::Painter,
        camera: &Camera,
        from: Pt3,
        to: Pt3,
        stroke: Stroke,
    ) {
        if let (Some((a, _)), Some((b, _))) = (camera.project(from), camera.project(to)) {
            painter.line_segment([a, b], stroke);
        }
    }
}

impl Default for Viewport3d {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Camera
// =============================================================================

/// Frozen view/projection for one frame.
struct Camera {
    eye: Pt3,
    right: Vec3,
    up: Vec3,
    forward: Vec3,
    focal: f32,
    centre: Pos2,
}

impl Camera {
    fn new(view: &Viewport3d, rect: egui::Rect) -> Self {
        let yaw = view.yaw_deg.to_radians();
        let pitch = view.pitch_deg.to_radians();

        // Orbit position on the sphere around the target; world Z is up.
        let offset = Vec3::new(
            pitch.cos() * yaw.cos(),
            pitch.cos() * yaw.sin(),
            pitch.sin(),
        ) * view.distance;
        let eye = view.target + offset;

        let forward = (view.target - eye).normalize();
        let world_up = Vec3::new(0.0, 0.0, 1.0);
        let right = forward.cross(&world_up).normalize();
        let up = right.cross(&forward);

        Self {
            eye,
            right,
            up,
            forward,
            focal: rect.width().min(rect.height()) * FOCAL_FACTOR,
            centre: rect.center(),
        }
    }

    /// Project a world point. Returns screen position and camera depth,
    /// or `None` when the point is behind the near plane.
    fn project(&self, p: Pt3) -> Option<(Pos2, f32)> {
        let v = p - self.eye;
        let depth = v.dot(&self.forward);
        if depth <= NEAR_CLIP {
            return None;
        }
        let scale = self.focal / depth;
        let x = v.dot(&self.right) * scale;
        let y = v.dot(&self.up) * scale;
        // Screen Y grows downward.
        Some((self.centre + Vec2::new(x, -y), depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::{Point3D, Triangle};

    fn mesh() -> TriMesh {
        TriMesh::new(vec![Triangle::new(
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(20.0, 0.0, 0.0),
            Point3D::new(0.0, 20.0, 10.0),
        )])
        .unwrap()
    }

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0))
    }

    #[test]
    fn framing_targets_mesh_centre() {
        let mut view = Viewport3d::new();
        view.frame_mesh(&mesh());
        assert_eq!(view.target, Pt3::new(10.0, 10.0, 5.0));
        assert!((view.distance - 40.0).abs() < 1e-6);
    }

    #[test]
    fn target_projects_to_panel_centre() {
        let mut view = Viewport3d::new();
        view.frame_mesh(&mesh());
        let camera = Camera::new(&view, test_rect());

        let (pos, depth) = camera.project(view.target).unwrap();
        assert!((pos.x - 400.0).abs() < 0.5);
        assert!((pos.y - 300.0).abs() < 0.5);
        assert!((depth - view.distance).abs() < 1e-3);
    }

    #[test]
    fn points_behind_camera_are_clipped() {
        let mut view = Viewport3d::new();
        view.frame_mesh(&mesh());
        let camera = Camera::new(&view, test_rect());

        // A point well behind the eye along the view ray.
        let behind = camera.eye + (camera.eye - view.target);
        assert!(camera.project(behind).is_none());
    }

    #[test]
    fn nearer_points_have_smaller_depth() {
        let mut view = Viewport3d::new();
        view.frame_mesh(&mesh());
        let camera = Camera::new(&view, test_rect());

        let near = view.target + (camera.eye - view.target) * 0.5;
        let (_, d_near) = camera.project(near).unwrap();
        let (_, d_far) = camera.project(view.target).unwrap();
        assert!(d_near < d_far);
    }
}
