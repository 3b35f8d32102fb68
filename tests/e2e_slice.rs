// PrintBench - tests/e2e_slice.rs
//
// End-to-end tests for the model pipeline.
//
// These tests exercise the real filesystem, real STL encoding/decoding,
// real plane cutting, and real rasterisation — no mocks, no stubs. This
// exercises the full path from an STL file on disk to a registered stack
// of layer images, and from a G-code job file to its scan summary.

use std::path::Path;

use printbench::app::slice_job::SliceManager;
use printbench::core::gcode::{self, GcodeSummary};
use printbench::core::mesh::TriMesh;
use printbench::core::model::SliceProgress;
use printbench::core::raster::{rasterize_plane, PixelFrame, RasterConfig};
use printbench::core::slice::{slice_mesh, SliceConfig};

// =============================================================================
// Helpers
// =============================================================================

/// Write a `w x d x h` box, corner at the origin, as a real binary STL.
fn write_box_stl(path: &Path, w: f32, d: f32, h: f32) {
    let v = stl_io::Vertex::new;
    let quad = |a: [f32; 3], b: [f32; 3], c: [f32; 3], dd: [f32; 3], n: [f32; 3]| {
        [
            stl_io::Triangle {
                normal: stl_io::Normal::new(n),
                vertices: [v(a), v(b), v(c)],
            },
            stl_io::Triangle {
                normal: stl_io::Normal::new(n),
                vertices: [v(a), v(c), v(dd)],
            },
        ]
    };

    let mut triangles = Vec::new();
    // bottom / top
    triangles.extend(quad(
        [0., 0., 0.],
        [w, 0., 0.],
        [w, d, 0.],
        [0., d, 0.],
        [0., 0., -1.],
    ));
    triangles.extend(quad(
        [0., 0., h],
        [w, 0., h],
        [w, d, h],
        [0., d, h],
        [0., 0., 1.],
    ));
    // front / back
    triangles.extend(quad(
        [0., 0., 0.],
        [w, 0., 0.],
        [w, 0., h],
        [0., 0., h],
        [0., -1., 0.],
    ));
    triangles.extend(quad(
        [0., d, 0.],
        [w, d, 0.],
        [w, d, h],
        [0., d, h],
        [0., 1., 0.],
    ));
    // left / right
    triangles.extend(quad(
        [0., 0., 0.],
        [0., d, 0.],
        [0., d, h],
        [0., 0., h],
        [-1., 0., 0.],
    ));
    triangles.extend(quad(
        [w, 0., 0.],
        [w, d, 0.],
        [w, d, h],
        [w, 0., h],
        [1., 0., 0.],
    ));

    let mut file = std::fs::File::create(path).unwrap();
    stl_io::write_stl(&mut file, triangles.into_iter()).unwrap();
}

// =============================================================================
// STL -> stack E2E
// =============================================================================

/// The whole synchronous pipeline: file on disk -> mesh -> cuts -> images.
#[test]
fn e2e_box_stl_becomes_registered_layer_stack() {
    let dir = tempfile::tempdir().unwrap();
    let stl_path = dir.path().join("box.stl");
    write_box_stl(&stl_path, 20.0, 10.0, 5.0);

    let mesh = TriMesh::load_stl(&stl_path).unwrap();
    assert_eq!(mesh.triangle_count(), 12);
    assert_eq!(mesh.dimensions().z, 5.0);

    let cuts = slice_mesh(&mesh, &SliceConfig::default()).unwrap();
    assert_eq!(cuts.len(), 5, "1 mm layers through a 5 mm box");

    // Ascending Z, one closed rectangle per cut.
    for pair in cuts.windows(2) {
        assert!(pair[0].z < pair[1].z);
    }
    for cut in &cuts {
        assert_eq!(cut.outlines.len(), 1);
        assert!(cut.outlines[0].closed);
    }

    // Rasterise with the shared frame: a box cross-section is identical on
    // every layer, so every image must be byte-identical (registration).
    let raster = RasterConfig::square(128);
    let frame = PixelFrame::fit(&mesh, &raster);
    let images: Vec<_> = cuts.iter().map(|c| rasterize_plane(c, &frame)).collect();

    let first = images[0].as_raw();
    for image in &images[1..] {
        assert_eq!(image.as_raw(), first, "layer images not registered");
    }

    // The box centre is inside the section on every layer.
    let (cx, cy) = frame.project([10.0, 5.0]);
    let centre = *images[0].get_pixel(cx as u32, cy as u32);
    assert_ne!(centre, image::Rgba([255, 255, 255, 255]), "centre not filled");
}

/// The background slice job delivers the same stack through the channel,
/// bottom-up, with a terminal summary.
#[test]
fn e2e_slice_job_streams_ordered_batches() {
    let dir = tempfile::tempdir().unwrap();
    let stl_path = dir.path().join("tall_box.stl");
    write_box_stl(&stl_path, 10.0, 10.0, 12.0);

    let mut manager = SliceManager::new();
    manager.start_slice(
        stl_path.clone(),
        SliceConfig::default(),
        RasterConfig::square(64),
    );

    // Drain until a terminal message (bounded wait).
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(60);
    let mut layers = Vec::new();
    let mut summary = None;
    'outer: loop {
        for msg in manager.poll_progress() {
            match msg {
                SliceProgress::LayerBatch {
                    layers: batch,
                    completed_planes,
                    total_planes,
                } => {
                    assert!(completed_planes <= total_planes);
                    layers.extend(batch);
                }
                SliceProgress::Completed { summary: s } => {
                    summary = Some(s);
                    break 'outer;
                }
                SliceProgress::Failed { error } => panic!("job failed: {error}"),
                SliceProgress::Cancelled => panic!("job cancelled"),
                _ => {}
            }
        }
        assert!(std::time::Instant::now() < deadline, "job did not finish");
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    let summary = summary.unwrap();
    assert_eq!(summary.layer_count, 12);
    assert_eq!(summary.layer_count, layers.len());
    assert_eq!(summary.path, stl_path);
    assert_eq!(summary.empty_planes, 0);

    // Indices are contiguous bottom-up and Z strictly increases.
    for (i, layer) in layers.iter().enumerate() {
        assert_eq!(layer.index, i);
        assert_eq!(layer.image.width(), 64);
    }
    for pair in layers.windows(2) {
        assert!(pair[0].z < pair[1].z);
    }
}

/// A non-STL file fails with a decode error naming the file, not a panic.
#[test]
fn e2e_garbage_stl_is_a_typed_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not_really.stl");
    std::fs::write(&path, b"this is not an stl file at all").unwrap();

    let err = TriMesh::load_stl(&path).unwrap_err();
    assert!(err.to_string().contains("not_really.stl"), "{err}");
}

// =============================================================================
// G-code job E2E
// =============================================================================

/// A job file on disk is read and scanned into the expected summary.
#[test]
fn e2e_gcode_job_scan_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let job_path = dir.path().join("perimeter.gcode");
    std::fs::write(
        &job_path,
        "\
; 20mm square perimeter
G21
G90
G0 X0 Y0 Z1
G1 X20 Y0 F900
G1 X20 Y20
G1 X0 Y20
G1 X0 Y0
G0 Z10
",
    )
    .unwrap();

    let content = gcode::read_job_file(&job_path).unwrap();
    let summary = GcodeSummary::scan(&content);

    assert_eq!(summary.rapid_moves, 2);
    assert_eq!(summary.linear_moves, 4);
    assert_eq!(summary.min_x, Some(0.0));
    assert_eq!(summary.max_x, Some(20.0));
    assert_eq!(summary.max_y, Some(20.0));
    assert!((summary.travel_mm - 80.0).abs() < 1e-9, "{}", summary.travel_mm);

    // Streamable form drops the comment but keeps every command.
    let lines = gcode::streamable_lines(&content);
    assert_eq!(lines.len(), summary.command_lines);
    assert_eq!(lines[0], "G21");
}

// =============================================================================
// Report export E2E
// =============================================================================

/// Slice a real model and export its report through a real file.
#[test]
fn e2e_report_export_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let stl_path = dir.path().join("box.stl");
    write_box_stl(&stl_path, 8.0, 8.0, 3.0);

    let mesh = TriMesh::load_stl(&stl_path).unwrap();
    let cuts = slice_mesh(&mesh, &SliceConfig::default()).unwrap();
    let frame = PixelFrame::fit(&mesh, &RasterConfig::square(32));

    let layers: Vec<printbench::core::model::SliceLayer> = cuts
        .iter()
        .enumerate()
        .map(|(i, cut)| printbench::core::model::SliceLayer {
            index: i,
            z: cut.z,
            outline_count: cut.outlines.len(),
            closed_count: cut.outlines.iter().filter(|o| o.closed).count(),
            point_count: cut.point_count(),
            image: rasterize_plane(cut, &frame),
        })
        .collect();

    let csv_path = dir.path().join("report.csv");
    let rows = printbench::core::export::export_csv(
        &layers,
        std::fs::File::create(&csv_path).unwrap(),
        &csv_path,
    )
    .unwrap();
    assert_eq!(rows, 3);

    let text = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(text.lines().count(), 4, "header + 3 rows:\n{text}");
    assert!(text.starts_with("layer,z_mm,"));

    let json_path = dir.path().join("report.json");
    printbench::core::export::export_json(
        &layers,
        std::fs::File::create(&json_path).unwrap(),
        &json_path,
    )
    .unwrap();

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 3);
}
