// PrintBench - app/slice_job.rs
//
// Slice job lifecycle management. Runs the load -> cut -> rasterise
// pipeline on a background thread, sending progress messages to the UI
// thread via an mpsc channel.
//
// Architecture:
//   - `SliceManager` lives on the UI thread; `run_slice_job` runs on a
//     background thread.
//   - An `Arc<AtomicBool>` cancel flag allows the UI to stop the job
//     cooperatively.
//   - All cross-thread communication is via `SliceProgress` channel messages.
//   - Planes are cut and rasterised in ascending-Z batches: within a batch
//     rayon fans out across planes, between batches cancel is honoured and
//     a `LayerBatch` is streamed so the viewer fills in from the bottom up.

use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Instant;

use crate::core::mesh::TriMesh;
use crate::core::model::{SliceLayer, SliceProgress, SliceSummary};
use crate::core::raster::{self, PixelFrame, RasterConfig};
use crate::core::slice::{self, SliceConfig};
use crate::util::constants;

/// Manages a slice job on a background thread.
pub struct SliceManager {
    /// Channel receiver for the UI to poll progress messages.
    progress_rx: Option<mpsc::Receiver<SliceProgress>>,

    /// Cancel flag shared with the background thread.
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl SliceManager {
    pub fn new() -> Self {
        Self {
            progress_rx: None,
            cancel_flag: None,
        }
    }

    /// Start slicing `path`. Spawns a background thread immediately;
    /// progress arrives over the channel. A running job is cancelled first.
    pub fn start_slice(&mut self, path: PathBuf, config: SliceConfig, raster: RasterConfig) {
        self.cancel_slice();

        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));

        self.progress_rx = Some(rx);
        self.cancel_flag = Some(Arc::clone(&cancel));

        std::thread::spawn(move || {
            run_slice_job(path, config, raster, tx, cancel);
        });

        tracing::info!("Slice job started");
    }

    /// Request cancellation of the running job.
    /// The background thread will send `SliceProgress::Cancelled` and exit.
    pub fn cancel_slice(&mut self) {
        if let Some(flag) = &self.cancel_flag {
            flag.store(true, Ordering::SeqCst);
        }
        self.cancel_flag = None;
    }

    /// Poll for progress messages without blocking. Returns all pending
    /// messages.
    pub fn poll_progress(&self) -> Vec<SliceProgress> {
        let mut messages = Vec::new();
        if let Some(ref rx) = self.progress_rx {
            while let Ok(msg) = rx.try_recv() {
                messages.push(msg);
            }
        }
        messages
    }
}

impl Default for SliceManager {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Background slice pipeline
// =============================================================================

/// Full pipeline: mesh load -> plane generation -> batched cut+rasterise.
///
/// Runs on a background thread. Sends `SliceProgress` messages to `tx` and
/// checks `cancel` between batches.
fn run_slice_job(
    path: PathBuf,
    config: SliceConfig,
    raster: RasterConfig,
    tx: mpsc::Sender<SliceProgress>,
    cancel: Arc<AtomicBool>,
) {
    macro_rules! send {
        ($msg:expr) => {
            if tx.send($msg).is_err() {
                return; // Receiver dropped (UI closed); exit quietly.
            }
        };
    }

    macro_rules! check_cancel {
        () => {
            if cancel.load(Ordering::SeqCst) {
                send!(SliceProgress::Cancelled);
                return;
            }
        };
    }

    let job_start = Instant::now();
    send!(SliceProgress::Started { path: path.clone() });

    // -------------------------------------------------------------------------
    // Phase 1: Load
    // -------------------------------------------------------------------------
    // The job re-reads the STL from disk rather than borrowing the viewport
    // mesh, so a slice can run even when the model was never shown.
    let mesh = match TriMesh::load_stl(&path) {
        Ok(m) => m,
        Err(e) => {
            send!(SliceProgress::Failed {
                error: e.to_string(),
            });
            return;
        }
    };

    send!(SliceProgress::MeshLoaded {
        triangle_count: mesh.triangle_count(),
        bounds_min: [mesh.min.x, mesh.min.y, mesh.min.z],
        bounds_max: [mesh.max.x, mesh.max.y, mesh.max.z],
    });

    check_cancel!();

    // -------------------------------------------------------------------------
    // Phase 2: Plan
    // -------------------------------------------------------------------------
    if let Err(e) = config.validate() {
        send!(SliceProgress::Failed {
            error: e.to_string(),
        });
        return;
    }

    let heights = slice::plane_heights(mesh.min.z, mesh.max.z, config.layer_height);
    if heights.len() > constants::MAX_SLICE_LAYERS {
        let err = crate::util::error::SliceError::TooManyLayers {
            requested: heights.len(),
            max: constants::MAX_SLICE_LAYERS,
        };
        send!(SliceProgress::Failed {
            error: err.to_string(),
        });
        return;
    }

    let total_planes = heights.len();
    send!(SliceProgress::PlanesPlanned { total_planes });

    // One pixel frame for the whole stack keeps layers registered.
    let frame = PixelFrame::fit(&mesh, &raster);

    // -------------------------------------------------------------------------
    // Phase 3: Cut + rasterise, bottom up
    // -------------------------------------------------------------------------
    let mut layer_index: usize = 0;
    let mut empty_planes: usize = 0;
    let mut completed_planes: usize = 0;

    for chunk in heights.chunks(constants::LAYER_BATCH_SIZE) {
        check_cancel!();

        // Fan out across the planes of this batch; collect preserves order.
        let cuts: Vec<_> = chunk
            .par_iter()
            .map(|&z| {
                let cut = slice::cut_plane(&mesh, z, config.tolerance);
                let image = raster::rasterize_plane(&cut, &frame);
                (cut, image)
            })
            .collect();

        completed_planes += chunk.len();

        let mut layers = Vec::new();
        for (cut, image) in cuts {
            if cut.is_empty() {
                empty_planes += 1;
                continue;
            }
            layers.push(SliceLayer {
                index: layer_index,
                z: cut.z,
                outline_count: cut.outlines.len(),
                closed_count: cut.outlines.iter().filter(|o| o.closed).count(),
                point_count: cut.point_count(),
                image,
            });
            layer_index += 1;
        }

        if !layers.is_empty() {
            send!(SliceProgress::LayerBatch {
                layers,
                completed_planes,
                total_planes,
            });
        }
    }

    check_cancel!();

    if layer_index == 0 {
        send!(SliceProgress::Warning {
            message: "No cross-sections produced — the mesh may be flat or degenerate."
                .to_string(),
        });
    }

    let summary = SliceSummary {
        path,
        triangle_count: mesh.triangle_count(),
        bounds_min: [mesh.min.x, mesh.min.y, mesh.min.z],
        bounds_max: [mesh.max.x, mesh.max.y, mesh.max.z],
        layer_height_mm: config.layer_height,
        layer_count: layer_index,
        empty_planes,
        duration: job_start.elapsed(),
    };

    tracing::info!(
        layers = summary.layer_count,
        empty_planes = summary.empty_planes,
        duration_ms = summary.duration.as_millis() as u64,
        "Slice job complete"
    );

    send!(SliceProgress::Completed { summary });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Poll the manager until a terminal message arrives or the timeout hits.
    fn drain_until_terminal(manager: &SliceManager) -> Vec<SliceProgress> {
        let deadline = Instant::now() + Duration::from_secs(30);
        let mut all = Vec::new();
        loop {
            for msg in manager.poll_progress() {
                let terminal = matches!(
                    msg,
                    SliceProgress::Completed { .. }
                        | SliceProgress::Failed { .. }
                        | SliceProgress::Cancelled
                );
                all.push(msg);
                if terminal {
                    return all;
                }
            }
            assert!(Instant::now() < deadline, "job did not finish: {all:?}");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn missing_file_fails_with_typed_message() {
        let mut manager = SliceManager::new();
        manager.start_slice(
            PathBuf::from("/nonexistent/printbench-job.stl"),
            SliceConfig::default(),
            RasterConfig::square(64),
        );

        let messages = drain_until_terminal(&manager);
        match messages.last().unwrap() {
            SliceProgress::Failed { error } => {
                assert!(error.contains("printbench-job.stl"), "error: {error}");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn cancel_before_start_is_a_no_op() {
        let mut manager = SliceManager::new();
        manager.cancel_slice();
        assert!(manager.poll_progress().is_empty());
    }
}
