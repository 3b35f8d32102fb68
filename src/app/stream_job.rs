// PrintBench - app/stream_job.rs
//
// G-code job streaming. Reads a job file on a background thread and feeds
// its command lines to the UI in paced batches; the UI records them through
// the printer link so the console shows the job playing out.
//
// Same manager/worker split as the slice job: mpsc progress channel,
// Arc<AtomicBool> cooperative cancel.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use crate::core::gcode;
use crate::core::model::StreamProgress;
use crate::util::constants;

/// Manages one job stream on a background thread.
pub struct StreamManager {
    progress_rx: Option<mpsc::Receiver<StreamProgress>>,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl StreamManager {
    pub fn new() -> Self {
        Self {
            progress_rx: None,
            cancel_flag: None,
        }
    }

    /// Start streaming `path`. A running stream is cancelled first.
    pub fn start_stream(&mut self, path: PathBuf) {
        self.cancel_stream();

        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));

        self.progress_rx = Some(rx);
        self.cancel_flag = Some(Arc::clone(&cancel));

        std::thread::spawn(move || {
            run_stream_job(path, tx, cancel);
        });

        tracing::info!("Job stream started");
    }

    /// Request cancellation of the running stream.
    pub fn cancel_stream(&mut self) {
        if let Some(flag) = &self.cancel_flag {
            flag.store(true, Ordering::SeqCst);
        }
        self.cancel_flag = None;
    }

    /// Poll for progress messages without blocking.
    pub fn poll_progress(&self) -> Vec<StreamProgress> {
        let mut messages = Vec::new();
        if let Some(ref rx) = self.progress_rx {
            while let Ok(msg) = rx.try_recv() {
                messages.push(msg);
            }
        }
        messages
    }
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Background streaming
// =============================================================================

fn run_stream_job(path: PathBuf, tx: mpsc::Sender<StreamProgress>, cancel: Arc<AtomicBool>) {
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
                send!(StreamProgress::Cancelled);
                return;
            }
        };
    }

    let start = Instant::now();

    let content = match gcode::read_job_file(&path) {
        Ok(c) => c,
        Err(e) => {
            send!(StreamProgress::Failed {
                error: e.to_string(),
            });
            return;
        }
    };

    let lines = gcode::streamable_lines(&content);
    let total_lines = lines.len();

    send!(StreamProgress::Started {
        path,
        total_lines,
    });

    let mut sent_lines = 0usize;
    for chunk in lines.chunks(constants::STREAM_BATCH_SIZE) {
        check_cancel!();

        sent_lines += chunk.len();
        send!(StreamProgress::Lines {
            lines: chunk.to_vec(),
            sent_lines,
            total_lines,
        });

        // Pace the console instead of dumping the whole job in one frame.
        std::thread::sleep(Duration::from_millis(constants::STREAM_BATCH_DELAY_MS));
    }

    check_cancel!();

    tracing::info!(lines = sent_lines, "Job stream complete");
    send!(StreamProgress::Completed {
        sent_lines,
        duration: start.elapsed(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn drain_until_terminal(manager: &StreamManager) -> Vec<StreamProgress> {
        let deadline = Instant::now() + Duration::from_secs(30);
        let mut all = Vec::new();
        loop {
            for msg in manager.poll_progress() {
                let terminal = matches!(
                    msg,
                    StreamProgress::Completed { .. }
                        | StreamProgress::Failed { .. }
                        | StreamProgress::Cancelled
                );
                all.push(msg);
                if terminal {
                    return all;
                }
            }
            assert!(Instant::now() < deadline, "stream did not finish: {all:?}");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn streams_commands_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let job_path = dir.path().join("square.gcode");
        let mut f = std::fs::File::create(&job_path).unwrap();
        writeln!(f, "G21\n; comment\nG90\nG0 X0 Y0\nG1 X10 F600").unwrap();

        let mut manager = StreamManager::new();
        manager.start_stream(job_path);

        let messages = drain_until_terminal(&manager);

        let mut streamed = Vec::new();
        for msg in &messages {
            if let StreamProgress::Lines { lines, .. } = msg {
                streamed.extend(lines.iter().cloned());
            }
        }
        assert_eq!(streamed, vec!["G21", "G90", "G0 X0 Y0", "G1 X10 F600"]);

        match messages.last().unwrap() {
            StreamProgress::Completed { sent_lines, .. } => assert_eq!(*sent_lines, 4),
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[test]
    fn missing_job_file_fails() {
        let mut manager = StreamManager::new();
        manager.start_stream(PathBuf::from("/nonexistent/job.gcode"));

        let messages = drain_until_terminal(&manager);
        assert!(matches!(
            messages.last().unwrap(),
            StreamProgress::Failed { .. }
        ));
    }
}
