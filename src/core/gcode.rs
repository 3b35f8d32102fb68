// PrintBench - core/gcode.rs
//
// G-code composition for machine controls and read-only scanning of job
// files.
//
// Composition covers exactly what the front panel needs: bracketed relative
// jog moves and the GRBL-style alarm unlock. Job files are never rewritten;
// scanning extracts counts, extents, and travel length so the user can sanity
// check a job before streaming it.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::util::constants;
use crate::util::error::GcodeError;

// =============================================================================
// Command composition
// =============================================================================

/// Machine axis for jog moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JogAxis {
    X,
    Y,
    Z,
}

impl JogAxis {
    /// G-code word letter.
    pub fn word(&self) -> char {
        match self {
            Self::X => 'X',
            Self::Y => 'Y',
            Self::Z => 'Z',
        }
    }
}

impl std::fmt::Display for JogAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        })
    }
}

/// Compose a single jog move.
///
/// The move is issued in relative mode and absolute positioning is restored
/// afterwards regardless of sign or axis, so a jog can never leave the
/// controller in relative mode.
pub fn jog_commands(
    axis: JogAxis,
    distance_mm: f64,
    feed_mm_min: f64,
) -> Result<Vec<String>, GcodeError> {
    if !distance_mm.is_finite() || distance_mm == 0.0 {
        return Err(GcodeError::InvalidJog {
            reason: format!("distance {distance_mm} mm"),
        });
    }
    if !feed_mm_min.is_finite()
        || feed_mm_min < constants::MIN_JOG_FEED_MM_MIN
        || feed_mm_min > constants::MAX_JOG_FEED_MM_MIN
    {
        return Err(GcodeError::InvalidJog {
            reason: format!("feed rate {feed_mm_min} mm/min"),
        });
    }

    Ok(vec![
        "G91".to_string(),
        format!("G0 {}{distance_mm:.3} F{feed_mm_min:.0}", axis.word()),
        "G90".to_string(),
    ])
}

/// GRBL-style alarm unlock.
pub fn unlock_command() -> &'static str {
    "$X"
}

// =============================================================================
// Job file reading
// =============================================================================

/// Read a job file as UTF-8 text.
///
/// Files at or above GCODE_MMAP_THRESHOLD are memory-mapped so a multi-
/// hundred-megabyte job does not get double-buffered through the heap.
pub fn read_job_file(path: &Path) -> Result<String, GcodeError> {
    let metadata = std::fs::metadata(path).map_err(|e| GcodeError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    if metadata.len() >= constants::GCODE_MMAP_THRESHOLD {
        let file = std::fs::File::open(path).map_err(|e| GcodeError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        // SAFETY: the map is read-only and dropped before this function
        // returns; concurrent truncation of a job file mid-read is outside
        // the supported workflow.
        let mmap = unsafe {
            memmap2::Mmap::map(&file).map_err(|e| GcodeError::Read {
                path: path.to_path_buf(),
                source: e,
            })?
        };
        std::str::from_utf8(&mmap)
            .map(|s| s.to_string())
            .map_err(|_| GcodeError::NotUtf8 {
                path: path.to_path_buf(),
            })
    } else {
        std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => GcodeError::NotUtf8 {
                path: path.to_path_buf(),
            },
            _ => GcodeError::Read {
                path: path.to_path_buf(),
                source: e,
            },
        })
    }
}

// =============================================================================
// Job scanning
// =============================================================================

/// Word regex: a G/M command or an axis/feed coordinate, e.g. `G1`, `X10.5`.
fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)([GMXYZF])\s*(-?\d+(?:\.\d+)?)").expect("static regex")
    })
}

/// Motion mode carried across lines (G-code words are modal: a line of bare
/// coordinates continues the last motion command).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MotionMode {
    None,
    Rapid,
    Linear,
    Arc,
}

/// Statistics extracted from one pass over a job file.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct GcodeSummary {
    pub total_lines: usize,
    pub command_lines: usize,
    pub comment_lines: usize,
    pub blank_lines: usize,

    pub rapid_moves: usize,
    pub linear_moves: usize,
    pub arc_moves: usize,
    pub other_commands: usize,

    /// XY extents over all move targets, when any coordinate appeared.
    pub min_x: Option<f64>,
    pub max_x: Option<f64>,
    pub min_y: Option<f64>,
    pub max_y: Option<f64>,
    pub min_z: Option<f64>,
    pub max_z: Option<f64>,

    /// Summed length of linear (G1) moves with known start and end, mm.
    pub travel_mm: f64,
}

impl GcodeSummary {
    /// Scan job text. Never fails: malformed lines count as "other".
    pub fn scan(content: &str) -> Self {
        let mut summary = Self::default();
        let mut mode = MotionMode::None;
        // Current position per axis; unknown until first mention.
        let mut pos: [Option<f64>; 3] = [None, None, None];

        for raw_line in content.lines() {
            summary.total_lines += 1;

            let line = strip_comments(raw_line);
            let trimmed = line.trim();
            if trimmed.is_empty() {
                if raw_line.trim().is_empty() {
                    summary.blank_lines += 1;
                } else {
                    summary.comment_lines += 1;
                }
                continue;
            }

            summary.command_lines += 1;

            let mut target = pos;
            let mut line_mode = None;
            let mut saw_other = false;

            for cap in word_pattern().captures_iter(trimmed) {
                let letter = cap[1].to_ascii_uppercase();
                let value: f64 = match cap[2].parse() {
                    Ok(v) => v,
                    Err(_) => continue,
                };
                match letter.as_str() {
                    "G" => match value as i64 {
                        0 => line_mode = Some(MotionMode::Rapid),
                        1 => line_mode = Some(MotionMode::Linear),
                        2 | 3 => line_mode = Some(MotionMode::Arc),
                        _ => saw_other = true,
                    },
                    "M" => saw_other = true,
                    "X" => target[0] = Some(value),
                    "Y" => target[1] = Some(value),
                    "Z" => target[2] = Some(value),
                    _ => {}
                }
            }

            if let Some(m) = line_mode {
                mode = m;
            }

            let moved = target != pos;
            if moved {
                match mode {
                    MotionMode::Rapid => summary.rapid_moves += 1,
                    MotionMode::Linear => {
                        summary.linear_moves += 1;
                        if let (Some(x0), Some(y0), Some(x1), Some(y1)) =
                            (pos[0], pos[1], target[0], target[1])
                        {
                            let dz = match (pos[2], target[2]) {
                                (Some(z0), Some(z1)) => z1 - z0,
                                _ => 0.0,
                            };
                            summary.travel_mm +=
                                ((x1 - x0).powi(2) + (y1 - y0).powi(2) + dz.powi(2)).sqrt();
                        }
                    }
                    MotionMode::Arc => summary.arc_moves += 1,
                    MotionMode::None => saw_other = true,
                }

                if let Some(x) = target[0] {
                    summary.min_x = Some(summary.min_x.map_or(x, |m| m.min(x)));
                    summary.max_x = Some(summary.max_x.map_or(x, |m| m.max(x)));
                }
                if let Some(y) = target[1] {
                    summary.min_y = Some(summary.min_y.map_or(y, |m| m.min(y)));
                    summary.max_y = Some(summary.max_y.map_or(y, |m| m.max(y)));
                }
                if let Some(z) = target[2] {
                    summary.min_z = Some(summary.min_z.map_or(z, |m| m.min(z)));
                    summary.max_z = Some(summary.max_z.map_or(z, |m| m.max(z)));
                }

                pos = target;
            } else if saw_other || line_mode.is_none() {
                summary.other_commands += 1;
            }
        }

        summary
    }

    /// Total motion commands.
    pub fn move_count(&self) -> usize {
        self.rapid_moves + self.linear_moves + self.arc_moves
    }

    /// Compact one-line description for the status bar and model panel.
    pub fn describe(&self) -> String {
        let extent = match (self.min_x, self.max_x, self.min_y, self.max_y) {
            (Some(x0), Some(x1), Some(y0), Some(y1)) => {
                format!(", {:.0}x{:.0} mm", x1 - x0, y1 - y0)
            }
            _ => String::new(),
        };
        format!(
            "{} moves ({} rapid, {} linear, {} arc){extent}, {:.0} mm travel",
            self.move_count(),
            self.rapid_moves,
            self.linear_moves,
            self.arc_moves,
            self.travel_mm,
        )
    }
}

/// Lines to stream for a job: comments and blanks removed, in file order.
pub fn streamable_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(strip_comments)
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

/// Remove `;` line comments and `( ... )` inline comments.
fn strip_comments(line: &str) -> String {
    let line = match line.find(';') {
        Some(i) => &line[..i],
        None => line,
    };
    let mut out = String::with_capacity(line.len());
    let mut depth = 0usize;
    for ch in line.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jog_brackets_relative_mode() {
        let cmds = jog_commands(JogAxis::X, -12.5, 1500.0).unwrap();
        assert_eq!(cmds, vec!["G91", "G0 X-12.500 F1500", "G90"]);
    }

    #[test]
    fn jog_rejects_zero_distance_and_bad_feed() {
        assert!(jog_commands(JogAxis::Y, 0.0, 1500.0).is_err());
        assert!(jog_commands(JogAxis::Y, 1.0, 0.0).is_err());
        assert!(jog_commands(JogAxis::Z, 1.0, f64::NAN).is_err());
    }

    #[test]
    fn scan_counts_moves_and_extents() {
        let job = "\
; test job
G21
G0 X0 Y0 Z5
G1 X10 Y0 F600
G1 X10 Y10
G1 X0 Y10

(park)
G0 X0 Y0
";
        let s = GcodeSummary::scan(job);
        assert_eq!(s.rapid_moves, 2);
        assert_eq!(s.linear_moves, 3);
        assert_eq!(s.arc_moves, 0);
        assert_eq!(s.comment_lines, 2);
        assert_eq!(s.blank_lines, 1);
        assert_eq!(s.min_x, Some(0.0));
        assert_eq!(s.max_x, Some(10.0));
        assert_eq!(s.max_y, Some(10.0));
        // Three 10 mm sides.
        assert!((s.travel_mm - 30.0).abs() < 1e-9, "travel {}", s.travel_mm);
    }

    #[test]
    fn scan_honours_modal_motion() {
        // Bare-coordinate lines continue the previous G1.
        let job = "G1 X0 Y0 F300\nX5\nY5\n";
        let s = GcodeSummary::scan(job);
        assert_eq!(s.linear_moves, 3);
    }

    #[test]
    fn comment_only_job_has_zero_moves() {
        let s = GcodeSummary::scan("; nothing here\n( just a note )\n");
        assert_eq!(s.move_count(), 0);
        assert_eq!(s.command_lines, 0);
        assert_eq!(s.comment_lines, 2);
    }

    #[test]
    fn streamable_lines_drop_comments_and_blanks() {
        let lines = streamable_lines("G21\n; skip\nG0 X1 (inline) Y2\n\n");
        assert_eq!(lines, vec!["G21", "G0 X1  Y2"]);
    }
}
