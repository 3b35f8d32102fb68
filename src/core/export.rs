// PrintBench - core/export.rs
//
// Slice report export: per-layer statistics as CSV or JSON.
// Exports the stack exactly as sliced; no recomputation.

use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::core::model::SliceLayer;
use crate::util::error::ExportError;

/// One exported row.
#[derive(Debug, Serialize)]
struct LayerRecord {
    layer: usize,
    z_mm: f64,
    outlines: usize,
    closed_outlines: usize,
    points: usize,
}

impl LayerRecord {
    fn from_layer(layer: &SliceLayer) -> Self {
        Self {
            layer: layer.index,
            z_mm: layer.z,
            outlines: layer.outline_count,
            closed_outlines: layer.closed_count,
            points: layer.point_count,
        }
    }
}

/// Write per-layer statistics as CSV. Returns the number of rows written.
pub fn export_csv<W: Write>(
    layers: &[SliceLayer],
    writer: W,
    path: &Path,
) -> Result<usize, ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for layer in layers {
        csv_writer
            .serialize(LayerRecord::from_layer(layer))
            .map_err(|e| ExportError::Csv {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(rows = layers.len(), path = %path.display(), "CSV report written");
    Ok(layers.len())
}

/// Write per-layer statistics as a JSON array. Returns the number of rows.
pub fn export_json<W: Write>(
    layers: &[SliceLayer],
    mut writer: W,
    path: &Path,
) -> Result<usize, ExportError> {
    let records: Vec<LayerRecord> = layers.iter().map(LayerRecord::from_layer).collect();

    serde_json::to_writer_pretty(&mut writer, &records).map_err(|e| ExportError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;

    writer.write_all(b"\n").map_err(|e| ExportError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(rows = records.len(), path = %path.display(), "JSON report written");
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_layers() -> Vec<SliceLayer> {
        (0..3)
            .map(|i| SliceLayer {
                index: i,
                z: 0.5 + i as f64,
                outline_count: 2,
                closed_count: 1,
                point_count: 40 + i,
                image: image::RgbaImage::new(1, 1),
            })
            .collect()
    }

    #[test]
    fn csv_export_has_header_and_rows() {
        let layers = sample_layers();
        let mut buf = Vec::new();
        let n = export_csv(&layers, &mut buf, Path::new("report.csv")).unwrap();
        assert_eq!(n, 3);

        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "layer,z_mm,outlines,closed_outlines,points"
        );
        assert_eq!(lines.clone().count(), 3);
        assert!(lines.next().unwrap().starts_with("0,0.5,2,1,40"));
    }

    #[test]
    fn json_export_roundtrips() {
        let layers = sample_layers();
        let mut buf = Vec::new();
        export_json(&layers, &mut buf, Path::new("report.json")).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let rows = parsed.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2]["z_mm"], 2.5);
        assert_eq!(rows[2]["points"], 42);
    }
}
