//! Safetensors output for features and intermediate arrays.
//!
//! Files are plain safetensors: an 8-byte little-endian header length, a
//! JSON header (`dtype`, `shape`, `data_offsets` per tensor plus an optional
//! `__metadata__` string map), then the raw little-endian tensor bytes.
use std::io::Write;
use std::path::Path;

use ndarray::{Array1, Array2, Array3};

use crate::error::{Error, Result};

/// Simple safetensors file writer for F32 and I64 tensors.
///
/// Usage:
/// ```rust,no_run
/// use mieeg::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f32("signal", &[1.0f32, 2.0, 3.0], &[1, 3]);
/// w.add_metadata("sfreq", "100");
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    entries:  Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f32(&mut self, name: &str, data: &[f32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F32", shape.to_vec()));
    }

    pub fn add_f32_arr2(&mut self, name: &str, arr: &Array2<f32>) {
        let data: Vec<f32> = arr.iter().copied().collect();
        self.add_f32(name, &data, &[arr.nrows(), arr.ncols()]);
    }

    pub fn add_f32_arr3(&mut self, name: &str, arr: &Array3<f32>) {
        let data: Vec<f32> = arr.iter().copied().collect();
        self.add_f32(name, &data, arr.shape());
    }

    pub fn add_i64(&mut self, name: &str, data: &[i64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "I64", shape.to_vec()));
    }

    pub fn add_i64_arr2(&mut self, name: &str, arr: &Array2<i64>) {
        let data: Vec<i64> = arr.iter().copied().collect();
        self.add_i64(name, &data, &[arr.nrows(), arr.ncols()]);
    }

    /// Add a `__metadata__` string entry.
    pub fn add_metadata(&mut self, key: &str, value: impl Into<String>) {
        self.metadata.insert(key.to_string(), serde_json::Value::String(value.into()));
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let file_err = |source: std::io::Error| Error::File { path: path.to_path_buf(), source };

        let mut header_map = serde_json::Map::new();
        if !self.metadata.is_empty() {
            header_map.insert("__metadata__".into(), serde_json::Value::Object(self.metadata.clone()));
        }
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(name.clone(), serde_json::json!({
                "dtype": dtype,
                "shape": shape,
                "data_offsets": [offset, offset + data.len()],
            }));
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map).map_err(|e| file_err(e.into()))?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes.into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();

        let mut f = std::fs::File::create(path).map_err(file_err)?;
        f.write_all(&(padded.len() as u64).to_le_bytes()).map_err(file_err)?;
        f.write_all(&padded).map_err(file_err)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data).map_err(file_err)?;
        }
        log::debug!("wrote {} tensors to {}", self.entries.len(), path.display());
        Ok(())
    }
}

/// Write classifier features to a safetensors file.
///
/// Tensors: `X` F32 `[E, C, T]`, `y` I64 `[E]`.
/// Metadata: `ch_names` (comma-separated), `sfreq`.
pub fn write_features(
    x: &Array3<f32>,
    y: &Array1<i64>,
    ch_names: &[String],
    sfreq: f32,
    path: &Path,
) -> Result<()> {
    if x.shape()[0] != y.len() {
        return Err(Error::Shape(format!(
            "{} epochs but {} labels",
            x.shape()[0],
            y.len()
        )));
    }
    let mut w = StWriter::new();
    w.add_f32_arr3("X", x);
    let labels: Vec<i64> = y.to_vec();
    w.add_i64("y", &labels, &[labels.len()]);
    w.add_metadata("ch_names", ch_names.join(","));
    w.add_metadata("sfreq", sfreq.to_string());
    w.write(path)
}
