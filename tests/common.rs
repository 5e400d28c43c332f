/// Shared helpers: a minimal Level-5 MAT-file writer and a synthetic
/// BCI Competition III IVa subject built on top of it.
use flate2::{write::ZlibEncoder, Compression};
use ndarray::Array2;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

const MI_INT8: u32 = 1;
const MI_INT16: u32 = 3;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;

const MX_CELL: u32 = 1;
const MX_STRUCT: u32 = 2;
const MX_CHAR: u32 = 4;
const MX_DOUBLE: u32 = 6;
const MX_INT16: u32 = 10;

/// A MATLAB value the writer knows how to encode.
#[allow(unused)]
#[derive(Debug, Clone)]
pub enum Var {
    /// Column-major doubles.
    Double { dims: Vec<usize>, data: Vec<f64> },
    /// Column-major int16 (the storage class of `cnt`).
    Int16 { dims: Vec<usize>, data: Vec<i16> },
    /// `1×N` char row.
    Char(String),
    /// `1×N` cell.
    Cell(Vec<Var>),
    /// `1×1` struct.
    Struct(Vec<(String, Var)>),
}

#[allow(unused)]
impl Var {
    pub fn scalar(v: f64) -> Self {
        Var::Double { dims: vec![1, 1], data: vec![v] }
    }

    pub fn row(v: &[f64]) -> Self {
        Var::Double { dims: vec![1, v.len()], data: v.to_vec() }
    }

    pub fn col(v: &[f64]) -> Self {
        Var::Double { dims: vec![v.len(), 1], data: v.to_vec() }
    }

    pub fn cellstr(names: &[&str]) -> Self {
        Var::Cell(names.iter().map(|s| Var::Char(s.to_string())).collect())
    }

    pub fn record(fields: Vec<(&str, Var)>) -> Self {
        Var::Struct(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    /// `[T, C]` int16 matrix stored column-major.
    pub fn counts(cnt: &Array2<i16>) -> Self {
        let (t, c) = cnt.dim();
        let data = cnt.t().iter().copied().collect();
        Var::Int16 { dims: vec![t, c], data }
    }
}

/// Builds a MAT-file image in memory.
pub struct MatWriter {
    big_endian: bool,
    buf:        Vec<u8>,
}

#[allow(unused)]
impl MatWriter {
    pub fn new() -> Self {
        Self::with_endian(false)
    }

    pub fn with_endian(big_endian: bool) -> Self {
        let mut buf = vec![b' '; 128];
        let text = b"MATLAB 5.0 MAT-file, Platform: test, Created on: today";
        buf[..text.len()].copy_from_slice(text);
        buf[116..124].fill(0);
        let mut w = Self { big_endian, buf: Vec::new() };
        let version = w.u16_bytes(0x0100);
        buf[124..126].copy_from_slice(&version);
        buf[126..128].copy_from_slice(if big_endian { b"MI" } else { b"IM" });
        w.buf = buf;
        w
    }

    /// Append a plain `miMATRIX` variable.
    pub fn var(mut self, name: &str, value: &Var) -> Self {
        let el = self.matrix(name, value);
        self.buf.extend_from_slice(&el);
        self
    }

    /// Append a variable whose dimensions header is replaced by `dims`,
    /// regardless of how many elements actually follow.
    pub fn var_with_dims(mut self, name: &str, value: &Var, dims: &[usize]) -> Self {
        let el = self.matrix_with_dims(name, value, Some(dims));
        self.buf.extend_from_slice(&el);
        self
    }

    /// Append a variable wrapped in a zlib `miCOMPRESSED` element.
    pub fn compressed(mut self, name: &str, value: &Var) -> Self {
        let el = self.matrix(name, value);
        let mut z = ZlibEncoder::new(Vec::new(), Compression::default());
        z.write_all(&el).unwrap();
        let packed = z.finish().unwrap();
        let tag = self.tag(MI_COMPRESSED, packed.len());
        self.buf.extend_from_slice(&tag);
        self.buf.extend_from_slice(&packed);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn u16_bytes(&self, v: u16) -> [u8; 2] {
        if self.big_endian { v.to_be_bytes() } else { v.to_le_bytes() }
    }

    fn u32_bytes(&self, v: u32) -> [u8; 4] {
        if self.big_endian { v.to_be_bytes() } else { v.to_le_bytes() }
    }

    fn tag(&self, mi_type: u32, n_bytes: usize) -> Vec<u8> {
        let mut t = self.u32_bytes(mi_type).to_vec();
        t.extend_from_slice(&self.u32_bytes(n_bytes as u32));
        t
    }

    /// Regular (8-byte tag) element, payload padded to 8 bytes.
    fn element(&self, mi_type: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = self.tag(mi_type, payload.len());
        out.extend_from_slice(payload);
        out.resize(out.len() + (8 - payload.len() % 8) % 8, 0);
        out
    }

    fn matrix(&self, name: &str, value: &Var) -> Vec<u8> {
        self.matrix_with_dims(name, value, None)
    }

    fn matrix_with_dims(&self, name: &str, value: &Var, dims_override: Option<&[usize]>) -> Vec<u8> {
        let (class, dims) = match value {
            Var::Double { dims, .. } => (MX_DOUBLE, dims.clone()),
            Var::Int16 { dims, .. } => (MX_INT16, dims.clone()),
            Var::Char(s) => (MX_CHAR, vec![1, s.encode_utf16().count()]),
            Var::Cell(c) => (MX_CELL, vec![1, c.len()]),
            Var::Struct(_) => (MX_STRUCT, vec![1, 1]),
        };
        let dims = dims_override.map_or(dims, <[usize]>::to_vec);

        let mut body = Vec::new();
        let mut flags = self.u32_bytes(class).to_vec();
        flags.extend_from_slice(&[0; 4]);
        body.extend(self.element(MI_UINT32, &flags));
        let dim_bytes: Vec<u8> = dims.iter().flat_map(|&d| self.u32_bytes(d as u32)).collect();
        body.extend(self.element(MI_INT32, &dim_bytes));
        body.extend(self.element(MI_INT8, name.as_bytes()));

        match value {
            Var::Double { data, .. } => {
                let bytes: Vec<u8> = data
                    .iter()
                    .flat_map(|v| if self.big_endian { v.to_be_bytes() } else { v.to_le_bytes() })
                    .collect();
                body.extend(self.element(MI_DOUBLE, &bytes));
            }
            Var::Int16 { data, .. } => {
                let bytes: Vec<u8> = data
                    .iter()
                    .flat_map(|v| if self.big_endian { v.to_be_bytes() } else { v.to_le_bytes() })
                    .collect();
                body.extend(self.element(MI_INT16, &bytes));
            }
            Var::Char(s) => {
                let bytes: Vec<u8> = s.encode_utf16().flat_map(|u| self.u16_bytes(u)).collect();
                body.extend(self.element(MI_UINT16, &bytes));
            }
            Var::Cell(cells) => {
                for c in cells {
                    body.extend(self.matrix("", c));
                }
            }
            Var::Struct(fields) => {
                const NAME_LEN: usize = 32;
                body.extend(self.element(MI_INT32, &self.u32_bytes(NAME_LEN as u32)));
                let mut names = vec![0u8; NAME_LEN * fields.len()];
                for (i, (k, _)) in fields.iter().enumerate() {
                    names[i * NAME_LEN..i * NAME_LEN + k.len()].copy_from_slice(k.as_bytes());
                }
                body.extend(self.element(MI_INT8, &names));
                for (_, v) in fields {
                    body.extend(self.matrix("", v));
                }
            }
        }

        let mut out = self.tag(MI_MATRIX, body.len());
        out.extend(body);
        out
    }
}

// ── Synthetic IVa subject ─────────────────────────────────────────────────

/// A small dataset-IVa-shaped subject: `cnt`, `nfo` and `mrk`.
#[allow(unused)]
#[derive(Debug, Clone)]
pub struct Iva {
    pub sfreq:      f64,
    pub ch_names:   Vec<String>,
    /// `[T, C]` raw counts.
    pub cnt:        Array2<i16>,
    pub pos:        Vec<f64>,
    pub y:          Vec<f64>,
    pub positions:  bool,
    pub compressed: bool,
}

#[allow(unused)]
impl Iva {
    /// `n_times × n_ch` zeros, no trials.
    pub fn new(n_times: usize, n_ch: usize, sfreq: f64) -> Self {
        Self {
            sfreq,
            ch_names: (0..n_ch).map(|i| format!("C{}", i + 1)).collect(),
            cnt: Array2::zeros((n_times, n_ch)),
            pos: Vec::new(),
            y: Vec::new(),
            positions: false,
            compressed: false,
        }
    }

    pub fn nfo(&self) -> Var {
        let names: Vec<&str> = self.ch_names.iter().map(String::as_str).collect();
        let mut fields = vec![("fs", Var::scalar(self.sfreq)), ("clab", Var::cellstr(&names))];
        if self.positions {
            let n = self.ch_names.len();
            let x: Vec<f64> = (0..n).map(|i| i as f64 / n as f64).collect();
            let y: Vec<f64> = (0..n).map(|i| 1.0 - i as f64 / n as f64).collect();
            fields.push(("xpos", Var::col(&x)));
            fields.push(("ypos", Var::col(&y)));
        }
        Var::record(fields)
    }

    pub fn mrk(&self) -> Var {
        Var::record(vec![
            ("pos", Var::row(&self.pos)),
            ("y", Var::row(&self.y)),
            ("className", Var::cellstr(&["right", "foot"])),
        ])
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let vars = [("cnt", Var::counts(&self.cnt)), ("mrk", self.mrk()), ("nfo", self.nfo())];
        let mut w = MatWriter::new();
        for (name, v) in &vars {
            w = if self.compressed { w.compressed(name, v) } else { w.var(name, v) };
        }
        w.finish()
    }

    pub fn write_temp(&self, tag: &str) -> TempFile {
        TempFile::with_bytes(tag, &self.to_bytes())
    }
}

// ── Temporary files ───────────────────────────────────────────────────────

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A file under the system temp dir, removed on drop.
pub struct TempFile(PathBuf);

#[allow(unused)]
impl TempFile {
    pub fn new(tag: &str, ext: &str) -> Self {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let name = format!("mieeg_{tag}_{}_{n}.{ext}", std::process::id());
        TempFile(std::env::temp_dir().join(name))
    }

    pub fn with_bytes(tag: &str, bytes: &[u8]) -> Self {
        let f = Self::new(tag, "mat");
        std::fs::write(&f.0, bytes).unwrap();
        f
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}
