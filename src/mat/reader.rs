//! MAT-file Level 5 reader — the equivalent of `scipy.io.loadmat`.
//!
//! # Algorithm
//! 1. Read the whole file into memory.
//! 2. Reject MATLAB v7.3 (HDF5) and Level-4 files.
//! 3. Take the byte order from the header's endian indicator.
//! 4. Walk the top-level elements; inflate `miCOMPRESSED` ones.
//! 5. Decode each `miMATRIX` recursively into a [`MatValue`].
use std::io::Read;
use std::path::Path;

use flate2::read::ZlibDecoder;

use crate::error::{Error, Result};

use super::constants::*;
use super::element::{decode_chars, decode_dims, decode_name, decode_numeric, Element, ElementReader, Endian};
use super::value::{checked_numel, numel, CellArray, CharArray, MatValue, NumericArray, NumericClass, Record, StructArray};

// ── MatFile ───────────────────────────────────────────────────────────────

/// A loaded MAT-file: its header plus every top-level variable in file order.
#[derive(Debug, Clone)]
pub struct MatFile {
    /// Descriptive header text (`MATLAB 5.0 MAT-file, Platform: …`).
    pub header:    String,
    pub version:   u16,
    pub endian:    Endian,
    pub variables: Vec<(String, MatValue)>,
}

impl MatFile {
    pub fn get(&self, name: &str) -> Option<&MatValue> {
        self.variables.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Like [`get`](Self::get) but a missing variable is an error.
    pub fn field(&self, name: &str) -> Result<&MatValue> {
        self.get(name).ok_or_else(|| Error::missing(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

// ── Entry points ──────────────────────────────────────────────────────────

/// Read a MAT-file from disk.
///
/// Mirrors `scipy.io.loadmat(path)`: the file is loaded in full.
pub fn load_mat<P: AsRef<Path>>(path: P) -> Result<MatFile> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("read {} bytes from {}", bytes.len(), path.display());
    parse_mat(&bytes)
}

/// Parse an in-memory MAT-file image.
pub fn parse_mat(bytes: &[u8]) -> Result<MatFile> {
    if is_hdf5(bytes) {
        return Err(Error::format(
            "MATLAB v7.3 (HDF5) files are not supported; re-save with `save -v7`",
        ));
    }
    if bytes.len() < HEADER_LEN {
        return Err(Error::format(format!(
            "file too short for a MAT-file header ({} bytes)",
            bytes.len()
        )));
    }

    let endian = Endian::from_indicator([bytes[126], bytes[127]]).ok_or_else(|| {
        Error::format("no Level-5 endian indicator (Level-4 or not a MAT-file)")
    })?;
    let version = endian.u16([bytes[124], bytes[125]]);
    if version != MAT_VERSION_5 {
        return Err(Error::format(format!("unsupported MAT-file version {version:#06x}")));
    }
    let header = decode_name(&bytes[..HEADER_TEXT_LEN]).trim_end().to_string();
    log::debug!("MAT header: {header:?} ({endian:?})");

    let mut variables = Vec::new();
    let mut reader = ElementReader::new(&bytes[HEADER_LEN..], endian);
    while let Some(el) = reader.next_element()? {
        match el.tag.mi_type {
            MI_MATRIX => push_variable(&mut variables, &el, endian)?,
            MI_COMPRESSED => {
                let inflated = inflate(el.data)?;
                let mut inner = ElementReader::new(&inflated, endian);
                let el = inner.expect("compressed matrix")?;
                if el.tag.mi_type != MI_MATRIX {
                    return Err(Error::format(format!(
                        "compressed element holds type {}, expected miMATRIX",
                        el.tag.mi_type
                    )));
                }
                push_variable(&mut variables, &el, endian)?;
            }
            other => log::debug!("skipping top-level element of type {other}"),
        }
    }

    Ok(MatFile { header, version, endian, variables })
}

fn is_hdf5(bytes: &[u8]) -> bool {
    // v7.3 files carry a 512-byte MATLAB user block before the HDF5 superblock.
    bytes.starts_with(&HDF5_SIGNATURE)
        || bytes.get(512..520).is_some_and(|s| s == HDF5_SIGNATURE)
}

fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| Error::format(format!("bad zlib stream in compressed element: {e}")))?;
    Ok(out)
}

fn push_variable(vars: &mut Vec<(String, MatValue)>, el: &Element, endian: Endian) -> Result<()> {
    let (name, value) = read_matrix(el, endian)?;
    // `__globals__`, `__function_workspace__`, …
    if name.starts_with("__") {
        log::debug!("skipping internal variable {name}");
        return Ok(());
    }
    log::debug!("variable {name}: {} {:?}", value.kind(), value.dims());
    vars.push((name, value));
    Ok(())
}

// ── miMATRIX decoding ─────────────────────────────────────────────────────

/// A fieldless struct array carries no per-element bytes, so its size is
/// capped outright.
const MAX_FIELDLESS_ELEMENTS: usize = 1 << 20;

/// Decode one `miMATRIX` element into `(array name, value)`.
///
/// Nested arrays (cells, struct fields) carry an empty name.
fn read_matrix(el: &Element, endian: Endian) -> Result<(String, MatValue)> {
    if el.data.is_empty() {
        // Zero-byte miMATRIX: MATLAB's encoding of an unnamed `[]`.
        return Ok((String::new(), MatValue::Numeric(NumericArray::empty())));
    }
    let mut sub = ElementReader::new(el.data, endian);

    let flags_el = sub.expect("array flags")?;
    if flags_el.data.len() < 4 {
        return Err(Error::format("array flags sub-element too short"));
    }
    let flags = endian.u32([flags_el.data[0], flags_el.data[1], flags_el.data[2], flags_el.data[3]]);
    let class = (flags & MX_CLASS_MASK) as u8;
    let complex = flags & MX_FLAG_COMPLEX != 0;
    let logical = flags & MX_FLAG_LOGICAL != 0;

    if class == MX_OPAQUE_CLASS || class == MX_FUNCTION_CLASS {
        let name = match sub.next_element()? {
            Some(n) if n.tag.mi_type == MI_INT8 => decode_name(n.data),
            _ => String::new(),
        };
        return Ok((name, MatValue::Opaque { class, dims: Vec::new() }));
    }

    let dims = decode_dims(&sub.expect("dimensions")?, endian)?;
    let name = decode_name(sub.expect("array name")?.data);
    let n = checked_numel(&dims).ok_or_else(|| {
        Error::format(format!("array `{name}` dimensions {dims:?} overflow the element count"))
    })?;

    let value = if let Some(class) = NumericClass::from_mx(class) {
        let real = decode_numeric(&sub.expect("real part")?, endian)?;
        check_len(&name, "real part", real.len(), n)?;
        let imag = if complex {
            let imag = decode_numeric(&sub.expect("imaginary part")?, endian)?;
            check_len(&name, "imaginary part", imag.len(), n)?;
            Some(imag)
        } else {
            None
        };
        MatValue::Numeric(NumericArray { class, dims, real, imag, logical })
    } else {
        match class {
            MX_CHAR_CLASS => {
                let data = match sub.next_element()? {
                    Some(d) => decode_chars(&d, endian)?,
                    None => Vec::new(),
                };
                MatValue::Char(CharArray { dims, data })
            }
            MX_CELL_CLASS => {
                check_nested(&name, "cell", n, 1, &sub)?;
                let mut cells = Vec::with_capacity(n);
                for _ in 0..n {
                    cells.push(read_nested(&mut sub, "cell element", endian)?);
                }
                MatValue::Cell(CellArray { dims, cells })
            }
            MX_STRUCT_CLASS => read_struct(&name, &mut sub, dims, endian)?,
            MX_OBJECT_CLASS | MX_SPARSE_CLASS => MatValue::Opaque { class, dims },
            other => {
                return Err(Error::format(format!("array `{name}` has unknown class {other}")));
            }
        }
    };
    Ok((name, value))
}

/// Struct body: field-name length, packed field names, then for every
/// element (column-major) one `miMATRIX` per field.
fn read_struct(name: &str, sub: &mut ElementReader, dims: Vec<usize>, endian: Endian) -> Result<MatValue> {
    let len_el = sub.expect("field name length")?;
    let name_len = decode_numeric(&len_el, endian)?
        .first()
        .copied()
        .unwrap_or(0.0) as usize;
    let names_el = sub.expect("field names")?;
    let field_names: Vec<String> = if name_len == 0 {
        Vec::new()
    } else {
        names_el.data.chunks(name_len).map(decode_name).collect()
    };

    let n = numel(&dims);
    if field_names.is_empty() {
        if n > MAX_FIELDLESS_ELEMENTS {
            return Err(Error::format(format!(
                "struct `{name}` claims {n} elements without fields"
            )));
        }
    } else {
        check_nested(name, "struct", n, field_names.len(), sub)?;
    }
    let mut elements = Vec::with_capacity(n);
    for _ in 0..n {
        let mut fields = Vec::with_capacity(field_names.len());
        for fname in &field_names {
            let v = read_nested(sub, "struct field", endian)?;
            fields.push((fname.clone(), v));
        }
        elements.push(Record::new(fields));
    }
    Ok(MatValue::Struct(StructArray { dims, field_names, elements }))
}

fn read_nested(sub: &mut ElementReader, what: &str, endian: Endian) -> Result<MatValue> {
    let el = sub.expect(what)?;
    if el.tag.mi_type != MI_MATRIX {
        return Err(Error::format(format!(
            "{what} has element type {}, expected miMATRIX",
            el.tag.mi_type
        )));
    }
    Ok(read_matrix(&el, endian)?.1)
}

/// Every nested `miMATRIX` needs at least a tag, so `n` elements of
/// `per_element` arrays cannot fit in fewer than `n · per_element · 8` bytes.
fn check_nested(name: &str, what: &str, n: usize, per_element: usize, sub: &ElementReader) -> Result<()> {
    let need = n.checked_mul(per_element).and_then(|k| k.checked_mul(TAG_LEN));
    match need {
        Some(bytes) if bytes <= sub.remaining() => Ok(()),
        _ => Err(Error::format(format!(
            "{what} `{name}` claims {n} elements but only {} bytes follow",
            sub.remaining()
        ))),
    }
}

fn check_len(name: &str, part: &str, got: usize, want: usize) -> Result<()> {
    if got == want {
        Ok(())
    } else {
        Err(Error::format(format!(
            "array `{name}` {part} has {got} values, dimensions imply {want}"
        )))
    }
}
