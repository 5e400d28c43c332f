//! MAT-file data-element I/O.
//!
//! Every piece of a Level-5 file is a data element. On-disk layout (byte
//! order given by the header's endian indicator):
//!
//! ```text
//! regular:  ┌──────────────┬────────────────┬──────────────────────────┐
//!           │ type : u32   │ n_bytes : u32  │ payload, padded to 8 B   │
//!           └──────────────┴────────────────┴──────────────────────────┘
//! small:    ┌──────────────┬──────────────┬──────────────────┐
//!           │ n_bytes: u16 │ type : u16   │ payload (≤ 4 B)  │   ← 8 bytes total
//!           └──────────────┴──────────────┴──────────────────┘
//! ```
//!
//! The small format is recognised by a non-zero upper half in the first
//! word. `miCOMPRESSED` payloads are not padded.
use crate::error::{Error, Result};

use super::constants::*;

// ── Byte order ────────────────────────────────────────────────────────────

/// Byte order of a MAT-file, fixed by its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Interpret the two endian-indicator bytes at header offset 126.
    pub fn from_indicator(ind: [u8; 2]) -> Option<Self> {
        match ind {
            ENDIAN_LE => Some(Endian::Little),
            ENDIAN_BE => Some(Endian::Big),
            _ => None,
        }
    }

    #[inline]
    pub fn u16(self, b: [u8; 2]) -> u16 {
        match self {
            Endian::Little => u16::from_le_bytes(b),
            Endian::Big => u16::from_be_bytes(b),
        }
    }

    #[inline]
    pub fn u32(self, b: [u8; 4]) -> u32 {
        match self {
            Endian::Little => u32::from_le_bytes(b),
            Endian::Big => u32::from_be_bytes(b),
        }
    }

    #[inline]
    fn u64(self, b: [u8; 8]) -> u64 {
        match self {
            Endian::Little => u64::from_le_bytes(b),
            Endian::Big => u64::from_be_bytes(b),
        }
    }
}

// ── Element ───────────────────────────────────────────────────────────────

/// Decoded tag of one data element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementTag {
    pub mi_type: u32,
    pub n_bytes: usize,
    /// Payload packed into the tag's second word.
    pub small:   bool,
}

/// A data element borrowed from the file (or inflated) buffer.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    pub tag:  ElementTag,
    pub data: &'a [u8],
}

/// Sequential reader over a run of data elements.
pub struct ElementReader<'a> {
    buf:    &'a [u8],
    pos:    usize,
    endian: Endian,
}

impl<'a> ElementReader<'a> {
    pub fn new(buf: &'a [u8], endian: Endian) -> Self {
        Self { buf, pos: 0, endian }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Read the next element, or `None` at the end of the buffer.
    ///
    /// Fewer than 8 trailing bytes are treated as end-of-data padding.
    pub fn next_element(&mut self) -> Result<Option<Element<'a>>> {
        let buf: &'a [u8] = self.buf;
        let rest = &buf[self.pos..];
        if rest.len() < TAG_LEN {
            return Ok(None);
        }
        let first = self.endian.u32(word(rest, 0));

        if first >> 16 != 0 {
            let mi_type = first & 0xffff;
            let n_bytes = (first >> 16) as usize;
            if n_bytes > 4 {
                return Err(Error::format(format!(
                    "small element @ {:#x} claims {n_bytes} bytes (max 4)",
                    self.pos
                )));
            }
            self.pos += TAG_LEN;
            return Ok(Some(Element {
                tag: ElementTag { mi_type, n_bytes, small: true },
                data: &rest[4..4 + n_bytes],
            }));
        }

        let mi_type = first;
        let n_bytes = self.endian.u32(word(rest, 4)) as usize;
        let end = TAG_LEN
            .checked_add(n_bytes)
            .filter(|&e| e <= rest.len())
            .ok_or_else(|| {
                Error::format(format!(
                    "element @ {:#x} (type {mi_type}) truncated: needs {n_bytes} bytes, {} left",
                    self.pos,
                    rest.len() - TAG_LEN
                ))
            })?;
        let data = &rest[TAG_LEN..end];

        let advance = if mi_type == MI_COMPRESSED { end } else { TAG_LEN + padded(n_bytes) };
        self.pos = (self.pos + advance).min(self.buf.len());

        Ok(Some(Element {
            tag: ElementTag { mi_type, n_bytes, small: false },
            data,
        }))
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Read the next element, failing with a format error naming `what`.
    pub fn expect(&mut self, what: &str) -> Result<Element<'a>> {
        self.next_element()?
            .ok_or_else(|| Error::format(format!("missing {what} sub-element")))
    }
}

/// Round `n` up to the next multiple of 8.
#[inline]
fn padded(n: usize) -> usize {
    n.div_ceil(8) * 8
}

#[inline]
fn word(b: &[u8], at: usize) -> [u8; 4] {
    [b[at], b[at + 1], b[at + 2], b[at + 3]]
}

// ── Payload decoders ──────────────────────────────────────────────────────

/// Widen any numeric payload to `f64`.
///
/// MATLAB may store an array in a narrower type than its class (a `double`
/// array of small integers is often written as `miUINT8`), so the storage
/// type is taken from the element, not the array class.
pub fn decode_numeric(el: &Element, endian: Endian) -> Result<Vec<f64>> {
    let size = mi_type_size(el.tag.mi_type).ok_or_else(|| {
        Error::format(format!("element type {} is not numeric", el.tag.mi_type))
    })?;
    if el.data.len() % size != 0 {
        return Err(Error::format(format!(
            "numeric payload of {} bytes is not a multiple of {size}",
            el.data.len()
        )));
    }
    let e = endian;
    let d = el.data;
    let out = match el.tag.mi_type {
        MI_INT8 => d.iter().map(|&b| b as i8 as f64).collect(),
        MI_UINT8 | MI_UTF8 => d.iter().map(|&b| b as f64).collect(),
        MI_INT16 => d.chunks_exact(2).map(|b| e.u16([b[0], b[1]]) as i16 as f64).collect(),
        MI_UINT16 | MI_UTF16 => d.chunks_exact(2).map(|b| e.u16([b[0], b[1]]) as f64).collect(),
        MI_INT32 => d.chunks_exact(4).map(|b| e.u32(word(b, 0)) as i32 as f64).collect(),
        MI_UINT32 | MI_UTF32 => d.chunks_exact(4).map(|b| e.u32(word(b, 0)) as f64).collect(),
        MI_SINGLE => d
            .chunks_exact(4)
            .map(|b| f32::from_bits(e.u32(word(b, 0))) as f64)
            .collect(),
        MI_DOUBLE => d.chunks_exact(8).map(|b| f64::from_bits(e.u64(dword(b)))).collect(),
        MI_INT64 => d.chunks_exact(8).map(|b| e.u64(dword(b)) as i64 as f64).collect(),
        MI_UINT64 => d.chunks_exact(8).map(|b| e.u64(dword(b)) as f64).collect(),
        other => return Err(Error::format(format!("element type {other} is not numeric"))),
    };
    Ok(out)
}

#[inline]
fn dword(b: &[u8]) -> [u8; 8] {
    [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]
}

/// Decode a dimensions sub-element into non-negative sizes.
pub fn decode_dims(el: &Element, endian: Endian) -> Result<Vec<usize>> {
    decode_numeric(el, endian)?
        .into_iter()
        .map(|d| {
            if d >= 0.0 && d.fract() == 0.0 {
                Ok(d as usize)
            } else {
                Err(Error::format(format!("invalid array dimension {d}")))
            }
        })
        .collect()
}

/// Decode a character payload to one `char` per MATLAB code unit.
///
/// 8-bit storage is read as Latin-1; UTF-16 units that are lone surrogates
/// become U+FFFD so the count still matches the array dimensions.
pub fn decode_chars(el: &Element, endian: Endian) -> Result<Vec<char>> {
    let d = el.data;
    let out = match el.tag.mi_type {
        MI_UTF8 => String::from_utf8_lossy(d).chars().collect(),
        MI_INT8 | MI_UINT8 => d.iter().map(|&b| b as char).collect(),
        MI_UINT16 | MI_UTF16 | MI_INT16 => d
            .chunks_exact(2)
            .map(|b| {
                char::from_u32(endian.u16([b[0], b[1]]) as u32)
                    .unwrap_or(char::REPLACEMENT_CHARACTER)
            })
            .collect(),
        MI_UTF32 | MI_UINT32 | MI_INT32 => d
            .chunks_exact(4)
            .map(|b| char::from_u32(endian.u32(word(b, 0))).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect(),
        // Empty char arrays are sometimes written with a numeric tag.
        _ if d.is_empty() => Vec::new(),
        other => return Err(Error::format(format!("element type {other} is not character data"))),
    };
    Ok(out)
}

/// Decode an 8-bit name payload, dropping trailing NULs.
pub fn decode_name(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    bytes[..end].iter().map(|&b| b as char).collect()
}
