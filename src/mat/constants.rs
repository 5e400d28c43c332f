//! MAT-file Level 5 constants.
//!
//! Names follow the MathWorks "MAT-File Format" reference (`miXXX` data
//! types, `mxXXX_CLASS` array classes) so the reader can be checked against
//! the document table by table.
//!
//! A Level-5 file is a 128-byte header followed by a flat sequence of
//! **data elements**, each an 8-byte tag (`type`, `n_bytes`) plus a payload
//! padded to 8 bytes. Top-level variables are `miMATRIX` elements, optionally
//! wrapped in a zlib `miCOMPRESSED` element (MATLAB ≥ 7).

#![allow(dead_code)]

// ── Header ────────────────────────────────────────────────────────────────

/// Total header size in bytes.
pub const HEADER_LEN:      usize = 128;
/// Descriptive text occupies the first 116 bytes.
pub const HEADER_TEXT_LEN: usize = 116;
/// Version field value written by MATLAB for Level-5 files.
pub const MAT_VERSION_5:   u16 = 0x0100;
/// Endian indicator as written by a little-endian machine.
pub const ENDIAN_LE:       [u8; 2] = *b"IM";
/// Endian indicator as written by a big-endian machine.
pub const ENDIAN_BE:       [u8; 2] = *b"MI";
/// First eight bytes of an HDF5 file (MATLAB `-v7.3`).
pub const HDF5_SIGNATURE:  [u8; 8] = [0x89, b'H', b'D', b'F', 0x0d, 0x0a, 0x1a, 0x0a];
/// Tag size in bytes (regular element format).
pub const TAG_LEN:         usize = 8;

// ── Data types (miXXX) ────────────────────────────────────────────────────

pub const MI_INT8:       u32 = 1;
pub const MI_UINT8:      u32 = 2;
pub const MI_INT16:      u32 = 3;
pub const MI_UINT16:     u32 = 4;
pub const MI_INT32:      u32 = 5;
pub const MI_UINT32:     u32 = 6;
pub const MI_SINGLE:     u32 = 7;
pub const MI_DOUBLE:     u32 = 9;
pub const MI_INT64:      u32 = 12;
pub const MI_UINT64:     u32 = 13;
/// Nested array (variable, cell element, struct field value).
pub const MI_MATRIX:     u32 = 14;
/// zlib-compressed data element.
pub const MI_COMPRESSED: u32 = 15;
pub const MI_UTF8:       u32 = 16;
pub const MI_UTF16:      u32 = 17;
pub const MI_UTF32:      u32 = 18;

/// Size in bytes of one value of the given `miXXX` numeric type.
pub fn mi_type_size(mi_type: u32) -> Option<usize> {
    match mi_type {
        MI_INT8 | MI_UINT8 | MI_UTF8 => Some(1),
        MI_INT16 | MI_UINT16 | MI_UTF16 => Some(2),
        MI_INT32 | MI_UINT32 | MI_SINGLE | MI_UTF32 => Some(4),
        MI_DOUBLE | MI_INT64 | MI_UINT64 => Some(8),
        _ => None,
    }
}

// ── Array flags ───────────────────────────────────────────────────────────
//
// First u32 of the Array Flags sub-element: class in the low byte, flag
// bits above it.

pub const MX_FLAG_COMPLEX: u32 = 0x0800;
pub const MX_FLAG_GLOBAL:  u32 = 0x0400;
pub const MX_FLAG_LOGICAL: u32 = 0x0200;
pub const MX_CLASS_MASK:   u32 = 0x00ff;

// ── Array classes (mxXXX_CLASS) ───────────────────────────────────────────

pub const MX_CELL_CLASS:     u8 = 1;
pub const MX_STRUCT_CLASS:   u8 = 2;
pub const MX_OBJECT_CLASS:   u8 = 3;
pub const MX_CHAR_CLASS:     u8 = 4;
pub const MX_SPARSE_CLASS:   u8 = 5;
pub const MX_DOUBLE_CLASS:   u8 = 6;
pub const MX_SINGLE_CLASS:   u8 = 7;
pub const MX_INT8_CLASS:     u8 = 8;
pub const MX_UINT8_CLASS:    u8 = 9;
pub const MX_INT16_CLASS:    u8 = 10;
pub const MX_UINT16_CLASS:   u8 = 11;
pub const MX_INT32_CLASS:    u8 = 12;
pub const MX_UINT32_CLASS:   u8 = 13;
pub const MX_INT64_CLASS:    u8 = 14;
pub const MX_UINT64_CLASS:   u8 = 15;
pub const MX_FUNCTION_CLASS: u8 = 16;
pub const MX_OPAQUE_CLASS:   u8 = 17;
