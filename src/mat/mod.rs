//! MATLAB MAT-file (Level 5) reader.
//!
//! Reads the `.mat` files distributed with BCI Competition III dataset IVa
//! (and any other v5/v6/v7 MAT-file) into a tree of [`MatValue`]s.
//!
//! # Quick start
//! ```no_run
//! use mieeg::mat::load_mat;
//!
//! let mat = load_mat("data/raw/aa.mat").unwrap();
//! let nfo = mat.field("nfo").unwrap().expect_record("nfo").unwrap();
//! let fs  = nfo.field("fs").unwrap().expect_numeric("fs").unwrap().scalar();
//! println!("{} variables, fs = {fs:?}", mat.len());
//! ```
pub mod constants;
pub mod element;
pub mod reader;
pub mod value;

pub use element::{Element, ElementReader, ElementTag, Endian};
pub use reader::{load_mat, parse_mat, MatFile};
pub use value::{CellArray, CharArray, MatValue, NumericArray, NumericClass, Record, StructArray};
