//!
//! # GdsFlat
//!
//! Reading and flattening of the GDSII stream format, the de facto standard
//! binary file format for hierarchical 2D integrated-circuit and MEMS layout.
//!
//! A GDSII file is a sequence of framed binary records describing a library
//! of named structures, each holding geometric elements (polygons, paths,
//! text) and references to other structures, singly or in arrays, with
//! rotation, mirroring, and magnification. This crate decodes the record
//! stream through a strict ordering state machine into a [GdsLibrary],
//! resolves structure references, and flattens the hierarchy into per-layer
//! lists of real-valued polygons and text anchors.
//!
//! ```no_run
//! use gdsflat::GdsData;
//!
//! # fn main() -> gdsflat::GdsResult<()> {
//! let gds = GdsData::load("mylib.gds")?;
//! for layer in gds.layers() {
//!     println!("layer {}: {} polygons", layer, gds.polygons(Some(*layer)).len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Writing GDSII is out of scope; the crate is read-and-flatten only.
//!

// Modules
pub mod data;
pub mod flatten;
pub mod geom;
pub mod query;
pub mod read;

// Public re-exports at the crate root
pub use data::*;
pub use flatten::*;
pub use geom::{intersect_line_segment, intersect_ray_segment, point_in_polygon};
pub use query::*;
pub use read::{dump_records, GdsParser, GdsReader, ParseState};

// Unit tests
#[cfg(test)]
mod tests;
