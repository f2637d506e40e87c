//!
//! # GdsFlat Data Model
//!
//! Record-level types for the GDSII stream format, the hierarchical
//! library/structure/element model built from them, and the crate-wide
//! error type.
//!

// Std-Lib Imports
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::io::Write;
use std::path::Path;

// Crates.io
use derive_more::{Add, AddAssign};
use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

// Local Imports
use crate::read::{GdsParser, ParseState};

///
/// # Gds Record Types
///
/// In the numeric order specified by GDSII, for automatic [FromPrimitive] conversions.
/// Every code up to the maximum (0x3b) is named, deprecated and unreleased ones included;
/// kinds without a parse handler are skipped with a warning rather than rejected.
///
#[derive(FromPrimitive, Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum GdsRecordType {
    Header = 0x00,
    BgnLib,
    LibName,
    Units,
    EndLib,
    BgnStruct,
    StructName, // STRNAME
    EndStruct,
    Boundary,
    Path,
    StructRef,
    ArrayRef,
    Text,
    Layer,
    DataType,
    Width,
    Xy,
    EndElement,
    StructRefName, // SNAME
    ColRow,
    TextNode, // "Not currently used"
    Node,
    TextType,
    Presentation,
    Spacing, // "Discontinued"
    String,
    Strans,
    Mag,
    Angle,
    Uinteger, // "No longer used"
    Ustring,  // "No longer used"
    RefLibs,
    Fonts,
    PathType,
    Generations,
    AttrTable,
    StypTable, // "Unreleased Feature"
    StrType,   // "Unreleased Feature"
    ElemFlags,
    ElemKey,  // "Unreleased Feature"
    LinkType, // "Unreleased Feature"
    LinkKeys, // "Unreleased Feature"
    Nodetype,
    PropAttr,
    PropValue,
    Box,
    BoxType,
    Plex,
    BeginExtn, // "Only occurs in CustomPlus"
    EndExtn,   // "Only occurs in CustomPlus"
    TapeNum,
    TapeCode,
    StrClass, // "Only for Calma internal use"
    Reserved, // "Reserved for future use"
    Format,
    Mask,
    EndMasks,
    LibDirSize,
    SrfName,
    LibSecur,
}
impl GdsRecordType {
    /// The single data type mandated for this record kind.
    /// Decoding fails with [GdsError::TypeMismatch] if a record's declared
    /// data type disagrees with this table.
    pub fn data_type(&self) -> GdsDataType {
        use GdsDataType::*;
        match self {
            Self::Header => I16,
            Self::BgnLib => I16,
            Self::LibName => Str,
            Self::Units => F64,
            Self::EndLib => NoData,
            Self::BgnStruct => I16,
            Self::StructName => Str,
            Self::EndStruct => NoData,
            Self::Boundary => NoData,
            Self::Path => NoData,
            Self::StructRef => NoData,
            Self::ArrayRef => NoData,
            Self::Text => NoData,
            Self::Layer => I16,
            Self::DataType => I16,
            Self::Width => I32,
            Self::Xy => I32,
            Self::EndElement => NoData,
            Self::StructRefName => Str,
            Self::ColRow => I16,
            Self::TextNode => NoData,
            Self::Node => NoData,
            Self::TextType => I16,
            Self::Presentation => BitArray,
            Self::Spacing => NoData,
            Self::String => Str,
            Self::Strans => BitArray,
            Self::Mag => F64,
            Self::Angle => F64,
            Self::Uinteger => NoData,
            Self::Ustring => NoData,
            Self::RefLibs => Str,
            Self::Fonts => Str,
            Self::PathType => I16,
            Self::Generations => I16,
            Self::AttrTable => Str,
            Self::StypTable => Str,
            Self::StrType => I16,
            Self::ElemFlags => BitArray,
            Self::ElemKey => I32,
            Self::LinkType => NoData,
            Self::LinkKeys => NoData,
            Self::Nodetype => I16,
            Self::PropAttr => I16,
            Self::PropValue => Str,
            Self::Box => NoData,
            Self::BoxType => I16,
            Self::Plex => I32,
            Self::BeginExtn => I32,
            Self::EndExtn => I32,
            Self::TapeNum => I16,
            Self::TapeCode => I16,
            Self::StrClass => BitArray,
            Self::Reserved => I32,
            Self::Format => I16,
            Self::Mask => Str,
            Self::EndMasks => NoData,
            Self::LibDirSize => I16,
            Self::SrfName => Str,
            Self::LibSecur => I16,
        }
    }
}

/// # Gds DataType Enumeration
/// In order as decoded from the one-byte field in each record header.
#[derive(FromPrimitive, Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum GdsDataType {
    NoData = 0,
    BitArray = 1,
    I16 = 2,
    I32 = 3,
    F32 = 4,
    F64 = 5,
    Str = 6,
}

/// # Gds Record Header
/// Decoded contents of a record's four header bytes:
/// its total length, record type, and declared data type.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct GdsRecordHeader {
    pub rtype: GdsRecordType,
    pub dtype: GdsDataType,
    pub len: u16,
}

///
/// # Gds Record Payload
///
/// Tagged union over the six GDSII data types.
/// Exactly one representation is live per record, keyed by the declared
/// (and table-checked) data type.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GdsRecordData {
    None,
    /// Sixteen boolean flags; flag `n` is bit `15 - n` of the big-endian word,
    /// so flag 0 is the most significant bit.
    Bits(u16),
    I16(Vec<i16>),
    I32(Vec<i32>),
    F64(Vec<f64>),
    Str(String),
}
impl GdsRecordData {
    /// Flag `n` of a BITARRAY payload.
    /// False for non-BITARRAY payloads and for `n` past the sixteen flags.
    pub fn flag(&self, n: u8) -> bool {
        match self {
            Self::Bits(word) if n < 16 => (word >> (15 - n)) & 1 != 0,
            _ => false,
        }
    }
}
impl fmt::Display for GdsRecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Bits(word) => write!(f, "0x{:04x}", word),
            Self::I16(vals) => {
                for (i, v) in vals.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", v)?;
                }
                Ok(())
            }
            Self::I32(vals) => {
                for (i, v) in vals.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", v)?;
                }
                Ok(())
            }
            Self::F64(vals) => {
                for (i, v) in vals.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", v)?;
                }
                Ok(())
            }
            Self::Str(s) => write!(f, "{}", s),
        }
    }
}

/// # Gds Record
/// One decoded record: its kind plus its typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GdsRecord {
    pub rtype: GdsRecordType,
    pub data: GdsRecordData,
}

/// # Gds Floating Point
/// ## GDSII's Home-Grown Floating-Point Format
///
/// GDSII predates IEEE754 and uses its own excess-64, base-16 float encoding:
/// a sign bit, a 7-bit exponent biased by 64 (a power of sixteen), and an
/// unsigned mantissa normalized to the range (1/16, 1).
///
/// [GdsFloat64] is not a data store, but a namespace for decoding the
/// eight-byte (REAL_8) and four-byte (REAL_4) widths to `f64`.
pub struct GdsFloat64;
impl GdsFloat64 {
    /// Decode the eight-byte representation, stored as a `u64`, to `f64`.
    pub fn decode(val: u64) -> f64 {
        // Extract the MSB sign bit
        let neg = (val & 0x8000_0000_0000_0000) != 0;
        // Extract the 7b exponent
        let exp: i32 = ((val & 0x7F00_0000_0000_0000) >> (8 * 7)) as i32 - 64;
        // The integer-valued mantissa occupies the 7 least-significant bytes
        let mantissa: u64 = val & 0x00FF_FFFF_FFFF_FFFF;
        // Normalize it to the range (1/16, 1)
        let mantissa: f64 = mantissa as f64 / 2f64.powi(8 * 7);
        if neg {
            -1.0 * mantissa * 16f64.powi(exp)
        } else {
            mantissa * 16f64.powi(exp)
        }
    }
    /// Decode the four-byte representation, stored as a `u32`, to `f64`.
    /// Same layout as the eight-byte form with a 24-bit mantissa.
    pub fn decode32(val: u32) -> f64 {
        let neg = (val & 0x8000_0000) != 0;
        let exp: i32 = ((val & 0x7F00_0000) >> 24) as i32 - 64;
        let mantissa: f64 = (val & 0x00FF_FFFF) as f64 / 2f64.powi(24);
        if neg {
            -1.0 * mantissa * 16f64.powi(exp)
        } else {
            mantissa * 16f64.powi(exp)
        }
    }
}

/// Character test for GDSII names: letters, `$`, `_`, and `?`.
fn allowed_char(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'$' || c == b'_' || c == b'?'
}

/// Decode a GDSII string payload.
/// At most 32 characters are kept; trailing disallowed characters (including
/// the even-length NUL padding) are stripped, and any remaining interior
/// disallowed character is replaced with an underscore.
pub fn sanitize_str(bytes: &[u8]) -> String {
    let mut end = bytes.len().min(32);
    while end > 0 && !allowed_char(bytes[end - 1]) {
        end -= 1;
    }
    bytes[..end]
        .iter()
        .map(|&b| if allowed_char(b) { b as char } else { '_' })
        .collect()
}

/// # Gds Translation Settings
/// Mirroring and absolute-magnification/angle flags decoded from a STRANS
/// record's bit array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GdsStrans {
    pub reflected: bool,
    pub abs_mag: bool,
    pub abs_angle: bool,
}

/// # Gds Spatial Point
/// Coordinates in (integer) database units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GdsPoint {
    pub x: i32,
    pub y: i32,
}
impl GdsPoint {
    /// Create a new [GdsPoint].
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
    /// Convert an XY record's flat coordinate list to a point vector.
    /// Fails on odd-length input.
    pub fn parse_vec(from: &[i32]) -> GdsResult<Vec<GdsPoint>> {
        if from.len() % 2 != 0 {
            return Err(GdsError::MalformedRecord(format!(
                "XY record with odd coordinate count {}",
                from.len()
            )));
        }
        Ok(from
            .chunks_exact(2)
            .map(|c| GdsPoint { x: c[0], y: c[1] })
            .collect())
    }
}

/// # Gds Element Property
/// One (attribute-number, value) pair attached to an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GdsProperty {
    pub attr: i16,
    pub value: String,
}

/// # Gds Element Kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GdsElemKind {
    Boundary,
    Path,
    StructRef,
    ArrayRef,
    Text,
    Node,
    Box,
}
impl fmt::Display for GdsElemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boundary => "boundary",
            Self::Path => "path",
            Self::StructRef => "sref",
            Self::ArrayRef => "aref",
            Self::Text => "text",
            Self::Node => "node",
            Self::Box => "box",
        };
        write!(f, "{}", name)
    }
}

///
/// # Gds Element
///
/// One kind-tagged element: its fields are populated record by record between
/// the element's opening record and ENDEL, and are immutable thereafter
/// except for [GdsElement::ns_ref], filled in by reference resolution.
/// Which fields are meaningful depends on [GdsElement::kind].
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GdsElement {
    pub kind: GdsElemKind,
    pub layer: i16,
    pub datatype: i16,
    pub texttype: i16,
    pub pathtype: i16,
    /// Path width in database units; negative values denote absolute widths.
    pub width: i32,
    /// Vertex list in database units. Polygon ring for Boundary, polyline for
    /// Path, single anchor for StructRef/Text, three anchors (origin,
    /// column extent, row extent) for ArrayRef.
    pub xy: Vec<GdsPoint>,
    /// Referenced structure name (StructRef/ArrayRef)
    pub sname: Option<String>,
    /// Index of the referenced structure, filled in post-parse
    pub ns_ref: Option<usize>,
    pub strans: GdsStrans,
    pub mag: f64,
    /// Rotation in counter-clockwise degrees
    pub angle: f64,
    pub cols: i16,
    pub rows: i16,
    /// Text content (Text elements)
    pub text: Option<String>,
    pub properties: Vec<GdsProperty>,
}
impl GdsElement {
    /// Create an empty element of `kind` with GDSII defaults.
    pub fn new(kind: GdsElemKind) -> Self {
        Self {
            kind,
            layer: 0,
            datatype: 0,
            texttype: 0,
            pathtype: 0,
            width: 0,
            xy: Vec::new(),
            sname: None,
            ns_ref: None,
            strans: GdsStrans::default(),
            mag: 1.0,
            angle: 0.0,
            cols: 0,
            rows: 0,
            text: None,
            properties: Vec::new(),
        }
    }
}

/// # Gds Structure
/// A named, ordered list of elements.
/// `is_referenced` is set by reference resolution when any element elsewhere
/// targets this structure; `is_pcell` marks parametric-cell templates
/// (name or property value containing "CONTEXT_INFO"), which are excluded
/// from flattened output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GdsStruct {
    pub name: String,
    pub elems: Vec<GdsElement>,
    pub is_referenced: bool,
    pub is_pcell: bool,
}
impl GdsStruct {
    /// Create a new, empty structure named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Marker substring identifying parametric-cell template structures.
pub(crate) const PCELL_MARKER: &str = "CONTEXT_INFO";

/// Case-insensitive test for the pseudo-cell marker.
pub(crate) fn has_pcell_marker(s: &str) -> bool {
    s.to_ascii_uppercase().contains(PCELL_MARKER)
}

///
/// # Gds Library
///
/// The root of the hierarchical model: library metadata, the ascending list
/// of layer indices observed, and the structure arena. Structures are
/// addressed by index into [GdsLibrary::structs]; element references hold an
/// `Option<usize>` into the same arena, resolved by
/// [GdsLibrary::resolve_references].
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GdsLibrary {
    /// Library name, as sanitized from its LIBNAME record
    pub name: String,
    /// GDSII stream-format version, from the HEADER record
    pub version: i16,
    /// Unit declaration: `[database units per user unit, meters per database unit]`
    pub units: [f64; 2],
    /// Distinct layer indices observed, ascending
    pub layers: Vec<i16>,
    /// Structure arena
    pub structs: Vec<GdsStruct>,
}
impl Default for GdsLibrary {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: 0,
            // GDSII's customary defaults: 1nm database units, 1000 per user unit
            units: [1.0e-3, 1.0e-9],
            layers: Vec::new(),
            structs: Vec::new(),
        }
    }
}
impl GdsLibrary {
    /// Create a new and empty [GdsLibrary].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    /// Read a [GdsLibrary] from file `fname`.
    pub fn open(fname: impl AsRef<Path>) -> GdsResult<GdsLibrary> {
        GdsParser::open(fname)?.parse()
    }
    /// Read a [GdsLibrary] from byte-vector `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> GdsResult<GdsLibrary> {
        GdsParser::from_bytes(bytes).parse()
    }
    /// Meters per user unit, derived from the UNITS record.
    pub fn user_unit(&self) -> f64 {
        self.units[1] / self.units[0]
    }
    /// Meters per database unit.
    pub fn db_unit(&self) -> f64 {
        self.units[1]
    }
    /// Index of the structure named `name`, if any. Exact match.
    pub fn struct_by_name(&self, name: &str) -> Option<usize> {
        self.structs.iter().position(|s| s.name == name)
    }
    /// Bind every structure/array reference to its target structure.
    ///
    /// Sets [GdsElement::ns_ref] on success and marks targets
    /// [GdsStruct::is_referenced]. Unresolvable targets are warned about and
    /// left unset; traversing one later fails with
    /// [GdsError::DanglingReference].
    pub fn resolve_references(&mut self) {
        let index: HashMap<String, usize> = self
            .structs
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.clone(), i))
            .collect();
        let mut referenced = vec![false; self.structs.len()];
        for s in self.structs.iter_mut() {
            for e in s.elems.iter_mut() {
                if !matches!(e.kind, GdsElemKind::StructRef | GdsElemKind::ArrayRef) {
                    continue;
                }
                let target = match e.sname.as_deref() {
                    Some(t) => t,
                    None => {
                        tracing::warn!(structure = %s.name, "reference element without SNAME");
                        continue;
                    }
                };
                match index.get(target) {
                    Some(&i) => {
                        e.ns_ref = Some(i);
                        referenced[i] = true;
                    }
                    None => {
                        tracing::warn!(
                            structure = %s.name,
                            target = %target,
                            "reference to unknown structure"
                        );
                    }
                }
            }
        }
        for (i, hit) in referenced.into_iter().enumerate() {
            if hit {
                self.structs[i].is_referenced = true;
            }
        }
    }
    /// Serialize the library model to pretty-printed JSON.
    pub fn to_json(&self) -> GdsResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| GdsError::Str(e.to_string()))
    }
    /// Collect a census of the library's contents.
    pub fn stats(&self) -> GdsStats {
        let mut stats = GdsStats {
            structs: self.structs.len(),
            ..Default::default()
        };
        for s in &self.structs {
            for e in &s.elems {
                match e.kind {
                    GdsElemKind::Boundary => stats.boundaries += 1,
                    GdsElemKind::Path => stats.paths += 1,
                    GdsElemKind::StructRef => stats.struct_refs += 1,
                    GdsElemKind::ArrayRef => stats.array_refs += 1,
                    GdsElemKind::Text => stats.texts += 1,
                    GdsElemKind::Node => stats.nodes += 1,
                    GdsElemKind::Box => stats.boxes += 1,
                }
                stats.properties += e.properties.len();
            }
        }
        stats
    }
    /// Write a human-readable description of the library to `dest`.
    pub fn write_description(&self, dest: &mut impl Write) -> std::io::Result<()> {
        writeln!(dest, "Library {}:", self.name)?;
        writeln!(
            dest,
            " {} database units per user unit, {:e} meters per database unit",
            self.units[0], self.units[1]
        )?;
        writeln!(
            dest,
            " {} structures on {} layers",
            self.structs.len(),
            self.layers.len()
        )?;
        for (ns, s) in self.structs.iter().enumerate() {
            let mut notes = String::new();
            if s.is_referenced {
                notes.push_str(" (referenced)");
            }
            if s.is_pcell {
                notes.push_str(" (pcell)");
            }
            writeln!(dest, "Structure {}: {}{}", ns, s.name, notes)?;
            for (ne, e) in s.elems.iter().enumerate() {
                match e.kind {
                    GdsElemKind::StructRef => writeln!(
                        dest,
                        "  element {}: sref -> {}",
                        ne,
                        e.sname.as_deref().unwrap_or("?")
                    )?,
                    GdsElemKind::ArrayRef => writeln!(
                        dest,
                        "  element {}: aref -> {} ({} x {})",
                        ne,
                        e.sname.as_deref().unwrap_or("?"),
                        e.cols,
                        e.rows
                    )?,
                    GdsElemKind::Text => writeln!(
                        dest,
                        "  element {}: text \"{}\" on layer {}",
                        ne,
                        e.text.as_deref().unwrap_or(""),
                        e.layer
                    )?,
                    _ => writeln!(
                        dest,
                        "  element {}: {} on layer {} (datatype {}), {} vertices",
                        ne,
                        e.kind,
                        e.layer,
                        e.datatype,
                        e.xy.len()
                    )?,
                }
            }
        }
        Ok(())
    }
}

/// # Gds Summary Stats
/// Summary statistics for a [GdsLibrary]:
/// numbers of structures, elements of each kind, and properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Add, AddAssign, Serialize, Deserialize)]
pub struct GdsStats {
    pub structs: usize,
    pub boundaries: usize,
    pub paths: usize,
    pub struct_refs: usize,
    pub array_refs: usize,
    pub texts: usize,
    pub nodes: usize,
    pub boxes: usize,
    pub properties: usize,
}

/// # Gds Error Enumeration
/// Fatal conditions raised while reading, parsing, or flattening.
/// Warnings (unhandled record kinds, unresolved references at resolve time)
/// go to the `tracing` channel instead and never abort.
#[derive(Debug)]
pub enum GdsError {
    /// File I/O failure
    Io(std::io::Error),
    /// Stream-level framing violation
    MalformedRecord(String),
    /// Record payload shorter than its header declares
    TruncatedPayload {
        rtype: GdsRecordType,
        need: usize,
        have: usize,
    },
    /// End of stream before ENDLIB
    TruncatedFile,
    /// Declared data type disagrees with the mandated type for the record kind
    TypeMismatch {
        rtype: GdsRecordType,
        expected: GdsDataType,
        got: u8,
    },
    /// State-machine ordering violation
    UnexpectedRecord { rtype: GdsRecordType, state: ParseState },
    /// PROPVALUE record with no preceding PROPATTR
    OrphanPropValue,
    /// Structure/array reference to an unknown structure, hit during flattening
    DanglingReference {
        structure: String,
        elem: usize,
        target: String,
    },
    /// Structure-reference cycle detected during flattening
    CyclicReference { structure: String },
    /// Parse failure with stream-position context
    Parse {
        msg: String,
        recordnum: usize,
        bytepos: u64,
    },
    /// Uncategorized error message
    Str(String),
}
impl fmt::Display for GdsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "i/o error: {}", e),
            Self::MalformedRecord(msg) => write!(f, "malformed record: {}", msg),
            Self::TruncatedPayload { rtype, need, have } => write!(
                f,
                "truncated payload in {:?} record: declared {} bytes, got {}",
                rtype, need, have
            ),
            Self::TruncatedFile => write!(f, "stream ended before ENDLIB"),
            Self::TypeMismatch {
                rtype,
                expected,
                got,
            } => write!(
                f,
                "record {:?} declares data type {} but requires {:?}",
                rtype, got, expected
            ),
            Self::UnexpectedRecord { rtype, state } => {
                write!(f, "unexpected {:?} record in state {:?}", rtype, state)
            }
            Self::OrphanPropValue => write!(f, "PROPVALUE record with no preceding PROPATTR"),
            Self::DanglingReference {
                structure,
                elem,
                target,
            } => write!(
                f,
                "structure {}, element #{}: reference to unknown structure {}",
                structure, elem, target
            ),
            Self::CyclicReference { structure } => {
                write!(f, "reference cycle through structure {}", structure)
            }
            Self::Parse {
                msg,
                recordnum,
                bytepos,
            } => write!(
                f,
                "parse error at record {} (byte {}): {}",
                recordnum, bytepos, msg
            ),
            Self::Str(msg) => write!(f, "{}", msg),
        }
    }
}
impl Error for GdsError {}
impl From<std::io::Error> for GdsError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
impl From<String> for GdsError {
    fn from(e: String) -> Self {
        Self::Str(e)
    }
}
impl From<&str> for GdsError {
    fn from(e: &str) -> Self {
        Self::Str(e.to_string())
    }
}

/// Crate-wide result type alias
pub type GdsResult<T> = Result<T, GdsError>;
