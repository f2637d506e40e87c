//!
//! # GdsFlat Reading & Parsing
//!
//! [GdsReader] decodes one framed record at a time from a byte stream;
//! [GdsParser] drives it through the record-ordering state machine and
//! builds a [GdsLibrary].
//!

// Std-Lib Imports
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Cursor, ErrorKind, Read, Write};
use std::path::Path;

// Crates.io
use byteorder::{BigEndian, ByteOrder};
use num_traits::FromPrimitive;

// Local Imports
use crate::data::*;

/// # Gds Stream Reader
///
/// Decodes the GDSII record framing
/// `[u16 big-endian length][u8 record type][u8 data type][payload]`
/// from any [Read] source, one record per call.
pub struct GdsReader<R: Read> {
    /// Byte source
    rdr: R,
    /// Position in bytes from stream start
    pos: u64,
}
impl GdsReader<BufReader<File>> {
    /// Open a buffered [GdsReader] over file `fname`.
    pub fn open(fname: impl AsRef<Path>) -> GdsResult<Self> {
        Ok(GdsReader::new(BufReader::new(File::open(fname)?)))
    }
}
impl<'a> GdsReader<Cursor<&'a [u8]>> {
    /// Create a [GdsReader] over in-memory bytes.
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        GdsReader::new(Cursor::new(bytes))
    }
}
impl<R: Read> GdsReader<R> {
    /// Create a [GdsReader] over any byte source.
    pub fn new(rdr: R) -> Self {
        Self { rdr, pos: 0 }
    }
    /// Current position in bytes from stream start.
    pub fn pos(&self) -> u64 {
        self.pos
    }
    /// Read up to `buf.len()` bytes, stopping early only at end of stream.
    /// Returns the number of bytes read.
    fn fill(&mut self, buf: &mut [u8]) -> GdsResult<usize> {
        let mut got = 0;
        while got < buf.len() {
            match self.rdr.read(&mut buf[got..]) {
                Ok(0) => break,
                Ok(n) => got += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(GdsError::Io(e)),
            }
        }
        self.pos += got as u64;
        Ok(got)
    }
    /// Decode the next record's four header bytes.
    /// Returns `Ok(None)` at a clean end of stream (no bytes available);
    /// a partial header is a [GdsError::MalformedRecord].
    pub fn read_header(&mut self) -> GdsResult<Option<GdsRecordHeader>> {
        let mut buf = [0u8; 4];
        let got = self.fill(&mut buf)?;
        if got == 0 {
            return Ok(None);
        }
        if got < 4 {
            return Err(GdsError::MalformedRecord(format!(
                "stream ended mid-header after {} bytes",
                got
            )));
        }
        let len = BigEndian::read_u16(&buf[0..2]);
        if len < 4 {
            return Err(GdsError::MalformedRecord(format!(
                "record length {} below header size",
                len
            )));
        }
        let rtype = GdsRecordType::from_u8(buf[2]).ok_or_else(|| {
            GdsError::MalformedRecord(format!("record type 0x{:02x} out of range", buf[2]))
        })?;
        let dtype = GdsDataType::from_u8(buf[3]).ok_or_else(|| {
            GdsError::MalformedRecord(format!("data type 0x{:02x} out of range", buf[3]))
        })?;
        let expected = rtype.data_type();
        if dtype != expected {
            return Err(GdsError::TypeMismatch {
                rtype,
                expected,
                got: buf[3],
            });
        }
        Ok(Some(GdsRecordHeader { rtype, dtype, len }))
    }
    /// Decode the next complete record.
    /// Returns `Ok(None)` at a clean end of stream.
    pub fn read_record(&mut self) -> GdsResult<Option<GdsRecord>> {
        let header = match self.read_header()? {
            Some(h) => h,
            None => return Ok(None),
        };
        let need = header.len as usize - 4;
        let mut payload = vec![0u8; need];
        let have = self.fill(&mut payload)?;
        if have < need {
            return Err(GdsError::TruncatedPayload {
                rtype: header.rtype,
                need,
                have,
            });
        }
        let data = decode_data(header.rtype, header.dtype, &payload)?;
        Ok(Some(GdsRecord {
            rtype: header.rtype,
            data,
        }))
    }
}

/// Decode a record payload per its (table-checked) data type.
fn decode_data(rtype: GdsRecordType, dtype: GdsDataType, payload: &[u8]) -> GdsResult<GdsRecordData> {
    let chunked = |width: usize| -> GdsResult<()> {
        if payload.len() % width != 0 {
            return Err(GdsError::MalformedRecord(format!(
                "{:?} payload length {} not a multiple of {}",
                rtype,
                payload.len(),
                width
            )));
        }
        Ok(())
    };
    let data = match dtype {
        GdsDataType::NoData => GdsRecordData::None,
        GdsDataType::BitArray => {
            if payload.len() != 2 {
                return Err(GdsError::MalformedRecord(format!(
                    "{:?} BITARRAY payload of {} bytes",
                    rtype,
                    payload.len()
                )));
            }
            GdsRecordData::Bits(BigEndian::read_u16(payload))
        }
        GdsDataType::I16 => {
            chunked(2)?;
            GdsRecordData::I16(payload.chunks_exact(2).map(BigEndian::read_i16).collect())
        }
        GdsDataType::I32 => {
            chunked(4)?;
            GdsRecordData::I32(payload.chunks_exact(4).map(BigEndian::read_i32).collect())
        }
        GdsDataType::F32 => {
            chunked(4)?;
            GdsRecordData::F64(
                payload
                    .chunks_exact(4)
                    .map(|c| GdsFloat64::decode32(BigEndian::read_u32(c)))
                    .collect(),
            )
        }
        GdsDataType::F64 => {
            chunked(8)?;
            GdsRecordData::F64(
                payload
                    .chunks_exact(8)
                    .map(|c| GdsFloat64::decode(BigEndian::read_u64(c)))
                    .collect(),
            )
        }
        GdsDataType::Str => GdsRecordData::Str(sanitize_str(payload)),
    };
    Ok(data)
}

/// # Parse States
/// Nesting level of the record stream, advanced one record at a time.
/// Parsing succeeds only on reaching [ParseState::Done] (the ENDLIB record).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    Initial,
    InHeader,
    InLibrary,
    InStructure,
    InElement,
    Done,
}

/// # Gds Parser
///
/// Consumes the record stream from a [GdsReader], enforces legal record
/// ordering, and incrementally builds a [GdsLibrary]. Record kinds without a
/// handler are warned about and skipped. After ENDLIB the observed layer set
/// is finalized and structure references are resolved.
pub struct GdsParser<R: Read> {
    /// Record source
    rdr: GdsReader<R>,
    /// Library being built
    lib: GdsLibrary,
    /// Current nesting state
    state: ParseState,
    /// Number of records read so far
    numread: usize,
    /// Distinct layer indices observed on elements
    layers: BTreeSet<i16>,
    /// Whether a PROPATTR is awaiting its PROPVALUE
    pending_prop: bool,
}
impl GdsParser<BufReader<File>> {
    /// Open a [GdsParser] over file `fname`.
    pub fn open(fname: impl AsRef<Path>) -> GdsResult<Self> {
        Ok(GdsParser::new(GdsReader::open(fname)?))
    }
}
impl<'a> GdsParser<Cursor<&'a [u8]>> {
    /// Create a [GdsParser] over in-memory bytes.
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        GdsParser::new(GdsReader::from_bytes(bytes))
    }
}
impl<R: Read> GdsParser<R> {
    /// Create a [GdsParser] over any record source.
    pub fn new(rdr: GdsReader<R>) -> Self {
        Self {
            rdr,
            lib: GdsLibrary::default(),
            state: ParseState::Initial,
            numread: 0,
            layers: BTreeSet::new(),
            pending_prop: false,
        }
    }
    /// Consume the stream through ENDLIB and produce the parsed library,
    /// with layers collected and references resolved.
    pub fn parse(mut self) -> GdsResult<GdsLibrary> {
        while self.state != ParseState::Done {
            let rec = match self.rdr.read_record()? {
                Some(rec) => rec,
                None => return Err(GdsError::TruncatedFile),
            };
            self.numread += 1;
            self.handle(rec)?;
        }
        self.lib.layers = self.layers.iter().copied().collect();
        self.lib.resolve_references();
        Ok(self.lib)
    }
    /// Process one record: check its legality in the current state and apply
    /// its effect on the library under construction.
    fn handle(&mut self, rec: GdsRecord) -> GdsResult<()> {
        use GdsRecordType::*;
        let rtype = rec.rtype;
        match rtype {
            Header => {
                self.require(ParseState::Initial, &rec)?;
                self.lib.version = self.int16(&rec)?;
                self.state = ParseState::InHeader;
            }
            BgnLib => {
                self.require(ParseState::InHeader, &rec)?;
                // Library timestamps: legality only, contents ignored
                self.state = ParseState::InLibrary;
            }
            LibName => {
                self.require(ParseState::InLibrary, &rec)?;
                self.lib.name = self.str_val(&rec)?;
            }
            // UNITS is accepted in any state once declared
            Units => {
                let vals = match &rec.data {
                    GdsRecordData::F64(v) if v.len() >= 2 => [v[0], v[1]],
                    _ => return self.fail("UNITS record without two REAL_8 values"),
                };
                self.lib.units = vals;
            }
            EndLib => {
                self.require(ParseState::InLibrary, &rec)?;
                self.state = ParseState::Done;
            }
            BgnStruct => {
                self.require(ParseState::InLibrary, &rec)?;
                // Structure timestamps: legality only, contents ignored
                self.lib.structs.push(GdsStruct::default());
                self.state = ParseState::InStructure;
            }
            StructName => {
                self.require(ParseState::InStructure, &rec)?;
                let name = self.str_val(&rec)?;
                let is_pcell = has_pcell_marker(&name);
                let s = self.cur_struct()?;
                s.name = name;
                if is_pcell {
                    s.is_pcell = true;
                }
            }
            EndStruct => {
                self.require(ParseState::InStructure, &rec)?;
                self.state = ParseState::InLibrary;
            }
            Boundary | Path | StructRef | ArrayRef | Text | Node | Box => {
                self.require(ParseState::InStructure, &rec)?;
                let kind = match rtype {
                    Boundary => GdsElemKind::Boundary,
                    Path => GdsElemKind::Path,
                    StructRef => GdsElemKind::StructRef,
                    ArrayRef => GdsElemKind::ArrayRef,
                    Text => GdsElemKind::Text,
                    Node => GdsElemKind::Node,
                    _ => GdsElemKind::Box,
                };
                self.cur_struct()?.elems.push(GdsElement::new(kind));
                self.pending_prop = false;
                self.state = ParseState::InElement;
            }
            EndElement => {
                self.require(ParseState::InElement, &rec)?;
                self.pending_prop = false;
                self.state = ParseState::InStructure;
            }
            Layer => {
                self.require(ParseState::InElement, &rec)?;
                let layer = self.int16(&rec)?;
                self.layers.insert(layer);
                self.cur_elem()?.layer = layer;
            }
            DataType => {
                self.require(ParseState::InElement, &rec)?;
                let val = self.int16(&rec)?;
                self.cur_elem()?.datatype = val;
            }
            TextType => {
                self.require(ParseState::InElement, &rec)?;
                let val = self.int16(&rec)?;
                let state = self.state;
                let e = self.cur_elem()?;
                if e.kind != GdsElemKind::Text {
                    return Err(GdsError::UnexpectedRecord { rtype, state });
                }
                e.texttype = val;
            }
            PathType => {
                self.require(ParseState::InElement, &rec)?;
                let val = self.int16(&rec)?;
                self.cur_elem()?.pathtype = val;
            }
            Width => {
                self.require(ParseState::InElement, &rec)?;
                let val = self.int32(&rec)?;
                self.cur_elem()?.width = val;
            }
            Xy => {
                self.require(ParseState::InElement, &rec)?;
                let pts = match &rec.data {
                    GdsRecordData::I32(v) => GdsPoint::parse_vec(v)?,
                    _ => return self.fail("XY record without INTEGER_4 payload"),
                };
                self.cur_elem()?.xy = pts;
            }
            StructRefName => {
                self.require(ParseState::InElement, &rec)?;
                let name = self.str_val(&rec)?;
                self.cur_elem()?.sname = Some(name);
            }
            String => {
                self.require(ParseState::InElement, &rec)?;
                let text = self.str_val(&rec)?;
                self.cur_elem()?.text = Some(text);
            }
            ColRow => {
                self.require(ParseState::InElement, &rec)?;
                let (cols, rows) = match &rec.data {
                    GdsRecordData::I16(v) if v.len() >= 2 => (v[0], v[1]),
                    _ => return self.fail("COLROW record without two INTEGER_2 values"),
                };
                let e = self.cur_elem()?;
                e.cols = cols;
                e.rows = rows;
            }
            Strans => {
                self.require(ParseState::InElement, &rec)?;
                let strans = GdsStrans {
                    reflected: rec.data.flag(0),
                    abs_mag: rec.data.flag(13),
                    abs_angle: rec.data.flag(14),
                };
                self.cur_elem()?.strans = strans;
            }
            Mag => {
                self.require(ParseState::InElement, &rec)?;
                let val = self.float(&rec)?;
                self.cur_elem()?.mag = val;
            }
            Angle => {
                self.require(ParseState::InElement, &rec)?;
                let val = self.float(&rec)?;
                self.cur_elem()?.angle = val;
            }
            PropAttr => {
                self.require(ParseState::InElement, &rec)?;
                let attr = self.int16(&rec)?;
                self.cur_elem()?.properties.push(GdsProperty {
                    attr,
                    value: std::string::String::new(),
                });
                self.pending_prop = true;
            }
            PropValue => {
                self.require(ParseState::InElement, &rec)?;
                let value = self.str_val(&rec)?;
                if !self.pending_prop {
                    return Err(GdsError::OrphanPropValue);
                }
                self.pending_prop = false;
                let is_pcell = has_pcell_marker(&value);
                match self.cur_elem()?.properties.last_mut() {
                    Some(p) => p.value = value,
                    None => return self.fail("PROPVALUE with empty property list"),
                }
                if is_pcell {
                    self.cur_struct()?.is_pcell = true;
                }
            }
            _ => {
                tracing::warn!(
                    rtype = ?rtype,
                    recordnum = self.numread,
                    "ignoring unhandled record"
                );
            }
        }
        Ok(())
    }
    /// Check that the parser is in state `want`, failing with
    /// [GdsError::UnexpectedRecord] otherwise.
    fn require(&self, want: ParseState, rec: &GdsRecord) -> GdsResult<()> {
        if self.state == want {
            Ok(())
        } else {
            Err(GdsError::UnexpectedRecord {
                rtype: rec.rtype,
                state: self.state,
            })
        }
    }
    /// Error-generation helper, wrapping `msg` with stream-position context.
    fn fail<T>(&self, msg: impl Into<String>) -> GdsResult<T> {
        Err(GdsError::Parse {
            msg: msg.into(),
            recordnum: self.numread,
            bytepos: self.rdr.pos(),
        })
    }
    /// The structure currently open.
    fn cur_struct(&mut self) -> GdsResult<&mut GdsStruct> {
        let (recordnum, bytepos) = (self.numread, self.rdr.pos());
        self.lib.structs.last_mut().ok_or(GdsError::Parse {
            msg: "no open structure".to_string(),
            recordnum,
            bytepos,
        })
    }
    /// The element currently open.
    fn cur_elem(&mut self) -> GdsResult<&mut GdsElement> {
        let (recordnum, bytepos) = (self.numread, self.rdr.pos());
        self.lib
            .structs
            .last_mut()
            .and_then(|s| s.elems.last_mut())
            .ok_or(GdsError::Parse {
                msg: "no open element".to_string(),
                recordnum,
                bytepos,
            })
    }
    /// First INTEGER_2 value of `rec`.
    fn int16(&self, rec: &GdsRecord) -> GdsResult<i16> {
        match &rec.data {
            GdsRecordData::I16(v) if !v.is_empty() => Ok(v[0]),
            _ => self.fail(format!("{:?} record missing INTEGER_2 payload", rec.rtype)),
        }
    }
    /// First INTEGER_4 value of `rec`.
    fn int32(&self, rec: &GdsRecord) -> GdsResult<i32> {
        match &rec.data {
            GdsRecordData::I32(v) if !v.is_empty() => Ok(v[0]),
            _ => self.fail(format!("{:?} record missing INTEGER_4 payload", rec.rtype)),
        }
    }
    /// First REAL_8 value of `rec`.
    fn float(&self, rec: &GdsRecord) -> GdsResult<f64> {
        match &rec.data {
            GdsRecordData::F64(v) if !v.is_empty() => Ok(v[0]),
            _ => self.fail(format!("{:?} record missing REAL_8 payload", rec.rtype)),
        }
    }
    /// String value of `rec`.
    fn str_val(&self, rec: &GdsRecord) -> GdsResult<String> {
        match &rec.data {
            GdsRecordData::Str(s) => Ok(s.clone()),
            _ => self.fail(format!("{:?} record missing STRING payload", rec.rtype)),
        }
    }
}

/// Write a record-level listing of GDSII file `fname` to `dest`:
/// one line per decoded record, through ENDLIB.
/// Exercises only the record decoder, not the state machine.
pub fn dump_records(fname: impl AsRef<Path>, dest: &mut impl Write) -> GdsResult<()> {
    let mut rdr = GdsReader::open(fname)?;
    let mut num = 0usize;
    while let Some(rec) = rdr.read_record()? {
        num += 1;
        writeln!(dest, "record {}: {:?} {}", num, rec.rtype, rec.data)?;
        if rec.rtype == GdsRecordType::EndLib {
            break;
        }
    }
    Ok(())
}
