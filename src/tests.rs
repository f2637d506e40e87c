//!
//! # GdsFlat Unit Tests
//!

use super::*;

/// Encode an f64 into GDSII's eight-byte excess-64 format.
/// Test-side helper; the crate itself only decodes.
fn encode_real8(val: f64) -> u64 {
    if val == 0.0 {
        return 0;
    }
    let neg = val < 0.0;
    let mut a = val.abs();
    let mut exp: i32 = 0;
    while a >= 1.0 {
        a /= 16.0;
        exp += 1;
    }
    while a < 1.0 / 16.0 {
        a *= 16.0;
        exp -= 1;
    }
    let mut mantissa = (a * 2f64.powi(56)).round() as u64;
    if mantissa >= 1 << 56 {
        mantissa >>= 4;
        exp += 1;
    }
    let sign = if neg { 1u64 << 63 } else { 0 };
    sign | (((exp + 64) as u64) << 56) | (mantissa & 0x00FF_FFFF_FFFF_FFFF)
}

/// Frame one record: length, type, data type, payload.
fn rec(rtype: GdsRecordType, dtype: GdsDataType, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(payload.len() + 4);
    bytes.extend_from_slice(&((payload.len() + 4) as u16).to_be_bytes());
    bytes.push(rtype as u8);
    bytes.push(dtype as u8);
    bytes.extend_from_slice(payload);
    bytes
}
fn i16s(vals: &[i16]) -> Vec<u8> {
    vals.iter().flat_map(|v| v.to_be_bytes()).collect()
}
fn i32s(vals: &[i32]) -> Vec<u8> {
    vals.iter().flat_map(|v| v.to_be_bytes()).collect()
}
fn f64s(vals: &[f64]) -> Vec<u8> {
    vals.iter()
        .flat_map(|v| encode_real8(*v).to_be_bytes())
        .collect()
}

/// A minimal valid stream: one structure holding one boundary on layer 1,
/// a 1000x1000 database-unit square.
fn sample_lib_bytes(libname: &str) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend(rec(GdsRecordType::Header, GdsDataType::I16, &i16s(&[600])));
    v.extend(rec(GdsRecordType::BgnLib, GdsDataType::I16, &i16s(&[0; 12])));
    v.extend(rec(GdsRecordType::LibName, GdsDataType::Str, libname.as_bytes()));
    v.extend(rec(GdsRecordType::Units, GdsDataType::F64, &f64s(&[1e-3, 1e-9])));
    v.extend(rec(GdsRecordType::BgnStruct, GdsDataType::I16, &i16s(&[0; 12])));
    v.extend(rec(GdsRecordType::StructName, GdsDataType::Str, b"TOP"));
    v.extend(rec(GdsRecordType::Boundary, GdsDataType::NoData, &[]));
    v.extend(rec(GdsRecordType::Layer, GdsDataType::I16, &i16s(&[1])));
    v.extend(rec(GdsRecordType::DataType, GdsDataType::I16, &i16s(&[0])));
    v.extend(rec(
        GdsRecordType::Xy,
        GdsDataType::I32,
        &i32s(&[0, 0, 1000, 0, 1000, 1000, 0, 1000, 0, 0]),
    ));
    v.extend(rec(GdsRecordType::EndElement, GdsDataType::NoData, &[]));
    v.extend(rec(GdsRecordType::EndStruct, GdsDataType::NoData, &[]));
    v.extend(rec(GdsRecordType::EndLib, GdsDataType::NoData, &[]));
    v
}

/// A library built in memory: units chosen so one database unit flattens to
/// one coordinate unit.
fn unit_scale_lib(name: &str) -> GdsLibrary {
    let mut lib = GdsLibrary::new(name);
    lib.units = [1.0, 1e-6];
    lib
}
fn boundary(layer: i16, size: i32) -> GdsElement {
    let mut e = GdsElement::new(GdsElemKind::Boundary);
    e.layer = layer;
    e.xy = GdsPoint::parse_vec(&[0, 0, size, 0, size, size, 0, size, 0, 0]).unwrap();
    e
}
fn sref(target: &str, x: i32, y: i32) -> GdsElement {
    let mut e = GdsElement::new(GdsElemKind::StructRef);
    e.sname = Some(target.to_string());
    e.xy = vec![GdsPoint::new(x, y)];
    e
}

#[test]
fn floats() {
    // Known byte patterns
    assert_eq!(GdsFloat64::decode(0), 0.0);
    assert_eq!(GdsFloat64::decode(0x4110_0000_0000_0000), 1.0);
    assert_eq!(GdsFloat64::decode(0xC110_0000_0000_0000), -1.0);
    assert_eq!(GdsFloat64::decode(0x4080_0000_0000_0000), 0.5);
    assert_eq!(GdsFloat64::decode(0x4120_0000_0000_0000), 2.0);
    assert_eq!(GdsFloat64::decode(0x4210_0000_0000_0000), 16.0);
    // Four-byte width, same layout with a 24-bit mantissa
    assert_eq!(GdsFloat64::decode32(0x4110_0000), 1.0);
    assert_eq!(GdsFloat64::decode32(0xC080_0000), -0.5);
    // Fractional exponents survive an encode/decode trip
    for &val in &[1e-3, 1e-9, 123.456, -0.03125, 6.02e23] {
        let dec = GdsFloat64::decode(encode_real8(val));
        assert!((dec - val).abs() <= val.abs() * 1e-14);
    }
}

#[test]
fn sanitization() {
    assert_eq!(sanitize_str(b"ABC#DEF!"), "ABC_DEF");
    assert_eq!(sanitize_str(b"TOP\0"), "TOP"); // even-length NUL padding
    assert_eq!(sanitize_str(b"A1B"), "A_B"); // digits are not in the allowed set
    assert_eq!(sanitize_str(b"ok$_?name"), "ok$_?name");
    assert_eq!(sanitize_str(b""), "");
    // 32-character cap applies before trailing trim
    let long = [b'A'; 40];
    assert_eq!(sanitize_str(&long).len(), 32);
}

#[test]
fn record_decode_errors() {
    // Declared data type disagrees with the table
    let bytes = rec(GdsRecordType::Layer, GdsDataType::Str, b"AB");
    match GdsReader::from_bytes(&bytes).read_record() {
        Err(GdsError::TypeMismatch { rtype, .. }) => assert_eq!(rtype, GdsRecordType::Layer),
        other => panic!("expected TypeMismatch, got {:?}", other),
    }
    // Record-type code past the table
    let bytes = [0x00, 0x04, 0x7f, 0x00];
    assert!(matches!(
        GdsReader::from_bytes(&bytes).read_record(),
        Err(GdsError::MalformedRecord(_))
    ));
    // Payload shorter than the header declares
    let bytes = [0x00, 0x0c, 0x0d, 0x02, 0x00, 0x01];
    match GdsReader::from_bytes(&bytes).read_record() {
        Err(GdsError::TruncatedPayload { need, have, .. }) => {
            assert_eq!(need, 8);
            assert_eq!(have, 2);
        }
        other => panic!("expected TruncatedPayload, got {:?}", other),
    }
    // Partial header
    let bytes = [0x00];
    assert!(matches!(
        GdsReader::from_bytes(&bytes).read_record(),
        Err(GdsError::MalformedRecord(_))
    ));
    // Clean end of stream
    assert!(matches!(GdsReader::from_bytes(&[]).read_record(), Ok(None)));
}

#[test]
fn record_ordering() {
    // BOUNDARY before any BGNSTR
    let mut v = Vec::new();
    v.extend(rec(GdsRecordType::Header, GdsDataType::I16, &i16s(&[600])));
    v.extend(rec(GdsRecordType::BgnLib, GdsDataType::I16, &i16s(&[0; 12])));
    v.extend(rec(GdsRecordType::LibName, GdsDataType::Str, b"LIB"));
    v.extend(rec(GdsRecordType::Boundary, GdsDataType::NoData, &[]));
    match GdsLibrary::from_bytes(&v) {
        Err(GdsError::UnexpectedRecord { rtype, state }) => {
            assert_eq!(rtype, GdsRecordType::Boundary);
            assert_eq!(state, ParseState::InLibrary);
        }
        other => panic!("expected UnexpectedRecord, got {:?}", other),
    }
}

#[test]
fn orphan_propvalue() {
    let mut v = Vec::new();
    v.extend(rec(GdsRecordType::Header, GdsDataType::I16, &i16s(&[600])));
    v.extend(rec(GdsRecordType::BgnLib, GdsDataType::I16, &i16s(&[0; 12])));
    v.extend(rec(GdsRecordType::BgnStruct, GdsDataType::I16, &i16s(&[0; 12])));
    v.extend(rec(GdsRecordType::StructName, GdsDataType::Str, b"S"));
    v.extend(rec(GdsRecordType::Boundary, GdsDataType::NoData, &[]));
    v.extend(rec(GdsRecordType::PropValue, GdsDataType::Str, b"VAL"));
    assert!(matches!(
        GdsLibrary::from_bytes(&v),
        Err(GdsError::OrphanPropValue)
    ));
}

#[test]
fn truncated_file() {
    let mut v = sample_lib_bytes("LIB");
    // Cut the final ENDLIB record
    v.truncate(v.len() - 4);
    assert!(matches!(
        GdsLibrary::from_bytes(&v),
        Err(GdsError::TruncatedFile)
    ));
}

#[test]
fn unhandled_records_warn_only() -> GdsResult<()> {
    // A PRESENTATION record has no handler and must not abort the parse
    let mut v = Vec::new();
    v.extend(rec(GdsRecordType::Header, GdsDataType::I16, &i16s(&[600])));
    v.extend(rec(GdsRecordType::BgnLib, GdsDataType::I16, &i16s(&[0; 12])));
    v.extend(rec(GdsRecordType::LibName, GdsDataType::Str, b"LIB"));
    v.extend(rec(GdsRecordType::BgnStruct, GdsDataType::I16, &i16s(&[0; 12])));
    v.extend(rec(GdsRecordType::StructName, GdsDataType::Str, b"S"));
    v.extend(rec(GdsRecordType::Text, GdsDataType::NoData, &[]));
    v.extend(rec(GdsRecordType::Layer, GdsDataType::I16, &i16s(&[3])));
    v.extend(rec(GdsRecordType::Presentation, GdsDataType::BitArray, &[0x00, 0x05]));
    v.extend(rec(GdsRecordType::String, GdsDataType::Str, b"LABEL"));
    v.extend(rec(GdsRecordType::Xy, GdsDataType::I32, &i32s(&[7, 9])));
    v.extend(rec(GdsRecordType::EndElement, GdsDataType::NoData, &[]));
    v.extend(rec(GdsRecordType::EndStruct, GdsDataType::NoData, &[]));
    v.extend(rec(GdsRecordType::EndLib, GdsDataType::NoData, &[]));
    let lib = GdsLibrary::from_bytes(&v)?;
    let e = &lib.structs[0].elems[0];
    assert_eq!(e.kind, GdsElemKind::Text);
    assert_eq!(e.text.as_deref(), Some("LABEL"));
    assert_eq!(e.xy, vec![GdsPoint::new(7, 9)]);
    Ok(())
}

#[test]
fn parse_and_flatten() -> GdsResult<()> {
    let lib = GdsLibrary::from_bytes(&sample_lib_bytes("TESTLIB"))?;
    assert_eq!(lib.name, "TESTLIB");
    assert_eq!(lib.version, 600);
    assert_eq!(lib.structs.len(), 1);
    assert_eq!(lib.structs[0].name, "TOP");
    assert_eq!(lib.layers, vec![1]);
    let e = &lib.structs[0].elems[0];
    assert_eq!(e.kind, GdsElemKind::Boundary);
    assert_eq!(e.xy.len(), 5);

    let table = flatten(&lib, &FlattenOptions::default())?;
    assert_eq!(table.len(), 1);
    let ents = &table[&1];
    assert_eq!(ents.len(), 1);
    match &ents[0] {
        Entity::Polygon(p) => {
            assert!(p.closed);
            // Duplicated closing vertex dropped
            assert_eq!(p.points.len(), 4);
            // 1000 database units at 1e-9 m each = 1.0 micrometers
            assert!((p.points[2][0] - 1.0).abs() < 1e-9);
            assert!((p.points[2][1] - 1.0).abs() < 1e-9);
        }
        other => panic!("expected polygon, got {:?}", other),
    }
    Ok(())
}

#[test]
fn flatten_idempotence() -> GdsResult<()> {
    let lib = GdsLibrary::from_bytes(&sample_lib_bytes("TESTLIB"))?;
    let first = flatten(&lib, &FlattenOptions::default())?;
    let second = flatten(&lib, &FlattenOptions::default())?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn explicit_length_unit() -> GdsResult<()> {
    let lib = GdsLibrary::from_bytes(&sample_lib_bytes("TESTLIB"))?;
    let opts = FlattenOptions {
        coordinate_length_unit: Some(2e-6),
    };
    let table = flatten(&lib, &opts)?;
    match &table[&1][0] {
        Entity::Polygon(p) => assert!((p.points[2][0] - 0.5).abs() < 1e-9),
        other => panic!("expected polygon, got {:?}", other),
    }
    Ok(())
}

#[test]
fn env_length_unit_override() -> GdsResult<()> {
    let lib = GdsLibrary::from_bytes(&sample_lib_bytes("TESTLIB"))?;
    // A parsable value scales the output; garbage falls back to the
    // one-micrometer default. Restore promptly: concurrent tests flattening
    // with default options read the same variable.
    std::env::set_var(LENGTH_UNIT_ENV, "2e-6");
    let scaled = flatten(&lib, &FlattenOptions::default());
    std::env::set_var(LENGTH_UNIT_ENV, "not-a-number");
    let fallback = flatten(&lib, &FlattenOptions::default());
    std::env::remove_var(LENGTH_UNIT_ENV);

    match &scaled?[&1][0] {
        Entity::Polygon(p) => assert!((p.points[2][0] - 0.5).abs() < 1e-9),
        other => panic!("expected polygon, got {:?}", other),
    }
    match &fallback?[&1][0] {
        Entity::Polygon(p) => assert!((p.points[2][0] - 1.0).abs() < 1e-9),
        other => panic!("expected polygon, got {:?}", other),
    }
    Ok(())
}

#[test]
fn strans_decoding() -> GdsResult<()> {
    // Flag 0 is the most significant bit of the big-endian word
    let bits = GdsRecordData::Bits(0x8006);
    assert!(bits.flag(0)); // reflection
    assert!(!bits.flag(1));
    assert!(bits.flag(13)); // absolute magnification
    assert!(bits.flag(14)); // absolute angle
    assert!(!bits.flag(15));
    assert!(!bits.flag(16)); // past the sixteen flags
    assert!(!GdsRecordData::None.flag(0));

    // The same word through a full STRANS record on a structure reference
    let mut v = Vec::new();
    v.extend(rec(GdsRecordType::Header, GdsDataType::I16, &i16s(&[600])));
    v.extend(rec(GdsRecordType::BgnLib, GdsDataType::I16, &i16s(&[0; 12])));
    v.extend(rec(GdsRecordType::LibName, GdsDataType::Str, b"LIB"));
    v.extend(rec(GdsRecordType::BgnStruct, GdsDataType::I16, &i16s(&[0; 12])));
    v.extend(rec(GdsRecordType::StructName, GdsDataType::Str, b"S"));
    v.extend(rec(GdsRecordType::StructRef, GdsDataType::NoData, &[]));
    v.extend(rec(GdsRecordType::StructRefName, GdsDataType::Str, b"TGT"));
    v.extend(rec(GdsRecordType::Strans, GdsDataType::BitArray, &[0x80, 0x06]));
    v.extend(rec(GdsRecordType::Mag, GdsDataType::F64, &f64s(&[2.0])));
    v.extend(rec(GdsRecordType::Angle, GdsDataType::F64, &f64s(&[90.0])));
    v.extend(rec(GdsRecordType::Xy, GdsDataType::I32, &i32s(&[5, 5])));
    v.extend(rec(GdsRecordType::EndElement, GdsDataType::NoData, &[]));
    v.extend(rec(GdsRecordType::EndStruct, GdsDataType::NoData, &[]));
    v.extend(rec(GdsRecordType::EndLib, GdsDataType::NoData, &[]));
    let lib = GdsLibrary::from_bytes(&v)?;
    let e = &lib.structs[0].elems[0];
    assert_eq!(e.kind, GdsElemKind::StructRef);
    assert!(e.strans.reflected);
    assert!(e.strans.abs_mag);
    assert!(e.strans.abs_angle);
    assert_eq!(e.mag, 2.0);
    assert_eq!(e.angle, 90.0);
    Ok(())
}

#[test]
fn aref_expansion() -> GdsResult<()> {
    let mut lib = unit_scale_lib("arraylib");
    let mut unit = GdsStruct::new("UNIT");
    unit.elems.push(boundary(1, 5));
    lib.structs.push(unit);
    let mut top = GdsStruct::new("TOP");
    let mut aref = GdsElement::new(GdsElemKind::ArrayRef);
    aref.sname = Some("UNIT".to_string());
    aref.cols = 2;
    aref.rows = 3;
    aref.xy = GdsPoint::parse_vec(&[0, 0, 20, 0, 0, 30])?;
    top.elems.push(aref);
    lib.structs.push(top);
    lib.resolve_references();
    assert!(lib.structs[0].is_referenced);
    assert!(!lib.structs[1].is_referenced);

    let table = flatten(&lib, &FlattenOptions::default())?;
    let ents = &table[&1];
    assert_eq!(ents.len(), 6);
    // Column step (20-0)/2 = 10, row step (30-0)/3 = 10
    let mut origins: Vec<[i64; 2]> = ents
        .iter()
        .map(|e| match e {
            Entity::Polygon(p) => [
                p.points[0][0].round() as i64,
                p.points[0][1].round() as i64,
            ],
            other => panic!("expected polygon, got {:?}", other),
        })
        .collect();
    origins.sort();
    assert_eq!(
        origins,
        vec![[0, 0], [0, 10], [0, 20], [10, 0], [10, 10], [10, 20]]
    );
    Ok(())
}

#[test]
fn sref_transforms() -> GdsResult<()> {
    let mut lib = unit_scale_lib("sreflib");
    let mut unit = GdsStruct::new("UNIT");
    unit.elems.push(boundary(1, 10));
    lib.structs.push(unit);
    let mut top = GdsStruct::new("TOP");
    let mut e = sref("UNIT", 100, 0);
    e.angle = 90.0;
    e.mag = 2.0;
    top.elems.push(e);
    lib.structs.push(top);
    lib.resolve_references();

    let table = flatten(&lib, &FlattenOptions::default())?;
    match &table[&1][0] {
        Entity::Polygon(p) => {
            // Local (10, 0) rotated 90 degrees at 2x, then translated by (100, 0)
            assert!((p.points[1][0] - 100.0).abs() < 1e-9);
            assert!((p.points[1][1] - 20.0).abs() < 1e-9);
        }
        other => panic!("expected polygon, got {:?}", other),
    }
    Ok(())
}

#[test]
fn dangling_reference() {
    let mut lib = unit_scale_lib("danglib");
    let mut top = GdsStruct::new("TOP");
    top.elems.push(sref("NOPE", 0, 0));
    lib.structs.push(top);
    lib.resolve_references();
    match flatten(&lib, &FlattenOptions::default()) {
        Err(GdsError::DanglingReference {
            structure,
            elem,
            target,
        }) => {
            assert_eq!(structure, "TOP");
            assert_eq!(elem, 0);
            assert_eq!(target, "NOPE");
        }
        other => panic!("expected DanglingReference, got {:?}", other),
    }
}

#[test]
fn cyclic_reference() {
    let mut lib = unit_scale_lib("cyclelib");
    let mut c = GdsStruct::new("C");
    c.elems.push(sref("A", 0, 0));
    let mut a = GdsStruct::new("A");
    a.elems.push(sref("B", 0, 0));
    let mut b = GdsStruct::new("B");
    b.elems.push(sref("A", 0, 0));
    lib.structs.push(c);
    lib.structs.push(a);
    lib.structs.push(b);
    lib.resolve_references();
    match flatten(&lib, &FlattenOptions::default()) {
        Err(GdsError::CyclicReference { structure }) => assert_eq!(structure, "A"),
        other => panic!("expected CyclicReference, got {:?}", other),
    }
}

#[test]
fn pcell_exclusion() -> GdsResult<()> {
    // Marker in the structure name
    let mut v = Vec::new();
    v.extend(rec(GdsRecordType::Header, GdsDataType::I16, &i16s(&[600])));
    v.extend(rec(GdsRecordType::BgnLib, GdsDataType::I16, &i16s(&[0; 12])));
    v.extend(rec(GdsRecordType::LibName, GdsDataType::Str, b"LIB"));
    v.extend(rec(GdsRecordType::Units, GdsDataType::F64, &f64s(&[1e-3, 1e-9])));
    v.extend(rec(GdsRecordType::BgnStruct, GdsDataType::I16, &i16s(&[0; 12])));
    v.extend(rec(GdsRecordType::StructName, GdsDataType::Str, b"TPL$$CONTEXT_INFO"));
    v.extend(rec(GdsRecordType::Boundary, GdsDataType::NoData, &[]));
    v.extend(rec(GdsRecordType::Layer, GdsDataType::I16, &i16s(&[1])));
    v.extend(rec(GdsRecordType::Xy, GdsDataType::I32, &i32s(&[0, 0, 5, 0, 5, 5])));
    v.extend(rec(GdsRecordType::EndElement, GdsDataType::NoData, &[]));
    v.extend(rec(GdsRecordType::EndStruct, GdsDataType::NoData, &[]));
    // Marker in a property value
    v.extend(rec(GdsRecordType::BgnStruct, GdsDataType::I16, &i16s(&[0; 12])));
    v.extend(rec(GdsRecordType::StructName, GdsDataType::Str, b"TPLB"));
    v.extend(rec(GdsRecordType::Boundary, GdsDataType::NoData, &[]));
    v.extend(rec(GdsRecordType::Layer, GdsDataType::I16, &i16s(&[1])));
    v.extend(rec(GdsRecordType::Xy, GdsDataType::I32, &i32s(&[0, 0, 5, 0, 5, 5])));
    v.extend(rec(GdsRecordType::PropAttr, GdsDataType::I16, &i16s(&[1])));
    v.extend(rec(GdsRecordType::PropValue, GdsDataType::Str, b"context_info"));
    v.extend(rec(GdsRecordType::EndElement, GdsDataType::NoData, &[]));
    v.extend(rec(GdsRecordType::EndStruct, GdsDataType::NoData, &[]));
    v.extend(rec(GdsRecordType::EndLib, GdsDataType::NoData, &[]));

    let lib = GdsLibrary::from_bytes(&v)?;
    assert!(lib.structs[0].is_pcell);
    assert!(lib.structs[1].is_pcell); // case-insensitive marker match
    let table = flatten(&lib, &FlattenOptions::default())?;
    assert!(table.is_empty());
    Ok(())
}

#[test]
fn path_widths() -> GdsResult<()> {
    let mut lib = unit_scale_lib("pathlib");
    let mut s = GdsStruct::new("TOP");
    let mut wide = GdsElement::new(GdsElemKind::Path);
    wide.layer = 2;
    wide.width = 10;
    wide.xy = GdsPoint::parse_vec(&[0, 0, 100, 0, 100, 100])?;
    s.elems.push(wide);
    let mut thin = GdsElement::new(GdsElemKind::Path);
    thin.layer = 3;
    thin.xy = GdsPoint::parse_vec(&[0, 0, 100, 0, 100, 100])?;
    s.elems.push(thin);
    lib.structs.push(s);

    let table = flatten(&lib, &FlattenOptions::default())?;
    // Nonzero width: one independent quad per segment
    let quads = &table[&2];
    assert_eq!(quads.len(), 2);
    match &quads[0] {
        Entity::Polygon(p) => {
            assert!(p.closed);
            assert_eq!(p.points.len(), 4);
            assert!(point_in_polygon(&p.points, 50.0, 0.0));
            assert!(!point_in_polygon(&p.points, 50.0, 6.0));
        }
        other => panic!("expected polygon, got {:?}", other),
    }
    // Zero width: one open polyline with the raw vertex sequence
    let lines = &table[&3];
    assert_eq!(lines.len(), 1);
    match &lines[0] {
        Entity::Polygon(p) => {
            assert!(!p.closed);
            assert_eq!(p.points.len(), 3);
        }
        other => panic!("expected polyline, got {:?}", other),
    }
    Ok(())
}

#[test]
fn label_anchored_polygons() -> GdsResult<()> {
    let mut lib = unit_scale_lib("portlib");
    let mut s = GdsStruct::new("TOP");
    s.elems.push(boundary(1, 100));
    let mut inside = GdsElement::new(GdsElemKind::Text);
    inside.layer = 1;
    inside.text = Some("IN".to_string());
    inside.xy = vec![GdsPoint::new(50, 50)];
    s.elems.push(inside);
    let mut inside2 = GdsElement::new(GdsElemKind::Text);
    inside2.layer = 1;
    inside2.text = Some("IN".to_string());
    inside2.xy = vec![GdsPoint::new(60, 60)];
    s.elems.push(inside2);
    let mut outside = GdsElement::new(GdsElemKind::Text);
    outside.layer = 1;
    outside.text = Some("OUT".to_string());
    outside.xy = vec![GdsPoint::new(200, 200)];
    s.elems.push(outside);
    lib.structs.push(s);

    let table = flatten(&lib, &FlattenOptions::default())?;
    let data = GdsData { lib, table };
    assert_eq!(data.polygons(None).len(), 1);
    assert_eq!(data.texts(Some(1)).len(), 3);
    // Two anchors in the same polygon report it once
    assert_eq!(data.polygons_under_label("IN", None).len(), 1);
    assert_eq!(data.polygons_under_label("IN", Some(2)).len(), 0);
    assert_eq!(data.polygons_under_label("OUT", None).len(), 0);
    Ok(())
}

#[test]
fn port_labels() {
    assert_eq!(parse_port_label("PORT 3+"), Some(3));
    assert_eq!(parse_port_label("port 2P"), Some(2));
    assert_eq!(parse_port_label("Port 1m"), Some(-1));
    assert_eq!(parse_port_label("port 7-"), Some(-7));
    assert_eq!(parse_port_label("PORT x"), None);
    assert_eq!(parse_port_label("PORT 1"), None); // terminal suffix required
    assert_eq!(parse_port_label("PORT 0+"), None); // ports start at 1
    assert_eq!(parse_port_label("VDD"), None);
}

#[test]
fn cache_keyed_by_path() -> GdsResult<()> {
    let dir = tempfile::tempdir()?;
    let p1 = dir.path().join("a.gds");
    let p2 = dir.path().join("b.gds");
    std::fs::write(&p1, sample_lib_bytes("LIBA"))?;
    std::fs::write(&p2, sample_lib_bytes("LIBC"))?;

    let mut cache = GdsCache::new();
    assert_eq!(cache.get(&p1)?.lib.name, "LIBA");
    // Same path: the cached model is reused even though the file changed
    std::fs::write(&p1, sample_lib_bytes("LIBB"))?;
    assert_eq!(cache.get(&p1)?.lib.name, "LIBA");
    // Different path: the slot is discarded and reloaded
    assert_eq!(cache.get(&p2)?.lib.name, "LIBC");
    // And the first path is now re-read from disk
    assert_eq!(cache.get(&p1)?.lib.name, "LIBB");
    Ok(())
}

#[test]
fn description_stats_and_dump() -> GdsResult<()> {
    let lib = GdsLibrary::from_bytes(&sample_lib_bytes("TESTLIB"))?;
    assert_eq!(lib.struct_by_name("TOP"), Some(0));
    assert_eq!(lib.struct_by_name("NOPE"), None);

    let stats = lib.stats();
    assert_eq!(stats.structs, 1);
    assert_eq!(stats.boundaries, 1);
    assert_eq!(stats.paths, 0);

    let mut desc = Vec::new();
    lib.write_description(&mut desc)?;
    let desc = String::from_utf8(desc).unwrap();
    assert!(desc.contains("TESTLIB"));
    assert!(desc.contains("TOP"));

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("dump.gds");
    std::fs::write(&path, sample_lib_bytes("TESTLIB"))?;
    let mut out = Vec::new();
    dump_records(&path, &mut out)?;
    let out = String::from_utf8(out).unwrap();
    assert_eq!(out.lines().count(), 13);
    assert!(out.contains("Header"));
    assert!(out.contains("EndLib"));

    // The model serializes
    let json = lib.to_json()?;
    assert!(json.contains("\"TOP\""));
    Ok(())
}
