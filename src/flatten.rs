//!
//! # Hierarchy Flattening
//!
//! Recursively instances every top-level structure of a parsed [GdsLibrary],
//! composing similarity transforms through nested structure and array
//! references, and emits per-layer lists of flat geometric entities in
//! real-valued physical coordinates.
//!

// Std-Lib Imports
use std::collections::BTreeMap;
use std::env;

// Crates.io
use serde::{Deserialize, Serialize};

// Local Imports
use crate::data::{GdsElemKind, GdsElement, GdsError, GdsLibrary, GdsPoint, GdsResult, GdsStruct};

/// Environment variable overriding the physical length unit (in meters) used
/// when converting database-unit integers to real coordinates.
pub const LENGTH_UNIT_ENV: &str = "GDSFLAT_LENGTH_UNIT";

/// Default physical length unit: one micrometer.
pub const DEFAULT_LENGTH_UNIT: f64 = 1.0e-6;

/// # Flattening Options
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FlattenOptions {
    /// Physical length unit in meters. Defaults to the [LENGTH_UNIT_ENV]
    /// environment variable if set, and [DEFAULT_LENGTH_UNIT] otherwise.
    pub coordinate_length_unit: Option<f64>,
}

///
/// # Similarity Transform
///
/// Rotation, mirroring, and magnification as a 2x2 matrix, plus a
/// translation vector. Composed transforms are passed by value down the
/// flattening recursion; each level cascades its reference-local transform
/// onto its parent's.
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GTransform {
    /// Rotation/mirroring/magnification matrix
    pub a: [[f64; 2]; 2],
    /// Translation
    pub b: [f64; 2],
}
impl GTransform {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            a: [[1.0, 0.0], [0.0, 1.0]],
            b: [0.0, 0.0],
        }
    }
    /// The transform of a structure reference: scale x by `mag`, scale y by
    /// `mag` negated if `reflected`, rotate by `angle` degrees
    /// counter-clockwise, then translate by `(x0, y0)`.
    pub fn from_reference(x0: f64, y0: f64, reflected: bool, mag: f64, angle: f64) -> Self {
        let theta = angle.to_radians();
        let (sin, cos) = (theta.sin(), theta.cos());
        let my = if reflected { -mag } else { mag };
        Self {
            a: [[cos * mag, -sin * my], [sin * mag, cos * my]],
            b: [x0, y0],
        }
    }
    /// Compose `parent` with `child`: the result applies `child` first,
    /// then `parent`.
    pub fn cascade(parent: &GTransform, child: &GTransform) -> Self {
        Self {
            a: matmul(&parent.a, &child.a),
            b: {
                let t = matvec(&parent.a, &child.b);
                [t[0] + parent.b[0], t[1] + parent.b[1]]
            },
        }
    }
    /// Apply to point `(x, y)`.
    pub fn apply(&self, x: f64, y: f64) -> [f64; 2] {
        [
            self.a[0][0] * x + self.a[0][1] * y + self.b[0],
            self.a[1][0] * x + self.a[1][1] * y + self.b[1],
        ]
    }
}

/// 2x2 matrix multiplication
fn matmul(a: &[[f64; 2]; 2], b: &[[f64; 2]; 2]) -> [[f64; 2]; 2] {
    [
        [
            a[0][0] * b[0][0] + a[0][1] * b[1][0],
            a[0][0] * b[0][1] + a[0][1] * b[1][1],
        ],
        [
            a[1][0] * b[0][0] + a[1][1] * b[1][0],
            a[1][0] * b[0][1] + a[1][1] * b[1][1],
        ],
    ]
}
/// 2x2 matrix-vector multiplication
fn matvec(a: &[[f64; 2]; 2], v: &[f64; 2]) -> [f64; 2] {
    [
        a[0][0] * v[0] + a[0][1] * v[1],
        a[1][0] * v[0] + a[1][1] * v[1],
    ]
}

/// # Flat Polygon Entity
/// An ordered list of real-valued vertices, closed (implicitly, last back to
/// first) or open, with a provenance label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<[f64; 2]>,
    pub closed: bool,
    pub label: String,
}

/// # Flat Text Entity
/// A single anchor point plus the text content, with a provenance label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnchor {
    pub loc: [f64; 2],
    pub string: String,
    pub label: String,
}

/// # Flat Entity
/// One unit of flattened output: a polygon or a text anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Polygon(Polygon),
    Text(TextAnchor),
}

/// Per-layer flattened output: layer index to the entities on that layer.
pub type EntityTable = BTreeMap<i16, Vec<Entity>>;

/// Flatten `lib` into a per-layer [EntityTable].
///
/// Every non-referenced, non-pseudo-cell structure is instanced at the top
/// level with the identity transform; nested references compose their own
/// transform onto their parent's. Fails on dangling references and on
/// reference cycles.
pub fn flatten(lib: &GdsLibrary, opts: &FlattenOptions) -> GdsResult<EntityTable> {
    let unit = resolve_length_unit(opts);
    let mut f = Flattener {
        lib,
        scale: lib.units[1] / unit,
        table: EntityTable::new(),
        open: Vec::new(),
    };
    let identity = GTransform::identity();
    for ns in 0..lib.structs.len() {
        f.add_struct(ns, &identity, false)?;
    }
    Ok(f.table)
}

/// The physical length unit for this flatten call, in meters.
fn resolve_length_unit(opts: &FlattenOptions) -> f64 {
    if let Some(unit) = opts.coordinate_length_unit {
        return unit;
    }
    match env::var(LENGTH_UNIT_ENV) {
        Ok(val) => match val.trim().parse::<f64>() {
            Ok(unit) if unit > 0.0 => unit,
            _ => {
                tracing::warn!(var = LENGTH_UNIT_ENV, value = %val, "ignoring unparsable length unit");
                DEFAULT_LENGTH_UNIT
            }
        },
        Err(_) => DEFAULT_LENGTH_UNIT,
    }
}

/// Recursive traversal state: the source library, the database-to-physical
/// scale factor, the accumulating table, and the stack of in-progress
/// structure indices used for cycle detection.
struct Flattener<'a> {
    lib: &'a GdsLibrary,
    scale: f64,
    table: EntityTable,
    open: Vec<usize>,
}
impl<'a> Flattener<'a> {
    /// Instance structure `ns` under transform `t`.
    /// Pseudo-cells are always skipped; referenced structures are skipped
    /// unless entered through a reference (`via_ref`).
    fn add_struct(&mut self, ns: usize, t: &GTransform, via_ref: bool) -> GdsResult<()> {
        let s = &self.lib.structs[ns];
        if s.is_pcell {
            return Ok(());
        }
        if !via_ref && s.is_referenced {
            return Ok(());
        }
        self.open.push(ns);
        for (ne, e) in s.elems.iter().enumerate() {
            self.add_element(s, ne, e, t)?;
        }
        self.open.pop();
        Ok(())
    }
    fn add_element(
        &mut self,
        s: &GdsStruct,
        ne: usize,
        e: &GdsElement,
        t: &GTransform,
    ) -> GdsResult<()> {
        match e.kind {
            GdsElemKind::Boundary => self.add_boundary(s, ne, e, t),
            GdsElemKind::Path => self.add_path(s, ne, e, t),
            GdsElemKind::Text => self.add_text(s, ne, e, t),
            GdsElemKind::StructRef | GdsElemKind::ArrayRef => self.add_ref(s, ne, e, t),
            // NODE and BOX elements carry no flattened geometry
            GdsElemKind::Node | GdsElemKind::Box => Ok(()),
        }
    }
    /// Transform a database-unit point to physical coordinates.
    fn phys(&self, t: &GTransform, p: &GdsPoint) -> [f64; 2] {
        let q = t.apply(p.x as f64, p.y as f64);
        [q[0] * self.scale, q[1] * self.scale]
    }
    fn push(&mut self, layer: i16, entity: Entity) {
        self.table.entry(layer).or_default().push(entity);
    }
    fn add_boundary(
        &mut self,
        s: &GdsStruct,
        ne: usize,
        e: &GdsElement,
        t: &GTransform,
    ) -> GdsResult<()> {
        let mut ring: &[GdsPoint] = &e.xy;
        // Drop a duplicated closing vertex; the ring is implicitly closed
        if ring.len() >= 2 && ring.first() == ring.last() {
            ring = &ring[..ring.len() - 1];
        }
        let points = ring.iter().map(|p| self.phys(t, p)).collect();
        let label = format!("structure {} element #{} (boundary)", s.name, ne);
        self.push(
            e.layer,
            Entity::Polygon(Polygon {
                points,
                closed: true,
                label,
            }),
        );
        Ok(())
    }
    fn add_path(
        &mut self,
        s: &GdsStruct,
        ne: usize,
        e: &GdsElement,
        t: &GTransform,
    ) -> GdsResult<()> {
        if e.xy.len() < 2 {
            tracing::warn!(
                structure = %s.name,
                element = ne,
                "skipping path with fewer than two vertices"
            );
            return Ok(());
        }
        let points: Vec<[f64; 2]> = e.xy.iter().map(|p| self.phys(t, p)).collect();
        if e.width == 0 {
            let label = format!("structure {} element #{} (path)", s.name, ne);
            self.push(
                e.layer,
                Entity::Polygon(Polygon {
                    points,
                    closed: false,
                    label,
                }),
            );
            return Ok(());
        }
        // Nonzero width: one independent closed quadrilateral per segment,
        // offset half the width to each side. No miter or cap joins.
        let half = (e.width as f64 * self.scale).abs() / 2.0;
        for (nseg, pair) in points.windows(2).enumerate() {
            let (p, q) = (pair[0], pair[1]);
            let (dx, dy) = (q[0] - p[0], q[1] - p[1]);
            let len = (dx * dx + dy * dy).sqrt();
            if len == 0.0 {
                continue;
            }
            let o = [-dy / len * half, dx / len * half];
            let quad = vec![
                [p[0] + o[0], p[1] + o[1]],
                [q[0] + o[0], q[1] + o[1]],
                [q[0] - o[0], q[1] - o[1]],
                [p[0] - o[0], p[1] - o[1]],
            ];
            let label = format!(
                "structure {} element #{} (path segment {})",
                s.name, ne, nseg
            );
            self.push(
                e.layer,
                Entity::Polygon(Polygon {
                    points: quad,
                    closed: true,
                    label,
                }),
            );
        }
        Ok(())
    }
    fn add_text(
        &mut self,
        s: &GdsStruct,
        ne: usize,
        e: &GdsElement,
        t: &GTransform,
    ) -> GdsResult<()> {
        let anchor = match e.xy.first() {
            Some(p) => p,
            None => {
                tracing::warn!(structure = %s.name, element = ne, "skipping text without anchor");
                return Ok(());
            }
        };
        let label = format!("structure {} element #{} (text)", s.name, ne);
        self.push(
            e.layer,
            Entity::Text(TextAnchor {
                loc: self.phys(t, anchor),
                string: e.text.clone().unwrap_or_default(),
                label,
            }),
        );
        Ok(())
    }
    fn add_ref(
        &mut self,
        s: &GdsStruct,
        ne: usize,
        e: &GdsElement,
        t: &GTransform,
    ) -> GdsResult<()> {
        let target = match e.ns_ref {
            Some(i) => i,
            None => {
                return Err(GdsError::DanglingReference {
                    structure: s.name.clone(),
                    elem: ne,
                    target: e.sname.clone().unwrap_or_default(),
                })
            }
        };
        if self.open.contains(&target) {
            return Err(GdsError::CyclicReference {
                structure: self.lib.structs[target].name.clone(),
            });
        }
        match e.kind {
            GdsElemKind::StructRef => {
                let p0 = match e.xy.first() {
                    Some(p) => p,
                    None => {
                        return Err(GdsError::Str(format!(
                            "structure {}, element #{}: SREF without anchor point",
                            s.name, ne
                        )))
                    }
                };
                let local = GTransform::from_reference(
                    p0.x as f64,
                    p0.y as f64,
                    e.strans.reflected,
                    e.mag,
                    e.angle,
                );
                let t2 = GTransform::cascade(t, &local);
                self.add_struct(target, &t2, true)
            }
            GdsElemKind::ArrayRef => {
                if e.xy.len() < 3 || e.cols <= 0 || e.rows <= 0 {
                    return Err(GdsError::Str(format!(
                        "structure {}, element #{}: AREF without valid extents",
                        s.name, ne
                    )));
                }
                let p0 = e.xy[0];
                let (cols, rows) = (e.cols as i32, e.rows as i32);
                // Per-cell steps, componentwise truncating division
                let colstep = ((e.xy[1].x - p0.x) / cols, (e.xy[1].y - p0.y) / cols);
                let rowstep = ((e.xy[2].x - p0.x) / rows, (e.xy[2].y - p0.y) / rows);
                for nr in 0..rows {
                    for nc in 0..cols {
                        let x0 = p0.x + nc * colstep.0 + nr * rowstep.0;
                        let y0 = p0.y + nc * colstep.1 + nr * rowstep.1;
                        // AREF carries no per-cell orientation fields
                        let local =
                            GTransform::from_reference(x0 as f64, y0 as f64, false, 1.0, 0.0);
                        let t2 = GTransform::cascade(t, &local);
                        self.add_struct(target, &t2, true)?;
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_identity() {
        let t = GTransform::identity();
        assert_eq!(t.apply(3.0, -4.5), [3.0, -4.5]);
    }
    #[test]
    fn transform_rotate_magnify() {
        // 90 degrees at 2x: (1, 0) lands on (0, 2)
        let t = GTransform::from_reference(0.0, 0.0, false, 2.0, 90.0);
        let p = t.apply(1.0, 0.0);
        assert!(p[0].abs() < 1e-9);
        assert!((p[1] - 2.0).abs() < 1e-9);
    }
    #[test]
    fn transform_reflect() {
        let t = GTransform::from_reference(5.0, 0.0, true, 1.0, 0.0);
        let p = t.apply(0.0, 1.0);
        assert!((p[0] - 5.0).abs() < 1e-9);
        assert!((p[1] + 1.0).abs() < 1e-9);
    }
    #[test]
    fn transform_cascade() {
        // Child rotates 90 degrees; parent translates by (10, 0).
        // Applied child-first: (1, 0) -> (0, 1) -> (10, 1).
        let child = GTransform::from_reference(0.0, 0.0, false, 1.0, 90.0);
        let parent = GTransform::from_reference(10.0, 0.0, false, 1.0, 0.0);
        let t = GTransform::cascade(&parent, &child);
        let p = t.apply(1.0, 0.0);
        assert!((p[0] - 10.0).abs() < 1e-9);
        assert!((p[1] - 1.0).abs() < 1e-9);
    }
}
