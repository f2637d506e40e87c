//!
//! # Query Surface
//!
//! [GdsData] couples a parsed [GdsLibrary] with its flattened [EntityTable]
//! and answers layer/polygon/text queries over it. [GdsCache] adds a
//! path-keyed single-slot cache for repeated queries against the same file.
//!

// Std-Lib Imports
use std::path::{Path, PathBuf};

// Crates.io
use serde::{Deserialize, Serialize};

// Local Imports
use crate::data::{GdsLibrary, GdsResult};
use crate::flatten::{flatten, Entity, EntityTable, FlattenOptions, Polygon, TextAnchor};
use crate::geom::point_in_polygon;

/// # Loaded & Flattened Gds File
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GdsData {
    /// The hierarchical model
    pub lib: GdsLibrary,
    /// Its flattened per-layer entities
    pub table: EntityTable,
}
impl GdsData {
    /// Load file `fname`: parse, resolve references, and flatten with
    /// default options.
    pub fn load(fname: impl AsRef<Path>) -> GdsResult<Self> {
        Self::load_with(fname, &FlattenOptions::default())
    }
    /// Load file `fname` with explicit flattening options.
    pub fn load_with(fname: impl AsRef<Path>, opts: &FlattenOptions) -> GdsResult<Self> {
        let lib = GdsLibrary::open(fname)?;
        let table = flatten(&lib, opts)?;
        Ok(Self { lib, table })
    }
    /// Layer indices present, ascending.
    pub fn layers(&self) -> &[i16] {
        &self.lib.layers
    }
    /// All polygon entities, optionally restricted to one layer.
    pub fn polygons(&self, layer: Option<i16>) -> Vec<&Polygon> {
        self.entities(layer)
            .filter_map(|e| match e {
                Entity::Polygon(p) => Some(p),
                _ => None,
            })
            .collect()
    }
    /// All text-anchor entities, optionally restricted to one layer.
    pub fn texts(&self, layer: Option<i16>) -> Vec<&TextAnchor> {
        self.entities(layer)
            .filter_map(|e| match e {
                Entity::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }
    /// Polygons whose interior contains the anchor point of a text entity on
    /// the same layer whose string equals `label`. Optionally restricted to
    /// one layer. Each anchor binds to the first containing polygon, and each
    /// polygon is reported at most once.
    pub fn polygons_under_label(&self, label: &str, layer: Option<i16>) -> Vec<&Polygon> {
        let mut found: Vec<&Polygon> = Vec::new();
        for (&l, ents) in self.table.iter() {
            if let Some(want) = layer {
                if l != want {
                    continue;
                }
            }
            for anchor in ents.iter().filter_map(|e| match e {
                Entity::Text(t) if t.string == label => Some(t),
                _ => None,
            }) {
                let hit = ents
                    .iter()
                    .filter_map(|e| match e {
                        Entity::Polygon(p) => Some(p),
                        _ => None,
                    })
                    .find(|p| point_in_polygon(&p.points, anchor.loc[0], anchor.loc[1]));
                if let Some(poly) = hit {
                    if !found.iter().any(|p| std::ptr::eq(*p, poly)) {
                        found.push(poly);
                    }
                }
            }
        }
        found
    }
    fn entities(&self, layer: Option<i16>) -> impl Iterator<Item = &Entity> {
        self.table
            .iter()
            .filter(move |(&l, _)| layer.map_or(true, |want| l == want))
            .flat_map(|(_, ents)| ents.iter())
    }
}

/// # Path-Keyed Gds Cache
///
/// Single-slot cache over [GdsData::load], keyed strictly by input path:
/// repeated queries for the same path reuse the last-loaded model, and a
/// query for a different path fully discards it.
#[derive(Debug, Default)]
pub struct GdsCache {
    slot: Option<(PathBuf, GdsData)>,
}
impl GdsCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
    /// The loaded data for `fname`, from cache when the path matches the
    /// previous call and freshly loaded otherwise.
    pub fn get(&mut self, fname: impl AsRef<Path>) -> GdsResult<&GdsData> {
        let path = fname.as_ref().to_path_buf();
        let hit = matches!(&self.slot, Some((p, _)) if *p == path);
        if !hit {
            let data = GdsData::load(&path)?;
            self.slot = Some((path, data));
        }
        match &self.slot {
            Some((_, data)) => Ok(data),
            None => Err("empty cache slot after load".into()),
        }
    }
    /// Drop any cached model.
    pub fn clear(&mut self) {
        self.slot = None;
    }
}

/// Interpret a text string as a port-terminal label.
///
/// Labels take the form `PORT <n><suffix>` (prefix matched
/// case-insensitively, `n` positive): suffix `+`, `P`, or `p` labels the
/// positive terminal of port `n` (returns `+n`); `-`, `M`, `m`, `N`, or `n`
/// the negative terminal (returns `-n`). Strings without the prefix return
/// `None` silently; malformed labels after the prefix warn and return `None`.
pub fn parse_port_label(text: &str) -> Option<i32> {
    let prefix = match text.get(..5) {
        Some(p) => p,
        None => return None,
    };
    if !prefix.eq_ignore_ascii_case("PORT ") {
        return None;
    }
    let rest = text[5..].trim_start();
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let num: i32 = match rest[..digits].parse() {
        Ok(n) => n,
        Err(_) => {
            tracing::warn!(label = %text, "not a valid port terminal label (ignoring)");
            return None;
        }
    };
    if num <= 0 {
        tracing::warn!(label = %text, index = num, "not a valid port index (ignoring)");
        return None;
    }
    match rest[digits..].chars().next() {
        Some('P') | Some('p') | Some('+') => Some(num),
        Some('M') | Some('m') | Some('N') | Some('n') | Some('-') => Some(-num),
        _ => {
            tracing::warn!(label = %text, "not a valid port terminal label (ignoring)");
            None
        }
    }
}
