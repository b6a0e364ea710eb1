// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Uniform grid hashes over nodes and elements.
//!
//! Both hashes bucket entities under the integer cell `floor(coord / cell)`
//! and answer box queries with an over-approximate candidate set. Callers
//! apply exact geometric filtering afterwards. Indexes are built once per
//! modifier pass. A pass that moves nodes re-indexes the elements it touched
//! with [`ElementSpatialHash::refresh`].

use nalgebra::Point3;
use rustc_hash::FxHashMap;

use crate::context::FeModelContext;
use crate::geometry::BoundingBox;
use crate::keys::{ElementId, NodeId};
use crate::nodes::Nodes;

/// Smallest usable cell size.
pub const MIN_CELL_SIZE: f64 = 1e-9;

/// Elements whose box would cover more cells than this are kept in a side
/// list and returned by every query.
const MAX_CELLS_PER_ELEMENT: u64 = 4096;

type Cell = (i64, i64, i64);

fn cell_of(p: &Point3<f64>, cell_size: f64) -> Cell {
    (
        (p.x / cell_size).floor() as i64,
        (p.y / cell_size).floor() as i64,
        (p.z / cell_size).floor() as i64,
    )
}

/// Inclusive range of grid cells covered by a box.
#[derive(Debug, Clone, Copy)]
struct CellRange {
    lo: Cell,
    hi: Cell,
}

impl CellRange {
    fn of(bbox: &BoundingBox, cell_size: f64) -> Self {
        let a = cell_of(&bbox.min, cell_size);
        let b = cell_of(&bbox.max, cell_size);
        Self {
            lo: (a.0.min(b.0), a.1.min(b.1), a.2.min(b.2)),
            hi: (a.0.max(b.0), a.1.max(b.1), a.2.max(b.2)),
        }
    }

    fn count(&self) -> u64 {
        let span = |lo: i64, hi: i64| (hi.saturating_sub(lo) as u64).saturating_add(1);
        span(self.lo.0, self.hi.0)
            .saturating_mul(span(self.lo.1, self.hi.1))
            .saturating_mul(span(self.lo.2, self.hi.2))
    }

    fn contains(&self, c: &Cell) -> bool {
        (self.lo.0..=self.hi.0).contains(&c.0)
            && (self.lo.1..=self.hi.1).contains(&c.1)
            && (self.lo.2..=self.hi.2).contains(&c.2)
    }

    fn cells(&self) -> impl Iterator<Item = Cell> {
        let (lo, hi) = (self.lo, self.hi);
        (lo.0..=hi.0).flat_map(move |x| {
            (lo.1..=hi.1).flat_map(move |y| (lo.2..=hi.2).map(move |z| (x, y, z)))
        })
    }
}

/// Collects the buckets a range touches. Walks the populated cells instead
/// of the range when that is cheaper.
fn gather<T: Copy + Ord>(grid: &FxHashMap<Cell, Vec<T>>, range: &CellRange, out: &mut Vec<T>) {
    if range.count() > grid.len() as u64 {
        for (cell, bucket) in grid {
            if range.contains(cell) {
                out.extend_from_slice(bucket);
            }
        }
    } else {
        for cell in range.cells() {
            if let Some(bucket) = grid.get(&cell) {
                out.extend_from_slice(bucket);
            }
        }
    }
}

/// Grid hash over node positions.
#[derive(Debug, Clone)]
pub struct NodeSpatialHash {
    cell_size: f64,
    grid: FxHashMap<Cell, Vec<NodeId>>,
}

impl NodeSpatialHash {
    /// Creates an empty hash. Cell sizes below [`MIN_CELL_SIZE`] are clamped.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(MIN_CELL_SIZE),
            grid: FxHashMap::default(),
        }
    }

    /// Buckets every node of `nodes`.
    pub fn build(nodes: &Nodes, cell_size: f64) -> Self {
        let mut hash = Self::new(cell_size);
        for (id, p) in nodes.iter() {
            hash.insert(id, &p);
        }
        hash
    }

    pub fn insert(&mut self, id: NodeId, p: &Point3<f64>) {
        let cell = cell_of(p, self.cell_size);
        self.grid.entry(cell).or_default().push(id);
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Nodes in every cell the box overlaps, sorted and de-duplicated.
    pub fn query(&self, bbox: &BoundingBox) -> Vec<NodeId> {
        let mut out = Vec::new();
        gather(&self.grid, &CellRange::of(bbox, self.cell_size), &mut out);
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Nodes within `radius` of `center`, exact distance test against the
    /// current positions in `nodes`.
    pub fn within(&self, nodes: &Nodes, center: &Point3<f64>, radius: f64) -> Vec<NodeId> {
        self.query(&BoundingBox::around(center, radius))
            .into_iter()
            .filter(|&id| {
                nodes
                    .get(id)
                    .is_some_and(|p| (p - center).norm() <= radius)
            })
            .collect()
    }
}

/// Grid hash over element bounding boxes.
#[derive(Debug, Clone)]
pub struct ElementSpatialHash {
    cell_size: f64,
    inflate: f64,
    grid: FxHashMap<Cell, Vec<ElementId>>,
    boxes: FxHashMap<ElementId, BoundingBox>,
    oversized: Vec<ElementId>,
}

impl ElementSpatialHash {
    /// Buckets every resolvable element of `ctx` under its endpoint box
    /// grown by `inflate`. Elements with a missing node are left out.
    pub fn build(ctx: &FeModelContext, cell_size: f64, inflate: f64) -> Self {
        let mut hash = Self {
            cell_size: cell_size.max(MIN_CELL_SIZE),
            inflate: inflate.max(0.0),
            grid: FxHashMap::default(),
            boxes: FxHashMap::default(),
            oversized: Vec::new(),
        };
        for (eid, _) in ctx.elements.iter() {
            if let Some((a, b)) = ctx.element_points(eid) {
                hash.insert(eid, &a, &b);
            }
        }
        hash
    }

    fn insert(&mut self, eid: ElementId, a: &Point3<f64>, b: &Point3<f64>) {
        let bbox = BoundingBox::from_segment(a, b, self.inflate);
        let range = CellRange::of(&bbox, self.cell_size);
        if range.count() > MAX_CELLS_PER_ELEMENT {
            self.oversized.push(eid);
        } else {
            for cell in range.cells() {
                self.grid.entry(cell).or_default().push(eid);
            }
        }
        self.boxes.insert(eid, bbox);
    }

    /// Drops an element from the index.
    pub fn remove(&mut self, eid: ElementId) {
        let Some(bbox) = self.boxes.remove(&eid) else {
            return;
        };
        let range = CellRange::of(&bbox, self.cell_size);
        if range.count() > MAX_CELLS_PER_ELEMENT {
            self.oversized.retain(|&e| e != eid);
            return;
        }
        for cell in range.cells() {
            if let Some(bucket) = self.grid.get_mut(&cell) {
                bucket.retain(|&e| e != eid);
                if bucket.is_empty() {
                    self.grid.remove(&cell);
                }
            }
        }
    }

    /// Re-indexes `eid` at its current geometry. Deleted or unresolvable
    /// elements are dropped.
    pub fn refresh(&mut self, ctx: &FeModelContext, eid: ElementId) {
        self.remove(eid);
        if let Some((a, b)) = ctx.element_points(eid) {
            self.insert(eid, &a, &b);
        }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Inflated box an element was indexed under.
    pub fn bbox(&self, eid: ElementId) -> Option<&BoundingBox> {
        self.boxes.get(&eid)
    }

    /// Other elements sharing a cell with `eid`, sorted.
    pub fn query_candidates(&self, eid: ElementId) -> Vec<ElementId> {
        let Some(bbox) = self.boxes.get(&eid) else {
            return Vec::new();
        };
        let mut out = self.query_bbox(bbox);
        out.retain(|&other| other != eid);
        out
    }

    /// Elements whose inflated box overlaps `bbox`, sorted.
    pub fn query_bbox(&self, bbox: &BoundingBox) -> Vec<ElementId> {
        let mut out = self.oversized.clone();
        gather(&self.grid, &CellRange::of(bbox, self.cell_size), &mut out);
        out.sort_unstable();
        out.dedup();
        out.retain(|eid| self.boxes.get(eid).is_some_and(|b| b.intersects(bbox)));
        out
    }

    /// Mean element length, but at least `floor`. A cell of about one member
    /// length keeps the number of cells per element small.
    pub fn suggest_cell_size(ctx: &FeModelContext, floor: f64) -> f64 {
        let (sum, count) = ctx
            .elements
            .iter()
            .filter_map(|(eid, _)| ctx.element_length(eid))
            .fold((0.0, 0usize), |(s, n), len| (s + len, n + 1));
        if count == 0 {
            return floor.max(MIN_CELL_SIZE);
        }
        (sum / count as f64).max(floor).max(MIN_CELL_SIZE)
    }
}
