// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Nastran bulk data deck in small-field (8 character) format.

use std::fmt::Write;
use std::path::PathBuf;

use beamheal_topology::{FeModelContext, NodeId};

use super::{stage_path, write_file, SnapshotSink, StageSnapshot};
use crate::error::Result;

const FIELD: usize = 8;
/// Data fields per physical line before a continuation.
const FIELDS_PER_LINE: usize = 9;
const SPC_SET: u32 = 1;
const SPC_COMPONENTS: &str = "123456";
const DEFAULT_ORIENTATION: [f64; 3] = [0.0, 0.0, 1.0];
const GRAVITY_CARD: &str = "GRAV           2          9800.0     0.0     0.0    -1.0 ";

/// Writes `<dir>/<label>.bdf` for every stage.
#[derive(Debug, Clone)]
pub struct BdfSink {
    dir: PathBuf,
}

impl BdfSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SnapshotSink for BdfSink {
    fn write_stage(&mut self, snapshot: &StageSnapshot<'_>) -> Result<()> {
        let path = stage_path(&self.dir, snapshot.label, "bdf")?;
        let deck = render_deck(snapshot.context, snapshot.free_end_nodes);
        write_file(&path, snapshot.label, &deck)
    }
}

/// Renders a SOL 101 deck: grids, beams, sections, materials, rigid links,
/// one SPC per free end and a gravity load.
pub fn render_deck(ctx: &FeModelContext, free_end_nodes: &[NodeId]) -> String {
    let mut lines: Vec<String> = [
        "SOL 101",
        "CEND",
        "DISPLACEMENT = ALL",
        "FORCE = ALL",
        "SPCFORCES = ALL",
        "STRESS = ALL",
        "SUBCASE       1",
        "LABEL = LC1",
        "SPC = 1",
        "LOAD = 2",
        "ANALYSIS = STATICS",
        "BEGIN BULK",
        "PARAM,POST,-1",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    for (id, p) in ctx.nodes.iter() {
        lines.push(
            Card::new("GRID")
                .int(id.get())
                .blank()
                .real(p.x)
                .real(p.y)
                .real(p.z)
                .finish(),
        );
    }

    for (id, e) in ctx.elements.iter() {
        let [x1, x2, x3] = e.meta.orientation.unwrap_or(DEFAULT_ORIENTATION);
        lines.push(
            Card::new("CBEAM")
                .int(id.get())
                .int(e.property.get())
                .int(e.start().get())
                .int(e.end().get())
                .real(x1)
                .real(x2)
                .real(x3)
                .text("BGG")
                .finish(),
        );
    }

    for (id, prop) in ctx.properties.iter() {
        lines.push(
            Card::new("PBEAML")
                .int(id.get())
                .int(prop.material.get())
                .blank()
                .text(prop.shape.code())
                .finish(),
        );
        let mut dims = Card::new("");
        for &d in &prop.dims {
            dims = dims.real(d);
        }
        // non-structural mass
        lines.push(dims.real(0.0).finish());
    }

    for (id, mat) in ctx.materials.iter() {
        lines.push(
            Card::new("MAT1")
                .int(id.get())
                .real(mat.e)
                .blank()
                .real(mat.nu)
                .real(mat.rho)
                .finish(),
        );
    }

    for (id, rigid) in ctx.rigids.iter() {
        if rigid.slaves.is_empty() {
            continue;
        }
        let mut card = Card::new("RBE2")
            .int(id.get())
            .int(rigid.master.get())
            .text(&rigid.dof);
        let mut used = 4;
        for slave in &rigid.slaves {
            if used >= FIELDS_PER_LINE {
                lines.push(card.text_left("+").finish());
                card = Card::new("+");
                used = 1;
            }
            card = card.int(slave.get());
            used += 1;
        }
        lines.push(card.finish());
    }

    for node in free_end_nodes {
        lines.push(
            Card::new("SPC")
                .int(SPC_SET)
                .int(node.get())
                .text(SPC_COMPONENTS)
                .real(0.0)
                .finish(),
        );
    }

    lines.push(GRAVITY_CARD.to_string());
    lines.push("ENDDATA".to_string());

    let mut deck = lines.join("\n");
    deck.push('\n');
    deck
}

/// One physical card line built field by field.
struct Card(String);

impl Card {
    fn new(name: &str) -> Self {
        Card(format!("{name:<FIELD$}"))
    }

    fn int(mut self, v: u32) -> Self {
        let _ = write!(self.0, "{v:>FIELD$}");
        self
    }

    fn real(mut self, v: f64) -> Self {
        let _ = write!(self.0, "{:>FIELD$}", format_real(v));
        self
    }

    fn text(mut self, s: &str) -> Self {
        let _ = write!(self.0, "{s:>FIELD$}");
        self
    }

    fn text_left(mut self, s: &str) -> Self {
        let _ = write!(self.0, "{s:<FIELD$}");
        self
    }

    fn blank(mut self) -> Self {
        self.0.push_str(&" ".repeat(FIELD));
        self
    }

    fn finish(self) -> String {
        self.0.trim_end().to_string()
    }
}

/// Formats a real so it fits one small field and always carries a decimal
/// point. Very small or large magnitudes use the Nastran exponent form
/// without `E` (`7.85-9`).
pub(crate) fn format_real(v: f64) -> String {
    if v == 0.0 {
        return "0.0".to_string();
    }
    let magnitude = v.abs();
    if (1e-3..1e7).contains(&magnitude) {
        for decimals in (1..=7).rev() {
            let s = trim_zeros(format!("{v:.decimals$}"));
            if s.len() <= FIELD {
                return s;
            }
        }
        let s = format!("{v:.0}.");
        if s.len() <= FIELD {
            return s;
        }
    }
    exponent_form(v)
}

fn exponent_form(v: f64) -> String {
    let mut last = String::new();
    for decimals in (0..=5).rev() {
        let s = format!("{v:.decimals$e}");
        let Some((mantissa, exp)) = s.split_once('e') else {
            continue;
        };
        let mut mantissa = trim_zeros(mantissa.to_string());
        if !mantissa.contains('.') {
            mantissa.push('.');
        }
        let exp: i32 = exp.parse().unwrap_or(0);
        let s = if exp < 0 {
            format!("{mantissa}{exp}")
        } else {
            format!("{mantissa}+{exp}")
        };
        if s.len() <= FIELD {
            return s;
        }
        last = s;
    }
    last
}

fn trim_zeros(s: String) -> String {
    if !s.contains('.') {
        return s;
    }
    let trimmed = s.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamheal_topology::{CrossSection, Element, ElementMeta, Point3};

    #[test]
    fn reals_fit_small_fields() {
        assert_eq!(format_real(0.0), "0.0");
        assert_eq!(format_real(9800.0), "9800.0");
        assert_eq!(format_real(0.3), "0.3");
        assert_eq!(format_real(206000.0), "206000.0");
        assert_eq!(format_real(-1.0), "-1.0");
        assert_eq!(format_real(123.456789), "123.4568");
        assert_eq!(format_real(7.85e-9), "7.85-9");
        assert_eq!(format_real(2.5e9), "2.5+9");
        for v in [1234567.0, 0.000123456, -98765.4321, 1e12] {
            assert!(format_real(v).len() <= FIELD, "{v}");
        }
    }

    fn model() -> FeModelContext {
        let mut ctx = FeModelContext::new();
        let m = ctx.materials.add_or_get("Steel", 206_000.0, 0.3, 7.85e-9);
        let p = ctx.properties.add_or_get(CrossSection::Angle, &[100.0, 100.0, 10.0, 10.0], m);
        let a = ctx.nodes.add_or_get(Point3::new(0.0, 0.0, 0.0));
        let b = ctx.nodes.add_or_get(Point3::new(1500.0, 0.0, 0.0));
        ctx.elements.add_new(Element::new(a, b, p, ElementMeta::default()));
        ctx
    }

    #[test]
    fn deck_contains_every_section() {
        let ctx = model();
        let deck = render_deck(&ctx, &[NodeId::new(1)]);
        let lines: Vec<&str> = deck.lines().collect();

        assert_eq!(lines[0], "SOL 101");
        assert_eq!(lines[1], "CEND");
        assert!(lines.contains(&"BEGIN BULK"));
        assert!(lines.contains(&"PARAM,POST,-1"));
        assert!(lines.contains(&"GRID           2          1500.0     0.0     0.0"));
        assert!(lines.contains(&"CBEAM          1       1       1       2     0.0     0.0     1.0     BGG"));
        assert!(lines.contains(&"PBEAML         1       1               L"));
        assert!(lines.contains(&"           100.0   100.0    10.0    10.0     0.0"));
        assert!(lines.contains(&"MAT1           1206000.0             0.3  7.85-9"));
        assert!(lines.contains(&"SPC            1       1  123456     0.0"));
        assert!(lines.contains(&GRAVITY_CARD));
        assert_eq!(lines.last(), Some(&"ENDDATA"));
    }

    #[test]
    fn orientation_comes_from_metadata() {
        let mut ctx = model();
        if let Some(e) = ctx.elements.get_mut(beamheal_topology::ElementId::new(1)) {
            e.meta = ElementMeta::default().with_orientation([0.0, 1.0, 0.0]);
        }
        let deck = render_deck(&ctx, &[]);
        assert!(deck.contains("CBEAM          1       1       1       2     0.0     1.0     0.0     BGG"));
        assert!(!deck.contains("\nSPC            1"));
    }

    #[test]
    fn rbe2_continues_after_five_slaves() {
        let mut ctx = model();
        let slaves: Vec<NodeId> = (0..6)
            .map(|i| ctx.nodes.add_or_get(Point3::new(0.0, f64::from(i) + 1.0, 0.0)))
            .collect();
        let rid = ctx.rigids.add_new(NodeId::new(1), slaves);

        let deck = render_deck(&ctx, &[]);
        let first = format!("RBE2     {}       1  123456       3       4       5       6       7+", rid.get());
        assert!(deck.contains(&first));
        assert!(deck.contains("\n+              8\n"));
    }
}
