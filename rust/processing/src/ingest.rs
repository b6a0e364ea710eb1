// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Member list ingestion.
//!
//! The input is a comma separated member table exported from the design
//! system. Only five columns are used:
//!
//! | column | content |
//! |---|---|
//! | 0 | member name |
//! | 3 | start position, three numbers in free text |
//! | 4 | end position |
//! | 5 | size text `TYPE_d1xd2x...`, e.g. `ANG_65x65x6` |
//! | 7 | orientation vector |
//!
//! Coordinates may therefore not contain commas; numbers are picked out of
//! whatever text surrounds them.

use std::path::Path;

use beamheal_topology::{CrossSection, Element, ElementMeta, FeModelContext, MaterialId, Point3};
use tracing::{info, warn};

use crate::error::{Error, Result};

const MIN_COLUMNS: usize = 8;

/// One structural member as read from the table.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRecord {
    pub name: String,
    /// Upper-case type tag from the size text (`ANG`, `BEAM`, ...).
    pub raw_type: String,
    pub dims: Vec<f64>,
    pub start: [f64; 3],
    pub end: [f64; 3],
    pub orientation: [f64; 3],
}

/// Reads every usable row of a member table.
pub fn read_members_csv(path: impl AsRef<Path>) -> Result<Vec<MemberRecord>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    let records = parse_members_csv(&text);
    info!(path = %path.display(), members = records.len(), "read member table");
    Ok(records)
}

/// Parses a member table. The first line is a header. Blank lines are
/// ignored; rows [`parse_row`] rejects are logged and skipped.
pub fn parse_members_csv(text: &str) -> Vec<MemberRecord> {
    text.lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(index, line)| match parse_row(index + 1, line) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "skipped member row");
                None
            }
        })
        .collect()
}

/// Parses one data row. `line` is the 1-based line number used in errors.
///
/// Fails with [`Error::Parse`] when the row has too few columns or when the
/// start, end or orientation column does not hold three numbers.
pub fn parse_row(line: usize, row: &str) -> Result<MemberRecord> {
    let cols: Vec<&str> = row.split(',').collect();
    if cols.len() < MIN_COLUMNS {
        return Err(Error::Parse {
            line,
            message: format!("expected {MIN_COLUMNS} columns, found {}", cols.len()),
        });
    }
    let (raw_type, dims) = split_size_text(cols[5].trim());
    let name = cols[0].trim().to_string();
    let triple = |column: usize, what: &str| {
        first_three(cols[column]).ok_or_else(|| Error::Parse {
            line,
            message: format!("member {name}: no {what} in {:?}", cols[column].trim()),
        })
    };
    let start = triple(3, "start position")?;
    let end = triple(4, "end position")?;
    let orientation = triple(7, "orientation")?;
    Ok(MemberRecord {
        name,
        raw_type,
        dims,
        start,
        end,
        orientation,
    })
}

fn first_three(text: &str) -> Option<[f64; 3]> {
    match extract_numbers(text).as_slice() {
        [x, y, z, ..] => Some([*x, *y, *z]),
        _ => None,
    }
}

/// Type tag and dimensions of a size text like `BEAM_176x8x200x12`.
/// Text without a `TYPE_` prefix yields `UNKNOWN`.
fn split_size_text(text: &str) -> (String, Vec<f64>) {
    let upper = text.to_ascii_uppercase();
    let tag_len = upper.bytes().take_while(u8::is_ascii_uppercase).count();
    if tag_len == 0 || upper.as_bytes().get(tag_len) != Some(&b'_') {
        return ("UNKNOWN".to_string(), Vec::new());
    }
    (upper[..tag_len].to_string(), extract_numbers(&upper))
}

/// Every `[-+]?digits(.digits)?` run in `text`, in order.
pub(crate) fn extract_numbers(text: &str) -> Vec<f64> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let start = i;
        if matches!(bytes[i], b'-' | b'+') {
            i += 1;
        }
        let digits = scan_digits(bytes, i);
        if digits == i {
            i = start + 1;
            continue;
        }
        let mut end = digits;
        if bytes.get(end) == Some(&b'.') {
            let frac = scan_digits(bytes, end + 1);
            if frac > end + 1 {
                end = frac;
            }
        }
        if let Ok(v) = text[start..end].parse::<f64>() {
            out.push(v);
        }
        i = end;
    }
    out
}

fn scan_digits(bytes: &[u8], from: usize) -> usize {
    from + bytes[from.min(bytes.len())..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count()
}

/// Section shape and property dimensions for a raw type tag, or `None` if
/// the tag is unknown or too few dimensions were given.
fn section_for(raw_type: &str, d: &[f64]) -> Option<(CrossSection, Vec<f64>)> {
    match (raw_type, d) {
        ("ANG", [w, h, t, ..]) => Some((CrossSection::Angle, vec![*w, *h, *t, *t])),
        ("BEAM", [w, tw, h, tf, ..]) => {
            Some((CrossSection::HBeam, vec![w - 2.0 * tf, 2.0 * tf, *h, *tw]))
        }
        ("BSC", [h, w, t1, t2, ..]) => Some((CrossSection::Channel, vec![*w, *h, *t1, *t2])),
        ("BULB", [w, t, ..]) => Some((CrossSection::Bar, vec![*w, *t])),
        ("RBAR", [d, ..]) => Some((CrossSection::Rod, vec![round_to_tenth(d / 2.0)])),
        ("TUBE", [d1, d2, ..]) => Some((CrossSection::Tube, vec![*d1, *d2])),
        _ => None,
    }
}

fn round_to_tenth(v: f64) -> f64 {
    (v * 10.0).round_ties_even() / 10.0
}

/// Builds the initial model: one `Steel` material, a deduplicated property
/// per section, nodes shared by exact coordinate and one element per member.
pub fn build_context(records: &[MemberRecord]) -> FeModelContext {
    let mut ctx = FeModelContext::new();
    let steel = ctx.materials.add_or_get("Steel", 206_000.0, 0.3, 7.85e-9);
    let mut skipped = 0;

    for record in records {
        if add_member(&mut ctx, steel, record).is_none() {
            skipped += 1;
        }
    }

    let summary = ctx.summary();
    info!(
        members = records.len(),
        skipped,
        nodes = summary.nodes,
        elements = summary.elements,
        properties = summary.properties,
        "built model"
    );
    ctx
}

fn add_member(ctx: &mut FeModelContext, material: MaterialId, record: &MemberRecord) -> Option<()> {
    let Some((shape, dims)) = section_for(&record.raw_type, &record.dims) else {
        warn!(
            member = %record.name,
            raw_type = %record.raw_type,
            dims = ?record.dims,
            "unsupported section, member skipped"
        );
        return None;
    };
    let start = Point3::from(record.start);
    let end = Point3::from(record.end);
    if start == end {
        warn!(member = %record.name, "zero-length member skipped");
        return None;
    }

    let property = ctx.properties.add_or_get(shape, &dims, material);
    let a = ctx.nodes.add_or_get(start);
    let b = ctx.nodes.add_or_get(end);
    let mut meta =
        ElementMeta::named(record.name.clone()).with_types(record.raw_type.clone(), shape.code());
    if record.orientation.iter().any(|c| *c != 0.0) {
        meta = meta.with_orientation(record.orientation);
    }
    ctx.elements.add_new(Element::new(a, b, property, meta));
    Some(())
}
