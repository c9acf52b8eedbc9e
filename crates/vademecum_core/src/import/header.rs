//! Header matcher.
//!
//! # Responsibility
//! - Select the registered layout that a header row matches.
//!
//! # Invariants
//! - Comparison is exact, case-sensitive and positional after trimming.
//! - The first registered layout that matches wins.
//! - With `strict_trailing`, any non-blank cell after the layout rejects it.

use super::{ImportError, ImportResult};
use crate::schema::{FamilySchema, Layout};

/// Finds the first layout of `schema` that `header` matches.
///
/// # Errors
/// - `HeaderMismatch` listing every accepted layout when none matches.
pub fn match_layout<'s>(header: &[String], schema: &'s FamilySchema) -> ImportResult<&'s Layout> {
    schema
        .layouts
        .iter()
        .find(|layout| layout_matches(header, layout, schema.strict_trailing))
        .ok_or_else(|| ImportError::HeaderMismatch {
            family: schema.family,
            accepted: schema.layouts.iter().map(describe_layout).collect(),
        })
}

/// Renders a layout as `name: h1, h2, ...`.
pub fn describe_layout(layout: &Layout) -> String {
    format!("{}: {}", layout.name, layout.headers.join(", "))
}

fn layout_matches(header: &[String], layout: &Layout, strict_trailing: bool) -> bool {
    if header.len() < layout.len() {
        return false;
    }

    let prefix_matches = layout
        .headers
        .iter()
        .zip(header)
        .all(|(expected, actual)| actual.trim() == *expected);
    if !prefix_matches {
        return false;
    }

    !strict_trailing
        || header[layout.len()..]
            .iter()
            .all(|cell| cell.trim().is_empty())
}
