// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::item_type::RefKind;

/// A typed pointer from a table cell to a domain entity. Not an ownership
/// relation; the entity lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Ref {
    pub kind: RefKind,
    pub uid: String,
}

impl Ref {
    pub fn new(kind: RefKind, uid: impl Into<String>) -> Self {
        Self {
            kind,
            uid: uid.into(),
        }
    }
}

/// Style tag attached to a cell; consumed by document renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum CellStyle {
    Header1,
    Header2,
    Header3,
    Header4,
    SoaGroup,
    Group,
    SubGroup,
    Activity,
    ActivityInstance,
    ActivitySchedule,
}

/// One cell of the SoA table.
///
/// A cell with `span == 0` is a continuation of a preceding spanning cell in
/// the same row and carries no content of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableCell {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_span")]
    pub span: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<CellStyle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refs: Vec<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footnotes: Option<Vec<String>>,
}

fn default_span() -> usize {
    1
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            text: String::new(),
            span: 1,
            style: None,
            refs: Vec::new(),
            footnotes: None,
        }
    }
}

impl TableCell {
    pub fn text(text: impl Into<String>, style: CellStyle) -> Self {
        Self {
            text: text.into(),
            style: Some(style),
            ..Self::default()
        }
    }

    pub fn with_refs(text: impl Into<String>, style: CellStyle, refs: Vec<Ref>) -> Self {
        Self {
            text: text.into(),
            style: Some(style),
            refs,
            ..Self::default()
        }
    }

    /// An empty continuation cell merged into the preceding spanning cell.
    pub fn continuation() -> Self {
        Self {
            span: 0,
            ..Self::default()
        }
    }
}

/// One row of the SoA table.
///
/// `order` is the underlying entity's explicit ordering field, kept for row
/// identification only; rows are never re-sorted at render time. `level`
/// encodes hierarchy depth: 1 SoA group, 2 activity group, 3 activity
/// subgroup, 4 activity/instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    #[serde(default)]
    pub hide: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

impl TableRow {
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self {
            cells,
            ..Self::default()
        }
    }

    pub fn hidden(mut self, hide: bool) -> Self {
        self.hide = hide;
        self
    }
}

/// Footnote text in both renderable forms, addressed by uid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SimpleFootnote {
    pub uid: String,
    pub text_html: String,
    pub text_plain: String,
}

/// Insertion-ordered mapping of footnote symbol (`a`, `b`, …, `z`, `aa`, …)
/// to footnote. Symbol order is assignment order, which is part of the
/// snapshot codec contract, so a sorted map would not do.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct FootnoteMap {
    entries: Vec<(String, SimpleFootnote)>,
}

impl FootnoteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a symbol → footnote entry, replacing an existing symbol in
    /// place (order preserved).
    pub fn insert(&mut self, symbol: impl Into<String>, footnote: SimpleFootnote) {
        let symbol = symbol.into();
        if let Some(entry) = self.entries.iter_mut().find(|(s, _)| *s == symbol) {
            entry.1 = footnote;
        } else {
            self.entries.push((symbol, footnote));
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&SimpleFootnote> {
        self.entries.iter().find(|(s, _)| s == symbol).map(|(_, f)| f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SimpleFootnote)> {
        self.entries.iter().map(|(s, f)| (s.as_str(), f))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The renderer-agnostic SoA table: an addressable 2-D grid with per-cell
/// reference tags and footnote markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableWithFootnotes {
    pub rows: Vec<TableRow>,
    pub num_header_rows: usize,
    pub num_header_cols: usize,
    pub title: String,
    #[serde(default)]
    pub footnotes: FootnoteMap,
}

impl TableWithFootnotes {
    pub fn header_rows(&self) -> &[TableRow] {
        &self.rows[..self.num_header_rows.min(self.rows.len())]
    }

    pub fn data_rows(&self) -> &[TableRow] {
        &self.rows[self.num_header_rows.min(self.rows.len())..]
    }
}
