// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

//! Snapshot reference types: the compact, durable encoding of a built SoA
//! table as an ordered list of cell references plus footnote references.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::item_type::SoaItemType;

/// Row index of the epoch header row in a snapshot.
pub const EPOCH_HEADER_ROW: i32 = -2;
/// Row index of the visit header row in a snapshot.
pub const VISIT_HEADER_ROW: i32 = -1;

/// A typed pointer to a study selection item stored in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReferencedItem {
    pub item_uid: String,
    pub item_type: SoaItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_in_protocol_soa: Option<bool>,
}

impl ReferencedItem {
    pub fn new(item_type: SoaItemType, item_uid: impl Into<String>) -> Self {
        Self {
            item_uid: item_uid.into(),
            item_type,
            item_name: None,
            visible_in_protocol_soa: None,
        }
    }
}

/// Reference to a footnote symbol assignment in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SoaFootnoteReference {
    pub order: usize,
    pub symbol: String,
    pub referenced_item: ReferencedItem,
}

/// One cell reference of a snapshot.
///
/// `row` is [`EPOCH_HEADER_ROW`]/[`VISIT_HEADER_ROW`] for header references,
/// else a 0-based data row index (relative to the first non-header row).
/// Column 0 is the row-label column; data columns start at 1. `order`
/// disambiguates multiple references within one cell. `is_propagated` marks a
/// checkmark that was copied up from a hidden descendant row rather than
/// directly authored; the decoder renders such checkmarks without refs or
/// style, matching the post-propagation appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SoaCellReference {
    pub row: i32,
    pub column: i32,
    #[serde(default = "default_ref_span")]
    pub span: usize,
    pub is_propagated: bool,
    #[serde(default)]
    pub order: usize,
    pub referenced_item: ReferencedItem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footnote_references: Option<Vec<SoaFootnoteReference>>,
}

fn default_ref_span() -> usize {
    1
}

/// Position of an item in the detailed SoA table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct CellCoordinates {
    pub row: usize,
    pub col: usize,
}

impl CellCoordinates {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}
