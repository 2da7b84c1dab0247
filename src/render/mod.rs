// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

//! Flowchart builder: turns a selection snapshot into a
//! [`crate::model::TableWithFootnotes`], plus the footnote attachment and
//! row-visibility passes that post-process it.

pub mod flowchart;
pub mod footnotes;
pub mod visibility;

pub use flowchart::{build_flowchart_table, FlowchartInputs, NUM_OPERATIONAL_CODE_COLS, SOA_CHECK_MARK};
pub use footnotes::{attach_footnotes, footnote_symbol};
pub use visibility::{propagate_hidden_rows, remove_hidden_rows, show_hidden_rows};
