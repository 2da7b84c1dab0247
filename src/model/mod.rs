// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

//! Core data model: table primitives, study selection DTOs and snapshot
//! reference types.
//!
//! Everything here is pure data — identity, equality and copying only. The
//! behavior lives in `layout`, `render`, `query` and `store`.

#[cfg(test)]
pub(crate) mod fixtures;
pub mod item_type;
pub mod selections;
pub mod snapshot;
pub mod table;

pub use item_type::{RefKind, SoaItemType, SoaLayout, TimeUnit};
pub use selections::{
    ActivityInstanceRef, ActivityRef, ActivitySelection, InstanceSelection, Study, StudyActivityGroupSelection,
    StudyActivitySchedule, StudyActivitySubGroupSelection, StudyEpoch, StudySoaFootnote, StudySoaGroupSelection,
    StudySoaPreferences, StudyStatus, StudyVisit, VisitClass,
};
pub use snapshot::{CellCoordinates, ReferencedItem, SoaCellReference, SoaFootnoteReference};
pub use table::{CellStyle, FootnoteMap, Ref, SimpleFootnote, TableCell, TableRow, TableWithFootnotes};
