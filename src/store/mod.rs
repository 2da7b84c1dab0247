// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

//! Snapshot codec and persistence: encodes a built table into reference
//! lists, reconstructs an equivalent table from them, and stores them keyed
//! by `(study_uid, study_value_version, layout)`.

pub mod repository;
pub mod snapshot;
pub mod snapshot_folder;

pub use repository::{InMemorySnapshotRepository, SnapshotKey, SoaSnapshotRepository, StoreError};
pub use snapshot::{
    decode_snapshot, extract_soa_cell_refs, extract_soa_footnote_refs, SnapshotDecodeError, SnapshotLookups,
    SoaSnapshot,
};
pub use snapshot_folder::SnapshotFolder;
