// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::repository::{SnapshotKey, SoaSnapshotRepository, StoreError};
use super::snapshot::SoaSnapshot;
use crate::model::snapshot::{SoaCellReference, SoaFootnoteReference};
use crate::model::StudyStatus;

/// Folder-backed snapshot repository: one JSON document per
/// `(study, version, layout)` key, written atomically (temp file + rename).
#[derive(Debug, Clone)]
pub struct SnapshotFolder {
    root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDocument {
    cell_references: Vec<SoaCellReference>,
    footnote_references: Vec<SoaFootnoteReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    study_status: Option<StudyStatus>,
}

impl SnapshotFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_path(&self, key: &SnapshotKey) -> PathBuf {
        let study = encode_segment(&key.study_uid);
        let version = encode_segment(key.study_value_version.as_deref().unwrap_or("latest"));
        self.root
            .join(format!("{study}__{version}__{}.soa.json", key.layout))
    }
}

/// Filename-safe encoding of a key segment: anything outside
/// `[A-Za-z0-9._-]` becomes `~xx` hex.
fn encode_segment(value: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    let mut out = String::with_capacity(value.len());
    for &byte in value.as_bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'_' | b'-' => out.push(byte as char),
            _ => {
                out.push('~');
                out.push(HEX[(byte >> 4) as usize] as char);
                out.push(HEX[(byte & 0x0f) as usize] as char);
            }
        }
    }
    out
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");
    let tmp_path = PathBuf::from(tmp_path);

    fs::write(&tmp_path, bytes).map_err(|source| StoreError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    fs::rename(&tmp_path, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[async_trait]
impl SoaSnapshotRepository for SnapshotFolder {
    async fn save(
        &self,
        key: &SnapshotKey,
        snapshot: &SoaSnapshot,
        study_status: Option<StudyStatus>,
    ) -> Result<(), StoreError> {
        let path = self.snapshot_path(key);

        let document = SnapshotDocument {
            cell_references: snapshot.cell_references.clone(),
            footnote_references: snapshot.footnote_references.clone(),
            study_status,
        };
        let mut json = serde_json::to_string_pretty(&document).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        json.push('\n');

        write_atomic(&path, json.as_bytes())
    }

    async fn load(&self, key: &SnapshotKey) -> Result<Option<SoaSnapshot>, StoreError> {
        let path = self.snapshot_path(key);

        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let document: SnapshotDocument =
            serde_json::from_str(&json).map_err(|source| StoreError::Json { path, source })?;

        Ok(Some(SoaSnapshot {
            cell_references: document.cell_references,
            footnote_references: document.footnote_references,
        }))
    }
}
