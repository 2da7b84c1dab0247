// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::snapshot::SoaSnapshot;
use crate::model::{SoaLayout, StudyStatus};

#[derive(Debug)]
pub enum StoreError {
    Io { path: PathBuf, source: io::Error },
    Json { path: PathBuf, source: serde_json::Error },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

/// Key a snapshot is stored and retrieved under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotKey {
    pub study_uid: String,
    pub study_value_version: Option<String>,
    pub layout: SoaLayout,
}

impl SnapshotKey {
    pub fn new(study_uid: impl Into<String>, study_value_version: Option<&str>, layout: SoaLayout) -> Self {
        Self {
            study_uid: study_uid.into(),
            study_value_version: study_value_version.map(str::to_owned),
            layout,
        }
    }
}

/// Persistence collaborator for snapshots: whatever `save` stores under a
/// key, a later `load` with the same key returns unchanged.
#[async_trait]
pub trait SoaSnapshotRepository: Send + Sync {
    async fn save(
        &self,
        key: &SnapshotKey,
        snapshot: &SoaSnapshot,
        study_status: Option<StudyStatus>,
    ) -> Result<(), StoreError>;

    async fn load(&self, key: &SnapshotKey) -> Result<Option<SoaSnapshot>, StoreError>;
}

#[derive(Debug, Clone)]
struct StoredSnapshot {
    snapshot: SoaSnapshot,
    study_status: Option<StudyStatus>,
}

/// Keeps snapshots in process memory. Suited to tests and embedding.
#[derive(Debug, Default)]
pub struct InMemorySnapshotRepository {
    snapshots: RwLock<BTreeMap<SnapshotKey, StoredSnapshot>>,
}

impl InMemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status recorded with the stored snapshot, if any.
    pub async fn stored_status(&self, key: &SnapshotKey) -> Option<StudyStatus> {
        self.snapshots
            .read()
            .await
            .get(key)
            .and_then(|stored| stored.study_status)
    }
}

#[async_trait]
impl SoaSnapshotRepository for InMemorySnapshotRepository {
    async fn save(
        &self,
        key: &SnapshotKey,
        snapshot: &SoaSnapshot,
        study_status: Option<StudyStatus>,
    ) -> Result<(), StoreError> {
        self.snapshots.write().await.insert(
            key.clone(),
            StoredSnapshot {
                snapshot: snapshot.clone(),
                study_status,
            },
        );
        Ok(())
    }

    async fn load(&self, key: &SnapshotKey) -> Result<Option<SoaSnapshot>, StoreError> {
        Ok(self
            .snapshots
            .read()
            .await
            .get(key)
            .map(|stored| stored.snapshot.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemorySnapshotRepository, SnapshotKey, SoaSnapshotRepository};
    use crate::model::snapshot::{ReferencedItem, SoaCellReference};
    use crate::model::{SoaItemType, SoaLayout, StudyStatus};
    use crate::store::snapshot::SoaSnapshot;

    fn snapshot() -> SoaSnapshot {
        SoaSnapshot {
            cell_references: vec![SoaCellReference {
                row: 0,
                column: 0,
                span: 1,
                is_propagated: false,
                order: 0,
                referenced_item: ReferencedItem::new(SoaItemType::StudyActivity, "SA_1"),
                footnote_references: None,
            }],
            footnote_references: Vec::new(),
        }
    }

    #[tokio::test]
    async fn stores_and_loads_by_key() {
        let repository = InMemorySnapshotRepository::new();
        let key = SnapshotKey::new("Study_000001", Some("2.0"), SoaLayout::Protocol);

        repository
            .save(&key, &snapshot(), Some(StudyStatus::Released))
            .await
            .expect("save");

        let loaded = repository.load(&key).await.expect("load");
        assert_eq!(loaded, Some(snapshot()));
        assert_eq!(repository.stored_status(&key).await, Some(StudyStatus::Released));

        let other_version = SnapshotKey::new("Study_000001", Some("3.0"), SoaLayout::Protocol);
        assert_eq!(repository.load(&other_version).await.expect("load"), None);
    }
}
