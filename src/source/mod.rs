// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

//! Selection snapshot readers: the read-only collaborators the engine fetches
//! study state from.
//!
//! Every method takes `(study_uid, study_value_version)` and must honor
//! point-in-time consistency: when a version is given, the returned
//! collections reflect that version, never an ambient "latest".

use std::fmt;

use async_trait::async_trait;

use crate::model::{
    ActivitySelection, Study, StudyActivityGroupSelection, StudyActivitySchedule, StudyActivitySubGroupSelection,
    StudySoaFootnote, StudySoaGroupSelection, StudySoaPreferences, StudyVisit,
};

#[derive(Debug)]
pub enum SourceError {
    NotFound {
        entity: &'static str,
        uid: String,
        study_value_version: Option<String>,
    },
    Backend {
        operation: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SourceError {
    pub fn backend(operation: &'static str, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend {
            operation,
            source: Box::new(source),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound {
                entity,
                uid,
                study_value_version,
            } => match study_value_version {
                Some(version) => write!(f, "{entity} {uid:?} with version {version:?} not found"),
                None => write!(f, "{entity} {uid:?} not found"),
            },
            Self::Backend { operation, source } => write!(f, "read {operation} failed: {source}"),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::Backend { source, .. } => Some(source.as_ref()),
        }
    }
}

/// Study-level metadata reads.
#[async_trait]
pub trait StudyMetadataSource: Send + Sync {
    async fn get_study(&self, study_uid: &str, study_value_version: Option<&str>) -> Result<Study, SourceError>;

    /// The study's stored preferred time unit name for the protocol SoA
    /// (expected `"day"` or `"week"`; anything else fails validation).
    async fn preferred_time_unit(
        &self,
        study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<String, SourceError>;

    async fn soa_preferences(
        &self,
        study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<StudySoaPreferences, SourceError>;
}

/// Study design selection reads.
#[async_trait]
pub trait StudySelectionSource: Send + Sync {
    /// All activity schedules; with `operational` the schedules carry
    /// activity-instance links.
    async fn all_schedules(
        &self,
        study_uid: &str,
        study_value_version: Option<&str>,
        operational: bool,
    ) -> Result<Vec<StudyActivitySchedule>, SourceError>;

    async fn all_visits(
        &self,
        study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<Vec<StudyVisit>, SourceError>;

    async fn all_footnotes(
        &self,
        study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<Vec<StudySoaFootnote>, SourceError>;

    async fn all_soa_groups(
        &self,
        study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<Vec<StudySoaGroupSelection>, SourceError>;

    async fn all_activity_groups(
        &self,
        study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<Vec<StudyActivityGroupSelection>, SourceError>;

    async fn all_activity_subgroups(
        &self,
        study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<Vec<StudyActivitySubGroupSelection>, SourceError>;

    /// Activity selections without instance parts (detailed/protocol reads).
    async fn study_activities(
        &self,
        study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<Vec<ActivitySelection>, SourceError>;

    /// Activity selections with instance parts (operational reads); one
    /// record per instance, placeholders included.
    async fn study_activity_instances(
        &self,
        study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<Vec<ActivitySelection>, SourceError>;
}
