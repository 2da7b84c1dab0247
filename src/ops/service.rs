// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::fetch::{execute_fetch_plan, FetchPlan};
use super::SoaError;
use crate::config::SoaConfig;
use crate::layout::{sort_activity_selections, GroupedVisits};
use crate::model::{CellCoordinates, SoaLayout, StudyStatus, TableWithFootnotes, TimeUnit};
use crate::query;
use crate::render::{self, FlowchartInputs};
use crate::source::{SourceError, StudyMetadataSource, StudySelectionSource};
use crate::store::{
    decode_snapshot, extract_soa_cell_refs, extract_soa_footnote_refs, SnapshotDecodeError, SnapshotKey,
    SnapshotLookups, SoaSnapshot, SoaSnapshotRepository,
};

/// Builds, serves and persists Schedule-of-Activities tables for a study.
///
/// All reads for one operation carry the same `study_value_version`; a fetch
/// failure fails the whole operation.
pub struct SoaFlowchartService {
    study: Arc<dyn StudyMetadataSource>,
    selections: Arc<dyn StudySelectionSource>,
    repository: Arc<dyn SoaSnapshotRepository>,
    config: SoaConfig,
}

impl SoaFlowchartService {
    pub fn new(
        study: Arc<dyn StudyMetadataSource>,
        selections: Arc<dyn StudySelectionSource>,
        repository: Arc<dyn SoaSnapshotRepository>,
        config: SoaConfig,
    ) -> Self {
        Self {
            study,
            selections,
            repository,
            config,
        }
    }

    /// Builds the SoA flowchart table from fresh selections.
    ///
    /// The result still carries hidden rows; [`Self::get_flowchart_table`]
    /// applies the protocol propagation/removal post-processing.
    #[instrument(skip(self), level = "debug")]
    pub async fn build_flowchart_table(
        &self,
        study_uid: &str,
        study_value_version: Option<&str>,
        layout: SoaLayout,
        time_unit: Option<TimeUnit>,
    ) -> Result<TableWithFootnotes, SoaError> {
        let time_unit = self.resolve_time_unit(study_uid, study_value_version, time_unit).await?;
        self.validate_parameters(study_uid, study_value_version).await?;

        let data = execute_fetch_plan(
            self.study.as_ref(),
            self.selections.as_ref(),
            self.repository.as_ref(),
            &self.config,
            study_uid,
            study_value_version,
            FetchPlan::for_build(layout),
        )
        .await?;

        let grouped_visits = GroupedVisits::group_visits(data.visits, layout != SoaLayout::Operational);

        debug!(
            activities = data.activities.len(),
            columns = grouped_visits.num_groups(),
            "building SoA flowchart table"
        );

        Ok(render::build_flowchart_table(FlowchartInputs {
            activities: &data.activities,
            schedules: &data.schedules,
            grouped_visits: &grouped_visits,
            footnotes: data.footnotes.as_deref(),
            preferences: &data.preferences,
            layout,
            time_unit,
        }))
    }

    /// Returns the SoA table for presentation: a locked protocol version is
    /// served from its snapshot (unless `force_build`); anything else is
    /// built fresh, with protocol propagation and hidden-row removal applied.
    #[instrument(skip(self), level = "debug")]
    pub async fn get_flowchart_table(
        &self,
        study_uid: &str,
        study_value_version: Option<&str>,
        layout: SoaLayout,
        time_unit: Option<TimeUnit>,
        force_build: bool,
    ) -> Result<TableWithFootnotes, SoaError> {
        if study_value_version.is_some() && layout == SoaLayout::Protocol && !force_build {
            return self
                .load_soa_snapshot(study_uid, study_value_version, layout, time_unit)
                .await;
        }

        let mut table = self
            .build_flowchart_table(study_uid, study_value_version, layout, time_unit)
            .await?;

        if layout == SoaLayout::Protocol {
            render::propagate_hidden_rows(&mut table.rows, false);
            render::remove_hidden_rows(&mut table);
        }

        Ok(table)
    }

    /// Maps every item uid to its `(row, column)` position in the detailed
    /// SoA (independent of row hiding).
    #[instrument(skip(self), level = "debug")]
    pub async fn flowchart_item_uid_coordinates(
        &self,
        study_uid: &str,
        study_value_version: Option<&str>,
        hide_soa_groups: bool,
    ) -> Result<BTreeMap<String, CellCoordinates>, SoaError> {
        self.validate_parameters(study_uid, study_value_version).await?;

        let schedules = self
            .selections
            .all_schedules(study_uid, study_value_version, false)
            .await?;

        let mut activities = self.selections.study_activities(study_uid, study_value_version).await?;
        if hide_soa_groups {
            sort_activity_selections(&mut activities, true);
        }

        let visits = self.selections.all_visits(study_uid, study_value_version).await?;
        let grouped_visits = GroupedVisits::group_visits(visits, true);

        Ok(query::item_uid_coordinates(&activities, &schedules, &grouped_visits))
    }

    /// Builds a fresh table and extracts its snapshot reference lists. For
    /// the protocol layout, hidden-row content is propagated (with refs) and
    /// hidden rows removed before extraction.
    #[instrument(skip(self), level = "debug")]
    pub async fn build_soa_snapshot(
        &self,
        study_uid: &str,
        study_value_version: Option<&str>,
        layout: SoaLayout,
    ) -> Result<SoaSnapshot, SoaError> {
        let mut table = self
            .build_flowchart_table(study_uid, study_value_version, layout, None)
            .await?;

        if layout == SoaLayout::Protocol {
            render::propagate_hidden_rows(&mut table.rows, true);
            render::remove_hidden_rows(&mut table);
        }

        Ok(SoaSnapshot {
            cell_references: extract_soa_cell_refs(&table, layout),
            footnote_references: extract_soa_footnote_refs(&table),
        })
    }

    /// Builds and persists the snapshot, returning the reference lists.
    #[instrument(skip(self), level = "debug")]
    pub async fn update_soa_snapshot(
        &self,
        study_uid: &str,
        study_value_version: Option<&str>,
        layout: SoaLayout,
        study_status: Option<StudyStatus>,
    ) -> Result<SoaSnapshot, SoaError> {
        let snapshot = self.build_soa_snapshot(study_uid, study_value_version, layout).await?;

        let key = SnapshotKey::new(study_uid, study_value_version, layout);
        self.repository.save(&key, &snapshot, study_status).await?;

        info!(
            study_uid,
            study_value_version = ?study_value_version,
            layout = %layout,
            cells = snapshot.cell_references.len(),
            footnotes = snapshot.footnote_references.len(),
            "persisted SoA snapshot"
        );

        Ok(snapshot)
    }

    /// Reconstructs the SoA table of a persisted snapshot against fresh
    /// point-in-time entity lookups, without rebuilding from selections.
    #[instrument(skip(self), level = "debug")]
    pub async fn load_soa_snapshot(
        &self,
        study_uid: &str,
        study_value_version: Option<&str>,
        layout: SoaLayout,
        time_unit: Option<TimeUnit>,
    ) -> Result<TableWithFootnotes, SoaError> {
        let time_unit = self.resolve_time_unit(study_uid, study_value_version, time_unit).await?;
        self.validate_parameters(study_uid, study_value_version).await?;

        let key = SnapshotKey::new(study_uid, study_value_version, layout);
        let data = execute_fetch_plan(
            self.study.as_ref(),
            self.selections.as_ref(),
            self.repository.as_ref(),
            &self.config,
            study_uid,
            study_value_version,
            FetchPlan::for_snapshot_load(key),
        )
        .await?;

        let snapshot = data
            .snapshot
            .filter(|snapshot| !snapshot.is_empty())
            .ok_or_else(|| SoaError::NotFound {
                message: format!(
                    "no SoA snapshot found for study {study_uid:?} and version {study_value_version:?}"
                ),
            })?;

        let lookups = SnapshotLookups::assemble(
            data.visits,
            data.soa_groups.unwrap_or_default(),
            data.activity_groups.unwrap_or_default(),
            data.activity_subgroups.unwrap_or_default(),
            data.activities,
            data.footnotes.unwrap_or_default(),
        );

        decode_snapshot(&snapshot, &lookups, &data.preferences, layout, time_unit).map_err(|error| match error {
            SnapshotDecodeError::EmptySnapshot => SoaError::NotFound {
                message: format!(
                    "study {study_uid:?} version {study_value_version:?} has insufficient data in its SoA snapshot"
                ),
            },
            SnapshotDecodeError::MissingReferencedItem { item_type, uid } => SoaError::NotFound {
                message: format!("SoA snapshot of study {study_uid:?} references missing {item_type} {uid:?}"),
            },
            SnapshotDecodeError::InconsistentSoaGroup { uid } => SoaError::BusinessRule {
                message: format!("SoA group row reference {uid:?} resolves to no group selection"),
            },
        })
    }

    async fn resolve_time_unit(
        &self,
        study_uid: &str,
        study_value_version: Option<&str>,
        time_unit: Option<TimeUnit>,
    ) -> Result<TimeUnit, SoaError> {
        if let Some(time_unit) = time_unit {
            return Ok(time_unit);
        }

        let name = self.study.preferred_time_unit(study_uid, study_value_version).await?;
        TimeUnit::parse(&name).ok_or_else(|| SoaError::Validation {
            message: "time_unit has to be 'day' or 'week'".to_owned(),
        })
    }

    /// Raised before any fetch: the study (and version, when given) must
    /// exist.
    async fn validate_parameters(&self, study_uid: &str, study_value_version: Option<&str>) -> Result<(), SoaError> {
        match self.study.get_study(study_uid, study_value_version).await {
            Ok(_) => Ok(()),
            Err(SourceError::NotFound { .. }) => Err(SoaError::Validation {
                message: format!("study {study_uid:?} with version {study_value_version:?} does not exist"),
            }),
            Err(error) => Err(error.into()),
        }
    }
}
