// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{SoaError, SoaFlowchartService};
use crate::config::SoaConfig;
use crate::model::fixtures::{self, SoaTestData};
use crate::model::{
    ActivitySelection, CellCoordinates, SoaLayout, Study, StudyActivityGroupSelection, StudyActivitySchedule,
    StudyActivitySubGroupSelection, StudySoaFootnote, StudySoaGroupSelection, StudySoaPreferences, StudyStatus,
    StudyVisit, TableWithFootnotes, TimeUnit,
};
use crate::source::{SourceError, StudyMetadataSource, StudySelectionSource};
use crate::store::{InMemorySnapshotRepository, SnapshotKey};

#[derive(Default)]
struct CallLog {
    calls: Mutex<Vec<(&'static str, Option<String>)>>,
}

impl CallLog {
    fn record(&self, operation: &'static str, study_value_version: Option<&str>) {
        self.calls
            .lock()
            .unwrap()
            .push((operation, study_value_version.map(str::to_owned)));
    }

    fn calls(&self) -> Vec<(&'static str, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

struct FakeStudySource {
    log: Arc<CallLog>,
    known_study_uid: String,
    time_unit: String,
    preferences: StudySoaPreferences,
}

#[async_trait]
impl StudyMetadataSource for FakeStudySource {
    async fn get_study(&self, study_uid: &str, study_value_version: Option<&str>) -> Result<Study, SourceError> {
        self.log.record("get_study", study_value_version);
        if study_uid == self.known_study_uid {
            Ok(Study {
                uid: study_uid.to_owned(),
                study_number: Some("001".to_owned()),
            })
        } else {
            Err(SourceError::NotFound {
                entity: "study",
                uid: study_uid.to_owned(),
                study_value_version: study_value_version.map(str::to_owned),
            })
        }
    }

    async fn preferred_time_unit(
        &self,
        _study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<String, SourceError> {
        self.log.record("preferred_time_unit", study_value_version);
        Ok(self.time_unit.clone())
    }

    async fn soa_preferences(
        &self,
        _study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<StudySoaPreferences, SourceError> {
        self.log.record("soa_preferences", study_value_version);
        Ok(self.preferences)
    }
}

struct FakeSelectionSource {
    log: Arc<CallLog>,
    data: SoaTestData,
    fail_schedules: bool,
}

#[async_trait]
impl StudySelectionSource for FakeSelectionSource {
    async fn all_schedules(
        &self,
        _study_uid: &str,
        study_value_version: Option<&str>,
        _operational: bool,
    ) -> Result<Vec<StudyActivitySchedule>, SourceError> {
        self.log.record("all_schedules", study_value_version);
        if self.fail_schedules {
            return Err(SourceError::backend(
                "all_schedules",
                io::Error::new(io::ErrorKind::Other, "backend unavailable"),
            ));
        }
        Ok(self.data.schedules.clone())
    }

    async fn all_visits(
        &self,
        _study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<Vec<StudyVisit>, SourceError> {
        self.log.record("all_visits", study_value_version);
        Ok(self.data.visits.clone())
    }

    async fn all_footnotes(
        &self,
        _study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<Vec<StudySoaFootnote>, SourceError> {
        self.log.record("all_footnotes", study_value_version);
        Ok(self.data.footnotes.clone())
    }

    async fn all_soa_groups(
        &self,
        _study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<Vec<StudySoaGroupSelection>, SourceError> {
        self.log.record("all_soa_groups", study_value_version);
        Ok(self.data.activities.iter().map(|a| a.soa_group.clone()).collect())
    }

    async fn all_activity_groups(
        &self,
        _study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<Vec<StudyActivityGroupSelection>, SourceError> {
        self.log.record("all_activity_groups", study_value_version);
        Ok(self.data.activities.iter().map(|a| a.activity_group.clone()).collect())
    }

    async fn all_activity_subgroups(
        &self,
        _study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<Vec<StudyActivitySubGroupSelection>, SourceError> {
        self.log.record("all_activity_subgroups", study_value_version);
        Ok(self
            .data
            .activities
            .iter()
            .map(|a| a.activity_subgroup.clone())
            .collect())
    }

    async fn study_activities(
        &self,
        _study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<Vec<ActivitySelection>, SourceError> {
        self.log.record("study_activities", study_value_version);
        Ok(self
            .data
            .activities
            .iter()
            .cloned()
            .map(|mut activity| {
                activity.instance = None;
                activity
            })
            .collect())
    }

    async fn study_activity_instances(
        &self,
        _study_uid: &str,
        study_value_version: Option<&str>,
    ) -> Result<Vec<ActivitySelection>, SourceError> {
        self.log.record("study_activity_instances", study_value_version);
        Ok(self.data.activities.clone())
    }
}

struct Harness {
    service: SoaFlowchartService,
    study_log: Arc<CallLog>,
    selection_log: Arc<CallLog>,
    repository: Arc<InMemorySnapshotRepository>,
}

fn harness(data: SoaTestData) -> Harness {
    harness_with(data, false, "day")
}

fn harness_with(data: SoaTestData, fail_schedules: bool, time_unit: &str) -> Harness {
    let study_log = Arc::new(CallLog::default());
    let selection_log = Arc::new(CallLog::default());
    let repository = Arc::new(InMemorySnapshotRepository::new());
    let preferences = data.preferences;

    let service = SoaFlowchartService::new(
        Arc::new(FakeStudySource {
            log: study_log.clone(),
            known_study_uid: "Study_1".to_owned(),
            time_unit: time_unit.to_owned(),
            preferences,
        }),
        Arc::new(FakeSelectionSource {
            log: selection_log.clone(),
            data,
            fail_schedules,
        }),
        repository.clone(),
        SoaConfig::default(),
    );

    Harness {
        service,
        study_log,
        selection_log,
        repository,
    }
}

fn grid(table: &TableWithFootnotes) -> Vec<(bool, Vec<(String, usize)>)> {
    table
        .rows
        .iter()
        .map(|row| {
            (
                row.hide,
                row.cells.iter().map(|cell| (cell.text.clone(), cell.span)).collect(),
            )
        })
        .collect()
}

#[tokio::test]
async fn every_fetch_carries_the_requested_version() {
    let harness = harness(fixtures::two_epoch_study());

    harness
        .service
        .build_flowchart_table("Study_1", Some("2.0"), SoaLayout::Protocol, Some(TimeUnit::Day))
        .await
        .expect("build");

    let calls = harness.selection_log.calls();
    assert!(!calls.is_empty());
    assert!(
        calls.iter().all(|(_, version)| version.as_deref() == Some("2.0")),
        "fetches with drifting versions: {calls:?}"
    );

    let operations = calls.iter().map(|(operation, _)| *operation).collect::<HashSet<_>>();
    assert!(operations.contains("study_activities"));
    assert!(operations.contains("all_schedules"));
    assert!(operations.contains("all_visits"));
    assert!(operations.contains("all_footnotes"));

    assert!(harness
        .study_log
        .calls()
        .iter()
        .all(|(_, version)| version.as_deref() == Some("2.0")));
}

#[tokio::test]
async fn an_unknown_study_fails_validation_before_any_selection_read() {
    let harness = harness(fixtures::single_activity_study());

    let error = harness
        .service
        .build_flowchart_table("Study_404", None, SoaLayout::Protocol, Some(TimeUnit::Day))
        .await
        .expect_err("validation must fail");

    assert!(matches!(error, SoaError::Validation { .. }));
    assert!(harness.selection_log.calls().is_empty());
}

#[tokio::test]
async fn a_failing_fetch_aborts_the_whole_build() {
    let harness = harness_with(fixtures::single_activity_study(), true, "day");

    let error = harness
        .service
        .build_flowchart_table("Study_1", None, SoaLayout::Detailed, Some(TimeUnit::Day))
        .await
        .expect_err("fetch failure must abort");

    assert!(matches!(error, SoaError::Source { .. }));
}

#[tokio::test]
async fn a_stored_time_unit_other_than_day_or_week_is_rejected() {
    let harness = harness_with(fixtures::single_activity_study(), false, "month");

    let error = harness
        .service
        .build_flowchart_table("Study_1", None, SoaLayout::Detailed, None)
        .await
        .expect_err("time unit must be rejected");

    assert!(matches!(error, SoaError::Validation { .. }));
}

#[tokio::test]
async fn snapshot_update_then_load_reproduces_the_served_table() {
    let mut data = fixtures::two_epoch_study();
    data.activities[1].show_activity_in_protocol_flowchart = false;
    let harness = harness(data);

    harness
        .service
        .update_soa_snapshot("Study_1", Some("1.0"), SoaLayout::Protocol, Some(StudyStatus::Released))
        .await
        .expect("update snapshot");

    let key = SnapshotKey::new("Study_1", Some("1.0"), SoaLayout::Protocol);
    assert_eq!(harness.repository.stored_status(&key).await, Some(StudyStatus::Released));

    let from_snapshot = harness
        .service
        .get_flowchart_table("Study_1", Some("1.0"), SoaLayout::Protocol, Some(TimeUnit::Day), false)
        .await
        .expect("serve from snapshot");

    let rebuilt = harness
        .service
        .get_flowchart_table("Study_1", Some("1.0"), SoaLayout::Protocol, Some(TimeUnit::Day), true)
        .await
        .expect("forced rebuild");

    assert_eq!(grid(&from_snapshot), grid(&rebuilt));
    assert_eq!(from_snapshot.num_header_rows, rebuilt.num_header_rows);
    assert_eq!(from_snapshot.footnotes, rebuilt.footnotes);
}

#[tokio::test]
async fn loading_an_absent_snapshot_is_not_found() {
    let harness = harness(fixtures::single_activity_study());

    let error = harness
        .service
        .load_soa_snapshot("Study_1", Some("1.0"), SoaLayout::Protocol, Some(TimeUnit::Day))
        .await
        .expect_err("missing snapshot");

    assert!(matches!(error, SoaError::NotFound { .. }));
}

#[tokio::test]
async fn coordinates_cover_selections_and_schedules() {
    let harness = harness(fixtures::single_activity_study());

    let coordinates = harness
        .service
        .flowchart_item_uid_coordinates("Study_1", None, false)
        .await
        .expect("coordinates");

    assert_eq!(coordinates.get("E1").copied(), Some(CellCoordinates::new(0, 1)));
    assert_eq!(coordinates.get("V1").copied(), Some(CellCoordinates::new(1, 1)));
    assert_eq!(coordinates.get("SA_BP").copied(), Some(CellCoordinates::new(7, 0)));
    assert_eq!(coordinates.get("SCH_1").copied(), Some(CellCoordinates::new(7, 1)));
}
