// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

//! The parameterized read fan-out.
//!
//! Both the build path and the snapshot-load path describe their reads as a
//! [`FetchPlan`] executed by one helper: every fetch receives the same
//! `study_value_version`, results are gathered at a single join barrier and
//! surfaced in a fixed order (first failure wins, no partial data).

use crate::config::SoaConfig;
use crate::layout::sort_activity_selections;
use crate::model::{
    ActivitySelection, SoaLayout, StudyActivityGroupSelection, StudyActivitySchedule,
    StudyActivitySubGroupSelection, StudySoaFootnote, StudySoaGroupSelection, StudySoaPreferences, StudyVisit,
};
use crate::ops::SoaError;
use crate::source::{StudyMetadataSource, StudySelectionSource};
use crate::store::{SnapshotKey, SoaSnapshot, SoaSnapshotRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActivityFetch {
    Selections,
    Instances,
}

#[derive(Debug, Clone)]
pub(crate) struct FetchPlan {
    pub activities: ActivityFetch,
    /// Sort activities into (SoA group, group, subgroup) buckets.
    pub sort_activities: bool,
    /// Cluster activities with hidden SoA groups in front (protocol).
    pub hide_soa_groups: bool,
    /// Fetch schedules; the flag selects operational (instance-linked) reads.
    pub schedules: Option<bool>,
    pub footnotes: bool,
    /// Fetch SoA group / group / subgroup selection lists (decode lookups).
    pub group_selections: bool,
    /// Drop invisible visits and the synthetic basic epoch.
    pub filter_visits: bool,
    pub snapshot: Option<SnapshotKey>,
}

impl FetchPlan {
    pub fn for_build(layout: SoaLayout) -> Self {
        Self {
            activities: if layout == SoaLayout::Operational {
                ActivityFetch::Instances
            } else {
                ActivityFetch::Selections
            },
            sort_activities: true,
            hide_soa_groups: layout == SoaLayout::Protocol,
            schedules: Some(layout == SoaLayout::Operational),
            footnotes: layout != SoaLayout::Operational,
            group_selections: false,
            filter_visits: true,
            snapshot: None,
        }
    }

    pub fn for_snapshot_load(key: SnapshotKey) -> Self {
        Self {
            activities: ActivityFetch::Selections,
            sort_activities: false,
            hide_soa_groups: false,
            schedules: None,
            footnotes: true,
            group_selections: true,
            filter_visits: false,
            snapshot: Some(key),
        }
    }
}

#[derive(Debug)]
pub(crate) struct FetchedSoaData {
    pub preferences: StudySoaPreferences,
    pub activities: Vec<ActivitySelection>,
    pub schedules: Vec<StudyActivitySchedule>,
    pub visits: Vec<StudyVisit>,
    pub footnotes: Option<Vec<StudySoaFootnote>>,
    pub soa_groups: Option<Vec<StudySoaGroupSelection>>,
    pub activity_groups: Option<Vec<StudyActivityGroupSelection>>,
    pub activity_subgroups: Option<Vec<StudyActivitySubGroupSelection>>,
    pub snapshot: Option<SoaSnapshot>,
}

pub(crate) async fn execute_fetch_plan(
    study: &dyn StudyMetadataSource,
    selections: &dyn StudySelectionSource,
    repository: &dyn SoaSnapshotRepository,
    config: &SoaConfig,
    study_uid: &str,
    study_value_version: Option<&str>,
    plan: FetchPlan,
) -> Result<FetchedSoaData, SoaError> {
    let (preferences, activities, schedules, visits, footnotes, soa_groups, activity_groups, activity_subgroups, snapshot) = tokio::join!(
        study.soa_preferences(study_uid, study_value_version),
        async {
            match plan.activities {
                ActivityFetch::Selections => selections.study_activities(study_uid, study_value_version).await,
                ActivityFetch::Instances => {
                    selections.study_activity_instances(study_uid, study_value_version).await
                }
            }
        },
        async {
            match plan.schedules {
                Some(operational) => selections
                    .all_schedules(study_uid, study_value_version, operational)
                    .await
                    .map(Some),
                None => Ok(None),
            }
        },
        selections.all_visits(study_uid, study_value_version),
        async {
            if plan.footnotes {
                selections.all_footnotes(study_uid, study_value_version).await.map(Some)
            } else {
                Ok(None)
            }
        },
        async {
            if plan.group_selections {
                selections.all_soa_groups(study_uid, study_value_version).await.map(Some)
            } else {
                Ok(None)
            }
        },
        async {
            if plan.group_selections {
                selections
                    .all_activity_groups(study_uid, study_value_version)
                    .await
                    .map(Some)
            } else {
                Ok(None)
            }
        },
        async {
            if plan.group_selections {
                selections
                    .all_activity_subgroups(study_uid, study_value_version)
                    .await
                    .map(Some)
            } else {
                Ok(None)
            }
        },
        async {
            match &plan.snapshot {
                Some(key) => repository.load(key).await.map(Some),
                None => Ok(None),
            }
        },
    );

    // Past the join barrier; surface failures in a fixed order.
    let preferences = preferences?;
    let mut activities = activities?;
    let schedules = schedules?.unwrap_or_default();
    let mut visits = visits?;
    let mut footnotes = footnotes?;
    let soa_groups = soa_groups?;
    let activity_groups = activity_groups?;
    let activity_subgroups = activity_subgroups?;
    let snapshot = snapshot?.flatten();

    if plan.sort_activities {
        sort_activity_selections(&mut activities, plan.hide_soa_groups);
    }
    if plan.filter_visits {
        visits.retain(|visit| visit.show_visit && visit.epoch_name != config.basic_epoch_name);
    }
    if let Some(footnotes) = footnotes.as_mut() {
        footnotes.sort_by_key(|footnote| footnote.order);
    }

    Ok(FetchedSoaData {
        preferences,
        activities,
        schedules,
        visits,
        footnotes,
        soa_groups,
        activity_groups,
        activity_subgroups,
        snapshot,
    })
}
