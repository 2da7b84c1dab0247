// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

//! Read-only study selection DTOs, the shapes returned by the selection
//! snapshot readers. Identity is the uid; each selection carries its explicit
//! ordering field.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::snapshot::ReferencedItem;

/// Minimal study metadata used for validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Study {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_number: Option<String>,
}

/// Version state a snapshot is persisted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum StudyStatus {
    Draft,
    Released,
    Locked,
}

/// Per-study SoA rendering preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StudySoaPreferences {
    pub show_epochs: bool,
    pub show_milestones: bool,
    /// When set, timings count from baseline (duration fields) instead of the
    /// numbered study day/week.
    pub baseline_as_time_zero: bool,
}

impl Default for StudySoaPreferences {
    fn default() -> Self {
        Self {
            show_epochs: true,
            show_milestones: false,
            baseline_as_time_zero: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum VisitClass {
    SingleVisit,
    SpecialVisit,
    NonVisit,
    UnscheduledVisit,
    ManuallyDefinedVisit,
}

/// A study visit. Belongs to exactly one epoch; may belong to a consecutive
/// visit group, rendered as one merged column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StudyVisit {
    pub uid: String,
    pub order: i64,
    pub study_epoch_uid: String,
    pub epoch_name: String,
    pub show_visit: bool,
    pub visit_short_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consecutive_visit_group: Option<String>,
    pub visit_class: VisitClass,
    pub is_soa_milestone: bool,
    pub visit_type_uid: String,
    pub visit_type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_window_unit_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_visit_window_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_visit_window_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_day_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_week_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_duration_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_duration_weeks: Option<i64>,
}

/// The epoch slice of a visit, as needed by snapshot decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StudyEpoch {
    pub uid: String,
    pub epoch_name: String,
}

impl StudyEpoch {
    pub fn from_visit(visit: &StudyVisit) -> Self {
        Self {
            uid: visit.study_epoch_uid.clone(),
            epoch_name: visit.epoch_name.clone(),
        }
    }
}

/// SoA group selection: links a study to a flowchart-group CT term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StudySoaGroupSelection {
    pub study_soa_group_uid: String,
    pub soa_group_term_uid: String,
    pub soa_group_term_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

/// Activity-group selection. Activity requests may carry no group at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StudyActivityGroupSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_activity_group_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_group_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StudyActivitySubGroupSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_activity_subgroup_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_subgroup_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_subgroup_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

/// The library activity concept behind a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActivityRef {
    pub uid: String,
    pub name: String,
}

/// The library activity-instance concept behind an operational selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActivityInstanceRef {
    pub uid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adam_param_code: Option<String>,
}

/// The instance part of an operational activity selection. A record with
/// `activity_instance: None` is a placeholder: the selection exists but no
/// instance has been picked yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InstanceSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_activity_instance_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_instance: Option<ActivityInstanceRef>,
    #[serde(default = "default_true")]
    pub show_activity_instance_in_protocol_flowchart: bool,
}

fn default_true() -> bool {
    true
}

/// A study activity selection.
///
/// One shape serves both the plain activity reads and the operational
/// activity-instance reads: the instance part is `Some` only on the latter.
/// Visibility flags default to shown, so no caller has to probe for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActivitySelection {
    pub study_activity_uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    pub soa_group: StudySoaGroupSelection,
    #[serde(default)]
    pub activity_group: StudyActivityGroupSelection,
    #[serde(default)]
    pub activity_subgroup: StudyActivitySubGroupSelection,
    pub activity: ActivityRef,
    #[serde(default = "default_true")]
    pub show_activity_in_protocol_flowchart: bool,
    #[serde(default = "default_true")]
    pub show_activity_group_in_protocol_flowchart: bool,
    #[serde(default = "default_true")]
    pub show_activity_subgroup_in_protocol_flowchart: bool,
    #[serde(default = "default_true")]
    pub show_soa_group_in_protocol_flowchart: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<InstanceSelection>,
}

/// Links one activity (or activity instance) to one visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StudyActivitySchedule {
    pub study_activity_schedule_uid: String,
    pub study_activity_uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_activity_instance_uid: Option<String>,
    pub study_visit_uid: String,
}

/// A SoA footnote with the ordered list of item uids it annotates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StudySoaFootnote {
    pub uid: String,
    pub order: i64,
    pub text_html: String,
    pub text_plain: String,
    #[serde(default)]
    pub referenced_items: Vec<ReferencedItem>,
}
