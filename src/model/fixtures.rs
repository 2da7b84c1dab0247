// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

//! Shared fixture builders for tests.

use super::selections::{
    ActivityInstanceRef, ActivityRef, ActivitySelection, InstanceSelection, StudyActivityGroupSelection,
    StudyActivitySchedule, StudyActivitySubGroupSelection, StudySoaFootnote, StudySoaGroupSelection,
    StudySoaPreferences, StudyVisit, VisitClass,
};
use super::snapshot::ReferencedItem;
use super::SoaItemType;

pub(crate) fn visit(uid: &str, study_epoch_uid: &str, order: i64) -> StudyVisit {
    StudyVisit {
        uid: uid.to_owned(),
        order,
        study_epoch_uid: study_epoch_uid.to_owned(),
        epoch_name: format!("{study_epoch_uid} name"),
        show_visit: true,
        visit_short_name: format!("V{order}"),
        consecutive_visit_group: None,
        visit_class: VisitClass::SingleVisit,
        is_soa_milestone: false,
        visit_type_uid: "VT_TREATMENT".to_owned(),
        visit_type_name: "Treatment".to_owned(),
        visit_window_unit_name: Some("days".to_owned()),
        min_visit_window_value: Some(-1),
        max_visit_window_value: Some(1),
        study_day_number: Some(order),
        study_week_number: Some(order),
        study_duration_days: Some(order - 1),
        study_duration_weeks: Some(order - 1),
    }
}

pub(crate) fn grouped_visit(uid: &str, study_epoch_uid: &str, order: i64, group: &str) -> StudyVisit {
    StudyVisit {
        consecutive_visit_group: Some(group.to_owned()),
        ..visit(uid, study_epoch_uid, order)
    }
}

pub(crate) fn soa_group(study_soa_group_uid: &str, term_uid: &str, name: &str) -> StudySoaGroupSelection {
    StudySoaGroupSelection {
        study_soa_group_uid: study_soa_group_uid.to_owned(),
        soa_group_term_uid: term_uid.to_owned(),
        soa_group_term_name: name.to_owned(),
        order: Some(1),
    }
}

pub(crate) fn activity_group(study_uid: &str, group_uid: &str, name: &str) -> StudyActivityGroupSelection {
    StudyActivityGroupSelection {
        study_activity_group_uid: Some(study_uid.to_owned()),
        activity_group_uid: Some(group_uid.to_owned()),
        activity_group_name: Some(name.to_owned()),
        order: Some(1),
    }
}

pub(crate) fn activity_subgroup(study_uid: &str, subgroup_uid: &str, name: &str) -> StudyActivitySubGroupSelection {
    StudyActivitySubGroupSelection {
        study_activity_subgroup_uid: Some(study_uid.to_owned()),
        activity_subgroup_uid: Some(subgroup_uid.to_owned()),
        activity_subgroup_name: Some(name.to_owned()),
        order: Some(1),
    }
}

/// A fully grouped activity selection with names derived from the uids and
/// every visibility flag on.
pub(crate) fn activity(
    study_activity_uid: &str,
    soa_term_uid: &str,
    group_uid: &str,
    subgroup_uid: &str,
    name: &str,
) -> ActivitySelection {
    ActivitySelection {
        study_activity_uid: study_activity_uid.to_owned(),
        order: Some(1),
        soa_group: soa_group(&format!("SSG_{soa_term_uid}"), soa_term_uid, &format!("{soa_term_uid} name")),
        activity_group: activity_group(&format!("SAG_{group_uid}"), group_uid, &format!("{group_uid} name")),
        activity_subgroup: activity_subgroup(
            &format!("SAS_{subgroup_uid}"),
            subgroup_uid,
            &format!("{subgroup_uid} name"),
        ),
        activity: ActivityRef {
            uid: format!("ACT_{study_activity_uid}"),
            name: name.to_owned(),
        },
        show_activity_in_protocol_flowchart: true,
        show_activity_group_in_protocol_flowchart: true,
        show_activity_subgroup_in_protocol_flowchart: true,
        show_soa_group_in_protocol_flowchart: true,
        instance: None,
    }
}

pub(crate) fn instance_part(study_activity_instance_uid: &str, name: &str, topic_code: &str) -> InstanceSelection {
    InstanceSelection {
        study_activity_instance_uid: Some(study_activity_instance_uid.to_owned()),
        activity_instance: Some(ActivityInstanceRef {
            uid: format!("AI_{study_activity_instance_uid}"),
            name: name.to_owned(),
            topic_code: Some(topic_code.to_owned()),
            adam_param_code: Some(format!("{topic_code}_ADAM")),
        }),
        show_activity_instance_in_protocol_flowchart: true,
    }
}

pub(crate) fn schedule(uid: &str, study_activity_uid: &str, study_visit_uid: &str) -> StudyActivitySchedule {
    StudyActivitySchedule {
        study_activity_schedule_uid: uid.to_owned(),
        study_activity_uid: study_activity_uid.to_owned(),
        study_activity_instance_uid: None,
        study_visit_uid: study_visit_uid.to_owned(),
    }
}

pub(crate) fn footnote(uid: &str, order: i64, referenced_uids: &[(SoaItemType, &str)]) -> StudySoaFootnote {
    StudySoaFootnote {
        uid: uid.to_owned(),
        order,
        text_html: format!("<p>{uid} text</p>"),
        text_plain: format!("{uid} text"),
        referenced_items: referenced_uids
            .iter()
            .map(|(item_type, item_uid)| ReferencedItem::new(*item_type, *item_uid))
            .collect(),
    }
}

/// The complete selection state of a study, as the builder consumes it.
#[derive(Debug, Clone)]
pub(crate) struct SoaTestData {
    pub activities: Vec<ActivitySelection>,
    pub schedules: Vec<StudyActivitySchedule>,
    pub visits: Vec<StudyVisit>,
    pub footnotes: Vec<StudySoaFootnote>,
    pub preferences: StudySoaPreferences,
}

/// One SoA group ("General"), one group ("Vitals"), one subgroup ("BP"), one
/// activity ("Blood Pressure") scheduled at V1 in epoch E1.
pub(crate) fn single_activity_study() -> SoaTestData {
    let mut blood_pressure = activity("SA_BP", "CT_GENERAL", "G_VITALS", "SUB_BP", "Blood Pressure");
    blood_pressure.soa_group.soa_group_term_name = "General".to_owned();
    blood_pressure.activity_group.activity_group_name = Some("Vitals".to_owned());
    blood_pressure.activity_subgroup.activity_subgroup_name = Some("BP".to_owned());

    SoaTestData {
        activities: vec![blood_pressure],
        schedules: vec![schedule("SCH_1", "SA_BP", "V1")],
        visits: vec![visit("V1", "E1", 1)],
        footnotes: Vec::new(),
        preferences: StudySoaPreferences::default(),
    }
}

/// Two epochs, a consecutive visit group in the second epoch, two activities
/// under one subgroup, and a footnote on the activity.
pub(crate) fn two_epoch_study() -> SoaTestData {
    let activities = vec![
        activity("SA_BP", "CT_GENERAL", "G_VITALS", "SUB_BP", "Blood Pressure"),
        activity("SA_HR", "CT_GENERAL", "G_VITALS", "SUB_BP", "Heart Rate"),
    ];

    let visits = vec![
        visit("V1", "E1", 1),
        grouped_visit("V2", "E2", 2, "V2-V3"),
        grouped_visit("V3", "E2", 3, "V2-V3"),
    ];

    let schedules = vec![
        schedule("SCH_1", "SA_BP", "V1"),
        schedule("SCH_2", "SA_BP", "V2"),
        schedule("SCH_3", "SA_HR", "V3"),
    ];

    let footnotes = vec![footnote("FN_1", 1, &[(SoaItemType::StudyActivity, "SA_BP")])];

    SoaTestData {
        activities,
        schedules,
        visits,
        footnotes,
        preferences: StudySoaPreferences::default(),
    }
}
