// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;

use crate::labels;
use crate::layout::{GroupedVisits, VisitGroup};
use crate::model::{
    ActivitySelection, CellStyle, FootnoteMap, Ref, RefKind, SoaLayout, StudyActivitySchedule, StudySoaFootnote,
    StudySoaPreferences, TableCell, TableRow, TableWithFootnotes, TimeUnit, VisitClass,
};
use crate::render::footnotes::attach_footnotes;

/// Check-mark text placed in scheduled cells.
pub const SOA_CHECK_MARK: &str = "X";

/// Extra header columns (Topic Code, ADaM Param Code) of the operational
/// layout, between the label column and the visit columns.
pub const NUM_OPERATIONAL_CODE_COLS: usize = 2;

/// Everything the builder needs, already fetched and arranged: activities in
/// final order, visits grouped into columns.
#[derive(Debug, Clone, Copy)]
pub struct FlowchartInputs<'a> {
    pub activities: &'a [ActivitySelection],
    pub schedules: &'a [StudyActivitySchedule],
    pub grouped_visits: &'a GroupedVisits,
    /// Footnotes to attach; `None` for the operational layout.
    pub footnotes: Option<&'a [StudySoaFootnote]>,
    pub preferences: &'a StudySoaPreferences,
    pub layout: SoaLayout,
    pub time_unit: TimeUnit,
}

/// Builds the SoA flowchart table: header rows (epochs, milestones, visit
/// names, timing, window) followed by body rows (group headers, activities,
/// schedule check-marks).
///
/// The result still contains hidden rows; the protocol post-processing
/// (propagation, removal) is the caller's job so that snapshot extraction can
/// run in between.
pub fn build_flowchart_table(inputs: FlowchartInputs<'_>) -> TableWithFootnotes {
    let header_rows = build_header_rows(
        inputs.grouped_visits,
        inputs.time_unit,
        inputs.preferences,
        inputs.layout,
    );

    let activity_rows = build_activity_rows(
        inputs.activities,
        inputs.schedules,
        inputs.grouped_visits,
        inputs.layout,
    );

    let num_header_rows = header_rows.len();
    let mut rows = header_rows;
    rows.extend(activity_rows);

    let mut table = TableWithFootnotes {
        rows,
        num_header_rows,
        num_header_cols: 1,
        title: labels::PROTOCOL_FLOWCHART.to_owned(),
        footnotes: FootnoteMap::new(),
    };

    if let Some(footnotes) = inputs.footnotes {
        attach_footnotes(&mut table, footnotes);
    }

    table
}

/// Builds the header rows of the flowchart.
///
/// The epoch row is hidden unless the layout is operational or the study
/// prefers epochs shown; the milestone row exists only for non-operational
/// layouts with milestones enabled. The operational layout gets the two code
/// columns appended right after the label column.
pub(crate) fn build_header_rows(
    grouped_visits: &GroupedVisits,
    time_unit: TimeUnit,
    preferences: &StudySoaPreferences,
    layout: SoaLayout,
) -> Vec<TableRow> {
    let timing_field = timing_field(time_unit, preferences);

    let mut epoch_row = TableRow::new(vec![TableCell::text(labels::STUDY_EPOCH, CellStyle::Header1)]);
    epoch_row.hide = !(layout == SoaLayout::Operational || preferences.show_epochs);

    let mut milestone_row = (layout != SoaLayout::Operational && preferences.show_milestones)
        .then(|| TableRow::new(vec![TableCell::text(labels::STUDY_MILESTONE, CellStyle::Header1)]));

    let mut visit_row = TableRow::new(vec![TableCell::text(labels::VISIT_SHORT_NAME, CellStyle::Header2)]);

    let timing_label = match time_unit {
        TimeUnit::Day => labels::STUDY_DAY,
        TimeUnit::Week => labels::STUDY_WEEK,
    };
    let mut timing_row = TableRow::new(vec![TableCell::text(timing_label, CellStyle::Header3)]);

    let visit_window_unit = grouped_visits
        .visit_groups()
        .next()
        .and_then(|group| group.lead().visit_window_unit_name.clone())
        .unwrap_or_default();
    let mut window_row = TableRow::new(vec![TableCell::text(
        labels::visit_window_label(&visit_window_unit),
        CellStyle::Header4,
    )]);

    if layout == SoaLayout::Operational {
        epoch_row.cells.push(TableCell::text(labels::TOPIC_CODE, CellStyle::Header2));
        epoch_row
            .cells
            .push(TableCell::text(labels::ADAM_PARAM_CODE, CellStyle::Header2));
        for row in [&mut visit_row, &mut timing_row, &mut window_row] {
            for _ in 0..NUM_OPERATIONAL_CODE_COLS {
                row.cells.push(TableCell::default());
            }
        }
    }

    let mut prev_epoch_uid: Option<&str> = None;
    let mut prev_visit_type_uid: Option<&str> = None;
    let mut prev_milestone_cell: Option<usize> = None;

    for epoch in grouped_visits.epochs() {
        for group in epoch.groups() {
            let visit = group.lead();

            // Open a new epoch column spanning all of this epoch's groups.
            if prev_epoch_uid != Some(epoch.study_epoch_uid()) {
                prev_epoch_uid = Some(epoch.study_epoch_uid());
                epoch_row.cells.push(TableCell {
                    text: visit.epoch_name.clone(),
                    span: epoch.groups().len(),
                    style: Some(CellStyle::Header1),
                    refs: vec![Ref::new(RefKind::StudyEpoch, visit.study_epoch_uid.clone())],
                    footnotes: None,
                });
            } else {
                epoch_row.cells.push(TableCell::continuation());
            }

            if let Some(milestone_row) = milestone_row.as_mut() {
                if visit.is_soa_milestone {
                    if prev_visit_type_uid == Some(visit.visit_type_uid.as_str()) {
                        // Same visit type, merge into the previous milestone cell.
                        if let Some(idx) = prev_milestone_cell {
                            milestone_row.cells[idx].span += 1;
                        }
                        milestone_row.cells.push(TableCell::continuation());
                    } else {
                        prev_visit_type_uid = Some(visit.visit_type_uid.as_str());
                        milestone_row
                            .cells
                            .push(TableCell::text(visit.visit_type_name.clone(), CellStyle::Header1));
                        prev_milestone_cell = Some(milestone_row.cells.len() - 1);
                    }
                } else {
                    prev_visit_type_uid = None;
                    milestone_row.cells.push(TableCell::default());
                }
            }

            let (visit_name, visit_timing) = if group.len() > 1 {
                let name = visit.consecutive_visit_group.clone().unwrap_or_default();
                let timing = grouped_column_timing(group, &name, timing_field);
                (name, timing)
            } else {
                let timing = if visit_timing_value(visit, timing_field).is_some()
                    && visit.visit_class != VisitClass::SpecialVisit
                {
                    format_int(visit_timing_value(visit, timing_field).unwrap_or_default())
                } else {
                    String::new()
                };
                (visit.visit_short_name.clone(), timing)
            };

            visit_row.cells.push(TableCell::with_refs(
                visit_name,
                CellStyle::Header2,
                group
                    .visits()
                    .iter()
                    .map(|v| Ref::new(RefKind::StudyVisit, v.uid.clone()))
                    .collect(),
            ));

            timing_row.cells.push(TableCell::text(visit_timing, CellStyle::Header3));
            window_row
                .cells
                .push(TableCell::text(visit_window_text(visit), CellStyle::Header4));
        }
    }

    let mut rows = vec![epoch_row];
    if let Some(milestone_row) = milestone_row {
        rows.push(milestone_row);
    }
    rows.push(visit_row);
    rows.push(timing_row);
    rows.push(window_row);

    if layout == SoaLayout::Protocol {
        amend_procedure_label(&mut rows);
    }

    rows
}

/// Row-emission state of one grouping level: the uids already answered for by
/// the current header row(s) and the index of the row that merges take.
#[derive(Debug, Default)]
struct GroupRowState {
    seen_uids: HashSet<String>,
    row: Option<usize>,
}

impl GroupRowState {
    fn reset(&mut self) {
        self.seen_uids.clear();
        self.row = None;
    }
}

/// Builds body rows: one header row per newly seen group at each level, one
/// row per activity, one per backed activity instance, each followed by its
/// schedule check-marks.
///
/// A group concept reached through a second selection record merges into the
/// already-emitted header row: the extra selection ref is inserted before the
/// concept ref, and the row un-hides if any contributing member wants it
/// shown.
pub(crate) fn build_activity_rows(
    activities: &[ActivitySelection],
    schedules: &[StudyActivitySchedule],
    grouped_visits: &GroupedVisits,
    layout: SoaLayout,
) -> Vec<TableRow> {
    let visit_groups = grouped_visits.visit_groups().collect::<Vec<_>>();

    let mut num_cols = visit_groups.len() + 1;
    if layout == SoaLayout::Operational {
        num_cols += NUM_OPERATIONAL_CODE_COLS;
    }

    // Schedules indexed by (activity-or-instance uid, visit uid); last one
    // wins on duplicates.
    let schedule_index: HashMap<(&str, &str), &StudyActivitySchedule> = schedules
        .iter()
        .map(|schedule| {
            (
                (
                    schedule
                        .study_activity_instance_uid
                        .as_deref()
                        .unwrap_or(schedule.study_activity_uid.as_str()),
                    schedule.study_visit_uid.as_str(),
                ),
                schedule,
            )
        })
        .collect();

    let mut rows = Vec::<TableRow>::new();

    let mut prev_soa_group_uid: Option<&str> = None;
    let mut group_state = GroupRowState::default();
    let mut subgroup_state = GroupRowState::default();
    let mut prev_selection_uid: Option<&str> = None;

    for activity in activities {
        let soa_group_uid = activity.soa_group.soa_group_term_uid.as_str();

        if layout != SoaLayout::Protocol || activity.show_soa_group_in_protocol_flowchart {
            if prev_soa_group_uid != Some(soa_group_uid) {
                prev_soa_group_uid = Some(soa_group_uid);
                group_state.reset();
                subgroup_state.reset();
                prev_selection_uid = None;

                rows.push(soa_group_row(activity, num_cols));
            }
        }

        // Activity group row.
        let group_concept_uid = activity.activity_group.activity_group_uid.as_deref();
        let group_selection_uid = activity.activity_group.study_activity_group_uid.as_deref();
        let group_seen = group_concept_uid.is_some_and(|uid| group_state.seen_uids.contains(uid));

        if !group_seen {
            if let Some(uid) = group_concept_uid {
                group_state.seen_uids.insert(uid.to_owned());
            }
            if let Some(uid) = group_selection_uid {
                group_state.seen_uids.insert(uid.to_owned());
            }
            subgroup_state.reset();
            prev_selection_uid = None;

            rows.push(activity_group_row(activity, num_cols));
            group_state.row = Some(rows.len() - 1);
        } else {
            merge_group_header(
                &mut rows,
                &mut group_state,
                group_selection_uid,
                RefKind::StudyActivityGroup,
                activity.show_activity_group_in_protocol_flowchart,
            );
        }

        // Activity subgroup row.
        let subgroup_concept_uid = activity.activity_subgroup.activity_subgroup_uid.as_deref();
        let subgroup_selection_uid = activity.activity_subgroup.study_activity_subgroup_uid.as_deref();
        let subgroup_seen = subgroup_concept_uid.is_some_and(|uid| subgroup_state.seen_uids.contains(uid));

        if !subgroup_seen {
            if let Some(uid) = subgroup_concept_uid {
                subgroup_state.seen_uids.insert(uid.to_owned());
            }
            if let Some(uid) = subgroup_selection_uid {
                subgroup_state.seen_uids.insert(uid.to_owned());
            }
            prev_selection_uid = None;

            rows.push(activity_subgroup_row(activity, num_cols));
            subgroup_state.row = Some(rows.len() - 1);
        } else {
            merge_group_header(
                &mut rows,
                &mut subgroup_state,
                subgroup_selection_uid,
                RefKind::StudyActivitySubGroup,
                activity.show_activity_subgroup_in_protocol_flowchart,
            );
        }

        // Activity row, once per distinct selection uid.
        let activity_uid = activity.study_activity_uid.as_str();
        if prev_selection_uid != Some(activity_uid) && !activity_uid.is_empty() {
            prev_selection_uid = Some(activity_uid);

            let mut row = activity_row(activity, layout);
            append_activity_crosses(&mut row, &visit_groups, &schedule_index, activity_uid);
            rows.push(row);
        }

        // Activity instance row; placeholders without a backing instance are
        // not shown.
        if let Some(instance) = &activity.instance {
            if instance.activity_instance.is_some() {
                if let Some(instance_uid) = instance.study_activity_instance_uid.as_deref() {
                    let mut row = activity_instance_row(instance);
                    append_activity_crosses(&mut row, &visit_groups, &schedule_index, instance_uid);
                    rows.push(row);
                }
            }
        }
    }

    rows
}

fn merge_group_header(
    rows: &mut [TableRow],
    state: &mut GroupRowState,
    selection_uid: Option<&str>,
    kind: RefKind,
    member_wants_shown: bool,
) {
    if let Some(selection_uid) = selection_uid {
        if !state.seen_uids.contains(selection_uid) {
            state.seen_uids.insert(selection_uid.to_owned());
            if let Some(idx) = state.row {
                // Keep the concept ref last; merged selection refs accumulate
                // before it.
                let refs = &mut rows[idx].cells[0].refs;
                let at = refs.len().saturating_sub(1);
                refs.insert(at, Ref::new(kind, selection_uid));
            }
        }
    }

    if member_wants_shown {
        if let Some(idx) = state.row {
            rows[idx].hide = false;
        }
    }
}

fn append_activity_crosses(
    row: &mut TableRow,
    visit_groups: &[&VisitGroup],
    schedule_index: &HashMap<(&str, &str), &StudyActivitySchedule>,
    activity_id: &str,
) {
    for group in visit_groups {
        // A grouped column can carry one schedule per physical visit;
        // de-duplicate uids preserving first-seen order.
        let mut schedule_uids = SmallVec::<[&str; 4]>::new();
        for visit in group.visits() {
            if let Some(schedule) = schedule_index.get(&(activity_id, visit.uid.as_str())) {
                let uid = schedule.study_activity_schedule_uid.as_str();
                if !schedule_uids.contains(&uid) {
                    schedule_uids.push(uid);
                }
            }
        }

        if schedule_uids.is_empty() {
            row.cells.push(TableCell::default());
        } else {
            row.cells.push(TableCell::with_refs(
                SOA_CHECK_MARK,
                CellStyle::ActivitySchedule,
                schedule_uids
                    .iter()
                    .map(|uid| Ref::new(RefKind::StudyActivitySchedule, *uid))
                    .collect(),
            ));
        }
    }
}

// Cell/row constructors and header text formatting.
include!("flowchart/helpers.rs");
