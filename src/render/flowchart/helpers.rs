// Cell/row constructors and header text formatting for the flowchart
// builder. Included from `render/flowchart.rs`.

/// Which `StudyVisit` field feeds the timing header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimingField {
    StudyDayNumber,
    StudyWeekNumber,
    StudyDurationDays,
    StudyDurationWeeks,
}

pub(crate) fn timing_field(time_unit: TimeUnit, preferences: &StudySoaPreferences) -> TimingField {
    match (time_unit, preferences.baseline_as_time_zero) {
        (TimeUnit::Day, true) => TimingField::StudyDurationDays,
        (TimeUnit::Day, false) => TimingField::StudyDayNumber,
        (TimeUnit::Week, true) => TimingField::StudyDurationWeeks,
        (TimeUnit::Week, false) => TimingField::StudyWeekNumber,
    }
}

pub(crate) fn visit_timing_value(visit: &crate::model::StudyVisit, field: TimingField) -> Option<i64> {
    match field {
        TimingField::StudyDayNumber => visit.study_day_number,
        TimingField::StudyWeekNumber => visit.study_week_number,
        TimingField::StudyDurationDays => visit.study_duration_days,
        TimingField::StudyDurationWeeks => visit.study_duration_weeks,
    }
}

pub(crate) fn format_int(value: i64) -> String {
    itoa::Buffer::new().format(value).to_owned()
}

fn plus_signed(value: i64) -> String {
    if value > 0 {
        let mut text = String::with_capacity(4);
        text.push('+');
        text.push_str(itoa::Buffer::new().format(value));
        text
    } else {
        format_int(value)
    }
}

/// Formats a visit window.
///
/// `min == max == 0` renders `0`; a symmetric window renders `±max`;
/// otherwise both bounds render signed (`-1/+3`), except a zero bound which
/// stays unsigned. Either bound missing renders empty.
pub(crate) fn format_visit_window(min: Option<i64>, max: Option<i64>) -> String {
    let (Some(min), Some(max)) = (min, max) else {
        return String::new();
    };

    if min == 0 && max == 0 {
        return "0".to_owned();
    }
    if -min == max {
        return format!("±{}", format_int(max));
    }

    let min_text = if min == 0 { "0".to_owned() } else { plus_signed(min) };
    let max_text = if max == 0 { "0".to_owned() } else { plus_signed(max) };
    format!("{min_text}/{max_text}")
}

pub(crate) fn visit_window_text(visit: &crate::model::StudyVisit) -> String {
    if visit.visit_class == VisitClass::SpecialVisit {
        return String::new();
    }
    format_visit_window(visit.min_visit_window_value, visit.max_visit_window_value)
}

fn contains_comma(text: &str) -> bool {
    memchr::memchr(b',', text.as_bytes()).is_some()
}

/// Timing text of a grouped column on the build path.
///
/// A group label containing a comma marks a LIST-style group: every member's
/// timing is comma-joined. Otherwise the first and last member's timings
/// render as a range. The decode path ([`visit_timing_text`]) always renders
/// the range form; both behaviors exist in the system of record and are
/// preserved as-is.
fn grouped_column_timing(group: &VisitGroup, group_name: &str, field: TimingField) -> String {
    let first = visit_timing_value(group.lead(), field);
    let last = visit_timing_value(group.last(), field);
    let (Some(first), Some(last)) = (first, last) else {
        return String::new();
    };

    if contains_comma(group_name) {
        group
            .visits()
            .iter()
            .filter_map(|visit| visit_timing_value(visit, field))
            .map(format_int)
            .collect::<Vec<_>>()
            .join(",")
    } else {
        format!("{}-{}", format_int(first), format_int(last))
    }
}

/// Range-form timing text used when reconstructing a table from a snapshot.
pub(crate) fn visit_timing_text(visits: &[crate::model::StudyVisit], field: TimingField) -> String {
    let Some(visit) = visits.first() else {
        return String::new();
    };

    if visits.len() > 1 {
        let first = visit_timing_value(visit, field);
        let last = visits.last().and_then(|v| visit_timing_value(v, field));
        if let (Some(first), Some(last)) = (first, last) {
            return format!("{}-{}", format_int(first), format_int(last));
        }
    } else if let Some(value) = visit_timing_value(visit, field) {
        if visit.visit_class != VisitClass::SpecialVisit {
            return format_int(value);
        }
    }

    String::new()
}

/// Column label for a reconstructed visit column: the group label when the
/// column merges several visits, else the visit short name.
pub(crate) fn visit_name_for_group(visit: &crate::model::StudyVisit, num_visits_in_group: usize) -> String {
    if num_visits_in_group > 1 {
        visit.consecutive_visit_group.clone().unwrap_or_default()
    } else {
        visit.visit_short_name.clone()
    }
}

/// Overwrites the row label of the first visible row among the first three
/// with the procedure label. The epoch row may be hidden, which shifts the
/// label row up one.
pub(crate) fn amend_procedure_label(rows: &mut [TableRow]) {
    for row in rows.iter_mut().take(3) {
        if !row.hide {
            if let Some(cell) = row.cells.first_mut() {
                cell.text = labels::PROCEDURE.to_owned();
            }
            break;
        }
    }
}

pub(crate) fn soa_group_cell(soa_group: &crate::model::StudySoaGroupSelection) -> TableCell {
    TableCell::with_refs(
        soa_group.soa_group_term_name.clone(),
        CellStyle::SoaGroup,
        vec![
            Ref::new(RefKind::StudySoaGroup, soa_group.study_soa_group_uid.clone()),
            Ref::new(RefKind::CtTerm, soa_group.soa_group_term_uid.clone()),
        ],
    )
}

pub(crate) fn activity_group_cell(group: &crate::model::StudyActivityGroupSelection) -> TableCell {
    let name = if group.activity_group_uid.is_some() {
        group.activity_group_name.clone().unwrap_or_default()
    } else {
        labels::NO_STUDY_GROUP.to_owned()
    };

    let refs = match &group.study_activity_group_uid {
        Some(selection_uid) => vec![
            Ref::new(RefKind::StudyActivityGroup, selection_uid.clone()),
            Ref::new(RefKind::ActivityGroup, group.activity_group_uid.clone().unwrap_or_default()),
        ],
        None => Vec::new(),
    };

    TableCell::with_refs(name, CellStyle::Group, refs)
}

pub(crate) fn activity_subgroup_cell(subgroup: &crate::model::StudyActivitySubGroupSelection) -> TableCell {
    let name = if subgroup.activity_subgroup_uid.is_some() {
        subgroup.activity_subgroup_name.clone().unwrap_or_default()
    } else {
        labels::NO_STUDY_SUBGROUP.to_owned()
    };

    let refs = match &subgroup.study_activity_subgroup_uid {
        Some(selection_uid) => vec![
            Ref::new(RefKind::StudyActivitySubGroup, selection_uid.clone()),
            Ref::new(
                RefKind::ActivitySubGroup,
                subgroup.activity_subgroup_uid.clone().unwrap_or_default(),
            ),
        ],
        None => Vec::new(),
    };

    TableCell::with_refs(name, CellStyle::SubGroup, refs)
}

pub(crate) fn activity_cell(activity: &ActivitySelection) -> TableCell {
    TableCell::with_refs(
        activity.activity.name.clone(),
        CellStyle::Activity,
        vec![
            Ref::new(RefKind::StudyActivity, activity.study_activity_uid.clone()),
            Ref::new(RefKind::Activity, activity.activity.uid.clone()),
        ],
    )
}

fn empty_cells(count: usize) -> impl Iterator<Item = TableCell> {
    std::iter::repeat_with(TableCell::default).take(count)
}

fn soa_group_row(activity: &ActivitySelection, num_cols: usize) -> TableRow {
    let mut row = TableRow {
        cells: vec![soa_group_cell(&activity.soa_group)],
        hide: !activity.show_soa_group_in_protocol_flowchart,
        order: activity.soa_group.order,
        level: Some(1),
    };
    row.cells.extend(empty_cells(num_cols.saturating_sub(1)));
    row
}

fn activity_group_row(activity: &ActivitySelection, num_cols: usize) -> TableRow {
    let mut row = TableRow {
        cells: vec![activity_group_cell(&activity.activity_group)],
        hide: !activity.show_activity_group_in_protocol_flowchart,
        order: activity.activity_group.order,
        level: Some(2),
    };
    row.cells.extend(empty_cells(num_cols.saturating_sub(1)));
    row
}

fn activity_subgroup_row(activity: &ActivitySelection, num_cols: usize) -> TableRow {
    let mut row = TableRow {
        cells: vec![activity_subgroup_cell(&activity.activity_subgroup)],
        hide: !activity.show_activity_subgroup_in_protocol_flowchart,
        order: activity.activity_subgroup.order,
        level: Some(3),
    };
    row.cells.extend(empty_cells(num_cols.saturating_sub(1)));
    row
}

fn activity_row(activity: &ActivitySelection, layout: SoaLayout) -> TableRow {
    let mut row = TableRow {
        cells: vec![activity_cell(activity)],
        hide: !activity.show_activity_in_protocol_flowchart,
        order: activity.order,
        level: Some(4),
    };
    if layout == SoaLayout::Operational {
        row.cells.extend(empty_cells(NUM_OPERATIONAL_CODE_COLS));
    }
    row
}

fn activity_instance_row(instance: &crate::model::InstanceSelection) -> TableRow {
    let backing = instance
        .activity_instance
        .as_ref()
        .expect("instance row requires a backing activity instance");

    let mut row = TableRow {
        hide: !instance.show_activity_instance_in_protocol_flowchart,
        ..TableRow::default()
    };
    row.cells.push(TableCell::with_refs(
        backing.name.clone(),
        CellStyle::ActivityInstance,
        vec![Ref::new(
            RefKind::StudyActivityInstance,
            instance.study_activity_instance_uid.clone().unwrap_or_default(),
        )],
    ));
    row.cells.push(TableCell {
        text: backing.topic_code.clone().unwrap_or_default(),
        ..TableCell::default()
    });
    row.cells.push(TableCell {
        text: backing.adam_param_code.clone().unwrap_or_default(),
        ..TableCell::default()
    });
    row
}
