// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, HashMap};

use crate::layout::GroupedVisits;
use crate::model::{ActivitySelection, CellCoordinates, StudyActivitySchedule};

/// Maps every addressable item uid to its `(row, column)` position in the
/// detailed SoA table.
///
/// Epoch columns sit on row 0, visit columns on row 1; data rows start at 4
/// (rows 0–3 are reserved for epoch/visit/timing/window, whether or not the
/// rendered table hides some of them — this index never reflects hiding).
/// Group and subgroup headers claim `(row, 0)`, schedules `(row, col)`.
pub fn item_uid_coordinates(
    activities: &[ActivitySelection],
    schedules: &[StudyActivitySchedule],
    grouped_visits: &GroupedVisits,
) -> BTreeMap<String, CellCoordinates> {
    let schedule_index: HashMap<(&str, &str), &StudyActivitySchedule> = schedules
        .iter()
        .map(|schedule| {
            (
                (schedule.study_activity_uid.as_str(), schedule.study_visit_uid.as_str()),
                schedule,
            )
        })
        .collect();

    let mut coordinates = BTreeMap::<String, CellCoordinates>::new();

    let mut col = 1usize;
    for epoch in grouped_visits.epochs() {
        coordinates.insert(epoch.study_epoch_uid().to_owned(), CellCoordinates::new(0, col));
        for group in epoch.groups() {
            for visit in group.visits() {
                coordinates.insert(visit.uid.clone(), CellCoordinates::new(1, col));
            }
            col += 1;
        }
    }

    let mut row = 4usize;

    let mut prev_soa_group_uid: Option<&str> = None;
    let mut soa_group_row = 0usize;
    // Group trackers distinguish "unset" from "seen an activity without a
    // group" (outer None vs inner None).
    let mut prev_activity_group_uid: Option<Option<&str>> = None;
    let mut activity_group_row = 0usize;
    let mut prev_activity_subgroup_uid: Option<Option<&str>> = None;
    let mut activity_subgroup_row = 0usize;

    for activity in activities {
        let soa_group_uid = activity.soa_group.soa_group_term_uid.as_str();
        if prev_soa_group_uid != Some(soa_group_uid) {
            prev_soa_group_uid = Some(soa_group_uid);
            soa_group_row = row;
            prev_activity_group_uid = None;
            activity_group_row = 0;
            prev_activity_subgroup_uid = None;
            activity_subgroup_row = 0;
            row += 1;
        }

        coordinates.insert(
            activity.soa_group.study_soa_group_uid.clone(),
            CellCoordinates::new(soa_group_row, 0),
        );

        let group_uid = activity.activity_group.activity_group_uid.as_deref();
        if prev_activity_group_uid != Some(group_uid) {
            prev_activity_group_uid = Some(group_uid);
            activity_group_row = row;
            prev_activity_subgroup_uid = None;
            activity_subgroup_row = 0;
            row += 1;
        }

        if let Some(selection_uid) = &activity.activity_group.study_activity_group_uid {
            coordinates.insert(selection_uid.clone(), CellCoordinates::new(activity_group_row, 0));
        }

        let subgroup_uid = activity.activity_subgroup.activity_subgroup_uid.as_deref();
        if prev_activity_subgroup_uid != Some(subgroup_uid) {
            prev_activity_subgroup_uid = Some(subgroup_uid);
            activity_subgroup_row = row;
            row += 1;
        }

        if let Some(selection_uid) = &activity.activity_subgroup.study_activity_subgroup_uid {
            coordinates.insert(selection_uid.clone(), CellCoordinates::new(activity_subgroup_row, 0));
        }

        coordinates.insert(activity.study_activity_uid.clone(), CellCoordinates::new(row, 0));

        let mut col = 0usize;
        for epoch in grouped_visits.epochs() {
            for group in epoch.groups() {
                col += 1;
                for visit in group.visits() {
                    if let Some(schedule) =
                        schedule_index.get(&(activity.study_activity_uid.as_str(), visit.uid.as_str()))
                    {
                        coordinates.insert(
                            schedule.study_activity_schedule_uid.clone(),
                            CellCoordinates::new(row, col),
                        );
                    }
                }
            }
        }

        row += 1;
    }

    coordinates
}

#[cfg(test)]
mod tests {
    use super::item_uid_coordinates;
    use crate::layout::GroupedVisits;
    use crate::model::fixtures;
    use crate::model::CellCoordinates;

    #[test]
    fn single_activity_study_places_every_item() {
        let data = fixtures::single_activity_study();
        let grouped = GroupedVisits::group_visits(data.visits.clone(), true);

        let coordinates = item_uid_coordinates(&data.activities, &data.schedules, &grouped);

        assert_eq!(coordinates.get("E1"), Some(&CellCoordinates::new(0, 1)));
        assert_eq!(coordinates.get("V1"), Some(&CellCoordinates::new(1, 1)));
        assert_eq!(coordinates.get("SSG_CT_GENERAL"), Some(&CellCoordinates::new(4, 0)));
        assert_eq!(coordinates.get("SAG_G_VITALS"), Some(&CellCoordinates::new(5, 0)));
        assert_eq!(coordinates.get("SAS_SUB_BP"), Some(&CellCoordinates::new(6, 0)));
        assert_eq!(coordinates.get("SA_BP"), Some(&CellCoordinates::new(7, 0)));
        assert_eq!(coordinates.get("SCH_1"), Some(&CellCoordinates::new(7, 1)));
    }

    #[test]
    fn group_rows_are_claimed_once_per_bucket_transition() {
        let data = fixtures::two_epoch_study();
        let grouped = GroupedVisits::group_visits(data.visits.clone(), true);

        let coordinates = item_uid_coordinates(&data.activities, &data.schedules, &grouped);

        // Both activities share the SoA group, group and subgroup: rows 4..6,
        // then one row per activity.
        assert_eq!(coordinates.get("SSG_CT_GENERAL"), Some(&CellCoordinates::new(4, 0)));
        assert_eq!(coordinates.get("SAG_G_VITALS"), Some(&CellCoordinates::new(5, 0)));
        assert_eq!(coordinates.get("SAS_SUB_BP"), Some(&CellCoordinates::new(6, 0)));
        assert_eq!(coordinates.get("SA_BP"), Some(&CellCoordinates::new(7, 0)));
        assert_eq!(coordinates.get("SA_HR"), Some(&CellCoordinates::new(8, 0)));

        // V2 and V3 are one merged column (column 2).
        assert_eq!(coordinates.get("SCH_1"), Some(&CellCoordinates::new(7, 1)));
        assert_eq!(coordinates.get("SCH_2"), Some(&CellCoordinates::new(7, 2)));
        assert_eq!(coordinates.get("SCH_3"), Some(&CellCoordinates::new(8, 2)));
    }

    #[test]
    fn hiding_flags_do_not_affect_coordinates() {
        let mut data = fixtures::single_activity_study();
        data.activities[0].show_activity_group_in_protocol_flowchart = false;
        data.activities[0].show_activity_in_protocol_flowchart = false;
        let grouped = GroupedVisits::group_visits(data.visits.clone(), true);

        let coordinates = item_uid_coordinates(&data.activities, &data.schedules, &grouped);

        assert_eq!(coordinates.get("SAG_G_VITALS"), Some(&CellCoordinates::new(5, 0)));
        assert_eq!(coordinates.get("SA_BP"), Some(&CellCoordinates::new(7, 0)));
    }
}
