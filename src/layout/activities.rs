// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use crate::model::ActivitySelection;

/// Sorts activity selections in place, grouping by (SoA group, activity
/// group, activity subgroup).
///
/// Each key component is the order-of-first-appearance rank of that group's
/// uid, not its semantic `order` field, so groups are bucketed in first-seen
/// order and ties keep their original relative order (the sort is stable).
///
/// With `hide_soa_groups`, activities whose SoA group is not shown in the
/// protocol flowchart get SoA rank `-1`, clustering them in front of (and
/// apart from) the groups that are shown; their SoA group uid claims no rank.
/// Activities without an activity-group uid get group rank `-1` likewise.
pub fn sort_activity_selections(activities: &mut Vec<ActivitySelection>, hide_soa_groups: bool) {
    let mut soa_ranks = HashMap::<String, i64>::new();
    let mut group_ranks = HashMap::<Option<String>, i64>::new();
    let mut subgroup_ranks = HashMap::<Option<String>, i64>::new();

    let mut keyed = activities
        .drain(..)
        .map(|activity| {
            let soa_rank = if hide_soa_groups && !activity.show_soa_group_in_protocol_flowchart {
                -1
            } else {
                let next = soa_ranks.len() as i64;
                *soa_ranks
                    .entry(activity.soa_group.soa_group_term_uid.clone())
                    .or_insert(next)
            };

            let has_group_uid = activity.activity_group.activity_group_uid.is_some();
            let next = group_ranks.len() as i64;
            let group_rank = *group_ranks
                .entry(activity.activity_group.activity_group_uid.clone())
                .or_insert(if has_group_uid { next } else { -1 });

            let next = subgroup_ranks.len() as i64;
            let subgroup_rank = *subgroup_ranks
                .entry(activity.activity_subgroup.activity_subgroup_uid.clone())
                .or_insert(next);

            ((soa_rank, group_rank, subgroup_rank), activity)
        })
        .collect::<Vec<_>>();

    keyed.sort_by_key(|(key, _)| *key);

    activities.extend(keyed.into_iter().map(|(_, activity)| activity));
}
