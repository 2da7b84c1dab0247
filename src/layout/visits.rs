// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

use crate::model::StudyVisit;

/// Visits that render as one table column. With collapsing enabled the key is
/// the consecutive-visit-group label and the group can hold several visits;
/// otherwise the key is the visit uid and the group holds exactly one.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitGroup {
    key: String,
    visits: Vec<StudyVisit>,
}

impl VisitGroup {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn visits(&self) -> &[StudyVisit] {
        &self.visits
    }

    /// The first visit, which provides the column's display values.
    pub fn lead(&self) -> &StudyVisit {
        &self.visits[0]
    }

    pub fn last(&self) -> &StudyVisit {
        self.visits.last().expect("visit group is never empty")
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }
}

/// All visit groups of one epoch, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochVisits {
    study_epoch_uid: String,
    groups: Vec<VisitGroup>,
}

impl EpochVisits {
    pub fn study_epoch_uid(&self) -> &str {
        &self.study_epoch_uid
    }

    pub fn groups(&self) -> &[VisitGroup] {
        &self.groups
    }
}

/// Visits bucketed by epoch, then into consecutive-visit-groups (or single
/// visit columns), all insertion-ordered after a pre-sort by visit order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedVisits {
    epochs: Vec<EpochVisits>,
}

impl GroupedVisits {
    /// Buckets `visits` by epoch, then by consecutive-visit-group key.
    ///
    /// Visits are sorted by their own `order` field before bucketing. With
    /// `collapse_visit_groups` a visit with a non-empty
    /// `consecutive_visit_group` joins that group's column; otherwise every
    /// visit gets its own column (operational layout).
    pub fn group_visits(visits: impl IntoIterator<Item = StudyVisit>, collapse_visit_groups: bool) -> Self {
        let mut visits = visits.into_iter().collect::<Vec<_>>();
        visits.sort_by_key(|visit| visit.order);

        let mut grouped = Self::default();
        for visit in visits {
            let key = match (&visit.consecutive_visit_group, collapse_visit_groups) {
                (Some(group), true) if !group.is_empty() => group.clone(),
                _ => visit.uid.clone(),
            };

            let epoch_index = grouped
                .epochs
                .iter()
                .position(|epoch| epoch.study_epoch_uid == visit.study_epoch_uid)
                .unwrap_or_else(|| {
                    grouped.epochs.push(EpochVisits {
                        study_epoch_uid: visit.study_epoch_uid.clone(),
                        groups: Vec::new(),
                    });
                    grouped.epochs.len() - 1
                });

            let epoch = &mut grouped.epochs[epoch_index];
            match epoch.groups.iter_mut().find(|group| group.key == key) {
                Some(group) => group.visits.push(visit),
                None => epoch.groups.push(VisitGroup {
                    key,
                    visits: vec![visit],
                }),
            }
        }

        grouped
    }

    pub fn epochs(&self) -> &[EpochVisits] {
        &self.epochs
    }

    /// All visit groups across epochs, in column order.
    pub fn visit_groups(&self) -> impl Iterator<Item = &VisitGroup> {
        self.epochs.iter().flat_map(|epoch| epoch.groups.iter())
    }

    /// Number of data columns the visits occupy.
    pub fn num_groups(&self) -> usize {
        self.epochs.iter().map(|epoch| epoch.groups.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::GroupedVisits;
    use crate::model::fixtures;

    #[test]
    fn buckets_by_epoch_then_consecutive_group() {
        let visits = vec![
            fixtures::visit("V3", "E2", 3),
            fixtures::visit("V1", "E1", 1),
            fixtures::grouped_visit("V4", "E2", 4, "Wk 4-5"),
            fixtures::grouped_visit("V5", "E2", 5, "Wk 4-5"),
            fixtures::visit("V2", "E1", 2),
        ];

        let grouped = GroupedVisits::group_visits(visits, true);

        let epochs = grouped
            .epochs()
            .iter()
            .map(|epoch| epoch.study_epoch_uid().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(epochs, vec!["E1", "E2"]);

        let keys = grouped.visit_groups().map(|g| g.key().to_owned()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["V1", "V2", "V3", "Wk 4-5"]);

        assert_eq!(grouped.num_groups(), 4);
        let merged = grouped.visit_groups().last().expect("group");
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.lead().uid, "V4");
        assert_eq!(merged.last().uid, "V5");
    }

    #[test]
    fn collapse_disabled_gives_every_visit_its_own_column() {
        let visits = vec![
            fixtures::grouped_visit("V1", "E1", 1, "Wk 1-2"),
            fixtures::grouped_visit("V2", "E1", 2, "Wk 1-2"),
        ];

        let grouped = GroupedVisits::group_visits(visits, false);

        let keys = grouped.visit_groups().map(|g| g.key().to_owned()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["V1", "V2"]);
        assert!(grouped.visit_groups().all(|g| g.len() == 1));
    }

    #[test]
    fn grouping_twice_yields_structurally_equal_results() {
        let visits = vec![
            fixtures::visit("V2", "E1", 2),
            fixtures::grouped_visit("V3", "E2", 3, "Wk 3-4"),
            fixtures::grouped_visit("V4", "E2", 4, "Wk 3-4"),
            fixtures::visit("V1", "E1", 1),
        ];

        let first = GroupedVisits::group_visits(visits.clone(), true);
        let second = GroupedVisits::group_visits(visits, true);

        assert_eq!(first, second);
    }
}
