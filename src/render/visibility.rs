// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

//! Row-visibility passes of the protocol layout: up-propagation of hidden
//! rows' content, removal of hidden rows, and the inverse un-hide used by
//! other layouts.

use crate::model::{RefKind, TableRow, TableWithFootnotes};

/// Copies each hidden activity row's cell texts into its nearest visible
/// ancestor row (subgroup preferred, then group, then SoA group), so
/// check-marks bubble up into the collapsed group header.
///
/// A single forward pass tracks the current row of each grouping level by the
/// first cell's first ref kind. Ancestor cells are only written when empty;
/// existing content is never overwritten. With `propagate_refs`, the hidden
/// row's refs are appended to the ancestor cell's refs as well.
///
/// Must run before [`remove_hidden_rows`], or the copied-up content is lost.
pub fn propagate_hidden_rows(rows: &mut [TableRow], propagate_refs: bool) {
    let mut soa_group_row: Option<usize> = None;
    let mut activity_group_row: Option<usize> = None;
    let mut activity_subgroup_row: Option<usize> = None;

    for index in 0..rows.len() {
        let Some(first_ref_kind) = rows[index]
            .cells
            .first()
            .and_then(|cell| cell.refs.first())
            .map(|r| r.kind)
        else {
            continue;
        };

        match first_ref_kind {
            RefKind::StudySoaGroup => {
                soa_group_row = Some(index);
                activity_group_row = None;
                activity_subgroup_row = None;
            }
            RefKind::StudyActivityGroup => {
                activity_group_row = Some(index);
                activity_subgroup_row = None;
            }
            RefKind::StudyActivitySubGroup => {
                activity_subgroup_row = Some(index);
            }
            RefKind::StudyActivity if rows[index].hide => {
                let target = [activity_subgroup_row, activity_group_row, soa_group_row]
                    .into_iter()
                    .flatten()
                    .find(|&candidate| !rows[candidate].hide);

                let Some(target) = target else {
                    continue;
                };
                if rows[target].cells.len() != rows[index].cells.len() {
                    continue;
                }

                // Ancestor rows always precede the hidden activity row.
                let (head, tail) = rows.split_at_mut(index);
                let ancestor = &mut head[target];
                let hidden = &tail[0];

                for (column, cell) in hidden.cells.iter().enumerate().skip(1) {
                    let ancestor_cell = &mut ancestor.cells[column];
                    if ancestor_cell.text.is_empty() {
                        ancestor_cell.text = cell.text.clone();
                    }
                    if propagate_refs && !cell.refs.is_empty() {
                        ancestor_cell.refs.extend(cell.refs.iter().cloned());
                    }
                }
            }
            _ => {}
        }
    }
}

/// Drops hidden rows in place, decrementing the header-row count by however
/// many of them were header rows.
pub fn remove_hidden_rows(table: &mut TableWithFootnotes) {
    let hidden_header_rows = table
        .rows
        .iter()
        .take(table.num_header_rows)
        .filter(|row| row.hide)
        .count();

    table.rows.retain(|row| !row.hide);
    table.num_header_rows -= hidden_header_rows;
}

/// Un-hides every row in place (detailed/operational presentation).
pub fn show_hidden_rows(rows: &mut [TableRow]) {
    for row in rows {
        row.hide = false;
    }
}

#[cfg(test)]
mod tests {
    use super::{propagate_hidden_rows, remove_hidden_rows};
    use crate::model::{CellStyle, Ref, RefKind, TableCell, TableRow, TableWithFootnotes};

    fn labeled_row(kind: RefKind, uid: &str, data_texts: &[&str], hide: bool) -> TableRow {
        let mut cells = vec![TableCell::with_refs(uid, CellStyle::Activity, vec![Ref::new(kind, uid)])];
        cells.extend(data_texts.iter().map(|text| TableCell {
            text: (*text).to_owned(),
            ..TableCell::default()
        }));
        TableRow::new(cells).hidden(hide)
    }

    #[test]
    fn propagation_prefers_the_nearest_visible_ancestor() {
        let mut rows = vec![
            labeled_row(RefKind::StudySoaGroup, "SG", &["", ""], false),
            labeled_row(RefKind::StudyActivityGroup, "G", &["", ""], false),
            labeled_row(RefKind::StudyActivitySubGroup, "SUB", &["", ""], false),
            labeled_row(RefKind::StudyActivity, "SA", &["X", ""], true),
        ];

        propagate_hidden_rows(&mut rows, false);

        assert_eq!(rows[2].cells[1].text, "X");
        assert_eq!(rows[1].cells[1].text, "");
        assert_eq!(rows[0].cells[1].text, "");
    }

    #[test]
    fn propagation_skips_hidden_ancestors() {
        let mut rows = vec![
            labeled_row(RefKind::StudySoaGroup, "SG", &["", ""], false),
            labeled_row(RefKind::StudyActivityGroup, "G", &["", ""], true),
            labeled_row(RefKind::StudyActivitySubGroup, "SUB", &["", ""], true),
            labeled_row(RefKind::StudyActivity, "SA", &["X", ""], true),
        ];

        propagate_hidden_rows(&mut rows, false);

        assert_eq!(rows[0].cells[1].text, "X");
    }

    #[test]
    fn propagation_never_overwrites_existing_content_and_appends_refs() {
        let mut rows = vec![
            labeled_row(RefKind::StudyActivitySubGroup, "SUB", &["Y", ""], false),
            labeled_row(RefKind::StudyActivity, "SA1", &["X", "X"], true),
        ];
        rows[1].cells[2].refs = vec![Ref::new(RefKind::StudyActivitySchedule, "SCH_1")];

        propagate_hidden_rows(&mut rows, true);

        // Column 1 already had content; only column 2 is written.
        assert_eq!(rows[0].cells[1].text, "Y");
        assert_eq!(rows[0].cells[2].text, "X");
        assert_eq!(
            rows[0].cells[2].refs,
            vec![Ref::new(RefKind::StudyActivitySchedule, "SCH_1")]
        );
    }

    #[test]
    fn visible_activity_rows_do_not_propagate() {
        let mut rows = vec![
            labeled_row(RefKind::StudyActivitySubGroup, "SUB", &[""], false),
            labeled_row(RefKind::StudyActivity, "SA1", &["X"], false),
        ];

        propagate_hidden_rows(&mut rows, false);

        assert_eq!(rows[0].cells[1].text, "");
    }

    #[test]
    fn removal_drops_hidden_rows_and_adjusts_header_count() {
        let mut table = TableWithFootnotes {
            rows: vec![
                TableRow::new(vec![TableCell::default()]).hidden(true),
                TableRow::new(vec![TableCell::default()]),
                TableRow::new(vec![TableCell::default()]).hidden(true),
                TableRow::new(vec![TableCell::default()]),
            ],
            num_header_rows: 2,
            num_header_cols: 1,
            title: String::new(),
            footnotes: Default::default(),
        };

        remove_hidden_rows(&mut table);

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.num_header_rows, 1);
    }
}
