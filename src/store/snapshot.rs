// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::labels;
use crate::model::snapshot::{EPOCH_HEADER_ROW, VISIT_HEADER_ROW};
use crate::model::{
    ActivitySelection, CellStyle, FootnoteMap, Ref, RefKind, ReferencedItem, SimpleFootnote, SoaCellReference,
    SoaFootnoteReference, SoaItemType, SoaLayout, StudyActivityGroupSelection, StudyActivitySubGroupSelection,
    StudyEpoch, StudySoaFootnote, StudySoaGroupSelection, StudySoaPreferences, StudyVisit, TableCell, TableRow,
    TableWithFootnotes, TimeUnit,
};
use crate::render::flowchart::{
    self, activity_cell, activity_group_cell, activity_subgroup_cell, amend_procedure_label, soa_group_cell,
    visit_name_for_group, visit_timing_text, visit_window_text, NUM_OPERATIONAL_CODE_COLS, SOA_CHECK_MARK,
};

/// The durable encoding of a built SoA table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SoaSnapshot {
    pub cell_references: Vec<SoaCellReference>,
    pub footnote_references: Vec<SoaFootnoteReference>,
}

impl SoaSnapshot {
    pub fn is_empty(&self) -> bool {
        self.cell_references.is_empty()
    }
}

/// Extracts cell references from a built table.
///
/// Epoch references get row [`EPOCH_HEADER_ROW`], visit references
/// [`VISIT_HEADER_ROW`]; a grouped visit column emits one reference per
/// member visit at the same row/column. Data rows are indexed from 0 below
/// the header. Column 0 carries the row's identity reference; schedule
/// references in the data columns are tagged propagated when the row's label
/// is a group header (the check-mark bubbled up from a hidden row).
pub fn extract_soa_cell_refs(table: &TableWithFootnotes, layout: SoaLayout) -> Vec<SoaCellReference> {
    let mut references = Vec::<SoaCellReference>::new();

    let mut num_header_cols = table.num_header_cols;
    if layout == SoaLayout::Operational {
        num_header_cols += NUM_OPERATIONAL_CODE_COLS;
    }

    for row in table.header_rows() {
        for (column, cell) in row.cells.iter().skip(num_header_cols).enumerate() {
            let column = (column + 1) as i32;
            collect_cell_references(
                &mut references,
                EPOCH_HEADER_ROW,
                column,
                cell,
                &[SoaItemType::StudyEpoch],
                false,
            );
            collect_cell_references(
                &mut references,
                VISIT_HEADER_ROW,
                column,
                cell,
                &[SoaItemType::StudyVisit],
                false,
            );
        }
    }

    let mut label_types: SmallVec<[SoaItemType; 5]> = SmallVec::from_slice(&[
        SoaItemType::StudySoaGroup,
        SoaItemType::StudyActivityGroup,
        SoaItemType::StudyActivitySubGroup,
        SoaItemType::StudyActivity,
    ]);
    if layout == SoaLayout::Operational {
        label_types.push(SoaItemType::StudyActivityInstance);
    }

    for (row_index, row) in table.data_rows().iter().enumerate() {
        if let Some(label_cell) = row.cells.first() {
            collect_cell_references(&mut references, row_index as i32, 0, label_cell, &label_types, false);
        }

        let first_label_kind = row.cells.first().and_then(|cell| cell.refs.first()).map(|r| r.kind);
        let is_propagated = !matches!(
            first_label_kind,
            Some(RefKind::StudyActivity) | Some(RefKind::StudyActivityInstance)
        );

        for (column, cell) in row.cells.iter().skip(num_header_cols).enumerate() {
            collect_cell_references(
                &mut references,
                row_index as i32,
                (column + 1) as i32,
                cell,
                &[SoaItemType::StudyActivitySchedule],
                is_propagated,
            );
        }
    }

    references
}

fn collect_cell_references(
    references: &mut Vec<SoaCellReference>,
    row: i32,
    column: i32,
    cell: &TableCell,
    accepted: &[SoaItemType],
    is_propagated: bool,
) {
    if cell.refs.is_empty() {
        return;
    }

    let mut order = 0usize;
    let mut seen: SmallVec<[&Ref; 4]> = SmallVec::new();
    for cell_ref in &cell.refs {
        if seen.contains(&cell_ref) {
            continue;
        }
        seen.push(cell_ref);

        let Some(item_type) = cell_ref.kind.item_type() else {
            continue;
        };
        if !accepted.contains(&item_type) {
            continue;
        }

        references.push(SoaCellReference {
            row,
            column,
            span: cell.span,
            is_propagated,
            order,
            referenced_item: ReferencedItem::new(item_type, cell_ref.uid.clone()),
            footnote_references: None,
        });
        order += 1;
    }
}

/// Extracts one footnote reference per symbol, ordered by symbol assignment.
pub fn extract_soa_footnote_refs(table: &TableWithFootnotes) -> Vec<SoaFootnoteReference> {
    table
        .footnotes
        .iter()
        .enumerate()
        .map(|(order, (symbol, footnote))| SoaFootnoteReference {
            order,
            symbol: symbol.to_owned(),
            referenced_item: ReferencedItem::new(SoaItemType::StudySoaFootnote, footnote.uid.clone()),
        })
        .collect()
}

/// Point-in-time entity lookups the decoder resolves references against.
#[derive(Debug, Clone, Default)]
pub struct SnapshotLookups {
    pub visits_by_uid: HashMap<String, StudyVisit>,
    pub epochs_by_uid: HashMap<String, StudyEpoch>,
    pub soa_groups_by_uid: HashMap<String, StudySoaGroupSelection>,
    pub activity_groups_by_uid: HashMap<String, StudyActivityGroupSelection>,
    pub activity_subgroups_by_uid: HashMap<String, StudyActivitySubGroupSelection>,
    pub activities_by_uid: HashMap<String, ActivitySelection>,
    pub footnotes_by_uid: HashMap<String, StudySoaFootnote>,
}

impl SnapshotLookups {
    /// Indexes freshly fetched entity collections by their selection uids.
    /// Epoch lookups derive from the visits.
    pub fn assemble(
        visits: Vec<StudyVisit>,
        soa_groups: Vec<StudySoaGroupSelection>,
        activity_groups: Vec<StudyActivityGroupSelection>,
        activity_subgroups: Vec<StudyActivitySubGroupSelection>,
        activities: Vec<ActivitySelection>,
        footnotes: Vec<StudySoaFootnote>,
    ) -> Self {
        let epochs_by_uid = visits
            .iter()
            .map(|visit| (visit.study_epoch_uid.clone(), StudyEpoch::from_visit(visit)))
            .collect();

        Self {
            epochs_by_uid,
            visits_by_uid: visits.into_iter().map(|v| (v.uid.clone(), v)).collect(),
            soa_groups_by_uid: soa_groups
                .into_iter()
                .map(|g| (g.study_soa_group_uid.clone(), g))
                .collect(),
            activity_groups_by_uid: activity_groups
                .into_iter()
                .filter_map(|g| g.study_activity_group_uid.clone().map(|uid| (uid, g)))
                .collect(),
            activity_subgroups_by_uid: activity_subgroups
                .into_iter()
                .filter_map(|g| g.study_activity_subgroup_uid.clone().map(|uid| (uid, g)))
                .collect(),
            activities_by_uid: activities
                .into_iter()
                .map(|a| (a.study_activity_uid.clone(), a))
                .collect(),
            footnotes_by_uid: footnotes.into_iter().map(|f| (f.uid.clone(), f)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotDecodeError {
    /// The snapshot has no cell references, or its dimensions are zero.
    EmptySnapshot,
    /// A stored reference points at an entity absent from the fresh lookups.
    MissingReferencedItem { item_type: SoaItemType, uid: String },
    /// A SoA group row reference resolves to no group selection: the
    /// selection graph is inconsistent.
    InconsistentSoaGroup { uid: String },
}

impl fmt::Display for SnapshotDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySnapshot => f.write_str("snapshot has insufficient data to reconstruct a table"),
            Self::MissingReferencedItem { item_type, uid } => {
                write!(f, "snapshot references missing {item_type} with uid {uid:?}")
            }
            Self::InconsistentSoaGroup { uid } => {
                write!(f, "SoA group row reference {uid:?} resolves to no group selection")
            }
        }
    }
}

impl std::error::Error for SnapshotDecodeError {}

/// Reconstructs a table from a snapshot plus fresh entity lookups.
///
/// Header rows are replayed from the epoch/visit references (adjacent
/// same-epoch columns merge back into spanning cells, continuations get
/// `span = 0`). Data cells are re-rendered from the referenced entities; refs
/// and styles are attached only to non-propagated references so that
/// propagated check-marks keep the plain look the encode step captured.
pub fn decode_snapshot(
    snapshot: &SoaSnapshot,
    lookups: &SnapshotLookups,
    preferences: &StudySoaPreferences,
    layout: SoaLayout,
    time_unit: TimeUnit,
) -> Result<TableWithFootnotes, SnapshotDecodeError> {
    // Footnote symbols per referenced item uid, replaying the stored symbol
    // assignment over the fresh footnotes' referenced-item lists.
    let mut symbols_by_item_uid = HashMap::<&str, Vec<&str>>::new();
    for footnote_ref in &snapshot.footnote_references {
        let footnote = lookups
            .footnotes_by_uid
            .get(&footnote_ref.referenced_item.item_uid)
            .ok_or_else(|| SnapshotDecodeError::MissingReferencedItem {
                item_type: SoaItemType::StudySoaFootnote,
                uid: footnote_ref.referenced_item.item_uid.clone(),
            })?;
        for item in &footnote.referenced_items {
            symbols_by_item_uid
                .entry(item.item_uid.as_str())
                .or_default()
                .push(footnote_ref.symbol.as_str());
        }
    }

    let symbols_for = |uid: &str| -> Option<Vec<String>> {
        symbols_by_item_uid
            .get(uid)
            .filter(|symbols| !symbols.is_empty())
            .map(|symbols| symbols.iter().map(|s| (*s).to_owned()).collect())
    };

    // Partition references into epoch columns, visit columns and data cells.
    let mut epoch_references = BTreeMap::<usize, &SoaCellReference>::new();
    let mut visit_references = BTreeMap::<usize, Vec<&SoaCellReference>>::new();
    let mut cell_references = BTreeMap::<(usize, usize), Vec<&SoaCellReference>>::new();
    let mut num_rows = 0usize;
    let mut num_cols = 0usize;

    for reference in &snapshot.cell_references {
        num_rows = num_rows.max((reference.row + 1).max(0) as usize);
        num_cols = num_cols.max((reference.column + 1).max(0) as usize);

        let column = reference.column.max(0) as usize;
        match reference.referenced_item.item_type {
            SoaItemType::StudyEpoch => {
                epoch_references.insert(column, reference);
            }
            SoaItemType::StudyVisit => visit_references.entry(column).or_default().push(reference),
            _ => cell_references
                .entry((reference.row.max(0) as usize, column))
                .or_default()
                .push(reference),
        }
    }

    for references in visit_references.values_mut() {
        references.sort_by_key(|r| r.order);
    }
    for references in cell_references.values_mut() {
        references.sort_by_key(|r| r.order);
    }

    if num_rows == 0 || num_cols == 0 {
        return Err(SnapshotDecodeError::EmptySnapshot);
    }

    let mut table = TableWithFootnotes {
        rows: (0..num_rows)
            .map(|_| TableRow::new((0..num_cols).map(|_| TableCell::default()).collect()))
            .collect(),
        num_header_rows: 0,
        num_header_cols: 1,
        title: labels::PROTOCOL_FLOWCHART.to_owned(),
        footnotes: FootnoteMap::new(),
    };

    // Epoch header row: continuation cells by default, spanning cells where
    // an epoch reference starts a column run.
    let mut epoch_row = TableRow::new((0..num_cols).map(|_| TableCell::continuation()).collect());
    epoch_row.hide = !(layout == SoaLayout::Operational || preferences.show_epochs);
    epoch_row.cells[0] = TableCell::text(labels::STUDY_EPOCH, CellStyle::Header1);

    for (&column, reference) in &epoch_references {
        let epoch = lookups
            .epochs_by_uid
            .get(&reference.referenced_item.item_uid)
            .ok_or_else(|| SnapshotDecodeError::MissingReferencedItem {
                item_type: SoaItemType::StudyEpoch,
                uid: reference.referenced_item.item_uid.clone(),
            })?;

        epoch_row.cells[column] = TableCell {
            text: epoch.epoch_name.clone(),
            span: reference.span,
            style: Some(CellStyle::Header1),
            refs: vec![Ref::new(RefKind::StudyEpoch, epoch.uid.clone())],
            footnotes: symbols_for(&epoch.uid),
        };
        for offset in 1..reference.span {
            if let Some(cell) = epoch_row.cells.get_mut(column + offset) {
                cell.span = 0;
            }
        }
    }

    let mut milestone_row = TableRow::new((0..num_cols).map(|_| TableCell::default()).collect());
    milestone_row.hide = layout == SoaLayout::Operational || !preferences.show_milestones;
    milestone_row.cells[0] = TableCell::text(labels::STUDY_MILESTONE, CellStyle::Header1);

    let mut visit_row = TableRow::new((0..num_cols).map(|_| TableCell::default()).collect());
    visit_row.cells[0] = TableCell::text(labels::VISIT_SHORT_NAME, CellStyle::Header2);

    let timing_label = match time_unit {
        TimeUnit::Day => labels::STUDY_DAY,
        TimeUnit::Week => labels::STUDY_WEEK,
    };
    let mut timing_row = TableRow::new((0..num_cols).map(|_| TableCell::default()).collect());
    timing_row.cells[0] = TableCell::text(timing_label, CellStyle::Header3);
    let timing_field = flowchart::timing_field(time_unit, preferences);

    let mut window_row = TableRow::new((0..num_cols).map(|_| TableCell::default()).collect());
    let visit_window_unit = visit_references
        .values()
        .flatten()
        .next()
        .and_then(|reference| lookups.visits_by_uid.get(&reference.referenced_item.item_uid))
        .and_then(|visit| visit.visit_window_unit_name.clone())
        .unwrap_or_default();
    window_row.cells[0] = TableCell::text(labels::visit_window_label(&visit_window_unit), CellStyle::Header4);

    let mut prev_visit_type_uid: Option<String> = None;
    let mut prev_milestone_cell: Option<usize> = None;

    for (&column, references) in &visit_references {
        let mut visits_in_group = Vec::<StudyVisit>::with_capacity(references.len());
        for reference in references {
            let visit = lookups
                .visits_by_uid
                .get(&reference.referenced_item.item_uid)
                .ok_or_else(|| SnapshotDecodeError::MissingReferencedItem {
                    item_type: SoaItemType::StudyVisit,
                    uid: reference.referenced_item.item_uid.clone(),
                })?;
            visits_in_group.push(visit.clone());
        }
        let Some(visit) = visits_in_group.first() else {
            continue;
        };

        if visit.is_soa_milestone {
            if prev_visit_type_uid.as_deref() == Some(visit.visit_type_uid.as_str()) {
                if let Some(index) = prev_milestone_cell {
                    milestone_row.cells[index].span += 1;
                }
                milestone_row.cells[column].span = 0;
            } else {
                prev_visit_type_uid = Some(visit.visit_type_uid.clone());
                milestone_row.cells[column] = TableCell::text(visit.visit_type_name.clone(), CellStyle::Header1);
                prev_milestone_cell = Some(column);
            }
        }

        visit_row.cells[column] = TableCell {
            text: visit_name_for_group(visit, visits_in_group.len()),
            span: 1,
            style: Some(CellStyle::Header2),
            refs: references
                .iter()
                .map(|r| Ref::new(RefKind::StudyVisit, r.referenced_item.item_uid.clone()))
                .collect(),
            footnotes: symbols_for(&references[0].referenced_item.item_uid),
        };

        timing_row.cells[column] = TableCell::text(visit_timing_text(&visits_in_group, timing_field), CellStyle::Header3);
        window_row.cells[column] = TableCell::text(visit_window_text(visit), CellStyle::Header4);
    }

    // Data cells.
    for ((row_index, column), references) in &cell_references {
        let Some(first) = references.first() else {
            continue;
        };
        let item = &first.referenced_item;
        let row = &mut table.rows[*row_index];

        match item.item_type {
            SoaItemType::StudySoaGroup => {
                let soa_group = lookups
                    .soa_groups_by_uid
                    .get(&item.item_uid)
                    .ok_or_else(|| SnapshotDecodeError::InconsistentSoaGroup {
                        uid: item.item_uid.clone(),
                    })?;
                row.cells[*column] = soa_group_cell(soa_group);
                row.order = soa_group.order;
                row.level = Some(1);
            }
            SoaItemType::StudyActivityGroup => {
                let group = lookups
                    .activity_groups_by_uid
                    .get(&item.item_uid)
                    .ok_or_else(|| SnapshotDecodeError::MissingReferencedItem {
                        item_type: item.item_type,
                        uid: item.item_uid.clone(),
                    })?;
                row.cells[*column] = activity_group_cell(group);
                row.order = group.order;
                row.level = Some(2);
            }
            SoaItemType::StudyActivitySubGroup => {
                let subgroup = lookups
                    .activity_subgroups_by_uid
                    .get(&item.item_uid)
                    .ok_or_else(|| SnapshotDecodeError::MissingReferencedItem {
                        item_type: item.item_type,
                        uid: item.item_uid.clone(),
                    })?;
                row.cells[*column] = activity_subgroup_cell(subgroup);
                row.order = subgroup.order;
                row.level = Some(3);
            }
            SoaItemType::StudyActivity => {
                let activity = lookups
                    .activities_by_uid
                    .get(&item.item_uid)
                    .ok_or_else(|| SnapshotDecodeError::MissingReferencedItem {
                        item_type: item.item_type,
                        uid: item.item_uid.clone(),
                    })?;
                row.cells[*column] = activity_cell(activity);
                row.order = activity.order;
                row.level = Some(4);
            }
            SoaItemType::StudyActivitySchedule => {
                let cell = &mut row.cells[*column];
                cell.text = SOA_CHECK_MARK.to_owned();

                // Refs and style only for non-propagated check-marks, so the
                // reconstruction matches the post-propagation appearance.
                if !first.is_propagated {
                    cell.refs = vec![Ref::new(RefKind::StudyActivitySchedule, item.item_uid.clone())];
                    cell.style = Some(CellStyle::ActivitySchedule);
                }
            }
            SoaItemType::StudyEpoch | SoaItemType::StudyVisit | SoaItemType::StudySoaFootnote => {}
        }

        if !first.is_propagated {
            let extra_refs = references[1..]
                .iter()
                .map(|r| Ref::new(RefKind::from(r.referenced_item.item_type), r.referenced_item.item_uid.clone()))
                .collect::<Vec<_>>();

            let cell = &mut row.cells[*column];
            if !cell.refs.is_empty() {
                // Merged selection refs slot in after the identity ref.
                cell.refs.splice(1..1, extra_refs);
            } else if !extra_refs.is_empty() {
                cell.refs = extra_refs;
            }

            cell.footnotes = symbols_for(&item.item_uid);
        }
    }

    let header_rows = [epoch_row, milestone_row, visit_row, timing_row, window_row]
        .into_iter()
        .filter(|row| !row.hide)
        .collect::<Vec<_>>();
    table.num_header_rows = header_rows.len();
    table.rows.splice(0..0, header_rows);

    let mut footnote_map = FootnoteMap::new();
    for footnote_ref in &snapshot.footnote_references {
        let footnote = lookups
            .footnotes_by_uid
            .get(&footnote_ref.referenced_item.item_uid)
            .ok_or_else(|| SnapshotDecodeError::MissingReferencedItem {
                item_type: SoaItemType::StudySoaFootnote,
                uid: footnote_ref.referenced_item.item_uid.clone(),
            })?;
        footnote_map.insert(
            footnote_ref.symbol.clone(),
            SimpleFootnote {
                uid: footnote.uid.clone(),
                text_html: footnote.text_html.clone(),
                text_plain: footnote.text_plain.clone(),
            },
        );
    }
    table.footnotes = footnote_map;

    if layout == SoaLayout::Protocol {
        let num_header_rows = table.num_header_rows;
        amend_procedure_label(&mut table.rows[..num_header_rows]);
    }

    Ok(table)
}
