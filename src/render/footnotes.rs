// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeSet, HashMap};

use crate::model::{FootnoteMap, SimpleFootnote, StudySoaFootnote, TableWithFootnotes};

/// Footnote symbol for a 0-based index: `a`, `b`, …, `z`, `aa`, `ab`, …
pub fn footnote_symbol(index: usize) -> String {
    let mut index = index;
    let mut symbol = String::new();
    loop {
        symbol.insert(0, (b'a' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    symbol
}

/// Attaches footnote symbols to every cell whose refs intersect a footnote's
/// referenced items, and records the symbol → footnote mapping on the table.
///
/// Footnotes must arrive in their explicit order; symbols are assigned by
/// that order. Per cell, symbols are the union of pre-existing markers and
/// the matches, sorted lexically.
pub fn attach_footnotes(table: &mut TableWithFootnotes, footnotes: &[StudySoaFootnote]) {
    let mut symbols_by_ref_uid = HashMap::<&str, Vec<String>>::new();
    let mut footnote_map = FootnoteMap::new();

    for (index, footnote) in footnotes.iter().enumerate() {
        let symbol = footnote_symbol(index);
        footnote_map.insert(
            symbol.clone(),
            SimpleFootnote {
                uid: footnote.uid.clone(),
                text_html: footnote.text_html.clone(),
                text_plain: footnote.text_plain.clone(),
            },
        );

        for item in &footnote.referenced_items {
            symbols_by_ref_uid
                .entry(item.item_uid.as_str())
                .or_default()
                .push(symbol.clone());
        }
    }

    for row in &mut table.rows {
        for cell in &mut row.cells {
            let mut symbols: BTreeSet<String> = cell.footnotes.take().unwrap_or_default().into_iter().collect();
            for cell_ref in &cell.refs {
                if let Some(matches) = symbols_by_ref_uid.get(cell_ref.uid.as_str()) {
                    symbols.extend(matches.iter().cloned());
                }
            }
            cell.footnotes = if symbols.is_empty() {
                None
            } else {
                Some(symbols.into_iter().collect())
            };
        }
    }

    table.footnotes = footnote_map;
}

#[cfg(test)]
mod tests {
    use super::footnote_symbol;
    use rstest::rstest;

    #[rstest]
    #[case(0, "a")]
    #[case(1, "b")]
    #[case(25, "z")]
    #[case(26, "aa")]
    #[case(27, "ab")]
    #[case(51, "az")]
    #[case(52, "ba")]
    #[case(701, "zz")]
    #[case(702, "aaa")]
    fn symbols_follow_the_letter_sequence(#[case] index: usize, #[case] expected: &str) {
        assert_eq!(footnote_symbol(index), expected);
    }
}
