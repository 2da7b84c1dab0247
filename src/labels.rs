// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

//! Fixed label strings used in table cells. Kept in one place so a future
//! localization pass only touches this module.

pub(crate) const STUDY_EPOCH: &str = "";
pub(crate) const STUDY_MILESTONE: &str = "";
pub(crate) const PROCEDURE: &str = "Procedure";
pub(crate) const VISIT_SHORT_NAME: &str = "Visit short name";
pub(crate) const STUDY_WEEK: &str = "Study week";
pub(crate) const STUDY_DAY: &str = "Study day";
pub(crate) const PROTOCOL_FLOWCHART: &str = "Protocol Flowchart";
pub(crate) const NO_STUDY_GROUP: &str = "(not selected)";
pub(crate) const NO_STUDY_SUBGROUP: &str = "(not selected)";
pub(crate) const TOPIC_CODE: &str = "Topic Code";
pub(crate) const ADAM_PARAM_CODE: &str = "ADaM Param Code";

pub(crate) fn visit_window_label(unit_name: &str) -> String {
    format!("Visit window ({unit_name})")
}
