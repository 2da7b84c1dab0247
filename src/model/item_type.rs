// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The kinds of study selection items a snapshot reference may point to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum SoaItemType {
    StudyEpoch,
    StudyVisit,
    StudySoaGroup,
    StudyActivityGroup,
    StudyActivitySubGroup,
    StudyActivity,
    StudyActivityInstance,
    StudyActivitySchedule,
    StudySoaFootnote,
}

impl SoaItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StudyEpoch => "StudyEpoch",
            Self::StudyVisit => "StudyVisit",
            Self::StudySoaGroup => "StudySoaGroup",
            Self::StudyActivityGroup => "StudyActivityGroup",
            Self::StudyActivitySubGroup => "StudyActivitySubGroup",
            Self::StudyActivity => "StudyActivity",
            Self::StudyActivityInstance => "StudyActivityInstance",
            Self::StudyActivitySchedule => "StudyActivitySchedule",
            Self::StudySoaFootnote => "StudySoaFootnote",
        }
    }
}

impl fmt::Display for SoaItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a [`crate::model::Ref`] points at. A superset of [`SoaItemType`]:
/// cells also reference library concepts (activities, groups, terms) that
/// never appear in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum RefKind {
    StudyEpoch,
    StudyVisit,
    StudySoaGroup,
    StudyActivityGroup,
    StudyActivitySubGroup,
    StudyActivity,
    StudyActivityInstance,
    StudyActivitySchedule,
    StudySoaFootnote,
    CtTerm,
    Activity,
    ActivityGroup,
    ActivitySubGroup,
}

impl RefKind {
    /// The snapshot item type this ref kind maps to, if any. Concept refs
    /// (`CtTerm`, `Activity`, …) have no snapshot counterpart.
    pub fn item_type(&self) -> Option<SoaItemType> {
        match self {
            Self::StudyEpoch => Some(SoaItemType::StudyEpoch),
            Self::StudyVisit => Some(SoaItemType::StudyVisit),
            Self::StudySoaGroup => Some(SoaItemType::StudySoaGroup),
            Self::StudyActivityGroup => Some(SoaItemType::StudyActivityGroup),
            Self::StudyActivitySubGroup => Some(SoaItemType::StudyActivitySubGroup),
            Self::StudyActivity => Some(SoaItemType::StudyActivity),
            Self::StudyActivityInstance => Some(SoaItemType::StudyActivityInstance),
            Self::StudyActivitySchedule => Some(SoaItemType::StudyActivitySchedule),
            Self::StudySoaFootnote => Some(SoaItemType::StudySoaFootnote),
            Self::CtTerm | Self::Activity | Self::ActivityGroup | Self::ActivitySubGroup => None,
        }
    }
}

impl From<SoaItemType> for RefKind {
    fn from(item_type: SoaItemType) -> Self {
        match item_type {
            SoaItemType::StudyEpoch => Self::StudyEpoch,
            SoaItemType::StudyVisit => Self::StudyVisit,
            SoaItemType::StudySoaGroup => Self::StudySoaGroup,
            SoaItemType::StudyActivityGroup => Self::StudyActivityGroup,
            SoaItemType::StudyActivitySubGroup => Self::StudyActivitySubGroup,
            SoaItemType::StudyActivity => Self::StudyActivity,
            SoaItemType::StudyActivityInstance => Self::StudyActivityInstance,
            SoaItemType::StudyActivitySchedule => Self::StudyActivitySchedule,
            SoaItemType::StudySoaFootnote => Self::StudySoaFootnote,
        }
    }
}

/// Rendering layout of the SoA table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SoaLayout {
    Protocol,
    Detailed,
    Operational,
}

impl SoaLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Protocol => "protocol",
            Self::Detailed => "detailed",
            Self::Operational => "operational",
        }
    }
}

impl fmt::Display for SoaLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preferred time unit for the timing header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Day,
    Week,
}

impl TimeUnit {
    /// Parses a stored time-unit name. Anything other than `day`/`week` is
    /// rejected by the caller as a validation failure.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}
