// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

//! Grouping & sort engine: deterministic arrangement of activities and visits
//! ahead of rendering.

pub mod activities;
pub mod visits;

pub use activities::sort_activity_selections;
pub use visits::{EpochVisits, GroupedVisits, VisitGroup};
