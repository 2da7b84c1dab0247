// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Service configuration. Injected explicitly; nothing in the crate reads
/// ambient/global settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoaConfig {
    /// Sponsor-preferred name of the synthetic "basic" epoch. Visits that
    /// belong to it are excluded from the flowchart build.
    pub basic_epoch_name: String,
}

impl Default for SoaConfig {
    fn default() -> Self {
        Self {
            basic_epoch_name: "Basic".to_owned(),
        }
    }
}
