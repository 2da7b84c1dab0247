// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

//! Service orchestration: parameter validation, the concurrent read fan-out,
//! and the public SoA operations.

use std::fmt;

use crate::source::SourceError;
use crate::store::StoreError;

pub(crate) mod fetch;
pub mod service;

#[cfg(test)]
mod tests;

pub use service::SoaFlowchartService;

/// Errors of the SoA operation surface.
///
/// Validation failures are raised before any fetch; a fetch failure aborts
/// the whole build (no partial table); decode failures never yield a
/// partially populated table.
#[derive(Debug)]
pub enum SoaError {
    /// Bad request parameters: unknown study/version or an invalid time unit.
    Validation { message: String },
    /// A requested snapshot is absent, or a snapshot reference points at an
    /// entity that no longer exists.
    NotFound { message: String },
    /// The selection graph is inconsistent.
    BusinessRule { message: String },
    /// A collaborator read failed.
    Source { source: SourceError },
    /// Snapshot persistence failed.
    Store { source: StoreError },
}

impl fmt::Display for SoaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { message } => write!(f, "validation failed: {message}"),
            Self::NotFound { message } => write!(f, "not found: {message}"),
            Self::BusinessRule { message } => write!(f, "business rule violated: {message}"),
            Self::Source { source } => write!(f, "selection read failed: {source}"),
            Self::Store { source } => write!(f, "snapshot store failed: {source}"),
        }
    }
}

impl std::error::Error for SoaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation { .. } | Self::NotFound { .. } | Self::BusinessRule { .. } => None,
            Self::Source { source } => Some(source),
            Self::Store { source } => Some(source),
        }
    }
}

impl From<SourceError> for SoaError {
    fn from(source: SourceError) -> Self {
        Self::Source { source }
    }
}

impl From<StoreError> for SoaError {
    fn from(source: StoreError) -> Self {
        Self::Store { source }
    }
}
