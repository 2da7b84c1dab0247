// SPDX-FileCopyrightText: 2026 The Soteria Authors
// SPDX-License-Identifier: Apache-2.0

//! Read-only derived views over the selection snapshot.

pub mod coordinates;

pub use coordinates::item_uid_coordinates;
