// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed statements, one module per table.

pub mod attribution;
pub mod records;
pub mod schedules;
