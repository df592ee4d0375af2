// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the conversation store.

pub mod messages;
pub mod sessions;
