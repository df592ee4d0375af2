// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session identifiers and per-session file names.

use chrono::{DateTime, Utc};
use rand::Rng;

/// `<YYYYMMDDTHHMMSS>_session-<6 hex>` in UTC, e.g. `20260301T101500_session-a1b2c3`.
pub fn new_session_id() -> String {
    session_id_at(Utc::now(), rand::thread_rng().gen_range(0..0x100_0000))
}

fn session_id_at(now: DateTime<Utc>, suffix: u32) -> String {
    format!("{}_session-{:06x}", now.format("%Y%m%dT%H%M%S"), suffix & 0xff_ffff)
}

/// File name for synthesized audio: `<session>_<timestamp>.<format>`.
pub fn audio_file_name(session_id: &str, now: DateTime<Utc>, format: &str) -> String {
    format!("{session_id}_{}.{format}", now.format("%Y%m%dT%H%M%S%3f"))
}
