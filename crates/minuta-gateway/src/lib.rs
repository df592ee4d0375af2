// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat service and HTTP API.
//!
//! [`ChatService`] runs a single chat turn end to end; the axum router in
//! [`server`] exposes it together with session listing, history and
//! deletion, and serves synthesized audio.

pub mod chat;
pub mod handlers;
pub mod server;
pub mod session;

pub use chat::{ChatOutcome, ChatService, ChatSettings, ReplySource};
pub use server::{router, serve, AppState};
pub use session::new_session_id;
