// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for hosted language-model completion.

use async_trait::async_trait;

use crate::error::MinutaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse};

/// Adapter for LLM completion APIs.
///
/// Implementations own their retry policy: an `Err` from `complete` means
/// every permitted attempt has already failed.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends the ordered conversation and returns the generated reply.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, MinutaError>;
}
