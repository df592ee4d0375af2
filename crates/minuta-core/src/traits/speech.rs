// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-to-speech adapter trait.

use async_trait::async_trait;

use crate::error::MinutaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::SpeechOutput;

#[async_trait]
pub trait SpeechAdapter: PluginAdapter {
    /// Synthesizes the given text into audio.
    async fn synthesize(&self, text: &str) -> Result<SpeechOutput, MinutaError>;
}
