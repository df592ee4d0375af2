// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech adapter returning canned audio bytes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use minuta_core::{AdapterType, MinutaError, SpeechAdapter, SpeechOutput};

use crate::mock_adapter;

#[derive(Debug, Clone, Default)]
pub struct MockSpeech {
    calls: Arc<AtomicUsize>,
    failing: bool,
}

impl MockSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

mock_adapter!(MockSpeech, "mock-speech", AdapterType::Speech);

#[async_trait]
impl SpeechAdapter for MockSpeech {
    async fn synthesize(&self, text: &str) -> Result<SpeechOutput, MinutaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(MinutaError::Speech("mock speech configured to fail".into()));
        }
        let mut audio = b"RIFF".to_vec();
        audio.extend_from_slice(text.as_bytes());
        Ok(SpeechOutput {
            audio,
            format: "wav".to_string(),
        })
    }
}
