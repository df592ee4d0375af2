// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ONNX Runtime session plus tokenizer, shared by the embedder and the cross-encoder.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;
use tokenizers::{EncodeInput, Encoding, Tokenizer, TruncationParams};

use minuta_core::MinutaError;

/// Longest token sequence fed to the BERT-style models.
const MAX_SEQUENCE_TOKENS: usize = 512;

/// A loaded BERT-style model: `model.onnx` and `tokenizer.json` from one directory.
pub(crate) struct OnnxModel {
    /// ONNX Runtime session (not Send, wrapped in Mutex).
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

// Safety: the session is only reached through the Mutex; the tokenizer is
// only used for `&self` encoding.
unsafe impl Send for OnnxModel {}
unsafe impl Sync for OnnxModel {}

impl OnnxModel {
    pub(crate) fn load(model_dir: &Path) -> Result<Self, MinutaError> {
        let tokenizer_path = model_dir.join("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            MinutaError::Embedding(format!(
                "failed to load tokenizer from {}: {e}",
                tokenizer_path.display()
            ))
        })?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_TOKENS,
                ..TruncationParams::default()
            }))
            .map_err(|e| MinutaError::Embedding(format!("failed to configure truncation: {e}")))?;

        let model_path = model_dir.join("model.onnx");
        let session = Session::builder()
            .map_err(|e| MinutaError::Embedding(format!("failed to create ONNX session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| MinutaError::Embedding(format!("failed to set optimization level: {e}")))?
            .with_intra_threads(1)
            .map_err(|e| MinutaError::Embedding(format!("failed to set thread count: {e}")))?
            .commit_from_file(&model_path)
            .map_err(|e| {
                MinutaError::Embedding(format!(
                    "failed to load ONNX model from {}: {e}",
                    model_path.display()
                ))
            })?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    pub(crate) fn encode<'s, E>(&self, input: E) -> Result<Encoding, MinutaError>
    where
        E: Into<EncodeInput<'s>>,
    {
        self.tokenizer
            .encode(input, true)
            .map_err(|e| MinutaError::Embedding(format!("tokenization failed: {e}")))
    }

    /// Runs one encoded sequence and hands the first output tensor's shape and
    /// data to `read`.
    pub(crate) fn infer<T>(
        &self,
        encoding: &Encoding,
        read: impl FnOnce(&[i64], &[f32]) -> T,
    ) -> Result<T, MinutaError> {
        let seq_len = encoding.get_ids().len();
        let input_ids = as_tensor(encoding.get_ids(), seq_len, "input_ids")?;
        let attention_mask = as_tensor(encoding.get_attention_mask(), seq_len, "attention_mask")?;
        let token_type_ids = as_tensor(encoding.get_type_ids(), seq_len, "token_type_ids")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| MinutaError::Embedding(format!("ONNX session lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => tensor_ref(&input_ids)?,
                "attention_mask" => tensor_ref(&attention_mask)?,
                "token_type_ids" => tensor_ref(&token_type_ids)?
            ])
            .map_err(|e| MinutaError::Embedding(format!("ONNX inference failed: {e}")))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| MinutaError::Embedding(format!("failed to extract output tensor: {e}")))?;
        let dims: Vec<i64> = shape.iter().copied().collect();
        Ok(read(&dims, data))
    }

    pub(crate) fn is_available(&self) -> bool {
        self.session.lock().is_ok()
    }
}

fn as_tensor(values: &[u32], seq_len: usize, name: &str) -> Result<Array2<i64>, MinutaError> {
    let values: Vec<i64> = values.iter().map(|&v| i64::from(v)).collect();
    Array2::from_shape_vec((1, seq_len), values)
        .map_err(|e| MinutaError::Embedding(format!("failed to shape {name} tensor: {e}")))
}

fn tensor_ref(array: &Array2<i64>) -> Result<TensorRef<'_, i64>, MinutaError> {
    TensorRef::from_array_view(array)
        .map_err(|e| MinutaError::Embedding(format!("failed to create input tensor: {e}")))
}
