// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Shared ONNX Runtime session + tokenizer
//!
//! Both the sentence embedding model and the cross-encoder feed the same
//! BERT-style inputs (`input_ids`, `attention_mask`, optionally
//! `token_type_ids`) into an ONNX graph. This module owns the session,
//! tokenizer setup, batch padding and the locked `run` call.

use anyhow::{anyhow, Context, Result};
use ndarray::{Array2, ArrayD};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionInputValue};
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{EncodeInput, Encoding, Tokenizer, TruncationParams};
use tracing::{debug, info};

/// Knobs shared by every ONNX-backed model
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Maximum tokens per sequence (or per pair) after truncation
    pub max_length: usize,
    /// Number of texts/pairs per session run
    pub batch_size: usize,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_length: 512,
            batch_size: 32,
            intra_threads: 4,
        }
    }
}

/// Token ids of one sequence, borrowed from a tokenizer `Encoding`
#[derive(Debug, Clone, Copy)]
pub struct TokenizedInput<'a> {
    pub ids: &'a [u32],
    pub type_ids: &'a [u32],
    pub attention_mask: &'a [u32],
}

impl<'a> From<&'a Encoding> for TokenizedInput<'a> {
    fn from(encoding: &'a Encoding) -> Self {
        Self {
            ids: encoding.get_ids(),
            type_ids: encoding.get_type_ids(),
            attention_mask: encoding.get_attention_mask(),
        }
    }
}

/// Right-padded `[batch, max_len]` input tensors
#[derive(Debug, Clone)]
pub struct EncodedBatch {
    pub input_ids: Array2<i64>,
    pub attention_mask: Array2<i64>,
    pub token_type_ids: Array2<i64>,
}

impl EncodedBatch {
    /// Pads every sequence to the longest one in the batch
    ///
    /// Padding positions get `pad_id`, attention mask 0 and type id 0.
    pub fn pad(inputs: &[TokenizedInput<'_>], pad_id: u32) -> Result<Self> {
        let batch = inputs.len();
        let max_len = inputs.iter().map(|input| input.ids.len()).max().unwrap_or(0);

        let mut input_ids = Vec::with_capacity(batch * max_len);
        let mut attention_mask = Vec::with_capacity(batch * max_len);
        let mut token_type_ids = Vec::with_capacity(batch * max_len);

        for input in inputs {
            let padding = max_len - input.ids.len();

            input_ids.extend(input.ids.iter().map(|&id| id as i64));
            input_ids.extend(std::iter::repeat(pad_id as i64).take(padding));

            attention_mask.extend(input.attention_mask.iter().map(|&m| m as i64));
            attention_mask.extend(std::iter::repeat(0i64).take(padding));

            token_type_ids.extend(input.type_ids.iter().map(|&t| t as i64));
            token_type_ids.extend(std::iter::repeat(0i64).take(padding));
        }

        Ok(Self {
            input_ids: Array2::from_shape_vec((batch, max_len), input_ids)
                .context("Failed to create input_ids array")?,
            attention_mask: Array2::from_shape_vec((batch, max_len), attention_mask)
                .context("Failed to create attention_mask array")?,
            token_type_ids: Array2::from_shape_vec((batch, max_len), token_type_ids)
                .context("Failed to create token_type_ids array")?,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.input_ids.nrows()
    }
}

/// ONNX Runtime session paired with its tokenizer
///
/// `Session::run` needs exclusive access, so the session sits behind a
/// mutex and concurrent callers are serialized. Cloning is cheap.
#[derive(Clone)]
pub struct OnnxSession {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    pad_id: u32,
    uses_token_type_ids: bool,
}

impl std::fmt::Debug for OnnxSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxSession")
            .field("pad_id", &self.pad_id)
            .field("uses_token_type_ids", &self.uses_token_type_ids)
            .finish_non_exhaustive()
    }
}

impl OnnxSession {
    /// Loads the ONNX graph and tokenizer from disk
    ///
    /// # Errors
    /// Returns error if either file is missing or invalid, or if ONNX
    /// Runtime fails to initialize.
    pub fn load(model_path: &Path, tokenizer_path: &Path, options: &LoadOptions) -> Result<Self> {
        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        let session = build_session(model_path, options.intra_threads)?;

        let uses_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;

        let pad_id = tokenizer
            .get_padding()
            .map(|padding| padding.pad_id)
            .or_else(|| tokenizer.token_to_id("[PAD]"))
            .or_else(|| tokenizer.token_to_id("<pad>"))
            .unwrap_or(0);

        // Padding is done per batch in EncodedBatch::pad
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: options.max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;

        debug!(
            pad_id,
            uses_token_type_ids,
            max_length = options.max_length,
            "Tokenizer configured"
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            pad_id,
            uses_token_type_ids,
        })
    }

    /// Tokenizes a batch of single texts or `(text, text)` pairs
    pub fn encode<'s, E>(&self, inputs: Vec<E>) -> Result<EncodedBatch>
    where
        E: Into<EncodeInput<'s>> + Send,
    {
        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        let tokenized: Vec<TokenizedInput<'_>> = encodings.iter().map(TokenizedInput::from).collect();
        EncodedBatch::pad(&tokenized, self.pad_id)
    }

    /// Runs the graph and returns its first output as an owned array
    pub fn run(&self, batch: &EncodedBatch) -> Result<ArrayD<f32>> {
        let mut inputs: Vec<(&str, SessionInputValue<'_>)> = vec![
            ("input_ids", Value::from_array(batch.input_ids.clone())?.into()),
            (
                "attention_mask",
                Value::from_array(batch.attention_mask.clone())?.into(),
            ),
        ];
        if self.uses_token_type_ids {
            inputs.push((
                "token_type_ids",
                Value::from_array(batch.token_type_ids.clone())?.into(),
            ));
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("ONNX session lock poisoned"))?;
        let outputs = session.run(inputs)?;

        // Different exports name their outputs differently; index 0 is the
        // hidden state (embedders) or the logits (cross-encoders).
        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        Ok(output.to_owned())
    }
}

#[cfg(feature = "cuda")]
fn build_session(model_path: &Path, intra_threads: usize) -> Result<Session> {
    use ort::execution_providers::CUDAExecutionProvider;
    use tracing::warn;

    info!("Attempting CUDA execution provider...");
    let cuda_result = Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([CUDAExecutionProvider::default().build()])
        .context("Failed to set CUDA execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(intra_threads)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path);

    match cuda_result {
        Ok(session) => {
            info!("CUDA execution provider initialized");
            Ok(session)
        }
        Err(e) => {
            warn!("CUDA execution provider failed: {}", e);
            warn!("Falling back to CPU execution provider");
            build_cpu_session(model_path, intra_threads)
        }
    }
}

#[cfg(not(feature = "cuda"))]
fn build_session(model_path: &Path, intra_threads: usize) -> Result<Session> {
    build_cpu_session(model_path, intra_threads)
}

fn build_cpu_session(model_path: &Path, intra_threads: usize) -> Result<Session> {
    let session = Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([CPUExecutionProvider::default().build()])
        .context("Failed to set CPU execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(intra_threads)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

    info!(
        model = %model_path.display(),
        intra_threads,
        "ONNX session created on CPU execution provider"
    );
    Ok(session)
}
