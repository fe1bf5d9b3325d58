// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Model file resolution
//!
//! `MODEL_NAME` either points at a local directory laid out like a
//! HuggingFace repository, or is a Hub repo id fetched through `hf-hub`
//! (reusing the local HF cache when the files are already there).

pub mod downloading;

pub use downloading::fetch_from_hub;

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Tokenizer file expected next to the ONNX graph
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// sentence-transformers pooling config (embedding models only)
pub const POOLING_CONFIG_FILE: &str = "1_Pooling/config.json";

/// Fallback location of the ONNX graph at the repository root
pub const ROOT_ONNX_FILE: &str = "model.onnx";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to initialize HuggingFace Hub client: {0}")]
    HubClient(String),

    #[error("Failed to fetch {file} from {repo_id}@{revision}: {message}")]
    Download {
        repo_id: String,
        revision: String,
        file: String,
        message: String,
    },
}

/// Where the model files come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    LocalDir(PathBuf),
    Hub { repo_id: String, revision: String },
}

impl ModelSource {
    /// Existing directories are local models, anything else is a Hub repo id
    pub fn parse(model_name: &str, revision: &str) -> Self {
        let path = Path::new(model_name);
        if path.is_dir() {
            ModelSource::LocalDir(path.to_path_buf())
        } else {
            ModelSource::Hub {
                repo_id: model_name.to_string(),
                revision: revision.to_string(),
            }
        }
    }
}

/// What the resolved files will be loaded as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    Embedder,
    CrossEncoder,
}

impl ModelRole {
    /// Only sentence embedders read `1_Pooling/config.json`
    pub fn uses_pooling_config(self) -> bool {
        matches!(self, ModelRole::Embedder)
    }
}

/// Paths of everything needed to build a model
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub pooling_config: Option<PathBuf>,
}

/// Resolves the ONNX graph, tokenizer and, for embedders, the optional
/// pooling config
///
/// `onnx_file` is tried first, then `model.onnx` at the root.
pub async fn resolve_model_files(
    source: &ModelSource,
    onnx_file: &str,
    role: ModelRole,
) -> Result<ModelFiles, ModelError> {
    let files = match source {
        ModelSource::LocalDir(dir) => resolve_local(dir, onnx_file, role)?,
        ModelSource::Hub { repo_id, revision } => {
            fetch_from_hub(repo_id, revision, onnx_file, role).await?
        }
    };

    info!(
        model = %files.model_path.display(),
        tokenizer = %files.tokenizer_path.display(),
        pooling_config = ?files.pooling_config,
        "Resolved model files"
    );
    Ok(files)
}

fn resolve_local(dir: &Path, onnx_file: &str, role: ModelRole) -> Result<ModelFiles, ModelError> {
    let model_path = [dir.join(onnx_file), dir.join(ROOT_ONNX_FILE)]
        .into_iter()
        .find(|path| path.is_file())
        .ok_or_else(|| ModelError::FileNotFound(dir.join(onnx_file)))?;

    let tokenizer_path = dir.join(TOKENIZER_FILE);
    if !tokenizer_path.is_file() {
        return Err(ModelError::FileNotFound(tokenizer_path));
    }

    let pooling_config = Some(dir.join(POOLING_CONFIG_FILE))
        .filter(|path| role.uses_pooling_config() && path.is_file());

    Ok(ModelFiles {
        model_path,
        tokenizer_path,
        pooling_config,
    })
}
