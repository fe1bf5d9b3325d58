// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::{ModelError, ModelFiles, ModelRole, POOLING_CONFIG_FILE, ROOT_ONNX_FILE, TOKENIZER_FILE};
use hf_hub::api::tokio::{ApiBuilder, ApiRepo};
use hf_hub::{Repo, RepoType};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Downloads (or reuses cached) model files from the HuggingFace Hub
///
/// Honors the usual `HF_HOME` cache location. The pooling config is only
/// requested for embedders and is optional; its absence is logged and ignored.
pub async fn fetch_from_hub(
    repo_id: &str,
    revision: &str,
    onnx_file: &str,
    role: ModelRole,
) -> Result<ModelFiles, ModelError> {
    info!("Fetching model {}@{} from HuggingFace Hub", repo_id, revision);

    let api = ApiBuilder::new()
        .with_progress(false)
        .build()
        .map_err(|e| ModelError::HubClient(e.to_string()))?;
    let repo = api.repo(Repo::with_revision(
        repo_id.to_string(),
        RepoType::Model,
        revision.to_string(),
    ));

    let download_err = |file: &str, e: hf_hub::api::tokio::ApiError| ModelError::Download {
        repo_id: repo_id.to_string(),
        revision: revision.to_string(),
        file: file.to_string(),
        message: e.to_string(),
    };

    let model_path = match repo.get(onnx_file).await {
        Ok(path) => path,
        Err(e) if onnx_file != ROOT_ONNX_FILE => {
            warn!("{} not available ({}), trying {}", onnx_file, e, ROOT_ONNX_FILE);
            repo.get(ROOT_ONNX_FILE)
                .await
                .map_err(|e| download_err(ROOT_ONNX_FILE, e))?
        }
        Err(e) => return Err(download_err(onnx_file, e)),
    };

    let tokenizer_path = repo
        .get(TOKENIZER_FILE)
        .await
        .map_err(|e| download_err(TOKENIZER_FILE, e))?;

    let pooling_config = if role.uses_pooling_config() {
        optional_file(&repo, POOLING_CONFIG_FILE).await
    } else {
        None
    };

    Ok(ModelFiles {
        model_path,
        tokenizer_path,
        pooling_config,
    })
}

async fn optional_file(repo: &ApiRepo, file: &str) -> Option<PathBuf> {
    match repo.get(file).await {
        Ok(path) => Some(path),
        Err(e) => {
            debug!("Optional file {} not available: {}", file, e);
            None
        }
    }
}
