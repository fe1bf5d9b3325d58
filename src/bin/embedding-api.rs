// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use rag_model_api::cli::{init_tracing, run, ServeArgs, Service};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();
    init_tracing();

    let args = ServeArgs::parse();

    if let Err(e) = run(Service::Embedding, args).await {
        tracing::error!("{} failed: {:#}", Service::Embedding.title(), e);
        std::process::exit(1);
    }
    Ok(())
}
