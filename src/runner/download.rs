//! The `download_file` task and the streaming helper it shares with
//! `download_github`

use crate::config::DownloadFileOptions;
use crate::error::{DeployError, ExecutionError, ValidationError};
use crate::runner::{DeploymentContext, Sandbox};
use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Stream the body of a GET request into `path`, replacing the file.
///
/// Returns the number of bytes written. The data is synced to disk before
/// this returns.
pub async fn stream_to_file(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
) -> Result<u64, DeployError> {
    let http_error = |e: reqwest::Error| ExecutionError::Http {
        url: url.to_string(),
        error: e.to_string(),
    };

    tracing::debug!(%url, "sending request");
    let response = client.get(url).send().await.map_err(http_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExecutionError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        }
        .into());
    }

    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(http_error)?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    file.sync_all().await?;

    Ok(written)
}

pub async fn download_file(
    options: &DownloadFileOptions,
    sandbox: &Sandbox,
    ctx: &mut DeploymentContext,
) -> Result<(), DeployError> {
    let url = options
        .url
        .as_deref()
        .ok_or(ValidationError::MissingOption("url"))?;
    let destination = options
        .destination
        .as_deref()
        .ok_or_else(|| ValidationError::MissingDestinationFilename(String::new()))?;
    let path = sandbox.resolve(destination);
    if path.file_name().is_none() || sandbox.is_base(&path) {
        return Err(ValidationError::MissingDestinationFilename(destination.to_string()).into());
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    // Claim the final path before the body arrives.
    tokio::fs::write(&path, ctx.settings.placeholder.as_bytes()).await?;

    let client = ctx.http_client()?;
    let bytes = stream_to_file(&client, url, &path).await?;
    tracing::info!(%url, path = %path.display(), bytes, "downloaded file");
    Ok(())
}
