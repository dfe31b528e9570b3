//! Debug tasks used to exercise recipe sequencing

use crate::config::{FailOptions, WaitOptions};
use crate::error::{DeployError, ExecutionError};
use std::time::Duration;

/// Sleep for a fixed time
pub async fn wait(options: &WaitOptions) -> Result<(), DeployError> {
    tracing::debug!(ms = options.ms, "waiting");
    tokio::time::sleep(Duration::from_millis(options.ms)).await;
    Ok(())
}

/// Always fail
pub async fn fail(options: &FailOptions) -> Result<(), DeployError> {
    let message = options
        .message
        .clone()
        .unwrap_or_else(|| "fail task invoked".to_string());
    Err(ExecutionError::Failed(message).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_wait_sleeps() {
        let start = Instant::now();
        wait(&WaitOptions { ms: 20 }).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_fail_uses_message() {
        let err = fail(&FailOptions {
            message: Some("boom".to_string()),
        })
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Execution error: boom");
    }
}
