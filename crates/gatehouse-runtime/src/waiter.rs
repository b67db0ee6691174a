//! コンテナのヘルスチェック待機
//!
//! 固定間隔でポーリングし、全体の期限を超えたらタイムアウト。

use crate::error::{Result, RuntimeError};
use crate::orchestrator::{ContainerOrchestrator, ContainerStatus};
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout};

/// 待機設定
#[derive(Debug, Clone)]
pub struct HealthWaitConfig {
    pub interval: Duration,
    pub timeout: Duration,
    /// 1回の問い合わせのタイムアウト（超えたら未準備扱い）
    pub probe_timeout: Duration,
}

impl Default for HealthWaitConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(120),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

/// コンテナが healthy になるまで待機
pub async fn wait_for_healthy(
    orchestrator: &dyn ContainerOrchestrator,
    container: &str,
    config: &HealthWaitConfig,
) -> Result<ContainerStatus> {
    let deadline = Instant::now() + config.timeout;
    let mut last_status = "not found".to_string();

    loop {
        match timeout(config.probe_timeout, orchestrator.container_status(container)).await {
            Ok(Ok(Some(status))) if status.healthy => {
                tracing::debug!(container, "Container is healthy");
                return Ok(status);
            }
            Ok(Ok(Some(status))) => {
                // コンテナは存在するが、まだ準備完了していない
                last_status = status.status;
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => {
                tracing::debug!(container, "Container status query failed: {}", e);
            }
            Err(_) => {
                tracing::debug!(container, "Container status query timed out");
            }
        }

        if Instant::now() >= deadline {
            return Err(RuntimeError::HealthTimeout {
                container: container.to_string(),
                timeout_secs: config.timeout.as_secs(),
                last_status,
            });
        }
        sleep(config.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeOrchestrator, status};

    #[tokio::test(start_paused = true)]
    async fn test_waits_until_healthy() {
        let orchestrator = FakeOrchestrator::with_statuses([
            Ok(None),
            Ok(Some(status(true, false, "running (starting)"))),
            Ok(Some(status(true, true, "running (healthy)"))),
        ]);

        let result = wait_for_healthy(&orchestrator, "gatehouse-n8n", &HealthWaitConfig::default())
            .await
            .unwrap();

        assert!(result.healthy);
        assert_eq!(orchestrator.status_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_errors_are_not_fatal() {
        let orchestrator = FakeOrchestrator::with_statuses([
            Err(RuntimeError::DockerApiError("busy".to_string())),
            Ok(Some(status(true, true, "running"))),
        ]);

        assert!(
            wait_for_healthy(&orchestrator, "gatehouse-n8n", &HealthWaitConfig::default())
                .await
                .is_ok()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_last_status() {
        let orchestrator =
            FakeOrchestrator::with_statuses([Ok(Some(status(true, false, "running (unhealthy)")))]);
        let started = Instant::now();

        let err = wait_for_healthy(&orchestrator, "gatehouse-n8n", &HealthWaitConfig::default())
            .await
            .unwrap_err();

        match err {
            RuntimeError::HealthTimeout {
                timeout_secs,
                last_status,
                ..
            } => {
                assert_eq!(timeout_secs, 120);
                assert_eq!(last_status, "running (unhealthy)");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(started.elapsed() >= Duration::from_secs(120));
        // 固定間隔: 120秒 / 2秒 + 初回
        assert_eq!(orchestrator.status_calls(), 61);
    }
}
