//! コンテナ操作
//!
//! compose の起動・停止は docker CLI 経由、状態の問い合わせは Docker API 経由で行う。

// Bollard 0.19.4 の非推奨APIを一時的に使用
#![allow(deprecated)]

use crate::error::{Result, RuntimeError};
use crate::process::{CommandSpec, ProcessRunner};
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::InspectContainerOptions;
use bollard::models::HealthStatusEnum;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// エンジン情報
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineInfo {
    pub available: bool,
    /// "Docker Desktop", "OrbStack" など
    pub variant: Option<String>,
    pub version: Option<String>,
}

/// コンテナの状態
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContainerStatus {
    pub exists: bool,
    pub running: bool,
    /// ヘルスチェックがないコンテナは running と同じ
    pub healthy: bool,
    pub status: String,
}

impl ContainerStatus {
    pub fn missing() -> Self {
        Self {
            status: "not found".to_string(),
            ..Default::default()
        }
    }
}

#[async_trait]
pub trait ContainerOrchestrator: Send + Sync {
    async fn engine_info(&self) -> EngineInfo;

    /// コンテナを起動（プロファイル指定時はそのサービスも含める）
    async fn compose_up(&self, profile: Option<&str>) -> Result<()>;

    /// コンテナを停止・削除
    async fn compose_down(&self, remove_volumes: bool) -> Result<()>;

    /// コンテナの状態。存在しない場合は `None`
    async fn container_status(&self, name: &str) -> Result<Option<ContainerStatus>>;

    async fn image_pulled(&self, image: &str) -> Result<bool>;

    async fn volume_exists(&self, name: &str) -> Result<bool>;

    /// ローカルでポートが空いているか
    async fn port_available(&self, port: u16) -> bool;
}

/// イメージの取得を含む compose 操作の上限
const COMPOSE_TIMEOUT: Duration = Duration::from_secs(600);

/// docker compose ベースの実装
pub struct ComposeOrchestrator {
    runner: Arc<dyn ProcessRunner>,
    docker: Option<Docker>,
    compose_file: PathBuf,
    project: String,
    /// down 時に有効にするプロファイル
    profiles: Vec<String>,
}

impl ComposeOrchestrator {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        compose_file: impl AsRef<Path>,
        project: impl Into<String>,
    ) -> Self {
        let docker = match Docker::connect_with_local_defaults() {
            Ok(docker) => Some(docker),
            Err(e) => {
                tracing::debug!("Docker connection unavailable: {}", e);
                None
            }
        };

        Self {
            runner,
            docker,
            compose_file: compose_file.as_ref().to_path_buf(),
            project: project.into(),
            profiles: Vec::new(),
        }
    }

    pub fn with_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profiles = profiles.into_iter().map(Into::into).collect();
        self
    }

    fn docker(&self) -> Result<&Docker> {
        self.docker.as_ref().ok_or_else(|| {
            RuntimeError::DockerConnectionFailed("Docker ソケットが見つかりません".to_string())
        })
    }

    /// `docker compose -f <file> -p <project> [--profile ...]`
    fn compose_command<'a>(&self, profiles: impl IntoIterator<Item = &'a str>) -> CommandSpec {
        let mut command = CommandSpec::new("docker").args([
            "compose".to_string(),
            "-f".to_string(),
            self.compose_file.display().to_string(),
            "-p".to_string(),
            self.project.clone(),
        ]);
        for profile in profiles {
            command = command.args(["--profile", profile]);
        }
        if let Some(dir) = self.compose_file.parent() {
            // .env を compose ファイルと同じディレクトリから読ませる
            command = command.current_dir(dir);
        }
        command
    }

    async fn run_compose(&self, action: &str, command: CommandSpec) -> Result<()> {
        let output = self.runner.run(&command, COMPOSE_TIMEOUT).await?;
        if !output.success() {
            return Err(RuntimeError::ComposeFailed {
                action: action.to_string(),
                output: output.combined(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerOrchestrator for ComposeOrchestrator {
    async fn engine_info(&self) -> EngineInfo {
        let Ok(docker) = self.docker() else {
            return EngineInfo::default();
        };

        match docker.version().await {
            Ok(version) => EngineInfo {
                available: true,
                variant: version.platform.map(|p| p.name),
                version: version.version,
            },
            Err(e) => {
                tracing::debug!("Docker version query failed: {}", e);
                EngineInfo::default()
            }
        }
    }

    async fn compose_up(&self, profile: Option<&str>) -> Result<()> {
        let command = self.compose_command(profile).args(["up", "-d"]);
        tracing::info!(profile = ?profile, "Starting containers");
        self.run_compose("up", command).await
    }

    async fn compose_down(&self, remove_volumes: bool) -> Result<()> {
        let mut command = self
            .compose_command(self.profiles.iter().map(String::as_str))
            .arg("down");
        if remove_volumes {
            command = command.arg("--volumes");
        }
        tracing::info!(remove_volumes, "Stopping containers");
        self.run_compose("down", command).await
    }

    async fn container_status(&self, name: &str) -> Result<Option<ContainerStatus>> {
        let inspect = match self
            .docker()?
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(inspect) => inspect,
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let Some(state) = inspect.state else {
            return Ok(Some(ContainerStatus {
                exists: true,
                ..ContainerStatus::missing()
            }));
        };

        let running = state.running.unwrap_or(false);
        let health = state.health.and_then(|h| h.status);
        let healthy = match health.as_ref() {
            Some(HealthStatusEnum::HEALTHY)
            | Some(HealthStatusEnum::NONE)
            | Some(HealthStatusEnum::EMPTY)
            | None => running,
            Some(_) => false,
        };
        let mut status = state
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        if let Some(health) = health.as_ref().filter(|h| **h != HealthStatusEnum::EMPTY) {
            status = format!("{} ({})", status, health);
        }

        Ok(Some(ContainerStatus {
            exists: true,
            running,
            healthy,
            status,
        }))
    }

    async fn image_pulled(&self, image: &str) -> Result<bool> {
        match self.docker()?.inspect_image(image).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn volume_exists(&self, name: &str) -> Result<bool> {
        match self.docker()?.inspect_volume(name).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn port_available(&self, port: u16) -> bool {
        port_is_free(port).await
    }
}

/// 127.0.0.1 に bind できればポートは空いている
pub(crate) async fn port_is_free(port: u16) -> bool {
    tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedRunner};

    const UP: &str = "docker compose -f /opt/gatehouse/compose.yaml -p gatehouse up -d";

    fn orchestrator(runner: &Arc<ScriptedRunner>) -> ComposeOrchestrator {
        ComposeOrchestrator::new(runner.clone(), "/opt/gatehouse/compose.yaml", "gatehouse")
            .with_profiles(["tunnel"])
    }

    #[tokio::test]
    async fn test_compose_up_without_profile() {
        let runner = Arc::new(ScriptedRunner::new().on(UP, [Reply::Ok(String::new())]));
        orchestrator(&runner).compose_up(None).await.unwrap();
        assert_eq!(runner.calls(), vec![UP.to_string()]);
    }

    #[tokio::test]
    async fn test_compose_up_with_profile() {
        let command =
            "docker compose -f /opt/gatehouse/compose.yaml -p gatehouse --profile tunnel up -d";
        let runner = Arc::new(ScriptedRunner::new().on(command, [Reply::Ok(String::new())]));
        orchestrator(&runner).compose_up(Some("tunnel")).await.unwrap();
        assert_eq!(runner.count(command), 1);
    }

    #[tokio::test]
    async fn test_compose_down_includes_all_profiles() {
        let command = "docker compose -f /opt/gatehouse/compose.yaml -p gatehouse --profile tunnel down --volumes";
        let runner = Arc::new(ScriptedRunner::new().on(command, [Reply::Ok(String::new())]));
        orchestrator(&runner).compose_down(true).await.unwrap();
        assert_eq!(runner.count(command), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_compose_up_gives_up_after_ten_minutes() {
        let runner =
            Arc::new(ScriptedRunner::new().on(UP, [Reply::Slow(Duration::from_secs(601))]));
        let err = orchestrator(&runner).compose_up(None).await.unwrap_err();
        assert!(err.to_string().contains("600秒"), "{err}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_image_pull_still_completes() {
        let runner =
            Arc::new(ScriptedRunner::new().on(UP, [Reply::Slow(Duration::from_secs(599))]));
        orchestrator(&runner).compose_up(None).await.unwrap();
    }

    #[tokio::test]
    async fn test_compose_failure_carries_output() {
        let runner = Arc::new(
            ScriptedRunner::new().on(UP, [Reply::Exit(1, "no such image".to_string())]),
        );
        match orchestrator(&runner).compose_up(None).await {
            Err(RuntimeError::ComposeFailed { action, output }) => {
                assert_eq!(action, "up");
                assert!(output.contains("no such image"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_compose_runs_in_install_dir() {
        let runner = Arc::new(ScriptedRunner::new());
        let command = orchestrator(&runner).compose_command(None::<&str>);
        assert_eq!(command.current_dir, Some(PathBuf::from("/opt/gatehouse")));
    }

    #[tokio::test]
    async fn test_port_in_use() {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(!port_is_free(port).await);

        drop(listener);
        assert!(port_is_free(port).await);
    }
}
