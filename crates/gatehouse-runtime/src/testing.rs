//! テスト用のフェイク

use crate::error::{ProcessError, Result, RuntimeError};
use crate::orchestrator::{ContainerOrchestrator, ContainerStatus, EngineInfo};
use crate::process::{CommandSpec, ProcessOutput, ProcessRunner};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// スクリプトされた応答
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Ok(String),
    Exit(i32, String),
    Missing,
    Timeout,
    /// 指定時間かかって成功する（タイムアウトを超えたら Timeout）
    Slow(Duration),
}

/// コマンドラインごとに応答を返す runner
///
/// 応答キューの最後の1件は使い切らずに繰り返し返す。
/// 登録のないコマンドは「見つからない」扱い。
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(self, command: &str, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(command.to_string(), replies.into_iter().collect());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, command: &str) -> usize {
        self.calls().iter().filter(|c| *c == command).count()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(
        &self,
        command: &CommandSpec,
        timeout: Duration,
    ) -> std::result::Result<ProcessOutput, ProcessError> {
        let line = command.display();
        self.calls.lock().unwrap().push(line.clone());

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(&line) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Ok(stdout)) => Ok(ProcessOutput {
                exit_code: Some(0),
                stdout,
                stderr: String::new(),
            }),
            Some(Reply::Exit(code, stderr)) => Ok(ProcessOutput {
                exit_code: Some(code),
                stdout: String::new(),
                stderr,
            }),
            Some(Reply::Timeout) => {
                tokio::time::sleep(timeout).await;
                Err(ProcessError::Timeout {
                    command: line,
                    timeout_secs: timeout.as_secs(),
                })
            }
            Some(Reply::Slow(duration)) => {
                if duration >= timeout {
                    tokio::time::sleep(timeout).await;
                    return Err(ProcessError::Timeout {
                        command: line,
                        timeout_secs: timeout.as_secs(),
                    });
                }
                tokio::time::sleep(duration).await;
                Ok(ProcessOutput {
                    exit_code: Some(0),
                    stdout: String::new(),
                    stderr: String::new(),
                })
            }
            Some(Reply::Missing) | None => Err(ProcessError::NotFound(command.program.clone())),
        }
    }
}

/// コンテナ状態を順番に返す orchestrator
#[derive(Default)]
pub(crate) struct FakeOrchestrator {
    statuses: Mutex<VecDeque<Result<Option<ContainerStatus>>>>,
    status_calls: Mutex<usize>,
}

impl FakeOrchestrator {
    pub(crate) fn with_statuses(
        statuses: impl IntoIterator<Item = Result<Option<ContainerStatus>>>,
    ) -> Self {
        Self {
            statuses: Mutex::new(statuses.into_iter().collect()),
            status_calls: Mutex::new(0),
        }
    }

    pub(crate) fn status_calls(&self) -> usize {
        *self.status_calls.lock().unwrap()
    }
}

pub(crate) fn status(running: bool, healthy: bool, status: &str) -> ContainerStatus {
    ContainerStatus {
        exists: true,
        running,
        healthy,
        status: status.to_string(),
    }
}

#[async_trait]
impl ContainerOrchestrator for FakeOrchestrator {
    async fn engine_info(&self) -> EngineInfo {
        EngineInfo {
            available: true,
            variant: Some("Fake".to_string()),
            version: Some("27.0.0".to_string()),
        }
    }

    async fn compose_up(&self, _profile: Option<&str>) -> Result<()> {
        Ok(())
    }

    async fn compose_down(&self, _remove_volumes: bool) -> Result<()> {
        Ok(())
    }

    async fn container_status(&self, _name: &str) -> Result<Option<ContainerStatus>> {
        *self.status_calls.lock().unwrap() += 1;
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            return statuses.pop_front().unwrap_or(Ok(None));
        }
        match statuses.front() {
            Some(Ok(status)) => Ok(status.clone()),
            Some(Err(_)) => Err(RuntimeError::DockerApiError("fake".to_string())),
            None => Ok(None),
        }
    }

    async fn image_pulled(&self, _image: &str) -> Result<bool> {
        Ok(true)
    }

    async fn volume_exists(&self, _name: &str) -> Result<bool> {
        Ok(false)
    }

    async fn port_available(&self, _port: u16) -> bool {
        true
    }
}
