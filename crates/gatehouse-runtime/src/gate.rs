//! コンテナエンジンの準備ゲート
//!
//! プロビジョニングの前に、コンテナエンジンが応答する状態まで持っていく。
//!
//! ```text
//! Unchecked ─┬─> Ready                                  （応答あり）
//!            ├─> InstalledNotRunning ─> Ready           （起動して待機）
//!            ├─> NotInstalled ─> (install) ─> Ready     （許可がある場合のみ）
//!            └─> Failed                                 （それ以外、再試行しない）
//! ```

use crate::error::{Result, RuntimeError};
use crate::process::{CommandSpec, ProcessRunner};
use gatehouse_core::{ProgressSink, RuntimeKind, Step};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// 応答確認に使う `docker info` のフォーマット
const LIVENESS_FORMAT: &str = "{{.ServerVersion}}|{{.OperatingSystem}}";

/// 実行中のプラットフォーム
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }

    /// 指定がない場合に使うエンジン
    pub fn default_runtime(&self) -> RuntimeKind {
        match self {
            Self::MacOs => RuntimeKind::OrbStack,
            Self::Linux | Self::Other => RuntimeKind::Docker,
        }
    }
}

/// ゲートの設定
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// 応答確認の間隔
    pub poll_interval: Duration,
    /// 起動後に応答を待つ上限
    pub start_timeout: Duration,
    /// 1回の確認コマンドのタイムアウト
    pub probe_timeout: Duration,
    /// パッケージマネージャによるインストールのタイムアウト
    pub install_timeout: Duration,
    /// 未インストール時に自動インストールしてよいか
    pub authorize_install: bool,
    /// ユーザーが指定したエンジン
    pub preferred: Option<RuntimeKind>,
    pub platform: Platform,
    /// CI 上ではリメディエーションせずに失敗する
    pub ci: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            start_timeout: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(10),
            install_timeout: Duration::from_secs(900),
            authorize_install: false,
            preferred: None,
            platform: Platform::current(),
            ci: false,
        }
    }
}

/// 応答したエンジン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineReady {
    pub kind: RuntimeKind,
    pub server_version: String,
}

/// ゲートの状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Unchecked,
    Ready(EngineReady),
    InstalledNotRunning(RuntimeKind),
    NotInstalled,
    /// 終端状態
    Failed(String),
}

/// 検出結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Detection {
    pub orbstack: bool,
    pub docker: bool,
    pub homebrew: bool,
}

impl Detection {
    /// インストール済みのエンジン（指定があればそれを優先）
    pub fn installed(&self, preferred: Option<RuntimeKind>) -> Option<RuntimeKind> {
        match preferred {
            Some(RuntimeKind::OrbStack) => self.orbstack.then_some(RuntimeKind::OrbStack),
            Some(RuntimeKind::Docker) => self.docker.then_some(RuntimeKind::Docker),
            None if self.orbstack => Some(RuntimeKind::OrbStack),
            None if self.docker => Some(RuntimeKind::Docker),
            None => None,
        }
    }
}

pub struct ReadinessGate {
    runner: Arc<dyn ProcessRunner>,
    config: GateConfig,
    state: GateState,
    history: Vec<GateState>,
}

impl ReadinessGate {
    pub fn new(runner: Arc<dyn ProcessRunner>, config: GateConfig) -> Self {
        Self {
            runner,
            config,
            state: GateState::Unchecked,
            history: vec![GateState::Unchecked],
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// これまでの状態遷移
    pub fn history(&self) -> &[GateState] {
        &self.history
    }

    /// エンジンが応答する状態まで進める
    ///
    /// 一度 `Failed` になったゲートは再試行せずにエラーを返す。
    pub async fn ensure_ready(&mut self, sink: &dyn ProgressSink) -> Result<EngineReady> {
        match &self.state {
            GateState::Ready(ready) => return Ok(ready.clone()),
            GateState::Failed(reason) => {
                return Err(not_ready(self.config.preferred, reason.clone()));
            }
            _ => {}
        }

        sink.step_started(Step::DetectRuntime);
        let (live, detection) = tokio::join!(self.probe_liveness(), self.detect());

        if let Some(ready) = live {
            sink.step_succeeded(Some(&format!(
                "{} {}",
                ready.kind.display_name(),
                ready.server_version
            )));
            self.transition(GateState::Ready(ready.clone()));
            return Ok(ready);
        }
        tracing::debug!(?detection, "Container engine is not responding");

        let installed = detection.installed(self.config.preferred);

        if self.config.ci {
            let reason =
                "コンテナエンジンが応答しません（CI 環境では起動・インストールを行いません）"
                    .to_string();
            sink.step_failed(&reason);
            return Err(self.fail(installed.or(self.config.preferred), reason));
        }

        let kind = match installed {
            Some(kind) => {
                sink.step_succeeded(Some(&format!("{} (停止中)", kind.display_name())));
                self.transition(GateState::InstalledNotRunning(kind));
                kind
            }
            None => {
                sink.step_succeeded(Some("未インストール"));
                self.transition(GateState::NotInstalled);
                let kind = self
                    .config
                    .preferred
                    .unwrap_or_else(|| self.config.platform.default_runtime());
                self.install(kind, detection, sink).await?;
                kind
            }
        };

        // 起動コマンドと応答待ちで同じ期限を共有する
        let deadline = Instant::now() + self.config.start_timeout;
        self.start(kind, deadline, sink).await?;
        self.wait_until_live(kind, deadline, sink).await
    }

    async fn install(
        &mut self,
        kind: RuntimeKind,
        detection: Detection,
        sink: &dyn ProgressSink,
    ) -> Result<()> {
        sink.step_started(Step::InstallRuntime);

        if !self.config.authorize_install {
            let reason = format!("{} がインストールされていません", kind.display_name());
            sink.step_failed(&reason);
            return Err(self.fail(Some(kind), reason));
        }
        if !detection.homebrew || self.config.platform != Platform::MacOs {
            let reason = format!(
                "Homebrew が利用できないため {} を自動インストールできません",
                kind.display_name()
            );
            sink.step_failed(&reason);
            return Err(self.fail(Some(kind), reason));
        }

        let command = CommandSpec::new("brew").args(["install", "--cask", kind.cask_name()]);
        sink.detail(&command.display());
        tracing::info!(runtime = %kind, "Installing container engine");

        let reason = match self.runner.run(&command, self.config.install_timeout).await {
            Ok(output) if output.success() => {
                sink.step_succeeded(None);
                return Ok(());
            }
            Ok(output) => format!("{} に失敗しました: {}", command.display(), output.combined()),
            Err(e) => e.to_string(),
        };
        sink.step_failed(&reason);
        Err(self.fail(Some(kind), reason))
    }

    async fn start(
        &mut self,
        kind: RuntimeKind,
        deadline: Instant,
        sink: &dyn ProgressSink,
    ) -> Result<()> {
        sink.step_started(Step::StartRuntime);

        let Some(command) = start_command(kind, self.config.platform) else {
            let reason = format!(
                "このプラットフォームでは {} を自動起動できません",
                kind.display_name()
            );
            sink.step_failed(&reason);
            return Err(self.fail(Some(kind), reason));
        };
        sink.detail(&command.display());
        tracing::info!(runtime = %kind, "Starting container engine");

        let remaining = deadline.saturating_duration_since(Instant::now());
        let reason = match self.runner.run(&command, remaining).await {
            Ok(output) if output.success() => {
                sink.step_succeeded(None);
                return Ok(());
            }
            Ok(output) => format!("{} に失敗しました: {}", command.display(), output.combined()),
            Err(e) => e.to_string(),
        };
        sink.step_failed(&reason);
        Err(self.fail(Some(kind), reason))
    }

    async fn wait_until_live(
        &mut self,
        kind: RuntimeKind,
        deadline: Instant,
        sink: &dyn ProgressSink,
    ) -> Result<EngineReady> {
        sink.step_started(Step::WaitRuntime);

        loop {
            if let Some(ready) = self.probe_liveness().await {
                sink.step_succeeded(Some(&format!(
                    "{} {}",
                    ready.kind.display_name(),
                    ready.server_version
                )));
                self.transition(GateState::Ready(ready.clone()));
                return Ok(ready);
            }

            if Instant::now() >= deadline {
                let reason = format!(
                    "{} が {}秒以内に応答しませんでした",
                    kind.display_name(),
                    self.config.start_timeout.as_secs()
                );
                sink.step_failed(&reason);
                return Err(self.fail(Some(kind), reason));
            }

            sleep(self.config.poll_interval).await;
        }
    }

    /// `docker info` が成功すれば応答あり。タイムアウトも未応答として扱う
    async fn probe_liveness(&self) -> Option<EngineReady> {
        let command = CommandSpec::new("docker").args(["info", "--format", LIVENESS_FORMAT]);
        match self.runner.run(&command, self.config.probe_timeout).await {
            Ok(output) if output.success() => parse_liveness(&output.stdout),
            Ok(output) => {
                tracing::debug!(exit_code = ?output.exit_code, "Liveness probe failed");
                None
            }
            Err(e) => {
                tracing::debug!("Liveness probe failed: {}", e);
                None
            }
        }
    }

    /// 各エンジンとパッケージマネージャの有無を並行に調べる
    async fn detect(&self) -> Detection {
        let orbstack = async {
            // OrbStack は macOS 専用
            if self.config.platform == Platform::MacOs {
                self.probe_present(CommandSpec::new("orb").arg("version"))
                    .await
            } else {
                false
            }
        };
        let docker = self.probe_present(CommandSpec::new("docker").arg("--version"));
        let homebrew = self.probe_present(CommandSpec::new("brew").arg("--version"));

        let (orbstack, docker, homebrew) = tokio::join!(orbstack, docker, homebrew);
        Detection {
            orbstack,
            docker,
            homebrew,
        }
    }

    async fn probe_present(&self, command: CommandSpec) -> bool {
        matches!(
            self.runner.run(&command, self.config.probe_timeout).await,
            Ok(output) if output.success()
        )
    }

    fn transition(&mut self, state: GateState) {
        tracing::debug!(?state, "Readiness gate transition");
        self.history.push(state.clone());
        self.state = state;
    }

    fn fail(&mut self, kind: Option<RuntimeKind>, reason: String) -> RuntimeError {
        self.transition(GateState::Failed(reason.clone()));
        not_ready(kind, reason)
    }
}

fn not_ready(kind: Option<RuntimeKind>, reason: String) -> RuntimeError {
    let instructions = match kind {
        Some(kind) => kind.install_instructions().to_string(),
        None => format!(
            "{} または {}",
            RuntimeKind::OrbStack.install_instructions(),
            RuntimeKind::Docker.install_instructions()
        ),
    };
    RuntimeError::NotReady {
        kind,
        reason,
        instructions,
    }
}

fn start_command(kind: RuntimeKind, platform: Platform) -> Option<CommandSpec> {
    match (kind, platform) {
        (RuntimeKind::OrbStack, Platform::MacOs) => Some(CommandSpec::new("orb").arg("start")),
        (RuntimeKind::Docker, Platform::MacOs) => {
            Some(CommandSpec::new("open").args(["-a", "Docker"]))
        }
        (RuntimeKind::Docker, Platform::Linux) => {
            Some(CommandSpec::new("systemctl").args(["start", "docker"]))
        }
        _ => None,
    }
}

fn parse_liveness(stdout: &str) -> Option<EngineReady> {
    let line = stdout.trim();
    let (version, os) = line.split_once('|').unwrap_or((line, ""));
    if version.is_empty() {
        return None;
    }

    let kind = if os.to_ascii_lowercase().contains("orbstack") {
        RuntimeKind::OrbStack
    } else {
        RuntimeKind::Docker
    };
    Some(EngineReady {
        kind,
        server_version: version.to_string(),
    })
}
