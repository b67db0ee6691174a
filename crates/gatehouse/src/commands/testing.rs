//! コマンドのテスト用フェイク

use super::Services;
use async_trait::async_trait;
use chrono::Utc;
use gatehouse_config::{
    DEFAULT_N8N_PORT, FileConfigStore, InstallConfig, InstallSettings, TunnelConfig,
};
use gatehouse_core::{
    ExecutionContext, NonInteractivePrompter, Prompter, RecordingSink, RuntimeKind,
    ScriptedAnswer, ScriptedPrompter,
};
use gatehouse_runtime::{
    CommandSpec, ContainerOrchestrator, ContainerStatus, EngineInfo, GateConfig,
    HealthWaitConfig, Platform, ProcessError, ProcessOutput, ProcessRunner, Result,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// どのコマンドにも「動いている Docker」として答える runner
#[derive(Default)]
pub(crate) struct RunningEngine {
    calls: AtomicUsize,
}

impl RunningEngine {
    pub(crate) fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessRunner for RunningEngine {
    async fn run(
        &self,
        _command: &CommandSpec,
        _timeout: Duration,
    ) -> std::result::Result<ProcessOutput, ProcessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProcessOutput {
            exit_code: Some(0),
            stdout: "27.3.1|Ubuntu 24.04 LTS".to_string(),
            stderr: String::new(),
        })
    }
}

/// compose 操作を記録する orchestrator
pub(crate) struct FakeOrchestrator {
    ups: Mutex<Vec<Option<String>>>,
    downs: Mutex<Vec<bool>>,
    port_available: AtomicBool,
    healthy: AtomicBool,
    fail_down: AtomicBool,
}

impl Default for FakeOrchestrator {
    fn default() -> Self {
        Self {
            ups: Mutex::new(Vec::new()),
            downs: Mutex::new(Vec::new()),
            port_available: AtomicBool::new(true),
            healthy: AtomicBool::new(true),
            fail_down: AtomicBool::new(false),
        }
    }
}

impl FakeOrchestrator {
    pub(crate) fn ups(&self) -> Vec<Option<String>> {
        self.ups.lock().unwrap().clone()
    }

    pub(crate) fn downs(&self) -> Vec<bool> {
        self.downs.lock().unwrap().clone()
    }

    pub(crate) fn set_port_available(&self, available: bool) {
        self.port_available.store(available, Ordering::SeqCst);
    }

    pub(crate) fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_down(&self, fail: bool) {
        self.fail_down.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContainerOrchestrator for FakeOrchestrator {
    async fn engine_info(&self) -> EngineInfo {
        EngineInfo {
            available: true,
            variant: Some("Docker Engine".to_string()),
            version: Some("27.3.1".to_string()),
        }
    }

    async fn compose_up(&self, profile: Option<&str>) -> Result<()> {
        self.ups.lock().unwrap().push(profile.map(String::from));
        Ok(())
    }

    async fn compose_down(&self, remove_volumes: bool) -> Result<()> {
        self.downs.lock().unwrap().push(remove_volumes);
        if self.fail_down.load(Ordering::SeqCst) {
            return Err(gatehouse_runtime::RuntimeError::ComposeFailed {
                action: "down".to_string(),
                output: "no such project".to_string(),
            });
        }
        Ok(())
    }

    async fn container_status(&self, _name: &str) -> Result<Option<ContainerStatus>> {
        let healthy = self.healthy.load(Ordering::SeqCst);
        Ok(Some(ContainerStatus {
            exists: true,
            running: true,
            healthy,
            status: if healthy { "healthy" } else { "starting" }.to_string(),
        }))
    }

    async fn image_pulled(&self, _image: &str) -> Result<bool> {
        Ok(true)
    }

    async fn volume_exists(&self, _name: &str) -> Result<bool> {
        Ok(true)
    }

    async fn port_available(&self, _port: u16) -> bool {
        self.port_available.load(Ordering::SeqCst)
    }
}

/// 一時ディレクトリ上のインストール環境
pub(crate) struct Fixture {
    _dir: TempDir,
    pub(crate) store: FileConfigStore,
    pub(crate) runner: Arc<RunningEngine>,
    pub(crate) orchestrator: FakeOrchestrator,
    pub(crate) sink: RecordingSink,
    prompter: Box<dyn Prompter>,
}

impl Fixture {
    /// 確認にはすべて「はい」と答える
    pub(crate) fn new() -> Self {
        Self::with_prompter(Box::new(NonInteractivePrompter::new(true)))
    }

    pub(crate) fn with_answers(answers: impl IntoIterator<Item = ScriptedAnswer>) -> Self {
        Self::with_prompter(Box::new(ScriptedPrompter::new(answers)))
    }

    fn with_prompter(prompter: Box<dyn Prompter>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::new(dir.path().join("install"));
        Self {
            _dir: dir,
            store,
            runner: Arc::new(RunningEngine::default()),
            orchestrator: FakeOrchestrator::default(),
            sink: RecordingSink::new(),
            prompter,
        }
    }

    pub(crate) fn services(&self, api_base: &str) -> Services<'_> {
        Services {
            store: &self.store,
            orchestrator: &self.orchestrator,
            runner: self.runner.clone(),
            prompter: self.prompter.as_ref(),
            sink: &self.sink,
            context: ExecutionContext::default(),
            api_base: api_base.to_string(),
            gate: GateConfig {
                poll_interval: Duration::from_millis(1),
                platform: Platform::Linux,
                ..GateConfig::default()
            },
            health: HealthWaitConfig {
                interval: Duration::from_millis(1),
                timeout: Duration::from_millis(20),
                probe_timeout: Duration::from_millis(10),
            },
        }
    }
}

fn settings() -> InstallSettings {
    InstallSettings {
        runtime: RuntimeKind::Docker,
        n8n_port: DEFAULT_N8N_PORT,
        timezone: "UTC".to_string(),
        installed_at: Utc::now(),
    }
}

pub(crate) fn local_config() -> InstallConfig {
    InstallConfig::LocalOnly {
        settings: settings(),
    }
}

pub(crate) fn tunneled_config() -> InstallConfig {
    InstallConfig::Tunneled {
        settings: settings(),
        tunnel: TunnelConfig {
            api_token: "cf-token".to_string(),
            account_id: "acc-123".to_string(),
            zone_id: "zone-456".to_string(),
            zone_name: "example.com".to_string(),
            tunnel_id: "tid-789".to_string(),
            tunnel_name: "n8n-host-ab12".to_string(),
            tunnel_token: "eyJ-old".to_string(),
            hostname: "n8n.example.com".to_string(),
            dns_record_id: "rec-abc".to_string(),
            tunnel_created_at: Utc::now(),
        },
    }
}
