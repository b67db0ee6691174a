//! サブコマンドの実装
//!
//! 各コマンドは [`Services`] 経由で外部とやり取りする。
//! `handle` が実環境の依存を組み立て、`run` が処理本体。

pub mod install;
pub mod status;
pub mod uninstall;

#[cfg(test)]
mod testing;

use crate::progress::TerminalSink;
use crate::prompt::TerminalPrompter;
use colored::Colorize;
use gatehouse_cloudflare::{ApiClient, TeardownReport, default_base_url};
use gatehouse_config::{COMPOSE_PROJECT, FileConfigStore, InstallConfig, TUNNEL_PROFILE};
use gatehouse_core::{ExecutionContext, NonInteractivePrompter, ProgressSink, Prompter};
use gatehouse_runtime::{
    ComposeOrchestrator, ContainerOrchestrator, GateConfig, HealthWaitConfig, ProcessRunner,
    TokioProcessRunner,
};
use std::fmt::Display;
use std::sync::Arc;

/// コマンドが使う外部依存
pub struct Services<'a> {
    pub store: &'a FileConfigStore,
    pub orchestrator: &'a dyn ContainerOrchestrator,
    pub runner: Arc<dyn ProcessRunner>,
    pub prompter: &'a dyn Prompter,
    pub sink: &'a dyn ProgressSink,
    pub context: ExecutionContext,
    /// Cloudflare API のベース URL
    pub api_base: String,
    pub gate: GateConfig,
    pub health: HealthWaitConfig,
}

impl Services<'_> {
    pub fn api_client(&self, token: &str) -> anyhow::Result<ApiClient> {
        Ok(ApiClient::with_base_url(token, self.api_base.clone())?)
    }
}

/// 実環境の依存
pub struct Live {
    store: FileConfigStore,
    runner: Arc<dyn ProcessRunner>,
    orchestrator: ComposeOrchestrator,
    sink: TerminalSink,
    prompter: Box<dyn Prompter>,
    context: ExecutionContext,
}

impl Live {
    pub fn new(assume_yes: bool) -> anyhow::Result<Self> {
        let context = ExecutionContext::detect();
        let store = FileConfigStore::open_default()?;
        let runner: Arc<dyn ProcessRunner> = Arc::new(TokioProcessRunner);
        let orchestrator =
            ComposeOrchestrator::new(runner.clone(), store.compose_path(), COMPOSE_PROJECT)
                .with_profiles([TUNNEL_PROFILE]);

        Ok(Self {
            store,
            runner,
            orchestrator,
            sink: TerminalSink::new(),
            prompter: build_prompter(assume_yes, context),
            context,
        })
    }

    pub fn services(&self) -> Services<'_> {
        Services {
            store: &self.store,
            orchestrator: &self.orchestrator,
            runner: self.runner.clone(),
            prompter: self.prompter.as_ref(),
            sink: &self.sink,
            context: self.context,
            api_base: default_base_url(),
            gate: GateConfig::default(),
            health: HealthWaitConfig::default(),
        }
    }

    pub fn sink(&self) -> &TerminalSink {
        &self.sink
    }
}

/// CI では端末から読まない
fn build_prompter(assume_yes: bool, context: ExecutionContext) -> Box<dyn Prompter> {
    if context.is_interactive() {
        Box::new(TerminalPrompter::new(assume_yes))
    } else {
        Box::new(NonInteractivePrompter::new(assume_yes))
    }
}

/// ステップの結果を sink に通知してそのまま返す
pub(crate) fn check<T, E: Display>(
    sink: &dyn ProgressSink,
    result: Result<T, E>,
    message: Option<&str>,
) -> Result<T, E> {
    match &result {
        Ok(_) => sink.step_succeeded(message),
        Err(e) => sink.step_failed(&e.to_string()),
    }
    result
}

/// ティアダウンで残ったリソースを警告
pub(crate) fn warn_leftovers(sink: &dyn ProgressSink, report: &TeardownReport) {
    for failure in report.failures() {
        sink.warn(&format!(
            "Cloudflare 上に削除できなかったリソースがあります: {}",
            failure
        ));
    }
}

pub(crate) fn print_urls(config: &InstallConfig) {
    println!("  ローカル: {}", config.local_url().cyan());
    if let Some(url) = config.public_url() {
        println!("  公開URL:  {}", url.cyan());
    }
}
