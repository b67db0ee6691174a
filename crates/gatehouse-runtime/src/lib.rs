//! コンテナランタイム連携
//!
//! - [`ReadinessGate`]: コンテナエンジンの検出・起動・応答待ち
//! - [`ContainerOrchestrator`]: docker compose によるコンテナ操作
//! - [`wait_for_healthy`]: コンテナのヘルスチェック待機

pub mod error;
pub mod gate;
pub mod orchestrator;
pub mod process;
pub mod waiter;

#[cfg(test)]
pub(crate) mod testing;

pub use error::*;
pub use gate::{Detection, EngineReady, GateConfig, GateState, Platform, ReadinessGate};
pub use orchestrator::{ComposeOrchestrator, ContainerOrchestrator, ContainerStatus, EngineInfo};
pub use process::{CommandSpec, ProcessOutput, ProcessRunner, TokioProcessRunner};
pub use waiter::{HealthWaitConfig, wait_for_healthy};
