//! gatehouse の共通基盤
//!
//! 各クレートから使われる能力（capability）の抽象を提供します。
//!
//! - [`ProgressSink`]: ステップ遷移イベントの出力先
//! - [`Prompter`]: ユーザー確認・入力の取得
//! - [`ExecutionContext`]: CI 等の実行環境の判定
//! - [`RuntimeKind`]: 対応するコンテナエンジン

pub mod context;
pub mod error;
pub mod progress;
pub mod prompt;
pub mod runtime;

pub use context::{ExecutionContext, host_identity};
pub use error::{CoreError, Result};
pub use progress::{NoopSink, ProgressEvent, ProgressSink, RecordingSink, Step};
pub use prompt::{NonInteractivePrompter, Prompter, ScriptedAnswer, ScriptedPrompter};
pub use runtime::RuntimeKind;
