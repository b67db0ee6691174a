use gatehouse_core::RuntimeKind;
use thiserror::Error;

/// プロセス実行のエラー
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("コマンドが見つかりません: {0}")]
    NotFound(String),

    #[error("コマンドがタイムアウトしました（{timeout_secs}秒）: {command}")]
    Timeout { command: String, timeout_secs: u64 },

    #[error("コマンドの実行に失敗しました: {command}: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(
        "コンテナエンジンを利用できません: {reason}\n\nヒント:\n  • {instructions}\n  • インストール後に再度実行してください"
    )]
    NotReady {
        kind: Option<RuntimeKind>,
        reason: String,
        instructions: String,
    },

    #[error(
        "Dockerに接続できません: {0}\n\nヒント:\n  • Dockerが起動しているか確認してください\n  • OrbStackまたはDocker Desktopがインストールされているか確認してください"
    )]
    DockerConnectionFailed(String),

    #[error("Docker APIエラー: {0}")]
    DockerApiError(String),

    #[error("docker compose {action} に失敗しました:\n{output}")]
    ComposeFailed { action: String, output: String },

    #[error(
        "コンテナ '{container}' のヘルスチェック待機がタイムアウトしました（{timeout_secs}秒, 最終状態: {last_status}）\n\nヒント:\n  • docker logs {container} でログを確認してください"
    )]
    HealthTimeout {
        container: String,
        timeout_secs: u64,
        last_status: String,
    },

    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl From<bollard::errors::Error> for RuntimeError {
    fn from(err: bollard::errors::Error) -> Self {
        match &err {
            bollard::errors::Error::DockerResponseServerError { .. } => {
                RuntimeError::DockerApiError(err.to_string())
            }
            _ => {
                // 接続エラーの可能性をチェック
                let err_str = err.to_string();
                if err_str.contains("Connection refused")
                    || err_str.contains("No such file or directory")
                {
                    RuntimeError::DockerConnectionFailed(err_str)
                } else {
                    RuntimeError::DockerApiError(err_str)
                }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
