use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("ホームディレクトリが見つかりません。GATEHOUSE_HOME 環境変数でインストール先を指定してください")]
    InstallDirNotFound,

    #[error("設定ファイルが壊れています: {path}\n理由: {message}")]
    Corrupted { path: String, message: String },

    #[error("テンプレート展開エラー: {0}")]
    Template(#[from] tera::Error),

    #[error("JSON エラー: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
