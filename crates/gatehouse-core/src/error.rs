use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("入力がキャンセルされました")]
    PromptCancelled,

    #[error(
        "対話的な入力が必要です: {0}\n\nヒント:\n  • 対応するフラグまたは環境変数で値を指定してください"
    )]
    InputRequired(String),

    #[error("選択肢がありません: {0}")]
    NoOptions(String),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
