//! gatehouse のインストール設定ストア
//!
//! プロビジョニング結果とローカル設定を `install.json` に保存し、
//! コンテナ起動に必要な `.env` と `compose.yaml` を生成します。
//! 認証情報を平文で含むため、ファイルは所有者のみ読み書き可能で作成します。

pub mod compose;
pub mod env;
pub mod error;
pub mod model;
pub mod store;

pub use compose::{
    CLOUDFLARED_CONTAINER, COMPOSE_PROJECT, DATA_VOLUME, N8N_CONTAINER, N8N_IMAGE,
    N8N_SERVICE_URL, TUNNEL_PROFILE, render_compose,
};
pub use env::render_env;
pub use error::*;
pub use model::{DEFAULT_N8N_PORT, InstallConfig, InstallSettings, TunnelConfig};
pub use store::{ConfigStore, FileConfigStore};

use std::path::PathBuf;

/// インストール先ディレクトリを上書きする環境変数
pub const HOME_ENV: &str = "GATEHOUSE_HOME";

/// インストール先ディレクトリを取得
///
/// 以下の優先順位で決定:
/// 1. 環境変数 GATEHOUSE_HOME
/// 2. ~/.gatehouse
pub fn get_install_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(HOME_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    let home = dirs::home_dir().ok_or(ConfigError::InstallDirNotFound)?;
    Ok(home.join(".gatehouse"))
}
