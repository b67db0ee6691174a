//! 設定ストア
//!
//! インストール先ディレクトリの `install.json` を読み書きする。
//! 排他ロックは取らない（同一ホストで同時に複数のインストーラを動かす想定はない）。

use crate::error::{ConfigError, Result};
use crate::model::{InstallConfig, TunnelConfig};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "install.json";
const CONFIG_BACKUP: &str = "install.json.backup";
const ENV_FILE: &str = ".env";
const COMPOSE_FILE: &str = "compose.yaml";

/// 設定の永続化先
pub trait ConfigStore: Send + Sync {
    /// 保存済みの設定を読み込む。未インストールなら `None`
    fn read(&self) -> Result<Option<InstallConfig>>;

    /// 設定を保存
    fn write(&self, config: &InstallConfig) -> Result<()>;

    /// 設定が存在するか
    fn exists(&self) -> bool;

    /// 設定を削除
    fn remove(&self) -> Result<()>;

    /// 保存済みのトンネル設定
    fn read_tunnel(&self) -> Result<Option<TunnelConfig>> {
        Ok(self.read()?.and_then(|c| c.tunnel().cloned()))
    }
}

/// ファイルベースの設定ストア
pub struct FileConfigStore {
    dir: PathBuf,
}

impl FileConfigStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// デフォルトのインストール先で作成
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(crate::get_install_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.dir.join(CONFIG_BACKUP)
    }

    pub fn env_path(&self) -> PathBuf {
        self.dir.join(ENV_FILE)
    }

    pub fn compose_path(&self) -> PathBuf {
        self.dir.join(COMPOSE_FILE)
    }

    /// インストール先ディレクトリを作成
    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
            set_mode(&self.dir, 0o700)?;
            tracing::debug!("Created install directory: {}", self.dir.display());
        }
        Ok(())
    }

    /// `.env` を書き出す
    pub fn write_env_file(&self, config: &InstallConfig) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.env_path();
        write_private(&path, &crate::env::render_env(config))?;
        tracing::debug!("Wrote env file: {}", path.display());
        Ok(path)
    }

    /// `compose.yaml` を書き出す
    pub fn write_compose_file(&self, config: &InstallConfig) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.compose_path();
        write_private(&path, &crate::compose::render_compose(config)?)?;
        tracing::debug!("Wrote compose file: {}", path.display());
        Ok(path)
    }
}

impl ConfigStore for FileConfigStore {
    fn read(&self) -> Result<Option<InstallConfig>> {
        let path = self.config_path();
        if !path.exists() {
            tracing::debug!("Config file not found: {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let config: InstallConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Corrupted {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!(mode = config.mode_name(), "Loaded install config");
        Ok(Some(config))
    }

    fn write(&self, config: &InstallConfig) -> Result<()> {
        self.ensure_dir()?;

        let path = self.config_path();
        let backup = self.backup_path();

        // 既存の設定はバックアップに退避
        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup)?;
            }
            fs::rename(&path, &backup)?;
            tracing::debug!("Created config backup");
        }

        let content = serde_json::to_string_pretty(config)?;
        write_private(&path, &content)?;

        tracing::debug!(mode = config.mode_name(), "Saved install config");
        Ok(())
    }

    fn exists(&self) -> bool {
        self.config_path().exists()
    }

    fn remove(&self) -> Result<()> {
        for path in [
            self.config_path(),
            self.backup_path(),
            self.env_path(),
            self.compose_path(),
        ] {
            if path.exists() {
                fs::remove_file(&path)?;
                tracing::debug!("Removed {}", path.display());
            }
        }
        Ok(())
    }
}

/// 所有者のみ読み書き可能なファイルとして書き込む
fn write_private(path: &Path, content: &str) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    // 既存ファイルの場合 mode は open 時に反映されない
    set_mode(path, 0o600)?;
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
