//! 対応するコンテナエンジン

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// コンテナエンジンの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    /// OrbStack (macOS)
    OrbStack,
    /// Docker Engine / Docker Desktop
    Docker,
}

impl RuntimeKind {
    /// 表示名
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OrbStack => "OrbStack",
            Self::Docker => "Docker",
        }
    }

    /// Homebrew cask 名
    pub fn cask_name(&self) -> &'static str {
        match self {
            Self::OrbStack => "orbstack",
            Self::Docker => "docker",
        }
    }

    /// 手動インストール手順
    pub fn install_instructions(&self) -> &'static str {
        match self {
            Self::OrbStack => "https://orbstack.dev/download からインストールしてください",
            Self::Docker => "https://docs.docker.com/get-docker/ からインストールしてください",
        }
    }
}

impl std::fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OrbStack => write!(f, "orbstack"),
            Self::Docker => write!(f, "docker"),
        }
    }
}

impl FromStr for RuntimeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orbstack" | "orb" => Ok(Self::OrbStack),
            "docker" => Ok(Self::Docker),
            other => Err(format!(
                "未対応のランタイムです: {} (orbstack または docker を指定してください)",
                other
            )),
        }
    }
}
