//! `compose.yaml` の生成
//!
//! Tera テンプレートからコンテナ構成を展開する。

use crate::error::Result;
use crate::model::InstallConfig;
use tera::{Context, Tera};

const TEMPLATE: &str = include_str!("../templates/compose.yaml.tera");

/// compose プロジェクト名
pub const COMPOSE_PROJECT: &str = "gatehouse";
/// n8n コンテナ名
pub const N8N_CONTAINER: &str = "gatehouse-n8n";
/// cloudflared コンテナ名
pub const CLOUDFLARED_CONTAINER: &str = "gatehouse-cloudflared";
/// n8n のデータボリューム
pub const DATA_VOLUME: &str = "gatehouse_n8n_data";
/// n8n イメージ
pub const N8N_IMAGE: &str = "docker.n8n.io/n8nio/n8n:latest";
/// cloudflared イメージ
pub const CLOUDFLARED_IMAGE: &str = "cloudflare/cloudflared:latest";
/// cloudflared を有効にするプロファイル
pub const TUNNEL_PROFILE: &str = "tunnel";
/// compose ネットワーク内から見た n8n のアドレス（イングレスの転送先）
pub const N8N_SERVICE_URL: &str = "http://n8n:5678";

/// compose ファイルを展開
pub fn render_compose(config: &InstallConfig) -> Result<String> {
    let mut context = Context::new();
    context.insert("project", COMPOSE_PROJECT);
    context.insert("n8n_image", N8N_IMAGE);
    context.insert("n8n_container", N8N_CONTAINER);
    context.insert("n8n_port", &config.settings().n8n_port);
    context.insert("cloudflared_image", CLOUDFLARED_IMAGE);
    context.insert("cloudflared_container", CLOUDFLARED_CONTAINER);
    context.insert("tunnel_profile", TUNNEL_PROFILE);
    context.insert("data_volume", DATA_VOLUME);
    context.insert("tunneled", &config.is_tunneled());

    Ok(Tera::one_off(TEMPLATE, &context, false)?)
}
