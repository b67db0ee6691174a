//! `gatehouse status`

use super::{Live, Services};
use colored::Colorize;
use gatehouse_config::{
    CLOUDFLARED_CONTAINER, ConfigStore, DATA_VOLUME, InstallConfig, N8N_CONTAINER, N8N_IMAGE,
    TunnelConfig,
};
use gatehouse_runtime::ContainerStatus;

/// Cloudflare 上のトンネルの状態
#[derive(Debug, Clone, PartialEq, Eq)]
enum TunnelState {
    Registered,
    Missing,
    Unknown(String),
}

pub async fn handle() -> anyhow::Result<()> {
    let live = Live::new(false)?;
    run(&live.services()).await
}

pub async fn run(services: &Services<'_>) -> anyhow::Result<()> {
    let config = services.store.read()?;
    print_status(config.as_ref(), services).await;
    Ok(())
}

/// 保存済みのトンネルがまだ登録されているか
async fn tunnel_state(tunnel: &TunnelConfig, services: &Services<'_>) -> TunnelState {
    let client = match services.api_client(&tunnel.api_token) {
        Ok(client) => client,
        Err(e) => return TunnelState::Unknown(e.to_string()),
    };
    let tunnels = client.list_tunnels(&tunnel.account_id, Some(&tunnel.tunnel_name)).await;
    match tunnels {
        Ok(found) if found.iter().any(|t| t.id == tunnel.tunnel_id) => TunnelState::Registered,
        Ok(_) => TunnelState::Missing,
        Err(e) => {
            tracing::debug!("Tunnel lookup failed: {}", e);
            TunnelState::Unknown(e.to_string())
        }
    }
}

async fn print_status(config: Option<&InstallConfig>, services: &Services<'_>) {
    let orchestrator = services.orchestrator;
    let engine = orchestrator.engine_info().await;
    println!("{}", "コンテナエンジン".bold());
    if engine.available {
        println!(
            "  {} {} {}",
            "●".green(),
            engine.variant.as_deref().unwrap_or("Docker"),
            engine.version.as_deref().unwrap_or("").dimmed()
        );
    } else {
        println!("  {} 応答なし", "○".red());
    }

    println!();
    println!("{}", "インストール".bold());
    let Some(config) = config else {
        println!("  未インストール");
        return;
    };
    let settings = config.settings();
    println!("  モード:     {}", config.mode_name().cyan());
    println!("  エンジン:   {}", settings.runtime.display_name());
    println!(
        "  日時:       {}",
        settings.installed_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  ローカル:   {}", config.local_url().cyan());
    if let Some(tunnel) = config.tunnel() {
        println!("  公開URL:    https://{}", tunnel.hostname.cyan());
        println!("  トンネル:   {} ({})", tunnel.tunnel_name, tunnel.tunnel_id.dimmed());
        println!("  CNAME:      {} → {}", tunnel.hostname, tunnel.dns_target().dimmed());
        match tunnel_state(tunnel, services).await {
            TunnelState::Registered => println!("  Cloudflare: {} 登録済み", "●".green()),
            TunnelState::Missing => println!("  Cloudflare: {} トンネルが見つかりません", "○".red()),
            TunnelState::Unknown(e) => {
                println!("  Cloudflare: {} 確認できません ({})", "○".yellow(), e.dimmed())
            }
        }
    }

    if !engine.available {
        return;
    }

    println!();
    println!("{}", "コンテナ".bold());
    let mut containers = vec![N8N_CONTAINER];
    if config.is_tunneled() {
        containers.push(CLOUDFLARED_CONTAINER);
    }
    for name in containers {
        let status = match orchestrator.container_status(name).await {
            Ok(status) => status.unwrap_or_else(ContainerStatus::missing),
            Err(e) => {
                tracing::debug!(container = name, "Status query failed: {}", e);
                ContainerStatus::missing()
            }
        };
        println!("  {} {:<24} {}", status_icon(&status), name, status.status.dimmed());
    }

    let volume = orchestrator.volume_exists(DATA_VOLUME).await.unwrap_or(false);
    print_presence(DATA_VOLUME, volume, "volume");
    let image = orchestrator.image_pulled(N8N_IMAGE).await.unwrap_or(false);
    print_presence(N8N_IMAGE, image, "image");
}

fn print_presence(name: &str, present: bool, kind: &str) {
    println!(
        "  {} {:<24} {}",
        if present { "●".green() } else { "○".red() },
        name,
        if present { kind } else { "not found" }.dimmed()
    );
}

fn status_icon(status: &ContainerStatus) -> colored::ColoredString {
    if status.healthy {
        "●".green()
    } else if status.running {
        "●".yellow()
    } else {
        "○".red()
    }
}
