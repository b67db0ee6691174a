//! `gatehouse install`

use super::{Live, Services, check, print_urls, warn_leftovers};
use anyhow::{Context, bail};
use clap::Args;
use colored::Colorize;
use gatehouse_cloudflare::{ProvisionOutcome, ProvisionRequest, Provisioner, Teardown};
use gatehouse_config::{
    ConfigStore, DEFAULT_N8N_PORT, InstallConfig, InstallSettings, N8N_CONTAINER,
};
use gatehouse_core::{RuntimeKind, Step};
use gatehouse_runtime::{GateConfig, ReadinessGate, wait_for_healthy};

/// サブドメインの既定値
const DEFAULT_SUBDOMAIN: &str = "n8n";

#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    /// 既存のインストールを置き換える
    #[arg(long)]
    pub force: bool,

    /// 確認をすべて「はい」で進める
    #[arg(short, long)]
    pub yes: bool,

    /// トンネルを作らずローカルのみで動かす
    #[arg(long, conflicts_with_all = ["domain", "subdomain"])]
    pub local: bool,

    /// Cloudflare API トークン
    #[arg(long, env = "CLOUDFLARE_API_TOKEN", hide_env_values = true)]
    pub cloudflare_token: Option<String>,

    /// 公開に使うドメイン（Cloudflare のゾーン名）
    #[arg(long)]
    pub domain: Option<String>,

    /// 公開ホスト名のサブドメイン
    #[arg(long)]
    pub subdomain: Option<String>,

    /// 使用するコンテナエンジン (orbstack | docker)
    #[arg(long, env = "GATEHOUSE_RUNTIME")]
    pub runtime: Option<RuntimeKind>,

    /// コンテナエンジンが未インストールなら Homebrew でインストールする
    #[arg(long)]
    pub install_runtime: bool,

    /// n8n を公開するローカルポート
    #[arg(long, default_value_t = DEFAULT_N8N_PORT)]
    pub port: u16,
}

pub async fn handle(args: InstallArgs) -> anyhow::Result<()> {
    let live = Live::new(args.yes)?;
    let installed = run(&args, &live.services()).await?;
    if installed {
        live.sink().print_summary("インストール完了");
    }
    Ok(())
}

/// インストール本体。実際にインストールした場合は `true`
pub async fn run(args: &InstallArgs, services: &Services<'_>) -> anyhow::Result<bool> {
    let sink = services.sink;
    let existing = services.store.read()?;

    if let (Some(existing), false) = (&existing, args.force) {
        sink.warn("既にインストールされています。再インストールするには --force を指定してください");
        print_urls(existing);
        return Ok(false);
    }

    let mut gate = ReadinessGate::new(
        services.runner.clone(),
        GateConfig {
            preferred: args.runtime,
            authorize_install: args.install_runtime,
            ci: services.context.ci,
            ..services.gate.clone()
        },
    );
    let engine = gate.ensure_ready(sink).await?;

    if let Some(existing) = &existing {
        if !replace_existing(existing, services).await? {
            println!("{}", "再インストールを中断しました".yellow());
            return Ok(false);
        }
    }

    sink.step_started(Step::CheckPort);
    if !services.orchestrator.port_available(args.port).await {
        sink.step_failed(&format!("ポート {} は使用中です", args.port));
        bail!(
            "ポート {} は既に使用されています。--port で別のポートを指定してください",
            args.port
        );
    }
    sink.step_succeeded(Some(&format!("ポート {} は空いています", args.port)));

    let settings = InstallSettings::new(engine.kind, args.port);
    let config = if args.local {
        InstallConfig::LocalOnly { settings }
    } else {
        match provision_tunnel(args, services).await? {
            Some(tunnel) => InstallConfig::Tunneled { settings, tunnel },
            None => return Ok(false),
        }
    };

    sink.step_started(Step::WriteConfig);
    if let Err(e) = persist(&config, services) {
        sink.step_failed(&e.to_string());
        // 保存できなかったリソースは後から消せないので、ここで消す
        if let Some(tunnel) = config.tunnel() {
            let client = services.api_client(&tunnel.api_token)?;
            let report = Teardown::new(&client, sink).teardown(tunnel).await;
            warn_leftovers(sink, &report);
        }
        return Err(e);
    }
    sink.step_succeeded(Some(&services.store.dir().display().to_string()));

    sink.step_started(Step::StartContainers);
    check(
        sink,
        services.orchestrator.compose_up(config.compose_profile()).await,
        None,
    )?;

    sink.step_started(Step::WaitHealthy);
    check(
        sink,
        wait_for_healthy(services.orchestrator, N8N_CONTAINER, &services.health).await,
        Some("n8n が起動しました"),
    )?;

    println!();
    println!("{}", "n8n の準備ができました".green().bold());
    print_urls(&config);
    Ok(true)
}

/// 既存のインストールを片付ける。中断した場合は `false`
///
/// 片付けが終わったら保存済みの設定も削除する（削除済みのリソースを指す設定は残さない）。
/// トンネルの削除に失敗した場合は設定を残してエラーにする。
async fn replace_existing(
    existing: &InstallConfig,
    services: &Services<'_>,
) -> anyhow::Result<bool> {
    let sink = services.sink;

    // 確認してから何かを変更する
    if let Some(tunnel) = existing.tunnel() {
        let client = services.api_client(&tunnel.api_token)?;
        match Teardown::new(&client, sink)
            .confirm_and_teardown(tunnel, services.prompter)
            .await?
        {
            Some(report) if !report.is_complete() => {
                // 設定は残す（再実行で削除をやり直せる）
                warn_leftovers(sink, &report);
                bail!(
                    "既存のトンネルを削除できませんでした。再実行するか、gatehouse uninstall --force で設定を削除してください"
                );
            }
            Some(_) => {}
            None => return Ok(false),
        }
    }

    sink.step_started(Step::StopContainers);
    if let Err(e) = services.orchestrator.compose_down(false).await {
        sink.step_failed(&e.to_string());
        sink.warn("既存のコンテナを停止できませんでした。インストールを続行します");
    } else {
        sink.step_succeeded(None);
    }

    sink.step_started(Step::RemoveConfig);
    check(sink, services.store.remove(), None)?;
    Ok(true)
}

/// トークン・サブドメインを集めてトンネルを作る。辞退した場合は `None`
async fn provision_tunnel(
    args: &InstallArgs,
    services: &Services<'_>,
) -> anyhow::Result<Option<gatehouse_config::TunnelConfig>> {
    let token = match &args.cloudflare_token {
        Some(token) if !token.trim().is_empty() => token.trim().to_string(),
        _ => services
            .prompter
            .secret("Cloudflare API トークン")
            .context("--cloudflare-token または CLOUDFLARE_API_TOKEN でトークンを指定してください")?,
    };
    let subdomain = match &args.subdomain {
        Some(subdomain) => subdomain.clone(),
        None => services
            .prompter
            .input("公開するサブドメイン", Some(DEFAULT_SUBDOMAIN))?,
    };

    let client = services.api_client(&token)?;
    let request = ProvisionRequest::new(subdomain, args.domain.clone());
    match Provisioner::new(&client, services.sink, services.prompter)
        .provision(&request)
        .await?
    {
        ProvisionOutcome::Provisioned(tunnel) => Ok(Some(tunnel)),
        ProvisionOutcome::Declined { hostname } => {
            println!(
                "{}",
                format!("{} の DNS レコードを変更しないため、インストールを中断しました", hostname)
                    .yellow()
            );
            Ok(None)
        }
    }
}

fn persist(config: &InstallConfig, services: &Services<'_>) -> anyhow::Result<()> {
    services.store.write_env_file(config)?;
    services.store.write_compose_file(config)?;
    // install.json は最後に書く（存在すればインストール済みとみなされる）
    services.store.write(config)?;
    Ok(())
}
