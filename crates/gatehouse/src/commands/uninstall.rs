//! `gatehouse uninstall`

use super::{Live, Services, check, warn_leftovers};
use anyhow::bail;
use clap::Args;
use colored::Colorize;
use gatehouse_cloudflare::Teardown;
use gatehouse_config::ConfigStore;
use gatehouse_core::Step;

#[derive(Args, Debug, Clone, Default)]
pub struct UninstallArgs {
    /// n8n のデータボリュームも削除する
    #[arg(long)]
    pub remove_volumes: bool,

    /// 設定がなくても、リモートの削除に失敗しても続行する
    #[arg(long)]
    pub force: bool,

    /// 確認をすべて「はい」で進める
    #[arg(short, long)]
    pub yes: bool,
}

pub async fn handle(args: UninstallArgs) -> anyhow::Result<()> {
    let live = Live::new(args.yes)?;
    run(&args, &live.services()).await
}

pub async fn run(args: &UninstallArgs, services: &Services<'_>) -> anyhow::Result<()> {
    let sink = services.sink;

    let config = match services.store.read() {
        Ok(config) => config,
        Err(e) if args.force => {
            sink.warn(&format!("設定ファイルを読み込めません: {}", e));
            None
        }
        Err(e) => return Err(e.into()),
    };
    if config.is_none() && !args.force {
        println!("インストールされていません");
        return Ok(());
    }

    let mut message = match config.as_ref().and_then(|c| c.tunnel()) {
        Some(tunnel) => format!(
            "n8n と Cloudflare Tunnel ({}) を削除しますか？",
            tunnel.hostname
        ),
        None => "n8n を削除しますか？".to_string(),
    };
    if args.remove_volumes {
        message.push_str(" データボリュームも削除されます。");
    }
    if !services.prompter.confirm(&message, false)? {
        println!("{}", "アンインストールを中断しました".yellow());
        return Ok(());
    }

    sink.step_started(Step::StopContainers);
    if !services.store.compose_path().exists() {
        sink.step_skipped("compose ファイルがありません");
    } else if let Err(e) = check(
        sink,
        services.orchestrator.compose_down(args.remove_volumes).await,
        None,
    ) {
        if !args.force {
            return Err(e.into());
        }
        sink.warn("コンテナを停止できませんでしたが、--force のため続行します");
    }

    let mut leftovers = Vec::new();
    if let Some(tunnel) = config.as_ref().and_then(|c| c.tunnel()) {
        let client = services.api_client(&tunnel.api_token)?;
        let report = Teardown::new(&client, sink).teardown(tunnel).await;
        warn_leftovers(sink, &report);
        leftovers = report.failures();
    }
    if !leftovers.is_empty() && !args.force {
        // 設定を残しておけば再実行で削除をやり直せる
        bail!(
            "Cloudflare のリソースを削除できませんでした。再実行するか、--force でローカルの設定だけを削除してください"
        );
    }

    sink.step_started(Step::RemoveConfig);
    check(sink, services.store.remove(), None)?;

    println!();
    println!("{}", "アンインストールしました".green().bold());
    Ok(())
}
