mod commands;
mod progress;
mod prompt;

use clap::{Parser, Subcommand};
use commands::install::InstallArgs;
use commands::uninstall::UninstallArgs;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(about = "n8n をローカルにインストールし、Cloudflare Tunnel で公開します", long_about = None)]
#[command(version)]
struct Cli {
    /// 詳細なログを出力
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// n8n をインストールして起動
    Install(InstallArgs),
    /// n8n と Cloudflare のリソースを削除
    Uninstall(UninstallArgs),
    /// インストール状態を表示
    Status,
    /// バージョン情報を表示
    Version,
}

/// ログは stderr に出す（stdout は進捗表示用）
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Install(args) => commands::install::handle(args).await,
        Commands::Uninstall(args) => commands::uninstall::handle(args).await,
        Commands::Status => commands::status::handle().await,
        Commands::Version => {
            println!("gatehouse {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
