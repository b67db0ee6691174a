//! `.env` ファイルの生成

use crate::model::InstallConfig;

/// n8n / cloudflared 用の環境変数を `KEY=VALUE` 形式で出力
pub fn render_env(config: &InstallConfig) -> String {
    let settings = config.settings();
    let mut vars: Vec<(&str, String)> = vec![("N8N_PORT", "5678".to_string())];

    match config.tunnel() {
        Some(tunnel) => {
            vars.push(("N8N_HOST", tunnel.hostname.clone()));
            vars.push(("N8N_PROTOCOL", "https".to_string()));
            vars.push(("N8N_PROXY_HOPS", "1".to_string()));
        }
        None => {
            vars.push(("N8N_HOST", "localhost".to_string()));
            vars.push(("N8N_PROTOCOL", "http".to_string()));
        }
    }

    vars.push(("WEBHOOK_URL", config.webhook_url()));
    vars.push(("GENERIC_TIMEZONE", settings.timezone.clone()));
    vars.push(("TZ", settings.timezone.clone()));

    if let Some(tunnel) = config.tunnel() {
        vars.push(("TUNNEL_TOKEN", tunnel.tunnel_token.clone()));
    }

    let mut out = String::from("# gatehouse が生成したファイルです。手動で編集しないでください\n");
    for (key, value) in vars {
        out.push_str(&format!("{}={}\n", key, value));
    }
    out
}
