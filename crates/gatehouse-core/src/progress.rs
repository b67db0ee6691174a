//! 進捗イベント
//!
//! ステートマシン（ランタイムゲート・トンネルプロビジョナ・ティアダウン）は
//! 端末 UI に直接依存せず、ステップ遷移を [`ProgressSink`] に通知する。

use std::sync::Mutex;

/// インストール・アンインストールの各ステップ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// コンテナエンジンの検出
    DetectRuntime,
    /// コンテナエンジンのインストール
    InstallRuntime,
    /// コンテナエンジンの起動
    StartRuntime,
    /// コンテナエンジンの応答待ち
    WaitRuntime,
    /// ポート確認
    CheckPort,
    /// API トークン検証
    ValidateToken,
    /// アカウント解決
    ResolveAccount,
    /// ゾーン選択
    SelectZone,
    /// 既存 DNS レコード確認
    CheckDnsRecord,
    /// トンネル作成
    CreateTunnel,
    /// イングレス設定
    ConfigureIngress,
    /// トンネルトークン取得
    FetchTunnelToken,
    /// DNS レコード作成・更新
    ReconcileDnsRecord,
    /// ロールバック（作成済みトンネルの削除）
    Rollback,
    /// DNS レコード削除
    DeleteDnsRecord,
    /// トンネル削除
    DeleteTunnel,
    /// 設定ファイル書き込み
    WriteConfig,
    /// コンテナ起動
    StartContainers,
    /// ヘルスチェック待機
    WaitHealthy,
    /// コンテナ停止
    StopContainers,
    /// 設定ファイル削除
    RemoveConfig,
}

impl Step {
    /// ステップの表示名
    pub fn name(&self) -> &'static str {
        match self {
            Self::DetectRuntime => "コンテナエンジン検出",
            Self::InstallRuntime => "コンテナエンジンのインストール",
            Self::StartRuntime => "コンテナエンジン起動",
            Self::WaitRuntime => "コンテナエンジン応答待ち",
            Self::CheckPort => "ポート確認",
            Self::ValidateToken => "API トークン検証",
            Self::ResolveAccount => "アカウント解決",
            Self::SelectZone => "ドメイン選択",
            Self::CheckDnsRecord => "既存 DNS レコード確認",
            Self::CreateTunnel => "トンネル作成",
            Self::ConfigureIngress => "イングレス設定",
            Self::FetchTunnelToken => "トンネルトークン取得",
            Self::ReconcileDnsRecord => "DNS レコード設定",
            Self::Rollback => "ロールバック",
            Self::DeleteDnsRecord => "DNS レコード削除",
            Self::DeleteTunnel => "トンネル削除",
            Self::WriteConfig => "設定ファイル書き込み",
            Self::StartContainers => "コンテナ起動",
            Self::WaitHealthy => "ヘルスチェック待機",
            Self::StopContainers => "コンテナ停止",
            Self::RemoveConfig => "設定ファイル削除",
        }
    }

    /// ステップの ID（ログ出力用）
    pub fn id(&self) -> &'static str {
        match self {
            Self::DetectRuntime => "detect-runtime",
            Self::InstallRuntime => "install-runtime",
            Self::StartRuntime => "start-runtime",
            Self::WaitRuntime => "wait-runtime",
            Self::CheckPort => "check-port",
            Self::ValidateToken => "validate-token",
            Self::ResolveAccount => "resolve-account",
            Self::SelectZone => "select-zone",
            Self::CheckDnsRecord => "check-dns",
            Self::CreateTunnel => "create-tunnel",
            Self::ConfigureIngress => "configure-ingress",
            Self::FetchTunnelToken => "fetch-token",
            Self::ReconcileDnsRecord => "reconcile-dns",
            Self::Rollback => "rollback",
            Self::DeleteDnsRecord => "delete-dns",
            Self::DeleteTunnel => "delete-tunnel",
            Self::WriteConfig => "write-config",
            Self::StartContainers => "start-containers",
            Self::WaitHealthy => "wait-healthy",
            Self::StopContainers => "stop-containers",
            Self::RemoveConfig => "remove-config",
        }
    }

    /// トンネルプロビジョニングのステップ（実行順）
    pub fn provisioning_steps() -> Vec<Self> {
        vec![
            Self::ValidateToken,
            Self::ResolveAccount,
            Self::SelectZone,
            Self::CheckDnsRecord,
            Self::CreateTunnel,
            Self::ConfigureIngress,
            Self::FetchTunnelToken,
            Self::ReconcileDnsRecord,
        ]
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// ステップ遷移の通知先
pub trait ProgressSink: Send + Sync {
    /// ステップ開始
    fn step_started(&self, step: Step);

    /// 現在のステップが成功
    fn step_succeeded(&self, message: Option<&str>);

    /// 現在のステップをスキップ
    fn step_skipped(&self, reason: &str);

    /// 現在のステップが失敗
    fn step_failed(&self, error: &str);

    /// 詳細メッセージ
    fn detail(&self, message: &str);

    /// 警告（処理は継続する）
    fn warn(&self, message: &str);
}

/// 何も出力しない sink
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn step_started(&self, _step: Step) {}
    fn step_succeeded(&self, _message: Option<&str>) {}
    fn step_skipped(&self, _reason: &str) {}
    fn step_failed(&self, _error: &str) {}
    fn detail(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
}

/// 記録されたイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started(Step),
    Succeeded(Option<String>),
    Skipped(String),
    Failed(String),
    Detail(String),
    Warn(String),
}

/// イベントを順番に記録する sink（テスト・診断用）
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 記録されたイベントのスナップショット
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.lock().clone()
    }

    /// 開始されたステップを順番に返す
    pub fn started_steps(&self) -> Vec<Step> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Started(step) => Some(*step),
                _ => None,
            })
            .collect()
    }

    /// 警告メッセージ
    pub fn warnings(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Warn(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ProgressEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ProgressEvent>> {
        // 記録用途なので poison されていても中身はそのまま使う
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ProgressSink for RecordingSink {
    fn step_started(&self, step: Step) {
        self.push(ProgressEvent::Started(step));
    }

    fn step_succeeded(&self, message: Option<&str>) {
        self.push(ProgressEvent::Succeeded(message.map(String::from)));
    }

    fn step_skipped(&self, reason: &str) {
        self.push(ProgressEvent::Skipped(reason.to_string()));
    }

    fn step_failed(&self, error: &str) {
        self.push(ProgressEvent::Failed(error.to_string()));
    }

    fn detail(&self, message: &str) {
        self.push(ProgressEvent::Detail(message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.push(ProgressEvent::Warn(message.to_string()));
    }
}
