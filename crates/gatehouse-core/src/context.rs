//! 実行環境の判定

/// CI を示す環境変数
const CI_ENV_VARS: &[&str] = &["CI", "GITHUB_ACTIONS"];

/// 実行コンテキスト
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionContext {
    /// ヘッドレス CI 上で実行されているか
    pub ci: bool,
}

impl ExecutionContext {
    /// 環境変数から判定
    pub fn detect() -> Self {
        let ci = CI_ENV_VARS
            .iter()
            .any(|name| std::env::var(name).map(|v| is_truthy(&v)).unwrap_or(false));
        if ci {
            tracing::debug!("Running in CI context");
        }
        Self { ci }
    }

    /// 対話的な操作が可能か
    pub fn is_interactive(&self) -> bool {
        !self.ci
    }
}

fn is_truthy(value: &str) -> bool {
    let v = value.trim();
    !v.is_empty() && !v.eq_ignore_ascii_case("false") && v != "0"
}

/// ローカルホスト名を取得
///
/// 取得できない場合は HOSTNAME / HOST 環境変数、最後に "localhost" を使う。
pub fn host_identity() -> String {
    if let Ok(name) = hostname::get() {
        let name = name.to_string_lossy().trim().to_string();
        if !name.is_empty() {
            return name;
        }
    }

    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("HOST"))
        .unwrap_or_else(|_| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_detect_ci() {
        temp_env::with_vars([("CI", Some("true")), ("GITHUB_ACTIONS", None)], || {
            assert!(ExecutionContext::detect().ci);
        });
        temp_env::with_vars([("CI", None::<&str>), ("GITHUB_ACTIONS", Some("true"))], || {
            assert!(ExecutionContext::detect().ci);
        });
    }

    #[test]
    #[serial]
    fn test_detect_not_ci() {
        temp_env::with_vars([("CI", Some("false")), ("GITHUB_ACTIONS", None)], || {
            assert!(!ExecutionContext::detect().ci);
            assert!(ExecutionContext::detect().is_interactive());
        });
        temp_env::with_vars([("CI", None::<&str>), ("GITHUB_ACTIONS", None)], || {
            assert!(!ExecutionContext::detect().ci);
        });
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy("yes"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("FALSE"));
        assert!(!is_truthy("  "));
    }

    #[test]
    fn test_host_identity_not_empty() {
        assert!(!host_identity().is_empty());
    }
}
