//! 外部コマンドの実行
//!
//! エンジンの検出・起動・インストールは全てこの trait 経由で行う。

use crate::error::ProcessError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

/// 実行するコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// ログ・エラー表示用のコマンドライン
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// コマンドの実行結果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessOutput {
    /// シグナルで終了した場合は `None`
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout と stderr をまとめたもの（エラー表示用）
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, _) => stderr.to_string(),
            (false, true) => stdout.to_string(),
            (false, false) => format!("{}\n{}", stdout, stderr),
        }
    }
}

/// 外部コマンドの実行手段
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// コマンドを実行し、終了を待つ。`timeout` を超えたら強制終了する
    async fn run(
        &self,
        command: &CommandSpec,
        timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError>;
}

/// tokio のプロセス API を使う実装
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        command: &CommandSpec,
        timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError> {
        let cmdline = command.display();
        tracing::debug!(command = %cmdline, timeout_secs = timeout.as_secs(), "Running command");

        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // タイムアウトで future が破棄されたら子プロセスも終了させる
            .kill_on_drop(true);
        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProcessError::NotFound(command.program.clone()));
            }
            Ok(Err(e)) => {
                return Err(ProcessError::Io {
                    command: cmdline,
                    source: e,
                });
            }
            Err(_) => {
                return Err(ProcessError::Timeout {
                    command: cmdline,
                    timeout_secs: timeout.as_secs(),
                });
            }
        };

        let result = ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(command = %cmdline, exit_code = ?result.exit_code, "Command finished");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_display() {
        let cmd = CommandSpec::new("docker").args(["info", "--format", "{{.ServerVersion}}"]);
        assert_eq!(cmd.display(), "docker info --format {{.ServerVersion}}");
        assert_eq!(CommandSpec::new("orb").display(), "orb");
    }

    #[test]
    fn test_output_combined() {
        let output = ProcessOutput {
            exit_code: Some(1),
            stdout: "".to_string(),
            stderr: "permission denied\n".to_string(),
        };
        assert!(!output.success());
        assert_eq!(output.combined(), "permission denied");
    }

    #[tokio::test]
    async fn test_missing_program_is_not_found() {
        let runner = TokioProcessRunner;
        let result = runner
            .run(
                &CommandSpec::new("gatehouse-definitely-missing-binary"),
                Duration::from_secs(5),
            )
            .await;
        assert!(matches!(result, Err(ProcessError::NotFound(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let runner = TokioProcessRunner;
        let output = runner
            .run(
                &CommandSpec::new("sh").args(["-c", "echo hello; exit 3"]),
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout() {
        let runner = TokioProcessRunner;
        let result = runner
            .run(
                &CommandSpec::new("sleep").arg("5"),
                Duration::from_millis(100),
            )
            .await;
        assert!(matches!(result, Err(ProcessError::Timeout { .. })));
    }
}
