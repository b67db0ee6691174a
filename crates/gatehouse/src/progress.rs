//! 端末への進捗出力
//!
//! ステップごとにタイムスタンプと所要時間を表示する。
//! 待ち時間の長いステップではスピナーを出す。

use chrono::Local;
use colored::Colorize;
use gatehouse_core::{ProgressSink, Step};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// ステップの実行結果
#[derive(Debug, Clone)]
enum StepResult {
    Success { duration: Duration },
    Skipped,
    Failed { duration: Duration },
}

impl StepResult {
    fn duration(&self) -> Option<Duration> {
        match self {
            Self::Success { duration } | Self::Failed { duration } => Some(*duration),
            Self::Skipped => None,
        }
    }
}

#[derive(Default)]
struct SinkState {
    current_step: Option<(Step, Instant)>,
    spinner: Option<ProgressBar>,
    step_results: Vec<(Step, StepResult)>,
}

/// 進捗を標準出力に表示する sink
pub struct TerminalSink {
    start_time: Instant,
    state: Mutex<SinkState>,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            state: Mutex::new(SinkState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// サマリーを出力
    pub fn print_summary(&self, title: &str) {
        let state = self.lock();
        let total_duration = self.start_time.elapsed();
        let error_count = state
            .step_results
            .iter()
            .filter(|(_, result)| matches!(result, StepResult::Failed { .. }))
            .count();
        let slowest_step = state
            .step_results
            .iter()
            .filter_map(|(step, result)| result.duration().map(|d| (step, d)))
            .max_by_key(|(_, d)| *d);

        println!();
        println!("{}", "═".repeat(44));
        println!("{}", title.cyan().bold());
        println!("{}", "─".repeat(44));
        println!("所要時間:      {}", format_duration(total_duration).green());
        if let Some((step, duration)) = slowest_step {
            println!(
                "最長ステップ:  {} ({})",
                step.name(),
                format_duration(duration)
            );
        }
        if error_count > 0 {
            println!("エラー:        {}", error_count.to_string().red().bold());
        } else {
            println!("エラー:        {}", "0".green());
        }
        println!("{}", "═".repeat(44));
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// スピナーを出すステップ
fn is_long_running(step: Step) -> bool {
    matches!(
        step,
        Step::InstallRuntime | Step::WaitRuntime | Step::StartContainers | Step::WaitHealthy
    )
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// スピナー表示中でも行が崩れないように出力
fn emit(state: &SinkState, line: String) {
    match &state.spinner {
        Some(spinner) => spinner.suspend(|| println!("{}", line)),
        None => println!("{}", line),
    }
}

fn finish(state: &mut SinkState) -> Option<(Step, Duration)> {
    if let Some(spinner) = state.spinner.take() {
        spinner.finish_and_clear();
    }
    state
        .current_step
        .take()
        .map(|(step, start)| (step, start.elapsed()))
}

impl ProgressSink for TerminalSink {
    fn step_started(&self, step: Step) {
        let mut state = self.lock();
        // 前のステップが閉じられていなければここで閉じる
        if let Some((previous, duration)) = finish(&mut state) {
            state
                .step_results
                .push((previous, StepResult::Success { duration }));
        }

        println!("[{}] {} {}", timestamp().dimmed(), "▶".cyan(), step.name());
        tracing::debug!(step = %step, "Step started");
        if is_long_running(step) {
            state.spinner = Some(spinner(step.name()));
        }
        state.current_step = Some((step, Instant::now()));
    }

    fn step_succeeded(&self, message: Option<&str>) {
        let mut state = self.lock();
        let Some((step, duration)) = finish(&mut state) else {
            return;
        };
        let duration_str = format_duration(duration);

        match message {
            Some(msg) => println!(
                "[{}] {} {} ({})",
                timestamp().dimmed(),
                "✓".green().bold(),
                msg,
                duration_str.dimmed()
            ),
            None => println!(
                "[{}] {} {} 完了 ({})",
                timestamp().dimmed(),
                "✓".green().bold(),
                step.name(),
                duration_str.dimmed()
            ),
        }
        state
            .step_results
            .push((step, StepResult::Success { duration }));
    }

    fn step_skipped(&self, reason: &str) {
        let mut state = self.lock();
        let Some((step, _)) = finish(&mut state) else {
            return;
        };
        println!(
            "[{}] {} {} ({})",
            timestamp().dimmed(),
            "⏭".yellow(),
            step.name(),
            reason.dimmed()
        );
        state.step_results.push((step, StepResult::Skipped));
    }

    fn step_failed(&self, error: &str) {
        let mut state = self.lock();
        let Some((step, duration)) = finish(&mut state) else {
            return;
        };
        println!(
            "[{}] {} {}: {}",
            timestamp().dimmed(),
            "✗".red().bold(),
            step.name(),
            error.red()
        );
        state
            .step_results
            .push((step, StepResult::Failed { duration }));
    }

    fn detail(&self, message: &str) {
        let state = self.lock();
        emit(
            &state,
            format!("[{}]   → {}", timestamp().dimmed(), message.cyan()),
        );
    }

    fn warn(&self, message: &str) {
        let state = self.lock();
        emit(
            &state,
            format!("[{}] {} {}", timestamp().dimmed(), "⚠".yellow(), message.yellow()),
        );
    }
}

/// Duration を読みやすい形式にフォーマット
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        format!("{}m {}s", total_secs / 60, total_secs % 60)
    } else if total_secs >= 1 {
        format!("{}.{}s", total_secs, millis / 100)
    } else {
        format!("{}ms", millis)
    }
}
