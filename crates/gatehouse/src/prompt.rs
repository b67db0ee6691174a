//! 端末での確認・入力

use colored::Colorize;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use gatehouse_core::{CoreError, Prompter};
use std::io::{BufRead, IsTerminal, Write};

/// 標準入力から回答を読む prompter
pub struct TerminalPrompter {
    /// `--yes`: 確認には全て「はい」と答える
    assume_yes: bool,
}

impl TerminalPrompter {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

fn read_line() -> gatehouse_core::Result<String> {
    std::io::stdout().flush()?;
    let mut input = String::new();
    if std::io::stdin().lock().read_line(&mut input)? == 0 {
        // EOF
        return Err(CoreError::PromptCancelled);
    }
    Ok(input.trim().to_string())
}

/// raw mode は drop 時に必ず戻す
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> std::io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn read_masked() -> gatehouse_core::Result<String> {
    std::io::stdout().flush()?;
    let mut value = String::new();
    {
        let _guard = RawModeGuard::enable()?;
        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Enter => break,
                KeyCode::Esc => return Err(CoreError::PromptCancelled),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Err(CoreError::PromptCancelled);
                }
                KeyCode::Backspace => {
                    if value.pop().is_some() {
                        print!("\x08 \x08");
                        std::io::stdout().flush()?;
                    }
                }
                KeyCode::Char(c) => {
                    value.push(c);
                    print!("*");
                    std::io::stdout().flush()?;
                }
                _ => {}
            }
        }
    }
    println!();
    Ok(value)
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str, default: bool) -> gatehouse_core::Result<bool> {
        if self.assume_yes {
            println!("{} {}", message, "[--yes]".dimmed());
            return Ok(true);
        }

        let hint = if default { "[Y/n]" } else { "[y/N]" };
        print!("{} {}: ", message, hint);
        let input = read_line()?;
        if input.is_empty() {
            return Ok(default);
        }
        Ok(input.eq_ignore_ascii_case("y") || input.eq_ignore_ascii_case("yes"))
    }

    fn select(&self, message: &str, options: &[String]) -> gatehouse_core::Result<usize> {
        if options.is_empty() {
            return Err(CoreError::NoOptions(message.to_string()));
        }

        println!("{}", message);
        for (i, option) in options.iter().enumerate() {
            println!("  {}) {}", (i + 1).to_string().cyan(), option);
        }
        loop {
            print!("番号を入力してください [1]: ");
            let input = read_line()?;
            if input.is_empty() {
                return Ok(0);
            }
            match input.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                _ => {
                    let hint = format!("1〜{} の番号を入力してください", options.len());
                    println!("{}", hint.yellow());
                }
            }
        }
    }

    fn input(&self, message: &str, default: Option<&str>) -> gatehouse_core::Result<String> {
        loop {
            match default {
                Some(d) => print!("{} [{}]: ", message, d),
                None => print!("{}: ", message),
            }
            let input = read_line()?;
            if !input.is_empty() {
                return Ok(input);
            }
            if let Some(d) = default {
                return Ok(d.to_string());
            }
        }
    }

    fn secret(&self, message: &str) -> gatehouse_core::Result<String> {
        print!("{}: ", message);
        let value = if std::io::stdin().is_terminal() {
            read_masked()?
        } else {
            read_line()?
        };
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(CoreError::InputRequired(message.to_string()));
        }
        Ok(value)
    }
}
