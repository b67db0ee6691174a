//! ユーザー確認・入力の抽象
//!
//! 確認ポイントは「真偽値を返す明示的な中断」として扱う。
//! 端末実装はバイナリ側にあり、ここにはテスト用と非対話用の実装のみ置く。

use crate::error::{CoreError, Result};
use std::collections::VecDeque;
use std::sync::Mutex;

/// ユーザーへの問い合わせ
pub trait Prompter: Send + Sync {
    /// はい/いいえの確認
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;

    /// 選択肢から1つ選ぶ。返り値は `options` のインデックス
    fn select(&self, message: &str, options: &[String]) -> Result<usize>;

    /// テキスト入力
    fn input(&self, message: &str, default: Option<&str>) -> Result<String>;

    /// マスク付き入力（トークン等）
    fn secret(&self, message: &str) -> Result<String>;
}

/// 非対話モード（`--yes` や CI）用
///
/// 確認には固定値で答え、実際の入力が必要な問い合わせは失敗させる。
#[derive(Debug, Clone, Copy)]
pub struct NonInteractivePrompter {
    assume_yes: bool,
}

impl NonInteractivePrompter {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Prompter for NonInteractivePrompter {
    fn confirm(&self, message: &str, _default: bool) -> Result<bool> {
        tracing::debug!(assume_yes = self.assume_yes, "Non-interactive confirm: {}", message);
        Ok(self.assume_yes)
    }

    fn select(&self, message: &str, options: &[String]) -> Result<usize> {
        // 選択肢が1つだけなら迷う余地がない
        if options.len() == 1 {
            return Ok(0);
        }
        Err(CoreError::InputRequired(message.to_string()))
    }

    fn input(&self, message: &str, default: Option<&str>) -> Result<String> {
        default
            .map(String::from)
            .ok_or_else(|| CoreError::InputRequired(message.to_string()))
    }

    fn secret(&self, message: &str) -> Result<String> {
        Err(CoreError::InputRequired(message.to_string()))
    }
}

/// 事前に用意した回答
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedAnswer {
    Confirm(bool),
    Select(usize),
    Text(String),
}

/// 事前に用意した回答を順番に返す prompter（テスト用）
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<ScriptedAnswer>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = ScriptedAnswer>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// これまでに問い合わせたメッセージ
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// 使われずに残った回答の数
    pub fn remaining(&self) -> usize {
        self.answers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn next(&self, message: &str) -> Result<ScriptedAnswer> {
        self.asked
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
        self.answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| CoreError::InputRequired(message.to_string()))
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, message: &str, _default: bool) -> Result<bool> {
        match self.next(message)? {
            ScriptedAnswer::Confirm(answer) => Ok(answer),
            _ => Err(CoreError::InputRequired(message.to_string())),
        }
    }

    fn select(&self, message: &str, options: &[String]) -> Result<usize> {
        if options.is_empty() {
            return Err(CoreError::NoOptions(message.to_string()));
        }
        match self.next(message)? {
            ScriptedAnswer::Select(index) if index < options.len() => Ok(index),
            _ => Err(CoreError::InputRequired(message.to_string())),
        }
    }

    fn input(&self, message: &str, default: Option<&str>) -> Result<String> {
        match self.next(message)? {
            ScriptedAnswer::Text(text) if text.is_empty() => default
                .map(String::from)
                .ok_or_else(|| CoreError::InputRequired(message.to_string())),
            ScriptedAnswer::Text(text) => Ok(text),
            _ => Err(CoreError::InputRequired(message.to_string())),
        }
    }

    fn secret(&self, message: &str) -> Result<String> {
        match self.next(message)? {
            ScriptedAnswer::Text(text) => Ok(text),
            _ => Err(CoreError::InputRequired(message.to_string())),
        }
    }
}
