//! # 通知
//!
//! メールメッセージと、宛先ごとの送信結果の集約を定義する。
//!
//! ## 設計方針
//!
//! - **宛先単位の失敗分離**: 1 宛先の失敗は [`SendOutcome::Failed`] として記録し、
//!   バッチ全体は止めない
//! - **全件成功のみ Success**: 1 件でも失敗があれば [`BatchResult::PartialFailure`]
//!   となり、呼び出し側はソースオブジェクトを削除しない

use std::fmt;

use thiserror::Error;

use crate::invitation::Recipient;

/// 送信元の表示名
///
/// 送信元アドレスは設定（SMTP アカウント）から与えられ、表示名は固定。
pub const SENDER_DISPLAY_NAME: &str = "Benchmark Planroom";

/// 通知送信エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    /// SMTP セッションの確立に失敗
    #[error("SMTP セッションの確立に失敗: {0}")]
    SessionFailed(String),

    /// メールアドレスが不正
    #[error("メールアドレスが不正: {0}")]
    InvalidAddress(String),

    /// メール送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    TemplateFailed(String),
}

/// メールメッセージ
///
/// テンプレートレンダリングの出力。送信元はトランスポート側が付与する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信先メールアドレス
    pub to:        String,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文
    pub text_body: String,
}

/// 1 宛先分の送信結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Failed(NotificationError),
}

/// 送信に失敗した宛先と原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientFailure {
    pub recipient: Recipient,
    pub cause:     NotificationError,
}

impl fmt::Display for RecipientFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.recipient.to(), self.cause)
    }
}

/// 1 バッチ分の送信結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchResult {
    /// 全宛先に送信できた
    Success { sent: usize },
    /// 1 件以上の宛先で失敗した（失敗分はペイロード内の順序を保持）
    PartialFailure {
        sent:     usize,
        failures: Vec<RecipientFailure>,
    },
}

impl BatchResult {
    /// 宛先ごとの送信結果から集約する
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = (Recipient, SendOutcome)>) -> Self {
        let mut sent = 0;
        let mut failures = Vec::new();

        for (recipient, outcome) in outcomes {
            match outcome {
                SendOutcome::Sent => sent += 1,
                SendOutcome::Failed(cause) => failures.push(RecipientFailure { recipient, cause }),
            }
        }

        if failures.is_empty() {
            Self::Success { sent }
        } else {
            Self::PartialFailure { sent, failures }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// 送信できた件数
    pub fn sent(&self) -> usize {
        match self {
            Self::Success { sent } | Self::PartialFailure { sent, .. } => *sent,
        }
    }

    /// 失敗した宛先（Success の場合は空）
    pub fn failures(&self) -> &[RecipientFailure] {
        match self {
            Self::Success { .. } => &[],
            Self::PartialFailure { failures, .. } => failures,
        }
    }
}
