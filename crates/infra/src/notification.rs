//! # メール送信
//!
//! SMTP リレーへのメール送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **セッション単位の抽象化**: [`MailTransport`] がセッションを開き、
//!   [`MailSession`] がそのセッション上で複数のメッセージを送信する。
//!   1 バッチにつき 1 セッションとし、宛先ごとのハンドシェイクを避ける
//! - **2 つの実装**: SMTP（本番・Mailpit）、Noop（送信しない動作確認用）
//! - **環境変数切替**: `MAIL_BACKEND` でランタイム選択

mod noop;
mod smtp;

use async_trait::async_trait;
pub use noop::NoopMailTransport;
use planroom_domain::notification::{EmailMessage, NotificationError};
pub use smtp::{SmtpMailTransport, SmtpSettings, SmtpTls};

/// メール送信セッションを開くトレイト
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// セッションを開く（接続・TLS・認証まで済ませる）
    async fn open(&self) -> Result<Box<dyn MailSession>, NotificationError>;
}

/// 開いたセッション上でメールを送信するトレイト
///
/// セッションは 1 バッチの間だけ所有者が排他的に使う。
#[async_trait]
pub trait MailSession: Send {
    /// メールを 1 通送信する
    async fn submit(&mut self, email: &EmailMessage) -> Result<(), NotificationError>;

    /// セッションを閉じる
    ///
    /// 閉じた後の `submit` は `SessionFailed` を返す。2 回目以降の呼び出しは何もしない。
    async fn close(&mut self);
}
