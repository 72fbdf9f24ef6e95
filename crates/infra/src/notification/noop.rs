//! Noop メール送信実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! ローカルでの動作確認や送信無効化時に使用する。

use async_trait::async_trait;
use planroom_domain::notification::{EmailMessage, NotificationError};

use super::{MailSession, MailTransport};

/// Noop メール送信（ログ出力のみ）
#[derive(Debug, Clone, Default)]
pub struct NoopMailTransport;

#[async_trait]
impl MailTransport for NoopMailTransport {
    async fn open(&self) -> Result<Box<dyn MailSession>, NotificationError> {
        Ok(Box::new(NoopSession))
    }
}

struct NoopSession;

#[async_trait]
impl MailSession for NoopSession {
    async fn submit(&mut self, email: &EmailMessage) -> Result<(), NotificationError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "Noop: メール送信をスキップ"
        );
        Ok(())
    }

    async fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submitがエラーを返さない() {
        let transport = NoopMailTransport;
        let email = EmailMessage {
            to:        "estimator@example.com".to_string(),
            subject:   "Invitation to Bid: Riverside".to_string(),
            html_body: "<p>テスト</p>".to_string(),
            text_body: "テスト".to_string(),
        };

        let mut session = transport.open().await.unwrap();
        let result = session.submit(&email).await;
        session.close().await;

        assert!(result.is_ok());
    }
}
