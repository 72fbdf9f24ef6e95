//! # 運用者アラート
//!
//! レコードの処理に失敗したとき、運用者のメールボックスに 1 通だけ通知する。
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: `notify()` は送信に失敗してもエラーを返さない（ログ出力のみ）
//! - **専用セッション**: 招待メールとは別に、アラート 1 通ごとにセッションを開く
//! - **重複排除しない**: 同じ原因の失敗が続いても、失敗 1 件につき 1 通送る

use std::{fmt, sync::Arc};

use planroom_domain::notification::{EmailMessage, NotificationError};
use planroom_infra::notification::MailTransport;
use planroom_shared::{event_log::event, log_business_event};
use thiserror::Error;

/// アラートの件名
pub const ALERT_SUBJECT: &str = "Planroom Email Error";

/// アラート送信エラー
///
/// 呼び出し元には伝播せず、ログに記録するだけ。
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("アラート用のセッションを開けませんでした: {0}")]
    Session(#[source] NotificationError),

    #[error("アラートの送信に失敗: {0}")]
    Send(#[source] NotificationError),
}

/// 運用者アラートの送信
pub struct OperatorNotifier {
    transport:        Arc<dyn MailTransport>,
    operator_address: String,
}

impl OperatorNotifier {
    pub fn new(transport: Arc<dyn MailTransport>, operator_address: impl Into<String>) -> Self {
        Self {
            transport,
            operator_address: operator_address.into(),
        }
    }

    /// 失敗内容を運用者に通知する（fire-and-forget）
    pub async fn notify(&self, error: &(dyn fmt::Display + Sync)) {
        match self.try_notify(error).await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::OPERATOR_ALERT,
                    event.action = event::action::OPERATOR_ALERT_SENT,
                    event.result = event::result::SUCCESS,
                    "運用者アラート送信成功"
                );
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::OPERATOR_ALERT,
                    event.action = event::action::OPERATOR_ALERT_FAILED,
                    event.result = event::result::FAILURE,
                    error.category = planroom_shared::event_log::error::category::EXTERNAL_SERVICE,
                    error.kind = planroom_shared::event_log::error::kind::SMTP,
                    error.detail = %e,
                    alert.cause = %error,
                    "運用者アラート送信失敗"
                );
                tracing::error!(error = %e, "運用者アラートを送信できませんでした");
            }
        }
    }

    async fn try_notify(&self, error: &(dyn fmt::Display + Sync)) -> Result<(), NotifyError> {
        let email = build_alert(&self.operator_address, error);

        let mut session = self.transport.open().await.map_err(NotifyError::Session)?;
        let sent = session.submit(&email).await.map_err(NotifyError::Send);
        session.close().await;
        sent
    }
}

/// アラートメールを組み立てる（HTML とプレーンテキストは同じ本文）
fn build_alert(to: &str, error: &dyn fmt::Display) -> EmailMessage {
    let body = format!("There was an error sending emails {error}");
    EmailMessage {
        to:        to.to_string(),
        subject:   ALERT_SUBJECT.to_string(),
        html_body: body.clone(),
        text_body: body,
    }
}

#[cfg(test)]
mod tests {
    use planroom_infra::mock::MockMailTransport;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn アラートメールの件名と本文が正しい() {
        let email = build_alert("ops@example.com", &"ペイロードの取得に失敗");

        assert_eq!(
            email,
            EmailMessage {
                to:        "ops@example.com".to_string(),
                subject:   "Planroom Email Error".to_string(),
                html_body: "There was an error sending emails ペイロードの取得に失敗".to_string(),
                text_body: "There was an error sending emails ペイロードの取得に失敗".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn notifyは運用者アドレスに1通送信する() {
        let transport = MockMailTransport::new();
        let sut = OperatorNotifier::new(Arc::new(transport.clone()), "ops@example.com");

        sut.notify(&"s3://invitations/job.json: 不正なレコード").await;

        let sent = transport.sent_emails();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ops@example.com");
        assert_eq!(sent[0].subject, ALERT_SUBJECT);
        assert_eq!(transport.opened_sessions(), 1);
        assert_eq!(transport.closed_sessions(), 1);
    }

    #[tokio::test]
    async fn セッションを開けなくてもnotifyはパニックせず戻る() {
        let transport = MockMailTransport::new();
        transport.fail_open();
        let sut = OperatorNotifier::new(Arc::new(transport.clone()), "ops@example.com");

        sut.notify(&"失敗").await;

        assert!(transport.sent_emails().is_empty());
    }

    #[tokio::test]
    async fn 送信に失敗してもセッションは閉じる() {
        let transport = MockMailTransport::new();
        transport.fail_recipient("ops@example.com");
        let sut = OperatorNotifier::new(Arc::new(transport.clone()), "ops@example.com");

        let result = sut.try_notify(&"失敗").await;

        assert!(matches!(result, Err(NotifyError::Send(_))));
        assert_eq!(transport.closed_sessions(), 1);
    }
}
