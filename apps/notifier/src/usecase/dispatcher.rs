//! # メール送信ディスパッチャー
//!
//! 1 バッチ分の宛先に招待メールを送信する。
//!
//! ## 設計方針
//!
//! - **1 バッチ 1 セッション**: SMTP セッションは 1 回だけ開き、全宛先で使い回す。
//!   送信ループの後は成否にかかわらず閉じる
//! - **宛先単位の失敗分離**: レンダリングや送信の失敗は宛先ごとに記録し、
//!   後続の宛先の処理は止めない
//! - **ペイロード順**: 宛先はペイロード内の順序で処理する

use std::sync::Arc;

use planroom_domain::{
    invitation::{BatchRequest, Recipient},
    notification::{BatchResult, NotificationError, RecipientFailure, SendOutcome},
};
use planroom_infra::notification::{MailSession, MailTransport};
use planroom_shared::{event_log::event, log_business_event};
use thiserror::Error;

use super::InvitationRenderer;

/// ディスパッチエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// セッションを開けなかった（どの宛先にも送信していない）
    #[error("SMTP セッションを開けませんでした: {0}")]
    Session(#[source] NotificationError),

    /// 1 件以上の宛先で送信に失敗した
    #[error("{} 件の宛先への送信に失敗: {}", .0.len(), join_failures(.0))]
    Recipients(Vec<RecipientFailure>),
}

impl DispatchError {
    /// 部分失敗の結果からエラーを作る（全件成功なら `None`）
    pub fn from_result(result: BatchResult) -> Option<Self> {
        match result {
            BatchResult::Success { .. } => None,
            BatchResult::PartialFailure { failures, .. } => Some(Self::Recipients(failures)),
        }
    }
}

fn join_failures(failures: &[RecipientFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// メール送信ディスパッチャー
pub struct MailDispatcher {
    transport: Arc<dyn MailTransport>,
    renderer:  InvitationRenderer,
}

impl MailDispatcher {
    pub fn new(transport: Arc<dyn MailTransport>, renderer: InvitationRenderer) -> Self {
        Self {
            transport,
            renderer,
        }
    }

    /// バッチ内の全宛先にメールを送信する
    ///
    /// セッションを開けなかった場合のみ `Err` を返す。
    /// 宛先単位の失敗は [`BatchResult::PartialFailure`] に集約する。
    pub async fn dispatch(&self, request: &BatchRequest) -> Result<BatchResult, DispatchError> {
        let mut session = self.transport.open().await.map_err(DispatchError::Session)?;

        let mut outcomes = Vec::with_capacity(request.recipients().len());
        for recipient in request.recipients() {
            let outcome = self.send_one(session.as_mut(), request, recipient).await;
            outcomes.push((recipient.clone(), outcome));
        }

        session.close().await;

        let result = BatchResult::from_outcomes(outcomes);
        tracing::info!(
            job_name = request.job_name(),
            sent = result.sent(),
            failed = result.failures().len(),
            "招待メールの送信が完了"
        );
        Ok(result)
    }

    async fn send_one(
        &self,
        session: &mut dyn MailSession,
        request: &BatchRequest,
        recipient: &Recipient,
    ) -> SendOutcome {
        let sent = match self.renderer.render(request, recipient) {
            Ok(email) => session.submit(&email).await,
            Err(e) => Err(e),
        };

        match sent {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::INVITATION,
                    event.action = event::action::INVITATION_SENT,
                    event.result = event::result::SUCCESS,
                    invitation.job_name = request.job_name(),
                    invitation.recipient = recipient.to(),
                    "招待メール送信成功"
                );
                SendOutcome::Sent
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::INVITATION,
                    event.action = event::action::INVITATION_FAILED,
                    event.result = event::result::FAILURE,
                    invitation.job_name = request.job_name(),
                    invitation.recipient = recipient.to(),
                    error = %e,
                    "招待メール送信失敗"
                );
                SendOutcome::Failed(e)
            }
        }
    }
}
