//! SMTP メール送信実装
//!
//! lettre の `AsyncSmtpConnection` を直接使用してメールを送信する。
//! セッションを開いている間は同じ SMTP 接続を使い回し、閉じるときに `QUIT` を送る。

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    Address,
    message::{Mailbox, Message, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{
        Error as SmtpError,
        authentication::{Credentials, DEFAULT_MECHANISMS},
        client::{AsyncSmtpConnection, TlsParameters},
        extension::ClientId,
    },
};
use planroom_domain::notification::{EmailMessage, NotificationError, SENDER_DISPLAY_NAME};

use super::{MailSession, MailTransport};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// SMTP の TLS モード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpTls {
    /// 接続直後から TLS（SMTPS、通常 465 番ポート）
    Wrapper,
    /// STARTTLS 必須（通常 587 番ポート）
    StartTls,
    /// TLS なし（Mailpit 等のローカル SMTP 向け）
    None,
}

impl SmtpTls {
    /// ポート番号から既定の TLS モードを決める
    pub fn for_port(port: u16) -> Self {
        if port == 465 { Self::Wrapper } else { Self::StartTls }
    }

    /// 文字列からパースする（`wrapper` | `starttls` | `none`）
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "wrapper" => Some(Self::Wrapper),
            "starttls" => Some(Self::StartTls),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

/// SMTP 接続設定
#[derive(Clone)]
pub struct SmtpSettings {
    /// SMTP サーバーのホスト名
    pub host:     String,
    /// SMTP サーバーのポート番号
    pub port:     u16,
    /// SMTP アカウント（送信元アドレスを兼ねる）
    pub username: String,
    /// SMTP パスワード
    pub password: String,
    /// TLS モード
    pub tls:      SmtpTls,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("tls", &self.tls)
            .finish()
    }
}

/// SMTP メール送信
///
/// `open()` のたびに SMTP サーバーへ 1 本接続し、TLS と認証まで済ませる。
pub struct SmtpMailTransport {
    settings: SmtpSettings,
    from:     Mailbox,
}

impl SmtpMailTransport {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// 送信元は `"Benchmark Planroom" <SMTP アカウント>` とする。
    pub fn new(settings: SmtpSettings) -> Result<Self, NotificationError> {
        let address: Address = settings
            .username
            .parse()
            .map_err(|e| NotificationError::InvalidAddress(format!("送信元アドレス不正: {e}")))?;

        Ok(Self {
            from: Mailbox::new(Some(SENDER_DISPLAY_NAME.to_string()), address),
            settings,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn open(&self) -> Result<Box<dyn MailSession>, NotificationError> {
        let connection = connect(&self.settings).await.map_err(|e| {
            NotificationError::SessionFailed(format!(
                "SMTP 接続失敗 {}:{}: {e}",
                self.settings.host, self.settings.port
            ))
        })?;

        tracing::debug!(
            host = %self.settings.host,
            port = self.settings.port,
            encrypted = connection.is_encrypted(),
            "SMTP セッションを開きました"
        );

        Ok(Box::new(SmtpSession {
            connection: Some(connection),
            settings:   self.settings.clone(),
            from:       self.from.clone(),
        }))
    }
}

/// 接続して EHLO、TLS、認証まで進める
async fn connect(settings: &SmtpSettings) -> Result<AsyncSmtpConnection, SmtpError> {
    let hello_name = ClientId::default();
    let wrapper_tls = match settings.tls {
        SmtpTls::Wrapper => Some(TlsParameters::new(settings.host.clone())?),
        SmtpTls::StartTls | SmtpTls::None => None,
    };

    let mut connection = AsyncSmtpConnection::connect_tokio1(
        (settings.host.as_str(), settings.port),
        Some(CONNECT_TIMEOUT),
        &hello_name,
        wrapper_tls,
        None,
    )
    .await?;

    if settings.tls == SmtpTls::StartTls {
        connection
            .starttls(TlsParameters::new(settings.host.clone())?, &hello_name)
            .await?;
    }

    let credentials = Credentials::new(settings.username.clone(), settings.password.clone());
    connection.auth(DEFAULT_MECHANISMS, &credentials).await?;

    Ok(connection)
}

/// 1 バッチ分の SMTP セッション
///
/// 1 本の接続を全宛先で使い回す。サーバーに拒否されて接続が壊れた場合のみ、
/// 次の送信の前に接続し直す。
struct SmtpSession {
    connection: Option<AsyncSmtpConnection>,
    settings:   SmtpSettings,
    from:       Mailbox,
}

#[async_trait]
impl MailSession for SmtpSession {
    async fn submit(&mut self, email: &EmailMessage) -> Result<(), NotificationError> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| NotificationError::SessionFailed("セッションは閉じられています".to_string()))?;

        let message = build_message(&self.from, email)?;

        if connection.has_broken() {
            tracing::warn!(host = %self.settings.host, "SMTP 接続が切断されているため再接続します");
            *connection = connect(&self.settings)
                .await
                .map_err(|e| NotificationError::SendFailed(format!("SMTP 再接続失敗: {e}")))?;
        }

        connection
            .send(message.envelope(), &message.formatted())
            .await
            .map_err(|e| NotificationError::SendFailed(format!("SMTP 送信失敗: {e}")))?;

        Ok(())
    }

    async fn close(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };

        // 壊れた接続は送信失敗時に lettre が破棄済み
        if connection.has_broken() {
            return;
        }

        match connection.quit().await {
            Ok(_) => tracing::debug!("SMTP セッションを閉じました"),
            Err(e) => tracing::warn!(error = %e, "SMTP QUIT に失敗しました"),
        }
    }
}

/// HTML とプレーンテキストを `multipart/alternative` で持つメッセージを組み立てる
fn build_message(from: &Mailbox, email: &EmailMessage) -> Result<Message, NotificationError> {
    let to: Mailbox = email
        .to
        .parse()
        .map_err(|e| NotificationError::InvalidAddress(format!("宛先アドレス不正 {}: {e}", email.to)))?;

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(&email.subject)
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.text_body.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(email.html_body.clone()),
                ),
        )
        .map_err(|e| NotificationError::SendFailed(format!("メッセージ構築失敗: {e}")))
}
