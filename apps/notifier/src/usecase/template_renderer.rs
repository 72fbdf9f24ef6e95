//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで入札招待メールを HTML/plaintext 両形式で生成する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: テンプレートはバイナリに埋め込まれる
//! - **件名パターン**: `Invitation to Bid: {job_name}`
//! - **HTML は 2 種類**: メッセージが空白のみなら `invitation.html`、
//!   それ以外は `invitation_with_message.html`
//! - **エスケープしない**: 案件名・期限・リンク・メッセージはペイロードの値をそのまま埋め込む。
//!   メッセージには発注側が HTML を書くことがある

use planroom_domain::{
    invitation::{BatchRequest, Recipient, is_blank},
    notification::{EmailMessage, NotificationError},
};
use tera::{Context, Tera};

const HTML_TEMPLATE: &str = "invitation.html";
const HTML_WITH_MESSAGE_TEMPLATE: &str = "invitation_with_message.html";
const TEXT_TEMPLATE: &str = "invitation.txt";

/// HTML テンプレートの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlVariant {
    /// メッセージ欄なし
    Plain,
    /// メッセージ欄あり
    WithMessage,
}

impl HtmlVariant {
    /// メッセージの内容からテンプレートを選ぶ
    pub fn for_message(message: &str) -> Self {
        if is_blank(message) {
            Self::Plain
        } else {
            Self::WithMessage
        }
    }

    fn template_name(self) -> &'static str {
        match self {
            Self::Plain => HTML_TEMPLATE,
            Self::WithMessage => HTML_WITH_MESSAGE_TEMPLATE,
        }
    }
}

/// 入札招待メールのレンダラー
///
/// 同じ入力に対して常に同じ出力を返す。I/O は行わない。
pub struct InvitationRenderer {
    engine: Tera,
}

impl InvitationRenderer {
    /// 新しいレンダラーインスタンスを作成
    ///
    /// `include_str!` で埋め込んだテンプレートを tera に登録する。
    pub fn new() -> Result<Self, NotificationError> {
        let mut engine = Tera::default();
        engine.autoescape_on(vec![]);

        engine
            .add_raw_templates(vec![
                (
                    HTML_TEMPLATE,
                    include_str!("../../templates/invitation/invitation.html"),
                ),
                (
                    HTML_WITH_MESSAGE_TEMPLATE,
                    include_str!("../../templates/invitation/invitation_with_message.html"),
                ),
                (
                    TEXT_TEMPLATE,
                    include_str!("../../templates/invitation/invitation.txt"),
                ),
            ])
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(Self { engine })
    }

    /// 宛先 1 件分のメールメッセージを生成する
    pub fn render(
        &self,
        request: &BatchRequest,
        recipient: &Recipient,
    ) -> Result<EmailMessage, NotificationError> {
        let html_body = self.render_html_body(
            request.job_name(),
            request.expiration(),
            request.message(),
            recipient.link(),
        )?;
        let text_body = self.render_plain_body(
            request.job_name(),
            request.expiration(),
            request.message(),
            recipient.link(),
        )?;

        Ok(EmailMessage {
            to: recipient.to().to_string(),
            subject: render_subject(request.job_name()),
            html_body,
            text_body,
        })
    }

    /// HTML 本文を生成する
    pub fn render_html_body(
        &self,
        job_name: &str,
        expiration: &str,
        message: &str,
        link: &str,
    ) -> Result<String, NotificationError> {
        let variant = HtmlVariant::for_message(message);
        let context = build_context(job_name, expiration, message, link);

        self.engine
            .render(variant.template_name(), &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))
    }

    /// プレーンテキスト本文を生成する
    ///
    /// メッセージは空白のみでない場合に限り、前後に空行を挟んで原文のまま入る。
    pub fn render_plain_body(
        &self,
        job_name: &str,
        expiration: &str,
        message: &str,
        link: &str,
    ) -> Result<String, NotificationError> {
        let context = build_context(job_name, expiration, message, link);

        self.engine
            .render(TEXT_TEMPLATE, &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))
    }
}

/// 件名を生成する
pub fn render_subject(job_name: &str) -> String {
    format!("Invitation to Bid: {job_name}")
}

fn build_context(job_name: &str, expiration: &str, message: &str, link: &str) -> Context {
    let mut context = Context::new();
    context.insert("job_name", job_name);
    context.insert("expiration", expiration);
    context.insert("message", message);
    context.insert("has_message", &!is_blank(message));
    context.insert("link", link);
    context
}
