//! # Notifier 設定
//!
//! 環境変数から Notifier の設定を読み込む。
//!
//! SMTP 接続情報と運用者アドレス（`PE_*`）はシークレットとして扱い、
//! [`SecretResolver`] で平文に解決する。それ以外の変数は平文のまま読む。
//! 起動時に 1 度だけ読み込み、以降は参照で共有する。

use std::env;

use planroom_infra::{
    InfraError,
    notification::{SmtpSettings, SmtpTls},
    secret::SecretResolver,
};
use thiserror::Error;

const PE_SERVER: &str = "PE_SERVER";
const PE_PORT: &str = "PE_PORT";
const PE_EMAIL: &str = "PE_EMAIL";
const PE_PASSWORD: &str = "PE_PASSWORD";
const PE_ERROR: &str = "PE_ERROR";

/// 設定の読み込みエラー
///
/// いずれも起動時に致命的エラーとして扱う。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("環境変数 {0} が設定されていません")]
    Missing(&'static str),

    #[error("{name} の解決に失敗: {source}")]
    Resolve {
        name:   &'static str,
        #[source]
        source: InfraError,
    },

    #[error("PE_PORT は有効なポート番号である必要があります: {0}")]
    InvalidPort(String),

    #[error("{name} の値が不正です: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// シークレットの解決方法
///
/// `SECRET_BACKEND` 環境変数で切り替える:
/// - `kms`: KMS で復号する（デフォルト、本番）
/// - `plain`: 値をそのまま使う（ローカル実行）
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SecretBackend {
    Kms,
    Plain,
}

impl SecretBackend {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|name| env::var(name).ok())
    }

    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        parse_optional(lookup, "SECRET_BACKEND", Self::Kms)
    }
}

/// メール送信バックエンド
///
/// `MAIL_BACKEND` 環境変数で切り替える:
/// - `smtp`: SMTP リレー経由で送信（デフォルト）
/// - `noop`: 送信しない（ログ出力のみ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MailBackend {
    Smtp,
    Noop,
}

/// Notifier の設定
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// SMTP 接続設定（送信元アドレスは `username`）
    pub smtp:             SmtpSettings,
    /// 運用者アラートの宛先
    pub operator_address: String,
    /// 送信バックエンド
    pub mail_backend:     MailBackend,
    /// S3 エンドポイント URL（MinIO 使用時に設定、未設定で AWS S3 デフォルト）
    pub s3_endpoint_url:  Option<String>,
}

impl NotifierConfig {
    /// 環境変数から設定を読み込む
    pub async fn load(resolver: &dyn SecretResolver) -> Result<Self, ConfigError> {
        Self::from_lookup(&|name| env::var(name).ok(), resolver).await
    }

    async fn from_lookup(
        lookup: &(dyn Fn(&str) -> Option<String> + Sync),
        resolver: &dyn SecretResolver,
    ) -> Result<Self, ConfigError> {
        let host = resolve_secret(lookup, resolver, PE_SERVER).await?;
        let port_str = resolve_secret(lookup, resolver, PE_PORT).await?;
        let username = resolve_secret(lookup, resolver, PE_EMAIL).await?;
        let password = resolve_secret(lookup, resolver, PE_PASSWORD).await?;
        let operator_address = resolve_secret(lookup, resolver, PE_ERROR).await?;

        let port: u16 = port_str
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPort(port_str.clone()))?;

        let tls = match lookup("SMTP_TLS").filter(|v| !v.is_empty()) {
            Some(value) => SmtpTls::parse(&value).ok_or(ConfigError::InvalidValue {
                name: "SMTP_TLS",
                value,
            })?,
            None => SmtpTls::for_port(port),
        };

        Ok(Self {
            smtp: SmtpSettings {
                host,
                port,
                username,
                password,
                tls,
            },
            operator_address,
            mail_backend: parse_optional(lookup, "MAIL_BACKEND", MailBackend::Smtp)?,
            s3_endpoint_url: lookup("S3_ENDPOINT_URL").filter(|v| !v.is_empty()),
        })
    }
}

async fn resolve_secret(
    lookup: &(dyn Fn(&str) -> Option<String> + Sync),
    resolver: &dyn SecretResolver,
    name: &'static str,
) -> Result<String, ConfigError> {
    let value = lookup(name).ok_or(ConfigError::Missing(name))?;

    resolver
        .resolve(name, &value)
        .await
        .map_err(|source| ConfigError::Resolve { name, source })
}

fn parse_optional<T: std::str::FromStr>(
    lookup: &dyn Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name).filter(|v| !v.is_empty()) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}
