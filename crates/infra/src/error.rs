//! # インフラ層エラー定義
//!
//! S3・KMS など外部サービスとの通信で発生するエラーを表現する。
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別（ObjectNotFound, S3, Kms 等）
//!
//! convenience constructor でエラーを生成すると、その時点のスパン情報
//! （処理中レコードのバケット・キー等）が自動的にキャプチャされる。

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別に応じた処理には [`kind()`](InfraError::kind) を使用する:
///
/// ```ignore
/// match error.kind() {
///     InfraErrorKind::ObjectNotFound { bucket, key } => { /* 取得対象なし */ }
///     _ => { /* 転送エラー */ }
/// }
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
///
/// AWS SDK のエラー型はジェネリクスが深く `#[from]` が困難なため、
/// 手動で String にマップする。
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// オブジェクトが存在しない
    #[error("オブジェクトが見つかりません: s3://{bucket}/{key}")]
    ObjectNotFound {
        /// バケット名
        bucket: String,
        /// オブジェクトキー
        key:    String,
    },

    /// S3 転送エラー
    ///
    /// 接続失敗、権限不足、ボディ読み取り失敗など NotFound 以外のすべて。
    #[error("S3 エラー: {0}")]
    S3(String),

    /// KMS エラー
    ///
    /// 暗号化済みシークレットの復号に失敗した場合。
    #[error("KMS エラー: {0}")]
    Kms(String),

    /// 入力エラー
    ///
    /// base64 として不正なシークレット値、UTF-8 でない復号結果など。
    #[error("入力エラー: {0}")]
    InvalidInput(String),
}

// ===== InfraError のメソッド =====

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// オブジェクトが存在しないことを表すエラーかどうか
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, InfraErrorKind::ObjectNotFound { .. })
    }

    // ===== Convenience constructors =====

    /// オブジェクト不在エラーを生成する
    pub fn object_not_found(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::from_kind(InfraErrorKind::ObjectNotFound {
            bucket: bucket.into(),
            key:    key.into(),
        })
    }

    /// S3 エラーを生成する
    pub fn s3(msg: impl Into<String>) -> Self {
        Self::from_kind(InfraErrorKind::S3(msg.into()))
    }

    /// KMS エラーを生成する
    pub fn kms(msg: impl Into<String>) -> Self {
        Self::from_kind(InfraErrorKind::Kms(msg.into()))
    }

    /// 入力エラーを生成する
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::from_kind(InfraErrorKind::InvalidInput(msg.into()))
    }

    fn from_kind(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }
}

// ===== トレイト実装 =====

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}
