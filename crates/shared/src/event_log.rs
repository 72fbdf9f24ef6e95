//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! CloudWatch Logs Insights で `event.kind = "business_event"` を条件に
//! 送信結果やレコードの処理結果を集計できるよう、フィールドの命名規約と
//! ヘルパーマクロを提供する。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用する。tracing の
//! `$($field:ident).+` パターンでサポートされ、JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const INVITATION: &str = "invitation";
        pub const RECORD: &str = "record";
        pub const OPERATOR_ALERT: &str = "operator_alert";
    }

    /// イベントアクション
    pub mod action {
        // 招待メール
        pub const INVITATION_SENT: &str = "invitation.sent";
        pub const INVITATION_FAILED: &str = "invitation.failed";

        // ストレージイベントレコード
        pub const RECORD_DELETED: &str = "record.deleted";
        pub const RECORD_RETAINED: &str = "record.retained";

        // 運用者アラート
        pub const OPERATOR_ALERT_SENT: &str = "operator_alert.sent";
        pub const OPERATOR_ALERT_FAILED: &str = "operator_alert.failed";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（S3、KMS）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部サービス呼び出し（SMTP リレー）
        pub const EXTERNAL_SERVICE: &str = "external_service";
        /// 入力ペイロード
        pub const PAYLOAD: &str = "payload";
    }

    /// エラー種別
    pub mod kind {
        pub const FETCH: &str = "fetch";
        pub const DECODE: &str = "decode";
        pub const DISPATCH: &str = "dispatch";
        pub const DELETE: &str = "delete";
        pub const INVALID_RECORD: &str = "invalid_record";
        pub const SMTP: &str = "smtp";
    }
}
